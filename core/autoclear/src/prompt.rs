//! Interactive interval prompt on the controlling terminal.

use std::io::{self, BufRead, Write};

use autoclear_core::IntervalPrompt;

pub struct TerminalPrompt;

impl IntervalPrompt for TerminalPrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{}: ", message);
        let _ = stdout.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            // EOF: nobody is there to answer
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(err) => {
                tracing::debug!(error = %err, "Failed to read interval from stdin");
                None
            }
        }
    }
}
