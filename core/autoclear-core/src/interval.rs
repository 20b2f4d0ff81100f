//! Interval resolution for `start`.
//!
//! The operator supplies a count of minutes as text. Invalid values are
//! re-prompted through an [`IntervalPrompt`] a bounded number of times; after
//! that the default interval is used. Answering `q` cancels the start.

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{AutoclearError, Result};

const CANCEL_SENTINEL: &str = "q";

/// Longest accepted interval. Anything larger is treated as not a number.
pub const MAX_INTERVAL_SECS: u64 = u32::MAX as u64;

/// Source of corrected input when the requested interval is invalid.
pub trait IntervalPrompt {
    /// Shows `message` and returns the operator's answer.
    /// `None` means no more input is available and cancels the start.
    fn ask(&mut self, message: &str) -> Option<String>;
}

/// Answers prompts from a fixed queue; runs dry as `None`.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Messages shown so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl IntervalPrompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        self.asked.push(message.to_string());
        self.answers.pop_front()
    }
}

/// How the worker interval was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalChoice {
    Requested(Duration),
    /// Retries ran out; the configured default applies.
    Fallback(Duration),
}

impl IntervalChoice {
    pub fn duration(self) -> Duration {
        match self {
            Self::Requested(duration) | Self::Fallback(duration) => duration,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Parsed {
    Seconds(u64),
    NotPositive,
    NotANumber,
}

fn parse_minutes(value: &str) -> Parsed {
    match value.parse::<i64>() {
        Ok(minutes) if minutes > 0 => u64::try_from(minutes)
            .ok()
            .and_then(|minutes| minutes.checked_mul(60))
            .filter(|secs| *secs <= MAX_INTERVAL_SECS)
            .map_or(Parsed::NotANumber, Parsed::Seconds),
        Ok(_) => Parsed::NotPositive,
        Err(_) => Parsed::NotANumber,
    }
}

/// Resolves `requested` minutes into a worker interval.
///
/// Evaluates at most `max_retries + 1` values. Returns
/// [`AutoclearError::Cancelled`] when the operator answers `q` (any case) or
/// input closes. The initial value cancels only as a literal lowercase `q`.
pub fn resolve_interval(
    requested: &str,
    max_retries: u32,
    default: Duration,
    prompt: &mut dyn IntervalPrompt,
) -> Result<IntervalChoice> {
    let mut value = requested.trim().to_string();

    for attempt in 0..=max_retries {
        if value == CANCEL_SENTINEL {
            return Err(AutoclearError::Cancelled);
        }

        let message = match parse_minutes(&value) {
            Parsed::Seconds(secs) => {
                return Ok(IntervalChoice::Requested(Duration::from_secs(secs)));
            }
            Parsed::NotPositive => {
                tracing::debug!(value = %value, attempt, "Interval must be positive");
                format!(
                    "number must be positive. {} left. try again (or q to quit)",
                    max_retries - attempt
                )
            }
            Parsed::NotANumber => {
                tracing::debug!(value = %value, attempt, "Interval is not a number");
                format!(
                    "{} is not a valid number. {} left. try again (or q to quit)",
                    value,
                    max_retries - attempt
                )
            }
        };

        if attempt == max_retries {
            break;
        }
        value = prompt
            .ask(&message)
            .ok_or(AutoclearError::Cancelled)?
            .trim()
            .to_lowercase();
    }

    Ok(IntervalChoice::Fallback(default))
}
