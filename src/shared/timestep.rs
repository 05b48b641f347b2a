use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::error_codes;
use crate::lifecycle::{last_ready, StepComponent};

/// Length of one simulation timestep in seconds (15 minutes)
pub const DEFAULT_TIMESTEP_SECONDS: f64 = 900.0;

/// Discrete simulation step index derived from elapsed time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestep(pub i64);

impl Timestep {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Timestep {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("Elapsed time must be finite, got {0}")]
    NonFinite(f64),

    #[error("Elapsed time {0} maps outside the representable timestep range")]
    OutOfRange(f64),

    #[error("Timestep interval must be finite and positive, got {0}")]
    InvalidInterval(f64),
}

impl ConvertError {
    pub fn code(&self) -> &'static str {
        match self {
            ConvertError::NonFinite(_) => error_codes::NON_FINITE_ELAPSED,
            ConvertError::OutOfRange(_) => error_codes::TIMESTEP_OUT_OF_RANGE,
            ConvertError::InvalidInterval(_) => error_codes::INVALID_INTERVAL,
        }
    }
}

fn check_interval(interval: f64) -> Result<(), ConvertError> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(ConvertError::InvalidInterval(interval));
    }
    Ok(())
}

/// Map elapsed seconds onto a 1-based timestep index.
///
/// The fractional index is truncated toward zero, not floored, so elapsed
/// times in `(-interval, 0)` still map to timestep 0.
pub fn timestep_for(elapsed: f64, interval: f64) -> Result<Timestep, ConvertError> {
    check_interval(interval)?;
    if !elapsed.is_finite() {
        return Err(ConvertError::NonFinite(elapsed));
    }

    let index = (elapsed / interval + 1.0).trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if index < i64::MIN as f64 || index >= i64::MAX as f64 {
        return Err(ConvertError::OutOfRange(elapsed));
    }

    Ok(Timestep(index as i64))
}

/// Converts elapsed-time samples into timestep indices and retains the most
/// recent one as its current value
#[derive(Debug, Clone)]
pub struct TimestepConverter {
    interval: f64,
    current: Timestep,
}

impl Default for TimestepConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestepConverter {
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_TIMESTEP_SECONDS,
            current: Timestep::default(),
        }
    }

    pub fn with_interval(interval: f64) -> Result<Self, ConvertError> {
        check_interval(interval)?;
        Ok(Self {
            interval,
            current: Timestep::default(),
        })
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn current(&self) -> Timestep {
        self.current
    }

    pub fn convert(&mut self, elapsed: f64) -> Result<Timestep, ConvertError> {
        let timestep = timestep_for(elapsed, self.interval)?;
        self.current = timestep;
        Ok(timestep)
    }
}

impl StepComponent for TimestepConverter {
    /// One optional sample per input channel
    type Input = Vec<Option<f64>>;
    type Output = Option<Timestep>;
    type Error = ConvertError;

    fn reset(&mut self) -> Result<(), ConvertError> {
        self.current = Timestep::default();
        Ok(())
    }

    fn step(&mut self, samples: Vec<Option<f64>>) -> Result<Option<Timestep>, ConvertError> {
        match last_ready(samples) {
            Some(elapsed) => self.convert(elapsed).map(Some),
            None => Ok(None),
        }
    }

    fn finalize(&mut self) -> Result<(), ConvertError> {
        Ok(())
    }
}
