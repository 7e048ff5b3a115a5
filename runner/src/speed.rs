//! Animation speed: a shared step delay derived from a speed multiplier
//!
//! `delay = base / multiplier`. The delay is read once per suspension, so a
//! change only affects the next pause, never one already in progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use maze_core::BASE_STEP_DELAY_MS;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SpeedError {
    #[error("speed multiplier must be a positive finite number, got {0}")]
    InvalidMultiplier(f64),
}

/// Step delay shared between a controller and its running search
#[derive(Debug, Clone)]
pub struct StepDelay {
    base: Duration,
    current_us: Arc<AtomicU64>,
}

impl Default for StepDelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(BASE_STEP_DELAY_MS))
    }
}

impl StepDelay {
    /// Start at multiplier 1.0, i.e. `base`
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            current_us: Arc::new(AtomicU64::new(base.as_micros() as u64)),
        }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    /// Delay the next suspension will use
    pub fn get(&self) -> Duration {
        Duration::from_micros(self.current_us.load(Ordering::Relaxed))
    }

    /// Set the delay to `base / multiplier`; returns the new delay
    pub fn set_multiplier(&self, multiplier: f64) -> Result<Duration, SpeedError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(SpeedError::InvalidMultiplier(multiplier));
        }
        let delay = Duration::try_from_secs_f64(self.base.as_secs_f64() / multiplier)
            .map_err(|_| SpeedError::InvalidMultiplier(multiplier))?;
        self.set(delay);
        Ok(delay)
    }

    /// Set an absolute delay (zero runs the search as fast as the runtime allows)
    pub fn set(&self, delay: Duration) {
        let micros = u64::try_from(delay.as_micros()).unwrap_or(u64::MAX);
        self.current_us.store(micros, Ordering::Relaxed);
    }
}
