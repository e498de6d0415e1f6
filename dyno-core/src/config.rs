// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Session configuration.
//!
//! Everything here is fixed at build time and for the lifetime of a session. [`DynoConfig`] only
//! exists so the values travel together and get validated once at startup.

use core::fmt;

/// Default maximum encoder pulses per revolution.
pub const MAX_PPR_ENCODER: u32 = 360;

/// Default maximum shaft speed. Advisory; nothing in the pipeline enforces it.
pub const MAX_RPM_ENCODER: u32 = 6000;

/// Default sampling / transmission period.
pub const PERIOD_SEND_DATA_MS: u32 = 200;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DynoConfig {
    /// Encoder pulses per revolution, used to derive `pulse_enc_z`.
    pub max_ppr: u32,
    /// Maximum RPM of the rig.
    pub max_rpm: u32,
    /// Sampling period in milliseconds.
    pub period_ms: u32,
}

impl DynoConfig {
    pub const DEFAULT: Self = Self {
        max_ppr: MAX_PPR_ENCODER,
        max_rpm: MAX_RPM_ENCODER,
        period_ms: PERIOD_SEND_DATA_MS,
    };

    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Set the encoder resolution.
    pub fn with_max_ppr(mut self, max_ppr: u32) -> Self {
        self.max_ppr = max_ppr;
        self
    }

    /// Set the advisory RPM ceiling.
    pub fn with_max_rpm(mut self, max_rpm: u32) -> Self {
        self.max_rpm = max_rpm;
        self
    }

    /// Set the sampling period.
    pub fn with_period_ms(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_ppr == 0 {
            return Err(ConfigError::ZeroPulsesPerRev);
        }
        if self.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(self)
    }
}

impl Default for DynoConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `max_ppr` must be non-zero; it is a divisor.
    ZeroPulsesPerRev,
    /// A zero period would emit on every loop iteration.
    ZeroPeriod,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::ZeroPulsesPerRev => write!(f, "pulses per revolution must be non-zero"),
            ConfigError::ZeroPeriod => write!(f, "sampling period must be non-zero"),
        }
    }
}
