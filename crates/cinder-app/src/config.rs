//! Application configuration.

use std::time::Duration;

use cinder_core::{Expiration, SizeLimits};

/// Origin used for share links when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

/// Pause between a confirmed burn and the terminal state.
pub const DEFAULT_BURN_TRANSITION: Duration = Duration::from_millis(1000);

/// Settings shared by the read and write flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Scheme, host and port that share links start with.
    pub origin: String,
    /// How long a burned paste stays on screen before the session ends.
    pub burn_transition: Duration,
    /// Write-time size ceilings.
    pub limits: SizeLimits,
    /// Demo mode: refuse unencrypted writes and expirations over one day.
    pub require_passphrase: bool,
    /// Expiration used when the writer does not pick one.
    pub default_expiration: Expiration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_owned(),
            burn_transition: DEFAULT_BURN_TRANSITION,
            limits: SizeLimits::default(),
            require_passphrase: false,
            default_expiration: Expiration::default(),
        }
    }
}

impl AppConfig {
    /// Defaults with demo restrictions switched on.
    pub fn demo() -> Self {
        Self { require_passphrase: true, ..Self::default() }
    }

    /// Replace the share-link origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Replace the burn transition interval.
    #[must_use]
    pub fn with_burn_transition(mut self, interval: Duration) -> Self {
        self.burn_transition = interval;
        self
    }

    /// Returns true if `expiration` may be used under this configuration.
    pub fn allows(&self, expiration: Expiration) -> bool {
        !self.require_passphrase || expiration.allowed_in_demo()
    }
}
