//! Write-time size ceilings, expiration presets, and human-readable sizes.

use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

use crate::PasteError;

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;

/// Hard upload ceiling: 50 MiB.
pub const MAX_BYTES: u64 = 50 * MIB;

/// Encrypted uploads above 2.5 MiB need explicit confirmation.
pub const CAUTION_BYTES: u64 = 5 * MIB / 2;

/// Size ceilings checked before any framing or encryption work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    /// Content strictly larger than this is rejected.
    pub max_bytes: u64,
    /// Encrypted content strictly larger than this needs confirmation.
    pub caution_bytes: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self { max_bytes: MAX_BYTES, caution_bytes: CAUTION_BYTES }
    }
}

/// Outcome of a size check that did not reject the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    /// Proceed.
    Accepted,
    /// Proceed only after the user confirms.
    NeedsConfirmation,
}

impl SizeLimits {
    /// Check a body of `size` bytes.
    ///
    /// # Errors
    ///
    /// - `PasteError::SizeExceeded` if `size > max_bytes`
    pub fn check(&self, size: u64, encrypting: bool) -> Result<SizeCheck, PasteError> {
        if size > self.max_bytes {
            return Err(PasteError::SizeExceeded { size, limit: self.max_bytes });
        }
        if encrypting && size > self.caution_bytes {
            return Ok(SizeCheck::NeedsConfirmation);
        }
        Ok(SizeCheck::Accepted)
    }
}

/// How long a stored paste lives before the store forgets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Expiration {
    /// 10 minutes.
    TenMinutes,
    /// 6 hours.
    SixHours,
    /// 1 day.
    #[default]
    OneDay,
    /// 3 days.
    ThreeDays,
    /// 1 week.
    OneWeek,
}

impl Expiration {
    /// Every preset, shortest first.
    pub const ALL: [Self; 5] =
        [Self::TenMinutes, Self::SixHours, Self::OneDay, Self::ThreeDays, Self::OneWeek];

    /// Lifetime in seconds.
    pub const fn as_secs(self) -> u64 {
        match self {
            Self::TenMinutes => 10 * 60,
            Self::SixHours => 6 * 60 * 60,
            Self::OneDay => 24 * 60 * 60,
            Self::ThreeDays => 3 * 24 * 60 * 60,
            Self::OneWeek => 7 * 24 * 60 * 60,
        }
    }

    /// Lifetime as a [`Duration`].
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.as_secs())
    }

    /// Unix deadline for a paste written at `now_secs`.
    pub const fn expires_at(self, now_secs: u64) -> u64 {
        now_secs.saturating_add(self.as_secs())
    }

    /// Short CLI-friendly name (`10m`, `6h`, `1d`, `3d`, `1w`).
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::TenMinutes => "10m",
            Self::SixHours => "6h",
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::OneWeek => "1w",
        }
    }

    /// Demo deployments only offer presets up to one day.
    pub const fn allowed_in_demo(self) -> bool {
        matches!(self, Self::TenMinutes | Self::SixHours | Self::OneDay)
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TenMinutes => "10 minutes",
            Self::SixHours => "6 hours",
            Self::OneDay => "1 day",
            Self::ThreeDays => "3 days",
            Self::OneWeek => "1 week",
        };
        f.write_str(label)
    }
}

/// Unrecognized expiration name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown expiration {0:?} (expected one of 10m, 6h, 1d, 3d, 1w)")]
pub struct UnknownExpiration(pub String);

impl FromStr for Expiration {
    type Err = UnknownExpiration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "10m" | "ten-minutes" => Ok(Self::TenMinutes),
            "6h" | "six-hours" => Ok(Self::SixHours),
            "1d" | "one-day" => Ok(Self::OneDay),
            "3d" | "three-days" => Ok(Self::ThreeDays),
            "1w" | "7d" | "one-week" => Ok(Self::OneWeek),
            other => Err(UnknownExpiration(other.to_owned())),
        }
    }
}

/// Format a byte count with binary units and two decimals.
///
/// A unit is used only once the count strictly exceeds it, so exactly 1024
/// bytes prints as `1024 B`.
pub fn readable_bytes(bytes: u64) -> String {
    if bytes > GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes > MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes > KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
