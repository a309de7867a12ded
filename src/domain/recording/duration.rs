//! Duration value object and clock formatting

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Seconds in one hour; clock strings switch to `HH:MM:SS` from here on.
const SECS_PER_HOUR: u64 = 3600;

/// Format elapsed whole seconds as a zero-padded clock.
///
/// `MM:SS` below one hour, `HH:MM:SS` from one hour on.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / SECS_PER_HOUR;
    let minutes = (total_secs % SECS_PER_HOUR) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Value object representing a time limit (e.g. the max recording length).
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds, saturating at the largest value
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs.saturating_mul(1000),
        }
    }

    /// Get duration in seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }

    /// Render as a recording clock (`MM:SS` / `HH:MM:SS`)
    pub fn to_clock(&self) -> String {
        format_clock(self.as_secs())
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "30s", "1m", "2m30s", "1h", "1h30m"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let invalid = || DurationParseError { input: s.to_string() };

        let mut total_secs: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;

        for ch in input.chars() {
            if ch.is_ascii_digit() {
                current_num.push(ch);
                continue;
            }

            let unit = match ch {
                'h' => SECS_PER_HOUR,
                'm' => 60,
                's' => 1,
                _ => return Err(invalid()),
            };
            if current_num.is_empty() {
                return Err(invalid());
            }

            let value: u64 = current_num.parse().map_err(|_| invalid())?;
            total_secs = value
                .checked_mul(unit)
                .and_then(|v| total_secs.checked_add(v))
                .ok_or_else(invalid)?;
            current_num.clear();
            found_any = true;
        }

        // Leftover digits without a unit are invalid
        if !current_num.is_empty() || !found_any || total_secs == 0 {
            return Err(invalid());
        }

        let milliseconds = total_secs.checked_mul(1000).ok_or_else(invalid)?;
        Ok(Self::from_millis(milliseconds))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.as_secs();
        let hours = total_secs / SECS_PER_HOUR;
        let minutes = (total_secs % SECS_PER_HOUR) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            write!(f, "{}h", hours)?;
        }
        if minutes > 0 {
            write!(f, "{}m", minutes)?;
        }
        if seconds > 0 || total_secs == 0 {
            write!(f, "{}s", seconds)?;
        }
        Ok(())
    }
}
