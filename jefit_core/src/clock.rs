//! Epoch timestamp formatting.

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display format of session start times (`DD/MM/YYYY HH:MM`)
pub const START_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Time zone used to render epoch timestamps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Zone {
    /// The host's local time zone
    #[default]
    Local,
    /// A fixed UTC offset (`utc` is offset zero)
    Fixed(FixedOffset),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }
}

impl FromStr for Zone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Zone::Local),
            "utc" | "z" => Ok(Zone::utc()),
            other => other
                .parse::<FixedOffset>()
                .map(Zone::Fixed)
                .map_err(|e| Error::Config(format!("Invalid timezone '{}': {}", s, e))),
        }
    }
}

impl TryFrom<String> for Zone {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> Self {
        zone.to_string()
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => f.write_str("local"),
            Zone::Fixed(offset) if offset.local_minus_utc() == 0 => f.write_str("utc"),
            Zone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Render a Unix epoch (seconds) as `DD/MM/YYYY HH:MM` in the given zone.
///
/// Returns `None` when the epoch is outside chrono's representable range.
pub fn format_epoch(epoch: i64, zone: Zone) -> Option<String> {
    let utc = DateTime::from_timestamp(epoch, 0)?;
    let formatted = match zone {
        Zone::Local => utc.with_timezone(&Local).format(START_TIME_FORMAT).to_string(),
        Zone::Fixed(offset) => offset
            .from_utc_datetime(&utc.naive_utc())
            .format(START_TIME_FORMAT)
            .to_string(),
    };
    Some(formatted)
}
