//! Certificate expiry bands.

use std::fmt::{Display, Formatter};

use proxyboard_api_types::Certificate;
use serde::Serialize;
use time::OffsetDateTime;

const MILLIS_PER_DAY: i128 = 86_400_000;
const CRITICAL_DAYS: i64 = 7;
const WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryBand {
    Expired,
    Critical,
    Warning,
    Ok,
}

impl ExpiryBand {
    pub fn from_days(days: i64) -> Self {
        if days < 0 {
            Self::Expired
        } else if days <= CRITICAL_DAYS {
            Self::Critical
        } else if days <= WARNING_DAYS {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Ok => "ok",
        }
    }
}

impl Display for ExpiryBand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ceil((expires_on - now) / 1 day)`.
pub fn days_until_expiry(expires_on: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let millis = (expires_on - now).whole_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY)
        + i128::from(millis.rem_euclid(MILLIS_PER_DAY) != 0);
    i64::try_from(days).unwrap_or(if days < 0 { i64::MIN } else { i64::MAX })
}

/// Derived, never persisted. Certificates without an expiry have no band.
pub fn expiry_status(certificate: &Certificate, now: OffsetDateTime) -> Option<(i64, ExpiryBand)> {
    certificate.expires_on.map(|expires_on| {
        let days = days_until_expiry(expires_on, now);
        (days, ExpiryBand::from_days(days))
    })
}
