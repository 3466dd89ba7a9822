use serde::{Deserialize, Serialize};

/// Time window over which ranked listening statistics are aggregated.
///
/// The variants mirror the scrobbling service's own period tokens; nothing
/// outside this set is ever sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "overall")]
    Overall,
    #[serde(rename = "7day")]
    SevenDays,
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "3month")]
    ThreeMonths,
    #[serde(rename = "6month")]
    SixMonths,
    #[serde(rename = "12month")]
    TwelveMonths,
}

impl Period {
    /// Window used when a request carries no period or an unknown one.
    pub const DEFAULT: Period = Period::SevenDays;

    pub fn as_api_token(&self) -> &'static str {
        match self {
            Period::Overall => "overall",
            Period::SevenDays => "7day",
            Period::OneMonth => "1month",
            Period::ThreeMonths => "3month",
            Period::SixMonths => "6month",
            Period::TwelveMonths => "12month",
        }
    }

    fn from_token(token: &str) -> Option<Period> {
        match token {
            "overall" => Some(Period::Overall),
            "7day" => Some(Period::SevenDays),
            "1month" => Some(Period::OneMonth),
            "3month" => Some(Period::ThreeMonths),
            "6month" => Some(Period::SixMonths),
            "12month" => Some(Period::TwelveMonths),
            _ => None,
        }
    }

    /// Resolves a client-supplied period token to a known-safe window.
    ///
    /// A missing or unrecognized token yields [`Period::DEFAULT`]; a valid
    /// token is returned unchanged. Total, no failure path.
    pub fn normalize(requested: Option<&str>) -> Period {
        requested.and_then(Period::from_token).unwrap_or(Period::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Period; 6] = [
        Period::Overall,
        Period::SevenDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::TwelveMonths,
    ];

    #[test]
    fn valid_tokens_pass_through_unchanged() {
        for period in ALL {
            assert_eq!(Period::normalize(Some(period.as_api_token())), period);
        }
    }

    #[test]
    fn absent_token_falls_back_to_default() {
        assert_eq!(Period::normalize(None), Period::SevenDays);
    }

    #[test]
    fn unknown_tokens_fall_back_to_default() {
        for bogus in ["bogus", "", "7 day", "7DAY", "2month", "week"] {
            assert_eq!(Period::normalize(Some(bogus)), Period::DEFAULT);
        }
    }

    #[test]
    fn tokens_round_trip_through_serde() {
        for period in ALL {
            let json = serde_json::to_string(&period).unwrap();
            assert_eq!(json, format!("\"{}\"", period.as_api_token()));
            let back: Period = serde_json::from_str(&json).unwrap();
            assert_eq!(back, period);
        }
    }
}
