// src/settings.rs
use chrono::Weekday;
use serde::Deserialize;

/// Environment-level conventions the engine needs pinned explicitly rather
/// than inherited from a platform calendar default.
///
/// `default_start_year` bounds the fallback date range used when a report has
/// no parseable date input and no work records to derive a range from.
/// `week_start` fixes which weekday opens a weekly report column; the UK tax
/// year boundary (6 April) is a constant in the period module.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    pub default_start_year: i32,
    pub week_start: Weekday,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_start_year: 2008,
            week_start: Weekday::Mon,
        }
    }
}

impl EngineSettings {
    /// Load settings from `HOURGRID_`-prefixed environment variables,
    /// e.g. `HOURGRID_DEFAULT_START_YEAR=2010`, `HOURGRID_WEEK_START=sun`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("HOURGRID_").from_env::<EngineSettings>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_monday_weeks_from_2008() {
        let settings = EngineSettings::default();
        assert_eq!(settings.default_start_year, 2008);
        assert_eq!(settings.week_start, Weekday::Mon);
    }
}
