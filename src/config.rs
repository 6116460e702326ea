use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::{holidays::HolidaySet, models::LedgerPeriod, services::ServiceSettings};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub cors_origin: String,
    pub proof_storage_dir: PathBuf,
    pub tesseract_cmd: String,
    pub analysis_timeout: Duration,
    pub utc_offset: FixedOffset,
    pub holidays: HolidaySet,
    pub ledger_period: LedgerPeriod,
    pub default_work_type: String,
    pub seed_work_types: bool,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| "JWT_SECRET must be set".to_string())?;
        if jwt_secret.len() < 16 {
            return Err("JWT_SECRET must be at least 16 characters".to_string());
        }

        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let analysis_timeout = or_default("ANALYSIS_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|_| "ANALYSIS_TIMEOUT_SECS must be a whole number of seconds".to_string())?;

        let utc_offset = parse_utc_offset(&or_default("ATTENDANCE_UTC_OFFSET", "+09:00"))?;
        let holidays = HolidaySet::parse(&or_default("HOLIDAYS", ""))?;
        let ledger_period = or_default("LEDGER_PERIOD", "all").parse::<LedgerPeriod>()?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:8080"),
            cors_origin: or_default("CORS_ORIGIN", "http://localhost:3000"),
            proof_storage_dir: PathBuf::from(or_default("PROOF_STORAGE_DIR", "media/proofs")),
            tesseract_cmd: or_default("TESSERACT_CMD", "tesseract"),
            analysis_timeout: Duration::from_secs(analysis_timeout),
            utc_offset,
            holidays,
            ledger_period,
            default_work_type: or_default("DEFAULT_WORK_TYPE", "Normal work"),
            seed_work_types: parse_flag("SEED_WORK_TYPES", lookup("SEED_WORK_TYPES"))?,
            run_migrations: parse_flag("RUN_MIGRATIONS", lookup("RUN_MIGRATIONS"))?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/attendance_test".to_string()),
            "JWT_SECRET" => Some("router-test-secret-0123456789".to_string()),
            _ => None,
        })
        .expect("test configuration is valid")
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            utc_offset: self.utc_offset,
            ledger_period: self.ledger_period,
            default_work_type: self.default_work_type.clone(),
        }
    }
}

/// Parses `+HH:MM` / `-HH:MM` into a fixed offset.
fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    let invalid = || format!("Invalid ATTENDANCE_UTC_OFFSET '{}', expected +HH:MM", value);

    let (sign, rest) = match value.trim().split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn parse_flag(key: &str, value: Option<String>) -> Result<bool, String> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => Err(format!("{} must be true or false, got '{}'", key, v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/attendance"),
        ("JWT_SECRET", "0123456789abcdef"),
    ];

    #[test]
    fn test_defaults() {
        let config = config(&REQUIRED).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.utc_offset, FixedOffset::east_opt(9 * 3600).unwrap());
        assert_eq!(config.analysis_timeout, Duration::from_secs(10));
        assert_eq!(config.ledger_period, LedgerPeriod::AllTime);
        assert_eq!(config.holidays.len(), 0);
        assert!(!config.seed_work_types);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_required_variables() {
        assert!(config(&[REQUIRED[1]]).unwrap_err().contains("DATABASE_URL"));
        assert!(config(&[REQUIRED[0]]).unwrap_err().contains("JWT_SECRET"));
        assert!(config(&[REQUIRED[0], ("JWT_SECRET", "short")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("ATTENDANCE_UTC_OFFSET", "-05:30"),
            ("HOLIDAYS", "2026-10-03,2026-10-09"),
            ("LEDGER_PERIOD", "year"),
            ("SEED_WORK_TYPES", "true"),
            ("RUN_MIGRATIONS", "1"),
        ]);
        let config = config(&pairs).unwrap();
        assert_eq!(config.utc_offset, FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap());
        assert_eq!(config.holidays.len(), 2);
        assert_eq!(config.ledger_period, LedgerPeriod::CalendarYear);
        assert!(config.seed_work_types && config.run_migrations);
    }

    #[test]
    fn test_utc_offset_parsing() {
        assert!(parse_utc_offset("+00:00").is_ok());
        assert!(parse_utc_offset("09:00").is_err());
        assert!(parse_utc_offset("+9").is_err());
        assert!(parse_utc_offset("+15:00").is_err());
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("X", Some("yes".to_string())).is_err());
        assert!(!parse_flag("X", Some("FALSE".to_string())).unwrap());
    }
}
