use std::path::PathBuf;

use crate::error::error_codes;
use crate::inserter::InserterConfig;
use crate::sql;
use crate::timestep::{TimestepConverter, DEFAULT_TIMESTEP_SECONDS};

pub const DATABASE_VAR: &str = "RECORDER_DATABASE";
pub const TABLE_VAR: &str = "RECORDER_TABLE";
pub const CLEAR_VAR: &str = "RECORDER_CLEAR";
pub const SENSOR_NAME_VAR: &str = "RECORDER_SENSOR_NAME";
pub const TIMESTEP_SECONDS_VAR: &str = "RECORDER_TIMESTEP_SECONDS";

/// Configuration for a recording run
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Table cleared at run start when `clear_on_start` is set
    pub table: String,
    /// Delete every row of `table` before the first batch
    pub clear_on_start: bool,
    /// Value written to the `name` column
    pub sensor_name: String,
    /// Length of one timestep in seconds
    pub timestep_seconds: f64,
}

impl RecorderConfig {
    /// Create a new RecorderConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(DATABASE_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_VAR.to_string()))?;

        let table = lookup(TABLE_VAR).unwrap_or_else(|| sql::SENSOR_TABLE.to_string());
        if !sql::is_valid_table_name(&table) {
            return Err(ConfigError::InvalidTable(table));
        }

        let clear_on_start = match lookup(CLEAR_VAR) {
            Some(value) => parse_bool(CLEAR_VAR, &value)?,
            None => false,
        };

        let sensor_name =
            lookup(SENSOR_NAME_VAR).unwrap_or_else(|| sql::DEFAULT_SENSOR_NAME.to_string());

        let timestep_seconds = match lookup(TIMESTEP_SECONDS_VAR) {
            Some(value) => {
                let seconds = value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| invalid(TIMESTEP_SECONDS_VAR, &value))?;
                if !seconds.is_finite() || seconds <= 0.0 {
                    return Err(invalid(TIMESTEP_SECONDS_VAR, &value));
                }
                seconds
            }
            None => DEFAULT_TIMESTEP_SECONDS,
        };

        Ok(RecorderConfig {
            database_path,
            table,
            clear_on_start,
            sensor_name,
            timestep_seconds,
        })
    }

    /// Settings for the batch inserter
    pub fn inserter(&self) -> Result<InserterConfig, ConfigError> {
        Ok(InserterConfig::default()
            .with_table(self.table.clone())?
            .with_clear_on_start(self.clear_on_start)
            .with_sensor_name(self.sensor_name.clone()))
    }

    /// A converter using the configured interval
    pub fn converter(&self) -> Result<TimestepConverter, ConfigError> {
        TimestepConverter::with_interval(self.timestep_seconds)
            .map_err(|_| invalid(TIMESTEP_SECONDS_VAR, &self.timestep_seconds.to_string()))
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(invalid(var, value)),
    }
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },

    #[error("Table name must be a plain identifier: {0:?}")]
    InvalidTable(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::MissingEnvVar(_) => error_codes::MISSING_ENV_VAR,
            ConfigError::InvalidValue { .. } => error_codes::INVALID_CONFIG,
            ConfigError::InvalidTable(_) => error_codes::INVALID_TABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_missing_database() {
        let result = RecorderConfig::from_lookup(lookup(&[]));
        assert_eq!(
            result,
            Err(ConfigError::MissingEnvVar("RECORDER_DATABASE".to_string()))
        );
        assert_eq!(result.unwrap_err().code(), "MISSING_ENV_VAR");
    }

    #[test]
    fn test_config_defaults() {
        let config = RecorderConfig::from_lookup(lookup(&[(DATABASE_VAR, "sim.db")])).unwrap();

        assert_eq!(config.database_path, PathBuf::from("sim.db"));
        assert_eq!(config.table, "Sensor");
        assert!(!config.clear_on_start);
        assert_eq!(config.sensor_name, "unknown");
        assert_eq!(config.timestep_seconds, 900.0);
    }

    #[test]
    fn test_config_overrides() {
        let config = RecorderConfig::from_lookup(lookup(&[
            (DATABASE_VAR, "/tmp/run.db"),
            (TABLE_VAR, "SensorArchive"),
            (CLEAR_VAR, "TRUE"),
            (SENSOR_NAME_VAR, "unknow"),
            (TIMESTEP_SECONDS_VAR, "60"),
        ]))
        .unwrap();

        assert_eq!(config.table, "SensorArchive");
        assert!(config.clear_on_start);
        assert_eq!(config.sensor_name, "unknow");
        assert_eq!(config.timestep_seconds, 60.0);

        let inserter = config.inserter().unwrap();
        assert_eq!(inserter.table(), "SensorArchive");
        assert!(inserter.clear_on_start());
        assert_eq!(config.converter().unwrap().interval(), 60.0);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let result = RecorderConfig::from_lookup(lookup(&[
            (DATABASE_VAR, "sim.db"),
            (CLEAR_VAR, "maybe"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = RecorderConfig::from_lookup(lookup(&[
            (DATABASE_VAR, "sim.db"),
            (TIMESTEP_SECONDS_VAR, "-5"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = RecorderConfig::from_lookup(lookup(&[
            (DATABASE_VAR, "sim.db"),
            (TABLE_VAR, "Sensor where 1=1"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidTable(_))));
    }
}
