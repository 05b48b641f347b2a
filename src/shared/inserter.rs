use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ConfigError;
use crate::error::error_codes;
use crate::gateway::{GatewayError, StorageGateway};
use crate::lifecycle::{last_ready, StepComponent};
use crate::readings::{ReadingField, ReadingVector};
use crate::sql;
use crate::timestep::Timestep;

/// Errors that abort a single batch insert
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsertError {
    #[error("Reading {index} ({field}) is NaN at model time {model_time}")]
    InvalidReading {
        index: usize,
        field: ReadingField,
        model_time: f64,
    },

    #[error("Gateway failure: {0}")]
    GatewayFailure(#[from] GatewayError),
}

impl InsertError {
    pub fn code(&self) -> &'static str {
        match self {
            InsertError::InvalidReading { .. } => error_codes::INVALID_READING,
            InsertError::GatewayFailure(err) => err.code(),
        }
    }
}

/// One row of the `Sensor` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertRecord {
    pub sensor_id: i64,
    pub name: String,
    pub room: Option<String>,
    pub timestep: Timestep,
    pub instance_id: i64,
    pub readings: ReadingVector,
}

impl InsertRecord {
    pub fn new(
        name: impl Into<String>,
        timestep: Timestep,
        instance_id: i64,
        readings: ReadingVector,
    ) -> Self {
        Self {
            sensor_id: sql::SENSOR_ID,
            name: name.into(),
            room: None,
            timestep,
            instance_id,
            readings,
        }
    }
}

/// Check every reading, reporting the first one that is NaN
pub fn validate_readings(readings: &ReadingVector, model_time: f64) -> Result<(), InsertError> {
    match readings.first_nan() {
        Some(index) => Err(InsertError::InvalidReading {
            index,
            field: ReadingField::ALL[index],
            model_time,
        }),
        None => Ok(()),
    }
}

/// Look up the id of the active simulation instance, truncated to an integer
pub fn resolve_instance_id<G>(gateway: &G) -> Result<i64, GatewayError>
where
    G: StorageGateway + ?Sized,
{
    let value = gateway.execute_scalar_double(sql::INSTANCE_LOOKUP_QUERY)?;
    if !value.is_finite() {
        return Err(GatewayError::NotNumeric(value.to_string()));
    }
    Ok(value.trunc() as i64)
}

/// Validate `readings`, resolve the instance id and insert one row.
///
/// Nothing touches the gateway until validation passes, and the insert is
/// only issued once the lookup succeeds. The insert is executed once with no
/// retry; committing it is the gateway's business.
pub fn insert_batch<G>(
    gateway: &G,
    readings: &ReadingVector,
    timestep: Timestep,
    model_time: f64,
    sensor_name: &str,
) -> Result<InsertRecord, InsertError>
where
    G: StorageGateway + ?Sized,
{
    validate_readings(readings, model_time)?;

    let instance_id = resolve_instance_id(gateway)?;
    let record = InsertRecord::new(sensor_name, timestep, instance_id, *readings);
    let statement = sql::insert_statement(&record);

    debug!(statement = %statement, "Issuing statement");
    gateway.execute(&statement)?;

    Ok(record)
}

/// Settings for a [`ReadingBatchInserter`]
#[derive(Debug, Clone, PartialEq)]
pub struct InserterConfig {
    table: String,
    clear_on_start: bool,
    sensor_name: String,
}

impl Default for InserterConfig {
    fn default() -> Self {
        Self {
            table: sql::SENSOR_TABLE.to_string(),
            clear_on_start: false,
            sensor_name: sql::DEFAULT_SENSOR_NAME.to_string(),
        }
    }
}

impl InserterConfig {
    /// Use `table` as the clear-on-start target
    pub fn with_table(mut self, table: impl Into<String>) -> Result<Self, ConfigError> {
        let table = table.into();
        if !sql::is_valid_table_name(&table) {
            return Err(ConfigError::InvalidTable(table));
        }
        self.table = table;
        Ok(self)
    }

    /// Delete every row of the table when a run starts
    pub fn with_clear_on_start(mut self, clear: bool) -> Self {
        self.clear_on_start = clear;
        self
    }

    pub fn with_sensor_name(mut self, name: impl Into<String>) -> Self {
        self.sensor_name = name.into();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn clear_on_start(&self) -> bool {
        self.clear_on_start
    }

    pub fn sensor_name(&self) -> &str {
        &self.sensor_name
    }
}

/// Everything delivered to the inserter for one step
#[derive(Debug, Clone, PartialEq)]
pub struct BatchInput {
    pub readings: Option<ReadingVector>,
    /// One optional timestep per input channel
    pub timesteps: Vec<Option<Timestep>>,
    /// Simulated model time, reported with validation failures
    pub model_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Writes one `Sensor` row per step through an injected gateway
#[derive(Debug)]
pub struct ReadingBatchInserter<G> {
    gateway: G,
    config: InserterConfig,
    state: RunState,
    inserted: u64,
}

impl<G: StorageGateway> ReadingBatchInserter<G> {
    pub fn new(gateway: G, config: InserterConfig) -> Self {
        Self {
            gateway,
            config,
            state: RunState::Idle,
            inserted: 0,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &InserterConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Rows inserted during the current (or most recent) run
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    /// The run only counts as started once the clear has succeeded, so a
    /// failed clear is retried before the next batch
    fn begin_run(&mut self) -> Result<(), InsertError> {
        self.state = RunState::Idle;
        self.inserted = 0;

        if self.config.clear_on_start {
            let statement = sql::clear_statement(&self.config.table);
            debug!(statement = %statement, "Issuing statement");
            self.gateway.execute(&statement)?;
            info!(table = %self.config.table, "Cleared table at run start");
        }

        self.state = RunState::Running;
        Ok(())
    }

    /// Validate and insert one batch for the current run
    pub fn insert(
        &mut self,
        readings: &ReadingVector,
        timestep: Timestep,
        model_time: f64,
    ) -> Result<InsertRecord, InsertError> {
        if self.state == RunState::Idle {
            self.begin_run()?;
        }

        match insert_batch(
            &self.gateway,
            readings,
            timestep,
            model_time,
            &self.config.sensor_name,
        ) {
            Ok(record) => {
                self.inserted += 1;
                Ok(record)
            }
            Err(err) => {
                warn!(
                    timestep = %timestep,
                    model_time,
                    error = %err,
                    "Rejected reading batch"
                );
                Err(err)
            }
        }
    }
}

impl<G: StorageGateway> StepComponent for ReadingBatchInserter<G> {
    type Input = BatchInput;
    type Output = Option<InsertRecord>;
    type Error = InsertError;

    fn reset(&mut self) -> Result<(), InsertError> {
        self.begin_run()
    }

    fn step(&mut self, input: BatchInput) -> Result<Option<InsertRecord>, InsertError> {
        let Some(readings) = input.readings else {
            return Ok(None);
        };

        // Without a timestep on any channel the row is written against step 0
        let timestep = last_ready(input.timesteps).unwrap_or_default();
        self.insert(&readings, timestep, input.model_time).map(Some)
    }

    fn finalize(&mut self) -> Result<(), InsertError> {
        if self.state == RunState::Running {
            self.gateway.commit()?;
            info!(inserted = self.inserted, "Recording run finished");
        }
        self.state = RunState::Idle;
        Ok(())
    }
}
