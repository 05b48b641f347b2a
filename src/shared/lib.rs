// Declare modules at the root level
pub mod config;
pub mod error;
pub mod gateway;
pub mod inserter;
pub mod lifecycle;
pub mod pipeline;
pub mod readings;
pub mod sql;
pub mod sqlite;
pub mod timestep;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Also re-export the main types at root for convenience
pub use config::{ConfigError, RecorderConfig};
pub use error::{error_codes, ErrorReport};
pub use gateway::{GatewayError, StorageGateway};
pub use inserter::{
    insert_batch, BatchInput, InsertError, InsertRecord, InserterConfig, ReadingBatchInserter,
    RunState,
};
pub use lifecycle::{last_ready, StepComponent};
pub use pipeline::{PipelineError, RecordingPipeline, RunSummary, StepInput};
pub use readings::{ReadingError, ReadingField, ReadingVector, READING_WIDTH};
pub use sqlite::SqliteGateway;
pub use timestep::{timestep_for, ConvertError, Timestep, TimestepConverter};
