use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::gateway::StorageGateway;
use crate::inserter::{BatchInput, InsertError, InsertRecord, ReadingBatchInserter};
use crate::lifecycle::StepComponent;
use crate::readings::ReadingVector;
use crate::timestep::{ConvertError, Timestep, TimestepConverter};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Timestep conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Batch insert failed: {0}")]
    Insert(#[from] InsertError),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Convert(err) => err.code(),
            PipelineError::Insert(err) => err.code(),
        }
    }
}

/// Inputs for one simulation step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInput {
    /// One optional elapsed-time sample per channel
    pub elapsed: Vec<Option<f64>>,
    pub readings: Option<ReadingVector>,
    pub model_time: f64,
}

impl StepInput {
    /// Single-channel step where the elapsed time is also the model time
    pub fn at(elapsed: f64, readings: ReadingVector) -> Self {
        Self {
            elapsed: vec![Some(elapsed)],
            readings: Some(readings),
            model_time: elapsed,
        }
    }
}

/// Counters for a recording run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: u64,
    pub inserted: u64,
    pub last_timestep: Timestep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_record: Option<InsertRecord>,
}

/// Feeds the converter's timestep into the inserter's timestep input
#[derive(Debug)]
pub struct RecordingPipeline<G> {
    converter: TimestepConverter,
    inserter: ReadingBatchInserter<G>,
    summary: RunSummary,
}

impl<G: StorageGateway> RecordingPipeline<G> {
    pub fn new(converter: TimestepConverter, inserter: ReadingBatchInserter<G>) -> Self {
        Self {
            converter,
            inserter,
            summary: RunSummary::default(),
        }
    }

    pub fn converter(&self) -> &TimestepConverter {
        &self.converter
    }

    pub fn inserter(&self) -> &ReadingBatchInserter<G> {
        &self.inserter
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

impl<G: StorageGateway> StepComponent for RecordingPipeline<G> {
    type Input = StepInput;
    type Output = Option<InsertRecord>;
    type Error = PipelineError;

    fn reset(&mut self) -> Result<(), PipelineError> {
        self.summary = RunSummary::default();
        self.converter.reset()?;
        self.inserter.reset()?;
        info!("Recording run started");
        Ok(())
    }

    fn step(&mut self, input: StepInput) -> Result<Option<InsertRecord>, PipelineError> {
        self.summary.steps += 1;

        // A step without an elapsed sample records against the held timestep
        let timestep = self
            .converter
            .step(input.elapsed)?
            .unwrap_or(self.converter.current());
        let record = self.inserter.step(BatchInput {
            readings: input.readings,
            timesteps: vec![Some(timestep)],
            model_time: input.model_time,
        })?;

        self.summary.last_timestep = self.converter.current();
        if let Some(record) = &record {
            self.summary.inserted += 1;
            self.summary.last_record = Some(record.clone());
        }
        Ok(record)
    }

    fn finalize(&mut self) -> Result<(), PipelineError> {
        self.converter.finalize()?;
        self.inserter.finalize()?;
        Ok(())
    }
}
