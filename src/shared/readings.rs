use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::error_codes;

/// Number of values in one reading vector
pub const READING_WIDTH: usize = 15;

/// Named position inside a reading vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingField {
    Environment,
    Kitchen,
    Living,
    Corridor,
    Study,
    Bath1,
    Bedroom1,
    Bedroom2,
    Bedroom3,
    Bedroom4,
    Bath2,
    StorageTank1,
    StorageTank2,
    PvProduction,
    BuildingConsumption,
}

impl ReadingField {
    /// All fields in vector order
    pub const ALL: [ReadingField; READING_WIDTH] = [
        ReadingField::Environment,
        ReadingField::Kitchen,
        ReadingField::Living,
        ReadingField::Corridor,
        ReadingField::Study,
        ReadingField::Bath1,
        ReadingField::Bedroom1,
        ReadingField::Bedroom2,
        ReadingField::Bedroom3,
        ReadingField::Bedroom4,
        ReadingField::Bath2,
        ReadingField::StorageTank1,
        ReadingField::StorageTank2,
        ReadingField::PvProduction,
        ReadingField::BuildingConsumption,
    ];

    pub fn at(index: usize) -> Option<ReadingField> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ReadingField::Environment => "environment",
            ReadingField::Kitchen => "kitchen",
            ReadingField::Living => "living",
            ReadingField::Corridor => "corridor",
            ReadingField::Study => "study",
            ReadingField::Bath1 => "bath1",
            ReadingField::Bedroom1 => "bedroom1",
            ReadingField::Bedroom2 => "bedroom2",
            ReadingField::Bedroom3 => "bedroom3",
            ReadingField::Bedroom4 => "bedroom4",
            ReadingField::Bath2 => "bath2",
            ReadingField::StorageTank1 => "storage_tank1",
            ReadingField::StorageTank2 => "storage_tank2",
            ReadingField::PvProduction => "pv_production",
            ReadingField::BuildingConsumption => "building_consumption",
        }
    }

    /// Column in the `Sensor` table this field is written to
    pub fn column(self) -> &'static str {
        match self {
            ReadingField::Environment => "Environment",
            ReadingField::Kitchen => "Kitchen",
            ReadingField::Living => "Living",
            ReadingField::Corridor => "Corridor",
            ReadingField::Study => "Study",
            ReadingField::Bath1 => "Bath1",
            ReadingField::Bedroom1 => "Bedroom1",
            ReadingField::Bedroom2 => "Bedroom2",
            ReadingField::Bedroom3 => "Bedroom3",
            ReadingField::Bedroom4 => "Bedroom4",
            ReadingField::Bath2 => "Bath2",
            ReadingField::StorageTank1 => "StorageTankHeating1",
            ReadingField::StorageTank2 => "StorageTankHeating2",
            ReadingField::PvProduction => "EMS_PVProductionEMS",
            ReadingField::BuildingConsumption => "EMS_BuildingConsumption",
        }
    }
}

impl fmt::Display for ReadingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadingError {
    #[error("Reading vector must have {expected} values, got {actual}")]
    Width { expected: usize, actual: usize },
}

impl ReadingError {
    pub fn code(&self) -> &'static str {
        match self {
            ReadingError::Width { .. } => error_codes::INVALID_WIDTH,
        }
    }
}

/// Fixed-width set of instantaneous sensor and energy values for one timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingVector([f64; READING_WIDTH]);

impl ReadingVector {
    pub fn new(values: [f64; READING_WIDTH]) -> Self {
        Self(values)
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, ReadingError> {
        let values: [f64; READING_WIDTH] =
            values.try_into().map_err(|_| ReadingError::Width {
                expected: READING_WIDTH,
                actual: values.len(),
            })?;
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64; READING_WIDTH] {
        &self.0
    }

    pub fn get(&self, field: ReadingField) -> f64 {
        // Discriminants follow vector order
        self.0[field as usize]
    }

    /// Fields paired with their values, in vector order
    pub fn fields(&self) -> impl Iterator<Item = (ReadingField, f64)> + '_ {
        ReadingField::ALL.iter().copied().zip(self.0.iter().copied())
    }

    /// Index of the first NaN value, if any
    pub fn first_nan(&self) -> Option<usize> {
        self.0.iter().position(|v| v.is_nan())
    }
}

impl TryFrom<Vec<f64>> for ReadingVector {
    type Error = ReadingError;

    fn try_from(values: Vec<f64>) -> Result<Self, ReadingError> {
        Self::from_slice(&values)
    }
}
