//! Test utilities for property-based testing
//!
//! This module provides proptest generators for elapsed times and reading
//! vectors, fixed reading fixtures, and a `RecordingGateway` that records
//! every storage call so tests can assert on ordering and content.

pub mod generators {
    use proptest::prelude::*;

    use crate::readings::{ReadingVector, READING_WIDTH};

    /// Generate a finite, non-negative elapsed time in seconds
    /// Range: up to ten simulated years
    pub fn elapsed_seconds() -> impl Strategy<Value = f64> {
        0.0..315_360_000.0f64
    }

    /// Generate a negative elapsed time
    pub fn negative_elapsed_seconds() -> impl Strategy<Value = f64> {
        -315_360_000.0..-0.001f64
    }

    /// Generate a non-finite value
    pub fn non_finite() -> impl Strategy<Value = f64> {
        prop_oneof![
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
        ]
    }

    /// Generate a plausible sensor or energy reading
    pub fn reading_value() -> impl Strategy<Value = f64> {
        -50.0..5000.0f64
    }

    /// Generate a reading vector with every value finite
    pub fn reading_vector() -> impl Strategy<Value = ReadingVector> {
        prop::array::uniform15(reading_value()).prop_map(ReadingVector::new)
    }

    /// Generate a reading or an infinity, never NaN
    pub fn reading_value_or_infinite() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => reading_value(),
            1 => Just(f64::INFINITY),
            1 => Just(f64::NEG_INFINITY),
        ]
    }

    /// Generate a reading vector with no NaN, infinities allowed
    pub fn reading_vector_without_nan() -> impl Strategy<Value = ReadingVector> {
        prop::array::uniform15(reading_value_or_infinite()).prop_map(ReadingVector::new)
    }

    /// Generate a reading vector with a NaN at the returned index and no NaN
    /// before it
    pub fn invalid_reading_vector() -> impl Strategy<Value = (ReadingVector, usize)> {
        (
            prop::array::uniform15(reading_value_or_infinite()),
            0..READING_WIDTH,
            prop::collection::vec(any::<bool>(), READING_WIDTH),
        )
            .prop_map(|(mut values, index, later_bad)| {
                values[index] = f64::NAN;
                // Sprinkle more NaNs after the first so "first" is exercised
                for (i, poison) in later_bad.into_iter().enumerate() {
                    if i > index && poison {
                        values[i] = f64::NAN;
                    }
                }
                (ReadingVector::new(values), index)
            })
    }

    /// Generate an instance id as a database would return it
    pub fn instance_id() -> impl Strategy<Value = f64> {
        (1i64..10_000).prop_map(|id| id as f64)
    }

    /// Generate a timestep index
    pub fn timestep() -> impl Strategy<Value = i64> {
        0i64..350_000
    }
}

pub mod fixtures {
    use crate::readings::{ReadingVector, READING_WIDTH};

    /// Readings 1.0 through 15.0 in vector order
    pub fn sequential_readings() -> ReadingVector {
        let mut values = [0.0; READING_WIDTH];
        for (i, v) in values.iter_mut().enumerate() {
            *v = (i + 1) as f64;
        }
        ReadingVector::new(values)
    }

    /// Sequential readings with `value` placed at `index`
    pub fn readings_with(index: usize, value: f64) -> ReadingVector {
        let mut values = *sequential_readings().values();
        values[index] = value;
        ReadingVector::new(values)
    }
}

pub mod gateway {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::gateway::{GatewayError, StorageGateway};

    /// A storage call observed by [`RecordingGateway`]
    #[derive(Debug, Clone, PartialEq)]
    pub enum GatewayCall {
        Scalar(String),
        Execute(String),
        Commit,
    }

    #[derive(Debug, Default)]
    struct State {
        calls: Vec<GatewayCall>,
        lookups: VecDeque<Result<f64, GatewayError>>,
        instance: Option<f64>,
        executes: VecDeque<Result<(), GatewayError>>,
        execute_failure: Option<GatewayError>,
    }

    /// In-memory gateway that records every call.
    ///
    /// Scalar queries answer from queued results first, then from the
    /// configured instance id, and fail with `NoRows` when neither is set.
    #[derive(Debug, Default)]
    pub struct RecordingGateway {
        state: Mutex<State>,
    }

    impl RecordingGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Gateway whose lookups always return `instance`
        pub fn with_instance(instance: f64) -> Self {
            let gateway = Self::new();
            gateway.state.lock().unwrap().instance = Some(instance);
            gateway
        }

        /// Queue a result for the next scalar query
        pub fn push_lookup(&self, result: Result<f64, GatewayError>) {
            self.state.lock().unwrap().lookups.push_back(result);
        }

        /// Queue a result for the next `execute`
        pub fn push_execute(&self, result: Result<(), GatewayError>) {
            self.state.lock().unwrap().executes.push_back(result);
        }

        /// Make every subsequent `execute` fail with `error`
        pub fn fail_execute(&self, error: GatewayError) {
            self.state.lock().unwrap().execute_failure = Some(error);
        }

        pub fn calls(&self) -> Vec<GatewayCall> {
            self.state.lock().unwrap().calls.clone()
        }

        /// Statements passed to `execute`, in order
        pub fn executed(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    GatewayCall::Execute(statement) => Some(statement),
                    _ => None,
                })
                .collect()
        }

        /// Queries passed to `execute_scalar_double`, in order
        pub fn lookups(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    GatewayCall::Scalar(query) => Some(query),
                    _ => None,
                })
                .collect()
        }
    }

    impl StorageGateway for RecordingGateway {
        fn execute_scalar_double(&self, query: &str) -> Result<f64, GatewayError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(GatewayCall::Scalar(query.to_string()));
            if let Some(result) = state.lookups.pop_front() {
                return result;
            }
            state.instance.ok_or(GatewayError::NoRows)
        }

        fn execute(&self, statement: &str) -> Result<(), GatewayError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(GatewayCall::Execute(statement.to_string()));
            if let Some(result) = state.executes.pop_front() {
                return result;
            }
            match &state.execute_failure {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn commit(&self) -> Result<(), GatewayError> {
            self.state.lock().unwrap().calls.push(GatewayCall::Commit);
            Ok(())
        }
    }
}
