use std::sync::Arc;
use thiserror::Error;

use crate::error::error_codes;

/// Storage-layer errors reported by a gateway
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Scalar query returned no rows")]
    NoRows,

    #[error("Scalar query returned {0} rows, expected exactly one")]
    TooManyRows(usize),

    #[error("Scalar query returned a non-numeric value: {0}")]
    NotNumeric(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Storage(_) => error_codes::DATABASE_ERROR,
            GatewayError::NoRows => error_codes::NO_INSTANCE,
            GatewayError::TooManyRows(_) => error_codes::AMBIGUOUS_INSTANCE,
            GatewayError::NotNumeric(_) => error_codes::NOT_NUMERIC,
        }
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        GatewayError::Storage(err.to_string())
    }
}

/// Abstraction over the relational store the recorder writes to.
///
/// Gateways may be shared between many components, so every operation takes
/// `&self`; implementations serialize access internally. Statements are
/// committed as they are executed unless the implementation says otherwise.
pub trait StorageGateway {
    /// Run a query expected to produce exactly one row with one numeric column
    fn execute_scalar_double(&self, query: &str) -> Result<f64, GatewayError>;

    /// Run a statement that produces no rows
    fn execute(&self, statement: &str) -> Result<(), GatewayError>;

    /// Make everything executed so far durable
    fn commit(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

impl<G: StorageGateway + ?Sized> StorageGateway for &G {
    fn execute_scalar_double(&self, query: &str) -> Result<f64, GatewayError> {
        (**self).execute_scalar_double(query)
    }

    fn execute(&self, statement: &str) -> Result<(), GatewayError> {
        (**self).execute(statement)
    }

    fn commit(&self) -> Result<(), GatewayError> {
        (**self).commit()
    }
}

impl<G: StorageGateway + ?Sized> StorageGateway for Box<G> {
    fn execute_scalar_double(&self, query: &str) -> Result<f64, GatewayError> {
        (**self).execute_scalar_double(query)
    }

    fn execute(&self, statement: &str) -> Result<(), GatewayError> {
        (**self).execute(statement)
    }

    fn commit(&self) -> Result<(), GatewayError> {
        (**self).commit()
    }
}

impl<G: StorageGateway + ?Sized> StorageGateway for Arc<G> {
    fn execute_scalar_double(&self, query: &str) -> Result<f64, GatewayError> {
        (**self).execute_scalar_double(query)
    }

    fn execute(&self, statement: &str) -> Result<(), GatewayError> {
        (**self).execute(statement)
    }

    fn commit(&self) -> Result<(), GatewayError> {
        (**self).commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGateway(f64);

    impl StorageGateway for FixedGateway {
        fn execute_scalar_double(&self, _query: &str) -> Result<f64, GatewayError> {
            Ok(self.0)
        }

        fn execute(&self, _statement: &str) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[test]
    fn test_gateway_through_pointers() {
        let gateway = FixedGateway(4.0);
        assert_eq!((&gateway).execute_scalar_double("q").unwrap(), 4.0);

        let boxed: Box<dyn StorageGateway> = Box::new(FixedGateway(5.0));
        assert_eq!(boxed.execute_scalar_double("q").unwrap(), 5.0);
        assert!(boxed.commit().is_ok());

        let shared = Arc::new(FixedGateway(6.0));
        assert_eq!(shared.execute_scalar_double("q").unwrap(), 6.0);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GatewayError::NoRows.code(), "NO_INSTANCE");
        assert_eq!(GatewayError::TooManyRows(2).code(), "AMBIGUOUS_INSTANCE");
        assert_eq!(
            GatewayError::Storage("disk full".to_string()).code(),
            "DATABASE_ERROR"
        );
    }
}
