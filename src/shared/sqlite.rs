use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use crate::gateway::{GatewayError, StorageGateway};

/// Storage gateway over a single SQLite connection.
///
/// SQLite runs in autocommit mode here, so every executed statement is
/// durable as soon as `execute` returns and `commit` has nothing to do.
#[derive(Debug)]
pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

impl SqliteGateway {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, GatewayError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| GatewayError::Storage("connection lock poisoned".to_string()))?;
        f(&conn)
    }
}

impl StorageGateway for SqliteGateway {
    fn execute_scalar_double(&self, query: &str) -> Result<f64, GatewayError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(query)?;
            let mut rows = stmt.query([])?;

            let value = match rows.next()? {
                Some(row) => match row.get_ref(0)? {
                    ValueRef::Integer(i) => i as f64,
                    ValueRef::Real(f) => f,
                    other => {
                        return Err(GatewayError::NotNumeric(format!("{:?}", other.data_type())))
                    }
                },
                None => return Err(GatewayError::NoRows),
            };

            let mut count = 1;
            while rows.next()?.is_some() {
                count += 1;
            }
            if count > 1 {
                return Err(GatewayError::TooManyRows(count));
            }

            Ok(value)
        })
    }

    fn execute(&self, statement: &str) -> Result<(), GatewayError> {
        self.with_conn(|conn| {
            conn.execute_batch(statement)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> SqliteGateway {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        gateway
            .execute("create table Instance (idInstance integer, begin integer, label text);")
            .unwrap();
        gateway
    }

    #[test]
    fn test_scalar_single_row() {
        let gateway = gateway();
        gateway
            .execute("insert into Instance values (4, 1, 'a'), (5, 0, 'b');")
            .unwrap();

        let value = gateway
            .execute_scalar_double("select idInstance from Instance where begin = 1")
            .unwrap();
        assert_eq!(value, 4.0);
    }

    #[test]
    fn test_scalar_no_rows() {
        let gateway = gateway();
        let result = gateway.execute_scalar_double("select idInstance from Instance where begin = 1");
        assert_eq!(result, Err(GatewayError::NoRows));
    }

    #[test]
    fn test_scalar_too_many_rows() {
        let gateway = gateway();
        gateway
            .execute("insert into Instance values (4, 1, 'a'), (5, 1, 'b'), (6, 1, 'c');")
            .unwrap();

        let result = gateway.execute_scalar_double("select idInstance from Instance where begin = 1");
        assert_eq!(result, Err(GatewayError::TooManyRows(3)));
    }

    #[test]
    fn test_scalar_non_numeric() {
        let gateway = gateway();
        gateway
            .execute("insert into Instance values (4, 1, 'a');")
            .unwrap();

        let result = gateway.execute_scalar_double("select label from Instance");
        assert!(matches!(result, Err(GatewayError::NotNumeric(_))));
    }

    #[test]
    fn test_execute_reports_storage_errors() {
        let gateway = gateway();
        let result = gateway.execute("insert into Missing values (1);");
        assert!(matches!(result, Err(GatewayError::Storage(_))));
    }
}
