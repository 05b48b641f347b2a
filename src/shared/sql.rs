//! Fixed SQL shapes understood by the existing `Sensor` schema.
//!
//! Statements are assembled as text because the storage gateway only accepts
//! complete statements. Every value interpolated here is either a validated
//! number, a validated identifier, or an escaped string literal.

use regex::Regex;
use std::sync::OnceLock;

use crate::inserter::InsertRecord;
use crate::readings::ReadingField;

/// Resolves the id of the simulation instance currently being recorded
pub const INSTANCE_LOOKUP_QUERY: &str = "select idInstance from Instance where begin = 1";

/// Table every reading row is inserted into
pub const SENSOR_TABLE: &str = "Sensor";

/// Sensor id written with every row
pub const SENSOR_ID: i64 = 1;

/// Sensor name written with every row
pub const DEFAULT_SENSOR_NAME: &str = "unknown";

/// Misspelled sensor name emitted by earlier recorders; use it only when a
/// downstream consumer matches on the exact bytes
pub const LEGACY_SENSOR_NAME: &str = "unknow";

/// Columns preceding the reading fields, in insert order
pub const KEY_COLUMNS: [&str; 5] = [
    "idSensor",
    "name",
    "room",
    "Timestep_idTimestep",
    "Timestep_Instance_idInstance",
];

/// Check that a table name is a plain (optionally schema-qualified) identifier
pub fn is_valid_table_name(table: &str) -> bool {
    static TABLE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TABLE_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap()
    });
    regex.is_match(table)
}

/// Statement that deletes every row of `table`.
///
/// Callers are expected to have validated `table` with [`is_valid_table_name`].
pub fn clear_statement(table: &str) -> String {
    format!("delete from {};", table)
}

/// Full column list of the `Sensor` table, in insert order
pub fn insert_columns() -> Vec<&'static str> {
    KEY_COLUMNS
        .iter()
        .copied()
        .chain(ReadingField::ALL.iter().map(|f| f.column()))
        .collect()
}

/// Render a string as a single-quoted SQL literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Literal that overflows to positive infinity when parsed as a double
pub const INFINITY_LITERAL: &str = "9e999";

/// Render a non-NaN reading as a SQL numeric literal.
///
/// Shortest round-trip formatting always keeps a decimal point or exponent,
/// so the database never reads the value back as an integer. Infinities have
/// no literal of their own and are written as an overflowing exponent.
pub fn number_literal(value: f64) -> String {
    if value == f64::INFINITY {
        INFINITY_LITERAL.to_string()
    } else if value == f64::NEG_INFINITY {
        format!("-{}", INFINITY_LITERAL)
    } else {
        format!("{:?}", value)
    }
}

/// Statement inserting one row built from `record`
pub fn insert_statement(record: &InsertRecord) -> String {
    let room = match &record.room {
        Some(room) => quote_literal(room),
        None => "null".to_string(),
    };

    let mut values = vec![
        record.sensor_id.to_string(),
        quote_literal(&record.name),
        room,
        record.timestep.to_string(),
        record.instance_id.to_string(),
    ];
    values.extend(record.readings.values().iter().map(|v| number_literal(*v)));

    format!(
        "insert into {}  ( {} ) values ( {} )",
        SENSOR_TABLE,
        insert_columns().join(", "),
        values.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::ReadingVector;
    use crate::timestep::Timestep;

    fn record(name: &str) -> InsertRecord {
        let mut values = [0.0; 15];
        for (i, v) in values.iter_mut().enumerate() {
            *v = (i + 1) as f64;
        }
        InsertRecord::new(name, Timestep(5), 2, ReadingVector::new(values))
    }

    #[test]
    fn test_insert_statement_matches_schema() {
        let sql = insert_statement(&record(DEFAULT_SENSOR_NAME));
        assert_eq!(
            sql,
            "insert into Sensor  ( idSensor, name, room, Timestep_idTimestep, \
             Timestep_Instance_idInstance, Environment, Kitchen, Living, Corridor, Study, \
             Bath1, Bedroom1, Bedroom2, Bedroom3, Bedroom4, Bath2, StorageTankHeating1, \
             StorageTankHeating2, EMS_PVProductionEMS, EMS_BuildingConsumption ) \
             values ( 1, 'unknown', null, 5, 2, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, \
             9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0 )"
        );
    }

    #[test]
    fn test_insert_statement_legacy_name() {
        let sql = insert_statement(&record(LEGACY_SENSOR_NAME));
        assert!(sql.contains("values ( 1, 'unknow', null, 5, 2, 1.0"));
    }

    #[test]
    fn test_insert_columns_count() {
        let columns = insert_columns();
        assert_eq!(columns.len(), 20);
        assert_eq!(columns[4], "Timestep_Instance_idInstance");
        assert_eq!(columns[5], "Environment");
        assert_eq!(columns[19], "EMS_BuildingConsumption");
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(number_literal(21.5), "21.5");
        assert_eq!(number_literal(-3.0), "-3.0");
        assert_eq!(number_literal(0.0), "0.0");
        assert_eq!(number_literal(1e-7), "1e-7");
        assert_eq!(number_literal(f64::INFINITY), "9e999");
        assert_eq!(number_literal(f64::NEG_INFINITY), "-9e999");
    }

    #[test]
    fn test_quote_literal_escapes() {
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn test_clear_statement() {
        assert_eq!(clear_statement("Sensor"), "delete from Sensor;");
    }

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("Sensor"));
        assert!(is_valid_table_name("sim.Sensor_2"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("2Sensor"));
        assert!(!is_valid_table_name("Sensor; drop table Instance"));
        assert!(!is_valid_table_name("a.b.c"));
    }
}
