//! Mapping between [`CellValue`] and `DuckDB` values.

use chrono::{DateTime, Datelike, NaiveDate};
use duckdb::types::{TimeUnit, Value};
use tabport_core::codec::CellValue;

/// `num_days_from_ce` of 1970-01-01; `DuckDB` dates count days from the epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a typed cell into a bindable `DuckDB` value.
#[must_use]
pub fn to_sql_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Text(text) => Value::Text(text.clone()),
        CellValue::Int(v) => Value::Int(*v),
        CellValue::Long(v) => Value::BigInt(*v),
        CellValue::Double(v) => Value::Double(*v),
        CellValue::Date(date) => {
            Value::Date32(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        }
        CellValue::Timestamp(ts) => {
            Value::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
        }
        CellValue::Bytes(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Convert a value read from a result set into a typed cell.
///
/// Types without a dedicated cell variant are carried as text.
#[must_use]
pub fn from_sql_value(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Boolean(v) => CellValue::Text(v.to_string()),
        Value::TinyInt(v) => CellValue::Int(i32::from(v)),
        Value::SmallInt(v) => CellValue::Int(i32::from(v)),
        Value::Int(v) => CellValue::Int(v),
        Value::UTinyInt(v) => CellValue::Int(i32::from(v)),
        Value::USmallInt(v) => CellValue::Int(i32::from(v)),
        Value::UInt(v) => CellValue::Long(i64::from(v)),
        Value::BigInt(v) => CellValue::Long(v),
        Value::UBigInt(v) => {
            i64::try_from(v).map_or_else(|_| CellValue::Text(v.to_string()), CellValue::Long)
        }
        Value::HugeInt(v) => {
            i64::try_from(v).map_or_else(|_| CellValue::Text(v.to_string()), CellValue::Long)
        }
        Value::Float(v) => CellValue::Double(f64::from(v)),
        Value::Double(v) => CellValue::Double(v),
        Value::Text(text) => CellValue::Text(text),
        Value::Blob(bytes) => CellValue::Bytes(bytes),
        Value::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map_or_else(|| CellValue::Text(days.to_string()), CellValue::Date),
        Value::Timestamp(unit, raw) => DateTime::from_timestamp_micros(to_micros(unit, raw))
            .map_or_else(
                || CellValue::Text(raw.to_string()),
                |dt| CellValue::Timestamp(dt.naive_utc()),
            ),
        other => CellValue::Text(format!("{other:?}")),
    }
}

const fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}
