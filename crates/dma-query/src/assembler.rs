//! Conversion of agent records into output frames.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use dma_core::{
    FieldType, Frame, FrameError,
    types::{ClientColumnType, GqiColumnInfo, GqiResultPage, TrendData},
};
use serde_json::Value;

/// Frame type of a GQI column.
#[must_use]
pub const fn field_type(client_type: Option<ClientColumnType>) -> FieldType {
    match client_type {
        Some(ClientColumnType::Number) => FieldType::Number,
        Some(ClientColumnType::Date) => FieldType::Time,
        Some(ClientColumnType::Boolean) => FieldType::Boolean,
        _ => FieldType::String,
    }
}

/// Convert a GQI cell value for its column.
///
/// Strings in `date` columns become epoch milliseconds (or `null` when they
/// cannot be parsed). Everything else is returned unchanged.
#[must_use]
pub fn convert_value(value: Value, client_type: Option<ClientColumnType>) -> Value {
    match (client_type, value) {
        (Some(ClientColumnType::Date), Value::String(s)) => {
            parse_timestamp(&s).map_or(Value::Null, Value::from)
        }
        (_, value) => value,
    }
}

/// Parse a date string to epoch milliseconds.
///
/// Accepts RFC 3339, an ISO 8601 date-time without offset (local time) and a
/// bare `YYYY-MM-DD` date (local midnight).
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Empty frame with one column per GQI column.
#[must_use]
pub fn gqi_frame(ref_id: &str, columns: &[GqiColumnInfo]) -> Frame {
    let mut frame = Frame::new(ref_id);
    for column in columns {
        frame.add_field(
            column.name.clone().unwrap_or_default(),
            field_type(column.client_type),
        );
    }
    frame
}

/// Append the rows of a GQI page.
///
/// Rows without cells are skipped, as are all rows when the session has no
/// column list.
///
/// # Errors
/// Returns error if a row does not have one cell per column.
pub fn append_page(
    frame: &mut Frame,
    columns: Option<&[GqiColumnInfo]>,
    page: &GqiResultPage,
) -> Result<(), FrameError> {
    let Some(columns) = columns else {
        return Ok(());
    };

    let rows = page.rows.iter().flatten().flatten();
    for cells in rows.filter_map(|row| row.cells.as_ref()) {
        if cells.len() != columns.len() {
            return Err(FrameError::ArityMismatch {
                expected: columns.len(),
                actual: cells.len(),
            });
        }
        let values = cells
            .iter()
            .zip(columns)
            .map(|(cell, column)| convert_value(cell.value.clone(), column.client_type))
            .collect();
        frame.append_row(values)?;
    }
    Ok(())
}

/// Frame for a trend reply.
///
/// Columns are `Timespan` and `Avg`, followed by `Min` and `Max` when the
/// reply carries them. Rows follow `Avg`; missing entries are `null`.
///
/// # Errors
/// Returns error if a row cannot be appended.
pub fn trend_frame(ref_id: &str, data: &TrendData) -> Result<Frame, FrameError> {
    let mut frame = Frame::new(ref_id);
    frame.add_field("Timespan", FieldType::Time);
    frame.add_field("Avg", FieldType::Number);
    if data.min.is_some() {
        frame.add_field("Min", FieldType::Number);
    }
    if data.max.is_some() {
        frame.add_field("Max", FieldType::Number);
    }

    if data.no_data == Some(true) {
        return Ok(frame);
    }
    let (Some(avg), Some(timestamps)) = (&data.avg, &data.timestamps) else {
        return Ok(frame);
    };

    for (i, value) in avg.iter().enumerate() {
        let mut row = vec![
            number_at(timestamps, i),
            value.map_or(Value::Null, Value::from),
        ];
        if let Some(min) = &data.min {
            row.push(number_at(min, i));
        }
        if let Some(max) = &data.max {
            row.push(number_at(max, i));
        }
        frame.append_row(row)?;
    }
    Ok(frame)
}

fn number_at<T: Copy + Into<Value>>(series: &[Option<T>], index: usize) -> Value {
    series
        .get(index)
        .copied()
        .flatten()
        .map_or(Value::Null, Into::into)
}
