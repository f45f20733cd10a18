// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Conversion of typed OpenShift objects to Arrow RecordBatches
//!
//! Each object is projected through its table's column list. Column types map
//! to native Arrow types:
//!
//! - text → Utf8
//! - integer → Int64
//! - boolean → Boolean
//! - timestamp → Timestamp(Millisecond), always UTC
//! - json → Utf8 holding serialized JSON, queried with json_get_* functions
//!   or the `->`/`->>` operators, e.g.
//!   `SELECT spec_to->>'name' FROM openshift_route`

use std::sync::Arc;

use datafusion::arrow::array::{
    ArrayRef, BooleanBuilder, Int64Builder, RecordBatch, StringBuilder,
    TimestampMillisecondBuilder,
};
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use datafusion::error::Result;

use crate::openshift::resources::{Cell, Column, ColumnType};

/// Map a column type to its Arrow type
pub fn column_data_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Text | ColumnType::Json => DataType::Utf8,
        ColumnType::Int => DataType::Int64,
        ColumnType::Bool => DataType::Boolean,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, None),
    }
}

/// Arrow schema for a column table; every column is nullable
pub fn to_arrow_schema<K>(columns: &[Column<K>]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|col| Field::new(col.name, column_data_type(col.column_type), true))
        .collect();

    Arc::new(Schema::new(fields))
}

/// Project `rows` through `columns` into one RecordBatch
pub fn to_record_batch<K>(
    columns: &[Column<K>],
    schema: SchemaRef,
    rows: &[K],
) -> Result<RecordBatch> {
    if rows.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|col| {
            let mut builder = ColumnBuilder::new(col.column_type, rows.len());
            for row in rows {
                builder.append((col.project)(row));
            }
            builder.finish()
        })
        .collect();

    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Typed Arrow builder for one column
///
/// A cell whose variant does not match the column type is stored as null.
enum ColumnBuilder {
    Text(StringBuilder),
    Int(Int64Builder),
    Bool(BooleanBuilder),
    Timestamp(TimestampMillisecondBuilder),
}

impl ColumnBuilder {
    fn new(column_type: ColumnType, capacity: usize) -> Self {
        match column_type {
            // 32 bytes per value is a rough guess; the builder grows as needed
            ColumnType::Text | ColumnType::Json => {
                ColumnBuilder::Text(StringBuilder::with_capacity(capacity, capacity * 32))
            }
            ColumnType::Int => ColumnBuilder::Int(Int64Builder::with_capacity(capacity)),
            ColumnType::Bool => ColumnBuilder::Bool(BooleanBuilder::with_capacity(capacity)),
            ColumnType::Timestamp => {
                ColumnBuilder::Timestamp(TimestampMillisecondBuilder::with_capacity(capacity))
            }
        }
    }

    fn append(&mut self, cell: Cell) {
        match (self, cell) {
            (ColumnBuilder::Text(b), Cell::Text(s)) => b.append_value(s),
            (ColumnBuilder::Text(b), Cell::Json(v)) => match serde_json::to_string(&v) {
                Ok(s) => b.append_value(s),
                Err(_) => b.append_null(),
            },
            (ColumnBuilder::Int(b), Cell::Int(i)) => b.append_value(i),
            (ColumnBuilder::Bool(b), Cell::Bool(v)) => b.append_value(v),
            (ColumnBuilder::Timestamp(b), Cell::Timestamp(ts)) => {
                b.append_value(ts.timestamp_millis())
            }
            (ColumnBuilder::Text(b), _) => b.append_null(),
            (ColumnBuilder::Int(b), _) => b.append_null(),
            (ColumnBuilder::Bool(b), _) => b.append_null(),
            (ColumnBuilder::Timestamp(b), _) => b.append_null(),
        }
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Text(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Int(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Bool(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Timestamp(mut b) => Arc::new(b.finish()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openshift::resources::{Build, OpenShiftTable, Route};
    use datafusion::arrow::array::{
        Array, BooleanArray, Int64Array, StringArray, TimestampMillisecondArray,
    };

    fn route(name: &str, host: Option<&str>) -> Route {
        let mut spec = serde_json::json!({"to": {"kind": "Service", "name": name}});
        if let Some(host) = host {
            spec["host"] = serde_json::json!(host);
        }
        serde_json::from_value(serde_json::json!({
            "metadata": {
                "name": name,
                "namespace": "shop",
                "creationTimestamp": "2024-01-15T10:30:00Z",
                "generation": 2
            },
            "spec": spec
        }))
        .unwrap()
    }

    fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> &'a T {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<T>()
            .unwrap()
    }

    #[test]
    fn test_schema_types() {
        let schema = to_arrow_schema(&Build::columns());
        let field = |name: &str| schema.field_with_name(name).unwrap().data_type().clone();

        assert_eq!(field("name"), DataType::Utf8);
        assert_eq!(field("generation"), DataType::Int64);
        assert_eq!(field("cancelled"), DataType::Boolean);
        assert_eq!(
            field("creation_timestamp"),
            DataType::Timestamp(TimeUnit::Millisecond, None)
        );
        assert_eq!(field("labels"), DataType::Utf8);
        assert!(schema.fields().iter().all(|f| f.is_nullable()));
    }

    #[test]
    fn test_rows_to_batch() {
        let columns = Route::columns();
        let schema = to_arrow_schema(&columns);
        let rows = vec![route("frontend", Some("shop.example.com")), route("api", None)];

        let batch = to_record_batch(&columns, schema, &rows).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), columns.len());

        let names = column::<StringArray>(&batch, "name");
        assert_eq!(names.value(0), "frontend");
        assert_eq!(names.value(1), "api");

        let hosts = column::<StringArray>(&batch, "host");
        assert_eq!(hosts.value(0), "shop.example.com");
        assert!(hosts.is_null(1));

        let generation = column::<Int64Array>(&batch, "generation");
        assert_eq!(generation.value(0), 2);

        let created = column::<TimestampMillisecondArray>(&batch, "creation_timestamp");
        assert_eq!(created.value(0), 1_705_314_600_000);

        let to = column::<StringArray>(&batch, "spec_to");
        let parsed: serde_json::Value = serde_json::from_str(to.value(1)).unwrap();
        assert_eq!(parsed["name"], "api");
    }

    #[test]
    fn test_bool_column() {
        let columns = Build::columns();
        let schema = to_arrow_schema(&columns);
        let build: Build = serde_json::from_value(serde_json::json!({
            "metadata": {"name": "b-1"},
            "status": {"cancelled": true}
        }))
        .unwrap();

        let batch = to_record_batch(&columns, schema, &[build, Build::default()]).unwrap();
        let cancelled = column::<BooleanArray>(&batch, "cancelled");
        assert!(cancelled.value(0));
        assert!(cancelled.is_null(1));
    }

    #[test]
    fn test_empty_rows() {
        let columns = Route::columns();
        let schema = to_arrow_schema(&columns);
        let batch = to_record_batch::<Route>(&columns, schema.clone(), &[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.schema(), schema);
    }

    #[test]
    fn test_mismatched_cell_is_null() {
        let mut builder = ColumnBuilder::new(ColumnType::Int, 1);
        builder.append(Cell::Text("not a number".to_string()));
        let array = builder.finish();
        assert!(array.is_null(0));
    }
}
