use polars::prelude::*;

/// Column holding the bar date.
pub const DATE_COLUMN: &str = "dt";
/// Column holding the symbol (stock code or index code).
pub const SYMBOL_COLUMN: &str = "code";
/// Numeric columns, in storage order.
pub const VALUE_COLUMNS: [&str; 6] = ["open", "high", "low", "close", "volume", "volume_valued"];

/// Expected schema for dataset tables
pub struct BarSchema;

impl BarSchema {
    /// Canonical schema written by the store
    pub fn schema() -> Schema {
        let mut fields = vec![
            Field::new(
                DATE_COLUMN.into(),
                DataType::Datetime(TimeUnit::Milliseconds, None),
            ),
            Field::new(SYMBOL_COLUMN.into(), DataType::String),
        ];
        fields.extend(
            VALUE_COLUMNS
                .iter()
                .map(|name| Field::new((*name).into(), DataType::Float64)),
        );
        Schema::from_iter(fields)
    }

    /// Validate a DataFrame read from disk.
    ///
    /// Tables produced by other writers are accepted as long as they can be
    /// cast losslessly: `dt` may be a Date or a Datetime of any unit, value
    /// columns may be any float or integer type.
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let actual = df.schema();

        for field in Self::schema().iter_fields() {
            let name = field.name();
            let dtype = actual
                .get(name)
                .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;

            let compatible = match name.as_str() {
                DATE_COLUMN => matches!(dtype, DataType::Date | DataType::Datetime(_, _)),
                SYMBOL_COLUMN => matches!(dtype, DataType::String),
                _ => matches!(
                    dtype,
                    DataType::Float64
                        | DataType::Float32
                        | DataType::Int64
                        | DataType::Int32
                        | DataType::UInt64
                        | DataType::UInt32
                ),
            };

            if !compatible {
                return Err(SchemaError::TypeMismatch {
                    column: name.to_string(),
                    expected: field.dtype().clone(),
                    actual: dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}
