use serde_json::Value;

use crate::error::DescriptionError;
use crate::raw::RawSchema;

/// Read a raw description from JSON text, with JSON-path context in errors.
pub fn raw_schema_from_str(src: &str) -> Result<RawSchema, DescriptionError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, RawSchema>(de).map_err(into_description_error)
}

/// Same as [`raw_schema_from_str`] for an already parsed document.
pub fn raw_schema_from_value(value: Value) -> Result<RawSchema, DescriptionError> {
    serde_path_to_error::deserialize::<_, RawSchema>(value).map_err(into_description_error)
}

fn into_description_error(err: serde_path_to_error::Error<serde_json::Error>) -> DescriptionError {
    DescriptionError {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    }
}
