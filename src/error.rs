//! Error taxonomy. Every error is terminal for the call that raised it.
use thiserror::Error;

/// Raised while constructing a [`crate::TypeNode`].
///
/// Every type list must hold distinct names, not only factory unions:
/// a JSON Schema `type` array must be unique, so `["number", "number"]`
/// and `number_or_number_array` are both rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid primitive type '{0}'")]
    InvalidPrimitive(String),
    #[error("duplicate primitive type '{0}' in type list")]
    DuplicatePrimitive(String),
    #[error("at least one primitive type is required")]
    Empty,
    #[error("items can only be specified for array types")]
    ItemsWithoutArray,
}

/// The factory could not resolve a name.
///
/// Deliberately not a [`TypeError`]: callers probe names and treat this as
/// "no such type", the same way a missing attribute is treated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid composite type '{name}'")]
pub struct UnknownTypeName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// An array description must hold exactly one element schema.
    #[error("array-typed schema at '{at}' must be a list with a single element, found {len}")]
    MalformedArray { at: String, len: usize },
    /// A list used as array element may only hold plain primitive names.
    #[error("element type list at '{at}' may only hold primitive type names")]
    NotATypeName { at: String },
    #[error("invalid element type list at '{at}': {source}")]
    ElementTypes { at: String, source: TypeError },
    #[error("object-typed property names must be globally unique: '{name}' is defined more than once")]
    DuplicateDefinition { name: String },
}

/// A JSON document could not be read as a raw schema description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at JSON path {path} → {message}")]
pub struct DescriptionError {
    pub path: String,
    pub message: String,
}
