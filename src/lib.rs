//! Tiny JSON Schema generator.
//!
//! Write schemas as nested mappings of typed fields, compile them into JSON
//! Schema. Arrays of objects are hoisted into a flat root `$defs` table and
//! referenced with `$ref`.
//!
//! ```
//! use tjsg::{compile_schema, jst, RawSchema};
//!
//! let raw = RawSchema::object([
//!     ("id", RawSchema::from(jst::number())),
//!     ("points", RawSchema::array_of(RawSchema::object([("x", jst::number())]))),
//! ]);
//! let schema = compile_schema(&raw, true).unwrap();
//! assert_eq!(schema["properties"]["points"]["items"]["$ref"], "#/$defs/points");
//! ```
pub mod primitive;
pub mod node;
pub mod factory;
pub mod raw;
pub mod compile;
pub mod error;
pub mod path_de;
pub mod jq_exec;
pub mod cli;

pub use compile::{compile_schema, Definitions};
pub use error::{CompileError, DescriptionError, TypeError, UnknownTypeName};
pub use factory::{jst, lookup};
pub use node::TypeNode;
pub use primitive::Primitive;
pub use raw::RawSchema;
