use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::TypeError;

/// The fixed vocabulary of primitive JSON Schema type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Array,
    Null,
}

/// Name → primitive, in vocabulary order.
pub static VOCABULARY: Lazy<IndexMap<&'static str, Primitive>> = Lazy::new(|| {
    Primitive::ALL.iter().map(|p| (p.as_str(), *p)).collect()
});

impl Primitive {
    pub const ALL: [Primitive; 5] = [
        Primitive::String,
        Primitive::Number,
        Primitive::Boolean,
        Primitive::Array,
        Primitive::Null,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Array => "array",
            Primitive::Null => "null",
        }
    }
}

impl FromStr for Primitive {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VOCABULARY
            .get(s)
            .copied()
            .ok_or_else(|| TypeError::InvalidPrimitive(s.to_string()))
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
