//! Raw schema descriptions: the caller-authored tree fed to the compiler.
//!
//! ```text
//! RawSchema = TypeNode | { field: RawSchema, ... } | [RawSchema]
//! ```
//!
//! In JSON text a leaf is a factory name (`"number_or_null"`) or an object
//! whose first key is `"$type"`; every other key on such an object is an
//! extra keyword. Any other object is a nested mapping, arrays are arrays.
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};

use crate::factory;
use crate::node::TypeNode;

pub const TYPE_KEY: &str = "$type";

#[derive(Debug, Clone, PartialEq)]
pub enum RawSchema {
    Type(TypeNode),
    Object(IndexMap<String, RawSchema>),
    /// Exactly one element is well-formed; the compiler rejects anything else.
    Array(Vec<RawSchema>),
}

impl RawSchema {
    pub fn object<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawSchema>,
    {
        fields.into_iter().collect()
    }

    /// A one-element array description: "array whose elements match `element`".
    pub fn array_of(element: impl Into<RawSchema>) -> Self {
        RawSchema::Array(vec![element.into()])
    }
}

impl From<TypeNode> for RawSchema {
    fn from(node: TypeNode) -> Self {
        RawSchema::Type(node)
    }
}

impl From<IndexMap<String, RawSchema>> for RawSchema {
    fn from(fields: IndexMap<String, RawSchema>) -> Self {
        RawSchema::Object(fields)
    }
}

impl From<Vec<RawSchema>> for RawSchema {
    fn from(elements: Vec<RawSchema>) -> Self {
        RawSchema::Array(elements)
    }
}

impl<K: Into<String>, V: Into<RawSchema>> FromIterator<(K, V)> for RawSchema {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        RawSchema::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// JSON TEXT FORM
// ————————————————————————————————————————————————————————————————————————————

impl<'de> Deserialize<'de> for RawSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawSchemaVisitor)
    }
}

struct RawSchemaVisitor;

impl<'de> Visitor<'de> for RawSchemaVisitor {
    type Value = RawSchema;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a type name, a `$type` object, a mapping of fields, or a one-element array")
    }

    fn visit_str<E: de::Error>(self, name: &str) -> Result<RawSchema, E> {
        factory::lookup(name).map(RawSchema::Type).map_err(E::custom)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawSchema, A::Error> {
        let mut elements = Vec::new();
        while let Some(element) = seq.next_element::<RawSchema>()? {
            elements.push(element);
        }
        Ok(RawSchema::Array(elements))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawSchema, A::Error> {
        let Some(first) = map.next_key::<String>()? else {
            return Ok(RawSchema::Object(IndexMap::new()));
        };

        if first == TYPE_KEY {
            let name = map.next_value::<String>()?;
            let node = factory::lookup(&name).map_err(de::Error::custom)?;
            let mut keywords = Map::new();
            while let Some((k, v)) = map.next_entry::<String, Value>()? {
                if k == TYPE_KEY {
                    return Err(de::Error::duplicate_field(TYPE_KEY));
                }
                keywords.insert(k, v);
            }
            return Ok(RawSchema::Type(node.with_keywords(keywords)));
        }

        let mut fields = IndexMap::new();
        let value = map.next_value::<RawSchema>()?;
        fields.insert(first, value);
        while let Some(key) = map.next_key::<String>()? {
            if key == TYPE_KEY {
                return Err(de::Error::custom(format!(
                    "`{TYPE_KEY}` must be the first key of a type object"
                )));
            }
            let value = map.next_value::<RawSchema>()?;
            if fields.insert(key.clone(), value).is_some() {
                return Err(de::Error::custom(format!("duplicate field `{key}`")));
            }
        }
        Ok(RawSchema::Object(fields))
    }
}
