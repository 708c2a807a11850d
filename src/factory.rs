//! Type-name factory: resolves names like `number_or_null_array` into nodes.
//!
//! Grammar:
//! - `{t}`                      single primitive
//! - `{a}_or_{b}[_or_...]`      union, names must be distinct
//! - `{a}[_or_{b}...]_array`    array whose items are the (union) prefix
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::UnknownTypeName;
use crate::node::TypeNode;
use crate::primitive::{Primitive, VOCABULARY};

pub const UNION_SEPARATOR: &str = "_or_";
pub const ARRAY_SUFFIX: &str = "_array";

static NAME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]+(?:_or_[a-z]+)*(?:_array)?$").expect("static regex")
});

/// Resolve a factory name. Fails with [`UnknownTypeName`] for anything
/// that does not parse into a valid primitive, union, or array-of-union.
pub fn lookup(name: &str) -> Result<TypeNode, UnknownTypeName> {
    let unknown = || UnknownTypeName { name: name.to_string() };

    if let Some(p) = VOCABULARY.get(name) {
        return Ok(TypeNode::primitive(*p));
    }
    if !NAME_SHAPE.is_match(name) {
        return Err(unknown());
    }
    let node = match name.strip_suffix(ARRAY_SUFFIX) {
        Some(prefix) => {
            let items: Vec<&str> = prefix.split(UNION_SEPARATOR).collect();
            TypeNode::with_items(Primitive::Array, items)
        }
        None => {
            let members: Vec<&str> = name.split(UNION_SEPARATOR).collect();
            TypeNode::new(members)
        }
    };
    node.map_err(|_| unknown())
}

/// Probing form of [`lookup`].
pub fn get(name: &str) -> Option<TypeNode> {
    lookup(name).ok()
}

impl FromStr for TypeNode {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s)
    }
}

/// Shorthands for the names that come up all the time.
pub mod jst {
    use crate::node::TypeNode;
    use crate::primitive::Primitive;

    pub fn string() -> TypeNode { TypeNode::primitive(Primitive::String) }
    pub fn number() -> TypeNode { TypeNode::primitive(Primitive::Number) }
    pub fn boolean() -> TypeNode { TypeNode::primitive(Primitive::Boolean) }
    pub fn array() -> TypeNode { TypeNode::primitive(Primitive::Array) }
    pub fn null() -> TypeNode { TypeNode::primitive(Primitive::Null) }

    pub fn string_or_null() -> TypeNode { union(Primitive::String) }
    pub fn number_or_null() -> TypeNode { union(Primitive::Number) }
    pub fn boolean_or_null() -> TypeNode { union(Primitive::Boolean) }

    pub fn string_array() -> TypeNode { TypeNode::array_of(string()) }
    pub fn number_array() -> TypeNode { TypeNode::array_of(number()) }
    pub fn number_or_null_array() -> TypeNode { TypeNode::array_of(number_or_null()) }

    fn union(p: Primitive) -> TypeNode {
        TypeNode::from_primitives(vec![p, Primitive::Null])
    }
}
