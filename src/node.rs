//! Leaf schema fragments: one or more primitive types, optional `items`,
//! and free-form extra keywords layered on top at compile time.
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::primitive::Primitive;

// ————————————————————————————————————————————————————————————————————————————
// ARGUMENT CONVERSIONS
// ————————————————————————————————————————————————————————————————————————————

/// Anything that names one or more primitive types: `"number"`,
/// `["number", "null"]`, `vec!["string"]`, or a [`Primitive`].
pub trait TypeNames {
    fn into_primitives(self) -> Result<Vec<Primitive>, TypeError>;
}

impl TypeNames for Primitive {
    fn into_primitives(self) -> Result<Vec<Primitive>, TypeError> {
        Ok(vec![self])
    }
}

impl TypeNames for &str {
    fn into_primitives(self) -> Result<Vec<Primitive>, TypeError> {
        Ok(vec![self.parse()?])
    }
}

impl TypeNames for String {
    fn into_primitives(self) -> Result<Vec<Primitive>, TypeError> {
        self.as_str().into_primitives()
    }
}

impl<S: AsRef<str>> TypeNames for &[S] {
    fn into_primitives(self) -> Result<Vec<Primitive>, TypeError> {
        collect_names(self)
    }
}

impl<S: AsRef<str>, const N: usize> TypeNames for [S; N] {
    fn into_primitives(self) -> Result<Vec<Primitive>, TypeError> {
        collect_names(self)
    }
}

impl<S: AsRef<str>> TypeNames for Vec<S> {
    fn into_primitives(self) -> Result<Vec<Primitive>, TypeError> {
        collect_names(self)
    }
}

/// The `items` argument: either type names or an already built node.
pub trait IntoTypeNode {
    fn into_type_node(self) -> Result<TypeNode, TypeError>;
}

impl IntoTypeNode for TypeNode {
    fn into_type_node(self) -> Result<TypeNode, TypeError> {
        Ok(self)
    }
}

impl<T: TypeNames> IntoTypeNode for T {
    fn into_type_node(self) -> Result<TypeNode, TypeError> {
        TypeNode::new(self)
    }
}

/// Validates every name; order is kept as given.
fn collect_names<I, S>(names: I) -> Result<Vec<Primitive>, TypeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<Primitive> = Vec::new();
    for name in names {
        let name = name.as_ref();
        let p: Primitive = name.parse()?;
        if out.contains(&p) {
            return Err(TypeError::DuplicatePrimitive(name.to_string()));
        }
        out.push(p);
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE NODE
// ————————————————————————————————————————————————————————————————————————————

/// A primitive or union type declaration.
///
/// `types` and `items` are fixed at construction. Extra keywords can be
/// layered on any number of times before compiling, either by consuming
/// the node ([`TypeNode::with`]) or in place on an owned node
/// ([`TypeNode::set_keyword`]).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    types: Vec<Primitive>,
    items: Option<Box<TypeNode>>,
    keywords: Map<String, Value>,
}

impl TypeNode {
    pub fn new(types: impl TypeNames) -> Result<Self, TypeError> {
        let types = types.into_primitives()?;
        if types.is_empty() {
            return Err(TypeError::Empty);
        }
        Ok(Self { types, items: None, keywords: Map::new() })
    }

    /// `items` is array-specific: `array` must be among `types`.
    pub fn with_items(types: impl TypeNames, items: impl IntoTypeNode) -> Result<Self, TypeError> {
        let mut node = Self::new(types)?;
        if !node.types.contains(&Primitive::Array) {
            return Err(TypeError::ItemsWithoutArray);
        }
        node.items = Some(Box::new(items.into_type_node()?));
        Ok(node)
    }

    pub fn primitive(p: Primitive) -> Self {
        Self { types: vec![p], items: None, keywords: Map::new() }
    }

    /// Caller guarantees a non-empty list of distinct primitives.
    pub(crate) fn from_primitives(types: Vec<Primitive>) -> Self {
        Self { types, items: None, keywords: Map::new() }
    }

    pub fn array_of(items: TypeNode) -> Self {
        Self {
            types: vec![Primitive::Array],
            items: Some(Box::new(items)),
            keywords: Map::new(),
        }
    }

    pub fn types(&self) -> &[Primitive] {
        &self.types
    }

    pub fn items(&self) -> Option<&TypeNode> {
        self.items.as_deref()
    }

    pub fn keywords(&self) -> &Map<String, Value> {
        &self.keywords
    }

    /// Adds (or overwrites) one extra keyword.
    pub fn with(mut self, keyword: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(keyword.into(), value.into());
        self
    }

    pub fn with_keywords<I, K, V>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in keywords {
            self.keywords.insert(k.into(), v.into());
        }
        self
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.keywords.insert(keyword.into(), value.into());
        self
    }

    /// Extra keywords are merged last and win over `type`/`items`.
    pub fn compile(&self) -> Value {
        let mut out = Map::new();
        let ty = match self.types.as_slice() {
            [single] => Value::from(single.as_str()),
            many => Value::Array(many.iter().map(|p| Value::from(p.as_str())).collect()),
        };
        out.insert("type".into(), ty);
        if let Some(items) = &self.items {
            out.insert("items".into(), items.compile());
        }
        for (k, v) in &self.keywords {
            out.insert(k.clone(), v.clone());
        }
        Value::Object(out)
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ix, p) in self.types.iter().enumerate() {
            if ix > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{p}")?;
        }
        if let Some(items) = &self.items {
            write!(f, "[{items}]")?;
        }
        Ok(())
    }
}

impl Serialize for TypeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.compile().serialize(serializer)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
