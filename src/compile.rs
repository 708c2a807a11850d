//! Raw description → JSON Schema document.
//!
//! Object-typed array elements are hoisted into one flat `$defs` table at the
//! document root and replaced with `$ref` pointers. The table is keyed by the
//! field name that holds the array, so those names must be unique across the
//! whole tree. Inline (non-array) sub-objects stay inline.
use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{json, Map, Value};

use crate::error::CompileError;
use crate::node::TypeNode;
use crate::raw::RawSchema;

pub const DEFS: &str = "$defs";
pub const TOP_LEVEL_ARRAY_ELEMENT: &str = "top_level_array_element";

// ————————————————————————————————————————————————————————————————————————————
// DEFINITIONS TABLE
// ————————————————————————————————————————————————————————————————————————————

/// The shared `$defs` accumulator for one top-level compilation.
///
/// Owned by the entry point, borrowed mutably by every recursive call, and
/// moved into the finished document at the end.
#[derive(Debug, Default)]
pub struct Definitions {
    table: Map<String, Value>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Never overwrites: a second definition under the same name is an error.
    pub fn insert_unique(&mut self, name: &str, schema: Value) -> Result<(), CompileError> {
        if self.table.contains_key(name) {
            return Err(CompileError::DuplicateDefinition { name: name.to_string() });
        }
        debug!("hoisted definition `{name}` into {DEFS}");
        self.table.insert(name.to_string(), schema);
        Ok(())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.table)
    }
}

pub fn ref_to(def_id: &str) -> String {
    format!("#/{DEFS}/{def_id}")
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINT
// ————————————————————————————————————————————————————————————————————————————

/// Compile a raw description into a JSON Schema document.
///
/// With `require_all`, every inline object level gets a `required` list naming
/// all of its properties; hoisted definitions get their own list too.
pub fn compile_schema(raw: &RawSchema, require_all: bool) -> Result<Value, CompileError> {
    match raw {
        RawSchema::Type(node) => Ok(node.compile()),
        RawSchema::Array(elements) => {
            let mut defs = Definitions::new();
            let mut out = compile_array(elements, TOP_LEVEL_ARRAY_ELEMENT, "", &mut defs, require_all)?;
            if !defs.is_empty() {
                out.insert(DEFS.into(), defs.into_value());
            }
            Ok(Value::Object(out))
        }
        RawSchema::Object(fields) => {
            let mut defs = Definitions::new();
            let mut out = compile_object(fields, "", &mut defs, require_all)?;
            out.insert(DEFS.into(), defs.into_value());
            Ok(Value::Object(out))
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// `pointer` is the JSON pointer of `fields` inside the raw description,
/// used only for error messages.
fn compile_object(
    fields: &IndexMap<String, RawSchema>,
    pointer: &str,
    defs: &mut Definitions,
    require_all: bool,
) -> Result<Map<String, Value>, CompileError> {
    let mut properties = Map::new();
    for (name, field) in fields {
        let field_pointer = format!("{pointer}/{name}");
        trace!("compiling property {field_pointer}");
        let compiled = match field {
            RawSchema::Type(node) => node.compile(),
            RawSchema::Array(elements) => {
                Value::Object(compile_array(elements, name, &field_pointer, defs, require_all)?)
            }
            RawSchema::Object(nested) => {
                Value::Object(compile_object(nested, &field_pointer, defs, require_all)?)
            }
        };
        properties.insert(name.clone(), compiled);
    }

    let mut out = Map::new();
    out.insert("type".into(), Value::from("object"));
    if require_all {
        let required = properties.keys().cloned().map(Value::from).collect();
        out.insert("properties".into(), Value::Object(properties));
        out.insert("required".into(), Value::Array(required));
    } else {
        out.insert("properties".into(), Value::Object(properties));
    }
    Ok(out)
}

/// `def_id` names the hoisted definition if the element is an object.
fn compile_array(
    elements: &[RawSchema],
    def_id: &str,
    pointer: &str,
    defs: &mut Definitions,
    require_all: bool,
) -> Result<Map<String, Value>, CompileError> {
    let [element] = elements else {
        return Err(CompileError::MalformedArray {
            at: if pointer.is_empty() { "/".to_string() } else { pointer.to_string() },
            len: elements.len(),
        });
    };

    let items = match element {
        RawSchema::Type(node) => node.compile(),
        RawSchema::Array(names) => element_type_list(names, &format!("{pointer}/0"))?.compile(),
        RawSchema::Object(fields) => {
            let def = compile_object(fields, &format!("{pointer}/0"), defs, require_all)?;
            // checked after recursion: a nested def of the same name wins the slot
            defs.insert_unique(def_id, Value::Object(def))?;
            json!({ "$ref": ref_to(def_id) })
        }
    };

    let mut out = Map::new();
    out.insert("type".into(), Value::from("array"));
    out.insert("items".into(), items);
    Ok(out)
}

/// A list as array element is a union of plain primitive names: `[["number", "null"]]`.
fn element_type_list(names: &[RawSchema], pointer: &str) -> Result<TypeNode, CompileError> {
    let mut out: Vec<&str> = Vec::with_capacity(names.len());
    for (ix, name) in names.iter().enumerate() {
        match name {
            RawSchema::Type(node)
                if node.types().len() == 1 && node.items().is_none() && node.keywords().is_empty() =>
            {
                out.push(node.types()[0].as_str());
            }
            _ => return Err(CompileError::NotATypeName { at: format!("{pointer}/{ix}") }),
        }
    }
    TypeNode::new(out).map_err(|source| CompileError::ElementTypes { at: pointer.to_string(), source })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeError;
    use crate::factory::jst;
    use crate::primitive::Primitive;
    use pretty_assertions::assert_eq;

    fn obj<V: Into<RawSchema>>(fields: impl IntoIterator<Item = (&'static str, V)>) -> RawSchema {
        RawSchema::object(fields)
    }

    /// Every `$ref` in `v`, in document order.
    fn refs(v: &Value, out: &mut Vec<String>) {
        match v {
            Value::Object(map) => {
                if let Some(Value::String(r)) = map.get("$ref") {
                    out.push(r.clone());
                }
                map.values().for_each(|x| refs(x, out));
            }
            Value::Array(xs) => xs.iter().for_each(|x| refs(x, out)),
            _ => {}
        }
    }

    #[test]
    fn type_node_compiles_directly() {
        let raw = RawSchema::from(jst::number_or_null());
        assert_eq!(compile_schema(&raw, false).unwrap(), json!({ "type": ["number", "null"] }));
        assert_eq!(compile_schema(&raw, true).unwrap(), json!({ "type": ["number", "null"] }));
    }

    #[test]
    fn flat_object_and_primitive_array() {
        let raw = obj([
            ("a", RawSchema::from(TypeNode::new("number").unwrap())),
            ("b", RawSchema::array_of(TypeNode::new("string").unwrap())),
        ]);
        let expected = json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "array", "items": { "type": "string" } }
            },
            "$defs": {}
        });
        let compiled = compile_schema(&raw, false).unwrap();
        assert_eq!(compiled, expected);
        let keys: Vec<&String> = compiled["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn top_level_primitive_array_has_no_defs() {
        let raw = RawSchema::array_of(jst::number_or_null());
        assert_eq!(
            compile_schema(&raw, false).unwrap(),
            json!({ "type": "array", "items": { "type": ["number", "null"] } })
        );
    }

    #[test]
    fn nested_inline_objects_stay_inline() {
        let raw = obj([
            ("sample_id", RawSchema::from(jst::number().with("minimum", 0))),
            ("sample_name", jst::string_or_null().into()),
            ("data", RawSchema::array_of(jst::number())),
            ("is_public", jst::boolean_or_null().into()),
            (
                "metadata",
                obj([
                    ("abundance", RawSchema::from(jst::number())),
                    ("uniprot_id", jst::string().into()),
                    ("names", obj([("gene", jst::string()), ("protein", jst::string())])),
                ]),
            ),
        ]);
        let expected = json!({
            "type": "object",
            "properties": {
                "sample_id": { "type": "number", "minimum": 0 },
                "sample_name": { "type": ["string", "null"] },
                "data": { "type": "array", "items": { "type": "number" } },
                "is_public": { "type": ["boolean", "null"] },
                "metadata": {
                    "type": "object",
                    "properties": {
                        "abundance": { "type": "number" },
                        "uniprot_id": { "type": "string" },
                        "names": {
                            "type": "object",
                            "properties": {
                                "gene": { "type": "string" },
                                "protein": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "$defs": {}
        });
        assert_eq!(compile_schema(&raw, false).unwrap(), expected);
    }

    #[test]
    fn array_of_objects_is_hoisted() {
        let raw = obj([
            ("sample_name", RawSchema::from(jst::string_or_null())),
            ("data", RawSchema::array_of(obj([("x", jst::number()), ("y", jst::number())]))),
        ]);
        let expected = json!({
            "type": "object",
            "properties": {
                "sample_name": { "type": ["string", "null"] },
                "data": { "type": "array", "items": { "$ref": "#/$defs/data" } }
            },
            "$defs": {
                "data": {
                    "type": "object",
                    "properties": { "x": { "type": "number" }, "y": { "type": "number" } }
                }
            }
        });
        assert_eq!(compile_schema(&raw, false).unwrap(), expected);
    }

    #[test]
    fn nested_arrays_of_objects_share_one_table() {
        let raw = obj([
            ("sample_name", RawSchema::from(jst::string_or_null())),
            (
                "datasets",
                RawSchema::array_of(obj([
                    ("dataset_id", RawSchema::from(jst::number_or_null())),
                    ("data", RawSchema::array_of(obj([("x", jst::number()), ("y", jst::number())]))),
                ])),
            ),
        ]);
        let expected = json!({
            "type": "object",
            "properties": {
                "sample_name": { "type": ["string", "null"] },
                "datasets": { "type": "array", "items": { "$ref": "#/$defs/datasets" } }
            },
            "$defs": {
                "data": {
                    "type": "object",
                    "properties": { "x": { "type": "number" }, "y": { "type": "number" } }
                },
                "datasets": {
                    "type": "object",
                    "properties": {
                        "dataset_id": { "type": ["number", "null"] },
                        "data": { "type": "array", "items": { "$ref": "#/$defs/data" } }
                    }
                }
            }
        });
        let compiled = compile_schema(&raw, false).unwrap();
        assert_eq!(compiled, expected);
        let defs: Vec<&String> = compiled["$defs"].as_object().unwrap().keys().collect();
        assert_eq!(defs, ["data", "datasets"]);
    }

    #[test]
    fn arrays_inside_inline_objects_hoist_to_the_root() {
        let raw = obj([(
            "metadata",
            obj([("points", RawSchema::array_of(obj([("x", jst::number())])))]),
        )]);
        let compiled = compile_schema(&raw, false).unwrap();
        assert!(compiled["properties"]["metadata"].get("$defs").is_none());
        assert_eq!(
            compiled["properties"]["metadata"]["properties"]["points"],
            json!({ "type": "array", "items": { "$ref": "#/$defs/points" } })
        );
        assert_eq!(
            compiled["$defs"]["points"],
            json!({ "type": "object", "properties": { "x": { "type": "number" } } })
        );
    }

    #[test]
    fn top_level_array_of_objects() {
        let raw = RawSchema::array_of(obj([
            ("sample_name", RawSchema::from(jst::string_or_null())),
            ("data", RawSchema::array_of(obj([("x", jst::number()), ("y", jst::number())]))),
        ]));
        let expected = json!({
            "type": "array",
            "items": { "$ref": "#/$defs/top_level_array_element" },
            "$defs": {
                "top_level_array_element": {
                    "type": "object",
                    "properties": {
                        "sample_name": { "type": ["string", "null"] },
                        "data": { "type": "array", "items": { "$ref": "#/$defs/data" } }
                    }
                },
                "data": {
                    "type": "object",
                    "properties": { "x": { "type": "number" }, "y": { "type": "number" } }
                }
            }
        });
        assert_eq!(compile_schema(&raw, false).unwrap(), expected);
    }

    #[test]
    fn minimal_top_level_array_of_objects() {
        let raw = RawSchema::array_of(obj([("x", TypeNode::new("number").unwrap())]));
        let compiled = compile_schema(&raw, false).unwrap();
        assert_eq!(
            compiled["$defs"],
            json!({
                "top_level_array_element": {
                    "type": "object",
                    "properties": { "x": { "type": "number" } }
                }
            })
        );
    }

    #[test]
    fn list_elements_are_unions_of_names() {
        let raw: RawSchema = serde_json::from_value(json!({
            "vals": [["number", "null"]],
            "ids": [["string"]]
        }))
        .unwrap();
        let compiled = compile_schema(&raw, false).unwrap();
        assert_eq!(
            compiled["properties"]["vals"],
            json!({ "type": "array", "items": { "type": ["number", "null"] } })
        );
        assert_eq!(
            compiled["properties"]["ids"],
            json!({ "type": "array", "items": { "type": "string" } })
        );
        assert_eq!(compiled["$defs"], json!({}));

        let top = RawSchema::array_of(RawSchema::Array(vec![jst::boolean().into(), jst::null().into()]));
        assert_eq!(
            compile_schema(&top, false).unwrap(),
            json!({ "type": "array", "items": { "type": ["boolean", "null"] } })
        );
    }

    #[test]
    fn list_elements_reject_anything_but_plain_names() {
        let raw = obj([("grid", RawSchema::array_of(RawSchema::array_of(obj([("v", jst::number())]))))]);
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::NotATypeName { at: "/grid/0/0".into() })
        );

        let raw = obj([("vals", RawSchema::array_of(RawSchema::Array(vec![
            jst::number().into(),
            jst::number_or_null().into(),
        ])))]);
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::NotATypeName { at: "/vals/0/1".into() })
        );

        let raw = obj([("vals", RawSchema::array_of(RawSchema::Array(vec![jst::number().with("minimum", 0).into()])))]);
        assert!(matches!(compile_schema(&raw, false), Err(CompileError::NotATypeName { .. })));

        let raw = obj([("vals", RawSchema::array_of(RawSchema::Array(vec![jst::number().into(), jst::number().into()])))]);
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::ElementTypes {
                at: "/vals/0".into(),
                source: TypeError::DuplicatePrimitive("number".into()),
            })
        );

        let raw = obj([("vals", RawSchema::array_of(RawSchema::Array(vec![])))]);
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::ElementTypes { at: "/vals/0".into(), source: TypeError::Empty })
        );
    }

    #[test]
    fn malformed_arrays_fail() {
        let raw = obj([
            ("name", RawSchema::from(jst::string_or_null())),
            ("data", RawSchema::Array(vec![jst::number().into(), jst::string().into()])),
        ]);
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::MalformedArray { at: "/data".into(), len: 2 })
        );

        assert_eq!(
            compile_schema(&RawSchema::Array(vec![]), false),
            Err(CompileError::MalformedArray { at: "/".into(), len: 0 })
        );

        let raw = obj([("outer", obj([("inner", RawSchema::Array(vec![]))]))]);
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::MalformedArray { at: "/outer/inner".into(), len: 0 })
        );
    }

    #[test]
    fn duplicate_definition_names_fail() {
        let raw = obj([
            ("name", RawSchema::from(jst::string_or_null())),
            (
                "data",
                RawSchema::array_of(obj([
                    ("dataset_id", RawSchema::from(jst::number())),
                    (
                        "data",
                        RawSchema::array_of(obj([
                            ("x", jst::number().with("maximum", 0)),
                            ("y", jst::number().with("maximum", 0)),
                        ])),
                    ),
                ])),
            ),
        ]);
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::DuplicateDefinition { name: "data".into() })
        );
    }

    #[test]
    fn duplicate_definition_names_fail_across_branches() {
        let raw = obj([
            ("a", obj([("items", RawSchema::array_of(obj([("x", jst::number())])))])),
            ("b", obj([("items", RawSchema::array_of(obj([("y", jst::string())])))])),
        ]);
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::DuplicateDefinition { name: "items".into() })
        );
    }

    #[test]
    fn top_level_array_element_name_is_reserved() {
        let raw = RawSchema::array_of(obj([(
            TOP_LEVEL_ARRAY_ELEMENT,
            RawSchema::array_of(obj([("x", jst::number())])),
        )]));
        assert_eq!(
            compile_schema(&raw, false),
            Err(CompileError::DuplicateDefinition { name: TOP_LEVEL_ARRAY_ELEMENT.into() })
        );
    }

    #[test]
    fn require_all_marks_every_inline_level_and_each_def() {
        let raw = obj([
            ("id", RawSchema::from(jst::number())),
            ("meta", obj([("name", RawSchema::from(jst::string())), ("deep", obj([("z", jst::null())]))])),
            ("rows", RawSchema::array_of(obj([("x", jst::number()), ("y", jst::number())]))),
        ]);
        let compiled = compile_schema(&raw, true).unwrap();
        assert_eq!(compiled["required"], json!(["id", "meta", "rows"]));
        assert_eq!(compiled["properties"]["meta"]["required"], json!(["name", "deep"]));
        assert_eq!(
            compiled["properties"]["meta"]["properties"]["deep"]["required"],
            json!(["z"])
        );
        // `$ref` targets are not touched by the referencing parent
        assert!(compiled["properties"]["rows"].get("required").is_none());
        assert!(compiled["properties"]["rows"]["items"].get("required").is_none());
        assert_eq!(compiled["$defs"]["rows"]["required"], json!(["x", "y"]));
        assert!(compiled["$defs"].get("required").is_none());
    }

    #[test]
    fn without_require_all_nothing_is_required() {
        let raw = obj([("meta", obj([("name", jst::string())]))]);
        let compiled = compile_schema(&raw, false).unwrap();
        assert!(compiled.get("required").is_none());
        assert!(compiled["properties"]["meta"].get("required").is_none());
    }

    #[test]
    fn every_ref_resolves_against_root_defs() {
        let raw = RawSchema::array_of(obj([
            ("a", RawSchema::array_of(obj([("b", RawSchema::array_of(obj([("c", jst::number())])))]))),
            ("d", obj([("e", RawSchema::array_of(obj([("f", TypeNode::primitive(Primitive::Boolean))])))])),
        ]));
        let compiled = compile_schema(&raw, true).unwrap();
        let mut found = Vec::new();
        refs(&compiled, &mut found);
        assert_eq!(found.len(), 4);
        for r in found {
            assert!(compiled.pointer(r.trim_start_matches('#')).is_some(), "{r}");
        }
    }

    #[test]
    fn fresh_table_per_call() {
        let raw = obj([("data", RawSchema::array_of(obj([("x", jst::number())])))]);
        let first = compile_schema(&raw, false).unwrap();
        let second = compile_schema(&raw, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn definitions_reject_overwrites() {
        let mut defs = Definitions::new();
        defs.insert_unique("x", json!({})).unwrap();
        assert!(defs.contains("x"));
        assert_eq!(
            defs.insert_unique("x", json!({ "type": "object" })),
            Err(CompileError::DuplicateDefinition { name: "x".into() })
        );
        assert_eq!(defs.len(), 1);
        assert_eq!(defs.into_value(), json!({ "x": {} }));
    }
}
