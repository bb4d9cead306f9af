//! Raw JSON document → schema model.
//!
//! The document is first deserialized into a loose [`RawSchema`] tree (so
//! structural mistakes are reported with their JSON path), then classified
//! into exactly one [`Schema`] variant per node. Keywords the generator does
//! not implement are rejected here instead of being silently dropped.
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::path_de::{from_value_with_path, parse_json};
use crate::schema::{
    AllOfMember, ArraySchema, Kind, Literal, MultiTypeSchema, ObjectSchema, PrimitiveSchema,
    Reference, Schema, UnionSchema,
};

/// Validation keywords outside the supported subset.
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "oneOf",
    "not",
    "if",
    "then",
    "else",
    "const",
    "format",
    "pattern",
    "patternProperties",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "uniqueItems",
    "$anchor",
];

// ------------------------------- Raw tree -------------------------------- //

#[derive(Debug, Deserialize)]
struct RawRoot {
    properties: IndexMap<String, RawSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

#[derive(Debug, Default, Deserialize)]
struct RawSchema {
    #[serde(alias = "$id")]
    id: Option<String>,
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "type")]
    type_: Option<OneOrMany<String>>,
    properties: Option<IndexMap<String, RawSchema>>,
    required: Option<Vec<String>>,
    #[serde(rename = "allOf")]
    all_of: Option<Vec<RawSchema>>,
    #[serde(rename = "anyOf")]
    any_of: Option<Vec<RawSchema>>,
    items: Option<OneOrMany<Box<RawSchema>>>,
    #[serde(rename = "enum")]
    enum_: Option<Vec<Value>>,
    /// annotations (`title`, `description`, …) and anything unsupported
    #[serde(flatten)]
    rest: IndexMap<String, Value>,
}

impl RawSchema {
    fn type_is(&self, keyword: &str) -> bool {
        matches!(&self.type_, Some(OneOrMany::One(t)) if t == keyword)
    }

    fn type_keywords(&self) -> Option<Vec<String>> {
        match &self.type_ {
            None => None,
            Some(OneOrMany::One(keyword)) => Some(vec![keyword.clone()]),
            Some(OneOrMany::Many(keywords)) => Some(keywords.clone()),
        }
    }
}

// ------------------------------- Loading --------------------------------- //

/// Raw JSON text → document value.
pub fn parse_document(src: &str) -> Result<Value> {
    parse_json(src)
}

/// Parse and load a schema document in one step.
pub fn load_str(src: &str, json_pointer: Option<&str>) -> Result<Vec<Schema>> {
    load_document(&parse_document(src)?, json_pointer)
}

/// Top-level schemas of `document`, in `properties` order.
///
/// `json_pointer` selects the root object inside the document. Entries
/// without an `id` cannot be named and are skipped with a warning; a bare
/// top-level `anyOf`/`allOf` is an error.
pub fn load_document(document: &Value, json_pointer: Option<&str>) -> Result<Vec<Schema>> {
    let root = match json_pointer {
        None => document,
        Some(pointer) => document
            .pointer(pointer)
            .ok_or_else(|| SchemaError::invalid(pointer, "JSON pointer does not resolve"))?,
    };
    let prefix = json_pointer.unwrap_or("");

    let root: RawRoot = from_value_with_path(root)?;
    let mut schemas = Vec::with_capacity(root.properties.len());
    for (key, raw) in root.properties {
        let path = format!("{prefix}/properties/{key}");
        if raw.any_of.is_some() {
            return Err(SchemaError::unsupported(format!("{path}: anyOf cannot be a top-level entry")));
        }
        if raw.all_of.is_some() && raw.id.is_none() {
            return Err(SchemaError::unsupported(format!(
                "{path}: a top-level allOf needs an id to name it"
            )));
        }
        if raw.id.is_none() {
            warn!(entry = %key, "top-level schema has no id; skipping");
            continue;
        }
        schemas.push(schema_from_raw(raw, &path)?);
    }
    debug!(count = schemas.len(), "loaded top-level schemas");
    Ok(schemas)
}

// ---------------------------- Classification ----------------------------- //

/// Classify a single schema node; `path` prefixes diagnostics.
pub fn schema_from_value(value: &Value, path: &str) -> Result<Schema> {
    schema_from_raw(from_value_with_path(value)?, path)
}

fn schema_from_raw(raw: RawSchema, path: &str) -> Result<Schema> {
    reject_unsupported_keywords(&raw, path)?;

    if raw.reference.is_some() {
        return reference_from_raw(raw, path);
    }
    if raw.any_of.is_some() {
        return union_from_raw(raw, path);
    }
    if raw.all_of.is_some() {
        if raw.type_.is_some() && !raw.type_is("object") {
            return Err(SchemaError::unsupported(format!("{path}: allOf on a non-object type")));
        }
        return object_from_raw(raw, path).map(Schema::Object);
    }

    let keywords = match raw.type_keywords() {
        Some(kinds) => kinds,
        None if raw.properties.is_some() => vec!["object".to_owned()],
        None => return Err(SchemaError::invalid(path, "schema has no type")),
    };
    match keywords.as_slice() {
        [] => Err(SchemaError::invalid(format!("{path}/type"), "empty type list")),
        [single] => typed_from_raw(single, raw, path),
        many => multi_type_from_raw(many, &raw, path),
    }
}

fn reject_unsupported_keywords(raw: &RawSchema, path: &str) -> Result<()> {
    match raw.rest.keys().find(|k| UNSUPPORTED_KEYWORDS.contains(&k.as_str())) {
        Some(keyword) => Err(SchemaError::unsupported(format!("{path}: keyword `{keyword}`"))),
        None => Ok(()),
    }
}

fn reference_from_raw(raw: RawSchema, path: &str) -> Result<Schema> {
    if raw.any_of.is_some() || raw.all_of.is_some() || raw.items.is_some() || raw.enum_.is_some() {
        return Err(SchemaError::unsupported(format!(
            "{path}: $ref combined with anyOf/allOf/items/enum"
        )));
    }
    if raw.properties.is_some() || raw.type_is("object") {
        // `$ref` beside properties: inherit from the referenced type
        return object_from_raw(raw, path).map(Schema::Object);
    }
    if raw.type_.is_some() {
        return Err(SchemaError::unsupported(format!("{path}: $ref combined with a non-object type")));
    }
    let target = raw.reference.unwrap_or_default();
    Ok(Schema::Ref(Reference::new(target)))
}

fn union_from_raw(raw: RawSchema, path: &str) -> Result<Schema> {
    if raw.all_of.is_some() || raw.properties.is_some() || raw.items.is_some() || raw.enum_.is_some() {
        return Err(SchemaError::unsupported(format!(
            "{path}: anyOf combined with allOf/properties/items/enum"
        )));
    }
    if raw.type_.is_some() && !raw.type_is("object") {
        return Err(SchemaError::unsupported(format!("{path}: anyOf with a `type`")));
    }
    let alternatives = raw
        .any_of
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, alt)| schema_from_raw(alt, &format!("{path}/anyOf/{i}")))
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::Union(UnionSchema { alternatives }))
}

/// Structural keywords that only make sense for one `type`.
fn reject_foreign_keywords(raw: &RawSchema, keyword: &str, path: &str) -> Result<()> {
    let present = [
        ("properties", raw.properties.is_some(), keyword == "object"),
        ("required", raw.required.is_some(), keyword == "object"),
        ("items", raw.items.is_some(), keyword == "array"),
        ("enum", raw.enum_.is_some(), !matches!(keyword, "object" | "array")),
    ];
    match present.iter().find(|(_, set, allowed)| *set && !allowed) {
        Some((name, ..)) => Err(SchemaError::unsupported(format!(
            "{path}: `{name}` on a schema of type `{keyword}`"
        ))),
        None => Ok(()),
    }
}

fn typed_from_raw(keyword: &str, raw: RawSchema, path: &str) -> Result<Schema> {
    reject_foreign_keywords(&raw, keyword, path)?;
    match keyword {
        "object" => object_from_raw(raw, path).map(Schema::Object),
        "array" => {
            let items = match raw.items {
                None => Vec::new(),
                Some(OneOrMany::One(item)) => vec![item],
                Some(OneOrMany::Many(items)) => items,
            };
            let items = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| schema_from_raw(*item, &format!("{path}/items/{i}")))
                .collect::<Result<Vec<_>>>()?;
            Ok(Schema::Array(ArraySchema { items }))
        }
        other => {
            let kind = Kind::from_keyword(other)
                .ok_or_else(|| SchemaError::invalid(format!("{path}/type"), format!("unknown type `{other}`")))?;
            let enum_ = match raw.enum_ {
                None => None,
                Some(values) if values.is_empty() => {
                    return Err(SchemaError::invalid(format!("{path}/enum"), "enum must not be empty"));
                }
                Some(values) => Some(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| literal(kind, v, &format!("{path}/enum/{i}")))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            Ok(Schema::Primitive(PrimitiveSchema { id: raw.id, kind, enum_ }))
        }
    }
}

fn multi_type_from_raw(keywords: &[String], raw: &RawSchema, path: &str) -> Result<Schema> {
    if raw.enum_.is_some() || raw.items.is_some() || raw.properties.is_some() || raw.required.is_some() {
        return Err(SchemaError::unsupported(format!(
            "{path}: enum/items/properties/required on a multi-type schema"
        )));
    }
    let kinds = keywords
        .iter()
        .map(|keyword| match keyword.as_str() {
            "object" | "array" => Err(SchemaError::unsupported(format!(
                "{path}: `{keyword}` inside a multi-type `type` list"
            ))),
            other => Kind::from_keyword(other)
                .ok_or_else(|| SchemaError::invalid(format!("{path}/type"), format!("unknown type `{other}`"))),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::MultiType(MultiTypeSchema { kinds }))
}

fn object_from_raw(raw: RawSchema, path: &str) -> Result<ObjectSchema> {
    let properties = raw
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(name, property)| {
            let schema = schema_from_raw(property, &format!("{path}/properties/{name}"))?;
            Ok((name, schema))
        })
        .collect::<Result<IndexMap<_, _>>>()?;

    let all_of = match raw.all_of {
        None => None,
        Some(members) => Some(
            members
                .into_iter()
                .enumerate()
                .map(|(i, member)| all_of_member(member, &format!("{path}/allOf/{i}")))
                .collect::<Result<Vec<_>>>()?,
        ),
    };

    Ok(ObjectSchema {
        id: raw.id,
        extends: raw.reference.map(Reference::new),
        properties,
        required: raw.required.map(|names| names.into_iter().collect::<IndexSet<_>>()),
        all_of,
    })
}

fn all_of_member(raw: RawSchema, path: &str) -> Result<AllOfMember> {
    match schema_from_raw(raw, path)? {
        Schema::Ref(reference) => Ok(AllOfMember::Ref(reference)),
        Schema::Object(object) if object.extends.is_none() => Ok(AllOfMember::Object(object)),
        Schema::Object(ObjectSchema { extends: Some(reference), properties, id: None, all_of: None, .. })
            if properties.is_empty() =>
        {
            Ok(AllOfMember::Ref(reference))
        }
        other => Err(SchemaError::unsupported(format!(
            "{path}: allOf members must be plain `$ref`s or object schemas, found {}",
            other.describe()
        ))),
    }
}

fn literal(kind: Kind, value: &Value, path: &str) -> Result<Literal> {
    let literal = match (kind, value) {
        (Kind::Null, Value::Null) => Some(Literal::Null),
        (Kind::Boolean, Value::Bool(b)) => Some(Literal::Boolean(*b)),
        (Kind::Integer, Value::Number(n)) => n.as_i64().map(Literal::Integer),
        (Kind::Number, Value::Number(n)) => n.as_f64().map(Literal::from),
        (Kind::String, Value::String(s)) => Some(Literal::String(s.clone())),
        _ => None,
    };
    literal.ok_or_else(|| {
        SchemaError::invalid(path, format!("enum literal {value} does not match type `{}`", kind.keyword()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(document: Value) -> Result<Vec<Schema>> {
        load_document(&document, None)
    }

    fn load_one(schema: Value) -> Result<Schema> {
        schema_from_value(&schema, "")
    }

    #[test]
    fn top_level_entries_keep_document_order() {
        let schemas = load(json!({
            "properties": {
                "Zed": {"id": "#Zed", "type": "object", "properties": {}},
                "Alpha": {"id": "#Alpha", "type": "string", "enum": ["a"]},
            }
        }))
        .unwrap();
        let ids: Vec<_> = schemas.iter().map(|s| s.id().unwrap()).collect();
        assert_eq!(ids, ["#Zed", "#Alpha"]);
    }

    #[test]
    fn entries_without_id_are_skipped() {
        let schemas = load(json!({
            "properties": {
                "Anonymous": {"type": "object", "properties": {"a": {"type": "integer"}}},
                "Named": {"id": "#Named", "type": "object"},
            }
        }))
        .unwrap();
        assert_eq!(schemas.len(), 1);
    }

    #[test]
    fn top_level_any_of_is_rejected() {
        let err = load(json!({
            "properties": {"Either": {"id": "#Either", "anyOf": [{"type": "string"}]}}
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedShape(_)));
    }

    #[test]
    fn bare_top_level_all_of_is_rejected() {
        let err = load(json!({
            "properties": {"Both": {"allOf": [{"$ref": "#A"}]}}
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedShape(_)));
    }

    #[test]
    fn json_pointer_selects_the_root() {
        let document = json!({
            "components": {"schemas": {
                "properties": {"Pet": {"id": "#Pet", "type": "object"}}
            }}
        });
        let schemas = load_document(&document, Some("/components/schemas")).unwrap();
        assert_eq!(schemas.len(), 1);
        assert!(matches!(
            load_document(&document, Some("/nope")),
            Err(SchemaError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn missing_root_properties_is_invalid() {
        assert!(matches!(load(json!({"type": "object"})), Err(SchemaError::InvalidDocument { .. })));
    }

    #[test]
    fn malformed_type_reports_its_path() {
        let err = load(json!({
            "properties": {"Pet": {"id": "#Pet", "type": 5}}
        }))
        .unwrap_err();
        match err {
            SchemaError::InvalidDocument { path, .. } => assert!(path.starts_with("properties.Pet")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn object_with_required_and_ref_property() {
        let schema = load_one(json!({
            "id": "#Person",
            "type": "object",
            "title": "ignored annotation",
            "properties": {
                "first_name": {"type": "string"},
                "pet": {"$ref": "#Pet", "description": "also ignored"}
            },
            "required": ["first_name"]
        }))
        .unwrap();
        let Schema::Object(person) = schema else { panic!("expected object") };
        assert_eq!(person.id.as_deref(), Some("#Person"));
        assert!(person.is_required("first_name"));
        assert_eq!(person.properties["pet"], Schema::reference("#Pet"));
    }

    #[test]
    fn omitted_required_stays_omitted() {
        let Schema::Object(object) = load_one(json!({"type": "object", "properties": {}})).unwrap() else {
            panic!("expected object")
        };
        assert_eq!(object.required, None);
    }

    #[test]
    fn dollar_id_is_accepted() {
        let schema = load_one(json!({"$id": "#Color", "type": "string", "enum": ["red"]})).unwrap();
        assert_eq!(schema.id(), Some("#Color"));
    }

    #[test]
    fn type_list_becomes_multi_type() {
        assert_eq!(
            load_one(json!({"type": ["integer", "null"]})).unwrap(),
            Schema::multi_type(vec![Kind::Integer, Kind::Null])
        );
        assert_eq!(load_one(json!({"type": ["string"]})).unwrap(), Schema::primitive(Kind::String));
        assert!(matches!(
            load_one(json!({"type": ["object", "null"]})),
            Err(SchemaError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn items_accept_object_or_list() {
        assert_eq!(
            load_one(json!({"type": "array", "items": {"type": "integer"}})).unwrap(),
            Schema::array(vec![Schema::primitive(Kind::Integer)])
        );
        assert_eq!(
            load_one(json!({"type": "array", "items": [{"type": "integer"}, {"$ref": "#Bar"}]})).unwrap(),
            Schema::array(vec![Schema::primitive(Kind::Integer), Schema::reference("#Bar")])
        );
    }

    #[test]
    fn enum_literals_are_typed_by_kind() {
        let schema = load_one(json!({"type": "number", "enum": [1.1, 2]})).unwrap();
        assert!(matches!(
            schema,
            Schema::Primitive(PrimitiveSchema { enum_: Some(ref v), .. })
                if v == &vec![Literal::from(1.1), Literal::from(2.0)]
        ));
        assert!(matches!(
            load_one(json!({"type": "integer", "enum": [1, "two"]})),
            Err(SchemaError::InvalidDocument { .. })
        ));
        assert!(matches!(
            load_one(json!({"type": "string", "enum": []})),
            Err(SchemaError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn any_of_becomes_union() {
        assert_eq!(
            load_one(json!({"anyOf": [{"type": "string"}, {"$ref": "#Car"}]})).unwrap(),
            Schema::union(vec![Schema::primitive(Kind::String), Schema::reference("#Car")])
        );
    }

    #[test]
    fn all_of_members_split_into_refs_and_objects() {
        let Schema::Object(foo) = load_one(json!({
            "id": "#Foo",
            "type": "object",
            "allOf": [
                {"$ref": "#Bar"},
                {"type": "object", "properties": {"a": {"type": "integer"}}}
            ]
        }))
        .unwrap() else {
            panic!("expected object")
        };
        let members = foo.all_of.unwrap();
        assert_eq!(members[0], AllOfMember::Ref(Reference::new("#Bar")));
        assert!(matches!(members[1], AllOfMember::Object(_)));
    }

    #[test]
    fn all_of_rejects_primitive_members() {
        let err = load_one(json!({"id": "#Foo", "allOf": [{"type": "integer"}]})).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedShape(_)));
    }

    #[test]
    fn ref_beside_properties_extends() {
        let Schema::Object(foo) = load_one(json!({
            "id": "#Foo",
            "type": "object",
            "$ref": "#Bar",
            "properties": {"a": {"type": ["integer", "string"]}}
        }))
        .unwrap() else {
            panic!("expected object")
        };
        assert_eq!(foo.extends, Some(Reference::new("#Bar")));
    }

    #[test]
    fn unsupported_keywords_fail_loudly() {
        for schema in [
            json!({"oneOf": [{"type": "string"}]}),
            json!({"type": "string", "format": "date-time"}),
            json!({"type": "integer", "minimum": 0}),
            json!({"if": {"type": "string"}, "then": {"type": "string"}}),
        ] {
            assert!(
                matches!(load_one(schema.clone()), Err(SchemaError::UnsupportedShape(_))),
                "{schema}"
            );
        }
    }

    #[test]
    fn syntax_errors_carry_line_and_column() {
        match parse_document("{\n  \"properties\": ,\n}") {
            Err(SchemaError::InvalidDocument { path, .. }) => assert!(path.starts_with("line 2")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn nested_item_schemas_load() {
        assert_eq!(
            load_one(json!({"type": "array", "items": {"type": "array", "items": [{"$ref": "#Cell"}]}})).unwrap(),
            Schema::array(vec![Schema::array(vec![Schema::reference("#Cell")])])
        );
    }

    #[test]
    fn typed_reference_in_all_of_is_a_base() {
        let Schema::Object(foo) = load_one(json!({
            "id": "#Foo",
            "allOf": [{"$ref": "#Bar", "type": "object"}]
        }))
        .unwrap() else {
            panic!("expected object")
        };
        assert_eq!(foo.all_of, Some(vec![AllOfMember::Ref(Reference::new("#Bar"))]));
    }

    #[test]
    fn keywords_foreign_to_the_type_are_rejected() {
        for schema in [
            json!({"type": "object", "enum": [1]}),
            json!({"type": "string", "items": {"type": "string"}}),
            json!({"type": "integer", "properties": {"a": {"type": "string"}}}),
            json!({"type": "array", "items": {"type": "string"}, "required": ["a"]}),
            json!({"type": "array", "enum": [[1]]}),
            json!({"type": ["string", "null"], "items": {"type": "string"}}),
        ] {
            assert!(
                matches!(load_one(schema.clone()), Err(SchemaError::UnsupportedShape(_))),
                "{schema}"
            );
        }
    }

    #[test]
    fn untyped_schema_is_invalid() {
        assert!(matches!(load_one(json!({"title": "?"})), Err(SchemaError::InvalidDocument { .. })));
    }
}
