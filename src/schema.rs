//! In-memory schema model.
//!
//! One closed variant per JSON Schema shape the generator understands. Nodes
//! are built once by [`crate::load`] and never mutated afterwards; `$ref`s are
//! kept as names and looked up later, so recursive schema graphs need no
//! shared ownership.
use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;
use serde::Serialize;

// ————————————————————————————————————————————————————————————————————————————
// KINDS & LITERALS
// ————————————————————————————————————————————————————————————————————————————

/// Primitive `type` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Boolean,
    Integer,
    Number,
    String,
    Null,
}

impl Kind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Null => "null",
        }
    }
}

/// A single `enum` member. Numbers use a total order so literals can be
/// hashed and compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(OrderedFloat<f64>),
    String(String),
}

impl Literal {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Boolean(_) => Kind::Boolean,
            Self::Integer(_) => Kind::Integer,
            Self::Number(_) => Kind::Number,
            Self::String(_) => Kind::String,
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Number(OrderedFloat(value))
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Object(ObjectSchema),
    Array(ArraySchema),
    Primitive(PrimitiveSchema),
    MultiType(MultiTypeSchema),
    /// `anyOf`
    Union(UnionSchema),
    Ref(Reference),
}

/// `properties` keep document order. Equality is map/set equality, so two
/// objects with the same members compare equal regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub id: Option<String>,
    /// `$ref` next to `properties`: the object inherits from the referenced type.
    pub extends: Option<Reference>,
    pub properties: IndexMap<String, Schema>,
    /// `None` when the keyword was omitted, which is not the same as `[]`.
    pub required: Option<IndexSet<String>>,
    pub all_of: Option<Vec<AllOfMember>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllOfMember {
    Ref(Reference),
    Object(ObjectSchema),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Vec<Schema>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSchema {
    pub id: Option<String>,
    pub kind: Kind,
    pub enum_: Option<Vec<Literal>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiTypeSchema {
    pub kinds: Vec<Kind>,
}

/// Alternatives keep declaration order for emission; equality compares them
/// as a multiset, like `properties` and `required` on objects.
#[derive(Debug, Clone)]
pub struct UnionSchema {
    pub alternatives: Vec<Schema>,
}

impl PartialEq for UnionSchema {
    fn eq(&self, other: &Self) -> bool {
        let count = |xs: &[Schema], x: &Schema| xs.iter().filter(|y| *y == x).count();
        self.alternatives.len() == other.alternatives.len()
            && self
                .alternatives
                .iter()
                .all(|x| count(&self.alternatives, x) == count(&other.alternatives, x))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub target: String,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS & PREDICATES
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    pub fn primitive(kind: Kind) -> Self {
        Self::Primitive(PrimitiveSchema { id: None, kind, enum_: None })
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::Ref(Reference::new(target))
    }

    pub fn union(alternatives: Vec<Schema>) -> Self {
        Self::Union(UnionSchema { alternatives })
    }

    pub fn array(items: Vec<Schema>) -> Self {
        Self::Array(ArraySchema { items })
    }

    pub fn multi_type(kinds: Vec<Kind>) -> Self {
        Self::MultiType(MultiTypeSchema { kinds })
    }

    /// A primitive carrying a non-empty `enum`.
    pub fn is_enumerable(&self) -> bool {
        matches!(self, Self::Primitive(p) if p.is_enumerable())
    }

    /// An object composed through `allOf`.
    pub fn is_composed(&self) -> bool {
        matches!(self, Self::Object(o) if o.all_of.is_some())
    }

    /// The `id` of nodes that can carry one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Object(o) => o.id.as_deref(),
            Self::Primitive(p) => p.id.as_deref(),
            _ => None,
        }
    }

    /// Short label for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Object(o) if o.all_of.is_some() => "allOf object",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Primitive(p) if p.is_enumerable() => "enum",
            Self::Primitive(_) => "primitive",
            Self::MultiType(_) => "multi-type",
            Self::Union(_) => "anyOf",
            Self::Ref(_) => "$ref",
        }
    }
}

impl ObjectSchema {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Self::default() }
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_all_of(mut self, members: Vec<AllOfMember>) -> Self {
        self.all_of = Some(members);
        self
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.as_ref().is_some_and(|r| r.contains(name))
    }
}

impl PrimitiveSchema {
    pub fn is_enumerable(&self) -> bool {
        self.enum_.as_ref().is_some_and(|values| !values.is_empty())
    }
}

impl Reference {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }

    pub fn name(&self) -> &str {
        local_name(&self.target)
    }
}

/// Declared name of an `id`/`$ref`: the text after the last `#`, then after
/// the last `/` (`"#Person"` → `Person`, `"#/definitions/Pet"` → `Pet`).
pub fn local_name(id: &str) -> &str {
    let fragment = id.rsplit('#').next().unwrap_or(id);
    fragment.rsplit('/').next().unwrap_or(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_strips_fragment_and_path() {
        assert_eq!(local_name("#Person"), "Person");
        assert_eq!(local_name("#/definitions/Pet"), "Pet");
        assert_eq!(local_name("schemas.json#Car"), "Car");
        assert_eq!(local_name("Plain"), "Plain");
        assert_eq!(local_name("#"), "");
    }

    #[test]
    fn omitted_and_empty_required_differ() {
        let omitted = ObjectSchema::new("#A").with_property("a", Schema::primitive(Kind::Integer));
        let empty = omitted.clone().with_required(Vec::<String>::new());
        assert_ne!(omitted, empty);
        assert!(!empty.is_required("a"));
    }

    #[test]
    fn property_order_does_not_affect_equality() {
        let ab = ObjectSchema::default()
            .with_property("a", Schema::primitive(Kind::Integer))
            .with_property("b", Schema::primitive(Kind::String));
        let ba = ObjectSchema::default()
            .with_property("b", Schema::primitive(Kind::String))
            .with_property("a", Schema::primitive(Kind::Integer));
        assert_eq!(ab, ba);
    }

    #[test]
    fn union_order_does_not_affect_equality() {
        let int_str = Schema::union(vec![Schema::primitive(Kind::Integer), Schema::primitive(Kind::String)]);
        let str_int = Schema::union(vec![Schema::primitive(Kind::String), Schema::primitive(Kind::Integer)]);
        assert_eq!(int_str, str_int);

        let twice = Schema::union(vec![Schema::primitive(Kind::Integer), Schema::primitive(Kind::Integer)]);
        assert_ne!(int_str, twice);
    }

    #[test]
    fn enumerable_requires_non_empty_enum() {
        let empty = Schema::Primitive(PrimitiveSchema {
            id: None,
            kind: Kind::String,
            enum_: Some(vec![]),
        });
        assert!(!empty.is_enumerable());
        let colors = Schema::Primitive(PrimitiveSchema {
            id: Some("#Color".into()),
            kind: Kind::String,
            enum_: Some(vec!["red".into()]),
        });
        assert!(colors.is_enumerable());
    }
}
