//! Schema node → type expression.
//!
//! Total over the supported shapes; anything else is an explicit
//! [`SchemaError`]. Unions come out flat and duplicate-free: a union member
//! that itself resolves to a union (a multi-type alternative) is spliced into
//! its parent, while an `anyOf` nested directly in an `anyOf` is rejected
//! rather than flattened.
use indexmap::IndexSet;
use tracing::trace;

use crate::error::{Result, SchemaError};
use crate::ir::Ty;
use crate::schema::{ObjectSchema, Schema};

pub fn resolve(schema: &Schema) -> Result<Ty> {
    let ty = match schema {
        Schema::Ref(reference) => Ty::named(reference.name()),
        Schema::Primitive(p) if p.is_enumerable() => {
            // enum wins over the raw kind
            Ty::LiteralEnum(p.enum_.clone().unwrap_or_default())
        }
        Schema::Primitive(p) => Ty::Primitive(p.kind),
        Schema::MultiType(m) => {
            let arms = m.kinds.iter().copied().map(Ty::Primitive).collect();
            simplify_union(arms, "multi-type `type` list")?
        }
        Schema::Union(u) => resolve_union(&u.alternatives)?,
        Schema::Array(a) => Ty::list_of(resolve_items(&a.items)?),
        Schema::Object(o) if o.all_of.is_some() => {
            return Err(SchemaError::unsupported(
                "nested allOf: composed objects can only appear as top-level declarations",
            ));
        }
        // `{"$ref": …, "type": "object"}` in a type position is a plain reference
        Schema::Object(ObjectSchema { extends: Some(base), properties, .. }) if properties.is_empty() => {
            Ty::named(base.name())
        }
        Schema::Object(_) => Ty::AnyObject,
    };
    trace!(shape = schema.describe(), ?ty, "resolved");
    Ok(ty)
}

fn resolve_items(items: &[Schema]) -> Result<Ty> {
    match items {
        [] => Err(SchemaError::EmptyAlternatives("array declares no item schemas".into())),
        [single] => resolve(single),
        many => resolve_union(many),
    }
}

fn resolve_union(alternatives: &[Schema]) -> Result<Ty> {
    let mut arms = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        match alternative {
            Schema::Union(_) => return Err(SchemaError::unsupported("nested anyOf")),
            Schema::Object(o) if o.all_of.is_some() => {
                return Err(SchemaError::unsupported("nested allOf inside anyOf"));
            }
            _ => arms.push(resolve(alternative)?),
        }
    }
    simplify_union(arms, "anyOf")
}

// Splice member unions, drop repeats (first occurrence wins), collapse 1 → member.
fn simplify_union(arms: Vec<Ty>, origin: &str) -> Result<Ty> {
    let mut members = IndexSet::<Ty>::with_capacity(arms.len());
    for arm in arms {
        match arm {
            Ty::UnionOf(inner) => members.extend(inner),
            other => {
                members.insert(other);
            }
        }
    }

    let mut members: Vec<Ty> = members.into_iter().collect();
    match members.len() {
        0 => Err(SchemaError::EmptyAlternatives(format!("{origin} declares no alternatives"))),
        1 => Ok(members.remove(0)),
        _ => Ok(Ty::UnionOf(members)),
    }
}
