//! `allOf` merging.
//!
//! Inline object members of an `allOf` are folded into one synthetic object:
//! new properties are taken as-is, repeated properties are replaced by the
//! intersection of both declarations, and `required` is the union of every
//! *explicitly declared* `required` list.
use indexmap::IndexSet;

use crate::error::{Result, SchemaError};
use crate::schema::{ObjectSchema, Schema};

// ------------------------------- Merge ----------------------------------- //

/// Fold `schemas` left to right into a single object schema.
///
/// Properties keep first-seen order; equality of the result does not depend
/// on the order of `schemas`.
pub fn merge(schemas: &[ObjectSchema]) -> Result<ObjectSchema> {
    if schemas.is_empty() {
        return Err(SchemaError::EmptyAlternatives("allOf has no object schemas to merge".into()));
    }

    let mut out = ObjectSchema::default();
    for schema in schemas {
        if schema.all_of.is_some() {
            return Err(SchemaError::unsupported("nested allOf"));
        }

        for (name, property) in &schema.properties {
            let merged = match out.properties.get(name) {
                None => property.clone(),
                Some(existing) => intersect_property(name, existing, property)?,
            };
            // replacing an existing key keeps its original position
            out.properties.insert(name.clone(), merged);
        }

        // omission means "unknown", so only explicit lists contribute
        if let Some(required) = &schema.required {
            out.required
                .get_or_insert_with(IndexSet::new)
                .extend(required.iter().cloned());
        }
    }
    Ok(out)
}

fn intersect_property(name: &str, a: &Schema, b: &Schema) -> Result<Schema> {
    intersection(a, b).map_err(|error| error.within(&format!("property `{name}`")))
}

// ---------------------------- Intersection ------------------------------- //

/// Every schema shape common to `a` and `b`, in `a`'s order.
///
/// `anyOf` operands contribute their alternatives, multi-type operands one
/// primitive per kind, anything else itself. Shapes match by structural
/// equality (same kind, same `enum` if any).
pub fn intersect(a: &Schema, b: &Schema) -> Result<Vec<Schema>> {
    let a_alternatives = alternatives(a)?;
    let b_alternatives = alternatives(b)?;

    let mut common = Vec::<Schema>::new();
    for item in a_alternatives {
        if b_alternatives.contains(&item) && !common.contains(&item) {
            common.push(item);
        }
    }
    Ok(common)
}

/// [`intersect`] collapsed to one schema: the single common shape, or an
/// `anyOf` of all of them. Nothing in common is an error.
pub fn intersection(a: &Schema, b: &Schema) -> Result<Schema> {
    let mut common = intersect(a, b)?;
    match common.len() {
        0 => Err(SchemaError::EmptyAlternatives(format!(
            "no schema intersection between {} and {}",
            a.describe(),
            b.describe()
        ))),
        1 => Ok(common.remove(0)),
        _ => Ok(Schema::union(common)),
    }
}

fn alternatives(schema: &Schema) -> Result<Vec<Schema>> {
    match schema {
        Schema::Ref(reference) => Err(SchemaError::unsupported(format!(
            "cannot intersect `$ref` {} without dereferencing it",
            reference.target
        ))),
        Schema::Union(u) => Ok(u.alternatives.clone()),
        Schema::MultiType(m) => Ok(m.kinds.iter().copied().map(Schema::primitive).collect()),
        other => Ok(vec![other.clone()]),
    }
}
