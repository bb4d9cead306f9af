//! Top-level schema → named declaration.
//!
//! Objects become records; enumerable primitives become enumerations. For
//! `allOf` objects, `$ref` members become bases and inline object members are
//! merged into the record's own fields.
use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::ir::{Declaration, EnumDecl, Field, RecordDecl};
use crate::merge::merge;
use crate::resolve::resolve;
use crate::schema::{AllOfMember, ObjectSchema, PrimitiveSchema, Schema, local_name};

/// Build the declaration for one top-level schema; `None` for shapes that do
/// not declare a type (bare primitives, arrays, references, unions).
pub fn build(schema: &Schema) -> Result<Option<Declaration>> {
    match schema {
        Schema::Object(object) => build_record(object).map(|r| Some(Declaration::Record(r))),
        Schema::Primitive(p) if p.is_enumerable() => build_enum(p).map(|e| Some(Declaration::Enum(e))),
        _ => Ok(None),
    }
}

pub fn build_record(schema: &ObjectSchema) -> Result<RecordDecl> {
    let name = declared_name(schema.id.as_deref(), "object")?;
    let mut bases: Vec<String> = schema.extends.iter().map(|r| r.name().to_owned()).collect();

    let fields = match &schema.all_of {
        None => fields_of(&name, schema)?,
        Some(members) => {
            if schema.required.is_some() {
                return Err(SchemaError::unsupported(format!(
                    "`{name}` combines allOf with its own required list"
                )));
            }

            // the object's own properties fold in ahead of the inline members
            let mut inline = Vec::<ObjectSchema>::new();
            if !schema.properties.is_empty() {
                inline.push(ObjectSchema {
                    properties: schema.properties.clone(),
                    ..ObjectSchema::default()
                });
            }
            for member in members {
                match member {
                    AllOfMember::Ref(reference) => bases.push(reference.name().to_owned()),
                    AllOfMember::Object(object) => inline.push(object.clone()),
                }
            }

            if inline.is_empty() {
                Vec::new()
            } else {
                let merged = merge(&inline).map_err(|e| e.within(&name))?;
                fields_of(&name, &merged)?
            }
        }
    };

    debug!(record = %name, bases = bases.len(), fields = fields.len(), "built record");
    Ok(RecordDecl { name, bases, fields })
}

pub fn build_enum(schema: &PrimitiveSchema) -> Result<EnumDecl> {
    let name = declared_name(schema.id.as_deref(), "enum")?;
    let values = match &schema.enum_ {
        Some(values) if !values.is_empty() => values.clone(),
        _ => {
            return Err(SchemaError::unsupported(format!("`{name}` declares no enum values")));
        }
    };
    debug!(enum_ = %name, values = values.len(), "built enum");
    Ok(EnumDecl { name, values })
}

fn declared_name(id: Option<&str>, what: &str) -> Result<String> {
    let id = id.ok_or_else(|| SchemaError::MissingIdentity(format!("{what} schema has no id")))?;
    match local_name(id) {
        "" => Err(SchemaError::MissingIdentity(format!("{what} id `{id}` has no local name"))),
        name => Ok(name.to_owned()),
    }
}

fn fields_of(record: &str, schema: &ObjectSchema) -> Result<Vec<Field>> {
    if let Some(required) = &schema.required {
        for missing in required.iter().filter(|n| !schema.properties.contains_key(*n)) {
            warn!(%record, field = %missing, "required field has no property schema; ignoring");
        }
    }

    schema
        .properties
        .iter()
        .map(|(name, property)| {
            let ty = resolve(property).map_err(|e| e.within(&format!("{record}.{name}")))?;
            Ok(Field::new(name, ty, schema.is_required(name)))
        })
        .collect()
}
