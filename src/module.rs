//! Declaration ordering for one output unit.
use serde::Serialize;
use tracing::{info, warn};

use crate::decl::build;
use crate::error::Result;
use crate::ir::Declaration;
use crate::schema::Schema;

/// Type-system facilities an emitter must make available. Requested in full
/// on every run; pruning unused ones is left to the emitter/formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportRole {
    /// forward references between declarations
    DeferredAnnotations,
    EnumBase,
    LiteralSet,
    TaggedUnion,
    OptionalField,
    RecordBase,
}

pub const REQUIRED_IMPORTS: &[ImportRole] = &[
    ImportRole::DeferredAnnotations,
    ImportRole::EnumBase,
    ImportRole::LiteralSet,
    ImportRole::TaggedUnion,
    ImportRole::OptionalField,
    ImportRole::RecordBase,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub imports: &'static [ImportRole],
    pub declarations: Vec<Declaration>,
}

/// Records (input order) followed by enumerations (input order).
///
/// No topological sort: declarations may reference types declared later, or
/// themselves. The first failure aborts the whole module.
pub fn assemble(schemas: &[Schema]) -> Result<Module> {
    let mut records = Vec::new();
    let mut enums = Vec::new();

    for schema in schemas {
        match build(schema)? {
            Some(record @ Declaration::Record(_)) => records.push(record),
            Some(enumeration @ Declaration::Enum(_)) => enums.push(enumeration),
            None => warn!(
                shape = schema.describe(),
                id = schema.id().unwrap_or("<none>"),
                "top-level schema declares no type; skipping"
            ),
        }
    }

    info!(records = records.len(), enums = enums.len(), "assembled module");
    records.extend(enums);
    Ok(Module { imports: REQUIRED_IMPORTS, declarations: records })
}
