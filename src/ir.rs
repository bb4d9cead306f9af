// Target-agnostic type IR for codegen. No schema nodes here.
use serde::Serialize;

use crate::schema::{Kind, Literal};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Ty {
    Primitive(Kind),
    Named(String),           // declared type, looked up by name (may be a forward ref)
    AnyObject,               // inline object: no anonymous records in the targets
    ListOf(Box<Ty>),
    UnionOf(Vec<Ty>),        // flat, duplicate-free, ≥ 2 members
    LiteralEnum(Vec<Literal>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDecl {
    pub name: String,
    pub bases: Vec<String>,  // empty unless composed (allOf refs / $ref sibling)
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<Literal>, // positional; duplicates kept
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "declaration", rename_all = "snake_case")]
pub enum Declaration {
    Record(RecordDecl),
    Enum(EnumDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Record(r) => &r.name,
            Self::Enum(e) => &e.name,
        }
    }
}

impl Ty {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list_of(element: Ty) -> Self {
        Self::ListOf(Box::new(element))
    }
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Ty, required: bool) -> Self {
        Self { name: name.into(), ty, required }
    }
}
