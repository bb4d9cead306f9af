//! JSON Schema → typed declarations.
//!
//! Pipeline: [`load`] (raw document → [`schema::Schema`]) → [`module::assemble`]
//! (declaration building, which drives [`resolve`] and [`merge`]) →
//! [`codegen`] (Python source) or the [`ir`] serialized as JSON.
pub mod cli;
pub mod codegen;
pub mod decl;
pub mod error;
pub mod ir;
pub mod load;
pub mod merge;
pub mod module;
pub mod path_de;
pub mod resolve;
pub mod schema;

pub use codegen::{Codegen, CodegenOptions, EnumStyle};
pub use error::{Result, SchemaError};
pub use ir::{Declaration, Ty};
pub use module::{Module, assemble};
pub use schema::Schema;
