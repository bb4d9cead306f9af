//! Failure kinds for loading, resolving, merging and emitting.
//!
//! Every failure is terminal for the current run: the pipeline is a
//! deterministic compiler pass, so nothing here is retried.
use thiserror::Error;

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A schema shape or combination the resolver/merger does not implement
    /// (nested `anyOf`, nested `allOf`, `$ref` inside an intersection, …).
    #[error("unsupported schema shape: {0}")]
    UnsupportedShape(String),

    /// An array without item schemas, or an intersection with nothing in common.
    #[error("empty alternatives: {0}")]
    EmptyAlternatives(String),

    /// A schema that must become a named declaration carries no usable `id`.
    #[error("missing identity: {0}")]
    MissingIdentity(String),

    /// The raw document does not have the structure the loader expects.
    #[error("invalid schema document at {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    /// The emitter cannot spell `name` in the target language.
    #[error("cannot emit name `{name}`: {reason}")]
    UnrepresentableName { name: String, reason: String },
}

impl SchemaError {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Self::UnsupportedShape(what.into())
    }

    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument { path: path.into(), reason: reason.into() }
    }

    /// Prefix the reason with where in the schema the failure happened.
    pub(crate) fn within(self, location: &str) -> Self {
        match self {
            Self::UnsupportedShape(reason) => Self::UnsupportedShape(format!("{location}: {reason}")),
            Self::EmptyAlternatives(reason) => Self::EmptyAlternatives(format!("{location}: {reason}")),
            Self::MissingIdentity(reason) => Self::MissingIdentity(format!("{location}: {reason}")),
            other => other,
        }
    }
}
