//! Cross-space object construction.
//!
//! A controller and a forked worker load potentially incompatible versions of
//! the reporting types. Construction therefore never goes through shared
//! concrete types: the worker side installs its implementations into a
//! [`LoadingSpace`] registry under qualified names, and the controller
//! constructs them by marshalling primitive values against a versioned
//! constructor schema. The result is handed back only through a capability
//! trait the controller already understands.
//!
//! Matching is exact on parameter order, arity, and schema version. A version
//! skew between the two sides fails loudly at construction time instead of
//! silently binding wrong semantics.

pub mod reporting;
pub mod space;
pub mod value;

use thiserror::Error;

pub use reporting::{
    build_reporter_factory, install_reporting_types, ConsoleLogger, ReportSettings,
    ReporterFactory, TracingConsoleLogger,
};
pub use space::{BridgedInstance, ForeignType, LoadingSpace, RegisteredConstructor};
pub use value::{ArgValue, ConstructorSignature, ParamKind};

/// Failures raised while constructing objects across loading spaces.
///
/// All variants are fatal to the operation that raised them; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The qualified name is not registered in the target loading space.
    #[error("type '{type_name}' is not registered in loading space '{space}'")]
    TypeResolution { space: String, type_name: String },

    /// The type exists but no registered constructor matches the requested
    /// schema exactly.
    #[error("no constructor on '{type_name}' matches signature {signature}")]
    SignatureMismatch { type_name: String, signature: String },

    /// Construction was invoked but failed; the underlying cause is carried,
    /// never swallowed.
    #[error("failed to construct '{type_name}': {cause}")]
    Instantiation { type_name: String, cause: String },
}
