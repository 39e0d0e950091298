//! Parameter kinds, marshalled argument values, and constructor schemas.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::reporting::ConsoleLogger;
use super::space::BridgedInstance;

/// Kind of a single constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    Str,
    Path,
    /// A previously bridged instance of the named foreign type.
    Instance(&'static str),
    /// A bridged logger capability.
    Logger,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Bool => f.write_str("bool"),
            ParamKind::Int => f.write_str("int"),
            ParamKind::Str => f.write_str("str"),
            ParamKind::Path => f.write_str("path"),
            ParamKind::Instance(name) => write!(f, "instance<{}>", name),
            ParamKind::Logger => f.write_str("logger"),
        }
    }
}

/// A marshalled constructor argument.
///
/// Only primitive/value data and already-bridged handles cross the boundary;
/// concrete foreign types never do.
pub enum ArgValue {
    Bool(bool),
    Int(i32),
    Str(String),
    Path(PathBuf),
    Instance(BridgedInstance),
    Logger(Arc<dyn ConsoleLogger>),
}

impl ArgValue {
    /// Whether this argument satisfies the given parameter kind.
    ///
    /// Instance arguments match only the exact registered type name; there is
    /// no assignable-type matching.
    pub fn satisfies(&self, kind: &ParamKind) -> bool {
        match (self, kind) {
            (ArgValue::Bool(_), ParamKind::Bool) => true,
            (ArgValue::Int(_), ParamKind::Int) => true,
            (ArgValue::Str(_), ParamKind::Str) => true,
            (ArgValue::Path(_), ParamKind::Path) => true,
            (ArgValue::Instance(instance), ParamKind::Instance(name)) => {
                instance.type_name() == *name
            }
            (ArgValue::Logger(_), ParamKind::Logger) => true,
            _ => false,
        }
    }

    pub fn into_bool(self) -> Result<bool, String> {
        match self {
            ArgValue::Bool(value) => Ok(value),
            other => Err(format!("expected bool argument, got {:?}", other)),
        }
    }

    pub fn into_int(self) -> Result<i32, String> {
        match self {
            ArgValue::Int(value) => Ok(value),
            other => Err(format!("expected int argument, got {:?}", other)),
        }
    }

    pub fn into_str(self) -> Result<String, String> {
        match self {
            ArgValue::Str(value) => Ok(value),
            other => Err(format!("expected str argument, got {:?}", other)),
        }
    }

    pub fn into_path(self) -> Result<PathBuf, String> {
        match self {
            ArgValue::Path(value) => Ok(value),
            other => Err(format!("expected path argument, got {:?}", other)),
        }
    }

    pub fn into_instance(self) -> Result<BridgedInstance, String> {
        match self {
            ArgValue::Instance(value) => Ok(value),
            other => Err(format!("expected instance argument, got {:?}", other)),
        }
    }

    pub fn into_logger(self) -> Result<Arc<dyn ConsoleLogger>, String> {
        match self {
            ArgValue::Logger(value) => Ok(value),
            other => Err(format!("expected logger argument, got {:?}", other)),
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(value) => write!(f, "Bool({})", value),
            ArgValue::Int(value) => write!(f, "Int({})", value),
            ArgValue::Str(value) => write!(f, "Str({:?})", value),
            ArgValue::Path(value) => write!(f, "Path({:?})", value),
            ArgValue::Instance(instance) => write!(f, "Instance({})", instance.type_name()),
            ArgValue::Logger(_) => f.write_str("Logger"),
        }
    }
}

/// Versioned, ordered parameter schema used to select exactly one registered
/// constructor.
///
/// Order, arity, and schema version must all match exactly. The schema is a
/// compile-time artifact shared between controller and worker builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorSignature {
    pub schema_version: u32,
    pub params: &'static [ParamKind],
}

impl ConstructorSignature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for ConstructorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}(", self.schema_version)?;
        for (i, kind) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", kind)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_args_satisfy_matching_kinds() {
        assert!(ArgValue::Bool(true).satisfies(&ParamKind::Bool));
        assert!(ArgValue::Int(3).satisfies(&ParamKind::Int));
        assert!(ArgValue::Str("x".to_string()).satisfies(&ParamKind::Str));
        assert!(ArgValue::Path(PathBuf::from("/tmp")).satisfies(&ParamKind::Path));
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        assert!(!ArgValue::Bool(true).satisfies(&ParamKind::Int));
        assert!(!ArgValue::Str("1".to_string()).satisfies(&ParamKind::Int));
        assert!(!ArgValue::Path(PathBuf::from("/tmp")).satisfies(&ParamKind::Str));
    }

    #[test]
    fn test_instance_matches_exact_name_only() {
        let instance = BridgedInstance::new("reporting.Config", Box::new(1u8));
        let arg = ArgValue::Instance(instance);
        assert!(arg.satisfies(&ParamKind::Instance("reporting.Config")));
        assert!(!arg.satisfies(&ParamKind::Instance("reporting.Other")));
    }

    #[test]
    fn test_unmarshalling_rejects_wrong_variant() {
        assert!(ArgValue::Bool(true).into_int().is_err());
        assert!(ArgValue::Int(1).into_str().is_err());
        assert!(ArgValue::Str("s".to_string()).into_bool().is_err());
    }

    #[test]
    fn test_signature_display_lists_kinds_and_version() {
        let sig = ConstructorSignature {
            schema_version: 1,
            params: &[ParamKind::Bool, ParamKind::Str, ParamKind::Instance("a.B")],
        };
        assert_eq!(sig.to_string(), "v1(bool, str, instance<a.B>)");
    }
}
