//! Loading spaces: named registries of foreign types and their constructors.
//!
//! A space is populated once by the side that owns the implementations and is
//! read-only afterwards. Resolution always goes through the space handle the
//! caller supplies; there is no ambient fallback to the caller's own types.

use std::any::Any;
use std::collections::HashMap;

use tracing::debug;

use super::value::{ArgValue, ConstructorSignature};
use super::BridgeError;

/// Boxed value produced by a registered constructor body.
pub type BoxedValue = Box<dyn Any + Send + Sync>;

type BuildFn = Box<dyn Fn(Vec<ArgValue>) -> Result<BoxedValue, String> + Send + Sync>;

/// An object constructed inside a foreign loading space.
///
/// Exclusively owned by the caller that requested construction; the space
/// retains no reference. The owning side may recover the concrete value with
/// [`BridgedInstance::downcast`]; everyone else stays on capability traits.
pub struct BridgedInstance {
    type_name: String,
    value: BoxedValue,
}

impl std::fmt::Debug for BridgedInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgedInstance")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl BridgedInstance {
    pub fn new(type_name: impl Into<String>, value: BoxedValue) -> Self {
        Self { type_name: type_name.into(), value }
    }

    /// Qualified name of the foreign type this instance was built from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Recover the concrete value, or hand the instance back unchanged.
    pub fn downcast<T: Any>(self) -> Result<Box<T>, BridgedInstance> {
        let type_name = self.type_name;
        self.value
            .downcast::<T>()
            .map_err(|value| BridgedInstance { type_name, value })
    }
}

/// A constructor registered on a foreign type.
pub struct RegisteredConstructor {
    type_name: String,
    signature: ConstructorSignature,
    build: BuildFn,
}

impl std::fmt::Debug for RegisteredConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredConstructor")
            .field("type_name", &self.type_name)
            .field("signature", &self.signature)
            .finish()
    }
}

impl RegisteredConstructor {
    pub fn signature(&self) -> &ConstructorSignature {
        &self.signature
    }

    /// Construct an instance from marshalled arguments.
    ///
    /// Argument count and kinds are validated against the signature before the
    /// constructor body runs; a body failure surfaces wrapped, never swallowed.
    /// Either the whole construction succeeds or nothing is produced.
    pub fn instantiate(&self, args: Vec<ArgValue>) -> Result<BridgedInstance, BridgeError> {
        if args.len() != self.signature.arity() {
            return Err(BridgeError::Instantiation {
                type_name: self.type_name.clone(),
                cause: format!(
                    "expected {} arguments, got {}",
                    self.signature.arity(),
                    args.len()
                ),
            });
        }
        for (position, (arg, kind)) in args.iter().zip(self.signature.params).enumerate() {
            if !arg.satisfies(kind) {
                return Err(BridgeError::Instantiation {
                    type_name: self.type_name.clone(),
                    cause: format!("argument {} does not satisfy kind {}", position, kind),
                });
            }
        }
        let value = (self.build)(args).map_err(|cause| BridgeError::Instantiation {
            type_name: self.type_name.clone(),
            cause,
        })?;
        debug!(type_name = %self.type_name, "constructed bridged instance");
        Ok(BridgedInstance::new(self.type_name.clone(), value))
    }
}

/// A type registered in a loading space: qualified name plus constructors.
pub struct ForeignType {
    name: String,
    constructors: Vec<RegisteredConstructor>,
}

impl std::fmt::Debug for ForeignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignType")
            .field("name", &self.name)
            .field("constructors", &self.constructors)
            .finish()
    }
}

impl ForeignType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Select the one constructor whose schema matches exactly.
    ///
    /// No partial or assignable matching: skew between the caller's schema and
    /// the registered one must fail loudly, not bind wrong semantics.
    pub fn select_constructor(
        &self,
        signature: &ConstructorSignature,
    ) -> Result<&RegisteredConstructor, BridgeError> {
        self.constructors
            .iter()
            .find(|ctor| ctor.signature == *signature)
            .ok_or_else(|| BridgeError::SignatureMismatch {
                type_name: self.name.clone(),
                signature: signature.to_string(),
            })
    }
}

/// A named, isolated registry of foreign types.
pub struct LoadingSpace {
    name: String,
    types: HashMap<String, ForeignType>,
}

impl LoadingSpace {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), types: HashMap::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a constructor for `type_name`, creating the type entry on
    /// first registration.
    pub fn register_constructor<F>(
        &mut self,
        type_name: &str,
        signature: ConstructorSignature,
        build: F,
    ) where
        F: Fn(Vec<ArgValue>) -> Result<BoxedValue, String> + Send + Sync + 'static,
    {
        let entry = self
            .types
            .entry(type_name.to_string())
            .or_insert_with(|| ForeignType { name: type_name.to_string(), constructors: Vec::new() });
        entry.constructors.push(RegisteredConstructor {
            type_name: type_name.to_string(),
            signature,
            build: Box::new(build),
        });
        debug!(space = %self.name, type_name, %signature, "registered constructor");
    }

    /// Resolve a qualified name inside this space.
    pub fn resolve(&self, type_name: &str) -> Result<&ForeignType, BridgeError> {
        self.types
            .get(type_name)
            .ok_or_else(|| BridgeError::TypeResolution {
                space: self.name.clone(),
                type_name: type_name.to_string(),
            })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
