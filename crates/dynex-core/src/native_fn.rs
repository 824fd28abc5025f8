//! Native function storage and callable trait.

use std::fmt;
use std::sync::Arc;

use crate::{RuntimeError, TypeHash, Value};

/// Type-erased host callable.
///
/// Wraps anything implementing [`NativeCallable`] so functions of different
/// shapes can be stored uniformly in member descriptors and in
/// [`Value::Func`]. Lambdas created while invoking a compiled expression are
/// `NativeFn`s too, with an empty id.
///
/// Arguments arrive in declaration order; instance members receive the
/// receiver as the first argument.
pub struct NativeFn {
    /// Function id (a [`TypeHash`] of the registered name, or empty for lambdas).
    pub id: TypeHash,
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Create a new NativeFn from a callable with a specific ID.
    pub fn new<F>(id: TypeHash, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self {
            id,
            inner: Arc::new(f),
        }
    }

    /// Create a NativeFn without a registered id.
    pub fn anonymous<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self::new(TypeHash::EMPTY, f)
    }

    /// Call this native function.
    #[inline]
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        self.inner.call(args)
    }

    /// Whether two handles share the same callable.
    pub fn ptr_eq(&self, other: &NativeFn) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Clone for NativeFn {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Trait for callable native functions.
pub trait NativeCallable {
    /// Call this function with its arguments.
    fn call(&self, args: &[Value]) -> Result<Value, RuntimeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&[Value]) -> Result<Value, RuntimeError>,
{
    fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        (self)(args)
    }
}
