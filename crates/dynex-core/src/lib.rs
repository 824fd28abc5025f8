//! Core types shared by every dynex crate.
//!
//! - [`Span`] and the error taxonomy ([`LexError`], [`ParseError`],
//!   [`SemanticError`], [`RuntimeError`], [`ExpressionError`])
//! - [`Ty`] static type descriptors and [`Value`] runtime values
//! - [`NativeFn`] host callables and member descriptors
//! - [`HostTypes`], the introspection capability the resolver consumes

mod error;
mod host;
mod member;
mod native_fn;
mod span;
mod ty;
mod type_hash;
mod value;

pub use error::{
    ExpressionError, LexError, ParseError, ParseErrorKind, RegistrationError, RuntimeError, SemanticError,
};
pub use host::{HostTypes, NameComparer, ReflectionRefused};
pub use member::{IndexerDef, MemberInfo, MemberKind, MethodDef, ParamDef, Parameter, PropertyDef};
pub use native_fn::{NativeCallable, NativeFn};
pub use span::Span;
pub use ty::{ClassId, FuncSig, GenericFamily, Ty};
pub use type_hash::TypeHash;
pub use value::{FromValue, HostObject, Value};
