//! dynex - an embeddable C#-like expression engine.
//!
//! Expressions are parsed, type checked against host-registered symbols and
//! compiled into a closure tree in one pass. The result can be invoked any
//! number of times, from any thread.
//!
//! ```
//! use dynex::{Interpreter, InterpreterOptions, Parameter, Value};
//!
//! let interpreter = Interpreter::new(InterpreterOptions::DEFAULT).unwrap();
//! let params = [
//!     Parameter::with_value("list", vec![1, 2, 3]),
//!     Parameter::with_value("value", 1),
//! ];
//! let result = interpreter.eval("list.Where(x => x > value).Sum()", &params).unwrap();
//! assert_eq!(result, Value::Int(5));
//! ```
//!
//! ## Crates
//!
//! - `dynex-core`: types, values, errors and the host reflection capability
//! - `dynex-lexer`: tokens and literal decoding
//! - `dynex-registry`: host classes, functions, modules and the catalog
//! - `dynex-compiler`: parsing, resolution and closure emission
//! - `dynex-modules`: the standard host library

mod detector;
mod interpreter;
mod lambda;

pub use detector::IdentifiersInfo;
pub use interpreter::Interpreter;
pub use lambda::Lambda;

pub use dynex_compiler::{CompiledExpression, compile};
pub use dynex_core::{
    ClassId, ExpressionError, FromValue, HostObject, LexError, NameComparer, NativeFn, ParamDef, Parameter,
    ParseError, ParseErrorKind, RegistrationError, RuntimeError, SemanticError, Span, Ty, Value,
};
pub use dynex_registry::{Catalog, ClassBuilder, DefaultNumberType, Function, InterpreterOptions, KnownType, Module};

/// The standard host library.
pub use dynex_modules as modules;
