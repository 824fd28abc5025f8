//! Standard host library for dynex expressions.
//!
//! - **string** - `string` members, `string.IsNullOrEmpty`, `string.Concat`, `string.Empty`
//! - **numeric** - `ToString`/`Equals` on every value, `CompareTo`, `Parse`, `MaxValue`/`MinValue`
//! - **math** - the `Math` class
//! - **convert** - the `Convert` class
//! - **enumerable** - sequence extension methods (`Where`, `Select`, `Any`, ...)
//!
//! # Usage
//!
//! Each module provides a function that returns a [`Module`] which can be
//! installed into a catalog:
//!
//! ```
//! use dynex_registry::{Catalog, InterpreterOptions};
//!
//! let mut catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
//! catalog.install(dynex_modules::math::module()).unwrap();
//! catalog.install(dynex_modules::enumerable::module()).unwrap();
//! ```

pub mod convert;
pub mod enumerable;
pub mod math;
pub mod numeric;
pub mod string;

use dynex_core::{RuntimeError, Value};
use dynex_registry::Module;

/// Every standard module.
pub fn all() -> Vec<Module> {
    vec![
        numeric::module(),
        string::module(),
        math::module(),
        convert::module(),
        enumerable::module(),
    ]
}

/// String argument `index`; null fails.
pub(crate) fn text_arg(args: &[Value], index: usize) -> Result<&str, RuntimeError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.as_ref()),
        Some(Value::Null) => Err(RuntimeError::NullReference),
        Some(other) => Err(RuntimeError::InvalidCast {
            from: other.type_name(),
            to: "string".to_string(),
        }),
        None => Err(RuntimeError::ArgumentCount {
            expected: index + 1,
            got: args.len(),
        }),
    }
}

/// Integral argument `index` as `i64`.
pub(crate) fn int_arg(args: &[Value], index: usize) -> Result<i64, RuntimeError> {
    match args.get(index) {
        Some(Value::Null) => Err(RuntimeError::NullReference),
        Some(value) => value.as_i64().ok_or_else(|| RuntimeError::InvalidCast {
            from: value.type_name(),
            to: "int".to_string(),
        }),
        None => Err(RuntimeError::ArgumentCount {
            expected: index + 1,
            got: args.len(),
        }),
    }
}
