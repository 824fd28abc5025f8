//! Host registration and symbol catalogs for dynex.
//!
//! ```text
//! ClassBuilder / Function ─┐
//!                          ├─> Module ──install──> Catalog ──> parse
//! constants / aliases ─────┘                       └── Arc<TypeRegistry> (HostTypes)
//! ```

mod catalog;
mod class_builder;
mod function;
mod module;
mod options;
mod type_registry;

pub use catalog::{Catalog, DEFAULT_MAX_DEPTH, Identifier, KnownType};
pub use class_builder::ClassBuilder;
pub use function::{Function, arg};
pub use module::Module;
pub use options::{DefaultNumberType, InterpreterOptions};
pub use type_registry::{ClassEntry, TypeRegistry};
