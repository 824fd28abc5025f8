//! Interpreter option flags and numeric literal defaults.

use bitflags::bitflags;

bitflags! {
    /// Features installed when an interpreter is created.
    ///
    /// ```
    /// use dynex_registry::InterpreterOptions;
    ///
    /// let options = InterpreterOptions::DEFAULT | InterpreterOptions::CASE_INSENSITIVE;
    /// assert_eq!(options, InterpreterOptions::DEFAULT_CASE_INSENSITIVE);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InterpreterOptions: u32 {
        /// Built-in type names (`int`, `string`, `Int32`, ...) and generic families.
        const PRIMITIVE_TYPES = 1 << 0;
        /// `true`, `false` and `null`.
        const SYSTEM_KEYWORDS = 1 << 1;
        /// `Math` and `Convert`.
        const COMMON_TYPES = 1 << 2;
        /// Names of parameters, types, identifiers and members ignore case.
        const CASE_INSENSITIVE = 1 << 3;
        /// Lambda literals (`x => x + 1`).
        const LAMBDA_EXPRESSIONS = 1 << 4;

        const DEFAULT = Self::PRIMITIVE_TYPES.bits()
            | Self::SYSTEM_KEYWORDS.bits()
            | Self::COMMON_TYPES.bits()
            | Self::LAMBDA_EXPRESSIONS.bits();
        const DEFAULT_CASE_INSENSITIVE = Self::DEFAULT.bits() | Self::CASE_INSENSITIVE.bits();
    }
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions::DEFAULT
    }
}

/// Type given to numeric literals written without a suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DefaultNumberType {
    /// Integers are `int` (or `long` when too large), reals are `double`.
    #[default]
    Default,
    /// Integers are `int`; reals stay `double`.
    Int,
    /// Integers are `long`; reals stay `double`.
    Long,
    /// Integers and reals are `float`.
    Single,
    /// Integers and reals are `double`.
    Double,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excludes_case_insensitivity() {
        let options = InterpreterOptions::default();
        assert!(options.contains(InterpreterOptions::LAMBDA_EXPRESSIONS));
        assert!(!options.contains(InterpreterOptions::CASE_INSENSITIVE));
        assert!(InterpreterOptions::DEFAULT_CASE_INSENSITIVE.contains(InterpreterOptions::CASE_INSENSITIVE));
    }
}
