//! Error types for every phase of expression processing.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ExpressionError (top-level wrapper)
//! ├── LexError       - malformed tokens
//! ├── ParseError     - grammar violations (with ParseErrorKind)
//! ├── SemanticError  - symbol, member, overload and type resolution
//! └── RuntimeError   - failures while invoking a compiled expression
//! ```
//!
//! Everything but `RuntimeError` is raised while parsing; a parse that fails
//! never yields a partial compiled expression.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during tokenization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal was not terminated.
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    /// A char literal was not terminated.
    #[error("unterminated char literal at {span}")]
    UnterminatedChar { span: Span },

    /// A char literal did not hold exactly one character.
    #[error("char literal must contain exactly one character at {span}")]
    InvalidCharLiteral { span: Span },

    /// An escape sequence is not recognized.
    #[error("invalid escape sequence '\\{sequence}' at {span}")]
    InvalidEscape { sequence: String, span: Span },

    /// A numeric literal could not be parsed.
    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },

    /// An opening bracket was never closed.
    #[error("unterminated group '{open}' opened at {span}")]
    UnterminatedGroup { open: char, span: Span },

    /// A closing bracket does not match the innermost open one.
    #[error("mismatched '{close}' at {span}")]
    MismatchedGroup { close: char, span: Span },
}

impl LexError {
    /// Create an invalid-number error.
    pub fn invalid_number(span: Span, detail: impl Into<String>) -> Self {
        LexError::InvalidNumber {
            span,
            detail: detail.into(),
        }
    }

    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedChar { span }
            | LexError::InvalidCharLiteral { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::InvalidNumber { span, .. }
            | LexError::UnterminatedGroup { span, .. }
            | LexError::MismatchedGroup { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of input.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A type was expected.
    ExpectedType,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// A literal could not be converted to a value.
    InvalidLiteral,
    /// A lambda literal is malformed.
    InvalidLambda,
    /// Syntax the engine deliberately does not support (assignment, statements).
    UnsupportedSyntax,
    /// Expression nesting exceeded the configured limit.
    DepthLimitExceeded,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of expression",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::InvalidLambda => "invalid lambda",
            ParseErrorKind::UnsupportedSyntax => "unsupported syntax",
            ParseErrorKind::DepthLimitExceeded => "nesting too deep",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(span: Span, token: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected token: {token}"),
        )
    }

    /// Create an "unexpected end of expression" error.
    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof,
            span,
            "unexpected end of expression",
        )
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    /// Create an "expected type" error.
    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found {found}"),
        )
    }

    /// Create a depth-limit error.
    pub fn depth_limit(span: Span, limit: usize) -> Self {
        Self::new(
            ParseErrorKind::DepthLimitExceeded,
            span,
            format!("expression nesting exceeds the limit of {limit}"),
        )
    }
}

// ============================================================================
// Semantic Errors
// ============================================================================

/// Errors raised while resolving symbols, members, overloads and types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    /// A name matched no lambda parameter, parameter, type or identifier.
    #[error("at {span}: unknown identifier '{name}'")]
    UnknownIdentifier { name: String, span: Span },

    /// Two declared parameters share a name.
    #[error("duplicate parameter '{name}'")]
    DuplicateParameter { name: String },

    /// A member lookup failed on a resolved type.
    #[error("at {span}: no member '{member}' exists in type '{type_name}'")]
    UnknownMember {
        type_name: String,
        member: String,
        span: Span,
    },

    /// No candidate accepts the supplied arguments.
    #[error("at {span}: no applicable method '{name}' exists for arguments ({args})")]
    NoApplicableMethod {
        name: String,
        args: String,
        span: Span,
    },

    /// More than one candidate ranks best.
    #[error("at {span}: Ambiguous invocation of '{name}': {candidates}")]
    AmbiguousInvocation {
        name: String,
        candidates: String,
        span: Span,
    },

    /// Open member enumeration attempted while the host registry is restricted.
    #[error("at {span}: reflection is not allowed ('{member}')")]
    ReflectionNotAllowed { member: String, span: Span },

    /// An operator is not defined for the operand types.
    #[error("at {span}: operator '{op}' cannot be applied to operands of type '{left}' and '{right}'")]
    InvalidOperator {
        op: String,
        left: String,
        right: String,
        span: Span,
    },

    /// A unary operator is not defined for the operand type.
    #[error("at {span}: operator '{op}' cannot be applied to operand of type '{operand}'")]
    InvalidUnaryOperator {
        op: String,
        operand: String,
        span: Span,
    },

    /// No conversion exists between two types.
    #[error("at {span}: cannot convert '{from}' to '{to}'")]
    InvalidConversion { from: String, to: String, span: Span },

    /// Conditional access used where no nullable result can exist.
    #[error("at {span}: invalid conditional access: {reason}")]
    InvalidConditionalAccess { reason: String, span: Span },

    /// A lambda parameter reuses a name that is already in scope.
    #[error("at {span}: lambda parameter '{name}' conflicts with a name in an enclosing scope")]
    LambdaParameterConflict { name: String, span: Span },

    /// Generic arguments of a call could not be inferred.
    #[error("at {span}: type arguments of '{name}' cannot be inferred from the usage")]
    CannotInferTypes { name: String, span: Span },

    /// The expression type does not convert to the requested return type.
    #[error("expression of type '{actual}' cannot be returned as '{expected}'")]
    ReturnTypeMismatch { expected: String, actual: String },

    /// Lambda literals were disabled by the interpreter options.
    #[error("at {span}: lambda expressions are not enabled")]
    LambdasDisabled { span: Span },

    /// Any other type error with a free-form message.
    #[error("at {span}: {message}")]
    TypeError { message: String, span: Span },
}

impl SemanticError {
    /// Create a free-form type error.
    pub fn type_error(span: Span, message: impl Into<String>) -> Self {
        SemanticError::TypeError {
            message: message.into(),
            span,
        }
    }

    /// Get the span where this error occurred, when it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            SemanticError::DuplicateParameter { .. } | SemanticError::ReturnTypeMismatch { .. } => None,
            SemanticError::UnknownIdentifier { span, .. }
            | SemanticError::UnknownMember { span, .. }
            | SemanticError::NoApplicableMethod { span, .. }
            | SemanticError::AmbiguousInvocation { span, .. }
            | SemanticError::ReflectionNotAllowed { span, .. }
            | SemanticError::InvalidOperator { span, .. }
            | SemanticError::InvalidUnaryOperator { span, .. }
            | SemanticError::InvalidConversion { span, .. }
            | SemanticError::InvalidConditionalAccess { span, .. }
            | SemanticError::LambdaParameterConflict { span, .. }
            | SemanticError::CannotInferTypes { span, .. }
            | SemanticError::LambdasDisabled { span }
            | SemanticError::TypeError { span, .. } => Some(*span),
        }
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors that occur while invoking a compiled expression.
///
/// Host functions report failures with these variants too; the engine
/// propagates them unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A member was accessed on null through a non-conditional access.
    #[error("object reference not set to an instance of an object")]
    NullReference,

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An index was outside the bounds of an array or string.
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// A cast failed at runtime.
    #[error("unable to cast value of type '{from}' to '{to}'")]
    InvalidCast { from: String, to: String },

    /// Wrong number of invocation arguments.
    #[error("expected {expected} argument(s), got {got}")]
    ArgumentCount { expected: usize, got: usize },

    /// An invocation argument does not match its declared type.
    #[error("argument '{name}' expects '{expected}', got '{actual}'")]
    ArgumentType {
        name: String,
        expected: String,
        actual: String,
    },

    /// A failure reported by a host function.
    #[error("{message}")]
    Host { message: String },
}

impl RuntimeError {
    /// Create a host failure.
    pub fn host(message: impl Into<String>) -> Self {
        RuntimeError::Host {
            message: message.into(),
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while installing host classes, functions and modules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A class names a base class that was never registered.
    #[error("class '{class}' derives from unregistered class '{base}'")]
    UnknownBase { class: String, base: String },

    /// A class was registered once as a value type and once as a reference type.
    #[error("class '{0}' is registered with conflicting value/reference kinds")]
    KindMismatch(String),

    /// A registration with this name already exists.
    #[error("duplicate registration: {name} already registered as {kind}")]
    DuplicateRegistration { name: String, kind: String },

    /// The declaration is invalid.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for parse and invoke operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// A lexer error.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A parse error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A resolution error.
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// A runtime error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ExpressionError {
    /// Check if this is a lexer error.
    pub fn is_lex(&self) -> bool {
        matches!(self, ExpressionError::Lex(_))
    }

    /// Check if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, ExpressionError::Parse(_))
    }

    /// Check if this is a resolution error.
    pub fn is_semantic(&self) -> bool {
        matches!(self, ExpressionError::Semantic(_))
    }

    /// Check if this is a runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, ExpressionError::Runtime(_))
    }

    /// Whether this error was raised before any invocation.
    pub fn is_static(&self) -> bool {
        !self.is_runtime()
    }
}

// ============================================================================
// Tests
// ============================================================================
