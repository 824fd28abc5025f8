//! Decoding of literal token lexemes into values.
//!
//! The lexer has already validated the shape of every literal, so these
//! functions only fail on range problems or when called on foreign text.

use thiserror::Error;

/// Type suffix of a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSuffix {
    None,
    /// `L`
    Long,
    /// `F`
    Float,
    /// `D`
    Double,
}

/// Errors decoding a literal lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("integer literal is too large")]
    Overflow,

    #[error("malformed numeric literal '{0}'")]
    Malformed(String),

    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(String),

    #[error("char literal must contain exactly one character")]
    CharLength,

    #[error("literal is not quoted")]
    Unquoted,
}

/// The character a single-letter escape stands for.
pub(crate) fn simple_escape(c: char) -> Option<char> {
    Some(match c {
        '\'' => '\'',
        '"' => '"',
        '\\' => '\\',
        '0' => '\0',
        'a' => '\u{07}',
        'b' => '\u{08}',
        'f' => '\u{0C}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{0B}',
        _ => return None,
    })
}

fn radix_of(body: &str) -> (u32, &str) {
    match body.get(..2) {
        Some("0x" | "0X") => (16, &body[2..]),
        Some("0b" | "0B") => (2, &body[2..]),
        _ => (10, body),
    }
}

/// Split the type suffix from a numeric lexeme.
///
/// Hexadecimal literals only carry `L`, since `D` and `F` are hex digits there.
pub fn split_suffix(lexeme: &str) -> (&str, NumberSuffix) {
    let hex = matches!(lexeme.get(..2), Some("0x" | "0X"));
    let suffix = match lexeme.chars().last() {
        Some('l' | 'L') => NumberSuffix::Long,
        Some('f' | 'F') if !hex => NumberSuffix::Float,
        Some('d' | 'D') if !hex => NumberSuffix::Double,
        _ => NumberSuffix::None,
    };
    let body = if suffix == NumberSuffix::None {
        lexeme
    } else {
        &lexeme[..lexeme.len() - 1]
    };
    (body, suffix)
}

/// Decode an integer literal into its magnitude and suffix.
pub fn parse_integer(lexeme: &str) -> Result<(u64, NumberSuffix), LiteralError> {
    let (body, suffix) = split_suffix(lexeme);
    let (radix, digits) = radix_of(body);
    if digits.is_empty() {
        return Err(LiteralError::Malformed(lexeme.to_string()));
    }
    match u64::from_str_radix(digits, radix) {
        Ok(value) => Ok((value, suffix)),
        Err(e) if matches!(e.kind(), std::num::IntErrorKind::PosOverflow) => Err(LiteralError::Overflow),
        Err(_) => Err(LiteralError::Malformed(lexeme.to_string())),
    }
}

/// Decode a real literal into its value and suffix.
pub fn parse_real(lexeme: &str) -> Result<(f64, NumberSuffix), LiteralError> {
    let (body, suffix) = split_suffix(lexeme);
    body.parse::<f64>()
        .map(|value| (value, suffix))
        .map_err(|_| LiteralError::Malformed(lexeme.to_string()))
}

fn strip_quotes(lexeme: &str, quote: char) -> Result<&str, LiteralError> {
    lexeme
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
        .ok_or(LiteralError::Unquoted)
}

fn decode_escapes(body: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(LiteralError::InvalidEscape(String::new()));
        };
        if esc == 'u' {
            let hex: String = chars.by_ref().take(4).collect();
            let decoded = (hex.len() == 4)
                .then(|| u32::from_str_radix(&hex, 16).ok())
                .flatten()
                .and_then(char::from_u32);
            match decoded {
                Some(ch) => out.push(ch),
                None => return Err(LiteralError::InvalidEscape(format!("u{hex}"))),
            }
        } else {
            out.push(simple_escape(esc).ok_or_else(|| LiteralError::InvalidEscape(esc.to_string()))?);
        }
    }
    Ok(out)
}

/// Decode a double-quoted string literal.
pub fn unescape_string(lexeme: &str) -> Result<String, LiteralError> {
    decode_escapes(strip_quotes(lexeme, '"')?)
}

/// Decode a single-quoted char literal.
pub fn unescape_char(lexeme: &str) -> Result<char, LiteralError> {
    let decoded = decode_escapes(strip_quotes(lexeme, '\'')?)?;
    let mut chars = decoded.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(LiteralError::CharLength),
    }
}
