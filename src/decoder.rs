//! Argument decoders: pure `&str -> T` conversions used by argument nodes.
//!
//! A decoder is total over some subset of tokens and returns a [`DecodeError`]
//! for everything else. Custom decoders follow the same shape and can be
//! passed to [`crate::node::argument`] directly.

use thiserror::Error;

/// Signature shared by every decoder.
pub type Decoder<T> = fn(&str) -> Result<T, DecodeError>;

/// Accepts exactly `true` or `false`.
pub const BOOLEAN: Decoder<bool> = boolean;
/// Accepts any integer or floating point literal except NaN.
pub const NUMBER: Decoder<f64> = number;
/// Identity decoder; never fails.
pub const STRING: Decoder<String> = string;
/// Accepts signed 64-bit integers.
pub const INTEGER: Decoder<i64> = integer;

/// A token rejected by a decoder.
///
/// The message is what the command source sees; the token is kept so callers
/// can inspect what was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecodeError {
    message: String,
    token: String,
}

impl DecodeError {
    /// Create an error with a caller-chosen message.
    pub fn new(message: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            token: token.into(),
        }
    }

    /// Standard "Invalid <kind> <token>" error.
    pub fn malformed(kind: &str, token: &str) -> Self {
        Self::new(format!("Invalid {kind} {token}"), token)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The token that failed to decode.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Case-sensitive `true`/`false`.
pub fn boolean(token: &str) -> Result<bool, DecodeError> {
    match token {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DecodeError::malformed("boolean", token)),
    }
}

/// Integer or floating point literal with optional sign.
///
/// Tokens that parse to NaN (`NaN`, `nan`) are rejected.
pub fn number(token: &str) -> Result<f64, DecodeError> {
    match token.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(DecodeError::malformed("number", token)),
    }
}

pub fn string(token: &str) -> Result<String, DecodeError> {
    Ok(token.to_string())
}

pub fn integer(token: &str) -> Result<i64, DecodeError> {
    token
        .parse::<i64>()
        .map_err(|_| DecodeError::malformed("integer", token))
}
