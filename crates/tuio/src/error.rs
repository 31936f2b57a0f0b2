//! Decode errors for OSC packets and TUIO messages.
//!
//! Structural errors mean the byte stream itself cannot be trusted and abort the
//! whole packet. Message-level errors only affect the one TUIO message they were
//! raised for; the enclosing bundle keeps decoding.

use thiserror::Error;

/// Errors produced while decoding OSC bytes or interpreting TUIO messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer underrun at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    Underrun {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("unknown OSC type tag '{0}'")]
    UnknownTypeTag(char),

    #[error("type tag string must start with ',', got {0:?}")]
    MalformedTypeTags(String),

    #[error("invalid length {0}")]
    InvalidLength(i32),

    #[error("bundle nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    #[error("packet is not an OSC bundle")]
    NotABundle,

    #[error("unknown TUIO profile: {0}")]
    UnknownProfile(String),

    #[error("unknown TUIO message type: {0}")]
    UnknownMessageKind(String),

    #[error("TUIO message has no type keyword")]
    MissingHeader,

    #[error("missing argument {index}: expected {expected}")]
    MissingArgument { index: usize, expected: &'static str },

    #[error("wrong type for argument {index}: expected {expected}")]
    WrongArgumentType { index: usize, expected: &'static str },
}

impl DecodeError {
    /// True for errors that invalidate the whole packet rather than one message.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DecodeError::Underrun { .. }
                | DecodeError::UnknownTypeTag(_)
                | DecodeError::MalformedTypeTags(_)
                | DecodeError::InvalidLength(_)
                | DecodeError::NestingTooDeep(_)
                | DecodeError::NotABundle
        )
    }
}
