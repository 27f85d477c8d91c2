//! Error types for the adaptive Huffman codec.
//!
//! Running out of bits at a coded-unit boundary is not an error: the bit reader reports it as
//! `Bits::Exhausted` and the decode loop simply stops. Everything here aborts the session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The stream ended inside a codeword, a raw value or the header. `position` is the bit
    /// offset where the unfinished unit starts.
    #[error("truncated stream: unit starting at bit {position} is incomplete")]
    TruncatedStream { position: usize },

    /// The code tree failed its own consistency checks. This is a bug, not a data error.
    #[error("code tree invariant violated: {0}")]
    InvariantViolation(String),

    /// A bit path was resolved that runs past a leaf of the code tree.
    #[error("invalid codeword {0}")]
    InvalidCodeword(String),

    /// The input holds a value the configured alphabet can't represent.
    #[error("symbol {symbol} is outside the alphabet of {alphabet} symbols")]
    SymbolOutOfAlphabet { symbol: u8, alphabet: usize },

    /// Alphabet sizes must lie in 2..=256.
    #[error("invalid alphabet size {0} (expected 2..=256)")]
    InvalidAlphabet(usize),

    #[error("invalid stream header: {0}")]
    InvalidHeader(String),

    #[error("invalid container: {0}")]
    InvalidContainer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
