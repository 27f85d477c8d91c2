//! The compression module drives a codec session over whole inputs.
//!
//! A compressed stream is a header followed by one coded unit per input byte:
//! - Header: a flag bit for plain bytes vs. raw pixel data, plus image metadata when set.
//! - First symbol: its raw 8 bit value.
//! - Every later symbol: its current codeword if it was seen before, otherwise the NYT codeword
//!   followed by the raw value.
//!
//! There is no length field and no end marker. The decoder stops when the bits run out on a unit
//! boundary; running out inside a unit is a truncated stream.
//!

pub mod compress;
pub mod decompress;
pub mod header;
