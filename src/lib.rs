//! One-pass adaptive Huffman coding.
//!
//! Encoder and decoder each grow a code tree from the symbols they have processed so far, so no
//! frequency table is ever sent. Frequent symbols drift toward short codewords as the stream
//! goes on.
//!
//! Basic usage to compress a file is as follows:
//!
//! `$> ahuff -z test.txt`
//!
//! This will compress the file and create the file test.txt.ahc.
//!
//! From code, `compression::compress::encode` produces a `BitWriter` and
//! `compression::decompress::decode` turns a `BitReader` back into bytes.
//!
pub mod bitstream;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{encode, Encoder};
pub use compression::decompress::{decode, Decoded, Decoder};
pub use error::{Error, Result};
