//! The bitstream module forms the I/O subsystem of the adaptive Huffman codec.
//!
//! The encoder appends single bits, codewords and fixed-width raw values to a `BitWriter`. The
//! decoder consumes the same bits in order from a `BitReader`, which tells it explicitly when the
//! stream has run dry. The container module turns a finished bitstream into file bytes and back.
//!
//! This I/O subsystem is designed to interface with the other modules of this crate. It is not
//! intended for more general use.
//!
pub mod bitreader;
pub mod bitwriter;
pub mod container;
