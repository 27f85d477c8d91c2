//! The huffman_coding module holds the adaptive code tree shared by the encoder and the decoder.
//!
//! No frequency table is ever transmitted. Both sides start from the same single-node tree and
//! apply the same update after every symbol, so the decoder always knows the codewords the
//! encoder is using.
//!
//! The tree keeps the sibling property: listing the nodes level by level from the root, right to
//! left within each level, never shows a node outweighing one listed before it. When an update
//! breaks that, the offending subtrees are swapped until it holds again.
//!
//! Codewords start with a single NYT ("not yet transmitted") leaf standing in for every value not
//! seen so far. A new value is sent as the NYT codeword followed by the raw value, and the NYT leaf
//! is split to make room for it.
//!

pub mod code_tree;
pub mod codeword;
