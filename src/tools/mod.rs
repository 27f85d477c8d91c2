//! Helpers around the codec: the command line interface and file/stdio handling.
//!
pub mod cli;
pub mod data_io;
