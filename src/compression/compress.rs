use log::{debug, info, trace};

use super::header::{write_header, ImageShape};
use crate::bitstream::{bitwriter::BitWriter, container::to_bytes};
use crate::error::{Error, Result};
use crate::huffman_coding::code_tree::CodeTree;
use crate::tools::cli::AhOpts;
use crate::tools::data_io::{read_input, write_output};

/// Encoding side of a codec session. Owns the code tree that tracks the symbols sent so far.
#[derive(Debug, Clone)]
pub struct Encoder {
    tree: CodeTree,
}

impl Encoder {
    pub fn new(alphabet: usize) -> Result<Self> {
        Ok(Self {
            tree: CodeTree::new(alphabet)?,
        })
    }

    pub fn tree(&self) -> &CodeTree {
        &self.tree
    }

    /// Write one symbol and then count it in the tree. The code sent always reflects the tree
    /// as it was *before* this occurrence.
    ///
    /// The very first symbol goes out raw. After that a known symbol is sent as its codeword,
    /// and an unseen one as the NYT codeword followed by the raw value.
    pub fn encode_symbol(&mut self, bw: &mut BitWriter, value: u8) -> Result<()> {
        if value as usize >= self.tree.alphabet() {
            return Err(Error::SymbolOutOfAlphabet {
                symbol: value,
                alphabet: self.tree.alphabet(),
            });
        }
        if self.tree.symbols_seen() == 0 {
            bw.out8(value);
        } else if let Some(codeword) = self.tree.codeword_for(value) {
            trace!("{} -> {}", value, codeword);
            bw.out_codeword(codeword);
        } else {
            let nyt = self.tree.nyt_codeword().ok_or_else(|| {
                Error::InvariantViolation(format!("unseen symbol {} but no NYT leaf", value))
            })?;
            trace!("{} -> NYT {} + raw", value, nyt);
            bw.out_codeword(nyt);
            bw.out8(value);
        }
        self.tree.insert_symbol(value)
    }
}

/// Encode `data` into a complete bitstream: header first, then one coded unit per byte.
pub fn encode(data: &[u8], image: Option<&ImageShape>, alphabet: usize) -> Result<BitWriter> {
    if let Some(shape) = image {
        let expected = shape.byte_count()?;
        if expected != data.len() {
            return Err(Error::InvalidHeader(format!(
                "{}x{}x{} image needs {} bytes, input has {}",
                shape.width,
                shape.height,
                shape.channels(),
                expected,
                data.len()
            )));
        }
    }

    let mut bw = BitWriter::with_capacity(data.len() / 2 + 1);
    write_header(&mut bw, image)?;
    let header_bits = bw.bit_len();

    let mut encoder = Encoder::new(alphabet)?;
    for &value in data {
        encoder.encode_symbol(&mut bw, value)?;
    }

    let payload_bits = bw.bit_len() - header_bits;
    debug!(
        "Header {} bits, {} distinct symbols in the tree",
        header_bits,
        encoder.tree().distinct_symbols()
    );
    if !data.is_empty() {
        info!(
            "Encoded {} symbols into {} bits ({:.5} bits per symbol)",
            data.len(),
            bw.bit_len(),
            payload_bits as f64 / data.len() as f64
        );
    }
    Ok(bw)
}

/// Compress the input defined in opts <AhOpts>.
pub fn compress(opts: &AhOpts) -> Result<()> {
    let data = read_input(opts)?;
    let bw = encode(&data, opts.image.as_ref(), opts.alphabet)?;
    let bytes = to_bytes(bw, opts.format);
    info!(
        "Compressed {} bytes to {} bytes",
        data.len(),
        bytes.len()
    );
    write_output(opts, &bytes)
}
