//! Serialising a finished bitstream to file bytes and back.
//!
//! The decoder stops when the channel runs dry, so the exact bit count has to survive the trip
//! through a byte-oriented file. Two forms are supported:
//! - Packed: one leading byte holding the number of zero padding bits (0-7) in the last byte,
//!   followed by the bits packed MSB-first.
//! - Ascii: one `'0'` or `'1'` character per bit.

use log::{debug, trace};

use super::{bitreader::BitReader, bitwriter::BitWriter};
use crate::error::{Error, Result};

/// File representation of a bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitFormat {
    #[default]
    Packed,
    Ascii,
}

/// Serialise everything written to `bw`.
pub fn to_bytes(bw: BitWriter, format: BitFormat) -> Vec<u8> {
    let bit_len = bw.bit_len();
    match format {
        BitFormat::Packed => {
            let (bytes, padding) = bw.finish();
            let mut out = Vec::with_capacity(bytes.len() + 1);
            out.push(padding);
            out.extend_from_slice(&bytes);
            debug!("Packed {} bits into {} bytes ({} padding bits).", bit_len, out.len(), padding);
            out
        }
        BitFormat::Ascii => {
            let mut br = bw.into_reader();
            let mut out = Vec::with_capacity(bit_len);
            while let Some(bit) = br.read_bit().value() {
                out.push(if bit { b'1' } else { b'0' });
            }
            debug!("Wrote {} bits as ascii.", bit_len);
            out
        }
    }
}

/// Parse a serialised bitstream into a reader over exactly the bits that were written.
pub fn from_bytes(data: &[u8], format: BitFormat) -> Result<BitReader> {
    match format {
        BitFormat::Packed => {
            let (&padding, payload) = data
                .split_first()
                .ok_or_else(|| Error::InvalidContainer("missing padding byte".to_string()))?;
            if padding > 7 {
                return Err(Error::InvalidContainer(format!(
                    "padding byte {} is larger than 7",
                    padding
                )));
            }
            if payload.is_empty() && padding > 0 {
                return Err(Error::InvalidContainer(
                    "padding declared on an empty payload".to_string(),
                ));
            }
            let bit_len = payload.len() * 8 - padding as usize;
            trace!("Container holds {} bits.", bit_len);
            Ok(BitReader::new(payload.to_vec(), bit_len))
        }
        BitFormat::Ascii => {
            let text = trim_trailing_whitespace(data);
            let mut bw = BitWriter::with_capacity(text.len() / 8 + 1);
            for (i, &c) in text.iter().enumerate() {
                match c {
                    b'0' => bw.out_bit(false),
                    b'1' => bw.out_bit(true),
                    other => {
                        return Err(Error::InvalidContainer(format!(
                            "unexpected character {:?} at offset {}",
                            other as char, i
                        )))
                    }
                }
            }
            Ok(bw.into_reader())
        }
    }
}

fn trim_trailing_whitespace(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|c| !c.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &data[..end]
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> BitWriter {
        let mut bw = BitWriter::new();
        bw.out_bit(true);
        bw.out8(0x42);
        bw.out_bits(0b01, 2);
        bw
    }

    #[test]
    fn packed_layout_test() {
        let bytes = to_bytes(sample(), BitFormat::Packed);
        // 11 bits: 1 0100_0010 01 -> 1010_0001 001(0_0000)
        assert_eq!(bytes, vec![5, 0b1010_0001, 0b0010_0000]);
        let br = from_bytes(&bytes, BitFormat::Packed).unwrap();
        assert_eq!(br.remaining(), 11);
    }

    #[test]
    fn ascii_layout_test() {
        let bytes = to_bytes(sample(), BitFormat::Ascii);
        assert_eq!(bytes, b"10100001001".to_vec());
        let mut br = from_bytes(b"10100001001\n", BitFormat::Ascii).unwrap();
        assert_eq!(br.remaining(), 11);
        assert_eq!(br.read_bit().value(), Some(true));
        assert_eq!(br.read8().value(), Some(0x42));
    }

    #[test]
    fn empty_stream_test() {
        let bytes = to_bytes(BitWriter::new(), BitFormat::Packed);
        assert_eq!(bytes, vec![0]);
        assert!(from_bytes(&bytes, BitFormat::Packed).unwrap().is_empty());
    }

    #[test]
    fn bad_padding_test() {
        assert!(matches!(
            from_bytes(&[9, 0xff], BitFormat::Packed),
            Err(Error::InvalidContainer(_))
        ));
        assert!(matches!(
            from_bytes(&[3], BitFormat::Packed),
            Err(Error::InvalidContainer(_))
        ));
        assert!(matches!(
            from_bytes(&[], BitFormat::Packed),
            Err(Error::InvalidContainer(_))
        ));
    }

    #[test]
    fn bad_ascii_test() {
        assert!(matches!(
            from_bytes(b"01x1", BitFormat::Ascii),
            Err(Error::InvalidContainer(_))
        ));
    }
}
