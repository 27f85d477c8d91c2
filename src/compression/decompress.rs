use log::{debug, info, trace, warn};

use super::header::{read_header, ImageHeader};
use crate::bitstream::{
    bitreader::{BitReader, Bits},
    container::from_bytes,
};
use crate::error::{Error, Result};
use crate::huffman_coding::code_tree::{CodeTree, Resolution};
use crate::tools::cli::AhOpts;
use crate::tools::data_io::{read_input, write_output};

/// Decoding side of a codec session. Mirrors `Encoder` symbol for symbol.
#[derive(Debug, Clone)]
pub struct Decoder {
    tree: CodeTree,
}

impl Decoder {
    pub fn new(alphabet: usize) -> Result<Self> {
        Ok(Self {
            tree: CodeTree::new(alphabet)?,
        })
    }

    pub fn tree(&self) -> &CodeTree {
        &self.tree
    }

    /// Decode the next symbol and count it in the tree. Returns `Ok(None)` when the stream ends
    /// cleanly on a unit boundary.
    pub fn decode_symbol(&mut self, br: &mut BitReader) -> Result<Option<u8>> {
        let start = br.position();

        let value = if self.tree.symbols_seen() == 0 {
            match br.read8() {
                Bits::Value(v) => v,
                Bits::Exhausted => return Ok(None),
                Bits::Truncated { .. } => return Err(Error::TruncatedStream { position: start }),
            }
        } else {
            let mut cursor = self.tree.cursor();
            let mut resolution = self.tree.current(&cursor);
            while resolution == Resolution::Incomplete {
                let bit = match br.read_bit() {
                    Bits::Value(bit) => bit,
                    _ if cursor.depth() == 0 => return Ok(None),
                    _ => return Err(Error::TruncatedStream { position: start }),
                };
                resolution = self.tree.step(&mut cursor, bit)?;
            }
            match resolution {
                Resolution::Matched(v) => v,
                Resolution::MatchedNyt => {
                    let v = br
                        .read8()
                        .value()
                        .ok_or(Error::TruncatedStream { position: start })?;
                    if self.tree.codeword_for(v).is_some() {
                        return Err(Error::InvalidCodeword(format!(
                            "raw value {} after NYT at {} was already seen",
                            v,
                            br.loc()
                        )));
                    }
                    trace!("NYT + raw {}", v);
                    v
                }
                Resolution::Incomplete => {
                    return Err(Error::InvariantViolation(
                        "codeword resolution stopped on an internal node".to_string(),
                    ))
                }
            }
        };

        self.tree.insert_symbol(value)?;
        Ok(Some(value))
    }
}

/// Output of a decode session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub data: Vec<u8>,
    /// Present when the stream was tagged as raw pixel data.
    pub image: Option<ImageHeader>,
}

impl Decoded {
    /// `(width, height)` of an image stream, recovered from the decoded length.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.image.map(|h| h.dimensions(self.data.len()))
    }
}

/// Decode a whole bitstream: header, then symbols until the bits run out.
pub fn decode(br: &mut BitReader, alphabet: usize) -> Result<Decoded> {
    let image = read_header(br)?;
    let mut decoder = Decoder::new(alphabet)?;
    let mut data = Vec::with_capacity(br.remaining() / 2);
    while let Some(value) = decoder.decode_symbol(br)? {
        data.push(value);
    }
    debug!(
        "Decoded {} symbols, {} distinct",
        data.len(),
        decoder.tree().distinct_symbols()
    );
    Ok(Decoded { data, image })
}

/// Read, parse and decode the compressed input named in opts <AhOpts>.
fn decode_input(opts: &AhOpts) -> Result<Decoded> {
    let bytes = read_input(opts)?;
    let mut br = from_bytes(&bytes, opts.format)?;
    let decoded = decode(&mut br, opts.alphabet)?;
    if let Some((width, height)) = decoded.dimensions() {
        info!("Recovered a {}x{} image", width, height);
    }
    Ok(decoded)
}

/// Decompress the input defined in opts <AhOpts>.
pub fn decompress(opts: &AhOpts) -> Result<()> {
    let decoded = decode_input(opts)?;
    if opts.image.is_some() && decoded.image.is_none() {
        warn!("Image dimensions were given but the stream holds plain bytes.");
    }
    info!("Decompressed to {} bytes", decoded.data.len());
    write_output(opts, &decoded.data)
}

/// Decode the input defined in opts <AhOpts> and discard the result.
pub fn test(opts: &AhOpts) -> Result<()> {
    let decoded = decode_input(opts)?;
    info!("Stream is intact: {} symbols", decoded.data.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bitstream::bitwriter::BitWriter;
    use crate::compression::compress::{encode, Encoder};
    use crate::compression::header::ImageShape;

    fn reader(bits: &str) -> BitReader {
        let mut bw = BitWriter::new();
        bits.chars().for_each(|c| bw.out_bit(c == '1'));
        bw.into_reader()
    }

    #[test]
    fn four_symbol_scenario_test() {
        let bits = ["0", "00000000", "1", "0", "00000001", "1"].concat();
        let decoded = decode(&mut reader(&bits), 4).unwrap();
        assert_eq!(decoded.data, vec![0, 0, 1, 0]);
        assert_eq!(decoded.image, None);
        assert_eq!(decoded.dimensions(), None);
    }

    #[test]
    fn empty_stream_test() {
        let decoded = decode(&mut reader("0"), 256).unwrap();
        assert!(decoded.data.is_empty());
    }

    #[test]
    fn round_trip_test() {
        let data = b"abracadabra, abracadabra!".to_vec();
        let mut br = encode(&data, None, 256).unwrap().into_reader();
        assert_eq!(decode(&mut br, 256).unwrap().data, data);
    }

    #[test]
    fn image_round_trip_test() {
        let shape = ImageShape {
            width: 5,
            height: 3,
            three_channel: true,
        };
        let data: Vec<u8> = (0..45).map(|i| (i * 7 % 13) as u8).collect();
        let mut br = encode(&data, Some(&shape), 256).unwrap().into_reader();
        let decoded = decode(&mut br, 256).unwrap();
        assert_eq!(decoded.data, data);
        assert_eq!(decoded.dimensions(), Some((5, 3)));
    }

    #[test]
    fn truncated_raw_value_test() {
        let bw = encode(&[0, 1], None, 4).unwrap();
        // header + raw 0 + NYT "0" + raw 1 = 18 bits; cut the raw value of the second symbol
        assert_eq!(bw.bit_len(), 18);
        let mut full = bw.into_reader();
        let mut bits = String::new();
        while let Some(bit) = full.read_bit().value() {
            bits.push(if bit { '1' } else { '0' });
        }
        bits.truncate(bits.len() - 8);
        assert!(matches!(
            decode(&mut reader(&bits), 4),
            Err(Error::TruncatedStream { position: 9 })
        ));
    }

    #[test]
    fn truncated_first_symbol_test() {
        assert!(matches!(
            decode(&mut reader("0101"), 256),
            Err(Error::TruncatedStream { position: 1 })
        ));
    }

    #[test]
    fn truncated_codeword_test() {
        // After [0, 1, 2] with alphabet 4 the NYT codeword is two bits long; keep only one.
        let mut encoder = Encoder::new(4).unwrap();
        let mut bw = BitWriter::new();
        bw.out_bit(false);
        for v in [0, 1, 2] {
            encoder.encode_symbol(&mut bw, v).unwrap();
        }
        let nyt = encoder.tree().nyt_codeword().unwrap().clone();
        assert!(nyt.len() >= 2);
        let cut = bw.bit_len();
        bw.out_bit(nyt.bits().next().unwrap());
        assert!(matches!(
            decode(&mut bw.into_reader(), 4),
            Err(Error::TruncatedStream { position }) if position == cut
        ));
    }

    #[test]
    fn repeated_raw_value_is_corrupt_test() {
        // header, raw 0, NYT "0" + raw 0 again
        let bits = ["0", "00000000", "0", "00000000"].concat();
        assert!(matches!(
            decode(&mut reader(&bits), 4),
            Err(Error::InvalidCodeword(_))
        ));
    }

    #[test]
    fn decoder_tracks_encoder_test() {
        let data = b"mississippi river".to_vec();
        let mut encoder = Encoder::new(256).unwrap();
        let mut decoder = Decoder::new(256).unwrap();
        let mut bw = BitWriter::new();
        for &v in &data {
            encoder.encode_symbol(&mut bw, v).unwrap();
        }
        let mut br = bw.into_reader();
        for &v in &data {
            assert_eq!(decoder.decode_symbol(&mut br).unwrap(), Some(v));
        }
        assert_eq!(decoder.decode_symbol(&mut br).unwrap(), None);
        assert_eq!(encoder.tree(), decoder.tree());
    }
}
