//! The stream header.
//!
//! One flag bit says whether the payload is raw pixel data. Images add a channel flag, the sign of
//! `width - height`, and the magnitude of that difference written as base-10 digits (a 4 bit digit
//! count, then 4 bits per digit, most significant first). The decoder recovers both dimensions
//! from the difference and the number of decoded pixels.

use log::{debug, warn};

use crate::bitstream::{
    bitreader::{BitReader, Bits},
    bitwriter::BitWriter,
};
use crate::error::{Error, Result};

/// Maximum number of decimal digits a 4 bit count can announce.
const MAX_DIGITS: usize = 15;

/// Shape of raw pixel input on the encode side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub width: usize,
    pub height: usize,
    pub three_channel: bool,
}

impl ImageShape {
    pub fn channels(&self) -> usize {
        if self.three_channel {
            3
        } else {
            1
        }
    }

    /// Number of bytes the pixel data must hold.
    pub fn byte_count(&self) -> Result<usize> {
        self.width
            .checked_mul(self.height)
            .and_then(|pixels| pixels.checked_mul(self.channels()))
            .ok_or_else(|| self.too_large())
    }

    pub fn header(&self) -> Result<ImageHeader> {
        let width = i64::try_from(self.width).map_err(|_| self.too_large())?;
        let height = i64::try_from(self.height).map_err(|_| self.too_large())?;
        Ok(ImageHeader {
            three_channel: self.three_channel,
            difference: width - height,
        })
    }

    fn too_large(&self) -> Error {
        Error::InvalidHeader(format!(
            "{}x{}x{} image is too large",
            self.width,
            self.height,
            self.channels()
        ))
    }
}

/// Image metadata as carried by the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub three_channel: bool,
    /// `width - height`
    pub difference: i64,
}

impl ImageHeader {
    /// Recover `(width, height)` from the number of decoded bytes: `height` is the positive root
    /// of `height^2 + difference * height - pixels = 0`, rounded to the nearest integer.
    pub fn dimensions(&self, total_symbols: usize) -> (usize, usize) {
        let channels = if self.three_channel { 3 } else { 1 };
        let pixels = (total_symbols / channels) as f64;
        let d = self.difference as f64;
        let height = ((-d + (d * d + 4.0 * pixels).sqrt()) / 2.0).round().max(0.0) as i64;
        let width = (height + self.difference).max(0);
        let (width, height) = (width as usize, height as usize);
        if width * height * channels != total_symbols {
            warn!(
                "{} decoded bytes do not fill a {}x{}x{} image",
                total_symbols, width, height, channels
            );
        }
        (width, height)
    }
}

/// Write the header for a plain byte stream (`None`) or for raw pixel data.
pub fn write_header(bw: &mut BitWriter, image: Option<&ImageShape>) -> Result<()> {
    let Some(shape) = image else {
        bw.out_bit(false);
        return Ok(());
    };
    let header = shape.header()?;
    let digits: Vec<u32> = header
        .difference
        .unsigned_abs()
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    if digits.len() > MAX_DIGITS {
        return Err(Error::InvalidHeader(format!(
            "dimension difference {} needs more than {} digits",
            header.difference, MAX_DIGITS
        )));
    }

    bw.out_bit(true);
    bw.out_bit(header.three_channel);
    bw.out_bit(header.difference >= 0);
    bw.out_bits(digits.len() as u32, 4);
    digits.iter().for_each(|&d| bw.out_bits(d, 4));
    debug!(
        "Image header: {}x{}, {} channel(s), difference {} in {} digits",
        shape.width,
        shape.height,
        shape.channels(),
        header.difference,
        digits.len()
    );
    Ok(())
}

/// Read the header written by `write_header`.
pub fn read_header(br: &mut BitReader) -> Result<Option<ImageHeader>> {
    if !need(br, |br| br.read_bit())? {
        debug!("Stream holds plain bytes.");
        return Ok(None);
    }
    let three_channel = need(br, |br| br.read_bit())?;
    let non_negative = need(br, |br| br.read_bit())?;
    let count = need(br, |br| br.read_bits(4))?;
    if count == 0 {
        return Err(Error::InvalidHeader("zero digit count".to_string()));
    }

    let mut magnitude: i64 = 0;
    for _ in 0..count {
        let digit = need(br, |br| br.read_bits(4))?;
        if digit > 9 {
            return Err(Error::InvalidHeader(format!("digit value {}", digit)));
        }
        magnitude = magnitude * 10 + digit as i64;
    }
    let difference = if non_negative { magnitude } else { -magnitude };
    debug!(
        "Image header: {} channel(s), difference {}",
        if three_channel { 3 } else { 1 },
        difference
    );
    Ok(Some(ImageHeader {
        three_channel,
        difference,
    }))
}

/// Every header field is mandatory; running out of bits anywhere inside it is a truncation.
fn need<T>(br: &mut BitReader, read: impl FnOnce(&mut BitReader) -> Bits<T>) -> Result<T> {
    let position = br.position();
    read(br).value().ok_or(Error::TruncatedStream { position })
}

#[cfg(test)]
mod test {
    use super::*;

    fn bit_string(bw: BitWriter) -> String {
        let mut br = bw.into_reader();
        let mut s = String::new();
        while let Some(bit) = br.read_bit().value() {
            s.push(if bit { '1' } else { '0' });
        }
        s
    }

    #[test]
    fn plain_header_test() {
        let mut bw = BitWriter::new();
        write_header(&mut bw, None).unwrap();
        assert_eq!(bit_string(bw.clone()), "0");
        let mut br = bw.into_reader();
        assert_eq!(read_header(&mut br).unwrap(), None);
    }

    #[test]
    fn image_header_layout_test() {
        let shape = ImageShape {
            width: 130,
            height: 10,
            three_channel: false,
        };
        let mut bw = BitWriter::new();
        write_header(&mut bw, Some(&shape)).unwrap();
        assert_eq!(
            bit_string(bw.clone()),
            ["1", "0", "1", "0011", "0001", "0010", "0000"].concat()
        );
        let mut br = bw.into_reader();
        assert_eq!(
            read_header(&mut br).unwrap(),
            Some(ImageHeader {
                three_channel: false,
                difference: 120
            })
        );
    }

    #[test]
    fn negative_difference_test() {
        let shape = ImageShape {
            width: 2,
            height: 5,
            three_channel: true,
        };
        let mut bw = BitWriter::new();
        write_header(&mut bw, Some(&shape)).unwrap();
        assert_eq!(bit_string(bw.clone()), "1100001 0011".replace(' ', ""));
        let header = read_header(&mut bw.into_reader()).unwrap().unwrap();
        assert_eq!(header.difference, -3);
        assert!(header.three_channel);
        assert_eq!(header.dimensions(30), (2, 5));
    }

    #[test]
    fn dimensions_test() {
        let square = ImageHeader {
            three_channel: false,
            difference: 0,
        };
        assert_eq!(square.dimensions(64), (8, 8));

        let wide = ImageShape {
            width: 3,
            height: 2,
            three_channel: true,
        };
        assert_eq!(
            wide.header().unwrap().dimensions(wide.byte_count().unwrap()),
            (3, 2)
        );

        let tall = ImageShape {
            width: 17,
            height: 640,
            three_channel: false,
        };
        assert_eq!(
            tall.header().unwrap().dimensions(tall.byte_count().unwrap()),
            (17, 640)
        );
    }

    #[test]
    fn oversized_shape_test() {
        let huge = ImageShape {
            width: usize::MAX / 2,
            height: 3,
            three_channel: true,
        };
        assert!(matches!(huge.byte_count(), Err(Error::InvalidHeader(_))));
        let mut bw = BitWriter::new();
        let wide = ImageShape {
            width: usize::MAX,
            height: 1,
            three_channel: false,
        };
        assert!(matches!(wide.header(), Err(Error::InvalidHeader(_))));
        assert!(matches!(
            write_header(&mut bw, Some(&wide)),
            Err(Error::InvalidHeader(_))
        ));
        assert!(bw.is_empty());
    }

    #[test]
    fn bad_digit_test() {
        // image, 1 channel, positive, 1 digit, digit 12
        let mut bw = BitWriter::new();
        bw.out_bits(0b101, 3);
        bw.out_bits(1, 4);
        bw.out_bits(12, 4);
        assert!(matches!(
            read_header(&mut bw.into_reader()),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn truncated_header_test() {
        let mut bw = BitWriter::new();
        bw.out_bits(0b101, 3);
        bw.out_bits(0b10, 2);
        assert!(matches!(
            read_header(&mut bw.into_reader()),
            Err(Error::TruncatedStream { position: 3 })
        ));
        assert!(matches!(
            read_header(&mut BitWriter::new().into_reader()),
            Err(Error::TruncatedStream { position: 0 })
        ));
    }
}
