//! BitWriter: the append-only side of the bit channel.
//!
//! Bits are packed MSB-first. Nothing is written to a device here; the finished buffer is handed
//! to the container module, which knows how to put it in a file.

use super::bitreader::BitReader;
use crate::huffman_coding::codeword::Codeword;

/// Collects single bits and fixed-width values into a byte buffer.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    /// Completed bytes.
    output: Vec<u8>,
    /// Private queue to hold bits that are waiting to be put as bytes into the output buffer.
    queue: u64,
    /// Count of valid bits in the queue (always < 8 between calls).
    q_bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a BitWriter whose output buffer can hold `bytes` bytes without resizing.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            output: Vec::with_capacity(bytes),
            queue: 0,
            q_bits: 0,
        }
    }

    /// Move every full byte from the queue to the output buffer.
    fn push_queue(&mut self) {
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.output.push(byte); //push the packed byte out
            self.q_bits -= 8; //adjust the count of bits left in the queue
        }
    }

    /// Append one bit.
    pub fn out_bit(&mut self, bit: bool) {
        self.queue <<= 1;
        self.queue |= bit as u64;
        self.q_bits += 1;
        self.push_queue();
    }

    /// Append the low `width` bits of `data`, most significant first. `width` may be 0..=32.
    pub fn out_bits(&mut self, data: u32, width: u8) {
        debug_assert!(width <= 32, "out_bits width {} exceeds 32", width);
        let mask = (1_u64 << width) - 1;
        self.queue <<= width; //shift queue by bit length
        self.queue |= data as u64 & mask; //add data portion to queue
        self.q_bits += width; //update depth of queue bits
        self.push_queue();
    }

    /// Append an 8 bit raw value.
    pub fn out8(&mut self, data: u8) {
        self.out_bits(data as u32, 8);
    }

    /// Append every bit of a codeword, root side first.
    pub fn out_codeword(&mut self, codeword: &Codeword) {
        codeword.bits().for_each(|bit| self.out_bit(bit));
    }

    /// Total number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.output.len() * 8 + self.q_bits as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len() == 0
    }

    /// Flush the remaining bits (0-7) from the queue, padding with 0s in the least significant
    /// bits. Returns the packed bytes and the number of padding bits added to the last byte.
    pub fn finish(mut self) -> (Vec<u8>, u8) {
        let mut padding = 0;
        if self.q_bits > 0 {
            padding = 8 - self.q_bits;
            let byte = (self.queue << padding) as u8;
            self.output.push(byte);
            self.q_bits = 0;
        }
        (self.output, padding)
    }

    /// Turn the written bits into a reader over exactly those bits.
    pub fn into_reader(self) -> BitReader {
        let bit_len = self.bit_len();
        let (bytes, _) = self.finish();
        BitReader::new(bytes, bit_len)
    }
}
