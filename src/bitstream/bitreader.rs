//! BitReader: the consuming side of the bit channel.
//!
//! Reads an exact number of MSB-first packed bits. Every read reports one of three outcomes: the
//! bits asked for, `Exhausted` when not a single bit is left, or `Truncated` when some but fewer
//! than the requested bits remain. Running dry is how a decode session ends, so it is a value
//! here and not an error.
//!

const BIT_MASK: u8 = 0xff;

/// Outcome of a read from the bit channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bits<T> {
    /// The requested bits.
    Value(T),
    /// No bits at all were left.
    Exhausted,
    /// Fewer bits than requested were left. Nothing was consumed.
    Truncated { available: usize },
}

impl<T> Bits<T> {
    /// The bits read, if the read succeeded.
    pub fn value(self) -> Option<T> {
        match self {
            Bits::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Reads a packed bitstream of known bit length.
#[derive(Debug, Clone)]
pub struct BitReader {
    buffer: Vec<u8>,
    /// Number of valid bits in `buffer`; anything past it is padding.
    bit_len: usize,
    cursor: usize,
    bit_index: usize,
}

impl BitReader {
    /// Creates a reader over the first `bit_len` bits of `buffer`.
    pub fn new(buffer: Vec<u8>, bit_len: usize) -> Self {
        let bit_len = bit_len.min(buffer.len() * 8);
        Self {
            buffer,
            bit_len,
            cursor: 0,
            bit_index: 0,
        }
    }

    /// Bits consumed so far.
    pub fn position(&self) -> usize {
        self.cursor * 8 + self.bit_index
    }

    /// Bits left to read.
    pub fn remaining(&self) -> usize {
        self.bit_len - self.position()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read one bit. A single bit is never `Truncated`.
    pub fn read_bit(&mut self) -> Bits<bool> {
        if self.is_empty() {
            return Bits::Exhausted;
        }
        let bit =
            (self.buffer[self.cursor] & BIT_MASK >> self.bit_index) >> (7 - self.bit_index);
        self.bit_index += 1;
        self.bit_index %= 8;
        if self.bit_index == 0 {
            self.cursor += 1;
        }
        Bits::Value(bit == 1)
    }

    /// Read `n` (0..=32) bits as a big-endian unsigned value.
    pub fn read_bits(&mut self, n: usize) -> Bits<u32> {
        debug_assert!(n <= 32, "read_bits width {} exceeds 32", n);
        let available = self.remaining();
        if n == 0 {
            return Bits::Value(0);
        }
        if available == 0 {
            return Bits::Exhausted;
        }
        if available < n {
            return Bits::Truncated { available };
        }
        let mut result = 0_u32;
        for _ in 0..n {
            if let Bits::Value(bit) = self.read_bit() {
                result = result << 1 | bit as u32;
            }
        }
        Bits::Value(result)
    }

    /// Read an 8 bit raw value.
    pub fn read8(&mut self) -> Bits<u8> {
        match self.read_bits(8) {
            Bits::Value(v) => Bits::Value(v as u8),
            Bits::Exhausted => Bits::Exhausted,
            Bits::Truncated { available } => Bits::Truncated { available },
        }
    }

    /// Debugging function. Report current position in the buffer.
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.cursor, self.bit_index)
    }
}
