//! MSB-first bit access over a byte payload.
//!
//! `BitCursor` is the encoder's read head; `BitAccumulator` is the decoder's
//! write side that regroups variable-width codewords into whole bytes.

/// Read head over a payload's bits, most significant bit of each byte first.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl<'a> BitCursor<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, offset: 0 }
    }

    #[inline]
    pub fn total_bits(&self) -> usize {
        self.payload.len() * 8
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.total_bits() - self.offset
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.total_bits()
    }

    /// Reads `count` bits as an unsigned integer and advances.
    ///
    /// `count` is clamped to the remaining bits, so the cursor never passes
    /// `total_bits`. Returns the value and the number of bits consumed.
    pub fn read(&mut self, count: u32) -> (usize, u32) {
        let count = count.min(32).min(self.remaining() as u32);
        let mut value = 0usize;
        for _ in 0..count {
            let byte = self.payload[self.offset / 8];
            let bit = (byte >> (7 - (self.offset % 8))) & 1;
            value = (value << 1) | usize::from(bit);
            self.offset += 1;
        }
        (value, count)
    }

    /// Percentage of bits consumed, `100.0` for an empty payload.
    pub fn progress(&self) -> f64 {
        if self.total_bits() == 0 {
            100.0
        } else {
            (self.offset as f64 / self.total_bits() as f64 * 100.0).min(100.0)
        }
    }
}

/// Collects codeword bits and emits whole bytes as soon as 8 bits are held.
#[derive(Debug, Clone, Default)]
pub struct BitAccumulator {
    pending: u32,
    pending_len: u32,
    accumulated: usize,
    bytes: Vec<u8>,
}

impl BitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bits appended so far, including those already flushed as bytes.
    #[inline]
    pub fn accumulated_bits(&self) -> usize {
        self.accumulated
    }

    /// Bits still needed to complete the byte in progress (`8` on a boundary).
    #[inline]
    pub fn bits_to_byte_boundary(&self) -> u32 {
        8 - self.pending_len
    }

    /// Appends the low `width` bits of `value`, most significant first.
    pub fn push(&mut self, value: usize, width: u32) {
        for shift in (0..width).rev() {
            let bit = ((value >> shift) & 1) as u32;
            self.pending = (self.pending << 1) | bit;
            self.pending_len += 1;
            self.accumulated += 1;
            if self.pending_len == 8 {
                self.bytes.push(self.pending as u8);
                self.pending = 0;
                self.pending_len = 0;
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Completed bytes; an incomplete trailing byte is discarded.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::{BitAccumulator, BitCursor};

    #[test]
    fn cursor_reads_msb_first_across_byte_boundaries() {
        let payload = [0b1010_1100, 0b0111_0000];
        let mut cursor = BitCursor::new(&payload);
        assert_eq!(cursor.read(3), (0b101, 3));
        assert_eq!(cursor.read(7), (0b0_1100_01, 7));
        assert_eq!(cursor.offset(), 10);
        assert_eq!(cursor.remaining(), 6);
    }

    #[test]
    fn cursor_clamps_reads_to_remaining_bits() {
        let payload = [0xFF];
        let mut cursor = BitCursor::new(&payload);
        assert_eq!(cursor.read(5), (0b11111, 5));
        assert_eq!(cursor.read(5), (0b111, 3));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.read(4), (0, 0));
        assert_eq!(cursor.offset(), cursor.total_bits());
    }

    #[test]
    fn empty_payload_reports_complete_progress() {
        let cursor = BitCursor::new(&[]);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.progress(), 100.0);
    }

    #[test]
    fn accumulator_regroups_odd_widths_into_bytes() {
        let mut acc = BitAccumulator::new();
        acc.push(0b101, 3);
        assert_eq!(acc.bits_to_byte_boundary(), 5);
        acc.push(0b01100, 5);
        assert_eq!(acc.bytes(), &[0b1010_1100]);
        assert_eq!(acc.bits_to_byte_boundary(), 8);
        acc.push(0b0111, 4);
        assert_eq!(acc.accumulated_bits(), 12);
        assert_eq!(acc.into_bytes(), vec![0b1010_1100]);
    }

    #[test]
    fn accumulator_zero_pads_small_ranks() {
        let mut acc = BitAccumulator::new();
        acc.push(1, 4);
        acc.push(0, 4);
        assert_eq!(acc.into_bytes(), vec![0b0001_0000]);
    }
}
