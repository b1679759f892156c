// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Bit lane transcoders.
//!
//! A bitslip keeps the last `cycles + 1` parallel words of a lane and
//! selects a `dw`-bit window out of them. Treating the lane as a serial
//! stream (bit 0 of a word first), the output is the input delayed by
//! `dw + slip` bits, i.e. between `cycles` and `cycles + 1` words.
//! Calibration moves `slip` until sampled data lines up with the
//! controller cycle.

#[inline]
fn mask(dw: usize) -> u64 {
    if dw >= 64 { u64::MAX } else { (1u64 << dw) - 1 }
}

/// Bitslip with run-time adjustable slip.
#[derive(Debug, Clone)]
pub struct BitSlip {
    dw: usize,
    cycles: usize,
    slip: usize,
    /// history, oldest word in the low bits.
    r: u64,
}

impl BitSlip {
    pub fn new(dw: usize, cycles: usize) -> Self {
        assert!(cycles >= 1);
        assert!(dw >= 1 && (cycles + 1) * dw <= 64,
                "bitslip history of {} words x {} bits does not fit",
                cycles + 1, dw);
        BitSlip { dw, cycles, slip: 0, r: 0 }
    }

    #[inline]
    pub fn dw(&self) -> usize {
        self.dw
    }

    /// number of distinct slip positions.
    #[inline]
    pub fn slip_range(&self) -> usize {
        self.cycles * self.dw
    }

    #[inline]
    pub fn slip(&self) -> usize {
        self.slip
    }

    pub fn set_slip(&mut self, slip: usize) {
        assert!(slip < self.slip_range(), "slip {} out of range", slip);
        self.slip = slip;
    }

    /// Delay from input to output in bits.
    #[inline]
    pub fn delay_bits(&self) -> usize {
        self.dw + self.slip
    }

    /// The raw history register.
    #[inline]
    pub fn history(&self) -> u64 {
        self.r
    }

    #[inline]
    pub fn output(&self) -> u64 {
        (self.r >> (self.slip_range() - self.slip)) & mask(self.dw)
    }

    /// Clock in a word.
    ///
    /// `slp` advances the slip by one bit (wrapping), `rst` returns it
    /// to zero and drops the buffered history. Reset wins over slip.
    pub fn tick(&mut self, i: u64, rst: bool, slp: bool) {
        let i = i & mask(self.dw);
        self.r = (self.r >> self.dw) | (i << self.slip_range());
        if slp {
            self.slip = (self.slip + 1) % self.slip_range();
        }
        if rst {
            self.slip = 0;
            self.r = i << self.slip_range();
        }
    }
}

/// Bitslip with a slip fixed at construction.
#[derive(Debug, Clone)]
pub struct ConstBitSlip {
    inner: BitSlip,
}

impl ConstBitSlip {
    pub fn new(dw: usize, cycles: usize, slp: usize) -> Self {
        let mut inner = BitSlip::new(dw, cycles);
        inner.set_slip(slp);
        ConstBitSlip { inner }
    }

    #[inline]
    pub fn output(&self) -> u64 {
        self.inner.output()
    }

    #[inline]
    pub fn history(&self) -> u64 {
        self.inner.history()
    }

    #[inline]
    pub fn tick(&mut self, i: u64) {
        self.inner.tick(i, false, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha20Rng;

    /// read bit `pos` of a stream made of `dw`-bit words.
    fn stream_bit(words: &[u64], dw: usize, pos: usize) -> u64 {
        words[pos / dw] >> (pos % dw) & 1
    }

    #[test]
    fn zero_slip_is_one_word() {
        let mut bs = BitSlip::new(16, 1);
        bs.tick(0xbeef, false, false);
        assert_eq!(bs.output(), 0xbeef);
        bs.tick(0x1234, false, false);
        assert_eq!(bs.output(), 0x1234);
    }

    #[test]
    fn delay_is_dw_plus_slip_bits() {
        let dw = 16;
        let mut rng = ChaCha20Rng::seed_from_u64(8026727);
        for cycles in 1..=2 {
            for slip in 0..cycles * dw {
                let mut bs = BitSlip::new(dw, cycles);
                bs.set_slip(slip);
                let input: Vec<u64> = (0..12).map(|_| rng.gen::<u64>() & 0xffff).collect();
                let mut output = Vec::new();
                for &w in &input {
                    output.push(bs.output());
                    bs.tick(w, false, false);
                }
                let delay = bs.delay_bits();
                assert!(delay >= dw && delay < (cycles + 1) * dw);
                for pos in (cycles + 1) * dw..output.len() * dw {
                    assert_eq!(stream_bit(&output, dw, pos),
                               stream_bit(&input, dw, pos - delay),
                               "cycles {} slip {} pos {}", cycles, slip, pos);
                }
            }
        }
    }

    #[test]
    fn slip_wraps_and_resets() {
        let mut bs = BitSlip::new(8, 1);
        for _ in 0..7 {
            bs.tick(0, false, true);
        }
        assert_eq!(bs.slip(), 7);
        bs.tick(0, false, true);
        assert_eq!(bs.slip(), 0);
        bs.tick(0xff, false, true);
        bs.tick(0xff, false, true);
        assert_eq!(bs.slip(), 2);
        bs.tick(0x5a, true, true);
        assert_eq!(bs.slip(), 0);
        assert_eq!(bs.history(), 0x5a << 8);
        assert_eq!(bs.output(), 0x5a);
    }

    #[test]
    fn write_then_read_round_trip() {
        let dw = 16;
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let input: Vec<u64> = (0..32).map(|_| rng.gen::<u64>() & 0xffff).collect();
        for slip_out in 0..dw {
            let slip_in = (dw - slip_out) % dw;
            let mut wr = BitSlip::new(dw, 1);
            let mut rd = BitSlip::new(dw, 1);
            wr.set_slip(slip_out);
            rd.set_slip(slip_in);
            let mut recovered = Vec::new();
            for &w in &input {
                recovered.push(rd.output());
                rd.tick(wr.output(), false, false);
                wr.tick(w, false, false);
            }
            let delay = if slip_out == 0 { 2 } else { 3 };
            for t in delay + 1..input.len() {
                assert_eq!(recovered[t], input[t - delay], "slip {} t {}", slip_out, t);
            }
        }
    }

    #[test]
    fn const_bitslip_places_bits() {
        // slip p puts bit k of the word at position k + p, one cycle later.
        for p in 0..8 {
            let mut bs = ConstBitSlip::new(8, 1, p);
            bs.tick(0b1);
            assert_eq!(bs.output(), 1 << p);
            bs.tick(0);
            assert_eq!(bs.output(), 0);
        }
        let mut bs = ConstBitSlip::new(8, 1, 6);
        bs.tick(0b1111);
        assert_eq!(bs.output(), 0b1100_0000);
        bs.tick(0);
        assert_eq!(bs.output(), 0b0000_0011);
    }
}
