// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! 2:1 serializer and 1:2 deserializer between the controller clock
//! and a clock running twice as fast.

use crate::delay::TappedDelayLine;

#[inline]
fn mask(w: usize) -> u64 {
    if w >= 64 { u64::MAX } else { (1u64 << w) - 1 }
}

#[inline]
fn fill(w: usize, value: bool) -> u64 {
    if value { mask(w) } else { 0 }
}

/// Splits a word latched in one cycle over the two half cycles of the
/// next one, low half first.
#[derive(Debug, Clone)]
pub struct Serializer {
    o_dw: usize,
    r: u64,
}

impl Serializer {
    /// cycles from input to the first output half.
    pub const LATENCY: usize = 1;

    pub fn new(o_dw: usize, reset_value: bool) -> Self {
        assert!(2 * o_dw <= 64);
        Serializer { o_dw, r: fill(2 * o_dw, reset_value) }
    }

    #[inline]
    pub fn output(&self) -> [u64; 2] {
        [self.r & mask(self.o_dw), self.r >> self.o_dw & mask(self.o_dw)]
    }

    #[inline]
    pub fn tick(&mut self, i: u64) {
        self.r = i & mask(2 * self.o_dw);
    }
}

/// Joins the two halves received in one cycle, first half in the low
/// bits.
#[derive(Debug, Clone)]
pub struct Deserializer {
    i_dw: usize,
    words: TappedDelayLine<u64>,
}

impl Deserializer {
    /// cycles from the first input half to the output word.
    pub const LATENCY: usize = 2;

    pub fn new(i_dw: usize, reset_value: bool) -> Self {
        assert!(2 * i_dw <= 64);
        Deserializer {
            i_dw,
            words: TappedDelayLine::with_reset(Self::LATENCY, fill(2 * i_dw, reset_value)),
        }
    }

    #[inline]
    pub fn output(&self) -> u64 {
        self.words.output()
    }

    #[inline]
    pub fn tick(&mut self, halves: [u64; 2]) {
        let m = mask(self.i_dw);
        self.words.tick(halves[0] & m | (halves[1] & m) << self.i_dw);
    }
}
