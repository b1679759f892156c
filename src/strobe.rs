// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Write strobe framing.
//!
//! Output enables of DQ/DMI/DQS and the DQS preamble/postamble are
//! all derived from one delay line of the controller's write data
//! enables. DQS is driven for at least 3 cycles around a write: one
//! for the preamble, the data cycles, and one for the postamble.

use crate::delay::TappedDelayLine;

/// DQS toggling once per DRAM clock, transmitted LSB first.
pub const DQS_TOGGLE: u64 = 0b0101_0101_0101_0101;

/// Held low, then toggling on the last two ticks before data.
pub const DQS_PREAMBLE: u64 = 0b0101_0000_0000_0000;

/// One toggle after data, then held low.
pub const DQS_POSTAMBLE: u64 = 0b0000_0000_0000_0001;

/// DQS words used for the different strobe states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DqsPatterns {
    pub data: u64,
    pub preamble: u64,
    pub postamble: u64,
    /// Exchange preamble and postamble patterns. The two are defined
    /// the opposite way around in some controller settings.
    pub swap_framing: bool,
}

impl Default for DqsPatterns {
    fn default() -> Self {
        DqsPatterns {
            data: DQS_TOGGLE,
            preamble: DQS_PREAMBLE,
            postamble: DQS_POSTAMBLE,
            swap_framing: false,
        }
    }
}

/// Write path control signals of one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StrobeFrame {
    pub dq_oe: bool,
    pub dqs_oe: bool,
    pub preamble: bool,
    pub postamble: bool,
}

impl DqsPatterns {
    /// The DQS word to send for a frame.
    ///
    /// In write leveling DQS stays low except for a single rising
    /// edge on each leveling strobe.
    pub fn word(&self, frame: &StrobeFrame, wlevel_en: bool, wlevel_strobe: bool) -> u64 {
        let (pre, post) = match self.swap_framing {
            false => (self.preamble, self.postamble),
            true => (self.postamble, self.preamble),
        };
        if wlevel_en {
            return wlevel_strobe as u64
        }
        if frame.postamble {
            post
        }
        else if frame.preamble {
            pre
        }
        else {
            self.data
        }
    }
}

/// Delay line of write data enables and the framing taken from it.
#[derive(Debug, Clone)]
pub struct WriteControl {
    wrdata_en: TappedDelayLine<bool>,
    wrtap: usize,
}

impl WriteControl {
    /// `wrtap` selects the tap that enables DQ, the taps around it
    /// frame DQS.
    pub fn new(wrtap: usize) -> Self {
        WriteControl {
            wrdata_en: TappedDelayLine::new(wrtap + 2),
            wrtap,
        }
    }

    #[inline]
    pub fn wrtap(&self) -> usize {
        self.wrtap
    }

    /// `input` is this cycle's OR of all phase write enables, only
    /// looked at when the write tap is 0.
    pub fn frame(&self, input: bool, wlevel_en: bool) -> StrobeFrame {
        let tap = |k: isize| self.wrdata_en.tap_or_input(k, input);
        let w = self.wrtap as isize;
        let dq_oe = tap(w);
        let preamble = tap(w - 1) && !tap(w);
        let postamble = tap(w + 1) && !tap(w);
        StrobeFrame {
            dq_oe,
            // always driven in write leveling
            dqs_oe: wlevel_en || preamble || dq_oe || postamble,
            preamble,
            postamble,
        }
    }

    #[inline]
    pub fn tick(&mut self, input: bool) {
        self.wrdata_en.tick(input);
    }
}
