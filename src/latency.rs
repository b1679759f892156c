// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Latency algebra across the controller and DRAM clock domains.

use std::fmt;
use std::ops::Add;
use crate::NPHASES;

/// Latency counted against the PHY's own clock ratio.
pub type PhyLatency = Latency<NPHASES>;

/// A duration made of whole controller cycles plus a remainder of
/// fast (DRAM) clock ticks.
///
/// `RATIO` is the number of fast ticks per controller cycle.
/// The remainder is always kept in `[0, RATIO)`; anything beyond
/// carries into the whole-cycle count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Latency<const RATIO: usize = 8> {
    sys: usize,
    fast: usize,
}

impl<const RATIO: usize> Latency<RATIO> {
    /// build a latency, carrying surplus fast ticks into cycles.
    #[inline]
    pub fn new(sys: usize, fast: usize) -> Self {
        assert!(RATIO >= 1, "latency ratio must be positive");
        Latency {
            sys: sys + fast / RATIO,
            fast: fast % RATIO,
        }
    }

    /// a latency of only whole controller cycles.
    #[inline]
    pub fn cycles(sys: usize) -> Self {
        Self::new(sys, 0)
    }

    /// whole controller cycles.
    #[inline]
    pub fn sys(&self) -> usize {
        self.sys
    }

    /// remainder ticks of the fast clock, always below `RATIO`.
    #[inline]
    pub fn fast(&self) -> usize {
        self.fast
    }

    #[inline]
    pub fn ratio(&self) -> usize {
        RATIO
    }

    /// total duration counted in fast ticks.
    #[inline]
    pub fn total_fast_ticks(&self) -> usize {
        self.sys * RATIO + self.fast
    }
}

impl<const RATIO: usize> Add for Latency<RATIO> {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Latency::new(self.sys + other.sys, self.fast + other.fast)
    }
}

impl<const RATIO: usize> fmt::Display for Latency<RATIO> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Latency(sys={}, sys{}x={})", self.sys, RATIO, self.fast)
    }
}
