// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Tapped delay lines.

use std::collections::VecDeque;

/// A shift register exposing every stored stage.
///
/// `taps[k]` holds the input seen `k + 1` ticks ago, so after a
/// tick the former `taps[k]` moves to `taps[k + 1]` and the oldest
/// value drops off. The output is the oldest tap.
#[derive(Debug, Clone)]
pub struct TappedDelayLine<T> {
    taps: VecDeque<T>,
}

impl<T: Copy + Default> TappedDelayLine<T> {
    pub fn new(ntaps: usize) -> Self {
        Self::with_reset(ntaps, T::default())
    }

    /// all taps start out holding `reset`.
    pub fn with_reset(ntaps: usize, reset: T) -> Self {
        assert!(ntaps >= 1, "a delay line needs at least one tap");
        TappedDelayLine {
            taps: std::iter::repeat(reset).take(ntaps).collect()
        }
    }

    #[inline]
    pub fn ntaps(&self) -> usize {
        self.taps.len()
    }

    /// The value seen `k + 1` ticks ago.
    #[inline]
    pub fn tap(&self, k: usize) -> T {
        self.taps[k]
    }

    /// Tap `k`, where `k == -1` means the undelayed `input`.
    #[inline]
    pub fn tap_or_input(&self, k: isize, input: T) -> T {
        if k < 0 {
            assert_eq!(k, -1, "only one tap before the delay line exists");
            input
        }
        else {
            self.taps[k as usize]
        }
    }

    #[inline]
    pub fn output(&self) -> T {
        self.taps[self.taps.len() - 1]
    }

    pub fn taps(&self) -> impl Iterator<Item = T> + '_ {
        self.taps.iter().copied()
    }

    /// Clock one tick in.
    #[inline]
    pub fn tick(&mut self, input: T) {
        self.taps.pop_back();
        self.taps.push_front(input);
    }
}
