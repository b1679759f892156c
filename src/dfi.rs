// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Controller-facing phase records.
//!
//! Every controller cycle the memory controller hands the PHY one
//! [`DfiPhase`] per fast tick of that cycle. The PHY only reads the
//! write-side fields and only writes `rddata` and `rddata_valid`.

/// Number of fast ticks an LPDDR4 command occupies on the CA bus.
pub const CMD_TICKS: usize = 4;

/// Width of the CA bus.
pub const CA_BITS: usize = 6;

/// An LPDDR4 command already encoded into its bus sequence.
///
/// Tick `k` of the command drives `cs` bit `k` and `ca[k]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommandSlot {
    pub valid: bool,
    /// chip select, one bit per tick, low 4 bits used.
    pub cs: u8,
    /// CA words, low 6 bits used.
    pub ca: [u8; CMD_TICKS],
}

impl CommandSlot {
    /// a one-tick command with CS high on its first tick only.
    pub fn single(ca0: u8, ca1: u8) -> Self {
        CommandSlot { valid: true, cs: 0b0001, ca: [ca0, ca1, 0, 0] }
    }

    /// The 4-bit sequence a given CA lane takes across the command.
    #[inline]
    pub fn ca_lane(&self, bit: usize) -> u8 {
        (0..CMD_TICKS).fold(0, |acc, k| {
            acc | ((self.ca[k] >> bit & 1) << k)
        })
    }
}

/// One phase of the controller interface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DfiPhase {
    pub command: CommandSlot,
    pub cke: bool,
    pub odt: bool,
    pub reset_n: bool,
    /// two data beats, `databits` each, beat 0 in the low bits.
    pub wrdata: u64,
    pub wrdata_en: bool,
    /// one mask bit per byte lane and beat, beat 0 in the low bits.
    pub wrdata_mask: u8,
    pub rddata_en: bool,
    /// written by the PHY.
    pub rddata: u64,
    /// written by the PHY.
    pub rddata_valid: bool,
}

/// Gather bit `bit` of a 2-beat phase field across all phases into a
/// lane word, in transmission order.
///
/// Bit `i` of the result comes from beat `i % 2` of phase `i / 2`.
pub fn gather_lane(phases: &[DfiPhase], field: impl Fn(&DfiPhase) -> u64, beat_width: usize, bit: usize) -> u64 {
    let mut lane = 0u64;
    for i in 0..2 * phases.len() {
        let word = field(&phases[i / 2]);
        lane |= (word >> (i % 2 * beat_width + bit) & 1) << i;
    }
    lane
}

/// Inverse of [`gather_lane`] for the read data of one DQ lane.
pub fn scatter_rddata(phases: &mut [DfiPhase], databits: usize, bit: usize, lane: u64) {
    for i in 0..2 * phases.len() {
        let pos = i % 2 * databits + bit;
        let phase = &mut phases[i / 2];
        phase.rddata = (phase.rddata & !(1 << pos)) | ((lane >> i & 1) << pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ca_lane_transposes() {
        let cmd = CommandSlot {
            valid: true,
            cs: 0b0011,
            ca: [0b000001, 0b000011, 0b000000, 0b100001],
        };
        assert_eq!(cmd.ca_lane(0), 0b1011);
        assert_eq!(cmd.ca_lane(1), 0b0010);
        assert_eq!(cmd.ca_lane(5), 0b1000);
    }

    #[test]
    fn gather_scatter_inverse() {
        let mut phases = [DfiPhase::default(); 8];
        for (i, p) in phases.iter_mut().enumerate() {
            // beat 0 bit 3 set on even phases, beat 1 bit 3 on odd
            p.wrdata = if i % 2 == 0 { 1 << 3 } else { 1 << (16 + 3) };
        }
        let lane = gather_lane(&phases, |p| p.wrdata, 16, 3);
        let expected = (0..16).filter(|i| (i / 2) % 2 == i % 2)
            .fold(0u64, |acc, i| acc | 1 << i);
        assert_eq!(lane, expected);

        scatter_rddata(&mut phases, 16, 3, lane);
        for p in &phases {
            assert_eq!(p.rddata, p.wrdata);
        }
    }
}
