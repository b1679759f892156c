// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Command bus arbitration.
//!
//! Each of the phases of a controller cycle may start a command, and
//! a command occupies the CS/CA pads for up to 4 fast ticks. Commands
//! are slipped to the tick of their phase and ORed together, after
//! masking any command that would start while an earlier one is
//! still on the bus.
//!
//! Masking relies on nothing but the phase valids, so it is cheap to
//! disable when the controller timings already guarantee at least 4
//! ticks between commands.

use crate::bitslip::ConstBitSlip;
use crate::dfi::{DfiPhase, CA_BITS};

/// Ticks before a command's own slot that must be free of other
/// commands.
pub const CMD_LOOKBACK: usize = 3;

/// Per-cycle value of the command pads, one bit per fast tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommandBus {
    pub cs: u64,
    pub ca: [u64; CA_BITS],
}

#[derive(Debug, Clone)]
pub struct CommandArbiter {
    nphases: usize,
    mask_overlaps: bool,
    /// phase valids of the last two cycles.
    valids: ConstBitSlip,
    cs: Vec<ConstBitSlip>,
    ca: Vec<Vec<ConstBitSlip>>,
    suppressed: u64,
}

impl CommandArbiter {
    pub fn new(nphases: usize, mask_overlaps: bool) -> Self {
        assert!(nphases >= CMD_LOOKBACK);
        CommandArbiter {
            nphases, mask_overlaps,
            valids: ConstBitSlip::new(nphases, 1, 0),
            cs: (0..nphases).map(|p| ConstBitSlip::new(nphases, 1, p)).collect(),
            ca: (0..nphases).map(|p| {
                (0..CA_BITS).map(|_| ConstBitSlip::new(nphases, 1, p)).collect()
            }).collect(),
            suppressed: 0,
        }
    }

    #[inline]
    pub fn mask_overlaps(&self) -> bool {
        self.mask_overlaps
    }

    /// Number of valid commands dropped because they overlapped.
    #[inline]
    pub fn suppressed_commands(&self) -> u64 {
        self.suppressed
    }

    /// Valid history with every valid removed that has another
    /// valid within the preceding `CMD_LOOKBACK` slots.
    ///
    /// Bits `0..nphases` are the cycle before last, the following
    /// `nphases` bits the last cycle.
    pub fn filtered_history(&self) -> u64 {
        let r = self.valids.history();
        let mut hist = 0u64;
        for i in 0..2 * self.nphases {
            let lo = i.saturating_sub(CMD_LOOKBACK);
            let before = (r >> lo) & ((1u64 << (i - lo)) - 1);
            if r >> i & 1 == 1 && before == 0 {
                hist |= 1 << i;
            }
        }
        hist
    }

    /// Whether the command of `phase` (issued last cycle) may reach
    /// the pads.
    pub fn allowed(&self, phase: usize) -> bool {
        self.allowed_phases() >> phase & 1 == 1
    }

    /// `allowed` of every phase as a bit mask, from a single pass over
    /// the history.
    pub fn allowed_phases(&self) -> u64 {
        let all = (1u64 << self.nphases) - 1;
        if !self.mask_overlaps {
            return all
        }
        let hist = self.filtered_history();
        (0..self.nphases)
            .filter(|&phase| {
                let lo = self.nphases + phase - CMD_LOOKBACK;
                hist >> lo & ((1 << CMD_LOOKBACK) - 1) == 0
            })
            .fold(0, |acc, phase| acc | 1 << phase)
    }

    /// The pad values for the current cycle.
    pub fn output(&self) -> CommandBus {
        let allowed = self.allowed_phases();
        let mut bus = CommandBus::default();
        for phase in 0..self.nphases {
            if allowed >> phase & 1 == 0 {
                continue
            }
            bus.cs |= self.cs[phase].output();
            for bit in 0..CA_BITS {
                bus.ca[bit] |= self.ca[phase][bit].output();
            }
        }
        bus
    }

    /// Latch the commands of this cycle's phases.
    pub fn tick(&mut self, phases: &[DfiPhase]) {
        assert_eq!(phases.len(), self.nphases);
        let last = self.valids.history() >> self.nphases;
        let dropped = last & !self.allowed_phases();
        for phase in (0..self.nphases).filter(|&p| dropped >> p & 1 == 1) {
            clilog::trace!("dropped overlapping command on phase {}", phase);
        }
        self.suppressed += dropped.count_ones() as u64;

        let valids = phases.iter().enumerate()
            .fold(0u64, |acc, (i, p)| acc | (p.command.valid as u64) << i);
        self.valids.tick(valids);
        for (phase, p) in phases.iter().enumerate() {
            self.cs[phase].tick((p.command.cs & 0xf) as u64);
            for bit in 0..CA_BITS {
                self.ca[phase][bit].tick(p.command.ca_lane(bit) as u64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfi::CommandSlot;

    const NP: usize = 8;

    fn cmd(cs: u8, ca: [u8; 4]) -> CommandSlot {
        CommandSlot { valid: true, cs, ca }
    }

    fn cycle(cmds: &[(usize, CommandSlot)]) -> Vec<DfiPhase> {
        let mut phases = vec![DfiPhase::default(); NP];
        for &(p, c) in cmds {
            phases[p].command = c;
        }
        phases
    }

    /// feed one cycle and return the bus one cycle later.
    fn run(arb: &mut CommandArbiter, cmds: &[(usize, CommandSlot)]) -> CommandBus {
        arb.tick(&cycle(cmds));
        let bus = arb.output();
        arb.tick(&cycle(&[]));
        bus
    }

    #[test]
    fn single_command_lands_on_its_phase() {
        let mut arb = CommandArbiter::new(NP, true);
        let bus = run(&mut arb, &[(2, cmd(0b0011, [0x3f, 0x01, 0, 0]))]);
        assert_eq!(bus.cs, 0b0011 << 2);
        assert_eq!(bus.ca[0], 0b0011 << 2);
        assert_eq!(bus.ca[1], 0b0001 << 2);
        assert_eq!(bus.ca[5], 0b0001 << 2);
        assert_eq!(arb.suppressed_commands(), 0);
    }

    #[test]
    fn overlapping_later_command_is_dropped() {
        let mut arb = CommandArbiter::new(NP, true);
        let first = cmd(0b0011, [0x01, 0x02, 0, 0]);
        let second = cmd(0b0001, [0x3f, 0x3f, 0, 0]);
        let bus = run(&mut arb, &[(0, first), (2, second)]);
        assert_eq!(bus.cs, 0b0011);
        assert_eq!(bus.ca[0], 0b0001);
        assert_eq!(bus.ca[1], 0b0010);
        for bit in 2..CA_BITS {
            assert_eq!(bus.ca[bit], 0);
        }
        assert_eq!(arb.suppressed_commands(), 1);
    }

    #[test]
    fn non_overlapping_commands_both_appear() {
        let mut arb = CommandArbiter::new(NP, true);
        let a = cmd(0b0011, [0x01, 0x01, 0, 0]);
        let b = cmd(0b0011, [0x20, 0x20, 0, 0]);
        let bus = run(&mut arb, &[(0, a), (4, b)]);
        assert_eq!(bus.cs, 0b0011_0011);
        assert_eq!(bus.ca[0], 0b0000_0011);
        assert_eq!(bus.ca[5], 0b0011_0000);
        assert_eq!(arb.suppressed_commands(), 0);
    }

    #[test]
    fn overlap_across_cycle_boundary() {
        let mut arb = CommandArbiter::new(NP, true);
        arb.tick(&cycle(&[(6, cmd(0b1111, [1, 1, 1, 1]))]));
        arb.tick(&cycle(&[(0, cmd(0b0001, [0x04, 0, 0, 0]))]));
        // phase 6 spills two ticks into this cycle, phase 0 is dropped
        let bus = arb.output();
        assert_eq!(bus.cs, 0b11);
        assert_eq!(bus.ca[0], 0b11);
        assert_eq!(bus.ca[2], 0);
        assert_eq!(arb.suppressed_commands(), 0);
        arb.tick(&cycle(&[]));
        assert_eq!(arb.suppressed_commands(), 1);
    }

    #[test]
    fn masking_can_be_disabled() {
        let mut arb = CommandArbiter::new(NP, false);
        let first = cmd(0b0001, [0x01, 0, 0, 0]);
        let second = cmd(0b0001, [0x02, 0, 0, 0]);
        let bus = run(&mut arb, &[(0, first), (1, second)]);
        assert_eq!(bus.cs, 0b11);
        assert_eq!(bus.ca[0], 0b01);
        assert_eq!(bus.ca[1], 0b10);
        assert_eq!(arb.suppressed_commands(), 0);
    }

    #[test]
    fn allowed_mask_matches_per_phase_queries() {
        let mut arb = CommandArbiter::new(NP, true);
        let c = cmd(0b0001, [0, 0, 0, 0]);
        arb.tick(&cycle(&[(6, c)]));
        arb.tick(&cycle(&[(0, c), (1, c), (4, c)]));
        // 0 and 1 sit in the tail of 6, 4 is clear of it
        assert_eq!(arb.allowed_phases(), 0b1111_1100);
        for phase in 0..NP {
            assert_eq!(arb.allowed(phase), arb.allowed_phases() >> phase & 1 == 1);
        }
        arb.tick(&cycle(&[]));
        assert_eq!(arb.suppressed_commands(), 2);
        assert_eq!(CommandArbiter::new(NP, false).allowed_phases(), 0xff);
    }

    #[test]
    fn dropped_command_does_not_block_later_one() {
        // 0 occupies 0..4, 2 is dropped, 4 no longer overlaps anything
        let mut arb = CommandArbiter::new(NP, true);
        let c = cmd(0b0001, [0, 0, 0, 0]);
        let bus = run(&mut arb, &[(0, c), (2, c), (4, c)]);
        assert_eq!(bus.cs, 0b0001_0001);
    }
}
