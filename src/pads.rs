// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Unserialized pad signals.
//!
//! Every lane carries one controller cycle worth of bits, bit 0 sent
//! first. Lanes toggling on both DRAM clock edges (clk, dq, dqs, dmi)
//! have `2 * nphases` bits, the others `nphases`. A concrete PHY
//! serializes these onto the pins.

use std::fmt;
use crate::dfi::CA_BITS;

/// Names one lane of a [`PhyOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PadLane {
    Clk,
    Cke,
    Odt,
    ResetN,
    Cs,
    Ca(usize),
    Dmi(usize),
    Dq(usize),
    Dqs(usize),
}

impl PadLane {
    /// whether the lane changes on both clock edges.
    #[inline]
    pub fn double_rate(self) -> bool {
        use PadLane::*;
        matches!(self, Clk | Dmi(_) | Dq(_) | Dqs(_))
    }

    /// bits carried per controller cycle.
    #[inline]
    pub fn width(self, nphases: usize) -> usize {
        match self.double_rate() {
            true => 2 * nphases,
            false => nphases,
        }
    }
}

impl fmt::Display for PadLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PadLane::*;
        match self {
            Clk => write!(f, "clk"),
            Cke => write!(f, "cke"),
            Odt => write!(f, "odt"),
            ResetN => write!(f, "reset_n"),
            Cs => write!(f, "cs"),
            Ca(i) => write!(f, "ca{}", i),
            Dmi(i) => write!(f, "dmi{}", i),
            Dq(i) => write!(f, "dq{}", i),
            Dqs(i) => write!(f, "dqs{}", i),
        }
    }
}

/// Pad values driven by the PHY in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhyOutput {
    pub nphases: usize,
    pub clk: u64,
    pub cke: u64,
    pub odt: u64,
    pub reset_n: u64,
    pub cs: u64,
    pub ca: [u64; CA_BITS],
    pub dmi_o: Vec<u64>,
    pub dmi_oe: bool,
    pub dq_o: Vec<u64>,
    pub dq_oe: bool,
    pub dqs_o: Vec<u64>,
    pub dqs_oe: bool,
}

impl PhyOutput {
    pub fn new(nphases: usize, databits: usize) -> Self {
        PhyOutput {
            nphases,
            clk: 0, cke: 0, odt: 0, reset_n: 0, cs: 0,
            ca: [0; CA_BITS],
            dmi_o: vec![0; databits / 8],
            dmi_oe: false,
            dq_o: vec![0; databits],
            dq_oe: false,
            dqs_o: vec![0; databits / 8],
            dqs_oe: false,
        }
    }

    /// All output lanes, in a fixed order.
    pub fn lanes(&self) -> Vec<PadLane> {
        let mut lanes = vec![
            PadLane::Clk, PadLane::Cke, PadLane::Odt,
            PadLane::ResetN, PadLane::Cs,
        ];
        lanes.extend((0..CA_BITS).map(PadLane::Ca));
        lanes.extend((0..self.dmi_o.len()).map(PadLane::Dmi));
        lanes.extend((0..self.dq_o.len()).map(PadLane::Dq));
        lanes.extend((0..self.dqs_o.len()).map(PadLane::Dqs));
        lanes
    }

    pub fn lane(&self, lane: PadLane) -> u64 {
        use PadLane::*;
        match lane {
            Clk => self.clk,
            Cke => self.cke,
            Odt => self.odt,
            ResetN => self.reset_n,
            Cs => self.cs,
            Ca(i) => self.ca[i],
            Dmi(i) => self.dmi_o[i],
            Dq(i) => self.dq_o[i],
            Dqs(i) => self.dqs_o[i],
        }
    }

    pub fn lane_mut(&mut self, lane: PadLane) -> &mut u64 {
        use PadLane::*;
        match lane {
            Clk => &mut self.clk,
            Cke => &mut self.cke,
            Odt => &mut self.odt,
            ResetN => &mut self.reset_n,
            Cs => &mut self.cs,
            Ca(i) => &mut self.ca[i],
            Dmi(i) => &mut self.dmi_o[i],
            Dq(i) => &mut self.dq_o[i],
            Dqs(i) => &mut self.dqs_o[i],
        }
    }

    /// Output enable of a lane. Command and clock lanes are always
    /// driven.
    pub fn lane_oe(&self, lane: PadLane) -> bool {
        use PadLane::*;
        match lane {
            Dmi(_) => self.dmi_oe,
            Dq(_) => self.dq_oe,
            Dqs(_) => self.dqs_oe,
            _ => true,
        }
    }
}

/// Pad values sampled by the PHY in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhyInput {
    pub dmi_i: Vec<u64>,
    pub dq_i: Vec<u64>,
    pub dqs_i: Vec<u64>,
}

impl PhyInput {
    pub fn new(databits: usize) -> Self {
        PhyInput {
            dmi_i: vec![0; databits / 8],
            dq_i: vec![0; databits],
            dqs_i: vec![0; databits / 8],
        }
    }

    /// Sample back what `out` drives, as if the pads were shorted.
    /// Lanes not driven read as 0.
    pub fn loopback(out: &PhyOutput) -> Self {
        let gate = |oe: bool, v: &Vec<u64>| -> Vec<u64> {
            v.iter().map(|&w| if oe { w } else { 0 }).collect()
        };
        PhyInput {
            dmi_i: gate(out.dmi_oe, &out.dmi_o),
            dq_i: gate(out.dq_oe, &out.dq_o),
            dqs_i: gate(out.dqs_oe, &out.dqs_o),
        }
    }

    /// input lanes, paired with the corresponding output lane names.
    pub fn lanes(&self) -> Vec<PadLane> {
        let mut lanes = Vec::new();
        lanes.extend((0..self.dmi_i.len()).map(PadLane::Dmi));
        lanes.extend((0..self.dq_i.len()).map(PadLane::Dq));
        lanes.extend((0..self.dqs_i.len()).map(PadLane::Dqs));
        lanes
    }

    /// `None` for output-only lanes and lanes beyond the bundle width.
    pub fn lane_mut(&mut self, lane: PadLane) -> Option<&mut u64> {
        use PadLane::*;
        match lane {
            Dmi(i) => self.dmi_i.get_mut(i),
            Dq(i) => self.dq_i.get_mut(i),
            Dqs(i) => self.dqs_i.get_mut(i),
            _ => None,
        }
    }

    pub fn lane(&self, lane: PadLane) -> Option<u64> {
        use PadLane::*;
        match lane {
            Dmi(i) => self.dmi_i.get(i).copied(),
            Dq(i) => self.dq_i.get(i).copied(),
            Dqs(i) => self.dqs_i.get(i).copied(),
            _ => None,
        }
    }
}
