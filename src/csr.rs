// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Calibration control inputs.
//!
//! Levels hold their value until changed. Pulses are set with
//! [`Pulse::fire`] and read as high by exactly one following step.

/// A one-shot control input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pending: bool,
}

impl Pulse {
    #[inline]
    pub fn fire(&mut self) {
        self.pending = true;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// read and clear.
    #[inline]
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

/// Control pulses of a set of bitslips.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BitslipCtrl {
    pub rst: Pulse,
    pub inc: Pulse,
}

/// Calibration values sampled once at the start of a step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSample {
    pub rst: bool,
    pub wlevel_en: bool,
    pub wlevel_strobe: bool,
    pub dly_sel: u64,
    pub rdly_rst: bool,
    pub rdly_inc: bool,
    pub wdly_rst: bool,
    pub wdly_inc: bool,
}

impl CalibrationSample {
    #[inline]
    fn selected(&self, byte: usize) -> bool {
        self.dly_sel >> byte & 1 == 1
    }

    /// reset of the read bitslips of byte lane `byte`.
    #[inline]
    pub fn read_rst(&self, byte: usize) -> bool {
        (self.selected(byte) && self.rdly_rst) || self.rst
    }

    #[inline]
    pub fn read_slip(&self, byte: usize) -> bool {
        self.selected(byte) && self.rdly_inc
    }

    #[inline]
    pub fn write_rst(&self, byte: usize) -> bool {
        (self.selected(byte) && self.wdly_rst) || self.rst
    }

    #[inline]
    pub fn write_slip(&self, byte: usize) -> bool {
        self.selected(byte) && self.wdly_inc
    }
}

/// Registers software uses to calibrate the PHY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationRegs {
    /// reset all bitslips while high.
    pub rst: bool,
    pub wlevel_en: bool,
    pub wlevel_strobe: Pulse,
    /// byte lanes the bitslip pulses apply to, one bit each.
    pub dly_sel: u64,
    pub rdly: BitslipCtrl,
    pub wdly: BitslipCtrl,
    /// phases the controller should use, readable by software.
    pub rdphase: usize,
    pub wrphase: usize,
}

impl CalibrationRegs {
    pub fn new(rdphase: usize, wrphase: usize) -> Self {
        CalibrationRegs {
            rst: false,
            wlevel_en: false,
            wlevel_strobe: Pulse::default(),
            dly_sel: 0,
            rdly: BitslipCtrl::default(),
            wdly: BitslipCtrl::default(),
            rdphase, wrphase,
        }
    }

    /// Take this step's view of the registers, consuming pulses.
    pub fn sample(&mut self) -> CalibrationSample {
        CalibrationSample {
            rst: self.rst,
            wlevel_en: self.wlevel_en,
            wlevel_strobe: self.wlevel_strobe.take(),
            dly_sel: self.dly_sel,
            rdly_rst: self.rdly.rst.take(),
            rdly_inc: self.rdly.inc.take(),
            wdly_rst: self.wdly.rst.take(),
            wdly_inc: self.wdly.inc.take(),
        }
    }
}
