// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! PHY construction parameters.

use compact_str::CompactString;
use crate::error::PhyError;
use crate::latency::PhyLatency;
use crate::strobe::DqsPatterns;
use crate::timing::{TimingRequest, DEFAULT_CMD_LATENCY};
use crate::NPHASES;

/// Widest DQ bus a phase can carry: two beats must fit a `u64`.
pub const MAX_DATABITS: usize = 32;

/// Everything needed to build an [`Lpddr4Phy`](crate::phy::Lpddr4Phy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhyConfig {
    /// controller clock in Hz.
    pub sys_clk_freq: u64,
    pub databits: usize,
    /// latency of the serializers outside this model.
    pub ser_latency: PhyLatency,
    /// latency of the deserializers outside this model.
    pub des_latency: PhyLatency,
    pub phytype: CompactString,
    /// drive the write mask on DMI. When off DMI is never driven.
    pub masked_write: bool,
    /// fixed command delay reported to the controller.
    pub cmd_delay: Option<usize>,
    pub cmd_latency: usize,
    pub mask_overlapping_commands: bool,
    pub dqs_patterns: DqsPatterns,
    /// initial value of the rate-halving serdes registers.
    pub serdes_reset_value: bool,
}

impl PhyConfig {
    pub fn new(sys_clk_freq: u64) -> Self {
        PhyConfig {
            sys_clk_freq,
            databits: 16,
            ser_latency: PhyLatency::default(),
            des_latency: PhyLatency::default(),
            phytype: CompactString::new("LPDDR4PHY"),
            masked_write: true,
            cmd_delay: None,
            cmd_latency: DEFAULT_CMD_LATENCY,
            mask_overlapping_commands: true,
            dqs_patterns: DqsPatterns::default(),
            serdes_reset_value: false,
        }
    }

    pub fn with_databits(mut self, databits: usize) -> Self {
        self.databits = databits;
        self
    }

    pub fn with_ser_latency(mut self, latency: PhyLatency) -> Self {
        self.ser_latency = latency;
        self
    }

    pub fn with_des_latency(mut self, latency: PhyLatency) -> Self {
        self.des_latency = latency;
        self
    }

    pub fn with_phytype(mut self, phytype: impl Into<CompactString>) -> Self {
        self.phytype = phytype.into();
        self
    }

    pub fn with_masked_write(mut self, masked_write: bool) -> Self {
        self.masked_write = masked_write;
        self
    }

    pub fn with_cmd_delay(mut self, cmd_delay: Option<usize>) -> Self {
        self.cmd_delay = cmd_delay;
        self
    }

    pub fn with_cmd_latency(mut self, cmd_latency: usize) -> Self {
        self.cmd_latency = cmd_latency;
        self
    }

    pub fn with_overlap_masking(mut self, enable: bool) -> Self {
        self.mask_overlapping_commands = enable;
        self
    }

    pub fn with_dqs_patterns(mut self, patterns: DqsPatterns) -> Self {
        self.dqs_patterns = patterns;
        self
    }

    pub fn with_serdes_reset_value(mut self, value: bool) -> Self {
        self.serdes_reset_value = value;
        self
    }

    /// number of byte lanes, each with its own DMI and DQS pad.
    #[inline]
    pub fn nbytes(&self) -> usize {
        self.databits / 8
    }

    /// Check the lane widths.
    pub fn validate(&self) -> Result<(), PhyError> {
        if self.databits == 0 || self.databits % 8 != 0 || self.databits > MAX_DATABITS {
            return Err(PhyError::InvalidLaneWidth {
                databits: self.databits,
                max: MAX_DATABITS,
            })
        }
        Ok(())
    }

    pub(crate) fn timing_request(&self) -> TimingRequest {
        TimingRequest {
            sys_clk_freq: self.sys_clk_freq,
            ser_latency: self.ser_latency,
            des_latency: self.des_latency,
            cmd_latency: self.cmd_latency,
        }
    }

    #[inline]
    pub fn nphases(&self) -> usize {
        NPHASES
    }
}
