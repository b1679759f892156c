// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Construction-time errors.
//!
//! Once a PHY is built the pipeline has no error path, so every
//! variant here is raised before the first step.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhyError {
    /// No timing table entry covers the requested clock.
    #[error("no CL/CWL entry for sys clock {sys_clk_freq} Hz (data rate {data_rate} MT/s)")]
    UnsupportedTiming { sys_clk_freq: u64, data_rate: u64 },
    /// Data width is not a whole number of byte lanes, or too wide.
    #[error("invalid data width {databits}: must be a non-zero multiple of 8 not above {max}")]
    InvalidLaneWidth { databits: usize, max: usize },
    /// The write tap would sit before the delay line input.
    #[error("write tap index {wrtap} is negative (cwl sys latency {cwl_sys_latency})")]
    NegativeTapIndex { wrtap: isize, cwl_sys_latency: isize },
}
