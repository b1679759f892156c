// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Cycle model of an LPDDR4 PHY with an 8-phase controller
//! interface.

/// DRAM clock ticks per controller cycle.
pub const NPHASES: usize = 8;

pub mod error;

pub mod latency;

pub mod timing;

pub mod delay;

pub mod bitslip;

pub mod dfi;

pub mod arbiter;

pub mod strobe;

pub mod config;

pub mod csr;

pub mod pads;

pub mod phy;

pub mod serdes;

pub mod double_rate;

pub mod vcd;

pub use config::PhyConfig;
pub use double_rate::DoubleRatePhy;
pub use error::PhyError;
pub use phy::Lpddr4Phy;
