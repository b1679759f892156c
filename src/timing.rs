// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Timing resolution.
//!
//! Given the controller clock, the DRAM CAS latencies are looked up
//! from a frequency table and turned into whole-cycle latencies and
//! the phase offsets the controller must use to issue reads and
//! writes so that data lands aligned on its clock.

use compact_str::CompactString;
use crate::error::PhyError;
use crate::latency::PhyLatency;
use crate::NPHASES;

/// Commands read from the phase adapters are delayed by one cycle
/// on the constant bitslips before reaching the CA pads.
pub const CA_LATENCY: usize = 1;

/// Latency of the bitslip buffers (data is delayed between `cycles`
/// and `cycles + 1` controller cycles).
pub const BITSLIP_CYCLES: usize = 1;

/// Default number of fast ticks a command occupies on the bus. CL/CWL
/// are counted from its last bit.
///
/// It is unclear whether 3 should be used instead, hence the
/// override in [`crate::config::PhyConfig`].
pub const DEFAULT_CMD_LATENCY: usize = 4;

/// One row of a CAS latency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingEntry {
    /// highest supported data rate for this row, in transfers/s.
    pub max_data_rate: u64,
    /// CAS latency in DRAM clock ticks.
    pub cl: usize,
    /// CAS write latency in DRAM clock ticks.
    pub cwl: usize,
}

/// A frequency-indexed CL/CWL table.
///
/// Entries must be ordered by ascending data rate.
pub trait TimingTable {
    fn entries(&self) -> &[TimingEntry];

    /// Pick the first entry whose data rate covers the DRAM clock
    /// derived from `sys_clk_freq` and `nphases`.
    ///
    /// `tck = 1 / (nphases * sys_clk_freq)` is accepted by a row of rate
    /// `f` when `tck >= 2 / f`, which is compared here without floats.
    /// A zero clock has no `tck` and a data rate beyond `u64` covers no
    /// row, so both give `None`.
    fn lookup(&self, sys_clk_freq: u64, nphases: usize) -> Option<TimingEntry> {
        if sys_clk_freq == 0 {
            return None
        }
        let data_rate = (2 * nphases as u64).checked_mul(sys_clk_freq)?;
        self.entries().iter()
            .find(|e| e.max_data_rate >= data_rate)
            .copied()
    }
}

/// MT53E256M16D1, no DBI, set A.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mt53e256m16d1;

const MT53E256M16D1_ENTRIES: [TimingEntry; 8] = [
    TimingEntry { max_data_rate:  532_000_000, cl:  6, cwl:  4 },
    TimingEntry { max_data_rate: 1066_000_000, cl: 10, cwl:  6 },
    TimingEntry { max_data_rate: 1600_000_000, cl: 14, cwl:  8 },
    TimingEntry { max_data_rate: 2132_000_000, cl: 20, cwl: 10 },
    TimingEntry { max_data_rate: 2666_000_000, cl: 24, cwl: 12 },
    TimingEntry { max_data_rate: 3200_000_000, cl: 28, cwl: 14 },
    TimingEntry { max_data_rate: 3732_000_000, cl: 32, cwl: 16 },
    TimingEntry { max_data_rate: 4266_000_000, cl: 36, cwl: 18 },
];

impl TimingTable for Mt53e256m16d1 {
    fn entries(&self) -> &[TimingEntry] {
        &MT53E256M16D1_ENTRIES
    }
}

/// Whole controller cycles needed to cover `cas_latency` ticks.
#[inline]
pub fn sys_latency(nphases: usize, cas_latency: usize) -> isize {
    ((cas_latency + nphases - 1) / nphases) as isize
}

/// Phase within the controller cycle at which a command must be
/// issued so that `cas_latency` ticks later ends on a cycle boundary.
///
/// Negative results mean one more whole cycle is needed, see
/// [`borrow_cycles`].
#[inline]
pub fn sys_phase(nphases: usize, sys_latency: isize, cas_latency: usize) -> isize {
    sys_latency * nphases as isize - cas_latency as isize
}

/// Lift a negative phase into `[0, nphases)` by borrowing whole
/// cycles from the latency.
pub fn borrow_cycles(nphases: usize, mut phase: isize, mut sys_latency: isize) -> (isize, isize) {
    while phase < 0 {
        phase += nphases as isize;
        sys_latency += 1;
    }
    (phase, sys_latency)
}

/// Inputs of the timing resolution.
#[derive(Debug, Clone, Copy)]
pub struct TimingRequest {
    pub sys_clk_freq: u64,
    pub ser_latency: PhyLatency,
    pub des_latency: PhyLatency,
    pub cmd_latency: usize,
}

/// Latency constants fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTiming {
    pub cl: usize,
    pub cwl: usize,
    pub cl_sys_latency: usize,
    pub cwl_sys_latency: usize,
    pub rdphase: usize,
    pub wrphase: usize,
    pub read_latency: usize,
    pub write_latency: usize,
    pub cmd_latency: usize,
    /// index of the write-enable delay line tap driving DQ output enable.
    pub wrtap: usize,
}

/// Resolve every latency constant of an LPDDR4 PHY running
/// `NPHASES` phases per controller cycle.
pub fn resolve(
    table: &dyn TimingTable,
    req: &TimingRequest,
) -> Result<ResolvedTiming, PhyError> {
    let nphases = NPHASES;
    let entry = table.lookup(req.sys_clk_freq, nphases).ok_or(
        PhyError::UnsupportedTiming {
            sys_clk_freq: req.sys_clk_freq,
            data_rate: (2 * nphases as u64).saturating_mul(req.sys_clk_freq),
        }
    )?;
    let (cl, cwl) = (entry.cl, entry.cwl);

    let cl_sys_latency = sys_latency(nphases, cl);
    let cwl_sys_latency = sys_latency(nphases, cwl);
    // reads see ser+des on top of CA, so the phase must absorb their
    // sub-cycle part to return data in phase with the sys clock.
    let rdphase = sys_phase(
        nphases, cl_sys_latency,
        cl + req.cmd_latency + req.ser_latency.fast() + req.des_latency.fast()
    );
    // ser latency applies equally to CA and DQ on writes.
    let wrphase = sys_phase(nphases, cwl_sys_latency, cwl + req.cmd_latency);

    let (wrphase, cwl_sys_latency) = borrow_cycles(nphases, wrphase, cwl_sys_latency);
    let (rdphase, cl_sys_latency) = borrow_cycles(nphases, rdphase, cl_sys_latency);

    // dfi cmd -> read data on DQ
    let read_data_delay = CA_LATENCY + req.ser_latency.sys() + cl_sys_latency as usize;
    // data on DQ -> dfi rddata
    let read_des_delay = req.des_latency.sys() + BITSLIP_CYCLES;
    let read_latency = read_data_delay + read_des_delay;

    let write_latency = cwl_sys_latency as usize;

    let wrtap = cwl_sys_latency - 1;
    if wrtap < 0 {
        return Err(PhyError::NegativeTapIndex { wrtap, cwl_sys_latency });
    }

    let timing = ResolvedTiming {
        cl, cwl,
        cl_sys_latency: cl_sys_latency as usize,
        cwl_sys_latency: cwl_sys_latency as usize,
        rdphase: rdphase as usize,
        wrphase: wrphase as usize,
        read_latency,
        write_latency,
        cmd_latency: req.cmd_latency,
        wrtap: wrtap as usize,
    };
    clilog::debug!("resolved timing for {} Hz: {:?}", req.sys_clk_freq, timing);
    Ok(timing)
}

/// The settings a memory controller needs to drive this PHY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhySettings {
    pub phytype: CompactString,
    pub memtype: CompactString,
    pub databits: usize,
    pub dfi_databits: usize,
    pub nranks: usize,
    pub nphases: usize,
    pub rdphase: usize,
    pub wrphase: usize,
    pub cl: usize,
    pub cwl: usize,
    pub read_latency: usize,
    pub write_latency: usize,
    pub cmd_latency: usize,
    pub cmd_delay: Option<usize>,
    pub cl_sys_latency: usize,
    pub cwl_sys_latency: usize,
    pub wrtap: usize,
}
