// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! The LPDDR4 PHY datapath.
//!
//! One [`Lpddr4Phy::step`] models one controller clock cycle. It
//! takes the controller phases for this cycle plus the pad values
//! sampled during it, writes read data back into the phases, and
//! returns the pad values to drive during this cycle.
//!
//! Inside a step all combinational values are computed from the
//! registered state first, then every register is clocked with this
//! cycle's inputs.

use crate::arbiter::CommandArbiter;
use crate::bitslip::BitSlip;
use crate::config::PhyConfig;
use crate::csr::{CalibrationRegs, CalibrationSample};
use crate::delay::TappedDelayLine;
use crate::dfi::{gather_lane, scatter_rddata, DfiPhase};
use crate::error::PhyError;
use crate::pads::{PhyInput, PhyOutput};
use crate::strobe::WriteControl;
use crate::timing::{self, Mt53e256m16d1, PhySettings, ResolvedTiming, TimingTable, BITSLIP_CYCLES};
use crate::NPHASES;

/// DRAM clock, toggling on every half tick.
pub const CLK_PATTERN: u64 = 0b0101_0101_0101_0101;

/// Per-lane bitslips of one direction.
#[derive(Debug, Clone)]
struct LaneSlips {
    slips: Vec<BitSlip>,
    /// byte lane of each slip, selecting its calibration controls.
    bytes: Vec<usize>,
}

impl LaneSlips {
    fn new(bytes: impl IntoIterator<Item = usize>) -> Self {
        let bytes: Vec<usize> = bytes.into_iter().collect();
        LaneSlips {
            slips: bytes.iter().map(|_| BitSlip::new(2 * NPHASES, BITSLIP_CYCLES)).collect(),
            bytes,
        }
    }

    #[inline]
    fn output(&self, lane: usize) -> u64 {
        self.slips[lane].output()
    }

    fn tick(
        &mut self,
        inputs: impl Iterator<Item = u64>,
        rst: impl Fn(usize) -> bool,
        slp: impl Fn(usize) -> bool,
    ) {
        for ((bs, &byte), i) in self.slips.iter_mut().zip(self.bytes.iter()).zip(inputs) {
            bs.tick(i, rst(byte), slp(byte));
        }
    }
}

/// Concatenate a per-phase flag into a lane word.
fn concat_phases(dfi: &[DfiPhase], field: impl Fn(&DfiPhase) -> bool) -> u64 {
    dfi.iter().enumerate()
        .fold(0, |acc, (i, p)| acc | (field(p) as u64) << i)
}

pub struct Lpddr4Phy {
    config: PhyConfig,
    timing: ResolvedTiming,
    settings: PhySettings,
    csr: CalibrationRegs,
    arbiter: CommandArbiter,
    cke: TappedDelayLine<u64>,
    odt: TappedDelayLine<u64>,
    reset_n: TappedDelayLine<u64>,
    dq_wr: LaneSlips,
    dq_rd: LaneSlips,
    dqs_wr: LaneSlips,
    /// empty when masked writes are off.
    dmi_wr: LaneSlips,
    rddata_en: TappedDelayLine<bool>,
    wrdata_en: WriteControl,
    dq_oe: TappedDelayLine<bool>,
    dqs_oe: TappedDelayLine<bool>,
    cycle: u64,
}

impl Lpddr4Phy {
    /// Build a PHY using the MT53E256M16D1 timings.
    pub fn new(config: PhyConfig) -> Result<Lpddr4Phy, PhyError> {
        Self::with_timing_table(config, &Mt53e256m16d1)
    }

    pub fn with_timing_table(
        config: PhyConfig, table: &dyn TimingTable
    ) -> Result<Lpddr4Phy, PhyError> {
        config.validate()?;
        let timing = timing::resolve(table, &config.timing_request())?;
        let databits = config.databits;
        let nbytes = config.nbytes();

        let settings = PhySettings {
            phytype: config.phytype.clone(),
            memtype: "LPDDR4".into(),
            databits,
            dfi_databits: 2 * databits,
            nranks: 1,
            nphases: NPHASES,
            rdphase: timing.rdphase,
            wrphase: timing.wrphase,
            cl: timing.cl,
            cwl: timing.cwl,
            read_latency: timing.read_latency,
            write_latency: timing.write_latency,
            cmd_latency: timing.cmd_latency,
            cmd_delay: config.cmd_delay,
            cl_sys_latency: timing.cl_sys_latency,
            cwl_sys_latency: timing.cwl_sys_latency,
            wrtap: timing.wrtap,
        };
        clilog::info!(
            "{} settings: cl={} cwl={} rdphase={} wrphase={} \
             read_latency={} write_latency={}",
            settings.phytype, settings.cl, settings.cwl,
            settings.rdphase, settings.wrphase,
            settings.read_latency, settings.write_latency);
        if !config.mask_overlapping_commands {
            clilog::warn!(
                PHY_OVERLAP_UNMASKED,
                "command overlap masking disabled, the controller \
                 must keep commands at least 4 ticks apart");
        }

        Ok(Lpddr4Phy {
            csr: CalibrationRegs::new(timing.rdphase, timing.wrphase),
            arbiter: CommandArbiter::new(NPHASES, config.mask_overlapping_commands),
            cke: TappedDelayLine::new(1),
            odt: TappedDelayLine::new(1),
            reset_n: TappedDelayLine::new(1),
            dq_wr: LaneSlips::new((0..databits).map(|bit| bit / 8)),
            dq_rd: LaneSlips::new((0..databits).map(|bit| bit / 8)),
            dqs_wr: LaneSlips::new(0..nbytes),
            dmi_wr: match config.masked_write {
                true => LaneSlips::new(0..nbytes),
                false => LaneSlips::new(0..0),
            },
            rddata_en: TappedDelayLine::new(timing.read_latency),
            wrdata_en: WriteControl::new(timing.wrtap),
            dq_oe: TappedDelayLine::new(1),
            dqs_oe: TappedDelayLine::new(1),
            cycle: 0,
            config, timing, settings,
        })
    }

    #[inline]
    pub fn settings(&self) -> &PhySettings {
        &self.settings
    }

    #[inline]
    pub fn timing(&self) -> &ResolvedTiming {
        &self.timing
    }

    #[inline]
    pub fn config(&self) -> &PhyConfig {
        &self.config
    }

    #[inline]
    pub fn csr(&self) -> &CalibrationRegs {
        &self.csr
    }

    #[inline]
    pub fn csr_mut(&mut self) -> &mut CalibrationRegs {
        &mut self.csr
    }

    /// Commands dropped so far for overlapping an earlier one.
    #[inline]
    pub fn suppressed_commands(&self) -> u64 {
        self.arbiter.suppressed_commands()
    }

    /// current slip of the read bitslip of a DQ lane.
    #[inline]
    pub fn read_slip(&self, bit: usize) -> usize {
        self.dq_rd.slips[bit].slip()
    }

    #[inline]
    pub fn write_slip(&self, bit: usize) -> usize {
        self.dq_wr.slips[bit].slip()
    }

    /// number of completed steps.
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Advance one controller cycle.
    pub fn step(&mut self, dfi: &mut [DfiPhase], pads: &PhyInput) -> PhyOutput {
        assert_eq!(dfi.len(), NPHASES, "expected one record per phase");
        assert_eq!(pads.dq_i.len(), self.config.databits);
        let cal = self.csr.sample();
        self.trace_calibration(&cal);
        let databits = self.config.databits;
        let nbytes = self.config.nbytes();

        // pads, from registered state
        let mut out = PhyOutput::new(NPHASES, databits);
        out.clk = CLK_PATTERN;
        out.cke = self.cke.output();
        out.odt = self.odt.output();
        out.reset_n = self.reset_n.output();
        let bus = self.arbiter.output();
        out.cs = bus.cs;
        out.ca = bus.ca;
        for bit in 0..databits {
            out.dq_o[bit] = self.dq_wr.output(bit);
        }
        out.dq_oe = self.dq_oe.output();
        for byte in 0..nbytes {
            out.dqs_o[byte] = self.dqs_wr.output(byte);
        }
        out.dqs_oe = self.dqs_oe.output();
        if self.config.masked_write {
            for byte in 0..nbytes {
                out.dmi_o[byte] = self.dmi_wr.output(byte);
            }
            out.dmi_oe = out.dq_oe;
        }

        // read data back to the controller
        let rddata_valid = self.rddata_en.output() || cal.wlevel_en;
        for p in dfi.iter_mut() {
            p.rddata_valid = rddata_valid;
        }
        for bit in 0..databits {
            scatter_rddata(dfi, databits, bit, self.dq_rd.output(bit));
        }

        // write control
        let wrdata_en = dfi.iter().any(|p| p.wrdata_en);
        let rddata_en = dfi.iter().any(|p| p.rddata_en);
        let frame = self.wrdata_en.frame(wrdata_en, cal.wlevel_en);
        let dqs = self.config.dqs_patterns.word(&frame, cal.wlevel_en, cal.wlevel_strobe);

        // clock every register
        self.cke.tick(concat_phases(dfi, |p| p.cke));
        self.odt.tick(concat_phases(dfi, |p| p.odt));
        self.reset_n.tick(concat_phases(dfi, |p| p.reset_n));
        self.arbiter.tick(dfi);

        let dfi_ref: &[DfiPhase] = dfi;
        self.dq_wr.tick(
            (0..databits).map(|bit| gather_lane(dfi_ref, |p| p.wrdata, databits, bit)),
            |b| cal.write_rst(b), |b| cal.write_slip(b));
        self.dqs_wr.tick(
            std::iter::repeat(dqs),
            |b| cal.write_rst(b), |b| cal.write_slip(b));
        self.dmi_wr.tick(
            (0..nbytes).map(|byte| gather_lane(dfi_ref, |p| p.wrdata_mask as u64, nbytes, byte)),
            |b| cal.write_rst(b), |b| cal.write_slip(b));
        self.dq_rd.tick(
            pads.dq_i.iter().copied(),
            |b| cal.read_rst(b), |b| cal.read_slip(b));

        self.rddata_en.tick(rddata_en);
        self.wrdata_en.tick(wrdata_en);
        self.dq_oe.tick(frame.dq_oe);
        self.dqs_oe.tick(frame.dqs_oe);
        self.cycle += 1;
        out
    }

    fn trace_calibration(&self, cal: &CalibrationSample) {
        if cal.rdly_inc || cal.wdly_inc || cal.rdly_rst || cal.wdly_rst {
            clilog::trace!(
                "cycle {}: bitslip control dly_sel={:#b} rd(rst={}, inc={}) wr(rst={}, inc={})",
                self.cycle, cal.dly_sel, cal.rdly_rst, cal.rdly_inc,
                cal.wdly_rst, cal.wdly_inc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfi::CommandSlot;

    fn phy() -> Lpddr4Phy {
        Lpddr4Phy::new(PhyConfig::new(100_000_000)).unwrap()
    }

    fn idle() -> Vec<DfiPhase> {
        vec![DfiPhase::default(); NPHASES]
    }

    #[test]
    fn settings_at_100mhz() {
        let phy = phy();
        let s = phy.settings();
        assert_eq!((s.cl, s.cwl), (14, 8));
        assert_eq!((s.rdphase, s.wrphase), (6, 4));
        assert_eq!((s.read_latency, s.write_latency), (5, 2));
        assert_eq!(s.dfi_databits, 32);
        assert_eq!(s.memtype, "LPDDR4");
        assert_eq!(phy.csr().rdphase, 6);
    }

    #[test]
    fn invalid_width_is_rejected() {
        let err = Lpddr4Phy::new(PhyConfig::new(100_000_000).with_databits(12)).err();
        assert!(matches!(err, Some(PhyError::InvalidLaneWidth { databits: 12, .. })));
    }

    #[test]
    fn out_of_range_clocks_are_rejected() {
        for f in [0, u64::MAX / 8, u64::MAX] {
            let err = Lpddr4Phy::new(PhyConfig::new(f)).err();
            assert!(matches!(err, Some(PhyError::UnsupportedTiming { sys_clk_freq, .. })
                             if sys_clk_freq == f), "sys clk {}", f);
        }
    }

    #[test]
    fn clock_and_controls() {
        let mut phy = phy();
        let pads = PhyInput::new(16);
        let mut dfi = idle();
        for (i, p) in dfi.iter_mut().enumerate() {
            p.cke = true;
            p.reset_n = i % 2 == 0;
        }
        let out = phy.step(&mut dfi, &pads);
        assert_eq!(out.clk, CLK_PATTERN);
        assert_eq!(out.cke, 0);
        let out = phy.step(&mut idle(), &pads);
        assert_eq!(out.cke, 0xff);
        assert_eq!(out.reset_n, 0b0101_0101);
        assert_eq!(out.odt, 0);
    }

    #[test]
    fn command_reaches_bus_one_cycle_later() {
        let mut phy = phy();
        let pads = PhyInput::new(16);
        let mut dfi = idle();
        dfi[3].command = CommandSlot::single(0b010010, 0b000001);
        phy.step(&mut dfi, &pads);
        let out = phy.step(&mut idle(), &pads);
        assert_eq!(out.cs, 1 << 3);
        assert_eq!(out.ca[0], 1 << 4);
        assert_eq!(out.ca[1], 1 << 3);
        assert_eq!(out.ca[4], 1 << 3);
    }

    #[test]
    fn read_valid_follows_read_latency() {
        let mut phy = phy();
        let pads = PhyInput::new(16);
        let latency = phy.settings().read_latency;
        let mut valid = Vec::new();
        for t in 0..12 {
            let mut dfi = idle();
            dfi[phy.settings().rdphase].rddata_en = t == 2;
            phy.step(&mut dfi, &pads);
            valid.push(dfi[0].rddata_valid);
        }
        let at: Vec<usize> = valid.iter().enumerate().filter(|(_, &v)| v).map(|(i, _)| i).collect();
        assert_eq!(at, vec![2 + latency]);
    }

    #[test]
    fn write_leveling_holds_valid_and_strobes_dqs() {
        let mut phy = phy();
        let pads = PhyInput::new(16);
        phy.csr_mut().wlevel_en = true;
        phy.csr_mut().wlevel_strobe.fire();
        let mut dfi = idle();
        phy.step(&mut dfi, &pads);
        assert!(dfi.iter().all(|p| p.rddata_valid));
        let out = phy.step(&mut idle(), &pads);
        assert!(out.dqs_oe && !out.dq_oe);
        assert_eq!(out.dqs_o, vec![1, 1]);
        let out = phy.step(&mut idle(), &pads);
        assert_eq!(out.dqs_o, vec![0, 0]);
    }

    #[test]
    fn dmi_follows_masked_write_flag() {
        for masked in [false, true] {
            let cfg = PhyConfig::new(100_000_000).with_masked_write(masked);
            let mut phy = Lpddr4Phy::new(cfg).unwrap();
            let pads = PhyInput::new(16);
            let mut outs = Vec::new();
            for t in 0..8 {
                let mut dfi = idle();
                if t == 0 {
                    dfi[0].wrdata_en = true;
                }
                if t == 2 {
                    // mask byte 1 of beat 0 in every phase
                    for p in dfi.iter_mut() {
                        p.wrdata_mask = 0b0010;
                    }
                }
                outs.push(phy.step(&mut dfi, &pads));
            }
            let oe: Vec<bool> = outs.iter().map(|o| o.dmi_oe).collect();
            if masked {
                assert_eq!(outs[3].dmi_o, vec![0, 0x5555]);
                assert_eq!(oe, outs.iter().map(|o| o.dq_oe).collect::<Vec<_>>());
                assert!(outs[3].dq_oe);
            }
            else {
                assert!(outs.iter().all(|o| o.dmi_o == vec![0, 0] && !o.dmi_oe));
            }
        }
    }
}
