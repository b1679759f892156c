// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Waveform dump of the pad lanes.
//!
//! One VCD time unit is half a DRAM clock tick, the resolution of
//! the double rate lanes. Undriven data lanes are dumped as `z`.

use std::io::{self, Write};
use indexmap::IndexMap;
use vcd_ng::{IdCode, SimulationCommand, TimescaleUnit, Value, Writer};
use crate::pads::{PadLane, PhyOutput};

/// Half a DRAM clock period in picoseconds, or `None` when it is not a
/// positive `u32`.
pub fn half_tick_ps(sys_clk_freq: u64, nphases: usize) -> Option<u32> {
    let half_ticks_per_s = sys_clk_freq.checked_mul(2 * nphases as u64)?;
    if half_ticks_per_s == 0 {
        return None
    }
    match 1_000_000_000_000u64 / half_ticks_per_s {
        0 => None,
        ps => u32::try_from(ps).ok(),
    }
}

pub struct PadTrace<W: Write> {
    writer: Writer<W>,
    wires: IndexMap<PadLane, IdCode>,
    last: Vec<Option<Value>>,
    time: u64,
}

impl<W: Write> PadTrace<W> {
    /// Declare one wire per lane of `template` under `scope`.
    pub fn new(out: W, scope: &str, template: &PhyOutput, half_tick_ps: u32) -> io::Result<Self> {
        let mut writer = Writer::new(out);
        writer.timescale(half_tick_ps, TimescaleUnit::PS)?;
        writer.add_module(scope)?;
        let mut wires = IndexMap::new();
        for lane in template.lanes() {
            let id = writer.add_wire(1, &lane.to_string())?;
            wires.insert(lane, id);
        }
        writer.upscope()?;
        writer.enddefinitions()?;
        writer.begin(SimulationCommand::Dumpvars)?;
        let last = vec![None; wires.len()];
        Ok(PadTrace { writer, wires, last, time: 0 })
    }

    /// current time in half ticks.
    #[inline]
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Dump one cycle of pad values, bit by bit.
    pub fn record(&mut self, out: &PhyOutput) -> io::Result<()> {
        let half_ticks = 2 * out.nphases;
        for h in 0..half_ticks {
            let mut stamped = false;
            for (i, (&lane, &id)) in self.wires.iter().enumerate() {
                let pos = if lane.double_rate() { h } else { h / 2 };
                let value = match (out.lane_oe(lane), out.lane(lane) >> pos & 1) {
                    (false, _) => Value::Z,
                    (true, 1) => Value::V1,
                    (true, _) => Value::V0,
                };
                if self.last[i] == Some(value) {
                    continue
                }
                if !stamped {
                    self.writer.timestamp(self.time)?;
                    stamped = true;
                }
                self.last[i] = Some(value);
                self.writer.change_scalar(id, value)?;
            }
            self.time += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;
    use std::fs::File;
    use std::io::BufWriter;

    #[test]
    fn half_tick_at_100mhz() {
        assert_eq!(half_tick_ps(100_000_000, 8), Some(625));
    }

    #[test]
    fn half_tick_out_of_range() {
        assert_eq!(half_tick_ps(0, 8), None);
        assert_eq!(half_tick_ps(u64::MAX / 8, 8), None);
        // faster than one half tick per picosecond
        assert_eq!(half_tick_ps(1_000_000_000_000, 8), None);
        // 1 Hz gives 62.5 ms, beyond u32 picoseconds
        assert_eq!(half_tick_ps(1, 8), None);
    }

    #[test]
    fn dumps_only_changes() {
        let dir = TempDir::new("lpphy_vcd").unwrap();
        let path = dir.path().join("pads.vcd");
        let mut out = PhyOutput::new(8, 8);
        out.clk = 0x5555;
        out.cs = 0b1;
        {
            let f = BufWriter::new(File::create(&path).unwrap());
            let mut trace = PadTrace::new(f, "phy", &out, 625).unwrap();
            trace.record(&out).unwrap();
            out.cs = 0;
            trace.record(&out).unwrap();
            assert_eq!(trace.time(), 32);
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("$timescale"));
        assert!(text.contains(" clk "));
        assert!(text.contains(" dq7 "));
        assert!(text.contains("$enddefinitions"));
        assert!(text.contains("#0"));
        // cs falls after its first tick, clk toggles every half tick
        assert!(text.contains("#2\n"));
        assert!(text.contains("#31\n"));
        // nothing changes beyond the clock in the second cycle
        assert!(!text.contains("#32\n"));
    }
}
