// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! PHY wrapper adding one 2:1 serialization stage, for targets whose
//! hardware serializers only reach half the 16:1 ratio.
//!
//! The wrapped PHY is built with the extra ser/des latency, so the
//! controller sees consistent settings. Each step produces two pad
//! samples at twice the controller clock, each half as wide.

use indexmap::IndexMap;
use crate::config::PhyConfig;
use crate::delay::TappedDelayLine;
use crate::dfi::DfiPhase;
use crate::error::PhyError;
use crate::latency::PhyLatency;
use crate::pads::{PadLane, PhyInput, PhyOutput};
use crate::phy::Lpddr4Phy;
use crate::serdes::{Deserializer, Serializer};
use crate::timing::{Mt53e256m16d1, PhySettings, TimingTable};
use crate::NPHASES;

pub struct DoubleRatePhy {
    inner: Lpddr4Phy,
    ser: IndexMap<PadLane, Serializer>,
    des: IndexMap<PadLane, Deserializer>,
    dmi_oe: TappedDelayLine<bool>,
    dq_oe: TappedDelayLine<bool>,
    dqs_oe: TappedDelayLine<bool>,
}

impl DoubleRatePhy {
    pub fn new(config: PhyConfig) -> Result<DoubleRatePhy, PhyError> {
        Self::with_timing_table(config, &Mt53e256m16d1)
    }

    pub fn with_timing_table(
        config: PhyConfig, table: &dyn TimingTable
    ) -> Result<DoubleRatePhy, PhyError> {
        let reset_value = config.serdes_reset_value;
        let databits = config.databits;
        let inner_config = PhyConfig {
            ser_latency: config.ser_latency + PhyLatency::cycles(Serializer::LATENCY),
            des_latency: config.des_latency + PhyLatency::cycles(Deserializer::LATENCY),
            ..config
        };
        let inner = Lpddr4Phy::with_timing_table(inner_config, table)?;

        let half = NPHASES / 2;
        let ser = PhyOutput::new(half, databits).lanes().into_iter()
            .map(|lane| (lane, Serializer::new(lane.width(half), reset_value)))
            .collect();
        let des = PhyInput::new(databits).lanes().into_iter()
            .map(|lane| (lane, Deserializer::new(lane.width(half), reset_value)))
            .collect();
        // output enables start low, only the ser/des data carries the reset fill
        let oe = || TappedDelayLine::new(Serializer::LATENCY);
        Ok(DoubleRatePhy {
            inner, ser, des,
            dmi_oe: oe(),
            dq_oe: oe(),
            dqs_oe: oe(),
        })
    }

    #[inline]
    pub fn settings(&self) -> &PhySettings {
        self.inner.settings()
    }

    #[inline]
    pub fn inner(&self) -> &Lpddr4Phy {
        &self.inner
    }

    #[inline]
    pub fn inner_mut(&mut self) -> &mut Lpddr4Phy {
        &mut self.inner
    }

    /// Advance one controller cycle. `pads` are the two samples of
    /// the doubled clock, in time order.
    pub fn step(&mut self, dfi: &mut [DfiPhase], pads: &[PhyInput; 2]) -> [PhyOutput; 2] {
        let databits = self.inner.config().databits;
        let mut inner_pads = PhyInput::new(databits);
        for (&lane, des) in &self.des {
            if let Some(v) = inner_pads.lane_mut(lane) {
                *v = des.output();
            }
        }
        let inner_out = self.inner.step(dfi, &inner_pads);

        let mut out = [
            PhyOutput::new(NPHASES / 2, databits),
            PhyOutput::new(NPHASES / 2, databits),
        ];
        for (&lane, ser) in &self.ser {
            let halves = ser.output();
            for (o, half) in out.iter_mut().zip(halves) {
                *o.lane_mut(lane) = half;
            }
        }
        for o in out.iter_mut() {
            o.dmi_oe = self.dmi_oe.output();
            o.dq_oe = self.dq_oe.output();
            o.dqs_oe = self.dqs_oe.output();
        }

        for (&lane, ser) in self.ser.iter_mut() {
            ser.tick(inner_out.lane(lane));
        }
        for (&lane, des) in self.des.iter_mut() {
            des.tick([
                pads[0].lane(lane).unwrap_or(0),
                pads[1].lane(lane).unwrap_or(0),
            ]);
        }
        self.dmi_oe.tick(inner_out.dmi_oe);
        self.dq_oe.tick(inner_out.dq_oe);
        self.dqs_oe.tick(inner_out.dqs_oe);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfi::CommandSlot;

    #[test]
    fn latencies_include_serdes() {
        let single = Lpddr4Phy::new(PhyConfig::new(100_000_000)).unwrap();
        let double = DoubleRatePhy::new(PhyConfig::new(100_000_000)).unwrap();
        let (s, d) = (single.settings(), double.settings());
        assert_eq!(d.read_latency, s.read_latency + Serializer::LATENCY + Deserializer::LATENCY);
        assert_eq!(d.write_latency, s.write_latency);
        assert_eq!((d.rdphase, d.wrphase), (s.rdphase, s.wrphase));
    }

    #[test]
    fn command_is_split_over_two_samples() {
        let mut phy = DoubleRatePhy::new(PhyConfig::new(100_000_000)).unwrap();
        let pads = [PhyInput::new(16), PhyInput::new(16)];
        let mut dfi = vec![DfiPhase::default(); NPHASES];
        dfi[5].command = CommandSlot::single(0, 0);
        let mut outs = Vec::new();
        for _ in 0..4 {
            outs.push(phy.step(&mut dfi, &pads));
            dfi = vec![DfiPhase::default(); NPHASES];
        }
        // one cycle in the arbiter, one in the serializer
        assert_eq!(outs[2][0].cs, 0);
        assert_eq!(outs[2][1].cs, 1 << 1);
        assert_eq!(outs[1][1].cs, 0);
        assert_eq!(outs[2][0].clk, 0x55);
        assert_eq!(outs[3][1].cs, 0);
    }

    #[test]
    fn reset_value_fills_serdes_only() {
        let cfg = PhyConfig::new(100_000_000)
            .with_serdes_reset_value(true)
            .with_masked_write(true);
        let mut phy = DoubleRatePhy::new(cfg).unwrap();
        let pads = [PhyInput::new(16), PhyInput::new(16)];
        let mut dfi = vec![DfiPhase::default(); NPHASES];
        let out = phy.step(&mut dfi, &pads);
        for o in &out {
            assert_eq!(o.cs, 0xf);
            assert!(!o.dq_oe && !o.dqs_oe && !o.dmi_oe);
        }
        // the enables stay low while nothing is written
        let mut dfi = vec![DfiPhase::default(); NPHASES];
        let out = phy.step(&mut dfi, &pads);
        assert!(out.iter().all(|o| !o.dq_oe && !o.dqs_oe && !o.dmi_oe));
    }
}
