// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
use itertools::Itertools;
use lpphy::latency::PhyLatency;
use lpphy::timing::{Mt53e256m16d1, TimingTable};
use lpphy::{DoubleRatePhy, Lpddr4Phy, PhyConfig, NPHASES};

#[derive(clap::Parser, Debug)]
struct TimingArgs {
    /// Only resolve for this controller clock (Hz) instead of every
    /// table row.
    #[clap(long)]
    sys_clk_freq: Option<u64>,
    /// Serializer latency in DRAM ticks.
    #[clap(long, default_value_t = 0)]
    ser_ticks: usize,
    /// Deserializer latency in DRAM ticks.
    #[clap(long, default_value_t = 0)]
    des_ticks: usize,
    /// Command length in DRAM ticks.
    #[clap(long, default_value_t = 4)]
    cmd_latency: usize,
    /// Resolve for the rate-halving wrapper.
    #[clap(long)]
    double_rate: bool,
}

fn main() {
    clilog::init_stderr_color_debug();
    let args = <TimingArgs as clap::Parser>::parse();
    clilog::debug!("Timing args:\n{:#?}", args);

    let freqs = match args.sys_clk_freq {
        Some(f) => vec![f],
        None => Mt53e256m16d1.entries().iter()
            .map(|e| e.max_data_rate / (2 * NPHASES as u64))
            .collect()
    };
    clilog::info!("resolving for {} Hz", freqs.iter().format(", "));

    println!("{:>12} {:>4} {:>4} {:>8} {:>8} {:>8} {:>8}",
             "sys_clk", "cl", "cwl", "rdphase", "wrphase", "rd_lat", "wr_lat");
    let mut failed = false;
    for f in freqs {
        let config = PhyConfig::new(f)
            .with_ser_latency(PhyLatency::new(0, args.ser_ticks))
            .with_des_latency(PhyLatency::new(0, args.des_ticks))
            .with_cmd_latency(args.cmd_latency);
        let settings = match args.double_rate {
            true => DoubleRatePhy::new(config).map(|p| p.settings().clone()),
            false => Lpddr4Phy::new(config).map(|p| p.settings().clone()),
        };
        match settings {
            Ok(s) => println!("{:>12} {:>4} {:>4} {:>8} {:>8} {:>8} {:>8}",
                              f, s.cl, s.cwl, s.rdphase, s.wrphase,
                              s.read_latency, s.write_latency),
            Err(e) => {
                clilog::error!("{}", e);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}
