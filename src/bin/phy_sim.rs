// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use itertools::Itertools;
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use lpphy::dfi::{CommandSlot, DfiPhase};
use lpphy::pads::{PhyInput, PhyOutput};
use lpphy::vcd::{half_tick_ps, PadTrace};
use lpphy::{Lpddr4Phy, PhyConfig, NPHASES};

#[derive(clap::Parser, Debug)]
struct SimulatorArgs {
    /// Controller clock frequency in Hz.
    #[clap(long, default_value_t = 100_000_000)]
    sys_clk_freq: u64,
    /// Width of the DQ bus.
    #[clap(long, default_value_t = 16)]
    databits: usize,
    /// Number of controller cycles to simulate.
    #[clap(long, default_value_t = 32)]
    cycles: u64,
    /// Command length in DRAM ticks that CL/CWL are counted from.
    #[clap(long, default_value_t = 4)]
    cmd_latency: usize,
    /// Do not drop overlapping commands.
    #[clap(long)]
    no_overlap_mask: bool,
    /// Do not drive the write mask on DMI.
    #[clap(long)]
    no_masked_write: bool,
    /// Feed DQ outputs back to the DQ inputs.
    #[clap(long)]
    loopback: bool,
    /// Seed of the random write data.
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// Output VCD path of the pad waveforms.
    #[clap(long)]
    output_vcd: Option<PathBuf>,
}

/// A two-part burst command (e.g. WRITE-1 + CAS-2), CS high on the
/// first tick of each part.
fn burst_command(first: u8) -> CommandSlot {
    CommandSlot { valid: true, cs: 0b0101, ca: [first, 0, 0b010010, 0] }
}

const WRITE_1: u8 = 0b000100;
const READ_1: u8 = 0b000010;

fn main() {
    clilog::init_stderr_color_debug();
    let args = <SimulatorArgs as clap::Parser>::parse();
    clilog::info!("Simulator args:\n{:#?}", args);

    let config = PhyConfig::new(args.sys_clk_freq)
        .with_databits(args.databits)
        .with_cmd_latency(args.cmd_latency)
        .with_overlap_masking(!args.no_overlap_mask)
        .with_masked_write(!args.no_masked_write);
    let mut phy = match Lpddr4Phy::new(config) {
        Ok(phy) => phy,
        Err(e) => {
            clilog::error!("cannot build PHY: {}", e);
            std::process::exit(1);
        }
    };
    let settings = phy.settings().clone();
    clilog::info!("PHY settings:\n{:#?}", settings);

    let mut trace = match &args.output_vcd {
        Some(path) => {
            let f = match File::create(path) {
                Ok(f) => f,
                Err(e) => {
                    clilog::error!("cannot create {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            };
            let template = PhyOutput::new(NPHASES, args.databits);
            let ps = match half_tick_ps(args.sys_clk_freq, NPHASES) {
                Some(ps) => ps,
                None => {
                    clilog::error!("cannot express the {} Hz half tick in ps",
                                   args.sys_clk_freq);
                    std::process::exit(1);
                }
            };
            Some(PadTrace::new(BufWriter::new(f), "lpddr4phy", &template, ps)
                 .expect("cannot write vcd header"))
        }
        None => None
    };

    let mut rng = ChaCha20Rng::seed_from_u64(args.seed);
    let data_mask = match args.databits {
        32 => u64::MAX,
        w => (1u64 << (2 * w)) - 1,
    };
    let burst: Vec<u64> = (0..NPHASES).map(|_| rng.gen::<u64>() & data_mask).collect();
    clilog::info!("write burst: {:#x}", burst.iter().format(", "));

    let write_at = 2;
    let read_at = write_at + 8;
    let mut pads = PhyInput::new(args.databits);
    let mut looped_back = None;

    let timer_sim = clilog::stimer!("simulation");
    for cycle in 0..args.cycles {
        let mut dfi = vec![DfiPhase::default(); NPHASES];
        for p in dfi.iter_mut() {
            p.cke = true;
            p.reset_n = true;
        }
        if cycle == write_at {
            dfi[settings.wrphase].command = burst_command(WRITE_1);
            dfi[settings.wrphase].wrdata_en = true;
        }
        if cycle == write_at + settings.write_latency as u64 {
            for (p, &data) in dfi.iter_mut().zip(burst.iter()) {
                p.wrdata = data;
            }
        }
        if cycle == read_at {
            dfi[settings.rdphase].command = burst_command(READ_1);
            dfi[settings.rdphase].rddata_en = true;
        }

        let out = phy.step(&mut dfi, &pads);
        if let Some(trace) = trace.as_mut() {
            trace.record(&out).expect("cannot write vcd");
        }

        let rddata = dfi.iter().map(|p| p.rddata).collect::<Vec<_>>();
        if dfi[0].rddata_valid {
            clilog::info!("cycle {}: read data valid: {:#x}", cycle, rddata.iter().format(", "));
        }
        if looped_back.is_none() && rddata == burst {
            clilog::info!("cycle {}: write burst looped back", cycle);
            looped_back = Some(cycle);
        }
        if out.dq_oe {
            clilog::debug!("cycle {}: driving dq {:#06x}", cycle, out.dq_o.iter().format(" "));
        }

        pads = match args.loopback {
            true => PhyInput::loopback(&out),
            false => PhyInput::new(args.databits),
        };
    }
    clilog::finish!(timer_sim);

    if phy.suppressed_commands() > 0 {
        clilog::warn!(PHY_SIM_SUPPRESSED,
                      "{} overlapping commands were dropped",
                      phy.suppressed_commands());
    }
    if args.loopback && looped_back.is_none() {
        clilog::error!("write burst never came back through the loopback");
        std::process::exit(1);
    }
}
