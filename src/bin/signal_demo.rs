//! Synthetic-demand demo harness. Exercises `junction_control::Controller`
//! against seeded random traffic, printing the resulting light table every
//! cycle. This binary -- not the library -- owns the randomised demand
//! generator and the drive loop; the core itself never reads a clock or an
//! RNG on its own.

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use structopt::StructOpt;

use junction_control::flow::RngArrivalSource;
use junction_control::{Config, Controller, Movement, SnapshotEntry};

#[derive(StructOpt)]
#[structopt(name = "signal_demo", about = "Drive a junction_control::Controller with synthetic demand")]
struct Args {
    /// Number of lanes approaching the intersection
    #[structopt(long, default_value = "4")]
    lanes: usize,

    /// Number of update cycles to run
    #[structopt(long, default_value = "20")]
    cycles: u32,

    /// Seconds of simulated time between cycles
    #[structopt(long, default_value = "5.0")]
    cycle_seconds: f64,

    /// Seed for the synthetic demand generator and the flow model's arrival source
    #[structopt(long, default_value = "42")]
    rng_seed: u64,

    /// Path to a JSON config file overriding the defaults (see junction_control::Config)
    #[structopt(long)]
    config: Option<String>,
}

fn load_config(path: &Option<String>) -> Result<Config> {
    match path {
        None => Ok(Config::default()),
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config file {}", p))?;
            let config: Config =
                serde_json::from_str(&text).with_context(|| format!("parsing config file {}", p))?;
            config
                .validate()
                .map_err(|e| anyhow::anyhow!(e.to_string()))
        }
    }
}

fn main() -> Result<()> {
    junction_control::logging::init();

    let args = Args::from_args();
    let config = load_config(&args.config)?;
    let mut controller = Controller::new(config);

    let mut demand_rng = XorShiftRng::seed_from_u64(args.rng_seed);
    let mut arrivals = RngArrivalSource::new(XorShiftRng::seed_from_u64(args.rng_seed.wrapping_add(1)));

    let lanes: Vec<String> = (0..args.lanes).map(|i| format!("L{}", i)).collect();

    for cycle in 0..args.cycles {
        let now = cycle as f64 * args.cycle_seconds;
        let snapshot: Vec<SnapshotEntry> = lanes
            .iter()
            .map(|lane| {
                let mut entry = SnapshotEntry::new(lane.clone());
                for m in Movement::ALL {
                    entry = entry.with_normal(m, demand_rng.gen_range(0..=12));
                }
                entry
            })
            .collect();

        let table = controller.update(&snapshot, now, &mut arrivals);

        let phase = controller.active_phase().expect("update always sets a phase");
        println!(
            "cycle {:>3} t={:>6.1}s phase={:?} duration={:.1}s movements={:?}",
            cycle, now, phase.kind, phase.duration, phase.movements
        );
        for lane in &lanes {
            let row = &table[lane];
            println!(
                "  {:<4} straight={:?} left={:?} right={:?}",
                lane, row[&Movement::Straight], row[&Movement::Left], row[&Movement::Right]
            );
        }
    }

    Ok(())
}
