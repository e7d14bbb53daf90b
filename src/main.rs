use std::io::{stdin, stdout};
use std::process::ExitCode;

use clap::Parser;

use wgups_sim::callback::TracingCallback;
use wgups_sim::cli::{self, Args};
use wgups_sim::config::SimConfig;
use wgups_sim::distance_table::DistanceTable;
use wgups_sim::ingest;
use wgups_sim::simulation::simulator::Simulator;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for (i, cause) in err.chain().enumerate() {
                if i == 0 {
                    eprintln!("error: {cause}");
                } else {
                    eprintln!("  caused by: {cause}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = SimConfig::canonical(&args.data_dir);

    let store = ingest::load_parcels(&config.packages_csv, config.base_date)?;
    let distances = DistanceTable::load(&config.addresses_csv, &config.distances_csv)?;

    let mut sim = Simulator::new(config, store, distances, vec![Box::new(TracingCallback)]);
    sim.run_to_completion()?;

    for line in sim.event_log().render_all() {
        println!("{line}");
    }

    if args.non_interactive {
        println!("Total mileage: {:.1}", sim.total_mileage());
        return Ok(());
    }

    let stdin = stdin();
    let mut stdout = stdout();
    cli::run_menu(&sim, stdin.lock(), &mut stdout)?;

    Ok(())
}
