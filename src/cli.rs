use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{NaiveDateTime, NaiveTime};
use clap::Parser;

use crate::model::parcel::ParcelId;
use crate::simulation::simulator::Simulator;
use crate::status_query::{destination_as_of, status_of};

/// Command-line flags. The interactive menu runs regardless of which flags
/// are passed; `--data-dir` just tells ingest where to look for the three
/// canonical CSVs.
#[derive(Debug, Parser)]
#[command(name = "wgups", about = "Parcel dispatch and routing simulator")]
pub struct Args {
    /// Directory containing packages.csv, addresses.csv, distances.csv.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Run the simulation and print the final mileage without entering the
    /// interactive menu. Intended for scripted invocations.
    #[arg(long)]
    pub non_interactive: bool,
}

/// Runs the five-option menu from spec.md §6 against an already-completed
/// simulation, reading from `input` and writing to `output` so tests can
/// drive it without a real terminal.
pub fn run_menu(sim: &Simulator, input: impl BufRead, output: &mut impl Write) -> io::Result<()> {
    let mut lines = input.lines();

    loop {
        writeln!(output, "1) Status of all parcels as of a time")?;
        writeln!(output, "2) Status of one parcel as of a time")?;
        writeln!(output, "3) Parcels by address as of a time")?;
        writeln!(output, "4) Total fleet mileage")?;
        writeln!(output, "5) Exit")?;
        write!(output, "> ")?;
        output.flush()?;

        let Some(choice) = next_line(&mut lines) else {
            return Ok(());
        };

        let base_date = sim.config().base_date;

        match choice.trim() {
            "1" => {
                let Some(as_of) = prompt_time(&mut lines, output, base_date)? else {
                    continue;
                };
                for parcel in sim.store().iter_all() {
                    let view = status_of(parcel, as_of);
                    writeln!(output, "Package {}: {}", parcel.id, view.render())?;
                }
            }
            "2" => {
                write!(output, "Parcel id: ")?;
                output.flush()?;
                let Some(id) = next_line(&mut lines) else {
                    return Ok(());
                };
                let id = ParcelId(id.trim().to_string());
                let Some(as_of) = prompt_time(&mut lines, output, base_date)? else {
                    continue;
                };
                match sim.store().lookup(&id) {
                    Some(parcel) => writeln!(output, "Package {}: {}", id, status_of(parcel, as_of).render())?,
                    None => writeln!(output, "No such parcel: {id}")?,
                }
            }
            "3" => {
                write!(output, "Address: ")?;
                output.flush()?;
                let Some(address) = next_line(&mut lines) else {
                    return Ok(());
                };
                let address = address.trim();
                let Some(as_of) = prompt_time(&mut lines, output, base_date)? else {
                    continue;
                };
                let config = sim.config();
                let correction_instant = config.base_date.and_time(config.correction_instant);
                for parcel in sim.store().iter_all() {
                    let destination = destination_as_of(parcel, as_of, correction_instant, &config.correction_parcel_id);
                    if destination.address == address {
                        writeln!(output, "Package {}: {}", parcel.id, status_of(parcel, as_of).render())?;
                    }
                }
            }
            "4" => {
                writeln!(output, "Total mileage: {:.1}", sim.total_mileage())?;
            }
            "5" => return Ok(()),
            other => writeln!(output, "Unrecognized option: {other}")?,
        }
    }
}

fn next_line(lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<String> {
    lines.next().and_then(|l| l.ok())
}

/// Prompts for a `h:mm AM/PM` time, re-prompting once on a malformed entry
/// per spec.md §7 ("recoverable at the interactive menu level"). Returns
/// `None` on EOF or a second bad parse, so the caller can fall back to the
/// menu loop rather than crash the session over a typo. The parsed time is
/// materialised on `base_date` since every status query compares against a
/// full instant, not a bare time-of-day.
fn prompt_time(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    output: &mut impl Write,
    base_date: chrono::NaiveDate,
) -> io::Result<Option<NaiveDateTime>> {
    for attempt in 0..2 {
        write!(output, "Time (h:mm AM/PM): ")?;
        output.flush()?;
        let Some(raw) = next_line(lines) else {
            return Ok(None);
        };
        match NaiveTime::parse_from_str(raw.trim(), "%I:%M %p") {
            Ok(t) => return Ok(Some(base_date.and_time(t))),
            Err(_) if attempt == 0 => {
                writeln!(output, "Could not parse that time, try again.")?;
            }
            Err(_) => {
                writeln!(output, "Could not parse that time, returning to menu.")?;
                return Ok(None);
            }
        }
    }
    Ok(None)
}
