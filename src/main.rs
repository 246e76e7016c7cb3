use std::{env, fmt, fs::File, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use csv::StringRecord;
use geo::Point;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    geocode::{Geocoder, Lookup},
    route::Start,
    table::{Columns, Table},
};

mod geocode;
mod route;
mod table;

#[derive(Debug, Parser)]
struct Cli {
    /// table of client addresses (.csv, or .tsv for tabs)
    input: PathBuf,

    /// where to write the reordered table
    output: PathBuf,

    /// provider key; falls back to GEOCODING_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// where the route begins
    #[arg(long, value_enum, default_value_t = Start::First)]
    start: Start,

    /// what a network failure during geocoding does
    #[arg(long, value_enum, default_value_t = OnError::Abort)]
    on_error: OnError,

    /// pause between provider calls, in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    #[command(flatten)]
    columns: Columns,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OnError {
    Abort,
    Skip,
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
        })
    }
}

#[derive(Debug)]
struct Located {
    row: StringRecord,
    point: Point,
}

#[derive(Debug)]
struct Batch {
    located: Vec<Located>,
    unresolved: usize,
    skipped: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let key = match cli.api_key.clone().or_else(|| env::var("GEOCODING_API_KEY").ok()) {
        Some(x) => x,
        None => bail!("no provider key: pass --api-key or set GEOCODING_API_KEY"),
    };

    let table = Table::read(&cli.input, &cli.columns)?;
    if table.rows.is_empty() {
        bail!("{} has no rows", cli.input.display());
    }

    eprintln!("Geocoding {} addresses...", table.rows.len());
    let geocoder = Geocoder::new(key, Duration::from_millis(cli.delay_ms));
    let pb = progress_bar(table.rows.len() as u64);
    let batch = locate(&table, cli.on_error, &pb, |address| geocoder.lookup(address))?;
    pb.finish_and_clear();

    if batch.located.is_empty() {
        bail!(
            "none of the {} addresses could be geocoded, nothing to write",
            table.rows.len()
        );
    }

    let points: Vec<Point> = batch.located.iter().map(|x| x.point).collect();
    let stops: Vec<(StringRecord, Point)> = route::visit_order(&points, cli.start)
        .into_iter()
        .map(|i| (batch.located[i].row.clone(), batch.located[i].point))
        .collect();

    let output = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    table::write(output, table::delimiter(&cli.output), &table.headers, &stops)?;

    let visited: Vec<Point> = stops.iter().map(|(_, point)| *point).collect();
    eprintln!(
        "{} stops over {:.1} km written to {} ({} unresolved, {} skipped)",
        stops.len(),
        route::length_km(&visited),
        cli.output.display(),
        batch.unresolved,
        batch.skipped,
    );

    Ok(())
}

// rows the provider can't place are dropped here and never reach the route;
// what happens to rows the provider couldn't be asked about is the policy's call
fn locate(
    table: &Table,
    on_error: OnError,
    pb: &ProgressBar,
    mut lookup: impl FnMut(&str) -> Result<Lookup>,
) -> Result<Batch> {
    let mut batch = Batch {
        located: Vec::new(),
        unresolved: 0,
        skipped: 0,
    };

    for row in &table.rows {
        let address = table.address(row);
        match lookup(&address) {
            Ok(Lookup::Located(point)) => batch.located.push(Located {
                row: row.clone(),
                point,
            }),
            Ok(Lookup::Unresolved(_)) => batch.unresolved += 1,
            Err(e) => match on_error {
                OnError::Abort => {
                    return Err(e).with_context(|| format!("while geocoding {address:?}"))
                }
                OnError::Skip => {
                    pb.println(format!("skipping {address:?}: {e}"));
                    batch.skipped += 1;
                }
            },
        }
        pb.inc(1);
    }

    Ok(batch)
}

fn progress_bar(len: u64) -> ProgressBar {
    ProgressBar::new(len).with_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} ({eta})")
            .expect("hardcoded"),
    )
}
