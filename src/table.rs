use std::{fs::File, io, path::Path};

use anyhow::{bail, Context, Result};
use clap::Args;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use geo::Point;
use itertools::Itertools;

// appended to the output in visitation order
pub const APPENDED: [&str; 2] = ["latitude", "longitude"];

#[derive(Debug, Args)]
pub struct Columns {
    /// column holding the street address
    #[arg(long = "address-column", default_value = "address")]
    pub address: String,

    #[arg(long = "postcode-column", default_value = "postcode")]
    pub postcode: String,

    #[arg(long = "city-column", default_value = "city")]
    pub city: String,

    #[arg(long = "province-column", default_value = "province")]
    pub province: String,
}

#[derive(Debug)]
pub struct Table {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
    parts: [usize; 4],
}

impl Table {
    pub fn read(path: &Path, columns: &Columns) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Self::parse(file, delimiter(path), columns)
    }

    pub fn parse(input: impl io::Read, delimiter: u8, columns: &Columns) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::Headers)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        for name in APPENDED {
            if headers.iter().any(|x| x == name) {
                bail!("input already has a {name:?} column");
            }
        }

        let parts = [
            find(&headers, &columns.address)?,
            find(&headers, &columns.postcode)?,
            find(&headers, &columns.city)?,
            find(&headers, &columns.province)?,
        ];

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }

        Ok(Self {
            headers,
            rows,
            parts,
        })
    }

    // "street, postcode, city, province", leaving out empty cells
    pub fn address(&self, row: &StringRecord) -> String {
        self.parts
            .iter()
            .filter_map(|&i| row.get(i))
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .join(", ")
    }
}

fn find(headers: &StringRecord, name: &str) -> Result<usize> {
    match headers.iter().position(|x| x == name) {
        Some(x) => Ok(x),
        None => bail!("input has no {name:?} column"),
    }
}

pub fn delimiter(path: &Path) -> u8 {
    match path.extension().and_then(|x| x.to_str()) {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

pub fn write(
    output: impl io::Write,
    delimiter: u8,
    headers: &StringRecord,
    stops: &[(StringRecord, Point)],
) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(output);

    let mut header = headers.clone();
    for name in APPENDED {
        header.push_field(name);
    }
    writer.write_record(&header)?;

    for (row, point) in stops {
        let mut row = row.clone();
        row.push_field(&format!("{:.6}", point.y()));
        row.push_field(&format!("{:.6}", point.x()));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
