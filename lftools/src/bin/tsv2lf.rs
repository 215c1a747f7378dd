//! `tsv2lf -o out.lf [INPUT]`
//!
//! Encode tab-separated events (in `lfcat` column order) back into the
//! binary list-file format. With no input or when input is '-', reads from
//! standard input. Note: on Windows -o must be specified as the encoded
//! data is not valid UTF-8 and thus cannot be written to stdout (a Rust
//! stdlib limitation).

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use std::fs::File;
use std::io::{stdin, stdout, BufReader, BufWriter, Read, Write};

use lftools::{ser, EventPayload, FrameKey, PhaEvent, PsdEvent, PHA_BYTES, PSD_BYTES};

const GIT_VERSION: &str = git_version::git_version!(fallback = concat!("v", env!("CARGO_PKG_VERSION")));

#[derive(Debug, FromArgs, Clone)]
/// Encode tab-separated events to the binary list-file format
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// file to write output to (writes to standard output by default)
    #[argh(option, short = 'o')]
    pub out: Option<String>,
    /// with no input or when input is '-', read from standard input
    #[argh(positional)]
    pub input: Option<String>,
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    let stdin = stdin();
    let rdr: Box<dyn Read> = match args.input.as_deref() {
        None | Some("-") => Box::new(stdin.lock()),
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(rdr);

    let stdout = stdout();
    let mut wtr: Box<dyn Write> = match args.out {
        None => Box::new(stdout.lock()),
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
    };

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let (key, payload) = parse_row(&record).with_context(|| format!("row {}", i + 1))?;
        ser::event(&mut wtr, &key, &payload)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Columns: board, channel, timestamp, pu, satu, lost, kind, cfd, then
/// energy (pha) or qshort and qlong (psd). The header cfd mirrors the
/// payload cfd, which is all the TSV carries.
fn parse_row(record: &csv::StringRecord) -> Result<(FrameKey, EventPayload)> {
    if record.len() < 9 {
        bail!("expected at least 9 columns, got {}", record.len());
    }
    let cfd = record[7].parse::<u16>()?;
    let (bytes, payload) = match &record[6] {
        "pha" => (
            PHA_BYTES,
            EventPayload::Pha(PhaEvent { energy: record[8].parse()?, cfd }),
        ),
        "psd" => {
            if record.len() < 10 {
                bail!("psd rows carry qshort and qlong");
            }
            (
                PSD_BYTES,
                EventPayload::Psd(PsdEvent {
                    qshort: record[8].parse()?,
                    qlong: record[9].parse()?,
                    cfd,
                }),
            )
        }
        kind => bail!("unknown record kind {:?}", kind),
    };
    let key = FrameKey {
        board: record[0].parse()?,
        channel: record[1].parse()?,
        timestamp: record[2].parse()?,
        cfd,
        pileup: &record[3] == "1",
        saturated: &record[4] == "1",
        lost: &record[5] == "1",
        idle: false,
        bytes: bytes as u32,
    };
    Ok((key, payload))
}
