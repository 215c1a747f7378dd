//! `lfcheck boards.json mydata.lf`
//!
//! Walk an entire list file against a board configuration without producing
//! output. No output and an exit code of 0 indicates every record decoded.

use anyhow::{bail, Result};
use std::env;
use std::fs::File;
use std::io::BufReader;

use lftools::cfg::Run;
use lftools::reader;
use lftools::sink::NullSink;

fn main() -> Result<()> {
    let args = env::args().collect::<Vec<_>>();
    if args.len() != 3 {
        bail!("usage: lfcheck <boards.json> <input.lf>");
    }
    let file = File::open(&args[1])?;
    let run: Run = serde_json::from_reader(BufReader::new(file))?;

    reader::decode(&args[2], run.boards, &mut NullSink)?;
    Ok(())
}
