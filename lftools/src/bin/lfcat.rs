//! `lfcat -c boards.json input.lf`
//!
//! Decode a digitizer list file and print one tab-separated row per event
//! to standard output. Most likely, you want the shell one-liner
//!
//!     lfcat -c boards.json mydata.lf > mydata.tsv
//!
//! to get the widest data interopability.

use anyhow::Result;
use argh::FromArgs;
use std::fs::File;
use std::io::{stdout, BufReader, Write};

use lftools::cfg::Run;
use lftools::reader::LfReader;
use lftools::sink::TsvSink;

const GIT_VERSION: &str = git_version::git_version!(fallback = concat!("v", env!("CARGO_PKG_VERSION")));

#[derive(Debug, FromArgs, Clone)]
/// Decode a digitizer list file to tab-separated events on stdout
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// run file (JSON) declaring the board configuration
    #[argh(option, short = 'c')]
    pub config: String,
    /// chunk size in bytes for file reads
    #[argh(option)]
    pub chunk: Option<usize>,
    /// input list file
    #[argh(positional)]
    pub input: String,
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

    let f = File::open(&args.config)?;
    let run: Run = serde_json::from_reader(BufReader::new(f))?;

    let stdout = stdout();
    let mut sink = TsvSink::new(stdout.lock());

    let mut reader = LfReader::new(run.boards);
    if let Some(chunk) = args.chunk {
        reader = reader.chunk_bytes(chunk);
    }
    reader.read(&args.input, &mut sink)?;
    Ok(())
}
