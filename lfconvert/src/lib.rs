pub mod hist;
pub mod sink;

use argh::FromArgs;

#[derive(Debug, FromArgs, Clone)]
/// Convert a digitizer list file into a tab-separated event table,
/// optional per-channel histograms, and a run record
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// run file (JSON) declaring boards and options
    #[argh(option, short = 'c')]
    pub config: Option<String>,
    /// chunk size in bytes for file reads
    #[argh(option, default = "lftools::reader::CHUNK_BYTES")]
    pub chunk: usize,
    /// directory for outputs (defaults to the input's directory)
    #[argh(option, short = 'o')]
    pub out: Option<String>,
    /// channel to keep in the event table (repeatable, 0-63; unset keeps all)
    #[argh(option, short = 'n')]
    pub channels: Vec<u8>,
    /// compress the event table with zstd (.tsv.zst)
    #[argh(switch, short = 'z')]
    pub compress: bool,
    /// accumulate and write per-channel histograms
    #[argh(switch)]
    pub histograms: bool,
    /// input list file
    #[argh(positional)]
    pub input: Vec<String>,
}
