use anyhow::{bail, Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{File, OpenOptions};
use std::io::{stdout, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

use lfconvert::sink::ConvertSink;
use lfconvert::CliArgs;
use lftools::cfg::Run;
use lftools::reader::LfReader;

const GIT_VERSION: &str = git_version::git_version!(fallback = concat!("v", env!("CARGO_PKG_VERSION")));

fn main() -> Result<()> {
    // Parse command line arguments
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

    tracing_subscriber::fmt::init();

    // Load the run file
    let cfg_path = match args.config {
        Some(c) => PathBuf::from(c),
        None => bail!("no run file provided"),
    };
    let f = File::open(&cfg_path)
        .with_context(|| format!("cannot open run file {}", cfg_path.display()))?;
    let config: Run = serde_json::from_reader(BufReader::new(f))?;

    let input = match args.input.len() {
        1 => PathBuf::from(&args.input[0]),
        _ => bail!("expected exactly one input list file"),
    };
    let out_dir = match args.out {
        Some(d) => PathBuf::from(d),
        None => input.parent().unwrap_or(&PathBuf::from(".")).to_path_buf(),
    };
    let stem = input
        .file_stem()
        .unwrap_or_else(|| std::ffi::OsStr::new("data"))
        .to_string_lossy()
        .to_string();

    let compress = args.compress || config.compress == Some(true);
    let histograms = args.histograms || config.histograms == Some(true);
    // Filter channels merge the same way the switches do
    let mut channels = config.channels.clone();
    channels.extend(args.channels.iter().copied());

    // Event table writer
    let table_path = out_dir.join(if compress {
        format!("{}.tsv.zst", stem)
    } else {
        format!("{}.tsv", stem)
    });
    let table = File::create(&table_path)
        .with_context(|| format!("cannot create event table {}", table_path.display()))?;
    let wtr: Box<dyn Write> = if compress {
        Box::new(zstd::stream::write::Encoder::new(table, 0)?.auto_finish())
    } else {
        Box::new(BufWriter::new(table))
    };
    let mut sink = ConvertSink::new(wtr, &channels, histograms)?;

    // Decode, with a progress bar driven from chunk-load boundaries
    let len = std::fs::metadata(&input)
        .with_context(|| format!("cannot stat input {}", input.display()))?
        .len();
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:70}] {percent}% {bytes}/{total_bytes}")
            .progress_chars("=> "),
    );
    let pb2 = pb.clone();
    let summary = LfReader::new(config.boards.clone())
        .chunk_bytes(args.chunk)
        .on_chunk(move |pos, _| pb2.set_position(pos))
        .read(&input, &mut sink)
        .with_context(|| format!("decode failed for {}", input.display()))?;
    pb.finish();

    if sink.filtered > 0 {
        info!(filtered = sink.filtered, "events outside the channel filter");
    }
    if let Some(hists) = sink.histograms() {
        hists.write(&out_dir, &stem)?;
    }

    // Now record the run record to disk, with the effective filter
    let record = Run {
        timestamp: Some(Local::now()),
        summary: Some(summary),
        channels: sink.channels(),
        ..config
    };
    let json_record = serde_json::to_string_pretty(&record)?;

    let mut rcd_stem = cfg_path
        .file_stem()
        .unwrap_or_else(|| std::ffi::OsStr::new("run"))
        .to_string_lossy()
        .to_string();
    rcd_stem.push('_');
    rcd_stem.push_str(&Local::now().format("%F_%H-%M-%S").to_string());
    let mut rcd_path = out_dir.join(rcd_stem);
    rcd_path.set_extension("json");
    {
        let f = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&rcd_path)
            .with_context(|| format!("cannot create run record {}", rcd_path.display()))?;
        let mut wtr = BufWriter::new(f);
        wtr.write_all(json_record.as_bytes())?;
    }

    Ok(())
}
