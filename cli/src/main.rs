//! Batch Chinese-to-Sino-Vietnamese file converter.
//!
//! Scans an input folder for `*.txt` files and writes `<name>_converted.txt`
//! alongside each into the output folder, using a bounded worker pool.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;

use hanviet_core::{Config, Engine, NO_NAME_SET};

#[derive(Parser)]
#[command(name = "hanviet", version, about = "Convert Chinese text to Sino-Vietnamese")]
struct Args {
    /// Read all .txt files from this folder.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Write converted files to this folder.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Use the specified name set, if one with that title exists.
    #[arg(short = 'n', long = "nameset")]
    nameset: Option<String>,

    /// Number of conversion jobs to run concurrently. 0 means let rayon pick.
    #[arg(short = 'j', long = "jobs", default_value_t = 0)]
    jobs: usize,

    /// Path to the redb dictionary store (default: dict.redb).
    #[arg(short = 'd', long = "dict")]
    db: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let db_path = match &args.db {
        Some(path) => path.clone(),
        None => PathBuf::from(Config::default().db_path),
    };

    if !args.input.is_dir() {
        bail!("input folder does not exist: {}", args.input.display());
    }
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("could not create output folder: {}", args.output.display()))?;

    let timer = Instant::now();
    print!("Loading dictionaries...");
    let mut engine = Engine::load(&db_path).context("failed to load dictionary store")?;
    println!(" {:.3}s.", timer.elapsed().as_secs_f64());

    if let Some(set_specified) = &args.nameset {
        match engine.name_set_metadata().iter().find(|m| m.title.eq_ignore_ascii_case(set_specified)) {
            Some(found) => {
                let id = found.id;
                engine.switch_name_set(id).context("failed to load name set")?;
            }
            None => {
                tracing::warn!(nameset = %set_specified, "cannot find the specified name set, ignoring");
                engine.switch_name_set(NO_NAME_SET).ok();
            }
        }
    }

    if args.jobs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.jobs)
            .build_global()
            .context("failed to configure worker pool")?;
    }

    let files = collect_txt_files(&args.input)?;
    if files.is_empty() {
        tracing::warn!(folder = %args.input.display(), "no .txt files found");
        return Ok(());
    }

    println!("Processing {} file(s)...", files.len());

    let output_dir = args.output.clone();
    files.par_iter().for_each(|file| {
        if let Err(e) = convert_one_file(&engine, file, &output_dir) {
            tracing::warn!(file = %file.display(), error = %e, "skipping");
        }
    });

    Ok(())
}

fn collect_txt_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn convert_one_file(engine: &Engine, file: &Path, output_dir: &Path) -> Result<()> {
    let timer = Instant::now();

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("cannot open {}", file.display()))?;

    let result = engine.convert_plain(&content, None);

    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let out_path = output_dir.join(format!("{stem}_converted.txt"));

    std::fs::write(&out_path, result)
        .with_context(|| format!("cannot write to {}", out_path.display()))?;

    println!(
        "Converted {} -> {}: {:.3}s.",
        file.display(),
        out_path.display(),
        timer.elapsed().as_secs_f64()
    );
    Ok(())
}
