use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use std::path::{Path, PathBuf};

use crate::config::MixtapeConfig;
use crate::export::export_document;
use crate::io::{load_changes, load_source, write_output};
use crate::sequencer::{apply_batch_with, ApplyReport};
use crate::store::SnapshotStore;

/// mixtape: применить батч изменений к снапшоту users/playlists/songs.
///
/// Пример:
///   mixtape spotify.json changes.json output.json
///   MIXTAPE_LOG=debug mixtape spotify.json changes.json output.json --json
#[derive(Parser, Debug)]
#[command(
    name = "mixtape",
    version,
    about = "Apply ordered playlist changes to a users/playlists/songs JSON snapshot",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Input snapshot (JSON with users, playlists, songs)
    pub input: PathBuf,
    /// Changes document (JSON with a `changes` array)
    pub changes: PathBuf,
    /// Output file; must not exist unless --overwrite
    pub output: PathBuf,

    /// Replace an existing output file
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
    /// Compact (single-line) output JSON
    #[arg(long, default_value_t = false)]
    pub compact: bool,
    /// Apply changes in file order instead of sorting by `time`
    #[arg(long, default_value_t = false)]
    pub file_order: bool,
    /// Print the apply report as one JSON object on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl Cli {
    /// ENV-конфиг + переопределения флагами (флаг только включает поведение).
    /// Порядок применения задаётся только здесь: из окружения он не читается.
    pub fn config(&self) -> MixtapeConfig {
        let mut cfg = MixtapeConfig::from_env();
        if self.overwrite {
            cfg = cfg.with_allow_overwrite(true);
        }
        if self.compact {
            cfg = cfg.with_pretty_output(false);
        }
        if self.file_order {
            cfg = cfg.with_order_by_time(false);
        }
        cfg
    }
}

/// Полный конвейер: load -> store -> apply -> export -> write.
pub fn execute(
    input: &Path,
    changes: &Path,
    output: &Path,
    cfg: &MixtapeConfig,
) -> Result<ApplyReport> {
    debug!("{}", cfg);

    // вывод проверяем заранее, чтобы не делать работу впустую
    if output.exists() && !cfg.allow_overwrite {
        anyhow::bail!(
            "output file {} already exists: refusing to overwrite",
            output.display()
        );
    }

    let source = load_source(input)?;
    let batch = load_changes(changes)?;

    let mut store = SnapshotStore::from_source(source);
    let report = apply_batch_with(&mut store, batch.changes, cfg.order_by_time);

    write_output(output, &export_document(&store), cfg)?;
    Ok(report)
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.config();
    let report = execute(&cli.input, &cli.changes, &cli.output, &cfg)?;

    if cli.json {
        println!("{}", report.to_json().context("serialize apply report")?);
    } else {
        println!(
            "Applied {} of {} change(s) ({} partial, {} skipped, {} rejected) -> {}",
            report.applied,
            report.total,
            report.partial,
            report.skipped,
            report.rejected,
            cli.output.display()
        );
    }
    Ok(())
}
