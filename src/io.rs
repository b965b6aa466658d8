//! io — Loader/Writer: чтение входных документов и запись результата.
//!
//! Все ошибки здесь фатальны для процесса (anyhow + контекст с путём);
//! ядро (gate/engine/sequencer) с файлами не работает.

use anyhow::{anyhow, Context, Result};
use log::info;
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::config::MixtapeConfig;
use crate::model::{ChangesDoc, OutputDoc, SourceDoc};

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {} file {}", what, path.display()))?;
    serde_json::from_str(&raw).with_context(|| {
        format!(
            "parse {} file {} (invalid JSON or wrong shape)",
            what,
            path.display()
        )
    })
}

/// Входной снапшот (users/playlists/songs).
pub fn load_source(path: &Path) -> Result<SourceDoc> {
    let doc: SourceDoc = read_json(path, "input")?;
    info!(
        "loaded {}: {} user(s), {} playlist(s), {} song(s)",
        path.display(),
        doc.users.len(),
        doc.playlists.len(),
        doc.songs.len()
    );
    Ok(doc)
}

/// Документ с батчем изменений.
pub fn load_changes(path: &Path) -> Result<ChangesDoc> {
    let doc: ChangesDoc = read_json(path, "changes")?;
    info!("loaded {}: {} change(s)", path.display(), doc.changes.len());
    Ok(doc)
}

/// Записать результат. Без allow_overwrite существующий путь — ошибка
/// (create_new: не гоняемся с другим писателем).
pub fn write_output(path: &Path, doc: &OutputDoc, cfg: &MixtapeConfig) -> Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true);
    if cfg.allow_overwrite {
        opts.create(true).truncate(true);
    } else {
        opts.create_new(true);
    }

    let f = match opts.open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(anyhow!(
                "output file {} already exists: refusing to overwrite",
                path.display()
            ));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("open output {}", path.display()));
        }
    };

    let mut out = BufWriter::new(f);
    let written = if cfg.pretty_output {
        serde_json::to_writer_pretty(&mut out, doc)
    } else {
        serde_json::to_writer(&mut out, doc)
    };
    written.with_context(|| format!("serialize output to {}", path.display()))?;
    out.write_all(b"\n")?;
    out.flush()
        .with_context(|| format!("flush output {}", path.display()))?;

    info!(
        "wrote {}: {} playlist(s)",
        path.display(),
        doc.playlists.len()
    );
    Ok(())
}
