//! mixtape — применение упорядоченного батча изменений к снапшоту
//! users/playlists/songs.
//!
//! Конвейер: SnapshotStore -> (sequencer: сортировка по time) ->
//! gate::validate -> engine::apply -> export.

pub mod config;
pub mod model;
pub mod store;
pub mod gate;
pub mod engine;
pub mod sequencer;
pub mod export;

// Loader/Writer и CLI (тонкие обёртки над ядром)
pub mod io;
pub mod cli;

pub use config::MixtapeConfig;
pub use engine::{apply, resolve_position, Outcome, SkipReason};
pub use export::{export_document, export_playlists};
pub use gate::{validate, CanonicalChange, Operation, RejectReason, Rejection};
pub use model::{ChangeRequest, ChangesDoc, OutputDoc, Playlist, Song, SongRef, SourceDoc, User};
pub use sequencer::{apply_batch, apply_batch_with, order_batch, ApplyReport, ReportEntry, Verdict};
pub use store::SnapshotStore;
