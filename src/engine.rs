//! engine — MutationEngine: применение одной CanonicalChange к SnapshotStore.
//!
//! Guards (early-return вместо вложенных continuation):
//! - require_playlist_exists: плейлист ищется только у целевого пользователя;
//! - require_legit_songs: фильтр по существующим песням; пусто -> операция
//!   отменяется, частично -> продолжаем с подмножеством + предупреждение.
//!
//! Порядок для PATCH: сначала существование плейлиста, потом песни —
//! от этого зависит, какое предупреждение увидит запрос, падающий на обоих.
//!
//! Ни один исход не является ошибкой: отмена — это Outcome::Skipped.

use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::gate::{CanonicalChange, Operation};
use crate::model::Playlist;
use crate::store::SnapshotStore;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    PlaylistNotFound { playlist_id: String, user_id: String },
    NoLegitSongs,
    /// Индекс пользователя не из этого store (устаревшая CanonicalChange).
    UnknownTarget { target: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PlaylistNotFound {
                playlist_id,
                user_id,
            } => write!(
                f,
                "playlist not found: id '{}' under user id '{}'",
                playlist_id, user_id
            ),
            SkipReason::NoLegitSongs => f.write_str("no legitimate song ids"),
            SkipReason::UnknownTarget { target } => {
                write!(f, "target user #{} is not in the store", target)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Created {
        playlist_id: String,
        songs: usize,
        dropped_songs: Vec<String>,
    },
    Inserted {
        playlist_id: String,
        at: usize,
        count: usize,
        dropped_songs: Vec<String>,
    },
    Deleted {
        playlist_id: String,
    },
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Outcome::Skipped(_))
    }

    /// Песни, отфильтрованные как несуществующие (частичный успех).
    pub fn dropped_songs(&self) -> &[String] {
        match self {
            Outcome::Created { dropped_songs, .. } | Outcome::Inserted { dropped_songs, .. } => {
                dropped_songs
            }
            _ => &[],
        }
    }

    pub fn playlist_id(&self) -> Option<&str> {
        match self {
            Outcome::Created { playlist_id, .. }
            | Outcome::Inserted { playlist_id, .. }
            | Outcome::Deleted { playlist_id } => Some(playlist_id),
            Outcome::Skipped(_) => None,
        }
    }
}

/// Результат фильтрации песен: legit — в исходном порядке (с повторами).
struct LegitSongs {
    ids: Vec<String>,
    dropped: Vec<String>,
}

fn target_user_id(store: &SnapshotStore, change: &CanonicalChange) -> Result<String, SkipReason> {
    store
        .user(change.target)
        .map(|e| e.user.id.clone())
        .ok_or(SkipReason::UnknownTarget {
            target: change.target,
        })
}

fn require_legit_songs(
    store: &SnapshotStore,
    change: &CanonicalChange,
) -> Result<LegitSongs, SkipReason> {
    let requested = change
        .song_ids
        .as_ref()
        .map(|r| r.to_vec())
        .unwrap_or_default();

    let (ids, dropped): (Vec<String>, Vec<String>) =
        requested.into_iter().partition(|id| store.has_song(id));

    if ids.is_empty() {
        warn!(
            "{} for user id '{}' abandoned: no legitimate song ids (requested {:?})",
            change.op,
            target_user_id(store, change).unwrap_or_default(),
            dropped
        );
        return Err(SkipReason::NoLegitSongs);
    }
    if !dropped.is_empty() {
        warn!(
            "{} for user id '{}': unknown song ids {:?} ignored, using {:?}",
            change.op,
            target_user_id(store, change).unwrap_or_default(),
            dropped,
            ids
        );
    }
    Ok(LegitSongs { ids, dropped })
}

fn require_playlist_exists(
    store: &SnapshotStore,
    change: &CanonicalChange,
) -> Result<usize, SkipReason> {
    let user_id = target_user_id(store, change)?;
    let playlist_id = change.playlist_id.as_deref().unwrap_or_default();
    match store.playlist_index(change.target, playlist_id) {
        Some(pl_idx) => Ok(pl_idx),
        None => {
            warn!(
                "{}: playlist id '{}' not found under user id '{}'",
                change.op, playlist_id, user_id
            );
            Err(SkipReason::PlaylistNotFound {
                playlist_id: playlist_id.to_string(),
                user_id,
            })
        }
    }
}

/// Позиция вставки с семантикой splice:
/// None -> len; p >= 0 -> min(p, len); p < 0 -> max(len + p, 0).
pub fn resolve_position(position: Option<i64>, len: usize) -> usize {
    match position {
        None => len,
        Some(p) if p >= 0 => usize::try_from(p).map_or(len, |p| p.min(len)),
        Some(p) => {
            let back = usize::try_from(p.unsigned_abs()).unwrap_or(usize::MAX);
            len.saturating_sub(back)
        }
    }
}

/// Применить изменение (target выдаёт gate::validate против этого же store;
/// чужой/устаревший target -> Skipped(UnknownTarget)).
pub fn apply(store: &mut SnapshotStore, change: &CanonicalChange) -> Outcome {
    let res = match change.op {
        Operation::Create => create(store, change),
        Operation::Insert => insert(store, change),
        Operation::Delete => delete(store, change),
    };
    match res {
        Ok(outcome) => {
            debug!("{} user #{} -> {:?}", change.op, change.target, outcome);
            outcome
        }
        Err(reason) => Outcome::Skipped(reason),
    }
}

fn create(store: &mut SnapshotStore, change: &CanonicalChange) -> Result<Outcome, SkipReason> {
    let owner_id = target_user_id(store, change)?;
    let legit = require_legit_songs(store, change)?;

    let id = store.issue_playlist_id();
    let songs = legit.ids.len();
    let entry = store
        .user_mut(change.target)
        .ok_or(SkipReason::UnknownTarget {
            target: change.target,
        })?;
    entry
        .playlists
        .push(Playlist::new(id.clone(), owner_id, legit.ids));
    Ok(Outcome::Created {
        playlist_id: id,
        songs,
        dropped_songs: legit.dropped,
    })
}

fn insert(store: &mut SnapshotStore, change: &CanonicalChange) -> Result<Outcome, SkipReason> {
    let pl_idx = require_playlist_exists(store, change)?;
    let legit = require_legit_songs(store, change)?;

    let Some(playlist) = store
        .user_mut(change.target)
        .and_then(|e| e.playlists.get_mut(pl_idx))
    else {
        return Err(SkipReason::UnknownTarget {
            target: change.target,
        });
    };
    let at = resolve_position(change.position, playlist.song_ids.len());
    let count = legit.ids.len();
    playlist.song_ids.splice(at..at, legit.ids);

    Ok(Outcome::Inserted {
        playlist_id: playlist.id.clone(),
        at,
        count,
        dropped_songs: legit.dropped,
    })
}

fn delete(store: &mut SnapshotStore, change: &CanonicalChange) -> Result<Outcome, SkipReason> {
    let pl_idx = require_playlist_exists(store, change)?;
    let entry = store
        .user_mut(change.target)
        .ok_or(SkipReason::UnknownTarget {
            target: change.target,
        })?;
    let removed = entry.playlists.remove(pl_idx);
    Ok(Outcome::Deleted {
        playlist_id: removed.id,
    })
}
