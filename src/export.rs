//! export — плоская последовательность плейлистов из store (чистое чтение).

use crate::model::{OutputDoc, Playlist};
use crate::store::SnapshotStore;

/// Плейлисты всех пользователей: в порядке пользователей, внутри —
/// в порядке владения.
pub fn export_playlists(store: &SnapshotStore) -> Vec<Playlist> {
    store
        .users()
        .iter()
        .flat_map(|e| e.playlists.iter().cloned())
        .collect()
}

/// Выходной документ: users и songs без изменений, playlists — из export_playlists.
pub fn export_document(store: &SnapshotStore) -> OutputDoc {
    OutputDoc {
        users: store.plain_users(),
        playlists: export_playlists(store),
        songs: store.songs().to_vec(),
    }
}
