//! store — SnapshotStore: пользователи со своими плейлистами, песни и
//! high-water счётчик id плейлистов.
//!
//! Инварианты:
//! - каждый плейлист принадлежит ровно одному пользователю (owner_id == user.id);
//! - next_playlist_id >= числового значения любого известного id плейлиста;
//!   новый id выдаётся после инкремента, поэтому он строго больше всех прежних.
//!
//! Счётчик хранится как десятичная строка без ведущих нулей: id во входе могут
//! быть сколь угодно длинными, переполнения нет.

use std::cmp::Ordering;
use std::collections::HashSet;

use log::{debug, warn};

use crate::model::{Playlist, Song, SourceDoc, User};

/// Пользователь + его плейлисты в порядке владения.
#[derive(Clone, Debug)]
pub struct UserEntry {
    pub user: User,
    pub playlists: Vec<Playlist>,
}

#[derive(Clone, Debug, Default)]
pub struct SnapshotStore {
    users: Vec<UserEntry>,
    songs: Vec<Song>,
    song_index: HashSet<String>,
    next_playlist_id: String,
}

/// Числовое значение id плейлиста: только ASCII-цифры (любой длины),
/// нормализованные без ведущих нулей. Нечисловые id — None.
pub fn numeric_playlist_id(id: &str) -> Option<String> {
    let t = id.trim();
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = t.trim_start_matches('0');
    Some(if digits.is_empty() { "0" } else { digits }.to_string())
}

/// Сравнение нормализованных десятичных строк: сначала длина, потом лексикографически.
pub fn cmp_decimal(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// +1 к нормализованной десятичной строке (перенос может удлинить её).
pub fn increment_decimal(n: &str) -> String {
    let mut digits: Vec<u8> = n.bytes().collect();
    let mut i = digits.len();
    loop {
        if i == 0 {
            digits.insert(0, b'1');
            break;
        }
        i -= 1;
        if digits[i] == b'9' {
            digits[i] = b'0';
        } else {
            digits[i] += 1;
            break;
        }
    }
    digits.into_iter().map(char::from).collect()
}

impl SnapshotStore {
    /// Собрать store из входного документа.
    /// Плейлисты без существующего владельца не представимы — пропускаются
    /// с предупреждением, но участвуют в high-water счётчике.
    pub fn from_source(doc: SourceDoc) -> Self {
        let SourceDoc {
            users,
            playlists,
            songs,
        } = doc;

        let mut high = String::from("0");
        for p in &playlists {
            match numeric_playlist_id(&p.id) {
                Some(n) => {
                    if cmp_decimal(&n, &high) == Ordering::Greater {
                        high = n;
                    }
                }
                None => debug!("playlist id '{}' is not numeric, ignored for id counter", p.id),
            }
        }

        let mut entries: Vec<UserEntry> = users
            .into_iter()
            .map(|user| UserEntry {
                user,
                playlists: Vec::new(),
            })
            .collect();

        for p in playlists {
            match entries.iter_mut().find(|e| e.user.id == p.owner_id) {
                Some(e) => e.playlists.push(p),
                None => warn!(
                    "playlist {} dropped: owner '{}' is not a known user",
                    p.id, p.owner_id
                ),
            }
        }

        let song_index = songs.iter().map(|s| s.id.clone()).collect();
        Self {
            users: entries,
            songs,
            song_index,
            next_playlist_id: high,
        }
    }

    #[inline]
    pub fn users(&self) -> &[UserEntry] {
        &self.users
    }

    #[inline]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Текущее значение high-water счётчика (последний выданный/известный id).
    #[inline]
    pub fn next_playlist_id(&self) -> &str {
        &self.next_playlist_id
    }

    pub fn user_index(&self, user_id: &str) -> Option<usize> {
        self.users.iter().position(|e| e.user.id == user_id)
    }

    #[inline]
    pub fn has_song(&self, song_id: &str) -> bool {
        self.song_index.contains(song_id)
    }

    /// Позиция плейлиста в последовательности пользователя `user_idx`.
    pub fn playlist_index(&self, user_idx: usize, playlist_id: &str) -> Option<usize> {
        self.users
            .get(user_idx)?
            .playlists
            .iter()
            .position(|p| p.id == playlist_id)
    }

    /// Инкремент счётчика, затем выдача нового id (строкой).
    pub fn issue_playlist_id(&mut self) -> String {
        self.next_playlist_id = increment_decimal(&self.next_playlist_id);
        self.next_playlist_id.clone()
    }

    pub fn user(&self, user_idx: usize) -> Option<&UserEntry> {
        self.users.get(user_idx)
    }

    pub(crate) fn user_mut(&mut self, user_idx: usize) -> Option<&mut UserEntry> {
        self.users.get_mut(user_idx)
    }

    /// Плейлист по (пользователь, позиция) — удобно для тестов и отчётов.
    pub fn playlist(&self, user_idx: usize, pl_idx: usize) -> Option<&Playlist> {
        self.users.get(user_idx)?.playlists.get(pl_idx)
    }

    /// Поиск плейлиста по id среди всех пользователей.
    pub fn find_playlist(&self, playlist_id: &str) -> Option<&Playlist> {
        self.users
            .iter()
            .flat_map(|e| e.playlists.iter())
            .find(|p| p.id == playlist_id)
    }

    /// Пользователи в исходном виде (без плейлистов) — для OutputDoc.
    pub fn plain_users(&self) -> Vec<User> {
        self.users.iter().map(|e| e.user.clone()).collect()
    }
}
