//! model — документы на входе/выходе и сырой запрос на изменение.
//!
//! Содержит:
//! - Song / User / Playlist: известные поля + opaque-хвост (flatten в JSON map),
//!   который пишется обратно без изменений.
//! - SourceDoc / ChangesDoc / OutputDoc: три документа, которыми обмениваемся с io.
//! - ChangeRequest + SongRef: сырой запрос из батча (до ValidationGate).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Песня. Система её никогда не создаёт и не меняет.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Пользователь (без плейлистов — они живут в SnapshotStore рядом с ним).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Плейлист: id глобально уникален, owner_id совпадает с владельцем,
/// song_ids упорядочены и могут повторяться.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub song_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Playlist {
    pub fn new(id: String, owner_id: String, song_ids: Vec<String>) -> Self {
        Self {
            id,
            owner_id,
            song_ids,
            extra: Map::new(),
        }
    }
}

/// Входной снапшот: users + playlists + songs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SourceDoc {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    #[serde(default)]
    pub songs: Vec<Song>,
}

/// Документ с батчем изменений.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChangesDoc {
    #[serde(default)]
    pub changes: Vec<ChangeRequest>,
}

/// Выходной документ: ровно три ключа.
#[derive(Clone, Debug, Serialize)]
pub struct OutputDoc {
    pub users: Vec<User>,
    pub playlists: Vec<Playlist>,
    pub songs: Vec<Song>,
}

/// Ссылка на песни: одна строка или массив строк.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SongRef {
    One(String),
    Many(Vec<String>),
}

impl SongRef {
    /// Нормализует ссылку в последовательность (одиночный id -> массив из одного).
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            SongRef::One(id) => vec![id.clone()],
            SongRef::Many(ids) => ids.clone(),
        }
    }
}

impl From<&str> for SongRef {
    fn from(id: &str) -> Self {
        SongRef::One(id.to_string())
    }
}

impl From<Vec<&str>> for SongRef {
    fn from(ids: Vec<&str>) -> Self {
        SongRef::Many(ids.into_iter().map(str::to_string).collect())
    }
}

/// Сырой запрос на изменение (как лежит в changes.json).
///
/// `method` остаётся строкой: разбор в `Operation` делает ValidationGate,
/// чтобы неподдерживаемый метод был причиной отказа, а не ошибкой парсинга.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub user: String,
    pub method: String,
    #[serde(default)]
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_ids: Option<SongRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    /// Любое JSON-значение; позицией считается только целое число.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
}

impl ChangeRequest {
    pub fn new(user: &str, method: &str, time: f64) -> Self {
        Self {
            user: user.to_string(),
            method: method.to_string(),
            time,
            song_ids: None,
            playlist_id: None,
            position: None,
        }
    }

    pub fn with_songs<S: Into<SongRef>>(mut self, songs: S) -> Self {
        self.song_ids = Some(songs.into());
        self
    }

    pub fn with_playlist(mut self, playlist_id: &str) -> Self {
        self.playlist_id = Some(playlist_id.to_string());
        self
    }

    pub fn with_position(mut self, position: Value) -> Self {
        self.position = Some(position);
        self
    }

    /// Целочисленная позиция вставки, если она задана корректно.
    /// `2` и `2.0` — позиция; `1.5`, `"2"`, `null` — нет.
    pub fn integral_position(&self) -> Option<i64> {
        let v = self.position.as_ref()?;
        if let Some(n) = v.as_i64() {
            return Some(n);
        }
        if v.is_u64() {
            // больше i64::MAX — всё равно «после конца»
            return Some(i64::MAX);
        }
        let f = v.as_f64()?;
        if f.is_finite() && f.fract() == 0.0 {
            // saturating cast
            return Some(f as i64);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn song_ref_accepts_string_or_array() {
        let one: SongRef = serde_json::from_value(json!("s1")).unwrap();
        assert_eq!(one.to_vec(), vec!["s1".to_string()]);

        let many: SongRef = serde_json::from_value(json!(["s1", "s2", "s1"])).unwrap();
        assert_eq!(many.to_vec(), vec!["s1", "s2", "s1"]);
    }

    #[test]
    fn change_request_defaults_optional_fields() {
        let c: ChangeRequest =
            serde_json::from_value(json!({"user": "u1", "method": "DELETE"})).unwrap();
        assert_eq!(c.time, 0.0);
        assert!(c.song_ids.is_none());
        assert!(c.playlist_id.is_none());
        assert!(c.integral_position().is_none());
    }

    #[test]
    fn integral_position_only_for_whole_numbers() {
        let base = ChangeRequest::new("u1", "PATCH", 1.0);
        assert_eq!(base.clone().with_position(json!(3)).integral_position(), Some(3));
        assert_eq!(base.clone().with_position(json!(-2)).integral_position(), Some(-2));
        assert_eq!(base.clone().with_position(json!(2.0)).integral_position(), Some(2));
        assert_eq!(base.clone().with_position(json!(1.5)).integral_position(), None);
        assert_eq!(base.clone().with_position(json!("2")).integral_position(), None);
        assert_eq!(base.clone().with_position(json!(null)).integral_position(), None);
        assert_eq!(
            base.with_position(json!(u64::MAX)).integral_position(),
            Some(i64::MAX)
        );
    }

    #[test]
    fn playlist_keeps_unknown_fields() {
        let p: Playlist = serde_json::from_value(json!({
            "id": "7", "owner_id": "u1", "song_ids": ["s1"], "name": "road trip"
        }))
        .unwrap();
        assert_eq!(p.extra.get("name"), Some(&json!("road trip")));
        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["name"], json!("road trip"));
    }
}
