//! gate — ValidationGate: структурная проверка запроса против текущего store.
//!
//! Проверки независимы и НЕ short-circuit: неизвестный пользователь и
//! неподдерживаемый метод сообщаются вместе. Проверки песен/плейлистов
//! здесь не делаются — это guards MutationEngine (зависят от операции).

use std::fmt;

use crate::model::{ChangeRequest, SongRef};
use crate::store::SnapshotStore;

/// Закрытый набор операций. Новая операция — видимое на этапе компиляции решение.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// POST: создать плейлист
    Create,
    /// PATCH: вставить песни в плейлист
    Insert,
    /// DELETE: удалить плейлист
    Delete,
}

impl Operation {
    /// Точное (регистрозависимое) сопоставление имени метода.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "POST" => Some(Operation::Create),
            "PATCH" => Some(Operation::Insert),
            "DELETE" => Some(Operation::Delete),
            _ => None,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Operation::Create => "POST",
            Operation::Insert => "PATCH",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Запрос после gate: пользователь разрешён в позицию, метод — в Operation.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalChange {
    pub target: usize,
    pub op: Operation,
    pub time: f64,
    pub song_ids: Option<SongRef>,
    pub playlist_id: Option<String>,
    pub position: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    UnknownUser(String),
    UnsupportedMethod(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnknownUser(id) => {
                write!(f, "unknown user: cannot add change for user id '{}'", id)
            }
            RejectReason::UnsupportedMethod(m) => {
                write!(f, "unsupported operation: no support for method '{}'", m)
            }
        }
    }
}

/// Отказ gate с накопленными причинами (всегда >= 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub reasons: Vec<RejectReason>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.reasons.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", r)?;
        }
        Ok(())
    }
}

/// Принять или отклонить запрос. Store не меняется.
pub fn validate(req: &ChangeRequest, store: &SnapshotStore) -> Result<CanonicalChange, Rejection> {
    let mut reasons = Vec::new();

    let target = store.user_index(&req.user);
    if target.is_none() {
        reasons.push(RejectReason::UnknownUser(req.user.clone()));
    }

    let op = Operation::from_method(&req.method);
    if op.is_none() {
        reasons.push(RejectReason::UnsupportedMethod(req.method.clone()));
    }

    match (target, op) {
        (Some(target), Some(op)) => Ok(CanonicalChange {
            target,
            op,
            time: req.time,
            song_ids: req.song_ids.clone(),
            playlist_id: req.playlist_id.clone(),
            position: req.integral_position(),
        }),
        _ => Err(Rejection { reasons }),
    }
}
