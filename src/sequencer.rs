//! sequencer — упорядочить батч по time и прогнать каждый запрос через
//! gate -> engine. Эффект каждого изменения виден всем последующим
//! (плейлист, созданный раньше в батче, можно патчить/удалять позже).
//!
//! Батч одноразовый: Vec потребляется целиком.

use log::{info, warn};
use serde::Serialize;

use crate::engine::{self, Outcome};
use crate::gate;
use crate::model::ChangeRequest;
use crate::store::SnapshotStore;

/// Стабильная сортировка по time (равные time сохраняют исходный порядок).
pub fn order_batch(changes: &mut [ChangeRequest]) {
    changes.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// Отклонено gate; причины в человекочитаемом виде.
    Rejected { reasons: Vec<String> },
    /// Принято gate; результат engine (применено или отменено guard'ом).
    Processed { outcome: Outcome },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Порядковый номер после сортировки.
    pub seq: usize,
    pub time: f64,
    pub user: String,
    pub method: String,
    pub verdict: Verdict,
}

/// Итог применения батча.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub total: usize,
    pub applied: usize,
    pub rejected: usize,
    pub skipped: usize,
    /// Применено, но часть песен отфильтрована.
    pub partial: usize,
    pub entries: Vec<ReportEntry>,
}

impl ApplyReport {
    fn record(&mut self, entry: ReportEntry) {
        self.total += 1;
        match &entry.verdict {
            Verdict::Rejected { .. } => self.rejected += 1,
            Verdict::Processed { outcome } if outcome.is_applied() => {
                self.applied += 1;
                if !outcome.dropped_songs().is_empty() {
                    self.partial += 1;
                }
            }
            Verdict::Processed { .. } => self.skipped += 1,
        }
        self.entries.push(entry);
    }

    /// Исходы принятых запросов в порядке применения.
    pub fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.entries.iter().filter_map(|e| match &e.verdict {
            Verdict::Processed { outcome } => Some(outcome),
            Verdict::Rejected { .. } => None,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Упорядочить по time и применить.
pub fn apply_batch(store: &mut SnapshotStore, changes: Vec<ChangeRequest>) -> ApplyReport {
    apply_batch_with(store, changes, true)
}

/// То же, но с выбором порядка: `order_by_time=false` — порядок файла.
pub fn apply_batch_with(
    store: &mut SnapshotStore,
    mut changes: Vec<ChangeRequest>,
    order_by_time: bool,
) -> ApplyReport {
    if order_by_time {
        order_batch(&mut changes);
    }

    let mut report = ApplyReport::default();
    for (seq, req) in changes.into_iter().enumerate() {
        let verdict = match gate::validate(&req, store) {
            Ok(change) => Verdict::Processed {
                outcome: engine::apply(store, &change),
            },
            Err(rejection) => {
                warn!(
                    "change #{} (user '{}', method '{}', time {}) rejected",
                    seq, req.user, req.method, req.time
                );
                for r in &rejection.reasons {
                    warn!("  {}", r);
                }
                Verdict::Rejected {
                    reasons: rejection.reasons.iter().map(|r| r.to_string()).collect(),
                }
            }
        };
        report.record(ReportEntry {
            seq,
            time: req.time,
            user: req.user,
            method: req.method,
            verdict,
        });
    }

    info!(
        "batch: {} change(s), applied={}, partial={}, skipped={}, rejected={}",
        report.total, report.applied, report.partial, report.skipped, report.rejected
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_stable_for_equal_times() {
        let mut batch = vec![
            ChangeRequest::new("a", "POST", 5.0),
            ChangeRequest::new("b", "POST", 1.0),
            ChangeRequest::new("c", "POST", 5.0),
            ChangeRequest::new("d", "POST", 1.0),
            ChangeRequest::new("e", "POST", 3.0),
        ];
        order_batch(&mut batch);
        let users: Vec<&str> = batch.iter().map(|c| c.user.as_str()).collect();
        assert_eq!(users, vec!["b", "d", "e", "a", "c"]);
    }
}
