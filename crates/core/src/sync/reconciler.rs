//! Field-level reconciliation of fetched records against the local snapshot
//!
//! Annotation fields are computed locally and never sent to the remote
//! side. A re-fetch keeps them unless the remote record actually changed.

use std::collections::BTreeMap;

use leadsync_domain::constants::{NEEDS_REVIEW_FIELD, REPLY_UPLOADED_FIELD};
use leadsync_domain::{Fields, RecordSnapshot, RemoteRecord, SnapshotRecord};
use tracing::debug;

/// Annotation values given to records that need recomputation
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationPolicy {
    pub fresh_defaults: Fields,
}

impl Default for AnnotationPolicy {
    fn default() -> Self {
        Self { fresh_defaults: Fields::new().with(NEEDS_REVIEW_FIELD, true).with(REPLY_UPLOADED_FIELD, false) }
    }
}

/// Per-record verdict
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The remote copy is new or changed; annotations must be recomputed
    pub fresh: bool,
    /// Annotation fields carried over from the local copy
    pub preserved_fields: Fields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub fresh: usize,
    pub preserved: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordReconciler {
    policy: AnnotationPolicy,
}

impl RecordReconciler {
    pub fn new(policy: AnnotationPolicy) -> Self {
        Self { policy }
    }

    /// Decide, per remote id, whether local annotations survive.
    pub fn reconcile(&self, remote: &[RemoteRecord], local: &RecordSnapshot) -> BTreeMap<String, Reconciliation> {
        let index = local.index_by_id();
        remote
            .iter()
            .map(|record| {
                let verdict = match index.get(record.id.as_str()) {
                    Some(cached) if !is_newer(record, &cached.record) => {
                        Reconciliation { fresh: false, preserved_fields: cached.annotations.clone() }
                    }
                    _ => Reconciliation { fresh: true, preserved_fields: Fields::new() },
                };
                (record.id.clone(), verdict)
            })
            .collect()
    }

    /// Build the next snapshot: remote fields always win, annotations are
    /// reset on fresh records and carried over otherwise.
    pub fn apply(&self, remote: Vec<RemoteRecord>, local: &RecordSnapshot) -> (RecordSnapshot, ReconcileStats) {
        let mut verdicts = self.reconcile(&remote, local);
        let mut stats = ReconcileStats::default();

        let records = remote
            .into_iter()
            .map(|record| {
                let verdict = verdicts.remove(&record.id);
                let mut annotations = self.policy.fresh_defaults.clone();
                match verdict {
                    Some(Reconciliation { fresh: false, preserved_fields }) => {
                        stats.preserved += 1;
                        annotations.extend_from(&preserved_fields);
                    }
                    _ => stats.fresh += 1,
                }
                SnapshotRecord { record, annotations }
            })
            .collect();

        debug!(fresh = stats.fresh, preserved = stats.preserved, "reconciled snapshot");
        (RecordSnapshot::from_records(records), stats)
    }
}

/// Newer only when both sides carry a timestamp and the remote one is later.
fn is_newer(remote: &RemoteRecord, cached: &RemoteRecord) -> bool {
    match (remote.last_modified, cached.last_modified) {
        (Some(remote_at), Some(cached_at)) => remote_at > cached_at,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use leadsync_domain::FieldValue;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn cached(id: &str, modified: i64, annotations: Fields) -> SnapshotRecord {
        SnapshotRecord { record: RemoteRecord::new(id).modified_at(at(modified)), annotations }
    }

    fn local_annotations() -> Fields {
        Fields::new().with(NEEDS_REVIEW_FIELD, false).with("draft_reply", FieldValue::markdown("Thanks!"))
    }

    #[test]
    fn unchanged_records_keep_annotations() {
        let local = RecordSnapshot::from_records(vec![cached("r1", 100, local_annotations())]);
        let remote = vec![RemoteRecord::new("r1").modified_at(at(100))];

        let verdicts = RecordReconciler::default().reconcile(&remote, &local);
        assert_eq!(verdicts["r1"], Reconciliation { fresh: false, preserved_fields: local_annotations() });

        let (snapshot, stats) = RecordReconciler::default().apply(remote, &local);
        let annotations = &snapshot.records[0].annotations;
        assert_eq!(annotations.get(NEEDS_REVIEW_FIELD), Some(&FieldValue::Checkbox(false)));
        assert_eq!(annotations.get("draft_reply"), Some(&FieldValue::markdown("Thanks!")));
        assert_eq!(stats, ReconcileStats { fresh: 0, preserved: 1 });
    }

    #[test]
    fn older_remote_copy_is_not_fresh() {
        let local = RecordSnapshot::from_records(vec![cached("r1", 200, local_annotations())]);
        let remote = vec![RemoteRecord::new("r1").modified_at(at(150))];
        assert!(!RecordReconciler::default().reconcile(&remote, &local)["r1"].fresh);
    }

    #[test]
    fn newer_remote_copy_resets_annotations() {
        let local = RecordSnapshot::from_records(vec![cached("r1", 100, local_annotations())]);
        let remote = vec![RemoteRecord::new("r1").modified_at(at(101))];

        let (snapshot, stats) = RecordReconciler::default().apply(remote, &local);
        let annotations = &snapshot.records[0].annotations;
        assert_eq!(annotations.get(NEEDS_REVIEW_FIELD), Some(&FieldValue::Checkbox(true)));
        assert_eq!(annotations.get(REPLY_UPLOADED_FIELD), Some(&FieldValue::Checkbox(false)));
        assert!(annotations.get("draft_reply").is_none());
        assert_eq!(stats.fresh, 1);
    }

    #[test]
    fn records_missing_locally_are_fresh() {
        let remote = vec![RemoteRecord::new("r9").modified_at(at(5))];
        let verdicts = RecordReconciler::default().reconcile(&remote, &RecordSnapshot::default());
        assert!(verdicts["r9"].fresh);
        assert!(verdicts["r9"].preserved_fields.is_empty());
    }

    #[test]
    fn missing_timestamps_preserve_local_state() {
        let local = RecordSnapshot::from_records(vec![cached("r1", 100, local_annotations())]);
        let remote = vec![RemoteRecord::new("r1")];
        assert!(!RecordReconciler::default().reconcile(&remote, &local)["r1"].fresh);
    }

    #[test]
    fn records_dropped_remotely_leave_the_snapshot() {
        let local = RecordSnapshot::from_records(vec![
            cached("r1", 100, local_annotations()),
            cached("gone", 100, local_annotations()),
        ]);
        let (snapshot, _) = RecordReconciler::default().apply(vec![RemoteRecord::new("r1")], &local);
        assert_eq!(snapshot.total_records, 1);
        assert_eq!(snapshot.records[0].record.id, "r1");
    }
}
