use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use leadsync_core::sync::FieldGuard;
use leadsync_core::RecordReconciler;
use leadsync_domain::constants::NEEDS_REVIEW_FIELD;
use leadsync_domain::{FieldValue, Fields, RecordSnapshot, RemoteRecord, SnapshotRecord};

const RECORDS: usize = 5_000;

fn remote_records(offset_secs: i64) -> Vec<RemoteRecord> {
    (0..RECORDS)
        .map(|idx| {
            let modified = Utc.timestamp_opt(1_700_000_000 + idx as i64 + offset_secs, 0).single().unwrap();
            let mut record = RemoteRecord::new(format!("rec-{idx}")).modified_at(modified);
            record.fields.insert("Lead ID".into(), serde_json::json!(idx.to_string()));
            record
        })
        .collect()
}

fn local_snapshot() -> RecordSnapshot {
    let records = remote_records(0)
        .into_iter()
        .map(|record| SnapshotRecord { record, annotations: Fields::new().with(NEEDS_REVIEW_FIELD, false) })
        .collect();
    RecordSnapshot::from_records(records)
}

fn reconcile_benchmark(c: &mut Criterion) {
    let reconciler = RecordReconciler::default();
    let local = local_snapshot();
    let unchanged = remote_records(0);
    // Every other record moved forward in time
    let half_changed: Vec<_> = remote_records(0)
        .into_iter()
        .zip(remote_records(60))
        .enumerate()
        .map(|(idx, (same, moved))| if idx % 2 == 0 { same } else { moved })
        .collect();

    let mut group = c.benchmark_group("record_reconciler");
    group.sample_size(20);

    group.bench_function("apply_unchanged", |b| {
        b.iter(|| reconciler.apply(black_box(unchanged.clone()), black_box(&local)));
    });
    group.bench_function("apply_half_changed", |b| {
        b.iter(|| reconciler.apply(black_box(half_changed.clone()), black_box(&local)));
    });

    group.finish();
}

fn field_guard_benchmark(c: &mut Criterion) {
    let guard = FieldGuard::new(9_500);
    let fields = Fields::new()
        .with("Customer", "Ada Tester")
        .with("Message", FieldValue::markdown("x".repeat(20_000)))
        .with("Notes", "y".repeat(12_000));

    c.bench_function("field_guard_shape", |b| b.iter(|| guard.shape(black_box(&fields))));
}

criterion_group!(benches, reconcile_benchmark, field_guard_benchmark);
criterion_main!(benches);
