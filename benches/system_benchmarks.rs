use criterion::{criterion_group, criterion_main, Criterion};
use home_zenith::{MetricsStore, Sampler, SystemMetricSample, SystemSampleDraft, SystemSampler};

fn draft() -> SystemSampleDraft {
    SystemSampleDraft {
        cpu_usage: 25.5,
        memory_used: 3.7,
        memory_total: 8.0,
        disk_used: 120.4,
        disk_total: 500.0,
        temperature: Some(48.2),
        uptime: 86_400,
    }
}

/// Benchmark one full system sampling pass
fn bench_system_sampling(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");

    c.bench_function("system_sampling", |b| {
        b.to_async(&rt).iter(|| async {
            let mut sampler = SystemSampler::new().expect("Should create sampler");
            sampler.sample().await.expect("Should collect sample")
        })
    });
}

/// Benchmark JSON serialization of stored samples
fn bench_json_serialization(c: &mut Criterion) {
    let store = MetricsStore::open_in_memory(0).expect("Should open store");
    let sample = store.insert_system(&draft()).expect("Should insert sample");

    c.bench_function("json_serialization", |b| {
        b.iter(|| serde_json::to_string(&sample).expect("Should serialize"))
    });

    let json_string = serde_json::to_string(&sample).expect("Should serialize");
    c.bench_function("json_deserialization", |b| {
        b.iter(|| {
            serde_json::from_str::<SystemMetricSample>(&json_string).expect("Should deserialize")
        })
    });
}

/// Benchmark store insert throughput
fn bench_store_insert(c: &mut Criterion) {
    let store = MetricsStore::open_in_memory(0).expect("Should open store");
    let draft = draft();

    c.bench_function("store_insert_system", |b| {
        b.iter(|| store.insert_system(&draft).expect("Should insert sample"))
    });
}

criterion_group!(
    benches,
    bench_system_sampling,
    bench_json_serialization,
    bench_store_insert
);
criterion_main!(benches);
