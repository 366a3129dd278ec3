//! # Lending Engine Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | deposit | pool lock + in-memory commit |
//! | lifecycle | request → fund → repay for one borrower |
//! | audit | full recomputation over N loans |
//! | file commit | one fsync'd rewrite of the ledger file |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lending_engine::{
    EngineConfig, FileLedgerStore, LedgerStore, LendingApi, LendingEngine, ManualClock,
};
use pl_tests::fixtures::{account, indexed_account, TestEngine, GENESIS};
use std::sync::Arc;
use std::time::Duration;

fn bench_deposit(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine-deposit");
    group.measurement_time(Duration::from_secs(5));

    let t = TestEngine::new();
    let lender = account(0x11);
    group.throughput(Throughput::Elements(1));
    group.bench_function("deposit_single_lender", |b| {
        b.iter(|| black_box(t.engine.deposit(lender, 1).is_ok()))
    });
    group.finish();
}

fn bench_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine-lifecycle");
    group.measurement_time(Duration::from_secs(5));

    let t = TestEngine::new();
    let lender = account(0x11);
    let borrower = account(0x22);
    t.engine.deposit(lender, u64::MAX as u128).unwrap();

    group.bench_function("request_fund_repay", |b| {
        b.iter(|| {
            let view = t.engine.request_loan(borrower, lender, 1_000, 100).unwrap();
            t.engine.fund_loan(lender, borrower).unwrap();
            black_box(t.engine.repay_loan(borrower, view.repay_amount).unwrap())
        })
    });
    group.finish();
}

fn bench_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine-audit");

    for loans in [10u16, 100, 1_000] {
        let t = TestEngine::new();
        let lender = account(0x11);
        t.engine.deposit(lender, u64::MAX as u128).unwrap();
        for i in 0..loans {
            let borrower = indexed_account(0xB0, i);
            t.engine.request_loan(borrower, lender, 1_000, 100).unwrap();
            if i % 2 == 0 {
                t.engine.fund_loan(lender, borrower).unwrap();
            }
        }

        group.throughput(Throughput::Elements(u64::from(loans)));
        group.bench_with_input(BenchmarkId::new("full_audit", loans), &t, |b, t| {
            b.iter(|| black_box(t.engine.audit().unwrap()))
        });
    }
    group.finish();
}

fn bench_file_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine-file-store");
    group.sample_size(20);

    let dir = tempfile::TempDir::new().unwrap();
    let store: Arc<dyn LedgerStore> =
        Arc::new(FileLedgerStore::open(dir.path().join("ledger.bin")).unwrap());
    let engine = LendingEngine::open(
        EngineConfig::default(),
        store,
        Arc::new(ManualClock::new(GENESIS)),
    )
    .unwrap();
    let lender = account(0x11);

    group.bench_function("deposit_fsync", |b| {
        b.iter(|| black_box(engine.deposit(lender, 1).is_ok()))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_deposit,
    bench_lifecycle,
    bench_audit,
    bench_file_commit
);
criterion_main!(benches);
