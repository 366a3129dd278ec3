//! # Concurrency
//!
//! Threads hammer one shared engine. Afterwards the audit must pass and
//! the books must agree with what the threads saw succeed.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, indexed_account, TestEngine};
    use lending_engine::{EngineError, LendingApi};
    use shared_types::LoanState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_parallel_deposits_sum_exactly() {
        let t = TestEngine::new();
        let threads = 8;
        let per_thread = 250;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let engine = Arc::clone(&t.engine);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..per_thread {
                        engine.deposit(account(i as u8 + 1), 3).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let expected = (threads * per_thread * 3) as u128;
        assert_eq!(t.engine.pool_snapshot().tracked_balance, expected);
        assert_eq!(t.engine.list_lenders().len(), threads);
        assert!(t.engine.audit().is_ok());
    }

    #[test]
    fn test_duplicate_requests_race() {
        let t = TestEngine::new();
        let lender = account(0x11);
        let borrower = account(0x22);
        t.engine.deposit(lender, 1_000).unwrap();

        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));
        let accepted = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let engine = Arc::clone(&t.engine);
                let barrier = Arc::clone(&barrier);
                let accepted = Arc::clone(&accepted);
                thread::spawn(move || {
                    barrier.wait();
                    match engine.request_loan(borrower, lender, 50, 5) {
                        Ok(_) => {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(EngineError::DuplicateActiveLoan { .. }) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert_eq!(t.engine.pool_snapshot().escrowed_collateral, 5);
        assert_eq!(t.engine.recent_events().len(), 1);
    }

    #[test]
    fn test_funding_never_overdraws_a_lender() {
        let t = TestEngine::new();
        let lender = account(0x11);
        t.engine.deposit(lender, 1_000).unwrap();

        let borrowers: Vec<_> = (0..40u16).map(|i| indexed_account(0xB0, i)).collect();
        for b in &borrowers {
            t.engine.request_loan(*b, lender, 70, 7).unwrap();
        }

        let barrier = Arc::new(Barrier::new(borrowers.len()));
        let handles: Vec<_> = borrowers
            .iter()
            .map(|b| {
                let engine = Arc::clone(&t.engine);
                let barrier = Arc::clone(&barrier);
                let b = *b;
                thread::spawn(move || {
                    barrier.wait();
                    engine.fund_loan(lender, b).is_ok()
                })
            })
            .collect();
        let funded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // 1000 / 70 = 14 loans fit.
        assert_eq!(funded, 14);
        let position = t.engine.lender_contribution(lender);
        assert_eq!(position.reserved, 980);
        assert!(position.reserved <= position.contribution);
        assert!(t.engine.audit().is_ok());
    }

    #[test]
    fn test_mixed_workload_keeps_invariants() {
        let t = TestEngine::new();
        let lenders: Vec<_> = (0..4u16).map(|i| indexed_account(0xA0, i)).collect();
        for l in &lenders {
            t.engine.deposit(*l, 10_000).unwrap();
        }

        let workers = 8;
        let barrier = Arc::new(Barrier::new(workers));
        let handles: Vec<_> = (0..workers as u16)
            .map(|w| {
                let engine = Arc::clone(&t.engine);
                let barrier = Arc::clone(&barrier);
                let lenders = lenders.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for round in 0..50u16 {
                        let borrower = indexed_account(0xC0, w * 1_000 + round % 5);
                        let lender = lenders[usize::from(round) % lenders.len()];
                        let _ = engine.deposit(lender, 1);
                        if engine.request_loan(borrower, lender, 100, 10).is_ok() {
                            match round % 3 {
                                0 => {
                                    let _ = engine.cancel_loan(borrower);
                                }
                                _ => {
                                    if engine.fund_loan(lender, borrower).is_ok() && round % 3 == 1 {
                                        let _ = engine.repay_loan(borrower, 106);
                                    }
                                }
                            }
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let report = t.engine.audit().unwrap();
        let funded = t
            .engine
            .active_loans()
            .iter()
            .filter(|l| l.state == LoanState::Funded)
            .count();
        assert_eq!(report.funded_loans, funded);
        let pool = t.engine.pool_snapshot();
        assert_eq!(pool.committed, funded as u128 * 100);
        assert_eq!(pool.tracked_balance, report.tracked_balance);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_seeded_random_workload_balances_contributions() {
        use parking_lot::Mutex;
        use rand::{rngs::StdRng, Rng, SeedableRng};
        use std::collections::HashMap;

        let t = TestEngine::new();
        let lenders: Vec<_> = (0..3u16).map(|i| indexed_account(0xA0, i)).collect();
        for l in &lenders {
            t.engine.deposit(*l, 5_000).unwrap();
        }

        // lender -> credited amount (deposits plus earned interest)
        let credited: Arc<Mutex<HashMap<_, u128>>> = Arc::new(Mutex::new(HashMap::new()));

        let tasks = (0..6u64).map(|worker| {
            let engine = Arc::clone(&t.engine);
            let credited = Arc::clone(&credited);
            let lenders = lenders.clone();
            tokio::task::spawn_blocking(move || {
                let mut rng = StdRng::seed_from_u64(0x5EED + worker);
                for _ in 0..200 {
                    let lender = lenders[rng.gen_range(0..lenders.len())];
                    let borrower = indexed_account(0xD0, worker as u16 * 100 + rng.gen_range(0..4));
                    match rng.gen_range(0..4) {
                        0 => {
                            let amount = rng.gen_range(1..50u128);
                            if engine.deposit(lender, amount).is_ok() {
                                *credited.lock().entry(lender).or_default() += amount;
                            }
                        }
                        1 => {
                            let _ = engine.request_loan(borrower, lender, 100, 10);
                        }
                        2 => {
                            if let Some(loan) = engine.get_loan(borrower) {
                                let _ = engine.fund_loan(loan.lender, borrower);
                            }
                        }
                        _ => {
                            if let Some(loan) = engine.get_loan(borrower) {
                                if loan.state == LoanState::Funded
                                    && engine.repay_loan(borrower, loan.repay_amount).is_ok()
                                {
                                    *credited.lock().entry(loan.lender).or_default() +=
                                        loan.repay_amount - loan.requested_amount;
                                }
                            }
                        }
                    }
                }
            })
        });

        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        let credited = credited.lock();
        for l in &lenders {
            let expected = 5_000 + credited.get(l).copied().unwrap_or(0);
            assert_eq!(t.engine.lender_contribution(*l).contribution, expected);
        }
        assert!(t.engine.audit().is_ok());
    }
}
