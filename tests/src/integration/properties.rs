//! # Ledger Laws
//!
//! Random operation sequences against one engine. After every step the
//! books must balance, and a refused step must leave them untouched.

#[cfg(test)]
mod tests {
    use crate::fixtures::{indexed_account, TestEngine};
    use lending_engine::{LendingApi, LendingEngine};
    use proptest::prelude::*;
    use shared_types::{AccountId, LoanState};

    #[derive(Debug, Clone)]
    enum Op {
        Deposit { lender: u16, amount: u128 },
        Request { borrower: u16, lender: u16, amount: u128, collateral: u128 },
        Cancel { borrower: u16 },
        Fund { lender: u16, borrower: u16 },
        Repay { borrower: u16, exact: bool },
        Liquidate { lender: u16, borrower: u16 },
        Advance { secs: u64 },
    }

    fn lender(i: u16) -> AccountId {
        indexed_account(0xA0, i)
    }

    fn borrower(i: u16) -> AccountId {
        indexed_account(0xB0, i)
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3u16, 1..500u128).prop_map(|(lender, amount)| Op::Deposit { lender, amount }),
            (0..4u16, 0..3u16, 0..300u128, 0..60u128).prop_map(
                |(borrower, lender, amount, collateral)| Op::Request {
                    borrower,
                    lender,
                    amount,
                    collateral
                }
            ),
            (0..4u16).prop_map(|borrower| Op::Cancel { borrower }),
            (0..3u16, 0..4u16).prop_map(|(lender, borrower)| Op::Fund { lender, borrower }),
            (0..4u16, any::<bool>()).prop_map(|(borrower, exact)| Op::Repay { borrower, exact }),
            (0..3u16, 0..4u16).prop_map(|(lender, borrower)| Op::Liquidate { lender, borrower }),
            (0..90u64).prop_map(|secs| Op::Advance { secs }),
        ]
    }

    fn apply(t: &TestEngine, op: &Op) -> bool {
        let e = &t.engine;
        match *op {
            Op::Deposit { lender: l, amount } => e.deposit(lender(l), amount).is_ok(),
            Op::Request {
                borrower: b,
                lender: l,
                amount,
                collateral,
            } => e.request_loan(borrower(b), lender(l), amount, collateral).is_ok(),
            Op::Cancel { borrower: b } => e.cancel_loan(borrower(b)).is_ok(),
            Op::Fund {
                lender: l,
                borrower: b,
            } => e.fund_loan(lender(l), borrower(b)).is_ok(),
            Op::Repay { borrower: b, exact } => {
                let due = e.get_loan(borrower(b)).map_or(1, |loan| loan.repay_amount);
                let paid = if exact { due } else { due + 1 };
                e.repay_loan(borrower(b), paid).is_ok()
            }
            Op::Liquidate {
                lender: l,
                borrower: b,
            } => e.liquidate_collateral(lender(l), borrower(b)).is_ok(),
            Op::Advance { secs } => {
                t.clock.advance(secs);
                true
            }
        }
    }

    fn check_books(engine: &LendingEngine) -> Result<(), TestCaseError> {
        prop_assert!(engine.audit().is_ok());

        let pool = engine.pool_snapshot();
        let lenders = engine.list_lenders();
        let contributed: u128 = lenders.iter().map(|l| l.contribution).sum();
        prop_assert_eq!(pool.tracked_balance, contributed);
        for l in &lenders {
            prop_assert!(l.reserved <= l.contribution);
        }

        let active = engine.active_loans();
        let committed: u128 = active
            .iter()
            .filter(|l| l.state == LoanState::Funded)
            .map(|l| l.requested_amount)
            .sum();
        let escrowed: u128 = active.iter().map(|l| l.collateral_amount).sum();
        prop_assert_eq!(pool.committed, committed);
        prop_assert_eq!(pool.escrowed_collateral, escrowed);
        prop_assert_eq!(pool.actual_balance, pool.tracked_balance - pool.committed);
        prop_assert_eq!(pool.custody_balance, pool.actual_balance + pool.escrowed_collateral);

        for loan in &active {
            prop_assert!(loan.collateral_amount * 10 >= loan.requested_amount);
            prop_assert!(loan.borrower != loan.lender);
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_books_balance_after_every_step(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let t = TestEngine::new();
            for op in &ops {
                let before = t.engine.pool_snapshot();
                let events_before = t.engine.recent_events().first().map(|e| e.sequence);
                let ok = apply(&t, op);
                if !ok {
                    prop_assert_eq!(t.engine.pool_snapshot(), before);
                    prop_assert_eq!(
                        t.engine.recent_events().first().map(|e| e.sequence),
                        events_before
                    );
                }
                check_books(&t.engine)?;
            }
        }

        #[test]
        fn test_restart_rebuilds_same_books(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let t = TestEngine::new();
            for op in &ops {
                apply(&t, op);
            }
            let reopened = t.reopen();
            prop_assert_eq!(reopened.pool_snapshot(), t.engine.pool_snapshot());
            prop_assert_eq!(reopened.list_lenders(), t.engine.list_lenders());
            prop_assert_eq!(reopened.active_loans(), t.engine.active_loans());
        }
    }
}
