//! # Lifecycle Scenarios
//!
//! Lender deposits, borrower requests, lender funds, and the loan ends
//! repaid, liquidated or cancelled. Amounts use the default 6% rate, 10%
//! minimum collateral and 60 second window.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, TestEngine, GENESIS};
    use lending_engine::{EngineError, LendingApi, LiquidationStatus};
    use shared_bus::EventKind;
    use shared_types::LoanState;

    #[test]
    fn test_happy_path_repay() {
        let t = TestEngine::new();
        let (lender, borrower) = (account(0x11), account(0x22));

        t.engine.deposit(lender, 100).unwrap();
        let requested = t.engine.request_loan(borrower, lender, 50, 5).unwrap();
        assert_eq!(requested.repay_amount, 53);
        assert_eq!(t.engine.pending_requests_for(lender).len(), 1);

        t.engine.fund_loan(lender, borrower).unwrap();
        assert!(t.engine.pending_requests_for(lender).is_empty());
        assert_eq!(t.engine.pool_snapshot().actual_balance, 50);

        t.clock.advance(30);
        let repaid = t.engine.repay_loan(borrower, 53).unwrap();
        assert_eq!(repaid.state, LoanState::Repaid);
        assert_eq!(repaid.closed_at, Some(GENESIS + 30));

        let pool = t.engine.pool_snapshot();
        assert_eq!(pool.tracked_balance, 103);
        assert_eq!(pool.actual_balance, 103);
        assert_eq!(pool.escrowed_collateral, 0);
        assert_eq!(t.engine.lender_contribution(lender).contribution, 103);
        assert!(t.engine.active_loans().is_empty());
    }

    #[test]
    fn test_liquidation_after_window() {
        let t = TestEngine::new();
        let (lender, borrower) = (account(0x11), account(0x22));
        t.engine.deposit(lender, 100).unwrap();
        t.engine.request_loan(borrower, lender, 50, 5).unwrap();
        t.engine.fund_loan(lender, borrower).unwrap();

        t.clock.advance(60);
        assert!(matches!(
            t.engine.liquidate_collateral(lender, borrower),
            Err(EngineError::NotOverdue { .. })
        ));
        assert_eq!(
            t.engine.repayment_status(borrower).unwrap(),
            LiquidationStatus::Current { remaining_secs: 0 }
        );

        t.clock.advance(1);
        let defaulted = t.engine.liquidate_collateral(lender, borrower).unwrap();
        assert_eq!(defaulted.state, LoanState::Defaulted);
        assert_eq!(defaulted.shortfall, Some(45));
        assert_eq!(t.engine.pool_snapshot().tracked_balance, 50);
        assert!(t.engine.audit().is_ok());
    }

    #[test]
    fn test_under_collateralized_request() {
        let t = TestEngine::new();
        let (lender, borrower) = (account(0x11), account(0x22));
        t.engine.deposit(lender, 100).unwrap();

        assert!(matches!(
            t.engine.request_loan(borrower, lender, 50, 4),
            Err(EngineError::UnderCollateralized { minimum: 5, .. })
        ));
        assert!(t.engine.get_loan(borrower).is_none());
        assert_eq!(t.engine.pool_snapshot().escrowed_collateral, 0);
    }

    #[test]
    fn test_cancel_then_request_again() {
        let t = TestEngine::new();
        let (lender, borrower) = (account(0x11), account(0x22));
        t.engine.deposit(lender, 100).unwrap();
        t.engine.request_loan(borrower, lender, 50, 5).unwrap();
        t.engine.cancel_loan(borrower).unwrap();

        assert!(matches!(
            t.engine.fund_loan(lender, borrower),
            Err(EngineError::WrongState {
                state: LoanState::Cancelled,
                ..
            })
        ));
        let again = t.engine.request_loan(borrower, lender, 80, 8).unwrap();
        assert_eq!(again.state, LoanState::Requested);
        assert_eq!(t.engine.pool_snapshot().escrowed_collateral, 8);
    }

    #[test]
    fn test_two_lenders_share_pool_but_not_funds() {
        let t = TestEngine::new();
        let (alice, bob) = (account(0xA1), account(0xB0));
        let borrower = account(0x22);
        t.engine.deposit(alice, 30).unwrap();
        t.engine.deposit(bob, 70).unwrap();

        // The pool covers 60, but the loan names alice, who only has 30.
        t.engine.request_loan(borrower, alice, 60, 6).unwrap();
        assert!(matches!(
            t.engine.fund_loan(alice, borrower),
            Err(EngineError::InsufficientContribution {
                required: 60,
                available: 30,
                ..
            })
        ));
        assert!(matches!(
            t.engine.fund_loan(bob, borrower),
            Err(EngineError::WrongLender { .. })
        ));

        t.engine.cancel_loan(borrower).unwrap();
        t.engine.request_loan(borrower, bob, 60, 6).unwrap();
        t.engine.fund_loan(bob, borrower).unwrap();
        assert_eq!(t.engine.lender_contribution(bob).available, 10);
        assert_eq!(t.engine.lender_contribution(alice).available, 30);
    }

    #[test]
    fn test_request_capped_by_available_pool() {
        let t = TestEngine::new();
        let lender = account(0x11);
        t.engine.deposit(lender, 100).unwrap();
        t.engine.request_loan(account(0x21), lender, 80, 8).unwrap();
        t.engine.fund_loan(lender, account(0x21)).unwrap();

        assert!(matches!(
            t.engine.request_loan(account(0x22), lender, 30, 3),
            Err(EngineError::InsufficientPoolFunds {
                requested: 30,
                available: 20
            })
        ));
        assert!(t.engine.request_loan(account(0x22), lender, 20, 2).is_ok());
    }

    #[test]
    fn test_recent_events_tell_the_story() {
        let t = TestEngine::new();
        let (lender, borrower) = (account(0x11), account(0x22));
        t.engine.deposit(lender, 100).unwrap();
        t.engine.request_loan(borrower, lender, 50, 5).unwrap();
        t.engine.fund_loan(lender, borrower).unwrap();
        t.engine.repay_loan(borrower, 53).unwrap();

        let kinds: Vec<EventKind> = t.engine.recent_events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Repaid, EventKind::Funded, EventKind::Requested]
        );
    }

    #[test]
    fn test_quote_matches_request() {
        let t = TestEngine::new();
        let lender = account(0x11);
        t.engine.deposit(lender, 10_000).unwrap();
        for amount in [1u128, 17, 50, 999, 5_000] {
            let quote = t.engine.quote_repayment(amount).unwrap();
            let view = t
                .engine
                .request_loan(account(0x22), lender, amount, amount)
                .unwrap();
            assert_eq!(view.repay_amount, quote);
            t.engine.cancel_loan(account(0x22)).unwrap();
        }
    }
}
