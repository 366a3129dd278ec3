//! # Event Feed
//!
//! Subscribers see every committed transition in commit order and nothing
//! from rejected calls.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, TestEngine};
    use lending_engine::LendingApi;
    use shared_bus::{EventFilter, EventKind};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_stream_sees_lifecycle_in_order() {
        let t = TestEngine::new();
        let mut stream = t.engine.subscribe_events();
        let (lender, borrower) = (account(0x11), account(0x22));

        t.engine.deposit(lender, 100).unwrap();
        t.engine.request_loan(borrower, lender, 50, 5).unwrap();
        let _ = t.engine.request_loan(borrower, lender, 50, 5);
        t.engine.fund_loan(lender, borrower).unwrap();
        t.engine.repay_loan(borrower, 53).unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let event = timeout(Duration::from_millis(200), stream.next())
                .await
                .expect("timeout")
                .expect("stream ended");
            seen.push(event);
        }
        let kinds: Vec<EventKind> = seen.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Requested, EventKind::Funded, EventKind::Repaid]
        );
        assert!(seen.windows(2).all(|w| w[0].sequence < w[1].sequence));
        assert!(seen.iter().all(|e| e.borrower == borrower));

        // The duplicate request published nothing.
        assert!(timeout(Duration::from_millis(50), stream.next()).await.is_err());
    }

    #[tokio::test]
    async fn test_filtered_stream_by_account() {
        let t = TestEngine::new();
        let lender = account(0x11);
        let watched = account(0x22);
        let mut stream = t
            .engine
            .subscribe_filtered(EventFilter::all().with_account(watched));

        t.engine.deposit(lender, 1_000).unwrap();
        t.engine.request_loan(account(0x33), lender, 50, 5).unwrap();
        t.engine.request_loan(watched, lender, 60, 6).unwrap();

        let event = timeout(Duration::from_millis(200), stream.next())
            .await
            .expect("timeout")
            .expect("stream ended");
        assert_eq!(event.borrower, watched);
        assert_eq!(event.amount, 60);
    }

    #[tokio::test]
    async fn test_concurrent_publishers_keep_sequence_order() {
        let t = TestEngine::new();
        let mut stream = t.engine.subscribe_events();
        let lender = account(0x11);
        t.engine.deposit(lender, 100_000).unwrap();

        let mut tasks = Vec::new();
        for i in 0..20u8 {
            let engine = Arc::clone(&t.engine);
            tasks.push(tokio::task::spawn_blocking(move || {
                engine.request_loan(account(0x40 + i), lender, 100, 10).unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut last = 0;
        for _ in 0..20 {
            let event = timeout(Duration::from_millis(200), stream.next())
                .await
                .expect("timeout")
                .expect("stream ended");
            assert!(event.sequence > last);
            last = event.sequence;
        }
    }

    #[test]
    fn test_recent_events_cap() {
        let t = TestEngine::new();
        let lender = account(0x11);
        t.engine.deposit(lender, 1_000).unwrap();
        for i in 0..12u8 {
            t.engine
                .request_loan(account(0x50 + i), lender, 10, 1)
                .unwrap();
        }
        let recent = t.engine.recent_events();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].borrower, account(0x50 + 11));
        assert_eq!(recent[9].borrower, account(0x50 + 2));
    }
}
