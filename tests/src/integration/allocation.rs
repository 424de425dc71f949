//! # Allocation Under Contention
//!
//! Several conversants confirm the same identity at once; every one of them
//! must receive a distinct code, and the ledger must hold exactly one row per
//! issued code. Malformed history blocks only the identity it belongs to.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    use mcode_intake::{
        prompts, Choice, InMemoryDirectory, InMemoryLedger, IntakeConfig, OutboundEffect,
        SessionOrchestrator, SessionState,
    };

    use crate::integration::support::{history_row, issued_code, Conversant};

    type Orchestrator = SessionOrchestrator<InMemoryDirectory, InMemoryLedger>;

    fn orchestrator(ledger: InMemoryLedger) -> Arc<Orchestrator> {
        Arc::new(SessionOrchestrator::new(
            IntakeConfig::default(),
            Arc::new(InMemoryDirectory::builtin()),
            Arc::new(ledger),
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirmations_get_unique_codes() {
        const CONVERSANTS: usize = 12;

        // Slow scans widen the window between reading history and appending.
        let orchestrator = orchestrator(
            InMemoryLedger::with_records(vec![history_row("GGG", "G017_KELVIN", "G017_M0003")])
                .with_scan_delay(Duration::from_millis(5)),
        );

        // Bring everyone to the confirmation prompt first.
        for n in 0..CONVERSANTS {
            let conversant = Conversant::new(orchestrator.as_ref(), &format!("c{n}"));
            conversant.start().await;
            conversant.upload("clip.mp4").await;
            conversant.say("G017").await;
        }

        let mut handles = Vec::new();
        for n in 0..CONVERSANTS {
            let orchestrator = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                let conversant = Conversant::new(orchestrator.as_ref(), &format!("c{n}"));
                issued_code(&conversant.decide(Choice::Affirm).await)
            }));
        }

        let mut codes = BTreeSet::new();
        for handle in handles {
            let code = handle.await.unwrap().expect("every confirmation issues a code");
            assert!(codes.insert(code), "duplicate code issued");
        }

        let expected: BTreeSet<String> = (4..4 + CONVERSANTS)
            .map(|n| format!("G017_M{n:04}"))
            .collect();
        assert_eq!(codes, expected);
        assert_eq!(orchestrator.allocator().ledger().len(), CONVERSANTS + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_different_identities_allocate_independently() {
        let orchestrator = orchestrator(InMemoryLedger::new());

        let mut handles = Vec::new();
        for (who, key) in [("a", "G003"), ("b", "G017"), ("c", "KS001"), ("d", "WJ001")] {
            let orchestrator = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                let conversant = Conversant::new(orchestrator.as_ref(), who);
                issued_code(&conversant.submit(key).await)
            }));
        }

        let mut codes = Vec::new();
        for handle in handles {
            codes.push(handle.await.unwrap().unwrap());
        }
        codes.sort();
        assert_eq!(
            codes,
            vec!["G003_M0001", "G017_M0001", "KS001_M0001", "WJ001_M0001"]
        );
    }

    #[tokio::test]
    async fn test_malformed_history_blocks_only_its_identity() {
        let orchestrator = orchestrator(InMemoryLedger::with_records(vec![
            history_row("GGG", "G017_KELVIN", "G017_M0002"),
            history_row("GGG", "G017_KELVIN", "G017_Mxx"),
            history_row("GGG", "G003_ARIF", "G003_M0005"),
        ]));

        let alice = Conversant::new(orchestrator.as_ref(), "alice");
        assert_eq!(
            alice.submit("G017").await,
            vec![OutboundEffect::text(prompts::SUBMISSION_BLOCKED)]
        );
        assert_eq!(
            orchestrator.state_of(alice.id()).await,
            Some(SessionState::AwaitingConfirmation)
        );

        let bob = Conversant::new(orchestrator.as_ref(), "bob");
        let effects = bob.submit("G003").await;
        assert_eq!(issued_code(&effects).as_deref(), Some("G003_M0006"));
        assert_eq!(orchestrator.allocator().ledger().len(), 4);
    }

    #[tokio::test]
    async fn test_codes_are_never_reissued_after_gaps() {
        let orchestrator = orchestrator(InMemoryLedger::with_records(vec![
            history_row("GGG", "G017_KELVIN", "G017_M0001"),
            history_row("GGG", "G017_KELVIN", "G017_M0009"),
            history_row("GGG", "G017_KELVIN", "G017_M0004"),
        ]));

        let alice = Conversant::new(orchestrator.as_ref(), "alice");
        let effects = alice.submit("G017").await;
        assert_eq!(issued_code(&effects).as_deref(), Some("G017_M0010"));
    }
}
