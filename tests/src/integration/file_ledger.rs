//! # Durable Ledger
//!
//! Conversations over `FileLedger`: the on-disk row layout, continuation of
//! the sequence across a restart, concurrent confirmations landing as
//! whole, distinct rows, and an undecodable row holding submissions back.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use chrono::FixedOffset;
    use mcode_intake::{
        prompts, FileLedger, InMemoryDirectory, IntakeConfig, OutboundEffect, SessionOrchestrator,
        SessionState, SubmissionRecord,
    };

    use crate::integration::support::{issued_code, Conversant};

    type Orchestrator = SessionOrchestrator<InMemoryDirectory, FileLedger>;

    fn orchestrator(path: &Path) -> Orchestrator {
        let config = IntakeConfig {
            record_offset: FixedOffset::east_opt(8 * 3600).unwrap(),
            ..IntakeConfig::default()
        };
        SessionOrchestrator::new(
            config,
            Arc::new(InMemoryDirectory::builtin()),
            Arc::new(FileLedger::open(path).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_row_layout_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let orchestrator = orchestrator(&path);

        let alice = Conversant::new(&orchestrator, "alice");
        let effects = alice.submit("GGD005").await;
        assert_eq!(issued_code(&effects).as_deref(), Some("GGD005_M0001"));

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "[\"2024-05-01\",\"Wednesday\",\"09:15:00\",\"GGD\",\"GGD005_ATIKA (ADMIN)\",\"\",\"GGD005_M0001\"]\n"
        );

        let row: SubmissionRecord = serde_json::from_str(contents.trim_end()).unwrap();
        assert!(row.owned_by(&"GGD005".into()));
    }

    #[tokio::test]
    async fn test_sequence_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let orchestrator = orchestrator(&path);
            let alice = Conversant::new(&orchestrator, "alice");
            alice.submit("G017").await;
            let effects = alice.submit("G017").await;
            assert_eq!(issued_code(&effects).as_deref(), Some("G017_M0002"));
        }

        let orchestrator = orchestrator(&path);
        let bob = Conversant::new(&orchestrator, "bob");
        let effects = bob.submit("g017").await;
        assert_eq!(issued_code(&effects).as_deref(), Some("G017_M0003"));
    }

    #[tokio::test]
    async fn test_torn_row_blocks_submission() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        fs::write(
            &path,
            "[\"2024-05-01\",\"Wednesday\",\"09:15:00\",\"GGG\",\"G017_KELVIN\",\"\",\"G017_M0001\"]\n[\"2024-05-01\",\"Wedn\n",
        )
        .unwrap();
        let orchestrator = orchestrator(&path);

        let alice = Conversant::new(&orchestrator, "alice");
        assert_eq!(
            alice.submit("G003").await,
            vec![OutboundEffect::text(prompts::SUBMISSION_BLOCKED)]
        );
        assert_eq!(
            orchestrator.state_of(alice.id()).await,
            Some(SessionState::AwaitingConfirmation)
        );
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirmations_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let orchestrator = Arc::new(orchestrator(&path));

        let mut handles = Vec::new();
        for n in 0..6 {
            let orchestrator = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                let conversant = Conversant::new(orchestrator.as_ref(), &format!("c{n}"));
                issued_code(&conversant.submit("G003").await)
            }));
        }

        let mut issued = BTreeSet::new();
        for handle in handles {
            assert!(issued.insert(handle.await.unwrap().unwrap()));
        }

        let on_disk: BTreeSet<String> = fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<SubmissionRecord>(line).unwrap().code)
            .collect();
        let expected: BTreeSet<String> = (1..=6).map(|n| format!("G003_M{n:04}")).collect();
        assert_eq!(issued, expected);
        assert_eq!(on_disk, expected);
    }
}
