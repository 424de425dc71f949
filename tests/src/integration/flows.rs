//! # Conversation Flows
//!
//! Full conversations through `SessionOrchestrator` over the built-in roster
//! and an in-memory ledger.
//!
//! ## Flows Tested
//!
//! 1. **Happy path**: start → upload → key → affirm → code issued
//! 2. **History continuation**: prior `G017_M0007` yields `G017_M0008`
//! 3. **Correction**: deny, re-enter a different key, affirm
//! 4. **Loop**: a second upload in the same session gets the next code
//! 5. **Cancellation**: nothing is recorded for a cancelled session

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::FixedOffset;
    use mcode_intake::{
        prompts, Choice, CodeLedger, InMemoryDirectory, InMemoryLedger, InboundEvent,
        IntakeConfig, OutboundEffect, SessionOrchestrator, SessionState,
    };

    use crate::integration::support::{history_row, issued_code, Conversant};

    type Orchestrator = SessionOrchestrator<InMemoryDirectory, InMemoryLedger>;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn config() -> IntakeConfig {
        IntakeConfig {
            record_offset: FixedOffset::east_opt(8 * 3600).unwrap(),
            ..IntakeConfig::default()
        }
    }

    fn orchestrator(ledger: InMemoryLedger) -> Orchestrator {
        SessionOrchestrator::new(
            config(),
            Arc::new(InMemoryDirectory::builtin()),
            Arc::new(ledger),
        )
    }

    fn ledger_of(orchestrator: &Orchestrator) -> &InMemoryLedger {
        orchestrator.allocator().ledger()
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_first_submission_gets_first_code() {
        let orchestrator = orchestrator(InMemoryLedger::new());
        let alice = Conversant::new(&orchestrator, "alice");

        assert_eq!(
            alice.start().await,
            vec![OutboundEffect::text(prompts::WELCOME)]
        );
        assert_eq!(
            alice.upload("clip.mp4").await,
            vec![OutboundEffect::text(prompts::ASK_IDENTITY)]
        );

        let confirm = alice.say("g017").await;
        assert_eq!(confirm.len(), 1);
        assert!(confirm[0]
            .message()
            .contains("Staff ID: G017\nName: KELVIN"));

        let issued = alice.decide(Choice::Affirm).await;
        assert_eq!(
            issued,
            vec![
                prompts::code_issued("G017_M0001"),
                OutboundEffect::text(prompts::UPLOAD_ANOTHER),
            ]
        );

        let records = ledger_of(&orchestrator).records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].to_columns(),
            [
                "2024-05-01",
                "Wednesday",
                "09:15:00",
                "GGG",
                "G017_KELVIN",
                "",
                "G017_M0001"
            ]
            .map(String::from)
        );
    }

    #[tokio::test]
    async fn test_history_continues_sequence() {
        let orchestrator = orchestrator(InMemoryLedger::with_records(vec![
            history_row("GGG", "G017_KELVIN", "G017_M0007"),
            history_row("GGG", "G003_ARIF", "G003_M0042"),
        ]));
        let alice = Conversant::new(&orchestrator, "alice");

        let effects = alice.submit("G017").await;
        assert_eq!(issued_code(&effects).as_deref(), Some("G017_M0008"));
        assert_eq!(ledger_of(&orchestrator).len(), 3);
    }

    #[tokio::test]
    async fn test_deny_then_correct_identity() {
        let orchestrator = orchestrator(InMemoryLedger::new());
        let alice = Conversant::new(&orchestrator, "alice");

        alice.start().await;
        alice.upload("clip.mp4").await;
        alice.say("G003").await;
        assert_eq!(
            alice.decide(Choice::Deny).await,
            vec![OutboundEffect::text(prompts::REENTER_IDENTITY)]
        );
        assert_eq!(
            orchestrator.state_of(alice.id()).await,
            Some(SessionState::AwaitingIdentity)
        );

        alice.say("TCO2008").await;
        let effects = alice.say("yes").await;
        assert_eq!(issued_code(&effects).as_deref(), Some("TCO2008_M0001"));

        let records = ledger_of(&orchestrator).records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "TCO2008_HAIKAL");
        assert_eq!(records[0].organization, "TCO");
    }

    #[tokio::test]
    async fn test_unknown_identity_is_reprompted() {
        let orchestrator = orchestrator(InMemoryLedger::new());
        let alice = Conversant::new(&orchestrator, "alice");

        alice.start().await;
        alice.upload("clip.mp4").await;
        for attempt in ["G999", "", "   "] {
            assert_eq!(
                alice.say(attempt).await,
                vec![OutboundEffect::text(prompts::IDENTITY_NOT_FOUND)]
            );
        }
        assert_eq!(
            orchestrator.state_of(alice.id()).await,
            Some(SessionState::AwaitingIdentity)
        );
        assert!(ledger_of(&orchestrator).is_empty());
    }

    #[tokio::test]
    async fn test_session_loops_for_another_video() {
        let orchestrator = orchestrator(InMemoryLedger::new());
        let alice = Conversant::new(&orchestrator, "alice");

        let first = alice.submit("G017").await;
        assert_eq!(issued_code(&first).as_deref(), Some("G017_M0001"));

        // No /start needed; the session is back to awaiting an upload.
        alice.upload("clip-2.mp4").await;
        alice.say("G017").await;
        let second = alice.decide(Choice::Affirm).await;
        assert_eq!(issued_code(&second).as_deref(), Some("G017_M0002"));
    }

    #[tokio::test]
    async fn test_text_instead_of_video_counts_as_upload() {
        let orchestrator = orchestrator(InMemoryLedger::new());
        let alice = Conversant::new(&orchestrator, "alice");

        alice.start().await;
        assert_eq!(
            alice.say("here you go").await,
            vec![OutboundEffect::text(prompts::ASK_IDENTITY)]
        );
        alice.say("G017").await;
        let effects = alice.decide(Choice::Affirm).await;
        assert_eq!(issued_code(&effects).as_deref(), Some("G017_M0001"));
    }

    #[tokio::test]
    async fn test_cancelled_session_records_nothing() {
        let orchestrator = orchestrator(InMemoryLedger::new());
        let alice = Conversant::new(&orchestrator, "alice");

        alice.start().await;
        alice.upload("clip.mp4").await;
        alice.say("G017").await;
        assert_eq!(
            alice.send(InboundEvent::Cancel).await,
            vec![OutboundEffect::text(prompts::CANCELLED)]
        );
        assert_eq!(
            alice.decide(Choice::Affirm).await,
            vec![OutboundEffect::text(prompts::PLEASE_START)]
        );
        assert!(ledger_of(&orchestrator).is_empty());

        // The ledger still reports nothing for G017.
        let history = ledger_of(&orchestrator)
            .records_for(&"G017".into())
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_ledger_failure_keeps_confirmation_pending() {
        let orchestrator = orchestrator(InMemoryLedger::new());
        let alice = Conversant::new(&orchestrator, "alice");

        alice.start().await;
        alice.upload("clip.mp4").await;
        alice.say("G017").await;

        let attempts = orchestrator.config().max_append_attempts;
        ledger_of(&orchestrator).fail_next_appends(attempts);
        assert_eq!(
            alice.decide(Choice::Affirm).await,
            vec![OutboundEffect::text(prompts::SUBMISSION_FAILED)]
        );
        assert_eq!(
            orchestrator.state_of(alice.id()).await,
            Some(SessionState::AwaitingConfirmation)
        );

        let effects = alice.decide(Choice::Affirm).await;
        assert_eq!(issued_code(&effects).as_deref(), Some("G017_M0001"));
    }
}
