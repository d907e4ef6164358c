//! Conversation orchestrator — sequences one exchange end to end:
//! lookup, persist inbound turn, filter, assemble, complete, persist reply.
//!
//! No retries anywhere in this chain. A gateway failure degrades the turn
//! instead of failing the request; the HTTP layer still answers 200 with a
//! `success: false` body.

use tracing::{error, warn};
use uuid::Uuid;

use crate::counseling::assembler::{assemble, HISTORY_WINDOW};
use crate::counseling::cache::TurnCache;
use crate::counseling::filter::{filter_programs, FilterCriteria};
use crate::errors::AppError;
use crate::llm_client::{CompletionGateway, SamplingConfig};
use crate::models::student::{ConversationTurn, TurnRole};
use crate::programs::repo::ProgramRepo;
use crate::students::repo::StudentRepo;

/// Terminal outcome of one conversational exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Success { response: String },
    Degraded { error: String },
}

pub async fn handle_turn(
    students: &StudentRepo,
    programs: &ProgramRepo,
    gateway: &dyn CompletionGateway,
    cache: &TurnCache,
    student_id: Uuid,
    message: &str,
) -> Result<TurnOutcome, AppError> {
    let text = message.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "message text must not be empty".to_string(),
        ));
    }

    let student = students
        .get(student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student with ID {student_id} not found")))?;

    // History snapshot from before this turn; the assembler appends the new
    // message itself.
    let history = match cache.recent(student_id, HISTORY_WINDOW) {
        Some(turns) => turns,
        None => {
            let messages = &student.conversation_history.messages;
            cache.seed(student_id, messages);
            messages[messages.len().saturating_sub(HISTORY_WINDOW)..].to_vec()
        }
    };

    let user_turn = ConversationTurn::now(TurnRole::User, text);
    cache.push(student_id, user_turn.clone());
    if let Err(e) = students.append_turn(student_id, user_turn).await {
        // Losing the inbound turn is tolerable; losing the exchange is not.
        // Drop the now-diverged cache entry so the next turn reseeds.
        warn!(%student_id, "failed to persist inbound turn: {e}");
        cache.invalidate(student_id);
    }

    let criteria = FilterCriteria::from_profile(&student);
    let catalog = programs.list().await?;
    let candidates = filter_programs(&catalog, &criteria);

    let prompt = assemble(&student, &candidates, &history, text);

    match gateway.complete(&prompt, &SamplingConfig::default()).await {
        Ok(response) => {
            let reply = ConversationTurn::now(TurnRole::Assistant, response.clone());
            cache.push(student_id, reply.clone());
            students.append_turn(student_id, reply).await?;
            Ok(TurnOutcome::Success { response })
        }
        Err(e) => {
            error!(%student_id, "completion failed: {e}");
            let note = ConversationTurn::now(TurnRole::System, format!("Error in chat: {e}"));
            cache.push(student_id, note.clone());
            if let Err(persist) = students.append_turn(student_id, note).await {
                warn!(%student_id, "failed to record chat error turn: {persist}");
                cache.invalidate(student_id);
            }
            Ok(TurnOutcome::Degraded {
                error: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counseling::cache::TURN_CAPACITY;
    use crate::llm_client::{ChatMessage, LlmError};
    use crate::models::program::{Curriculum, ProgramLevel, Requirements};
    use crate::models::program::ProgramCreate;
    use crate::models::student::StudentCreate;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted gateway: pops one pre-queued result per call and records
    /// the prompts it saw.
    #[derive(Default)]
    struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
        calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn with_replies(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _sampling: &SamplingConfig,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyChoices))
        }
    }

    struct Fixture {
        students: StudentRepo,
        programs: ProgramRepo,
        cache: TurnCache,
    }

    fn fixture() -> Fixture {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        Fixture {
            students: StudentRepo::new(store.clone()),
            programs: ProgramRepo::new(store),
            cache: TurnCache::new(TURN_CAPACITY),
        }
    }

    async fn seed_student(fixture: &Fixture) -> Uuid {
        fixture
            .students
            .create(StudentCreate {
                name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                educational_qualifications: vec![],
                preferred_locations: vec!["Canada".to_string()],
                preferred_level: ProgramLevel::Postgraduate,
                preferred_fields_of_study: vec!["Data Science".to_string()],
                budget: 20000,
                special_requirements: vec![],
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_program(fixture: &Fixture, title: &str, location: &str, budget: u32) {
        fixture
            .programs
            .create(ProgramCreate {
                title: title.to_string(),
                institution: "Test University".to_string(),
                overview: "overview".to_string(),
                location: location.to_string(),
                level: ProgramLevel::Postgraduate,
                field_of_study: "Data Science".to_string(),
                budget,
                duration: "2 years".to_string(),
                curriculum: Curriculum::default(),
                requirements: Requirements::default(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_student_short_circuits_before_gateway() {
        let fixture = fixture();
        let gateway = ScriptedGateway::default();
        let err = handle_turn(
            &fixture.students,
            &fixture.programs,
            &gateway,
            &fixture.cache,
            Uuid::new_v4(),
            "hello",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_before_any_lookup() {
        let fixture = fixture();
        let gateway = ScriptedGateway::default();
        let err = handle_turn(
            &fixture.students,
            &fixture.programs,
            &gateway,
            &fixture.cache,
            Uuid::new_v4(),
            "   ",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_turn_appends_user_then_assistant() {
        let fixture = fixture();
        let student_id = seed_student(&fixture).await;
        let gateway =
            ScriptedGateway::with_replies(vec![Ok("I recommend the MSc.".to_string())]);

        let outcome = handle_turn(
            &fixture.students,
            &fixture.programs,
            &gateway,
            &fixture.cache,
            student_id,
            "which program fits me?",
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Success {
                response: "I recommend the MSc.".to_string()
            }
        );
        let log = fixture
            .students
            .get(student_id)
            .await
            .unwrap()
            .unwrap()
            .conversation_history;
        let roles: Vec<TurnRole> = log.messages.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TurnRole::User, TurnRole::Assistant]);
        assert_eq!(log.messages[0].content, "which program fits me?");
    }

    #[tokio::test]
    async fn test_gateway_failure_degrades_and_records_system_turn() {
        let fixture = fixture();
        let student_id = seed_student(&fixture).await;
        let gateway = ScriptedGateway::with_replies(vec![Err(LlmError::Api {
            status: 500,
            message: "upstream exploded".to_string(),
        })]);

        let outcome = handle_turn(
            &fixture.students,
            &fixture.programs,
            &gateway,
            &fixture.cache,
            student_id,
            "hello",
        )
        .await
        .unwrap();

        match outcome {
            TurnOutcome::Degraded { error } => assert!(error.contains("500")),
            other => panic!("expected Degraded, got {other:?}"),
        }
        let log = fixture
            .students
            .get(student_id)
            .await
            .unwrap()
            .unwrap()
            .conversation_history;
        let roles: Vec<TurnRole> = log.messages.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TurnRole::User, TurnRole::System]);
        assert!(log.messages[1].content.starts_with("Error in chat:"));
    }

    #[tokio::test]
    async fn test_two_sequential_turns_append_in_call_order() {
        let fixture = fixture();
        let student_id = seed_student(&fixture).await;
        let gateway = ScriptedGateway::with_replies(vec![
            Ok("first reply".to_string()),
            Ok("second reply".to_string()),
        ]);

        for message in ["first question", "second question"] {
            handle_turn(
                &fixture.students,
                &fixture.programs,
                &gateway,
                &fixture.cache,
                student_id,
                message,
            )
            .await
            .unwrap();
        }

        let log = fixture
            .students
            .get(student_id)
            .await
            .unwrap()
            .unwrap()
            .conversation_history;
        let roles: Vec<TurnRole> = log.messages.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                TurnRole::User,
                TurnRole::Assistant,
                TurnRole::User,
                TurnRole::Assistant
            ]
        );
        assert_eq!(log.messages[0].content, "first question");
        assert_eq!(log.messages[1].content, "first reply");
        assert_eq!(log.messages[2].content, "second question");
        assert_eq!(log.messages[3].content, "second reply");
    }

    #[tokio::test]
    async fn test_prompt_embeds_filtered_candidates_only() {
        let fixture = fixture();
        let student_id = seed_student(&fixture).await;
        seed_program(&fixture, "MSc Data Science", "Canada", 15000).await;
        seed_program(&fixture, "MSc Data Science", "Germany", 30000).await;
        let gateway = ScriptedGateway::with_replies(vec![Ok("ok".to_string())]);

        handle_turn(
            &fixture.students,
            &fixture.programs,
            &gateway,
            &fixture.cache,
            student_id,
            "what fits my budget?",
        )
        .await
        .unwrap();

        let prompts = gateway.prompts.lock().unwrap();
        let system = &prompts[0][0].content;
        assert!(system.contains("Location: Canada"));
        assert!(!system.contains("Location: Germany"));
    }

    #[tokio::test]
    async fn test_second_turn_prompt_carries_prior_history() {
        let fixture = fixture();
        let student_id = seed_student(&fixture).await;
        let gateway = ScriptedGateway::with_replies(vec![
            Ok("first reply".to_string()),
            Ok("second reply".to_string()),
        ]);

        for message in ["first question", "second question"] {
            handle_turn(
                &fixture.students,
                &fixture.programs,
                &gateway,
                &fixture.cache,
                student_id,
                message,
            )
            .await
            .unwrap();
        }

        let prompts = gateway.prompts.lock().unwrap();
        let second_system = &prompts[1][0].content;
        assert!(second_system.contains("1. User: first question"));
        assert!(second_system.contains("2. Assistant: first reply"));
        // the new message rides in the user slot, not the history block
        assert!(!second_system.contains("second question"));
        assert_eq!(prompts[1][1].content, "second question");
    }
}
