use std::sync::Arc;
use std::time::Duration;

use ragchat_model::{MockGenerator, MockReply, ModelError};
use ragchat_retrieval::{
    Chunk, HashingEmbedder, IngestionPipeline, RagConfig, RagError, Retriever, VectorIndex,
};
use ragchat_runner::{
    ChatConfig, ChatError, ChatSession, Citation, ContextualizeFallback, DisplayEvent, Message,
    RecordingDisplay, TurnOrchestrator, TurnState, render_citations,
};

const DIMS: usize = 256;

async fn paris_index(embedder: Arc<HashingEmbedder>) -> Arc<VectorIndex> {
    let mut pipeline = IngestionPipeline::new(embedder, 16);
    pipeline
        .ingest(vec![Chunk::new("Paris is the capital of France").with_source("doc1")])
        .await
        .unwrap();
    Arc::new(pipeline.into_index().unwrap())
}

async fn setup(
    mock: Arc<MockGenerator>,
    threshold: f32,
    fallback: ContextualizeFallback,
) -> (TurnOrchestrator, ChatSession) {
    let embedder = Arc::new(HashingEmbedder::new(DIMS));
    let rag = RagConfig::builder().top_k(3).score_threshold(threshold).build().unwrap();
    let chat = ChatConfig::builder().contextualize_fallback(fallback).build().unwrap();

    let index = paris_index(embedder.clone()).await;
    let orchestrator = TurnOrchestrator::new(mock, Retriever::new(embedder, &rag), &chat);
    (orchestrator, ChatSession::new(&chat).with_index(index))
}

#[tokio::test]
async fn capital_question_is_answered_and_cited() {
    let mock =
        Arc::new(MockGenerator::new().with_reply(MockReply::fragments(["Paris ", "is the capital."])));
    let (orchestrator, mut session) =
        setup(mock.clone(), 0.2, ContextualizeFallback::FallbackToRaw).await;
    let mut display = RecordingDisplay::new();

    let turn = orchestrator
        .run_turn(&mut session, "What is the capital of France?", &mut display)
        .await
        .unwrap();

    assert_eq!(turn.documents.len(), 1);
    assert_eq!(turn.citations, vec![Citation { index: 1, source: "doc1".into() }]);
    assert_eq!(render_citations(&turn.citations), "[[1]](doc1)");
    assert_eq!(turn.response, "Paris is the capital.");
    assert_eq!(turn.standalone_query, "What is the capital of France?");

    // Empty history: only the answer call reached the model.
    assert_eq!(mock.call_count(), 1);
    assert_eq!(session.history().len(), 2);

    assert_eq!(display.partials(), vec!["Paris ■", "Paris is the capital.■"]);
    assert_eq!(display.final_render(), Some("Paris is the capital."));
    let passages = display.documents().unwrap();
    assert_eq!(passages.len(), 1);
    assert_eq!(passages[0].text(), "Paris is the capital of France");
    assert_eq!(
        display.states(),
        vec![
            TurnState::Contextualizing,
            TurnState::Retrieving,
            TurnState::Generating,
            TurnState::Citing,
            TurnState::Committed,
        ]
    );
}

#[tokio::test]
async fn follow_up_retrieves_with_rewrite_but_answers_raw_text() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_reply(MockReply::text("Paris."))
            .with_reply(MockReply::text(" What is the capital of France? "))
            .with_reply(MockReply::text("It is Paris.")),
    );
    let (orchestrator, mut session) =
        setup(mock.clone(), 0.2, ContextualizeFallback::FallbackToRaw).await;
    let mut display = RecordingDisplay::new();

    orchestrator.run_turn(&mut session, "Tell me about France", &mut display).await.unwrap();
    let turn = orchestrator.run_turn(&mut session, "And its capital?", &mut display).await.unwrap();

    assert_eq!(turn.standalone_query, "What is the capital of France?");
    assert_eq!(turn.citations.len(), 1);

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].last_user_text(), Some("And its capital?"));
    assert_eq!(session.history().len(), 4);
}

#[tokio::test]
async fn mid_stream_failure_commits_nothing() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_reply(MockReply::text("Paris."))
            .with_reply(MockReply::text("What is the population of Paris?"))
            .with_reply(MockReply::fail_after(["It is "], "connection reset")),
    );
    let (orchestrator, mut session) =
        setup(mock.clone(), 0.2, ContextualizeFallback::FallbackToRaw).await;

    orchestrator
        .run_turn(&mut session, "What is the capital of France?", &mut RecordingDisplay::new())
        .await
        .unwrap();
    let before = session.history().clone();

    let mut display = RecordingDisplay::new();
    let err = orchestrator
        .run_turn(&mut session, "And its population?", &mut display)
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Generation(ModelError::Stream(_))));
    assert!(!err.is_user_actionable());
    assert_eq!(session.history(), &before);
    assert!(display.aborted());
    assert_eq!(display.final_render(), None);
    assert!(!display.events().iter().any(|e| matches!(e, DisplayEvent::Citations(_))));
    assert_eq!(display.states().last(), Some(&TurnState::Idle));
}

#[tokio::test]
async fn missing_index_aborts_before_generation() {
    let mock = Arc::new(MockGenerator::new());
    let embedder = Arc::new(HashingEmbedder::new(DIMS));
    let config = ChatConfig::default();
    let orchestrator =
        TurnOrchestrator::new(mock.clone(), Retriever::new(embedder, &RagConfig::default()), &config);
    let mut session = ChatSession::new(&config);

    let err = orchestrator
        .run_turn(&mut session, "hello", &mut RecordingDisplay::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Retrieval(RagError::IndexNotFound { .. })));
    assert!(err.is_user_actionable());
    assert_eq!(mock.call_count(), 0);
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn nothing_relevant_generates_without_context_or_citations() {
    let mock = Arc::new(MockGenerator::new().with_reply(MockReply::text("I don't know.")));
    let (orchestrator, mut session) =
        setup(mock.clone(), 1.0, ContextualizeFallback::FallbackToRaw).await;

    let turn = orchestrator
        .run_turn(&mut session, "Who painted the Mona Lisa?", &mut RecordingDisplay::new())
        .await
        .unwrap();

    assert!(turn.documents.is_empty());
    assert!(turn.citations.is_empty());
    let requests = mock.requests();
    assert!(requests[0].messages[0].content.contains("nothing relevant"));
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn failed_rewrite_falls_back_to_raw_text() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_reply(MockReply::text("Paris."))
            .with_reply(MockReply::reject("quota exceeded"))
            .with_reply(MockReply::text("Still Paris.")),
    );
    let (orchestrator, mut session) =
        setup(mock.clone(), 0.2, ContextualizeFallback::FallbackToRaw).await;
    let mut display = RecordingDisplay::new();

    orchestrator.run_turn(&mut session, "What is the capital of France?", &mut display).await.unwrap();
    let turn = orchestrator.run_turn(&mut session, "Are you sure?", &mut display).await.unwrap();

    assert_eq!(turn.standalone_query, "Are you sure?");
    assert_eq!(turn.response, "Still Paris.");
    assert_eq!(session.history().len(), 4);
}

#[tokio::test]
async fn failed_rewrite_aborts_when_configured() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_reply(MockReply::text("Paris."))
            .with_reply(MockReply::reject("quota exceeded")),
    );
    let (orchestrator, mut session) = setup(mock.clone(), 0.2, ContextualizeFallback::Abort).await;

    orchestrator
        .run_turn(&mut session, "What is the capital of France?", &mut RecordingDisplay::new())
        .await
        .unwrap();
    let err = orchestrator
        .run_turn(&mut session, "Are you sure?", &mut RecordingDisplay::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Contextualization(ModelError::Request(_))));
    assert_eq!(session.history().len(), 2);
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn cleared_history_skips_contextualization_again() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_reply(MockReply::text("Paris."))
            .with_reply(MockReply::text("Paris, again.")),
    );
    let (orchestrator, mut session) =
        setup(mock.clone(), 0.2, ContextualizeFallback::FallbackToRaw).await;

    orchestrator
        .run_turn(&mut session, "What is the capital of France?", &mut RecordingDisplay::new())
        .await
        .unwrap();
    session.clear_history();
    orchestrator
        .run_turn(&mut session, "What is the capital of France?", &mut RecordingDisplay::new())
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn empty_answer_stream_is_still_committed() {
    let mock = Arc::new(MockGenerator::new().with_reply(MockReply::fragments(Vec::<String>::new())));
    let (orchestrator, mut session) =
        setup(mock.clone(), 0.2, ContextualizeFallback::FallbackToRaw).await;
    let mut display = RecordingDisplay::new();

    let turn = orchestrator
        .run_turn(&mut session, "What is the capital of France?", &mut display)
        .await
        .unwrap();

    assert_eq!(turn.response, "");
    assert!(display.partials().is_empty());
    assert_eq!(display.final_render(), Some(""));
    assert!(!display.aborted());
    assert_eq!(display.states().last(), Some(&TurnState::Committed));
    assert_eq!(
        session.history().messages().collect::<Vec<_>>(),
        vec![
            &Message::User("What is the capital of France?".into()),
            &Message::Assistant(String::new()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn stalled_model_is_abandoned_after_call_timeout() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_reply(MockReply::fragments(["Paris ", "is..."]).with_delay(Duration::from_secs(5))),
    );
    let embedder = Arc::new(HashingEmbedder::new(DIMS));
    let rag = RagConfig::builder().score_threshold(0.2).build().unwrap();
    let chat = ChatConfig::builder().call_timeout(Duration::from_secs(2)).build().unwrap();
    let orchestrator =
        TurnOrchestrator::new(mock.clone(), Retriever::new(embedder.clone(), &rag), &chat);
    let mut session = ChatSession::new(&chat).with_index(paris_index(embedder).await);

    let err = orchestrator
        .run_turn(&mut session, "What is the capital of France?", &mut RecordingDisplay::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, ChatError::Generation(ModelError::Timeout(limit)) if limit == Duration::from_secs(2))
    );
    assert!(session.history().is_empty());
}
