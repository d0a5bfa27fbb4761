//! End-to-end workflows over in-memory providers.

mod common;

use std::io::Write;

use common::{test_app, test_config, FakeChat};
use serde_json::json;
use vectorcase::cli::{commands, Commands};
use vectorcase::domain::models::UseCase;
use vectorcase::domain::ports::ChatMessage;
use vectorcase::services::answer_generator::NO_CONTEXT_ANSWER;
use vectorcase::services::summarizer::NOTHING_TO_SUMMARIZE;
use vectorcase::DomainError;

const GUIDE: &str = "The tracker reports its position every five minutes. \
    Battery alerts are sent when the level drops below twenty percent. \
    A tamper alarm fires when the strap is cut.";

#[tokio::test]
async fn test_index_then_ask() {
    let app = test_app(test_config(), FakeChat::replying(&["Every five minutes."]));
    let profile = app.ctx.profile(UseCase::Documents);

    let ids = app
        .ctx
        .document_indexer()
        .unwrap()
        .index_document(GUIDE, &profile)
        .await
        .unwrap();
    assert_eq!(ids.len(), app.index.records(&profile.index_name).len());

    let outcome = app
        .ctx
        .orchestrator()
        .retrieve("how often is the position reported", &profile, None)
        .await
        .unwrap();
    let history = vec![
        ChatMessage::user("hi"),
        ChatMessage::assistant("Hello! Ask me about the tracker."),
    ];
    let answer = app
        .ctx
        .answer_generator()
        .answer("how often is the position reported", &outcome.fragments, &history)
        .await;

    assert_eq!(answer, "Every five minutes.");
    let request = &app.chat.requests()[0];
    assert_eq!(request.messages.len(), 4);
    assert!(request.messages[3].content.contains("five minutes"));
}

#[tokio::test]
async fn test_answer_without_context_skips_the_model() {
    let app = test_app(test_config(), FakeChat::default());
    let answer = app.ctx.answer_generator().answer("anything", &[], &[]).await;

    assert_eq!(answer, NO_CONTEXT_ANSWER);
    assert!(app.chat.requests().is_empty());
}

#[tokio::test]
async fn test_summarize_stored_fragments() {
    let app = test_app(test_config(), FakeChat::replying(&["Tracker basics."]));
    let profile = app.ctx.profile(UseCase::Documents);
    let store = app.ctx.store();
    let handle = store.ensure_index(&profile.index_name).await.unwrap();

    let empty = store.fetch_all(&handle, &profile.text_field, 100).await.unwrap();
    assert_eq!(app.ctx.summarizer().summarize(&[]).await, NOTHING_TO_SUMMARIZE);
    assert!(empty.is_empty());

    app.ctx
        .document_indexer()
        .unwrap()
        .index_document(GUIDE, &profile)
        .await
        .unwrap();
    let docs: Vec<String> = store
        .fetch_all(&handle, &profile.text_field, 100)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.text)
        .collect();

    assert_eq!(app.ctx.summarizer().summarize(&docs).await, "Tracker basics.");
}

#[tokio::test]
async fn test_sql_generation_remembers_examples() {
    let app = test_app(
        test_config(),
        FakeChat::replying(&[
            "```sql\nSELECT device_id FROM tracking_dataset.tracking_data WHERE battery_level <= 20 LIMIT 1000\n```",
            "SELECT device_id FROM tracking_dataset.tracking_data WHERE battery_level <= 10 LIMIT 1000",
        ]),
    );
    let generator = app.ctx.sql_generator();

    let sql = generator.generate("devices with low battery").await.unwrap();
    assert!(sql.starts_with("SELECT device_id"));

    generator.generate("devices with critical battery").await.unwrap();
    let examples = app.index.records(&app.ctx.config().indexes.sql_examples);
    assert_eq!(examples.len(), 2);

    let second_prompt = &app.chat.requests()[1].messages[1].content;
    assert!(second_prompt.contains("devices with low battery"));
}

#[tokio::test]
async fn test_sql_generation_rejects_writes() {
    let app = test_app(test_config(), FakeChat::replying(&["DROP TABLE tracking_data"]));

    let err = app.ctx.sql_generator().generate("clean up").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_device_lookup_and_delete_commands() {
    let app = test_app(test_config(), FakeChat::default());
    let profile = app.ctx.profile(UseCase::Iot);
    let records = vec![
        json!({"id": "r1", "device_id": "A1", "battery_level": 15}),
        json!({"id": "r2", "device_id": "B2", "battery_level": 80}),
    ];
    app.ctx.record_ingester().ingest(&records, &profile).await.unwrap();

    let store = app.ctx.store();
    let handle = store.ensure_index(&profile.index_name).await.unwrap();
    let found = store
        .find_by_field(&handle, &profile.text_field, "device_id", "A1".into(), 10)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "r1");

    commands::dispatch(
        &app.ctx,
        Commands::Delete {
            ids: vec!["r1".to_string(), " ".to_string()],
            use_case: UseCase::Iot,
        },
        true,
    )
    .await
    .unwrap();
    let remaining = app.index.records(&profile.index_name);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "r2");
}

#[tokio::test]
async fn test_ingest_records_command_reads_json_lines() {
    let app = test_app(test_config(), FakeChat::default());
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"device_id": "A1", "battery_level": 15}}"#).unwrap();
    writeln!(file, r#"{{"device_id": "B2", "battery_level": 50}}"#).unwrap();

    commands::dispatch(
        &app.ctx,
        Commands::IngestRecords {
            file: file.path().to_path_buf(),
        },
        true,
    )
    .await
    .unwrap();

    assert_eq!(app.index.records(&app.ctx.config().indexes.iot_telemetry).len(), 2);
}

#[tokio::test]
async fn test_chunk_command_runs_offline() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{GUIDE}").unwrap();

    commands::execute(
        Commands::Chunk {
            file: file.path().to_path_buf(),
            size: Some(60),
            overlap: Some(10),
        },
        test_config(),
        true,
    )
    .await
    .unwrap();

    let err = commands::execute(
        Commands::Chunk {
            file: file.path().to_path_buf(),
            size: Some(10),
            overlap: Some(10),
        },
        test_config(),
        true,
    )
    .await
    .unwrap_err();
    assert!(err.downcast_ref::<DomainError>().is_some());
}

#[tokio::test]
async fn test_second_context_reuses_existing_index() {
    let app = test_app(test_config(), FakeChat::default());
    let profile = app.ctx.profile(UseCase::Iot);
    let records = vec![json!({"id": "dev-1", "device_id": "A1", "battery_level": 15})];
    app.ctx.record_ingester().ingest(&records, &profile).await.unwrap();

    // Fresh handle cache over the same backing index.
    let other = vectorcase::cli::AppContext::with_providers(
        test_config(),
        app.embedder.clone(),
        app.chat.clone(),
        app.index.clone(),
        app.reranker.clone(),
    )
    .unwrap();
    let more = vec![json!({"id": "dev-2", "device_id": "B2", "battery_level": 50})];
    other.record_ingester().ingest(&more, &profile).await.unwrap();

    assert_eq!(app.index.creates(), 1);
    assert_eq!(app.index.records(&profile.index_name).len(), 2);
}
