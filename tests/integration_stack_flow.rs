//! End-to-end stack integration tests
//!
//! Exercises the prompt engine service over an on-disk store and the
//! ETL -> retriever -> model path with a canned chat backend.

use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use llmstack::config::Config;
use llmstack::domain::PromptType;
use llmstack::error::{Result, StackError};
use llmstack::etl::run_etl_loader;
use llmstack::model::{ChatBackend, Model, RetrievalModel};
use llmstack::retriever::get_retriever;
use llmstack::service::{
    PromptEngineGetRequest, PromptEngineService, PromptEngineSetRequest, SessionCreateRequest, SessionService,
};
use llmstack::stack::{DefaultStackFactory, StackConfig};
use llmstack::store::PromptStore;
use llmstack::vectordb::get_vectordb;
use tempfile::TempDir;

fn services(store: Arc<PromptStore>) -> Result<(PromptEngineService, SessionService)> {
    let factory = Arc::new(DefaultStackFactory::new()?);
    Ok((
        PromptEngineService::new(store.clone(), factory, StackConfig::default()),
        SessionService::new(store),
    ))
}

fn set(session_id: i64, prompt_type: PromptType, template: &str) -> PromptEngineSetRequest {
    PromptEngineSetRequest {
        session_id,
        prompt_type,
        template: template.to_string(),
    }
}

fn get(session_id: i64, prompt_type: PromptType) -> PromptEngineGetRequest {
    PromptEngineGetRequest {
        session_id,
        prompt_type,
        query: "What is in the docs?".to_string(),
        should_validate: true,
    }
}

/// Stored templates survive reopening the database
#[test]
fn test_prompt_persists_across_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("llmstack.db");

    let session_id = {
        let (prompts, sessions) = services(Arc::new(PromptStore::open(&db_path)?))?;
        let session = sessions.create_session(&SessionCreateRequest::default())?;
        prompts.set_prompt(&set(session.id, PromptType::SimpleChatPrompt, "H: {history} Q: {query}"))?;
        prompts.set_prompt(&set(session.id, PromptType::SimpleChatPrompt, "{history}\n{query}"))?;
        session.id
    };

    let store = Arc::new(PromptStore::open(&db_path)?);
    assert_eq!(store.count_prompts(session_id)?, 1);
    let (prompts, _) = services(store)?;
    let response = prompts.get_prompt(&get(session_id, PromptType::SimpleChatPrompt))?;
    assert_eq!(response.template, "{history}\n{query}");
    Ok(())
}

/// Unset types fall back to the built-in template; sessions are isolated
#[test]
fn test_sessions_are_isolated() -> Result<()> {
    let (prompts, sessions) = services(Arc::new(PromptStore::open_in_memory()?))?;
    let first = sessions.create_session(&SessionCreateRequest::default())?;
    let second = sessions.create_session(&SessionCreateRequest::default())?;

    prompts.set_prompt(&set(first.id, PromptType::ContextualQaPrompt, "{context} -> {query}"))?;

    let mine = prompts.get_prompt(&get(first.id, PromptType::ContextualQaPrompt))?;
    let theirs = prompts.get_prompt(&get(second.id, PromptType::ContextualQaPrompt))?;
    assert_eq!(mine.template, "{context} -> {query}");
    assert_ne!(theirs.template, mine.template);
    assert!(theirs.template.contains("{context}"));
    Ok(())
}

/// Every operation on an unknown session is NotFound and writes nothing
#[test]
fn test_unknown_session_for_every_type() -> Result<()> {
    let store = Arc::new(PromptStore::open_in_memory()?);
    let (prompts, _) = services(store.clone())?;
    for prompt_type in PromptType::ALL {
        let template = prompt_type
            .input_variables()
            .iter()
            .map(|v| format!("{{{}}}", v))
            .collect::<Vec<_>>()
            .join(" ");
        assert!(matches!(
            prompts.set_prompt(&set(404, prompt_type, &template)),
            Err(StackError::NotFound(_))
        ));
        assert!(matches!(
            prompts.get_prompt(&get(404, prompt_type)),
            Err(StackError::NotFound(_))
        ));
    }
    assert_eq!(store.count_prompts(404)?, 0);
    Ok(())
}

/// Returns a fixed answer and remembers the prompt it was sent
struct RecordingBackend {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("Paris".to_string())
    }

    fn model(&self) -> &str {
        "recording"
    }
}

/// ETL output is what the model answers from
#[tokio::test]
async fn test_etl_then_predict() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let docs = temp_dir.path().join("docs");
    fs::create_dir(&docs)?;
    fs::write(docs.join("france.txt"), "The capital of France is Paris.")?;
    fs::write(docs.join("rust.txt"), "Cargo builds Rust crates.")?;

    let yaml = format!(
        r#"
vectordb:
  name: local
  fields:
    path: {vectors}
retriever:
  name: similarity
  fields:
    k: 1
etl:
  name: directory
  fields:
    source: {docs}
prompt_engine:
  contextual_qa_prompt_template: "Context: {{context}} | Question: {{query}}"
"#,
        vectors = temp_dir.path().join("vectors.db").display(),
        docs = docs.display(),
    );
    let config = Config::from_yaml_str(&yaml)?;

    let report = run_etl_loader(&config)?;
    assert_eq!((report.files, report.chunks), (2, 2));

    let retriever = get_retriever(&config, get_vectordb(&config)?)?;
    let backend = Arc::new(RecordingBackend {
        prompts: Mutex::new(Vec::new()),
    });
    let model = RetrievalModel::new(backend.clone(), retriever, &config.prompt_engine)?;

    let output = model.predict("capital of France").await?;
    assert_eq!(output.result, "Paris");
    assert_eq!(output.source_documents.len(), 1);
    assert!(
        output.source_documents[0].metadata["source"]
            .as_str()
            .unwrap()
            .ends_with("france.txt")
    );

    let sent = backend.prompts.lock().unwrap();
    assert_eq!(
        sent.as_slice(),
        ["Context: The capital of France is Paris. | Question: capital of France"]
    );
    Ok(())
}
