//! lawcache - offline-first cache and sync core for UX-law quiz content.
//!
//! Mirrors a remote quiz backend into a local key/value store so the
//! principle catalog and question pool stay usable without a network
//! connection. The binary is a thin diagnostics CLI over the library
//! modules: inspect cache state, force a sync, or clear everything.

mod api;
mod cache;
mod config;
mod models;
mod quiz;
mod store;
mod sync;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::ApiClient;
use cache::{ContentCache, QuestionCache, QuestionHistory};
use config::AppConfig;
use models::{QuizLength, QuizMode};
use quiz::{QuizEngine, QuizGenerator};
use store::{FileBackend, KvStore};
use sync::SyncService;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("lawcache starting");

    let config = AppConfig::load()?;

    let backend = Arc::new(FileBackend::new(AppConfig::store_dir()?)?);
    let store = Arc::new(KvStore::new(backend));
    store.initialize().await;

    let api = Arc::new(ApiClient::new(&config.api)?);
    let content = ContentCache::new(Arc::clone(&store));
    let questions = QuestionCache::new(Arc::clone(&store), config.cache.clone());
    let history = QuestionHistory::new(Arc::clone(&store));
    let service = SyncService::new(
        Arc::clone(&api),
        Arc::clone(&store),
        content.clone(),
        questions.clone(),
        config.sync.clone(),
    );

    // Kick off a background refresh when the question cache is invalid
    let cached_ids: Vec<String> = content
        .get_cached_principles()
        .map(|c| c.principles.iter().map(|p| p.id.clone()).collect())
        .unwrap_or_default();
    service.initialize(&cached_ids);

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--sync") => run_sync(&service).await,
        Some("--quiz") => {
            let engine = QuizEngine::new(
                QuizGenerator::new(api, questions, history.clone(), config.quiz.clone()),
                history,
                Arc::clone(&store),
            );
            run_quiz(&service, engine).await
        }
        Some("--clear") => run_clear(&content, &questions, &history),
        Some("--init-config") => {
            config.save()?;
            println!("Wrote {}", AppConfig::config_path()?.display());
            Ok(())
        }
        Some("--status") | None => run_status(&content, &questions, &history, &service),
        Some(other) => {
            eprintln!("Unknown option: {}", other);
            eprintln!("Usage: lawcache [--status | --sync | --quiz | --init-config | --clear]");
            std::process::exit(2);
        }
    }
}

/// Draw a quick quiz and print it. The served question ids are recorded
/// in the history so the next draw avoids repeats.
async fn run_quiz(
    service: &SyncService<ApiClient>,
    mut engine: QuizEngine<ApiClient>,
) -> Result<()> {
    let content = service.load_content().await?;

    let session = engine
        .start_new_quiz(&content.principles, QuizMode::All, QuizLength::Quick)
        .await?;

    println!("{} ({} questions)", session.length.label(), session.questions.len());
    for (i, question) in session.questions.iter().enumerate() {
        println!("{}. {}", i + 1, question.question);
        for (j, option) in question.options.iter().enumerate() {
            let marker = if j == question.correct_answer { "*" } else { " " };
            println!("  {} {}) {}", marker, (b'a' + j as u8) as char, option);
        }
    }

    engine.submit_quiz();
    println!("Served questions recorded in history");
    Ok(())
}

/// Print the state of every cache layer (the default command).
fn run_status(
    content: &ContentCache,
    questions: &QuestionCache,
    history: &QuestionHistory,
    service: &SyncService<ApiClient>,
) -> Result<()> {
    let content_stats = content.get_cache_stats();
    println!("Content cache:");
    println!("  valid:      {}", content_stats.is_valid);
    println!("  principles: {}", content_stats.principle_count);
    println!("  categories: {}", content_stats.category_count);
    println!(
        "  version:    {}",
        content_stats.version.as_deref().unwrap_or("-")
    );
    println!("  last sync:  {}", format_ts(content_stats.last_sync));

    let question_stats = questions.get_cache_stats();
    println!("Question cache:");
    println!("  valid:      {}", question_stats.is_valid);
    println!("  questions:  {}", question_stats.total_questions);
    println!("  last sync:  {}", format_ts(question_stats.last_sync));

    let history_stats = history.get_stats();
    println!("Question history:");
    println!("  tracked:    {}", history_stats.total_tracked);

    let status = service.get_sync_status();
    println!("Sync:");
    println!("  needs sync: {}", status.needs_sync);
    println!("  last run:   {}", format_ts(status.last_sync));

    Ok(())
}

/// Refresh the content catalog and force a question sync.
async fn run_sync(service: &SyncService<ApiClient>) -> Result<()> {
    let content = service.load_content().await?;
    println!(
        "Content: {} principles, {} categories (version {})",
        content.principles.len(),
        content.categories.len(),
        content.version.as_deref().unwrap_or("-")
    );

    let principle_ids: Vec<String> = content.principles.iter().map(|p| p.id.clone()).collect();
    let outcome = service.force_sync(&principle_ids).await;
    if outcome.success {
        println!(
            "Questions: synced {}, {} now cached",
            outcome.synced, outcome.cached
        );
        Ok(())
    } else {
        anyhow::bail!(
            "Question sync failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
}

/// Wipe every cache layer.
fn run_clear(
    content: &ContentCache,
    questions: &QuestionCache,
    history: &QuestionHistory,
) -> Result<()> {
    content.clear_cache();
    questions.clear_cache();
    history.clear_history();
    println!("All caches cleared");
    Ok(())
}

fn format_ts(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.to_rfc3339()).unwrap_or_else(|| "never".to_string())
}
