use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use plantguard::error::{ClassifiedError, classify};
use plantguard::image::{EncodingError, mime_for_path, read_image};
use plantguard::llm::config::GenerationSettings;
use plantguard::llm::types::LlmError;
use plantguard::llm::{LlmChat, LlmClient};
use plantguard::plant::ChatMessage;
use plantguard::services::analyzer::{PlantAnalyzer, fallback_analysis};
use plantguard::services::conversation::{ConversationService, FOLLOW_UP_FALLBACK_REPLY};
use plantguard::services::history::HistoryStore;
use plantguard::services::persistence::{HistoryError, JsonFileBackend, MemoryBackend};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("LLM setup failed: {0}")]
    Llm(#[from] LlmError),
    #[error("history unavailable: {0}")]
    History(#[from] HistoryError),
    #[error("could not read image: {0}")]
    Image(#[from] EncodingError),
    #[error("cannot infer MIME type of {0}; pass --mime")]
    UnknownMime(PathBuf),
    #[error("question must not be blank")]
    BlankQuestion,
    #[error("no analysis with id {0} in history")]
    UnknownAnalysis(Uuid),
    #[error("output encoding failed: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "plantguard", about = "Plant photo toxicity analysis")]
struct Cli {
    /// History file.
    #[arg(long, env = "PLANTGUARD_HISTORY_PATH", default_value = "./plant-analysis-storage.json")]
    history_path: PathBuf,

    /// Keep history in memory only.
    #[arg(long)]
    ephemeral: bool,

    /// Give up on the model after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a plant photo and store the result.
    Analyze {
        image: PathBuf,
        /// Declared MIME type; inferred from the extension when omitted.
        #[arg(long)]
        mime: Option<String>,
    },
    /// Ask a follow-up question about a stored analysis.
    Ask { analysis_id: Uuid, question: String },
    /// List stored analyses, most recent first.
    History,
    /// Remove every stored analysis.
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut history = if cli.ephemeral {
        HistoryStore::open(MemoryBackend::new())?
    } else {
        HistoryStore::open(JsonFileBackend::new(&cli.history_path))?
    };
    let limit = cli.timeout_secs.map(Duration::from_secs);

    match cli.command {
        Command::Analyze { image, mime } => {
            let mime = match mime {
                Some(mime) => mime,
                None => mime_for_path(&image).ok_or_else(|| CliError::UnknownMime(image.clone()))?.to_string(),
            };
            let bytes = read_image(&image)?;
            let analyzer = PlantAnalyzer::new(llm()?, GenerationSettings::analysis_from_env());

            let analysis = match bounded(limit, analyzer.analyze(&bytes, &mime)).await {
                Ok(analysis) => analysis,
                Err(timeout) => fallback_analysis(&timeout),
            };
            let analysis = analysis.with_image_url(format!("file://{}", image.display()));
            let id = history.append(analysis)?;
            print_json(&history.get(id))
        }
        Command::Ask { analysis_id, question } => {
            if question.trim().is_empty() {
                return Err(CliError::BlankQuestion);
            }
            let analysis = history.get(analysis_id).cloned().ok_or(CliError::UnknownAnalysis(analysis_id))?;
            let conversation = ConversationService::new(llm()?, GenerationSettings::follow_up_from_env());

            let answer = match bounded(limit, conversation.ask(&analysis, &question)).await.and_then(|r| r) {
                Ok(answer) => answer,
                Err(err) => {
                    warn!(code = %err.code, "ask: rendering fallback reply");
                    ChatMessage::assistant(FOLLOW_UP_FALLBACK_REPLY)
                }
            };
            history.append_messages(analysis_id, [ChatMessage::user(question), answer.clone()])?;
            print_json(&answer)
        }
        Command::History => print_json(&history.list()),
        Command::Clear => {
            let removed = history.len();
            history.clear()?;
            info!(removed, "history cleared");
            Ok(())
        }
    }
}

fn llm() -> Result<Arc<dyn LlmChat>, CliError> {
    let client = LlmClient::from_env()?;
    info!(model = client.model(), "llm client ready");
    Ok(Arc::new(client))
}

/// Race `fut` against the optional limit. Expiry classifies as `NO_RESPONSE`.
async fn bounded<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, ClassifiedError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|elapsed| classify(&elapsed)),
        None => Ok(fut.await),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
