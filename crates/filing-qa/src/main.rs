use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use filing_qa::embedding::{EmbeddingProvider, LlamaEmbeddingClient};
use filing_qa::filing::EdgarClient;
use filing_qa::qa::HttpAnswerScorer;
use filing_qa::utils::logger::init_logger;
use filing_qa::{FilingAnalyzer, Settings, PRESET_QUESTIONS};

#[derive(Parser)]
#[command(name = "filing-qa")]
#[command(about = "Ask questions about a company's latest SEC 10-K / 10-Q filing")]
struct Cli {
    /// Stock ticker symbol, e.g. AAPL
    #[arg(short, long, env = "FILING_QA_TICKER", required_unless_present = "list_questions")]
    ticker: Option<String>,

    /// Question to ask; repeat for several questions against the same filing
    #[arg(short, long = "question")]
    questions: Vec<String>,

    /// Index of a preset question, used when no --question is given
    #[arg(short, long, default_value_t = 0)]
    preset: usize,

    /// Print the preset questions and exit
    #[arg(long)]
    list_questions: bool,

    /// Directory for rolling log files
    #[arg(long, env = "FILING_QA_LOG_DIR", default_value = "logs")]
    log_dir: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_questions {
        for (i, question) in PRESET_QUESTIONS.iter().enumerate() {
            println!("{}. {}", i, question);
        }
        return Ok(());
    }

    let _guard = init_logger(Path::new(&cli.log_dir))?;
    let settings = Settings::load()?;

    let ticker = cli
        .ticker
        .ok_or_else(|| anyhow::anyhow!("A ticker is required (--ticker or FILING_QA_TICKER)"))?;

    let questions = if cli.questions.is_empty() {
        let preset = PRESET_QUESTIONS.get(cli.preset).ok_or_else(|| {
            anyhow::anyhow!(
                "Preset {} does not exist (0..={})",
                cli.preset,
                PRESET_QUESTIONS.len() - 1
            )
        })?;
        vec![preset.to_string()]
    } else {
        cli.questions
    };

    let source = Arc::new(EdgarClient::new(settings.edgar.clone())?);
    let scorer = Arc::new(HttpAnswerScorer::new(&settings.qa)?);
    let embedder: Option<Arc<dyn EmbeddingProvider>> = if settings.context.semantic_ranking {
        Some(Arc::new(LlamaEmbeddingClient::new(&settings.embedding)?))
    } else {
        None
    };

    let analyzer = FilingAnalyzer::new(&settings, source, scorer, embedder);

    info!(ticker = %ticker, questions = questions.len(), "Starting filing analysis");

    let Some(session) = analyzer.load(&ticker).await else {
        println!("{}", filing_qa::qa::messages::retrieval_failed(&ticker));
        return Ok(());
    };

    for question in &questions {
        let answer = analyzer.ask(&session, question).await;
        println!("### Question\n{}\n\n### Answer\n{}\n", question, answer);
    }

    Ok(())
}
