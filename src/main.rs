//! Rep by Rep: Ramadan training and nutrition coach for Telegram.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use repbyrep::assistant::openai::OpenAiAssistant;
use repbyrep::assistant::prompts::{mentions_current_events, NO_WEB_ACCESS_NOTE};
use repbyrep::assistant::Assistant;
use repbyrep::config::Config;
use repbyrep::logging;
use repbyrep::mealplan;
use repbyrep::nutrition::NutritionService;

#[derive(Parser)]
#[command(name = "repbyrep", version, about = "Ramadan training and nutrition coach bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot.
    Start,
    /// Ask the assistant one question and print the answer.
    Ask {
        /// The question.
        question: Vec<String>,
    },
    /// Print nutrition estimates for a food.
    Nutrition {
        /// Food name, e.g. "chicken breast".
        food: Vec<String>,
    },
    /// Render a meal plan text file to PDF.
    RenderPdf {
        /// Meal plan text as produced by the assistant.
        #[arg(long)]
        input: PathBuf,
        /// Name shown in the title.
        #[arg(long)]
        name: String,
        /// Output file; defaults to `Meal Plan for {name}.pdf`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate configuration and print a redacted summary.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli.command {
        Commands::Start => cmd_start().await,
        Commands::Ask { question } => cmd_ask(&question.join(" ")).await,
        Commands::Nutrition { food } => cmd_nutrition(&food.join(" ")).await,
        Commands::RenderPdf {
            input,
            name,
            output,
        } => cmd_render_pdf(&input, &name, output),
        Commands::CheckConfig => cmd_check_config(),
    }
}

async fn cmd_start() -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let logs_dir = config.logging.resolve_dir()?;
    let _guard = logging::init_production(&logs_dir, &config.logging.level)?;
    config.validate().context("configuration is incomplete")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Rep by Rep starting");
    let assistant: Arc<dyn Assistant> = Arc::new(OpenAiAssistant::new(config.assistant.settings()?));
    let nutrition = NutritionService::new(&config.nutrition);
    repbyrep::telegram::run_bot(&config, assistant, nutrition).await
}

async fn cmd_ask(question: &str) -> Result<()> {
    logging::init_cli();
    anyhow::ensure!(!question.trim().is_empty(), "question must not be empty");
    let config = Config::load().context("failed to load configuration")?;
    let assistant = OpenAiAssistant::new(config.assistant.settings()?);

    let (_, mut answer) = assistant.ask_question(question).await?;
    if mentions_current_events(question) {
        answer.push_str("\n\n");
        answer.push_str(NO_WEB_ACCESS_NOTE);
    }
    println!("{answer}");
    Ok(())
}

async fn cmd_nutrition(food: &str) -> Result<()> {
    logging::init_cli();
    anyhow::ensure!(!food.trim().is_empty(), "food must not be empty");
    let config = Config::load().context("failed to load configuration")?;
    let service = NutritionService::new(&config.nutrition);
    println!("{}", service.report(food).await);
    Ok(())
}

fn cmd_render_pdf(input: &Path, name: &str, output: Option<PathBuf>) -> Result<()> {
    logging::init_cli();
    let plan = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let bytes = mealplan::render_meal_plan(&plan, name)?;
    let output = output.unwrap_or_else(|| PathBuf::from(mealplan::pdf_file_name(name)));
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

fn cmd_check_config() -> Result<()> {
    logging::init_cli();
    let config = Config::load().context("failed to load configuration")?;
    config.validate().context("configuration is incomplete")?;
    println!("configuration OK");
    println!("{config:#?}");
    Ok(())
}
