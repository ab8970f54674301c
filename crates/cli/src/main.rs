use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use snowtrip_catalog::{source_from_settings, CatalogCache};
use snowtrip_core::{Clock, DialogueContext, FixedClock, Settings, SystemClock};
use snowtrip_dialogue::TripPlannerAgent;
use snowtrip_observability::{init_tracing, AppMetrics};
use snowtrip_storage::MemoryTripStore;

#[derive(Debug, Parser)]
#[command(name = "snowtrip")]
#[command(about = "SnowTrip ski trip assistant CLI")]
struct Cli {
    /// Directory of JSON resort files; the builtin catalog when omitted.
    #[arg(long, env = "SNOWTRIP_CATALOG_DIR")]
    catalog_dir: Option<PathBuf>,

    /// Pretend today is this date (YYYY-MM-DD).
    #[arg(long)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat,
    Match {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    Dates {
        text: String,
    },
    Intent {
        text: String,
    },
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("snowtrip_cli");
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if cli.catalog_dir.is_some() {
        settings.catalog_dir = cli.catalog_dir.clone();
    }
    let agent = build_agent(settings, cli.today);

    match cli.command {
        Command::Chat => run_chat(agent).await?,
        Command::Match { query, limit } => {
            let matcher = agent.matcher().await;
            let resolved = matcher.resolve(&query).map(|result| result.to_resolved());
            let payload = serde_json::json!({
                "query": query,
                "resort": resolved.as_ref().ok(),
                "error": resolved.as_ref().err(),
                "suggestions": matcher.suggestions(&query, limit),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Dates { text } => {
            let parser = agent.parser();
            let payload = serde_json::json!({
                "today": parser.today(),
                "range": parser.extract_dates(&text),
                "duration_days": parser.extract_duration(&text),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Intent { text } => {
            println!("{}", serde_json::to_string_pretty(&agent.classify(&text).await)?);
        }
        Command::Catalog => {
            let stats = agent.refresh_catalog().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

async fn run_chat(agent: TripPlannerAgent<MemoryTripStore>) -> Result<()> {
    let mut context = DialogueContext::new();

    println!("SnowTrip chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let read = io::stdin()
            .read_line(&mut line)
            .context("failed reading stdin")?;
        if read == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        let outcome = agent.handle_turn(context, message).await;
        context = outcome.context;
        let response = outcome.response;

        println!("\n{}", response.message);
        if !response.buttons.is_empty() {
            let labels = response
                .buttons
                .iter()
                .map(|button| format!("[{}]", button.label))
                .collect::<Vec<_>>();
            println!("{}", labels.join(" "));
        }
        println!("({:?})\n", context.state);
    }

    Ok(())
}

fn build_agent(settings: Settings, today: Option<NaiveDate>) -> TripPlannerAgent<MemoryTripStore> {
    let metrics = AppMetrics::shared();
    let clock: Arc<dyn Clock> = match today {
        Some(date) => Arc::new(FixedClock::on(date)),
        None => Arc::new(SystemClock::with_offset_hours(settings.utc_offset_hours)),
    };
    let catalog = Arc::new(CatalogCache::new(
        source_from_settings(&settings),
        clock.clone(),
        settings.catalog_ttl,
    ));
    let store = Arc::new(MemoryTripStore::with_clock(clock));
    TripPlannerAgent::new(catalog, store, metrics, settings)
}
