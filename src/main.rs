use anyhow::Context;
use clap::Parser;
use site_select::app::{load_pipeline, StartupReport};
use site_select::config::Command;
use site_select::domain::ports::JobLedger;
use site_select::utils::error::ErrorSeverity;
use site_select::utils::{logger, validation::Validate};
use site_select::{
    AuthContext, CliConfig, FileJobLedger, InMemoryJobLedger, JobId, LocalStorage,
    ProjectRequirements, SiteError, SiteSelectionEngine, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match TomlConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(
        cli.verbose,
        config.logging.level.as_deref(),
        config.logging.format,
    );
    tracing::info!("🚀 Starting site-select");
    tracing::debug!("CLI args: {:?}", cli);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // Registry and model paths are resolved relative to the working directory.
    let storage = LocalStorage::new(".");
    let (pipeline, report) = load_pipeline(&storage, &config).await;

    let outcome = match config.ledger_path() {
        Some(path) => {
            let ledger = FileJobLedger::new(LocalStorage::new("."), path);
            run(SiteSelectionEngine::new(pipeline, ledger), cli.command, &report).await
        }
        None => {
            tracing::warn!("No [ledger] configured; jobs will not outlive this process");
            let engine = SiteSelectionEngine::new(pipeline, InMemoryJobLedger::new());
            run(engine, cli.command, &report).await
        }
    };

    match outcome {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            let Some(site_error) = e.downcast_ref::<SiteError>() else {
                return Err(e);
            };
            if site_error.is_operational() {
                tracing::error!(
                    "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                    site_error,
                    site_error.category(),
                    site_error.severity()
                );
            }
            eprintln!("❌ {}", site_error.user_friendly_message());
            eprintln!("💡 {}", site_error.recovery_suggestion());

            let exit_code = match site_error.severity() {
                ErrorSeverity::Low => 4, // no results, not a fault
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn run<L: JobLedger>(
    engine: SiteSelectionEngine<L>,
    command: Command,
    report: &StartupReport,
) -> anyhow::Result<String> {
    let output = match command {
        Command::Recommend {
            owner,
            username,
            requirements,
        } => {
            let raw = tokio::fs::read(&requirements)
                .await
                .with_context(|| format!("reading requirements from {}", requirements.display()))?;
            let requirements: ProjectRequirements = serde_json::from_slice(&raw)
                .map_err(SiteError::from)
                .context("parsing requirements JSON")?;
            let auth = auth_context(owner, username);

            let response = engine.recommend(requirements, &auth).await?;
            serde_json::to_string_pretty(&response)?
        }
        Command::History { owner } => {
            let auth = auth_context(owner, None);
            let history = engine.history(&auth).await?;
            serde_json::to_string_pretty(&history)?
        }
        Command::Replay {
            owner,
            username,
            job,
        } => {
            // A malformed id is indistinguishable from an unknown one.
            let job_id: JobId = job.parse().map_err(|_| SiteError::JobNotFound)?;
            let auth = auth_context(owner, username);

            let response = engine.replay(job_id, &auth).await?;
            serde_json::to_string_pretty(&response)?
        }
        Command::Check => {
            let output = serde_json::to_string_pretty(report)?;
            if let Err(e) = report.ensure_ready() {
                println!("{}", output);
                return Err(e.into());
            }
            output
        }
    };
    Ok(output)
}

fn auth_context(owner: String, username: Option<String>) -> AuthContext {
    let username = username.unwrap_or_else(|| owner.clone());
    AuthContext::new(owner, username)
}
