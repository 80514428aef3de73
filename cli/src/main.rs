//! CLI entrypoint for conclave
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod args;
mod logging;
mod output;

use anyhow::{Context, Result, anyhow, bail};
use args::{Cli, OutputFormat};
use clap::Parser;
use conclave_application::{
    Agent, KnowledgeRetriever, NoKnowledge, Orchestrator, RunGoalInput, RunGoalUseCase,
};
use conclave_domain::core::id::generate_short_id;
use conclave_infrastructure::{
    ConfigLoader, FileConfig, JsonFileProjectStore, JsonlConversationLogger, KeywordKnowledgeBase,
    OpenAiCompatibleGateway, OpenAiSettings,
};
use output::ConsoleFormatter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    let _log_guard = logging::init(cli.verbose, config.logging.directory.as_deref());

    info!("Starting conclave");

    let Some(goal) = cli.goal.clone().filter(|g| !g.trim().is_empty()) else {
        bail!("A goal is required, e.g. conclave \"Build a REST API for orders\"");
    };

    // === Dependency Injection ===
    let gateway = Arc::new(OpenAiCompatibleGateway::new(OpenAiSettings::from_config(
        &config.llm,
    ))?);

    let knowledge: Arc<dyn KnowledgeRetriever> = match &config.knowledge.directory {
        Some(dir) => Arc::new(
            KeywordKnowledgeBase::load_dir(dir)
                .await
                .with_context(|| format!("Failed to load knowledge from {}", dir.display()))?,
        ),
        None => Arc::new(NoKnowledge),
    };

    let mut orchestrator = Orchestrator::new(gateway.clone(), config.orchestrator_config());

    let save = match &config.storage.projects_dir {
        Some(dir) => {
            orchestrator = orchestrator.with_store(Arc::new(JsonFileProjectStore::new(dir)));
            true
        }
        None => false,
    };

    if let Some(path) = config.logging.conversation_log_path() {
        match JsonlConversationLogger::new(&path) {
            Some(logger) => {
                info!("Conversation log: {}", path.display());
                orchestrator = orchestrator.with_conversation_logger(Arc::new(logger));
            }
            None => warn!("Continuing without conversation log"),
        }
    }

    let agent_config = config.agent_config();
    for profile in config.agents.profiles()? {
        orchestrator.register_agent(Agent::with_profile(
            profile,
            gateway.clone(),
            knowledge.clone(),
            agent_config.clone(),
        ));
    }

    let orchestrator = Arc::new(orchestrator);

    // Ctrl-C stops the run loop; the partial project is still reported
    let handle = orchestrator.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            handle.stop();
        }
    });

    let project_id = cli.project.clone().unwrap_or_else(generate_short_id);
    let input = RunGoalInput::new(project_id, goal, Duration::from_secs(cli.max_wait))
        .with_save(save);

    let result = RunGoalUseCase::new(orchestrator).execute(input).await?;

    let rendered = match cli.output {
        OutputFormat::Summary => ConsoleFormatter::format_summary(&result),
        OutputFormat::Json => ConsoleFormatter::format_json(&result)?,
    };
    println!("{}", rendered);

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).map_err(|e| anyhow!("Invalid configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
