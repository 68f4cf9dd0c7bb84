//! wikirc - announces wiki changes on IRC
//!
//! Reads its bot configuration from the wiki itself, tails the wiki change
//! journal and posts one line per change to the configured channel.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wikirc_core::{DocumentReference, Settings};

mod cli;
mod runner;
mod state;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "info,wikirc_core=debug,wikirc_net=debug,wikirc=debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let settings_path = match cli.settings {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load(&settings_path)?;
    if let Some(database) = cli.database {
        settings.wiki.database = Some(database);
    }

    let state = AppState::new(settings)?;

    match cli.command {
        Commands::Config => show_config(&state)?,
        Commands::Listeners => list_listeners(&state)?,
        Commands::Run => {
            tracing::info!(wiki = %state.settings.wiki.name, "Starting wikirc");
            runner::run(state).await?;
        }
    }

    Ok(())
}

fn show_config(state: &AppState) -> anyhow::Result<()> {
    let execution = state.execution();
    let bot = state.with_repository(|repository| repository.load_bot_data(&execution))?;

    println!("name:         {}", bot.name);
    println!("server:       {}", bot.server);
    println!("password:     {}", if bot.has_password() { "(set)" } else { "(none)" });
    println!("channel:      {}", bot.channel);
    println!("auto connect: {}", bot.auto_connect);
    Ok(())
}

fn list_listeners(state: &AppState) -> anyhow::Result<()> {
    let execution = state.execution();
    let listeners = state.with_repository(|repository| repository.load_listener_registry(&execution))?;

    if listeners.is_empty() {
        println!("No listeners declared in wiki {}", state.settings.wiki.name);
        return Ok(());
    }
    for listener in listeners {
        let reference = DocumentReference::parse(&listener.id, &state.settings.wiki.name)?;
        println!("{}\t{}\t{}", reference, listener.name, listener.description);
    }
    Ok(())
}
