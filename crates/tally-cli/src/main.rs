use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tally_application::SessionStore;
use tally_core::config::TallyConfig;
use tally_core::session::{ChoiceDraft, SessionRepository};
use tally_infrastructure::{
    ConfigService, MemorySessionRepository, TallyPaths, TomlSessionRepository,
};

mod choice_arg;
mod commands;
mod telemetry;
mod tui;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Tally - local voting sessions with a live ranking", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding sessions and logs (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Keep sessions in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Disable transitions in the interactive view
    #[arg(long)]
    no_motion: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List sessions, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create a session
    New {
        name: String,
        /// A choice as `[EMOJI:]TITLE[::NOTES]`; repeat for each choice
        #[arg(short, long = "choice", value_name = "CHOICE", value_parser = choice_arg::parse, required = true)]
        choices: Vec<ChoiceDraft>,
        #[arg(long)]
        json: bool,
    },
    /// Show a session's ranking
    Show {
        session: String,
        #[arg(long)]
        json: bool,
    },
    /// Vote for a choice
    Vote {
        session: String,
        choice: String,
        /// Take a vote away instead (never below zero)
        #[arg(long)]
        down: bool,
    },
    /// Add a choice to a session
    AddChoice {
        session: String,
        title: String,
        #[arg(long)]
        emoji: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Remove a choice from a session
    RemoveChoice { session: String, choice: String },
    /// Delete a session
    Delete { session: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match &cli.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::default_location()?,
    };
    let config_result = config_service.load();
    let mut config = config_result.as_ref().ok().cloned().unwrap_or_default();
    if cli.no_motion {
        config.motion.reduced_motion = true;
    }

    let data_dir = match cli.data_dir.clone().or_else(|| config.storage.data_dir.clone()) {
        Some(dir) => dir,
        None => TallyPaths::data_dir()?,
    };

    let log_target = if cli.command.is_none() {
        telemetry::LogTarget::Daily(TallyPaths::logs_dir(&data_dir))
    } else {
        telemetry::LogTarget::Stderr
    };
    let _telemetry = telemetry::init(log_target, &config.log.level, cli.verbose);

    match config_result {
        Ok(_) => ensure_config_file(&config_service, cli.ephemeral),
        Err(e) => tracing::warn!(
            "Using default configuration, failed to load {:?}: {}",
            config_service.path(),
            e
        ),
    }
    tracing::debug!(data_dir = %data_dir.display(), ephemeral = cli.ephemeral, "Starting tally");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(run(cli, config, data_dir))
}

/// Writes the default config file on first run. Ephemeral runs leave the disk alone.
fn ensure_config_file(service: &ConfigService, ephemeral: bool) {
    if ephemeral {
        return;
    }
    if let Err(e) = service.write_defaults_if_missing() {
        tracing::warn!("Could not write default configuration {:?}: {}", service.path(), e);
    }
}

async fn run(cli: Cli, config: TallyConfig, data_dir: PathBuf) -> Result<()> {
    let repository: Arc<dyn SessionRepository> = if cli.ephemeral {
        Arc::new(MemorySessionRepository::new())
    } else {
        Arc::new(
            TomlSessionRepository::new(&data_dir)
                .with_context(|| format!("cannot open data directory {}", data_dir.display()))?,
        )
    };

    let store = Arc::new(SessionStore::new(repository));

    let Some(command) = cli.command else {
        return tui::run(store, config.motion).await;
    };

    store.load_all().await.context("failed to load sessions")?;
    let result = execute(&store, command).await;
    store.flush().await;
    result
}

async fn execute(store: &SessionStore, command: Commands) -> Result<()> {
    match command {
        Commands::List { json } => commands::session::list(store, json),
        Commands::New {
            name,
            choices,
            json,
        } => commands::session::new(store, &name, &choices, json).await,
        Commands::Show { session, json } => commands::session::show(store, &session, json),
        Commands::Vote {
            session,
            choice,
            down,
        } => commands::vote::vote(store, &session, &choice, down),
        Commands::AddChoice {
            session,
            title,
            emoji,
            notes,
        } => {
            let draft = ChoiceDraft::new(title)
                .with_emoji(emoji.unwrap_or_default())
                .with_notes(notes.unwrap_or_default());
            commands::vote::add_choice(store, &session, &draft)
        }
        Commands::RemoveChoice { session, choice } => {
            commands::vote::remove_choice(store, &session, &choice)
        }
        Commands::Delete { session } => commands::session::delete(store, &session).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_opens_tui() {
        let cli = Cli::try_parse_from(["tally", "--no-motion"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.no_motion);
    }

    #[test]
    fn test_new_parses_choices() {
        let cli = Cli::try_parse_from([
            "tally",
            "--data-dir",
            "/tmp/t",
            "new",
            "Lunch",
            "--choice",
            "🍕:Pizza",
            "-c",
            "Tacos::spicy",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/t")));
        let Some(Commands::New { name, choices, json }) = cli.command else {
            panic!("expected new");
        };
        assert_eq!(name, "Lunch");
        assert!(!json);
        assert_eq!(choices[0].emoji, "🍕");
        assert_eq!(choices[1].notes, "spicy");
    }

    #[test]
    fn test_new_rejects_blank_choice() {
        assert!(Cli::try_parse_from(["tally", "new", "Lunch", "--choice", "  "]).is_err());
        assert!(Cli::try_parse_from(["tally", "new", "Lunch"]).is_err());
    }

    #[test]
    fn test_vote_flags() {
        let cli = Cli::try_parse_from(["tally", "-vv", "vote", "lunch", "pizza", "--down"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Vote { down: true, .. })));
    }

    #[test]
    fn test_ephemeral_runs_write_no_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::new(&path);
        service.load().unwrap();

        ensure_config_file(&service, true);
        assert!(!path.exists());

        ensure_config_file(&service, false);
        assert!(path.exists());
    }
}
