use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use taskflow::board::models::{ColumnId, MemberRole, Priority, ProfilePatch, SettingKey};
use taskflow::config::TaskflowConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(version, about = "Kanban task board for your terminal and browser")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(long, global = true)]
    pub yes: bool,

    /// Use an in-memory sample board instead of the hosted backend
    #[arg(long, global = true)]
    pub offline: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board: To Do, In Progress, Review, Done
    Board,
    /// Add a task (prompts for missing fields)
    Add {
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        assignee: Option<String>,
        /// todo, inprogress, review or done
        #[arg(short, long, default_value = "todo")]
        column: ColumnId,
    },
    /// Edit a task by id or unique id prefix
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        assignee: Option<String>,
    },
    /// Delete a task
    Rm { id: String },
    /// Move a task to another column
    Mv { id: String, column: ColumnId },
    /// Task counts and completion rate
    Stats,
    /// List team members
    Team,
    /// Invite a team member by email
    Invite {
        email: Option<String>,
        #[arg(short, long)]
        name: Option<String>,
        /// member, admin or manager
        #[arg(short, long)]
        role: Option<MemberRole>,
    },
    /// Show calendar events grouped by day
    Cal {
        /// Include events that are already over
        #[arg(long)]
        all: bool,
    },
    /// Manage calendar events
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },
    /// Show or change notification and privacy settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
    /// Ask the AI assistant a question
    Ask {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
        /// Send the current board along as context
        #[arg(long)]
        with_board: bool,
    },
    /// Serve the board API for a browser front-end
    Serve {
        /// Port to serve on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open the board in a browser after the server starts
        #[arg(long)]
        open: bool,

        /// Enable dev mode (CORS permissive, listen on all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// Sign in to the hosted backend
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default taskflow.toml file
    Init,
}

#[derive(Subcommand, Clone)]
pub enum EventCommands {
    /// Add an event (times as YYYY-MM-DD [HH:MM] local, or RFC 3339)
    Add {
        title: String,
        #[arg(short, long)]
        start: String,
        #[arg(short, long)]
        end: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ProfileCommands {
    /// Update profile fields
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum SettingsCommands {
    /// Turn one setting on or off, e.g. `push.mobile on`
    Set {
        key: SettingKey,
        #[arg(value_parser = cmd::parse_switch, action = clap::ArgAction::Set)]
        value: bool,
    },
}

fn init_tracing(config: &TaskflowConfig) {
    let filter = if config.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // A missing .env is fine.
    let _ = dotenvy::from_path(project_dir.join(".env"));
    let config = TaskflowConfig::with_cli_args(project_dir, cli.verbose, cli.offline)?;
    init_tracing(&config);
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::Board => cmd::cmd_board(&config).await?,
        Commands::Add {
            title,
            description,
            priority,
            assignee,
            column,
        } => {
            let fields = cmd::TaskFields {
                title,
                description,
                priority,
                assignee,
            };
            cmd::cmd_add(&config, fields, column).await?
        }
        Commands::Edit {
            id,
            title,
            description,
            priority,
            assignee,
        } => {
            let fields = cmd::TaskFields {
                title,
                description,
                priority,
                assignee,
            };
            cmd::cmd_edit(&config, &id, fields).await?
        }
        Commands::Rm { id } => cmd::cmd_rm(&config, &id, cli.yes).await?,
        Commands::Mv { id, column } => cmd::cmd_mv(&config, &id, column).await?,
        Commands::Stats => cmd::cmd_stats(&config).await?,
        Commands::Team => cmd::cmd_team(&config).await?,
        Commands::Invite { email, name, role } => {
            cmd::cmd_invite(&config, email, name, role).await?
        }
        Commands::Cal { all } => cmd::cmd_cal(&config, all).await?,
        Commands::Event {
            command:
                EventCommands::Add {
                    title,
                    start,
                    end,
                    description,
                    priority,
                },
        } => {
            cmd::cmd_event_add(&config, title, &start, end.as_deref(), description, priority)
                .await?
        }
        Commands::Profile { command } => {
            let patch = command.map(|ProfileCommands::Set { name, email, avatar }| ProfilePatch {
                full_name: name,
                email,
                avatar_url: avatar,
            });
            cmd::cmd_profile(&config, patch).await?
        }
        Commands::Settings { command } => {
            let change = command.map(|SettingsCommands::Set { key, value }| (key, value));
            cmd::cmd_settings(&config, change).await?
        }
        Commands::Ask {
            message,
            with_board,
        } => cmd::cmd_ask(&config, &message.join(" "), with_board).await?,
        Commands::Serve { port, open, dev } => cmd::cmd_serve(&config, port, open, dev).await?,
        Commands::Login { email } => cmd::cmd_login(&config, email).await?,
        Commands::Logout => cmd::cmd_logout(&config)?,
        Commands::Config { command } => cmd::cmd_config(&config, command)?,
    }

    Ok(())
}
