//! `closet`: command-line client for the closet social feed.
//!
//! Manages contexts and sessions, lists the feed, and toggles likes
//! through the same reaction engine the apps use.

mod commands;
mod config;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "closet", about = "Closet social feed client")]
struct Cli {
    /// Path to client config file (default: ~/.closet/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts.
    #[command(name = "context")]
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    #[command(name = "use")]
    Use {
        #[command(subcommand)]
        what: UseWhat,
    },

    /// Log in to the current context's server.
    Login {
        #[arg(long)]
        user: Option<String>,
        /// Password (prompted for when omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear the session of the current context.
    Logout,

    /// Show a page of the feed.
    Feed {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Toggle the like on a post.
    React { post_id: String },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create a new context.
    Create {
        name: String,
        /// API base URL.
        #[arg(long)]
        server: String,
        /// Delay between a settled like and the feed refresh, in ms.
        #[arg(long)]
        settle_delay_ms: Option<u64>,
    },
    /// List all contexts.
    List,
    /// Set properties on a context.
    Set {
        name: String,
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        settle_delay_ms: Option<u64>,
    },
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum UseWhat {
    /// Switch to a context.
    Context { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Create {
                name,
                server,
                settle_delay_ms,
            } => {
                commands::context::create(&name, &server, settle_delay_ms, &config_path)?;
            }
            ContextAction::List => {
                commands::context::list(&config_path)?;
            }
            ContextAction::Set {
                name,
                server,
                settle_delay_ms,
            } => {
                commands::context::set(&name, server.as_deref(), settle_delay_ms, &config_path)?;
            }
            ContextAction::Delete { name } => {
                commands::context::delete(&name, &config_path)?;
            }
        },

        Commands::Use { what } => match what {
            UseWhat::Context { name } => {
                commands::context::use_context(&name, &config_path)?;
            }
        },

        Commands::Login { user, password } => {
            let username = match user {
                Some(u) => u,
                None => {
                    eprint!("Username: ");
                    let mut s = String::new();
                    std::io::stdin().read_line(&mut s)?;
                    s.trim().to_string()
                }
            };
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            if username.is_empty() || password.is_empty() {
                anyhow::bail!("Username and password are required.");
            }
            commands::login::login(&username, &password, &config_path).await?;
        }

        Commands::Logout => {
            commands::login::logout(&config_path)?;
        }

        Commands::Feed { page, limit } => {
            let json_output = cli.output == "json";
            commands::feed::feed(page, limit, json_output, &config_path).await?;
        }

        Commands::React { post_id } => {
            commands::react::react(&post_id, &config_path).await?;
        }

        Commands::Version => {
            println!("closet cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
