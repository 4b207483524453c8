use std::fs::OpenOptions;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use warmup_dash::auth::token_store;
use warmup_dash::config::{HostEnvironment, load_config, log_path};
use warmup_dash::context::AppContext;
use warmup_dash::store::open_store;
use warmup_dash::terminal::run_tui;

#[derive(Parser)]
#[command(name = "warmup_dash")]
#[command(about = "Email warmup dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the dashboard (default)
    Tui,

    /// Store a sign-in token for an app id in the keyring
    SetToken {
        #[arg(long, default_value = warmup_dash::config::DEFAULT_APP_ID)]
        app_id: String,
    },

    /// Create a sign-in token for a user in the SQLite store
    IssueToken {
        #[arg(long)]
        uid: String,
    },
}

/// Logs go to a file; the terminal belongs to the dashboard.
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Ok(path) = log_path() {
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(path) {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.cmd.unwrap_or(Command::Tui) {
        Command::SetToken { app_id } => {
            eprintln!("Paste sign-in token (end with Ctrl-D):");
            let mut token = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut token)?;
            let token = token.trim();
            if token.is_empty() {
                return Err(anyhow!("no token given"));
            }
            token_store::save_auth_token(&app_id, token)?;
            println!("Saved sign-in token for app {}", app_id);
            Ok(())
        }

        Command::IssueToken { uid } => {
            let env = HostEnvironment::from_env()?;
            let handles = open_store(&env.store)?;
            let sqlite = handles
                .sqlite
                .ok_or_else(|| anyhow!("issue-token needs a sqlite store"))?;
            println!("{}", sqlite.issue_token(&uid)?);
            Ok(())
        }

        Command::Tui => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let ctx = HostEnvironment::from_env().and_then(|env| AppContext::bootstrap(env, cfg));
            run_tui(ctx)
        }
    }
}
