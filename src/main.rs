use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use autosieve::config::Config;
use autosieve::net::imap::ImapClient;
use autosieve::net::managesieve::ManageSieveClient;
use autosieve::{AutoSieve, Error};

/// File every sender of a mailbox into its own folder and keep a SIEVE
/// script that does the same for future mail.
#[derive(Debug, Parser)]
#[command(name = "autosieve", version)]
struct Cli {
    /// Configuration file (defaults to autosieve.json in the config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the name of the managed script
    #[arg(long)]
    script_name: Option<String>,

    /// Print the script that would be installed and change nothing
    #[arg(long)]
    dry_run: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, env = "AUTOSIEVE_IMAP_PASSWORD", hide_env_values = true)]
    imap_password: String,

    /// Defaults to the IMAP password
    #[arg(long, env = "AUTOSIEVE_SIEVE_PASSWORD", hide_env_values = true)]
    sieve_password: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "autosieve failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(name) = cli.script_name {
        config.script.name = name;
    }
    let sieve_password = cli
        .sieve_password
        .unwrap_or_else(|| cli.imap_password.clone());

    // ManageSieve before IMAP; a failed IMAP connect closes it again
    let mut scripts = ManageSieveClient::new();
    scripts
        .connect(&config.sieve_profile(), &sieve_password)
        .await?;
    let mut mail = match ImapClient::connect(&config.imap, &cli.imap_password).await {
        Ok(mail) => mail,
        Err(err) => {
            scripts.disconnect().await;
            return Err(err.into());
        }
    };

    let result = run_cycle(&mut mail, &mut scripts, &config, cli.dry_run).await;

    scripts.disconnect().await;
    if let Err(err) = mail.logout().await {
        warn!(error = %err, "IMAP logout failed");
    }
    result
}

async fn run_cycle(
    mail: &mut ImapClient,
    scripts: &mut ManageSieveClient,
    config: &Config,
    dry_run: bool,
) -> Result<(), Error> {
    let mut planner = AutoSieve::new(mail, scripts, config.script.clone());
    planner.scan_senders().await?;

    if dry_run {
        planner.load_header().await?;
        println!("{}", planner.render());
        for mailbox in planner.pending_mailboxes() {
            info!(mailbox = %mailbox, "would create or fill mailbox");
        }
        return Ok(());
    }

    let summary = planner.commit().await?;
    println!(
        "Installed {} with {} new rule(s); created {} mailbox(es), moved {} message(s), {} move(s) failed",
        summary.script,
        summary.rules,
        summary.created.len(),
        summary.moved,
        summary.failed_moves
    );
    Ok(())
}
