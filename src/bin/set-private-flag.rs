#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that scans an Exchange mailbox over EWS and rewrites the MAPI
//! sensitivity flag on matching messages.
//!
//! Without `--subject`, items already marked private are changed back
//! to normal; with it, items whose subject contains the text are
//! marked private.

use clap::{CommandFactory, Parser};
use ews_private_flag::{
    ConfirmPolicy, ConnectConfig, Error, ExchangeClient, ItemFilter, ScanOptions, ScanSummary,
    run_scan,
};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "set-private-flag")]
#[command(
    about = "Scan an Exchange mailbox over EWS and rewrite the sensitivity flag on matching messages"
)]
struct Args {
    /// SMTP address of the mailbox to scan
    #[arg(long)]
    mailbox: Option<String>,

    /// Mark items private whose subject contains this text
    #[arg(long)]
    subject: Option<String>,

    /// Only scan folders whose path contains this text
    /// (private-flag scans only)
    #[arg(long)]
    foldername: Option<String>,

    /// Report matching items without changing anything
    #[arg(long)]
    logonly: bool,

    /// Change matching items without asking
    #[arg(long)]
    noconfirmation: bool,

    /// Accept any TLS certificate
    #[arg(long)]
    ignorecertificate: bool,

    /// Explicit EWS endpoint, e.g. https://server/EWS/Exchange.asmx
    /// (skips autodiscovery)
    #[arg(long)]
    url: Option<String>,

    /// User name for basic authentication
    #[arg(long)]
    user: Option<String>,

    /// Password for basic authentication
    #[arg(long)]
    password: Option<String>,

    /// Act as the mailbox owner instead of the authenticated account
    #[arg(long)]
    impersonate: bool,

    /// Follow autodiscover redirects to secure targets
    #[arg(long)]
    allowredirection: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

/// Usage goes to stdout, matching the original tool.
fn print_usage() {
    let mut command = Args::command();
    let _ = command.print_help();
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if std::env::args().len() <= 1 {
        print_usage();
        std::process::exit(1);
    }

    let args = Args::parse();

    let Some(mailbox) = args.mailbox.clone() else {
        println!("No mailbox is given. Use --help to refer to the usage.");
        print_usage();
        std::process::exit(1);
    };

    if let Err(err) = run(&args, mailbox).await {
        error!("{err}");
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(args: &Args, mailbox: String) -> Result<(), Error> {
    debug!("mailbox: {mailbox}");
    debug!("logonly: {}", args.logonly);
    debug!("noconfirmation: {}", args.noconfirmation);
    debug!("impersonate: {}", args.impersonate);
    debug!("allowredirection: {}", args.allowredirection);
    debug!("ignorecertificate: {}", args.ignorecertificate);
    match &args.url {
        Some(url) => debug!("server URL: {url}"),
        None => debug!("server URL: using autodiscover"),
    }
    if let Some(user) = &args.user {
        debug!("user: {user}");
    }
    if args.password.is_some() {
        debug!("password: is set");
    }

    let filter = match &args.subject {
        Some(text) => {
            if args.foldername.is_some() {
                warn!("--foldername only applies to private-flag scans; ignoring it");
            }
            ItemFilter::SubjectContains(text.clone())
        }
        None => ItemFilter::PrivateFlag,
    };

    let confirm = if args.logonly {
        ConfirmPolicy::LogOnly
    } else if args.noconfirmation {
        ConfirmPolicy::Always
    } else {
        ConfirmPolicy::Interactive
    };

    let mut config = ConnectConfig::new(mailbox);
    config.url = args.url.clone();
    config.user = args.user.clone();
    config.password = args.password.clone();
    config.impersonate = args.impersonate;
    config.allow_redirect = args.allowredirection;
    config.ignore_certificates = args.ignorecertificate;
    let config = config.with_env_credentials();

    let client = ExchangeClient::connect(&config).await?;

    let options = ScanOptions {
        folder_filter: if args.subject.is_none() {
            args.foldername.clone()
        } else {
            None
        },
        filter,
        confirm,
    };

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    let summary = run_scan(&client, &options, &mut input, &mut output).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &ScanSummary) {
    println!(
        "{} folder(s) scanned, {} matching item(s), {} changed, {} declined, {} update failure(s)",
        summary.folders_scanned,
        summary.matches,
        summary.changed,
        summary.declined,
        summary.update_failures
    );
}
