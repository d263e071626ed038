mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::accounts::{LoginArgs, RegisterArgs, UserArgs, UsersArgs};
use commands::amortization::{PaymentArgs, ScheduleArgs, SummaryArgs};
use commands::loans::{ItemCommand, LoanCommand};
use commands::Context;

/// Loan amortization schedules and servicing records
#[derive(Parser)]
#[command(
    name = "loanctl",
    version,
    about = "Loan amortization schedules and servicing records",
    long_about = "A CLI for computing fixed-payment amortization schedules with decimal \
                  precision, and for keeping loan records: register, log in, create loans \
                  whose schedules are stored with them, share loans, and summarize \
                  principal and interest paid at any month."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Path to the ledger database
    #[arg(long, env = "LOANCTL_DB", default_value = "loan-ledger.db", global = true)]
    db: PathBuf,

    /// Bearer token returned by `loanctl login`
    #[arg(long, env = "LOANCTL_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// YAML file with ledger settings (token TTL, page size)
    #[arg(long, env = "LOANCTL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed monthly payment for a loan
    Payment(PaymentArgs),
    /// Full amortization schedule for a loan
    Schedule(ScheduleArgs),
    /// Principal/interest summary of a schedule at a given month
    Summary(SummaryArgs),
    /// Register a new user
    Register(RegisterArgs),
    /// Log in and print a bearer token
    Login(LoginArgs),
    /// List registered users
    Users(UsersArgs),
    /// Show a single user
    User(UserArgs),
    /// Create and list items
    Item {
        #[command(subcommand)]
        action: ItemCommand,
    },
    /// Create, inspect and share loans
    Loan {
        #[command(subcommand)]
        action: LoanCommand,
    },
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let ctx = Context {
        db: cli.db,
        token: cli.token,
        config: cli.config,
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::amortization::run_payment(args),
        Commands::Schedule(args) => commands::amortization::run_schedule(args),
        Commands::Summary(args) => commands::amortization::run_summary(args),
        Commands::Register(args) => commands::accounts::run_register(&ctx, args),
        Commands::Login(args) => commands::accounts::run_login(&ctx, args),
        Commands::Users(args) => commands::accounts::run_users(&ctx, args),
        Commands::User(args) => commands::accounts::run_user(&ctx, args),
        Commands::Item { action } => commands::loans::run_item(&ctx, action),
        Commands::Loan { action } => commands::loans::run_loan(&ctx, action),
        Commands::Version => {
            println!("loanctl {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
