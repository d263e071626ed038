use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use loan_ledger_core::ledger::{ItemCreate, LoanCreate, Page};

use super::amortization::display_row;
use super::Context;
use crate::input;

#[derive(Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub skip: u32,

    #[arg(long, default_value_t = 100)]
    pub limit: u32,
}

impl PageArgs {
    fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

#[derive(Subcommand)]
pub enum ItemCommand {
    /// Create a plain item owned by the caller
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the caller's items, loans included
    List(PageArgs),
}

#[derive(Subcommand)]
pub enum LoanCommand {
    /// Create a loan and store its amortization schedule
    Create(LoanCreateArgs),
    /// List loans the caller owns or has been shared
    List(PageArgs),
    /// Show one loan
    Show { id: i64 },
    /// Stored amortization schedule of a loan
    Schedule {
        id: i64,
        /// Print raw decimals instead of currency strings
        #[arg(long)]
        raw: bool,
    },
    /// Balance and aggregate principal/interest paid at a month
    Summary {
        id: i64,
        #[arg(long, allow_hyphen_values = true)]
        month: i64,
    },
    /// Give another registered user view access (owner only)
    Share {
        id: i64,
        #[arg(long)]
        email: String,
    },
}

#[derive(Args)]
pub struct LoanCreateArgs {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Principal amount
    #[arg(long, allow_hyphen_values = true)]
    pub amount: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long, alias = "rate", allow_hyphen_values = true)]
    pub annual_interest_rate: Option<Decimal>,

    /// Term in whole months
    #[arg(long, alias = "term")]
    pub loan_term_in_months: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_item(ctx: &Context, command: ItemCommand) -> Result<Value, Box<dyn std::error::Error>> {
    let token = ctx.token()?;
    match command {
        ItemCommand::Create { title, description } => {
            let mut ledger = ctx.open_ledger()?;
            let item = ledger.create_item(token, &ItemCreate { title, description })?;
            Ok(serde_json::to_value(item)?)
        }
        ItemCommand::List(page) => {
            let ledger = ctx.open_ledger()?;
            Ok(serde_json::to_value(ledger.list_items(token, page.page())?)?)
        }
    }
}

pub fn run_loan(ctx: &Context, command: LoanCommand) -> Result<Value, Box<dyn std::error::Error>> {
    let token = ctx.token()?;
    let mut ledger = ctx.open_ledger()?;
    match command {
        LoanCommand::Create(args) => {
            let request = loan_request(&args)?;
            Ok(serde_json::to_value(ledger.create_loan(token, &request)?)?)
        }
        LoanCommand::List(page) => Ok(serde_json::to_value(ledger.list_loans(token, page.page())?)?),
        LoanCommand::Show { id } => Ok(serde_json::to_value(ledger.get_loan(token, id)?)?),
        LoanCommand::Schedule { id, raw } => {
            let rows = ledger.loan_schedule(token, id)?;
            if raw {
                Ok(json!({ "loan_id": id, "schedule": rows }))
            } else {
                let rows: Vec<Value> = rows.iter().map(display_row).collect();
                Ok(json!({ "loan_id": id, "schedule": rows }))
            }
        }
        LoanCommand::Summary { id, month } => {
            Ok(serde_json::to_value(ledger.loan_summary(token, id, month)?)?)
        }
        LoanCommand::Share { id, email } => {
            let member = ledger.share_loan(token, id, &email)?;
            Ok(json!({ "loan_id": id, "shared_with": member }))
        }
    }
}

fn loan_request(args: &LoanCreateArgs) -> Result<LoanCreate, Box<dyn std::error::Error>> {
    input::resolve(args.input.as_deref(), || {
        Ok(LoanCreate {
            title: args
                .title
                .clone()
                .ok_or("--title is required (or provide --input)")?,
            description: args.description.clone(),
            amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            annual_interest_rate: args
                .annual_interest_rate
                .ok_or("--annual-interest-rate is required (or provide --input)")?,
            loan_term_in_months: args
                .loan_term_in_months
                .ok_or("--loan-term-in-months is required (or provide --input)")?,
        })
    })
}
