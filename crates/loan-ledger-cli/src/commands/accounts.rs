use clap::Args;
use serde_json::Value;

use loan_ledger_core::ledger::{Page, UserCreate};

use super::Context;

/// Arguments for registering an account
#[derive(Args)]
pub struct RegisterArgs {
    /// Email address (case-insensitive, must be unique)
    #[arg(long)]
    pub email: String,

    /// Password
    #[arg(long, env = "LOANCTL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for logging in
#[derive(Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "LOANCTL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for listing users
#[derive(Args)]
pub struct UsersArgs {
    /// Number of users to skip
    #[arg(long, default_value_t = 0)]
    pub skip: u32,

    /// Maximum number of users to return (capped by max_page_size)
    #[arg(long, default_value_t = 100)]
    pub limit: u32,
}

/// Arguments for showing a user
#[derive(Args)]
pub struct UserArgs {
    /// User id
    pub id: i64,
}

pub fn run_register(ctx: &Context, args: RegisterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut ledger = ctx.open_ledger()?;
    let user = ledger.register_user(&UserCreate {
        email: args.email,
        password: args.password,
    })?;
    Ok(serde_json::to_value(user)?)
}

pub fn run_login(ctx: &Context, args: LoginArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut ledger = ctx.open_ledger()?;
    let issued = ledger.login(&args.email, &args.password)?;
    Ok(serde_json::to_value(issued)?)
}

pub fn run_users(ctx: &Context, args: UsersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger()?;
    let users = ledger.list_users(Page::new(args.skip, args.limit))?;
    Ok(serde_json::to_value(users)?)
}

pub fn run_user(ctx: &Context, args: UserArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger()?;
    Ok(serde_json::to_value(ledger.get_user(args.id)?)?)
}
