//! Notes CLI - end-to-end encrypted notes from the terminal
//!
//! This is the command-line interface for Notes. It provides a user-friendly
//! interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;

use clap::{CommandFactory, Parser};
use notes_core::logging::{init_logging, Verbosity};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{auth, notes};
use crate::errors::{exit_code_for, hint_for};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli).await {
        eprintln!("Error: {}", e);
        if let Some(hint) = hint_for(&e) {
            eprintln!("{}", hint);
        }
        std::process::exit(exit_code_for(&e));
    }
}

async fn run(ctx: &AppContext<'_>, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Login(args)) => {
            auth::handle_login(ctx, args).await?;
        }
        Some(Commands::Logout) => {
            auth::handle_logout(ctx).await?;
        }
        Some(Commands::List(args)) => {
            notes::handle_list(ctx, args).await?;
        }
        Some(Commands::New(args)) => {
            notes::handle_new(ctx, args).await?;
        }
        Some(Commands::Show(args)) => {
            notes::handle_show(ctx, args).await?;
        }
        Some(Commands::Edit(args)) => {
            notes::handle_edit(ctx, args).await?;
        }
        Some(Commands::Delete(args)) => {
            notes::handle_delete(ctx, args).await?;
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }
    Ok(())
}
