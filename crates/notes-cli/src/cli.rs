use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use notes_core::VERSION;

/// Notes - end-to-end encrypted notes synchronized with a remote store
#[derive(Parser)]
#[command(name = "notes")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Username to act as (defaults to the last user who logged in)
    #[arg(short, long, global = true, env = "NOTES_USER")]
    pub user: Option<String>,

    /// Path to the config file
    #[arg(long, global = true, env = "NOTES_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, registering the user on first use
    Login(LoginArgs),

    /// Forget the remembered user
    Logout,

    /// List notes, newest first
    List(ListArgs),

    /// Create a new note
    New(NewArgs),

    /// Show a note
    Show(ShowArgs),

    /// Replace the content of a note
    Edit(EditArgs),

    /// Delete a note
    Delete(DeleteArgs),
}

/// Arguments for the `login` command
#[derive(Args)]
pub struct LoginArgs {
    /// Log in with an identity verified by an external provider (email address)
    #[arg(long, value_name = "EMAIL", requires = "subject")]
    pub federated: Option<String>,

    /// Provider-issued subject id for --federated
    #[arg(long, value_name = "SUBJECT")]
    pub subject: Option<String>,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `new` command
#[derive(Args)]
pub struct NewArgs {
    /// Note content as plain text (first line becomes the title)
    #[arg(long)]
    pub text: Option<String>,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Note ID (full UUID or prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Note ID (full UUID or prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    /// New content as plain text
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Read a JSON document from a file
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Note ID (full UUID or prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}
