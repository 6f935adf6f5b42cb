use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// damario — ordering assistant for Pizzeria Da Mario.
#[derive(Parser, Debug)]
#[command(name = "damario", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive chat widget
    Chat(ChatArgs),

    /// Send one message through the bot and print the reply
    Ask(AskArgs),

    /// Print the formatted menu
    Menu(MenuArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Typing-indicator delay before a reply is shown (ms)
    #[arg(long, default_value = "900")]
    pub typing_delay_ms: u64,

    /// Alternative menu JSON file (defaults to the built-in menu)
    #[arg(long)]
    pub menu: Option<PathBuf>,
}

/// Arguments for the `ask` subcommand.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The message to send (e.g. "vorrei due margherita")
    pub message: String,

    /// Print the raw {response, cart} payload as JSON
    #[arg(long)]
    pub json: bool,

    /// Alternative menu JSON file (defaults to the built-in menu)
    #[arg(long)]
    pub menu: Option<PathBuf>,
}

/// Arguments for the `menu` subcommand.
#[derive(Parser, Debug)]
pub struct MenuArgs {
    /// Alternative menu JSON file (defaults to the built-in menu)
    #[arg(long)]
    pub menu: Option<PathBuf>,
}
