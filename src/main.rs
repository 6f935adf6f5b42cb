mod bot;
mod cart;
mod cli;
mod config;
mod error;
mod intent;
mod menu;
mod order;
mod orderlog;
mod session;
mod types;
mod widget;

use std::path::Path;

use clap::Parser;
use cli::Command;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::bot::MarioBot;
use crate::config::{BotConfig, PizzeriaInfo};
use crate::menu::Menu;
use crate::orderlog::OrderLog;
use crate::session::SessionState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv(); // load .env if present

    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    let info = PizzeriaInfo::from_env();

    match cli.command {
        Command::Chat(args) => {
            let menu = load_menu(args.menu.as_deref());
            let config = BotConfig {
                typing_delay_ms: args.typing_delay_ms,
                ..Default::default()
            };
            info!(pizzeria = %info.name, typing_delay_ms = config.typing_delay_ms, "chat starting");

            let bot = MarioBot::new(menu, info, config.clone(), OrderLog::new());
            if let Err(e) = widget::run_chat(bot, config, cancel).await {
                error!(error = %e, "chat widget error");
                std::process::exit(1);
            }
        }

        Command::Ask(args) => {
            let menu = load_menu(args.menu.as_deref());
            let bot = MarioBot::new(menu, info, BotConfig::default(), OrderLog::new());

            // Prime the session past the greeting, as the widget does.
            let mut session = SessionState::new();
            bot.handle(&mut session, "!welcome");

            let request = types::ChatRequest {
                message: args.message,
            };
            let reply = bot.handle_request(&mut session, &request);
            if args.json {
                match serde_json::to_string(&reply) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        error!(error = %e, "failed to serialize reply");
                        std::process::exit(1);
                    }
                }
            } else {
                println!("{}", reply.response);
            }
        }

        Command::Menu(args) => {
            let menu = load_menu(args.menu.as_deref());
            println!("{}", menu.formatted(&info.name));
        }
    }
}

/// Load the menu from a file, or fall back to the compiled-in one.
fn load_menu(path: Option<&Path>) -> Menu {
    let loaded = match path {
        Some(p) => Menu::from_file(p),
        None => Menu::embedded(),
    };
    match loaded {
        Ok(menu) => menu,
        Err(e) => {
            error!(error = %e, "failed to load menu");
            std::process::exit(1);
        }
    }
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
