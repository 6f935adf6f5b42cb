//! Chat widget TUI using ratatui + crossterm.
//!
//! Plays the role of the original browser widget: a message list with
//! timestamps, a typing indicator while Mario "writes", a cart badge
//! in the header, and a toggleable cart panel projected from the
//! aggregated snapshot.

use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bot::MarioBot;
use crate::cart::{self, CartView};
use crate::config::BotConfig;
use crate::error::MarioError;
use crate::session::SessionState;

/// Target render interval (10 FPS).
const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Delay before the widget greets on its own, as the browser widget
/// did with its deferred `!welcome`.
const WELCOME_DELAY: Duration = Duration::from_secs(3);

/// Maximum messages retained in the transcript.
const MAX_MESSAGES: usize = 500;

/// Who wrote a transcript message.
#[derive(Clone, Copy, PartialEq)]
enum Sender {
    User,
    Bot,
}

/// One transcript entry.
struct DisplayMessage {
    sender: Sender,
    text: String,
    time: String,
}

/// A reply computed but not yet shown (typing indicator period).
struct PendingReply {
    deliver_at: Instant,
    response: crate::types::ChatResponse,
}

/// Run the chat widget until Esc or cancellation.
pub async fn run_chat(
    bot: MarioBot,
    config: BotConfig,
    cancel: CancellationToken,
) -> Result<(), MarioError> {
    let typing_delay = Duration::from_millis(config.typing_delay_ms);

    let mut session = SessionState::new();
    let mut messages: VecDeque<DisplayMessage> = VecDeque::new();
    let mut input = String::new();
    let mut pending: Option<PendingReply> = None;
    let mut show_cart = false;

    // UI-side mirror of the cart: updated only through delivered
    // responses, never by reaching into the bot's session.
    let mut ui_state = SessionState::new();
    let mut cart_view = cart::aggregate(ui_state.cart());

    let mut welcome_at = Some(Instant::now() + WELCOME_DELAY);

    enable_raw_mode().map_err(|e| MarioError::Terminal(e.to_string()))?;
    io::stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| MarioError::Terminal(e.to_string()))?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .map_err(|e| MarioError::Terminal(e.to_string()))?;

    info!("chat widget started");

    let mut render_interval = tokio::time::interval(RENDER_INTERVAL);
    let mut quit = false;

    loop {
        if quit {
            break;
        }

        tokio::select! {
            _ = render_interval.tick() => {
                let now = Instant::now();

                // Deferred welcome message.
                if welcome_at.is_some_and(|at| now >= at) {
                    welcome_at = None;
                    let response = bot.handle(&mut session, "!welcome");
                    pending = Some(PendingReply {
                        deliver_at: now + typing_delay,
                        response,
                    });
                }

                // Deliver a pending reply once the typing delay elapsed.
                if pending.as_ref().is_some_and(|p| now >= p.deliver_at) {
                    if let Some(ready) = pending.take() {
                        let reply = ready.response;
                        ui_state.apply_response(&reply);
                        cart_view = cart::aggregate(ui_state.cart());
                        push_message(&mut messages, Sender::Bot, reply.response);
                    }
                }

                // Poll keyboard (non-blocking).
                while event::poll(Duration::ZERO).unwrap_or(false) {
                    let Ok(Event::Key(key)) = event::read() else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Esc => quit = true,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            quit = true;
                        }
                        KeyCode::Tab => show_cart = !show_cart,
                        KeyCode::Backspace => {
                            input.pop();
                        }
                        KeyCode::Enter => {
                            let message = input.trim().to_string();
                            if !message.is_empty() && pending.is_none() {
                                input.clear();
                                push_message(&mut messages, Sender::User, message.clone());
                                let response = bot.handle(&mut session, &message);
                                pending = Some(PendingReply {
                                    deliver_at: Instant::now() + typing_delay,
                                    response,
                                });
                            }
                        }
                        KeyCode::Char(c) => input.push(c),
                        _ => {}
                    }
                }

                if !quit {
                    let typing = pending.is_some();
                    let _ = terminal.draw(|frame| {
                        render_ui(
                            frame,
                            bot.info().name.as_str(),
                            &messages,
                            &input,
                            typing,
                            show_cart,
                            &cart_view,
                        );
                    });
                }
            }

            _ = cancel.cancelled() => break,
        }
    }

    restore_terminal(&mut terminal);
    info!("chat widget stopped");
    Ok(())
}

fn push_message(messages: &mut VecDeque<DisplayMessage>, sender: Sender, text: String) {
    messages.push_back(DisplayMessage {
        sender,
        text,
        time: chrono::Local::now().format("%H:%M").to_string(),
    });
    while messages.len() > MAX_MESSAGES {
        messages.pop_front();
    }
}

/// Restore terminal to normal mode.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) {
    let _ = terminal.show_cursor();
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(LeaveAlternateScreen);
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_ui(
    frame: &mut Frame,
    pizzeria_name: &str,
    messages: &VecDeque<DisplayMessage>,
    input: &str,
    typing: bool,
    show_cart: bool,
    cart_view: &CartView,
) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(3),    // transcript (+ cart panel)
            Constraint::Length(3), // input
        ])
        .split(area);

    // Header with cart badge.
    let badge = if cart_view.is_empty() {
        "🛒 vuoto".to_string()
    } else {
        format!("🛒 {}", cart_view.total_count)
    };
    let header = Paragraph::new(format!(
        " {} — {badge} | Tab: carrello | Esc: esci",
        pizzeria_name.to_uppercase()
    ))
    .style(Style::default().fg(Color::White).bg(Color::Red).bold());
    frame.render_widget(header, main_layout[0]);

    // Transcript, optionally splitting off a cart panel.
    let body = if show_cart {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(main_layout[1]);
        render_cart_panel(frame, split[1], cart_view);
        split[0]
    } else {
        main_layout[1]
    };
    render_transcript(frame, body, messages, typing);

    // Input line.
    let input_widget = Paragraph::new(format!("{input}▌"))
        .block(Block::default().borders(Borders::ALL).title(" Scrivi a Mario "));
    frame.render_widget(input_widget, main_layout[2]);
}

fn render_transcript(
    frame: &mut Frame,
    area: Rect,
    messages: &VecDeque<DisplayMessage>,
    typing: bool,
) {
    let mut lines: Vec<Line> = Vec::new();

    for msg in messages {
        let (label, style) = match msg.sender {
            Sender::User => ("Tu", Style::default().fg(Color::Cyan).bold()),
            Sender::Bot => ("Mario", Style::default().fg(Color::Green).bold()),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{label} "), style),
            Span::styled(msg.time.clone(), Style::default().fg(Color::DarkGray)),
        ]));
        for text_line in msg.text.lines() {
            lines.push(Line::from(clean_markdown(text_line)));
        }
        lines.push(Line::from(""));
    }

    if typing {
        lines.push(Line::from(Span::styled(
            "Mario sta scrivendo...",
            Style::default().fg(Color::DarkGray).italic(),
        )));
    }

    // Keep the bottom of the transcript in view.
    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let wrapped: usize = lines
        .iter()
        .map(|l| (l.width().max(1)).div_ceil(inner_width))
        .sum();
    let scroll = wrapped.saturating_sub(inner_height) as u16;

    let transcript = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Chat "))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(transcript, area);
}

fn render_cart_panel(frame: &mut Frame, area: Rect, cart_view: &CartView) {
    let mut lines: Vec<Line> = Vec::new();

    if cart_view.is_empty() {
        lines.push(Line::from("Il tuo carrello è vuoto"));
    } else {
        for entry in &cart_view.entries {
            lines.push(Line::from(vec![
                Span::raw(format!("{} x{}  ", entry.name, entry.count)),
                Span::styled(
                    cart::format_eur(entry.subtotal),
                    Style::default().fg(Color::Yellow),
                ),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Totale  {}", cart_view.grand_total_display()),
            Style::default().bold(),
        )));
    }

    let title = format!(" 🛒 Carrello ({}) ", cart_view.total_count);
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

/// Strip the markdown the bot writes for web rendering; the terminal
/// shows plain text.
fn clean_markdown(line: &str) -> String {
    line.trim_start_matches(['#', ' '])
        .replace("**", "")
        .replace(['*', '_'], "")
}
