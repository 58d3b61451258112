//! End-to-end review walkthrough.
//!
//! Demonstrates:
//! - Starting a review session on the default port window
//! - A panel connecting over WebSocket (simulated unless `--real-panel`)
//! - Speaking, listening and logging feedback
//! - Page navigation and the final summary
//!
//! Usage:
//!   cargo run --example review_walkthrough
//!   cargo run --example review_walkthrough -- --debug
//!   cargo run --example review_walkthrough -- --real-panel

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use feedback_copilot::{
    Envelope, FeedbackInput, ReviewSession, SessionStatus, SpeakOutcome, Utterance,
};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const APP_URL: &str = "http://localhost:3000";
const PAGES: &[&str] = &["/", "/pricing", "/signup"];

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    real_panel: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            real_panel: args.iter().any(|a| a == "--real-panel"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "feedback_copilot=debug"
    } else {
        "feedback_copilot=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Review Walkthrough ===\n");

    let session = ReviewSession::builder()
        .app_url(APP_URL)
        .pages(PAGES.iter().copied())
        .event_timeout(Duration::from_secs(60))
        .start()
        .await
        .context("starting session")?;

    let started = session.started();
    println!("[Session] {}", started.session_id);
    println!("        Port:        {}", started.port);
    println!("        Bookmarklet: {}", started.bookmarklet_url);
    println!("        Console:     {}\n", started.console_snippet);

    if args.real_panel {
        println!("[Panel] Waiting for the panel to connect...");
        while !session.is_connected() {
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    } else {
        tokio::spawn(simulated_panel(started.port));
        while !session.is_connected() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
    println!("        ✓ Panel connected\n");

    // ========================================================================
    // Review Loop
    // ========================================================================

    loop {
        let page = session.current_page().unwrap_or_default();
        println!("[Page] {page}");
        session.set_status(SessionStatus::Listening);

        let prompt = format!("We're on {page}. What do you notice?");
        match session.speak(prompt, true).await? {
            SpeakOutcome::UserSaid(Utterance::Said(text)) => {
                let logged =
                    session.log_feedback(FeedbackInput::new(&text).page(&page).severity("major"));
                println!("        Logged #{}: {text}", logged.item.id);
            }
            SpeakOutcome::UserSaid(Utterance::WrapUp) => break,
            SpeakOutcome::UserSaid(_) | SpeakOutcome::Spoken => {}
            SpeakOutcome::PanelNotConnected { .. } => {
                println!("        Panel went away");
                break;
            }
        }

        if session.next_page().is_none() {
            break;
        }
    }

    // ========================================================================
    // Summary
    // ========================================================================

    let report = session.summary();
    println!("\n[Summary] {} items", report.total);
    for (page, count) in &report.summary.by_page {
        println!("        {page}: {count}");
    }

    let total = session.end().await;
    println!("\n[Done] Session ended with {total} items");
    Ok(())
}

// ============================================================================
// Simulated Panel
// ============================================================================

/// Answers every `speak` with a canned remark, then wraps up.
async fn simulated_panel(port: u16) -> anyhow::Result<()> {
    let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}")).await?;
    let mut remarks = ["The hero image is blurry", "Prices are hard to compare"].into_iter();

    while let Some(frame) = ws.next().await {
        let Message::Text(text) = frame? else {
            continue;
        };
        let envelope = Envelope::decode(text.as_str())?;
        if !envelope.is("speak") {
            continue;
        }

        let answer = remarks.next().unwrap_or("[[WRAP UP]]");
        let reply = Envelope::new("user_speech", answer.into()).encode()?;
        ws.send(Message::text(reply)).await?;
    }

    Ok(())
}
