//! A terminal client for the product-marketing agent.

#[macro_use]
extern crate tracing;

mod commands;
mod render;

use std::io::Write as _;
use std::time::Duration;

use agent_chat_core::{
    ChatSession, ChatSessionBuilder, ExchangeError, SubmitOutcome,
    SubmitRejection, ToolDisplayRegistry, Transcript,
};
use agent_chat_http::{AgentConfigBuilder, HttpAgentTransport};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::commands::{HELP, Input, QUICK_ACTIONS};
use crate::render::{Output, Renderer};

enum SessionEvent {
    Update(Transcript),
    Error(ExchangeError),
    Idle,
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AgentConfigBuilder::from_env()
        .with_connect_timeout(Duration::from_secs(10))
        .build();
    let transport = match HttpAgentTransport::new(config) {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("failed to create the HTTP client: {err}");
            return;
        }
    };

    match transport.health().await {
        Ok(health) => {
            let agent = health.agent.as_deref().unwrap_or("agent");
            println!(
                "{}",
                format!("Connected to {agent} at {}", transport.config().base_url())
                    .dimmed()
            );
        }
        Err(err) => {
            println!(
                "{}",
                format!(
                    "⚠️  Agent at {} is unreachable: {err}",
                    transport.config().base_url()
                )
                .yellow()
            );
        }
    }
    println!("{}", "Type a message, or /help for commands.".dimmed());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut session = new_session(transport.clone(), &event_tx);
    let mut renderer = Renderer::new(ToolDisplayRegistry::default());

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .expect("template is valid")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    // One reader for the whole run, so buffered lines of pasted or piped
    // input are not lost between prompts.
    let mut stdin = io::BufReader::new(io::stdin());

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        let message = match Input::parse(&line) {
            Input::Message(message) => message,
            Input::QuickAction(action) => {
                println!("{}", action.prompt.bright_white());
                action.prompt
            }
            Input::Help => {
                println!("{HELP}");
                continue;
            }
            Input::Actions => {
                for (idx, action) in QUICK_ACTIONS.iter().enumerate() {
                    println!("/{}  {}", idx + 1, action.label);
                }
                continue;
            }
            Input::Reset => {
                reset(&transport, &session).await;
                session = new_session(transport.clone(), &event_tx);
                println!("{}", "Started a new conversation.".dimmed());
                continue;
            }
            Input::Quit => break,
            Input::Unknown(command) => {
                println!("Unknown command {command}, try /help");
                continue;
            }
        };

        match session.submit(message).await {
            Ok(SubmitOutcome::Accepted) => {}
            Ok(SubmitOutcome::Rejected(SubmitRejection::Empty)) => continue,
            Ok(SubmitOutcome::Rejected(rejection)) => {
                println!("{}", rejection.yellow());
                continue;
            }
            Err(err) => {
                error!("cannot submit: {err}");
                break;
            }
        }

        let mut progress_bar = None;
        let mut streaming = false;

        loop {
            if !streaming {
                progress_bar
                    .get_or_insert_with(|| {
                        let progress_bar = ProgressBar::new_spinner();
                        progress_bar.set_style(progress_style.clone());
                        progress_bar.set_message("🤔 Thinking...");
                        progress_bar
                    })
                    .inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            match event {
                SessionEvent::Update(transcript) => {
                    let outputs = renderer.render(&transcript);
                    if outputs.is_empty() {
                        continue;
                    }
                    // Finish the progress bar before printing anything else.
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                        print!("{}🤖 ", BAR_CHAR.bright_cyan());
                    }
                    streaming = true;
                    print_outputs(outputs);
                }
                SessionEvent::Error(err) => {
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    if streaming {
                        println!();
                    }
                    println!("{}❌ {}", BAR_CHAR.red(), err.red());
                    streaming = false;
                }
                SessionEvent::Idle => {
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    if streaming {
                        println!("\n");
                    }
                    break;
                }
            }
        }
    }
}

fn new_session(
    transport: HttpAgentTransport,
    event_tx: &mpsc::UnboundedSender<SessionEvent>,
) -> ChatSession {
    ChatSessionBuilder::with_transport(transport)
        .with_idle_timeout(Duration::from_secs(300))
        .on_update({
            let event_tx = event_tx.clone();
            move |transcript| {
                event_tx.send(SessionEvent::Update(transcript.clone())).ok();
            }
        })
        .on_error({
            let event_tx = event_tx.clone();
            move |err| {
                event_tx.send(SessionEvent::Error(err.clone())).ok();
            }
        })
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::Idle).ok();
            }
        })
        .build()
}

async fn reset(transport: &HttpAgentTransport, session: &ChatSession) {
    let Ok(snapshot) = session.snapshot().await else {
        return;
    };
    let Some(session_id) = snapshot.session_id else {
        return;
    };
    if let Err(err) = transport.delete_session(&session_id).await {
        warn!("failed to delete session {session_id}: {err}");
    }
}

fn print_outputs(outputs: Vec<Output>) {
    let mut stdout = std::io::stdout().lock();
    for output in outputs {
        match output {
            Output::Text(text) => {
                write!(stdout, "{}", text.bright_white()).ok();
            }
            Output::ToolStarted(label) => {
                write!(stdout, "\n{} {}...\n", "⏳".yellow(), label.dimmed()).ok();
            }
            Output::ToolCompleted(label) => {
                write!(stdout, "\n{} {}", "✔".green(), label.dimmed()).ok();
            }
        }
    }
    stdout.flush().ok();
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut line = String::new();

    match reader.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_line_keeps_buffered_input() {
        let mut reader: &[u8] = b"/help\n/actions\nHello";
        assert_eq!(read_line(&mut reader).await.as_deref(), Some("/help\n"));
        assert_eq!(read_line(&mut reader).await.as_deref(), Some("/actions\n"));
        assert_eq!(read_line(&mut reader).await.as_deref(), Some("Hello"));
        assert_eq!(read_line(&mut reader).await, None);
    }

    #[tokio::test]
    async fn test_read_line_through_buf_reader() {
        let mut reader = io::BufReader::new(&b"/1\n/quit\n"[..]);
        let first = read_line(&mut reader).await.unwrap();
        assert!(matches!(Input::parse(&first), Input::QuickAction(_)));
        let second = read_line(&mut reader).await.unwrap();
        assert_eq!(Input::parse(&second), Input::Quit);
    }
}
