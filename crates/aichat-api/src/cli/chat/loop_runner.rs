//! Main chat loop orchestration.
//!
//! Gates on the signed-in session, then reads lines, runs slash commands,
//! and streams each reply from the relay. Only one reply streams at a
//! time; input typed meanwhile is refused, and Ctrl+C stops the stream
//! while keeping what already arrived.

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use console::style;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

use aichat_core::attachment::{DraftAttachment, PendingFile, format_size, prepare_drafts};
use aichat_core::chat::{Conversation, Submission};
use aichat_core::session::{Navigation, View, resolve_view};
use aichat_infra::client::RelayClient;
use aichat_infra::filesystem::read_pending_file;
use aichat_types::chat::{FinishInfo, RelayChunk};
use aichat_types::error::ConversationError;
use aichat_types::llm::MessageRole;

use crate::state::AppState;

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// How a streamed reply ended.
struct ReplyOutcome {
    text: String,
    /// The user pressed Ctrl+D while the reply was streaming.
    exit_requested: bool,
}

fn prompt_for(drafts: &[DraftAttachment]) -> String {
    if drafts.is_empty() {
        format!("  {} ", style("You >").green().bold())
    } else {
        format!(
            "  {} {} ",
            style("You").green().bold(),
            style(format!("[{} attached] >", drafts.len())).green()
        )
    }
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = ProgressStyle::default_spinner()
        .template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(template);
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run an interactive chat session against the relay at `url`.
pub async fn run_chat_loop(state: &AppState, url: Option<String>) -> anyhow::Result<()> {
    let gate = state.session_gate().await?;
    if let Navigation::Redirect(target) = resolve_view(View::Chat, gate.is_authenticated()) {
        println!();
        println!(
            "  {} Sign in to chat ({} first): run {}",
            style("!").yellow().bold(),
            target,
            style("aichat login").yellow()
        );
        println!();
        return Ok(());
    }
    let user_name = gate.current().map(|p| p.name.clone());

    let relay_url = url.unwrap_or_else(|| state.config.client.relay_url.clone());
    let client = RelayClient::new(relay_url.as_str())?;
    tracing::info!(url = %client.chat_url(), "starting chat session");

    let mut conversation = Conversation::new(user_name.as_deref());
    let mut drafts: Vec<DraftAttachment> = Vec::new();

    println!();
    println!(
        "  {} {}",
        style("AI Chat").cyan().bold(),
        style(format!("via {relay_url}")).dim()
    );
    println!("  {}", style("Type /help for commands.").dim());
    if let Some(welcome) = conversation.messages().first() {
        println!();
        println!("  {} {}", style("AI").cyan().bold(), welcome.content);
    }
    println!();

    let (mut chat_input, _writer) = ChatInput::new(prompt_for(&drafts))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => chat_input.clear(),
                ChatCommand::Exit => break,
                ChatCommand::New => match conversation.reset(user_name.as_deref()) {
                    Ok(()) => {
                        drafts.clear();
                        chat_input.update_prompt(&prompt_for(&drafts));
                        println!("\n  {} Started a new conversation.\n", style("*").cyan().bold());
                    }
                    Err(e) => println!("\n  {} {e}\n", style("!").yellow().bold()),
                },
                ChatCommand::History => print_history(&conversation),
                ChatCommand::Attach(paths) => {
                    attach_files(&paths, &mut drafts).await;
                    chat_input.update_prompt(&prompt_for(&drafts));
                }
                ChatCommand::Attachments => print_drafts(&drafts),
                ChatCommand::Detach(index) => {
                    detach(&mut drafts, index);
                    chat_input.update_prompt(&prompt_for(&drafts));
                }
                ChatCommand::Unknown(cmd_name) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(cmd_name).dim()
                    );
                }
            }
            continue;
        }

        if text.is_empty() && drafts.is_empty() {
            continue;
        }

        let attachments = drafts.iter().map(DraftAttachment::to_attachment).collect();
        let submission = match conversation.begin_submission(&text, attachments) {
            Ok(submission) => submission,
            Err(e) => {
                println!("\n  {} {e}\n", style("!").yellow().bold());
                continue;
            }
        };
        drafts.clear();
        chat_input.update_prompt(&prompt_for(&drafts));

        let outcome = stream_reply(&client, &conversation, &submission, &mut chat_input).await;
        conversation.complete(submission, &outcome.text);
        if outcome.exit_requested {
            break;
        }
    }

    drop(chat_input);
    println!("\n  {}", style("Session ended.").dim());
    Ok(())
}

/// Handle a key event that arrives while a reply is streaming.
///
/// Returns true when the user asked to leave the session.
fn on_input_while_streaming(event: InputEvent, conversation: &Conversation) -> bool {
    match event {
        InputEvent::Interrupted => {
            conversation.cancel();
            false
        }
        InputEvent::Eof => {
            conversation.cancel();
            true
        }
        InputEvent::Message(_) => {
            println!(
                "\n  {} {}. Press Ctrl+C to stop it.",
                style("!").yellow().bold(),
                ConversationError::Busy
            );
            false
        }
    }
}

/// Send the submission and print the reply as it streams.
///
/// Whatever text arrived is returned even when the stream fails or is
/// cancelled.
async fn stream_reply(
    client: &RelayClient,
    conversation: &Conversation,
    submission: &Submission,
    chat_input: &mut ChatInput,
) -> ReplyOutcome {
    let cancel = submission.cancellation();
    let spinner = thinking_spinner();
    let start_time = Instant::now();
    let mut outcome = ReplyOutcome {
        text: String::new(),
        exit_requested: false,
    };

    let send = client.send(submission.transcript());
    tokio::pin!(send);
    let mut stream = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                spinner.finish_and_clear();
                println!("\n  {}", style("Stopped.").dim());
                return outcome;
            }
            result = &mut send => match result {
                Ok(stream) => break stream,
                Err(e) => {
                    spinner.finish_and_clear();
                    eprintln!("\n  {} {e}", style("!").red().bold());
                    eprintln!(
                        "  {}",
                        style("Check that `aichat serve` is running, then try again.").dim()
                    );
                    return outcome;
                }
            },
            event = chat_input.read_line() => {
                outcome.exit_requested |= on_input_while_streaming(event, conversation);
            }
        }
    };

    let mut finish: Option<FinishInfo> = None;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                spinner.finish_and_clear();
                println!("\n  {}", style("Stopped. The partial reply was kept.").dim());
                break;
            }
            chunk = stream.next() => match chunk {
                Some(Ok(RelayChunk::Text(delta))) => {
                    if outcome.text.is_empty() {
                        spinner.finish_and_clear();
                        print!("\n  {} ", style("AI").cyan().bold());
                    }
                    print!("{delta}");
                    let _ = std::io::stdout().flush();
                    outcome.text.push_str(&delta);
                }
                Some(Ok(RelayChunk::Finish(info))) => {
                    finish = Some(info);
                    break;
                }
                Some(Ok(RelayChunk::Error(reason))) => {
                    spinner.finish_and_clear();
                    eprintln!("\n  {} {reason}", style("!").red().bold());
                    break;
                }
                Some(Err(e)) => {
                    spinner.finish_and_clear();
                    eprintln!("\n  {} {e}", style("!").red().bold());
                    break;
                }
                None => break,
            },
            event = chat_input.read_line() => {
                outcome.exit_requested |= on_input_while_streaming(event, conversation);
            }
        }
    }
    spinner.finish_and_clear();

    if let Some(info) = finish {
        println!();
        print_footer(&info, start_time.elapsed());
    }
    println!();
    outcome
}

fn print_footer(info: &FinishInfo, elapsed: Duration) {
    let mut parts = vec![info.stop_reason.to_string()];
    if let Some(usage) = info.usage {
        parts.push(format!("{} in / {} out tokens", usage.input_tokens, usage.output_tokens));
    }
    parts.push(format!("{:.1}s", elapsed.as_secs_f64()));
    println!("  {}", style(parts.join(" | ")).dim());
}

/// Read and validate files for the next message.
///
/// Every path is tried; failures are reported without dropping the files
/// that did pass.
async fn attach_files(paths: &[String], drafts: &mut Vec<DraftAttachment>) {
    let mut pending: Vec<PendingFile> = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match read_pending_file(Path::new(path)).await {
            Ok(file) => pending.push(file),
            Err(e) => failures.push(e),
        }
    }

    let batch = prepare_drafts(pending);
    failures.extend(batch.rejected);

    println!();
    for draft in &batch.accepted {
        println!(
            "  {} {} {}",
            style("+").green().bold(),
            draft.name,
            style(format!("({}, {})", format_size(draft.size), draft.content_type)).dim()
        );
        if let Some(preview) = &draft.text_preview {
            let first_line = preview.lines().next().unwrap_or_default();
            println!("    {}", style(first_line).dim());
        }
    }
    for failure in &failures {
        println!("  {} {failure}", style("!").red().bold());
    }
    println!();

    drafts.extend(batch.accepted);
}

fn print_drafts(drafts: &[DraftAttachment]) {
    println!();
    if drafts.is_empty() {
        println!("  {} No attachments. Add one with /attach <path>.", style("i").blue().bold());
    }
    for (i, draft) in drafts.iter().enumerate() {
        println!(
            "  {} {} {}",
            style(format!("{}.", i + 1)).cyan(),
            draft.name,
            style(format!("({}, {})", format_size(draft.size), draft.content_type)).dim()
        );
    }
    println!();
}

fn detach(drafts: &mut Vec<DraftAttachment>, index: Option<usize>) {
    match index {
        None => {
            let count = drafts.len();
            drafts.clear();
            println!("\n  {} Removed {count} attachment(s).\n", style("-").red().bold());
        }
        Some(n) if n <= drafts.len() => {
            let removed = drafts.remove(n - 1);
            println!("\n  {} Removed {}.\n", style("-").red().bold(), removed.name);
        }
        Some(n) => {
            println!(
                "\n  {} There is no attachment {n}. See /attachments.\n",
                style("!").yellow().bold()
            );
        }
    }
}

fn print_history(conversation: &Conversation) {
    println!();
    for msg in conversation.messages() {
        let label = match msg.role {
            MessageRole::User => style("You").green().bold(),
            MessageRole::Assistant => style("AI").cyan().bold(),
            MessageRole::System => style("System").dim(),
        };
        let preview = if msg.content.chars().count() > 100 {
            format!("{}...", msg.content.chars().take(97).collect::<String>())
        } else {
            msg.content.clone()
        };
        if msg.attachments.is_empty() {
            println!("  {label} {preview}");
        } else {
            println!(
                "  {label} {preview} {}",
                style(format!("[{} attachment(s)]", msg.attachments.len())).dim()
            );
        }
    }
    println!();
}
