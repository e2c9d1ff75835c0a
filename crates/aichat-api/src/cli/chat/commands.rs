//! Slash command parsing for the chat loop.
//!
//! Commands start with `/`. Anything else is sent to the model.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Start over with only the greeting.
    New,
    /// Show the conversation so far.
    History,
    /// Attach one or more files to the next message.
    Attach(Vec<String>),
    /// List pending attachments.
    Attachments,
    /// Remove one pending attachment (1-based), or all of them.
    Detach(Option<usize>),
    /// Unknown or malformed command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), arg.trim()),
        None => (trimmed.to_lowercase(), ""),
    };

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New,
        "/history" => ChatCommand::History,
        "/attach" | "/a" => {
            if arg.is_empty() {
                ChatCommand::Unknown("/attach requires a file path".to_string())
            } else {
                ChatCommand::Attach(arg.split_whitespace().map(str::to_string).collect())
            }
        }
        "/attachments" | "/files" => ChatCommand::Attachments,
        "/detach" => {
            if arg.is_empty() {
                ChatCommand::Detach(None)
            } else {
                match arg.parse::<usize>() {
                    Ok(n) if n > 0 => ChatCommand::Detach(Some(n)),
                    _ => ChatCommand::Unknown(format!("/detach expects a number, got '{arg}'")),
                }
            }
        }
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (name, help) in [
        ("/help", "Show this help message"),
        ("/attach <path>..", "Attach files to your next message"),
        ("/attachments", "List files waiting to be sent"),
        ("/detach [n]", "Remove attachment n, or all of them"),
        ("/history", "Show the conversation so far"),
        ("/new", "Start a new conversation"),
        ("/clear", "Clear the screen"),
        ("/exit", "End the chat session"),
    ] {
        println!("  {:<18} {}", style(name).cyan(), help);
    }
    println!();
    println!(
        "  {}",
        style("Ctrl+C stops a streaming reply (the partial text is kept). Ctrl+D exits.").dim()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/quit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/q"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_attach_paths() {
        assert_eq!(
            parse("/attach notes.txt  photo.png"),
            Some(ChatCommand::Attach(vec![
                "notes.txt".to_string(),
                "photo.png".to_string()
            ]))
        );
        assert_eq!(
            parse("/attach"),
            Some(ChatCommand::Unknown("/attach requires a file path".to_string()))
        );
    }

    #[test]
    fn test_parse_detach() {
        assert_eq!(parse("/detach"), Some(ChatCommand::Detach(None)));
        assert_eq!(parse("/detach 2"), Some(ChatCommand::Detach(Some(2))));
        assert!(matches!(parse("/detach 0"), Some(ChatCommand::Unknown(_))));
        assert!(matches!(parse("/detach two"), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse("/NEW"), Some(ChatCommand::New));
        assert_eq!(parse("  /History "), Some(ChatCommand::History));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
    }
}
