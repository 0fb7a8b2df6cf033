//! Terminal commands recognised before input reaches the engine.

/// A parsed terminal command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Stats,
    Context,
    Reset,
    Models,
    Model(String),
    Modules,
    Config,
    /// Raw argument; validated by the engine.
    Confidence(String),
    Help,
}

impl Command {
    /// Parse `line` as a command. `None` means it is a chat message.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        let command = match lower.as_str() {
            "quit" | "exit" | "bye" => Command::Quit,
            "stats" => Command::Stats,
            "context" => Command::Context,
            "reset" => Command::Reset,
            "models" => Command::Models,
            "modules" => Command::Modules,
            "config" => Command::Config,
            "help" => Command::Help,
            _ => {
                // Argument keeps its original case
                let (head, arg) = trimmed.split_once(char::is_whitespace)?;
                let arg = arg.trim();
                if arg.is_empty() {
                    return None;
                }
                match head.to_lowercase().as_str() {
                    "model" => Command::Model(arg.to_string()),
                    "confidence" => Command::Confidence(arg.to_string()),
                    _ => return None,
                }
            }
        };
        Some(command)
    }
}

pub const HELP: &str = "\
Commands:
  quit, exit, bye    Leave the chat
  stats              Show conversation statistics
  context            Show the current context
  reset              Reset the conversation context
  models             List available models
  model <name>       Switch to another model
  modules            List routing handlers
  config             Show the current configuration
  confidence <0-1>   Set the minimum answer confidence (0 disables)
  help               Show this help

Ctrl-C interrupts a paced answer. Ctrl-D leaves the chat.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse("quit"), Some(Command::Quit));
        assert_eq!(Command::parse("  BYE "), Some(Command::Quit));
        assert_eq!(Command::parse("stats"), Some(Command::Stats));
        assert_eq!(Command::parse("modules"), Some(Command::Modules));
        assert_eq!(Command::parse("help"), Some(Command::Help));
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            Command::parse("model Science"),
            Some(Command::Model("Science".to_string()))
        );
        assert_eq!(
            Command::parse("confidence 0.8"),
            Some(Command::Confidence("0.8".to_string()))
        );
    }

    #[test]
    fn test_chat_messages_are_not_commands() {
        assert_eq!(Command::parse("what is python"), None);
        assert_eq!(Command::parse("model"), None);
        assert_eq!(Command::parse("tell me about the config"), None);
        assert_eq!(Command::parse(""), None);
    }
}
