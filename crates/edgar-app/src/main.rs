//! Edgar application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the chat engine (model, routing file, built-in handlers)
//! 4. Run the terminal chat loop with paced output

mod cli;
mod commands;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use edgar_chat::{ChatEngine, MatchType, TextStreamer, TurnRecord};
use edgar_core::config::EdgarConfig;

use cli::CliArgs;
use commands::{Command, HELP};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = EdgarConfig::load_or_default(&config_file);
    if let Some(dir) = args.resolve_models_dir() {
        config.general.models_dir = dir;
    }
    config.general.model = args.resolve_model(&config.general.model);

    // Tracing.
    let filter = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Edgar v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Engine.
    let mut engine = ChatEngine::from_config(config);

    let instant = |streamer: TextStreamer| {
        if args.no_stream {
            TextStreamer {
                speed_limit: false,
                ..streamer
            }
        } else {
            streamer
        }
    };
    let output = Output {
        answer: instant(engine.streamer()),
        info: instant(engine.info_streamer()),
    };

    // Ctrl-C interrupts the answer being paced.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    print_banner(&engine);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = Command::parse(line) {
            if !run_command(&mut engine, command) {
                break;
            }
            continue;
        }

        let records = engine.process(line).await;
        for record in &records {
            cancel.store(false, Ordering::Relaxed);
            output.display(record, &cancel).await?;
        }
    }

    print_stats(&engine);
    println!("Goodbye!");
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

/// Answer and supplementary-line pacing.
struct Output {
    answer: TextStreamer,
    info: TextStreamer,
}

impl Output {
    async fn display(
        &self,
        record: &TurnRecord,
        cancel: &AtomicBool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some((best, score)) = record.corrections.first() {
            let line = format!("Auto-corrected to: '{}' (confidence: {}%)", best, score);
            emit(&self.info, &line, "", cancel).await?;
        }

        emit(&self.answer, &record.answer, "Edgar: ", cancel).await?;
        if cancel.load(Ordering::Relaxed) {
            return Ok(());
        }

        for line in metadata_lines(record) {
            emit(&self.info, &line, "  ", cancel).await?;
        }
        Ok(())
    }
}

/// Stream one line, ending it even when pacing was skipped or cut short.
async fn emit(
    streamer: &TextStreamer,
    text: &str,
    prefix: &str,
    cancel: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    let shown = streamer.stream_to(text, prefix, &mut stdout, cancel).await?;
    if !shown.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Match and tree details printed under an answer.
fn metadata_lines(record: &TurnRecord) -> Vec<String> {
    let mut lines = Vec::new();
    match record.match_type {
        MatchType::Routed => lines.push(format!(
            "routed via {} (confidence: {:.2})",
            record.source.as_deref().unwrap_or("unknown"),
            record.confidence
        )),
        MatchType::Unknown | MatchType::ConfidenceRejection => {
            lines.push(record.match_type.to_string())
        }
        _ => {
            if let Some(group) = &record.matched_group {
                lines.push(format!(
                    "{} from '{}' (confidence: {:.2})",
                    record.match_type, group, record.confidence
                ));
            }
        }
    }

    if let Some(position) = &record.tree_position {
        lines.push(format!("tree: {}", position));
        if let Some(branches) = &record.available_branches {
            lines.push(branches.clone());
        }
    }
    lines
}

fn print_banner(engine: &ChatEngine) {
    println!("Edgar v{}", env!("CARGO_PKG_VERSION"));
    match engine.current_model() {
        Some(model) => println!("Model: {} ({} groups)", model, engine.groups().len()),
        None => println!("No model loaded. Use 'models' and 'model <name>'."),
    }
    println!("Type 'help' for commands.");
}

fn print_stats(engine: &ChatEngine) {
    let stats = engine.stats();
    println!("Questions: {}", stats.total_questions);
    println!(
        "Matched: {} ({:.1}%)",
        stats.successful_matches,
        stats.success_rate()
    );
    println!("Unmatched: {}", stats.failed_matches);
    println!("Confidence rejections: {}", stats.confidence_rejections);
    println!(
        "Trees: {} entered, {} navigations, {} exits, {} follow-ups",
        stats.tree_entries, stats.tree_navigations, stats.tree_exits, stats.follow_up_requests
    );
}

// =============================================================================
// Commands
// =============================================================================

/// Run a terminal command. Returns `false` when the chat should end.
fn run_command(engine: &mut ChatEngine, command: Command) -> bool {
    match command {
        Command::Quit => return false,
        Command::Stats => print_stats(engine),
        Command::Context => println!("{}", engine.context_summary()),
        Command::Reset => {
            engine.reset();
            println!("Conversation reset.");
        }
        Command::Models => {
            let models = engine.available_models();
            if models.is_empty() {
                println!("No models found.");
            }
            for model in models {
                let marker = if engine.current_model() == Some(model.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}", marker, model);
            }
        }
        Command::Model(name) => {
            if engine.switch_model(&name) {
                println!("Switched to '{}' ({} groups).", name, engine.groups().len());
            } else {
                println!("Could not load model '{}'.", name);
            }
        }
        Command::Modules => {
            let stats = engine.router().routing_stats();
            println!(
                "Routing: {} groups, {} questions",
                stats.total_groups, stats.total_questions
            );
            for (name, description) in engine.modules() {
                println!("  {}: {}", name, description);
            }
        }
        Command::Config => match serde_json::to_string_pretty(&engine.configuration()) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(error = %e, "Configuration not printable"),
        },
        Command::Confidence(raw) => match raw.parse::<f32>() {
            Ok(value) => match engine.set_confidence_requirement(value) {
                Ok(()) => println!("Confidence requirement set to {:.2}.", value),
                Err(e) => println!("{}", e),
            },
            Err(_) => println!("Expected a number between 0 and 1."),
        },
        Command::Help => println!("{}", HELP),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_lines_for_tree_answer() {
        let mut record = TurnRecord::new("what is python", "A language.", 1.0, MatchType::Exact)
            .with_group("Python");
        record.tree_position = Some("Root".to_string());
        record.available_branches = Some("Available options: Syntax".to_string());
        assert_eq!(
            metadata_lines(&record),
            vec![
                "exact from 'Python' (confidence: 1.00)".to_string(),
                "tree: Root".to_string(),
                "Available options: Syntax".to_string(),
            ]
        );
    }

    #[test]
    fn test_metadata_lines_for_unknown() {
        let record = TurnRecord::new("zzz", "Hmm.", 0.0, MatchType::Unknown);
        assert_eq!(metadata_lines(&record), vec!["unknown".to_string()]);
    }

    #[tokio::test]
    async fn test_emit_instant_line() {
        let streamer = TextStreamer {
            wpm: 0,
            letter_mode: false,
            speed_limit: true,
        };
        let cancel = AtomicBool::new(false);
        assert!(emit(&streamer, "ok", "  ", &cancel).await.is_ok());
    }
}
