//! Interactive chat command.

use super::print_outcome;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, TurnOutcome};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// One line of user input, parsed.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Reset,
    Help,
    Video(&'a str),
    File(&'a str),
    Message(&'a str),
    Unknown(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ChatInput::Exit;
    }
    if line.eq_ignore_ascii_case("clear") {
        return ChatInput::Reset;
    }

    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Message(line);
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "video" if !arg.is_empty() => ChatInput::Video(arg),
        "file" if !arg.is_empty() => ChatInput::File(arg),
        "reset" | "clear" => ChatInput::Reset,
        "help" => ChatInput::Help,
        "exit" | "quit" => ChatInput::Exit,
        _ => ChatInput::Unknown(line),
    }
}

fn print_help() {
    println!("  {}  analyze a YouTube video", style("/video <url or id>").bold());
    println!("  {}       analyze a text document", style("/file <path>").bold());
    println!("  {}             start a new conversation", style("/reset").bold());
    println!("  {}               leave", style("exit").bold());
    println!("  Anything else is sent to the assistant as a message.\n");
}

/// Run the interactive chat command.
pub async fn run_chat(profile: Option<&str>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubecoach doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut orchestrator = Orchestrator::new(&settings, profile)?;
    let illustration_dir = settings.illustration_dir();

    println!("\n{}", style("Tubecoach Chat").bold().cyan());
    println!(
        "{}\n",
        style("Share a video with /video, a document with /file, or just ask. Type /help for commands.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut turn_count = 0usize;

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let result: crate::Result<TurnOutcome> = match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Help => {
                print_help();
                continue;
            }
            ChatInput::Unknown(cmd) => {
                Output::warning(&format!("Unknown command: {} (try /help)", cmd));
                continue;
            }
            ChatInput::Reset => {
                orchestrator.reset();
                turn_count = 0;
                Output::info("Conversation cleared.");
                continue;
            }
            ChatInput::Video(reference) => {
                if let Err(e) = preflight::check(Operation::Video) {
                    Output::error(&format!("{}", e));
                    continue;
                }
                let spinner = Output::spinner("Fetching transcript and reviewing video...");
                let result = orchestrator.submit_video(reference).await;
                spinner.finish_and_clear();
                result
            }
            ChatInput::File(path) => {
                let spinner = Output::spinner("Reviewing document...");
                let result = orchestrator.submit_document(path).await;
                spinner.finish_and_clear();
                result
            }
            ChatInput::Message(text) => {
                let spinner = Output::spinner("Thinking...");
                let result = orchestrator.send_message(text).await;
                spinner.finish_and_clear();
                result
            }
        };

        match result {
            Ok(outcome) => {
                turn_count += 1;
                let stem = format!("{}-{}", orchestrator.session_id(), turn_count);
                print_outcome(&outcome, &illustration_dir, &stem);
            }
            Err(e) => Output::error(&format!("{}", e)),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("  "), ChatInput::Empty);
        assert_eq!(parse_input("EXIT"), ChatInput::Exit);
        assert_eq!(parse_input("clear"), ChatInput::Reset);
        assert_eq!(parse_input("/reset"), ChatInput::Reset);
        assert_eq!(
            parse_input("/video https://youtu.be/dQw4w9WgXcQ\n"),
            ChatInput::Video("https://youtu.be/dQw4w9WgXcQ")
        );
        assert_eq!(parse_input("/file  notes.txt"), ChatInput::File("notes.txt"));
    }

    #[test]
    fn test_plain_text_is_message() {
        assert_eq!(
            parse_input("what about the intro?"),
            ChatInput::Message("what about the intro?")
        );
    }

    #[test]
    fn test_command_without_argument() {
        assert_eq!(parse_input("/video"), ChatInput::Unknown("/video"));
        assert_eq!(parse_input("/bogus x"), ChatInput::Unknown("/bogus x"));
    }
}
