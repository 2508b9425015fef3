//! `jot shell`: one session, many commands.

use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{Commands, ShellLine};
use crate::commands::dispatch;
use crate::error::CliError;
use crate::session::Session;

const PROMPT: &str = "jot> ";

pub async fn run_shell(session: &mut Session) -> Result<(), CliError> {
    session.set_interactive(true);
    println!("{}", banner(session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let words = match split_words(&line) {
            Ok(words) => words,
            Err(error) => {
                eprintln!("Error: {error}");
                continue;
            }
        };
        match words.first().map(String::as_str) {
            None => continue,
            Some("exit" | "quit") => break,
            _ => {}
        }

        let command = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed.command,
            Err(error) => {
                // clap renders help and usage errors itself
                let _ = error.print();
                continue;
            }
        };
        if let Err(error) = run_line(session, command).await {
            eprintln!("Error: {error}");
        }
        session.report_auth_events();
    }

    Ok(())
}

fn banner(session: &Session) -> String {
    format!(
        "Connected to {}. Type `help` for commands, `exit` to quit.",
        session.auth().base_url().get()
    )
}

async fn run_line(session: &Session, command: Commands) -> Result<(), CliError> {
    if let Commands::Create { content: None, .. } = command {
        return Err(CliError::Shell("--content is required inside the shell".to_string()));
    }
    dispatch(session, command).await
}

/// Split a line into words, honoring single and double quotes and
/// backslash escapes outside single quotes.
pub fn split_words(line: &str) -> Result<Vec<String>, CliError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(open), ch) if ch == open => quote = None,
            (Some('\''), ch) => current.push(ch),
            (_, '\\') => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| CliError::Shell("Trailing backslash".to_string()))?;
                current.push(escaped);
                in_word = true;
            }
            (Some(_), ch) => current.push(ch),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_word = true;
            }
            (None, ch) if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, ch) => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(CliError::Shell("Unterminated quote".to_string()));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn split_words_handles_quotes() {
        let words =
            split_words(r#"create docs/a.md --title "Weekly plan" --content 'it''s "done"'"#)
                .unwrap();
        assert_eq!(
            words,
            vec![
                "create",
                "docs/a.md",
                "--title",
                "Weekly plan",
                "--content",
                "its \"done\"",
            ]
        );
    }

    #[test]
    fn split_words_keeps_empty_quoted_word() {
        assert_eq!(split_words(r#"list """#).unwrap(), vec!["list", ""]);
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn split_words_handles_escapes() {
        assert_eq!(
            split_words(r"get my\ notes/a.md").unwrap(),
            vec!["get", "my notes/a.md"]
        );
        assert!(split_words("get a\\").is_err());
        assert!(split_words("get \"a").is_err());
    }

    #[test]
    fn banner_names_the_active_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = jot_core::ClientConfig {
            base_url: "https://auth.example.com".to_string(),
            ..jot_core::ClientConfig::default()
        };
        let session = Session::open(&config, &dir.path().join("notes.db"), false).unwrap();
        session.auth().base_url().set("https://eu.example.com/").unwrap();

        assert_eq!(
            banner(&session),
            "Connected to https://eu.example.com. Type `help` for commands, `exit` to quit."
        );
    }

    #[test]
    fn shell_line_parses_subcommands() {
        let words = split_words("update docs/a.md --title New").unwrap();
        let parsed = ShellLine::try_parse_from(&words).unwrap();
        assert!(matches!(
            parsed.command,
            Commands::Update { ref path, title: Some(ref title), content: None }
                if path == "docs/a.md" && title == "New"
        ));
    }
}
