//! Console chat transport.
//!
//! Reads poll commands from stdin and prints replies addressed to the
//! current nick, translating IRC formatting codes into ANSI escapes when the
//! terminal supports colors. `/nick <name>` switches identity so several
//! participants can be simulated from one terminal.

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use pollbot_core::format::strip;

use crate::chat::ChatTransport;
use crate::state::AppState;

/// One line of console input.
#[derive(Debug, PartialEq, Eq)]
enum ReplInput {
    Empty,
    Quit,
    Nick(String),
    Command(String),
}

fn parse_input(line: &str) -> ReplInput {
    let line = line.trim();
    match line.split_once(' ').unwrap_or((line, "")) {
        ("", _) => ReplInput::Empty,
        ("/quit" | "/exit" | "/q", _) => ReplInput::Quit,
        ("/nick", nick) if !nick.trim().is_empty() => ReplInput::Nick(nick.trim().to_string()),
        (".poll", rest) => ReplInput::Command(rest.to_string()),
        _ => ReplInput::Command(line.to_string()),
    }
}

/// IRC color number to ANSI SGR foreground code.
fn ansi_color(code: u8) -> u8 {
    match code {
        0 => 97,
        1 => 90,
        2 => 34,
        3 => 32,
        4 => 91,
        5 => 31,
        6 => 35,
        7 => 33,
        8 => 93,
        9 => 92,
        10 => 36,
        11 => 96,
        12 => 94,
        13 => 95,
        14 | 15 => 37,
        _ => 39,
    }
}

/// Translate IRC bold/italic/color/reset codes into ANSI escapes.
fn irc_to_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut bold = false;
    let mut italic = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x02' => {
                bold = !bold;
                out.push_str(if bold { "\x1b[1m" } else { "\x1b[22m" });
            }
            '\x1d' => {
                italic = !italic;
                out.push_str(if italic { "\x1b[3m" } else { "\x1b[23m" });
            }
            '\x0f' => {
                bold = false;
                italic = false;
                out.push_str("\x1b[0m");
            }
            '\x03' => {
                let mut digits = String::new();
                while digits.len() < 2 && chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                    digits.extend(chars.next());
                }
                let code = digits.parse::<u8>().map_or(39, ansi_color);
                out.push_str(&format!("\x1b[{code}m"));
            }
            other => out.push(other),
        }
    }
    out.push_str("\x1b[0m");
    out
}

struct ConsoleTransport {
    nick: String,
    colors: bool,
}

impl ChatTransport for ConsoleTransport {
    fn reply(&mut self, text: String) {
        let body = if self.colors { irc_to_ansi(&text) } else { strip(&text) };
        println!("{}: {body}", self.nick);
    }
}

/// Run the console loop until EOF or `/quit`.
pub async fn run(state: &AppState, nick: String, quiet: bool) -> Result<()> {
    let plugin = state.plugin();
    let colors = console::colors_enabled();
    let mut transport = ConsoleTransport { nick, colors };

    if !quiet {
        println!();
        println!(
            "  {} Poll console ({})",
            style("▶").cyan().bold(),
            style(state.data_dir.display()).dim()
        );
        println!(
            "  {}",
            style("Type `help` for commands, `/nick <name>` to switch identity, `/quit` to exit.").dim()
        );
        println!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if !quiet {
            stdout
                .write_all(format!("{}> ", style(&transport.nick).cyan()).as_bytes())
                .await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            ReplInput::Empty => {}
            ReplInput::Quit => break,
            ReplInput::Nick(nick) => {
                tracing::debug!(from = %transport.nick, to = %nick, "nick changed");
                transport.nick = nick;
            }
            ReplInput::Command(command) => {
                let actor = transport.nick.clone();
                plugin.handle(&actor, &command, &mut transport).await;
            }
        }
    }

    Ok(())
}
