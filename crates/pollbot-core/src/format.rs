//! IRC text formatting control codes.
//!
//! Replies are produced with mIRC-style control characters. Transports that
//! cannot render them (e.g. a plain terminal) strip them with [`strip`].

pub const BOLD: &str = "\x02";
pub const ITALIC: &str = "\x1d";
pub const COLOR: &str = "\x03";
pub const RESET: &str = "\x0f";

/// Wrap `text` in bold markers.
pub fn bold(text: impl std::fmt::Display) -> String {
    format!("{BOLD}{text}{BOLD}")
}

/// Wrap `text` in italic markers.
pub fn italic(text: impl std::fmt::Display) -> String {
    format!("{ITALIC}{text}{ITALIC}")
}

/// Remove all formatting control codes, including color numbers
/// (`\x03NN` / `\x03NN,MM`).
pub fn strip(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x02' | '\x0f' | '\x1d' | '\x1f' | '\x16' => {}
            '\x03' => {
                skip_digits(&mut chars);
                if chars.peek() == Some(&',') {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                        chars.next();
                        skip_digits(&mut chars);
                    }
                }
            }
            other => out.push(other),
        }
    }

    out
}

fn skip_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    for _ in 0..2 {
        match chars.peek() {
            Some(c) if c.is_ascii_digit() => {
                chars.next();
            }
            _ => break,
        }
    }
}
