//! Poll command parsing.
//!
//! A chat line is split into a verb and the raw remainder, then mapped to a
//! `PollCommand`. Whether a command is valid in the actor's current mode is
//! decided by the handler, not here.

/// Argument shape errors detected while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgError {
    /// Wrong number of space-separated arguments.
    Arity,
    /// An index argument that is not an integer.
    NotAnIndex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteArgs {
    pub poll: String,
    /// Raw integer; may be out of range for an option index.
    pub index: i64,
}

/// Commands that only make sense while a draft is being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    SetName(String),
    SetTitle(String),
    SetInterim(String),
    Status,
    AddOption(String),
    RemoveOption(Result<i64, ArgError>),
    Setting { key: String, value: String },
    Commit,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollCommand {
    Create,
    Help { topic: Option<String> },
    Edit(EditCommand),

    Open(String),
    Close(String),
    Vote(Result<VoteArgs, ArgError>),
    Delete(String),
    Info(String),
    List,
    Unvote(String),
    DelVote(Result<(String, String), ArgError>),

    Unknown(String),
}

/// Split `input` into the verb and everything after the first space.
///
/// Returns `None` for a blank line.
pub fn split_verb(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_end_matches(['\r', '\n']);
    let (verb, rest) = input.split_once(' ').unwrap_or((input, ""));
    if verb.is_empty() {
        None
    } else {
        Some((verb, rest))
    }
}

/// Split into exactly two space-separated arguments.
fn two_args(arg: &str) -> Result<(String, String), ArgError> {
    let parts: Vec<&str> = arg.split(' ').collect();
    match parts.as_slice() {
        [a, b] => Ok((a.to_string(), b.to_string())),
        _ => Err(ArgError::Arity),
    }
}

fn parse_index(s: &str) -> Result<i64, ArgError> {
    s.trim().parse().map_err(|_| ArgError::NotAnIndex)
}

fn parse_edit(verb: &str, arg: &str) -> Option<EditCommand> {
    let command = match verb {
        "#" => EditCommand::SetName(arg.to_string()),
        "!" => EditCommand::SetTitle(arg.to_string()),
        "@" => EditCommand::SetInterim(arg.to_string()),
        "?" => EditCommand::Status,
        ">" => EditCommand::AddOption(arg.to_string()),
        "<" => EditCommand::RemoveOption(parse_index(arg)),
        "=" => {
            let (key, value) = arg.split_once(' ').unwrap_or((arg, ""));
            EditCommand::Setting {
                key: key.to_string(),
                value: value.to_string(),
            }
        }
        "~~~" => EditCommand::Commit,
        "***" => EditCommand::Abort,
        _ => return None,
    };
    Some(command)
}

/// Parse a command line (without the `.poll` trigger).
pub fn parse(input: &str) -> Option<PollCommand> {
    let (verb, arg) = split_verb(input)?;
    if let Some(edit) = parse_edit(verb, arg) {
        return Some(PollCommand::Edit(edit));
    }

    let command = match verb {
        "create" => PollCommand::Create,
        "help" => PollCommand::Help {
            topic: Some(arg.trim()).filter(|t| !t.is_empty()).map(str::to_string),
        },

        "open" => PollCommand::Open(arg.to_string()),
        "close" => PollCommand::Close(arg.to_string()),
        "vote" => PollCommand::Vote(two_args(arg).and_then(|(poll, index)| {
            Ok(VoteArgs {
                poll,
                index: parse_index(&index)?,
            })
        })),
        "delete" | "remove" => PollCommand::Delete(arg.to_string()),
        "info" => PollCommand::Info(arg.to_string()),
        "list" => PollCommand::List,
        "unvote" => PollCommand::Unvote(arg.to_string()),
        "delvote" | "remvote" => PollCommand::DelVote(two_args(arg)),

        other => PollCommand::Unknown(other.to_string()),
    };
    Some(command)
}
