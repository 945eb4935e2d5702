//! Poll command dispatcher.
//!
//! `PollPlugin` takes `(actor, line)` pairs from a chat transport, routes them
//! to the builder (edit mode) or the poll service (normal mode) and writes
//! human-readable replies back to the same transport.

use std::num::NonZeroUsize;
use std::sync::Arc;

use pollbot_core::builder::{BeginOutcome, PollBuilder};
use pollbot_core::format::{BOLD, COLOR, RESET, bold, italic};
use pollbot_core::repository::poll::{PollFilter, PollRepository};
use pollbot_core::service::poll::{PollService, VoteOutcome};
use pollbot_types::draft::{DraftSetting, DraftStatus};
use pollbot_types::error::PollError;

use super::commands::{self, ArgError, EditCommand, PollCommand, VoteArgs};

/// Where replies go. Replies are addressed to the invoking actor only.
pub trait ChatTransport: Send {
    fn reply(&mut self, text: String);
}

impl ChatTransport for Vec<String> {
    fn reply(&mut self, text: String) {
        self.push(text);
    }
}

const EDIT_HELP: &[(&str, &str)] = &[
    (
        "# <code name>",
        "set the code name. It must only contain alphanumeric characters, underline, dash, or period. Its length must be greater than 2 and less than 31.",
    ),
    ("! <title>", "set the title."),
    ("@ <{on|off}>", "when 'on', votes are shown even if the poll is open."),
    ("> <option name>", "append an option."),
    (
        "< <option index>",
        "remove an option. Note that an index is expected (see .poll ?), not the full name of an option.",
    ),
    ("?", "show pending changes."),
    ("= <setting> [value]", "set some optional settings. See \x1d.poll help =\x1d"),
    ("~~~", "commit changes."),
    ("***", "abort changes."),
];

const SETTINGS_HELP: &[(&str, &str)] = &[(
    "= anon <{yes|no}>",
    "set whether the poll should be anonymous (won't list nicks of voters).",
)];

const NORMAL_HELP: &[(&str, &str)] = &[
    ("create", "create a poll, and switch to edit mode."),
    ("delete <poll>", "delete a poll."),
    ("info <poll>", "show detailed report about poll."),
    (
        "vote <poll> <vote index>",
        "vote. Note that an index is expected (see .poll info), not the full name of an option.",
    ),
    ("open <poll>", "open a poll."),
    ("close <poll>", "close a poll."),
    ("list", "List polls."),
    ("unvote <poll>", "Remove your vote."),
    ("delvote <poll> <user>", "Remove vote of a user. Only available for admins."),
];

const MALFORMED: &str = "Something is wrong with your command. Type \x1d.poll help\x1d for help.";

/// Short lowercase reason used in "Uh oh, ..." replies.
fn reason(err: &PollError) -> String {
    match err {
        PollError::PollNotFound(_) => "no such poll".to_string(),
        PollError::OptionNotFound(_) | PollError::IndexOutOfRange(_) => "no such index".to_string(),
        PollError::Storage(_) => "something went wrong with the poll store".to_string(),
        other => other.to_string(),
    }
}

/// Chat front-end for the poll builder and poll service.
pub struct PollPlugin<R: PollRepository> {
    builder: Arc<PollBuilder<R>>,
    service: Arc<PollService<R>>,
    bar_width: NonZeroUsize,
}

impl<R: PollRepository> PollPlugin<R> {
    pub fn new(
        builder: Arc<PollBuilder<R>>,
        service: Arc<PollService<R>>,
        bar_width: NonZeroUsize,
    ) -> Self {
        Self {
            builder,
            service,
            bar_width,
        }
    }

    /// Handle one command line from `actor`.
    ///
    /// Returns `true` when the command succeeded, `false` when it was
    /// rejected or the line was blank.
    pub async fn handle<T: ChatTransport>(&self, actor: &str, line: &str, out: &mut T) -> bool {
        let Some(command) = commands::parse(line) else {
            return false;
        };
        let editing = self.builder.is_editing(actor);

        let result = match command {
            PollCommand::Create => {
                self.create(actor, out);
                Ok(())
            }
            PollCommand::Help { topic } => {
                help(editing, topic.as_deref(), out);
                Ok(())
            }
            PollCommand::Edit(cmd) => {
                if editing {
                    self.edit(actor, cmd, out).await
                } else {
                    out.reply("Unknown command.".to_string());
                    return false;
                }
            }
            cmd => self.normal(actor, cmd, out).await,
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                if err.is_recoverable() {
                    tracing::debug!(actor, line, error = %err, "command rejected");
                } else {
                    tracing::error!(actor, line, error = %err, "command failed");
                }
                false
            }
        }
    }

    fn create<T: ChatTransport>(&self, actor: &str, out: &mut T) {
        match self.builder.begin(actor) {
            BeginOutcome::Started => {
                out.reply(format!("{}. Let's create a new poll!", bold("SWITCHED TO EDIT MODE")));
            }
            BeginOutcome::Resumed => {
                out.reply(format!(
                    "You're {} editing a poll; your draft is kept as it was.",
                    bold("already")
                ));
            }
        }
        out.reply(format!("Type {} for the list of commands", italic(".poll help")));
    }

    // -----------------------------------------------------------------------
    // Edit mode
    // -----------------------------------------------------------------------

    async fn edit<T: ChatTransport>(
        &self,
        actor: &str,
        command: EditCommand,
        out: &mut T,
    ) -> Result<(), PollError> {
        let builder = &self.builder;

        match command {
            EditCommand::SetName(name) => match builder.set_name(actor, &name).await {
                Ok(()) => out.reply(format!("The {} set to '{name}'!", bold("codename"))),
                Err(e @ PollError::Validation(_)) => {
                    out.reply(
                        "Bad codename. Its length must be greater than 2 and less than 31, and it \
                         must contain alphanumeric symbols, underline, period, or dash."
                            .to_string(),
                    );
                    return Err(e);
                }
                Err(e @ PollError::DuplicateName(_)) => {
                    out.reply("Codename must be unique.".to_string());
                    return Err(e);
                }
                Err(e) => return Err(reply_error(e, out)),
            },

            EditCommand::SetTitle(title) => {
                builder.set_title(actor, &title).await.map_err(|e| reply_error(e, out))?;
                out.reply(format!("The {} set to '{title}{RESET}'!", bold("title")));
            }

            EditCommand::SetInterim(token) => match builder.set_interim(actor, &token).await {
                Ok(true) => out.reply(format!("Interim results are set to be {}!", bold("available"))),
                Ok(false) => out.reply(format!("Results will be {} until closed!", bold("unavailable"))),
                Err(e @ PollError::Parse(_)) => {
                    out.reply("Erm, what?".to_string());
                    return Err(e);
                }
                Err(e) => return Err(reply_error(e, out)),
            },

            EditCommand::Status => {
                let status = builder.status(actor).await.map_err(|e| reply_error(e, out))?;
                for line in render_status(&status) {
                    out.reply(line);
                }
            }

            EditCommand::AddOption(text) => match builder.add_option(actor, &text).await {
                Ok(pos) => out.reply(format!("Added option #{pos}: '{text}{RESET}'")),
                Err(e @ PollError::Validation(_)) => {
                    out.reply("Well, you didn't provide a name for your option.".to_string());
                    return Err(e);
                }
                Err(e) => return Err(reply_error(e, out)),
            },

            EditCommand::RemoveOption(index) => {
                let index = match index {
                    Ok(index) => index,
                    Err(_) => {
                        out.reply(
                            "Bad argument. You're probably providing a name. Well, I need an index."
                                .to_string(),
                        );
                        return Err(PollError::Parse("option index".to_string()));
                    }
                };
                let status = builder.status(actor).await.map_err(|e| reply_error(e, out))?;
                if status.draft.options.is_none() {
                    out.reply("You'd better add an option before using this command :)".to_string());
                    return Err(PollError::IndexOutOfRange(0));
                }
                let Ok(pos) = usize::try_from(index) else {
                    out.reply("No such index.".to_string());
                    return Err(PollError::Parse(index.to_string()));
                };
                match builder.remove_option(actor, pos).await {
                    Ok(removed) => out.reply(format!("Removed option #{pos}: '{removed}{RESET}'")),
                    Err(e @ PollError::IndexOutOfRange(_)) => {
                        out.reply("No such index.".to_string());
                        return Err(e);
                    }
                    Err(e) => return Err(reply_error(e, out)),
                }
            }

            EditCommand::Setting { key, value } => {
                if key.parse::<DraftSetting>().is_err() {
                    out.reply("I'm afraid I can't decipher what you gave :<".to_string());
                    return Err(PollError::Parse(key));
                }
                match builder.set_setting(actor, &key, &value).await {
                    Ok((DraftSetting::Anonymous, true)) => {
                        out.reply(format!("Okay, votes {} be ever shown.", bold("won't")))
                    }
                    Ok((DraftSetting::Anonymous, false)) => {
                        out.reply("Well, I've marked your poll as unanonymous.".to_string())
                    }
                    Err(e @ PollError::Parse(_)) => {
                        out.reply("Uh oh, I couldn't understand what you told me.".to_string());
                        return Err(e);
                    }
                    Err(e) => return Err(reply_error(e, out)),
                }
            }

            EditCommand::Commit => match builder.commit(actor).await {
                Ok(_) => {
                    out.reply("Your poll is created. When you're ready, open it.".to_string());
                    out.reply(format!("{}.", bold("SWITCHED TO NORMAL MODE")));
                }
                Err(e @ PollError::NotReady) => {
                    out.reply(
                        "Some fields are still unset. You can't commit partially filled polls."
                            .to_string(),
                    );
                    return Err(e);
                }
                Err(e @ PollError::DuplicateName(_)) => {
                    out.reply(format!(
                        "Codename must be unique. Pick another one with {}.",
                        italic(".poll #")
                    ));
                    return Err(e);
                }
                Err(e) => return Err(reply_error(e, out)),
            },

            EditCommand::Abort => {
                builder.abort(actor).await.map_err(|e| reply_error(e, out))?;
                out.reply(format!(
                    "Your poll is deleted. {}.",
                    bold("SWITCHED TO NORMAL MODE")
                ));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Normal mode
    // -----------------------------------------------------------------------

    async fn normal<T: ChatTransport>(
        &self,
        actor: &str,
        command: PollCommand,
        out: &mut T,
    ) -> Result<(), PollError> {
        let service = &self.service;

        match command {
            PollCommand::Open(name) => {
                service.open(actor, &name).await.map_err(|e| manage_error(e, out))?;
                out.reply("Poll opened!".to_string());
            }
            PollCommand::Close(name) => {
                service.close(actor, &name).await.map_err(|e| manage_error(e, out))?;
                out.reply("Poll closed!".to_string());
            }

            PollCommand::Vote(args) => {
                let VoteArgs { poll, index } = match args {
                    Ok(args) => args,
                    Err(ArgError::Arity) => {
                        out.reply(MALFORMED.to_string());
                        return Err(PollError::Parse("vote arguments".to_string()));
                    }
                    Err(ArgError::NotAnIndex) => {
                        out.reply("Bad index. Yes, I need an index, not name!".to_string());
                        return Err(PollError::Parse("vote index".to_string()));
                    }
                };
                let Ok(index) = u32::try_from(index) else {
                    let err = PollError::IndexOutOfRange(0);
                    out.reply(format!("Uh oh, {}.", reason(&err)));
                    return Err(err);
                };

                let receipt = service.vote(actor, index, &poll).await.map_err(|e| {
                    out.reply(format!("Uh oh, {}.", reason(&e)));
                    e
                })?;
                let choice = format!("{}: {}{RESET}", bold(format!("#{}", receipt.index)), receipt.option_name);
                match receipt.outcome {
                    VoteOutcome::Unchanged => out.reply(format!("You've already voted for {choice}.")),
                    VoteOutcome::Cast | VoteOutcome::Switched { .. } => {
                        out.reply(format!("You've voted for {choice}!"))
                    }
                }
            }

            PollCommand::Delete(name) => {
                service.delete(actor, &name).await.map_err(|e| manage_error(e, out))?;
                out.reply("Poll has been deleted.".to_string());
            }

            PollCommand::Info(name) => {
                let report = service.info(&name).await.map_err(|e| {
                    out.reply(format!("Uh oh, {}.", reason(&e)));
                    e
                })?;
                for line in report.render(self.bar_width) {
                    out.reply(line);
                }
            }

            PollCommand::List => {
                let listing = service
                    .list(&PollFilter::default())
                    .await
                    .map_err(|e| reply_error(e, out))?;
                if listing.store_size == 0 || listing.polls.is_empty() {
                    out.reply("No polls.".to_string());
                } else {
                    let names: Vec<String> = listing
                        .polls
                        .iter()
                        .map(|p| {
                            let marker = if p.open { BOLD.to_string() } else { format!("{COLOR}01") };
                            format!("{marker}{}{RESET}", p.name)
                        })
                        .collect();
                    out.reply(format!("Polls: {}", names.join(", ")));
                }
            }

            PollCommand::Unvote(name) => match service.unvote(actor, &name).await {
                Ok(_) => out.reply("All set! Your vote has been deleted.".to_string()),
                Err(e @ PollError::NotVoted) => {
                    out.reply("Wait, don't you think you need to vote first?".to_string());
                    return Err(e);
                }
                Err(e @ PollError::PollNotFound(_)) => {
                    out.reply("Erm, no such poll.".to_string());
                    return Err(e);
                }
                Err(e) => {
                    out.reply(format!("Uh oh, {}.", reason(&e)));
                    return Err(e);
                }
            },

            PollCommand::DelVote(args) => {
                if !service.access().is_admin(actor) {
                    out.reply("I'm sorry, you don't have permission to run this command.".to_string());
                    return Err(PollError::AccessDenied);
                }
                let Ok((poll, user)) = args else {
                    out.reply(MALFORMED.to_string());
                    return Err(PollError::Parse("delvote arguments".to_string()));
                };
                match service.remove_user_vote(actor, &poll, &user).await {
                    Ok(_) => out.reply("Well, their vote has been deleted.".to_string()),
                    Err(e @ PollError::NotVoted) => {
                        out.reply("The user hasn't even voted for any of the options!".to_string());
                        return Err(e);
                    }
                    Err(e @ PollError::PollNotFound(_)) => {
                        out.reply("Erm, no such poll.".to_string());
                        return Err(e);
                    }
                    Err(e) => {
                        out.reply(format!("Uh oh, {}.", reason(&e)));
                        return Err(e);
                    }
                }
            }

            _ => {
                out.reply("Unknown command.".to_string());
                return Err(PollError::Parse("command".to_string()));
            }
        }
        Ok(())
    }
}

/// Reply for open/close/delete failures.
fn manage_error<T: ChatTransport>(err: PollError, out: &mut T) -> PollError {
    let text = match &err {
        PollError::PollNotFound(_) => "Erm, no such poll.".to_string(),
        PollError::AccessDenied => "Erm, no access.".to_string(),
        PollError::StillOpen => "Close the poll first!".to_string(),
        other => format!("Uh oh, {}.", reason(other)),
    };
    out.reply(text);
    err
}

/// Generic reply for errors without a command-specific message.
fn reply_error<T: ChatTransport>(err: PollError, out: &mut T) -> PollError {
    let text = match &err {
        PollError::NoDraft => format!("You're not editing a poll. Type {} to start.", italic(".poll create")),
        other => format!("Uh oh, {}.", reason(other)),
    };
    out.reply(text);
    err
}

fn help<T: ChatTransport>(editing: bool, topic: Option<&str>, out: &mut T) {
    let entries = match (editing, topic) {
        (true, Some("=")) => SETTINGS_HELP,
        (true, _) => EDIT_HELP,
        (false, _) => NORMAL_HELP,
    };
    for (usage, text) in entries {
        out.reply(format!("{}: {text}", italic(format!(".poll {usage}"))));
    }
}

fn render_status(status: &DraftStatus) -> Vec<String> {
    let draft = &status.draft;
    let quoted = |v: &Option<String>| match v {
        Some(s) => format!("'{s}'"),
        None => "not set".to_string(),
    };

    let interim = match draft.interim {
        Some(true) => "yes",
        Some(false) => "no",
        None => "not set",
    };
    let options = match &draft.options {
        Some(opts) => opts
            .iter()
            .enumerate()
            .map(|(pos, name)| format!("{}: {name}{RESET}", bold(format!("#{pos}"))))
            .collect::<Vec<_>>()
            .join(", "),
        None => "not set".to_string(),
    };

    vec![
        format!("{} {}", bold("Codename:"), quoted(&draft.name)),
        format!("{} {}", bold("Title:"), quoted(&draft.title)),
        format!("{} {interim}", bold("Interim results:")),
        format!("{} {options}", bold("Options:")),
        if draft.settings.anonymous {
            format!("The poll is {}.", bold("anonymous"))
        } else {
            format!("The poll is {}.", bold("unanonymous"))
        },
        if status.ready {
            format!("Poll is {} to be committed.", bold("ready"))
        } else {
            format!("Some fields are still {}.", bold("unset"))
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollbot_core::format::strip;
    use pollbot_core::service::access::AccessPolicy;
    use pollbot_infra::sqlite::poll::SqlitePollRepository;
    use pollbot_infra::sqlite::pool::{DatabasePool, database_url_in};

    async fn plugin() -> PollPlugin<SqlitePollRepository> {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}?mode=rwc", database_url_in(dir.path()));
        std::mem::forget(dir);
        let repo = SqlitePollRepository::new(DatabasePool::new(&url).await.unwrap());
        PollPlugin::new(
            Arc::new(PollBuilder::new(repo.clone())),
            Arc::new(PollService::new(repo, AccessPolicy::new(["Totoro"]))),
            NonZeroUsize::new(10).unwrap(),
        )
    }

    /// Run one line and return the replies with formatting stripped.
    async fn run(plugin: &PollPlugin<SqlitePollRepository>, actor: &str, line: &str) -> Vec<String> {
        let mut out = Vec::new();
        plugin.handle(actor, line, &mut out).await;
        out.iter().map(|l| strip(l)).collect()
    }

    async fn create_poll(plugin: &PollPlugin<SqlitePollRepository>, actor: &str, name: &str) {
        for line in [
            "create".to_string(),
            format!("# {name}"),
            "! Favourite colour?".to_string(),
            "@ off".to_string(),
            "> red".to_string(),
            "> blue".to_string(),
            "~~~".to_string(),
        ] {
            let mut out = Vec::new();
            assert!(plugin.handle(actor, &line, &mut out).await, "{line} failed: {out:?}");
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let p = plugin().await;

        let replies = run(&p, "A", "create").await;
        assert_eq!(replies[0], "SWITCHED TO EDIT MODE. Let's create a new poll!");

        assert_eq!(run(&p, "A", "# pp1").await, vec!["The codename set to 'pp1'!"]);
        assert_eq!(run(&p, "A", "! Colour?").await, vec!["The title set to 'Colour?'!"]);
        assert_eq!(run(&p, "A", "@ no").await, vec!["Results will be unavailable until closed!"]);
        assert_eq!(run(&p, "A", "> red").await, vec!["Added option #0: 'red'"]);
        assert_eq!(run(&p, "A", "> blue").await, vec!["Added option #1: 'blue'"]);

        let status = run(&p, "A", "?").await;
        assert_eq!(status[0], "Codename: 'pp1'");
        assert_eq!(status[3], "Options: #0: red, #1: blue");
        assert_eq!(status[5], "Poll is ready to be committed.");

        let replies = run(&p, "A", "~~~").await;
        assert_eq!(replies[1], "SWITCHED TO NORMAL MODE.");

        assert_eq!(run(&p, "B", "vote pp1 0").await, vec!["Uh oh, poll is closed."]);
        assert_eq!(run(&p, "A", "open pp1").await, vec!["Poll opened!"]);
        assert_eq!(run(&p, "B", "vote pp1 0").await, vec!["You've voted for #0: red!"]);
        assert_eq!(run(&p, "B", "vote pp1 1").await, vec!["You've voted for #1: blue!"]);
        assert_eq!(run(&p, "B", "vote pp1 1").await, vec!["You've already voted for #1: blue."]);

        // Interim results are off: no tallies while open.
        let info = run(&p, "C", "info pp1").await;
        assert_eq!(info[2], "1 votes total.");
        assert!(!info.join("\n").contains('%'));

        assert_eq!(run(&p, "A", "delete pp1").await, vec!["Close the poll first!"]);
        assert_eq!(run(&p, "A", "close pp1").await, vec!["Poll closed!"]);

        let info = run(&p, "C", "info pp1").await;
        assert!(info[3].contains("0 votes   0.0%"));
        assert!(info[4].contains("1 votes 100.0%"));
        assert!(info[4].ends_with("│ B"));

        assert_eq!(run(&p, "A", "delete pp1").await, vec!["Poll has been deleted."]);
        assert_eq!(run(&p, "A", "info pp1").await, vec!["Uh oh, no such poll."]);
    }

    #[tokio::test]
    async fn test_edit_mode_rejections() {
        let p = plugin().await;
        run(&p, "A", "create").await;

        assert!(run(&p, "A", "# x").await[0].starts_with("Bad codename."));
        assert_eq!(run(&p, "A", "@ maybe").await, vec!["Erm, what?"]);
        assert_eq!(
            run(&p, "A", "< 0").await,
            vec!["You'd better add an option before using this command :)"]
        );
        assert_eq!(
            run(&p, "A", "> ").await,
            vec!["Well, you didn't provide a name for your option."]
        );
        run(&p, "A", "> only").await;
        assert_eq!(run(&p, "A", "< 3").await, vec!["No such index."]);
        assert!(run(&p, "A", "< only").await[0].starts_with("Bad argument."));
        assert_eq!(
            run(&p, "A", "= colour yes").await,
            vec!["I'm afraid I can't decipher what you gave :<"]
        );
        assert_eq!(
            run(&p, "A", "= anon perhaps").await,
            vec!["Uh oh, I couldn't understand what you told me."]
        );
        assert_eq!(
            run(&p, "A", "~~~").await,
            vec!["Some fields are still unset. You can't commit partially filled polls."]
        );
        assert_eq!(run(&p, "A", "< 0").await, vec!["Removed option #0: 'only'"]);

        let replies = run(&p, "A", "create").await;
        assert!(replies[0].contains("already"));

        let replies = run(&p, "A", "***").await;
        assert_eq!(replies, vec!["Your poll is deleted. SWITCHED TO NORMAL MODE."]);
        assert_eq!(run(&p, "A", "?").await, vec!["Unknown command."]);
    }

    #[tokio::test]
    async fn test_duplicate_codename() {
        let p = plugin().await;
        create_poll(&p, "A", "taken").await;

        run(&p, "B", "create").await;
        assert_eq!(run(&p, "B", "# taken").await, vec!["Codename must be unique."]);
    }

    #[tokio::test]
    async fn test_normal_commands_work_while_editing() {
        let p = plugin().await;
        create_poll(&p, "A", "pp2").await;
        run(&p, "A", "open pp2").await;

        run(&p, "B", "create").await;
        assert_eq!(run(&p, "B", "vote pp2 1").await, vec!["You've voted for #1: blue!"]);
        assert!(run(&p, "B", "?").await[0].starts_with("Codename:"));
    }

    #[tokio::test]
    async fn test_access_denied_replies() {
        let p = plugin().await;
        create_poll(&p, "A", "mine").await;

        assert_eq!(run(&p, "M", "open mine").await, vec!["Erm, no access."]);
        assert_eq!(run(&p, "M", "open nope").await, vec!["Erm, no such poll."]);
        assert_eq!(run(&p, "Totoro", "open mine").await, vec!["Poll opened!"]);
        assert_eq!(run(&p, "M", "close mine").await, vec!["Erm, no access."]);
        run(&p, "A", "close mine").await;
        assert_eq!(run(&p, "M", "delete mine").await, vec!["Erm, no access."]);
    }

    #[tokio::test]
    async fn test_vote_argument_errors() {
        let p = plugin().await;
        create_poll(&p, "A", "args").await;
        run(&p, "A", "open args").await;

        assert!(run(&p, "B", "vote args").await[0].starts_with("Something is wrong"));
        assert_eq!(
            run(&p, "B", "vote args red").await,
            vec!["Bad index. Yes, I need an index, not name!"]
        );
        assert_eq!(run(&p, "B", "vote args 5").await, vec!["Uh oh, no such index."]);
        assert_eq!(run(&p, "B", "vote args -1").await, vec!["Uh oh, no such index."]);
        assert_eq!(run(&p, "B", "vote nope 0").await, vec!["Uh oh, no such poll."]);
    }

    #[tokio::test]
    async fn test_unvote_and_delvote() {
        let p = plugin().await;
        create_poll(&p, "A", "undo").await;
        run(&p, "A", "open undo").await;

        assert_eq!(
            run(&p, "B", "unvote undo").await,
            vec!["Wait, don't you think you need to vote first?"]
        );
        run(&p, "B", "vote undo 0").await;
        assert_eq!(run(&p, "B", "unvote undo").await, vec!["All set! Your vote has been deleted."]);

        run(&p, "C", "vote undo 1").await;
        assert_eq!(
            run(&p, "A", "delvote undo C").await,
            vec!["I'm sorry, you don't have permission to run this command."]
        );
        assert!(run(&p, "Totoro", "delvote undo").await[0].starts_with("Something is wrong"));
        assert_eq!(run(&p, "Totoro", "remvote undo C").await, vec!["Well, their vote has been deleted."]);
        assert_eq!(
            run(&p, "Totoro", "delvote undo C").await,
            vec!["The user hasn't even voted for any of the options!"]
        );

        run(&p, "A", "close undo").await;
        assert_eq!(run(&p, "B", "unvote undo").await, vec!["Uh oh, poll is closed."]);
    }

    #[tokio::test]
    async fn test_list() {
        let p = plugin().await;
        assert_eq!(run(&p, "A", "list").await, vec!["No polls."]);

        create_poll(&p, "A", "first").await;
        create_poll(&p, "A", "second").await;
        run(&p, "A", "open second").await;

        let mut out = Vec::new();
        p.handle("A", "list", &mut out).await;
        assert_eq!(strip(&out[0]), "Polls: first, second");
        assert!(out[0].contains("\x0301first"));
        assert!(out[0].contains("\x02second"));
    }

    #[tokio::test]
    async fn test_help_depends_on_mode() {
        let p = plugin().await;
        let normal = run(&p, "A", "help").await;
        assert!(normal[0].starts_with(".poll create:"));
        assert_eq!(normal.len(), NORMAL_HELP.len());

        run(&p, "A", "create").await;
        let edit = run(&p, "A", "help").await;
        assert!(edit[0].starts_with(".poll # <code name>:"));

        let settings = run(&p, "A", "help =").await;
        assert_eq!(settings.len(), 1);
        assert!(settings[0].contains("anonymous"));
    }

    #[tokio::test]
    async fn test_blank_and_unknown() {
        let p = plugin().await;
        let mut out = Vec::new();
        assert!(!p.handle("A", "", &mut out).await);
        assert!(out.is_empty());
        assert_eq!(run(&p, "A", "frobnicate").await, vec!["Unknown command."]);
        assert_eq!(run(&p, "A", "~~~").await, vec!["Unknown command."]);
    }

    #[tokio::test]
    async fn test_edit_commands_follow_actor_mode() {
        let p = plugin().await;
        run(&p, "A", "create").await;

        assert_eq!(run(&p, "B", "?").await, vec!["Unknown command."]);
        assert_eq!(run(&p, "B", "> red").await, vec!["Unknown command."]);
        assert!(run(&p, "A", "?").await[0].starts_with("Codename:"));

        run(&p, "A", "***").await;
        assert_eq!(run(&p, "A", "?").await, vec!["Unknown command."]);
        assert_eq!(run(&p, "A", "info none").await, vec!["Uh oh, no such poll."]);
    }
}
