//! `info` report generation.
//!
//! Builds a `PollReport` from a stored poll, withholding tallies while an
//! open poll has interim results disabled and masking voters of anonymous
//! polls, then renders it to chat lines.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pollbot_types::poll::Poll;

use crate::bar::render_bar;
use crate::format::{BOLD, RESET, bold};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollReport {
    pub name: String,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub open: bool,
    pub total_votes: usize,
    pub body: ReportBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum ReportBody {
    /// Open poll without interim results: option labels only.
    Withheld(Vec<OptionLabel>),
    Tallies(Vec<OptionTally>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionLabel {
    pub index: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionTally {
    pub index: u32,
    pub name: String,
    pub votes: usize,
    /// Share of all votes, rounded to one decimal; 0 when nobody voted.
    pub percent: f64,
    /// `None` for anonymous polls.
    pub voters: Option<Vec<String>>,
}

/// Percentage of `votes` in `total`, rounded to one decimal place.
pub fn percent_of(votes: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (1000.0 * votes as f64 / total as f64).round() / 10.0
}

impl PollReport {
    pub fn from_poll(poll: &Poll) -> Self {
        let total_votes = poll.total_votes();

        let body = if poll.open && !poll.interim {
            ReportBody::Withheld(
                poll.options
                    .iter()
                    .map(|opt| OptionLabel {
                        index: opt.index,
                        name: opt.name.clone(),
                    })
                    .collect(),
            )
        } else {
            ReportBody::Tallies(
                poll.options
                    .iter()
                    .map(|opt| OptionTally {
                        index: opt.index,
                        name: opt.name.clone(),
                        votes: opt.votes.len(),
                        percent: percent_of(opt.votes.len(), total_votes),
                        voters: (!poll.anonymous).then(|| opt.votes.clone()),
                    })
                    .collect(),
            )
        };

        Self {
            name: poll.name.clone(),
            title: poll.title.clone(),
            author: poll.author.clone(),
            created_at: poll.created_at,
            open: poll.open,
            total_votes,
            body,
        }
    }

    /// Render the report as chat lines, one reply per line.
    pub fn render(&self, bar_width: NonZeroUsize) -> Vec<String> {
        let mut lines = vec![
            format!("{} {}", bold("Title:"), self.title),
            format!(
                "{} {} at {}",
                bold("Created by"),
                self.author,
                self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            format!("{} votes total.", bold(self.total_votes)),
        ];

        match &self.body {
            ReportBody::Withheld(options) => {
                lines.extend(
                    options
                        .iter()
                        .map(|opt| format!("  {}: {}", bold(format!("#{}", opt.index)), opt.name)),
                );
            }
            ReportBody::Tallies(tallies) => {
                let width = tallies
                    .iter()
                    .map(|t| t.name.chars().count())
                    .max()
                    .unwrap_or(0);

                for tally in tallies {
                    let mut line = format!(
                        "  {BOLD}{}{BOLD} votes {:>5.1}% {} {}: {:<width$}{RESET}",
                        tally.votes,
                        tally.percent,
                        render_bar(bar_width, tally.percent),
                        bold(format!("#{}", tally.index)),
                        tally.name,
                    );
                    if let Some(voters) = &tally.voters {
                        line.push_str(" │ ");
                        line.push_str(&voters.join(", "));
                    }
                    lines.push(line);
                }
            }
        }

        lines
    }
}
