//! Poll inspection and import commands.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use pollbot_core::format::strip;
use pollbot_core::repository::poll::PollFilter;
use pollbot_core::service::report::ReportBody;
use pollbot_infra::legacy;
use pollbot_types::poll::{PollState, PollSummary};

use super::ListArgs;
use crate::state::AppState;

#[derive(Serialize)]
struct ListingJson<'a> {
    store_size: u64,
    polls: Vec<ListedPoll<'a>>,
}

#[derive(Serialize)]
struct ListedPoll<'a> {
    name: &'a str,
    state: PollState,
}

impl<'a> From<&'a PollSummary> for ListedPoll<'a> {
    fn from(summary: &'a PollSummary) -> Self {
        Self {
            name: &summary.name,
            state: PollState::from(summary.open),
        }
    }
}

/// List polls, optionally filtered by state and author.
pub async fn list_polls(state: &AppState, args: &ListArgs, json: bool) -> Result<()> {
    let filter = PollFilter {
        open: args.open_filter(),
        author: args.author.clone(),
    };
    let listing = state.poll_service.list(&filter).await?;

    if json {
        let out = ListingJson {
            store_size: listing.store_size,
            polls: listing.polls.iter().map(ListedPoll::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if listing.polls.is_empty() {
        println!();
        if listing.store_size == 0 {
            println!("  {} No polls yet.", style("i").blue().bold());
        } else {
            println!(
                "  {} No polls match the filter ({} in store).",
                style("i").blue().bold(),
                listing.store_size
            );
        }
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Codename").fg(Color::White),
        Cell::new("State").fg(Color::White),
    ]);

    for poll in &listing.polls {
        let state_cell = match PollState::from(poll.open) {
            PollState::Open => Cell::new("● open").fg(Color::Green),
            PollState::Closed => Cell::new("○ closed").fg(Color::DarkGrey),
        };
        table.add_row(vec![Cell::new(&poll.name).fg(Color::Cyan), state_cell]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Print the `info` report of one poll.
pub async fn show_poll(state: &AppState, name: &str, json: bool) -> Result<()> {
    let report = state.poll_service.info(name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(&report.name).cyan().bold(),
        if report.open {
            style("(open)").green()
        } else {
            style("(closed)").dim()
        }
    );
    for line in report.render(state.bar_width()) {
        println!("  {}", strip(&line));
    }
    if matches!(report.body, ReportBody::Withheld(_)) {
        println!();
        println!(
            "  {}",
            style("Interim results are off; tallies are shown once the poll is closed.").dim()
        );
    }
    println!();
    Ok(())
}

/// Import a legacy JSON export into the store.
pub async fn import_polls(state: &AppState, file: &Path, json: bool) -> Result<()> {
    let summary = legacy::import_file(&state.repo, file).await?;

    if json {
        let out = serde_json::json!({
            "imported": summary.imported,
            "skipped": summary.skipped,
            "invalid": summary
                .invalid
                .iter()
                .map(|(name, reason)| serde_json::json!({ "name": name, "reason": reason }))
                .collect::<Vec<_>>(),
            "dropped_votes": summary.dropped_votes,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Imported {} poll(s) from {}",
        style("✓").green().bold(),
        summary.imported,
        file.display()
    );
    if !summary.skipped.is_empty() {
        println!(
            "  {} Skipped existing: {}",
            style("!").yellow().bold(),
            summary.skipped.join(", ")
        );
    }
    for (name, reason) in &summary.invalid {
        println!(
            "  {} Rejected {}: {}",
            style("✗").red().bold(),
            style(name).cyan(),
            reason
        );
    }
    if summary.dropped_votes > 0 {
        println!(
            "  {} Dropped {} duplicate vote(s)",
            style("!").yellow().bold(),
            summary.dropped_votes
        );
    }
    println!();
    Ok(())
}
