//! Scan driver
//!
//! Orchestrates the full run: folder enumeration, the optional
//! folder-path filter, the per-folder item search, the confirmation
//! policy and the mutation, and accumulates the outcomes. Input and
//! output are injected so the interactive path is testable.

use crate::client::ExchangeClient;
use crate::error::Result;
use crate::filter::ItemFilter;
use crate::folder::FolderId;
use crate::item::Sensitivity;
use serde::Serialize;
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

/// What happens to a matched item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPolicy {
    /// Report matches only; never mutate.
    LogOnly,
    /// Mutate every match without asking.
    Always,
    /// Ask per item; only `y` or `Y` confirms.
    Interactive,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub filter: ItemFilter,
    /// Keep only folders whose path contains this text. Only honored
    /// for private-flag scans; a failed path lookup here is fatal.
    pub folder_filter: Option<String>,
    pub confirm: ConfirmPolicy,
}

/// Outcome counters for one run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanSummary {
    pub folders_scanned: usize,
    pub matches: usize,
    pub changed: usize,
    pub declined: usize,
    pub skipped_non_messages: usize,
    pub update_failures: usize,
}

/// `true` only for a bare `y` or `Y` answer.
///
/// Anything else, including `yes`, declines; this mirrors the original
/// tool's strict confirmation.
fn confirmed(answer: &str) -> bool {
    matches!(answer.trim_end_matches(['\r', '\n']), "y" | "Y")
}

const fn prompt_for(target: Sensitivity) -> &'static str {
    match target {
        Sensitivity::Normal => "Change to normal?",
        _ => "Mark as private?",
    }
}

fn report_match(
    output: &mut impl Write,
    filter: &ItemFilter,
    path: &str,
    subject: &str,
) -> std::io::Result<()> {
    match filter {
        ItemFilter::PrivateFlag => {
            writeln!(output, "Found private element. Folder: \"{path}\"")?;
        }
        ItemFilter::SubjectContains(_) => {
            writeln!(output, "Found matching element. Folder: \"{path}\"")?;
        }
    }
    writeln!(output, "Subject: \"{subject}\"")
}

/// Path for reporting purposes: a failed lookup degrades to an empty
/// string instead of aborting the run.
async fn display_path(client: &ExchangeClient, folder: &FolderId) -> String {
    match client.folder_path(folder).await {
        Ok(path) => path,
        Err(err) => {
            warn!("Failed to get folder path: {err}");
            String::new()
        }
    }
}

async fn apply(
    client: &ExchangeClient,
    item: &crate::item::Item,
    target: Sensitivity,
    summary: &mut ScanSummary,
) {
    match client.set_sensitivity(item, target).await {
        Ok(true) => {
            info!("Successfully changed");
            summary.changed += 1;
        }
        Ok(false) => {}
        Err(err) => {
            // A failed update is not fatal; continue with the next item.
            warn!("Error on updating the item: {err}");
            summary.update_failures += 1;
        }
    }
}

/// Run one scan over the mailbox.
///
/// # Errors
///
/// Propagates fatal failures: folder search, item search, and folder
/// path resolution while name-filtering. Update failures are counted,
/// not raised.
pub async fn run_scan<R: BufRead, W: Write>(
    client: &ExchangeClient,
    options: &ScanOptions,
    input: &mut R,
    output: &mut W,
) -> Result<ScanSummary> {
    let mut folders = client.list_folders_with_items().await?;
    writeln!(
        output,
        "Folders with minimum one item inside: {}",
        folders.len()
    )?;

    if let Some(name) = options.folder_filter.as_deref() {
        if !name.is_empty() {
            info!("Filtering the folder list by path");
            let mut kept = Vec::new();
            for folder in folders {
                // A failed lookup is fatal here, unlike the display path.
                let path = client.folder_path(&folder.id).await?;
                if path.contains(name) {
                    kept.push(folder);
                } else {
                    debug!("Folder \"{path}\" does not match the filter \"{name}\"");
                }
            }
            folders = kept;
        }
    }

    let target = options.filter.target();
    let mut summary = ScanSummary::default();

    for folder in &folders {
        summary.folders_scanned += 1;
        let path = display_path(client, &folder.id).await;
        debug!("Processing folder \"{path}\"");

        let items = client.find_matching_items(&folder.id, &options.filter).await?;
        if !items.is_empty() {
            info!("Matching items in folder: {}", items.len());
        }

        for item in &items {
            if !item.is_message() {
                debug!("Skipping non-message item \"{}\"", item.subject);
                summary.skipped_non_messages += 1;
                continue;
            }

            summary.matches += 1;
            report_match(output, &options.filter, &path, &item.subject)?;

            match options.confirm {
                ConfirmPolicy::LogOnly => {}
                ConfirmPolicy::Always => {
                    writeln!(
                        output,
                        "Changing item without confirmation because --noconfirmation is set"
                    )?;
                    apply(client, item, target, &mut summary).await;
                }
                ConfirmPolicy::Interactive => {
                    writeln!(
                        output,
                        "{} (Y/N) (Folder: {path} - Subject: {})",
                        prompt_for(target),
                        item.subject
                    )?;
                    let mut answer = String::new();
                    input.read_line(&mut answer)?;
                    if confirmed(&answer) {
                        info!("Change the item? Answer: yes");
                        apply(client, item, target, &mut summary).await;
                    } else {
                        info!("Change the item? Answer: no");
                        summary.declined += 1;
                    }
                }
            }
        }
    }

    Ok(summary)
}
