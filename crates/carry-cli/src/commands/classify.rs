//! `carry classify` command - show the rebase action for commits.

use std::path::Path;

use anyhow::{Context, Result};
use carry_core::{Action, classify};
use carry_git::{Repository, VersionControl};
use colored::Colorize;
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
struct Classified {
    commit: String,
    summary: String,
    action: Action,
}

/// Run the classify command.
pub fn run(revs: &[String], repository: &Path, json: bool) -> Result<()> {
    let repo = Repository::open(repository)
        .with_context(|| format!("failed to open repository {}", repository.display()))?;

    let classified = revs
        .iter()
        .map(|rev| {
            let commit = repo
                .find_commit(rev)
                .with_context(|| format!("failed to look up {rev}"))?;
            Ok(Classified {
                commit: commit.id.to_string(),
                summary: commit.summary().to_string(),
                action: classify(&commit.message),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if json {
        output::essential(&serde_json::to_string_pretty(&classified)?);
        return Ok(());
    }

    for entry in &classified {
        output::essential(&format!(
            "{} {:<22} {}",
            entry.commit.get(..8).unwrap_or(&entry.commit).dimmed(),
            output::action_label(&entry.action),
            entry.summary
        ));
    }
    Ok(())
}
