//! `carry apply` command - build the rebase branch and replay carried commits.

use std::path::Path;

use anyhow::{Context, Result, bail};
use carry_core::rebase::PlanEntry;
use carry_core::{Config, DirPatchStore, Outcome, RebaseOptions, RebaseReport, Rebaser};
use carry_git::Repository;
use colored::Colorize;

use super::ApplyArgs;
use crate::output;

/// Run the apply command.
pub fn run(args: &ApplyArgs, config_path: &Path) -> Result<()> {
    let config = load_config(args, config_path)?;

    let repo = Repository::open(&args.repository)
        .with_context(|| format!("failed to open repository {}", args.repository.display()))?
        .with_timeout(config.general.git_timeout());
    let patches = DirPatchStore::new(&config.general.carries_dir);

    let mut options = RebaseOptions::from_config(&config, chrono::Local::now().date_naive());
    if args.skip_remote_check {
        options.remotes.clear();
    }
    let rebaser = Rebaser::new(&repo, &repo, &patches, options);

    if args.dry_run {
        let plan = rebaser.plan(&args.from)?;
        if args.json {
            output::essential(&serde_json::to_string_pretty(&plan)?);
        } else {
            print_plan(&plan, &rebaser.options().branch);
        }
        return Ok(());
    }

    let report = rebaser.run(&args.from)?;

    if args.json {
        output::essential(&serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    for entry in report.failures() {
        if let Outcome::Failed(failure) = &entry.outcome {
            output::error(&format!("{} {}: {failure}", entry.commit, entry.summary));
        }
    }

    if !report.is_success() {
        bail!("{}", failure_summary(&report));
    }
    Ok(())
}

/// One-line reason a report is not a success.
fn failure_summary(report: &RebaseReport) -> String {
    if let Some(error) = &report.error {
        return format!(
            "rebase stopped on {} after {} commit(s): {error}",
            report.branch,
            report.entries.len()
        );
    }
    if let Some(reason) = &report.abort_reason {
        return format!("rebase aborted on {}: {reason}", report.branch);
    }
    format!(
        "{} commit(s) on {} need attention",
        report.failures().count(),
        report.branch
    )
}

/// Load the config file and fold in command-line overrides.
fn load_config(args: &ApplyArgs, path: &Path) -> Result<Config> {
    let mut config =
        Config::load(path).with_context(|| format!("failed to load config {}", path.display()))?;

    if let Some(onto) = &args.onto {
        config.refs.upstream.clone_from(onto);
    }
    if let Some(downstream) = &args.downstream {
        config.refs.downstream.clone_from(downstream);
    }
    if let Some(carries) = &args.carries {
        config.general.carries_dir.clone_from(carries);
    }
    if let Some(max) = args.max_failures {
        config.general.max_consecutive_failures = max;
    }

    config.validate()?;
    Ok(config)
}

fn print_plan(plan: &[PlanEntry], branch: &str) {
    output::info(&format!("{} commit(s) would be replayed onto {branch}", plan.len()));
    output::hr();
    for entry in plan {
        output::detail(&format!(
            "  {}  {:<22} {}",
            short(&entry.commit).dimmed(),
            output::action_label(&entry.action),
            entry.summary
        ));
    }
}

fn print_report(report: &RebaseReport) {
    output::info(&format!("Rebase branch {}", report.branch.bold()));
    output::hr();
    for entry in &report.entries {
        output::detail(&format!(
            "  {} {}  {:<22} {}",
            output::outcome_indicator(&entry.outcome),
            short(&entry.commit).dimmed(),
            output::action_label(&entry.action),
            entry.summary
        ));
    }
    output::hr();

    if !report.unprocessed.is_empty() {
        output::warn(&format!(
            "{} commit(s) left unprocessed",
            report.unprocessed.len()
        ));
    }
    if report.is_success() {
        output::success(&format!(
            "{} commit(s) applied to {}",
            report.applied_count(),
            report.branch
        ));
    }
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
