//! CLI command handlers

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use tracing::debug;

use super::Cli;
use crate::library::{FileConfig, MirrorConfig, StatvfsProbe};
use crate::mirror::{MirrorEngine, MirrorPlan, MirrorReport};
use crate::remote::YtDlpClient;

/// Mirror a playlist into the configured storage root
pub async fn mirror(cli: &Cli, playlist: &str) -> Result<()> {
    let file = FileConfig::load()?;
    let config = cli.apply(MirrorConfig::default().with_file(&file));

    println!(
        "{} {}",
        "Mirroring into".cyan(),
        config.storage_root.display()
    );

    let client = YtDlpClient::new(
        config.ytdlp_bin.clone(),
        &config.format,
        config.cookies.clone(),
    );

    let mut engine = MirrorEngine::open(
        &config,
        Box::new(client.clone()),
        Box::new(client),
        Box::new(StatvfsProbe),
    )
    .await
    .context("Failed to prepare local storage")?;

    if cli.dry_run {
        let plan = engine
            .plan(playlist)
            .await
            .context("Failed to access playlist")?;
        print_plan(&plan);
        return Ok(());
    }

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let result = engine.run(playlist, &progress).await;
    debug!("Engine finished in state {}", engine.state());
    let report = result.context("Stopping: every item in the playlist is required")?;

    print_report(&report);
    Ok(())
}

fn print_plan(plan: &MirrorPlan) {
    println!();
    println!("{}", "[DRY RUN] Playlist status:".yellow());
    for item in &plan.items {
        let status = if plan.is_completed(item) {
            "done".green()
        } else {
            "pending".yellow()
        };
        println!("  [{}] {}", status, plan.names.stem(item));
    }

    if !plan.renames.is_empty() {
        println!();
        println!("{}", "Would rename:".yellow());
        for rename in &plan.renames {
            println!("  {} -> {}", rename.from.display(), rename.to.display());
        }
    }

    println!();
    println!(
        "{} of {} item(s) pending",
        plan.pending_count(),
        plan.items.len()
    );
}

fn print_report(report: &MirrorReport) {
    println!();
    println!("{}", "All items downloaded successfully!".green().bold());
    println!("  Items in playlist: {}", report.total);
    println!("  Downloaded this run: {}", report.materialized);
    println!("  Already present: {}", report.skipped);
    println!("  Renamed: {}", report.renamed);
    println!("  Ledger entries: {}", report.ledger_size);
}

/// Handle `--completions`
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "plmirror", &mut io::stdout());
}
