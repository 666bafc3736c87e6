//! CLI binary for SkillBuddy job matching.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use skillbuddy::{AppConfig, JobMatcher, MatchReport, QuotaStatus};
use skillbuddy_jobs::{OutcomeKind, SearchQuery, Seniority, SkillProfile};
use tracing_subscriber::EnvFilter;

/// SkillBuddy: find job postings that match a candidate's skills.
#[derive(Parser)]
#[command(name = "skillbuddy-jobs", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search for postings and rank them against a skill profile.
    Search(SearchArgs),

    /// Show the provider call allowance.
    Quota,

    /// Write a default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Role title to search for.
    #[arg(long)]
    role: String,

    /// Optional location filter.
    #[arg(long)]
    location: Option<String>,

    /// Comma-separated skills.
    #[arg(
        long,
        value_delimiter = ',',
        required_unless_present = "profile",
        conflicts_with = "profile"
    )]
    skills: Vec<String>,

    /// JSON profile with `skills`, `roles` and `level` fields.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Seniority label used with `--skills`.
    #[arg(long)]
    seniority: Option<String>,

    /// Ignore cached postings and ask the provider again.
    #[arg(long)]
    refresh: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skillbuddy=info,skillbuddy_jobs=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Search(args) => {
            let config = AppConfig::load(cli.config.as_deref())?;
            run_search(&config, args).await
        }
        Command::Quota => {
            let config = AppConfig::load(cli.config.as_deref())?;
            show_quota(&config);
            Ok(())
        }
        Command::InitConfig { force } => init_config(cli.config.as_deref(), force),
    }
}

async fn run_search(config: &AppConfig, args: SearchArgs) -> anyhow::Result<()> {
    let query = SearchQuery::new(&args.role, args.location.as_deref())?;
    let profile = load_profile(&args)?;
    let matcher = JobMatcher::from_config(config)?;

    let report = matcher.find_matches(&query, &profile, args.refresh).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(error) = &report.error {
        anyhow::bail!("job search failed: {error}");
    }
    Ok(())
}

fn load_profile(args: &SearchArgs) -> anyhow::Result<SkillProfile> {
    if let Some(path) = &args.profile {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        let profile = serde_json::from_str(&content)
            .with_context(|| format!("parsing profile {}", path.display()))?;
        return Ok(profile);
    }

    let seniority = args
        .seniority
        .as_deref()
        .map(Seniority::parse)
        .unwrap_or_default();
    Ok(SkillProfile::new(&args.skills, Vec::<String>::new(), seniority)?)
}

fn print_report(report: &MatchReport) {
    println!("outcome: {}", report.outcome);
    if report.stale {
        match report.fetched_at {
            Some(at) => println!("stale: results fetched {}", at.format("%Y-%m-%d %H:%M UTC")),
            None => println!("stale: true"),
        }
    }
    println!("quota: {}", describe_quota(&report.quota));

    if report.matches.is_empty() {
        let reason = match report.outcome {
            OutcomeKind::QuotaExceeded => "quota exhausted and no cached postings for this query",
            OutcomeKind::ProviderFailed => "provider request failed",
            OutcomeKind::ServedFromCache | OutcomeKind::ServedFresh => "no postings found",
        };
        println!("\n{reason}");
        return;
    }

    println!();
    for m in &report.matches {
        let posted = m
            .posting
            .posted_date
            .map(|d| format!(", posted {d}"))
            .unwrap_or_default();
        println!(
            "{:>2}. [{:>3}] {} - {} ({}{posted})",
            m.rank, m.score, m.posting.title, m.posting.company, m.posting.location
        );
        if !m.matched_skills.is_empty() {
            println!("          matched: {}", m.matched_skills.join(", "));
        }
        if !m.missing_skills.is_empty() {
            println!("          missing: {}", m.missing_skills.join(", "));
        }
        println!("          {}", m.posting.url);
    }
}

fn show_quota(config: &AppConfig) {
    println!("{}", describe_allowance(config));
    println!("usage is tracked per process; `search` reports live remaining calls");
}

/// Configured allowance only. Usage lives in memory, so a separate process
/// has nothing to read.
fn describe_allowance(config: &AppConfig) -> String {
    let seconds = config.search.quota_window_seconds;
    let window = if seconds % 86_400 == 0 {
        format!("{} days", seconds / 86_400)
    } else {
        format!("{seconds} seconds")
    };
    format!(
        "allowance: {} provider calls per {window}",
        config.search.quota_limit
    )
}

fn describe_quota(status: &QuotaStatus) -> String {
    let hours = status.resets_in_seconds / 3_600;
    format!(
        "{}/{} calls remaining, resets in {}d {}h",
        status.remaining,
        status.limit,
        hours / 24,
        hours % 24
    )
}

fn init_config(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    AppConfig::default().save_to_file(&path)?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowance_reports_configured_limit_not_usage() {
        let mut config = AppConfig::default();
        config.search.quota_limit = 7;
        config.search.quota_window_seconds = 30 * 86_400;

        let line = describe_allowance(&config);

        assert_eq!(line, "allowance: 7 provider calls per 30 days");
        assert!(!line.contains("remaining"));
    }

    #[test]
    fn allowance_with_partial_day_window_uses_seconds() {
        let mut config = AppConfig::default();
        config.search.quota_window_seconds = 90;
        assert!(describe_allowance(&config).ends_with("per 90 seconds"));
    }
}
