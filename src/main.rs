// src/main.rs
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use siteguard::extract::extract;
use siteguard::fetch::Fetcher;
use siteguard::report::{render_report, write_report};
use siteguard::{
    run_assessment, run_security_scan, AppConfig, ContentFilter, FilterRuleSet, FindingCategory,
    PrivacyFilter, ReportFormat, SiteguardResult,
};

#[derive(Parser)]
#[command(name = "siteguard")]
#[command(about = "Site crawler, content filter and security scanner")]
struct Args {
    #[command(subcommand)]
    command: Cli,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true, help = "TOML configuration file")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cli {
    /// Crawl a site and print the discovered pages
    Crawl {
        #[arg(help = "Seed URL or domain")]
        url: String,

        #[arg(long, help = "Maximum link depth from the seed")]
        depth: Option<usize>,

        #[arg(long, help = "Maximum number of pages to fetch")]
        pages: Option<usize>,

        #[arg(long, help = "Per-request timeout in seconds")]
        timeout: Option<u64>,

        #[arg(long, help = "Delay between same-host requests in milliseconds")]
        delay: Option<u64>,

        #[arg(long, help = "Overall crawl budget in seconds (0 = unlimited)")]
        time_budget: Option<u64>,

        #[arg(long, help = "Number of concurrent fetch workers")]
        workers: Option<usize>,

        #[arg(long, help = "Follow links off the seed host")]
        any_host: bool,

        #[arg(long, help = "Skip TLS certificate verification")]
        insecure: bool,

        #[arg(short, long, help = "Write page list as JSON to this file")]
        output: Option<PathBuf>,
    },

    /// Fetch one page and print it with ads and trackers removed
    Filter {
        #[arg(help = "Page URL")]
        url: String,

        #[arg(long, help = "Per-request timeout in seconds")]
        timeout: Option<u64>,

        #[arg(long, help = "Mask emails, phone numbers and similar PII")]
        mask_private: bool,

        #[arg(long, help = "Skip TLS certificate verification")]
        insecure: bool,

        #[arg(short, long, help = "Write cleaned markup to this file")]
        output: Option<PathBuf>,
    },

    /// Scan a target and produce a security report
    Scan {
        #[arg(help = "Seed URL or domain")]
        url: String,

        #[arg(long, help = "Comma-separated finding categories to probe")]
        categories: Option<String>,

        #[arg(long, help = "Per-request timeout in seconds")]
        timeout: Option<u64>,

        #[arg(long, help = "Concurrent probe requests")]
        concurrency: Option<usize>,

        #[arg(long, help = "Crawl first and scan with discovered parameters")]
        deep: bool,

        #[arg(long, help = "Maximum link depth for --deep")]
        depth: Option<usize>,

        #[arg(long, help = "Maximum pages for --deep")]
        pages: Option<usize>,

        #[arg(long, help = "Skip TLS certificate verification")]
        insecure: bool,

        #[arg(short, long, default_value = "json", help = "Report format (json, md)")]
        format: String,

        #[arg(short, long, help = "Write the report to this file")]
        output: Option<PathBuf>,
    },
}

fn parse_categories(list: &str) -> SiteguardResult<HashSet<FindingCategory>> {
    let mut categories = HashSet::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match FindingCategory::from_str_opt(name) {
            Some(category) => {
                categories.insert(category);
            }
            None => {
                return Err(siteguard::SiteguardError::Config(format!(
                    "unknown finding category '{}'",
                    name
                )))
            }
        }
    }
    Ok(categories)
}

async fn run(args: Args) -> SiteguardResult<()> {
    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Cli::Crawl {
            url,
            depth,
            pages,
            timeout,
            delay,
            time_budget,
            workers,
            any_host,
            insecure,
            output,
        } => {
            let mut target = config.crawl.clone();
            target.seed_url = url;
            if let Some(depth) = depth {
                target.max_depth = depth;
            }
            if let Some(pages) = pages {
                target.max_pages = pages;
            }
            if let Some(timeout) = timeout {
                target.timeout_secs = timeout;
            }
            if let Some(delay) = delay {
                target.delay_between_requests_ms = delay;
            }
            if let Some(budget) = time_budget {
                target.time_budget_secs = budget;
            }
            if let Some(workers) = workers {
                target.workers = workers;
            }
            if any_host {
                target.respect_domain_scope = false;
            }
            if insecure {
                target.verify_tls = false;
            }

            let outcome = siteguard::run_crawl(&target).await?;
            info!(
                "Crawl finished: {} pages in {:.1}s",
                outcome.pages.len(),
                outcome.duration_secs
            );
            let rendered = serde_json::to_string_pretty(&outcome)?;
            match output {
                Some(path) => tokio::fs::write(&path, rendered).await.map_err(|e| {
                    siteguard::SiteguardError::File {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    }
                })?,
                None => println!("{}", rendered),
            }
            for warning in &outcome.warnings {
                eprintln!("warning: {}", warning);
            }
        }

        Cli::Filter {
            url,
            timeout,
            mask_private,
            insecure,
            output,
        } => {
            let mut target = config.crawl.clone();
            target.seed_url = url;
            if let Some(timeout) = timeout {
                target.timeout_secs = timeout;
            }
            let seed = target.validate()?;
            let host = seed
                .host_str()
                .unwrap_or_default()
                .to_string();

            let fetcher = Fetcher::new(target.timeout(), !insecure && target.verify_tls)?;
            let fetched = fetcher.fetch(seed.as_str()).await?;
            let page = extract(&fetched, &host);

            let content_filter = ContentFilter::new(FilterRuleSet::builtin());
            let (mut cleaned, stats) = content_filter.filter_page(&page);
            if mask_private || config.filter.mask_private_data {
                let (masked, matches) = PrivacyFilter::new('*').mask(&cleaned);
                info!(
                    "Masked {} emails, {} phone numbers, {} card-like and {} SSN-like sequences",
                    matches.emails, matches.phone_numbers, matches.credit_cards, matches.ssn_like
                );
                cleaned = masked;
            }
            info!(
                "Removed {} elements ({} -> {} bytes)",
                stats.removed_count, stats.original_size, stats.cleaned_size
            );
            match output {
                Some(path) => tokio::fs::write(&path, cleaned).await.map_err(|e| {
                    siteguard::SiteguardError::File {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    }
                })?,
                None => println!("{}", cleaned),
            }
        }

        Cli::Scan {
            url,
            categories,
            timeout,
            concurrency,
            deep,
            depth,
            pages,
            insecure,
            format,
            output,
        } => {
            let mut options = config.scan.clone();
            if let Some(list) = categories {
                options.categories = parse_categories(&list)?;
            }
            if let Some(timeout) = timeout {
                options.timeout_secs = timeout;
            }
            if let Some(concurrency) = concurrency {
                options.concurrency = concurrency;
            }
            if insecure {
                options.verify_tls = false;
            }

            let report = if deep {
                let mut target = config.crawl.clone();
                target.seed_url = url;
                if let Some(depth) = depth {
                    target.max_depth = depth;
                }
                if let Some(pages) = pages {
                    target.max_pages = pages;
                }
                if insecure {
                    target.verify_tls = false;
                }
                run_assessment(&target, &config.filter, &options).await?
            } else {
                run_security_scan(&url, &options).await?
            };

            info!(
                "Scan finished: {} findings, score {} ({})",
                report.findings.len(),
                report.overall_score,
                report.risk_level.as_str()
            );

            let format = ReportFormat::from_str_opt(&format).ok_or_else(|| {
                siteguard::SiteguardError::Config(format!("unknown report format '{}'", format))
            })?;
            match output {
                Some(path) => write_report(&report, format, &path).await?,
                None => println!("{}", render_report(&report, format)?),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        error!("{}", e);
        exit(1);
    }
}
