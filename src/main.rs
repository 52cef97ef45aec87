//! Corvus - Reverse Identity Search CLI

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tabled::builder::Builder;
use tabled::settings::Style;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use corvus::catalog;
use corvus::config;
use corvus::http::{random_user_agent, HttpClient};
use corvus::models::{ProbeStatus, RunReport, SearchConfig, Token};
use corvus::probe::ProbeScheduler;
use corvus::report;

/// Corvus - Reverse search of usernames and emails across third-party sites
#[derive(Parser)]
#[command(name = "corvus", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one or more identity tokens across the site catalog
    Search {
        /// Usernames to search
        #[arg(short = 'u', long = "username")]
        usernames: Vec<String>,

        /// Emails to search
        #[arg(short = 'e', long = "email")]
        emails: Vec<String>,

        /// Path to the site catalog JSON file
        #[arg(long, default_value = "data/sites.json")]
        list: PathBuf,

        /// Maximum concurrent requests
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Maximum concurrent requests per host
        #[arg(long)]
        per_host: Option<usize>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Overall run deadline in seconds
        #[arg(long)]
        deadline: Option<u64>,

        /// Transport-failure retries per site
        #[arg(long)]
        retries: Option<u32>,

        /// Filter sites by category (e.g. "cat=social")
        #[arg(long)]
        filter: Option<String>,

        /// Exclude NSFW sites from the search
        #[arg(long)]
        no_nsfw: bool,

        /// HTTP/HTTPS proxy URL
        #[arg(long)]
        proxy: Option<String>,

        /// Custom headers (format: "Key: Value")
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Use a random browser User-Agent
        #[arg(long)]
        random_agent: bool,

        /// Generate a CSV with the results
        #[arg(long)]
        csv: bool,

        /// Generate a JSON with the results
        #[arg(long)]
        json: bool,

        /// Dump response content for found accounts
        #[arg(long)]
        dump: bool,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the sites in the catalog
    Sites {
        /// Path to the site catalog JSON file
        #[arg(long, default_value = "data/sites.json")]
        list: PathBuf,

        /// Filter sites by category
        #[arg(long)]
        filter: Option<String>,
    },

    /// Re-export a previous search's JSON report as CSV
    Report {
        /// Path to the JSON report file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "corvus_report.csv")]
        output: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "corvus=debug" } else { "corvus=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════╗
    ║  🐦 CORVUS v0.1.0                    ║
    ║  Reverse Identity Search             ║
    ╚═══════════════════════════════════════╝
    "#;
    println!("{}", banner.cyan());
}

fn print_report(report: &RunReport) {
    println!(
        "\n  {} {}",
        "Results for:".bold(),
        report.token.to_string().green()
    );

    for outcome in report.found() {
        println!(
            "  {} [{}] {}",
            "✔".green(),
            outcome.site_name.cyan(),
            outcome.url.bright_white()
        );
    }

    let statuses = [
        (ProbeStatus::Exists, "Found"),
        (ProbeStatus::NotFound, "Not found"),
        (ProbeStatus::Unknown, "Unknown"),
        (ProbeStatus::Error, "Error"),
    ];

    let mut builder = Builder::default();
    builder.push_record(["Status", "Count"]);
    for (status, label) in &statuses {
        builder.push_record([
            label.to_string(),
            report.count_by_status(*status).to_string(),
        ]);
    }
    builder.push_record(["Total".to_string(), report.outcomes.len().to_string()]);

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");

    if report.unresolved > 0 {
        println!(
            "  {} {} probes were cut short by the deadline or cancellation",
            "⚠".yellow(),
            report.unresolved
        );
    }
}

fn export_report(report: &RunReport, csv: bool, json: bool, dump: bool) {
    if !(csv || json || dump) {
        return;
    }
    let dir = report::save_directory(&report.token);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("  {} Could not create {}: {e}", "Error:".red().bold(), dir.display());
        return;
    }

    if csv {
        let path = dir.join(format!("{}.csv", report.token));
        if let Err(e) = report::csv::export(report, &path) {
            eprintln!("  {} CSV export failed: {e}", "Error:".red().bold());
        } else {
            println!("  {} {}", "CSV saved to:".bold(), path.display().to_string().green());
        }
    }
    if json {
        let path = dir.join(format!("{}.json", report.token));
        if let Err(e) = report::json::export(report, &path) {
            eprintln!("  {} JSON export failed: {e}", "Error:".red().bold());
        } else {
            println!("  {} {}", "JSON saved to:".bold(), path.display().to_string().green());
        }
    }
    if dump {
        match report::dump::dump_responses(report, &dir) {
            Ok(written) => {
                println!("  {} {written} responses dumped", "💾".bold());
            }
            Err(e) => eprintln!("  {} Dump failed: {e}", "Error:".red().bold()),
        }
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            usernames,
            emails,
            list,
            max_concurrent,
            per_host,
            timeout,
            deadline,
            retries,
            filter,
            no_nsfw,
            proxy,
            headers,
            random_agent,
            csv,
            json,
            dump,
            config: config_path,
            verbose,
        } => {
            init_tracing(verbose);
            print_banner();

            let mut search_config = if let Some(ref path) = config_path {
                config::load_config(path)?
            } else {
                let default_path = Path::new("config/default.toml");
                if default_path.exists() {
                    config::load_config(default_path)?
                } else {
                    SearchConfig::default()
                }
            };

            config::merge_cli_args(
                &mut search_config,
                max_concurrent,
                per_host,
                timeout,
                deadline,
                retries,
                proxy,
                filter,
                (!headers.is_empty()).then_some(headers),
            );
            if no_nsfw {
                search_config.no_nsfw = true;
            }
            if dump {
                search_config.dump = true;
            }
            if random_agent {
                search_config.user_agent = random_user_agent();
            }

            let mut tokens: Vec<Token> = Vec::new();
            tokens.extend(usernames.into_iter().map(Token::username));
            tokens.extend(emails.into_iter().map(Token::email));
            if tokens.is_empty() {
                eprintln!("  {} Either --username or --email is required", "Error:".red().bold());
                std::process::exit(1);
            }

            let sites = catalog::load_catalog(&list)?;
            let sites = catalog::apply_filters(sites, &search_config);

            println!(
                "  {} {}",
                "Tokens:".bold(),
                tokens
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
                    .green()
            );
            println!("  {} {}\n", "Sites:".bold(), sites.len().to_string().cyan());

            let client = HttpClient::from_config(&search_config)?;
            let dump = search_config.dump;
            let scheduler = ProbeScheduler::new(client.clone(), search_config);

            let cancel = CancellationToken::new();
            let ctrl_c_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\n  Interrupted, collecting partial results...");
                    ctrl_c_cancel.cancel();
                }
            });

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("  {spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message("Probing sites...");
            spinner.enable_steady_tick(Duration::from_millis(100));

            let reports = scheduler
                .run_many(tokens, Arc::new(sites), cancel)
                .await;

            spinner.finish_and_clear();

            for report in &reports {
                print_report(report);
                export_report(report, csv, json, dump);
            }

            println!(
                "\n  {} {}",
                "Total requests:".bold(),
                client.request_count().to_string().cyan()
            );
        }

        Commands::Sites { list, filter } => {
            init_tracing(false);
            print_banner();

            let config = SearchConfig {
                filter_category: filter,
                ..SearchConfig::default()
            };
            let sites = catalog::load_catalog(&list)?;
            let sites = catalog::apply_filters(sites, &config);

            let mut builder = Builder::default();
            builder.push_record(["Site", "Kind", "Method", "Category"]);
            for def in &sites {
                builder.push_record([
                    def.name.clone(),
                    def.kind.to_string(),
                    def.method.clone(),
                    def.category.clone().unwrap_or_default(),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{table}");
            println!("  {} sites", sites.len());
        }

        Commands::Report { input, output } => {
            init_tracing(false);
            print_banner();

            let report = report::json::load(&input)?;
            report::csv::export(&report, &output)?;
            print_report(&report);
            println!(
                "\n  {} {}",
                "Report saved to:".bold(),
                output.display().to_string().green()
            );
        }
    }

    Ok(())
}
