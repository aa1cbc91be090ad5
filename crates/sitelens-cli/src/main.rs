use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitelens_cli::{
    REPORT_FILE, RunOutput, load_catalog, load_config, load_pages, run_pipeline, write_json,
    write_outputs,
};
use sitelens_core::{SeoMonitor, SitemapGenerator};

#[derive(Parser)]
#[command(name = "sitelens", version, about = "Generate SEO metadata, sitemaps and health reports for a page catalog")]
struct Cli {
    /// Configuration file (sitelens.toml); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the catalog from a TOML source and write every output
    Build {
        /// Catalog source with [[services]], [[locations]], [[posts]] and [[pages]]
        catalog: PathBuf,
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,
    },
    /// Process an existing pages.json and write every output
    Process {
        pages: PathBuf,
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,
    },
    /// Write a health report for a pages.json without changing it
    Report {
        pages: PathBuf,
        /// Report file; printed to stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Check a sitemap.xml; exits non-zero when it is invalid
    ValidateSitemap { file: PathBuf },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Build { catalog, out } => {
            let catalog = load_catalog(&catalog, &mut config)?;
            let output = run_pipeline(&config, catalog.records());
            write_outputs(&config, &output, &out)?;
            print_summary(&output, &out);
        }
        Command::Process { pages, out } => {
            let records = load_pages(&pages)?;
            let output = run_pipeline(&config, &records);
            write_outputs(&config, &output, &out)?;
            print_summary(&output, &out);
        }
        Command::Report { pages, out } => {
            let records = load_pages(&pages)?;
            let report = SeoMonitor::new(&config).generate_seo_report(&records);
            match out {
                Some(path) => {
                    write_json(&path, &report)?;
                    println!(
                        "Wrote {} ({} pages, average score {:.1})",
                        path.display(),
                        report.pages.len(),
                        report.average_score
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Command::ValidateSitemap { file } => {
            let xml = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read sitemap {}", file.display()))?;
            let validation = SitemapGenerator::new(&config).validate_sitemap(&xml);
            if !validation.valid {
                for error in &validation.errors {
                    eprintln!("{}: {}", file.display(), error);
                }
                return Ok(ExitCode::FAILURE);
            }
            println!("{}: valid ({} URLs)", file.display(), validation.url_count);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_summary(output: &RunOutput, out: &std::path::Path) {
    let pipeline = &output.pipeline;
    println!(
        "Wrote {} pages to {} (average score {:.1}, {} issues, report in {})",
        output.pages.len(),
        out.display(),
        output.report.average_score,
        output.report.total_issues,
        REPORT_FILE
    );
    if !pipeline.rejected.is_empty() {
        println!("  {} records passed through unprocessed", pipeline.rejected.len());
    }
    if !pipeline.links.failed_pages.is_empty() {
        println!(
            "  {} pages are short of related links",
            pipeline.links.failed_pages.len()
        );
    }
    if !pipeline.content.failed_pages.is_empty() {
        println!(
            "  {} pages failed content checks",
            pipeline.content.failed_pages.len()
        );
    }
}
