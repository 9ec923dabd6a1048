//! CLI tool for auditing the licenses of Go dependencies

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use gopath_license_audit::{
    audit_project, load_policy, AuditConfig, AuditReport, DependencyReport, InputSource,
    ListerKind,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Column at which verdict labels start
const LABEL_COLUMN: usize = 70;

#[derive(Parser)]
#[command(name = "license-audit")]
#[command(
    about = "Check the licenses of a Go project's dependencies against a policy",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to the Go project to audit
    #[arg(short = 'p', long, default_value = ".")]
    project_path: PathBuf,

    /// Policy file (YAML, or TOML with a .toml extension)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Read dependencies from a Godeps.json-style manifest ("-" for stdin)
    #[arg(long, value_name = "PATH", conflicts_with = "packages")]
    manifest: Option<String>,

    /// Read import paths, one per line ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    packages: Option<String>,

    /// Additional license file name to look for (can be specified multiple times)
    #[arg(long = "license-file", value_name = "NAME")]
    license_files: Vec<String>,

    /// Go executable used to discover dependencies
    #[arg(long = "go", value_name = "PROGRAM", default_value = "go")]
    go_program: PathBuf,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every dependency against the license policy (exit code based)
    Check,

    /// Generate a detailed audit report
    Report {
        /// Output format
        #[arg(short = 'f', long, default_value = "json")]
        format: ReportFormat,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// List the dependencies that would be audited
    List,
}

#[derive(Clone, Debug)]
enum ReportFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let lister = lister_kind(&cli).build();

    let report_target = match cli.command {
        Commands::List => {
            match lister.list_dependencies() {
                Ok(deps) => deps.iter().for_each(|dep| println!("{}", dep)),
                Err(e) => fatal(e),
            }
            return;
        }
        Commands::Check => None,
        Commands::Report { format, output } => Some((format, output)),
    };

    // Load policy
    let policy = match load_policy(&cli.project_path, cli.config.as_deref()) {
        Ok(policy) => policy,
        Err(e) => fatal(e),
    };

    if policy.is_none() {
        eprintln!(
            "{} no license policy found, licenses are reported without a verdict",
            "Note:".yellow().bold()
        );
    }

    let config = cli
        .license_files
        .iter()
        .fold(AuditConfig::builder().policy(policy), |builder, name| {
            builder.license_file(name.clone())
        })
        .build();

    // Run audit
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Scanning dependencies for license problems...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = audit_project(&cli.project_path, lister.as_ref(), &config);

    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => fatal(e),
    };

    match report_target {
        None => display_check(&report),
        Some((format, output)) => {
            if let Err(e) = write_report(&report, &format, output.as_deref()) {
                fatal(format!("{:#}", e));
            }
        }
    }

    if !report.passed() {
        process::exit(1);
    }
}

fn lister_kind(cli: &Cli) -> ListerKind {
    if let Some(manifest) = &cli.manifest {
        ListerKind::Manifest(InputSource::from_arg(manifest))
    } else if let Some(packages) = &cli.packages {
        ListerKind::PackageList(InputSource::from_arg(packages))
    } else {
        ListerKind::Query {
            project_dir: cli.project_path.clone(),
            go_program: cli.go_program.clone(),
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn fatal(err: impl Display) -> ! {
    eprintln!("{} {}", "fatal:".red().bold(), err);
    process::exit(1);
}

fn display_check(report: &AuditReport) {
    for dep in &report.dependencies {
        println!("{}", check_line(dep, report.policy_applied));
    }

    let summary = &report.summary;
    println!();
    if !report.policy_applied {
        println!("Scanned {} dependencies", summary.total_dependencies);
    } else if report.passed() {
        println!(
            "{} all {} dependencies check out",
            "Success:".green().bold(),
            summary.total_dependencies
        );
    } else {
        println!(
            "{} {} of {} dependencies failed \
             ({} contraband, {} borderline, {} unknown, {} without license)",
            "Failed:".red().bold(),
            summary.failing,
            summary.total_dependencies,
            summary.banned,
            summary.marginal,
            summary.unknown,
            summary.no_license
        );
    }

    if summary.errors > 0 {
        println!(
            "{} {} license file(s) could not be read",
            "Error:".red().bold(),
            summary.errors
        );
    }
}

fn check_line(dep: &DependencyReport, policy_applied: bool) -> String {
    let padding = " ".repeat(LABEL_COLUMN.saturating_sub(dep.import_path.len()).max(1));
    let label = if policy_applied {
        dep.verdict.label().color(dep.verdict.color())
    } else {
        dep.license.as_str().white()
    };

    format!("{}{}{}", dep.import_path.white(), padding, label)
}

fn write_report(
    report: &AuditReport,
    format: &ReportFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let content = match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to serialize report")?
        }
        ReportFormat::Markdown => generate_markdown_report(report),
    };

    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("Report written to: {}", path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}

fn generate_markdown_report(report: &AuditReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("# License Audit Report: {}\n\n", report.project_path));
    md.push_str(&format!("**Generated:** {}\n\n", report.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str(&format!(
        "- Total dependencies: {}\n",
        report.summary.total_dependencies
    ));
    if report.policy_applied {
        md.push_str(&format!("- Allowed: {}\n", report.summary.allowed));
        md.push_str(&format!("- Banned: {}\n", report.summary.banned));
        md.push_str(&format!("- Marginal: {}\n", report.summary.marginal));
        md.push_str(&format!("- Unknown: {}\n", report.summary.unknown));
        md.push_str(&format!("- No license: {}\n", report.summary.no_license));
    } else {
        md.push_str("- No license policy applied\n");
    }
    md.push_str(&format!("- Unreadable licenses: {}\n\n", report.summary.errors));

    md.push_str("## Dependencies\n\n");
    md.push_str("| Import path | License | Verdict | License file |\n");
    md.push_str("|-------------|---------|---------|--------------|\n");

    for dep in &report.dependencies {
        let verdict = if report.policy_applied {
            dep.verdict.to_string()
        } else {
            "-".to_string()
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            dep.import_path,
            dep.license,
            verdict,
            dep.license_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        ));
    }

    md
}
