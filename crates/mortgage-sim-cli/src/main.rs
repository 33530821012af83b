mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::batch::BatchArgs;
use commands::metrics::{IrrArgs, NpvArgs};
use commands::rates::ConvertRateArgs;
use commands::schedule::{ReportArgs, ScheduleArgs};

/// Mortgage amortization schedules and loan cost metrics
#[derive(Parser)]
#[command(
    name = "msim",
    version,
    about = "Mortgage amortization schedules and loan cost metrics",
    long_about = "A CLI for simulating French-method mortgage schedules with decimal \
                  precision. Supports total and partial grace periods, rate curves, \
                  insurance and fee overlays, and NPV / IRR / TCEA metrics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an amortization schedule with costs and metrics
    Schedule(ScheduleArgs),
    /// Summarise a simulation as a loan report
    Report(ReportArgs),
    /// Convert an annual rate into a period rate
    ConvertRate(ConvertRateArgs),
    /// Net present value of a cash-flow vector
    Npv(NpvArgs),
    /// Internal rate of return of a cash-flow vector
    Irr(IrrArgs),
    /// Simulate several loans in parallel
    Batch(BatchArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Report(args) => commands::schedule::run_report(args),
        Commands::ConvertRate(args) => commands::rates::run_convert_rate(args),
        Commands::Npv(args) => commands::metrics::run_npv(args),
        Commands::Irr(args) => commands::metrics::run_irr(args),
        Commands::Batch(args) => commands::batch::run_batch(args),
        Commands::Version => {
            println!("msim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
