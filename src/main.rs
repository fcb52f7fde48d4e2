use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sales_pipeline::{
    logging, DataGenerator, RunReport, RunSummary, SalesPipeline, SqliteStore,
};

#[derive(Parser)]
#[command(name = "sales-pipeline")]
#[command(about = "Batch ETL pipeline for retail sales data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic sales CSV with planted quality issues
    Generate {
        /// Output CSV path
        #[arg(long, default_value = "sales_data.csv")]
        output: PathBuf,
        /// Number of rows to generate
        #[arg(long, default_value_t = 4000)]
        rows: usize,
        /// RNG seed for reproducible batches
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Run the full pipeline over a CSV file
    Run {
        /// Input CSV path
        #[arg(long, default_value = "sales_data.csv")]
        input: PathBuf,
        /// SQLite database path
        #[arg(long, default_value = "sales_pipeline.db")]
        db: PathBuf,
    },
    /// Print the report for a run (latest by default)
    Report {
        /// SQLite database path
        #[arg(long, default_value = "sales_pipeline.db")]
        db: PathBuf,
        /// Run id to report on
        #[arg(long)]
        run_id: Option<String>,
    },
}

fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { output, rows, seed } => {
            let count = DataGenerator::new(rows, seed)
                .write_csv(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("✓ Generated {} sales records at {}", count, output.display());
        }
        Commands::Run { input, db } => {
            let store = SqliteStore::open(&db)
                .with_context(|| format!("Failed to open database {}", db.display()))?;
            let pipeline = SalesPipeline::new(&store);
            // A FAILED run still exits 0: the summary is the product
            let summary = pipeline.run_from_csv(&input);
            print_summary(&summary);
        }
        Commands::Report { db, run_id } => {
            let store = SqliteStore::open(&db)
                .with_context(|| format!("Failed to open database {}", db.display()))?;
            let run_id = match run_id {
                Some(run_id) => run_id,
                None => RunReport::latest_run(&store)?
                    .context("No runs recorded in this database yet")?,
            };
            let report = RunReport::load(&store, &run_id)?;
            print_report(&report);
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Run {} - {}", summary.run_id, summary.status.as_str());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Total records:     {}", summary.total_records);
    println!("✓ Clean records:     {}", summary.clean_records);
    println!("✓ Invalid records:   {}", summary.invalid_records);
    println!("✓ Duplicate records: {}", summary.duplicate_records);

    if !summary.failure_breakdown.is_empty() {
        println!("\nFailure breakdown:");
        for (rule, count) in &summary.failure_breakdown {
            println!("  {:24} {}", rule, count);
        }
    }

    if let Some(error) = &summary.error {
        println!("\n❌ Error: {}", error);
    }
}

fn print_report(report: &RunReport) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Report for run {}", report.run_id);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\nAnalytics summaries:");
    for summary in &report.summaries {
        println!(
            "  {:8} | {:28} | {} | revenue {:>12.2} | orders {:>6}",
            summary.region,
            summary.product,
            summary.calculation_date,
            summary.total_revenue,
            summary.total_orders
        );
    }

    println!("\nValidation breakdown:");
    for (control, counts) in &report.validation {
        println!(
            "  {:24} passed {:>6}  failed {:>6}",
            control, counts.passed, counts.failed
        );
    }

    println!("\nExceptions by category:");
    for (category, count) in &report.exception_counts {
        println!("  {:24} {}", category, count);
    }

    println!("\nAudit trail:");
    for event in &report.audit_trail {
        println!(
            "  {} | {:22} | {:>6} | {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.event_type,
            event.record_count,
            event.description
        );
    }
}
