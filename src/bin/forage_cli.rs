use clap::{Args, Parser, Subcommand};
use forage_production_service::config::Config;
use forage_production_service::export::ExportedFile;
use forage_production_service::services::{
    export_production, export_slopes, export_template, ingest_batch_with_progress, BatchReport,
    DatasetKind, UploadedFile,
};
use forage_production_service::session::Session;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "forage-cli")]
#[command(about = "Build biomass sampling templates and forage production estimates from Comparative Yield exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the blank biomass sampling template from survey exports
    Template {
        #[command(flatten)]
        yields: YieldFiles,

        /// Where to write the template workbook
        #[arg(long, default_value = "biomass_sampling_template.xlsx")]
        output: PathBuf,
    },
    /// Calibrate per-KA slopes and estimate production (lbs/acre)
    Production {
        #[command(flatten)]
        yields: YieldFiles,

        /// Filled calibration workbook(s); the first sheet of each is read
        #[arg(long = "calibration-file", required = true, num_args = 1..)]
        calibration_files: Vec<PathBuf>,

        /// Where to write the production workbook
        #[arg(long, default_value = "forage_production.xlsx")]
        output: PathBuf,

        /// Also write the fitted slope table
        #[arg(long)]
        slopes_output: Option<PathBuf>,

        /// Survey column averaged per site visit
        #[arg(long, env = "YIELD_VALUE_COLUMN")]
        yield_value_column: Option<String>,
    },
}

#[derive(Args)]
struct YieldFiles {
    /// Survey export workbook(s) containing a "Comparative Yield" sheet
    #[arg(long = "yield-file", required = true, num_args = 1..)]
    yield_files: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut session = Session::new();

    match cli.command {
        Command::Template { yields, output } => {
            load(&mut session, DatasetKind::Yield, &yields.yield_files)?;

            let result = export_template(&mut session);
            println!("{}", session.status());
            write_file(&output, result?)?;
        }
        Command::Production {
            yields,
            calibration_files,
            output,
            slopes_output,
            yield_value_column,
        } => {
            let column = yield_value_column.unwrap_or_else(|| Config::from_env().yield_value_column);

            load(&mut session, DatasetKind::Yield, &yields.yield_files)?;
            load(&mut session, DatasetKind::Calibration, &calibration_files)?;

            if let Some(path) = slopes_output {
                let result = export_slopes(&mut session);
                println!("{}", session.status());
                write_file(&path, result?)?;
            }

            let result = export_production(&mut session, &column);
            println!("{}", session.status());
            let export = result?;
            write_file(&output, export.file)?;

            for ka in &export.missing_calibration {
                println!("  ⚠ no calibration for KA {ka}");
            }
        }
    }

    Ok(())
}

/// Read every file, then ingest them as one batch
fn load(
    session: &mut Session,
    kind: DatasetKind,
    paths: &[PathBuf],
) -> Result<BatchReport, Box<dyn std::error::Error>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
        files.push(UploadedFile::new(display_name(path), bytes));
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let report = ingest_batch_with_progress(session, kind, files, |name| {
        pb.set_message(name.to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();

    println!("{}", report.status);
    if let Some(e) = &report.error {
        error!("{} batch aborted: {}", kind, e);
        return Err(e.clone().into());
    }
    info!("{} batch: {} rows", kind, report.rows_added);
    Ok(report)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_file(path: &Path, file: ExportedFile) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, &file.bytes)?;
    println!("✓ Wrote {} rows to {}", file.row_count, path.display());
    Ok(())
}
