use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use survey_merge::config::MergeConfig;
use survey_merge::logging;
use survey_merge::pipeline::{Pipeline, PipelineResult};
use tracing::error;

#[derive(Parser)]
#[command(name = "survey_merge")]
#[command(about = "Merge survey waves on rid and write a de-identified combined CSV")]
#[command(version = "0.1.0")]
struct Cli {
    /// Directory holding the input surveys; the output is written here too
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Output file name, relative to the data directory
    #[arg(long)]
    output: Option<String>,

    /// Optional TOML config overriding file names and the privacy policy
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> anyhow::Result<MergeConfig> {
    let mut config = MergeConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(output) = &cli.output {
        config.output_file = output.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_summary(result: &PipelineResult, config: &MergeConfig) {
    for source in &result.sources {
        let name = source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.path.display().to_string());
        match source.rows_loaded {
            Some(rows) => println!("Loaded {} rows from {}", rows, name),
            None => println!("Optional file not found: {}", source.path.display()),
        }
        if let Some(stats) = &source.merge {
            println!(
                "   merged on {}: {} matched, {} unmatched, {} fields filled",
                config.key_column, stats.matched, stats.unmatched, stats.fields_filled
            );
        }
    }

    println!(
        "Wrote {} rows to {}",
        result.rows_written,
        result.output_file.display()
    );

    let privacy = &config.privacy;
    println!("Anonymization applied:");
    println!(
        "  - {}: hashed from {} (stable per respondent)",
        privacy.id_column, config.key_column
    );
    println!("  - Removed: {}", privacy.drop_columns.join(", "));
    println!(
        "  - Redacted (set to {}): {}",
        privacy.redaction_marker,
        privacy.redact_columns.join(", ")
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Keep the guard alive so file logs are flushed on exit
    let _guard = logging::init_logging(config.log_dir.as_deref());

    let pipeline = Pipeline::new(config);
    let result = match pipeline.run() {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(e).context("Survey merge aborted; no output written");
        }
    };

    print_summary(&result, pipeline.config());
    Ok(())
}
