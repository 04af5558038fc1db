use anyhow::{Context, Result};
use clap::Parser;
use dupscan::cli::{Cli, Commands};
use dupscan::config::DetectionConfig;
use dupscan::core::ast::ParsedFile;
use dupscan::io::output::{JsonWriter, MarkdownWriter, OutputWriter};
use dupscan::io::OutputFormat;
use dupscan::pipeline::DuplicateDetector;
use std::fs;
use std::io::Read;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            format,
            output,
            config,
            threshold,
            min_pattern_size,
            structural_weight,
            token_weight,
            max_size_ratio,
            shard_cap,
            no_parallel,
        } => {
            let mut detection = load_config(config.as_deref())?;
            apply_overrides(
                &mut detection,
                threshold,
                min_pattern_size,
                structural_weight,
                token_weight,
                max_size_ratio,
                shard_cap,
                no_parallel,
            );

            let files = read_corpus(&input)?;
            let detector = DuplicateDetector::new(detection)?;
            let report = detector.run(&files)?;

            write_report(&report, format, output.as_deref())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<DetectionConfig> {
    match path {
        Some(path) => {
            let raw = dupscan::io::read_file(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            Ok(DetectionConfig::from_toml_str(&raw)?)
        }
        None => Ok(DetectionConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_overrides(
    config: &mut DetectionConfig,
    threshold: Option<f64>,
    min_pattern_size: Option<usize>,
    structural_weight: Option<f64>,
    token_weight: Option<f64>,
    max_size_ratio: Option<f64>,
    shard_cap: Option<usize>,
    no_parallel: bool,
) {
    if let Some(value) = threshold {
        config.similarity_threshold = value;
    }
    if let Some(value) = min_pattern_size {
        config.min_pattern_size = value;
    }
    if let Some(value) = structural_weight {
        config.structural_weight = value;
    }
    if let Some(value) = token_weight {
        config.token_weight = value;
    }
    if let Some(value) = max_size_ratio {
        config.max_size_ratio = value;
    }
    if let Some(value) = shard_cap {
        config.category_shard_cap = Some(value);
    }
    if no_parallel {
        config.parallel = false;
    }
}

/// Read the parsed corpus from a file, or from stdin when the path is `-`.
fn read_corpus(input: &Path) -> Result<Vec<ParsedFile>> {
    let raw = if input == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read corpus from stdin")?;
        buffer
    } else {
        dupscan::io::read_file(input)
            .with_context(|| format!("failed to read corpus {}", input.display()))?
    };
    serde_json::from_str(&raw).context("corpus is not valid parsed-file JSON")
}

fn write_report(
    report: &dupscan::core::DetectionReport,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer: Box<dyn OutputWriter> = match format {
                OutputFormat::Json => Box::new(JsonWriter::new(file)),
                OutputFormat::Markdown => Box::new(MarkdownWriter::new(file)),
                // Terminal colors are pointless in a file; fall back to markdown.
                OutputFormat::Terminal => Box::new(MarkdownWriter::new(file)),
            };
            writer.write_results(report)
        }
        None => dupscan::io::create_writer(format).write_results(report),
    }
}
