//! woodpost command line
//!
//! Reads a job exported by the CAD host, runs one postprocessor over it and
//! writes every produced file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;
use tracing::{error, info};

use woodpost::{init_logging, Job, PostConfig, PostError, PostProcessorType};

#[derive(Parser)]
#[command(name = "woodpost")]
#[command(about = "Turn a CNC woodworking job into machine programs", long_about = None)]
struct Cli {
    /// Job description exported by the host (JSON)
    job: PathBuf,

    /// Output format: gcode, format4, ardis, xml-dump or json-dump
    #[arg(short, long, default_value = "gcode")]
    post: PostProcessorType,

    /// TOML file with output settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving the generated files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the generated files instead of writing them
    #[arg(long)]
    stdout: bool,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> woodpost::Result<()> {
    let config = match &cli.config {
        Some(path) => PostConfig::load_from_file(path)?,
        None => PostConfig::default(),
    };

    let source = fs::read_to_string(&cli.job)?;
    let job = match Job::from_json_str(&source) {
        Ok(job) => job,
        Err(PostError::Json(err)) => {
            report_json_error(&cli.job, &source, &err);
            return Err(PostError::Json(err));
        }
        Err(err) => return Err(err),
    };

    let processor = cli.post.get_processor(&config);
    info!(post = processor.name(), clampings = job.clampings.len(), "postprocessing");
    let outputs = processor.process(&job)?;

    for output in outputs {
        if cli.stdout {
            println!("// {}", output.file_name());
            print!("{}", output.content);
            continue;
        }
        let path = cli.out_dir.join(output.file_name());
        fs::write(&path, &output.content)?;
        info!(logical_name = %output.logical_name, "generated {}", path.display());
    }
    Ok(())
}

/// Point at the offending spot of the job file.
fn report_json_error(path: &Path, source: &str, err: &serde_json::Error) {
    let name = path.display().to_string();
    let offset = char_offset(source, err.line(), err.column());
    let report = Report::build(ReportKind::Error, name.as_str(), offset)
        .with_message("could not parse job")
        .with_label(
            Label::new((name.as_str(), offset..offset + 1))
                .with_message(err.to_string())
                .with_color(Color::Red),
        )
        .finish();
    let _ = report.eprint((name.as_str(), Source::from(source)));
}

/// Character offset of a 1-based line and column.
fn char_offset(source: &str, line: usize, column: usize) -> usize {
    let before: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(|l| l.chars().count())
        .sum();
    before + column.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_offset() {
        let source = "{\n  \"Clampings\": [\n  oops\n}";
        assert_eq!(char_offset(source, 1, 1), 0);
        assert_eq!(char_offset(source, 3, 3), 21);
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::parse_from(["woodpost", "job.json", "--post", "ardis", "--out-dir", "out", "--stdout"]);
        assert_eq!(cli.post, PostProcessorType::Ardis);
        assert_eq!(cli.out_dir, PathBuf::from("out"));
        assert!(cli.stdout);
        assert!(cli.config.is_none());

        let cli = Cli::parse_from(["woodpost", "job.json"]);
        assert_eq!(cli.post, PostProcessorType::GcodeMach3);
    }
}
