use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "minijavac", version, about = "The miniJava compiler")]
struct Cli {
    /// Source file path
    file: Option<PathBuf>,

    /// Output executable path
    #[arg(short, long, default_value = "a.out")]
    output: PathBuf,

    /// Also render errors with source excerpts on stderr
    #[arg(long)]
    pretty: bool,

    /// Log compiler phases to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN })
        .init();

    let Some(file) = cli.file else {
        println!("Error");
        return ExitCode::FAILURE;
    };

    match minijava::compile_file(&file, &cli.output) {
        Ok(()) => {
            println!("Success");
            ExitCode::SUCCESS
        }
        Err(reporter) => {
            let source = std::fs::read_to_string(&file).unwrap_or_default();
            println!("Error");
            for line in reporter.render_lines(&source) {
                println!("{line}");
            }
            if cli.pretty {
                let filename = file.to_string_lossy();
                for err in reporter.errors() {
                    if let Err(e) = minijava::diagnostics::render_error(&source, &filename, err) {
                        warn!("failed to render diagnostic: {e}");
                    }
                }
            }
            ExitCode::FAILURE
        }
    }
}
