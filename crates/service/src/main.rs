use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use multilens_core::form::Upload;
use multilens_service::{AnalysisError, AnalysisOutput, Analyzer, InferenceDispatch};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "multilens", version, about = "Run one hosted-model analysis and print the result")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate text between a supported language pair.
    Translate {
        #[arg(long, default_value = "English")]
        from: String,
        #[arg(long, default_value = "French")]
        to: String,
        text: String,
    },
    /// Detect the dominant emotion in a text.
    Sentiment { text: String },
    /// Extract printed text from a png/jpg image.
    Ocr { file: PathBuf },
    /// Transcribe a wav/mp3 recording.
    Transcribe { file: PathBuf },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl CliError {
    /// 2 for input the form would reject, 1 for anything else.
    fn exit_status(&self) -> u8 {
        match self {
            CliError::Analysis(err) if err.is_validation() => 2,
            _ => 1,
        }
    }
}

fn read_upload(path: &Path) -> Result<Upload, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Upload::new(file_name, bytes))
}

fn run<D: InferenceDispatch>(
    analyzer: &Analyzer<D>,
    command: Command,
) -> Result<AnalysisOutput, CliError> {
    let output = match command {
        Command::Translate { from, to, text } => analyzer.translate_named(&from, &to, &text)?,
        Command::Sentiment { text } => analyzer.analyze_sentiment(&text)?,
        Command::Ocr { file } => analyzer.extract_image_text(Some(&read_upload(&file)?))?,
        Command::Transcribe { file } => analyzer.transcribe_audio(Some(&read_upload(&file)?))?,
    };
    Ok(output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    multilens_service::portable::bootstrap_current_process();

    let analyzer = Analyzer::from_env();
    match run(&analyzer, cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let CliError::Read { path, source } = &err {
                log::warn!("event=upload_read_failed path={} err={}", path.display(), source);
            }
            eprintln!("{err}");
            ExitCode::from(err.exit_status())
        }
    }
}
