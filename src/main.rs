//*** START FILE: src/main.rs ***//
use archive_qa::archive::HttpContentFetcher;
use archive_qa::completion::ChatCompletionClient;
use archive_qa::config::{load_config, Config};
use archive_qa::document::{builder_for, DocumentFormat};
use archive_qa::error::{Error, Result};
use archive_qa::parsing::HtmlDialogueParser;
use archive_qa::pipeline::{write_output, PipelineDriver};
use archive_qa::records_io::load_records;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archive_qa")]
#[command(about = "Generate Q&A study documents from an online article archive")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch articles, generate Q&A pairs and write the document
    Run(RunArgs),
    /// Render a saved JSON record file without calling the model
    Render {
        /// JSON file written by `run --format json`
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: DocumentFormat,
    },
}

#[derive(Args)]
struct RunArgs {
    /// TOML config file (default: ./archive_qa.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of articles to process
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Speaker to generate for; repeatable. "All other speakers" selects unnamed speakers
    #[arg(short, long = "speaker")]
    speakers: Vec<String>,

    #[arg(long = "no-interviews")]
    no_interviews: bool,

    #[arg(long = "no-solo")]
    no_solo: bool,

    /// Article URL to process instead of discovering from the index; repeatable
    #[arg(short, long = "url")]
    urls: Vec<String>,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    format: Option<DocumentFormat>,
}

impl RunArgs {
    /// Command-line values override the file.
    fn apply(&self, config: &mut Config) {
        if let Some(limit) = self.limit {
            config.archive.article_limit = limit;
        }
        if !self.speakers.is_empty() {
            config.filters.speakers = self.speakers.clone();
        }
        if self.no_interviews {
            config.filters.include_interviews = false;
        }
        if self.no_solo {
            config.filters.include_solo_articles = false;
        }
        if let Some(format) = self.format {
            config.output.format = format;
            if self.output.is_none() {
                config.output.path.set_extension(format.extension());
            }
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

fn cmd_run(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let fetcher = HttpContentFetcher::new(&config.archive)?;
    let parser = HtmlDialogueParser::new(&config.parser)?;
    let service = ChatCompletionClient::new(&config.completion)?;
    let driver = PipelineDriver::new(&fetcher, &parser, &service, &config);

    let report = if args.urls.is_empty() {
        driver.run_from_index()?
    } else {
        driver.run(&args.urls)
    };

    write_output(&report.records, &config.output)?;
    println!(
        "Wrote {} Q&A pairs from {} article(s) to {}",
        report.records.len(),
        report.articles_processed,
        config.output.path.display()
    );
    Ok(())
}

fn cmd_render(input: &Path, output: &Path, format: DocumentFormat) -> Result<()> {
    let records = load_records(input)?;
    if records.is_empty() {
        return Err(Error::NothingProduced);
    }
    builder_for(format).build(&records, output)?;
    println!("Rendered {} Q&A pairs to {}", records.len(), output.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Render { input, output, format } => cmd_render(input, output, *format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

//*** END FILE: src/main.rs ***//
