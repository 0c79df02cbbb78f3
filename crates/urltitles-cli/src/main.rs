//! urltitles CLI - summarize URLs from the command line or relay IRC traffic

mod irc;

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use urltitles::{FetchReport, UrlTitles, UrlTitlesBuilder};

/// Output format for summarize subcommand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The reply line only
    #[default]
    Text,
    /// Fetch metadata and reply as JSON
    Json,
}

/// urltitles - one-line summaries of pasted URLs
#[derive(Parser, Debug)]
#[command(name = "urltitles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Custom User-Agent
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Nick fragment to ignore (repeatable, replaces the default list)
    #[arg(long = "ignore", global = true)]
    ignore: Vec<String>,

    /// Attempts per URL, retries included
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Answer private messages as well as channel messages
    #[arg(long, global = true)]
    private: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch one URL and print its summary
    Summarize {
        /// URL to summarize
        url: String,

        /// Output format
        #[arg(long, short, default_value = "text")]
        output: OutputFormat,
    },
    /// Read raw IRC lines on stdin, write PRIVMSG replies on stdout
    Relay,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let bot = match builder_from(&cli).build() {
        Ok(bot) => bot,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Summarize { url, output } => run_summarize(&bot, &url, output).await,
        Commands::Relay => {
            if let Err(e) = irc::run_relay(Arc::new(bot)).await {
                if e.kind() != io::ErrorKind::BrokenPipe {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn builder_from(cli: &Cli) -> UrlTitlesBuilder {
    let mut builder = UrlTitles::builder().allow_private_messages(cli.private);

    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(attempts) = cli.max_retries {
        builder = builder.max_retries(attempts);
    }
    if !cli.ignore.is_empty() {
        builder = builder.ignore_nicks(cli.ignore.iter().cloned());
    }

    builder
}

async fn run_summarize(bot: &UrlTitles, url: &str, output: OutputFormat) {
    match bot.summarizer().report(url).await {
        Ok(report) => writeln_safe(&format_report(&report, output)),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn format_report(report: &FetchReport, output: OutputFormat) -> String {
    match output {
        OutputFormat::Text => report.summary.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_else(|e| {
            eprintln!("Error serializing report: {}", e);
            std::process::exit(1);
        }),
    }
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
