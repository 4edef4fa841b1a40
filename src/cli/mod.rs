use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::logs;

#[derive(Parser, Debug)]
#[command(name = "logtail", version, about = "Tail and filter local log files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow a log file in real time
    Tail {
        /// Log file path
        #[arg(short, long, default_value = "./logs/app.log")]
        file: PathBuf,

        /// Number of trailing lines to show before following
        #[arg(short = 'n', long, default_value_t = 10)]
        lines: usize,

        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval: u64,
    },

    /// Filter a log file by keyword or regex
    Grep {
        /// Keyword or pattern to match
        keyword: String,

        /// Log file path
        #[arg(short, long, default_value = "./logs/app.log")]
        file: PathBuf,

        /// Ignore case when matching
        #[arg(short, long)]
        ignore_case: bool,

        /// Treat the keyword as a regular expression
        #[arg(long)]
        regex: bool,
    },

    /// Print the last N lines of a log file
    Last {
        /// Log file path
        #[arg(short, long, default_value = "./logs/app.log")]
        file: PathBuf,

        /// Number of lines to print
        #[arg(short = 'n', long, default_value_t = 10)]
        lines: usize,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Tail {
            file,
            lines,
            interval,
        } => {
            if interval == 0 {
                bail!("--interval must be greater than zero");
            }

            println!("Tailing {} (Ctrl+C to stop)", file.display());

            let mut stream = logs::tail_logs(&file, lines, Duration::from_millis(interval))
                .await
                .with_context(|| format!("Failed to tail {}", file.display()))?;

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        stream.close();
                        break;
                    }
                    line = stream.next_line() => match line {
                        Some(line) => println!("{line}"),
                        None => break,
                    },
                }
            }
        }
        Commands::Grep {
            keyword,
            file,
            ignore_case,
            regex,
        } => {
            let outcome = logs::filter_lines(&file, &keyword, ignore_case, regex)
                .with_context(|| format!("Failed to filter {}", file.display()))?;

            for line in &outcome.matches {
                println!("{line}");
            }

            let abs = std::fs::canonicalize(&file).unwrap_or(file);
            print!("{}", logs::format_summary(&outcome, &keyword, &abs));
        }
        Commands::Last { file, lines } => {
            let last = logs::read_last_lines(&file, lines)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            for line in &last {
                println!("{line}");
            }
        }
    }

    Ok(())
}
