//! fifo-cache-inspect - look inside a FIFO response cache directory
//!
//! Reads `CACHE_DIR`, `CACHE_CAPACITY` and `DEBUG` from the environment.
//!
//! ```text
//! fifo-cache-inspect keys         live keys, oldest first
//! fifo-cache-inspect get <key>    cached JSON for a key (exit 1 on miss)
//! fifo-cache-inspect file <key>   entry path a key maps to
//! ```

mod error;

use crate::error::Result;
use clap::{Parser, Subcommand};
use file_fifo_cache::{entry_file_name, CacheConfig, FileFifoCache};
use std::io::Write;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Inspect a FIFO response cache directory
#[derive(Debug, Parser)]
#[command(name = "fifo-cache-inspect", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// List live keys, oldest first
    Keys,
    /// Print the cached JSON for a key (exit 1 on miss)
    Get {
        /// Cache key, usually the full request URL
        key: String,
    },
    /// Print the entry path a key maps to
    File {
        /// Cache key, usually the full request URL
        key: String,
    },
}

/// Run a command, returning false when `get` missed
async fn run(cache: &FileFifoCache, command: &Command, out: &mut impl Write) -> Result<bool> {
    match command {
        Command::Keys => {
            for (position, key) in cache.keys().await.iter().enumerate() {
                writeln!(out, "{:>3}  {}  {}", position, entry_file_name(key), key)?;
            }
            Ok(true)
        }
        Command::Get { key } => match cache.read::<serde_json::Value>(key).await {
            Some(value) => {
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
                Ok(true)
            }
            None => Ok(false),
        },
        Command::File { key } => {
            let path = cache.directory().join(entry_file_name(key));
            writeln!(out, "{}", path.display())?;
            Ok(true)
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let cache_level = if verbose {
        "file_fifo_cache=debug"
    } else {
        "file_fifo_cache=info"
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive("fifo_cache_inspect=info".parse()?)
        .add_directive(cache_level.parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = CacheConfig::from_env();
    init_tracing(config.verbose)?;

    let cache = FileFifoCache::new(config);
    info!(
        directory = ?cache.directory(),
        capacity = cache.capacity(),
        "Opened cache"
    );

    let found = run(&cache, &cli.command, &mut std::io::stdout().lock()).await?;
    if !found {
        if let Command::Get { key } = &cli.command {
            eprintln!("miss: {}", key);
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> std::result::Result<Command, clap::Error> {
        let argv = std::iter::once("fifo-cache-inspect").chain(args.iter().copied());
        Cli::try_parse_from(argv).map(|cli| cli.command)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse(&["keys"]).unwrap(), Command::Keys);
        assert_eq!(
            parse(&["get", "https://gutendex.com/books"]).unwrap(),
            Command::Get {
                key: "https://gutendex.com/books".to_string()
            }
        );
        assert_eq!(
            parse(&["file", "k"]).unwrap(),
            Command::File {
                key: "k".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        use clap::error::ErrorKind;

        assert!(parse(&[]).is_err());
        assert_eq!(
            parse(&["get"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse(&["purge"]).unwrap_err().kind(),
            ErrorKind::InvalidSubcommand
        );
        assert_eq!(
            parse(&["keys", "extra"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert_eq!(parse(&["get", "a", "b"]).unwrap_err().exit_code(), 2);
    }

    #[tokio::test]
    async fn test_run_keys_lists_oldest_first() {
        let dir = tempdir().unwrap();
        let cache = FileFifoCache::new(CacheConfig::new(dir.path()).with_capacity(2));
        cache.write("first", &json!(1)).await;
        cache.write("second", &json!(2)).await;
        cache.write("third", &json!(3)).await;

        let mut out = Vec::new();
        assert!(run(&cache, &Command::Keys, &mut out).await.unwrap());
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("second"));
        assert!(lines[1].ends_with("third"));
        assert!(lines[0].contains(&entry_file_name("second")));
    }

    #[tokio::test]
    async fn test_run_get_hit_and_miss() {
        let dir = tempdir().unwrap();
        let cache = FileFifoCache::new(CacheConfig::new(dir.path()));
        cache.write("k", &json!({ "count": 3 })).await;

        let mut out = Vec::new();
        assert!(run(&cache, &Command::Get { key: "k".into() }, &mut out).await.unwrap());
        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, json!({ "count": 3 }));

        let mut out = Vec::new();
        assert!(!run(&cache, &Command::Get { key: "absent".into() }, &mut out).await.unwrap());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_run_file_prints_entry_path() {
        let dir = tempdir().unwrap();
        let cache = FileFifoCache::new(CacheConfig::new(dir.path()));

        let mut out = Vec::new();
        run(&cache, &Command::File { key: "k".into() }, &mut out).await.unwrap();
        let expected = dir.path().join(entry_file_name("k"));
        assert_eq!(String::from_utf8(out).unwrap().trim_end(), expected.display().to_string());
    }
}
