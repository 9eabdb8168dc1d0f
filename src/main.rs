use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use curator_web::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "curator", version)]
#[command(about = "Keep track of sources and their infos")]
struct Cli {
    /// SQLite connection string, e.g. `sqlite:curator.db`
    #[arg(long)]
    database_url: Option<String>,

    /// Address the HTTP server listens on
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory served under /static
    #[arg(long)]
    static_dir: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Also write logs to a daily rotated file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the environment.
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(dir) = &self.static_dir {
            config.static_dir = dir.clone();
        }
    }
}

fn init_tracing(format: LogFormat, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .flatten_event(true)
            .with_span_list(false)
            .boxed(),
    };

    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "curator.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_format, cli.log_dir.as_deref());

    let mut config = Config::from_env().context("Failed to read configuration")?;
    cli.apply(&mut config);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_format = ?cli.log_format,
        log_dir = ?cli.log_dir,
        request_timeout_secs = config.request_timeout_secs,
        "Configuration resolved"
    );

    if let Err(err) = curator_web::serve(config).await {
        tracing::error!(error = %err, "Curator stopped with an error");
        return Err(err).context("Curator stopped with an error");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "curator",
            "--database-url",
            "sqlite::memory:",
            "-b",
            "127.0.0.1:9000",
            "--log-format",
            "json",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.static_dir, Config::default().static_dir);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::try_parse_from(["curator"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.bind_address, "0.0.0.0:3005");
        assert_eq!(cli.log_format, LogFormat::Text);
        assert!(cli.log_dir.is_none());
    }
}
