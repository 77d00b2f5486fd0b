use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use battmon::{
    DEFAULT_BAUD_RATE, Error, Glyphs, Monitor, MonitorConfig, Renderer, Resolver, SerialChannel,
    SerialConfig, SystemPorts, list_endpoints,
};

/// battmon - battery and LED log monitor for ZMK keyboards
#[derive(Parser, Debug)]
#[command(name = "battmon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port (e.g. /dev/ttyACM0, COM3); discovered automatically if omitted
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baudrate: u32,

    /// List available serial ports and exit
    #[arg(short, long)]
    list: bool,

    /// Show every line instead of battery events only
    #[arg(long)]
    raw: bool,

    /// Use plain ASCII glyphs
    #[arg(long)]
    ascii: bool,

    /// Pause between polls when no data is pending, in milliseconds
    #[arg(long, default_value = "10")]
    poll_interval_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so they never mix with the telemetry on stdout
    let spec = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&spec))
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Builds the log filter from a `RUST_LOG` style spec, `warn` when empty.
fn log_filter(spec: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(spec)
}

fn report(err: &anyhow::Error) {
    eprintln!("❌ Error: {err:#}");
    if matches!(err.downcast_ref::<Error>(), Some(Error::NotFound { .. })) {
        eprintln!("💡 Make sure the keyboard is connected and running debug firmware");
    }
}

async fn run(args: Args) -> Result<()> {
    if args.list {
        return list();
    }

    let glyphs = if args.ascii {
        Glyphs::ascii()
    } else {
        Glyphs::default()
    };
    let config = MonitorConfig::new()
        .baud_rate(args.baudrate)
        .poll_interval(Duration::from_millis(args.poll_interval_ms))
        .raw(args.raw);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let mut channel = SerialChannel::new(SerialConfig::new());
    let mut monitor = Monitor::new(
        config,
        Resolver::default(),
        Renderer::new(glyphs),
        std::io::stdout(),
    );

    let report = monitor
        .run(&mut channel, &SystemPorts, args.port.as_deref(), &cancel)
        .await?;
    tracing::debug!(
        "read {} bytes, {} lines, {} events",
        report.bytes,
        report.lines,
        report.events
    );
    Ok(())
}

fn list() -> Result<()> {
    let endpoints = list_endpoints().context("failed to enumerate serial ports")?;
    println!("🔍 Available serial ports:");
    for endpoint in endpoints {
        println!("  📍 {endpoint}");
    }
    Ok(())
}
