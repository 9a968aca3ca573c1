// Nearby bridge: drives nearby-core from JSON-lines platform events on stdin, writes channel
// envelopes and platform commands to stdout. Logs go to stderr.

mod channel;
mod config;
mod sink;

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use nearby_core::{decode_event, NearbyCore, MAX_EVENT_LEN};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::channel::CoreHandle;
use crate::sink::JsonLinesSink;

/// Nearby connections bridge
#[derive(Parser, Debug)]
#[command(name = "nearby-bridge")]
#[command(about = "Translate nearby-connections platform events into app-layer notifications")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/nearby-bridge/config.toml, then /etc/nearby-bridge/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not issue bind-service at startup
    #[arg(long)]
    no_bind: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = config::load(args.config.as_deref()).context("loading config")?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cfg, args.no_bind))
}

async fn run(cfg: config::Config, no_bind: bool) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "nearby-bridge starting");

    let core = NearbyCore::with_config(cfg.core.clone());
    let bound = core.binding().bound_flag();
    let (handle, rx) = channel::channel(cfg.channel_capacity);
    let sink = JsonLinesSink::new(tokio::io::stdout(), cfg.core.clone());
    let core_task = tokio::spawn(channel::run_core(core, rx, sink));

    if !no_bind {
        handle.bind().await?;
    }

    let input = BufReader::new(tokio::io::stdin());
    let served = serve(input, handle, MAX_EVENT_LEN, shutdown_signal()).await;

    let core = core_task.await.context("core task panicked")??;
    info!(
        peers = core.roster().len(),
        bound = bound.load(Ordering::SeqCst),
        "nearby-bridge stopped"
    );
    served
}

/// Pump events until input ends or `shutdown` resolves, then unbind. Unbind is issued even when
/// reading input failed; that error is returned afterwards.
async fn serve<R, S>(
    input: R,
    handle: CoreHandle,
    max_len: usize,
    shutdown: S,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = anyhow::Result<()>>,
{
    let pumped = tokio::select! {
        res = pump_events(input, &handle, max_len) => res,
        res = shutdown => res,
    };
    if let Err(e) = &pumped {
        warn!(error = %e, "event input failed");
    }
    info!("shutting down");
    handle.unbind().await?;
    pumped
}

/// Forward each input line to the core until EOF. Lines that do not decode (bad JSON, bad UTF-8,
/// longer than `max_len`) are logged and skipped; at most `max_len + 1` bytes of a line are held.
async fn pump_events<R: AsyncBufRead + Unpin>(
    mut input: R,
    handle: &CoreHandle,
    max_len: usize,
) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = (&mut input)
            .take(max_len as u64 + 1)
            .read_until(b'\n', &mut buf)
            .await?;
        if n == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') && buf.len() > max_len {
            warn!(limit = max_len, "skipping oversized event line");
            discard_line(&mut input).await?;
            continue;
        }
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match decode_event(line) {
            Ok(ev) => {
                debug!(?ev, "platform event");
                handle.event(ev).await?;
            }
            Err(e) => warn!(error = %e, "skipping undecodable event line"),
        }
    }
    info!("input closed");
    Ok(())
}

/// Consume input up to and including the next newline without buffering it.
async fn discard_line<R: AsyncBufRead + Unpin>(input: &mut R) -> std::io::Result<()> {
    loop {
        let available = input.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        let newline = available.iter().position(|&b| b == b'\n');
        let len = available.len();
        match newline {
            Some(i) => {
                input.consume(i + 1);
                return Ok(());
            }
            None => input.consume(len),
        }
    }
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
