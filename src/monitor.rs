//! The monitor loop.
//!
//! [`Monitor`] resolves the device, opens the channel and then polls it,
//! passing every framed line through the classifier and renderer until it is
//! cancelled or a read fails.
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Cancelled -> Closed
//!             |             |
//!             +-------------+------> Failed ----> Closed
//! ```

use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use chrono::Local;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::event::ClassifiedEvent;
use crate::protocol::{LineFramer, classify};
use crate::render::Renderer;
use crate::transport::serial::DEFAULT_BAUD_RATE;
use crate::transport::{Channel, Discovery, Resolver};

/// Default pause between polls when no data is pending.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default idle time before passthrough mode reports that it is waiting.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(10);

/// Configuration for the monitor loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Baud rate used to open the channel.
    pub baud_rate: u32,
    /// Pause between polls when no data is pending.
    pub poll_interval: Duration,
    /// Print every line instead of classified events only.
    pub raw: bool,
    /// Idle time between "waiting for data" lines in raw mode.
    pub heartbeat: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            raw: false,
            heartbeat: DEFAULT_HEARTBEAT,
        }
    }
}

impl MonitorConfig {
    /// Creates a new monitor configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = rate;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Enables passthrough mode.
    #[must_use]
    pub const fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Sets the raw mode heartbeat.
    #[must_use]
    pub const fn heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }
}

/// Lifecycle of a monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Not started.
    Idle,
    /// Resolving the endpoint and opening the channel.
    Connecting,
    /// Polling the open channel.
    Streaming,
    /// Stopped by the cancellation token.
    Cancelled,
    /// Stopped by a fatal error.
    Failed,
    /// Channel released; the run is over.
    Closed,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorReport {
    /// Bytes read from the channel.
    pub bytes: u64,
    /// Lines framed.
    pub lines: u64,
    /// Lines that produced an event.
    pub events: u64,
}

/// Closes the channel when dropped, unless already released.
struct ChannelGuard<'a, C: Channel> {
    channel: &'a mut C,
    released: bool,
}

impl<'a, C: Channel> ChannelGuard<'a, C> {
    fn new(channel: &'a mut C) -> Self {
        Self {
            channel,
            released: false,
        }
    }

    /// Closes the channel; returns true if a connection was open.
    fn release(&mut self) -> bool {
        self.released = true;
        self.channel.close()
    }
}

impl<C: Channel> Deref for ChannelGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.channel
    }
}

impl<C: Channel> DerefMut for ChannelGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.channel
    }
}

impl<C: Channel> Drop for ChannelGuard<'_, C> {
    fn drop(&mut self) {
        if !self.released {
            self.channel.close();
        }
    }
}

/// Drives the read, frame, classify and render pipeline.
pub struct Monitor<W> {
    config: MonitorConfig,
    resolver: Resolver,
    renderer: Renderer,
    out: W,
    state: MonitorState,
    report: MonitorReport,
}

impl<W: Write> Monitor<W> {
    /// Creates a monitor writing its records to `out`.
    #[must_use]
    pub const fn new(config: MonitorConfig, resolver: Resolver, renderer: Renderer, out: W) -> Self {
        Self {
            config,
            resolver,
            renderer,
            out,
            state: MonitorState::Idle,
            report: MonitorReport {
                bytes: 0,
                lines: 0,
                events: 0,
            },
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> MonitorState {
        self.state
    }

    /// Returns the output sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn transition(&mut self, next: MonitorState) {
        tracing::debug!("monitor state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs the monitor until `cancel` fires or a fatal error occurs.
    ///
    /// `port` bypasses discovery. The channel is closed exactly once before
    /// this returns, whichever way the run ends.
    pub async fn run<C, D>(
        &mut self,
        channel: &mut C,
        discovery: &D,
        port: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<MonitorReport>
    where
        C: Channel,
        D: Discovery,
    {
        self.transition(MonitorState::Idle);
        self.report = MonitorReport::default();

        let mut guard = ChannelGuard::new(channel);
        let result = self
            .connect_and_stream(&mut *guard, discovery, port, cancel)
            .await;

        match &result {
            Ok(()) => self.transition(MonitorState::Cancelled),
            Err(e) => {
                tracing::debug!("monitor failed: {}", e);
                self.transition(MonitorState::Failed);
            }
        }

        if guard.release() {
            let closed = self.renderer.closed();
            if let Err(e) = writeln!(self.out, "{closed}") {
                tracing::warn!("failed to report close: {}", e);
            }
        }
        self.transition(MonitorState::Closed);

        result.map(|()| self.report)
    }

    async fn connect_and_stream<C, D>(
        &mut self,
        channel: &mut C,
        discovery: &D,
        port: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        C: Channel,
        D: Discovery,
    {
        self.transition(MonitorState::Connecting);
        let endpoint = self.resolver.resolve(port, discovery)?;
        channel.open(&endpoint, self.config.baud_rate)?;

        self.transition(MonitorState::Streaming);
        let banner =
            self.renderer
                .connected(&endpoint, self.config.baud_rate, self.config.raw, &Local::now());
        writeln!(self.out, "{banner}")?;
        self.out.flush()?;

        self.stream(channel, cancel).await
    }

    async fn stream<C: Channel>(&mut self, channel: &mut C, cancel: &CancellationToken) -> Result<()> {
        let mut framer = LineFramer::new();
        let mut last_activity = Instant::now();

        loop {
            if cancel.is_cancelled() {
                return self.stopped();
            }

            if channel.has_data()? {
                let chunk = channel.read_available().await?;
                self.report.bytes += chunk.len() as u64;

                for line in framer.feed(&chunk) {
                    self.handle_line(&line)?;
                }
                self.out.flush()?;
                last_activity = Instant::now();
            } else {
                if self.config.raw && last_activity.elapsed() >= self.config.heartbeat {
                    let heartbeat = self.renderer.heartbeat(&Local::now(), self.report.lines);
                    writeln!(self.out, "{heartbeat}")?;
                    self.out.flush()?;
                    last_activity = Instant::now();
                }

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return self.stopped(),
                    () = tokio::time::sleep(self.config.poll_interval) => {}
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> Result<()> {
        self.report.lines += 1;
        let now = Local::now();

        let record = if self.config.raw {
            Some(self.renderer.render_raw(line, &now))
        } else if let Some(event) = classify(line) {
            tracing::trace!("classified {} line", event.kind());
            self.report.events += 1;
            Some(self.renderer.render(&ClassifiedEvent::new(event, now)))
        } else {
            tracing::trace!("unclassified line: {}", line);
            None
        };

        if let Some(record) = record {
            writeln!(self.out, "{record}")?;
        }
        Ok(())
    }

    fn stopped(&mut self) -> Result<()> {
        tracing::info!("monitoring cancelled");
        let report = self.renderer.stopped(&Local::now(), self.report.lines);
        writeln!(self.out, "{report}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use bytes::Bytes;
    use futures::future::BoxFuture;

    use super::*;
    use crate::error::Error;
    use crate::types::SerialEndpoint;

    /// Channel that replays scripted reads.
    #[derive(Default)]
    struct ScriptedChannel {
        chunks: VecDeque<Result<Bytes>>,
        open_error: Option<String>,
        cancel_when_drained: Option<CancellationToken>,
        open: bool,
        opened_port: Option<String>,
        opens: usize,
        reads: usize,
        closes: usize,
    }

    impl ScriptedChannel {
        fn with_chunks(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks
                    .iter()
                    .map(|c| Ok(Bytes::copy_from_slice(c)))
                    .collect(),
                ..Self::default()
            }
        }

        fn cancel_when_drained(mut self, cancel: &CancellationToken) -> Self {
            self.cancel_when_drained = Some(cancel.clone());
            self
        }
    }

    impl Channel for ScriptedChannel {
        fn open(&mut self, endpoint: &SerialEndpoint, _baud_rate: u32) -> Result<()> {
            self.opens += 1;
            if let Some(reason) = self.open_error.clone() {
                return Err(Error::Connection {
                    port: endpoint.id.clone(),
                    reason,
                });
            }
            self.open = true;
            self.opened_port = Some(endpoint.id.clone());
            Ok(())
        }

        fn has_data(&mut self) -> Result<bool> {
            assert!(self.open, "polled a closed channel");
            if self.chunks.is_empty() {
                if let Some(cancel) = &self.cancel_when_drained {
                    cancel.cancel();
                }
                return Ok(false);
            }
            Ok(true)
        }

        fn read_available(&mut self) -> BoxFuture<'_, Result<Bytes>> {
            Box::pin(async move {
                self.reads += 1;
                self.chunks.pop_front().unwrap_or_else(|| Ok(Bytes::new()))
            })
        }

        fn close(&mut self) -> bool {
            self.closes += 1;
            std::mem::take(&mut self.open)
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    struct FixedPorts(Vec<SerialEndpoint>);

    impl Discovery for FixedPorts {
        fn endpoints(&self) -> Result<Vec<SerialEndpoint>> {
            Ok(self.0.clone())
        }
    }

    fn board() -> FixedPorts {
        FixedPorts(vec![
            SerialEndpoint::new("/dev/ttyS0", "n/a"),
            SerialEndpoint::new("/dev/ttyACM0", "nice!nano"),
        ])
    }

    fn monitor(config: MonitorConfig) -> Monitor<Vec<u8>> {
        Monitor::new(config, Resolver::default(), Renderer::default(), Vec::new())
    }

    fn output(monitor: Monitor<Vec<u8>>) -> String {
        String::from_utf8(monitor.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_classified_output() {
        let cancel = CancellationToken::new();
        let mut channel = ScriptedChannel::with_chunks(&[
            b"[00:00:01.000,000] <inf> battery_led: === BATTERY STA",
            b"TUS ===\r\n<inf> battery_led: Battery level: 45%\r\nnoise line\r\n",
            b"Battery voltage: 4050 mV (4.05 V)\r\nLED Status: PURPLE (unknown)\r\n",
            b"Initial battery voltage: 3700 mV\r\n",
        ])
        .cancel_when_drained(&cancel);

        let mut monitor = monitor(MonitorConfig::new());
        let report = monitor
            .run(&mut channel, &board(), None, &cancel)
            .await
            .unwrap();

        assert_eq!(report.lines, 6);
        assert_eq!(report.events, 5);
        assert_eq!(monitor.state(), MonitorState::Closed);
        assert_eq!(channel.opened_port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(channel.closes, 1);
        assert!(!channel.is_open());

        let out = output(monitor);
        assert!(out.contains("Connected to /dev/ttyACM0 @ 115200 baud"));
        assert!(out.contains("BATTERY UPDATE"));
        assert!(out.contains("Level: 45% [🟨🟨🟨🟨⬜⬜⬜⬜⬜⬜]"));
        assert!(out.contains("Voltage: 4050 mV (4.05 V)"));
        assert!(out.contains("LED: ⚪ PURPLE (unknown)"));
        assert!(out.contains("Initial voltage: 3700 mV (3.70 V)"));
        assert!(!out.contains("noise line"));
        assert!(out.contains("Monitoring stopped"));
        assert!(out.trim_end().ends_with("Connection closed"));
    }

    #[tokio::test]
    async fn test_raw_mode_shows_every_line() {
        let cancel = CancellationToken::new();
        let mut channel =
            ScriptedChannel::with_chunks(&[b"usb: configured\nBattery level: 80%\n"])
                .cancel_when_drained(&cancel);

        let mut monitor = monitor(MonitorConfig::new().raw(true));
        let report = monitor
            .run(&mut channel, &board(), Some("/dev/ttyACM7"), &cancel)
            .await
            .unwrap();

        assert_eq!(report.lines, 2);
        assert_eq!(report.events, 0);
        assert_eq!(channel.opened_port.as_deref(), Some("/dev/ttyACM7"));

        let out = output(monitor);
        assert!(out.contains("Showing ALL logs"));
        assert!(out.contains("] usb: configured\n"));
        assert!(out.contains("RELEVANT: Battery level: 80%"));
        assert!(!out.contains("RELEVANT: usb"));
    }

    #[tokio::test]
    async fn test_cancel_while_idle_stops_promptly() {
        let cancel = CancellationToken::new();
        let mut channel = ScriptedChannel::default();
        let mut monitor = monitor(MonitorConfig::new().poll_interval(Duration::from_secs(3600)));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            monitor.run(&mut channel, &board(), None, &cancel),
        )
        .await
        .expect("cancellation should interrupt the idle wait")
        .unwrap();

        assert_eq!(report, MonitorReport::default());
        assert_eq!(channel.reads, 0);
        assert_eq!(channel.closes, 1);
        assert_eq!(monitor.state(), MonitorState::Closed);
        assert!(output(monitor).contains("Monitoring stopped"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_reads() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut channel = ScriptedChannel::with_chunks(&[b"Battery level: 10%\n"]);

        let mut monitor = monitor(MonitorConfig::new());
        monitor
            .run(&mut channel, &board(), None, &cancel)
            .await
            .unwrap();

        assert_eq!(channel.reads, 0);
        assert_eq!(channel.closes, 1);
    }

    #[tokio::test]
    async fn test_resolution_failure_never_opens() {
        let cancel = CancellationToken::new();
        let mut channel = ScriptedChannel::default();
        let discovery = FixedPorts(vec![SerialEndpoint::new("/dev/ttyS0", "n/a")]);

        let mut monitor = monitor(MonitorConfig::new());
        let err = monitor
            .run(&mut channel, &discovery, None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(channel.opens, 0);
        assert_eq!(channel.closes, 1);
        assert_eq!(monitor.state(), MonitorState::Closed);
        assert!(!output(monitor).contains("Connection closed"));
    }

    #[tokio::test]
    async fn test_open_failure_closes_once() {
        let cancel = CancellationToken::new();
        let mut channel = ScriptedChannel {
            open_error: Some("Device or resource busy".into()),
            ..ScriptedChannel::default()
        };

        let mut monitor = monitor(MonitorConfig::new());
        let err = monitor
            .run(&mut channel, &board(), None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Connection { ref reason, .. } if reason.contains("busy")));
        assert_eq!(channel.opens, 1);
        assert_eq!(channel.closes, 1);
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_read_failure_is_fatal_and_closes() {
        let cancel = CancellationToken::new();
        let mut channel = ScriptedChannel::with_chunks(&[b"Battery level: 90%\n"]);
        channel.chunks.push_back(Err(Error::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "device unplugged",
        ))));

        let mut monitor = monitor(MonitorConfig::new());
        let err = monitor
            .run(&mut channel, &board(), None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert_eq!(channel.reads, 2);
        assert_eq!(channel.closes, 1);
        assert_eq!(monitor.state(), MonitorState::Closed);

        let out = output(monitor);
        assert!(out.contains("Level: 90%"));
        assert!(out.contains("Connection closed"));
        assert!(!out.contains("Monitoring stopped"));
    }

    #[tokio::test]
    async fn test_dropped_run_still_closes() {
        let cancel = CancellationToken::new();
        let mut channel = ScriptedChannel::default();
        let mut monitor = monitor(MonitorConfig::new());

        let result = tokio::time::timeout(
            Duration::from_millis(30),
            monitor.run(&mut channel, &board(), None, &cancel),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(channel.closes, 1);
        assert!(!channel.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_mode_heartbeat_when_idle() {
        let cancel = CancellationToken::new();
        let mut channel = ScriptedChannel::default();
        let config = MonitorConfig::new()
            .raw(true)
            .poll_interval(Duration::from_secs(1))
            .heartbeat(Duration::from_secs(10));
        let mut monitor = monitor(config);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            trigger.cancel();
        });

        monitor
            .run(&mut channel, &board(), None, &cancel)
            .await
            .unwrap();

        let out = output(monitor);
        assert!(out.contains("waiting for data... (lines received: 0)"));
    }

    #[test]
    fn test_monitor_config_builder() {
        let config = MonitorConfig::new()
            .baud_rate(9600)
            .poll_interval(Duration::from_millis(50))
            .raw(true);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert!(config.raw);
        assert_eq!(config.heartbeat, DEFAULT_HEARTBEAT);
    }
}
