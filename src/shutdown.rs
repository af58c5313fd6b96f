//! Graceful shutdown for sync runs.
//!
//! The first SIGINT, SIGTERM, or SIGHUP cancels the run's
//! [`CancellationToken`]. The sync engine checks it before forming each
//! batch, so the batch in flight still resolves and commits and the library
//! keeps every committed batch. A second signal exits immediately.

use std::sync::atomic::{AtomicU32, Ordering};

use tokio_util::sync::CancellationToken;

/// Exit status used when a second signal forces the process down.
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    Interrupt,
    #[cfg_attr(not(unix), allow(dead_code))]
    Terminate,
    #[cfg_attr(not(unix), allow(dead_code))]
    Hangup,
}

impl StopSignal {
    fn name(&self) -> &'static str {
        match self {
            StopSignal::Interrupt => "SIGINT",
            StopSignal::Terminate => "SIGTERM",
            StopSignal::Hangup => "SIGHUP",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    /// Let the current batch finish, then stop.
    Drain,
    ForceExit,
}

/// Counts delivered signals and owns the run's cancellation token.
struct ShutdownState {
    token: CancellationToken,
    received: AtomicU32,
}

impl ShutdownState {
    fn new(token: CancellationToken) -> Self {
        Self {
            token,
            received: AtomicU32::new(0),
        }
    }

    fn on_signal(&self, signal: StopSignal) -> Action {
        if self.received.fetch_add(1, Ordering::SeqCst) == 0 {
            tracing::info!(
                signal = signal.name(),
                "Stopping after the current batch is committed"
            );
            tracing::info!("Press Ctrl+C again to force exit; committed batches are kept");
            self.token.cancel();
            Action::Drain
        } else {
            tracing::warn!(
                signal = signal.name(),
                "Force exit requested, the batch in flight is discarded"
            );
            Action::ForceExit
        }
    }
}

#[cfg(unix)]
struct SignalListener {
    sigterm: tokio::signal::unix::Signal,
    sighup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sighup: signal(SignalKind::hangup())?,
        })
    }

    async fn recv(&mut self) -> StopSignal {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => StopSignal::Interrupt,
            _ = self.sigterm.recv() => StopSignal::Terminate,
            _ = self.sighup.recv() => StopSignal::Hangup,
        }
    }
}

#[cfg(not(unix))]
struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> StopSignal {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handling unavailable");
            std::future::pending::<()>().await;
        }
        StopSignal::Interrupt
    }
}

/// Register signal handlers and return the token a sync run should watch.
pub(crate) fn install_signal_handler() -> anyhow::Result<CancellationToken> {
    let mut listener = SignalListener::new()?;
    let token = CancellationToken::new();
    let state = ShutdownState::new(token.clone());

    tokio::spawn(async move {
        loop {
            let signal = listener.recv().await;
            if state.on_signal(signal) == Action::ForceExit {
                std::process::exit(FORCED_EXIT_CODE);
            }
        }
    });

    Ok(token)
}
