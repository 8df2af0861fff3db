//! `Monitor` builder and reconciliation loop.
//!
//! This is the entry point for running Dutybell. It ties together all the
//! layers: process discovery → capture → decode → filter → dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dutybell_capture::{CaptureBackend, CaptureHandle, GameProcess, ProcessProvider};
use dutybell_protocol::{selected, ProcessId, ProtocolVersion};
use dutybell_session::{SessionControl, SessionSnapshot, SessionTable};
use dutybell_tick::{TickConfig, TickScheduler};
use tokio::sync::{mpsc, oneshot, watch};

use crate::dispatch::{EventDispatcher, EventListener, ListenerId};
use crate::filter::EventFilter;
use crate::pump::pump_session;
use crate::MonitorError;

/// Executable names recognized as game clients by default: the DirectX 11
/// client and the legacy 32-bit one.
pub const DEFAULT_PROCESS_NAMES: [&str; 2] = ["ffxiv_dx11", "ffxiv"];

/// Configuration for a [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Executable names (without extension) to attach to.
    pub process_names: Vec<String>,
    /// Reconciliation clock settings.
    pub tick: TickConfig,
    /// Opcode table to decode captured messages with.
    pub version: &'static ProtocolVersion,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            process_names: DEFAULT_PROCESS_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            tick: TickConfig::default(),
            version: selected(),
        }
    }
}

/// Point-in-time view of a running monitor.
#[derive(Debug, Clone)]
pub struct MonitorStatus {
    /// Time since `run` started.
    pub uptime: Duration,
    /// Reconciliation passes fired by the interval clock. Stays 0 in
    /// manual mode.
    pub ticks: u64,
    /// Every capture session, ascending by process id.
    pub sessions: Vec<SessionSnapshot>,
}

impl MonitorStatus {
    /// How many sessions are actively capturing.
    pub fn capturing(&self) -> usize {
        self.sessions
            .iter()
            .filter(|session| session.state.is_capturing())
            .count()
    }
}

enum Command {
    Status(oneshot::Sender<MonitorStatus>),
    Reconcile(oneshot::Sender<()>),
    Reconnect(oneshot::Sender<usize>),
    Shutdown(oneshot::Sender<usize>),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and assembling a [`Monitor`].
///
/// # Example
///
/// ```rust,ignore
/// let (backend, control) = ReplayBackend::new();
/// let (monitor, handle) = MonitorBuilder::new()
///     .reconcile_interval(Duration::from_secs(10))
///     .capture_all_world_events()
///     .listener(my_listener)
///     .build(backend, ScriptedProcesses::new());
/// tokio::spawn(monitor.run());
/// ```
pub struct MonitorBuilder {
    config: MonitorConfig,
    listeners: Vec<Arc<dyn EventListener>>,
    selected_world_events: Vec<u16>,
    capture_all: bool,
}

impl MonitorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
            listeners: Vec::new(),
            selected_world_events: Vec::new(),
            capture_all: false,
        }
    }

    /// Replaces the executable names to watch for.
    pub fn process_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.process_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the time between reconciliation passes.
    pub fn reconcile_interval(mut self, interval: Duration) -> Self {
        self.config.tick.interval = interval;
        self
    }

    /// Disables the interval clock; the monitor reconciles only via
    /// [`MonitorHandle::reconcile_now`].
    pub fn manual_reconcile(mut self) -> Self {
        self.config.tick.interval = Duration::ZERO;
        self
    }

    /// Selects the opcode table to decode with.
    pub fn version(mut self, version: &'static ProtocolVersion) -> Self {
        self.config.version = version;
        self
    }

    /// Registers a listener before the monitor starts.
    pub fn listener(mut self, listener: impl EventListener) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Opts in to one world event.
    pub fn world_event(mut self, id: u16) -> Self {
        self.selected_world_events.push(id);
        self
    }

    /// Opts in to a set of world events.
    pub fn world_events<I: IntoIterator<Item = u16>>(mut self, ids: I) -> Self {
        self.selected_world_events.extend(ids);
        self
    }

    /// Passes every world event through the filter.
    pub fn capture_all_world_events(mut self) -> Self {
        self.capture_all = true;
        self
    }

    /// Assembles the monitor and its control handle.
    ///
    /// The monitor does nothing until [`Monitor::run`] is awaited; keep
    /// the handle (or a clone) to control it from other tasks.
    pub fn build<B, P>(self, backend: B, provider: P) -> (Monitor<B, P>, MonitorHandle)
    where
        B: CaptureBackend,
        P: ProcessProvider,
    {
        let filter = Arc::new(EventFilter::new());
        for id in self.selected_world_events {
            filter.opt_in(id);
        }
        filter.set_capture_all(self.capture_all);

        let dispatcher = Arc::new(EventDispatcher::with_listeners(self.listeners));
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let handle = MonitorHandle {
            cmd: cmd_tx,
            filter: Arc::clone(&filter),
            dispatcher: Arc::clone(&dispatcher),
        };

        let monitor = Monitor {
            scheduler: TickScheduler::new(self.config.tick.clone()),
            config: self.config,
            backend,
            provider,
            sessions: SessionTable::new(),
            filter,
            dispatcher,
            cmd_rx,
            started_at: Instant::now(),
        };

        (monitor, handle)
    }
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Watches for game-client processes and captures duty events from them.
///
/// Call [`run()`](Self::run) to start the reconciliation loop.
pub struct Monitor<B: CaptureBackend, P: ProcessProvider> {
    config: MonitorConfig,
    backend: B,
    provider: P,
    sessions: SessionTable<B::Handle>,
    filter: Arc<EventFilter>,
    dispatcher: Arc<EventDispatcher>,
    scheduler: TickScheduler,
    cmd_rx: mpsc::Receiver<Command>,
    started_at: Instant,
}

impl<B, P> Monitor<B, P>
where
    B: CaptureBackend,
    P: ProcessProvider,
{
    /// Creates a new builder.
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    /// Runs the monitor loop.
    ///
    /// Reconciles on the interval clock and serves handle commands until
    /// [`MonitorHandle::shutdown`] is called or every handle is dropped.
    /// On the way out every capture session is torn down; once `run`
    /// returns, no listener will be called again.
    pub async fn run(mut self) -> Result<(), MonitorError> {
        self.started_at = Instant::now();
        tracing::info!(
            version = self.config.version.name,
            processes = ?self.config.process_names,
            "dutybell monitor running"
        );

        let mut shutdown_ack = None;
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::debug!("all monitor handles dropped, stopping");
                        break;
                    };
                    match cmd {
                        Command::Status(reply) => {
                            let _ = reply.send(self.status());
                        }
                        Command::Reconcile(reply) => {
                            self.reconcile().await;
                            let _ = reply.send(());
                        }
                        Command::Reconnect(reply) => {
                            let stopped = self.reconnect().await;
                            let _ = reply.send(stopped);
                        }
                        Command::Shutdown(reply) => {
                            shutdown_ack = Some(reply);
                            break;
                        }
                    }
                }
                info = self.scheduler.wait_for_tick() => {
                    if info.overrun {
                        tracing::debug!(
                            skipped = info.ticks_skipped,
                            "previous reconcile pass ran long"
                        );
                    }
                    self.reconcile().await;
                    self.scheduler.record_tick_end();
                }
            }
        }

        let stopped = self.stop_all().await;
        tracing::info!(sessions_stopped = stopped, "dutybell monitor stopped");
        if let Some(reply) = shutdown_ack {
            let _ = reply.send(stopped);
        }
        Ok(())
    }

    /// One reconciliation pass: converge the session table onto the live
    /// process list.
    async fn reconcile(&mut self) {
        // Retire dead or stalled sessions first, so a reused pid can
        // attach fresh below.
        for id in self.sessions.pids() {
            if !self.provider.is_alive(id) {
                tracing::info!(process = %id, "game client exited, stopping capture");
                self.teardown(id).await;
                continue;
            }

            let running = self.sessions.with_handle(id, |handle| handle.is_running());
            if running == Some(false) {
                tracing::warn!(process = %id, "capture backend no longer running, detaching");
                self.teardown(id).await;
                continue;
            }

            // Live session: nudge the backend, since zone changes open
            // new game-server connections it has to pick up.
            if let Some(process) = self.sessions.process(id) {
                let refreshed = self
                    .sessions
                    .with_handle(id, |handle| handle.refresh_connections(&process));
                if let Some(Err(error)) = refreshed {
                    tracing::warn!(%process, %error, "connection refresh failed");
                }
            }
        }

        // Then attach to newly discovered game clients.
        for process in self.provider.discover() {
            if !self.wants(&process.name) || self.sessions.contains(process.id) {
                continue;
            }
            if let Err(error) = self.attach(process.clone()).await {
                tracing::warn!(%process, %error, "attach failed, will retry next pass");
            }
        }
    }

    /// Starts capture for one process and activates its session.
    async fn attach(&mut self, process: GameProcess) -> Result<(), MonitorError> {
        self.sessions.begin_attach(process.clone())?;

        let (handle, stream) = match self.backend.start(&process).await {
            Ok(parts) => parts,
            Err(error) => {
                self.sessions.abort_attach(process.id);
                return Err(error.into());
            }
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        let pump = tokio::spawn(pump_session(
            stream,
            process.id,
            self.config.version,
            Arc::clone(&self.filter),
            Arc::clone(&self.dispatcher),
            shutdown_rx,
        ));

        self.sessions
            .activate(process.id, SessionControl { handle, shutdown, pump })?;
        Ok(())
    }

    /// Stops one session and waits for its pump to exit.
    ///
    /// When this returns, no further events for `id` will be dispatched.
    async fn teardown(&mut self, id: ProcessId) {
        let Some(control) = self.sessions.begin_stop(id) else {
            // Not capturing: an attaching leftover is simply dropped.
            self.sessions.abort_attach(id);
            return;
        };

        control.handle.stop();
        let _ = control.shutdown.send(true);
        if let Err(error) = control.pump.await {
            tracing::warn!(process = %id, %error, "capture pump task failed");
        }
        self.sessions.finish_stop(id);
    }

    /// Tears down every session. Returns how many were removed.
    async fn stop_all(&mut self) -> usize {
        let pids = self.sessions.pids();
        for id in &pids {
            self.teardown(*id).await;
        }
        pids.len()
    }

    /// Tears everything down and immediately re-attaches to whatever is
    /// still running.
    async fn reconnect(&mut self) -> usize {
        tracing::info!("reconnect requested, restarting all capture sessions");
        // Pause the clock so the teardown time is not booked as an
        // overrun against the interval.
        self.scheduler.pause();
        let stopped = self.stop_all().await;
        self.scheduler.resume();
        self.reconcile().await;
        stopped
    }

    fn status(&self) -> MonitorStatus {
        MonitorStatus {
            uptime: self.started_at.elapsed(),
            ticks: self.scheduler.tick_count(),
            sessions: self.sessions.snapshot(),
        }
    }

    fn wants(&self, name: &str) -> bool {
        self.config.process_names.iter().any(|wanted| wanted == name)
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable control handle for a running [`Monitor`].
///
/// Commands travel over a channel to the monitor task; each method
/// resolves once the monitor has carried the command out, not merely
/// queued it.
#[derive(Clone)]
pub struct MonitorHandle {
    cmd: mpsc::Sender<Command>,
    filter: Arc<EventFilter>,
    dispatcher: Arc<EventDispatcher>,
}

impl MonitorHandle {
    /// Reports the monitor's uptime, tick count, and sessions.
    ///
    /// # Errors
    /// Returns [`MonitorError::NotRunning`] if the monitor has stopped.
    pub async fn status(&self) -> Result<MonitorStatus, MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd
            .send(Command::Status(tx))
            .await
            .map_err(|_| MonitorError::NotRunning)?;
        rx.await.map_err(|_| MonitorError::NotRunning)
    }

    /// Runs one reconciliation pass and waits for it to finish.
    ///
    /// # Errors
    /// Returns [`MonitorError::NotRunning`] if the monitor has stopped.
    pub async fn reconcile_now(&self) -> Result<(), MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd
            .send(Command::Reconcile(tx))
            .await
            .map_err(|_| MonitorError::NotRunning)?;
        rx.await.map_err(|_| MonitorError::NotRunning)
    }

    /// Stops every capture session, then immediately re-attaches to the
    /// game clients still running. Returns how many sessions were
    /// stopped.
    ///
    /// # Errors
    /// Returns [`MonitorError::NotRunning`] if the monitor has stopped.
    pub async fn reconnect(&self) -> Result<usize, MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd
            .send(Command::Reconnect(tx))
            .await
            .map_err(|_| MonitorError::NotRunning)?;
        rx.await.map_err(|_| MonitorError::NotRunning)
    }

    /// Stops the monitor. When this returns, every capture session has
    /// been torn down and no listener will be called again. Returns how
    /// many sessions were stopped; calling it on an already-stopped
    /// monitor returns 0.
    pub async fn shutdown(&self) -> Result<usize, MonitorError> {
        let (tx, rx) = oneshot::channel();
        if self.cmd.send(Command::Shutdown(tx)).await.is_err() {
            return Ok(0);
        }
        rx.await.map_err(|_| MonitorError::NotRunning)
    }

    /// The world-event filter, shared with the running monitor. Changes
    /// apply to the next captured message.
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Registers a listener at runtime.
    pub async fn subscribe(&self, listener: impl EventListener) -> ListenerId {
        self.dispatcher.subscribe(listener).await
    }

    /// Removes a listener. Returns `false` if the id was not registered.
    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        self.dispatcher.unsubscribe(id).await
    }
}
