//! Async connection driver and public client surface.
//!
//! Three cooperative tasks run for the lifetime of a connection: the
//! driver (receive loop, sole owner of the socket, flood queue, and
//! session state), the heartbeat timer, and the flood timer. The timers
//! emit tick signals over a channel; commands from the caller arrive on
//! a second channel; events leave on an unbounded channel so a slow
//! consumer can never stall protocol processing.
//!
//! Any socket error, read or write, is terminal: the driver stops both
//! timers, discards the outbound queue, emits a single
//! [`Event::Disconnected`], and exits. [`Client::stop`] and
//! [`Client::quit`] return only after the driver has exited, so no
//! event is ever emitted after they return.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::config::Config;
use crate::error::SessionError;
use crate::event::Event;
use crate::flood::{FloodQueue, FLOOD_TIMER_RESOLUTION};
use crate::session::{Session, SessionAction};
use crate::transport::Transport;

/// Heartbeat period; each beat increments the uptime counter by one.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
enum DriverCommand {
    SendRaw(String),
    Quit(Option<String>),
    Stop,
}

#[derive(Clone, Copy, Debug)]
enum TimerSignal {
    Heartbeat,
    Flood,
}

/// Handle to a running IRC session.
///
/// Constructed and owned by the caller; cheap operations (`send`,
/// `privmsg`, `join`, `part`) enqueue commands for the driver task and
/// never block on the network.
pub struct Client {
    commands: mpsc::UnboundedSender<DriverCommand>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// Stream of [`Event`]s for one connection.
///
/// Ends (yields `None`) after the terminal [`Event::Disconnected`].
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    /// Receive the next event; `None` once the session has ended.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl futures_util::Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.rx.poll_recv(cx)
    }
}

impl Client {
    /// Validate `config`, open the connection, and start the session.
    ///
    /// Returns the command handle and the event stream. The first events
    /// are `Connected`, then (after the server accepts registration)
    /// `Registered`.
    pub async fn connect(config: Config) -> Result<(Self, EventStream), SessionError> {
        config.validate()?;
        let transport = Transport::connect(&config).await?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let heartbeat = spawn_timer(HEARTBEAT_INTERVAL, TimerSignal::Heartbeat, tick_tx.clone());
        let flood_timer = spawn_timer(
            Duration::from_secs_f64(FLOOD_TIMER_RESOLUTION),
            TimerSignal::Flood,
            tick_tx,
        );

        let flood = FloodQueue::new(config.flood_protection, config.flood_protection_send_rate);
        let driver = Driver {
            transport,
            session: Session::new(config),
            flood,
            uptime: 0,
            events: event_tx,
            commands: command_rx,
            ticks: tick_rx,
            timers: vec![heartbeat, flood_timer],
        };
        let handle = tokio::spawn(driver.run());

        Ok((
            Self {
                commands: command_tx,
                driver: Mutex::new(Some(handle)),
            },
            EventStream { rx: event_rx },
        ))
    }

    /// Queue a raw protocol line, subject to flood control.
    pub fn send(&self, line: impl Into<String>) -> Result<(), SessionError> {
        self.command(DriverCommand::SendRaw(line.into()))
    }

    /// Send a chat message to a channel or nickname.
    pub fn privmsg(&self, target: &str, text: &str) -> Result<(), SessionError> {
        self.send(format!("PRIVMSG {} {}", target, text))
    }

    /// Join a channel, with an optional key.
    pub fn join(&self, channel: &str, key: Option<&str>) -> Result<(), SessionError> {
        match key {
            Some(key) => self.send(format!("JOIN {} {}", channel, key)),
            None => self.send(format!("JOIN {}", channel)),
        }
    }

    /// Part a channel, with an optional message.
    pub fn part(&self, channel: &str, message: Option<&str>) -> Result<(), SessionError> {
        match message {
            Some(message) => self.send(format!("PART {} {}", channel, message)),
            None => self.send(format!("PART {}", channel)),
        }
    }

    /// Send `QUIT` and shut the session down. Returns once the receive
    /// loop has exited and both timers have stopped.
    pub async fn quit(&self, reason: Option<&str>) {
        let _ = self.command(DriverCommand::Quit(reason.map(str::to_string)));
        self.wait().await;
    }

    /// Shut the session down without a QUIT. Safe to call from any
    /// task, and idempotent; returns once the receive loop has exited
    /// and both timers have stopped.
    pub async fn stop(&self) {
        let _ = self.command(DriverCommand::Stop);
        self.wait().await;
    }

    fn command(&self, command: DriverCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Stopped)
    }

    async fn wait(&self) {
        let handle = self.driver.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

fn spawn_timer(
    period: Duration,
    signal: TimerSignal,
    tx: mpsc::UnboundedSender<TimerSignal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; skip it so the
        // first signal lands one full period after start.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tx.send(signal).is_err() {
                return;
            }
        }
    })
}

struct Driver {
    transport: Transport,
    session: Session,
    flood: FloodQueue,
    uptime: u64,
    events: mpsc::UnboundedSender<Event>,
    commands: mpsc::UnboundedReceiver<DriverCommand>,
    ticks: mpsc::UnboundedReceiver<TimerSignal>,
    timers: Vec<JoinHandle<()>>,
}

impl Driver {
    async fn run(mut self) {
        let reason = self.event_loop().await;
        self.shutdown(reason).await;
    }

    /// The receive loop. Returns the disconnection reason.
    async fn event_loop(&mut self) -> String {
        let actions = self.session.on_connected();
        if let Err(reason) = self.apply(actions).await {
            return reason;
        }

        loop {
            tokio::select! {
                line = self.transport.read_line() => match line {
                    Some(Ok(line)) => {
                        let actions = self.session.handle_line(&line);
                        if let Err(reason) = self.apply(actions).await {
                            return reason;
                        }
                    }
                    Some(Err(e)) => return format!("read error: {}", e),
                    None => return "connection closed by server".to_string(),
                },
                Some(signal) = self.ticks.recv() => match signal {
                    TimerSignal::Heartbeat => {
                        self.uptime += 1;
                        self.emit(Event::Tick { uptime: self.uptime });
                    }
                    TimerSignal::Flood => {
                        if let Some(line) = self.flood.tick() {
                            if let Err(reason) = self.write(line).await {
                                return reason;
                            }
                        }
                    }
                },
                command = self.commands.recv() => match command {
                    Some(DriverCommand::SendRaw(line)) => {
                        if let Some(line) = self.flood.offer(line) {
                            if let Err(reason) = self.write(line).await {
                                return reason;
                            }
                        }
                    }
                    Some(DriverCommand::Quit(reason)) => {
                        let line = match reason {
                            Some(reason) => format!("QUIT {}", reason),
                            None => "QUIT".to_string(),
                        };
                        // Best effort; the connection is going away
                        // regardless of whether the farewell lands.
                        let _ = self.write(line).await;
                        return "quit".to_string();
                    }
                    Some(DriverCommand::Stop) | None => return "stopped".to_string(),
                },
            }
        }
    }

    async fn apply(&mut self, actions: Vec<SessionAction>) -> Result<(), String> {
        for action in actions {
            match action {
                SessionAction::Emit(event) => self.emit(event),
                SessionAction::SendNow(line) => self.write(line).await?,
            }
        }
        Ok(())
    }

    /// Write one line to the socket, stamping the flood clock. A write
    /// failure is terminal and discards anything still queued.
    async fn write(&mut self, line: String) -> Result<(), String> {
        match self.transport.write_line(line).await {
            Ok(()) => {
                self.flood.mark_sent();
                Ok(())
            }
            Err(e) => {
                self.flood.clear();
                Err(format!("write error: {}", e))
            }
        }
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }

    async fn shutdown(mut self, reason: String) {
        for timer in self.timers.drain(..) {
            timer.abort();
            let _ = timer.await;
        }
        self.flood.clear();
        debug!(%reason, "irc session shut down");
        self.emit(Event::Disconnected { reason });
        // Dropping the transport closes the socket; dropping the event
        // sender ends the consumer's stream.
    }
}
