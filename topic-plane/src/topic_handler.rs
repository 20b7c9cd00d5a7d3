/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Single worker that owns the registered topic set and renews TNS leases.
//!
//! Publishers never touch the registered set directly. They enqueue [`Command`]s which the
//! worker applies one at a time in send order. Once the lease interval is known and a
//! [`Command::KeepAlive`] has been received, the worker sends one keep-alive beacon per
//! interval covering every registered topic.

use crate::error::{Error, Result};
use crate::observability::events;
use crate::tns::TnsClient;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const COMPONENT: &str = "topic_handler";
const UNKNOWN_INTERVAL: i64 = -1;

/// Requests understood by the [`TopicHandler`] worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Adds a topic name to the registered set. Duplicates are ignored.
    Register(String),
    /// Removes a topic name. Removing an unknown name is a no-op.
    Unregister(String),
    /// Starts lease renewal if the interval is known and renewal is not running yet.
    KeepAlive,
    /// Records the lease interval in seconds. Only the first positive value is kept.
    UpdateKeepAliveInterval(i64),
}

enum Envelope {
    Command(Command),
    Snapshot(oneshot::Sender<Vec<String>>),
    Shutdown,
}

/// Worker-written, caller-readable view of the lease state.
struct HandlerShared {
    keep_alive_interval: AtomicI64,
    keep_alive_started: AtomicBool,
}

impl HandlerShared {
    fn reset(&self) {
        self.keep_alive_interval
            .store(UNKNOWN_INTERVAL, Ordering::SeqCst);
        self.keep_alive_started.store(false, Ordering::SeqCst);
    }
}

struct HandlerRuntime {
    sender: UnboundedSender<Envelope>,
    worker: JoinHandle<()>,
}

pub struct TopicHandler {
    shared: Arc<HandlerShared>,
    runtime: Mutex<Option<HandlerRuntime>>,
}

impl Default for TopicHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicHandler {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(HandlerShared {
                keep_alive_interval: AtomicI64::new(UNKNOWN_INTERVAL),
                keep_alive_started: AtomicBool::new(false),
            }),
            runtime: Mutex::new(None),
        }
    }

    fn runtime(&self) -> MutexGuard<'_, Option<HandlerRuntime>> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the worker on the current tokio runtime. A running handler is left untouched.
    ///
    /// Keep-alive beacons go to `tns`; without one, renewal ticks are skipped.
    pub fn init_handler(&self, tns: Option<TnsClient>) -> Result<()> {
        let mut runtime = self.runtime();
        if runtime.is_some() {
            return Ok(());
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            warn!(component = COMPONENT, err = %e, "no tokio runtime to host the topic handler");
            Error::UnknownState
        })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = handle.spawn(handler_loop(receiver, self.shared.clone(), tns));
        *runtime = Some(HandlerRuntime { sender, worker });

        info!(
            event = events::HANDLER_START,
            component = COMPONENT,
            "topic handler started"
        );
        Ok(())
    }

    /// Stops the worker after it has applied every command queued before this call.
    ///
    /// No keep-alive beacon is sent once this returns.
    pub async fn terminate_handler(&self) {
        let Some(HandlerRuntime { sender, worker }) = self.runtime().take() else {
            return;
        };

        let _ = sender.send(Envelope::Shutdown);
        if let Err(err) = worker.await {
            warn!(component = COMPONENT, err = %err, "topic handler worker ended abnormally");
        }
        self.shared.reset();

        info!(
            event = events::HANDLER_STOP,
            component = COMPONENT,
            "topic handler stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.runtime().is_some()
    }

    /// Enqueues `command` for the worker.
    pub fn send(&self, command: Command) -> Result<()> {
        self.enqueue(Envelope::Command(command))
    }

    pub fn update_keep_alive_interval(&self, seconds: i64) -> Result<()> {
        self.send(Command::UpdateKeepAliveInterval(seconds))
    }

    /// Lease interval in seconds, `-1` while unknown.
    pub fn keep_alive_interval(&self) -> i64 {
        self.shared.keep_alive_interval.load(Ordering::SeqCst)
    }

    pub fn is_keep_alive_started(&self) -> bool {
        self.shared.keep_alive_started.load(Ordering::SeqCst)
    }

    /// Registered topic names, in registration order, after all previously sent commands.
    pub async fn registered_topics(&self) -> Result<Vec<String>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue(Envelope::Snapshot(reply_tx))?;
        reply_rx.await.map_err(|_| Error::UnknownState)
    }

    fn enqueue(&self, envelope: Envelope) -> Result<()> {
        let runtime = self.runtime();
        let Some(runtime) = runtime.as_ref() else {
            warn!(
                event = events::HANDLER_SEND_REJECTED,
                component = COMPONENT,
                "topic handler is not running"
            );
            return Err(Error::UnknownState);
        };
        runtime.sender.send(envelope).map_err(|_| {
            warn!(
                event = events::HANDLER_SEND_REJECTED,
                component = COMPONENT,
                "topic handler queue is closed"
            );
            Error::UnknownState
        })
    }
}

struct WorkerState {
    topics: Vec<String>,
    keep_alive_interval: i64,
    timer: Option<Interval>,
}

impl WorkerState {
    fn apply(&mut self, command: Command, shared: &HandlerShared) {
        match command {
            Command::Register(name) => {
                if !self.topics.contains(&name) {
                    debug!(
                        event = events::HANDLER_TOPIC_REGISTERED,
                        component = COMPONENT,
                        topic = name.as_str(),
                        "topic added"
                    );
                    self.topics.push(name);
                }
            }
            Command::Unregister(name) => {
                if let Some(position) = self.topics.iter().position(|topic| *topic == name) {
                    self.topics.remove(position);
                    debug!(
                        event = events::HANDLER_TOPIC_UNREGISTERED,
                        component = COMPONENT,
                        topic = name.as_str(),
                        "topic removed"
                    );
                }
            }
            Command::UpdateKeepAliveInterval(seconds) => {
                if self.keep_alive_interval == UNKNOWN_INTERVAL && seconds > 0 {
                    self.keep_alive_interval = seconds;
                    shared.keep_alive_interval.store(seconds, Ordering::SeqCst);
                    debug!(
                        event = events::HANDLER_INTERVAL_UPDATED,
                        component = COMPONENT,
                        seconds,
                        "keep-alive interval set"
                    );
                }
            }
            Command::KeepAlive => {
                if self.timer.is_some() {
                    return;
                }
                if self.keep_alive_interval == UNKNOWN_INTERVAL {
                    debug!(
                        event = events::HANDLER_KEEPALIVE_DEFERRED,
                        component = COMPONENT,
                        "keep-alive requested before interval is known"
                    );
                    return;
                }
                let period = Duration::from_secs(self.keep_alive_interval.unsigned_abs());
                let mut timer = tokio::time::interval_at(Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.timer = Some(timer);
                shared.keep_alive_started.store(true, Ordering::SeqCst);
                info!(
                    event = events::HANDLER_KEEPALIVE_ARMED,
                    component = COMPONENT,
                    seconds = self.keep_alive_interval,
                    "keep-alive renewal started"
                );
            }
        }
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn handler_loop(
    mut receiver: UnboundedReceiver<Envelope>,
    shared: Arc<HandlerShared>,
    tns: Option<TnsClient>,
) {
    let mut state = WorkerState {
        topics: Vec::new(),
        keep_alive_interval: UNKNOWN_INTERVAL,
        timer: None,
    };

    loop {
        tokio::select! {
            biased;
            envelope = receiver.recv() => match envelope {
                Some(Envelope::Command(command)) => state.apply(command, &shared),
                Some(Envelope::Snapshot(reply)) => {
                    let _ = reply.send(state.topics.clone());
                }
                Some(Envelope::Shutdown) | None => break,
            },
            _ = next_tick(&mut state.timer) => {
                send_beacon(tns.as_ref(), &state.topics).await;
            }
        }
    }

    state.topics.clear();
}

async fn send_beacon(tns: Option<&TnsClient>, topics: &[String]) {
    let Some(tns) = tns else {
        debug!(component = COMPONENT, "no TNS configured; skipping keep-alive");
        return;
    };
    if topics.is_empty() {
        return;
    }
    if let Err(err) = tns.keep_alive(topics).await {
        warn!(
            event = events::TNS_KEEPALIVE_FAILED,
            component = COMPONENT,
            topics = topics.len(),
            err = %err,
            "keep-alive beacon failed"
        );
    }
}
