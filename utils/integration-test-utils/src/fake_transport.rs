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

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use topic_plane::{
    Endpoint, Message, MessageListener, Transport, TransportError, TransportPublisher,
    TransportSubscriber,
};
use tracing::debug;

/// Switches that make individual [`FakeTransport`] operations fail.
#[derive(Default)]
pub struct FailureSwitches {
    pub initialize: AtomicBool,
    pub terminate: AtomicBool,
    pub create_publisher: AtomicBool,
    pub publisher_stop: AtomicBool,
    pub create_subscriber: AtomicBool,
    pub subscriber_stop: AtomicBool,
    pub subscribe: AtomicBool,
}

impl FailureSwitches {
    fn check(flag: &AtomicBool, what: &str) -> Result<(), TransportError> {
        if flag.load(Ordering::SeqCst) {
            return Err(TransportError::new(format!("{what} failure injected")));
        }
        Ok(())
    }
}

/// One subscription as seen by the transport; `endpoint` is `None` for subscribe-by-name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub endpoint: Option<Endpoint>,
    pub topic: String,
}

#[derive(Default)]
struct Journal {
    publisher_ports: Vec<u16>,
    published: Vec<(String, Message)>,
    subscriber_endpoints: Vec<Endpoint>,
    subscriptions: Vec<SubscriptionRecord>,
    listeners: Vec<Arc<dyn MessageListener>>,
}

#[derive(Default)]
struct Inner {
    fail: FailureSwitches,
    initialized: AtomicUsize,
    terminated: AtomicUsize,
    stopped: AtomicUsize,
    journal: Mutex<Journal>,
}

impl Inner {
    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory [`Transport`] that records every call and can inject failures.
///
/// Publishers and subscribers it creates share its journal and failure switches, so a
/// switch flipped after creation still takes effect.
#[derive(Default)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self) -> &FailureSwitches {
        &self.inner.fail
    }

    pub fn initialize_count(&self) -> usize {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    pub fn terminate_count(&self) -> usize {
        self.inner.terminated.load(Ordering::SeqCst)
    }

    /// Number of successful publisher or subscriber stops.
    pub fn stop_count(&self) -> usize {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    pub fn publisher_ports(&self) -> Vec<u16> {
        self.inner.journal().publisher_ports.clone()
    }

    pub fn published(&self) -> Vec<(String, Message)> {
        self.inner.journal().published.clone()
    }

    pub fn subscriber_endpoints(&self) -> Vec<Endpoint> {
        self.inner.journal().subscriber_endpoints.clone()
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionRecord> {
        self.inner.journal().subscriptions.clone()
    }

    /// Delivers `message` on `topic` to every listener handed to `create_subscriber`.
    pub async fn deliver(&self, topic: &str, message: Message) {
        let listeners = self.inner.journal().listeners.clone();
        for listener in listeners {
            listener.on_receive(topic, message.clone()).await;
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn initialize(&self) -> Result<(), TransportError> {
        FailureSwitches::check(&self.inner.fail.initialize, "initialize")?;
        self.inner.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn terminate(&self) -> Result<(), TransportError> {
        self.inner.terminated.fetch_add(1, Ordering::SeqCst);
        FailureSwitches::check(&self.inner.fail.terminate, "terminate")
    }

    async fn create_publisher(
        &self,
        port: u16,
    ) -> Result<Arc<dyn TransportPublisher>, TransportError> {
        FailureSwitches::check(&self.inner.fail.create_publisher, "create_publisher")?;
        self.inner.journal().publisher_ports.push(port);
        debug!("fake publisher created on port {port}");
        Ok(Arc::new(FakePublisher {
            inner: self.inner.clone(),
        }))
    }

    async fn create_subscriber(
        &self,
        endpoint: &Endpoint,
        listener: Arc<dyn MessageListener>,
    ) -> Result<Arc<dyn TransportSubscriber>, TransportError> {
        FailureSwitches::check(&self.inner.fail.create_subscriber, "create_subscriber")?;
        let mut journal = self.inner.journal();
        journal.subscriber_endpoints.push(endpoint.clone());
        journal.listeners.push(listener);
        debug!("fake subscriber created for {endpoint}");
        Ok(Arc::new(FakeSubscriber {
            inner: self.inner.clone(),
        }))
    }
}

struct FakePublisher {
    inner: Arc<Inner>,
}

#[async_trait]
impl TransportPublisher for FakePublisher {
    async fn start(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        FailureSwitches::check(&self.inner.fail.publisher_stop, "publisher stop")?;
        self.inner.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(&self, topic: &str, message: Message) -> Result<(), TransportError> {
        self.inner
            .journal()
            .published
            .push((topic.to_string(), message));
        Ok(())
    }
}

struct FakeSubscriber {
    inner: Arc<Inner>,
}

impl FakeSubscriber {
    fn record(&self, endpoint: Option<&Endpoint>, topic: &str) -> Result<(), TransportError> {
        FailureSwitches::check(&self.inner.fail.subscribe, "subscribe")?;
        self.inner.journal().subscriptions.push(SubscriptionRecord {
            endpoint: endpoint.cloned(),
            topic: topic.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl TransportSubscriber for FakeSubscriber {
    async fn start(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        FailureSwitches::check(&self.inner.fail.subscriber_stop, "subscriber stop")?;
        self.inner.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe_for_topic(&self, topic: &str) -> Result<(), TransportError> {
        self.record(None, topic)
    }

    async fn subscribe_with_endpoint(
        &self,
        endpoint: &Endpoint,
        topic: &str,
    ) -> Result<(), TransportError> {
        self.record(Some(endpoint), topic)
    }
}
