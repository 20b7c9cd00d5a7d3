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

use crate::context::Context;
use crate::error::{Error, Result};
use crate::lifecycle::{Status, StatusCell};
use crate::observability::events;
use crate::topic::{validate_topic, Topic};
use crate::topic_handler::Command;
use crate::transport::{Message, TransportPublisher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const COMPONENT: &str = "publisher";

#[derive(Default)]
struct PublisherState {
    local_port: Option<u16>,
    dynamic_port: bool,
    transport: Option<Arc<dyn TransportPublisher>>,
    topic: Option<Topic>,
}

/// Publishes one topic from one local port.
///
/// Lifecycle: `initialize` binds a transport publisher, `register_topic` announces the topic
/// to the TNS (when enabled) and `terminate` undoes both. A terminated publisher can be
/// initialized again.
pub struct Publisher {
    context: Arc<Context>,
    status: StatusCell,
    state: Mutex<PublisherState>,
}

impl Publisher {
    pub fn new(context: Arc<Context>) -> Self {
        Self {
            context,
            status: StatusCell::new(),
            state: Mutex::new(PublisherState::default()),
        }
    }

    /// Initializes a publisher, registers `topic_name` on the endpoint it is reachable on and
    /// returns it ready to publish.
    pub async fn create(
        context: Arc<Context>,
        port: Option<u16>,
        topic_name: &str,
        data_model: &str,
    ) -> Result<Self> {
        let publisher = Self::new(context);
        publisher.initialize(port).await?;

        let registered: Result<()> = async {
            let local_port = publisher.local_port().ok_or(Error::UnknownState)?;
            let endpoint = publisher.context.resolve_host_endpoint(local_port)?;
            let topic = Topic::new(topic_name, data_model, false, endpoint);
            publisher.register_topic(topic).await
        }
        .await;

        if let Err(err) = registered {
            if publisher.terminate().await.is_err() {
                warn!(
                    event = events::PUBLISHER_TERMINATE_FAILED,
                    component = COMPONENT,
                    "cleanup after failed registration did not complete"
                );
            }
            return Err(err);
        }
        Ok(publisher)
    }

    fn state(&self) -> MutexGuard<'_, PublisherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds and starts the transport publisher.
    ///
    /// A stand-alone context uses `port` when given. Otherwise a port is taken from the
    /// context's dynamic pool and returned to it on failure.
    pub async fn initialize(&self, port: Option<u16>) -> Result<()> {
        if !self.context.is_initialized() {
            return Err(Error::NotInitialized);
        }
        if !self
            .status
            .transition(Status::Created, Status::Initializing)
        {
            warn!(
                event = events::PUBLISHER_INIT_FAILED,
                component = COMPONENT,
                "publisher is already initialized"
            );
            return Err(Error::UnknownState);
        }

        let (local_port, dynamic_port, transport) = match self.bind(port).await {
            Ok(bound) => bound,
            Err(err) => {
                self.status.set(Status::Created);
                return Err(err);
            }
        };

        *self.state() = PublisherState {
            local_port: Some(local_port),
            dynamic_port,
            transport: Some(transport),
            topic: None,
        };
        self.status.set(Status::Initialized);

        info!(
            event = events::PUBLISHER_INIT_OK,
            component = COMPONENT,
            port = local_port,
            dynamic_port,
            "publisher initialized"
        );
        Ok(())
    }

    async fn bind(&self, port: Option<u16>) -> Result<(u16, bool, Arc<dyn TransportPublisher>)> {
        let (local_port, dynamic_port) = match port {
            Some(port) if self.context.is_stand_alone() => (port, false),
            _ => (self.context.assign_dynamic_port()?, true),
        };

        let transport = match self.start_transport(local_port).await {
            Ok(transport) => transport,
            Err(err) => {
                if dynamic_port {
                    let _ = self.context.release_dynamic_port(local_port);
                }
                return Err(err);
            }
        };

        if let Err(err) = self.context.start_topic_handler() {
            let _ = transport.stop().await;
            if dynamic_port {
                let _ = self.context.release_dynamic_port(local_port);
            }
            return Err(err);
        }
        Ok((local_port, dynamic_port, transport))
    }

    async fn start_transport(&self, port: u16) -> Result<Arc<dyn TransportPublisher>> {
        let transport = self
            .context
            .transport()
            .create_publisher(port)
            .await
            .map_err(|e| {
                warn!(event = events::PUBLISHER_INIT_FAILED, component = COMPONENT, port, err = %e, "unable to create transport publisher");
                Error::UnknownState
            })?;
        transport.start().await.map_err(|e| {
            warn!(event = events::PUBLISHER_INIT_FAILED, component = COMPONENT, port, err = %e, "unable to start transport publisher");
            Error::UnknownState
        })?;
        Ok(transport)
    }

    /// Records `topic` as the topic of this publisher and, with TNS enabled, registers it
    /// and schedules lease renewal.
    pub async fn register_topic(&self, topic: Topic) -> Result<()> {
        if self.status.get() != Status::Initialized {
            return Err(Error::UnknownState);
        }
        if !validate_topic(topic.name()) {
            return Err(Error::InvalidTopic);
        }
        if self.state().topic.is_some() {
            warn!(
                component = COMPONENT,
                topic = topic.name(),
                "publisher already carries a topic"
            );
            return Err(Error::InvalidParam);
        }

        if self.context.is_tns_enabled() {
            let tns = self.context.tns_client()?;
            let interval = tns.register_topic(&topic).await?;

            let handler = self.context.topic_handler();
            if handler.keep_alive_interval() < 0 {
                handler.update_keep_alive_interval(interval)?;
            }
            if !handler.is_keep_alive_started() {
                handler.send(Command::KeepAlive)?;
            }
            handler.send(Command::Register(topic.name().to_string()))?;
        }

        debug!(
            component = COMPONENT,
            topic = topic.name(),
            endpoint = %topic.endpoint(),
            "topic recorded"
        );
        self.state().topic = Some(topic);
        Ok(())
    }

    /// Withdraws `topic` from the TNS (when enabled) and stops lease renewal for it.
    pub async fn unregister_topic(&self, topic: &Topic) -> Result<()> {
        if self.context.is_tns_enabled() {
            let tns = self.context.tns_client()?;
            tns.unregister_topic(topic.name()).await?;
            self.context
                .topic_handler()
                .send(Command::Unregister(topic.name().to_string()))?;
        }

        let mut state = self.state();
        if state
            .topic
            .as_ref()
            .is_some_and(|current| current.name() == topic.name())
        {
            state.topic = None;
        }
        Ok(())
    }

    /// Publishes `message` under the registered topic.
    pub async fn publish(&self, message: Message) -> Result<()> {
        let topic = self.state().topic.as_ref().map(|t| t.name().to_string());
        let topic = topic.ok_or(Error::InvalidTopic)?;
        self.publish_on(&topic, message).await
    }

    /// Publishes `message` under an explicit topic name.
    pub async fn publish_on(&self, topic: &str, message: Message) -> Result<()> {
        if self.status.get() != Status::Initialized {
            return Err(Error::UnknownState);
        }
        if !validate_topic(topic) {
            return Err(Error::InvalidTopic);
        }
        let transport = self.state().transport.clone().ok_or(Error::UnknownState)?;
        transport.publish(topic, message).await.map_err(|e| {
            warn!(component = COMPONENT, topic, err = %e, "publish failed");
            Error::SessionUnavailable
        })
    }

    /// Withdraws the topic, stops the transport publisher and returns the port to the pool.
    ///
    /// If a step fails the publisher stays initialized and keeps its port, and the call can
    /// be retried; steps that already completed are not repeated.
    pub async fn terminate(&self) -> Result<()> {
        if !self
            .status
            .transition(Status::Initialized, Status::Terminating)
        {
            return Err(Error::UnknownState);
        }

        match self.shutdown().await {
            Ok(()) => {
                *self.state() = PublisherState::default();
                self.status.set(Status::Created);
                info!(
                    event = events::PUBLISHER_TERMINATE_OK,
                    component = COMPONENT,
                    "publisher terminated"
                );
                Ok(())
            }
            Err(err) => {
                self.status.set(Status::Initialized);
                warn!(
                    event = events::PUBLISHER_TERMINATE_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "publisher termination rolled back"
                );
                Err(Error::UnknownState)
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        let (topic, transport) = {
            let state = self.state();
            (state.topic.clone(), state.transport.clone())
        };

        if let Some(topic) = topic {
            if self.context.is_tns_enabled() {
                self.unregister_topic(&topic).await?;
            }
        }

        if let Some(transport) = transport {
            transport.stop().await.map_err(|e| {
                warn!(component = COMPONENT, err = %e, "unable to stop transport publisher");
                Error::UnknownState
            })?;
            self.state().transport = None;
        }

        let (port, dynamic_port) = {
            let state = self.state();
            (state.local_port, state.dynamic_port)
        };
        if let (Some(port), true) = (port, dynamic_port) {
            // A terminated context has already reset its pool.
            if !self.context.is_terminated() {
                self.context.release_dynamic_port(port)?;
            }
            self.state().dynamic_port = false;
        }
        Ok(())
    }

    /// `true` unless the publisher is initialized or terminating.
    pub fn is_terminated(&self) -> bool {
        self.status.get() == Status::Created
    }

    pub fn topic(&self) -> Option<Topic> {
        self.state().topic.clone()
    }

    pub fn local_port(&self) -> Option<u16> {
        self.state().local_port
    }
}
