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
use crate::data_model::Representation;
use crate::error::{Error, Result};
use crate::lifecycle::{Status, StatusCell};
use crate::observability::events;
use crate::topic::{validate_topic, Topic};
use crate::transport::{Message, MessageListener, TransportSubscriber};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const COMPONENT: &str = "subscriber";

/// Receives the byte payloads published on subscribed topics.
#[async_trait]
pub trait TopicListener: Send + Sync {
    async fn on_data(&self, topic: &str, payload: Vec<u8>);
}

/// Forwards byte payloads to the application listener and drops everything else.
struct DispatchListener {
    listener: Arc<dyn TopicListener>,
}

#[async_trait]
impl MessageListener for DispatchListener {
    async fn on_receive(&self, topic: &str, message: Message) {
        match message {
            Message::ByteData(payload) => self.listener.on_data(topic, payload).await,
            other => debug!(
                event = events::DISPATCH_DROP_UNSUPPORTED_CONTENT,
                component = COMPONENT,
                topic,
                content_type = other.content_type(),
                "dropping message"
            ),
        }
    }
}

#[derive(Default)]
struct SubscriberState {
    transport: Option<Arc<dyn TransportSubscriber>>,
    topics: Vec<Topic>,
    representations: HashMap<String, Arc<Representation>>,
}

/// Subscribes to topics discovered through the TNS, or given explicitly, and hands their
/// payloads to a [`TopicListener`].
pub struct Subscriber {
    context: Arc<Context>,
    dispatch: Arc<DispatchListener>,
    status: StatusCell,
    state: Mutex<SubscriberState>,
}

impl Subscriber {
    pub fn new(context: Arc<Context>, listener: Arc<dyn TopicListener>) -> Self {
        Self {
            context,
            dispatch: Arc::new(DispatchListener { listener }),
            status: StatusCell::new(),
            state: Mutex::new(SubscriberState::default()),
        }
    }

    /// Resolves `topic_name` through the TNS and subscribes to every topic it returns.
    ///
    /// With `hierarchical` set, all registered descendants of `topic_name` are included.
    pub async fn initialize(&self, topic_name: &str, hierarchical: bool) -> Result<()> {
        self.ensure_context()?;
        if !validate_topic(topic_name) {
            return Err(Error::InvalidTopic);
        }
        let tns = self.context.tns_client()?;
        let topics = tns.query_topics(topic_name, hierarchical).await?;
        self.store_topics(topics).await
    }

    fn ensure_context(&self) -> Result<()> {
        if !self.context.is_initialized() {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    /// Subscribes to `topics` directly, without asking the TNS.
    pub async fn subscribe_topics(&self, topics: Vec<Topic>) -> Result<()> {
        self.store_topics(topics).await
    }

    /// Subscribes to each topic in order.
    ///
    /// Stops at the first rejected topic; topics subscribed before it stay subscribed and
    /// the subscriber can be terminated to drop them.
    pub async fn store_topics(&self, topics: Vec<Topic>) -> Result<()> {
        self.ensure_context()?;
        if self.status.get() == Status::Terminating {
            return Err(Error::UnknownState);
        }

        let mut state = self.state.lock().await;
        let stored = self.store_each(&mut state, topics).await;
        if stored.is_ok() || state.transport.is_some() {
            self.status.transition(Status::Created, Status::Initialized);
        }
        stored
    }

    async fn store_each(&self, state: &mut SubscriberState, topics: Vec<Topic>) -> Result<()> {
        for topic in topics {
            if topic.is_secured() {
                warn!(
                    event = events::SUBSCRIBER_TOPIC_REJECTED,
                    component = COMPONENT,
                    topic = topic.name(),
                    "secured topics are not supported"
                );
                return Err(Error::InvalidParam);
            }
            if !validate_topic(topic.name()) {
                warn!(
                    event = events::SUBSCRIBER_TOPIC_REJECTED,
                    component = COMPONENT,
                    topic = topic.name(),
                    "invalid topic name"
                );
                return Err(Error::InvalidTopic);
            }
            let representation = self.context.get_representation(topic.data_model())?;

            self.subscribe(state, &topic).await?;

            state
                .representations
                .insert(topic.name().to_string(), representation);
            state.topics.push(topic);
        }
        Ok(())
    }

    async fn subscribe(&self, state: &mut SubscriberState, topic: &Topic) -> Result<()> {
        let result = match state.transport.as_ref() {
            Some(transport) => transport
                .subscribe_with_endpoint(topic.endpoint(), topic.name())
                .await
                .map_err(|e| {
                    warn!(event = events::SUBSCRIBER_SUBSCRIBE_FAILED, component = COMPONENT, topic = topic.name(), err = %e, "subscribe failed");
                    Error::SessionUnavailable
                }),
            None => {
                let transport = self.start_transport(topic).await?;
                state.transport = Some(transport.clone());
                transport.subscribe_for_topic(topic.name()).await.map_err(|e| {
                    warn!(event = events::SUBSCRIBER_SUBSCRIBE_FAILED, component = COMPONENT, topic = topic.name(), err = %e, "subscribe failed");
                    Error::SessionUnavailable
                })
            }
        };

        if result.is_ok() {
            info!(
                event = events::SUBSCRIBER_SUBSCRIBE_OK,
                component = COMPONENT,
                topic = topic.name(),
                endpoint = %topic.endpoint(),
                "subscribed"
            );
        }
        result
    }

    async fn start_transport(&self, topic: &Topic) -> Result<Arc<dyn TransportSubscriber>> {
        let transport = self
            .context
            .transport()
            .create_subscriber(topic.endpoint(), self.dispatch.clone())
            .await
            .map_err(|e| {
                warn!(event = events::SUBSCRIBER_SUBSCRIBE_FAILED, component = COMPONENT, err = %e, "unable to create transport subscriber");
                Error::UnknownState
            })?;
        transport.start().await.map_err(|e| {
            warn!(event = events::SUBSCRIBER_SUBSCRIBE_FAILED, component = COMPONENT, err = %e, "unable to start transport subscriber");
            Error::UnknownState
        })?;
        Ok(transport)
    }

    /// Stops the transport subscriber and forgets every topic.
    ///
    /// On failure the subscriber stays initialized and the call can be retried.
    pub async fn terminate(&self) -> Result<()> {
        if !self
            .status
            .transition(Status::Initialized, Status::Terminating)
        {
            return Err(Error::UnknownState);
        }

        let mut state = self.state.lock().await;
        if let Some(transport) = state.transport.as_ref() {
            if let Err(err) = transport.stop().await {
                self.status.set(Status::Initialized);
                warn!(
                    event = events::SUBSCRIBER_TERMINATE_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "subscriber termination rolled back"
                );
                return Err(Error::UnknownState);
            }
        }

        *state = SubscriberState::default();
        self.status.set(Status::Created);
        info!(
            event = events::SUBSCRIBER_TERMINATE_OK,
            component = COMPONENT,
            "subscriber terminated"
        );
        Ok(())
    }

    /// Subscribed topics in subscription order.
    pub async fn topics(&self) -> Vec<Topic> {
        self.state.lock().await.topics.clone()
    }

    /// Data-model representation of a subscribed topic.
    pub async fn representation(&self, topic_name: &str) -> Option<Arc<Representation>> {
        self.state
            .lock()
            .await
            .representations
            .get(topic_name)
            .cloned()
    }

    pub fn is_terminated(&self) -> bool {
        self.status.get() == Status::Created
    }
}

#[cfg(test)]
mod tests {
    use super::{DispatchListener, TopicListener};
    use crate::transport::{Message, MessageListener};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Collect(Mutex<Vec<(String, Vec<u8>)>>);

    #[async_trait]
    impl TopicListener for Collect {
        async fn on_data(&self, topic: &str, payload: Vec<u8>) {
            self.0.lock().unwrap().push((topic.to_string(), payload));
        }
    }

    #[tokio::test]
    async fn only_byte_data_reaches_the_application() {
        let collected = Arc::new(Collect::default());
        let dispatch = DispatchListener {
            listener: collected.clone(),
        };

        dispatch
            .on_receive("/a", Message::ByteData(vec![7, 8]))
            .await;
        dispatch.on_receive("/a", Message::Protobuf(vec![1])).await;
        dispatch
            .on_receive("/a", Message::Text("ignored".to_string()))
            .await;

        assert_eq!(
            *collected.0.lock().unwrap(),
            vec![("/a".to_string(), vec![7, 8])]
        );
    }
}
