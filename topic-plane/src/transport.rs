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

//! Contract of the byte-level pub/sub transport the control plane drives.
//!
//! The transport owns sockets, framing and delivery. The control plane only creates,
//! starts and stops publishers/subscribers and tells subscribers what to listen to.

use crate::endpoint::Endpoint;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a transport implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A message as delivered by the transport, tagged by content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Opaque byte payload; the only content type the control plane forwards to applications.
    ByteData(Vec<u8>),
    /// Protobuf-encoded transport event.
    Protobuf(Vec<u8>),
    Text(String),
}

impl Message {
    pub fn content_type(&self) -> &'static str {
        match self {
            Message::ByteData(_) => "byte_data",
            Message::Protobuf(_) => "protobuf",
            Message::Text(_) => "text",
        }
    }
}

/// Callback invoked by the transport for every inbound message.
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_receive(&self, topic: &str, message: Message);
}

#[async_trait]
pub trait TransportPublisher: Send + Sync {
    async fn start(&self) -> Result<(), TransportError>;
    async fn stop(&self) -> Result<(), TransportError>;
    async fn publish(&self, topic: &str, message: Message) -> Result<(), TransportError>;
}

#[async_trait]
pub trait TransportSubscriber: Send + Sync {
    async fn start(&self) -> Result<(), TransportError>;
    async fn stop(&self) -> Result<(), TransportError>;
    /// Subscribes to `topic` on the endpoint the subscriber was created for.
    async fn subscribe_for_topic(&self, topic: &str) -> Result<(), TransportError>;
    /// Subscribes to `topic` on an additional publisher endpoint.
    async fn subscribe_with_endpoint(
        &self,
        endpoint: &Endpoint,
        topic: &str,
    ) -> Result<(), TransportError>;
}

/// Process-level entry point of the transport library.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn initialize(&self) -> Result<(), TransportError>;
    async fn terminate(&self) -> Result<(), TransportError>;
    async fn create_publisher(
        &self,
        port: u16,
    ) -> Result<Arc<dyn TransportPublisher>, TransportError>;
    async fn create_subscriber(
        &self,
        endpoint: &Endpoint,
        listener: Arc<dyn MessageListener>,
    ) -> Result<Arc<dyn TransportSubscriber>, TransportError>;
}
