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

//! # topic-plane
//!
//! `topic-plane` is the control plane of a topic-based publish/subscribe overlay. Publishers
//! bind a local port, register a hierarchical topic with the Topic Name Service (TNS) and keep
//! the registration alive; subscribers resolve topic names through the TNS and subscribe to
//! every matching publisher endpoint. Moving bytes is left to a pluggable [`Transport`].
//!
//! Everything hangs off a shared [`Context`], initialized either stand-alone or inside a
//! managed container whose addressing and NAT table come from the node management API.
//!
//! ## Stand-alone publishing
//!
//! ```
//! use std::sync::Arc;
//! use topic_plane::{Context, ContextConfig, Message, Publisher, ReqwestRestClient};
//! use data_model_static_file::JsonModelParser;
//!
//! # pub mod mock_transport {
//! #     use std::sync::Arc;
//! #     use async_trait::async_trait;
//! #     use topic_plane::{
//! #         Endpoint, Message, MessageListener, Transport, TransportError, TransportPublisher,
//! #         TransportSubscriber,
//! #     };
//! #
//! #     pub struct MockTransport;
//! #     struct MockPublisher;
//! #
//! #     #[async_trait]
//! #     impl TransportPublisher for MockPublisher {
//! #         async fn start(&self) -> Result<(), TransportError> { Ok(()) }
//! #         async fn stop(&self) -> Result<(), TransportError> { Ok(()) }
//! #         async fn publish(&self, _topic: &str, _message: Message) -> Result<(), TransportError> { Ok(()) }
//! #     }
//! #
//! #     #[async_trait]
//! #     impl Transport for MockTransport {
//! #         async fn initialize(&self) -> Result<(), TransportError> { Ok(()) }
//! #         async fn terminate(&self) -> Result<(), TransportError> { Ok(()) }
//! #         async fn create_publisher(&self, _port: u16) -> Result<Arc<dyn TransportPublisher>, TransportError> {
//! #             Ok(Arc::new(MockPublisher))
//! #         }
//! #         async fn create_subscriber(
//! #             &self,
//! #             _endpoint: &Endpoint,
//! #             _listener: Arc<dyn MessageListener>,
//! #         ) -> Result<Arc<dyn TransportSubscriber>, TransportError> {
//! #             unimplemented!("not needed for this doctest")
//! #         }
//! #     }
//! # }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let config = ContextConfig::default();
//! let rest = ReqwestRestClient::new(config.connection_timeout()).unwrap();
//! let context = Context::new(
//!     config,
//!     Arc::new(mock_transport::MockTransport),
//!     Arc::new(rest),
//!     Arc::new(JsonModelParser::new()),
//! );
//! context.initialize_stand_alone(false, "").await.unwrap();
//!
//! let publisher = Publisher::create(context.clone(), Some(4500), "/vehicle/speed", "speed-model")
//!     .await
//!     .unwrap();
//! assert_eq!(publisher.topic().unwrap().endpoint().to_string(), "tcp://localhost:4500");
//!
//! publisher.publish(Message::ByteData(vec![0, 42])).await.unwrap();
//! publisher.terminate().await.unwrap();
//! context.terminate().await.unwrap();
//! # });
//! ```
//!
//! ## Lease renewal
//!
//! With TNS enabled every registered topic carries a lease. A single [`TopicHandler`] worker
//! per context owns the set of registered topic names and, once the lease interval is known,
//! renews all of them with one keep-alive request per interval.
//!
//! ## Observability model
//!
//! Library code emits `tracing` events carrying a canonical `event` name and a `component`
//! field, and never installs a global subscriber. Binaries and tests initialize
//! `tracing_subscriber` themselves.

mod config;
pub use config::{ContextConfig, TNS_KNOWN_PORT};

mod context;
pub use context::Context;

mod data_model;
pub use data_model::{ModelError, ModelParser, Representation};

mod endpoint;
pub use endpoint::Endpoint;

mod error;
pub use error::{Error, Result};

mod lifecycle;

#[doc(hidden)]
pub mod observability;

mod publisher;
pub use publisher::Publisher;

mod rest;
pub use rest::{RestClient, RestClientError, RestResponse, ReqwestRestClient};

mod subscriber;
pub use subscriber::{Subscriber, TopicListener};

mod tns;
pub use tns::TnsClient;

mod topic;
pub use topic::{validate_topic, Topic};

mod topic_handler;
pub use topic_handler::{Command, TopicHandler};

mod transport;
pub use transport::{
    Message, MessageListener, Transport, TransportError, TransportPublisher, TransportSubscriber,
};
