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

//! Shared runtime state of the control plane.

mod node_discovery;
mod port_pool;

use crate::config::{ContextConfig, LOCAL_HOST};
use crate::data_model::{ModelParser, Representation};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::observability::events;
use crate::rest::RestClient;
use crate::tns::TnsClient;
use crate::topic_handler::TopicHandler;
use crate::transport::Transport;
use port_pool::PortPool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "context";

struct ContextState {
    stand_alone: bool,
    tns_enabled: bool,
    tns_address: String,
    host_address: String,
    host_name: String,
    ports: PortPool,
    nat_ports: HashMap<u16, u16>,
    models: HashMap<String, Arc<Representation>>,
}

impl ContextState {
    fn new(config: &ContextConfig) -> Self {
        Self {
            stand_alone: false,
            tns_enabled: false,
            tns_address: String::new(),
            host_address: String::new(),
            host_name: String::new(),
            ports: PortPool::new(config.local_port_start, config.local_port_max),
            nat_ports: HashMap::new(),
            models: HashMap::new(),
        }
    }

    fn clear(&mut self) {
        self.stand_alone = false;
        self.tns_enabled = false;
        self.tns_address.clear();
        self.host_address.clear();
        self.host_name.clear();
        self.ports.reset();
        self.nat_ports.clear();
        self.models.clear();
    }
}

/// Process-wide state every [`Publisher`](crate::Publisher) and
/// [`Subscriber`](crate::Subscriber) is bound to.
///
/// A `Context` is initialized either stand-alone (loopback host, optional TNS) or in
/// container mode, where addressing, TNS location and NAT port mappings are discovered from
/// the node management API. It owns the dynamic port pool, the data-model cache and the
/// [`TopicHandler`] that renews TNS leases.
///
/// Collaborators are injected so that tests can substitute fakes:
///
/// ```no_run
/// # use std::sync::Arc;
/// # use topic_plane::{Context, ContextConfig, ModelParser, ReqwestRestClient, Transport};
/// # async fn demo(transport: Arc<dyn Transport>, parser: Arc<dyn ModelParser>) -> topic_plane::Result<()> {
/// let config = ContextConfig::default();
/// let rest = ReqwestRestClient::new(config.connection_timeout())
///     .map_err(|_| topic_plane::Error::UnknownState)?;
/// let context = Context::new(config, transport, Arc::new(rest), parser);
/// context.initialize_stand_alone(true, "10.0.0.9").await?;
/// # Ok(())
/// # }
/// ```
pub struct Context {
    config: ContextConfig,
    transport: Arc<dyn Transport>,
    rest: Arc<dyn RestClient>,
    model_parser: Arc<dyn ModelParser>,
    initialized: AtomicBool,
    terminated: AtomicBool,
    state: Mutex<ContextState>,
    topic_handler: TopicHandler,
}

impl Context {
    pub fn new(
        config: ContextConfig,
        transport: Arc<dyn Transport>,
        rest: Arc<dyn RestClient>,
        model_parser: Arc<dyn ModelParser>,
    ) -> Arc<Self> {
        let state = Mutex::new(ContextState::new(&config));
        Arc::new(Self {
            config,
            transport,
            rest,
            model_parser,
            initialized: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            state,
            topic_handler: TopicHandler::new(),
        })
    }

    fn state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_not_running(&self) -> Result<()> {
        if self.is_initialized() {
            warn!(
                event = events::CONTEXT_INIT_FAILED,
                component = COMPONENT,
                "context is already initialized"
            );
            return Err(Error::UnknownState);
        }
        Ok(())
    }

    async fn initialize_transport(&self) -> Result<()> {
        self.transport.initialize().await.map_err(|e| {
            error!(
                event = events::CONTEXT_INIT_FAILED,
                component = COMPONENT,
                err = %e,
                "transport library failed to initialize"
            );
            Error::UnknownState
        })
    }

    fn ensure_not_terminated(&self) -> Result<()> {
        if self.is_terminated() {
            return Err(Error::Terminated);
        }
        Ok(())
    }

    fn mark_initialized(&self) {
        self.terminated.store(false, Ordering::SeqCst);
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// Initializes for a single host. Endpoints resolve to `localhost` and the port the
    /// publisher was bound to.
    ///
    /// With `use_tns`, topics are registered with the TNS at `tns_address`; otherwise TNS is
    /// never contacted.
    pub async fn initialize_stand_alone(&self, use_tns: bool, tns_address: &str) -> Result<()> {
        self.ensure_not_running()?;
        self.initialize_transport().await?;

        {
            let mut state = self.state();
            state.stand_alone = true;
            state.host_address = LOCAL_HOST.to_string();
            state.tns_enabled = use_tns;
            if use_tns {
                state.tns_address = tns_address.to_string();
            }
        }
        self.mark_initialized();

        info!(
            event = events::CONTEXT_INIT_OK,
            component = COMPONENT,
            mode = "stand_alone",
            use_tns,
            "context initialized"
        );
        Ok(())
    }

    /// Initializes inside a managed container, discovering TNS address, node address and
    /// the NAT table of this container from the node management API.
    ///
    /// Nothing is applied unless every discovery step succeeds.
    pub async fn initialize_docker(&self) -> Result<()> {
        self.ensure_not_running()?;
        let discovery = node_discovery::discover(self.rest.as_ref(), &self.config).await?;
        self.initialize_transport().await?;

        let mapped = discovery.nat_ports.len();
        {
            let mut state = self.state();
            state.stand_alone = false;
            state.tns_enabled = true;
            state.tns_address = discovery.tns_address;
            state.host_address = discovery.node_address;
            state.host_name = discovery.host_name;
            state.nat_ports = discovery.nat_ports;
        }
        self.mark_initialized();

        info!(
            event = events::CONTEXT_INIT_OK,
            component = COMPONENT,
            mode = "docker",
            mapped_ports = mapped,
            "context initialized"
        );
        Ok(())
    }

    /// Hands out a free port from the dynamic pool.
    pub fn assign_dynamic_port(&self) -> Result<u16> {
        self.ensure_not_terminated()?;
        self.state().ports.assign()
    }

    pub fn release_dynamic_port(&self, port: u16) -> Result<()> {
        self.ensure_not_terminated()?;
        self.state().ports.release(port)
    }

    /// Maps a local port to the endpoint other hosts reach it on.
    pub fn resolve_host_endpoint(&self, private_port: u16) -> Result<Endpoint> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        let state = self.state();
        if state.stand_alone {
            return Ok(Endpoint::new(&state.host_address, private_port));
        }
        match state.nat_ports.get(&private_port) {
            Some(public_port) => Ok(Endpoint::new(&state.host_address, *public_port)),
            None => {
                warn!(
                    event = events::HOST_ENDPOINT_UNMAPPED,
                    component = COMPONENT,
                    port = private_port,
                    "no NAT mapping for local port"
                );
                Err(Error::UnknownState)
            }
        }
    }

    pub fn get_representation(&self, model_id: &str) -> Result<Arc<Representation>> {
        self.ensure_not_terminated()?;
        self.state().models.get(model_id).cloned().ok_or_else(|| {
            debug!(
                event = events::MODEL_LOOKUP_MISS,
                component = COMPONENT,
                model_id,
                "data model not cached"
            );
            Error::UnknownAmlModel
        })
    }

    /// Parses every model file in order and caches the result under its model id.
    ///
    /// The first cached representation for an id is kept. Parsing stops at the first
    /// failure; models cached before it remain available.
    pub async fn add_representations<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<String>> {
        self.ensure_not_terminated()?;
        let mut ids = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let representation = self.model_parser.parse_representation(path).map_err(|e| {
                warn!(
                    event = events::MODEL_PARSE_FAILED,
                    component = COMPONENT,
                    path = %path.display(),
                    err = %e,
                    "unable to parse data model"
                );
                Error::InvalidAmlModel
            })?;

            let id = representation.id().to_string();
            self.state()
                .models
                .entry(id.clone())
                .or_insert_with(|| Arc::new(representation));
            debug!(
                event = events::MODEL_CACHED,
                component = COMPONENT,
                model_id = id.as_str(),
                "data model cached"
            );
            ids.push(id);
        }
        Ok(ids)
    }

    /// Stops the topic handler, drops all cached state and shuts down the transport library.
    ///
    /// Port and model operations fail with [`Error::Terminated`] until the context is
    /// initialized again.
    pub async fn terminate(&self) -> Result<()> {
        if self.is_terminated() {
            return Err(Error::Terminated);
        }

        self.topic_handler.terminate_handler().await;
        self.state().clear();

        if let Err(err) = self.transport.terminate().await {
            warn!(
                event = events::CONTEXT_TRANSPORT_SHUTDOWN_FAILED,
                component = COMPONENT,
                err = %err,
                "transport library failed to shut down"
            );
        }

        self.initialized.store(false, Ordering::SeqCst);
        self.terminated.store(true, Ordering::SeqCst);
        info!(
            event = events::CONTEXT_TERMINATE_OK,
            component = COMPONENT,
            "context terminated"
        );
        Ok(())
    }

    /// Client for the recorded TNS, [`Error::TnsNotAvailable`] when TNS is disabled.
    pub fn tns_client(&self) -> Result<TnsClient> {
        let state = self.state();
        if !state.tns_enabled {
            return Err(Error::TnsNotAvailable);
        }
        Ok(TnsClient::new(
            self.rest.clone(),
            &state.tns_address,
            self.config.tns_port,
        ))
    }

    /// Starts the topic handler unless this is a stand-alone context without TNS.
    pub(crate) fn start_topic_handler(&self) -> Result<()> {
        let (stand_alone, tns_enabled) = {
            let state = self.state();
            (state.stand_alone, state.tns_enabled)
        };
        if stand_alone && !tns_enabled {
            return Ok(());
        }
        self.topic_handler.init_handler(self.tns_client().ok())
    }

    pub fn topic_handler(&self) -> &TopicHandler {
        &self.topic_handler
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn is_stand_alone(&self) -> bool {
        self.state().stand_alone
    }

    pub fn is_tns_enabled(&self) -> bool {
        self.state().tns_enabled
    }

    pub fn tns_address(&self) -> String {
        self.state().tns_address.clone()
    }

    /// Address published in endpoints: `localhost` stand-alone, the node address in containers.
    pub fn host_address(&self) -> String {
        self.state().host_address.clone()
    }

    /// Container host identifier; empty outside container mode.
    pub fn host_name(&self) -> String {
        self.state().host_name.clone()
    }
}
