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

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const LOCAL_PORT_START: u16 = 4000;
pub const LOCAL_PORT_MAX: u16 = 100;
pub const CONNECTION_TIMEOUT_SECS: u64 = 5;
pub const TNS_KNOWN_PORT: u16 = 48323;
pub const NODE_ADDRESS: &str = "http://pharos-node:48098";
pub const HOST_NAME_FILE_PATH: &str = "/etc/hostname";
pub const LOCAL_HOST: &str = "localhost";

/// Tunables of a [`Context`](crate::Context).
///
/// Every field has a default, so a partial JSON/JSON5 document deserializes cleanly.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ContextConfig {
    /// First port of the dynamic port pool.
    pub local_port_start: u16,
    /// Number of ports in the dynamic port pool.
    pub local_port_max: u16,
    pub connection_timeout_secs: u64,
    /// Base URL of the container node management API.
    pub node_address: String,
    /// File holding the container host identifier.
    pub host_name_file: String,
    /// Port the TNS listens on when its address carries no explicit port.
    pub tns_port: u16,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            local_port_start: LOCAL_PORT_START,
            local_port_max: LOCAL_PORT_MAX,
            connection_timeout_secs: CONNECTION_TIMEOUT_SECS,
            node_address: NODE_ADDRESS.to_string(),
            host_name_file: HOST_NAME_FILE_PATH.to_string(),
            tns_port: TNS_KNOWN_PORT,
        }
    }
}

impl ContextConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}
