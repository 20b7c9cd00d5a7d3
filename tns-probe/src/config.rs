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
use std::fs;
use std::path::Path;
use thiserror::Error;
use topic_plane::ContextConfig;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unable to read config file: {0}")]
    ReadConfig(#[from] std::io::Error),
    #[error("unable to parse config file: {0}")]
    ParseConfig(#[from] json5::Error),
    #[error("no TNS address given; pass --tns or set tns_address in the config file")]
    MissingTnsAddress,
    #[error("unable to build HTTP client: {0}")]
    HttpClient(#[from] topic_plane::RestClientError),
    #[error("query for '{topic}' failed: {source}")]
    Query {
        topic: String,
        source: topic_plane::Error,
    },
    #[error("unable to render output: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    #[serde(default)]
    pub(crate) tns_address: Option<String>,
    #[serde(default)]
    pub(crate) context: ContextConfig,
}

impl ProbeConfig {
    pub(crate) fn load(path: &Path) -> Result<Self, ProbeError> {
        let contents = fs::read_to_string(path)?;
        Ok(json5::from_str(&contents)?)
    }

    /// TNS address from the command line, falling back to the config file.
    pub(crate) fn resolve_tns_address(&self, cli: Option<&str>) -> Result<String, ProbeError> {
        cli.map(str::to_string)
            .or_else(|| self.tns_address.clone())
            .filter(|address| !address.is_empty())
            .ok_or(ProbeError::MissingTnsAddress)
    }
}
