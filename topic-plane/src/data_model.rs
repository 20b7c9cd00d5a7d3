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

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("data model error: {0}")]
pub struct ModelError(pub String);

/// Parsed description of a data model, identified by its model id.
///
/// The control plane only caches and hands out representations; encoding and decoding
/// payloads against them is left to the application.
#[derive(Clone, Debug, PartialEq)]
pub struct Representation {
    id: String,
    description: serde_json::Value,
}

impl Representation {
    pub fn new(id: &str, description: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            description,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &serde_json::Value {
        &self.description
    }
}

/// Turns a model description file into a [`Representation`].
pub trait ModelParser: Send + Sync {
    fn parse_representation(&self, path: &Path) -> Result<Representation, ModelError>;
}
