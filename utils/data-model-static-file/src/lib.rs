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

use serde_json::Value;
use std::fs::{self, canonicalize};
use std::path::Path;
use topic_plane::{ModelError, ModelParser, Representation};
use tracing::debug;

const ID_KEY: &str = "id";

/// Reads data-model descriptions from JSON files.
///
/// A model file is a JSON object with a string `id`; the whole document becomes the
/// representation's description.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonModelParser;

impl JsonModelParser {
    pub fn new() -> Self {
        JsonModelParser
    }
}

impl ModelParser for JsonModelParser {
    fn parse_representation(&self, path: &Path) -> Result<Representation, ModelError> {
        let model_file = canonicalize(path)
            .map_err(|e| ModelError(format!("Model file not found: {e:?}")))?;
        debug!("model_file: {model_file:?}");

        let data = fs::read_to_string(&model_file)
            .map_err(|e| ModelError(format!("Unable to read file: {e:?}")))?;

        let description: Value = serde_json::from_str(&data)
            .map_err(|e| ModelError(format!("Unable to parse JSON: {e:?}")))?;

        let id = description
            .as_object()
            .ok_or_else(|| ModelError("Model description is not a JSON object".to_string()))?
            .get(ID_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ModelError(format!("Model description lacks a string '{ID_KEY}'")))?
            .to_string();

        debug!("parsed model '{id}' from {model_file:?}");
        Ok(Representation::new(&id, description))
    }
}
