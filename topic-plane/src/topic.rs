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

use crate::endpoint::Endpoint;
use std::hash::{Hash, Hasher};

/// A named, hierarchical topic bound to the endpoint that publishes it.
///
/// Two topics are equal when their names are equal, regardless of endpoint or model.
#[derive(Clone, Debug)]
pub struct Topic {
    name: String,
    data_model: String,
    secured: bool,
    endpoint: Endpoint,
}

impl Topic {
    pub fn new(name: &str, data_model: &str, secured: bool, endpoint: Endpoint) -> Self {
        Self {
            name: name.to_string(),
            data_model: data_model.to_string(),
            secured,
            endpoint,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the data model describing this topic's payloads.
    pub fn data_model(&self) -> &str {
        &self.data_model
    }

    pub fn is_secured(&self) -> bool {
        self.secured
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Topic {}

impl Hash for Topic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Checks a topic name against the naming grammar.
///
/// A valid name is one or more `/segment` parts, where a segment is a non-empty run of
/// ASCII alphanumerics or `-`, `_`, `.`, `*`. A single trailing `/` is tolerated.
///
/// ```
/// use topic_plane::validate_topic;
///
/// assert!(validate_topic("/sensor/temp"));
/// assert!(validate_topic("/sensor/temp/"));
/// assert!(!validate_topic("sensor/temp"));
/// assert!(!validate_topic("/sensor//temp"));
/// ```
pub fn validate_topic(name: &str) -> bool {
    let trimmed = name.strip_suffix('/').unwrap_or(name);
    let Some(body) = trimmed.strip_prefix('/') else {
        return false;
    };

    body.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '*'))
    })
}
