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

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use topic_plane::TopicListener;
use tracing::debug;

#[derive(Clone, Default)]
pub struct RecordingTopicListener {
    message_store: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl RecordingTopicListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(String, Vec<u8>)> {
        self.message_store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TopicListener for RecordingTopicListener {
    async fn on_data(&self, topic: &str, payload: Vec<u8>) {
        debug!("within recording listener! topic: {topic} bytes: {}", payload.len());
        self.message_store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_string(), payload));
    }
}
