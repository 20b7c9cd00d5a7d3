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
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use topic_plane::{RestClient, RestClientError, RestResponse};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A request as received by [`ScriptedRestClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub body: String,
}

#[derive(Default)]
struct Script {
    routes: HashMap<(Method, String), RestResponse>,
    calls: Vec<RecordedCall>,
}

/// [`RestClient`] answering from a fixed table of `(method, url)` routes.
///
/// Requests without a route fail like an unreachable server. Every request is recorded,
/// routed or not.
#[derive(Default)]
pub struct ScriptedRestClient {
    script: Mutex<Script>,
}

impl ScriptedRestClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs or replaces the response for `method` on `url`.
    pub fn route(&self, method: Method, url: &str, status: u16, body: &str) {
        self.script()
            .routes
            .insert((method, url.to_string()), RestResponse::new(status, body));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script().calls.clone()
    }

    pub fn calls_to(&self, method: Method, url: &str) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| call.method == method && call.url == url)
            .count()
    }

    fn answer(&self, method: Method, url: &str, body: String) -> Result<RestResponse, RestClientError> {
        debug!("scripted {method:?} {url}");
        let mut script = self.script();
        script.calls.push(RecordedCall {
            method,
            url: url.to_string(),
            body,
        });
        script
            .routes
            .get(&(method, url.to_string()))
            .cloned()
            .ok_or_else(|| RestClientError(format!("connection refused: {method:?} {url}")))
    }
}

#[async_trait]
impl RestClient for ScriptedRestClient {
    async fn get(&self, url: &str) -> Result<RestResponse, RestClientError> {
        self.answer(Method::Get, url, String::new())
    }

    async fn post(&self, url: &str, body: String) -> Result<RestResponse, RestClientError> {
        self.answer(Method::Post, url, body)
    }

    async fn delete(&self, url: &str) -> Result<RestResponse, RestClientError> {
        self.answer(Method::Delete, url, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::{Method, ScriptedRestClient};
    use topic_plane::RestClient;

    #[tokio::test]
    async fn answers_routes_and_records_every_call() {
        let rest = ScriptedRestClient::new();
        rest.route(Method::Get, "http://tns/a", 200, "{}");

        let response = rest.get("http://tns/a").await.expect("routed");
        assert_eq!(response.status, 200);
        assert!(rest.post("http://tns/a", "x".to_string()).await.is_err());

        assert_eq!(rest.calls().len(), 2);
        assert_eq!(rest.calls_to(Method::Post, "http://tns/a"), 1);
        assert_eq!(rest.calls()[1].body, "x");
    }
}
