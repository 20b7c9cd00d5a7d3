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

//! Minimal HTTP seam used for node discovery and TNS calls.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const HTTP_OK: u16 = 200;
pub const HTTP_CREATED: u16 = 201;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("HTTP request failed: {0}")]
pub struct RestClientError(pub String);

/// Status code and raw body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Blocking-free HTTP client. Every call completes or fails within the client's timeout.
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<RestResponse, RestClientError>;
    /// POSTs a JSON document.
    async fn post(&self, url: &str, body: String) -> Result<RestResponse, RestClientError>;
    async fn delete(&self, url: &str) -> Result<RestResponse, RestClientError>;
}

/// [`RestClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestRestClient {
    client: Client,
}

impl ReqwestRestClient {
    pub fn new(timeout: Duration) -> Result<Self, RestClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RestClientError(format!("unable to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn finish(
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<RestResponse, RestClientError> {
        let response = response.map_err(|e| RestClientError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RestClientError(format!("unable to read response body: {e}")))?;
        debug!(status, body = body.as_str(), "REST response");
        Ok(RestResponse { status, body })
    }
}

#[async_trait]
impl RestClient for ReqwestRestClient {
    async fn get(&self, url: &str) -> Result<RestResponse, RestClientError> {
        debug!(url, "REST GET");
        Self::finish(self.client.get(url).send().await).await
    }

    async fn post(&self, url: &str, body: String) -> Result<RestResponse, RestClientError> {
        debug!(url, body = body.as_str(), "REST POST");
        Self::finish(
            self.client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await,
        )
        .await
    }

    async fn delete(&self, url: &str) -> Result<RestResponse, RestClientError> {
        debug!(url, "REST DELETE");
        Self::finish(self.client.delete(url).send().await).await
    }
}
