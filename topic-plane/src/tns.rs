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

//! Client side of the Topic Name Service (TNS) REST protocol.

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::observability::events;
use crate::rest::{RestClient, RestResponse, HTTP_CREATED, HTTP_OK};
use crate::topic::Topic;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "tns_client";
const TNS_PREFIX: &str = "/api/v1/tns";
const TNS_TOPIC: &str = "/topic";
const TNS_KEEP_ALIVE: &str = "/keepalive";

#[derive(Serialize)]
struct RegisterRequest<'a> {
    topic: TopicPayload<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TopicPayload<'a> {
    name: &'a str,
    data_model: &'a str,
    endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    keep_alive_interval: i64,
}

#[derive(Deserialize)]
struct QueryResponse {
    topics: Vec<TopicDescriptor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicDescriptor {
    name: String,
    data_model: String,
    endpoint: String,
    secured: bool,
}

#[derive(Serialize)]
struct KeepAliveRequest<'a> {
    topic_names: &'a [String],
}

/// Stateless request/response helpers against one TNS instance.
#[derive(Clone)]
pub struct TnsClient {
    rest: Arc<dyn RestClient>,
    base_url: String,
}

impl TnsClient {
    /// Builds a client for `tns_address`.
    ///
    /// The address may be a full URL, `host:port`, or a bare host, in which case
    /// `default_port` is appended.
    pub fn new(rest: Arc<dyn RestClient>, tns_address: &str, default_port: u16) -> Self {
        let base_url = if tns_address.starts_with("http://") || tns_address.starts_with("https://")
        {
            tns_address.trim_end_matches('/').to_string()
        } else if tns_address.contains(':') {
            format!("http://{tns_address}")
        } else {
            format!("http://{tns_address}:{default_port}")
        };
        Self { rest, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn topic_url(&self) -> String {
        format!("{}{TNS_PREFIX}{TNS_TOPIC}", self.base_url)
    }

    fn keep_alive_url(&self) -> String {
        format!("{}{TNS_PREFIX}{TNS_KEEP_ALIVE}", self.base_url)
    }

    /// Registers `topic` and returns the lease (keep-alive) interval in seconds.
    pub async fn register_topic(&self, topic: &Topic) -> Result<i64> {
        let request = RegisterRequest {
            topic: TopicPayload {
                name: topic.name(),
                data_model: topic.data_model(),
                endpoint: topic.endpoint().to_string(),
            },
        };
        let body = serde_json::to_string(&request).map_err(|e| {
            warn!(event = events::TNS_REGISTER_FAILED, component = COMPONENT, err = %e, "unable to encode request");
            Error::RestError
        })?;

        let response = self.call_post(&self.topic_url(), body).await?;
        expect_status(&response, HTTP_CREATED, events::TNS_REGISTER_FAILED)?;

        let parsed: RegisterResponse = parse_body(&response, events::TNS_REGISTER_FAILED)?;
        if parsed.keep_alive_interval < 1 {
            warn!(
                event = events::TNS_REGISTER_FAILED,
                component = COMPONENT,
                interval = parsed.keep_alive_interval,
                "invalid keep-alive interval"
            );
            return Err(Error::RestError);
        }

        debug!(
            event = events::TNS_REGISTER_OK,
            component = COMPONENT,
            topic = topic.name(),
            interval = parsed.keep_alive_interval,
            "topic registered"
        );
        Ok(parsed.keep_alive_interval)
    }

    pub async fn unregister_topic(&self, name: &str) -> Result<()> {
        let url = format!("{}?name={name}", self.topic_url());
        let response = self.rest.delete(&url).await.map_err(|e| {
            warn!(event = events::TNS_UNREGISTER_FAILED, component = COMPONENT, url, err = %e, "delete request failed");
            Error::RestError
        })?;
        expect_status(&response, HTTP_OK, events::TNS_UNREGISTER_FAILED)?;

        debug!(
            event = events::TNS_UNREGISTER_OK,
            component = COMPONENT,
            topic = name,
            "topic unregistered"
        );
        Ok(())
    }

    /// Resolves `name` into the topics currently known to the TNS.
    ///
    /// With `hierarchical` set, every registered descendant of `name` is returned.
    pub async fn query_topics(&self, name: &str, hierarchical: bool) -> Result<Vec<Topic>> {
        let url = format!(
            "{}?name={name}&hierarchical={hierarchical}",
            self.topic_url()
        );
        let response = self.rest.get(&url).await.map_err(|e| {
            warn!(event = events::TNS_QUERY_FAILED, component = COMPONENT, url, err = %e, "get request failed");
            Error::RestError
        })?;
        expect_status(&response, HTTP_OK, events::TNS_QUERY_FAILED)?;

        let parsed: QueryResponse = parse_body(&response, events::TNS_QUERY_FAILED)?;
        let topics = parsed
            .topics
            .into_iter()
            .map(|descriptor| {
                let endpoint = descriptor.endpoint.parse::<Endpoint>().map_err(|_| {
                    warn!(
                        event = events::TNS_QUERY_FAILED,
                        component = COMPONENT,
                        endpoint = descriptor.endpoint.as_str(),
                        "malformed endpoint in topic descriptor"
                    );
                    Error::RestError
                })?;
                Ok(Topic::new(
                    &descriptor.name,
                    &descriptor.data_model,
                    descriptor.secured,
                    endpoint,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            event = events::TNS_QUERY_OK,
            component = COMPONENT,
            topic = name,
            hierarchical,
            found = topics.len(),
            "topics resolved"
        );
        Ok(topics)
    }

    /// Renews the lease of every topic in `topic_names` with a single request.
    pub async fn keep_alive(&self, topic_names: &[String]) -> Result<()> {
        let body = serde_json::to_string(&KeepAliveRequest { topic_names })
            .map_err(|_| Error::RestError)?;
        let response = self.call_post(&self.keep_alive_url(), body).await?;
        expect_status(&response, HTTP_OK, events::TNS_KEEPALIVE_FAILED)?;

        debug!(
            event = events::TNS_KEEPALIVE_OK,
            component = COMPONENT,
            topics = topic_names.len(),
            "keep-alive sent"
        );
        Ok(())
    }

    async fn call_post(&self, url: &str, body: String) -> Result<RestResponse> {
        self.rest.post(url, body).await.map_err(|e| {
            warn!(event = events::TNS_POST_FAILED, component = COMPONENT, url, err = %e, "post request failed");
            Error::RestError
        })
    }
}

fn expect_status(response: &RestResponse, expected: u16, event: &'static str) -> Result<()> {
    if response.status != expected {
        warn!(
            event,
            component = COMPONENT,
            status = response.status,
            expected,
            "unexpected status code"
        );
        return Err(Error::RestError);
    }
    Ok(())
}

pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(
    response: &RestResponse,
    event: &'static str,
) -> Result<T> {
    serde_json::from_str(&response.body).map_err(|e| {
        warn!(event, component = COMPONENT, err = %e, "malformed response body");
        Error::RestError
    })
}

#[cfg(test)]
mod tests {
    use super::TnsClient;
    use crate::rest::{RestClient, RestClientError, RestResponse};
    use crate::{Endpoint, Error, Topic};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct FixedRest {
        response: RestResponse,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl FixedRest {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: RestResponse::new(status, body),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn record(&self, method: &str, url: &str, body: &str) -> RestResponse {
            self.calls.lock().unwrap().push((
                method.to_string(),
                url.to_string(),
                body.to_string(),
            ));
            self.response.clone()
        }
    }

    #[async_trait]
    impl RestClient for FixedRest {
        async fn get(&self, url: &str) -> Result<RestResponse, RestClientError> {
            Ok(self.record("GET", url, ""))
        }

        async fn post(&self, url: &str, body: String) -> Result<RestResponse, RestClientError> {
            Ok(self.record("POST", url, &body))
        }

        async fn delete(&self, url: &str) -> Result<RestResponse, RestClientError> {
            Ok(self.record("DELETE", url, ""))
        }
    }

    fn topic() -> Topic {
        Topic::new("/sensor/temp", "model-1", false, Endpoint::new("10.0.0.1", 4000))
    }

    #[test]
    fn base_url_respects_scheme_and_port() {
        let rest = FixedRest::new(200, "");
        assert_eq!(
            TnsClient::new(rest.clone(), "10.0.0.9", 48323).base_url(),
            "http://10.0.0.9:48323"
        );
        assert_eq!(
            TnsClient::new(rest.clone(), "10.0.0.9:9000", 48323).base_url(),
            "http://10.0.0.9:9000"
        );
        assert_eq!(
            TnsClient::new(rest, "https://tns.local/", 48323).base_url(),
            "https://tns.local"
        );
    }

    #[tokio::test]
    async fn register_posts_topic_and_returns_interval() {
        let rest = FixedRest::new(201, r#"{"keepAliveInterval": 30}"#);
        let client = TnsClient::new(rest.clone(), "10.0.0.9", 48323);

        assert_eq!(client.register_topic(&topic()).await, Ok(30));

        let calls = rest.calls.lock().unwrap();
        let (method, url, body) = &calls[0];
        assert_eq!(method, "POST");
        assert_eq!(url, "http://10.0.0.9:48323/api/v1/tns/topic");
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["topic"]["name"], "/sensor/temp");
        assert_eq!(body["topic"]["dataModel"], "model-1");
        assert_eq!(body["topic"]["endpoint"], "tcp://10.0.0.1:4000");
    }

    #[tokio::test]
    async fn register_rejects_wrong_status_and_bad_interval() {
        let ok_status_wrong_code = FixedRest::new(200, r#"{"keepAliveInterval": 30}"#);
        let client = TnsClient::new(ok_status_wrong_code, "tns", 48323);
        assert_eq!(client.register_topic(&topic()).await, Err(Error::RestError));

        let zero_interval = FixedRest::new(201, r#"{"keepAliveInterval": 0}"#);
        let client = TnsClient::new(zero_interval, "tns", 48323);
        assert_eq!(client.register_topic(&topic()).await, Err(Error::RestError));

        let missing_key = FixedRest::new(201, r#"{}"#);
        let client = TnsClient::new(missing_key, "tns", 48323);
        assert_eq!(client.register_topic(&topic()).await, Err(Error::RestError));
    }

    #[tokio::test]
    async fn unregister_uses_name_query_parameter() {
        let rest = FixedRest::new(200, "");
        let client = TnsClient::new(rest.clone(), "tns", 48323);

        assert_eq!(client.unregister_topic("/sensor/temp").await, Ok(()));
        assert_eq!(
            rest.calls.lock().unwrap()[0].1,
            "http://tns:48323/api/v1/tns/topic?name=/sensor/temp"
        );
    }

    #[tokio::test]
    async fn query_parses_descriptors() {
        let rest = FixedRest::new(
            200,
            r#"{"topics":[
                {"name":"/a/b","dataModel":"m1","endpoint":"10.0.0.1:4000","secured":false},
                {"name":"/a/c","dataModel":"m2","endpoint":"10.0.0.2:4001","secured":true}
            ]}"#,
        );
        let client = TnsClient::new(rest.clone(), "tns", 48323);

        let topics = client.query_topics("/a", true).await.expect("query succeeds");

        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].name(), "/a/b");
        assert_eq!(topics[1].endpoint(), &Endpoint::new("10.0.0.2", 4001));
        assert!(topics[1].is_secured());
        assert_eq!(
            rest.calls.lock().unwrap()[0].1,
            "http://tns:48323/api/v1/tns/topic?name=/a&hierarchical=true"
        );
    }

    #[tokio::test]
    async fn query_fails_on_missing_descriptor_field() {
        let rest = FixedRest::new(
            200,
            r#"{"topics":[{"name":"/a","endpoint":"10.0.0.1:4000","secured":false}]}"#,
        );
        let client = TnsClient::new(rest, "tns", 48323);

        assert_eq!(
            client.query_topics("/a", false).await.unwrap_err(),
            Error::RestError
        );
    }

    #[tokio::test]
    async fn keep_alive_lists_all_topic_names() {
        let rest = FixedRest::new(200, "");
        let client = TnsClient::new(rest.clone(), "tns", 48323);

        let names = vec!["/a".to_string(), "/b".to_string()];
        assert_eq!(client.keep_alive(&names).await, Ok(()));

        let calls = rest.calls.lock().unwrap();
        assert_eq!(calls[0].1, "http://tns:48323/api/v1/tns/keepalive");
        assert_eq!(calls[0].2, r#"{"topic_names":["/a","/b"]}"#);
    }
}
