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

//! Resolution of addressing and NAT port mappings from the container node API.

use crate::config::ContextConfig;
use crate::error::{Error, Result};
use crate::observability::events;
use crate::rest::{RestClient, RestResponse, HTTP_OK};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::fs;
use tracing::{debug, warn};

const COMPONENT: &str = "node_discovery";
const API_PREFIX: &str = "/api/v1";
const API_CONFIG: &str = "/management/device/configuration";
const API_APPS: &str = "/management/apps";
const APP_STATE_RUNNING: &str = "running";

#[derive(Deserialize)]
struct ConfigResponse {
    properties: Vec<ConfigProperty>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigProperty {
    remote_address: Option<String>,
    node_address: Option<String>,
}

#[derive(Deserialize)]
struct AppsResponse {
    properties: Vec<AppProperty>,
}

#[derive(Deserialize)]
struct AppProperty {
    id: String,
    state: String,
}

#[derive(Deserialize)]
struct AppInfo {
    services: Vec<AppService>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppService {
    container_id: String,
    ports: Option<Vec<PortMapping>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortMapping {
    private_port: u16,
    public_port: u16,
}

/// Everything learned from the node API. Only applied to a context once complete.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct NodeDiscovery {
    pub(crate) tns_address: String,
    pub(crate) node_address: String,
    pub(crate) host_name: String,
    pub(crate) nat_ports: HashMap<u16, u16>,
}

pub(crate) async fn discover(rest: &dyn RestClient, config: &ContextConfig) -> Result<NodeDiscovery> {
    let base = format!("{}{API_PREFIX}", config.node_address.trim_end_matches('/'));
    let mut discovery = NodeDiscovery::default();

    let config_url = format!("{base}{API_CONFIG}");
    let response: ConfigResponse = get_json(rest, &config_url).await?;
    let mut tns_address = None;
    let mut node_address = None;
    for property in response.properties {
        tns_address = property.remote_address.or(tns_address);
        node_address = property.node_address.or(node_address);
    }
    let (Some(tns_address), Some(node_address)) = (tns_address, node_address) else {
        warn!(
            event = events::NODE_DISCOVERY_FAILED,
            component = COMPONENT,
            url = config_url.as_str(),
            "remote or node address missing from configuration"
        );
        return Err(Error::RestError);
    };
    debug!(
        event = events::NODE_CONFIG_RESOLVED,
        component = COMPONENT,
        tns_address = tns_address.as_str(),
        node_address = node_address.as_str(),
        "node configuration resolved"
    );
    discovery.tns_address = tns_address;
    discovery.node_address = node_address;

    discovery.host_name = read_host_name(&config.host_name_file).await?;

    let apps_url = format!("{base}{API_APPS}");
    let apps: AppsResponse = get_json(rest, &apps_url).await?;
    for app in apps
        .properties
        .into_iter()
        .filter(|app| app.state == APP_STATE_RUNNING)
    {
        let app_url = format!("{apps_url}/{}", app.id);
        let info: AppInfo = get_json(rest, &app_url).await?;
        collect_ports(&info, &discovery.host_name, &mut discovery.nat_ports)?;
    }

    Ok(discovery)
}

async fn read_host_name(path: &str) -> Result<String> {
    let contents = fs::read_to_string(path).await.map_err(|e| {
        warn!(
            event = events::NODE_HOST_ID_READ_FAILED,
            component = COMPONENT,
            path,
            err = %e,
            "unable to read host identifier"
        );
        Error::UnknownState
    })?;
    let host_name = contents.trim_end_matches(['\n', '\r']).to_string();
    if host_name.is_empty() {
        warn!(
            event = events::NODE_HOST_ID_READ_FAILED,
            component = COMPONENT,
            path,
            "host identifier file is empty"
        );
        return Err(Error::UnknownState);
    }
    debug!(
        event = events::NODE_HOST_ID_READ,
        component = COMPONENT,
        host_name = host_name.as_str(),
        "host identifier read"
    );
    Ok(host_name)
}

fn collect_ports(info: &AppInfo, host_name: &str, nat_ports: &mut HashMap<u16, u16>) -> Result<()> {
    for service in &info.services {
        if !service.container_id.starts_with(host_name) {
            continue;
        }
        let Some(ports) = service.ports.as_ref() else {
            warn!(
                event = events::NODE_DISCOVERY_FAILED,
                component = COMPONENT,
                container_id = service.container_id.as_str(),
                "ports missing for own container"
            );
            return Err(Error::RestError);
        };
        for mapping in ports {
            nat_ports.insert(mapping.private_port, mapping.public_port);
        }
        debug!(
            event = events::NODE_APP_PORTS_MAPPED,
            component = COMPONENT,
            container_id = service.container_id.as_str(),
            mapped = ports.len(),
            "container ports mapped"
        );
    }
    Ok(())
}

async fn get_json<T: serde::de::DeserializeOwned>(rest: &dyn RestClient, url: &str) -> Result<T> {
    let RestResponse { status, body } = rest.get(url).await.map_err(|e| {
        warn!(event = events::NODE_DISCOVERY_FAILED, component = COMPONENT, url, err = %e, "request failed");
        Error::RestError
    })?;
    if status != HTTP_OK {
        warn!(
            event = events::NODE_DISCOVERY_FAILED,
            component = COMPONENT,
            url,
            status,
            "unexpected status code"
        );
        return Err(Error::RestError);
    }
    serde_json::from_str(&body).map_err(|e| {
        warn!(event = events::NODE_DISCOVERY_FAILED, component = COMPONENT, url, err = %e, "malformed response");
        Error::RestError
    })
}

#[cfg(test)]
mod tests {
    use super::{discover, read_host_name};
    use crate::config::ContextConfig;
    use crate::rest::{RestClient, RestClientError, RestResponse};
    use crate::Error;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::Write;

    const NODE: &str = "http://node:48098";

    struct RoutedRest {
        routes: HashMap<String, RestResponse>,
    }

    #[async_trait]
    impl RestClient for RoutedRest {
        async fn get(&self, url: &str) -> Result<RestResponse, RestClientError> {
            self.routes
                .get(url)
                .cloned()
                .ok_or_else(|| RestClientError(format!("no route for {url}")))
        }

        async fn post(&self, url: &str, _body: String) -> Result<RestResponse, RestClientError> {
            Err(RestClientError(format!("unexpected POST {url}")))
        }

        async fn delete(&self, url: &str) -> Result<RestResponse, RestClientError> {
            Err(RestClientError(format!("unexpected DELETE {url}")))
        }
    }

    fn routes(entries: &[(&str, u16, &str)]) -> RoutedRest {
        RoutedRest {
            routes: entries
                .iter()
                .map(|(path, status, body)| {
                    (
                        format!("{NODE}/api/v1{path}"),
                        RestResponse::new(*status, *body),
                    )
                })
                .collect(),
        }
    }

    fn config_with_host_file(contents: &str) -> (ContextConfig, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().expect("temp host file");
        file.write_all(contents.as_bytes()).expect("write host file");
        let config = ContextConfig {
            node_address: NODE.to_string(),
            host_name_file: file.path().to_string_lossy().into_owned(),
            ..ContextConfig::default()
        };
        (config, file)
    }

    const CONFIG_BODY: &str =
        r#"{"properties":[{"remoteAddress":"10.0.0.5"},{"nodeAddress":"10.0.0.7"}]}"#;

    #[tokio::test]
    async fn resolves_addresses_and_own_container_ports() {
        let rest = routes(&[
            ("/management/device/configuration", 200, CONFIG_BODY),
            (
                "/management/apps",
                200,
                r#"{"properties":[{"id":"app1","state":"running"},{"id":"app2","state":"stopped"}]}"#,
            ),
            (
                "/management/apps/app1",
                200,
                r#"{"services":[
                    {"containerId":"abc123def","ports":[{"privatePort":4000,"publicPort":14000}]},
                    {"containerId":"zzz999","ports":[{"privatePort":4001,"publicPort":14001}]}
                ]}"#,
            ),
        ]);
        let (config, _host_file) = config_with_host_file("abc123\n");

        let discovery = discover(&rest, &config).await.expect("discovery succeeds");

        assert_eq!(discovery.tns_address, "10.0.0.5");
        assert_eq!(discovery.node_address, "10.0.0.7");
        assert_eq!(discovery.host_name, "abc123");
        assert_eq!(discovery.nat_ports, HashMap::from([(4000, 14000)]));
    }

    #[tokio::test]
    async fn missing_node_address_is_a_rest_error() {
        let rest = routes(&[(
            "/management/device/configuration",
            200,
            r#"{"properties":[{"remoteAddress":"10.0.0.5"}]}"#,
        )]);
        let (config, _host_file) = config_with_host_file("abc123\n");

        assert_eq!(discover(&rest, &config).await, Err(Error::RestError));
    }

    #[tokio::test]
    async fn non_ok_status_is_a_rest_error() {
        let rest = routes(&[("/management/device/configuration", 500, CONFIG_BODY)]);
        let (config, _host_file) = config_with_host_file("abc123\n");

        assert_eq!(discover(&rest, &config).await, Err(Error::RestError));
    }

    #[tokio::test]
    async fn unreadable_host_file_is_unknown_state() {
        let rest = routes(&[("/management/device/configuration", 200, CONFIG_BODY)]);
        let config = ContextConfig {
            node_address: NODE.to_string(),
            host_name_file: "/nonexistent/host/name/file".to_string(),
            ..ContextConfig::default()
        };

        assert_eq!(discover(&rest, &config).await, Err(Error::UnknownState));
    }

    #[tokio::test]
    async fn host_identifier_is_trimmed_and_must_not_be_empty() {
        let (config, _file) = config_with_host_file("beef42\r\n");
        assert_eq!(read_host_name(&config.host_name_file).await, Ok("beef42".to_string()));

        let (config, _file) = config_with_host_file("\n");
        assert_eq!(
            read_host_name(&config.host_name_file).await,
            Err(Error::UnknownState)
        );
    }

    #[tokio::test]
    async fn malformed_app_detail_aborts_discovery() {
        let rest = routes(&[
            ("/management/device/configuration", 200, CONFIG_BODY),
            (
                "/management/apps",
                200,
                r#"{"properties":[{"id":"app1","state":"running"}]}"#,
            ),
            (
                "/management/apps/app1",
                200,
                r#"{"services":[{"containerId":"abc123","ports":[{"privatePort":4000}]}]}"#,
            ),
        ]);
        let (config, _host_file) = config_with_host_file("abc123\n");

        assert_eq!(discover(&rest, &config).await, Err(Error::RestError));
    }

    #[tokio::test]
    async fn app_missing_state_is_a_rest_error() {
        let rest = routes(&[
            ("/management/device/configuration", 200, CONFIG_BODY),
            ("/management/apps", 200, r#"{"properties":[{"id":"app1"}]}"#),
        ]);
        let (config, _host_file) = config_with_host_file("abc123\n");

        assert_eq!(discover(&rest, &config).await, Err(Error::RestError));
    }
}
