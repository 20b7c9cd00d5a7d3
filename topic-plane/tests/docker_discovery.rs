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

mod support;

use integration_test_utils::{Method, ScriptedRestClient};
use std::io::Write;
use support::harness;
use topic_plane::{ContextConfig, Endpoint, Error, Publisher};

const NODE: &str = "http://pharos-node:48098/api/v1/management";
const DOCKER_TOPIC_URL: &str = "http://10.8.0.1:48323/api/v1/tns/topic";

fn host_file(name: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp host file");
    writeln!(file, "{name}").expect("write host file");
    file
}

fn docker_config(host_file: &tempfile::NamedTempFile) -> ContextConfig {
    ContextConfig {
        host_name_file: host_file.path().to_string_lossy().into_owned(),
        ..ContextConfig::default()
    }
}

fn route_node(rest: &ScriptedRestClient) {
    rest.route(
        Method::Get,
        &format!("{NODE}/device/configuration"),
        200,
        r#"{"properties":[
            {"remoteAddress":"10.8.0.1"},
            {"nodeAddress":"192.168.7.40"},
            {"timezone":"UTC"}
        ]}"#,
    );
    rest.route(
        Method::Get,
        &format!("{NODE}/apps"),
        200,
        r#"{"properties":[
            {"id":"telemetry","state":"running"},
            {"id":"legacy","state":"exited"}
        ]}"#,
    );
    rest.route(
        Method::Get,
        &format!("{NODE}/apps/telemetry"),
        200,
        r#"{"services":[
            {"containerId":"4f2a9c11d0e7aa","ports":[
                {"privatePort":4000,"publicPort":31000},
                {"privatePort":4001,"publicPort":31001}
            ]},
            {"containerId":"0000other","ports":[{"privatePort":4000,"publicPort":39999}]}
        ]}"#,
    );
}

#[tokio::test]
async fn container_publisher_registers_its_nat_endpoint() {
    let host = host_file("4f2a9c11d0e7");
    let harness = harness(docker_config(&host));
    route_node(&harness.rest);
    harness.rest.route(
        Method::Post,
        DOCKER_TOPIC_URL,
        201,
        r#"{"keepAliveInterval":45}"#,
    );

    harness
        .context
        .initialize_docker()
        .await
        .expect("container discovery should succeed");
    assert!(harness.context.is_tns_enabled());
    assert_eq!(harness.context.tns_address(), "10.8.0.1");
    assert_eq!(harness.context.host_address(), "192.168.7.40");
    assert_eq!(harness.rest.calls_to(Method::Get, &format!("{NODE}/apps/legacy")), 0);

    let publisher = Publisher::create(harness.context.clone(), Some(9999), "/telemetry/gps", "gps")
        .await
        .expect("publisher should be created");

    // Caller ports are ignored outside stand-alone mode.
    assert_eq!(publisher.local_port(), Some(4000));
    assert_eq!(
        publisher.topic().expect("topic").endpoint(),
        &Endpoint::new("192.168.7.40", 31000)
    );
    let registration = harness
        .rest
        .calls()
        .into_iter()
        .find(|call| call.method == Method::Post)
        .expect("registration sent");
    assert_eq!(registration.url, DOCKER_TOPIC_URL);
    let body: serde_json::Value = serde_json::from_str(&registration.body).expect("JSON body");
    assert_eq!(body["topic"]["endpoint"], "tcp://192.168.7.40:31000");
    assert!(harness.context.topic_handler().is_running());

    harness.context.terminate().await.expect("terminate");
    assert!(!harness.context.topic_handler().is_running());
    assert_eq!(harness.transport.terminate_count(), 1);
}

#[tokio::test]
async fn unmapped_port_cannot_be_published() {
    let host = host_file("4f2a9c11d0e7");
    let harness = harness(ContextConfig {
        local_port_start: 4100,
        ..docker_config(&host)
    });
    route_node(&harness.rest);
    harness.context.initialize_docker().await.expect("discovery");

    assert_eq!(
        Publisher::create(harness.context.clone(), None, "/telemetry/gps", "gps")
            .await
            .err(),
        Some(Error::UnknownState)
    );
    assert!(harness
        .rest
        .calls()
        .iter()
        .all(|call| call.method == Method::Get));
}

#[tokio::test]
async fn missing_node_address_leaves_context_uninitialized() {
    let host = host_file("4f2a9c11d0e7");
    let harness = harness(docker_config(&host));
    harness.rest.route(
        Method::Get,
        &format!("{NODE}/device/configuration"),
        200,
        r#"{"properties":[{"remoteAddress":"10.8.0.1"}]}"#,
    );

    assert_eq!(harness.context.initialize_docker().await, Err(Error::RestError));
    assert!(!harness.context.is_initialized());
    assert!(!harness.context.is_tns_enabled());
    assert_eq!(harness.context.tns_address(), "");
    assert_eq!(harness.transport.initialize_count(), 0);
}

#[tokio::test]
async fn failing_app_lookup_discards_partial_discovery() {
    let host = host_file("4f2a9c11d0e7");
    let harness = harness(docker_config(&host));
    route_node(&harness.rest);
    harness
        .rest
        .route(Method::Get, &format!("{NODE}/apps/telemetry"), 503, "");

    assert_eq!(harness.context.initialize_docker().await, Err(Error::RestError));
    assert_eq!(harness.context.host_address(), "");

    // Recovers once the node answers.
    route_node(&harness.rest);
    harness.context.initialize_docker().await.expect("retry succeeds");
    assert_eq!(
        harness.context.resolve_host_endpoint(4001),
        Ok(Endpoint::new("192.168.7.40", 31001))
    );
    harness.context.terminate().await.expect("terminate");
}
