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

use data_model_static_file::JsonModelParser;
use integration_test_utils::{FakeTransport, Method, ScriptedRestClient};
use std::sync::Arc;
use topic_plane::{Context, ContextConfig};

pub(crate) const TNS_ADDRESS: &str = "10.0.0.9";
pub(crate) const TOPIC_URL: &str = "http://10.0.0.9:48323/api/v1/tns/topic";
#[allow(dead_code)]
pub(crate) const KEEP_ALIVE_URL: &str = "http://10.0.0.9:48323/api/v1/tns/keepalive";

#[allow(dead_code)]
pub(crate) const SPEED_MODEL: &str = "../utils/data-model-static-file/static-configs/vehicle-speed.json";
#[allow(dead_code)]
pub(crate) const CABIN_MODEL: &str =
    "../utils/data-model-static-file/static-configs/cabin-temperature.json";

pub(crate) struct Harness {
    pub(crate) context: Arc<Context>,
    pub(crate) transport: Arc<FakeTransport>,
    pub(crate) rest: Arc<ScriptedRestClient>,
}

pub(crate) fn harness(config: ContextConfig) -> Harness {
    integration_test_utils::init_logging();

    let transport = FakeTransport::new();
    let rest = ScriptedRestClient::new();
    let context = Context::new(
        config,
        transport.clone(),
        rest.clone(),
        Arc::new(JsonModelParser::new()),
    );
    Harness {
        context,
        transport,
        rest,
    }
}

#[allow(dead_code)]
pub(crate) async fn stand_alone(use_tns: bool) -> Harness {
    let harness = harness(ContextConfig::default());
    harness
        .context
        .initialize_stand_alone(use_tns, TNS_ADDRESS)
        .await
        .expect("stand-alone context should initialize");
    harness
}

#[allow(dead_code)]
pub(crate) fn route_registration(rest: &ScriptedRestClient, interval: i64) {
    rest.route(
        Method::Post,
        TOPIC_URL,
        201,
        &format!(r#"{{"keepAliveInterval":{interval}}}"#),
    );
}

#[allow(dead_code)]
pub(crate) fn unregister_url(name: &str) -> String {
    format!("{TOPIC_URL}?name={name}")
}
