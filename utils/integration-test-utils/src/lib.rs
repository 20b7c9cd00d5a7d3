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

mod fake_transport;
pub use fake_transport::{FailureSwitches, FakeTransport, SubscriptionRecord};

mod recording_listener;
pub use recording_listener::RecordingTopicListener;

mod scripted_rest;
pub use scripted_rest::{Method, RecordedCall, ScriptedRestClient};

/// Installs a `tracing` subscriber for test output. Safe to call from every test.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
