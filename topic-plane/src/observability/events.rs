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

//! Canonical structured event names used across `topic-plane`.

// Context lifecycle and resource events.
pub const CONTEXT_INIT_OK: &str = "context_init_ok";
pub const CONTEXT_INIT_FAILED: &str = "context_init_failed";
pub const CONTEXT_TERMINATE_OK: &str = "context_terminate_ok";
pub const CONTEXT_TRANSPORT_SHUTDOWN_FAILED: &str = "context_transport_shutdown_failed";
pub const PORT_ASSIGNED: &str = "port_assigned";
pub const PORT_POOL_EXHAUSTED: &str = "port_pool_exhausted";
pub const PORT_POOL_INCONSISTENT: &str = "port_pool_inconsistent";
pub const PORT_RELEASED: &str = "port_released";
pub const PORT_RELEASE_REJECTED: &str = "port_release_rejected";
pub const HOST_ENDPOINT_UNMAPPED: &str = "host_endpoint_unmapped";
pub const MODEL_CACHED: &str = "model_cached";
pub const MODEL_PARSE_FAILED: &str = "model_parse_failed";
pub const MODEL_LOOKUP_MISS: &str = "model_lookup_miss";

// Container node discovery events.
pub const NODE_CONFIG_RESOLVED: &str = "node_config_resolved";
pub const NODE_HOST_ID_READ: &str = "node_host_id_read";
pub const NODE_HOST_ID_READ_FAILED: &str = "node_host_id_read_failed";
pub const NODE_APP_PORTS_MAPPED: &str = "node_app_ports_mapped";
pub const NODE_DISCOVERY_FAILED: &str = "node_discovery_failed";

// TNS client events.
pub const TNS_REGISTER_OK: &str = "tns_register_ok";
pub const TNS_REGISTER_FAILED: &str = "tns_register_failed";
pub const TNS_UNREGISTER_OK: &str = "tns_unregister_ok";
pub const TNS_UNREGISTER_FAILED: &str = "tns_unregister_failed";
pub const TNS_QUERY_OK: &str = "tns_query_ok";
pub const TNS_QUERY_FAILED: &str = "tns_query_failed";
pub const TNS_KEEPALIVE_OK: &str = "tns_keepalive_ok";
pub const TNS_KEEPALIVE_FAILED: &str = "tns_keepalive_failed";
pub const TNS_POST_FAILED: &str = "tns_post_failed";

// Topic handler events.
pub const HANDLER_START: &str = "handler_start";
pub const HANDLER_STOP: &str = "handler_stop";
pub const HANDLER_SEND_REJECTED: &str = "handler_send_rejected";
pub const HANDLER_TOPIC_REGISTERED: &str = "handler_topic_registered";
pub const HANDLER_TOPIC_UNREGISTERED: &str = "handler_topic_unregistered";
pub const HANDLER_INTERVAL_UPDATED: &str = "handler_interval_updated";
pub const HANDLER_KEEPALIVE_ARMED: &str = "handler_keepalive_armed";
pub const HANDLER_KEEPALIVE_DEFERRED: &str = "handler_keepalive_deferred";

// Publisher and subscriber lifecycle events.
pub const PUBLISHER_INIT_OK: &str = "publisher_init_ok";
pub const PUBLISHER_INIT_FAILED: &str = "publisher_init_failed";
pub const PUBLISHER_TERMINATE_OK: &str = "publisher_terminate_ok";
pub const PUBLISHER_TERMINATE_FAILED: &str = "publisher_terminate_failed";
pub const SUBSCRIBER_SUBSCRIBE_OK: &str = "subscriber_subscribe_ok";
pub const SUBSCRIBER_SUBSCRIBE_FAILED: &str = "subscriber_subscribe_failed";
pub const SUBSCRIBER_TOPIC_REJECTED: &str = "subscriber_topic_rejected";
pub const SUBSCRIBER_TERMINATE_OK: &str = "subscriber_terminate_ok";
pub const SUBSCRIBER_TERMINATE_FAILED: &str = "subscriber_terminate_failed";
pub const DISPATCH_DROP_UNSUPPORTED_CONTENT: &str = "dispatch_drop_unsupported_content";
