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

mod config;

use crate::config::{ProbeConfig, ProbeError};
use clap::Parser;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use topic_plane::{validate_topic, ReqwestRestClient, TnsClient, Topic};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Looks up topics registered with a Topic Name Service")]
struct ProbeArgs {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// TNS address; overrides `tns_address` from the config file.
    #[arg(long, value_name = "ADDRESS")]
    tns: Option<String>,
    /// Topic to resolve. May be repeated.
    #[arg(short, long = "topic", value_name = "TOPIC", required = true)]
    topics: Vec<String>,
    /// Include every registered descendant of each topic.
    #[arg(long)]
    hierarchical: bool,
    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

fn render(topic: &Topic) -> serde_json::Value {
    serde_json::json!({
        "name": topic.name(),
        "dataModel": topic.data_model(),
        "endpoint": topic.endpoint().to_string(),
        "secured": topic.is_secured(),
    })
}

#[tokio::main]
async fn main() -> Result<(), ProbeError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let args = ProbeArgs::parse();
    let config = match args.config.as_deref() {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };
    let tns_address = config.resolve_tns_address(args.tns.as_deref())?;

    let rest = ReqwestRestClient::new(config.context.connection_timeout())?;
    let tns = TnsClient::new(Arc::new(rest), &tns_address, config.context.tns_port);
    info!(tns = tns.base_url(), topics = args.topics.len(), "Started tns-probe");

    for topic in args.topics.iter().filter(|topic| !validate_topic(topic)) {
        warn!(topic = topic.as_str(), "topic name is not well-formed; querying anyway");
    }

    let lookups = args
        .topics
        .iter()
        .map(|topic| tns.query_topics(topic, args.hierarchical));
    let results = join_all(lookups).await;

    let mut report = serde_json::Map::new();
    for (requested, result) in args.topics.iter().zip(results) {
        let found = result.map_err(|source| ProbeError::Query {
            topic: requested.clone(),
            source,
        })?;

        if args.json {
            report.insert(
                requested.clone(),
                serde_json::Value::Array(found.iter().map(render).collect()),
            );
            continue;
        }

        println!("{requested}: {} topic(s)", found.len());
        for topic in &found {
            println!(
                "  {} model={} endpoint={}{}",
                topic.name(),
                topic.data_model(),
                topic.endpoint(),
                if topic.is_secured() { " secured" } else { "" }
            );
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
