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

//! Error taxonomy shared by every control-plane operation.

use thiserror::Error;

/// Failure kinds reported by [`Context`](crate::Context), [`Publisher`](crate::Publisher),
/// [`Subscriber`](crate::Subscriber) and the [`TopicHandler`](crate::TopicHandler).
///
/// Details about the failing step are emitted as `tracing` events at the point of failure;
/// the variant itself only carries the kind so callers can match on it.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum Error {
    #[error("context is not initialized")]
    NotInitialized,
    #[error("context is already terminated")]
    Terminated,
    #[error("unknown or inconsistent state")]
    UnknownState,
    #[error("REST interaction failed")]
    RestError,
    #[error("invalid topic")]
    InvalidTopic,
    #[error("invalid parameter")]
    InvalidParam,
    #[error("invalid data model")]
    InvalidAmlModel,
    #[error("unknown data model")]
    UnknownAmlModel,
    #[error("maximum number of dynamic ports exceeded")]
    MaximumPortExceeded,
    #[error("released port was not assigned")]
    ReleaseWrongPort,
    #[error("topic name service is not available")]
    TnsNotAvailable,
    #[error("transport session unavailable")]
    SessionUnavailable,
}

pub type Result<T> = std::result::Result<T, Error>;
