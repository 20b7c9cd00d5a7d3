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

use crate::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const ENDPOINT_SCHEME: &str = "tcp://";

///
/// [`Endpoint`] is the `(address, port)` pair a transport publisher is reachable on.
///
/// Its canonical string form is `tcp://address:port`; parsing also accepts the bare
/// `address:port` form that topic name services commonly hand out.
///
/// # Examples
///
/// ```
/// use topic_plane::Endpoint;
///
/// let endpoint: Endpoint = "192.168.1.10:4000".parse().unwrap();
/// assert_eq!(endpoint.address(), "192.168.1.10");
/// assert_eq!(endpoint.port(), 4000);
/// assert_eq!(endpoint.to_string(), "tcp://192.168.1.10:4000");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    address: String,
    port: u16,
}

impl Endpoint {
    pub fn new(address: &str, port: u16) -> Self {
        Self {
            address: address.to_string(),
            port,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{ENDPOINT_SCHEME}{}:{}", self.address, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let without_scheme = s.strip_prefix(ENDPOINT_SCHEME).unwrap_or(s);
        let (address, port) = without_scheme
            .rsplit_once(':')
            .ok_or(Error::InvalidParam)?;
        if address.is_empty() {
            return Err(Error::InvalidParam);
        }
        let port = port.parse::<u16>().map_err(|_| Error::InvalidParam)?;
        Ok(Self::new(address, port))
    }
}

#[cfg(test)]
mod tests {
    use super::Endpoint;
    use crate::Error;

    #[test]
    fn parses_with_and_without_scheme() {
        let bare: Endpoint = "10.0.0.1:5562".parse().expect("bare endpoint");
        let schemed: Endpoint = "tcp://10.0.0.1:5562".parse().expect("schemed endpoint");

        assert_eq!(bare, schemed);
        assert_eq!(bare.to_string(), "tcp://10.0.0.1:5562");
    }

    #[test]
    fn rejects_missing_or_invalid_port() {
        assert_eq!("10.0.0.1".parse::<Endpoint>(), Err(Error::InvalidParam));
        assert_eq!("10.0.0.1:port".parse::<Endpoint>(), Err(Error::InvalidParam));
        assert_eq!(":4000".parse::<Endpoint>(), Err(Error::InvalidParam));
        assert_eq!("10.0.0.1:70000".parse::<Endpoint>(), Err(Error::InvalidParam));
    }
}
