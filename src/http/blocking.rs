// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::{HttpClient, Method, Request, Response};
use std::time::Duration;
use tracing::debug;

/// [`HttpClient`] backed by a blocking `reqwest` client with a request timeout
#[derive(Clone, Debug)]
pub struct BlockingClient {
    inner: reqwest::blocking::Client,
}

impl BlockingClient {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Setup(e.to_string()))?;

        Ok(Self { inner })
    }
}

impl HttpClient for BlockingClient {
    fn send(&self, req: &Request) -> Result<Response, Error> {
        debug!(method = req.method.as_str(), uri = %req.uri, "sending request");

        let rb = match req.method {
            Method::Get => self.inner.get(&req.uri),
        };

        let rsp = rb.send().map_err(|e| Error::Transport(e.to_string()))?;
        let status = rsp.status().as_u16();
        let body = rsp
            .bytes()
            .map_err(|e| Error::Transport(e.to_string()))?
            .to_vec();

        debug!(status, len = body.len(), "received response");

        Ok(Response { status, body })
    }
}
