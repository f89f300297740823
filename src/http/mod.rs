// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The transport seam used by the metadata service client and the revocation
//! resolver.  Only the status code and the raw body of a response are ever
//! consumed; there are no retries and redirects are not followed.

pub use self::blocking::BlockingClient;
pub use self::errors::Error;

use url::form_urlencoded;

mod blocking;
mod errors;

/// HTTP request method
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
        }
    }
}

/// An outgoing request, as assembled by [`HttpClient::request`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub uri: String,
}

/// The parts of a response the core looks at
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

pub trait HttpClient {
    /// Build a request for the given method and URI
    fn request(&self, method: Method, uri: &str) -> Request {
        Request {
            method,
            uri: uri.to_string(),
        }
    }

    /// Send the request and block until the full response body is available
    fn send(&self, req: &Request) -> Result<Response, Error>;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn request(&self, method: Method, uri: &str) -> Request {
        (**self).request(method, uri)
    }

    fn send(&self, req: &Request) -> Result<Response, Error> {
        (**self).send(req)
    }
}

/// Append the access token, form-urlencoded, as a `token` query parameter
pub fn with_token(uri: &str, token: &str) -> String {
    let sep = if uri.contains('?') { '&' } else { '?' };
    let token: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
    format!("{uri}{sep}token={token}")
}
