// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use base64::{engine::general_purpose, Engine as _};
use openssl::sha::sha256;
use openssl::x509::X509;

const PEM_LINE_LEN: usize = 64;
const PEM_CERTIFICATE: &str = "CERTIFICATE";
pub(crate) const PEM_CRL: &str = "X509 CRL";

/// One X.509 certificate, DER or PEM encoded, kept exactly as supplied
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Decode a certificate from standard base64 DER, the encoding used by
    /// `x5c` and by metadata statements
    pub fn from_base64(v: &str) -> Result<Self, Error> {
        general_purpose::STANDARD
            .decode(v.trim())
            .map(Self)
            .map_err(|e| Error::Crypto(format!("decoding base64 certificate: {e}")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse the certificate, whichever of DER or PEM it is in
    pub fn parse(&self) -> Result<X509, Error> {
        X509::from_der(&self.0)
            .or_else(|_| X509::from_pem(&self.0))
            .map_err(|e| Error::Crypto(format!("parsing certificate: {e:?}")))
    }

    pub fn to_pem(&self) -> String {
        normalize_to_pem(&self.0)
    }

    /// Hex encoded SHA-256 of the bytes as supplied
    pub fn fingerprint(&self) -> String {
        hex::encode(sha256(&self.0))
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Certificate(sha256:{})", self.fingerprint())
    }
}

impl From<Vec<u8>> for Certificate {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Certificate {
    fn from(v: &[u8]) -> Self {
        Self(v.to_owned())
    }
}

/// Render raw certificate bytes as a PEM `CERTIFICATE` block.  Input that is
/// already PEM armoured is passed through.
pub fn normalize_to_pem(raw: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(raw) {
        let s = s.trim();
        if s.starts_with("-----BEGIN ") {
            return format!("{s}\n");
        }
    }

    der_to_pem(PEM_CERTIFICATE, raw)
}

/// Wrap DER bytes in a PEM block with the given label, 64 columns per line
pub fn der_to_pem(label: &str, der: &[u8]) -> String {
    let b64 = general_purpose::STANDARD.encode(der);

    let mut pem = format!("-----BEGIN {label}-----\n");
    for line in b64.as_bytes().chunks(PEM_LINE_LEN) {
        // base64 output is ASCII
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {label}-----\n"));

    pem
}
