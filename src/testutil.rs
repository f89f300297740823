// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Fixtures shared by the unit tests: throwaway PKIs, JWS signers and a
//! canned HTTP transport.

use crate::http::{self, HttpClient, Request, Response};
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use openssl::x509::X509;
use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, CertificateRevocationListParams,
    CrlDistributionPoint, DistinguishedName, DnType, IsCa, KeyIdMethod, KeyPair,
    KeyUsagePurpose, RevocationReason, RevokedCertParams, SerialNumber,
};
use std::cell::RefCell;
use std::collections::HashMap;

pub type Ymd = (i32, u8, u8);

pub const LONG_AGO: Ymd = (2020, 1, 1);
pub const FAR_AWAY: Ymd = (2049, 12, 31);

fn dn(cn: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    dn
}

fn ca_params(cn: &str, serial: &[u8], crl_url: Option<&str>) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.distinguished_name = dn(cn);
    params.serial_number = Some(SerialNumber::from_slice(serial));
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    params.not_before = date_time_ymd(LONG_AGO.0, LONG_AGO.1, LONG_AGO.2);
    params.not_after = date_time_ymd(FAR_AWAY.0, FAR_AWAY.1, FAR_AWAY.2);

    if let Some(u) = crl_url {
        params.crl_distribution_points = vec![CrlDistributionPoint {
            uris: vec![u.to_string()],
        }];
    }

    params
}

/// A CA able to issue certificates and CRLs
pub struct TestCa {
    key: KeyPair,
    cert: rcgen::Certificate,
    pub der: Vec<u8>,
}

impl TestCa {
    /// A self-signed root, optionally advertising a CRL distribution point
    pub fn new(cn: &str, crl_url: Option<&str>) -> Self {
        let key = KeyPair::generate().unwrap();
        let cert = ca_params(cn, &[0x7f], crl_url).self_signed(&key).unwrap();
        let der = cert.der().to_vec();

        Self { key, cert, der }
    }

    /// An intermediate CA issued by this one
    pub fn issue_ca(&self, cn: &str, serial: &[u8]) -> TestCa {
        let key = KeyPair::generate().unwrap();
        let cert = ca_params(cn, serial, None)
            .signed_by(&key, &self.cert, &self.key)
            .unwrap();
        let der = cert.der().to_vec();

        TestCa { key, cert, der }
    }

    /// An end-entity certificate, DER encoded
    pub fn issue(
        &self,
        cn: &str,
        serial: &[u8],
        crl_url: Option<&str>,
        not_before: Ymd,
        not_after: Ymd,
    ) -> Vec<u8> {
        let key = KeyPair::generate().unwrap();

        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = dn(cn);
        params.serial_number = Some(SerialNumber::from_slice(serial));
        // rcgen drops the extensions block, CRL DP included, unless one of
        // basic constraints, SAN or EKU is set
        params.is_ca = IsCa::ExplicitNoCa;
        params.not_before = date_time_ymd(not_before.0, not_before.1, not_before.2);
        params.not_after = date_time_ymd(not_after.0, not_after.1, not_after.2);

        if let Some(u) = crl_url {
            params.crl_distribution_points = vec![CrlDistributionPoint {
                uris: vec![u.to_string()],
            }];
        }

        params
            .signed_by(&key, &self.cert, &self.key)
            .unwrap()
            .der()
            .to_vec()
    }

    /// A DER CRL revoking the given single-byte serial numbers
    pub fn crl(&self, revoked: &[u8]) -> Vec<u8> {
        let revoked_certs = revoked
            .iter()
            .map(|s| RevokedCertParams {
                serial_number: SerialNumber::from_slice(&[*s]),
                revocation_time: date_time_ymd(2022, 6, 1),
                reason_code: Some(RevocationReason::KeyCompromise),
                invalidity_date: None,
            })
            .collect();

        CertificateRevocationListParams {
            this_update: date_time_ymd(2022, 6, 1),
            next_update: date_time_ymd(FAR_AWAY.0, FAR_AWAY.1, FAR_AWAY.2),
            crl_number: SerialNumber::from_slice(&[0x01]),
            issuing_distribution_point: None,
            revoked_certs,
            key_identifier_method: KeyIdMethod::Sha256,
        }
        .signed_by(&self.cert, &self.key)
        .unwrap()
        .der()
        .to_vec()
    }

    /// This CA's certificate with one byte of its public key flipped
    pub fn tampered_key_der(&self) -> Vec<u8> {
        let spki = X509::from_der(&self.der)
            .unwrap()
            .public_key()
            .unwrap()
            .public_key_to_der()
            .unwrap();

        let pos = self
            .der
            .windows(spki.len())
            .position(|w| w == spki.as_slice())
            .unwrap();

        let mut der = self.der.clone();
        der[pos + spki.len() - 1] ^= 0xff;
        der
    }
}

/// Produces JWS objects the way the metadata service does
pub struct Signer {
    key_der: Vec<u8>,
    pub cert_der: Vec<u8>,
}

impl Signer {
    pub fn new() -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["mds.test".to_string()]).unwrap();
        params.distinguished_name = dn("Metadata TOC Signer");
        let cert = params.self_signed(&key).unwrap();

        Self {
            key_der: key.serialize_der(),
            cert_der: cert.der().to_vec(),
        }
    }

    pub fn sign_es256(&self, claims: &serde_json::Value) -> String {
        self.sign_es256_with_x5c(claims, &self.cert_der)
    }

    pub fn sign_es256_with_x5c(&self, claims: &serde_json::Value, x5c: &[u8]) -> String {
        let mut h = Header::new(Algorithm::ES256);
        h.x5c = Some(vec![general_purpose::STANDARD.encode(x5c)]);

        jsonwebtoken::encode(&h, claims, &EncodingKey::from_ec_der(&self.key_der)).unwrap()
    }

    pub fn sign_es256_without_x5c(&self, claims: &serde_json::Value) -> String {
        let h = Header::new(Algorithm::ES256);

        jsonwebtoken::encode(&h, claims, &EncodingKey::from_ec_der(&self.key_der)).unwrap()
    }

    pub fn sign_hs256(&self, claims: &serde_json::Value) -> String {
        let mut h = Header::new(Algorithm::HS256);
        h.x5c = Some(vec![general_purpose::STANDARD.encode(&self.cert_der)]);

        jsonwebtoken::encode(&h, claims, &EncodingKey::from_secret(b"shared")).unwrap()
    }
}

/// Serves canned responses keyed by exact URI; anything else is a 404
#[derive(Default)]
pub struct StaticHttp {
    routes: HashMap<String, Option<Response>>,
    seen: RefCell<Vec<String>>,
}

impl StaticHttp {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with(mut self, uri: &str, status: u16, body: Vec<u8>) -> Self {
        self.routes
            .insert(uri.to_string(), Some(Response { status, body }));
        self
    }

    /// Make requests for `uri` fail at the transport level
    pub fn failing(mut self, uri: &str) -> Self {
        self.routes.insert(uri.to_string(), None);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }
}

impl HttpClient for StaticHttp {
    fn send(&self, req: &Request) -> Result<Response, http::Error> {
        self.seen.borrow_mut().push(req.uri.clone());

        match self.routes.get(&req.uri) {
            Some(Some(r)) => Ok(r.clone()),
            Some(None) => Err(http::Error::Transport("connection refused".to_string())),
            None => Ok(Response {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::crl_distribution_point;

    #[test]
    fn issued_leaf_keeps_crl_distribution_point() {
        let ca = TestCa::new("Fixture Root", None);
        let der = ca.issue(
            "Fixture Leaf",
            &[0x42],
            Some("http://crl.test/fixture.crl"),
            LONG_AGO,
            FAR_AWAY,
        );

        let x = X509::from_der(&der).unwrap();

        assert_eq!(
            crl_distribution_point(&x),
            Some("http://crl.test/fixture.crl".to_string())
        );
    }
}
