// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::base64;
use super::errors::Error;
use super::token::SignedToken;
use jsonwebtoken::{Algorithm, DecodingKey};
use openssl::bn::{BigNum, BigNumContext};
use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::x509::X509;
use std::str::FromStr;
use tracing::{debug, warn};

/// The set of `alg` values a signed token may carry.
///
/// The metadata service signs its TOC with ES256 and nothing else is accepted
/// by default, which rules out algorithm substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgorithmPolicy {
    allowed: Vec<Algorithm>,
}

impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self::new(&[Algorithm::ES256])
    }
}

impl AlgorithmPolicy {
    pub fn new(allowed: &[Algorithm]) -> Self {
        Self {
            allowed: allowed.to_vec(),
        }
    }

    pub fn allowed(&self) -> &[Algorithm] {
        &self.allowed
    }

    /// Map an `alg` header value to an allowed algorithm
    pub fn permit(&self, alg: &str) -> Result<Algorithm, Error> {
        let a = Algorithm::from_str(alg).map_err(|_| Error::UnsupportedAlgorithm(alg.to_string()))?;

        if !self.allowed.contains(&a) {
            return Err(Error::UnsupportedAlgorithm(alg.to_string()));
        }

        Ok(a)
    }
}

/// Verifies compact JWS objects that carry their signing certificate in the
/// `x5c` header parameter.
///
/// Note that the certificate chain found in `x5c` is only used to obtain the
/// verification key.  Whether the chain itself is trusted is a separate
/// question, answered by [`crate::chain::ChainValidator`].
#[derive(Clone, Debug, Default)]
pub struct Verifier {
    policy: AlgorithmPolicy,
}

impl Verifier {
    pub fn new(policy: AlgorithmPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AlgorithmPolicy {
        &self.policy
    }

    /// Verify the signature on `token` and return its raw payload.
    pub fn verify_and_extract_payload(&self, token: &str) -> Result<Vec<u8>, Error> {
        let st = SignedToken::parse(token)?;

        self.verify(&st)?;

        Ok(st.payload)
    }

    /// Verify an already decomposed token
    pub fn verify(&self, st: &SignedToken) -> Result<(), Error> {
        if st.payload.is_empty() {
            return Err(Error::EmptyPayload);
        }

        let alg = match st.alg() {
            Some(a) => self.policy.permit(a)?,
            None => {
                return Err(Error::UnsupportedAlgorithm(
                    "alg header parameter not found".to_string(),
                ))
            }
        };

        let x5c = st.x5c()?;

        let leaf = x5c.first().ok_or(Error::MissingSigningCertificate(
            "x5c header parameter is empty".to_string(),
        ))?;

        let key = decoding_key(leaf, alg)?;

        let ok = jsonwebtoken::crypto::verify(
            &st.encoded_signature,
            st.signing_input().as_bytes(),
            &key,
            alg,
        )
        .map_err(|e| Error::InvalidSignature(e.to_string()))?;

        if !ok {
            warn!(alg = ?alg, "signature verification failed");
            return Err(Error::InvalidSignature(
                "signature does not match the x5c leaf key".to_string(),
            ));
        }

        debug!(alg = ?alg, chain_len = x5c.len(), "signature verified");

        Ok(())
    }
}

fn crypto_err(e: ErrorStack) -> Error {
    Error::InvalidSignature(format!("{e:?}"))
}

// Turn the public key of the DER certificate into something jsonwebtoken can
// use, making sure it fits the selected algorithm.
fn decoding_key(der: &[u8], alg: Algorithm) -> Result<DecodingKey, Error> {
    let cert = X509::from_der(der)
        .map_err(|e| Error::MissingSigningCertificate(format!("decoding x5c[0]: {e:?}")))?;

    let pkey = cert.public_key().map_err(crypto_err)?;

    match alg {
        Algorithm::ES256 | Algorithm::ES384 => {
            let (nid, len) = match alg {
                Algorithm::ES256 => (Nid::X9_62_PRIME256V1, 32),
                _ => (Nid::SECP384R1, 48),
            };

            let ec = pkey.ec_key().map_err(crypto_err)?;
            let group = ec.group();

            if group.curve_name() != Some(nid) {
                return Err(Error::InvalidSignature(format!(
                    "signing key curve does not match {alg:?}"
                )));
            }

            let mut ctx = BigNumContext::new().map_err(crypto_err)?;
            let mut x = BigNum::new().map_err(crypto_err)?;
            let mut y = BigNum::new().map_err(crypto_err)?;
            ec.public_key()
                .affine_coordinates(group, &mut x, &mut y, &mut ctx)
                .map_err(crypto_err)?;

            let x = x.to_vec_padded(len).map_err(crypto_err)?;
            let y = y.to_vec_padded(len).map_err(crypto_err)?;

            DecodingKey::from_ec_components(&base64::encode_url(&x), &base64::encode_url(&y))
                .map_err(|e| Error::InvalidSignature(e.to_string()))
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => {
            let rsa = pkey.rsa().map_err(crypto_err)?;

            DecodingKey::from_rsa_components(
                &base64::encode_url(&rsa.n().to_vec()),
                &base64::encode_url(&rsa.e().to_vec()),
            )
            .map_err(|e| Error::InvalidSignature(e.to_string()))
        }
        a => Err(Error::UnsupportedAlgorithm(format!(
            "{a:?} cannot be used with an x5c certificate"
        ))),
    }
}
