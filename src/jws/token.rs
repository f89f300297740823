// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::base64;
use super::errors::Error;
use serde_json::{Map, Value};

const HEADER_ALG: &str = "alg";
const HEADER_X5C: &str = "x5c";

/// Structural decomposition of a JWS in compact serialization.  Nothing in
/// here has been authenticated yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedToken {
    /// Decoded protected header
    pub header: Map<String, Value>,
    /// Decoded payload
    pub payload: Vec<u8>,
    /// Decoded signature
    pub signature: Vec<u8>,
    /// Protected header, as found on the wire
    pub encoded_header: String,
    /// Payload, as found on the wire
    pub encoded_payload: String,
    /// Signature, as found on the wire
    pub encoded_signature: String,
}

impl SignedToken {
    /// Split a compact token into its three segments and decode them.
    ///
    /// Exactly one signature segment must be present: `header.payload` and
    /// anything with more than three segments are rejected.
    pub fn parse(token: &str) -> Result<SignedToken, Error> {
        let parts: Vec<&str> = token.trim().split('.').collect();

        let (h, p, s) = match parts.as_slice() {
            [h, p, s] => (*h, *p, *s),
            [_] | [_, _] => {
                return Err(Error::MalformedToken(
                    "no signature segment found".to_string(),
                ))
            }
            more => {
                return Err(Error::MalformedToken(format!(
                    "expecting exactly one signature, found {}",
                    more.len() - 2
                )))
            }
        };

        if s.is_empty() {
            return Err(Error::MalformedToken("empty signature segment".to_string()));
        }

        let raw_header = base64::decode_segment(h, "header")?;

        let header = match serde_json::from_slice::<Value>(&raw_header) {
            Ok(Value::Object(m)) => m,
            Ok(_) => {
                return Err(Error::MalformedToken(
                    "header is not a JSON object".to_string(),
                ))
            }
            Err(e) => return Err(Error::MalformedToken(format!("header: {e}"))),
        };

        Ok(SignedToken {
            header,
            payload: base64::decode_segment(p, "payload")?,
            signature: base64::decode_segment(s, "signature")?,
            encoded_header: h.to_string(),
            encoded_payload: p.to_string(),
            encoded_signature: s.to_string(),
        })
    }

    /// The bytes covered by the signature
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.encoded_header, self.encoded_payload)
    }

    /// The `alg` header parameter, if present and a string
    pub fn alg(&self) -> Option<&str> {
        self.header.get(HEADER_ALG).and_then(Value::as_str)
    }

    /// The decoded `x5c` certificate chain, leaf first
    pub fn x5c(&self) -> Result<Vec<Vec<u8>>, Error> {
        let chain = match self.header.get(HEADER_X5C) {
            Some(Value::Array(a)) => a,
            Some(_) => {
                return Err(Error::MissingSigningCertificate(
                    "x5c header parameter is not an array".to_string(),
                ))
            }
            None => {
                return Err(Error::MissingSigningCertificate(
                    "x5c header parameter not found".to_string(),
                ))
            }
        };

        chain
            .iter()
            .map(|v| match v {
                Value::String(s) => base64::decode_x5c(s),
                _ => Err(Error::MissingSigningCertificate(
                    "x5c element is not a string".to_string(),
                )),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(v: &[u8]) -> String {
        base64::encode_url(v)
    }

    #[test]
    fn parse_ok() {
        let t = format!(
            "{}.{}.{}",
            seg(br#"{"alg":"ES256","x5c":["AAEC"]}"#),
            seg(b"hello"),
            seg(b"sig")
        );

        let st = SignedToken::parse(&t).unwrap();

        assert_eq!(st.alg(), Some("ES256"));
        assert_eq!(st.payload, b"hello");
        assert_eq!(st.signature, b"sig");
        assert_eq!(st.x5c().unwrap(), vec![vec![0u8, 1, 2]]);
        assert_eq!(
            st.signing_input(),
            format!("{}.{}", st.encoded_header, st.encoded_payload)
        );
    }

    #[test]
    fn parse_segment_count() {
        let h = seg(br#"{"alg":"ES256"}"#);
        let p = seg(b"x");

        for t in [
            h.clone(),
            format!("{h}.{p}"),
            format!("{h}.{p}."),
            format!("{h}.{p}.c2ln.c2ln"),
            format!("{h}.{p}.c2ln.c2ln.c2ln"),
        ] {
            let r = SignedToken::parse(&t);
            assert!(matches!(r, Err(Error::MalformedToken(_))), "{t}");
        }
    }

    #[test]
    fn parse_header_not_object() {
        let t = format!("{}.{}.{}", seg(b"[1,2]"), seg(b"x"), seg(b"s"));
        assert!(matches!(
            SignedToken::parse(&t),
            Err(Error::MalformedToken(_))
        ));
    }

    #[test]
    fn x5c_wrong_type() {
        let t = format!(
            "{}.{}.{}",
            seg(br#"{"alg":"ES256","x5c":"AAEC"}"#),
            seg(b"x"),
            seg(b"s")
        );
        let st = SignedToken::parse(&t).unwrap();
        assert!(matches!(
            st.x5c(),
            Err(Error::MissingSigningCertificate(_))
        ));
    }
}
