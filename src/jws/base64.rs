// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use base64::{self, engine::general_purpose, Engine as _};

use super::errors::Error;

/// decodes bytes from a base64url-encoded (unpadded) token segment
pub fn decode_segment(v: &str, what: &str) -> Result<Vec<u8>, Error> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(v)
        .map_err(|e| Error::MalformedToken(format!("{what}: {e}")))
}

/// decodes an `x5c` array element.  RFC 7515 mandates standard base64, but
/// url-safe encodings are seen in the wild and accepted as well.
pub fn decode_x5c(v: &str) -> Result<Vec<u8>, Error> {
    general_purpose::STANDARD
        .decode(v)
        .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(v.trim_end_matches('=')))
        .map_err(|e| Error::MissingSigningCertificate(format!("x5c[0]: {e}")))
}

/// encodes bytes as base64url without padding
pub fn encode_url(v: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x5c_accepts_both_alphabets() {
        let raw = [0xfbu8, 0xff, 0x01, 0x02];

        let std = general_purpose::STANDARD.encode(raw);
        assert_eq!(decode_x5c(&std).unwrap(), raw);

        let url = encode_url(&raw);
        assert_eq!(decode_x5c(&url).unwrap(), raw);
    }

    #[test]
    fn bad_segment() {
        let r = decode_segment("not*base64", "payload");
        assert!(matches!(r, Err(Error::MalformedToken(_))));
    }
}
