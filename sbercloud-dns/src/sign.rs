//! SberCloud SDK-HMAC-SHA256 request signature
//!
//! SberCloud uses the Huawei Cloud API gateway signing scheme: a canonical
//! request is hashed, wrapped into a string-to-sign together with the
//! `X-Sdk-Date` timestamp, and HMAC'd with the secret key.

use std::fmt::Write;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::util::truncate_for_log;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm identifier carried in the string-to-sign and the
/// `Authorization` header.
const ALGORITHM: &str = "SDK-HMAC-SHA256";

/// Computes the `Authorization` header for signed API requests.
///
/// Stateless: the same request content and timestamp always produce the same
/// signature. Empty credentials still sign; the server rejects them with an
/// authentication error.
#[derive(Debug, Clone)]
pub struct Signer {
    access_key_id: String,
    secret_access_key: String,
}

impl Signer {
    /// Creates a signer from a long-lived access key / secret key pair.
    pub fn new(access_key_id: String, secret_access_key: String) -> Self {
        Self {
            access_key_id,
            secret_access_key,
        }
    }

    /// Computes the `Authorization` header value for one request.
    ///
    /// `timestamp` must be the `%Y%m%dT%H%M%SZ`-formatted UTC time also sent
    /// in the `X-Sdk-Date` header, and `headers` must contain every header
    /// that is part of the signature (at minimum `Host` and `X-Sdk-Date`).
    pub fn authorization(
        &self,
        method: &str,
        uri: &str,
        query: &str,
        headers: &[(String, String)],
        payload: &str,
        timestamp: &str,
    ) -> String {
        let (canonical_request, signed_headers) =
            canonical_request(method, uri, query, headers, payload);

        log::debug!("CanonicalRequest:\n{}", truncate_for_log(&canonical_request));

        let hashed_request = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!("{ALGORITHM}\n{timestamp}\n{hashed_request}");

        log::debug!("StringToSign:\n{string_to_sign}");

        let signature = hex::encode(hmac_sha256(
            self.secret_access_key.as_bytes(),
            string_to_sign.as_bytes(),
        ));

        format!(
            "{ALGORITHM} Access={}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key_id
        )
    }
}

/// Builds the canonical request and the signed-headers list.
fn canonical_request(
    method: &str,
    uri: &str,
    query: &str,
    headers: &[(String, String)],
    payload: &str,
) -> (String, String) {
    // Canonical URI always ends with "/".
    let canonical_uri = if uri.ends_with('/') {
        uri.to_string()
    } else {
        format!("{uri}/")
    };

    // Query parameters sorted bytewise by name.
    let canonical_query = if query.is_empty() {
        String::new()
    } else {
        let mut params: Vec<&str> = query.split('&').collect();
        params.sort_unstable();
        params.join("&")
    };

    // Headers lowercased and sorted by name.
    let mut sorted_headers: Vec<_> = headers.iter().collect();
    sorted_headers.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));

    let canonical_headers = sorted_headers
        .iter()
        .fold(String::new(), |mut acc, (name, value)| {
            let _ = writeln!(acc, "{}:{}", name.to_lowercase(), value.trim());
            acc
        });

    let signed_headers = sorted_headers
        .iter()
        .map(|(name, _)| name.to_lowercase())
        .collect::<Vec<_>>()
        .join(";");

    let hashed_payload = hex::encode(Sha256::digest(payload.as_bytes()));

    let request = format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{hashed_payload}"
    );
    (request, signed_headers)
}

/// HMAC-SHA256 helper.
pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
