//! AWS Signature Version 4 for S3 requests
//!
//! Only what the S3 store needs: no query string, unsigned payload, and the
//! three signed headers `host`, `x-amz-content-sha256`, `x-amz-date`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// One request to sign
pub(crate) struct SigningRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    /// Already URI-encoded absolute path
    pub path: &'a str,
    pub region: &'a str,
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub now: DateTime<Utc>,
}

/// Headers to attach to the signed request
pub(crate) fn sign(req: &SigningRequest<'_>) -> Vec<(&'static str, String)> {
    let amz_date = req.now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = req.now.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/s3/aws4_request", req.region);

    let canonical_request = format!(
        "{}\n{}\n\nhost:{}\nx-amz-content-sha256:{UNSIGNED_PAYLOAD}\nx-amz-date:{amz_date}\n\n{SIGNED_HEADERS}\n{UNSIGNED_PAYLOAD}",
        req.method, req.path, req.host
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(req.secret_access_key, &date, req.region, "s3");
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    vec![
        (
            "Authorization",
            format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
                req.access_key_id
            ),
        ),
        ("x-amz-content-sha256", UNSIGNED_PAYLOAD.to_string()),
        ("x-amz-date", amz_date),
    ]
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

/// Percent-encode an object key for the request path, keeping `/`
pub(crate) fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char);
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn signing_key_matches_aws_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn encode_key_keeps_separators() {
        assert_eq!(encode_key("npm/app/1.0/abc.tar.gz"), "npm/app/1.0/abc.tar.gz");
        assert_eq!(encode_key("npm/@scope-pkg/x+y"), "npm/%40scope-pkg/x%2By");
    }

    #[test]
    fn sign_produces_expected_headers() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let req = SigningRequest {
            method: "GET",
            host: "s3.us-east-1.amazonaws.com",
            path: "/bucket/npm/app/abc.tar.gz",
            region: "us-east-1",
            access_key_id: "AKIDEXAMPLE",
            secret_access_key: "secret",
            now,
        };

        let headers = sign(&req);
        let auth = &headers[0].1;
        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240301/us-east-1/s3/aws4_request, "
        ));
        assert!(auth.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
        assert_eq!(headers[2], ("x-amz-date", "20240301T123000Z".to_string()));

        // Same input, same signature
        assert_eq!(sign(&req), headers);
    }

    #[test]
    fn signature_depends_on_method() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let mut req = SigningRequest {
            method: "GET",
            host: "localhost:9000",
            path: "/b/k",
            region: "us-east-1",
            access_key_id: "id",
            secret_access_key: "secret",
            now,
        };
        let get = sign(&req);
        req.method = "PUT";
        assert_ne!(sign(&req)[0], get[0]);
    }
}
