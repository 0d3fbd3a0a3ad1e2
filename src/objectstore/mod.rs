//! MinIO/S3 object fetch with AWS Signature V4 signing.
//!
//! Pure-Rust signing via `hmac` + `sha2`; works against MinIO and any
//! S3-compatible endpoint.

#[cfg(test)]
mod tests;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

#[derive(Debug, Error)]
/// Errors from object-store operations.
pub enum ObjectStoreError {
    /// Credentials are not configured.
    #[error("object store credentials are not configured")]
    MissingCredentials,

    /// The endpoint URL could not be parsed.
    #[error("invalid object store endpoint '{endpoint}'")]
    InvalidEndpoint {
        /// Configured endpoint.
        endpoint: String,
    },

    /// The object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },

    /// Transport failure.
    #[error("object store unreachable: {message}")]
    Unavailable {
        /// Transport error message.
        message: String,
    },

    /// The store rejected the request.
    #[error("object store rejected request with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        message: String,
    },
}

/// Minimal S3-compatible client: existence probe and object download.
#[derive(Debug, Clone)]
pub struct MinioClient {
    client: reqwest::Client,
    endpoint: String,
    host: String,
    access_key: String,
    secret_key: String,
    region: String,
}

impl MinioClient {
    /// Creates a client for `endpoint` with static credentials.
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, ObjectStoreError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();

        let url = reqwest::Url::parse(&endpoint).map_err(|_| ObjectStoreError::InvalidEndpoint {
            endpoint: endpoint.clone(),
        })?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(ObjectStoreError::InvalidEndpoint { endpoint });
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            host,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        })
    }

    /// Creates a client from the service configuration; `None` when
    /// credentials are absent (PDF routes disabled).
    pub fn from_config(config: &Config) -> Result<Option<Self>, ObjectStoreError> {
        match (&config.minio_access_key, &config.minio_secret_key) {
            (Some(access_key), Some(secret_key)) => Ok(Some(Self::new(
                config.minio_endpoint.clone(),
                access_key.clone(),
                secret_key.clone(),
                config.minio_region.clone(),
            )?)),
            _ => Ok(None),
        }
    }

    /// Returns `true` if `bucket/key` exists.
    pub async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError> {
        let response = self.signed_request(reqwest::Method::HEAD, bucket, key).await?;

        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(ObjectStoreError::Rejected {
                status,
                message: String::new(),
            }),
        }
    }

    /// Downloads `bucket/key`.
    pub async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let response = self.signed_request(reqwest::Method::GET, bucket, key).await?;
        let status = response.status();

        if status.as_u16() == 404 {
            return Err(ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        if !status.is_success() {
            return Err(ObjectStoreError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ObjectStoreError::Unavailable {
                message: e.to_string(),
            })?;

        debug!(bucket, key, bytes = bytes.len(), "object fetched");
        Ok(bytes.to_vec())
    }

    async fn signed_request(
        &self,
        method: reqwest::Method,
        bucket: &str,
        key: &str,
    ) -> Result<reqwest::Response, ObjectStoreError> {
        let path = format!("/{}/{}", uri_encode(bucket), encode_key(key));
        let now = chrono::Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        // Empty payload for GET/HEAD.
        let payload_hash = to_hex(&Sha256::digest(b""));

        let canonical_request = format!(
            "{}\n{}\n\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            method.as_str(),
            path,
            self.host,
            payload_hash,
            amz_date,
            SIGNED_HEADERS,
            payload_hash
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            to_hex(&Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = to_hex(&self.signing_key(&date).sign(string_to_sign.as_bytes()));

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key, scope, SIGNED_HEADERS, signature
        );

        self.client
            .request(method, format!("{}{}", self.endpoint, path))
            .header("Host", &self.host)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Unavailable {
                message: e.to_string(),
            })
    }

    fn signing_key(&self, date: &str) -> SigningKey {
        let k_date = hmac_sha256(format!("AWS4{}", self.secret_key).as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
        SigningKey(hmac_sha256(&k_service, b"aws4_request"))
    }
}

struct SigningKey(Vec<u8>);

impl SigningKey {
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        hmac_sha256(&self.0, message)
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Percent-encodes one path segment per the SigV4 rules: unreserved
/// characters pass through, everything else is `%XX`-encoded.
fn uri_encode(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Encodes an object key, preserving `/` separators.
fn encode_key(key: &str) -> String {
    key.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}
