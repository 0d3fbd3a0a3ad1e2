use super::*;

#[test]
fn test_uri_encode_passes_unreserved() {
    assert_eq!(uri_encode("simple-key_1.pdf"), "simple-key_1.pdf");
    assert_eq!(uri_encode("my file.pdf"), "my%20file.pdf");
    assert_eq!(uri_encode("a+b"), "a%2Bb");
}

#[test]
fn test_encode_key_preserves_slashes() {
    assert_eq!(
        encode_key("papers/2024/my thesis.pdf"),
        "papers/2024/my%20thesis.pdf"
    );
}

#[test]
fn test_to_hex() {
    assert_eq!(to_hex(&[0x00, 0xff, 0x10]), "00ff10");
}

#[test]
fn test_signing_key_is_deterministic() {
    let client = MinioClient::new("http://localhost:9000", "minio", "minio123", "us-east-1")
        .expect("valid endpoint");

    let a = client.signing_key("20240115").sign(b"payload");
    let b = client.signing_key("20240115").sign(b"payload");
    let c = client.signing_key("20240116").sign(b"payload");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 32);
}

#[test]
fn test_endpoint_host_includes_port() {
    let client = MinioClient::new("http://localhost:9000/", "ak", "sk", "us-east-1")
        .expect("valid endpoint");
    assert_eq!(client.host, "localhost:9000");

    let client = MinioClient::new("https://minio.internal", "ak", "sk", "us-east-1")
        .expect("valid endpoint");
    assert_eq!(client.host, "minio.internal");
}

#[test]
fn test_invalid_endpoint_rejected() {
    let result = MinioClient::new("not a url", "ak", "sk", "us-east-1");
    assert!(matches!(
        result,
        Err(ObjectStoreError::InvalidEndpoint { .. })
    ));
}

#[test]
fn test_from_config_requires_credentials() {
    let config = Config::default();
    let client = MinioClient::from_config(&config).expect("no error without creds");
    assert!(client.is_none());

    let config = Config {
        minio_access_key: Some("ak".to_string()),
        minio_secret_key: Some("sk".to_string()),
        ..Default::default()
    };
    let client = MinioClient::from_config(&config).expect("should build");
    assert!(client.is_some());
}
