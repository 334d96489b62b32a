//! Integration tests for the cx CLI against a live S3-compatible server
//!
//! The bucket named by `TEST_S3_BUCKET` must already exist. Objects are
//! written under a unique prefix per test.
//!
//! Run with:
//! ```bash
//! docker run -d --name minio -p 9000:9000 \
//!     -e MINIO_ROOT_USER=accesskey -e MINIO_ROOT_PASSWORD=secretkey \
//!     minio/minio server /data
//!
//! export TEST_S3_ENDPOINT=http://localhost:9000
//! export TEST_S3_ACCESS_KEY=accesskey
//! export TEST_S3_SECRET_KEY=secretkey
//! export TEST_S3_BUCKET=cx-test
//! cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use cx_core::{ObjectStore, ObjectStream, S3Keys};
use cx_s3::{MultipartConfig, S3Client};
use tempfile::TempDir;

struct TestS3 {
    endpoint: String,
    access_key: String,
    secret_key: String,
    bucket: String,
}

/// Get S3 test configuration from environment
fn get_test_config() -> Option<TestS3> {
    Some(TestS3 {
        endpoint: std::env::var("TEST_S3_ENDPOINT").ok()?,
        access_key: std::env::var("TEST_S3_ACCESS_KEY").ok()?,
        secret_key: std::env::var("TEST_S3_SECRET_KEY").ok()?,
        bucket: std::env::var("TEST_S3_BUCKET").unwrap_or_else(|_| "cx-test".to_string()),
    })
}

fn run_cx(args: &[&str], s3: &TestS3, dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cx"))
        .args(args)
        .current_dir(dir)
        .env("CX_CONFIG_DIR", dir.join("config"))
        .env("AWS_ENDPOINT_URL", &s3.endpoint)
        .env("AWS_ACCESS_KEY", &s3.access_key)
        .env("AWS_SECRET_KEY", &s3.secret_key)
        .env("AWS_REGION", "us-east-1")
        .env_remove("S3_BUCKET")
        .output()
        .expect("Failed to execute cx command")
}

/// Generate unique suffix for test resources
fn uuid_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:x}", duration.as_nanos() % 0xFFFFFFFF)
}

fn client(s3: &TestS3, runtime: &tokio::runtime::Runtime, part_size: u64) -> S3Client {
    let keys = S3Keys {
        access_key: s3.access_key.clone(),
        secret_key: s3.secret_key.clone(),
        region: "us-east-1".to_string(),
        endpoint: Some(s3.endpoint.clone()),
    };
    runtime
        .block_on(S3Client::new(&keys, MultipartConfig::new().part_size(part_size)))
        .expect("Failed to create S3 client")
}

fn seed(s3: &TestS3, objects: &[(&str, Vec<u8>)], part_size: u64) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let client = client(s3, &runtime, part_size);
    for (key, data) in objects {
        let written = runtime
            .block_on(client.put_object_stream(
                &s3.bucket,
                key,
                ObjectStream::from_bytes(data.clone()),
            ))
            .expect("Failed to seed object");
        assert_eq!(written, data.len() as u64);
    }
}

fn json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "cx failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

mod listing_operations {
    use super::*;

    #[test]
    fn test_buckets_include_test_bucket() {
        let Some(s3) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let dir = TempDir::new().unwrap();

        let value = json(&run_cx(&["--json", "s3", "buckets"], &s3, dir.path()));
        let names: Vec<&str> = value["items"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|b| b["name"].as_str())
            .collect();
        assert!(names.contains(&s3.bucket.as_str()));
    }

    #[test]
    fn test_list_objects_with_prefix_and_pattern() {
        let Some(s3) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let dir = TempDir::new().unwrap();
        let prefix = format!("ls-{}", uuid_suffix());

        let keys = [
            format!("{prefix}/q1.csv"),
            format!("{prefix}/q2.csv"),
            format!("{prefix}/notes.txt"),
        ];
        seed(
            &s3,
            &[
                (keys[0].as_str(), b"a,b\n".to_vec()),
                (keys[1].as_str(), b"c,d\n".to_vec()),
                (keys[2].as_str(), b"hello".to_vec()),
            ],
            8 * 1024 * 1024,
        );

        let value = json(&run_cx(
            &["--json", "s3", "ls", &s3.bucket, "--prefix", &prefix],
            &s3,
            dir.path(),
        ));
        assert_eq!(value["total"], 3);

        let value = json(&run_cx(
            &[
                "--json",
                "s3",
                "ls",
                &s3.bucket,
                "--prefix",
                &prefix,
                "--include",
                "*.csv",
            ],
            &s3,
            dir.path(),
        ));
        assert_eq!(value["total"], 2);
    }

    #[test]
    fn test_empty_prefix_lists_nothing() {
        let Some(s3) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let dir = TempDir::new().unwrap();
        let prefix = format!("none-{}", uuid_suffix());

        let value = json(&run_cx(
            &["--json", "s3", "ls", &s3.bucket, "--prefix", &prefix],
            &s3,
            dir.path(),
        ));
        assert_eq!(value["total"], 0);
    }
}

mod multipart_operations {
    use super::*;

    #[test]
    fn test_multipart_object_lists_full_size() {
        let Some(s3) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let dir = TempDir::new().unwrap();
        let key = format!("mp-{}/large.bin", uuid_suffix());

        // 5 MiB parts: two full parts and a short tail
        let size = 12 * 1024 * 1024 + 17;
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        seed(&s3, &[(key.as_str(), data)], 5 * 1024 * 1024);

        let value = json(&run_cx(
            &["--json", "s3", "ls", &s3.bucket, "--prefix", &key],
            &s3,
            dir.path(),
        ));
        assert_eq!(value["items"][0]["size_bytes"], size as u64);
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn test_missing_bucket_is_listing_error() {
        let Some(s3) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let dir = TempDir::new().unwrap();
        let bucket = format!("cx-missing-{}", uuid_suffix());

        let output = run_cx(&["s3", "ls", &bucket], &s3, dir.path());
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_bad_secret_is_listing_error() {
        let Some(mut s3) = get_test_config() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        s3.secret_key = "wrong".to_string();
        let dir = TempDir::new().unwrap();

        let output = run_cx(&["s3", "buckets"], &s3, dir.path());
        assert!(!output.status.success());
    }
}
