//! Optional upload of persisted artifacts to S3.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Object key for an artifact file, `<prefix>/<file name>[.gz]`.
pub fn object_key(prefix: &str, file_name: &str, gzip: bool) -> String {
    let prefix = prefix.trim_matches('/');
    let name = if gzip {
        format!("{file_name}.gz")
    } else {
        file_name.to_string()
    };

    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}

fn content_type(file_name: &str) -> &'static str {
    if file_name.ends_with(".json") {
        "application/json"
    } else {
        "text/csv"
    }
}

fn gzip_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Uploads each artifact, optionally gzip-compressed, replacing any object
/// stored under the same key by a previous run.
#[tracing::instrument(skip(client, artifacts), fields(artifacts = artifacts.len()))]
pub async fn upload_artifacts(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
    artifacts: &[impl AsRef<Path>],
    gzip: bool,
) -> Result<usize> {
    let mut upload_count = 0;

    for path in artifacts {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("artifact path has no file name: {}", path.display()))?;

        let contents = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let body = if gzip { gzip_bytes(&contents)? } else { contents };
        let key = object_key(prefix, file_name, gzip);

        let mut request = client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type(file_name));
        if gzip {
            request = request.content_encoding("gzip");
        }
        request
            .send()
            .await
            .with_context(|| format!("uploading s3://{bucket}/{key}"))?;

        debug!(key = %key, "Artifact uploaded");
        upload_count += 1;
    }

    info!(upload_count, "S3 upload complete");
    Ok(upload_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("demand", "hourlydemand.csv", false), "demand/hourlydemand.csv");
        assert_eq!(
            object_key("/demand/latest/", "summary.json", true),
            "demand/latest/summary.json.gz"
        );
        assert_eq!(object_key("", "dailydemand.csv", false), "dailydemand.csv");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("summary.json"), "application/json");
        assert_eq!(content_type("monthlydemand.csv"), "text/csv");
    }

    #[test]
    fn test_gzip_bytes_round_trip() {
        let compressed = gzip_bytes(b"time,avg_power_demand_W\n").unwrap();

        let mut decoded = String::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "time,avg_power_demand_W\n");
    }
}
