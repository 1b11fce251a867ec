//! InfluxDB 1.x sink
//!
//! Records are encoded as line protocol and posted in a single `/write`
//! request per run, nanosecond precision, optionally gzip-compressed.

use crate::config::InfluxConfig;
use crate::emit::{FieldValue, WriteRecord};
use crate::error::{JuicesyncError, Result};
use crate::logging::{StructuredLogger, get_logger};
use flate2::Compression;
use flate2::write::GzEncoder;
use influxdb2::models::{DataPoint, FieldValue as PointValue, WriteDataPoint};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT};
use std::io::Write as _;

/// Destination for a run's records
#[async_trait::async_trait]
pub trait PointSink: Send + Sync {
    async fn write_points(&self, records: &[WriteRecord]) -> Result<()>;
}

/// Line protocol has no escape for line breaks; they become spaces
fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

fn point_value(value: &FieldValue) -> Option<PointValue> {
    match value {
        FieldValue::Float(v) if v.is_finite() => Some(PointValue::from(*v)),
        FieldValue::Float(_) => None,
        FieldValue::Integer(v) => Some(PointValue::from(*v)),
        FieldValue::Text(s) => Some(PointValue::from(single_line(s))),
    }
}

/// Build the data point for a record; `None` when no field survives
pub fn to_data_point(record: &WriteRecord) -> Option<DataPoint> {
    let mut builder = DataPoint::builder(single_line(&record.measurement));
    for (key, value) in record.tags.iter().filter(|(_, v)| !v.is_empty()) {
        builder = builder.tag(single_line(key), single_line(value));
    }
    for (key, value) in &record.fields {
        if let Some(value) = point_value(value) {
            builder = builder.field(single_line(key), value);
        }
    }
    if let Some(ts) = record.timestamp_ns {
        builder = builder.timestamp(ts);
    }
    builder.build().ok()
}

/// Encode one record as a line-protocol line.
///
/// Empty tag values and non-finite floats are dropped; a record left without
/// any field has no valid encoding and yields `None`.
pub fn encode_line(record: &WriteRecord) -> Option<String> {
    let point = to_data_point(record)?;
    let mut buf = Vec::new();
    point.write_data_point_to(&mut buf).ok()?;
    let line = String::from_utf8(buf).ok()?;
    Some(line.trim_end_matches('\n').to_string())
}

/// Encode a batch, one line per encodable record
pub fn encode_batch(records: &[WriteRecord]) -> String {
    records
        .iter()
        .filter_map(encode_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn gzip(body: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    Ok(encoder.finish()?)
}

/// HTTP writer for an InfluxDB 1.x database
pub struct InfluxClient {
    http: reqwest::Client,
    write_url: String,
    config: InfluxConfig,
    logger: StructuredLogger,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.ssl && !config.verify_ssl)
            .build()?;
        let scheme = if config.ssl { "https" } else { "http" };
        Ok(Self {
            http,
            write_url: format!("{}://{}:{}/write", scheme, config.host, config.port),
            config: config.clone(),
            logger: get_logger("influx"),
        })
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }
}

#[async_trait::async_trait]
impl PointSink for InfluxClient {
    async fn write_points(&self, records: &[WriteRecord]) -> Result<()> {
        let body = encode_batch(records);
        if body.is_empty() {
            self.logger.debug("nothing to write");
            return Ok(());
        }

        let mut request = self
            .http
            .post(&self.write_url)
            .query(&[("db", self.config.database.as_str()), ("precision", "ns")])
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(USER_AGENT, concat!("juicesync/", env!("CARGO_PKG_VERSION")));
        if !self.config.username.is_empty() {
            request = request.basic_auth(&self.config.username, Some(&self.config.password));
        }
        request = if self.config.gzip {
            request
                .header(CONTENT_ENCODING, "gzip")
                .body(gzip(body.as_bytes())?)
        } else {
            request.body(body)
        };

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            let msg = format!(
                "write to {} failed with HTTP {}: {}",
                self.config.database,
                status,
                detail.trim()
            );
            self.logger.error(&msg);
            return Err(JuicesyncError::sink(msg));
        }

        self.logger
            .info(&format!("wrote {} records to {}", records.len(), self.config.database));
        Ok(())
    }
}

/// Logs the encoded batch instead of writing it
pub struct DryRunSink {
    logger: StructuredLogger,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self {
            logger: get_logger("dry-run"),
        }
    }
}

impl Default for DryRunSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PointSink for DryRunSink {
    async fn write_points(&self, records: &[WriteRecord]) -> Result<()> {
        for line in records.iter().filter_map(encode_line) {
            self.logger.info(&line);
        }
        Ok(())
    }
}
