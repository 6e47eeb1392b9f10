//! Local parameter validation, applied before any remote call.
//!
//! These checks mirror the documented Kinesis service constraints. The
//! remote API remains authoritative; anything it enforces beyond these
//! bounds (e.g. whether a retention increase actually exceeds the current
//! value) is surfaced as a remote error instead.

use crate::error::{ToolError, ToolResult};

/// Maximum partition key length in bytes (UTF-8 encoded).
pub const MAX_PARTITION_KEY_BYTES: usize = 256;

/// Maximum size of a single record (data plus partition key) in bytes.
pub const MAX_RECORD_BYTES: usize = 1024 * 1024;

/// Maximum number of records in one `put_records` call.
pub const MAX_BATCH_RECORDS: usize = 500;

/// Maximum aggregate payload of one `put_records` call in bytes.
pub const MAX_BATCH_BYTES: usize = 5 * 1024 * 1024;

/// Retention period bounds in hours (one day to one year).
pub const MIN_RETENTION_HOURS: i32 = 24;
pub const MAX_RETENTION_HOURS: i32 = 8760;

/// Shard iterator types accepted by `get_shard_iterator`.
pub const SHARD_ITERATOR_TYPES: &[&str] = &[
    "AT_SEQUENCE_NUMBER",
    "AFTER_SEQUENCE_NUMBER",
    "TRIM_HORIZON",
    "LATEST",
    "AT_TIMESTAMP",
];

/// Shard-level metric names accepted by the enhanced-monitoring tools.
pub const METRICS_NAMES: &[&str] = &[
    "IncomingRecords",
    "IncomingBytes",
    "OutgoingRecords",
    "OutgoingBytes",
    "WriteProvisionedThroughputExceeded",
    "ReadProvisionedThroughputExceeded",
    "IncomingPutRecords",
    "IteratorAgeMilliseconds",
    "ALL",
];

fn invalid(msg: impl Into<String>) -> ToolError {
    ToolError::InvalidParameter(msg.into())
}

pub fn stream_name(name: &str) -> ToolResult<()> {
    if name.is_empty() {
        return Err(invalid("stream_name must not be empty"));
    }
    Ok(())
}

/// At least one of stream_name / stream_arn must address the stream.
pub fn stream_identity(name: Option<&str>, arn: Option<&str>) -> ToolResult<()> {
    match (name, arn) {
        (None, None) => Err(invalid("either stream_name or stream_arn is required")),
        (Some(""), None) | (None, Some("")) | (Some(""), Some("")) => {
            Err(invalid("stream_name and stream_arn must not be empty"))
        }
        _ => Ok(()),
    }
}

pub fn shard_count(count: i32) -> ToolResult<()> {
    if count < 1 {
        return Err(invalid(format!(
            "shard count must be a positive integer, got {count}"
        )));
    }
    Ok(())
}

/// PROVISIONED requires an explicit positive shard count; ON_DEMAND ignores
/// it. Returns the shard count that should be forwarded, if any.
pub fn stream_mode(mode: Option<&str>, shard_count_arg: Option<i32>) -> ToolResult<Option<i32>> {
    match mode {
        Some("ON_DEMAND") => Ok(None),
        Some("PROVISIONED") => match shard_count_arg {
            Some(count) => {
                shard_count(count)?;
                Ok(Some(count))
            }
            None => Err(invalid("PROVISIONED mode requires shard_count")),
        },
        Some(other) => Err(invalid(format!(
            "stream mode must be PROVISIONED or ON_DEMAND, got '{other}'"
        ))),
        None => match shard_count_arg {
            Some(count) => {
                shard_count(count)?;
                Ok(Some(count))
            }
            None => Ok(None),
        },
    }
}

pub fn partition_key(key: &str) -> ToolResult<()> {
    if key.is_empty() {
        return Err(invalid("partition_key must not be empty"));
    }
    if key.len() > MAX_PARTITION_KEY_BYTES {
        return Err(invalid(format!(
            "partition_key is {} bytes, maximum is {MAX_PARTITION_KEY_BYTES}",
            key.len()
        )));
    }
    Ok(())
}

/// Record size check applied after payload encoding. The service counts the
/// data blob and the partition key toward the limit.
pub fn record_size(data_len: usize, partition_key_len: usize) -> ToolResult<()> {
    let total = data_len + partition_key_len;
    if total > MAX_RECORD_BYTES {
        return Err(invalid(format!(
            "record is {total} bytes after encoding, maximum is {MAX_RECORD_BYTES}"
        )));
    }
    Ok(())
}

/// Validates a batch of encoded records, itemizing every offending entry.
///
/// `records` yields `(data_len, partition_key)` per entry in submission
/// order.
pub fn record_batch<'a>(
    records: impl ExactSizeIterator<Item = (usize, &'a str)>,
) -> ToolResult<()> {
    if records.len() == 0 {
        return Err(invalid("records must not be empty"));
    }
    if records.len() > MAX_BATCH_RECORDS {
        return Err(invalid(format!(
            "batch has {} records, maximum is {MAX_BATCH_RECORDS}",
            records.len()
        )));
    }

    let mut aggregate = 0usize;
    let mut faults = Vec::new();
    let mut itemize = |index: usize, result: ToolResult<()>| {
        if let Err(ToolError::InvalidParameter(msg)) = result {
            faults.push(format!("record {index}: {msg}"));
        }
    };
    for (index, (data_len, key)) in records.enumerate() {
        itemize(index, partition_key(key));
        itemize(index, record_size(data_len, key.len()));
        aggregate += data_len + key.len();
    }
    if aggregate > MAX_BATCH_BYTES {
        faults.push(format!(
            "batch is {aggregate} bytes, maximum is {MAX_BATCH_BYTES}"
        ));
    }

    if faults.is_empty() {
        Ok(())
    } else {
        Err(invalid(faults.join("; ")))
    }
}

pub fn retention_hours(hours: i32) -> ToolResult<()> {
    if !(MIN_RETENTION_HOURS..=MAX_RETENTION_HOURS).contains(&hours) {
        return Err(invalid(format!(
            "retention period must be between {MIN_RETENTION_HOURS} and {MAX_RETENTION_HOURS} hours, got {hours}"
        )));
    }
    Ok(())
}

/// Iterator type membership plus the per-type required companions.
pub fn shard_iterator_request(
    iterator_type: &str,
    starting_sequence_number: Option<&str>,
    timestamp: Option<f64>,
) -> ToolResult<()> {
    if !SHARD_ITERATOR_TYPES.contains(&iterator_type) {
        return Err(invalid(format!(
            "shard_iterator_type must be one of {SHARD_ITERATOR_TYPES:?}, got '{iterator_type}'"
        )));
    }
    match iterator_type {
        "AT_SEQUENCE_NUMBER" | "AFTER_SEQUENCE_NUMBER" if starting_sequence_number.is_none() => {
            Err(invalid(format!(
                "{iterator_type} requires starting_sequence_number"
            )))
        }
        "AT_TIMESTAMP" if timestamp.is_none() => {
            Err(invalid("AT_TIMESTAMP requires timestamp"))
        }
        _ => Ok(()),
    }
}

pub fn metrics_names(names: &[String]) -> ToolResult<()> {
    if names.is_empty() {
        return Err(invalid("shard_level_metrics must not be empty"));
    }
    for name in names {
        if !METRICS_NAMES.contains(&name.as_str()) {
            return Err(invalid(format!(
                "unknown shard-level metric '{name}', expected one of {METRICS_NAMES:?}"
            )));
        }
    }
    Ok(())
}

/// Only KMS encryption is supported by the service.
pub fn encryption_type(ty: &str) -> ToolResult<()> {
    if ty != "KMS" {
        return Err(invalid(format!(
            "encryption_type must be KMS, got '{ty}'"
        )));
    }
    Ok(())
}

pub fn scaling_type(ty: &str) -> ToolResult<()> {
    if ty != "UNIFORM_SCALING" {
        return Err(invalid(format!(
            "scaling_type must be UNIFORM_SCALING, got '{ty}'"
        )));
    }
    Ok(())
}

pub fn limit_range(value: Option<i32>, max: i32, what: &str) -> ToolResult<()> {
    if let Some(v) = value {
        if v < 1 || v > max {
            return Err(invalid(format!(
                "{what} must be between 1 and {max}, got {v}"
            )));
        }
    }
    Ok(())
}

pub fn non_empty(value: &str, what: &str) -> ToolResult<()> {
    if value.is_empty() {
        return Err(invalid(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Consumers may be addressed by ARN or by (stream_arn, consumer_name).
pub fn consumer_identity(
    stream_arn: Option<&str>,
    consumer_name: Option<&str>,
    consumer_arn: Option<&str>,
) -> ToolResult<()> {
    let by_arn = consumer_arn.is_some_and(|a| !a.is_empty());
    let by_name = stream_arn.is_some_and(|a| !a.is_empty())
        && consumer_name.is_some_and(|n| !n.is_empty());
    if by_arn || by_name {
        Ok(())
    } else {
        Err(invalid(
            "consumer_arn or both stream_arn and consumer_name are required",
        ))
    }
}
