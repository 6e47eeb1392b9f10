//! Tool registry and dispatch pipeline.
//!
//! Every supported Kinesis operation is one entry in [`TOOLS`]: name,
//! description, mutation classification, JSON input schema, and handler.
//! Dispatch resolves the tool, applies the mutation guard, then runs the
//! handler, which parses and validates arguments, encodes payloads, and
//! forwards to the [`KinesisApi`] seam. A call refused by the guard never
//! reaches validation or the network.

use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use convert_case::{Case, Casing};
use crossterm::{queue, style};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::{EncodedRecord, KinesisApi};
use crate::codec;
use crate::config::ServerConfig;
use crate::error::{ToolError, ToolResult};
use crate::{guard, validate};

/// Capacity mode selector, accepted under its wire name or snake case.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamModeArg {
    #[serde(alias = "StreamMode")]
    pub stream_mode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStreamArgs {
    pub stream_name: String,
    pub shard_count: Option<i32>,
    pub stream_mode_details: Option<StreamModeArg>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteStreamArgs {
    pub stream_name: String,
    pub enforce_consumer_deletion: Option<bool>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescribeStreamArgs {
    pub stream_name: String,
    pub limit: Option<i32>,
    pub exclusive_start_shard_id: Option<String>,
    pub stream_arn: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescribeStreamSummaryArgs {
    pub stream_name: String,
    pub stream_arn: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListStreamsArgs {
    pub limit: Option<i32>,
    pub exclusive_start_stream_name: Option<String>,
    pub next_token: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListShardsArgs {
    pub stream_name: Option<String>,
    pub next_token: Option<String>,
    pub exclusive_start_shard_id: Option<String>,
    pub max_results: Option<i32>,
    pub stream_creation_timestamp: Option<f64>,
    pub stream_arn: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShardCountArgs {
    pub stream_name: String,
    pub target_shard_count: i32,
    pub scaling_type: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStreamModeArgs {
    pub stream_arn: String,
    pub stream_mode_details: StreamModeArg,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeShardsArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub shard_to_merge: String,
    pub adjacent_shard_to_merge: String,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitShardArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub shard_to_split: String,
    pub new_starting_hash_key: String,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutRecordArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub data: String,
    pub partition_key: String,
    pub explicit_hash_key: Option<String>,
    pub sequence_number_for_ordering: Option<String>,
    pub region_name: Option<String>,
}

/// Batch entry, accepted under the service's wire names or snake case.
#[derive(Debug, Clone, Deserialize)]
pub struct PutRecordsEntryArg {
    #[serde(alias = "Data")]
    pub data: String,
    #[serde(alias = "PartitionKey")]
    pub partition_key: String,
    #[serde(alias = "ExplicitHashKey")]
    pub explicit_hash_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutRecordsArgs {
    pub records: Vec<PutRecordsEntryArg>,
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetShardIteratorArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub shard_id: String,
    pub shard_iterator_type: String,
    pub starting_sequence_number: Option<String>,
    pub timestamp: Option<f64>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetRecordsArgs {
    pub shard_iterator: String,
    pub limit: Option<i32>,
    pub stream_arn: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub shard_level_metrics: Vec<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncryptionArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub encryption_type: Option<String>,
    pub key_id: String,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTagsArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub tags: HashMap<String, String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveTagsArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub tag_keys: Vec<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListTagsArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub exclusive_start_tag_key: Option<String>,
    pub limit: Option<i32>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionArgs {
    pub stream_name: Option<String>,
    pub stream_arn: Option<String>,
    pub retention_period_hours: i32,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConsumerArgs {
    pub stream_arn: String,
    pub consumer_name: String,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerIdentityArgs {
    pub stream_arn: Option<String>,
    pub consumer_name: Option<String>,
    pub consumer_arn: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConsumersArgs {
    pub stream_arn: String,
    pub next_token: Option<String>,
    pub max_results: Option<i32>,
    pub stream_creation_timestamp: Option<f64>,
    pub region_name: Option<String>,
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> ToolResult<T> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidParameter(format!("invalid arguments: {e}")))
}

async fn create_stream(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let mut args: CreateStreamArgs = parse_args(arguments)?;
    validate::stream_name(&args.stream_name)?;
    let mode = args
        .stream_mode_details
        .as_ref()
        .map(|d| d.stream_mode.as_str());
    args.shard_count = validate::stream_mode(mode, args.shard_count)?;
    api.create_stream(args).await
}

async fn delete_stream(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: DeleteStreamArgs = parse_args(arguments)?;
    validate::stream_name(&args.stream_name)?;
    api.delete_stream(args).await
}

async fn describe_stream(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: DescribeStreamArgs = parse_args(arguments)?;
    validate::stream_name(&args.stream_name)?;
    validate::limit_range(args.limit, 10_000, "limit")?;
    api.describe_stream(args).await
}

async fn describe_stream_summary(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: DescribeStreamSummaryArgs = parse_args(arguments)?;
    validate::stream_name(&args.stream_name)?;
    api.describe_stream_summary(args).await
}

async fn list_streams(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: ListStreamsArgs = parse_args(arguments)?;
    validate::limit_range(args.limit, 10_000, "limit")?;
    api.list_streams(args).await
}

async fn list_shards(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: ListShardsArgs = parse_args(arguments)?;
    // A pagination token alone addresses the stream it came from.
    if args.next_token.is_none() {
        validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    }
    validate::limit_range(args.max_results, 10_000, "max_results")?;
    api.list_shards(args).await
}

async fn update_shard_count(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let mut args: UpdateShardCountArgs = parse_args(arguments)?;
    validate::stream_name(&args.stream_name)?;
    validate::shard_count(args.target_shard_count)?;
    let scaling = args
        .scaling_type
        .get_or_insert_with(|| "UNIFORM_SCALING".to_string());
    validate::scaling_type(scaling)?;
    api.update_shard_count(args).await
}

async fn update_stream_mode(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: UpdateStreamModeArgs = parse_args(arguments)?;
    validate::non_empty(&args.stream_arn, "stream_arn")?;
    let mode = args.stream_mode_details.stream_mode.as_str();
    if !matches!(mode, "PROVISIONED" | "ON_DEMAND") {
        return Err(ToolError::InvalidParameter(format!(
            "stream mode must be PROVISIONED or ON_DEMAND, got '{mode}'"
        )));
    }
    api.update_stream_mode(args).await
}

async fn merge_shards(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: MergeShardsArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    validate::non_empty(&args.shard_to_merge, "shard_to_merge")?;
    validate::non_empty(&args.adjacent_shard_to_merge, "adjacent_shard_to_merge")?;
    api.merge_shards(args).await
}

async fn split_shard(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: SplitShardArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    validate::non_empty(&args.shard_to_split, "shard_to_split")?;
    validate::non_empty(&args.new_starting_hash_key, "new_starting_hash_key")?;
    api.split_shard(args).await
}

async fn put_record(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: PutRecordArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    validate::partition_key(&args.partition_key)?;
    let data = codec::encode_data(&args.data);
    validate::record_size(data.len(), args.partition_key.len())?;
    api.put_record(args, data).await
}

async fn put_records(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: PutRecordsArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    let encoded: Vec<EncodedRecord> = args
        .records
        .iter()
        .map(|r| EncodedRecord {
            data: codec::encode_data(&r.data),
            partition_key: r.partition_key.clone(),
            explicit_hash_key: r.explicit_hash_key.clone(),
        })
        .collect();
    validate::record_batch(encoded.iter().map(|r| (r.data.len(), r.partition_key.as_str())))?;
    api.put_records(args, encoded).await
}

async fn get_shard_iterator(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: GetShardIteratorArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    validate::non_empty(&args.shard_id, "shard_id")?;
    validate::shard_iterator_request(
        &args.shard_iterator_type,
        args.starting_sequence_number.as_deref(),
        args.timestamp,
    )?;
    api.get_shard_iterator(args).await
}

async fn get_records(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: GetRecordsArgs = parse_args(arguments)?;
    validate::non_empty(&args.shard_iterator, "shard_iterator")?;
    validate::limit_range(args.limit, 10_000, "limit")?;
    api.get_records(args).await
}

fn monitoring_checks(args: &MonitoringArgs) -> ToolResult<()> {
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    validate::metrics_names(&args.shard_level_metrics)
}

async fn enable_enhanced_monitoring(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: MonitoringArgs = parse_args(arguments)?;
    monitoring_checks(&args)?;
    api.enable_enhanced_monitoring(args).await
}

async fn disable_enhanced_monitoring(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: MonitoringArgs = parse_args(arguments)?;
    monitoring_checks(&args)?;
    api.disable_enhanced_monitoring(args).await
}

fn encryption_checks(args: &EncryptionArgs) -> ToolResult<()> {
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    if let Some(ty) = &args.encryption_type {
        validate::encryption_type(ty)?;
    }
    validate::non_empty(&args.key_id, "key_id")
}

async fn start_stream_encryption(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: EncryptionArgs = parse_args(arguments)?;
    encryption_checks(&args)?;
    api.start_stream_encryption(args).await
}

async fn stop_stream_encryption(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: EncryptionArgs = parse_args(arguments)?;
    encryption_checks(&args)?;
    api.stop_stream_encryption(args).await
}

async fn add_tags_to_stream(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: AddTagsArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    if args.tags.is_empty() {
        return Err(ToolError::InvalidParameter("tags must not be empty".to_string()));
    }
    api.add_tags_to_stream(args).await
}

async fn remove_tags_from_stream(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: RemoveTagsArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    if args.tag_keys.is_empty() {
        return Err(ToolError::InvalidParameter("tag_keys must not be empty".to_string()));
    }
    api.remove_tags_from_stream(args).await
}

async fn list_tags_for_stream(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: ListTagsArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    validate::limit_range(args.limit, 50, "limit")?;
    api.list_tags_for_stream(args).await
}

async fn increase_stream_retention_period(
    api: &dyn KinesisApi,
    arguments: Value,
) -> ToolResult<Value> {
    let args: RetentionArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    validate::retention_hours(args.retention_period_hours)?;
    api.increase_stream_retention_period(args).await
}

async fn decrease_stream_retention_period(
    api: &dyn KinesisApi,
    arguments: Value,
) -> ToolResult<Value> {
    let args: RetentionArgs = parse_args(arguments)?;
    validate::stream_identity(args.stream_name.as_deref(), args.stream_arn.as_deref())?;
    validate::retention_hours(args.retention_period_hours)?;
    api.decrease_stream_retention_period(args).await
}

async fn register_stream_consumer(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: RegisterConsumerArgs = parse_args(arguments)?;
    validate::non_empty(&args.stream_arn, "stream_arn")?;
    validate::non_empty(&args.consumer_name, "consumer_name")?;
    api.register_stream_consumer(args).await
}

async fn deregister_stream_consumer(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: ConsumerIdentityArgs = parse_args(arguments)?;
    validate::consumer_identity(
        args.stream_arn.as_deref(),
        args.consumer_name.as_deref(),
        args.consumer_arn.as_deref(),
    )?;
    api.deregister_stream_consumer(args).await
}

async fn describe_stream_consumer(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: ConsumerIdentityArgs = parse_args(arguments)?;
    validate::consumer_identity(
        args.stream_arn.as_deref(),
        args.consumer_name.as_deref(),
        args.consumer_arn.as_deref(),
    )?;
    api.describe_stream_consumer(args).await
}

async fn list_stream_consumers(api: &dyn KinesisApi, arguments: Value) -> ToolResult<Value> {
    let args: ListConsumersArgs = parse_args(arguments)?;
    validate::non_empty(&args.stream_arn, "stream_arn")?;
    validate::limit_range(args.max_results, 10_000, "max_results")?;
    api.list_stream_consumers(args).await
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string_prop(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn integer_prop(description: &str) -> Value {
    json!({ "type": "integer", "description": description })
}

fn number_prop(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

fn boolean_prop(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

fn region_prop() -> Value {
    string_prop("AWS region for the call (defaults to AWS_REGION, then us-west-2)")
}

fn stream_name_prop() -> Value {
    string_prop("Name of the stream")
}

fn stream_arn_prop() -> Value {
    string_prop("ARN of the stream (alternative to stream_name)")
}

fn create_stream_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "shard_count": integer_prop("Number of shards, required in PROVISIONED mode"),
            "stream_mode_details": {
                "type": "object",
                "properties": {
                    "StreamMode": {
                        "type": "string",
                        "enum": ["PROVISIONED", "ON_DEMAND"],
                        "description": "Capacity mode of the stream",
                    },
                },
                "required": ["StreamMode"],
            },
            "region_name": region_prop(),
        }),
        &["stream_name"],
    )
}

fn delete_stream_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "enforce_consumer_deletion": boolean_prop(
                "Delete the stream even if it has registered consumers"
            ),
            "region_name": region_prop(),
        }),
        &["stream_name"],
    )
}

fn describe_stream_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "limit": integer_prop("Maximum number of shards to return (1-10000)"),
            "exclusive_start_shard_id": string_prop("Shard ID to start listing after"),
            "stream_arn": stream_arn_prop(),
            "region_name": region_prop(),
        }),
        &["stream_name"],
    )
}

fn describe_stream_summary_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "region_name": region_prop(),
        }),
        &["stream_name"],
    )
}

fn list_streams_schema() -> Value {
    object_schema(
        json!({
            "limit": integer_prop("Maximum number of streams to return (1-10000)"),
            "exclusive_start_stream_name": string_prop("Stream name to start listing after"),
            "next_token": string_prop("Pagination token from a previous call"),
            "region_name": region_prop(),
        }),
        &[],
    )
}

fn list_shards_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "next_token": string_prop("Pagination token from a previous call"),
            "exclusive_start_shard_id": string_prop("Shard ID to start listing after"),
            "max_results": integer_prop("Maximum number of shards to return (1-10000)"),
            "stream_creation_timestamp": number_prop(
                "Creation time (epoch seconds) disambiguating same-named streams"
            ),
            "stream_arn": stream_arn_prop(),
            "region_name": region_prop(),
        }),
        &[],
    )
}

fn update_shard_count_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "target_shard_count": integer_prop("Desired number of shards"),
            "scaling_type": {
                "type": "string",
                "enum": ["UNIFORM_SCALING"],
                "description": "Scaling strategy",
            },
            "region_name": region_prop(),
        }),
        &["stream_name", "target_shard_count"],
    )
}

fn update_stream_mode_schema() -> Value {
    object_schema(
        json!({
            "stream_arn": string_prop("ARN of the stream"),
            "stream_mode_details": {
                "type": "object",
                "properties": {
                    "StreamMode": {
                        "type": "string",
                        "enum": ["PROVISIONED", "ON_DEMAND"],
                        "description": "Capacity mode to switch to",
                    },
                },
                "required": ["StreamMode"],
            },
            "region_name": region_prop(),
        }),
        &["stream_arn", "stream_mode_details"],
    )
}

fn merge_shards_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "shard_to_merge": string_prop("Shard ID of the shard to merge"),
            "adjacent_shard_to_merge": string_prop("Shard ID of the adjacent shard"),
            "region_name": region_prop(),
        }),
        &["shard_to_merge", "adjacent_shard_to_merge"],
    )
}

fn split_shard_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "shard_to_split": string_prop("Shard ID of the shard to split"),
            "new_starting_hash_key": string_prop(
                "Hash key where the split occurs, within the shard's hash key range"
            ),
            "region_name": region_prop(),
        }),
        &["shard_to_split", "new_starting_hash_key"],
    )
}

fn put_record_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "data": string_prop(
                "Record payload: UTF-8 text, or base64 for binary data (decoded before sending)"
            ),
            "partition_key": string_prop("Partition key determining the target shard (max 256 bytes)"),
            "explicit_hash_key": string_prop("Hash key overriding the partition key mapping"),
            "sequence_number_for_ordering": string_prop(
                "Sequence number to order this record after"
            ),
            "region_name": region_prop(),
        }),
        &["data", "partition_key"],
    )
}

fn put_records_schema() -> Value {
    object_schema(
        json!({
            "records": {
                "type": "array",
                "description": "Up to 500 records, 5 MiB aggregate",
                "items": {
                    "type": "object",
                    "properties": {
                        "Data": string_prop("Record payload: UTF-8 text or base64 for binary"),
                        "PartitionKey": string_prop("Partition key for this record"),
                        "ExplicitHashKey": string_prop("Hash key overriding the partition key"),
                    },
                    "required": ["Data", "PartitionKey"],
                },
            },
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "region_name": region_prop(),
        }),
        &["records"],
    )
}

fn get_shard_iterator_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "shard_id": string_prop("Shard to read from"),
            "shard_iterator_type": {
                "type": "string",
                "enum": validate::SHARD_ITERATOR_TYPES,
                "description": "Where in the shard to start reading",
            },
            "starting_sequence_number": string_prop(
                "Required for AT_SEQUENCE_NUMBER and AFTER_SEQUENCE_NUMBER"
            ),
            "timestamp": number_prop("Epoch seconds, required for AT_TIMESTAMP"),
            "region_name": region_prop(),
        }),
        &["shard_id", "shard_iterator_type"],
    )
}

fn get_records_schema() -> Value {
    object_schema(
        json!({
            "shard_iterator": string_prop("Iterator from get_shard_iterator or a previous read"),
            "limit": integer_prop("Maximum number of records to return (1-10000)"),
            "stream_arn": stream_arn_prop(),
            "region_name": region_prop(),
        }),
        &["shard_iterator"],
    )
}

fn monitoring_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "shard_level_metrics": {
                "type": "array",
                "items": { "type": "string", "enum": validate::METRICS_NAMES },
                "description": "Shard-level metrics to change",
            },
            "region_name": region_prop(),
        }),
        &["shard_level_metrics"],
    )
}

fn encryption_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "encryption_type": {
                "type": "string",
                "enum": ["KMS"],
                "description": "Server-side encryption type (KMS only)",
            },
            "key_id": string_prop("KMS key ID, ARN, or alias"),
            "region_name": region_prop(),
        }),
        &["key_id"],
    )
}

fn add_tags_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "tags": {
                "type": "object",
                "additionalProperties": { "type": "string" },
                "description": "Tag key/value pairs to add or update",
            },
            "region_name": region_prop(),
        }),
        &["tags"],
    )
}

fn remove_tags_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "tag_keys": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Tag keys to remove",
            },
            "region_name": region_prop(),
        }),
        &["tag_keys"],
    )
}

fn list_tags_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "exclusive_start_tag_key": string_prop("Tag key to start listing after"),
            "limit": integer_prop("Maximum number of tags to return (1-50)"),
            "region_name": region_prop(),
        }),
        &[],
    )
}

fn retention_schema() -> Value {
    object_schema(
        json!({
            "stream_name": stream_name_prop(),
            "stream_arn": stream_arn_prop(),
            "retention_period_hours": integer_prop("New retention period in hours (24-8760)"),
            "region_name": region_prop(),
        }),
        &["retention_period_hours"],
    )
}

fn register_consumer_schema() -> Value {
    object_schema(
        json!({
            "stream_arn": string_prop("ARN of the stream"),
            "consumer_name": string_prop("Name for the new consumer"),
            "region_name": region_prop(),
        }),
        &["stream_arn", "consumer_name"],
    )
}

fn consumer_identity_schema() -> Value {
    object_schema(
        json!({
            "consumer_arn": string_prop("ARN of the consumer (alternative to the name pair)"),
            "stream_arn": string_prop("ARN of the stream, paired with consumer_name"),
            "consumer_name": string_prop("Name of the consumer, paired with stream_arn"),
            "region_name": region_prop(),
        }),
        &[],
    )
}

fn list_consumers_schema() -> Value {
    object_schema(
        json!({
            "stream_arn": string_prop("ARN of the stream"),
            "next_token": string_prop("Pagination token from a previous call"),
            "max_results": integer_prop("Maximum number of consumers to return (1-10000)"),
            "stream_creation_timestamp": number_prop(
                "Creation time (epoch seconds) disambiguating same-named streams"
            ),
            "region_name": region_prop(),
        }),
        &["stream_arn"],
    )
}

type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ToolResult<Value>> + Send + 'a>>;
type Handler = for<'a> fn(&'a dyn KinesisApi, Value) -> HandlerFuture<'a>;

/// One registered tool. The mutation flag drives the guard; the schema is
/// what `tools/list` advertises.
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub mutating: bool,
    pub input_schema: fn() -> Value,
    handler: Handler,
}

macro_rules! tool {
    ($name:literal, mutating: $mutating:expr, $schema:path, $handler:path, $description:literal) => {{
        fn call(api: &dyn KinesisApi, arguments: Value) -> HandlerFuture<'_> {
            Box::pin($handler(api, arguments))
        }
        ToolDef {
            name: $name,
            description: $description,
            mutating: $mutating,
            input_schema: $schema,
            handler: call,
        }
    }};
}

/// Every exposed operation. Tools absent from this table do not exist as
/// far as the protocol layer is concerned.
pub static TOOLS: &[ToolDef] = &[
    tool!("create_stream", mutating: true, create_stream_schema, create_stream,
        "Create a new Kinesis data stream with the requested capacity mode."),
    tool!("delete_stream", mutating: true, delete_stream_schema, delete_stream,
        "Delete a Kinesis data stream along with its shards and data."),
    tool!("describe_stream", mutating: false, describe_stream_schema, describe_stream,
        "Describe a stream including its shards, status, and configuration."),
    tool!("describe_stream_summary", mutating: false, describe_stream_summary_schema, describe_stream_summary,
        "Summarize a stream's status and configuration without per-shard detail."),
    tool!("list_streams", mutating: false, list_streams_schema, list_streams,
        "List the Kinesis data streams in the region."),
    tool!("list_shards", mutating: false, list_shards_schema, list_shards,
        "List the shards in a stream."),
    tool!("update_shard_count", mutating: true, update_shard_count_schema, update_shard_count,
        "Change the shard count of a provisioned-mode stream."),
    tool!("update_stream_mode", mutating: true, update_stream_mode_schema, update_stream_mode,
        "Switch a stream between provisioned and on-demand capacity modes."),
    tool!("merge_shards", mutating: true, merge_shards_schema, merge_shards,
        "Merge two adjacent shards into one."),
    tool!("split_shard", mutating: true, split_shard_schema, split_shard,
        "Split a shard into two at the given hash key."),
    tool!("put_record", mutating: true, put_record_schema, put_record,
        "Write a single data record into a stream."),
    tool!("put_records", mutating: true, put_records_schema, put_records,
        "Write a batch of up to 500 data records into a stream in one call."),
    tool!("get_shard_iterator", mutating: false, get_shard_iterator_schema, get_shard_iterator,
        "Obtain a shard iterator positioned for reading records from a shard."),
    tool!("get_records", mutating: false, get_records_schema, get_records,
        "Read data records from a shard using a shard iterator."),
    tool!("enable_enhanced_monitoring", mutating: true, monitoring_schema, enable_enhanced_monitoring,
        "Enable shard-level CloudWatch metrics for a stream."),
    tool!("disable_enhanced_monitoring", mutating: true, monitoring_schema, disable_enhanced_monitoring,
        "Disable shard-level CloudWatch metrics for a stream."),
    tool!("start_stream_encryption", mutating: true, encryption_schema, start_stream_encryption,
        "Enable server-side encryption for a stream using a KMS key."),
    tool!("stop_stream_encryption", mutating: true, encryption_schema, stop_stream_encryption,
        "Disable server-side encryption for a stream."),
    tool!("add_tags_to_stream", mutating: true, add_tags_schema, add_tags_to_stream,
        "Add or update tags on a stream."),
    tool!("remove_tags_from_stream", mutating: true, remove_tags_schema, remove_tags_from_stream,
        "Remove tags from a stream."),
    tool!("list_tags_for_stream", mutating: false, list_tags_schema, list_tags_for_stream,
        "List the tags attached to a stream."),
    tool!("increase_stream_retention_period", mutating: true, retention_schema, increase_stream_retention_period,
        "Increase a stream's record retention period."),
    tool!("decrease_stream_retention_period", mutating: true, retention_schema, decrease_stream_retention_period,
        "Decrease a stream's record retention period."),
    tool!("register_stream_consumer", mutating: true, register_consumer_schema, register_stream_consumer,
        "Register a consumer with a stream for enhanced fan-out."),
    tool!("deregister_stream_consumer", mutating: true, consumer_identity_schema, deregister_stream_consumer,
        "Deregister a consumer from a stream."),
    tool!("describe_stream_consumer", mutating: false, consumer_identity_schema, describe_stream_consumer,
        "Describe a registered stream consumer."),
    tool!("list_stream_consumers", mutating: false, list_consumers_schema, list_stream_consumers,
        "List the consumers registered with a stream."),
];

pub fn find_tool(name: &str) -> Option<&'static ToolDef> {
    TOOLS.iter().find(|t| t.name == name)
}

/// Startup sanity check over the registry.
pub fn verify_registry() -> std::result::Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for tool in TOOLS {
        if !seen.insert(tool.name) {
            return Err(format!("duplicate tool name '{}'", tool.name));
        }
        if !(tool.input_schema)().is_object() {
            return Err(format!("tool '{}' has a non-object input schema", tool.name));
        }
    }
    Ok(())
}

/// Resolves and runs a tool call. The guard decision comes first so a
/// refused mutation is rejected before arguments are even parsed.
pub async fn dispatch(
    config: &ServerConfig,
    api: &dyn KinesisApi,
    name: &str,
    arguments: Value,
) -> ToolResult<Value> {
    let tool = find_tool(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
    guard::check(config.read_only, tool)?;
    debug!(tool = name, "dispatching tool call");
    (tool.handler)(api, arguments).await
}

/// Writes a human-readable description of the call. Payload data is shown
/// as a byte count, never verbatim.
pub fn queue_description(
    name: &str,
    arguments: &Value,
    updates: &mut impl Write,
) -> std::io::Result<()> {
    queue!(
        updates,
        style::Print("Running Kinesis operation:\n\n"),
        style::Print(format!("Operation: {}\n", name.to_case(Case::Title))),
    )?;
    match arguments.get("region_name").and_then(Value::as_str) {
        Some(region) => queue!(updates, style::Print(format!("Region: {region}\n")))?,
        None => queue!(updates, style::Print("Region: (default)\n"))?,
    }
    if let Some(params) = arguments.as_object() {
        let shown: Vec<_> = params.iter().filter(|(k, _)| *k != "region_name").collect();
        if !shown.is_empty() {
            queue!(updates, style::Print("Parameters:\n"))?;
            for (key, value) in shown {
                queue!(
                    updates,
                    style::Print(format!("- {key}: {}\n", display_value(key, value)))
                )?;
            }
        }
    }
    Ok(())
}

fn display_value(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) if key == "data" => format!("<{} bytes>", s.len()),
        Value::Array(items) if key == "records" => format!("<{} records>", items.len()),
        Value::String(s) => {
            let shown = crate::truncate_utf8(s, 64);
            if shown.len() < s.len() {
                format!("{shown}...")
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockKinesis {
        calls: Mutex<Vec<String>>,
        create_args: Mutex<Option<CreateStreamArgs>>,
        shard_count_args: Mutex<Option<UpdateShardCountArgs>>,
        put_data: Mutex<Vec<(Vec<u8>, String)>>,
        batch_data: Mutex<Vec<Vec<EncodedRecord>>>,
    }

    impl MockKinesis {
        fn record_with(&self, op: &str, response: Value) -> ToolResult<Value> {
            self.calls.lock().unwrap().push(op.to_string());
            Ok(response)
        }

        fn record(&self, op: &str) -> ToolResult<Value> {
            self.record_with(op, json!({}))
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl KinesisApi for MockKinesis {
        async fn create_stream(&self, args: CreateStreamArgs) -> ToolResult<Value> {
            *self.create_args.lock().unwrap() = Some(args);
            self.record("create_stream")
        }

        async fn delete_stream(&self, _args: DeleteStreamArgs) -> ToolResult<Value> {
            self.record("delete_stream")
        }

        async fn describe_stream(&self, _args: DescribeStreamArgs) -> ToolResult<Value> {
            self.record("describe_stream")
        }

        async fn describe_stream_summary(
            &self,
            _args: DescribeStreamSummaryArgs,
        ) -> ToolResult<Value> {
            self.record("describe_stream_summary")
        }

        async fn list_streams(&self, _args: ListStreamsArgs) -> ToolResult<Value> {
            self.record_with("list_streams", json!({ "StreamNames": ["orders"] }))
        }

        async fn list_shards(&self, _args: ListShardsArgs) -> ToolResult<Value> {
            self.record("list_shards")
        }

        async fn update_shard_count(&self, args: UpdateShardCountArgs) -> ToolResult<Value> {
            *self.shard_count_args.lock().unwrap() = Some(args);
            self.record("update_shard_count")
        }

        async fn update_stream_mode(&self, _args: UpdateStreamModeArgs) -> ToolResult<Value> {
            self.record("update_stream_mode")
        }

        async fn merge_shards(&self, _args: MergeShardsArgs) -> ToolResult<Value> {
            self.record("merge_shards")
        }

        async fn split_shard(&self, _args: SplitShardArgs) -> ToolResult<Value> {
            self.record("split_shard")
        }

        async fn put_record(&self, args: PutRecordArgs, data: Vec<u8>) -> ToolResult<Value> {
            self.put_data
                .lock()
                .unwrap()
                .push((data, args.partition_key.clone()));
            self.record_with(
                "put_record",
                json!({ "ShardId": "shardId-000000000001", "SequenceNumber": "49590338271490256608559692538361571095921575989136588898" }),
            )
        }

        async fn put_records(
            &self,
            _args: PutRecordsArgs,
            records: Vec<EncodedRecord>,
        ) -> ToolResult<Value> {
            self.batch_data.lock().unwrap().push(records);
            self.record_with(
                "put_records",
                json!({ "FailedRecordCount": 0, "Records": [] }),
            )
        }

        async fn get_shard_iterator(&self, _args: GetShardIteratorArgs) -> ToolResult<Value> {
            self.record("get_shard_iterator")
        }

        async fn get_records(&self, _args: GetRecordsArgs) -> ToolResult<Value> {
            self.record("get_records")
        }

        async fn enable_enhanced_monitoring(&self, _args: MonitoringArgs) -> ToolResult<Value> {
            self.record("enable_enhanced_monitoring")
        }

        async fn disable_enhanced_monitoring(&self, _args: MonitoringArgs) -> ToolResult<Value> {
            self.record("disable_enhanced_monitoring")
        }

        async fn start_stream_encryption(&self, _args: EncryptionArgs) -> ToolResult<Value> {
            self.record("start_stream_encryption")
        }

        async fn stop_stream_encryption(&self, _args: EncryptionArgs) -> ToolResult<Value> {
            self.record("stop_stream_encryption")
        }

        async fn add_tags_to_stream(&self, _args: AddTagsArgs) -> ToolResult<Value> {
            self.record("add_tags_to_stream")
        }

        async fn remove_tags_from_stream(&self, _args: RemoveTagsArgs) -> ToolResult<Value> {
            self.record("remove_tags_from_stream")
        }

        async fn list_tags_for_stream(&self, _args: ListTagsArgs) -> ToolResult<Value> {
            self.record("list_tags_for_stream")
        }

        async fn increase_stream_retention_period(
            &self,
            _args: RetentionArgs,
        ) -> ToolResult<Value> {
            self.record("increase_stream_retention_period")
        }

        async fn decrease_stream_retention_period(
            &self,
            _args: RetentionArgs,
        ) -> ToolResult<Value> {
            self.record("decrease_stream_retention_period")
        }

        async fn register_stream_consumer(
            &self,
            _args: RegisterConsumerArgs,
        ) -> ToolResult<Value> {
            self.record("register_stream_consumer")
        }

        async fn deregister_stream_consumer(
            &self,
            _args: ConsumerIdentityArgs,
        ) -> ToolResult<Value> {
            self.record("deregister_stream_consumer")
        }

        async fn describe_stream_consumer(
            &self,
            _args: ConsumerIdentityArgs,
        ) -> ToolResult<Value> {
            self.record("describe_stream_consumer")
        }

        async fn list_stream_consumers(&self, _args: ListConsumersArgs) -> ToolResult<Value> {
            self.record("list_stream_consumers")
        }
    }

    fn valid_read_args(name: &str) -> Value {
        match name {
            "describe_stream" | "describe_stream_summary" | "list_shards"
            | "list_tags_for_stream" => json!({ "stream_name": "orders" }),
            "list_streams" => json!({}),
            "get_shard_iterator" => json!({
                "stream_name": "orders",
                "shard_id": "shardId-000000000000",
                "shard_iterator_type": "LATEST",
            }),
            "get_records" => json!({ "shard_iterator": "AAAAAAAAAAE=" }),
            "describe_stream_consumer" => json!({
                "consumer_arn": "arn:aws:kinesis:us-west-2:123456789012:stream/orders/consumer/app:1"
            }),
            "list_stream_consumers" => json!({
                "stream_arn": "arn:aws:kinesis:us-west-2:123456789012:stream/orders"
            }),
            other => panic!("no canned read arguments for {other}"),
        }
    }

    #[tokio::test]
    async fn read_only_mode_blocks_every_mutating_tool() {
        let mock = MockKinesis::default();
        let config = ServerConfig::read_only(true);
        for tool in TOOLS.iter().filter(|t| t.mutating) {
            let err = dispatch(&config, &mock, tool.name, json!({}))
                .await
                .unwrap_err();
            assert!(
                matches!(err, ToolError::ReadOnlyViolation { .. }),
                "{} must be refused, got {err:?}",
                tool.name
            );
        }
        assert_eq!(mock.call_count(), 0, "refused calls must issue no remote traffic");
    }

    #[tokio::test]
    async fn read_tools_still_work_in_read_only_mode() {
        let mock = MockKinesis::default();
        let config = ServerConfig::read_only(true);
        let read_tools: Vec<_> = TOOLS.iter().filter(|t| !t.mutating).collect();
        for tool in &read_tools {
            let result = dispatch(&config, &mock, tool.name, valid_read_args(tool.name)).await;
            assert!(result.is_ok(), "{} failed: {result:?}", tool.name);
        }
        assert_eq!(mock.call_count(), read_tools.len());
    }

    #[tokio::test]
    async fn put_record_forwards_text_payload_bytes() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        let result = dispatch(
            &config,
            &mock,
            "put_record",
            json!({ "stream_name": "orders", "data": "CPU:10%", "partition_key": "host-1" }),
        )
        .await
        .unwrap();
        assert_eq!(result["ShardId"], "shardId-000000000001");
        let puts = mock.put_data.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].0, b"CPU:10%");
        assert_eq!(puts[0].1, "host-1");
    }

    #[tokio::test]
    async fn put_record_decodes_base64_payload() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        // "AJ+SlA==" is the standard encoding of [0, 159, 146, 148]
        dispatch(
            &config,
            &mock,
            "put_record",
            json!({ "stream_name": "orders", "data": "AJ+SlA==", "partition_key": "host-1" }),
        )
        .await
        .unwrap();
        let puts = mock.put_data.lock().unwrap();
        assert_eq!(puts[0].0, vec![0u8, 159, 146, 148]);
    }

    #[tokio::test]
    async fn oversized_record_is_rejected_before_any_call() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        let big = "x".repeat(validate::MAX_RECORD_BYTES + 1);
        let err = dispatch(
            &config,
            &mock,
            "put_record",
            json!({ "stream_name": "orders", "data": big, "partition_key": "host-1" }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn put_records_itemizes_oversized_entries() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        let big = "x".repeat(validate::MAX_RECORD_BYTES + 1);
        let err = dispatch(
            &config,
            &mock,
            "put_records",
            json!({
                "stream_name": "orders",
                "records": [
                    { "Data": "fine", "PartitionKey": "a" },
                    { "Data": big, "PartitionKey": "b" },
                ],
            }),
        )
        .await
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("record 1"), "got: {msg}");
        assert!(!msg.contains("record 0"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn put_records_encodes_each_entry() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        dispatch(
            &config,
            &mock,
            "put_records",
            json!({
                "stream_name": "orders",
                "records": [
                    { "Data": "CPU:10%", "PartitionKey": "a" },
                    { "Data": "CPU:90%", "PartitionKey": "b" },
                ],
            }),
        )
        .await
        .unwrap();
        let batches = mock.batch_data.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][0].data, b"CPU:10%");
        assert_eq!(batches[0][1].partition_key, "b");
    }

    #[tokio::test]
    async fn batch_over_record_limit_is_rejected() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        let records: Vec<Value> = (0..=validate::MAX_BATCH_RECORDS)
            .map(|i| json!({ "Data": "x", "PartitionKey": format!("k{i}") }))
            .collect();
        let err = dispatch(
            &config,
            &mock,
            "put_records",
            json!({ "stream_name": "orders", "records": records }),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("maximum is 500"), "{err}");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn iterator_preconditions_are_enforced_locally() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        let err = dispatch(
            &config,
            &mock,
            "get_shard_iterator",
            json!({
                "stream_name": "orders",
                "shard_id": "shardId-000000000000",
                "shard_iterator_type": "AT_SEQUENCE_NUMBER",
            }),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("starting_sequence_number"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn create_stream_on_demand_drops_shard_count() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        dispatch(
            &config,
            &mock,
            "create_stream",
            json!({
                "stream_name": "orders",
                "shard_count": 4,
                "stream_mode_details": { "StreamMode": "ON_DEMAND" },
            }),
        )
        .await
        .unwrap();
        let stored = mock.create_args.lock().unwrap().clone().unwrap();
        assert_eq!(stored.shard_count, None);
    }

    #[tokio::test]
    async fn create_stream_provisioned_requires_shard_count() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        let err = dispatch(
            &config,
            &mock,
            "create_stream",
            json!({
                "stream_name": "orders",
                "stream_mode_details": { "StreamMode": "PROVISIONED" },
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn update_shard_count_forwards_defaulted_scaling_type() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        dispatch(
            &config,
            &mock,
            "update_shard_count",
            json!({ "stream_name": "orders", "target_shard_count": 4 }),
        )
        .await
        .unwrap();
        let stored = mock.shard_count_args.lock().unwrap().clone().unwrap();
        assert_eq!(stored.scaling_type.as_deref(), Some("UNIFORM_SCALING"));

        let err = dispatch(
            &config,
            &mock,
            "update_shard_count",
            json!({
                "stream_name": "orders",
                "target_shard_count": 4,
                "scaling_type": "LINEAR",
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter(_)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn encryption_type_defaults_to_kms() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        dispatch(
            &config,
            &mock,
            "start_stream_encryption",
            json!({ "stream_name": "orders", "key_id": "alias/stream-key" }),
        )
        .await
        .unwrap();
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_as_such() {
        let mock = MockKinesis::default();
        let config = ServerConfig::default();
        let err = dispatch(&config, &mock, "drop_table", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[test]
    fn registry_is_well_formed() {
        verify_registry().unwrap();
        assert_eq!(TOOLS.len(), 27);
        for tool in TOOLS {
            assert!(!tool.description.is_empty(), "{}", tool.name);
            let schema = (tool.input_schema)();
            assert_eq!(schema["type"], "object", "{}", tool.name);
            let props = schema["properties"].as_object().unwrap();
            for required in schema["required"].as_array().unwrap() {
                let field = required.as_str().unwrap();
                assert!(
                    props.contains_key(field),
                    "{} requires undeclared field {field}",
                    tool.name
                );
            }
        }
    }

    #[test]
    fn description_redacts_payload_data() {
        let mut out = Vec::new();
        queue_description(
            "put_record",
            &json!({
                "stream_name": "orders",
                "data": "secret-payload",
                "partition_key": "host-1",
                "region_name": "eu-west-1",
            }),
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Put Record"));
        assert!(text.contains("Region: eu-west-1"));
        assert!(!text.contains("secret-payload"));
        assert!(text.contains("<14 bytes>"));
    }
}
