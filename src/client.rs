//! Remote client seam for AWS Kinesis Data Streams.
//!
//! [`KinesisApi`] has one method per supported operation so the dispatcher
//! can be exercised against a recording mock in tests. [`KinesisSdkClient`]
//! is the real implementation: it resolves the region, builds an SDK client
//! per call (credentials come from the standard chain), invokes the
//! operation, classifies failures, and flattens the response into the
//! tool's declared output shape.

use async_trait::async_trait;
use aws_config::{AppName, BehaviorVersion, Region};
use aws_sdk_kinesis::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_kinesis::primitives::{Blob, DateTime};
use aws_sdk_kinesis::types::{
    Consumer, EncryptionType, EnhancedMetrics, MetricsName, PutRecordsRequestEntry,
    PutRecordsResultEntry, Record, ScalingType, Shard, ShardIteratorType, StreamMode,
    StreamModeDetails, StreamSummary,
};
use aws_sdk_kinesis::Client;
use serde_json::{json, Value};

use crate::codec;
use crate::config::{ServerConfig, DEFAULT_REGION};
use crate::error::{RemoteErrorKind, ToolError, ToolResult};
use crate::tools::{
    AddTagsArgs, ConsumerIdentityArgs, CreateStreamArgs, DeleteStreamArgs, DescribeStreamArgs,
    DescribeStreamSummaryArgs, EncryptionArgs, GetRecordsArgs, GetShardIteratorArgs,
    ListConsumersArgs, ListShardsArgs, ListStreamsArgs, ListTagsArgs, MergeShardsArgs,
    MonitoringArgs, PutRecordArgs, PutRecordsArgs, RegisterConsumerArgs, RemoveTagsArgs,
    RetentionArgs, SplitShardArgs, UpdateShardCountArgs, UpdateStreamModeArgs,
};

/// Application name reported to the service for request attribution.
const APP_NAME: &str = "kinesis-mcp-server";

/// A record after payload encoding, ready to forward.
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    pub data: Vec<u8>,
    pub partition_key: String,
    pub explicit_hash_key: Option<String>,
}

/// One method per tool operation. Implementations receive already-validated
/// arguments; record payloads arrive pre-encoded.
#[async_trait]
pub trait KinesisApi: Send + Sync {
    async fn create_stream(&self, args: CreateStreamArgs) -> ToolResult<Value>;
    async fn delete_stream(&self, args: DeleteStreamArgs) -> ToolResult<Value>;
    async fn describe_stream(&self, args: DescribeStreamArgs) -> ToolResult<Value>;
    async fn describe_stream_summary(&self, args: DescribeStreamSummaryArgs) -> ToolResult<Value>;
    async fn list_streams(&self, args: ListStreamsArgs) -> ToolResult<Value>;
    async fn list_shards(&self, args: ListShardsArgs) -> ToolResult<Value>;
    async fn update_shard_count(&self, args: UpdateShardCountArgs) -> ToolResult<Value>;
    async fn update_stream_mode(&self, args: UpdateStreamModeArgs) -> ToolResult<Value>;
    async fn merge_shards(&self, args: MergeShardsArgs) -> ToolResult<Value>;
    async fn split_shard(&self, args: SplitShardArgs) -> ToolResult<Value>;
    async fn put_record(&self, args: PutRecordArgs, data: Vec<u8>) -> ToolResult<Value>;
    async fn put_records(&self, args: PutRecordsArgs, records: Vec<EncodedRecord>)
        -> ToolResult<Value>;
    async fn get_shard_iterator(&self, args: GetShardIteratorArgs) -> ToolResult<Value>;
    async fn get_records(&self, args: GetRecordsArgs) -> ToolResult<Value>;
    async fn enable_enhanced_monitoring(&self, args: MonitoringArgs) -> ToolResult<Value>;
    async fn disable_enhanced_monitoring(&self, args: MonitoringArgs) -> ToolResult<Value>;
    async fn start_stream_encryption(&self, args: EncryptionArgs) -> ToolResult<Value>;
    async fn stop_stream_encryption(&self, args: EncryptionArgs) -> ToolResult<Value>;
    async fn add_tags_to_stream(&self, args: AddTagsArgs) -> ToolResult<Value>;
    async fn remove_tags_from_stream(&self, args: RemoveTagsArgs) -> ToolResult<Value>;
    async fn list_tags_for_stream(&self, args: ListTagsArgs) -> ToolResult<Value>;
    async fn increase_stream_retention_period(&self, args: RetentionArgs) -> ToolResult<Value>;
    async fn decrease_stream_retention_period(&self, args: RetentionArgs) -> ToolResult<Value>;
    async fn register_stream_consumer(&self, args: RegisterConsumerArgs) -> ToolResult<Value>;
    async fn deregister_stream_consumer(&self, args: ConsumerIdentityArgs) -> ToolResult<Value>;
    async fn describe_stream_consumer(&self, args: ConsumerIdentityArgs) -> ToolResult<Value>;
    async fn list_stream_consumers(&self, args: ListConsumersArgs) -> ToolResult<Value>;
}

/// Region precedence: explicit tool parameter, then the environment
/// selector captured in the config, then the fixed default.
pub fn resolve_region(explicit: Option<&str>, config: &ServerConfig) -> String {
    explicit
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .or_else(|| config.region.clone())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

/// Real SDK-backed client.
pub struct KinesisSdkClient {
    config: ServerConfig,
}

impl KinesisSdkClient {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Builds a fresh client for the resolved region so credential changes
    /// are picked up per call.
    async fn client(&self, region_name: Option<&str>) -> Client {
        let region = resolve_region(region_name, &self.config);
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
        if let Ok(app_name) = AppName::new(APP_NAME) {
            loader = loader.app_name(app_name);
        }
        Client::new(&loader.load().await)
    }
}

fn remote_internal(operation: &'static str, message: impl Into<String>) -> ToolError {
    ToolError::Remote {
        operation,
        kind: RemoteErrorKind::Internal,
        code: None,
        message: message.into(),
    }
}

/// Maps a provider error code to its retry-relevant kind.
fn classify_code(code: &str) -> RemoteErrorKind {
    match code {
        "ProvisionedThroughputExceededException" | "ThrottlingException"
        | "KMSThrottlingException" => RemoteErrorKind::Throttling,
        "ResourceNotFoundException" | "KMSNotFoundException" => RemoteErrorKind::ResourceNotFound,
        "ResourceInUseException" => RemoteErrorKind::ResourceInUse,
        "LimitExceededException" => RemoteErrorKind::LimitExceeded,
        "AccessDeniedException" | "KMSAccessDeniedException" | "KMSDisabledException" => {
            RemoteErrorKind::AccessDenied
        }
        "ValidationException" | "InvalidArgumentException" | "KMSInvalidStateException" => {
            RemoteErrorKind::Validation
        }
        "ExpiredIteratorException" | "ExpiredNextTokenException" => RemoteErrorKind::ExpiredIterator,
        _ => RemoteErrorKind::Internal,
    }
}

/// Classifies an SDK failure, preserving the provider error code. Every
/// `SdkError` variant is handled; service errors dispatch on their code.
fn classify_sdk_error<E>(operation: &'static str, err: SdkError<E>) -> ToolError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.err();
            let code = service_err.code().map(str::to_string);
            let message = service_err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| service_err.to_string());
            let kind = code
                .as_deref()
                .map(classify_code)
                .unwrap_or(RemoteErrorKind::Internal);
            ToolError::Remote {
                operation,
                kind,
                code,
                message,
            }
        }
        SdkError::TimeoutError(_) => ToolError::Remote {
            operation,
            kind: RemoteErrorKind::Timeout,
            code: None,
            message: "request timed out".to_string(),
        },
        SdkError::DispatchFailure(e) => ToolError::Remote {
            operation,
            kind: RemoteErrorKind::Connection,
            code: None,
            message: format!("dispatch failure: {e:?}"),
        },
        other => ToolError::Remote {
            operation,
            kind: RemoteErrorKind::Internal,
            code: None,
            message: format!("{other:?}"),
        },
    }
}

fn stream_mode_details(mode: &str) -> ToolResult<StreamModeDetails> {
    let mode = match mode {
        "PROVISIONED" => StreamMode::Provisioned,
        "ON_DEMAND" => StreamMode::OnDemand,
        other => {
            return Err(ToolError::InvalidParameter(format!(
                "stream mode must be PROVISIONED or ON_DEMAND, got '{other}'"
            )))
        }
    };
    StreamModeDetails::builder()
        .stream_mode(mode)
        .build()
        .map_err(|e| ToolError::InvalidParameter(format!("stream mode details: {e}")))
}

fn mode_json(details: Option<&StreamModeDetails>) -> Value {
    match details {
        Some(d) => json!({ "StreamMode": d.stream_mode().as_str() }),
        None => Value::Null,
    }
}

fn metrics_json(metrics: &EnhancedMetrics) -> Value {
    json!({
        "ShardLevelMetrics": metrics
            .shard_level_metrics()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>(),
    })
}

fn shard_json(shard: &Shard) -> Value {
    json!({
        "ShardId": shard.shard_id(),
        "ParentShardId": shard.parent_shard_id(),
        "AdjacentParentShardId": shard.adjacent_parent_shard_id(),
        "HashKeyRange": shard.hash_key_range().map(|r| json!({
            "StartingHashKey": r.starting_hash_key(),
            "EndingHashKey": r.ending_hash_key(),
        })),
        "SequenceNumberRange": shard.sequence_number_range().map(|r| json!({
            "StartingSequenceNumber": r.starting_sequence_number(),
            "EndingSequenceNumber": r.ending_sequence_number(),
        })),
    })
}

fn stream_summary_json(summary: &StreamSummary) -> Value {
    json!({
        "StreamName": summary.stream_name(),
        "StreamARN": summary.stream_arn(),
        "StreamStatus": summary.stream_status().as_str(),
        "StreamModeDetails": mode_json(summary.stream_mode_details()),
        "StreamCreationTimestamp": summary
            .stream_creation_timestamp()
            .map(DateTime::as_secs_f64),
    })
}

fn consumer_json(consumer: &Consumer) -> Value {
    json!({
        "ConsumerName": consumer.consumer_name(),
        "ConsumerARN": consumer.consumer_arn(),
        "ConsumerStatus": consumer.consumer_status().as_str(),
        "ConsumerCreationTimestamp": consumer.consumer_creation_timestamp().as_secs_f64(),
    })
}

/// Per-record outcomes stay itemized and in submission order; a throttled
/// entry inside an accepted batch shows up here, not as a call failure.
fn batch_result_json(failed_record_count: Option<i32>, entries: &[PutRecordsResultEntry]) -> Value {
    let results: Vec<Value> = entries
        .iter()
        .map(|r| {
            json!({
                "SequenceNumber": r.sequence_number(),
                "ShardId": r.shard_id(),
                "ErrorCode": r.error_code(),
                "ErrorMessage": r.error_message(),
            })
        })
        .collect();
    json!({
        "FailedRecordCount": failed_record_count.unwrap_or(0),
        "Records": results,
    })
}

fn record_json(record: &Record) -> Value {
    let (field, value) = codec::decoded_field(record.data().as_ref());
    let mut rec = json!({
        "SequenceNumber": record.sequence_number(),
        "PartitionKey": record.partition_key(),
        "ApproximateArrivalTimestamp": record
            .approximate_arrival_timestamp()
            .map(DateTime::as_secs_f64),
        "EncryptionType": record.encryption_type().map(|e| e.as_str()),
    });
    rec[field] = Value::from(value);
    rec
}

#[async_trait]
impl KinesisApi for KinesisSdkClient {
    async fn create_stream(&self, args: CreateStreamArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let mode = args
            .stream_mode_details
            .as_ref()
            .map(|d| stream_mode_details(&d.stream_mode))
            .transpose()?;
        client
            .create_stream()
            .stream_name(&args.stream_name)
            .set_shard_count(args.shard_count)
            .set_stream_mode_details(mode)
            .send()
            .await
            .map_err(|e| classify_sdk_error("create_stream", e))?;
        Ok(json!({ "StreamName": args.stream_name, "Status": "CREATING" }))
    }

    async fn delete_stream(&self, args: DeleteStreamArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .delete_stream()
            .stream_name(&args.stream_name)
            .set_enforce_consumer_deletion(args.enforce_consumer_deletion)
            .send()
            .await
            .map_err(|e| classify_sdk_error("delete_stream", e))?;
        Ok(json!({ "StreamName": args.stream_name, "Status": "DELETING" }))
    }

    async fn describe_stream(&self, args: DescribeStreamArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .describe_stream()
            .stream_name(&args.stream_name)
            .set_limit(args.limit)
            .set_exclusive_start_shard_id(args.exclusive_start_shard_id)
            .set_stream_arn(args.stream_arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error("describe_stream", e))?;
        let desc = resp
            .stream_description()
            .ok_or_else(|| remote_internal("describe_stream", "response missing StreamDescription"))?;
        Ok(json!({
            "StreamName": desc.stream_name(),
            "StreamARN": desc.stream_arn(),
            "StreamStatus": desc.stream_status().as_str(),
            "StreamModeDetails": mode_json(desc.stream_mode_details()),
            "RetentionPeriodHours": desc.retention_period_hours(),
            "StreamCreationTimestamp": desc.stream_creation_timestamp().as_secs_f64(),
            "HasMoreShards": desc.has_more_shards(),
            "EncryptionType": desc.encryption_type().map(|e| e.as_str()),
            "KeyId": desc.key_id(),
            "EnhancedMonitoring": desc.enhanced_monitoring().iter().map(metrics_json).collect::<Vec<_>>(),
            "Shards": desc.shards().iter().map(shard_json).collect::<Vec<_>>(),
        }))
    }

    async fn describe_stream_summary(&self, args: DescribeStreamSummaryArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .describe_stream_summary()
            .stream_name(&args.stream_name)
            .set_stream_arn(args.stream_arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error("describe_stream_summary", e))?;
        let summary = resp.stream_description_summary().ok_or_else(|| {
            remote_internal(
                "describe_stream_summary",
                "response missing StreamDescriptionSummary",
            )
        })?;
        Ok(json!({
            "StreamName": summary.stream_name(),
            "StreamARN": summary.stream_arn(),
            "StreamStatus": summary.stream_status().as_str(),
            "StreamModeDetails": mode_json(summary.stream_mode_details()),
            "RetentionPeriodHours": summary.retention_period_hours(),
            "StreamCreationTimestamp": summary.stream_creation_timestamp().as_secs_f64(),
            "EncryptionType": summary.encryption_type().map(|e| e.as_str()),
            "KeyId": summary.key_id(),
            "OpenShardCount": summary.open_shard_count(),
            "ConsumerCount": summary.consumer_count(),
            "EnhancedMonitoring": summary.enhanced_monitoring().iter().map(metrics_json).collect::<Vec<_>>(),
        }))
    }

    async fn list_streams(&self, args: ListStreamsArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .list_streams()
            .set_limit(args.limit)
            .set_exclusive_start_stream_name(args.exclusive_start_stream_name)
            .set_next_token(args.next_token)
            .send()
            .await
            .map_err(|e| classify_sdk_error("list_streams", e))?;
        Ok(json!({
            "StreamNames": resp.stream_names(),
            "HasMoreStreams": resp.has_more_streams(),
            "NextToken": resp.next_token(),
            "StreamSummaries": resp.stream_summaries().iter().map(stream_summary_json).collect::<Vec<_>>(),
        }))
    }

    async fn list_shards(&self, args: ListShardsArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .list_shards()
            .set_stream_name(args.stream_name)
            .set_next_token(args.next_token)
            .set_exclusive_start_shard_id(args.exclusive_start_shard_id)
            .set_max_results(args.max_results)
            .set_stream_creation_timestamp(args.stream_creation_timestamp.map(DateTime::from_secs_f64))
            .set_stream_arn(args.stream_arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error("list_shards", e))?;
        Ok(json!({
            "Shards": resp.shards().iter().map(shard_json).collect::<Vec<_>>(),
            "NextToken": resp.next_token(),
        }))
    }

    async fn update_shard_count(&self, args: UpdateShardCountArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .update_shard_count()
            .stream_name(&args.stream_name)
            .target_shard_count(args.target_shard_count)
            .scaling_type(ScalingType::from(
                args.scaling_type.as_deref().unwrap_or("UNIFORM_SCALING"),
            ))
            .send()
            .await
            .map_err(|e| classify_sdk_error("update_shard_count", e))?;
        Ok(json!({
            "StreamName": resp.stream_name(),
            "CurrentShardCount": resp.current_shard_count(),
            "TargetShardCount": resp.target_shard_count(),
        }))
    }

    async fn update_stream_mode(&self, args: UpdateStreamModeArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let details = stream_mode_details(&args.stream_mode_details.stream_mode)?;
        client
            .update_stream_mode()
            .stream_arn(&args.stream_arn)
            .stream_mode_details(details)
            .send()
            .await
            .map_err(|e| classify_sdk_error("update_stream_mode", e))?;
        Ok(json!({
            "StreamARN": args.stream_arn,
            "StreamModeDetails": { "StreamMode": args.stream_mode_details.stream_mode },
        }))
    }

    async fn merge_shards(&self, args: MergeShardsArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .merge_shards()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .shard_to_merge(&args.shard_to_merge)
            .adjacent_shard_to_merge(&args.adjacent_shard_to_merge)
            .send()
            .await
            .map_err(|e| classify_sdk_error("merge_shards", e))?;
        Ok(json!({ "Status": "Merge initiated" }))
    }

    async fn split_shard(&self, args: SplitShardArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .split_shard()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .shard_to_split(&args.shard_to_split)
            .new_starting_hash_key(&args.new_starting_hash_key)
            .send()
            .await
            .map_err(|e| classify_sdk_error("split_shard", e))?;
        Ok(json!({ "Status": "Split initiated" }))
    }

    async fn put_record(&self, args: PutRecordArgs, data: Vec<u8>) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .put_record()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .data(Blob::new(data))
            .partition_key(&args.partition_key)
            .set_explicit_hash_key(args.explicit_hash_key)
            .set_sequence_number_for_ordering(args.sequence_number_for_ordering)
            .send()
            .await
            .map_err(|e| classify_sdk_error("put_record", e))?;
        Ok(json!({
            "ShardId": resp.shard_id(),
            "SequenceNumber": resp.sequence_number(),
            "EncryptionType": resp.encryption_type().map(|e| e.as_str()),
        }))
    }

    async fn put_records(
        &self,
        args: PutRecordsArgs,
        records: Vec<EncodedRecord>,
    ) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let entry = PutRecordsRequestEntry::builder()
                .data(Blob::new(record.data))
                .partition_key(record.partition_key)
                .set_explicit_hash_key(record.explicit_hash_key)
                .build()
                .map_err(|e| ToolError::InvalidParameter(format!("record entry: {e}")))?;
            entries.push(entry);
        }
        let resp = client
            .put_records()
            .set_records(Some(entries))
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error("put_records", e))?;
        let mut result = batch_result_json(resp.failed_record_count(), resp.records());
        result["EncryptionType"] = json!(resp.encryption_type().map(|e| e.as_str()));
        Ok(result)
    }

    async fn get_shard_iterator(&self, args: GetShardIteratorArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .get_shard_iterator()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .shard_id(&args.shard_id)
            .shard_iterator_type(ShardIteratorType::from(args.shard_iterator_type.as_str()))
            .set_starting_sequence_number(args.starting_sequence_number)
            .set_timestamp(args.timestamp.map(DateTime::from_secs_f64))
            .send()
            .await
            .map_err(|e| classify_sdk_error("get_shard_iterator", e))?;
        Ok(json!({ "ShardIterator": resp.shard_iterator() }))
    }

    async fn get_records(&self, args: GetRecordsArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .get_records()
            .shard_iterator(&args.shard_iterator)
            .set_limit(args.limit)
            .set_stream_arn(args.stream_arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error("get_records", e))?;
        let records: Vec<Value> = resp.records().iter().map(record_json).collect();
        Ok(json!({
            "Records": records,
            "NextShardIterator": resp.next_shard_iterator(),
            "MillisBehindLatest": resp.millis_behind_latest(),
        }))
    }

    async fn enable_enhanced_monitoring(&self, args: MonitoringArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let metrics: Vec<MetricsName> = args
            .shard_level_metrics
            .iter()
            .map(|m| MetricsName::from(m.as_str()))
            .collect();
        let resp = client
            .enable_enhanced_monitoring()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .set_shard_level_metrics(Some(metrics))
            .send()
            .await
            .map_err(|e| classify_sdk_error("enable_enhanced_monitoring", e))?;
        Ok(json!({
            "StreamName": resp.stream_name(),
            "CurrentShardLevelMetrics": resp.current_shard_level_metrics().iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "DesiredShardLevelMetrics": resp.desired_shard_level_metrics().iter().map(|m| m.as_str()).collect::<Vec<_>>(),
        }))
    }

    async fn disable_enhanced_monitoring(&self, args: MonitoringArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let metrics: Vec<MetricsName> = args
            .shard_level_metrics
            .iter()
            .map(|m| MetricsName::from(m.as_str()))
            .collect();
        let resp = client
            .disable_enhanced_monitoring()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .set_shard_level_metrics(Some(metrics))
            .send()
            .await
            .map_err(|e| classify_sdk_error("disable_enhanced_monitoring", e))?;
        Ok(json!({
            "StreamName": resp.stream_name(),
            "CurrentShardLevelMetrics": resp.current_shard_level_metrics().iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "DesiredShardLevelMetrics": resp.desired_shard_level_metrics().iter().map(|m| m.as_str()).collect::<Vec<_>>(),
        }))
    }

    async fn start_stream_encryption(&self, args: EncryptionArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .start_stream_encryption()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .encryption_type(EncryptionType::Kms)
            .key_id(&args.key_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error("start_stream_encryption", e))?;
        Ok(json!({ "Status": "Encryption started" }))
    }

    async fn stop_stream_encryption(&self, args: EncryptionArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .stop_stream_encryption()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .encryption_type(EncryptionType::Kms)
            .key_id(&args.key_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error("stop_stream_encryption", e))?;
        Ok(json!({ "Status": "Encryption stopped" }))
    }

    async fn add_tags_to_stream(&self, args: AddTagsArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .add_tags_to_stream()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .set_tags(Some(args.tags.into_iter().collect()))
            .send()
            .await
            .map_err(|e| classify_sdk_error("add_tags_to_stream", e))?;
        Ok(json!({ "Status": "Tags added successfully" }))
    }

    async fn remove_tags_from_stream(&self, args: RemoveTagsArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .remove_tags_from_stream()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .set_tag_keys(Some(args.tag_keys))
            .send()
            .await
            .map_err(|e| classify_sdk_error("remove_tags_from_stream", e))?;
        Ok(json!({ "Status": "Tags removed successfully" }))
    }

    async fn list_tags_for_stream(&self, args: ListTagsArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .list_tags_for_stream()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .set_exclusive_start_tag_key(args.exclusive_start_tag_key)
            .set_limit(args.limit)
            .send()
            .await
            .map_err(|e| classify_sdk_error("list_tags_for_stream", e))?;
        let tags: Vec<Value> = resp
            .tags()
            .iter()
            .map(|t| json!({ "Key": t.key(), "Value": t.value() }))
            .collect();
        Ok(json!({ "Tags": tags, "HasMoreTags": resp.has_more_tags() }))
    }

    async fn increase_stream_retention_period(&self, args: RetentionArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .increase_stream_retention_period()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .retention_period_hours(args.retention_period_hours)
            .send()
            .await
            .map_err(|e| classify_sdk_error("increase_stream_retention_period", e))?;
        Ok(json!({ "Status": "Retention period increased" }))
    }

    async fn decrease_stream_retention_period(&self, args: RetentionArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .decrease_stream_retention_period()
            .set_stream_name(args.stream_name)
            .set_stream_arn(args.stream_arn)
            .retention_period_hours(args.retention_period_hours)
            .send()
            .await
            .map_err(|e| classify_sdk_error("decrease_stream_retention_period", e))?;
        Ok(json!({ "Status": "Retention period decreased" }))
    }

    async fn register_stream_consumer(&self, args: RegisterConsumerArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .register_stream_consumer()
            .stream_arn(&args.stream_arn)
            .consumer_name(&args.consumer_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error("register_stream_consumer", e))?;
        let consumer = resp
            .consumer()
            .ok_or_else(|| remote_internal("register_stream_consumer", "response missing Consumer"))?;
        Ok(consumer_json(consumer))
    }

    async fn deregister_stream_consumer(&self, args: ConsumerIdentityArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        client
            .deregister_stream_consumer()
            .set_stream_arn(args.stream_arn)
            .set_consumer_name(args.consumer_name)
            .set_consumer_arn(args.consumer_arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error("deregister_stream_consumer", e))?;
        Ok(json!({ "Status": "Consumer deregistered" }))
    }

    async fn describe_stream_consumer(&self, args: ConsumerIdentityArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .describe_stream_consumer()
            .set_stream_arn(args.stream_arn)
            .set_consumer_name(args.consumer_name)
            .set_consumer_arn(args.consumer_arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error("describe_stream_consumer", e))?;
        let desc = resp.consumer_description().ok_or_else(|| {
            remote_internal("describe_stream_consumer", "response missing ConsumerDescription")
        })?;
        Ok(json!({
            "ConsumerName": desc.consumer_name(),
            "ConsumerARN": desc.consumer_arn(),
            "ConsumerStatus": desc.consumer_status().as_str(),
            "ConsumerCreationTimestamp": desc.consumer_creation_timestamp().as_secs_f64(),
            "StreamARN": desc.stream_arn(),
        }))
    }

    async fn list_stream_consumers(&self, args: ListConsumersArgs) -> ToolResult<Value> {
        let client = self.client(args.region_name.as_deref()).await;
        let resp = client
            .list_stream_consumers()
            .stream_arn(&args.stream_arn)
            .set_next_token(args.next_token)
            .set_max_results(args.max_results)
            .set_stream_creation_timestamp(args.stream_creation_timestamp.map(DateTime::from_secs_f64))
            .send()
            .await
            .map_err(|e| classify_sdk_error("list_stream_consumers", e))?;
        Ok(json!({
            "Consumers": resp.consumers().iter().map(consumer_json).collect::<Vec<_>>(),
            "NextToken": resp.next_token(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_precedence() {
        let config = ServerConfig {
            read_only: false,
            region: Some("eu-west-1".to_string()),
        };
        assert_eq!(resolve_region(Some("ap-south-1"), &config), "ap-south-1");
        assert_eq!(resolve_region(None, &config), "eu-west-1");
        assert_eq!(resolve_region(Some(""), &config), "eu-west-1");

        let bare = ServerConfig::default();
        assert_eq!(resolve_region(None, &bare), DEFAULT_REGION);
    }

    #[test]
    fn provider_codes_classify_distinctly() {
        assert_eq!(
            classify_code("ProvisionedThroughputExceededException"),
            RemoteErrorKind::Throttling
        );
        assert_eq!(
            classify_code("ResourceNotFoundException"),
            RemoteErrorKind::ResourceNotFound
        );
        assert_eq!(classify_code("LimitExceededException"), RemoteErrorKind::LimitExceeded);
        assert_eq!(classify_code("AccessDeniedException"), RemoteErrorKind::AccessDenied);
        assert_eq!(classify_code("InvalidArgumentException"), RemoteErrorKind::Validation);
        assert_eq!(
            classify_code("ExpiredIteratorException"),
            RemoteErrorKind::ExpiredIterator
        );
        assert_eq!(classify_code("SomethingNew"), RemoteErrorKind::Internal);
    }

    #[test]
    fn stream_mode_details_rejects_unknown_modes() {
        assert!(stream_mode_details("PROVISIONED").is_ok());
        assert!(stream_mode_details("ON_DEMAND").is_ok());
        assert!(stream_mode_details("SERVERLESS").is_err());
    }

    #[test]
    fn batch_normalization_keeps_per_record_failures_in_order() {
        let entries = vec![
            PutRecordsResultEntry::builder()
                .sequence_number("49590338271490256608559692538361571095921575989136588898")
                .shard_id("shardId-000000000001")
                .build(),
            PutRecordsResultEntry::builder()
                .error_code("ProvisionedThroughputExceededException")
                .error_message("Rate exceeded for shard shardId-000000000001")
                .build(),
            PutRecordsResultEntry::builder()
                .sequence_number("49590338271490256608559692538361571095921575989136588899")
                .shard_id("shardId-000000000002")
                .build(),
        ];
        let result = batch_result_json(Some(1), &entries);
        assert_eq!(result["FailedRecordCount"], 1);
        let records = result["Records"].as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0]["SequenceNumber"],
            "49590338271490256608559692538361571095921575989136588898"
        );
        assert!(records[0]["ErrorCode"].is_null());
        assert_eq!(records[1]["ErrorCode"], "ProvisionedThroughputExceededException");
        assert_eq!(
            records[1]["ErrorMessage"],
            "Rate exceeded for shard shardId-000000000001"
        );
        assert!(records[1]["SequenceNumber"].is_null());
        assert_eq!(records[2]["ShardId"], "shardId-000000000002");
    }

    #[test]
    fn batch_normalization_defaults_missing_failure_count() {
        let result = batch_result_json(None, &[]);
        assert_eq!(result["FailedRecordCount"], 0);
        assert_eq!(result["Records"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn read_records_annotate_text_and_binary_payloads() {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine as _;

        let text = Record::builder()
            .sequence_number("101")
            .partition_key("host-1")
            .data(Blob::new("CPU:10%".as_bytes()))
            .build()
            .unwrap();
        let rendered = record_json(&text);
        assert_eq!(rendered["DataString"], "CPU:10%");
        assert_eq!(rendered["PartitionKey"], "host-1");
        assert!(rendered.get("DataBase64").is_none());

        let raw = vec![0u8, 159, 146, 150];
        let binary = Record::builder()
            .sequence_number("102")
            .partition_key("host-2")
            .data(Blob::new(raw.clone()))
            .build()
            .unwrap();
        let rendered = record_json(&binary);
        assert!(rendered.get("DataString").is_none());
        let encoded = rendered["DataBase64"].as_str().unwrap();
        assert_eq!(BASE64.decode(encoded).unwrap(), raw);
    }
}
