// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::codec::CompressionEncoding;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap};
use tonic::transport::Endpoint;
use tonic::Request;
use tracing::debug;

use span_stream_proto::v1::span_ingest_client::SpanIngestClient;

use crate::error::TransportError;
use crate::metadata::StreamMetadata;
use crate::response::{classify_status, ResponseOutcome};
use crate::transport::{
    CollectorTransport, ExportItem, ResponseStream, SpanStream, SubmissionMode,
};

/// Depth of the bridge channel between the writer task and the tonic
/// request stream. One slot keeps at most a single write in flight.
const SINK_DEPTH: usize = 1;

/// gRPC transport to the span collector. A fresh channel is established per
/// stream open so stale connection state never outlives a reconnect.
pub struct GrpcTransport {
    observer_url: String,
}

impl GrpcTransport {
    pub fn new(observer_url: impl Into<String>) -> GrpcTransport {
        GrpcTransport {
            observer_url: observer_url.into(),
        }
    }

    async fn connect(&self) -> Result<SpanIngestClient<tonic::transport::Channel>, TransportError> {
        let endpoint = Endpoint::from_shared(self.observer_url.clone())
            .map_err(|e| TransportError::Connection(format!("invalid observer url: {e}")))?;
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(SpanIngestClient::new(channel))
    }
}

fn apply_metadata(
    request_metadata: &mut MetadataMap,
    metadata: &StreamMetadata,
) -> Result<(), TransportError> {
    for (key, value) in metadata.iter() {
        let parsed_key = AsciiMetadataKey::from_bytes(key.as_bytes())
            .map_err(|_| TransportError::Metadata(format!("invalid metadata key: {key}")))?;
        let parsed_value: AsciiMetadataValue = value
            .parse()
            .map_err(|_| TransportError::Metadata(format!("invalid metadata value for {key}")))?;
        request_metadata.insert(parsed_key, parsed_value);
    }
    Ok(())
}

/// The streaming call itself can fail with the same statuses the response
/// stream carries; a permanent rejection here must not loop inside
/// reconnect backoff.
fn call_error(status: tonic::Status) -> TransportError {
    match classify_status(&status) {
        ResponseOutcome::PermanentReject => TransportError::Rejected(status),
        _ => TransportError::Connection(status.to_string()),
    }
}

#[async_trait]
impl CollectorTransport for GrpcTransport {
    async fn open_stream(
        &self,
        metadata: StreamMetadata,
        mode: SubmissionMode,
    ) -> Result<SpanStream, TransportError> {
        let mut client = self.connect().await?;
        // The negotiation header doubles as the switch for actually
        // compressing the stream.
        if metadata.get("grpc-accept-encoding").is_some() {
            client = client
                .send_compressed(CompressionEncoding::Gzip)
                .accept_compressed(CompressionEncoding::Gzip);
        }

        let (sink, rx) = mpsc::channel::<ExportItem>(SINK_DEPTH);
        let responses: ResponseStream = match mode {
            SubmissionMode::Single => {
                let outbound = ReceiverStream::new(rx)
                    .flat_map(|item| futures::stream::iter(item.into_spans()));
                let mut request = Request::new(outbound);
                apply_metadata(request.metadata_mut(), &metadata)?;
                let streaming = client
                    .record_span(request)
                    .await
                    .map_err(call_error)?
                    .into_inner();
                Box::pin(streaming)
            }
            SubmissionMode::Batched => {
                let outbound = ReceiverStream::new(rx).map(ExportItem::into_batch);
                let mut request = Request::new(outbound);
                apply_metadata(request.metadata_mut(), &metadata)?;
                let streaming = client
                    .record_span_batch(request)
                    .await
                    .map_err(call_error)?
                    .into_inner();
                Box::pin(streaming)
            }
        };
        debug!(
            "Opened span stream to {} in {:?} mode",
            self.observer_url, mode
        );
        Ok(SpanStream { sink, responses })
    }
}
