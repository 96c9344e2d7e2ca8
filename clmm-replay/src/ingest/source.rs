//! `EventSource`: the block-ingester / RPC-client collaborator kept outside
//! `clmm-core` on purpose. The core only ever sees decoded, block-ordered
//! `PoolEvent`s; this trait is the seam where a real indexer upstream would
//! plug in.

use async_trait::async_trait;
use clmm_core::events::PoolEvent;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::mpsc;

use crate::error::Result;

/// Pulls decoded events one at a time, already ordered by `(block_number,
/// log_index)`. `next_event` returning `Ok(None)` means the source is
/// exhausted; the ingest loop stops cleanly rather than erroring.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Result<Option<PoolEvent>>;
}

/// Reads newline-delimited JSON event records from any `AsyncRead` — a file
/// replay, a pipe, or a socket already producing ordered output. Malformed
/// lines are logged and skipped rather than propagated: a decoder upstream
/// is assumed to have already filtered garbage, but this source doesn't
/// trust that.
pub struct JsonLinesEventSource<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> JsonLinesEventSource<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesEventSource { lines: BufReader::new(reader).lines() }
    }
}

impl JsonLinesEventSource<tokio::fs::File> {
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = tokio::fs::File::open(path).await.map_err(|e| crate::error::ReplayError::Ingest(e.to_string()))?;
        Ok(Self::new(file))
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> EventSource for JsonLinesEventSource<R> {
    async fn next_event(&mut self) -> Result<Option<PoolEvent>> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| crate::error::ReplayError::Ingest(e.to_string()))?;
            let Some(line) = line else { return Ok(None) };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PoolEvent>(&line) {
                Ok(event) => return Ok(Some(event)),
                Err(err) => {
                    tracing::warn!(error = %err, line, "skipping unparseable event record");
                    continue;
                }
            }
        }
    }
}

/// Fed from an in-process channel — used by tests and by anything that
/// already has a decoded stream (e.g. an upstream indexer running in the
/// same process).
pub struct ChannelEventSource {
    receiver: mpsc::Receiver<PoolEvent>,
}

impl ChannelEventSource {
    pub fn new(receiver: mpsc::Receiver<PoolEvent>) -> Self {
        ChannelEventSource { receiver }
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn next_event(&mut self) -> Result<Option<PoolEvent>> {
        Ok(self.receiver.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clmm_core::events::InitializeEvent;
    use primitive_types::U256;

    #[tokio::test]
    async fn json_lines_source_skips_malformed_lines() {
        let payload = InitializeEvent {
            pool_address: "pool".into(),
            sqrt_price_x96: U256::from(1u128) << 96,
            block_number: 1,
            log_index: 0,
        };
        let mut line = serde_json::to_string(&PoolEvent::Initialize(payload)).unwrap();
        line.push('\n');
        let input = format!("not json\n{line}\n\n");

        let mut source = JsonLinesEventSource::new(std::io::Cursor::new(input));
        let event = source.next_event().await.unwrap().expect("one valid event");
        assert_eq!(event.pool_address(), "pool");
        assert!(source.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn channel_source_yields_sent_events_in_order() {
        let (tx, rx) = mpsc::channel(8);
        let mut source = ChannelEventSource::new(rx);
        let e1 = PoolEvent::Initialize(InitializeEvent {
            pool_address: "pool".into(),
            sqrt_price_x96: U256::from(1u128) << 96,
            block_number: 1,
            log_index: 0,
        });
        tx.send(e1).await.unwrap();
        drop(tx);

        let got = source.next_event().await.unwrap().expect("event");
        assert_eq!(got.block_number(), 1);
        assert!(source.next_event().await.unwrap().is_none());
    }
}
