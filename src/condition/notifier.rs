//! Change notification
//!
//! A criterion announces its configuration through an injected sink instead of
//! owning listeners itself.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Published once, when a criterion is constructed
pub const CRITERION_UPDATED: &str = "criterionUpdated";

/// Configuration of a criterion at the time of an event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionSnapshot {
    pub id: String,
    pub mode: String,
    pub operation: String,
    pub input: Vec<Value>,
    pub metadata: String,
    pub sources: Vec<String>,
    pub valid: bool,
}

/// `{id, data}` payload of every criterion event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionEvent {
    pub id: String,
    pub data: CriterionSnapshot,
}

pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: &str, payload: CriterionEvent);
}

/// Forwards events into a channel, dropping them once the receiver is gone
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(String, CriterionEvent)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, CriterionEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn publish(&self, event: &str, payload: CriterionEvent) {
        if self.tx.send((event.to_string(), payload)).is_err() {
            log::debug!("Dropped {} event: no receiver", event);
        }
    }
}

/// Writes events to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, event: &str, payload: CriterionEvent) {
        log::info!(
            "{} {}: {} {} on '{}' over {} source(s)",
            event,
            payload.id,
            payload.data.mode,
            payload.data.operation,
            payload.data.metadata,
            payload.data.sources.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> CriterionSnapshot {
        CriterionSnapshot {
            id: "c1".to_string(),
            mode: "any".to_string(),
            operation: "isDefined".to_string(),
            input: vec![],
            metadata: "value".to_string(),
            sources: vec!["a".to_string()],
            valid: true,
        }
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (sink, mut rx) = ChannelSink::new();
        sink.publish(
            CRITERION_UPDATED,
            CriterionEvent {
                id: "c1".to_string(),
                data: snapshot(),
            },
        );

        let (event, payload) = rx.recv().await.unwrap();
        assert_eq!(event, "criterionUpdated");
        assert_eq!(payload.id, "c1");
        assert_eq!(payload.data.sources, vec!["a"]);
    }

    #[test]
    fn test_channel_sink_without_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.publish(
            CRITERION_UPDATED,
            CriterionEvent {
                id: "c1".to_string(),
                data: snapshot(),
            },
        );
    }
}
