// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client side of the `/api/events` change feed.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::services::changes::{Change, PROFILE_EVENT, TASKS_EVENT};
use crate::sync::{Connectivity, HttpRemote, ProfileSync, RetryPolicy, SyncError, TaskSync};

/// Longest line, or joined `data` of one event, the decoder will buffer.
pub const MAX_EVENT_BYTES: usize = 1024 * 1024;

/// One dispatched Server-Sent Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` parser.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    data_len: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body and return every event it completes.
    ///
    /// Fails, and forgets any partial event, once a line or an event grows
    /// past [`MAX_EVENT_BYTES`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, SyncError> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => {
                    self.data_len += value.len() + 1;
                    self.data.push(value.to_string());
                }
                _ => {}
            }
        }

        if self.buf.len() > MAX_EVENT_BYTES || self.data_len > MAX_EVENT_BYTES {
            *self = Self::default();
            return Err(SyncError::Invalid(format!(
                "event stream entry exceeds {MAX_EVENT_BYTES} bytes"
            )));
        }
        Ok(events)
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        self.data_len = 0;
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

/// Decode a snapshot event. Unknown event names yield `None`.
pub fn decode_change(event: &SseEvent) -> Result<Option<Change>, serde_json::Error> {
    match event.event.as_str() {
        PROFILE_EVENT => Ok(Some(Change::Profile(serde_json::from_str(&event.data)?))),
        TASKS_EVENT => Ok(Some(Change::Tasks(serde_json::from_str(&event.data)?))),
        _ => Ok(None),
    }
}

/// Stream changes from the server until the connection ends.
pub async fn listen(
    remote: &HttpRemote,
    mut on_change: impl FnMut(Change),
) -> Result<(), SyncError> {
    let response = remote
        .http()
        .get(remote.url("/api/events"))
        .bearer_auth(remote.session_token())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?
        .error_for_status()?;

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = body.next().await {
        for event in decoder.push(&chunk?)? {
            match decode_change(&event) {
                Ok(Some(change)) => on_change(change),
                Ok(None) => tracing::debug!(event = %event.event, "Ignoring unknown event"),
                Err(e) => tracing::warn!(event = %event.event, error = %e, "Malformed change event"),
            }
        }
    }
    Ok(())
}

/// Keep a change feed open for the signed-in user, reconnecting with backoff,
/// and route snapshots into the task and profile synchronizers.
pub fn spawn_change_listener(
    remote: Arc<HttpRemote>,
    tasks: TaskSync,
    profile: Arc<ProfileSync>,
    connectivity: Connectivity,
    retry: RetryPolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut failures = 0;
        loop {
            let result = listen(&remote, |change| {
                connectivity.set_online(true);
                match change {
                    Change::Tasks(list) => {
                        if !tasks.apply_remote(list) {
                            tracing::debug!("Task snapshot skipped; local edits pending");
                        }
                    }
                    Change::Profile(view) => {
                        profile.apply_remote(view);
                    }
                }
            })
            .await;

            match result {
                Ok(()) => {
                    failures = 0;
                    tracing::info!("Change feed closed; reconnecting");
                }
                Err(e) => {
                    if e.is_offline() {
                        connectivity.set_online(false);
                    }
                    tracing::warn!(error = %e, failures, "Change feed error");
                    failures += 1;
                }
            }
            tokio::time::sleep(retry.backoff(failures)).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: tasks\nda").unwrap().is_empty());
        assert!(decoder.push(b"ta: {\"tasks\":[],").unwrap().is_empty());
        let events = decoder
            .push(b"\"updatedAt\":\"2024-01-01T00:00:00Z\"}\r\n\r\n")
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "tasks");
        let change = decode_change(&events[0]).unwrap().unwrap();
        assert!(matches!(change, Change::Tasks(list) if list.tasks.is_empty()));
    }

    #[test]
    fn test_decoder_skips_comments_and_joins_data() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b":keep-alive\n\ndata: a\ndata: b\n\n").unwrap();
        assert_eq!(
            events,
            vec![SseEvent {
                event: "message".to_string(),
                data: "a\nb".to_string(),
            }]
        );
        assert!(decode_change(&events[0]).unwrap().is_none());
    }

    #[test]
    fn test_decoder_rejects_unbounded_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: ").unwrap().is_empty());

        let chunk = vec![b'x'; 64 * 1024];
        let mut result = Ok(Vec::new());
        for _ in 0..(MAX_EVENT_BYTES / chunk.len() + 1) {
            result = decoder.push(&chunk);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(SyncError::Invalid(_))));

        // The decoder starts over after the overflow
        let events = decoder.push(b"event: tasks\ndata: {}\n\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{}");
    }

    #[test]
    fn test_decoder_rejects_oversized_event() {
        let mut decoder = SseDecoder::new();
        let line = format!("data: {}\n", "y".repeat(64 * 1024));
        let mut result = Ok(Vec::new());
        for _ in 0..(MAX_EVENT_BYTES / line.len() + 2) {
            result = decoder.push(line.as_bytes());
            if result.is_err() {
                break;
            }
        }
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_payload() {
        let event = SseEvent {
            event: PROFILE_EVENT.to_string(),
            data: "{}".to_string(),
        };
        assert!(decode_change(&event).is_err());
    }
}
