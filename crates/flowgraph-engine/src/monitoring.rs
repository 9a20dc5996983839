//! Monitoring Sink (C8): a fire-and-forget channel for incremental execution
//! snapshots, per §4.8.

use async_trait::async_trait;
use flowgraph_model::WorkflowExecution;
use tokio::sync::mpsc;
use tracing::warn;

#[async_trait]
pub trait MonitoringSink: Send + Sync {
    /// Pushes a snapshot to the observer identified by `session_id`. A
    /// missing `session_id` is a no-op; errors are logged and swallowed —
    /// this must never propagate into the scheduler's control flow.
    async fn send_update(&self, session_id: Option<&str>, execution: &WorkflowExecution);
}

/// The test default: observes nothing, drops every update.
pub struct NoOpMonitoringSink;

#[async_trait]
impl MonitoringSink for NoOpMonitoringSink {
    async fn send_update(&self, _session_id: Option<&str>, _execution: &WorkflowExecution) {}
}

/// Fans updates out over a bounded `tokio::sync::mpsc` channel, matching the
/// teacher's event-channel pattern in its execution engine. Send failures
/// (a full or closed channel) are logged and swallowed, never surfaced.
pub struct ChannelMonitoringSink {
    sender: mpsc::Sender<(String, WorkflowExecution)>,
}

impl ChannelMonitoringSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<(String, WorkflowExecution)>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl MonitoringSink for ChannelMonitoringSink {
    async fn send_update(&self, session_id: Option<&str>, execution: &WorkflowExecution) {
        let Some(session_id) = session_id else {
            return;
        };
        if let Err(err) = self.sender.try_send((session_id.to_string(), execution.clone())) {
            warn!(session_id, error = %err, "monitoring update dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgraph_model::{Visibility, WorkflowExecutionStatus};

    fn sample_execution() -> WorkflowExecution {
        let mut execution = WorkflowExecution::new("e1", "w1", "org-1", None, Visibility::Private);
        execution.status = WorkflowExecutionStatus::Executing;
        execution
    }

    #[tokio::test]
    async fn missing_session_id_is_a_no_op() {
        let (sink, mut receiver) = ChannelMonitoringSink::new(4);
        sink.send_update(None, &sample_execution()).await;
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn update_is_forwarded_to_channel() {
        let (sink, mut receiver) = ChannelMonitoringSink::new(4);
        sink.send_update(Some("session-1"), &sample_execution()).await;
        let (session_id, _) = receiver.recv().await.unwrap();
        assert_eq!(session_id, "session-1");
    }
}
