//! Confirmation channel trait and in-process implementations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};

use super::error::{HitlError, HitlResult};
use super::request::{ConfirmationDecision, ConfirmationRequest};

/// Where a participant with human confirmation sends its requests.
///
/// The orchestrator loop is suspended while `confirm` is pending; no other
/// participant acts in the meantime.
#[async_trait]
pub trait ConfirmationChannel: Send + Sync {
    async fn confirm(&self, request: ConfirmationRequest) -> HitlResult<ConfirmationDecision>;

    /// Channel name, for logs.
    fn name(&self) -> &str;
}

/// Approves everything without asking.
#[derive(Debug, Default)]
pub struct AutoApprove;

#[async_trait]
impl ConfirmationChannel for AutoApprove {
    async fn confirm(&self, _request: ConfirmationRequest) -> HitlResult<ConfirmationDecision> {
        Ok(ConfirmationDecision::Approve)
    }

    fn name(&self) -> &str {
        "auto_approve"
    }
}

/// Replays a fixed queue of decisions; errors once the queue is empty.
#[derive(Debug)]
pub struct ScriptedConfirmation {
    decisions: Mutex<VecDeque<ConfirmationDecision>>,
    requests_seen: AtomicUsize,
}

impl ScriptedConfirmation {
    pub fn new(decisions: impl IntoIterator<Item = ConfirmationDecision>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into_iter().collect()),
            requests_seen: AtomicUsize::new(0),
        }
    }

    /// How many requests have been received so far.
    pub fn requests_seen(&self) -> usize {
        self.requests_seen.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ConfirmationChannel for ScriptedConfirmation {
    async fn confirm(&self, request: ConfirmationRequest) -> HitlResult<ConfirmationDecision> {
        self.requests_seen.fetch_add(1, Ordering::Relaxed);
        self.decisions
            .lock()
            .await
            .pop_front()
            .ok_or(HitlError::Exhausted {
                participant: request.participant,
            })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A request waiting in a [`QueueConfirmation`] for an answer.
#[derive(Debug)]
pub struct PendingConfirmation {
    pub request: ConfirmationRequest,
    responder: oneshot::Sender<ConfirmationDecision>,
}

impl PendingConfirmation {
    /// Answer the request. Returns `false` if the requester stopped waiting.
    pub fn respond(self, decision: ConfirmationDecision) -> bool {
        self.responder.send(decision).is_ok()
    }
}

/// Forwards requests over a tokio channel to whoever holds the receiver
/// (a UI task, a remote operator bridge, a test).
#[derive(Debug, Clone)]
pub struct QueueConfirmation {
    tx: mpsc::Sender<PendingConfirmation>,
    timeout: Option<Duration>,
}

impl QueueConfirmation {
    /// Create the channel and the receiving end of its request queue.
    pub fn new(
        capacity: usize,
        timeout: Option<Duration>,
    ) -> (Self, mpsc::Receiver<PendingConfirmation>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, timeout }, rx)
    }
}

#[async_trait]
impl ConfirmationChannel for QueueConfirmation {
    async fn confirm(&self, request: ConfirmationRequest) -> HitlResult<ConfirmationDecision> {
        let (responder, answer) = oneshot::channel();
        self.tx
            .send(PendingConfirmation { request, responder })
            .await
            .map_err(|_| HitlError::ChannelClosed)?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, answer)
                .await
                .map_err(|_| HitlError::Expired {
                    timeout_secs: limit.as_secs(),
                })?
                .map_err(|_| HitlError::ChannelClosed),
            None => answer.await.map_err(|_| HitlError::ChannelClosed),
        }
    }

    fn name(&self) -> &str {
        "queue"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ConfirmationRequest {
        ConfirmationRequest::new("Runner", "continue?", vec![], None)
    }

    #[tokio::test]
    async fn test_auto_approve() {
        let ch = AutoApprove;
        assert_eq!(ch.confirm(request()).await.unwrap(), ConfirmationDecision::Approve);
        assert_eq!(ch.name(), "auto_approve");
    }

    #[tokio::test]
    async fn test_scripted_replays_in_order_then_exhausts() {
        let ch = ScriptedConfirmation::new(vec![
            ConfirmationDecision::Approve,
            ConfirmationDecision::Reply {
                text: "more tests".into(),
            },
        ]);
        assert_eq!(ch.confirm(request()).await.unwrap(), ConfirmationDecision::Approve);
        assert!(matches!(
            ch.confirm(request()).await.unwrap(),
            ConfirmationDecision::Reply { .. }
        ));
        let err = ch.confirm(request()).await.unwrap_err();
        assert!(matches!(err, HitlError::Exhausted { participant } if participant == "Runner"));
        assert_eq!(ch.requests_seen(), 3);
    }

    #[tokio::test]
    async fn test_queue_round_trip() {
        let (ch, mut rx) = QueueConfirmation::new(4, None);
        let operator = tokio::spawn(async move {
            let pending = rx.recv().await.unwrap();
            assert_eq!(pending.request.participant, "Runner");
            pending.respond(ConfirmationDecision::Reject {
                reason: "not yet".into(),
            })
        });

        let decision = ch.confirm(request()).await.unwrap();
        assert_eq!(
            decision,
            ConfirmationDecision::Reject {
                reason: "not yet".into()
            }
        );
        assert!(operator.await.unwrap());
    }

    #[tokio::test]
    async fn test_queue_closed_receiver() {
        let (ch, rx) = QueueConfirmation::new(1, None);
        drop(rx);
        assert!(matches!(
            ch.confirm(request()).await.unwrap_err(),
            HitlError::ChannelClosed
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_timeout_expires() {
        let (ch, _rx) = QueueConfirmation::new(1, Some(Duration::from_secs(5)));
        let err = ch.confirm(request()).await.unwrap_err();
        assert!(matches!(err, HitlError::Expired { timeout_secs: 5 }));
    }
}
