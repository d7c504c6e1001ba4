use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::rate_limit::RateLimiter;
use crate::http::client::Transport;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;

use super::generate::AttackPlan;

/// Attack position snapshot emitted after every dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

/// Shared cancellation flag; flipping it stops the run before the next
/// dispatch, never mid-request.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One request/response pair from an attack run. Transport failures keep
/// the request in the history with no response attached.
#[derive(Debug)]
pub struct AttackRecord {
    pub request: HttpRequest,
    pub response: Option<HttpResponse>,
}

/// Replays an [`AttackPlan`] through a transport with a fixed inter-request
/// delay, optional progress reporting, and cooperative cancellation.
pub struct Intruder<T: Transport> {
    transport: T,
    limiter: RateLimiter,
}

impl<T: Transport> Intruder<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            limiter: RateLimiter::from_interval(Duration::ZERO),
        }
    }

    /// Minimum pause between consecutive dispatches. The pause never applies
    /// before the first request.
    pub fn set_request_interval(&mut self, interval: Duration) {
        self.limiter = RateLimiter::from_interval(interval);
    }

    pub async fn run(
        &self,
        plan: &AttackPlan,
        progress: Option<mpsc::UnboundedSender<Progress>>,
        cancel: &CancelHandle,
    ) -> Result<Vec<AttackRecord>> {
        let total = plan.request_count();
        info!(
            attack = plan.attack_type().name(),
            requests = total,
            "starting attack"
        );

        let mut records = Vec::new();
        for (completed, item) in plan.generate().enumerate() {
            if cancel.is_cancelled() {
                info!(completed, total, "attack cancelled");
                break;
            }
            self.limiter.wait().await;

            let request = item?.to_request()?;
            let record = match self.transport.send(request.clone()).await {
                Ok(response) => AttackRecord {
                    request,
                    response: Some(response),
                },
                Err(err) => {
                    debug!(error = %err, "request failed during attack");
                    AttackRecord {
                        request,
                        response: None,
                    }
                }
            };
            records.push(record);

            if let Some(tx) = &progress {
                // a dropped receiver just means nobody is watching
                let _ = tx.send(Progress {
                    completed: completed + 1,
                    total,
                });
            }
        }

        info!(sent = records.len(), total, "attack finished");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{html_response, MockTransport};
    use crate::intruder::template::{InsertionPoint, PointKind, RequestTemplate};
    use crate::intruder::AttackType;

    fn plan() -> AttackPlan {
        let base = RequestTemplate::new("GET", "http://example.com/?id=1", "", "");
        let points = vec![InsertionPoint::new(PointKind::UrlParameter, "id", 23, 24)];
        let payloads = vec![vec!["1".into(), "2".into(), "3".into()]];
        AttackPlan::new(base, AttackType::Sniper, points, payloads).unwrap()
    }

    #[tokio::test]
    async fn run_dispatches_every_generated_request() {
        let transport = MockTransport::new(|_| html_response("ok"));
        let intruder = Intruder::new(transport);
        let records = intruder
            .run(&plan(), None, &CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].request.url.query(), Some("id=2"));
        assert!(records.iter().all(|r| r.response.is_some()));
    }

    #[tokio::test]
    async fn progress_events_track_completed_count() {
        let transport = MockTransport::new(|_| html_response("ok"));
        let intruder = Intruder::new(transport);
        let (tx, mut rx) = mpsc::unbounded_channel();
        intruder
            .run(&plan(), Some(tx), &CancelHandle::new())
            .await
            .unwrap();
        let mut seen = Vec::new();
        while let Ok(p) = rx.try_recv() {
            seen.push(p);
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], Progress { completed: 1, total: 3 });
        assert_eq!(seen[2].percent(), 100);
    }

    #[tokio::test]
    async fn request_interval_paces_consecutive_dispatches() {
        let transport = MockTransport::new(|_| html_response("ok"));
        let mut intruder = Intruder::new(transport);
        intruder.set_request_interval(Duration::from_millis(30));
        let start = std::time::Instant::now();
        let records = intruder
            .run(&plan(), None, &CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        // the first dispatch goes out immediately, the next two wait
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_next_dispatch() {
        let cancel = CancelHandle::new();
        let trigger = cancel.clone();
        let transport = MockTransport::new(move |_| {
            trigger.cancel();
            html_response("ok")
        });
        let intruder = Intruder::new(transport);
        let records = intruder.run(&plan(), None, &cancel).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_keeps_the_request_in_history() {
        struct FailingTransport;
        impl crate::http::client::Transport for FailingTransport {
            async fn send(&self, _req: HttpRequest) -> Result<HttpResponse> {
                anyhow::bail!("connection refused")
            }
        }
        let intruder = Intruder::new(FailingTransport);
        let records = intruder
            .run(&plan(), None, &CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.response.is_none()));
    }
}
