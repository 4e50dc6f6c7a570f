//! Alert Dispatcher
//!
//! Fans one alert out to every configured sink with bounded retry. A sink
//! that keeps failing gets the alert dropped with a warning; notification
//! loss is acceptable, stalling the pipeline is not.

use std::sync::Arc;

use tracing::warn;

use crate::adapters::retry::RetryPolicy;
use crate::ports::alerts::{Alert, AlertSink};

pub struct AlertDispatcher {
    sinks: Vec<Arc<dyn AlertSink>>,
    retry: RetryPolicy,
}

impl AlertDispatcher {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>, retry: RetryPolicy) -> Self {
        Self { sinks, retry }
    }

    /// Deliver to all sinks. Never returns an error; exhausted retries are
    /// logged and the alert is dropped for that sink only.
    pub async fn dispatch(&self, alert: &Alert) {
        for sink in &self.sinks {
            let result = self
                .retry
                .run(sink.name(), || async { sink.send(alert).await })
                .await;
            if let Err(err) = result {
                warn!(sink = sink.name(), error = %err, "alert dropped after retries");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScoreResult, Sentiment, TokenId};
    use crate::ports::alerts::AcceptAlert;
    use crate::ports::mocks::MockSink;

    fn sample_alert() -> Alert {
        Alert::Accept(AcceptAlert {
            strategy: "safe_shield".to_string(),
            token: TokenId::new("base", "0xfeed"),
            symbol: "BRETT".to_string(),
            name: "Brett".to_string(),
            liquidity_usd: Some(50_000.0),
            allocation_usd: 10.0,
            score: ScoreResult {
                scam_probability: 0.1,
                meme_potential: 75.0,
                sentiment: Sentiment::Bullish,
                confidence: 0.8,
                summary: String::new(),
                flags: vec![],
            },
            links: vec![],
        })
    }

    #[tokio::test]
    async fn test_delivers_to_every_sink() {
        let a = Arc::new(MockSink::new());
        let b = Arc::new(MockSink::new());
        let dispatcher = AlertDispatcher::new(
            vec![a.clone(), b.clone()],
            RetryPolicy::none(),
        );

        dispatcher.dispatch(&sample_alert()).await;
        assert_eq!(a.sent_count(), 1);
        assert_eq!(b.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_then_delivers() {
        let sink = Arc::new(MockSink::new());
        sink.fail_next(1);
        let dispatcher = AlertDispatcher::new(
            vec![sink.clone()],
            RetryPolicy::new(3, std::time::Duration::from_millis(1), std::time::Duration::from_millis(5)),
        );

        dispatcher.dispatch(&sample_alert()).await;
        assert_eq!(sink.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_drop_without_error() {
        let sink = Arc::new(MockSink::new());
        sink.fail_next(10);
        let dispatcher = AlertDispatcher::new(
            vec![sink.clone()],
            RetryPolicy::new(2, std::time::Duration::from_millis(1), std::time::Duration::from_millis(5)),
        );

        dispatcher.dispatch(&sample_alert()).await;
        assert_eq!(sink.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_one_failing_sink_does_not_block_others() {
        let bad = Arc::new(MockSink::new());
        bad.fail_next(10);
        let good = Arc::new(MockSink::new());
        let dispatcher = AlertDispatcher::new(
            vec![bad.clone(), good.clone()],
            RetryPolicy::none(),
        );

        dispatcher.dispatch(&sample_alert()).await;
        assert_eq!(bad.sent_count(), 0);
        assert_eq!(good.sent_count(), 1);
    }
}
