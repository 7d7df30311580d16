//! Span helpers shared by the mock runtime and the clocks.

use std::future::Future;
use tracing::{debug_span, trace_span, Instrument, Span};

/// Create a span covering one mock invocation.
pub fn mock_span(mock_name: &str, sequence: u64) -> Span {
    trace_span!("mock_call", mock = %mock_name, seq = sequence)
}

/// Create a span for a clock operation such as an advance or a mode switch.
pub fn clock_span(clock: &str, operation: &str) -> Span {
    debug_span!("clock", kind = %clock, op = %operation)
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    fn with_subscriber<F>(f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(EnvFilter::new("trace"))
            .finish();

        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn test_span_nesting() {
        with_subscriber(|| {
            let clock = clock_span("virtual", "advance_by");
            let _outer = clock.enter();

            let call = mock_span("tick", 7);
            let _inner = call.enter();

            tracing::trace!("timer fired");
            assert!(!Span::current().is_disabled());
        });
    }

    #[tokio::test]
    async fn test_instrumented_future_output() {
        let span = mock_span("http_get_request", 1);
        let value = instrument_future(async { 42 }, span).await;
        assert_eq!(value, 42);
    }
}
