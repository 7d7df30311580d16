//! Bare mocks, behavior queues, async one-shots and auto-mocking.

use mimic_common_config::MimicConfig;
use mimic_mock::{AsyncMockFn, MockFn, Outcome};
use mimic_test_harness::fixtures::{AppService, Calc, GoogleGetter, Response};
use mimic_test_harness::TestContext;
use pretty_assertions::assert_eq;

#[test]
fn test_bare_mock_returns_default() {
    let mock: MockFn<(String,), i64> = MockFn::new();
    assert_eq!(mock.call_infallible(("a".into(),)), 0);
    assert_eq!(mock.results(), vec![Outcome::Returned(0)]);
}

#[test]
fn test_return_value_queue_then_persistent() {
    let mock: MockFn<(), &'static str> = MockFn::new();
    mock.return_value("always")
        .return_value_once("first")
        .return_value_once("second");

    let seen: Vec<_> = (0..4).map(|_| mock.call_infallible(())).collect();
    assert_eq!(seen, vec!["first", "second", "always", "always"]);
    assert_eq!(mock.pending_once(), 0);
}

#[test]
fn test_implementation_once_interleaves_with_values() {
    let mock: MockFn<(i64,), i64> = MockFn::new();
    mock.returning(|(x,)| x * 10);
    mock.returning_once(|(x,)| x + 1).return_value_once(-1);

    assert_eq!(mock.call_infallible((5,)), 6);
    assert_eq!(mock.call_infallible((5,)), -1);
    assert_eq!(mock.call_infallible((5,)), 50);
}

#[test]
fn test_reset_drops_everything() {
    let mock: MockFn<(), u32> = MockFn::new();
    mock.return_value(7).return_value_once(1);
    mock.call_infallible(());

    mock.reset();
    assert_eq!(mock.call_count(), 0);
    assert_eq!(mock.pending_once(), 0);
    assert_eq!(mock.call_infallible(()), 0);
}

#[tokio::test]
async fn test_async_resolved_and_rejected_once() {
    let mock: AsyncMockFn<(), u8, String> = AsyncMockFn::new();
    mock.resolved_value(1)
        .resolved_value_once(2)
        .rejected_value_once("nope".into());

    assert_eq!(mock.call(()).await, Ok(2));
    assert_eq!(mock.call(()).await, Err("nope".to_string()));
    assert_eq!(mock.call(()).await, Ok(1));
    assert_eq!(
        mock.results(),
        vec![
            Outcome::Returned(2),
            Outcome::Threw("nope".to_string()),
            Outcome::Returned(1),
        ]
    );
}

#[tokio::test]
async fn test_spy_on_member_then_restore() {
    let getter = GoogleGetter::new();
    let spy = getter.http_get_request.spy();
    spy.resolved_value_once(Response::ok("cached"));

    assert_eq!(getter.http_get_google("a").await.unwrap().body, "cached");
    assert!(getter.http_get_google("a").await.is_err());

    spy.restore().unwrap();
    assert!(!getter.http_get_request.is_mocked());
}

#[test]
fn test_auto_mock_nested_surface() {
    let cx = TestContext::new();
    let calc = Calc::new();

    assert_eq!(cx.auto_mock(&calc), 3);
    assert_eq!(calc.sum.call_infallible((1, 2)), 0);
    assert_eq!(calc.advanced.log2.call_infallible((8.0,)), 0.0);
    assert_eq!(calc.lambda_log2.call_infallible((8.0,)), 0.0);

    if let Some(log2) = calc.advanced.log2.mock() {
        log2.return_value(42.0);
    }
    assert_eq!(calc.advanced.log2.call_infallible((8.0,)), 42.0);

    cx.registry().restore_all().unwrap();
    assert_eq!(calc.sum.call_infallible((1, 2)), 3);
    assert_eq!(calc.advanced.log2.call_infallible((8.0,)), 3.0);
}

#[test]
fn test_context_restores_auto_mocks_on_drop() {
    let service = AppService::new();
    {
        let mut config = MimicConfig::default();
        config.mocks.restore_mocks = true;
        let cx = TestContext::with_config(config).unwrap();
        cx.auto_mock(&service);
        assert_eq!(service.get_hello(), "");
    }
    assert_eq!(service.get_hello(), "Hello, World!");
}

#[test]
fn test_context_reset_keeps_spies_installed() {
    let calc = Calc::new();
    {
        let mut config = MimicConfig::default();
        config.mocks.reset_mocks = true;
        let cx = TestContext::with_config(config).unwrap();
        cx.track(calc.sum.spy()).return_value(100);
        assert_eq!(calc.sum.call_infallible((1, 1)), 100);
    }
    assert!(calc.sum.is_mocked());
    assert_eq!(calc.sum.call_infallible((1, 1)), 2);
}
