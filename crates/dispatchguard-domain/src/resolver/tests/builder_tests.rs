//! Check resolver chain assembly tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::mocks::{request_with_dispatches, same_stage, FanOutResolver, MockCheckResolver};
use crate::error::DomainError;
use crate::resolver::{
    CheckResolver, CheckResolverOrderedBuilder, DispatchThrottlingConfig, RequestContext,
};

fn throttling(threshold: u32) -> DispatchThrottlingConfig {
    DispatchThrottlingConfig::default()
        .with_frequency(Duration::from_millis(5))
        .with_default_threshold(threshold)
}

#[tokio::test]
async fn test_build_requires_terminal() {
    let result = CheckResolverOrderedBuilder::new()
        .with_dispatch_throttling(throttling(10))
        .build();

    assert!(matches!(result, Err(DomainError::ResolverError { .. })));
}

#[tokio::test]
async fn test_terminal_only_chain_delegates_to_itself() {
    let terminal: Arc<dyn CheckResolver> = Arc::new(MockCheckResolver::allowing(true));

    let chain = CheckResolverOrderedBuilder::new()
        .with_terminal(Arc::clone(&terminal))
        .build()
        .unwrap();

    assert_eq!(chain.len(), 1);
    assert!(same_stage(&chain.head(), &terminal));
    assert!(same_stage(&terminal.delegate().unwrap(), &terminal));
    chain.close();
}

#[tokio::test]
async fn test_throttling_stage_is_linked_in_front_of_terminal() {
    let mock = Arc::new(MockCheckResolver::allowing(true));
    let terminal: Arc<dyn CheckResolver> = mock.clone();

    let chain = CheckResolverOrderedBuilder::new()
        .with_dispatch_throttling(throttling(10))
        .with_terminal(Arc::clone(&terminal))
        .build()
        .unwrap();
    let head = chain.head();

    assert_eq!(chain.len(), 2);
    assert!(!same_stage(&head, &terminal));
    assert!(same_stage(&head.delegate().unwrap(), &terminal));
    assert!(
        same_stage(&terminal.delegate().unwrap(), &head),
        "terminal dispatches back through the head"
    );

    let response = head
        .resolve_check(&RequestContext::new(), &request_with_dispatches(0))
        .await
        .unwrap();
    assert!(response.allowed);
    assert_eq!(mock.calls(), 1);

    chain.close();
}

#[tokio::test]
async fn test_close_closes_every_stage_and_unlinks_terminal() {
    let mock = Arc::new(MockCheckResolver::allowing(true));

    let chain = CheckResolverOrderedBuilder::new()
        .with_dispatch_throttling(throttling(10))
        .with_terminal(mock.clone())
        .build()
        .unwrap();
    chain.close();

    assert!(mock.is_closed());
    let unlinked = mock.delegate().unwrap();
    let result = unlinked
        .resolve_check(&RequestContext::new(), &request_with_dispatches(0))
        .await;
    assert!(matches!(
        result,
        Err(DomainError::DelegateNotConfigured { .. })
    ));
}

#[tokio::test]
async fn test_dropping_unclosed_chain_frees_every_stage() {
    let mock = Arc::new(MockCheckResolver::allowing(true));

    let chain = CheckResolverOrderedBuilder::new()
        .with_dispatch_throttling(throttling(10))
        .with_terminal(mock.clone())
        .build()
        .unwrap();
    let head = Arc::downgrade(&chain.head());
    assert!(head.upgrade().is_some());

    drop(chain);

    assert!(head.upgrade().is_none(), "throttling stage leaked");
    assert!(mock.is_closed());
    let unlinked = mock.delegate().unwrap();
    let result = unlinked
        .resolve_check(&RequestContext::new(), &request_with_dispatches(0))
        .await;
    assert!(matches!(
        result,
        Err(DomainError::DelegateNotConfigured { .. })
    ));
}

#[tokio::test]
async fn test_dropping_unclosed_terminal_only_chain_frees_terminal() {
    let mock = Arc::new(MockCheckResolver::allowing(true));
    let terminal = Arc::downgrade(&mock);

    let chain = CheckResolverOrderedBuilder::new()
        .with_terminal(mock)
        .build()
        .unwrap();
    drop(chain);

    assert!(terminal.upgrade().is_none(), "self-delegating terminal leaked");
}

#[tokio::test(start_paused = true)]
async fn test_recursive_fan_out_is_throttled_past_threshold() {
    let fan_out = Arc::new(FanOutResolver::new(2, 3));

    let chain = CheckResolverOrderedBuilder::new()
        .with_dispatch_throttling(throttling(3))
        .with_terminal(fan_out.clone())
        .build()
        .unwrap();
    let req = request_with_dispatches(0);

    let start = Instant::now();
    let response = chain
        .head()
        .resolve_check(&RequestContext::new(), &req)
        .await
        .unwrap();

    assert!(response.allowed);
    assert_eq!(fan_out.leaves(), 8);
    assert_eq!(req.request_metadata.dispatch_count(), 14);
    assert!(req.request_metadata.was_throttled());
    assert!(start.elapsed() >= Duration::from_millis(5));
    chain.close();
}

#[tokio::test(start_paused = true)]
async fn test_recursive_fan_out_below_threshold_runs_unthrottled() {
    let fan_out = Arc::new(FanOutResolver::new(2, 3));

    let chain = CheckResolverOrderedBuilder::new()
        .with_dispatch_throttling(throttling(100))
        .with_terminal(fan_out.clone())
        .build()
        .unwrap();
    let req = request_with_dispatches(0);

    let start = Instant::now();
    chain
        .head()
        .resolve_check(&RequestContext::new(), &req)
        .await
        .unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(!req.request_metadata.was_throttled());
    chain.close();
}
