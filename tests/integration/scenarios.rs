//! End-to-end scenarios: the round loop driving the real transfer pipeline
//! against in-memory chains and a scripted bridge.

use alloy::primitives::U256;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use backspender::bridge::RouteQuoter;
use backspender::chain::registry::ChainRegistry;
use backspender::engine::amount::AmountSelector;
use backspender::engine::attempt::{AttemptRunner, TransferPipeline};
use backspender::engine::rounds::{Phase, RoundLoop, RoundSettings};
use backspender::types::{AttemptOutcome, SkipReason};

use crate::mock_chain::{registry, BridgeMode, MockBridge, MockChain, BRIDGE, RECEIVER, SENDER};

/// 1000 USDC at 6 decimals.
const FUNDED: u64 = 1_000_000_000;
/// 5 USDC, below the 10 USDC floor.
const DUST: u64 = 5_000_000;

fn pipeline(registry: ChainRegistry, bridge: Arc<MockBridge>, dry_run: bool) -> TransferPipeline {
    TransferPipeline::new(
        registry,
        RouteQuoter::new(bridge, 95),
        AmountSelector::new(1000, 2500, 6),
        SENDER,
        RECEIVER,
        dec!(0.005),
        "USDC".into(),
        dry_run,
    )
}

fn settings(target: u32) -> RoundSettings {
    RoundSettings {
        transfers_per_round: target,
        min_delay_minutes: 4,
        max_delay_minutes: 8,
        cooldown: Duration::from_secs(7 * 60),
        skip_delay: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn single_funded_chain_is_always_the_source() {
    let op = MockChain::with_balance(DUST);
    let base = MockChain::with_balance(FUNDED);
    let soneium = MockChain::with_balance(0);
    let bridge = MockBridge::new(BridgeMode::Pct(99));
    let runner = pipeline(
        registry(&[(10, op.clone()), (8453, base.clone()), (1868, soneium.clone())]),
        bridge.clone(),
        false,
    );

    let mut rng = StdRng::seed_from_u64(42);
    let mut destinations = HashSet::new();
    for n in 1..=30 {
        let report = runner.run_attempt(n, &mut rng).await;
        assert!(report.outcome.is_transfer(), "attempt {n}: {:?}", report.outcome);
        let plan = report.plan.expect("plan");
        assert_eq!(plan.source.network.chain_id, 8453);
        assert_ne!(plan.destination.chain_id, 8453);
        assert!(plan.amount >= U256::from(10_000_000u64));
        assert!(plan.amount <= U256::from(25_000_000u64));
        destinations.insert(plan.destination.chain_id);
    }
    assert_eq!(destinations, HashSet::from([10, 1868]));

    // Only the funded chain ever signs anything.
    assert_eq!(base.sent().len(), 30);
    assert!(op.sent().is_empty() && soneium.sent().is_empty());
    assert!(op.approvals().is_empty() && soneium.approvals().is_empty());

    for request in bridge.requests() {
        assert_eq!(request.from_chain, 8453);
        assert_eq!(request.from_address, SENDER);
        assert_eq!(request.to_address, RECEIVER);
        assert_eq!(request.slippage, dec!(0.005));
    }
}

#[tokio::test]
async fn low_min_received_skips_before_any_transaction() {
    let op = MockChain::with_balance(FUNDED);
    let base = MockChain::with_balance(0);
    let bridge = MockBridge::new(BridgeMode::Fixed(94, 100));
    let runner = pipeline(registry(&[(10, op.clone()), (8453, base.clone())]), bridge.clone(), false);

    let report = runner.run_attempt(1, &mut StdRng::seed_from_u64(7)).await;
    assert_eq!(
        report.outcome,
        AttemptOutcome::Skipped(SkipReason::LowMinReceived { pct: U256::from(94u64), floor: 95 })
    );
    assert_eq!(bridge.requests().len(), 1);
    assert_eq!(op.allowance_reads(), 0);
    assert!(op.approvals().is_empty());
    assert!(op.sent().is_empty());
}

#[tokio::test]
async fn exactly_ninety_five_percent_is_accepted() {
    let op = MockChain::with_balance(FUNDED);
    let base = MockChain::with_balance(0);
    let bridge = MockBridge::new(BridgeMode::Fixed(95, 100));
    let runner = pipeline(registry(&[(10, op.clone()), (8453, base)]), bridge, false);

    let report = runner.run_attempt(1, &mut StdRng::seed_from_u64(7)).await;
    assert!(report.outcome.is_transfer());
    assert_eq!(op.sent().len(), 1);
    assert_eq!(op.sent()[0].0, BRIDGE);
}

#[tokio::test]
async fn contract_receiver_is_skipped_before_quoting() {
    let op = MockChain::with_balance(FUNDED);
    let base = MockChain::with_balance(0);
    base.deploy_at(RECEIVER);
    let bridge = MockBridge::new(BridgeMode::Pct(99));
    let runner = pipeline(registry(&[(10, op.clone()), (8453, base)]), bridge.clone(), false);

    let report = runner.run_attempt(1, &mut StdRng::seed_from_u64(3)).await;
    match report.outcome {
        AttemptOutcome::Skipped(SkipReason::ReceiverIsContract { receiver, network }) => {
            assert_eq!(receiver, RECEIVER);
            assert_eq!(network, "Network 8453");
        }
        other => panic!("expected contract skip, got {other:?}"),
    }
    assert!(bridge.requests().is_empty());
    assert!(op.sent().is_empty());
}

#[tokio::test]
async fn missing_route_is_a_skip() {
    let op = MockChain::with_balance(FUNDED);
    let base = MockChain::with_balance(0);
    let bridge = MockBridge::new(BridgeMode::NoRoute);
    let runner = pipeline(registry(&[(10, op.clone()), (8453, base)]), bridge, false);

    let report = runner.run_attempt(1, &mut StdRng::seed_from_u64(3)).await;
    assert_eq!(report.outcome, AttemptOutcome::Skipped(SkipReason::NoRoute));
    assert!(op.sent().is_empty());
}

#[tokio::test]
async fn rpc_failure_is_contained() {
    let op = MockChain::with_balance(FUNDED);
    let base = MockChain::with_balance(0);
    let bridge = MockBridge::new(BridgeMode::Pct(99));
    let runner = pipeline(registry(&[(10, op.clone()), (8453, base.clone())]), bridge, false);
    base.set_error("connection refused");

    let report = runner.run_attempt(1, &mut StdRng::seed_from_u64(3)).await;
    match report.outcome {
        AttemptOutcome::Skipped(SkipReason::Failed(msg)) => {
            assert!(msg.contains("connection refused"), "{msg}");
        }
        other => panic!("expected failure skip, got {other:?}"),
    }
    assert!(op.sent().is_empty());
}

#[tokio::test]
async fn no_funded_chain_cools_down_for_seven_minutes() {
    let op = MockChain::with_balance(DUST);
    let base = MockChain::with_balance(0);
    let soneium = MockChain::with_balance(9_999_999);
    let bridge = MockBridge::new(BridgeMode::Pct(99));
    let runner = pipeline(
        registry(&[(10, op), (8453, base), (1868, soneium)]),
        bridge.clone(),
        false,
    );
    let mut rounds = RoundLoop::new(runner, settings(10), StdRng::seed_from_u64(9));

    assert_eq!(rounds.step().await.phase, Phase::AttemptingTransfer);

    let step = rounds.step().await;
    assert_eq!(step.phase, Phase::Cooldown);
    assert_eq!(step.wait, Duration::from_secs(420));
    assert_eq!(
        step.attempt.map(|a| a.outcome),
        Some(AttemptOutcome::Skipped(SkipReason::NoEligibleSource))
    );
    assert!(bridge.requests().is_empty());

    let step = rounds.step().await;
    assert_eq!(step.phase, Phase::AttemptingTransfer);
    assert_eq!(rounds.round().successful, 0);
}

#[tokio::test]
async fn full_round_completes_and_rolls_over() {
    let op = MockChain::with_balance(FUNDED);
    let base = MockChain::with_balance(FUNDED);
    let soneium = MockChain::with_balance(FUNDED);
    let chains = [op.clone(), base.clone(), soneium.clone()];
    let runner = pipeline(
        registry(&[(10, op), (8453, base), (1868, soneium)]),
        MockBridge::new(BridgeMode::Pct(97)),
        false,
    );
    let mut rounds = RoundLoop::new(runner, settings(10), StdRng::seed_from_u64(2024));

    rounds.step().await;
    for n in 1..=10 {
        let step = rounds.step().await;
        assert!(step.attempt.unwrap().outcome.is_transfer());
        assert!(step.wait >= Duration::from_secs(4 * 60));
        assert!(step.wait <= Duration::from_secs(8 * 60));
        let expected = if n == 10 { Phase::RoundComplete } else { Phase::AttemptingTransfer };
        assert_eq!(step.phase, expected);
    }

    let step = rounds.step().await;
    let summary = step.summary.expect("summary");
    assert_eq!(summary.number, 1);
    assert_eq!(summary.transfers, 10);
    assert_eq!(summary.attempts, 10);

    let sent: usize = chains.iter().map(|c| c.sent().len()).sum();
    let approved: usize = chains.iter().map(|c| c.approvals().len()).sum();
    assert_eq!(sent, 10);
    // Each bridge transaction consumes the allowance, so every transfer approves.
    assert_eq!(approved, 10);

    rounds.step().await;
    assert_eq!(rounds.round().number, 2);
    assert_eq!(rounds.phase(), Phase::AttemptingTransfer);
}

#[tokio::test]
async fn dry_run_signs_nothing() {
    let op = MockChain::with_balance(FUNDED);
    let base = MockChain::with_balance(0);
    let runner = pipeline(
        registry(&[(10, op.clone()), (8453, base)]),
        MockBridge::new(BridgeMode::Pct(99)),
        true,
    );

    let report = runner.run_attempt(1, &mut StdRng::seed_from_u64(5)).await;
    assert!(report.outcome.is_transfer());
    assert_eq!(op.allowance_reads(), 1);
    assert!(op.approvals().is_empty());
    assert!(op.sent().is_empty());
}

#[tokio::test]
async fn dry_run_transfers_pace_and_complete_the_round() {
    let op = MockChain::with_balance(FUNDED);
    let base = MockChain::with_balance(FUNDED);
    let runner = pipeline(
        registry(&[(10, op.clone()), (8453, base.clone())]),
        MockBridge::new(BridgeMode::Pct(99)),
        true,
    );
    let mut rounds = RoundLoop::new(runner, settings(2), StdRng::seed_from_u64(11));

    rounds.step().await;
    let step = rounds.step().await;
    assert!(step.wait >= Duration::from_secs(4 * 60));
    assert_eq!(rounds.round().successful, 1);

    let step = rounds.step().await;
    assert_eq!(step.phase, Phase::RoundComplete);
    assert_eq!(rounds.step().await.summary.map(|s| s.transfers), Some(2));

    assert!(op.sent().is_empty() && base.sent().is_empty());
    assert!(op.approvals().is_empty() && base.approvals().is_empty());
}
