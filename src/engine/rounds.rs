//! Round loop: the bot's top-level state machine.
//!
//! ```text
//! StartingRound ──▶ AttemptingTransfer ──(target reached)──▶ RoundComplete
//!                      │    ▲                                     │
//!          no funds    ▼    │ after cooldown                      │
//!                     Cooldown                                    │
//!        ▲                                                        │
//!        └────────────────────── next round ◀─────────────────────┘
//! ```
//!
//! `step` performs exactly one transition and reports how long to wait
//! before the next one; `run` repeats it forever.

use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

use super::amount::pick_delay;
use super::attempt::AttemptRunner;
use crate::config::BotConfig;
use crate::types::{AttemptOutcome, AttemptReport, Round, RoundSummary, SkipReason, TransferAttempt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    StartingRound,
    AttemptingTransfer,
    Cooldown,
    RoundComplete,
}

/// Pacing knobs for the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSettings {
    pub transfers_per_round: u32,
    pub min_delay_minutes: u64,
    pub max_delay_minutes: u64,
    pub cooldown: Duration,
    pub skip_delay: Duration,
}

impl RoundSettings {
    pub fn from_config(cfg: &BotConfig) -> Self {
        Self {
            transfers_per_round: cfg.transfers_per_round,
            min_delay_minutes: cfg.min_delay_minutes,
            max_delay_minutes: cfg.max_delay_minutes,
            cooldown: cfg.cooldown(),
            skip_delay: cfg.skip_delay(),
        }
    }
}

/// What one `step` did.
#[derive(Debug)]
pub struct Step {
    /// Phase the loop is in after this step.
    pub phase: Phase,
    /// How long to wait before the next step.
    pub wait: Duration,
    pub attempt: Option<AttemptReport>,
    pub summary: Option<RoundSummary>,
}

impl Step {
    fn transition(phase: Phase) -> Self {
        Self {
            phase,
            wait: Duration::ZERO,
            attempt: None,
            summary: None,
        }
    }
}

pub struct RoundLoop<A, R> {
    runner: A,
    settings: RoundSettings,
    rng: R,
    phase: Phase,
    round: Round,
}

impl<A: AttemptRunner, R: Rng + Send> RoundLoop<A, R> {
    pub fn new(runner: A, settings: RoundSettings, rng: R) -> Self {
        Self {
            runner,
            settings,
            rng,
            phase: Phase::StartingRound,
            round: Round::start(1),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    /// Advance the state machine by one transition.
    pub async fn step(&mut self) -> Step {
        match self.phase {
            Phase::StartingRound => {
                self.round = Round::start(self.round.number);
                info!(
                    round = self.round.number,
                    target = self.settings.transfers_per_round,
                    "Starting round"
                );
                self.phase = Phase::AttemptingTransfer;
                Step::transition(self.phase)
            }
            Phase::Cooldown => {
                self.phase = Phase::AttemptingTransfer;
                Step::transition(self.phase)
            }
            Phase::AttemptingTransfer => self.attempt().await,
            Phase::RoundComplete => {
                let summary = self.round.summary(Utc::now());
                info!(
                    round = summary.number,
                    transfers = summary.transfers,
                    attempts = summary.attempts,
                    minutes = summary.elapsed_minutes,
                    "Round finished, starting next round"
                );
                self.round.number += 1;
                self.phase = Phase::StartingRound;
                Step {
                    summary: Some(summary),
                    ..Step::transition(self.phase)
                }
            }
        }
    }

    async fn attempt(&mut self) -> Step {
        self.round.attempts += 1;
        let number = self.round.successful + 1;
        let report = self.runner.run_attempt(number, &mut self.rng).await;

        if let Some(record) = TransferAttempt::from_report(number, &report) {
            info!(
                tx = record.number,
                from = %record.source,
                to = %record.destination,
                amount = %record.amount,
                success = record.succeeded,
                "Attempt finished"
            );
        }

        let wait = match &report.outcome {
            AttemptOutcome::Transferred { .. } => {
                self.round.successful += 1;
                if self.round.successful >= self.settings.transfers_per_round {
                    self.phase = Phase::RoundComplete;
                }
                let delay = pick_delay(
                    self.settings.min_delay_minutes,
                    self.settings.max_delay_minutes,
                    &mut self.rng,
                );
                info!(
                    done = self.round.successful,
                    target = self.settings.transfers_per_round,
                    wait_minutes = delay.as_secs() / 60,
                    "Waiting before next transfer"
                );
                delay
            }
            AttemptOutcome::Skipped(SkipReason::NoEligibleSource) => {
                warn!(
                    cooldown_minutes = self.settings.cooldown.as_secs() / 60,
                    "No chain with sufficient balance. Cooling down."
                );
                self.phase = Phase::Cooldown;
                self.settings.cooldown
            }
            AttemptOutcome::Skipped(reason) => {
                info!(tx = number, %reason, "Attempt skipped");
                self.settings.skip_delay
            }
        };

        Step {
            phase: self.phase,
            wait,
            attempt: Some(report),
            summary: None,
        }
    }

    /// Run forever, sleeping between steps.
    pub async fn run(&mut self) {
        loop {
            let step = self.step().await;
            if !step.wait.is_zero() {
                tokio::time::sleep(step.wait).await;
            }
        }
    }
}
