//! Lottery draw
//!
//! The organizer's `count` is a target number of invitations. Entries already
//! `SELECTED` or `ACCEPTED` count toward it, so re-running a draw after a
//! partial failure tops up instead of over-selecting. Each promotion is an
//! independent status write, and failures are reported per entry.

use rand::{seq::SliceRandom, Rng};

use super::WaitlistService;
use crate::domain::entities::WaitlistEntry;
use crate::domain::error::{Result, WaitlistError};
use crate::domain::state::WaitlistStatus;

/// How many entries a draw should promote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawPlan {
    pub target: usize,
    pub already_selected: usize,
    pub waiting: usize,
    pub to_draw: usize,
}

pub fn plan_draw(target: usize, entries: &[WaitlistEntry]) -> DrawPlan {
    let already_selected = entries
        .iter()
        .filter(|e| matches!(e.status, WaitlistStatus::Selected | WaitlistStatus::Accepted))
        .count();
    let waiting = entries
        .iter()
        .filter(|e| e.status == WaitlistStatus::Waiting)
        .count();

    DrawPlan {
        target,
        already_selected,
        waiting,
        to_draw: target.saturating_sub(already_selected).min(waiting),
    }
}

/// Uniform sample of `n` entries without replacement; all of them if `n` covers the pool
pub fn choose<R: Rng + ?Sized>(
    mut pool: Vec<WaitlistEntry>,
    n: usize,
    rng: &mut R,
) -> Vec<WaitlistEntry> {
    if n >= pool.len() {
        return pool;
    }
    pool.shuffle(rng);
    pool.truncate(n);
    pool
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawFailure {
    pub entry_id: String,
    pub error: WaitlistError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutcome {
    pub requested: usize,
    /// Entries that already held an invitation before this draw
    pub already_selected: usize,
    pub drawn: Vec<WaitlistEntry>,
    pub failed: Vec<DrawFailure>,
    /// Entries left in `WAITING`, as of the draw
    pub remaining_waiting: usize,
}

impl DrawOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Invitations outstanding or accepted after this draw
    pub fn selected_total(&self) -> usize {
        self.already_selected + self.drawn.len()
    }
}

impl WaitlistService {
    /// Draw entrants for an event until `count` hold an invitation, or the
    /// waiting pool runs out.
    pub async fn select_entrants(&self, event_id: &str, count: usize) -> Result<DrawOutcome> {
        let event = self.repos.events.get(event_id).await?;
        let entries = self.repos.entries.list_by_event(event_id).await?;
        let plan = plan_draw(count, &entries);

        let waiting: Vec<WaitlistEntry> = entries
            .into_iter()
            .filter(|e| e.status == WaitlistStatus::Waiting)
            .collect();
        let chosen = {
            let mut rng = rand::thread_rng();
            choose(waiting, plan.to_draw, &mut rng)
        };

        let mut drawn = Vec::with_capacity(chosen.len());
        let mut failed = Vec::new();
        for entry in chosen {
            match self
                .repos
                .entries
                .update_status(&entry.id, WaitlistStatus::Selected)
                .await
            {
                Ok(selected) => {
                    self.announce(&selected, Some(&event)).await;
                    drawn.push(selected);
                }
                Err(error) => {
                    tracing::warn!(
                        event_id,
                        entry_id = %entry.id,
                        %error,
                        retryable = error.is_retryable(),
                        "Lottery promotion failed"
                    );
                    failed.push(DrawFailure {
                        entry_id: entry.id,
                        error,
                    });
                }
            }
        }

        let outcome = DrawOutcome {
            requested: count,
            already_selected: plan.already_selected,
            remaining_waiting: plan.waiting - drawn.len(),
            drawn,
            failed,
        };

        tracing::info!(
            event_id,
            requested = count,
            already_selected = outcome.already_selected,
            drawn = outcome.drawn.len(),
            failed = outcome.failed.len(),
            remaining_waiting = outcome.remaining_waiting,
            selected_total = outcome.selected_total(),
            "Lottery draw finished"
        );
        Ok(outcome)
    }
}
