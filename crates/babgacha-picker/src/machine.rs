//! State machine for the randomized "spin to pick a restaurant" reveal.
//!
//! Phases run `Idle → Anticipation → Spinning → Decelerating → Revealed`.
//! The winning candidate is drawn uniformly when the spin begins, not at
//! reveal time; the timed phases only pace the visual reveal. The machine
//! is session-owned state: each picker session holds its own pool and
//! guard, nothing is process-global.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;

/// Phases of one spin cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GachaPhase {
    Idle,
    Anticipation,
    Spinning,
    Decelerating,
    Revealed,
}

/// Durations for the timed phases. Defaults follow the original reveal
/// pacing: short wind-up, two-second spin, short deceleration.
#[derive(Debug, Clone, Copy)]
pub struct GachaTimings {
    pub anticipation: Duration,
    pub spin: Duration,
    pub decelerate: Duration,
}

impl Default for GachaTimings {
    fn default() -> Self {
        Self {
            anticipation: Duration::from_millis(500),
            spin: Duration::from_millis(2000),
            decelerate: Duration::from_millis(500),
        }
    }
}

impl GachaTimings {
    /// Zero-length phases, for tests that drive the machine synchronously.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            anticipation: Duration::ZERO,
            spin: Duration::ZERO,
            decelerate: Duration::ZERO,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpinError {
    /// A spin was requested while one is already mid-cycle. The in-flight
    /// draw and the pool are untouched; the request is a no-op.
    #[error("a spin is already in progress")]
    SpinInProgress,

    /// The candidate pool is empty; surfaced as a user-facing warning
    /// rather than entering the anticipation phase.
    #[error("no candidates to pick from")]
    EmptyPool,

    /// `retry`/`select` called outside the `Revealed` phase.
    #[error("no revealed candidate")]
    NothingRevealed,
}

/// One picker session over a candidate pool.
pub struct GachaMachine<C> {
    pool: Vec<C>,
    phase: GachaPhase,
    drawn: Option<usize>,
    timings: GachaTimings,
}

impl<C> GachaMachine<C> {
    #[must_use]
    pub fn new(pool: Vec<C>) -> Self {
        Self::with_timings(pool, GachaTimings::default())
    }

    #[must_use]
    pub fn with_timings(pool: Vec<C>, timings: GachaTimings) -> Self {
        Self {
            pool,
            phase: GachaPhase::Idle,
            drawn: None,
            timings,
        }
    }

    #[must_use]
    pub fn phase(&self) -> GachaPhase {
        self.phase
    }

    #[must_use]
    pub fn pool(&self) -> &[C] {
        &self.pool
    }

    /// Replaces the candidate pool. Only allowed while idle so an in-flight
    /// draw can never dangle.
    pub fn set_pool(&mut self, pool: Vec<C>) -> Result<(), SpinError> {
        if self.phase != GachaPhase::Idle {
            return Err(SpinError::SpinInProgress);
        }
        self.pool = pool;
        Ok(())
    }

    /// Starts a spin: draws the winning candidate and enters `Anticipation`.
    ///
    /// # Errors
    ///
    /// - [`SpinError::SpinInProgress`] if a cycle is already running
    ///   (re-entrancy guard; the existing draw is unaffected).
    /// - [`SpinError::EmptyPool`] if there is nothing to draw from; the
    ///   machine stays `Idle`.
    pub fn begin_spin(&mut self) -> Result<(), SpinError> {
        if self.phase != GachaPhase::Idle {
            return Err(SpinError::SpinInProgress);
        }
        if self.pool.is_empty() {
            return Err(SpinError::EmptyPool);
        }

        // The outcome is fixed here, before any animation plays.
        let index = rand::rng().random_range(0..self.pool.len());
        tracing::debug!(index, pool_size = self.pool.len(), "candidate drawn");
        self.drawn = Some(index);
        self.phase = GachaPhase::Anticipation;
        Ok(())
    }

    /// Advances one timed phase. The timed phases carry no branching —
    /// they exist purely to pace the reveal.
    pub fn advance(&mut self) -> GachaPhase {
        self.phase = match self.phase {
            GachaPhase::Anticipation => GachaPhase::Spinning,
            GachaPhase::Spinning => GachaPhase::Decelerating,
            GachaPhase::Decelerating => GachaPhase::Revealed,
            other => other,
        };
        self.phase
    }

    /// The candidate drawn by the current cycle, once revealed.
    #[must_use]
    pub fn revealed(&self) -> Option<&C> {
        if self.phase != GachaPhase::Revealed {
            return None;
        }
        self.drawn.and_then(|idx| self.pool.get(idx))
    }

    /// Runs a full spin cycle, sleeping through the timed phases, and
    /// returns the revealed candidate.
    ///
    /// # Errors
    ///
    /// Same as [`GachaMachine::begin_spin`].
    pub async fn spin(&mut self) -> Result<&C, SpinError> {
        self.begin_spin()?;

        tokio::time::sleep(self.timings.anticipation).await;
        self.advance(); // -> Spinning
        tokio::time::sleep(self.timings.spin).await;
        self.advance(); // -> Decelerating
        tokio::time::sleep(self.timings.decelerate).await;
        self.advance(); // -> Revealed

        self.revealed().ok_or(SpinError::NothingRevealed)
    }

    /// Discards the revealed candidate and returns to `Idle` with the pool
    /// unchanged, ready for another spin.
    ///
    /// # Errors
    ///
    /// [`SpinError::NothingRevealed`] outside the `Revealed` phase.
    pub fn retry(&mut self) -> Result<(), SpinError> {
        if self.phase != GachaPhase::Revealed {
            return Err(SpinError::NothingRevealed);
        }
        self.drawn = None;
        self.phase = GachaPhase::Idle;
        Ok(())
    }

    /// Accepts the revealed candidate, ending this picker cycle. Downstream
    /// (visit recording, review writing) takes over from here.
    ///
    /// # Errors
    ///
    /// [`SpinError::NothingRevealed`] outside the `Revealed` phase.
    pub fn select(&mut self) -> Result<C, SpinError>
    where
        C: Clone,
    {
        let chosen = self
            .revealed()
            .cloned()
            .ok_or(SpinError::NothingRevealed)?;
        self.drawn = None;
        self.phase = GachaPhase::Idle;
        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<&'static str> {
        vec!["국밥", "초밥", "파스타", "쌀국수"]
    }

    #[test]
    fn spin_walks_all_phases_in_order() {
        let mut machine = GachaMachine::new(pool());
        assert_eq!(machine.phase(), GachaPhase::Idle);

        machine.begin_spin().expect("spin should start");
        assert_eq!(machine.phase(), GachaPhase::Anticipation);
        assert_eq!(machine.advance(), GachaPhase::Spinning);
        assert_eq!(machine.advance(), GachaPhase::Decelerating);
        assert_eq!(machine.advance(), GachaPhase::Revealed);
        assert!(machine.revealed().is_some());
    }

    #[test]
    fn draw_happens_at_spin_start_not_reveal() {
        let mut machine = GachaMachine::new(pool());
        machine.begin_spin().expect("spin should start");
        let drawn_at_start = machine.drawn;
        assert!(drawn_at_start.is_some());

        machine.advance();
        machine.advance();
        machine.advance();
        assert_eq!(machine.drawn, drawn_at_start);

        let revealed = *machine.revealed().expect("revealed");
        assert_eq!(revealed, machine.pool()[drawn_at_start.unwrap()]);
    }

    #[test]
    fn second_spin_request_mid_cycle_is_rejected() {
        let mut machine = GachaMachine::new(pool());
        machine.begin_spin().expect("first spin starts");
        machine.advance(); // Spinning
        assert_eq!(machine.phase(), GachaPhase::Spinning);

        let drawn_before = machine.drawn;
        assert_eq!(machine.begin_spin(), Err(SpinError::SpinInProgress));
        assert_eq!(machine.drawn, drawn_before, "in-flight draw untouched");
        assert_eq!(machine.phase(), GachaPhase::Spinning);
        assert_eq!(machine.pool().len(), 4, "pool untouched");
    }

    #[test]
    fn empty_pool_refuses_to_spin() {
        let mut machine: GachaMachine<&str> = GachaMachine::new(Vec::new());
        assert_eq!(machine.begin_spin(), Err(SpinError::EmptyPool));
        assert_eq!(machine.phase(), GachaPhase::Idle);
    }

    #[test]
    fn retry_returns_to_idle_with_pool_unchanged() {
        let mut machine = GachaMachine::new(pool());
        machine.begin_spin().expect("spin starts");
        machine.advance();
        machine.advance();
        machine.advance();

        machine.retry().expect("retry from revealed");
        assert_eq!(machine.phase(), GachaPhase::Idle);
        assert_eq!(machine.pool().len(), 4);
        assert!(machine.revealed().is_none());

        // Can spin again immediately.
        machine.begin_spin().expect("second spin starts");
    }

    #[test]
    fn select_hands_back_the_drawn_candidate() {
        let mut machine = GachaMachine::new(pool());
        machine.begin_spin().expect("spin starts");
        machine.advance();
        machine.advance();
        machine.advance();

        let revealed = *machine.revealed().expect("revealed");
        let selected = machine.select().expect("select from revealed");
        assert_eq!(selected, revealed);
        assert_eq!(machine.phase(), GachaPhase::Idle);
    }

    #[test]
    fn retry_and_select_require_a_revealed_candidate() {
        let mut machine = GachaMachine::new(pool());
        assert_eq!(machine.retry(), Err(SpinError::NothingRevealed));
        assert_eq!(machine.select(), Err(SpinError::NothingRevealed));

        machine.begin_spin().expect("spin starts");
        assert_eq!(machine.retry(), Err(SpinError::NothingRevealed));
    }

    #[test]
    fn set_pool_rejected_mid_cycle() {
        let mut machine = GachaMachine::new(pool());
        machine.begin_spin().expect("spin starts");
        assert_eq!(
            machine.set_pool(vec!["치킨"]),
            Err(SpinError::SpinInProgress)
        );
    }

    #[test]
    fn draw_is_always_within_pool_bounds() {
        for _ in 0..50 {
            let mut machine = GachaMachine::new(pool());
            machine.begin_spin().expect("spin starts");
            let idx = machine.drawn.expect("drawn index");
            assert!(idx < machine.pool().len());
            machine.advance();
            machine.advance();
            machine.advance();
            machine.retry().expect("retry");
        }
    }

    #[tokio::test]
    async fn async_spin_reveals_a_candidate() {
        let mut machine = GachaMachine::with_timings(pool(), GachaTimings::instant());
        let chosen = *machine.spin().await.expect("spin completes");
        assert!(pool().contains(&chosen));
        assert_eq!(machine.phase(), GachaPhase::Revealed);
    }
}
