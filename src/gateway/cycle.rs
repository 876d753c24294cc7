//! Single-flight refresh cycle: the shared refresh future plus the FIFO queue of suspended callers.
//!
//! The state lives behind a blocking mutex that is only ever held for a check-and-set or a
//! drain-and-reset, never across an `.await`. The refresh itself is a [`Shared`] future held by
//! every caller that joined the cycle, so any of them can drive it and no single caller dropping
//! its future cancels the refresh for the rest of the queue. The state only keeps a weak handle:
//! once every caller is gone the refresh is dropped and the next failure starts a new cycle.

// crates.io
use futures::{
	channel::oneshot,
	future::{self, BoxFuture, Either, FutureExt, Shared, WeakShared},
};
// self
use crate::{_prelude::*, auth::Credential, error::RefreshError};

/// Settlement handed to every caller of a cycle.
pub(crate) type RefreshOutcome = Result<Credential, RefreshError>;

/// Refresh future shared by the leader and every queued caller.
pub(crate) type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
enum CycleState {
	#[default]
	Idle,
	Refreshing {
		refresh: WeakShared<BoxFuture<'static, RefreshOutcome>>,
		waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
	},
}
impl Debug for CycleState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Idle => f.write_str("Idle"),
			Self::Refreshing { waiters, .. } =>
				f.debug_struct("Refreshing").field("waiters", &waiters.len()).finish(),
		}
	}
}

/// Outcome of [`RefreshCycle::join`].
pub(crate) enum Admission {
	/// No cycle was in flight; the caller started one and awaits its refresh directly.
	Leader(SharedRefresh),
	/// A cycle was already in flight; the caller holds a queue slot.
	Queued(Ticket),
}

/// Queue slot of a caller that joined an in-flight cycle.
pub(crate) struct Ticket {
	rx: oneshot::Receiver<RefreshOutcome>,
	refresh: SharedRefresh,
}
impl Ticket {
	/// Waits for the slot to be settled, driving the shared refresh meanwhile.
	///
	/// The refresh settles every slot before it completes, so whichever side finishes first
	/// carries the same outcome.
	pub(crate) async fn settled(self) -> RefreshOutcome {
		match future::select(self.rx, self.refresh).await {
			Either::Left((Ok(outcome), _)) => outcome,
			Either::Left((Err(oneshot::Canceled), refresh)) => refresh.await,
			Either::Right((outcome, _)) => outcome,
		}
	}
}

#[derive(Debug, Default)]
pub(crate) struct RefreshCycle(Mutex<CycleState>);
impl RefreshCycle {
	/// Returns `true` while a cycle is in flight and some caller still holds its refresh.
	pub(crate) fn is_refreshing(&self) -> bool {
		matches!(
			&*self.0.lock(),
			CycleState::Refreshing { refresh, .. } if refresh.upgrade().is_some()
		)
	}

	#[cfg(test)]
	fn queue_len(&self) -> usize {
		match &*self.0.lock() {
			CycleState::Idle => 0,
			CycleState::Refreshing { waiters, .. } => waiters.len(),
		}
	}

	/// Starts a cycle with the refresh built by `start` when idle, otherwise queues the caller.
	///
	/// The check and the transition happen under one lock acquisition, so two callers can never
	/// both observe `Idle`. A cycle whose callers have all gone away counts as idle; its queue
	/// only holds closed slots. `start` only builds the future; nothing runs until a caller polls
	/// it.
	pub(crate) fn join<F>(&self, start: F) -> Admission
	where
		F: FnOnce() -> BoxFuture<'static, RefreshOutcome>,
	{
		let mut state = self.0.lock();

		let queued = match &mut *state {
			CycleState::Idle => None,
			CycleState::Refreshing { refresh, waiters } => refresh.upgrade().map(|refresh| {
				let (tx, rx) = oneshot::channel();

				waiters.push_back(tx);

				Ticket { rx, refresh }
			}),
		};

		if let Some(ticket) = queued {
			return Admission::Queued(ticket);
		}

		let refresh = start().shared();

		*state = refresh.downgrade().map_or(CycleState::Idle, |weak| CycleState::Refreshing {
			refresh: weak,
			waiters: VecDeque::new(),
		});

		Admission::Leader(refresh)
	}

	/// Returns the cycle to idle and settles every queued slot in FIFO order.
	pub(crate) fn settle(&self, outcome: &RefreshOutcome) {
		let state = std::mem::take(&mut *self.0.lock());

		if let CycleState::Refreshing { waiters, .. } = state {
			for tx in waiters {
				let _ = tx.send(outcome.clone());
			}
		}
	}
}
