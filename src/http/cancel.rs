//! Runtime-agnostic cancellation signal attached to requests.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use futures::{
	FutureExt,
	channel::oneshot,
	future::{self, Shared},
};
// self
use crate::_prelude::*;

/// Creates a connected cancel handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
	let (tx, rx) = oneshot::channel();
	let flag = Arc::new(AtomicBool::new(false));
	let handle = CancelHandle { flag: flag.clone(), tx: Arc::new(Mutex::new(Some(tx))) };
	let signal = CancelSignal { flag, rx: rx.shared() };

	(handle, signal)
}

/// Owner side of a cancellation signal.
#[derive(Clone, Debug)]
pub struct CancelHandle {
	flag: Arc<AtomicBool>,
	tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}
impl CancelHandle {
	/// Fires the signal. Repeated calls are no-ops.
	pub fn cancel(&self) {
		self.flag.store(true, Ordering::Release);

		if let Some(tx) = self.tx.lock().take() {
			let _ = tx.send(());
		}
	}
}

/// Cloneable observer side of a cancellation signal.
///
/// Dropping every [`CancelHandle`] without cancelling leaves the signal pending forever.
#[derive(Clone)]
pub struct CancelSignal {
	flag: Arc<AtomicBool>,
	rx: Shared<oneshot::Receiver<()>>,
}
impl CancelSignal {
	/// Returns `true` once the handle has fired.
	pub fn is_cancelled(&self) -> bool {
		self.flag.load(Ordering::Acquire)
	}

	/// Resolves when the handle fires.
	pub async fn cancelled(&self) {
		if self.rx.clone().await.is_err() {
			future::pending::<()>().await;
		}
	}
}
impl Debug for CancelSignal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CancelSignal").field("cancelled", &self.is_cancelled()).finish()
	}
}
