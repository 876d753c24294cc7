//! Sign-in redirect side effect fired when a refresh cycle fails.
//!
//! The gateway never renders anything itself; it only tells the host application where the
//! sign-in screen lives so the user can authenticate again.

/// Receives the sign-in redirect after a terminal refresh failure.
pub trait SignInNavigator
where
	Self: Send + Sync,
{
	/// Sends the user to the sign-in entry point at `path`.
	fn redirect_to_sign_in(&self, path: &str);
}
impl<F> SignInNavigator for F
where
	F: Fn(&str) + Send + Sync,
{
	fn redirect_to_sign_in(&self, path: &str) {
		self(path)
	}
}

/// Navigator that ignores redirects, for headless callers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl SignInNavigator for NoopNavigator {
	fn redirect_to_sign_in(&self, _path: &str) {}
}
