/// The unit message sent down a thread's stop channel to request shutdown.
pub type CancellationMessage = ();
