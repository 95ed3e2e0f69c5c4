use std::sync::{Arc, Condvar, Mutex};

/// A cloneable cancellation token backed by a `Mutex<bool>` + `Condvar`.
///
/// Cloned handles all observe the same cancellation flag. Threads block on
/// [`Context::wait`] until [`Context::cancel_all`] flips the flag, at which
/// point every waiter wakes up.
#[derive(Clone)]
pub struct Context<T> {
    inner: Arc<(Mutex<T>, Condvar)>,
}

impl Context<bool> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub fn get_lock_cvar(ctx: &Self) -> &(Mutex<bool>, Condvar) {
        &ctx.inner
    }

    /// Sets the cancellation flag and wakes every waiter.
    pub fn cancel_all(&self, value: bool) -> Result<(), String> {
        let (lock, cvar) = &*self.inner;
        let mut guard = lock.lock().map_err(|e| e.to_string())?;
        *guard = value;
        cvar.notify_all();
        Ok(())
    }

    /// Resets the cancellation flag to `false` without waking anyone.
    pub fn reset(&self) -> Result<(), String> {
        let (lock, _) = &*self.inner;
        let mut guard = lock.lock().map_err(|e| e.to_string())?;
        *guard = false;
        Ok(())
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap()
    }

    /// Blocks until cancelled.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap();
        let _unused = cvar.wait_while(guard, |cancelled| !*cancelled).unwrap();
    }
}

impl Default for Context<bool> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn cancel_all_wakes_waiters() {
        let ctx = Context::<bool>::new();
        let waiter_ctx = ctx.clone();
        let handle = thread::spawn(move || {
            waiter_ctx.wait();
        });
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());
        ctx.cancel_all(true).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn reset_does_not_cancel() {
        let ctx = Context::<bool>::new();
        ctx.cancel_all(true).unwrap();
        ctx.reset().unwrap();
        assert!(!ctx.is_cancelled());
    }
}
