use std::thread::{self, JoinHandle};

/// Spawns a named OS thread, truncating the name to the platform limit (15
/// bytes on Linux) so `thread::Builder` never rejects it.
pub fn spawn_named_thread<S, F>(name: S, f: F) -> JoinHandle<()>
where
    S: AsRef<str>,
    F: FnOnce() + Send + 'static,
{
    let mut truncated = name.as_ref().to_string();
    truncated.truncate(15);
    thread::Builder::new()
        .name(truncated)
        .spawn(f)
        .expect("failed to spawn OS thread")
}
