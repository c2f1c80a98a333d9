//! Debounces filesystem events so a burst of writes to one file collapses
//! into a single re-index (spec §5).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub struct Debouncer {
    pending: HashMap<PathBuf, Instant>,
    window: Duration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            window,
        }
    }

    /// Record (or refresh) a pending change for `path`.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    pub fn remove(&mut self, path: &PathBuf) {
        self.pending.remove(path);
    }

    /// Drain and return every path whose debounce window has elapsed.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, recorded)| now.duration_since(**recorded) >= self.window)
            .map(|(path, _)| path.clone())
            .collect();

        for path in &ready {
            self.pending.remove(path);
        }

        ready
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn ready_only_after_window_elapses() {
        let mut deb = Debouncer::new(Duration::from_millis(20));
        deb.record(PathBuf::from("a.rs"));

        assert!(deb.take_ready().is_empty());
        assert!(deb.has_pending());

        sleep(Duration::from_millis(30));
        let ready = deb.take_ready();
        assert_eq!(ready, vec![PathBuf::from("a.rs")]);
        assert!(!deb.has_pending());
    }

    #[test]
    fn re_recording_refreshes_the_window() {
        let mut deb = Debouncer::new(Duration::from_millis(30));
        deb.record(PathBuf::from("a.rs"));
        sleep(Duration::from_millis(20));
        deb.record(PathBuf::from("a.rs"));
        sleep(Duration::from_millis(20));
        assert!(deb.take_ready().is_empty());
    }

    #[test]
    fn remove_cancels_a_pending_change() {
        let mut deb = Debouncer::new(Duration::from_millis(10));
        deb.record(PathBuf::from("a.rs"));
        deb.remove(&PathBuf::from("a.rs"));
        assert_eq!(deb.pending_count(), 0);
    }
}
