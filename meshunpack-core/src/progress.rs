use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Scanning,
    Running,
    Completed,
    Failed,
}

impl Phase {
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::Scanning | Phase::Running)
    }
}

/// Point-in-time copy of the progress record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub running: bool,
    /// `processed / total`, 0 when nothing matched.
    pub progress: f32,
    pub status: String,
    pub total: u64,
    pub processed: u64,
    pub success: u64,
    pub failure: u64,
}

#[derive(Debug)]
struct Record {
    phase: Phase,
    status: String,
    total: u64,
    processed: u64,
    success: u64,
    failure: u64,
}

impl Record {
    fn snapshot(&self) -> Snapshot {
        let progress =
            if self.total > 0 { self.processed as f32 / self.total as f32 } else { 0.0 };
        Snapshot {
            phase: self.phase,
            running: self.phase.is_busy(),
            progress,
            status: self.status.clone(),
            total: self.total,
            processed: self.processed,
            success: self.success,
            failure: self.failure,
        }
    }
}

/// Shared progress record. Every field sits behind one mutex, which is only
/// ever held for field updates or a clone, never across file I/O.
#[derive(Clone, Debug)]
pub struct ProgressState {
    inner: Arc<Mutex<Record>>,
}

impl ProgressState {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Record {
                phase: Phase::Idle,
                status: status.into(),
                total: 0,
                processed: 0,
                success: 0,
                failure: 0,
            })),
        }
    }

    // Updates only assign plain fields; a poisoned record is still consistent.
    fn lock(&self) -> MutexGuard<'_, Record> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Claim the record for a new session. Fails without side effects while
    /// another session is scanning or running.
    pub fn try_begin(&self, status: impl Into<String>) -> bool {
        let mut r = self.lock();
        if r.phase.is_busy() {
            return false;
        }
        r.phase = Phase::Scanning;
        r.status = status.into();
        r.total = 0;
        r.processed = 0;
        r.success = 0;
        r.failure = 0;
        true
    }

    /// Replace the status text without touching phase or counters. Refused
    /// while a session is scanning or running.
    pub fn try_set_status(&self, status: impl Into<String>) -> bool {
        let mut r = self.lock();
        if r.phase.is_busy() {
            return false;
        }
        r.status = status.into();
        true
    }

    /// Scanning finished with `total` jobs; counters start from zero.
    pub fn begin_running(&self, total: u64, status: impl Into<String>) {
        let mut r = self.lock();
        r.phase = Phase::Running;
        r.total = total;
        r.processed = 0;
        r.success = 0;
        r.failure = 0;
        r.status = status.into();
    }

    /// Count one finished job and refresh the status from the new counters,
    /// all in one critical section.
    pub fn record_outcome(&self, ok: bool, status: impl FnOnce(&Snapshot) -> String) {
        let mut r = self.lock();
        if r.processed >= r.total {
            return;
        }
        r.processed += 1;
        if ok {
            r.success += 1;
        } else {
            r.failure += 1;
        }
        let snap = r.snapshot();
        r.status = status(&snap);
    }

    pub fn complete(&self, status: impl Into<String>) {
        let mut r = self.lock();
        r.phase = Phase::Completed;
        r.status = status.into();
    }

    pub fn fail(&self, status: impl Into<String>) {
        let mut r = self.lock();
        r.phase = Phase::Failed;
        r.status = status.into();
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new("Ready")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fraction_is_zero_without_total() {
        let p = ProgressState::default();
        let s = p.snapshot();
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(s.progress, 0.0);
        assert!(!s.running);
    }

    #[test]
    fn begin_rejects_while_busy() {
        let p = ProgressState::default();
        assert!(p.try_begin("scan"));
        assert!(!p.try_begin("again"));
        assert_eq!(p.snapshot().status, "scan");
        p.begin_running(1, "run");
        assert!(!p.try_begin("again"));
        p.record_outcome(true, |_| "done".into());
        p.complete("ok");
        assert!(p.try_begin("next"));
        assert_eq!(p.snapshot().processed, 0);
    }

    #[test]
    fn status_is_kept_while_busy() {
        let p = ProgressState::default();
        assert!(p.try_set_status("idle note"));
        p.try_begin("scanning");
        assert!(!p.try_set_status("clobber"));
        assert_eq!(p.snapshot().status, "scanning");
    }

    #[test]
    fn outcomes_never_exceed_total() {
        let p = ProgressState::default();
        p.try_begin("scan");
        p.begin_running(2, "run");
        for ok in [true, false, true] {
            p.record_outcome(ok, |s| format!("{}/{}", s.processed, s.total));
        }
        let s = p.snapshot();
        assert_eq!((s.processed, s.success, s.failure), (2, 1, 1));
        assert_eq!(s.status, "2/2");
        assert_eq!(s.progress, 1.0);
    }

    #[test]
    fn concurrent_readers_see_consistent_counters() {
        let p = ProgressState::default();
        p.try_begin("scan");
        p.begin_running(5_000, "run");
        let reader = {
            let p = p.clone();
            thread::spawn(move || {
                let mut last = 0;
                loop {
                    let s = p.snapshot();
                    assert_eq!(s.success + s.failure, s.processed);
                    assert!(s.processed <= s.total);
                    assert!(s.processed >= last);
                    last = s.processed;
                    if s.phase == Phase::Completed {
                        return s;
                    }
                }
            })
        };
        for i in 0..5_000u64 {
            p.record_outcome(i % 7 != 0, |s| format!("{}", s.processed));
        }
        p.complete("done");
        let fin = reader.join().unwrap();
        assert_eq!(fin.processed, fin.total);
        assert!(!fin.running);
    }
}
