use super::retry::sync_with_retry;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use streak_core::{error::StreakError, traits::SyncGateway};

/// Gateway stub that fails the first `failures` calls, then succeeds.
struct StubGateway {
    calls: AtomicU32,
    failures: u32,
}

impl StubGateway {
    fn failing(failures: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures,
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncGateway for StubGateway {
    fn name(&self) -> &str {
        "stub"
    }

    async fn sync_file(&self, _local_path: &Path, _remote_name: &str) -> Result<(), StreakError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(StreakError::Sync(format!("injected failure {}", n + 1)))
        } else {
            Ok(())
        }
    }
}

const DELAY: Duration = Duration::from_millis(1);

#[tokio::test]
async fn test_succeeds_first_try() {
    let stub = StubGateway::failing(0);
    assert!(sync_with_retry(&stub, Path::new("/tmp/plan.json"), "plan.json", 3, DELAY).await);
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_fail_twice_then_succeed() {
    let stub = StubGateway::failing(2);
    assert!(sync_with_retry(&stub, Path::new("/tmp/plan.json"), "plan.json", 3, DELAY).await);
    assert_eq!(stub.calls(), 3);
}

#[tokio::test]
async fn test_all_attempts_exhausted() {
    let stub = StubGateway::failing(u32::MAX);
    assert!(!sync_with_retry(&stub, Path::new("/tmp/plan.json"), "plan.json", 3, DELAY).await);
    // Exactly 3 invocations, no panic, no propagated error.
    assert_eq!(stub.calls(), 3);
}

#[tokio::test]
async fn test_single_attempt() {
    let stub = StubGateway::failing(1);
    assert!(!sync_with_retry(&stub, Path::new("/tmp/plan.json"), "plan.json", 1, DELAY).await);
    assert_eq!(stub.calls(), 1);
}
