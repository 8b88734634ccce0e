//! Rollback of modified manifest files when the user interrupts a release.
//!
//! Armed guards register their action with a process-wide registry. The first
//! guard starts a listener thread waiting for Ctrl-C; on interrupt it runs every
//! registered action and exits with status 130.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once, OnceLock};
use std::thread;

/// Exit status after an interrupt (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

pub type RollbackAction = Arc<dyn Fn() + Send + Sync>;

type Registry = Mutex<Vec<(u64, RollbackAction)>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

fn next_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

fn register(id: u64, action: RollbackAction) {
    if let Ok(mut actions) = registry().lock() {
        actions.push((id, action));
    }
}

fn deregister(id: u64) {
    if let Ok(mut actions) = registry().lock() {
        actions.retain(|(registered, _)| *registered != id);
    }
}

/// Number of guards currently armed in this process
pub fn armed_count() -> usize {
    registry().lock().map(|a| a.len()).unwrap_or_default()
}

fn run_registered() {
    // Cloned out so an action can't deadlock on the registry
    let actions: Vec<RollbackAction> = registry()
        .lock()
        .map(|a| a.iter().map(|(_, action)| Arc::clone(action)).collect())
        .unwrap_or_default();
    for action in actions {
        action();
    }
}

fn ensure_listener() {
    static LISTENER: Once = Once::new();
    LISTENER.call_once(|| {
        let spawned = thread::Builder::new()
            .name("interrupt-listener".to_string())
            .spawn(|| {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        tracing::debug!(error = %e, "interrupt listener unavailable");
                        return;
                    }
                };
                if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                    tracing::debug!("interrupted, running rollback actions");
                    run_registered();
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            });
        if let Err(e) = spawned {
            tracing::debug!(error = %e, "could not start interrupt listener");
        }
    });
}

/// A registered rollback, scoped to one release run.
///
/// Call [`InterruptGuard::disarm`] once the modified files are committed.
/// Dropping a guard that is still armed means the run failed: the action runs
/// then. The action runs at most once, whatever triggers it.
pub struct InterruptGuard {
    id: u64,
    action: RollbackAction,
    is_armed: bool,
}

impl InterruptGuard {
    pub fn arm(action: RollbackAction) -> Self {
        let has_run = Arc::new(AtomicBool::new(false));
        let action: RollbackAction = Arc::new(move || {
            if !has_run.swap(true, Ordering::SeqCst) {
                action();
            }
        });

        let id = next_id();
        ensure_listener();
        register(id, Arc::clone(&action));
        tracing::debug!(id, "interrupt guard armed");

        InterruptGuard {
            id,
            action,
            is_armed: true,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.is_armed
    }

    pub fn disarm(mut self) {
        deregister(self.id);
        self.is_armed = false;
        tracing::debug!(id = self.id, "interrupt guard disarmed");
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if self.is_armed {
            deregister(self.id);
            (self.action)();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::AtomicUsize;

    fn counting_action() -> (RollbackAction, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let action: RollbackAction = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (action, count)
    }

    #[test]
    #[serial]
    fn test_disarm_deregisters_without_running() {
        let before = armed_count();
        let (action, count) = counting_action();

        let guard = InterruptGuard::arm(action);
        assert!(guard.is_armed());
        assert_eq!(armed_count(), before + 1);

        guard.disarm();
        assert_eq!(armed_count(), before);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[serial]
    fn test_drop_while_armed_runs_once() {
        let before = armed_count();
        let (action, count) = counting_action();

        {
            let _guard = InterruptGuard::arm(action);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(armed_count(), before);
    }

    #[test]
    #[serial]
    fn test_action_is_idempotent() {
        let (action, count) = counting_action();
        let guard = InterruptGuard::arm(action);

        run_registered();
        run_registered();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(guard);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[serial]
    fn test_no_leak_across_runs() {
        let before = armed_count();
        for _ in 0..3 {
            let (action, _) = counting_action();
            InterruptGuard::arm(action).disarm();
        }
        assert_eq!(armed_count(), before);
    }
}
