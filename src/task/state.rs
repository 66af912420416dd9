use std::fmt;

/// Lifecycle of a task's worker pool.
///
/// `Activate` moves `NotActivated -> Activating`, the last worker to start
/// flips `Activating -> Activated`, and `wait` drives
/// `Activated -> Deactivating -> NotActivated`. A task back in
/// `NotActivated` may be activated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    NotActivated,
    Activating,
    Activated,
    Deactivating,
}

impl TaskState {
    pub fn describe(self) -> &'static str {
        match self {
            TaskState::NotActivated => "NotActivated",
            TaskState::Activating => "Activating",
            TaskState::Activated => "Activated",
            TaskState::Deactivating => "Deactivating",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
