use crate::error::{Error, Result};
use crate::thread_mgr::ThreadPriority;

/// Per-activation settings for a task's worker pool.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Worker thread count; `None` resolves to the number of logical CPUs.
    pub threads: Option<usize>,
    pub priority: ThreadPriority,
    pub stack_size: Option<usize>,
    pub thread_name_prefix: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            threads: None,
            priority: ThreadPriority::default(),
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "strand-worker".to_string(),
        }
    }
}

impl TaskConfig {
    pub fn builder() -> TaskConfigBuilder {
        TaskConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.threads {
            if n == 0 {
                return Err(Error::config("threads must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("threads too large (max 1024)"));
            }
        }

        if let Some(size) = self.stack_size {
            if size < 64 * 1024 {
                return Err(Error::config("stack_size too small (min 64 KiB)"));
            }
        }

        Ok(())
    }

    /// Resolved worker thread count.
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct TaskConfigBuilder {
    config: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: TaskConfig::default(),
        }
    }

    pub fn threads(mut self, n: usize) -> Self {
        self.config.threads = Some(n);
        self
    }

    pub fn priority(mut self, priority: ThreadPriority) -> Self {
        self.config.priority = priority;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Result<TaskConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
