pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task already activated")]
    AlreadyActivated,

    #[error("task not activated")]
    NotActivated,

    #[error("wait already in progress")]
    WaitInProgress,

    #[error("thread creation failed: created {created} of {requested} threads")]
    ThreadCreationFailed { requested: usize, created: usize },

    #[error("calling thread has no assigned processor id")]
    InvalidProcessorId,

    #[error("unknown thread group")]
    UnknownThreadGroup,

    #[error("thread limit reached ({0} threads)")]
    ThreadLimitReached(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ThreadCreationFailed {
            requested: 5,
            created: 2,
        };
        assert_eq!(
            err.to_string(),
            "thread creation failed: created 2 of 5 threads"
        );

        assert_eq!(Error::AlreadyActivated.to_string(), "task already activated");
        assert_eq!(
            Error::config("bad value").to_string(),
            "config error: bad value"
        );
    }
}
