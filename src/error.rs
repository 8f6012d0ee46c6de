use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The backup settings file is missing, unreadable or inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(
        "[env] is required where env in [{}], not {requested:?}",
        .available.join("|")
    )]
    UnknownEnvironment {
        requested: String,
        available: Vec<String>,
    },

    #[error("can't find executable {0}")]
    ExecutableNotFound(String),

    /// Two PostgreSQL installations (64 and 32 bit) provide the tool.
    #[error(
        "more than one executable found when looking for {exe_name}, specify which one to use with the bin-dir setting:\n  - {first}\n  - {second}"
    )]
    AmbiguousExecutable {
        exe_name: String,
        first: String,
        second: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid value {0:?} for keep-one-backup-each, must be week, month or year")]
    InvalidPolicy(String),

    /// The command line never contains the password.
    #[error("database {operation} failed because the system command failed: {command}")]
    SubprocessFailure {
        operation: &'static str,
        command: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
