mod attempt_completion;
mod fs_read;
mod fs_write;
mod shell;

pub use attempt_completion::AttemptCompletion;
pub use fs_read::ReadFile;
pub use fs_write::WriteFile;
pub use shell::Shell;
