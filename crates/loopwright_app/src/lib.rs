//! Reference wiring from the loop core to a persistent journal: a JSONL
//! [`Journal`] implementation, hooks that write through it, and an
//! LLM-backed [`loopwright_domain::CompactionService`]. None of this is
//! required by `loopwright_domain` itself — it's one way to satisfy its
//! collaborator traits, the one the CLI uses by default.

mod compaction_service;
mod journal_hooks;
mod jsonl_journal;
mod session;

pub use compaction_service::LlmCompactionService;
pub use journal_hooks::JournalHooks;
pub use jsonl_journal::JsonlJournal;
pub use loopwright_domain::Journal;
pub use session::{journaled_compaction_coordinator, journaled_hooks};
