use std::sync::LazyLock;

use regex::Regex;

use crate::message::{Message, Role};

/// Literal text appended as a synthetic `user` message to nudge a model past
/// an "incomplete intent" response. Counting occurrences of this exact
/// string in the recent history is how the retry cap is enforced.
pub const RETRY_PROMPT: &str = "请执行你提到的操作，不要只是描述。";

const MAX_RETRIES: usize = 2;
const RETRY_LOOKBACK: usize = 10;

// `regex` operates on Unicode scalar values, not bytes, so the full-width
// colon (U+FF1A) and the CJK phrase family match correctly without any
// special-casing.
static ENDS_WITH_FULLWIDTH_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{FF1A}\s*$").expect("valid regex"));
static ENDS_WITH_ASCII_COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\s+$").expect("valid regex"));
static ENDS_WITH_ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{3}\s+$").expect("valid regex"));
static CHINESE_INTENT_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"让我(先|来|开始|查看|检查|修复)").expect("valid regex"));
static LET_ME_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Let me (first|start|check|look|fix)").expect("valid regex"));

/// Whether `content` announces intent without calling a tool, per the
/// pattern set.
pub fn is_incomplete_intent(content: &str) -> bool {
    ENDS_WITH_FULLWIDTH_COLON.is_match(content)
        || ENDS_WITH_ASCII_COLON.is_match(content)
        || ENDS_WITH_ELLIPSIS.is_match(content)
        || CHINESE_INTENT_PHRASE.is_match(content)
        || LET_ME_PHRASE.is_match(content)
}

/// Counts retry-prompt messages among the most recent [`RETRY_LOOKBACK`]
/// messages.
fn recent_retry_count(messages: &[Message]) -> usize {
    messages
        .iter()
        .rev()
        .take(RETRY_LOOKBACK)
        .filter(|m| m.has_role(Role::User) && m.content == RETRY_PROMPT)
        .count()
}

/// Whether the loop should append [`RETRY_PROMPT`] and re-run the turn
/// instead of treating `content` as the final answer.
pub fn should_retry(content: &str, messages: &[Message]) -> bool {
    is_incomplete_intent(content) && recent_retry_count(messages) < MAX_RETRIES
}
