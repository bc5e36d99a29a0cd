/*
Account list parsing and completion rules.
Module was independently written from storage / Axum for testing
*/

use std::collections::HashSet;

use crate::error::{AppError, AppResult};
use crate::models::{Completion, Task};

// Split free text into an account list.
//
// Rules:
// - separators are ASCII ',' and full-width '，'
// - each piece is trimmed
// - empty pieces are dropped, order is kept
pub fn parse_account_list(text: &str) -> Vec<String> {
    text.split([',', '，'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// Inverse of parse_account_list for entries without commas
pub fn join_account_list(accounts: &[String]) -> String {
    accounts.join(",")
}

// Drop repeated names, first occurrence wins
pub fn dedup_keep_order(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

// Derive completion for a task.
//
// done_count counts target slots whose name is checked. Repeated
// targets count once per slot; done entries that are no longer
// targets count for nothing.
//     total       = len(target_accounts)
//     is_complete = stats_enabled && total > 0 && done_count >= total
pub fn completion(task: &Task) -> Completion {
    let total = task.target_accounts.len();
    let done: HashSet<&str> = task.done_accounts.iter().map(String::as_str).collect();
    let done_count = task
        .target_accounts
        .iter()
        .filter(|t| done.contains(t.as_str()))
        .count();

    Completion {
        total,
        done_count,
        is_complete: task.stats_enabled && total > 0 && done_count >= total,
    }
}

// Turn a client supplied position into a list index
pub fn checked_position(index: i64, len: usize) -> AppResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(AppError::OutOfRange { index, len })
}

// Reject blank required text fields
pub fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(targets: &[&str], done: &[&str], stats_enabled: bool) -> Task {
        Task {
            id: 1,
            content: "http://x".into(),
            remark: String::new(),
            target_accounts: targets.iter().map(|s| s.to_string()).collect(),
            done_accounts: done.iter().map(|s| s.to_string()).collect(),
            stats_enabled,
            created_at: chrono::Local::now().fixed_offset(),
        }
    }

    #[test]
    fn parse_splits_on_both_commas_and_trims() {
        assert_eq!(
            parse_account_list(" a ,b，  c ,, ，d "),
            vec!["a", "b", "c", "d"]
        );
        assert!(parse_account_list(" , ，").is_empty());
        assert!(parse_account_list("").is_empty());
    }

    #[test]
    fn parse_serialize_parse_is_stable() {
        for text in ["账号1，账号2,账号3", "  x , y ,", "solo", "a，，b , c"] {
            let first = parse_account_list(text);
            let second = parse_account_list(&join_account_list(&first));
            assert_eq!(first, second, "input {text:?}");
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let names = vec!["b".to_string(), "a".into(), "b".into()];
        assert_eq!(dedup_keep_order(names), vec!["b", "a"]);
    }

    #[test]
    fn completion_requires_stats_and_targets() {
        assert!(completion(&task(&["a", "b"], &["a", "b"], true)).is_complete);
        assert!(!completion(&task(&["a", "b"], &["a", "b"], false)).is_complete);
        assert!(!completion(&task(&[], &["a"], true)).is_complete);
        assert!(!completion(&task(&["a", "b"], &["a"], true)).is_complete);
    }

    #[test]
    fn stale_done_entries_do_not_count() {
        // "c" was removed from the checklist after being checked
        let c = completion(&task(&["a", "b"], &["a", "c"], true));
        assert_eq!(c.total, 2);
        assert_eq!(c.done_count, 1);
        assert!(!c.is_complete);
    }

    #[test]
    fn repeated_targets_complete_when_checked() {
        let c = completion(&task(&["a", "a"], &["a"], true));
        assert_eq!(c.total, 2);
        assert_eq!(c.done_count, 2);
        assert!(c.is_complete);

        let c = completion(&task(&["a", "a", "b"], &["a"], true));
        assert_eq!(c.done_count, 2);
        assert!(!c.is_complete);
    }

    #[test]
    fn checked_position_bounds() {
        assert_eq!(checked_position(0, 2).unwrap(), 0);
        assert_eq!(checked_position(1, 2).unwrap(), 1);
        assert!(matches!(
            checked_position(2, 2),
            Err(AppError::OutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            checked_position(-1, 2),
            Err(AppError::OutOfRange { index: -1, .. })
        ));
        assert!(checked_position(0, 0).is_err());
    }

    #[test]
    fn require_text_rejects_blank() {
        assert!(require_text("content", "  ").is_err());
        assert!(require_text("content", "note").is_ok());
    }
}
