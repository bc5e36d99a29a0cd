use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// Stored task row. The two account lists live as JSON arrays in TEXT columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub content: String,
    pub remark: String,
    pub target_accounts: Vec<String>,
    pub done_accounts: Vec<String>, // not kept in sync with target_accounts
    pub stats_enabled: bool,
    pub created_at: DateTime<FixedOffset>,
}

// Completion fields computed at read time, never stored
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Completion {
    pub total: usize,
    pub done_count: usize,
    pub is_complete: bool,
}

// What the task list hands to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    #[serde(flatten)]
    pub completion: Completion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AddressEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub avatar: String, // stored filename under the upload dir
    pub remark: String,
    pub account_number: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeColors {
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_card")]
    pub card: String,
    #[serde(default = "default_text")]
    pub text: String,
}

fn default_primary() -> String {
    "#4f46e5".to_string()
}
fn default_background() -> String {
    "#f5f5f7".to_string()
}
fn default_card() -> String {
    "#ffffff".to_string()
}
fn default_text() -> String {
    "#1f2937".to_string()
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            background: default_background(),
            card: default_card(),
            text: default_text(),
        }
    }
}

pub const DEFAULT_GLOBAL_ACCOUNTS: [&str; 3] = ["账号1", "账号2", "账号3"];

// Keys of the settings table. Anything outside this set is never read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKey {
    GlobalAccounts,
    AddressBook,
    Theme,
    Defaults,
}

impl DocKey {
    pub const ALL: [DocKey; 4] = [
        DocKey::GlobalAccounts,
        DocKey::AddressBook,
        DocKey::Theme,
        DocKey::Defaults,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocKey::GlobalAccounts => "global_accounts",
            DocKey::AddressBook => "address_book",
            DocKey::Theme => "theme",
            DocKey::Defaults => "defaults",
        }
    }
}

// One variant per known key, so call sites never re-parse an untyped blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    AccountList(Vec<String>),
    AddressBook(Vec<AddressEntry>),
    Theme(ThemeColors),
    Defaults(BTreeMap<String, String>),
}

impl Document {
    pub fn key(&self) -> DocKey {
        match self {
            Document::AccountList(_) => DocKey::GlobalAccounts,
            Document::AddressBook(_) => DocKey::AddressBook,
            Document::Theme(_) => DocKey::Theme,
            Document::Defaults(_) => DocKey::Defaults,
        }
    }

    // Value observed for a key that has never been written
    pub fn default_for(key: DocKey) -> Self {
        match key {
            DocKey::GlobalAccounts => Document::AccountList(
                DEFAULT_GLOBAL_ACCOUNTS.iter().map(|s| s.to_string()).collect(),
            ),
            DocKey::AddressBook => Document::AddressBook(Vec::new()),
            DocKey::Theme => Document::Theme(ThemeColors::default()),
            DocKey::Defaults => Document::Defaults(BTreeMap::new()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Document::AccountList(v) => serde_json::to_string(v),
            Document::AddressBook(v) => serde_json::to_string(v),
            Document::Theme(v) => serde_json::to_string(v),
            Document::Defaults(v) => serde_json::to_string(v),
        }
    }

    pub fn from_json(key: DocKey, text: &str) -> serde_json::Result<Self> {
        Ok(match key {
            DocKey::GlobalAccounts => Document::AccountList(serde_json::from_str(text)?),
            DocKey::AddressBook => Document::AddressBook(serde_json::from_str(text)?),
            DocKey::Theme => Document::Theme(serde_json::from_str(text)?),
            DocKey::Defaults => Document::Defaults(serde_json::from_str(text)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_has_a_default_with_matching_key() {
        for key in DocKey::ALL {
            assert_eq!(Document::default_for(key).key(), key);
        }
    }

    #[test]
    fn theme_fills_missing_colors_with_defaults() {
        let doc = Document::from_json(DocKey::Theme, r##"{"primary":"#000000"}"##).unwrap();
        let Document::Theme(theme) = doc else {
            panic!("expected theme document");
        };
        assert_eq!(theme.primary, "#000000");
        assert_eq!(theme.card, ThemeColors::default().card);
    }

    #[test]
    fn task_view_flattens_completion() {
        let view = TaskView {
            task: Task {
                id: 7,
                content: "http://x".into(),
                remark: String::new(),
                target_accounts: vec!["a".into()],
                done_accounts: vec![],
                stats_enabled: true,
                created_at: chrono::Local::now().fixed_offset(),
            },
            completion: Completion {
                total: 1,
                done_count: 0,
                is_complete: false,
            },
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["total"], 1);
        assert_eq!(json["is_complete"], false);
    }
}
