// --------------------------------------------------
// SQLite-backed persistence.
//
// - Store: owns the connection, creates the schema
// - Document store: settings(key, value) rows holding JSON documents
// - Address book: index-addressed edits of the address_book document
//
// Every write runs inside one transaction: whole document or nothing.
// Task and profile registries live in their own modules as impl Store blocks.
// --------------------------------------------------

use std::{collections::BTreeMap, fs, path::Path};

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::logic;
use crate::models::{AddressEntry, DocKey, Document, ThemeColors};

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    // Open (or create) the database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!("Opening database at: {:?}", path);

        let conn = Connection::open(path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // Run `f` inside a transaction and commit only if it succeeds
    pub(crate) fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> AppResult<T>) -> AppResult<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&Connection) -> AppResult<T>) -> AppResult<T> {
        let conn = self.conn.lock();
        f(&conn)
    }

    // -----------------------------
    // Document store
    // -----------------------------

    // Stored document, or the key's default if it was never written
    pub fn get_document(&self, key: DocKey) -> AppResult<Document> {
        self.read(|conn| load_document(conn, key))
    }

    // Overwrite the document stored under its key
    pub fn put_document(&self, doc: &Document) -> AppResult<()> {
        self.write(|tx| save_document(tx, doc))
    }

    pub fn global_accounts(&self) -> AppResult<Vec<String>> {
        let Document::AccountList(list) = self.get_document(DocKey::GlobalAccounts)? else {
            return Err(mismatch(DocKey::GlobalAccounts));
        };
        Ok(list)
    }

    // Replace the account template from comma separated text
    pub fn put_global_accounts(&self, text: &str) -> AppResult<Vec<String>> {
        let accounts = logic::parse_account_list(text);
        self.put_document(&Document::AccountList(accounts.clone()))?;
        info!(count = accounts.len(), "account template replaced");
        Ok(accounts)
    }

    pub fn theme(&self) -> AppResult<ThemeColors> {
        let Document::Theme(theme) = self.get_document(DocKey::Theme)? else {
            return Err(mismatch(DocKey::Theme));
        };
        Ok(theme)
    }

    pub fn put_theme(&self, theme: ThemeColors) -> AppResult<ThemeColors> {
        self.put_document(&Document::Theme(theme.clone()))?;
        Ok(theme)
    }

    pub fn defaults(&self) -> AppResult<BTreeMap<String, String>> {
        let Document::Defaults(map) = self.get_document(DocKey::Defaults)? else {
            return Err(mismatch(DocKey::Defaults));
        };
        Ok(map)
    }

    pub fn put_defaults(
        &self,
        map: BTreeMap<String, String>,
    ) -> AppResult<BTreeMap<String, String>> {
        self.put_document(&Document::Defaults(map.clone()))?;
        Ok(map)
    }

    // -----------------------------
    // Address book (positional)
    //
    // Positions are the only identity an entry has. Removing an entry
    // shifts every later entry down by one.
    // -----------------------------

    pub fn address_book(&self) -> AppResult<Vec<AddressEntry>> {
        self.read(|conn| load_address_book(conn))
    }

    pub fn append_entry(&self, entry: AddressEntry) -> AppResult<Vec<AddressEntry>> {
        logic::require_text("name", &entry.name)?;
        self.edit_address_book(|book| {
            book.push(entry);
            Ok(())
        })
    }

    pub fn replace_entry(&self, index: i64, entry: AddressEntry) -> AppResult<Vec<AddressEntry>> {
        logic::require_text("name", &entry.name)?;
        self.edit_address_book(|book| {
            let pos = logic::checked_position(index, book.len())?;
            book[pos] = entry;
            Ok(())
        })
    }

    pub fn remove_entry(&self, index: i64) -> AppResult<Vec<AddressEntry>> {
        self.edit_address_book(|book| {
            let pos = logic::checked_position(index, book.len())?;
            book.remove(pos);
            Ok(())
        })
    }

    // Load, edit in memory, write back. An Err from `edit` rolls back.
    fn edit_address_book(
        &self,
        edit: impl FnOnce(&mut Vec<AddressEntry>) -> AppResult<()>,
    ) -> AppResult<Vec<AddressEntry>> {
        self.write(|tx| {
            let mut book = load_address_book(tx)?;
            edit(&mut book)?;
            save_document(tx, &Document::AddressBook(book.clone()))?;
            debug!(len = book.len(), "address book saved");
            Ok(book)
        })
    }
}

fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            remark TEXT NOT NULL DEFAULT '',
            target_accounts TEXT NOT NULL DEFAULT '[]',
            done_accounts TEXT NOT NULL DEFAULT '[]',
            stats_enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            avatar TEXT NOT NULL,
            remark TEXT NOT NULL DEFAULT '',
            account_number TEXT NOT NULL DEFAULT '',
            link TEXT NOT NULL DEFAULT ''
        );
        "#,
    )?;
    Ok(())
}

fn load_document(conn: &Connection, key: DocKey) -> AppResult<Document> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(text) => Ok(Document::from_json(key, &text)?),
        None => Ok(Document::default_for(key)),
    }
}

fn save_document(conn: &Connection, doc: &Document) -> AppResult<()> {
    let now = chrono::Local::now().fixed_offset().to_rfc3339();
    conn.execute(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        params![doc.key().as_str(), doc.to_json()?, now],
    )?;
    Ok(())
}

fn load_address_book(conn: &Connection) -> AppResult<Vec<AddressEntry>> {
    let Document::AddressBook(book) = load_document(conn, DocKey::AddressBook)? else {
        return Err(mismatch(DocKey::AddressBook));
    };
    Ok(book)
}

fn mismatch(key: DocKey) -> AppError {
    AppError::Corrupt(format!("{} holds a different document", key.as_str()))
}
