// --------------------------------------------------
// Profile registry: display profiles with an uploaded avatar.
//
// Same create / update / delete-by-id shape as tasks.
// The avatar is fixed at creation; update never touches it.
// --------------------------------------------------

use rusqlite::{Row, params};
use tracing::info;

use crate::avatar;
use crate::error::{AppError, AppResult};
use crate::logic;
use crate::models::Profile;
use crate::store::Store;

// Editable text fields of a profile
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub name: String,
    pub remark: String,
    pub account_number: String,
    pub link: String,
}

impl Store {
    pub fn list_profiles(&self) -> AppResult<Vec<Profile>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, avatar, remark, account_number, link FROM profiles ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], read_profile)?;

            let mut result = Vec::new();
            for r in rows {
                result.push(r?);
            }
            Ok(result)
        })
    }

    pub fn create_profile(&self, fields: &ProfileFields, avatar_ref: &str) -> AppResult<i64> {
        logic::require_text("name", &fields.name)?;
        avatar::allowed_extension(avatar_ref)?;

        let id = self.write(|tx| {
            tx.execute(
                r#"
                INSERT INTO profiles (name, avatar, remark, account_number, link)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    fields.name,
                    avatar_ref,
                    fields.remark,
                    fields.account_number,
                    fields.link
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        info!(id, name = %fields.name, "profile created");
        Ok(id)
    }

    pub fn update_profile(&self, id: i64, fields: &ProfileFields) -> AppResult<()> {
        logic::require_text("name", &fields.name)?;
        let changed = self.write(|tx| {
            Ok(tx.execute(
                r#"
                UPDATE profiles
                SET name = ?1, remark = ?2, account_number = ?3, link = ?4
                WHERE id = ?5
                "#,
                params![
                    fields.name,
                    fields.remark,
                    fields.account_number,
                    fields.link,
                    id
                ],
            )?)
        })?;

        if changed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // Idempotent; the avatar file is kept
    pub fn delete_profile(&self, id: i64) -> AppResult<bool> {
        let removed =
            self.write(|tx| Ok(tx.execute("DELETE FROM profiles WHERE id = ?1", params![id])?))?;
        Ok(removed > 0)
    }
}

fn read_profile(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        avatar: row.get(2)?,
        remark: row.get(3)?,
        account_number: row.get(4)?,
        link: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::temp_store;

    fn fields(name: &str) -> ProfileFields {
        ProfileFields {
            name: name.into(),
            remark: "r".into(),
            account_number: "001".into(),
            link: "https://example.com".into(),
        }
    }

    #[test]
    fn create_then_list() {
        let (_dir, store) = temp_store();
        let a = store.create_profile(&fields("Alice"), "1-ab-alice.png").unwrap();
        let b = store.create_profile(&fields("Bob"), "2-cd-bob.webp").unwrap();

        let list = store.list_profiles().unwrap();
        assert_eq!(list.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(list[0].avatar, "1-ab-alice.png");
        assert_eq!(list[1].account_number, "001");
    }

    #[test]
    fn create_validates_name_and_avatar() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.create_profile(&fields(""), "a.png"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.create_profile(&fields("Alice"), "a.bmp"),
            Err(AppError::InvalidAvatar(_))
        ));
        assert!(store.list_profiles().unwrap().is_empty());
    }

    #[test]
    fn update_replaces_text_and_keeps_avatar() {
        let (_dir, store) = temp_store();
        let id = store.create_profile(&fields("Alice"), "a.png").unwrap();

        let mut next = fields("Alicia");
        next.link = String::new();
        store.update_profile(id, &next).unwrap();

        let p = &store.list_profiles().unwrap()[0];
        assert_eq!(p.name, "Alicia");
        assert_eq!(p.link, "");
        assert_eq!(p.avatar, "a.png");
    }

    #[test]
    fn update_missing_is_not_found() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.update_profile(3, &fields("x")),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, store) = temp_store();
        let id = store.create_profile(&fields("Alice"), "a.gif").unwrap();
        assert!(store.delete_profile(id).unwrap());
        assert!(!store.delete_profile(id).unwrap());
        assert!(store.list_profiles().unwrap().is_empty());
    }
}
