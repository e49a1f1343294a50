use anyhow::Result;
use async_trait::async_trait;
use shared::SchoolProfile;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::traits::ProfileStorage;

#[derive(Clone)]
pub struct ProfileRepository {
    db: DbConnection,
}

impl ProfileRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_profile(r: &SqliteRow) -> Result<SchoolProfile> {
        Ok(SchoolProfile {
            owner_id: r.try_get("owner_id")?,
            school_name: r.try_get("school_name")?,
            address: r.try_get("address")?,
            phone: r.try_get("phone")?,
            email: r.try_get("email")?,
            logo_path: r.try_get("logo_path")?,
            session_year: r.try_get("session_year")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ProfileStorage for ProfileRepository {
    async fn get_profile(&self, owner_id: &str) -> Result<Option<SchoolProfile>> {
        let row = sqlx::query(
            "SELECT owner_id, school_name, address, phone, email, logo_path, session_year, updated_at FROM profiles WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_profile).transpose()
    }

    async fn upsert_profile(&self, profile: &SchoolProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (owner_id, school_name, address, phone, email, logo_path, session_year, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_id) DO UPDATE SET
                school_name = excluded.school_name,
                address = excluded.address,
                phone = excluded.phone,
                email = excluded.email,
                logo_path = excluded.logo_path,
                session_year = excluded.session_year,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.owner_id)
        .bind(&profile.school_name)
        .bind(&profile.address)
        .bind(&profile.phone)
        .bind(&profile.email)
        .bind(&profile.logo_path)
        .bind(profile.session_year)
        .bind(&profile.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
