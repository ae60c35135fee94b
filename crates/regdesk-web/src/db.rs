use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regdesk_core::{DocumentKind, NewRegistration, RegistrationRecord, RegistrationSummary};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS registrations (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT NOT NULL,
    email             TEXT NOT NULL,
    contact           TEXT NOT NULL,
    program           TEXT NOT NULL,
    semester          TEXT NOT NULL,
    rollno            TEXT NOT NULL,
    event             TEXT NOT NULL,
    team              TEXT,
    user_id           TEXT,
    transaction_id    TEXT NOT NULL,
    account_no        TEXT NOT NULL,
    identity_document BLOB,
    payment_slip      BLOB,
    created_at        TEXT NOT NULL,
    UNIQUE (email, event)
);
CREATE INDEX IF NOT EXISTS registrations_created_at ON registrations (created_at);
"#;

const RECORD_COLUMNS: &str = "id, name, email, contact, program, semester, rollno, event, team, \
                              transaction_id, account_no, created_at";

/// Result of [`RegistrationStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(i64),
    /// The same email is already registered for this event.
    Duplicate,
}

#[derive(Clone)]
pub struct RegistrationStore {
    pool: SqlitePool,
}

impl RegistrationStore {
    /// Opens (creating if needed) the SQLite database at `url` and ensures the schema.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database url: {url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to open registration database")?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .context("Failed to create registration schema")?;

        Ok(Self { pool })
    }

    pub async fn insert(&self, reg: &NewRegistration) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r"
            INSERT INTO registrations
            (name, email, contact, program, semester, rollno, event, team, user_id,
             transaction_id, account_no, identity_document, payment_slip, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&reg.name)
        .bind(&reg.email)
        .bind(&reg.contact)
        .bind(&reg.program)
        .bind(&reg.semester)
        .bind(&reg.rollno)
        .bind(&reg.event)
        .bind(&reg.team)
        .bind(&reg.user_id)
        .bind(&reg.transaction_id)
        .bind(&reg.account_no)
        .bind(&reg.identity_document)
        .bind(&reg.payment_slip)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(InsertOutcome::Created(done.last_insert_rowid())),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e).context("Failed to insert registration"),
        }
    }

    /// All registrations, newest first, with document presence flags.
    pub async fn list(&self) -> Result<Vec<RegistrationSummary>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}, \
             COALESCE(length(identity_document), 0) > 0 AS has_identity_document, \
             COALESCE(length(payment_slip), 0) > 0 AS has_payment_slip \
             FROM registrations ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list registrations")?;

        rows.iter()
            .map(|row| -> Result<RegistrationSummary> {
                Ok(RegistrationSummary {
                    record: record_from_row(row)?,
                    has_identity_document: row.try_get("has_identity_document")?,
                    has_payment_slip: row.try_get("has_payment_slip")?,
                })
            })
            .collect()
    }

    /// All registrations, newest first, without document bytes.
    pub async fn list_for_export(&self) -> Result<Vec<RegistrationRecord>> {
        let sql =
            format!("SELECT {RECORD_COLUMNS} FROM registrations ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list registrations")?;

        rows.iter()
            .map(|row| record_from_row(row).map_err(anyhow::Error::from))
            .collect()
    }

    /// Stored bytes of one document.
    ///
    /// `None` when the registration does not exist, `Some(None)` when it has
    /// no such document.
    pub async fn document(&self, id: i64, kind: DocumentKind) -> Result<Option<Option<Vec<u8>>>> {
        let column = match kind {
            DocumentKind::IdentityCard => "identity_document",
            DocumentKind::PaymentSlip => "payment_slip",
        };
        let row = sqlx::query(&format!("SELECT {column} FROM registrations WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch document")?;

        match row {
            Some(row) => {
                let data: Option<Vec<u8>> = row.try_get(0)?;
                Ok(Some(data.filter(|d| !d.is_empty())))
            }
            None => Ok(None),
        }
    }
}

fn record_from_row(row: &SqliteRow) -> Result<RegistrationRecord, sqlx::Error> {
    Ok(RegistrationRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        contact: row.try_get("contact")?,
        program: row.try_get("program")?,
        semester: row.try_get("semester")?,
        rollno: row.try_get("rollno")?,
        event: row.try_get("event")?,
        team: row.try_get("team")?,
        transaction_id: row.try_get("transaction_id")?,
        account_no: row.try_get("account_no")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn memory_store() -> RegistrationStore {
        RegistrationStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    pub(crate) fn sample(email: &str, event: &str) -> NewRegistration {
        NewRegistration {
            name: "Hamza Ali".to_string(),
            email: email.to_string(),
            contact: "03111111111".to_string(),
            program: "BSAI".to_string(),
            semester: "2".to_string(),
            rollno: "23-AI-11".to_string(),
            event: event.to_string(),
            team: None,
            user_id: Some("u-1".to_string()),
            transaction_id: "TX-1".to_string(),
            account_no: "ACC-1".to_string(),
            identity_document: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01],
            payment_slip: vec![0x89, b'P', b'N', b'G', 0x0D],
        }
    }

    #[tokio::test]
    async fn insert_then_list() {
        let store = memory_store().await;
        let outcome = store
            .insert(&sample("a@example.com", "Hackathon (Fee: 500)"))
            .await
            .unwrap();
        let InsertOutcome::Created(id) = outcome else {
            panic!("expected insert to succeed");
        };

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].record.id, id);
        assert_eq!(list[0].record.team, None);
        assert!(list[0].has_identity_document);
        assert!(list[0].has_payment_slip);
    }

    #[tokio::test]
    async fn duplicate_email_and_event_is_reported() {
        let store = memory_store().await;
        let reg = sample("dup@example.com", "Hackathon (Fee: 500)");
        assert!(matches!(
            store.insert(&reg).await.unwrap(),
            InsertOutcome::Created(_)
        ));
        assert_eq!(store.insert(&reg).await.unwrap(), InsertOutcome::Duplicate);

        let other_event = sample("dup@example.com", "Capture the Flag (Fee: 200)");
        assert!(matches!(
            store.insert(&other_event).await.unwrap(),
            InsertOutcome::Created(_)
        ));
    }

    #[tokio::test]
    async fn records_are_newest_first() {
        let store = memory_store().await;
        store.insert(&sample("first@example.com", "E")).await.unwrap();
        store.insert(&sample("second@example.com", "E")).await.unwrap();

        let records = store.list_for_export().await.unwrap();
        assert_eq!(records[0].email, "second@example.com");
        assert_eq!(records[1].email, "first@example.com");
    }

    #[tokio::test]
    async fn document_lookup() {
        let store = memory_store().await;
        let InsertOutcome::Created(id) = store.insert(&sample("d@example.com", "E")).await.unwrap()
        else {
            panic!("expected insert to succeed");
        };

        let slip = store.document(id, DocumentKind::PaymentSlip).await.unwrap();
        assert_eq!(slip, Some(Some(vec![0x89, b'P', b'N', b'G', 0x0D])));

        let missing = store.document(id + 100, DocumentKind::IdentityCard).await.unwrap();
        assert_eq!(missing, None);
    }
}
