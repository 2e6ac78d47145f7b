use crate::errors::ApiError;
use crate::models::RequestStatus;
use crate::privacy::budget::UserBudget;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use uuid::Uuid;
use zk_credentials::types::ProofArtifact;

pub type Db = Pool<Sqlite>;

pub async fn connect(db_url: &str) -> Result<Db, ApiError> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(|_| ApiError::Internal)
}

pub async fn init_schema(db: &Db) -> Result<(), ApiError> {
    // NOTE: Keep schema minimal and explicit. Issued credentials are
    // append-only; budgets are the only rows that update in place.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS requests (
  id TEXT PRIMARY KEY,
  user TEXT NOT NULL,
  created_at TEXT NOT NULL,
  status TEXT NOT NULL,
  error TEXT
);

CREATE TABLE IF NOT EXISTS credentials (
  id TEXT PRIMARY KEY,
  request_id TEXT NOT NULL,
  user TEXT NOT NULL,
  circuit_id TEXT NOT NULL,
  credential_hash TEXT NOT NULL,
  artifact_json TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS budgets (
  user TEXT PRIMARY KEY,
  total_milli INTEGER NOT NULL,
  consumed_milli INTEGER NOT NULL,
  by_category_json TEXT NOT NULL
);
"#,
    )
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(())
}

pub async fn insert_request(db: &Db, request_id: Uuid, user: &str) -> Result<(), ApiError> {
    sqlx::query(
        r#"INSERT INTO requests (id, user, created_at, status) VALUES (?, ?, ?, ?)"#,
    )
    .bind(request_id.to_string())
    .bind(user)
    .bind(Utc::now().to_rfc3339())
    .bind("analyzing")
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub fn status_str(status: &RequestStatus) -> &'static str {
    match status {
        RequestStatus::Analyzing => "analyzing",
        RequestStatus::Proving => "proving",
        RequestStatus::Ready => "ready",
        RequestStatus::Failed => "failed",
    }
}

pub async fn set_request_status(
    db: &Db,
    request_id: Uuid,
    status: RequestStatus,
) -> Result<(), ApiError> {
    sqlx::query(r#"UPDATE requests SET status = ? WHERE id = ?"#)
        .bind(status_str(&status))
        .bind(request_id.to_string())
        .execute(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub async fn set_request_failed(db: &Db, request_id: Uuid, error: &str) -> Result<(), ApiError> {
    sqlx::query(r#"UPDATE requests SET status = 'failed', error = ? WHERE id = ?"#)
        .bind(error)
        .bind(request_id.to_string())
        .execute(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    Ok(())
}

#[allow(clippy::type_complexity)]
pub async fn get_request(
    db: &Db,
    request_id: Uuid,
) -> Result<Option<(DateTime<Utc>, String, String, Option<String>)>, ApiError> {
    let row = sqlx::query(
        r#"SELECT created_at, user, status, error FROM requests WHERE id = ?"#,
    )
    .bind(request_id.to_string())
    .fetch_optional(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let created_at: String = row.get(0);
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|_| ApiError::Internal)?
        .with_timezone(&Utc);

    Ok(Some((created_at, row.get(1), row.get(2), row.get(3))))
}

pub async fn insert_artifact(
    db: &Db,
    request_id: Uuid,
    user: &str,
    artifact: &ProofArtifact,
) -> Result<(), ApiError> {
    let artifact_json = serde_json::to_string(artifact).map_err(|_| ApiError::Internal)?;
    sqlx::query(
        r#"INSERT INTO credentials (id, request_id, user, circuit_id, credential_hash, artifact_json, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(request_id.to_string())
    .bind(user)
    .bind(artifact.circuit_id.as_str())
    .bind(&artifact.credential_hash.hex)
    .bind(artifact_json)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub async fn list_artifacts_for_request(
    db: &Db,
    request_id: Uuid,
) -> Result<Vec<ProofArtifact>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT artifact_json FROM credentials WHERE request_id = ? ORDER BY created_at"#,
    )
    .bind(request_id.to_string())
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    rows.into_iter()
        .map(|row| {
            let json: String = row.get(0);
            serde_json::from_str(&json).map_err(|_| ApiError::Internal)
        })
        .collect()
}

pub async fn list_artifacts_for_user(db: &Db, user: &str) -> Result<Vec<ProofArtifact>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT artifact_json FROM credentials WHERE user = ? ORDER BY created_at"#,
    )
    .bind(user)
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    rows.into_iter()
        .map(|row| {
            let json: String = row.get(0);
            serde_json::from_str(&json).map_err(|_| ApiError::Internal)
        })
        .collect()
}

pub async fn save_budget(db: &Db, user: &str, budget: &UserBudget) -> Result<(), ApiError> {
    let by_category =
        serde_json::to_string(&budget.by_category).map_err(|_| ApiError::Internal)?;
    sqlx::query(
        r#"INSERT INTO budgets (user, total_milli, consumed_milli, by_category_json)
           VALUES (?, ?, ?, ?)
           ON CONFLICT(user) DO UPDATE SET
             total_milli = excluded.total_milli,
             consumed_milli = excluded.consumed_milli,
             by_category_json = excluded.by_category_json"#,
    )
    .bind(user)
    .bind(budget.total_milli as i64)
    .bind(budget.consumed_milli as i64)
    .bind(by_category)
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub async fn load_budgets(db: &Db) -> Result<Vec<(String, UserBudget)>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT user, total_milli, consumed_milli, by_category_json FROM budgets"#,
    )
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    rows.into_iter()
        .map(|row| {
            let user: String = row.get(0);
            let total_milli: i64 = row.get(1);
            let consumed_milli: i64 = row.get(2);
            let by_category_json: String = row.get(3);
            let by_category =
                serde_json::from_str(&by_category_json).map_err(|_| ApiError::Internal)?;
            Ok((
                user,
                UserBudget {
                    total_milli: total_milli as u64,
                    consumed_milli: consumed_milli as u64,
                    by_category,
                },
            ))
        })
        .collect()
}
