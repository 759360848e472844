use askweb_core::error::AppError;
use askweb_core::models::{Conversation, NewConversation};
use askweb_core::traits::ConversationStore;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;

/// Repository for conversation persistence in SQLite.
///
/// The table name is validated by [`crate::Database`] before a repository is
/// handed out.
#[derive(Clone)]
pub struct ConversationRepository {
    pool: SqlitePool,
    table: String,
}

impl ConversationRepository {
    pub(crate) fn new(pool: SqlitePool, table: &str) -> Self {
        Self {
            pool,
            table: table.to_string(),
        }
    }

    /// Insert one conversation. Returns the generated id.
    pub async fn save(&self, conversation: &NewConversation) -> Result<i64, AppError> {
        let results = conversation.results_json()?;

        let result = sqlx::query(&format!(
            "INSERT INTO {} (query, results, summary) VALUES (?, ?, ?)",
            self.table
        ))
        .bind(&conversation.query)
        .bind(&results)
        .bind(&conversation.summary)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, urls = conversation.result_urls.len(), "Conversation saved");
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Conversation>, AppError> {
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "{} WHERE id = ?",
            self.select()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(Conversation::try_from).transpose()
    }

    /// Conversations whose summary contains `needle` (case-insensitive for
    /// ASCII), newest first. `%` and `_` in `needle` match literally.
    pub async fn search(&self, needle: &str) -> Result<Vec<Conversation>, AppError> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            "{} WHERE summary LIKE ? ESCAPE '\\' ORDER BY timestamp DESC, id DESC",
            self.select()
        ))
        .bind(format!("%{}%", escape_like(needle)))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(Conversation::try_from).collect()
    }

    /// The latest `limit` conversations, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<Conversation>, AppError> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            "{} ORDER BY timestamp DESC, id DESC LIMIT ?",
            self.select()
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(Conversation::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    // Older files stored `results` as a blob; the cast reads both forms.
    fn select(&self) -> String {
        format!(
            "SELECT id, timestamp, query, CAST(results AS TEXT) AS results, summary FROM {}",
            self.table
        )
    }
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ConversationRow {
    id: i64,
    timestamp: NaiveDateTime,
    query: String,
    results: String,
    summary: String,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = AppError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        Ok(Conversation {
            id: row.id,
            timestamp: row.timestamp,
            query: row.query,
            result_urls: serde_json::from_str(&row.results)?,
            summary: row.summary,
        })
    }
}

// -- Trait implementation --

impl ConversationStore for ConversationRepository {
    async fn save(&self, conversation: &NewConversation) -> Result<i64, AppError> {
        ConversationRepository::save(self, conversation).await
    }

    async fn get(&self, id: i64) -> Result<Option<Conversation>, AppError> {
        ConversationRepository::get(self, id).await
    }

    async fn search(&self, needle: &str) -> Result<Vec<Conversation>, AppError> {
        ConversationRepository::search(self, needle).await
    }
}
