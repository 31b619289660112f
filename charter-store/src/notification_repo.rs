use async_trait::async_trait;
use charter_core::notification::{Notification, NotificationKind};
use charter_core::repository::NotificationRepository;
use charter_core::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::storage_error;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    kind: String,
    title: String,
    message: String,
    reference: Option<String>,
    acknowledged: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = CoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            kind: NotificationKind::parse(&row.kind)?,
            title: row.title,
            message: row.message,
            reference: row.reference,
            acknowledged: row.acknowledged,
            created_at: row.created_at,
        })
    }
}

pub struct PostgresNotificationRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn add_notification(&self, notification: &Notification) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, kind, title, message, reference, acknowledged, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.reference)
        .bind(notification.acknowledged)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn list_notifications(&self, unread_only: bool) -> CoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, kind, title, message, reference, acknowledged, created_at
            FROM notifications
            WHERE ($1 = FALSE OR acknowledged = FALSE)
            ORDER BY created_at DESC
            "#,
        )
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn acknowledge(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("UPDATE notifications SET acknowledged = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Notification {} not found", id)));
        }
        Ok(())
    }
}
