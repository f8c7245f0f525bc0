//! Write statements for SeaOrmStore

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, ExprTrait, QueryFilter, TransactionTrait};
use tracing::{debug, info};

use super::converters::{click_to_active_model, new_url_to_active_model};
use super::{SeaOrmStore, retry};
use crate::errors::Result;
use crate::storage::{ClickRecord, InsertOutcome, NewUrl};

use migration::entities::{click, short_url};

/// Some drivers report a skipped `ON CONFLICT DO NOTHING` or a lost
/// unique race as an error rather than zero rows.
fn is_conflict_error(err: &DbErr) -> bool {
    if matches!(err, DbErr::RecordNotInserted) {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("unique") || msg.contains("duplicate") || msg.contains("record not inserted")
}

impl SeaOrmStore {
    pub(super) async fn insert_if_absent(&self, new_url: NewUrl) -> Result<InsertOutcome> {
        let db = &self.db;
        let code = new_url.code.clone();

        let outcome = retry::with_retry(
            &format!("insert_unique({})", code),
            self.retry_config,
            self.timeout_ms,
            || {
                let model = new_url_to_active_model(new_url.clone());
                async move {
                    // ON CONFLICT DO NOTHING 实现原子的 "insert if absent"
                    let result = short_url::Entity::insert(model)
                        .on_conflict(
                            OnConflict::column(short_url::Column::ShortCode)
                                .do_nothing()
                                .to_owned(),
                        )
                        .exec(db)
                        .await;

                    match result {
                        Ok(_) => Ok(InsertOutcome::Inserted),
                        Err(e) if is_conflict_error(&e) => Ok(InsertOutcome::Conflict),
                        Err(e) => Err(e),
                    }
                }
            },
        )
        .await?;

        match outcome {
            InsertOutcome::Inserted => info!("Short link created: {}", code),
            InsertOutcome::Conflict => debug!("Short code already taken: {}", code),
        }
        Ok(outcome)
    }

    pub(super) async fn bump_click_count(
        &self,
        code: &str,
        accessed_at: DateTime<Utc>,
    ) -> Result<()> {
        let db = &self.db;
        retry::with_retry(
            &format!("increment_click({})", code),
            self.retry_config,
            self.timeout_ms,
            || async {
                short_url::Entity::update_many()
                    .col_expr(
                        short_url::Column::ClickCount,
                        Expr::col(short_url::Column::ClickCount).add(1),
                    )
                    .col_expr(
                        short_url::Column::LastAccessedAt,
                        Expr::val(accessed_at).into(),
                    )
                    .filter(short_url::Column::ShortCode.eq(code))
                    .exec(db)
                    .await
            },
        )
        .await?;

        Ok(())
    }

    pub(super) async fn append_click(&self, record: ClickRecord) -> Result<()> {
        let db = &self.db;
        let code = record.short_code.clone();

        retry::with_retry(
            &format!("insert_click({})", code),
            self.retry_config,
            self.timeout_ms,
            || {
                let model = click_to_active_model(record.clone());
                async move { click::Entity::insert(model).exec(db).await }
            },
        )
        .await?;

        Ok(())
    }

    /// Clicks and the link go in one transaction.
    pub(super) async fn delete_with_clicks(&self, code: &str) -> Result<bool> {
        let db = &self.db;

        let removed = retry::with_retry(
            &format!("delete({})", code),
            self.retry_config,
            self.timeout_ms,
            || async move {
                let txn = db.begin().await?;

                click::Entity::delete_many()
                    .filter(click::Column::ShortCode.eq(code))
                    .exec(&txn)
                    .await?;

                let result = short_url::Entity::delete_many()
                    .filter(short_url::Column::ShortCode.eq(code))
                    .exec(&txn)
                    .await?;

                txn.commit().await?;
                Ok::<u64, DbErr>(result.rows_affected)
            },
        )
        .await?;

        if removed > 0 {
            info!("Short link deleted: {}", code);
        }
        Ok(removed > 0)
    }
}
