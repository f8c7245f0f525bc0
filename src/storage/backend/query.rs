//! Read-only statements for SeaOrmStore

use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use super::converters::model_to_record;
use super::{SeaOrmStore, retry};
use crate::errors::Result;
use crate::storage::{AnalyticsPage, UrlRecord};

use migration::entities::short_url;

/// 聚合查询结果（DSL 聚合查询）
#[derive(Debug, FromQueryResult)]
struct TotalsResult {
    total_count: i64,
    total_clicks: Option<i64>,
}

impl SeaOrmStore {
    pub(super) async fn query_by_code(&self, code: &str) -> Result<Option<UrlRecord>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("find_by_code({})", code),
            self.retry_config,
            self.timeout_ms,
            || async {
                short_url::Entity::find()
                    .filter(short_url::Column::ShortCode.eq(code))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_record))
    }

    /// Oldest generated, non-expiring code pointing at `url`
    pub(super) async fn query_code_for_url(&self, url: &str) -> Result<Option<String>> {
        let db = &self.db;
        let code = retry::with_retry(
            "find_by_url",
            self.retry_config,
            self.timeout_ms,
            || async {
                short_url::Entity::find()
                    .select_only()
                    .column(short_url::Column::ShortCode)
                    .filter(short_url::Column::OriginalUrl.eq(url))
                    .filter(short_url::Column::IsCustom.eq(false))
                    .filter(short_url::Column::ExpiresAt.is_null())
                    .order_by_asc(short_url::Column::CreatedAt)
                    .into_tuple::<String>()
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(code)
    }

    pub(super) async fn query_code_exists(&self, code: &str) -> Result<bool> {
        let db = &self.db;
        let count = retry::with_retry(
            &format!("code_exists({})", code),
            self.retry_config,
            self.timeout_ms,
            || async {
                short_url::Entity::find()
                    .filter(short_url::Column::ShortCode.eq(code))
                    .count(db)
                    .await
            },
        )
        .await?;

        Ok(count > 0)
    }

    pub(super) async fn query_analytics_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<AnalyticsPage> {
        let db = &self.db;

        let totals = retry::with_retry(
            "analytics_totals",
            self.retry_config,
            self.timeout_ms,
            || async {
                short_url::Entity::find()
                    .select_only()
                    // COUNT(*) / SUM(click_count)
                    .column_as(short_url::Column::ShortCode.count(), "total_count")
                    .column_as(short_url::Column::ClickCount.sum(), "total_clicks")
                    .into_model::<TotalsResult>()
                    .one(db)
                    .await
            },
        )
        .await?;

        let models = retry::with_retry(
            "analytics_page",
            self.retry_config,
            self.timeout_ms,
            || async {
                short_url::Entity::find()
                    .order_by_desc(short_url::Column::ClickCount)
                    .order_by_desc(short_url::Column::CreatedAt)
                    .order_by_asc(short_url::Column::ShortCode)
                    .offset(offset)
                    .limit(limit)
                    .all(db)
                    .await
            },
        )
        .await?;

        let (total_count, total_clicks) = totals
            .map(|t| (t.total_count.max(0) as u64, t.total_clicks.unwrap_or(0).max(0) as u64))
            .unwrap_or((0, 0));

        Ok(AnalyticsPage {
            rows: models.into_iter().map(model_to_record).collect(),
            total_count,
            total_clicks,
        })
    }

    pub(super) async fn query_count(&self) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry("count", self.retry_config, self.timeout_ms, || async {
            short_url::Entity::find().count(db).await
        })
        .await?;

        Ok(count)
    }
}
