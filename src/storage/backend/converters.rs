use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};

use crate::storage::{ClickRecord, NewUrl, UrlRecord};
use migration::entities::{click, short_url};

pub fn model_to_record(model: short_url::Model) -> UrlRecord {
    UrlRecord {
        short_code: model.short_code,
        original_url: model.original_url,
        click_count: model.click_count.max(0) as u64,
        is_custom: model.is_custom,
        expires_at: model.expires_at,
        created_at: model.created_at,
        last_accessed_at: model.last_accessed_at,
    }
}

pub fn new_url_to_active_model(new_url: NewUrl) -> short_url::ActiveModel {
    short_url::ActiveModel {
        id: NotSet,
        short_code: Set(new_url.code),
        original_url: Set(new_url.url),
        click_count: Set(0),
        is_custom: Set(new_url.is_custom),
        expires_at: Set(new_url.expires_at),
        created_at: Set(Utc::now()),
        last_accessed_at: Set(None),
    }
}

pub fn click_to_active_model(record: ClickRecord) -> click::ActiveModel {
    click::ActiveModel {
        id: NotSet,
        short_code: Set(record.short_code),
        clicked_at: Set(record.clicked_at),
        user_agent: Set(record.user_agent),
        ip_address: Set(record.ip_address),
        referrer: Set(record.referrer),
    }
}
