pub mod click;
pub mod short_url;

pub use click::Entity as ClickEntity;
pub use short_url::Entity as ShortUrlEntity;
