pub mod auth;
pub mod subscription;

pub use auth::auth_config;
pub use subscription::subscription_config;
