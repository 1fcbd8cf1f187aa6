pub mod auth_service;
pub mod otp_service;
pub mod subscription_service;

pub use auth_service::*;
pub use otp_service::*;
pub use subscription_service::*;
