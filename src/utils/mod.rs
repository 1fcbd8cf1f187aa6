pub mod jwt;
pub mod phone;
pub mod public_id;

pub use jwt::*;
pub use phone::*;
pub use public_id::{generate_public_id, generate_unique_public_id};
