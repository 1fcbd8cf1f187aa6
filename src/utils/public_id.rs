use crate::error::{AppError, AppResult};
use rand::Rng;
use std::future::Future;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_ATTEMPTS: u32 = 100;

/// Generate a user-facing id: 6 or 7 characters, each drawn from `[A-Z0-9]`.
pub fn generate_public_id() -> String {
    let mut rng = rand::thread_rng();
    let len = if rng.gen_bool(0.5) { 6 } else { 7 };
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Retry `generate_public_id` against the caller's existence check until a
/// free id is found. At 36^6 combinations a collision is already unlikely;
/// the loop is the correctness backstop, capped so a broken check cannot
/// spin forever.
pub async fn generate_unique_public_id<F, Fut>(mut exists: F) -> AppResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate_public_id();
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::IdSpaceExhausted)
}
