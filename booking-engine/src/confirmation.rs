//! Confirmation codes
//!
//! Codes are short and random. Uniqueness is enforced by the store; a
//! collision just means drawing another code.

use crate::repository::RepoError;
use rand::Rng;
use std::future::Future;

pub const CODE_ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const CODE_LENGTH: usize = 8;
pub const MAX_ATTEMPTS: u32 = 5;

pub fn generate_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Outcome of [`with_unique_code`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeAllocation<T> {
    Allocated(T),
    Exhausted { attempts: u32 },
}

/// Run `attempt` with fresh codes until it stops reporting a duplicate
///
/// Only [`RepoError::Duplicate`] is retried; every other error is returned
/// as-is.
pub async fn with_unique_code<T, F, Fut>(
    max_attempts: u32,
    len: usize,
    mut attempt: F,
) -> Result<CodeAllocation<T>, RepoError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, RepoError>>,
{
    for n in 1..=max_attempts {
        let code = generate_code(len);
        match attempt(code).await {
            Ok(value) => return Ok(CodeAllocation::Allocated(value)),
            Err(RepoError::Duplicate(what)) => {
                tracing::warn!(attempt = n, %what, "Confirmation code collision, retrying");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(CodeAllocation::Exhausted {
        attempts: max_attempts,
    })
}
