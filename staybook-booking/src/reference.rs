use chrono::{DateTime, Datelike, Utc};
use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 5;

/// `BS-<year>-<5 chars of A-Z0-9>`. Uniqueness is enforced by the store.
pub fn generate_reference(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("BS-{:04}-{}", now.year(), suffix)
}

pub fn is_valid_reference(reference: &str) -> bool {
    let mut parts = reference.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("BS"), Some(year), Some(suffix), None) => {
            year.len() == 4
                && year.bytes().all(|b| b.is_ascii_digit())
                && suffix.len() == SUFFIX_LEN
                && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b))
        }
        _ => false,
    }
}
