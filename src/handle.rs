//! External handle generation
//!
//! Every entity carries a human-readable handle (`user_k3j9x2m4q`,
//! `goal_8fh2k1p7d`, ...) next to its storage-assigned id. Handles are a
//! prefix plus nine lowercase base-36 characters; uniqueness is enforced by
//! the per-collection unique index, not here.

use rand::Rng;

const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a handle with the given prefix, e.g. `generate("goal")` ->
/// `goal_x4k2m9q1z`.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}_{}", prefix, suffix)
}

pub fn user_handle() -> String {
    generate("user")
}

pub fn goal_handle() -> String {
    generate("goal")
}

pub fn invitation_handle() -> String {
    generate("invitation")
}

pub fn sticker_image_handle() -> String {
    generate("sticker_img")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_format() {
        let handle = generate("goal");
        assert!(handle.starts_with("goal_"));
        let suffix = handle.strip_prefix("goal_").unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_handles_are_distinct() {
        let a = user_handle();
        let b = user_handle();
        assert_ne!(a, b);
    }

    #[test]
    fn test_prefixes() {
        assert!(user_handle().starts_with("user_"));
        assert!(goal_handle().starts_with("goal_"));
        assert!(invitation_handle().starts_with("invitation_"));
        assert!(sticker_image_handle().starts_with("sticker_img_"));
    }
}
