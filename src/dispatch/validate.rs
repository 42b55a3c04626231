//! Key validation.

use crate::core::config::MAX_KEY_LENGTH;

/// Yes/no verdict on whether a key may be sent.
pub trait KeyValidator {
    fn check(&self, key: &[u8]) -> bool;
}

/// ASCII protocol key rules: 1 to 250 bytes, each printable and not a space.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiKeyValidator;

impl KeyValidator for AsciiKeyValidator {
    fn check(&self, key: &[u8]) -> bool {
        !key.is_empty() && key.len() <= MAX_KEY_LENGTH && key.iter().all(u8::is_ascii_graphic)
    }
}

impl<F> KeyValidator for F
where
    F: Fn(&[u8]) -> bool,
{
    fn check(&self, key: &[u8]) -> bool {
        self(key)
    }
}
