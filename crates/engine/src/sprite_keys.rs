use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not start with '/'")]
    LeadingSlash,
    #[error("sprite key must not end with '/'")]
    TrailingSlash,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Name of the image a drawing collaborator should use for an entity, such as
/// `guards/dog` or `dagger`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteKey(String);

impl SpriteKey {
    pub fn new(key: impl Into<String>) -> Result<Self, SpriteKeyError> {
        let key = key.into();
        validate_sprite_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::LeadingSlash);
    }
    if key.ends_with('/') {
        return Err(SpriteKeyError::TrailingSlash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-') {
            continue;
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_entity_keys() {
        for key in ["player", "guards/dog", "house/size_3", "chest-open"] {
            let sprite = SpriteKey::new(key).expect("valid key");
            assert_eq!(sprite.as_str(), key);
        }
    }

    #[test]
    fn rejects_invalid_keys() {
        assert_eq!(SpriteKey::new(""), Err(SpriteKeyError::Empty));
        assert_eq!(SpriteKey::new("/player"), Err(SpriteKeyError::LeadingSlash));
        assert_eq!(SpriteKey::new("guards/"), Err(SpriteKeyError::TrailingSlash));
        assert_eq!(SpriteKey::new("a/../b"), Err(SpriteKeyError::ParentTraversal));
        assert_eq!(
            SpriteKey::new("Guard"),
            Err(SpriteKeyError::InvalidCharacter { character: 'G' })
        );
    }
}
