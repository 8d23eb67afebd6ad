use anyhow::{anyhow, Result};

/// Database, table and collection names are interpolated into SQL, so only
/// plain identifiers are accepted.
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(anyhow!("{} must not be empty", field));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(anyhow!("{} must start with a letter or underscore", field));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(anyhow!("{} contains invalid characters: '{}'", field, value));
    }
    Ok(())
}
