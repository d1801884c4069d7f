//! JWT signing key persistence
//!
//! The signing key is a 32-byte random value stored hex-encoded in the data
//! directory. It is generated on first start and reused afterwards so that
//! issued tokens survive server restarts.

use std::fs;

use anyhow::{Context, Result};

use super::constants::JWT_KEY_FILENAME;
use super::storage::AppStorage;
use crate::utils::crypto::generate_signing_key;

/// Load the signing key from the data directory, creating it if missing
pub fn load_or_create_signing_key(storage: &AppStorage) -> Result<Vec<u8>> {
    let path = storage.data_path(JWT_KEY_FILENAME);

    if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read signing key: {}", path.display()))?;
        let key = hex::decode(content.trim())
            .with_context(|| format!("Signing key is not valid hex: {}", path.display()))?;
        if key.len() != 32 {
            anyhow::bail!(
                "Signing key has wrong length ({} bytes, expected 32): {}",
                key.len(),
                path.display()
            );
        }
        tracing::debug!(path = %path.display(), "Signing key loaded");
        return Ok(key);
    }

    let key = generate_signing_key();
    fs::write(&path, hex::encode(&key))
        .with_context(|| format!("Failed to write signing key: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set key permissions: {}", path.display()))?;
    }

    tracing::debug!(path = %path.display(), "Signing key generated");
    Ok(key)
}
