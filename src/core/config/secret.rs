use std::io::Write;
use std::{fs, path::Path, path::PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::parsing::env_optional;

/// Returns the persisted signing key, creating one on first start so that
/// issued tokens survive restarts in development.
pub(super) fn load_or_create_secret_key() -> String {
    let path = secret_file_path();

    if let Some(existing) = read_existing(&path) {
        return existing;
    }

    let new_key = generate_secret_key();
    match persist(&path, &new_key) {
        Ok(()) => new_key,
        // another process won the race; prefer its key
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            read_existing(&path).unwrap_or(new_key)
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "Failed to persist generated secret key"
            );
            new_key
        }
    }
}

fn read_existing(path: &Path) -> Option<String> {
    let value = fs::read_to_string(path).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn persist(path: &Path, key: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(key.as_bytes())
}

fn generate_secret_key() -> String {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn secret_file_path() -> PathBuf {
    env_optional("KODETO_SECRET_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".secret_key"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_unique_and_url_safe() {
        let first = generate_secret_key();
        let second = generate_secret_key();

        assert_ne!(first, second);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn persisted_key_is_read_back() {
        let path = std::env::temp_dir().join(format!("kodeto-secret-{}", uuid::Uuid::new_v4()));
        persist(&path, "persisted-key").expect("persist");

        assert_eq!(read_existing(&path).as_deref(), Some("persisted-key"));
        let err = persist(&path, "other").expect_err("second persist must fail");
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);

        let _ = fs::remove_file(path);
    }
}
