//! `decryptProfile` (spec §4.E).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{VaultError, VaultResult};
use crate::metadata::EncryptionMetadata;
use crate::progress::{ProgressEvent, ProgressSender};

/// Reverse [`crate::encrypt::encrypt_profile`]: verify `password` against
/// the verification blob, then rename every `*.enc` file back to
/// plaintext. Unlike encryption, a per-file failure does not abort the
/// run — spec §4.E: "on any per-file failure, leaves the file in place
/// and continues, reporting the failure count." Once every file that
/// could be decrypted has been, the metadata and verification files are
/// removed only if there were zero failures (a partially decrypted
/// profile must stay marked as encrypted so a retry can find the rest).
///
/// # Errors
/// Returns [`VaultError::NotEncrypted`] if there is no metadata record,
/// or [`VaultError::WrongPassword`] if the password fails verification
/// (spec §8 invariant 3: "yields no file mutations").
pub async fn decrypt_profile(
    profile_root: PathBuf,
    password: String,
    progress: ProgressSender,
) -> VaultResult<usize> {
    let Some(metadata) = EncryptionMetadata::load(&profile_root)? else {
        let _ = progress
            .send(ProgressEvent::failed("profile is not encrypted", "NOT_ENCRYPTED"))
            .await;
        return Err(VaultError::NotEncrypted);
    };

    let _ = progress
        .send(ProgressEvent::preparing("verifying password"))
        .await;

    let Some(key) = metadata.verify_password(&profile_root, &password)? else {
        let _ = progress
            .send(ProgressEvent::failed("wrong password", "VALIDATION"))
            .await;
        return Err(VaultError::WrongPassword);
    };

    let files = collect_enc_files(&profile_root);
    let total_files = files.len();

    let (processed, failures) = tokio::task::spawn_blocking({
        let profile_root = profile_root.clone();
        let progress = progress.clone();
        move || decrypt_files_blocking(&profile_root, &key, files, &progress)
    })
    .await?;

    if failures == 0 {
        EncryptionMetadata::remove(&profile_root)?;
        let _ = progress
            .send(ProgressEvent::complete(format!("decrypted {processed} file(s)")))
            .await;
    } else {
        metadata.update_file_count(&profile_root, total_files - processed)?;
        let _ = progress
            .send(ProgressEvent::failed(
                format!("decrypted {processed} of {total_files} file(s)"),
                format!("{failures} file(s) failed to decrypt"),
            ))
            .await;
    }

    Ok(processed)
}

/// Confirm a candidate password without mutating anything (spec §4.E
/// `verifyPassword`).
///
/// # Errors
/// Returns [`VaultError::NotEncrypted`] if the profile has no metadata.
pub fn verify_password(profile_root: &Path, password: &str) -> VaultResult<bool> {
    let Some(metadata) = EncryptionMetadata::load(profile_root)? else {
        return Err(VaultError::NotEncrypted);
    };
    Ok(metadata.verify_password(profile_root, password)?.is_some())
}

fn collect_enc_files(profile_root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(profile_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "enc"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Mirrors [`crate::encrypt::encrypt_files_blocking`]'s write discipline
/// in reverse: decrypt into a plaintext sibling, fsync it, then remove
/// the `.enc` file. A failure on one file is recorded and skipped rather
/// than aborting the run (spec §4.E, §7 "Recovery").
fn decrypt_files_blocking(
    profile_root: &Path,
    key: &mh_crypto::ProfileKey,
    files: Vec<PathBuf>,
    progress: &ProgressSender,
) -> (usize, usize) {
    let total = files.len().max(1);
    let mut processed = 0;
    let mut failures = 0;
    for (index, enc_path) in files.iter().enumerate() {
        let percent = ((index * 100) / total).min(99) as u8;
        let display = enc_path
            .strip_prefix(profile_root)
            .unwrap_or(enc_path)
            .display()
            .to_string();
        let _ = progress.blocking_send(ProgressEvent::file(format!("decrypting {display}"), percent));

        match decrypt_one_file(key, enc_path) {
            Ok(()) => processed += 1,
            Err(e) => {
                failures += 1;
                tracing::warn!(path = %enc_path.display(), error = %e, "failed to decrypt file, leaving in place");
            }
        }
    }
    (processed, failures)
}

fn decrypt_one_file(key: &mh_crypto::ProfileKey, enc_path: &Path) -> VaultResult<()> {
    let ciphertext = std::fs::read(enc_path)?;
    let plaintext = key.decrypt_file(&ciphertext)?;
    let plain_path = strip_enc_suffix(enc_path);
    mh_storage::write_bytes(&plain_path, &plaintext)?;
    std::fs::remove_file(enc_path)?;
    Ok(())
}

fn strip_enc_suffix(path: &Path) -> PathBuf {
    let name = path.to_string_lossy();
    match name.strip_suffix(".enc") {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encrypt::encrypt_profile;
    use crate::metadata::PasswordMode;

    async fn encrypted_fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("persona")).unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        std::fs::write(dir.path().join("persona/core.json"), b"0123456789").unwrap();
        std::fs::write(dir.path().join("etc/voice.json"), b"01234567890123456789").unwrap();

        let (tx, _rx) = tokio::sync::mpsc::channel(64);
        encrypt_profile(
            dir.path().to_path_buf(),
            "hunter2".to_string(),
            PasswordMode::Separate,
            tx,
        )
        .await
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn round_trips_bit_for_bit() {
        let dir = encrypted_fixture().await;
        let (tx, _rx) = tokio::sync::mpsc::channel(64);
        decrypt_profile(dir.path().to_path_buf(), "hunter2".to_string(), tx)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("persona/core.json")).unwrap(),
            b"0123456789"
        );
        assert_eq!(
            std::fs::read(dir.path().join("etc/voice.json")).unwrap(),
            b"01234567890123456789"
        );
        assert!(!EncryptionMetadata::exists(dir.path()));
    }

    #[tokio::test]
    async fn wrong_password_mutates_nothing() {
        let dir = encrypted_fixture().await;
        let before = std::fs::read(dir.path().join("persona/core.json.enc")).unwrap();

        let (tx, _rx) = tokio::sync::mpsc::channel(64);
        let result = decrypt_profile(dir.path().to_path_buf(), "hunter3".to_string(), tx).await;
        assert!(matches!(result, Err(VaultError::WrongPassword)));

        let after = std::fs::read(dir.path().join("persona/core.json.enc")).unwrap();
        assert_eq!(before, after);
        assert!(EncryptionMetadata::exists(dir.path()));
    }

    #[tokio::test]
    async fn not_encrypted_profile_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let result = decrypt_profile(dir.path().to_path_buf(), "hunter2".to_string(), tx).await;
        assert!(matches!(result, Err(VaultError::NotEncrypted)));
    }
}
