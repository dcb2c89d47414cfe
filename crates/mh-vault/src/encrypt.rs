//! `encryptProfile` (spec §4.E).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{VaultError, VaultResult};
use crate::metadata::{EncryptionMetadata, PasswordMode};
use crate::progress::{ProgressEvent, ProgressSender};

/// The three subtrees spec §4.E names as in-scope for encryption.
const ENCRYPTED_SUBTREES: &[&str] = &["memory", "persona", "etc"];

/// Encrypt every regular file under `{memory, persona, etc}` in
/// `profile_root`, replacing each with a `basename.enc` sibling. Installs
/// the metadata file and verification blob first, then streams one
/// [`ProgressEvent`] per file plus a terminal `complete`/`error` event to
/// `progress`.
///
/// Idempotency: refuses with [`VaultError::AlreadyEncrypted`] if
/// metadata is already present (spec §4.E).
///
/// # Errors
/// Returns an error immediately (before touching any file) if the
/// profile is already encrypted, the password is rejected, or the
/// metadata/verification blob cannot be written.
pub async fn encrypt_profile(
    profile_root: PathBuf,
    password: String,
    password_mode: PasswordMode,
    progress: ProgressSender,
) -> VaultResult<usize> {
    if EncryptionMetadata::exists(&profile_root) {
        return Err(VaultError::AlreadyEncrypted);
    }

    let files = collect_files(&profile_root);
    let _ = progress
        .send(ProgressEvent::preparing("installing encryption metadata"))
        .await;

    let (metadata, key) = EncryptionMetadata::create(&profile_root, &password, password_mode, 0)?;

    let total = files.len();
    let result = tokio::task::spawn_blocking({
        let profile_root = profile_root.clone();
        let progress = progress.clone();
        move || encrypt_files_blocking(&profile_root, &key, files, &progress)
    })
    .await?;

    match result {
        Ok(processed) => {
            metadata.update_file_count(&profile_root, processed)?;
            let _ = progress
                .send(ProgressEvent::complete(format!(
                    "encrypted {processed} file(s)"
                )))
                .await;
            Ok(processed)
        }
        Err(e) => {
            let _ = progress
                .send(ProgressEvent::failed(
                    format!("encryption stopped after a failure (of {total} files)"),
                    e.to_string(),
                ))
                .await;
            Err(e)
        }
    }
}

/// Deterministic directory order (spec §4.E "a deterministic directory
/// order"): sorted by path within each subtree, subtrees in declaration
/// order.
fn collect_files(profile_root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for subtree in ENCRYPTED_SUBTREES {
        let dir = profile_root.join(subtree);
        if !dir.is_dir() {
            continue;
        }
        let mut entries: Vec<PathBuf> = WalkDir::new(&dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_none_or(|ext| ext != "enc"))
            .map(|e| e.path().to_path_buf())
            .collect();
        entries.sort();
        files.extend(entries);
    }
    files
}

/// Runs on a blocking thread pool: reads, encrypts, writes the `.enc`
/// sibling, fsyncs it, then deletes the plaintext only after that write
/// succeeds (spec §4.E: "deletes the plaintext only after a successful
/// write + fsync of the new file"). Stops and returns the first error it
/// hits — partial progress up to that point stays on disk, reported via
/// `metadata.encryptedFileCount` once the caller decides what to persist.
fn encrypt_files_blocking(
    profile_root: &Path,
    key: &mh_crypto::ProfileKey,
    files: Vec<PathBuf>,
    progress: &ProgressSender,
) -> VaultResult<usize> {
    let total = files.len().max(1);
    for (index, path) in files.iter().enumerate() {
        let percent = ((index * 100) / total).min(99) as u8;
        let display = path
            .strip_prefix(profile_root)
            .unwrap_or(path)
            .display()
            .to_string();
        let _ = progress.blocking_send(ProgressEvent::file(format!("encrypting {display}"), percent));

        let plaintext = std::fs::read(path)?;
        let ciphertext = key.encrypt_file(&plaintext)?;
        let enc_path = path.with_extension(append_enc(path));
        mh_storage::write_bytes(&enc_path, &ciphertext)?;
        std::fs::remove_file(path)?;
    }
    Ok(files.len())
}

fn append_enc(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!("{}.enc", ext.to_string_lossy()),
        None => "enc".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encrypts_every_file_under_scoped_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("persona")).unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(dir.path().join("persona/core.json"), b"0123456789").unwrap();
        std::fs::write(dir.path().join("etc/voice.json"), b"01234567890123456789").unwrap();
        std::fs::write(dir.path().join("cache/ignored.json"), b"not encrypted").unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::channel(64);
        let processed = encrypt_profile(
            dir.path().to_path_buf(),
            "hunter2".to_string(),
            PasswordMode::Separate,
            tx,
        )
        .await
        .unwrap();
        assert_eq!(processed, 2);

        assert!(dir.path().join("persona/core.json.enc").is_file());
        assert!(!dir.path().join("persona/core.json").exists());
        assert!(dir.path().join("etc/voice.json.enc").is_file());
        assert!(dir.path().join("cache/ignored.json").is_file());

        let mut saw_complete = false;
        while let Some(event) = rx.recv().await {
            if matches!(event.step, crate::progress::Step::Complete) {
                saw_complete = event.progress_percent == 100;
            }
        }
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn refuses_when_already_encrypted() {
        let dir = tempfile::tempdir().unwrap();
        EncryptionMetadata::create(dir.path(), "hunter2", PasswordMode::Separate, 0).unwrap();

        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let result = encrypt_profile(
            dir.path().to_path_buf(),
            "hunter2".to_string(),
            PasswordMode::Separate,
            tx,
        )
        .await;
        assert!(matches!(result, Err(VaultError::AlreadyEncrypted)));
    }
}
