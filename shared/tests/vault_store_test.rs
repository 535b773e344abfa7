//! Vault store integration tests
//!
//! Exercises the full save/open lifecycle, once through the in-memory
//! provider and once through real encrypted 7z archives on disk.

use assert_matches::assert_matches;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

use vaultport_shared::store::{
    CompositeKey, DesktopFileProvider, FileOperationProvider, MemoryFileProvider, StoreError,
    VaultStore,
};

const PASSWORD: &str = "correct horse battery staple";

fn key() -> CompositeKey {
    CompositeKey::from_parts(PASSWORD, None).unwrap()
}

/// A store with a small group tree, two entries and one attachment
fn populate<F: FileOperationProvider>(store: &mut VaultStore<F>) {
    let root = store.root_group().clone();
    let work = store.add_group(&root, "Work").unwrap();
    let email = store.add_group(&work, "Email").unwrap();

    let mail = store
        .add_entry(&email, "Mail", "alice", "hunter2", Some("primary inbox"))
        .unwrap();
    store.set_url(&mail, "https://mail.example.com").unwrap();
    store
        .set_custom_property(&mail, "TOTP Seed", "JBSWY3DPEHPK3PXP", true)
        .unwrap();
    store
        .set_custom_property(&mail, "TOTP Settings", "30;6", false)
        .unwrap();

    let binary = store.add_binary(b"-----BEGIN KEY-----".to_vec());
    store.add_attachment(&mail, &binary, "mail.pem").unwrap();

    store.add_entry(&root, "Wifi", "", "p4ss", None).unwrap();
}

fn assert_populated<F: FileOperationProvider>(store: &VaultStore<F>) {
    assert_eq!(store.groups().len(), 3);
    assert_eq!(store.entries().len(), 2);

    let mail = store
        .entries()
        .iter()
        .find(|e| e.title == "Mail")
        .expect("Mail entry should survive the round trip");
    assert_eq!(store.group_path(&mail.group), vec!["Work", "Email"]);
    assert_eq!(mail.username, "alice");
    assert_eq!(mail.password, "hunter2");
    assert_eq!(mail.notes.as_deref(), Some("primary inbox"));
    assert_eq!(mail.url.as_deref(), Some("https://mail.example.com"));

    let seed = mail.property("TOTP Seed").unwrap();
    assert_eq!(seed.value, "JBSWY3DPEHPK3PXP");
    assert!(seed.protected);
    assert!(!mail.property("TOTP Settings").unwrap().protected);

    assert_eq!(mail.attachments.len(), 1);
    assert_eq!(mail.attachments[0].file_name, "mail.pem");
    assert_eq!(
        store.binary(&mail.attachments[0].binary),
        Some(&b"-----BEGIN KEY-----"[..])
    );

    let root = store.root_group();
    let wifi = store.entries_in(root);
    assert_eq!(wifi.len(), 1);
    assert_eq!(wifi[0].title, "Wifi");
}

#[test]
fn test_memory_round_trip() {
    let provider = MemoryFileProvider::new();

    let mut store = VaultStore::create_new(provider.clone(), "/vaults/main.7z", key());
    populate(&mut store);
    store.save().unwrap();
    assert!(!store.is_modified());
    assert!(provider.contains("/vaults/main.7z"));

    let reopened = VaultStore::open(provider, "/vaults/main.7z", key()).unwrap();
    assert!(!reopened.is_modified());
    assert_eq!(reopened.metadata().entry_count, 2);
    assert_populated(&reopened);
}

#[test]
fn test_open_missing_vault() {
    let result = VaultStore::open(MemoryFileProvider::new(), "/nowhere.7z", key());
    assert_matches!(result, Err(StoreError::NotFound { path }) if path == "/nowhere.7z");
}

#[test]
fn test_open_with_wrong_password() {
    let provider = MemoryFileProvider::new();
    VaultStore::create_new(provider.clone(), "/v.7z", key())
        .save()
        .unwrap();

    let wrong = CompositeKey::from_parts("not the password", None).unwrap();
    assert_matches!(
        VaultStore::open(provider, "/v.7z", wrong),
        Err(StoreError::InvalidCredentials { .. })
    );
}

#[test]
fn test_keyfile_is_part_of_the_key() {
    let provider = MemoryFileProvider::new();
    let with_keyfile = CompositeKey::from_parts(PASSWORD, Some(b"keyfile bytes")).unwrap();
    VaultStore::create_new(provider.clone(), "/v.7z", with_keyfile)
        .save()
        .unwrap();

    assert_matches!(
        VaultStore::open(provider.clone(), "/v.7z", key()),
        Err(StoreError::InvalidCredentials { .. })
    );

    let again = CompositeKey::from_parts(PASSWORD, Some(b"keyfile bytes")).unwrap();
    assert!(VaultStore::open(provider, "/v.7z", again).is_ok());
}

#[test]
fn test_open_or_create() {
    let provider = MemoryFileProvider::new();

    let (mut created, is_new) =
        VaultStore::open_or_create(provider.clone(), "/v.7z", key()).unwrap();
    assert!(is_new);
    assert!(!provider.contains("/v.7z"));
    populate(&mut created);
    created.save().unwrap();

    let (opened, is_new) = VaultStore::open_or_create(provider, "/v.7z", key()).unwrap();
    assert!(!is_new);
    assert_populated(&opened);
}

#[test]
fn test_garbage_archive_is_corrupted() {
    let provider = MemoryFileProvider::new();
    provider.add_archive("/v.7z", b"garbage".to_vec()).unwrap();

    assert_matches!(
        VaultStore::open(provider, "/v.7z", key()),
        Err(StoreError::Corrupted { .. })
    );
}

#[test]
fn test_archive_without_metadata_is_corrupted() {
    let provider = MemoryFileProvider::new();
    let archive = provider
        .create_archive(Default::default(), PASSWORD)
        .unwrap();
    provider.add_archive("/v.7z", archive).unwrap();

    assert_matches!(
        VaultStore::open(provider, "/v.7z", key()),
        Err(StoreError::Corrupted { message }) if message.contains("metadata")
    );
}

#[test]
fn test_save_failure_is_reported() {
    let provider = MemoryFileProvider::with_failing_writes();
    let mut store = VaultStore::create_new(provider, "/v.7z", key());
    assert_matches!(store.save(), Err(StoreError::File(_)));
    assert!(store.is_modified());
}

/// On-disk fixture for the sevenz-rust2 backed provider
struct DiskVault {
    _dir: TempDir,
    path: PathBuf,
}

impl DiskVault {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("vaults").join("bitwarden.7z");
        Self { _dir: dir, path }
    }

    fn path_str(&self) -> &str {
        self.path.to_str().expect("Invalid path")
    }
}

#[test]
fn test_encrypted_archive_round_trip_on_disk() {
    let vault = DiskVault::new();

    let mut store = VaultStore::create_new(DesktopFileProvider::new(), vault.path_str(), key());
    populate(&mut store);
    store.save().unwrap();
    assert!(vault.path.exists());

    // Record contents must not be readable without the password
    let raw = std::fs::read(&vault.path).unwrap();
    assert!(!raw.windows(7).any(|w| w == b"hunter2"));

    let reopened = VaultStore::open(DesktopFileProvider::new(), vault.path_str(), key()).unwrap();
    assert_populated(&reopened);
}

#[test]
fn test_encrypted_archive_wrong_password_on_disk() {
    let vault = DiskVault::new();
    VaultStore::create_new(DesktopFileProvider::new(), vault.path_str(), key())
        .save()
        .unwrap();

    let wrong = CompositeKey::from_parts("definitely wrong", None).unwrap();
    let result = VaultStore::open(DesktopFileProvider::new(), vault.path_str(), wrong);
    assert!(result.is_err());
}

#[test]
fn test_keyfile_from_disk_opens_vault() {
    let vault = DiskVault::new();
    let mut keyfile = tempfile::NamedTempFile::new().unwrap();
    keyfile.write_all(b"0123456789abcdef").unwrap();

    let key = CompositeKey::new(PASSWORD, Some(keyfile.path())).unwrap();
    VaultStore::create_new(DesktopFileProvider::new(), vault.path_str(), key)
        .save()
        .unwrap();

    let key = CompositeKey::new(PASSWORD, Some(keyfile.path())).unwrap();
    assert!(VaultStore::open(DesktopFileProvider::new(), vault.path_str(), key).is_ok());
}
