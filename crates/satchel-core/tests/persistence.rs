//! # Persistence Tests
//!
//! The redb backend behind a full vault: state and identifier sequences
//! survive a reopen.

use satchel_core::{
    BriefcaseId, DirectoryContentStorage, Note, SatchelError, Vault, VaultConfig,
};
use tempfile::tempdir;

#[test]
fn vault_survives_reopen() {
    let temp = tempdir().expect("temp dir");
    let db = temp.path().join("vault.redb");

    let (note, work) = {
        let vault = Vault::open(&db, VaultConfig::default()).expect("open");
        let note = vault
            .documents()
            .new_note(&Note {
                title: "keep".into(),
                body: "me".into(),
            })
            .expect("note");
        let work = vault.briefcases().create("Work", "").expect("work");
        vault.briefcases().move_to_briefcase(note, work).expect("move");
        (note, work)
    };

    let vault = Vault::open(&db, VaultConfig::default()).expect("reopen");
    assert_eq!(vault.documents().note(note).expect("note").title, "keep");
    assert_eq!(vault.briefcases().containing_briefcase(note).expect("bc"), work);
    assert_eq!(vault.briefcases().list().expect("list").len(), 2);

    // Identifiers keep counting from where they stopped
    let next = vault.briefcases().create("Home", "").expect("home");
    assert_eq!(next, BriefcaseId(3));
}

#[test]
fn unique_names_hold_across_reopen() {
    let temp = tempdir().expect("temp dir");
    let db = temp.path().join("vault.redb");
    {
        let vault = Vault::open(&db, VaultConfig::default()).expect("open");
        vault.collections().create("inbox", "").expect("create");
    }
    let vault = Vault::open(&db, VaultConfig::default()).expect("reopen");
    assert!(matches!(
        vault.collections().create("inbox", ""),
        Err(SatchelError::DuplicateName(_))
    ));
}

#[test]
fn files_in_content_directory() {
    let temp = tempdir().expect("temp dir");
    let content = DirectoryContentStorage::open(temp.path().join("content")).expect("content");
    let vault = Vault::open(temp.path().join("vault.redb"), VaultConfig::default())
        .expect("open")
        .with_content_storage(content);

    let file = vault
        .files()
        .new_file("a.bin", "", &[1, 2, 3], "pw")
        .expect("file");
    vault.files().update_content(file, &[4], "pw", "shrink").expect("update");

    assert_eq!(vault.files().retrieve(file, "pw").expect("live"), vec![4]);
    assert_eq!(
        vault.files().retrieve_version(file, 1, "pw").expect("v1"),
        vec![1, 2, 3]
    );
}

#[test]
fn custom_limits_apply() {
    let temp = tempdir().expect("temp dir");
    let config = VaultConfig {
        max_name_length: 4,
        ..VaultConfig::default()
    };
    let vault = Vault::open(temp.path().join("vault.redb"), config).expect("open");

    vault.aspects().create("abcd", "").expect("fits");
    assert!(matches!(
        vault.aspects().create("abcde", ""),
        Err(SatchelError::InvalidArgument(_))
    ));
}
