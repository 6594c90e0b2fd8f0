//! # End-to-end Scenarios
//!
//! Whole-vault behaviour across stores: cascades, briefcase exclusivity,
//! version numbering and duplicate scoring.

use satchel_core::{
    AspectGroupId, BriefcaseId, DocumentType, Note, SatchelError, SimilarityScore, UrlRecord, Vault,
};

// =============================================================================
// BRIEFCASES
// =============================================================================

#[test]
fn briefcase_lifecycle_returns_file_to_global() {
    let vault = Vault::in_memory().expect("vault");

    let work = vault.briefcases().create("Work", "office papers").expect("work");
    assert_eq!(work, BriefcaseId(2));

    let file = vault
        .files()
        .new_file("contract.pdf", "", b"%PDF-1.7", "secret")
        .expect("file");
    assert_eq!(
        vault.briefcases().containing_briefcase(file).expect("bc"),
        BriefcaseId::GLOBAL
    );

    vault.briefcases().move_to_briefcase(file, work).expect("move");
    assert_eq!(vault.briefcases().containing_briefcase(file).expect("bc"), work);

    vault.briefcases().delete(work).expect("delete");
    assert_eq!(
        vault.briefcases().containing_briefcase(file).expect("bc"),
        BriefcaseId::GLOBAL
    );
}

#[test]
fn every_document_is_in_exactly_one_briefcase() {
    let vault = Vault::in_memory().expect("vault");
    let a = vault.briefcases().create("A", "").expect("a");
    let b = vault.briefcases().create("B", "").expect("b");
    let docs: Vec<_> = (0..4)
        .map(|_| vault.documents().new_note(&Note::default()).expect("note"))
        .collect();

    vault.briefcases().move_documents(&docs[..2], a).expect("move");
    vault.briefcases().move_documents(&docs[1..3], b).expect("move");

    for doc in &docs {
        let holders: Vec<_> = vault
            .briefcases()
            .list()
            .expect("list")
            .into_iter()
            .filter(|bc| {
                vault
                    .briefcases()
                    .documents_in(bc.id)
                    .expect("docs")
                    .contains(doc)
            })
            .map(|bc| bc.id)
            .collect();
        assert_eq!(holders.len(), 1, "document {} held by {:?}", doc, holders);
        assert_eq!(
            holders[0],
            vault.briefcases().containing_briefcase(*doc).expect("bc")
        );
    }
}

// =============================================================================
// CASCADES
// =============================================================================

#[test]
fn deleting_document_cascades_everywhere() {
    let vault = Vault::in_memory().expect("vault");
    let doc = vault
        .documents()
        .new_url(&UrlRecord {
            url: "https://example.org".into(),
            title: "Example".into(),
        })
        .expect("url");
    let other = vault.documents().new_note(&Note::default()).expect("note");

    let aspect = vault.aspects().create("reading", "").expect("aspect");
    let collection = vault.collections().create("later", "").expect("collection");
    let related = vault.relations().new_predicate("mentions").expect("predicate");
    let work = vault.briefcases().create("Work", "").expect("work");

    vault.aspects().apply(aspect, doc).expect("apply");
    vault.collections().add(collection, doc).expect("add");
    vault.bookmarks().bookmark(doc).expect("bookmark");
    vault.relations().new_relation(other, doc, related).expect("relate");
    vault.briefcases().move_to_briefcase(doc, work).expect("move");

    vault.registry().delete(doc).expect("delete");

    assert!(!vault.registry().exists(doc).expect("exists"));
    assert!(vault.aspects().documents_with(aspect).expect("aspect").is_empty());
    assert!(vault.collections().documents_in(collection).expect("col").is_empty());
    assert!(vault.bookmarks().bookmarked(DocumentType::Url).expect("bm").is_empty());
    assert!(vault.relations().relations_from(other).expect("rel").is_empty());
    assert!(vault.briefcases().documents_in(work).expect("bc").is_empty());
}

#[test]
fn deleting_aspect_removes_every_join() {
    let vault = Vault::in_memory().expect("vault");
    let aspect = vault.aspects().create("tax", "").expect("aspect");
    let docs: Vec<_> = (0..3)
        .map(|_| vault.documents().new_note(&Note::default()).expect("note"))
        .collect();
    vault
        .aspects()
        .apply_to_multiple(&[aspect], &docs)
        .expect("apply");

    vault.aspects().delete(aspect).expect("delete");

    for doc in docs {
        assert!(vault.aspects().aspects_on(doc).expect("aspects").is_empty());
    }
}

#[test]
fn freed_group_name_can_be_reused_at_same_level() {
    let vault = Vault::in_memory().expect("vault");
    let groups = vault.aspect_groups();
    let parent = groups.create(AspectGroupId::ROOT, "home", "").expect("parent");
    let sibling = groups.create(parent, "bills", "").expect("sibling");
    let doomed = groups.create(parent, "garden", "").expect("doomed");

    groups.delete(doomed).expect("delete");

    assert!(!groups.exists_at_level(parent, "garden").expect("free"));
    assert!(groups.exists_at_level(parent, "bills").expect("kept"));
    groups.create(parent, "garden", "").expect("reuse");
    assert_eq!(groups.get(sibling).expect("sibling").name, "bills");
}

// =============================================================================
// VERSIONS & DUPLICATES
// =============================================================================

#[test]
fn version_numbering() {
    let vault = Vault::in_memory().expect("vault");
    let file = vault.files().new_file("draft.txt", "", b"0", "pw").expect("file");
    assert_eq!(vault.versions().last_version_number(file).expect("last"), 0);

    for payload in [b"1", b"2", b"3"] {
        vault
            .files()
            .update_content(file, payload, "pw", "edit")
            .expect("update");
    }

    assert_eq!(vault.versions().last_version_number(file).expect("last"), 3);
    assert!(vault.versions().version_exists(file, 3).expect("3"));
    assert!(!vault.versions().version_exists(file, 4).expect("4"));
    assert_eq!(vault.files().retrieve_version(file, 3, "pw").expect("v3"), b"2");
}

#[test]
fn duplicate_scores() {
    let vault = Vault::in_memory().expect("vault");
    let target = vault.files().new_file("scan.png", "receipt", b"png", "pw").expect("t");
    let twin = vault.files().new_file("scan.png", "receipt", b"png", "pw").expect("twin");
    let copy = vault.files().new_file("copy.png", "other", b"png", "pw").expect("copy");
    vault.files().new_file("scan.png", "receipt", b"jpg", "pw").expect("unrelated");

    let found = vault.duplicates().find_duplicates(target).expect("scan");

    assert_eq!(found.len(), 2);
    assert_eq!(found[&twin], SimilarityScore(100));
    assert_eq!(found[&copy], SimilarityScore(75));
}

// =============================================================================
// RETENTION
// =============================================================================

#[test]
fn retention_sweep_deletes_expired() {
    let vault = Vault::in_memory().expect("vault");
    let old = vault.documents().new_note(&Note::default()).expect("old");
    let keep = vault.documents().new_note(&Note::default()).expect("keep");
    let now = chrono::Utc::now();
    vault
        .registry()
        .set_deletion_date(old, Some(now - chrono::Duration::hours(1)))
        .expect("set");

    for doc in vault.registry().expired_documents(now).expect("expired") {
        vault.registry().delete(doc).expect("sweep");
    }

    assert_eq!(vault.registry().list(None).expect("list"), vec![keep]);
}

#[test]
fn errors_are_typed() {
    let vault = Vault::in_memory().expect("vault");
    assert!(matches!(
        vault.aspects().create("", ""),
        Err(SatchelError::InvalidArgument(_))
    ));
    assert!(matches!(
        vault.briefcases().delete(BriefcaseId(7)),
        Err(SatchelError::NonExistentResource { .. })
    ));
}
