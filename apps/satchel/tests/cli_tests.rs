//! Tests for argument parsing and command execution against a temporary vault.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{TimeZone, Utc};
use clap::Parser;
use satchel::cli::{
    Cli, Commands, Context, FilterOp, ListSource, apply_filter, deletion_date, execute,
    parse_properties,
};
use satchel::{AppConfig, AppError};
use satchel_core::{AspectId, BriefcaseId, DocumentId, DocumentType, VaultConfig};
use std::path::Path;

fn config_in(dir: &Path) -> AppConfig {
    AppConfig {
        database: dir.join("vault.redb"),
        content_dir: dir.join("content"),
        ..AppConfig::default()
    }
}

fn run(dir: &Path, args: &[&str]) -> Result<(), AppError> {
    let mut argv = vec!["satchel", "--quiet"];
    argv.extend_from_slice(args);
    execute(Cli::try_parse_from(argv).unwrap(), &config_in(dir))
}

// =============================================================================
// PARSING
// =============================================================================

#[test]
fn test_parse_global_flags() {
    let cli = Cli::try_parse_from(["satchel", "--json-mode", "-D", "x.redb", "status"]).unwrap();
    assert!(cli.json_mode);
    assert_eq!(cli.database.unwrap().to_str(), Some("x.redb"));
    assert!(matches!(cli.command, Some(Commands::Status)));
}

#[test]
fn test_parse_bookmark_type() {
    let cli = Cli::try_parse_from(["satchel", "bookmark", "list", "URL"]).unwrap();
    match cli.command {
        Some(Commands::Bookmark(satchel::cli::BookmarkCommand::List { doc_type })) => {
            assert_eq!(doc_type, DocumentType::Url);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_parse_list_sources() {
    assert_eq!("1,2, 3".parse::<ListSource>(), Ok(ListSource::Ids(vec![1, 2, 3])));
    assert_eq!(
        "aspect:4".parse::<ListSource>(),
        Ok(ListSource::Aspect(AspectId(4)))
    );
    assert_eq!(
        "briefcase:1".parse::<ListSource>(),
        Ok(ListSource::Briefcase(BriefcaseId::GLOBAL))
    );
    assert_eq!(
        "type:note".parse::<ListSource>(),
        Ok(ListSource::Type(DocumentType::Note))
    );
    assert!("planet:3".parse::<ListSource>().is_err());
    assert!("1,x".parse::<ListSource>().is_err());
}

#[test]
fn test_retention_flags_conflict() {
    let result = Cli::try_parse_from([
        "satchel", "retention", "set", "3", "--days", "2", "--clear",
    ]);
    assert!(result.is_err());
}

// =============================================================================
// PURE HELPERS
// =============================================================================

#[test]
fn test_apply_filter() {
    let lists = vec![vec![1, 2, 3], vec![2, 3, 4], vec![3, 2]];
    assert_eq!(apply_filter(FilterOp::Intersect, &lists).unwrap(), vec![2, 3]);
    assert_eq!(apply_filter(FilterOp::Union, &lists).unwrap(), vec![1, 2, 3, 4]);
    assert!(matches!(
        apply_filter(FilterOp::Xor, &lists),
        Err(AppError::Usage(_))
    ));
    assert_eq!(
        apply_filter(FilterOp::Invert, &lists[..2]).map_err(|e| e.to_string()),
        Err("Invalid argument: subset item at position 2 is not in the superset".to_string())
    );
}

#[test]
fn test_deletion_date() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(deletion_date(None, None, true, now).unwrap(), None);
    assert_eq!(
        deletion_date(None, Some(2), false, now).unwrap(),
        Some(Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap())
    );
    assert_eq!(
        deletion_date(Some("2030-05-01T12:00:00Z"), None, false, now).unwrap(),
        Some(Utc.with_ymd_and_hms(2030, 5, 1, 12, 0, 0).unwrap())
    );
    assert!(deletion_date(None, None, false, now).is_err());
    assert!(deletion_date(Some("tomorrow"), None, false, now).is_err());
}

#[test]
fn test_parse_properties() {
    let map = parse_properties(&["a=1".to_string(), "b = x=y".to_string()]).unwrap();
    assert_eq!(map.get("a").map(String::as_str), Some("1"));
    assert_eq!(map.get("b").map(String::as_str), Some(" x=y"));
    assert!(parse_properties(&["novalue".to_string()]).is_err());
}

// =============================================================================
// EXECUTION
// =============================================================================

#[test]
fn test_init_refuses_existing_database() {
    let temp = tempfile::tempdir().unwrap();
    run(temp.path(), &["init"]).unwrap();
    assert!(matches!(run(temp.path(), &["init"]), Err(AppError::Usage(_))));
    run(temp.path(), &["init", "--force"]).unwrap();
}

#[test]
fn test_briefcase_workflow() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("contract.txt");
    std::fs::write(&source, b"terms").unwrap();

    run(temp.path(), &["init"]).unwrap();
    run(temp.path(), &["briefcase", "create", "Work"]).unwrap();
    run(temp.path(), &["file", "add", source.to_str().unwrap(), "-P", "pw"]).unwrap();
    run(temp.path(), &["briefcase", "move", "2", "1"]).unwrap();

    let ctx = Context {
        database: temp.path().join("vault.redb"),
        content_dir: temp.path().join("content"),
        vault: VaultConfig::default(),
        json_mode: false,
        quiet: true,
    };
    {
        let vault = ctx.open_vault().unwrap();
        assert_eq!(
            vault.briefcases().containing_briefcase(DocumentId(1)).unwrap(),
            BriefcaseId(2)
        );
    }

    run(temp.path(), &["briefcase", "delete", "2"]).unwrap();
    let vault = ctx.open_vault().unwrap();
    assert_eq!(
        vault.briefcases().containing_briefcase(DocumentId(1)).unwrap(),
        BriefcaseId::GLOBAL
    );
    assert_eq!(vault.files().retrieve(DocumentId(1), "pw").unwrap(), b"terms");
}

#[test]
fn test_vault_errors_surface() {
    let temp = tempfile::tempdir().unwrap();
    run(temp.path(), &["aspect", "create", "tax"]).unwrap();
    assert!(matches!(
        run(temp.path(), &["aspect", "create", "tax"]),
        Err(AppError::Vault(satchel_core::SatchelError::DuplicateName(_)))
    ));
    assert!(matches!(
        run(temp.path(), &["briefcase", "delete", "1"]),
        Err(AppError::Vault(satchel_core::SatchelError::InvalidArgument(_)))
    ));
}

#[test]
fn test_retention_sweep() {
    let temp = tempfile::tempdir().unwrap();
    run(temp.path(), &["note", "add", "old"]).unwrap();
    run(temp.path(), &["note", "add", "new"]).unwrap();
    run(
        temp.path(),
        &["retention", "set", "1", "--at", "2000-01-01T00:00:00Z"],
    )
    .unwrap();
    run(temp.path(), &["retention", "sweep"]).unwrap();

    let ctx = Context {
        database: temp.path().join("vault.redb"),
        content_dir: temp.path().join("content"),
        vault: VaultConfig::default(),
        json_mode: false,
        quiet: true,
    };
    let vault = ctx.open_vault().unwrap();
    assert_eq!(vault.registry().list(None).unwrap(), vec![DocumentId(2)]);
}
