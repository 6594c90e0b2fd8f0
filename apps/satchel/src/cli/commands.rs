//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{
    AspectCommand, BookmarkCommand, BriefcaseCommand, CollectionCommand, FileCommand, FilterOp,
    GroupCommand, ListSource, NoteCommand, PredicateCommand, RelationCommand, RetentionCommand,
    SfdCommand, UrlCommand,
};
use crate::AppError;
use chrono::{DateTime, Duration, Utc};
use satchel_core::{
    AspectGroupId, AspectId, BriefcaseId, CollectionId, DirectoryContentStorage, DocumentId,
    DocumentType, Note, PredicateId, RedbStore, SchemaFreeDoc, TracingIndexer, UrlRecord, Vault,
    VaultConfig, filter,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Maximum size of a local file accepted by `file add` / `file update` (256 MB).
const MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Settings resolved from flags and the config file.
#[derive(Debug, Clone)]
pub struct Context {
    pub database: PathBuf,
    pub content_dir: PathBuf,
    pub vault: VaultConfig,
    pub json_mode: bool,
    pub quiet: bool,
}

impl Context {
    /// Open the vault at the configured paths.
    pub fn open_vault(&self) -> Result<Vault<RedbStore>, AppError> {
        let content = DirectoryContentStorage::open(&self.content_dir)?;
        Ok(Vault::open(&self.database, self.vault.clone())?
            .with_content_storage(content)
            .with_indexer(TracingIndexer))
    }

    /// Print `value` as JSON, or run `text` to print it for humans.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<(), AppError> {
        if self.json_mode {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| AppError::Io(format!("cannot encode output: {}", e)))?;
            println!("{}", json);
        } else if !self.quiet {
            text();
        }
        Ok(())
    }

    /// Report a mutation that has no interesting result.
    fn done(&self, message: &str) -> Result<(), AppError> {
        self.emit(&serde_json::json!({ "ok": true, "message": message }), || {
            println!("{}", message);
        })
    }

    /// Report a list of document ids.
    fn ids(&self, title: &str, ids: &[DocumentId]) -> Result<(), AppError> {
        self.emit(&ids, || {
            println!("{} ({})", title, ids.len());
            for id in ids {
                println!("  {}", id);
            }
        })
    }
}

fn read_local_file(path: &Path) -> Result<Vec<u8>, AppError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AppError::Io(format!("cannot read '{}': {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(AppError::Io(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_FILE_SIZE {
        return Err(AppError::Io(format!(
            "file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_FILE_SIZE
        )));
    }
    std::fs::read(path).map_err(|e| AppError::Io(format!("cannot read '{}': {}", path.display(), e)))
}

fn documents(ids: &[u64]) -> Vec<DocumentId> {
    ids.iter().copied().map(DocumentId).collect()
}

// =============================================================================
// INIT & STATUS
// =============================================================================

/// Create a new vault.
pub fn cmd_init(ctx: &Context, force: bool) -> Result<(), AppError> {
    if ctx.database.exists() {
        if !force {
            return Err(AppError::Usage(format!(
                "database {} already exists (use --force to replace it)",
                ctx.database.display()
            )));
        }
        std::fs::remove_file(&ctx.database).map_err(|e| {
            AppError::Io(format!("cannot remove {}: {}", ctx.database.display(), e))
        })?;
        tracing::warn!(database = %ctx.database.display(), "replaced existing database");
    }
    ctx.open_vault()?;
    tracing::info!(database = %ctx.database.display(), "initialized vault");
    ctx.done(&format!("Initialized vault at {}", ctx.database.display()))
}

/// Show vault counts.
pub fn cmd_status(ctx: &Context) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let registry = vault.registry();

    let mut by_type = BTreeMap::new();
    for doc_type in DocumentType::ALL {
        by_type.insert(doc_type.name(), registry.list(Some(doc_type))?.len());
    }
    let briefcases = vault.briefcases().list()?.len();
    let aspects = vault.aspects().list()?.len();
    let collections = vault.collections().list()?.len();
    let predicates = vault.relations().predicates()?.len();
    let expired = registry.expired_documents(Utc::now())?.len();

    let output = serde_json::json!({
        "database": ctx.database.to_string_lossy(),
        "content_dir": ctx.content_dir.to_string_lossy(),
        "documents": &by_type,
        "briefcases": briefcases,
        "aspects": aspects,
        "collections": collections,
        "predicates": predicates,
        "expired": expired,
    });
    ctx.emit(&output, || {
        println!("Satchel Vault Status");
        println!("====================");
        println!("Database: {}", ctx.database.display());
        println!("Content:  {}", ctx.content_dir.display());
        println!();
        for (name, count) in &by_type {
            println!("{:<12}{}", format!("{}s:", name), count);
        }
        println!();
        println!("Briefcases:  {}", briefcases);
        println!("Aspects:     {}", aspects);
        println!("Collections: {}", collections);
        println!("Predicates:  {}", predicates);
        println!("Expired:     {}", expired);
    })
}

// =============================================================================
// CLASSIFICATION COMMANDS
// =============================================================================

pub fn cmd_aspect(ctx: &Context, command: AspectCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let aspects = vault.aspects();
    match command {
        AspectCommand::Create(args) => {
            let id = aspects.create(&args.name, &args.description)?;
            ctx.emit(&serde_json::json!({ "id": id }), || {
                println!("Created aspect {} ({})", id, args.name);
            })
        }
        AspectCommand::List => {
            let list = aspects.list()?;
            ctx.emit(&list, || {
                for aspect in &list {
                    let group = aspect.group.map(|g| format!(" [group {}]", g));
                    println!(
                        "{:>6}  {}{}",
                        aspect.id,
                        aspect.name,
                        group.unwrap_or_default()
                    );
                }
            })
        }
        AspectCommand::Rename { id, name } => {
            aspects.rename(AspectId(id), &name)?;
            ctx.done(&format!("Renamed aspect {} to {}", id, name))
        }
        AspectCommand::Delete { id } => {
            aspects.delete(AspectId(id))?;
            ctx.done(&format!("Deleted aspect {}", id))
        }
        AspectCommand::Apply { aspect, documents: docs } => {
            let applied = aspects.apply_to_multiple(&[AspectId(aspect)], &documents(&docs))?;
            ctx.done(&format!("Applied aspect {} to {} document(s)", aspect, applied))
        }
        AspectCommand::Unapply { aspect, document } => {
            let rows = aspects.unapply(AspectId(aspect), DocumentId(document))?;
            ctx.emit(&serde_json::json!({ "rows": rows }), || {
                println!("Removed {} join(s)", rows);
            })
        }
        AspectCommand::Documents { aspect } => {
            let ids = aspects.documents_with(AspectId(aspect))?;
            ctx.ids(&format!("Documents tagged {}", aspect), &ids)
        }
        AspectCommand::On { document } => {
            let list: Vec<_> = aspects
                .aspects_on(DocumentId(document))?
                .into_iter()
                .map(|id| aspects.get(id))
                .collect::<Result<_, _>>()?;
            ctx.emit(&list, || {
                for aspect in &list {
                    println!("{:>6}  {}", aspect.id, aspect.name);
                }
            })
        }
    }
}

pub fn cmd_group(ctx: &Context, command: GroupCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let groups = vault.aspect_groups();
    match command {
        GroupCommand::Create { names, parent } => {
            let parent = AspectGroupId(parent);
            if groups.exists_at_level(parent, &names.name)? {
                return Err(satchel_core::SatchelError::DuplicateName(names.name).into());
            }
            let id = groups.create(parent, &names.name, &names.description)?;
            ctx.emit(&serde_json::json!({ "id": id }), || {
                println!("Created aspect group {} ({})", id, names.name);
            })
        }
        GroupCommand::Children { parent } => {
            let list = groups.children(AspectGroupId(parent))?;
            ctx.emit(&list, || {
                for group in &list {
                    println!("{:>6}  {}", group.id, group.name);
                }
            })
        }
        GroupCommand::Assign { aspect, group } => {
            groups.assign_aspect(AspectId(aspect), AspectGroupId(group))?;
            ctx.done(&format!("Filed aspect {} into group {}", aspect, group))
        }
        GroupCommand::Delete { id } => {
            groups.delete(AspectGroupId(id))?;
            ctx.done(&format!("Deleted aspect group {}", id))
        }
    }
}

pub fn cmd_briefcase(ctx: &Context, command: BriefcaseCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let briefcases = vault.briefcases();
    match command {
        BriefcaseCommand::Create(args) => {
            let id = briefcases.create(&args.name, &args.description)?;
            ctx.emit(&serde_json::json!({ "id": id }), || {
                println!("Created briefcase {} ({})", id, args.name);
            })
        }
        BriefcaseCommand::List => {
            let list = briefcases.list()?;
            ctx.emit(&list, || {
                for briefcase in &list {
                    println!("{:>6}  {}", briefcase.id, briefcase.name);
                }
            })
        }
        BriefcaseCommand::Rename { id, name } => {
            briefcases.rename(BriefcaseId(id), &name)?;
            ctx.done(&format!("Renamed briefcase {} to {}", id, name))
        }
        BriefcaseCommand::Delete { id } => {
            briefcases.delete(BriefcaseId(id))?;
            ctx.done(&format!("Deleted briefcase {}", id))
        }
        BriefcaseCommand::Move { briefcase, documents: docs } => {
            let moved = briefcases.move_documents(&documents(&docs), BriefcaseId(briefcase))?;
            ctx.done(&format!("Moved {} document(s) to briefcase {}", moved, briefcase))
        }
        BriefcaseCommand::Remove { document } => {
            briefcases.remove_from_briefcase(DocumentId(document))?;
            ctx.done(&format!("Document {} returned to the Global Briefcase", document))
        }
        BriefcaseCommand::Contents { id } => {
            let ids = briefcases.documents_in(BriefcaseId(id))?;
            ctx.ids(&format!("Briefcase {}", id), &ids)
        }
        BriefcaseCommand::Of { document } => {
            let briefcase = briefcases.get(briefcases.containing_briefcase(DocumentId(document))?)?;
            ctx.emit(&briefcase, || {
                println!("{:>6}  {}", briefcase.id, briefcase.name);
            })
        }
    }
}

pub fn cmd_collection(ctx: &Context, command: CollectionCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let collections = vault.collections();
    match command {
        CollectionCommand::Create(args) => {
            let id = collections.create(&args.name, &args.description)?;
            ctx.emit(&serde_json::json!({ "id": id }), || {
                println!("Created collection {} ({})", id, args.name);
            })
        }
        CollectionCommand::List => {
            let list = collections.list()?;
            ctx.emit(&list, || {
                for collection in &list {
                    println!("{:>6}  {}", collection.id, collection.name);
                }
            })
        }
        CollectionCommand::Rename { id, name } => {
            collections.rename(CollectionId(id), &name)?;
            ctx.done(&format!("Renamed collection {} to {}", id, name))
        }
        CollectionCommand::Delete { id } => {
            collections.delete(CollectionId(id))?;
            ctx.done(&format!("Deleted collection {}", id))
        }
        CollectionCommand::Add { collection, documents: docs } => {
            let added = collections.add_documents_to(CollectionId(collection), &documents(&docs))?;
            ctx.done(&format!("Added {} document(s) to collection {}", added, collection))
        }
        CollectionCommand::Remove { collection, document } => {
            let rows = collections.remove(CollectionId(collection), DocumentId(document))?;
            ctx.emit(&serde_json::json!({ "rows": rows }), || {
                println!("Removed {} membership(s)", rows);
            })
        }
        CollectionCommand::Contents { id } => {
            let ids = collections.documents_in(CollectionId(id))?;
            ctx.ids(&format!("Collection {}", id), &ids)
        }
        CollectionCommand::Of { document } => {
            let list: Vec<_> = collections
                .collections_of(DocumentId(document))?
                .into_iter()
                .map(|id| collections.get(id))
                .collect::<Result<_, _>>()?;
            ctx.emit(&list, || {
                for collection in &list {
                    println!("{:>6}  {}", collection.id, collection.name);
                }
            })
        }
    }
}

pub fn cmd_bookmark(ctx: &Context, command: BookmarkCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let bookmarks = vault.bookmarks();
    match command {
        BookmarkCommand::Add { document } => {
            bookmarks.bookmark(DocumentId(document))?;
            ctx.done(&format!("Bookmarked document {}", document))
        }
        BookmarkCommand::Remove { document } => {
            let rows = bookmarks.unbookmark(DocumentId(document))?;
            ctx.emit(&serde_json::json!({ "rows": rows }), || {
                println!("Removed {} bookmark(s)", rows);
            })
        }
        BookmarkCommand::List { doc_type } => {
            let ids = bookmarks.bookmarked(doc_type)?;
            ctx.ids(&format!("Bookmarked {}s", doc_type), &ids)
        }
    }
}

// =============================================================================
// RELATION COMMANDS
// =============================================================================

pub fn cmd_predicate(ctx: &Context, command: PredicateCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let relations = vault.relations();
    match command {
        PredicateCommand::Create { text } => {
            let id = relations.new_predicate(&text)?;
            ctx.emit(&serde_json::json!({ "id": id }), || {
                println!("Created predicate {} ({})", id, text);
            })
        }
        PredicateCommand::List => {
            let list = relations.predicates()?;
            ctx.emit(&list, || {
                for predicate in &list {
                    println!("{:>6}  {}", predicate.id, predicate.text);
                }
            })
        }
        PredicateCommand::Delete { id } => {
            let removed = relations.delete_predicate(PredicateId(id))?;
            ctx.done(&format!("Deleted predicate {} and {} relation(s)", id, removed))
        }
    }
}

pub fn cmd_relation(ctx: &Context, command: RelationCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let relations = vault.relations();
    match command {
        RelationCommand::Add { subject, predicate, object } => {
            relations.new_relation(DocumentId(subject), DocumentId(object), PredicateId(predicate))?;
            ctx.done(&format!("Related {} -[{}]-> {}", subject, predicate, object))
        }
        RelationCommand::Between { subject, object } => {
            let predicates = relations.relations_between(DocumentId(subject), DocumentId(object))?;
            ctx.emit(&predicates, || {
                for predicate in &predicates {
                    println!("{} -[{}]-> {}", subject, predicate, object);
                }
            })
        }
        RelationCommand::Remove { subject, object, predicate } => {
            let (s, o) = (DocumentId(subject), DocumentId(object));
            let rows = match predicate {
                Some(p) => relations.remove_specific(s, o, PredicateId(p))?,
                None => relations.remove_all(s, o)?,
            };
            ctx.emit(&serde_json::json!({ "rows": rows }), || {
                println!("Removed {} relation(s)", rows);
            })
        }
        RelationCommand::Show { document } => {
            let outgoing = relations.relations_from(DocumentId(document))?;
            let incoming = relations.relations_to(DocumentId(document))?;
            let output = serde_json::json!({ "outgoing": outgoing, "incoming": incoming });
            ctx.emit(&output, || {
                for r in outgoing.iter().chain(&incoming) {
                    println!("{} -[{}]-> {}", r.subject, r.predicate, r.object);
                }
            })
        }
    }
}

// =============================================================================
// DOCUMENT COMMANDS
// =============================================================================

pub fn cmd_file(ctx: &Context, command: FileCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let files = vault.files();
    match command {
        FileCommand::Add { path, name, narration, secret } => {
            let payload = read_local_file(&path)?;
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| AppError::Usage("path has no file name".to_string()))?,
            };
            let id = files.new_file(&name, &narration, &payload, &secret.passphrase)?;
            ctx.emit(&serde_json::json!({ "id": id, "size": payload.len() }), || {
                println!("Stored {} as document {} ({} bytes)", name, id, payload.len());
            })
        }
        FileCommand::Update { id, path, comment, secret } => {
            let payload = read_local_file(&path)?;
            let version =
                files.update_content(DocumentId(id), &payload, &secret.passphrase, &comment)?;
            ctx.emit(&serde_json::json!({ "id": id, "version": version }), || {
                println!("Updated file {}; previous content saved as version {}", id, version);
            })
        }
        FileCommand::Get { id, output, version, secret } => {
            let bytes = match version {
                Some(n) => files.retrieve_version(DocumentId(id), n, &secret.passphrase)?,
                None => files.retrieve(DocumentId(id), &secret.passphrase)?,
            };
            std::fs::write(&output, &bytes)
                .map_err(|e| AppError::Io(format!("cannot write {}: {}", output.display(), e)))?;
            ctx.done(&format!("Wrote {} bytes to {}", bytes.len(), output.display()))
        }
        FileCommand::Info { id } => {
            let record = files.get(DocumentId(id))?;
            ctx.emit(&record, || {
                println!("File {}", record.id);
                println!("  Name:      {}", record.name);
                println!("  Narration: {}", record.narration);
                println!("  Size:      {} bytes", record.size);
                println!("  BLAKE3:    {}", record.content_hash);
                println!("  Modified:  {}", record.modified_at.to_rfc3339());
            })
        }
        FileCommand::History { id } => {
            let history = vault.versions().history(DocumentId(id))?;
            ctx.emit(&history, || {
                for v in &history {
                    println!("{:>4}  {}  {}", v.number, v.saved_at.to_rfc3339(), v.comment);
                }
            })
        }
        FileCommand::Rename { id, name } => {
            files.rename(DocumentId(id), &name)?;
            ctx.done(&format!("Renamed file {} to {}", id, name))
        }
        FileCommand::Narrate { id, narration } => {
            files.set_narration(DocumentId(id), &narration)?;
            ctx.done(&format!("Updated narration of file {}", id))
        }
        FileCommand::Delete { id } => {
            files.delete(DocumentId(id))?;
            ctx.done(&format!("Deleted file {}", id))
        }
        FileCommand::List => {
            let list = files.list()?;
            ctx.emit(&list, || {
                for file in &list {
                    println!("{:>6}  {:>10}  {}", file.id, file.size, file.name);
                }
            })
        }
    }
}

pub fn cmd_note(ctx: &Context, command: NoteCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let documents = vault.documents();
    match command {
        NoteCommand::Add { title, body } => {
            let id = documents.new_note(&Note { title, body })?;
            ctx.emit(&serde_json::json!({ "id": id }), || {
                println!("Created note {}", id);
            })
        }
        NoteCommand::Show { id } => {
            let note = documents.note(DocumentId(id))?;
            ctx.emit(&note, || {
                println!("{}", note.title);
                println!();
                println!("{}", note.body);
            })
        }
        NoteCommand::Edit { id, title, body } => {
            let mut note = documents.note(DocumentId(id))?;
            if let Some(title) = title {
                note.title = title;
            }
            if let Some(body) = body {
                note.body = body;
            }
            documents.update(DocumentId(id), &note)?;
            ctx.done(&format!("Updated note {}", id))
        }
        NoteCommand::Delete { id } => {
            documents.delete::<Note>(DocumentId(id))?;
            ctx.done(&format!("Deleted note {}", id))
        }
        NoteCommand::List => {
            let ids = documents.list::<Note>()?;
            ctx.ids("Notes", &ids)
        }
    }
}

pub fn cmd_url(ctx: &Context, command: UrlCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let documents = vault.documents();
    match command {
        UrlCommand::Add { url, title } => {
            let id = documents.new_url(&UrlRecord { url, title })?;
            ctx.emit(&serde_json::json!({ "id": id }), || {
                println!("Saved URL as document {}", id);
            })
        }
        UrlCommand::Show { id } => {
            let record = documents.url(DocumentId(id))?;
            ctx.emit(&record, || {
                println!("{}  {}", record.url, record.title);
            })
        }
        UrlCommand::Delete { id } => {
            documents.delete::<UrlRecord>(DocumentId(id))?;
            ctx.done(&format!("Deleted URL {}", id))
        }
        UrlCommand::List => {
            let ids = documents.list::<UrlRecord>()?;
            ctx.ids("URLs", &ids)
        }
    }
}

/// Split `key=value` arguments into a property map.
pub fn parse_properties(pairs: &[String]) -> Result<BTreeMap<String, String>, AppError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| AppError::Usage(format!("expected key=value, got '{}'", pair)))
        })
        .collect()
}

pub fn cmd_sfd(ctx: &Context, command: SfdCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let documents = vault.documents();
    match command {
        SfdCommand::Add { properties } => {
            let doc = SchemaFreeDoc {
                properties: parse_properties(&properties)?,
            };
            let id = documents.new_sfd(&doc)?;
            ctx.emit(&serde_json::json!({ "id": id }), || {
                println!("Created schema-free document {}", id);
            })
        }
        SfdCommand::Show { id } => {
            let doc = documents.sfd(DocumentId(id))?;
            ctx.emit(&doc.properties, || {
                for (key, value) in &doc.properties {
                    println!("{} = {}", key, value);
                }
            })
        }
        SfdCommand::Set { id, key, value } => {
            documents.set_property(DocumentId(id), &key, &value)?;
            ctx.done(&format!("Set {} on document {}", key, id))
        }
        SfdCommand::Unset { id, key } => {
            let removed = documents.remove_property(DocumentId(id), &key)?;
            ctx.emit(&serde_json::json!({ "removed": removed }), || {
                println!("{}", if removed { "Removed" } else { "Not present" });
            })
        }
        SfdCommand::Delete { id } => {
            documents.delete::<SchemaFreeDoc>(DocumentId(id))?;
            ctx.done(&format!("Deleted schema-free document {}", id))
        }
        SfdCommand::List => {
            let ids = documents.list::<SchemaFreeDoc>()?;
            ctx.ids("Schema-free documents", &ids)
        }
    }
}

// =============================================================================
// DUPLICATES & FILTER
// =============================================================================

pub fn cmd_duplicates(ctx: &Context, file: u64) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let found = vault.duplicates().find_duplicates(DocumentId(file))?;
    let output: Vec<_> = found
        .iter()
        .map(|(id, score)| serde_json::json!({ "document": id, "score": score.percent() }))
        .collect();
    ctx.emit(&output, || {
        if found.is_empty() {
            println!("No duplicates of file {}", file);
        }
        for (id, score) in &found {
            println!("{:>6}  {}", id, score);
        }
    })
}

/// Materialize one filter operand.
fn resolve_list(vault: Option<&Vault<RedbStore>>, source: &ListSource) -> Result<Vec<u64>, AppError> {
    let ids = match (source, vault) {
        (ListSource::Ids(ids), _) => return Ok(ids.clone()),
        (ListSource::Aspect(id), Some(vault)) => vault.aspects().documents_with(*id)?,
        (ListSource::Collection(id), Some(vault)) => vault.collections().documents_in(*id)?,
        (ListSource::Briefcase(id), Some(vault)) => vault.briefcases().documents_in(*id)?,
        (ListSource::Type(t), Some(vault)) => vault.registry().list(Some(*t))?,
        (_, None) => return Err(AppError::Usage("list source needs a vault".to_string())),
    };
    Ok(ids.into_iter().map(|d| d.value()).collect())
}

/// Apply a set operation to operands; pure so it can be tested without a vault.
pub fn apply_filter(op: FilterOp, lists: &[Vec<u64>]) -> Result<Vec<u64>, AppError> {
    match (op, lists) {
        (FilterOp::Union, _) => Ok(filter::union_all(lists)),
        (FilterOp::Intersect, _) => Ok(filter::intersect_all(lists)),
        (FilterOp::Xor, [a, b]) => Ok(filter::symmetric_difference(a, b)),
        (FilterOp::Invert, [superset, subset]) => Ok(filter::invert(superset, subset)?),
        (FilterOp::Xor | FilterOp::Invert, _) => Err(AppError::Usage(format!(
            "{:?} takes exactly two lists, got {}",
            op,
            lists.len()
        ))),
    }
}

pub fn cmd_filter(ctx: &Context, op: FilterOp, sources: &[ListSource]) -> Result<(), AppError> {
    let needs_vault = sources.iter().any(|s| !matches!(s, ListSource::Ids(_)));
    let vault = if needs_vault { Some(ctx.open_vault()?) } else { None };
    let lists = sources
        .iter()
        .map(|s| resolve_list(vault.as_ref(), s))
        .collect::<Result<Vec<_>, _>>()?;

    let result = apply_filter(op, &lists)?;
    ctx.emit(&result, || {
        let text: Vec<String> = result.iter().map(u64::to_string).collect();
        println!("{}", text.join(","));
    })
}

// =============================================================================
// RETENTION
// =============================================================================

/// Resolve the deletion date of `retention set`.
pub fn deletion_date(
    at: Option<&str>,
    days: Option<i64>,
    clear: bool,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    match (at, days, clear) {
        (_, _, true) => Ok(None),
        (Some(at), _, _) => DateTime::parse_from_rfc3339(at)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|e| AppError::Usage(format!("bad date '{}': {}", at, e))),
        (None, Some(days), _) => Duration::try_days(days)
            .and_then(|d| now.checked_add_signed(d))
            .map(Some)
            .ok_or_else(|| AppError::Usage(format!("{} days is out of range", days))),
        (None, None, false) => Err(AppError::Usage(
            "give one of --at, --days or --clear".to_string(),
        )),
    }
}

pub fn cmd_retention(ctx: &Context, command: RetentionCommand) -> Result<(), AppError> {
    let vault = ctx.open_vault()?;
    let registry = vault.registry();
    let now = Utc::now();
    match command {
        RetentionCommand::Set { document, at, days, clear } => {
            let date = deletion_date(at.as_deref(), days, clear, now)?;
            registry.set_deletion_date(DocumentId(document), date)?;
            let message = match date {
                Some(date) => format!("Document {} will expire at {}", document, date.to_rfc3339()),
                None => format!("Document {} no longer expires", document),
            };
            ctx.done(&message)
        }
        RetentionCommand::Expired => {
            let ids = registry.expired_documents(now)?;
            ctx.ids("Expired documents", &ids)
        }
        RetentionCommand::Sweep { dry_run } => {
            let ids = registry.expired_documents(now)?;
            if !dry_run {
                for id in &ids {
                    registry.delete(*id)?;
                }
                tracing::info!(deleted = ids.len(), "retention sweep");
            }
            let verb = if dry_run { "Would delete" } else { "Deleted" };
            ctx.ids(verb, &ids)
        }
    }
}
