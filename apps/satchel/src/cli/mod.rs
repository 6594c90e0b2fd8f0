//! # Satchel CLI Module
//!
//! This module implements the CLI interface for Satchel.
//!
//! ## Available Commands
//!
//! - `init` - Create a new vault
//! - `status` - Show vault counts
//! - `aspect`, `group` - Tags and tag folders
//! - `briefcase`, `collection`, `bookmark` - Containers and favourites
//! - `predicate`, `relation` - Links between documents
//! - `file`, `note`, `url`, `sfd` - Documents
//! - `duplicates` - Rank byte-identical files
//! - `filter` - Combine id lists with set operations
//! - `retention` - Deletion dates and the sweep

mod commands;

use crate::config::AppConfig;
use crate::AppError;
use clap::{Args, Parser, Subcommand, ValueEnum};
use satchel_core::{AspectId, BriefcaseId, CollectionId, DocumentType};
use std::path::PathBuf;
use std::str::FromStr;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Satchel - personal document vault
///
/// Tag, file and relate your documents; keep file history; find duplicates.
#[derive(Parser, Debug)]
#[command(name = "satchel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the config file (default: ./satchel.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the vault database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Directory holding file contents (overrides the config file)
    #[arg(long, global = true)]
    pub content_dir: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new vault
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Show vault counts
    Status,

    /// Manage aspects (tags)
    #[command(subcommand)]
    Aspect(AspectCommand),

    /// Manage aspect groups
    #[command(subcommand)]
    Group(GroupCommand),

    /// Manage briefcases
    #[command(subcommand)]
    Briefcase(BriefcaseCommand),

    /// Manage collections
    #[command(subcommand)]
    Collection(CollectionCommand),

    /// Manage bookmarks
    #[command(subcommand)]
    Bookmark(BookmarkCommand),

    /// Manage relation predicates
    #[command(subcommand)]
    Predicate(PredicateCommand),

    /// Manage relations between documents
    #[command(subcommand)]
    Relation(RelationCommand),

    /// Manage file documents
    #[command(subcommand)]
    File(FileCommand),

    /// Manage notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Manage saved URLs
    #[command(subcommand)]
    Url(UrlCommand),

    /// Manage schema-free documents
    #[command(subcommand)]
    Sfd(SfdCommand),

    /// List files with the same content as a file, with similarity scores
    Duplicates {
        /// File document id
        file: u64,
    },

    /// Combine id lists with a set operation
    Filter {
        /// Operation to apply
        #[arg(value_enum)]
        op: FilterOp,

        /// Lists: `1,2,3`, `aspect:ID`, `collection:ID`, `briefcase:ID` or `type:NAME`
        #[arg(required = true)]
        lists: Vec<ListSource>,
    },

    /// Deletion dates and the retention sweep
    #[command(subcommand)]
    Retention(RetentionCommand),
}

/// Shared `--name`/`--description` pair.
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Name
    pub name: String,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,
}

#[derive(Subcommand, Debug)]
pub enum AspectCommand {
    /// Create an aspect
    Create(NameArgs),
    /// List aspects
    List,
    /// Rename an aspect
    Rename { id: u64, name: String },
    /// Delete an aspect and all its joins
    Delete { id: u64 },
    /// Apply an aspect to documents
    Apply {
        aspect: u64,
        #[arg(required = true)]
        documents: Vec<u64>,
    },
    /// Remove an aspect from a document
    Unapply { aspect: u64, document: u64 },
    /// Documents carrying an aspect
    Documents { aspect: u64 },
    /// Aspects on a document
    On { document: u64 },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create an aspect group (parent 0 is the root)
    Create {
        #[command(flatten)]
        names: NameArgs,
        #[arg(short, long, default_value = "0")]
        parent: u64,
    },
    /// List the children of a group (0 is the root)
    Children {
        #[arg(default_value = "0")]
        parent: u64,
    },
    /// File an aspect into a group (0 removes it from its group)
    Assign { aspect: u64, group: u64 },
    /// Delete an empty group
    Delete { id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum BriefcaseCommand {
    /// Create a briefcase
    Create(NameArgs),
    /// List briefcases
    List,
    /// Rename a briefcase
    Rename { id: u64, name: String },
    /// Delete a briefcase; its documents return to Global
    Delete { id: u64 },
    /// Move documents into a briefcase
    Move {
        briefcase: u64,
        #[arg(required = true)]
        documents: Vec<u64>,
    },
    /// Return a document to the Global Briefcase
    Remove { document: u64 },
    /// Documents in a briefcase
    Contents { id: u64 },
    /// Briefcase holding a document
    Of { document: u64 },
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommand {
    /// Create a collection
    Create(NameArgs),
    /// List collections
    List,
    /// Rename a collection
    Rename { id: u64, name: String },
    /// Delete a collection (documents are kept)
    Delete { id: u64 },
    /// Add documents to a collection
    Add {
        collection: u64,
        #[arg(required = true)]
        documents: Vec<u64>,
    },
    /// Remove a document from a collection
    Remove { collection: u64, document: u64 },
    /// Documents in a collection
    Contents { id: u64 },
    /// Collections holding a document
    Of { document: u64 },
}

#[derive(Subcommand, Debug)]
pub enum BookmarkCommand {
    /// Bookmark a document
    Add { document: u64 },
    /// Remove a bookmark
    Remove { document: u64 },
    /// Bookmarked documents of one type (file, note, url)
    List { doc_type: DocumentType },
}

#[derive(Subcommand, Debug)]
pub enum PredicateCommand {
    /// Add a predicate
    Create { text: String },
    /// List predicates
    List,
    /// Delete a predicate and every relation using it
    Delete { id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum RelationCommand {
    /// Relate subject to object
    Add {
        subject: u64,
        predicate: u64,
        object: u64,
    },
    /// Predicates from subject to object
    Between { subject: u64, object: u64 },
    /// Remove one relation, or all between the pair without --predicate
    Remove {
        subject: u64,
        object: u64,
        #[arg(short, long)]
        predicate: Option<u64>,
    },
    /// Outgoing and incoming relations of a document
    Show { document: u64 },
}

/// Shared passphrase argument for file content.
#[derive(Args, Debug)]
pub struct PassphraseArg {
    /// Passphrase the content is stored under
    #[arg(short = 'P', long, default_value = "")]
    pub passphrase: String,
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// Store a local file
    Add {
        path: PathBuf,
        /// Name in the vault (default: the file name)
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        narration: String,
        #[command(flatten)]
        secret: PassphraseArg,
    },
    /// Replace the content; the previous content becomes a version
    Update {
        id: u64,
        path: PathBuf,
        #[arg(short = 'm', long, default_value = "")]
        comment: String,
        #[command(flatten)]
        secret: PassphraseArg,
    },
    /// Write the content (or a version) to a local file
    Get {
        id: u64,
        output: PathBuf,
        #[arg(long)]
        version: Option<u32>,
        #[command(flatten)]
        secret: PassphraseArg,
    },
    /// Show file metadata
    Info { id: u64 },
    /// Show version history
    History { id: u64 },
    /// Rename a file
    Rename { id: u64, name: String },
    /// Set a file's narration
    Narrate { id: u64, narration: String },
    /// Delete a file and its history
    Delete { id: u64 },
    /// List files
    List,
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// Create a note
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        body: String,
    },
    /// Show a note
    Show { id: u64 },
    /// Change a note's title or body
    Edit {
        id: u64,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Delete a note
    Delete { id: u64 },
    /// List notes
    List,
}

#[derive(Subcommand, Debug)]
pub enum UrlCommand {
    /// Save a URL
    Add {
        url: String,
        #[arg(short, long, default_value = "")]
        title: String,
    },
    /// Show a saved URL
    Show { id: u64 },
    /// Delete a saved URL
    Delete { id: u64 },
    /// List saved URLs
    List,
}

#[derive(Subcommand, Debug)]
pub enum SfdCommand {
    /// Create a schema-free document from `key=value` pairs
    Add { properties: Vec<String> },
    /// Show a schema-free document
    Show { id: u64 },
    /// Set a property
    Set { id: u64, key: String, value: String },
    /// Remove a property
    Unset { id: u64, key: String },
    /// Delete a schema-free document
    Delete { id: u64 },
    /// List schema-free documents
    List,
}

#[derive(Subcommand, Debug)]
pub enum RetentionCommand {
    /// Schedule or cancel the deletion of a document
    Set {
        document: u64,
        /// RFC 3339 date-time
        #[arg(long, conflicts_with_all = ["days", "clear"])]
        at: Option<String>,
        /// Days from now
        #[arg(long, conflicts_with = "clear")]
        days: Option<i64>,
        /// Cancel a scheduled deletion
        #[arg(long)]
        clear: bool,
    },
    /// Documents whose deletion date has passed
    Expired,
    /// Delete every expired document
    Sweep {
        /// Only list what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

// =============================================================================
// FILTER ARGUMENTS
// =============================================================================

/// Set operation for the `filter` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterOp {
    /// Items in any list
    Union,
    /// Items in every list
    Intersect,
    /// Items in exactly one of two lists
    Xor,
    /// First list without the second
    Invert,
}

/// Where a `filter` operand comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    Ids(Vec<u64>),
    Aspect(AspectId),
    Collection(CollectionId),
    Briefcase(BriefcaseId),
    Type(DocumentType),
}

impl FromStr for ListSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_id = |v: &str| v.parse::<u64>().map_err(|e| format!("bad id '{}': {}", v, e));
        match s.split_once(':') {
            Some(("aspect", v)) => Ok(Self::Aspect(AspectId(parse_id(v)?))),
            Some(("collection", v)) => Ok(Self::Collection(CollectionId(parse_id(v)?))),
            Some(("briefcase", v)) => Ok(Self::Briefcase(BriefcaseId(parse_id(v)?))),
            Some(("type", v)) => v.parse().map(Self::Type).map_err(|e| format!("{}", e)),
            Some((source, _)) => Err(format!("unknown list source '{}'", source)),
            None if s.trim().is_empty() => Ok(Self::Ids(Vec::new())),
            None => s
                .split(',')
                .map(|v| parse_id(v.trim()))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Ids),
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and the loaded config.
pub fn execute(cli: Cli, config: &AppConfig) -> Result<(), AppError> {
    let ctx = Context {
        database: cli.database.unwrap_or_else(|| config.database.clone()),
        content_dir: cli.content_dir.unwrap_or_else(|| config.content_dir.clone()),
        vault: config.vault.clone(),
        json_mode: cli.json_mode,
        quiet: cli.quiet,
    };

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Status) | None => cmd_status(&ctx),
        Some(Commands::Aspect(command)) => cmd_aspect(&ctx, command),
        Some(Commands::Group(command)) => cmd_group(&ctx, command),
        Some(Commands::Briefcase(command)) => cmd_briefcase(&ctx, command),
        Some(Commands::Collection(command)) => cmd_collection(&ctx, command),
        Some(Commands::Bookmark(command)) => cmd_bookmark(&ctx, command),
        Some(Commands::Predicate(command)) => cmd_predicate(&ctx, command),
        Some(Commands::Relation(command)) => cmd_relation(&ctx, command),
        Some(Commands::File(command)) => cmd_file(&ctx, command),
        Some(Commands::Note(command)) => cmd_note(&ctx, command),
        Some(Commands::Url(command)) => cmd_url(&ctx, command),
        Some(Commands::Sfd(command)) => cmd_sfd(&ctx, command),
        Some(Commands::Duplicates { file }) => cmd_duplicates(&ctx, file),
        Some(Commands::Filter { op, lists }) => cmd_filter(&ctx, op, &lists),
        Some(Commands::Retention(command)) => cmd_retention(&ctx, command),
    }
}
