use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookdex")]
#[command(about = "Index and reconcile a document library", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every document in the summary snapshot, sorted by title
    List,
    /// Show per-directory and per-root document counts
    Summary,
    /// Drop and rebuild the summary snapshot
    Reload,
    /// Reconcile the sync index against the filesystem, then clean up
    Sync(SyncArgs),
    /// Remove stale documents, optionally verifying content hashes
    Cleanup(CleanupArgs),
    /// Look up documents by title (case-insensitive)
    FindTitle(FindTitleArgs),
    /// Look up documents by content hash (hex)
    FindHash(FindHashArgs),
    /// Write all distinct titles to a file
    DumpTitles(DumpTitlesArgs),
    /// Print configuration values
    PrintConfig,
    /// Delete the summary snapshot and the sync store
    ResetDb,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Verify stored hashes during the cleanup pass
    #[arg(short, long)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct CleanupArgs {
    /// Recompute and compare every stored hash
    #[arg(short, long)]
    pub check_hash: bool,
}

#[derive(Debug, Args)]
pub struct FindTitleArgs {
    pub title: String,
}

#[derive(Debug, Args)]
pub struct FindHashArgs {
    /// Content hash as 16 hex digits
    pub hash: String,
}

#[derive(Debug, Args)]
pub struct DumpTitlesArgs {
    pub file: String,
}
