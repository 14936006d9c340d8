use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::enums::{CodeMode, PresetName};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate context files and the context index for a project
    ///
    /// Every source file under ROOT is reduced to a contract; contracts are
    /// linked into a dependency graph and packed into bundles, one
    /// context.json per folder plus a context_main.json index.
    Context(ContextArgs),

    /// Compare two generations and report drift
    ///
    /// OLD and NEW are either two context_main.json indexes (folder-level
    /// compare) or two context.json bundle arrays.
    Compare(CompareArgs),

    /// Print the JSON schema of stamp.config.json
    Schema,
}

#[derive(Args, Debug, Default)]
pub struct ContextArgs {
    /// Project root to scan
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Config file (defaults to ROOT/stamp.config.json when present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum dependency hops from each bundle entry
    #[arg(short, long, value_name = "N")]
    pub depth: Option<usize>,

    /// Maximum nodes per bundle
    #[arg(long, value_name = "N")]
    pub max_nodes: Option<usize>,

    /// How much source text each bundle node carries
    #[arg(long, value_enum, value_name = "MODE")]
    pub include_code: Option<CodeMode>,

    /// Reduce props and emits to one interaction style
    #[arg(long, value_enum)]
    pub preset: Option<PresetName>,

    /// Fail when a bundle has unresolved component dependencies
    #[arg(long)]
    pub strict_missing: bool,

    /// Directory to write context files into (defaults to ROOT)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Maximum number of files read concurrently
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Secret-scan report whose findings are redacted from code excerpts
    #[arg(long, value_name = "PATH")]
    pub secrets_report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Older generation (context_main.json or context.json)
    #[arg(value_name = "OLD")]
    pub old: PathBuf,

    /// Newer generation (context_main.json or context.json)
    #[arg(value_name = "NEW")]
    pub new: PathBuf,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Accept the drift: overwrite OLD with NEW for single files, delete
    /// orphaned context files for indexes
    #[arg(long)]
    pub approve: bool,
}
