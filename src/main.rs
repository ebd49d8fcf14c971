mod logging;

use std::collections::BTreeSet;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use humansize::{format_size, BINARY};
use serde::Serialize;
use tracing::debug;

use surge::cleaner::{CandidateItem, Category, DeletionReport};
use surge::fs::DirectoryNode;
use surge::hash::{total_wasted_space, DuplicateGroup};
use surge::large_files::{total_size, LargeFileRecord};
use surge::quarantine::{PurgeReport, QuarantineEntry};
use surge::treemap::{layout, Rect};
use surge::{CancelToken, Engine, EngineConfig, Request};

#[derive(Debug, Parser)]
#[command(name = "surge")]
#[command(about = "Find and safely remove caches, logs, duplicates and other disk hogs")]
struct Cli {
    /// Configuration file (default: <config dir>/surge/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (SURGE_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print a short table instead of JSON
    #[arg(long, global = true)]
    human: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan cleanup categories
    Scan {
        /// Categories to scan (default: all)
        #[arg(short, long = "category", value_enum)]
        categories: Vec<CategoryArg>,
    },
    /// Delete paths, into quarantine unless --permanent
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        permanent: bool,
    },
    /// Disk usage tree
    Tree {
        root: PathBuf,
        #[arg(short, long, default_value_t = 3)]
        depth: usize,
    },
    /// Treemap rectangles for a directory
    Treemap {
        root: PathBuf,
        #[arg(short, long, default_value_t = 3)]
        depth: usize,
        #[arg(long, default_value_t = 1000.0)]
        width: f64,
        #[arg(long, default_value_t = 1000.0)]
        height: f64,
        /// Drop rectangles smaller than this area
        #[arg(long, default_value_t = 0.0)]
        min_area: f64,
    },
    /// Duplicate files
    Duplicates {
        #[arg(required = true)]
        roots: Vec<PathBuf>,
        #[arg(long, default_value_t = 1024 * 1024)]
        min_size: u64,
    },
    /// Large files not modified for a while
    Large {
        #[arg(required = true)]
        roots: Vec<PathBuf>,
        #[arg(long, default_value_t = 100 * 1024 * 1024)]
        min_size: u64,
        #[arg(long, default_value_t = 180)]
        min_age_days: u64,
    },
    /// Remove expired quarantine entries
    Purge {
        /// Defaults to the configured retention
        #[arg(long)]
        older_than_days: Option<u64>,
    },
    /// List quarantine entries
    QuarantineList,
    /// Read one JSON request from stdin and write one JSON reply
    Handle,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    SystemCaches,
    UserCaches,
    Logs,
    Trash,
    Downloads,
    DeveloperCaches,
    BrowserData,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::SystemCaches => Category::SystemCaches,
            CategoryArg::UserCaches => Category::UserCaches,
            CategoryArg::Logs => Category::Logs,
            CategoryArg::Trash => Category::Trash,
            CategoryArg::Downloads => Category::Downloads,
            CategoryArg::DeveloperCaches => Category::DeveloperCaches,
            CategoryArg::BrowserData => Category::BrowserData,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let config = EngineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(quarantine = %config.quarantine_dir.display(), "configuration ready");
    let engine = Engine::from_config(&config).context("Failed to start engine")?;
    let cancel = CancelToken::none();

    match cli.command {
        Command::Scan { categories } => {
            let categories: BTreeSet<Category> = if categories.is_empty() {
                Category::ALL.into_iter().collect()
            } else {
                categories.into_iter().map(Category::from).collect()
            };
            let items = engine.scan_categories(&categories, &cancel)?;
            output(cli.human, items.as_slice(), print_candidates)?;
        }
        Command::Delete { paths, permanent } => {
            let report = engine.delete_paths(&paths, !permanent, &cancel)?;
            output(cli.human, &report, print_deletion)?;
        }
        Command::Tree { root, depth } => {
            let tree = engine.scan_disk_tree(&root, depth, &cancel)?;
            output(cli.human, &tree, print_tree)?;
        }
        Command::Treemap {
            root,
            depth,
            width,
            height,
            min_area,
        } => {
            let tree = engine.scan_treemap_source(&root, depth, &cancel)?;
            let rects = layout(&tree, Rect::new(0.0, 0.0, width, height), min_area);
            if cli.human {
                for rect in &rects {
                    println!(
                        "{:>8.1} {:>8.1} {:>8.1} {:>8.1}  {:>10}  {}",
                        rect.x,
                        rect.y,
                        rect.width,
                        rect.height,
                        format_size(rect.item.size_bytes, BINARY),
                        rect.item.path.display()
                    );
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&rects)?);
            }
        }
        Command::Duplicates { roots, min_size } => {
            let groups = engine.find_duplicates(&roots, min_size, &cancel)?;
            output(cli.human, groups.as_slice(), print_duplicates)?;
        }
        Command::Large {
            roots,
            min_size,
            min_age_days,
        } => {
            let files = engine.find_large_old_files(&roots, min_size, min_age_days, &cancel)?;
            output(cli.human, files.as_slice(), print_large_files)?;
        }
        Command::Purge { older_than_days } => {
            let report = engine.purge_quarantine(older_than_days, &cancel)?;
            output(cli.human, &report, print_purge)?;
        }
        Command::QuarantineList => {
            let entries = engine.list_quarantine()?;
            output(cli.human, entries.as_slice(), print_quarantine)?;
        }
        Command::Handle => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read request from stdin")?;
            let request: Request = serde_json::from_str(&input).context("Malformed request")?;
            let response = engine.handle(request, &cancel);
            println!("{}", serde_json::to_string(&response)?);
        }
    }

    Ok(())
}

fn output<T: Serialize + ?Sized>(human: bool, value: &T, table: fn(&T)) -> Result<()> {
    if human {
        table(value);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

fn print_candidates(items: &[CandidateItem]) {
    for item in items {
        println!(
            "{:>10}  {:<17} {}  ({})",
            format_size(item.size_bytes, BINARY),
            item.category.name(),
            item.path.display(),
            item.description
        );
    }
    let total: u64 = items.iter().map(|i| i.size_bytes).sum();
    println!("{} items, {}", items.len(), format_size(total, BINARY));
}

fn print_deletion(report: &DeletionReport) {
    println!(
        "deleted {} items, freed {}",
        report.deleted_count,
        format_size(report.freed_space_bytes, BINARY)
    );
    for record in &report.quarantined {
        println!("  quarantined {} -> {}", record.original_path.display(), record.quarantine_path.display());
    }
    for error in &report.errors {
        println!("  error: {}", error);
    }
}

fn print_tree(node: &DirectoryNode) {
    fn walk(node: &DirectoryNode, total: u64, indent: usize) {
        println!(
            "{:indent$}{:>10} {:>5.1}%  {}{}",
            "",
            format_size(node.size_bytes, BINARY),
            node.percentage_of(total),
            node.name,
            if node.is_directory { "/" } else { "" },
            indent = indent
        );
        for child in node.children() {
            walk(child, total, indent + 2);
        }
    }
    walk(node, node.size_bytes, 0);
}

fn print_duplicates(groups: &[DuplicateGroup]) {
    for group in groups {
        println!(
            "{} wasted, {} copies  {}",
            format_size(group.wasted_space, BINARY),
            group.members.len(),
            group.content_hash
        );
        for member in &group.members {
            println!("    {}", member.path.display());
        }
    }
    println!(
        "{} groups, {} recoverable",
        groups.len(),
        format_size(total_wasted_space(groups), BINARY)
    );
}

fn print_large_files(files: &[LargeFileRecord]) {
    for file in files {
        println!(
            "{:>10}  {:>5}d  {}",
            format_size(file.size_bytes, BINARY),
            file.age_days,
            file.path.display()
        );
    }
    println!("{} files, {}", files.len(), format_size(total_size(files), BINARY));
}

fn print_purge(report: &PurgeReport) {
    println!(
        "removed {} entries, freed {}",
        report.removed,
        format_size(report.freed_bytes, BINARY)
    );
    for error in &report.errors {
        println!("  error: {}", error);
    }
}

fn print_quarantine(entries: &[QuarantineEntry]) {
    for entry in entries {
        let at = entry
            .quarantined_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>10}  {}  {}",
            format_size(entry.size_bytes, BINARY),
            at,
            entry.original_name
        );
    }
}
