//! Command-line front end over a SQLite-backed workspace.
//!
//! # Responsibility
//! - Map subcommands to `Workspace` operations and print results.
//! - Keep all editing rules in `blockpad_core`.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use blockpad_core::{
    default_log_level, init_cli_logging, Page, PageStore, SqliteBlobStore, Workspace,
};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(name = "blockpad", version, about = "Block-structured page editor")]
struct Cli {
    /// SQLite database holding the workspace
    #[arg(long, global = true, default_value = "blockpad.sqlite3")]
    db: PathBuf,

    /// Log level for stderr diagnostics (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every page as `<id>  <icon> <title>`
    List,

    /// Print the page forest as an indented tree
    Tree,

    /// Print one page as markdown
    Show {
        page_id: String,
    },

    /// Create a page
    New {
        /// Create as a child of this page
        #[arg(short, long)]
        parent: Option<String>,

        /// Title for the new page
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Import a markdown file as a new root page
    Import {
        file: PathBuf,
    },

    /// Export a page to `<title>.md`
    Export {
        page_id: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Undo the latest change
    Undo,

    /// Redo the latest undone change
    Redo,
}

fn main() {
    let cli = Cli::parse();
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_cli_logging(level) {
        eprintln!("error: {err}");
        process::exit(2);
    }

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let blobs = SqliteBlobStore::open(&cli.db)?;
    let mut workspace = Workspace::open(blobs)?;
    info!(
        "event=cli_command module=cli status=start db={}",
        cli.db.display()
    );

    match cli.command {
        Command::List => {
            for page in workspace.store().pages() {
                println!("{}  {} {}", page.id, page.icon, page.title);
            }
        }
        Command::Tree => print_tree(workspace.store()),
        Command::Show { page_id } => {
            let export = workspace
                .export_markdown(&page_id)
                .ok_or_else(|| format!("page not found: {page_id}"))?;
            print!("{}", export.content);
        }
        Command::New { parent, title } => {
            let page_id = workspace.create_page(parent.as_deref())?;
            if let Some(title) = title {
                workspace.set_page_title(&page_id, &title)?;
            }
            println!("{page_id}");
        }
        Command::Import { file } => {
            let contents = std::fs::read_to_string(&file)
                .map_err(|err| format!("cannot read '{}': {err}", file.display()))?;
            let page_id = workspace.import_markdown(&file_name(&file), &contents)?;
            println!("{page_id}");
        }
        Command::Export { page_id, out } => {
            let export = workspace
                .export_markdown(&page_id)
                .ok_or_else(|| format!("page not found: {page_id}"))?;
            let path = out.join(&export.file_name);
            std::fs::write(&path, export.content)
                .map_err(|err| format!("cannot write '{}': {err}", path.display()))?;
            println!("{}", path.display());
        }
        Command::Undo => match workspace.undo()? {
            Some(restored) => println!("undid: {}", restored.description),
            None => println!("nothing to undo"),
        },
        Command::Redo => match workspace.redo()? {
            Some(restored) => println!("redid: {}", restored.description),
            None => println!("nothing to redo"),
        },
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_tree(store: &PageStore) {
    for root in store.root_pages() {
        print_subtree(store, root, 0);
    }
}

fn print_subtree(store: &PageStore, page: &Page, depth: usize) {
    let marker = if store.children_of(&page.id).is_empty() {
        " "
    } else if page.expanded {
        "v"
    } else {
        ">"
    };
    println!("{}{} {} {}", "  ".repeat(depth), marker, page.icon, page.title);
    for child in store.children_of(&page.id) {
        print_subtree(store, child, depth + 1);
    }
}
