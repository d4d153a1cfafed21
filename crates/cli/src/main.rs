mod selection;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use localreads_app::modules::{books::repo as books, collections::repo as collections, scan};
use localreads_kernel::settings::Settings;
use localreads_library::{flat_view, Book, FilterSelector, LibraryView};
use sqlx::SqlitePool;

/// Localreads administration CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Import new EPUB and PDF files
    Scan {
        /// Directory to scan (defaults to the configured books directory)
        path: Option<PathBuf>,
    },
    /// Print the library grouped into reading sections
    View {
        /// `all`, `hidden`, or a collection id; remembered for later runs
        #[arg(short, long)]
        filter: Option<FilterSelector>,
        /// One list in display order instead of sections
        #[arg(long)]
        flat: bool,
        /// Show the number of books next to each heading
        #[arg(long)]
        counts: bool,
    },
    /// Remember a view filter without printing anything
    Select {
        filter: FilterSelector,
    },
    /// List collections with their book counts
    Collections,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load Localreads settings")?;
    localreads_telemetry::init_stderr(&settings.telemetry);

    let pool = open_database(&settings).await?;
    let result = run(cli.command, &settings, &pool).await;
    pool.close().await;
    result
}

/// Connect and bring the schema up to date; every command needs both.
async fn open_database(settings: &Settings) -> anyhow::Result<SqlitePool> {
    let pool = localreads_db::connect(&settings.database).await?;
    let registry = localreads_app::build_registry(&pool, settings)?;
    localreads_app::migrate(&pool, &registry).await?;
    Ok(pool)
}

async fn run(command: Commands, settings: &Settings, pool: &SqlitePool) -> anyhow::Result<()> {
    match command {
        Commands::Migrate => {
            println!("Database is up to date.");
        }
        Commands::Scan { path } => {
            let books_dir = path.unwrap_or_else(|| settings.library.books_dir.clone());
            let report = scan::run_scan(pool, books_dir, &settings.library).await?;
            println!(
                "{}: {} files scanned, {} new books, {} errors",
                report.message, report.scanned_files, report.new_books, report.errors
            );
            if report.status == scan::ScanStatus::Error {
                anyhow::bail!("{}", report.message);
            }
        }
        Commands::View {
            filter,
            flat,
            counts,
        } => {
            let state_file = &settings.library.state_file;
            let filter = match filter {
                Some(filter) => {
                    selection::save(state_file, filter)?;
                    filter
                }
                None => selection::load(state_file),
            };
            let snapshot = books::list_all(pool).await?;
            print!("{}", render_view(&snapshot, filter, flat, counts));
        }
        Commands::Select { filter } => {
            selection::save(&settings.library.state_file, filter)?;
            println!("Selected {filter}.");
        }
        Commands::Collections => {
            let all = collections::list(pool).await?;
            if all.is_empty() {
                println!("No collections.");
            }
            for collection in all {
                println!(
                    "{:>4}  {} ({})",
                    collection.id, collection.name, collection.book_count
                );
            }
        }
    }
    Ok(())
}

fn render_view(snapshot: &[Book], filter: FilterSelector, flat: bool, counts: bool) -> String {
    let mut out = String::new();
    if flat {
        for book in flat_view(snapshot, filter) {
            out.push_str(&book_line(book));
        }
    } else {
        let view = LibraryView::build(snapshot, filter);
        for section in &view.sections {
            out.push_str(&section.heading(counts));
            out.push('\n');
            for book in &section.books {
                out.push_str(&book_line(book));
            }
        }
    }

    if out.is_empty() {
        out.push_str("No books.\n");
    }
    out
}

fn book_line(book: &Book) -> String {
    format!(
        "  [{:>4}] {} by {} ({:.0}%)\n",
        book.id,
        book.display_title(),
        book.author,
        book.progress * 100.0
    )
}
