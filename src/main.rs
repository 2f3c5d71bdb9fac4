//! Library Tracker - demonstration program
//!
//! Builds a small library, walks through borrowing, searching and
//! persistence, and reports every recoverable error on the console.

use std::fs;
use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use library_tracker::{
    config::AppConfig,
    models::{CreateItem, CreateUser, FileFormat, Genre, Membership},
    persistence::{self, Format},
    AppError, Library,
};

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let _guard = init_tracing(&config);

    tracing::info!("Starting Library Tracker v{}", env!("CARGO_PKG_VERSION"));

    fs::create_dir_all(&config.storage.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.storage.data_dir.display()
        )
    })?;

    banner(&format!("WELCOME TO {}", config.library.name.to_uppercase()));

    let mut library = Library::from_config(&config);
    populate(&mut library);
    demonstrate_loans(&mut library);
    demonstrate_search(&library);
    demonstrate_persistence(&library, &config);
    demonstrate_error_handling(&mut library, &config);
    demonstrate_journal(&library);

    println!("\n{}", library);
    Ok(())
}

/// Initialize tracing. Diagnostics go to stderr so they do not mix with the
/// demonstration output; a log file is added when configured.
fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_tracker={}", config.logging.level).into());

    let console_layer = if config.logging.format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = match &config.logging.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| "library_tracker.log".into());
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

fn report<T>(result: Result<T, AppError>, success: impl FnOnce(T) -> String) {
    match result {
        Ok(value) => println!("✓ {}", success(value)),
        Err(e) => println!("✗ {}", e),
    }
}

fn populate(library: &mut Library) {
    banner("BUILDING THE CATALOG");

    let items = [
        CreateItem::book("Python Programming", "John Doe", 2023)
            .with_id(101)
            .with_genre(Genre::Programming),
        CreateItem::ebook("Web Development", "Jane Smith", 2024, 5.2, FileFormat::Pdf)
            .with_id(102)
            .with_genre(Genre::Programming),
        CreateItem::book("Clean Code", "Robert C. Martin", 2008)
            .with_genre(Genre::Programming)
            .with_isbn("978-0-13-235088-4"),
        CreateItem::book("A Short History of Nearly Everything", "Bill Bryson", 2003)
            .with_genre(Genre::Science),
        CreateItem::book("Python Crash Course", "Eric Matthes", 2019)
            .with_genre(Genre::Programming),
    ];
    for create in items {
        match library.add_item(create).and_then(|id| library.get_item(id)) {
            Ok(item) => println!("✓ Added: {}", item.describe()),
            Err(e) => println!("✗ {}", e),
        }
    }

    let users = [
        CreateUser::new(1001, "Alice", "alice@email.com"),
        CreateUser::new(1002, "Bob", "bob@email.com").premium(Membership::Gold),
    ];
    for create in users {
        report(library.add_user(create), |id| format!("Registered user {}", id));
    }
    for user in library.users() {
        println!("  {}", user.describe());
    }
}

fn demonstrate_loans(library: &mut Library) {
    banner("BORROWING AND RETURNING");

    report(library.borrow_item(1001, 101), |_| {
        "Alice borrowed 'Python Programming'".to_string()
    });
    // Already on loan to Alice
    report(library.borrow_item(1002, 101), |_| {
        "Bob borrowed 'Python Programming'".to_string()
    });
    report(library.borrow_item(1002, 102), |_| {
        "Bob borrowed 'Web Development'".to_string()
    });
    report(library.reserve_item(1002, 101), |_| {
        "Bob reserved 'Python Programming'".to_string()
    });
    // Reservations are a premium privilege
    report(library.reserve_item(1001, 102), |_| {
        "Alice reserved 'Web Development'".to_string()
    });
    report(library.download_item(102), |count| {
        format!("'Web Development' downloaded ({} so far)", count)
    });

    println!("\n--- Library Items ---");
    for item in library.items() {
        println!("  {}", item.describe());
    }

    report(library.return_item(1001, 101), |receipt| {
        if receipt.late_fee > Decimal::ZERO {
            format!("Alice returned item {} - Late fee: ${:.2}", receipt.item_id, receipt.late_fee)
        } else {
            format!("Alice returned item {} - On time!", receipt.item_id)
        }
    });
    report(library.return_item(1001, 101), |_| "Returned twice".to_string());
}

fn demonstrate_search(library: &Library) {
    banner("SEARCHING AND SUMMARIZING");

    let found = library.search_title("python");
    println!("Titles containing 'python': {}", found.len());
    for item in found {
        println!("  {}", item);
    }

    println!("\nBy genre:");
    for (genre, items) in library.group_by_genre() {
        let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
        println!("  {}: {}", genre, titles.join(", "));
    }

    println!("\nNewest first:");
    for item in library.sorted_by_year(true) {
        println!("  {} ({})", item.title, item.year);
    }

    let stats = library.stats();
    println!(
        "\nTotal: {}, borrowed: {}, available: {}, borrow rate: {:.1}%",
        stats.total, stats.borrowed, stats.available, stats.borrow_rate
    );
}

fn demonstrate_persistence(library: &Library, config: &AppConfig) {
    banner("SAVING AND LOADING");

    for format in Format::ALL {
        let path = config.storage.catalog_path(format.extension());
        if let Err(e) = persistence::save(library, &path, format) {
            println!("✗ Error saving {}: {}", format, e);
            continue;
        }
        println!("✓ Saved library data to '{}'", path.display());

        let restored = persistence::load(&path, format)
            .and_then(|snapshot| Library::from_snapshot(snapshot, config.loans.clone()));
        match restored {
            Ok(restored) if restored.snapshot() == library.snapshot() => {
                println!("✓ Reloaded {} matches the catalog in memory", format)
            }
            Ok(_) => println!("✗ Reloaded {} differs from the catalog in memory", format),
            Err(e) => println!("✗ Error loading {}: {}", format, e),
        }
    }

    let source = config.storage.catalog_path(Format::Json.extension());
    let copy = config.storage.catalog_path("json.bak");
    report(persistence::backup(&source, &copy), |bytes| {
        format!("Backed up '{}' ({} bytes)", copy.display(), bytes)
    });
}

/// Load a library, falling back to an empty one on any recoverable error
fn load_or_empty(path: &Path, config: &AppConfig) -> Library {
    let loaded = Format::from_path(path)
        .and_then(|format| persistence::load(path, format))
        .and_then(|snapshot| Library::from_snapshot(snapshot, config.loans.clone()));
    match loaded {
        Ok(library) => library,
        Err(e) => {
            println!("✗ {} - starting with an empty catalog", e);
            Library::new(config.library.name.clone(), config.loans.clone())
        }
    }
}

fn demonstrate_error_handling(library: &mut Library, config: &AppConfig) {
    banner("HANDLING ERRORS");

    let missing = config.storage.data_dir.join("does_not_exist.json");
    let fallback = load_or_empty(&missing, config);
    println!("  Fallback: {}", fallback);

    let corrupt = config.storage.data_dir.join("corrupt.txt");
    match fs::write(&corrupt, "library|name=Broken\nitem|id=oops|kind=physical\n") {
        Ok(()) => {
            let fallback = load_or_empty(&corrupt, config);
            println!("  Fallback: {}", fallback);
        }
        Err(e) => println!("✗ Could not write {}: {}", corrupt.display(), e),
    }

    report(library.remove_item(102), |item| format!("Removed {}", item));
    report(library.borrow_item(1001, 999), |_| "Borrowed a ghost".to_string());
    report(library.add_item(CreateItem::book("", "Nobody", 1999)), |id| {
        format!("Added item {}", id)
    });
    report(library.add_user(CreateUser::new(1003, "Carol", "carol-at-email")), |id| {
        format!("Registered user {}", id)
    });
    report(library.update_email(1001, "alice.email.com"), |_| {
        "Updated Alice's email".to_string()
    });
    report(library.update_email(1001, "alice@library.org"), |_| {
        "Updated Alice's email to alice@library.org".to_string()
    });
    report(library.remove_user(1002), |user| format!("Removed {}", user));
}

fn demonstrate_journal(library: &Library) {
    let Some(journal) = library.journal() else {
        return;
    };
    banner("RECENT TRANSACTIONS");
    match journal.tail(5) {
        Ok(lines) => {
            for line in lines {
                println!("  {}", line);
            }
        }
        Err(e) => println!("✗ {}", e),
    }
}
