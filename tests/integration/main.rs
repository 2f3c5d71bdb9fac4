//! Library integration tests

use std::fs;
use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

use library_tracker::{
    config::LoansConfig,
    models::{CreateItem, CreateUser, FileFormat, Genre, Membership},
    persistence::{self, Format, Journal},
    AppError, Library,
};

/// A library with some state worth persisting: a borrowed book, a
/// downloaded e-book, an outstanding fine and awkward characters
fn populated_library() -> Library {
    let mut library = Library::new("Bibliothèque | Central", LoansConfig::default());
    library
        .add_item(
            CreateItem::book("Python Guide", "John Doe", 2023)
                .with_id(101)
                .with_genre(Genre::Programming),
        )
        .unwrap();
    library
        .add_item(
            CreateItem::ebook("Web Development", "Jane Smith", 2024, 5.2, FileFormat::Epub)
                .with_id(102),
        )
        .unwrap();
    library
        .add_item(
            CreateItem::book("Ünïcödé | Pipes \\ and, commas", "Zoë \"Z\" Ångström", 1999)
                .with_genre(Genre::NonFiction)
                .with_isbn("0-306-40615-2"),
        )
        .unwrap();
    library
        .add_user(CreateUser::new(1001, "Alice", "alice@email.com"))
        .unwrap();
    library
        .add_user(CreateUser::new(1002, "Bob", "bob@email.com").premium(Membership::Silver))
        .unwrap();

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    library.borrow_item_at(1001, 103, start).unwrap();
    library
        .return_item_at(1001, 103, start + Duration::days(17))
        .unwrap();
    library.borrow_item_at(1002, 101, start).unwrap();
    library.download_item(102).unwrap();
    library.download_item(102).unwrap();
    library.reserve_item(1002, 103).unwrap();
    library.reserve_item(1002, 102).unwrap();
    library
}

fn reload(path: &Path, format: Format) -> Library {
    let snapshot = persistence::load(path, format).unwrap();
    Library::from_snapshot(snapshot, LoansConfig::default()).unwrap()
}

#[test]
fn test_save_and_load_every_format() {
    let dir = TempDir::new().unwrap();
    let library = populated_library();
    assert_eq!(library.get_user(1001).unwrap().fine, Decimal::new(150, 2));

    for format in Format::ALL {
        let path = dir.path().join(format!("library.{}", format.extension()));
        persistence::save(&library, &path, format).unwrap();
        assert_eq!(Format::from_path(&path).unwrap(), format);

        let restored = reload(&path, format);
        assert_eq!(restored.snapshot(), library.snapshot(), "{} differs", format);
        assert_eq!(restored.to_string(), "Library: Bibliothèque | Central (3 items, 2 users)");
    }
}

#[test]
fn test_ebook_sizes_survive_every_format() {
    let dir = TempDir::new().unwrap();
    let sizes = [
        116.92609155306855,
        416.60453954358445,
        202.37243991567766,
        226.19416163320238,
        0.1 + 0.2,
        f64::MIN_POSITIVE,
    ];
    let mut library = Library::new("Digital Shelf", LoansConfig::default());
    for (offset, size) in sizes.iter().enumerate() {
        library
            .add_item(
                CreateItem::ebook("Scanned Atlas", "Cartographer", 2015, *size, FileFormat::Pdf)
                    .with_id(500 + offset as u32),
            )
            .unwrap();
    }

    for format in Format::ALL {
        let path = dir.path().join(format!("digital.{}", format.extension()));
        persistence::save(&library, &path, format).unwrap();
        let restored = reload(&path, format);
        assert_eq!(restored.snapshot(), library.snapshot(), "{} differs", format);
    }
}

#[test]
fn test_reloaded_library_keeps_working() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library.json");
    persistence::save(&populated_library(), &path, Format::Json).unwrap();

    let mut restored = reload(&path, Format::Json);
    assert!(restored.borrow_item(1001, 102).unwrap_err().is_invalid_state());
    restored.pay_fine(1001, Decimal::new(150, 2)).unwrap();
    restored.borrow_item(1001, 102).unwrap();
    restored.return_item(1002, 101).unwrap();
    assert_eq!(restored.get_user(1002).unwrap().reservations, vec![103, 102]);
    assert!(matches!(
        restored.reserve_item(1002, 103),
        Err(AppError::Conflict(_))
    ));
    assert_eq!(restored.next_item_id().unwrap(), 104);
    assert_eq!(restored.stats().borrowed, 1);
}

#[test]
fn test_load_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    for format in Format::ALL {
        let path = dir.path().join(format!("absent.{}", format.extension()));
        let err = persistence::load(&path, format).unwrap_err();
        assert!(err.is_not_found(), "{} gave {:?}", format, err);
    }
}

#[test]
fn test_load_corrupt_file_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let cases = [
        (Format::Text, "library|name=X\nitem|id=1|kind=physical|title=T\n"),
        (Format::Csv, "record,id\nitem,abc\n"),
        (Format::Json, "{\"library\": "),
    ];
    for (format, content) in cases {
        let path = dir.path().join(format!("corrupt.{}", format.extension()));
        fs::write(&path, content).unwrap();
        let err = persistence::load(&path, format).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)), "{} gave {:?}", format, err);
    }
}

#[test]
fn test_inconsistent_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inconsistent.txt");
    fs::write(
        &path,
        "library|name=X\n\
         item|id=1|kind=physical|title=T|creator=C|year=2000|available=false|borrowed_by=7\n",
    )
    .unwrap();
    let snapshot = persistence::load(&path, Format::Text).unwrap();
    let err = Library::from_snapshot(snapshot, LoansConfig::default()).unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
}

#[test]
fn test_fallback_to_empty_library() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library.csv");
    let library = persistence::load(&path, Format::Csv)
        .and_then(|snapshot| Library::from_snapshot(snapshot, LoansConfig::default()))
        .unwrap_or_else(|_| Library::new("Fresh", LoansConfig::default()));
    assert_eq!(library.items().count(), 0);
    assert_eq!(library.name(), "Fresh");
}

#[test]
fn test_borrow_return_walkthrough() {
    let mut library = Library::new("Demo", LoansConfig::default());
    library
        .add_item(CreateItem::book("Python Guide", "John Doe", 2023).with_id(101))
        .unwrap();
    library
        .add_user(CreateUser::new(1001, "Alice", "alice@email.com"))
        .unwrap();

    library.borrow_item(1001, 101).unwrap();
    assert!(!library.get_item(101).unwrap().available);
    assert_eq!(library.get_user(1001).unwrap().borrowed, vec![101]);
    assert_eq!(
        library.get_item(101).unwrap().describe(),
        "[Book #101] 'Python Guide' by John Doe (2023) - Borrowed by User 1001"
    );

    assert!(library.borrow_item(1001, 101).unwrap_err().is_invalid_state());
    assert!(library.borrow_item(1001, 999).unwrap_err().is_not_found());

    library.return_item(1001, 101).unwrap();
    assert!(library.get_item(101).unwrap().available);
    assert!(library.return_item(1001, 101).unwrap_err().is_invalid_state());

    let found = library.search_title("python");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 101);
    assert!(library.search_title("rust").is_empty());
}

#[test]
fn test_journal_records_transactions() {
    let dir = TempDir::new().unwrap();
    let journal = Journal::new(dir.path().join("library_log.txt"));
    let mut library = Library::new("Journaled", LoansConfig::default()).with_journal(journal);

    library
        .add_item(CreateItem::book("Python Guide", "John Doe", 2023).with_id(101))
        .unwrap();
    library
        .add_user(CreateUser::new(1001, "Alice", "alice@email.com"))
        .unwrap();
    library.borrow_item(1001, 101).unwrap();
    library.return_item(1001, 101).unwrap();
    // failed operations leave no entry
    assert!(library.borrow_item(1001, 999).is_err());

    let lines = library.journal().unwrap().tail(10).unwrap();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("ADD_ITEM: "));
    assert!(lines[1].contains("ADD_USER: "));
    assert!(lines[2].ends_with("BORROW: user 1001 borrowed item 101"));
    assert!(lines[3].contains("RETURN: user 1001 returned item 101"));
    assert!(lines.iter().all(|line| line.starts_with('[')));
}
