use std::cell::Cell;
use std::io::{Cursor, Read};
use std::rc::Rc;

use ankigen_lib::notetype::make_fields;
use ankigen_lib::package::{MediaEntry, MediaError};
use ankigen_lib::{ApkgError, Deck, MediaFetcher, MediaMap, Model, ModelType, Note, Package, Template};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use tempfile::TempDir;
use zip::ZipArchive;

fn capitals_model() -> Rc<Model> {
    Rc::new(Model::new(
        1607392319,
        "Capitals",
        make_fields(&["Country", "Capital"]),
        vec![
            Template::new("Forward", "{{Country}}", "{{FrontSide}}<hr id=answer>{{Capital}}"),
            Template::new("Reverse", "{{Capital}}", "{{FrontSide}}<hr id=answer>{{Country}}"),
        ],
    ))
}

fn build_archive(package: &mut Package, media: Option<&mut dyn MediaFetcher>) -> ZipArchive<Cursor<Vec<u8>>> {
    let cursor = package.write(Cursor::new(Vec::new()), media).unwrap();
    ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
}

fn open_collection(archive: &mut ZipArchive<Cursor<Vec<u8>>>) -> (TempDir, Connection) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("collection.anki2");
    let mut bytes = Vec::new();
    archive
        .by_name("collection.anki2")
        .unwrap()
        .read_to_end(&mut bytes)
        .unwrap();
    std::fs::write(&path, bytes).unwrap();
    let conn = Connection::open(&path).unwrap();
    (temp, conn)
}

fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
    let mut contents = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut contents).unwrap();
    contents
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_decks_notes_and_cards_round_trip() {
    let model = capitals_model();
    let mut decks = Vec::new();
    for (deck_id, countries) in [(1001, ["France", "Spain", "Italy"]), (1002, ["Peru", "Chile", "Cuba"])] {
        let mut deck = Deck::new(deck_id, format!("Deck {}", deck_id), "");
        for country in countries {
            let note = Note::new(Rc::clone(&model), vec![country.to_string(), format!("{} capital", country)])
                .unwrap();
            deck.add_note(note);
        }
        decks.push(deck);
    }

    let mut package = Package::new(decks);
    let mut archive = build_archive(&mut package, None);
    let (_temp, conn) = open_collection(&mut archive);

    assert_eq!(count(&conn, "col"), 2);
    assert_eq!(count(&conn, "notes"), 6);
    assert_eq!(count(&conn, "cards"), 12);
    assert_eq!(count(&conn, "revlog"), 0);
    assert_eq!(count(&conn, "graves"), 0);

    let per_deck: i64 = conn
        .query_row("SELECT COUNT(*) FROM cards WHERE did = 1002", [], |row| row.get(0))
        .unwrap();
    assert_eq!(per_deck, 6);

    let guid = package.decks()[0].notes()[0].guid().to_string();
    let sfld: String = conn
        .query_row("SELECT sfld FROM notes WHERE guid = ?1", rusqlite::params![guid], |row| row.get(0))
        .unwrap();
    assert_eq!(sfld, "France");

    assert_eq!(read_entry(&mut archive, "media"), "{}");
}

#[test]
fn test_media_entries_and_manifest() {
    let temp = TempDir::new().unwrap();
    let sound = temp.path().join("sound.mp3");
    std::fs::write(&sound, b"ID3-bytes").unwrap();

    let mut media = MediaMap::new()
        .with_file("sound.mp3", &sound)
        .with_bytes("a.png", b"png-bytes".to_vec())
        .with_bytes("b.gif", b"gif-bytes".to_vec());

    let mut deck = Deck::new(1, "Media", "");
    deck.add_note(Note::new(capitals_model(), vec!["France".into(), "[sound:sound.mp3]".into()]).unwrap());
    let mut package = Package::new(vec![deck]);
    let mut archive = build_archive(&mut package, Some(&mut media));

    let manifest: serde_json::Value = serde_json::from_str(&read_entry(&mut archive, "media")).unwrap();
    assert_eq!(
        manifest,
        serde_json::json!({"0": "sound.mp3", "1": "a.png", "2": "b.gif"})
    );
    assert_eq!(read_entry(&mut archive, "0"), "ID3-bytes");
    assert_eq!(read_entry(&mut archive, "1"), "png-bytes");
    assert_eq!(read_entry(&mut archive, "2"), "gif-bytes");
    assert_eq!(archive.len(), 5);

    // fetcher was closed and rewound
    assert_eq!(media.next_entry().unwrap().unwrap().name, "sound.mp3");
}

#[test]
fn test_cloze_cards() {
    let model = Rc::new(
        Model::new(
            998877661,
            "Cloze",
            make_fields(&["Text", "Extra"]),
            vec![Template::new("Cloze", "{{cloze:Text}}", "{{cloze:Text}}<br>{{Extra}}")],
        )
        .with_type(ModelType::Cloze),
    );
    let mut deck = Deck::new(2, "Cloze", "");
    deck.add_note(
        Note::new(
            model,
            vec!["{{c1::Paris}} is in {{c3::France}}, {{c1::again}}".into(), String::new()],
        )
        .unwrap(),
    );

    let mut package = Package::new(vec![deck]);
    let mut archive = build_archive(&mut package, None);
    let (_temp, conn) = open_collection(&mut archive);

    let mut stmt = conn.prepare("SELECT ord FROM cards ORDER BY ord").unwrap();
    let ords: Vec<i64> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(ords, vec![0, 2]);
}

#[test]
fn test_unusable_template_fails_the_package() {
    let model = Rc::new(Model::new(
        5,
        "Static",
        make_fields(&["A"]),
        vec![Template::new("T", "no fields here", "")],
    ));
    let mut deck = Deck::new(3, "Broken", "");
    deck.add_note(Note::new(model, vec!["x".into()]).unwrap());

    let mut package = Package::new(vec![deck]);
    let err = package.write(Cursor::new(Vec::new()), None).unwrap_err();
    match err {
        ApkgError::RequiredFields { qfmt } => assert_eq!(qfmt, "no fields here"),
        other => panic!("unexpected error: {other}"),
    }
}

struct FailingFetcher {
    yielded: usize,
    closed: Rc<Cell<bool>>,
    data: Cursor<Vec<u8>>,
}

impl MediaFetcher for FailingFetcher {
    fn next_entry(&mut self) -> Result<Option<MediaEntry<'_>>, MediaError> {
        if self.yielded > 0 {
            return Err(MediaError::Io(std::io::Error::new(std::io::ErrorKind::Other, "gone")));
        }
        self.yielded += 1;
        Ok(Some(MediaEntry {
            name: "first.txt".to_string(),
            modified: Utc::now(),
            reader: &mut self.data,
        }))
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}

#[test]
fn test_media_error_closes_fetcher() {
    let closed = Rc::new(Cell::new(false));
    let mut fetcher = FailingFetcher {
        yielded: 0,
        closed: Rc::clone(&closed),
        data: Cursor::new(b"first".to_vec()),
    };

    let mut package = Package::new(vec![Deck::new(4, "Empty", "")]);
    let err = package
        .write(Cursor::new(Vec::new()), Some(&mut fetcher))
        .unwrap_err();
    assert!(matches!(err, ApkgError::Media(MediaError::Io(_))));
    assert!(closed.get());
}

#[test]
fn test_write_to_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out.apkg");

    let mut deck = Deck::new(5, "File", "");
    deck.add_note(Note::new(capitals_model(), vec!["Peru".into(), "Lima".into()]).unwrap());
    Package::new(vec![deck]).write_to_file(&path, None).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    assert!(archive.by_name("collection.anki2").is_ok());
    assert!(archive.by_name("media").is_ok());
}

#[test]
fn test_media_entry_keeps_file_mtime() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("clip.mp3");
    std::fs::write(&path, b"clip").unwrap();
    let mtime = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 8).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(mtime.into())
        .unwrap();

    let mut media = MediaMap::new().with_file("clip.mp3", &path);
    let mut package = Package::new(vec![Deck::new(6, "Clip", "")]);
    let mut archive = build_archive(&mut package, Some(&mut media));

    let modified = archive.by_name("0").unwrap().last_modified().unwrap();
    assert_eq!(
        (modified.year(), modified.month(), modified.day()),
        (2021, 3, 4)
    );
    assert_eq!(
        (modified.hour(), modified.minute(), modified.second()),
        (5, 6, 8)
    );
}
