//! Writing decks into the collection database
//!
//! Everything happens inside a caller-supplied transaction; committing is the
//! package's job, so a failed deck leaves nothing behind.

use chrono::{DateTime, Utc};
use rusqlite::{params, Transaction};

use super::models::Deck;
use super::schema::{deck_map, APKG_COL_INSERT, CARD_INSERT, NOTE_INSERT};
use crate::errors::Result;

impl Deck {
    /// Write the collection row, notes and cards for this deck.
    ///
    /// Registers the model of every note first, so model inference failures
    /// abort before any row is written.
    pub fn write_to_db(&mut self, tx: &Transaction<'_>, modified: DateTime<Utc>) -> Result<()> {
        self.register_note_models()?;

        let models_json = serde_json::to_string(self.models())?;
        let decks_json = serde_json::to_string(&deck_map(self.id(), self.name(), self.description()))?;
        tx.execute(APKG_COL_INSERT, params![models_json, decks_json])?;

        self.write_notes(tx, modified.timestamp_millis())?;

        log::info!(
            "Wrote deck '{}' ({}) with {} notes",
            self.name(),
            self.id(),
            self.notes().len()
        );
        Ok(())
    }

    fn write_notes(&self, tx: &Transaction<'_>, modified_ms: i64) -> Result<()> {
        let mut note_stmt = tx.prepare(NOTE_INSERT)?;
        let mut card_stmt = tx.prepare(CARD_INSERT)?;

        for note in self.notes() {
            let note_id = note_stmt.insert(params![
                note.guid(),
                note.model().id(),
                modified_ms,
                -1,
                note.formatted_tags(),
                note.formatted_fields(),
                note.sort_field(),
                0,
                0,
                "",
            ])?;

            for card in note.cards()? {
                card_stmt.execute(params![
                    note_id,
                    self.id(),
                    card.ord() as i64,
                    modified_ms,
                    -1,
                    0,
                    0,
                    0,
                    0,
                    0,
                    0,
                    0,
                    0,
                    0,
                    0,
                    0,
                    "",
                ])?;
            }
            log::debug!("Wrote note {} with {} cards", note.guid(), note.cards()?.len());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::schema::APKG_SCHEMA;
    use crate::errors::ApkgError;
    use crate::notes::Note;
    use crate::notetype::{make_fields, Model, Template};
    use rusqlite::Connection;
    use std::rc::Rc;

    fn capitals_model() -> Rc<Model> {
        Rc::new(Model::new(
            1607392319,
            "Capitals",
            make_fields(&["Country", "Capital"]),
            vec![
                Template::new("Forward", "{{Country}}", "{{Capital}}"),
                Template::new("Reverse", "{{Capital}}", "{{Country}}"),
            ],
        ))
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_write_notes_and_cards() {
        let model = capitals_model();
        let mut deck = Deck::new(2059400110, "Capitals", "European capitals");
        deck.add_note(
            Note::new(Rc::clone(&model), vec!["France".into(), "Paris".into()])
                .unwrap()
                .with_tags("geo"),
        );
        deck.add_note(Note::new(Rc::clone(&model), vec!["Spain".into(), String::new()]).unwrap());

        let mut conn = Connection::open_in_memory().unwrap();
        let tx = conn.transaction().unwrap();
        tx.execute_batch(APKG_SCHEMA).unwrap();
        deck.write_to_db(&tx, Utc::now()).unwrap();
        tx.commit().unwrap();

        assert_eq!(count(&conn, "notes"), 2);
        assert_eq!(count(&conn, "cards"), 3);
        assert_eq!(count(&conn, "col"), 1);

        let (tags, flds, usn): (String, String, i64) = conn
            .query_row(
                "SELECT tags, flds, usn FROM notes WHERE guid = ?1",
                params![deck.notes()[0].guid()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(tags, " geo ");
        assert_eq!(flds, "France\x1fParis");
        assert_eq!(usn, -1);

        let did: i64 = conn
            .query_row("SELECT DISTINCT did FROM cards", [], |row| row.get(0))
            .unwrap();
        assert_eq!(did, 2059400110);

        let (models, decks): (String, String) = conn
            .query_row("SELECT models, decks FROM col", [], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        let models: serde_json::Value = serde_json::from_str(&models).unwrap();
        assert_eq!(models["1607392319"]["did"], 2059400110);
        assert_eq!(models["1607392319"]["req"][1], serde_json::json!([1, "all", [1]]));
        let decks: serde_json::Value = serde_json::from_str(&decks).unwrap();
        assert_eq!(decks["2059400110"]["name"], "Capitals");
        assert_eq!(decks["2059400110"]["desc"], "European capitals");
        assert_eq!(decks["1"]["name"], "Default");
    }

    #[test]
    fn test_failed_deck_writes_nothing() {
        let broken = Rc::new(Model::new(
            3,
            "Broken",
            make_fields(&["A"]),
            vec![Template::new("T", "plain", "")],
        ));
        let mut deck = Deck::new(1, "d", "");
        deck.add_note(Note::new(broken, vec!["x".into()]).unwrap());

        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(APKG_SCHEMA).unwrap();
        {
            let tx = conn.transaction().unwrap();
            let err = deck.write_to_db(&tx, Utc::now()).unwrap_err();
            assert!(matches!(err, ApkgError::RequiredFields { .. }));
            // dropped without commit
        }
        assert_eq!(count(&conn, "col"), 0);
        assert_eq!(count(&conn, "notes"), 0);
    }
}
