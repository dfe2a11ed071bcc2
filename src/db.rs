//! SQLite article writer with batched inserts.

use crate::error::{Error, Result};
use bzip2::write::BzEncoder;
use bzip2::Compression;
use rusqlite::{params, Connection};
use std::io::Write;
use std::path::Path;

const BATCH_SIZE: usize = 500;

/// One accepted article, ready for insertion.
pub struct ArticleRecord<'a> {
    pub id: u64,
    pub article_id: String,
    pub title: &'a str,
    pub content: &'a str,
    pub is_part_of: String,
    pub lat: f64,
    pub lon: f64,
    pub image_title: String,
    pub gpx: String,
}

/// Writer for the per-language article table. Inserts are collected into
/// transactions of [`BATCH_SIZE`] rows; `finish` commits the tail.
pub struct ArticleWriter {
    conn: Connection,
    table: String,
    uncompressed: bool,
    pending: usize,
}

impl ArticleWriter {
    pub fn create<P: AsRef<Path>>(path: P, lang: &str, uncompressed: bool) -> Result<ArticleWriter> {
        let conn = Connection::open(path)?;
        let table = format!("{}_wikivoyage", lang);
        let data_type = if uncompressed { "text" } else { "blob" };
        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table}(article_id text, title text, content_gz {ty},
                 is_part_of text, lat double, lon double, image_title text,
                 gpx_gz {ty}, id long);
             CREATE INDEX index_title_{lang} ON {table}(article_id);
             CREATE INDEX {lang}_index_part_of ON {table}(is_part_of);
             BEGIN;",
            table = table,
            ty = data_type,
            lang = lang,
        ))?;
        Ok(ArticleWriter {
            conn,
            table,
            uncompressed,
            pending: 0,
        })
    }

    pub fn insert(&mut self, record: &ArticleRecord) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            self.table
        );
        if self.uncompressed {
            self.conn.execute(
                &sql,
                params![
                    record.article_id,
                    record.title,
                    record.content,
                    record.is_part_of,
                    record.lat,
                    record.lon,
                    record.image_title,
                    record.gpx,
                    record.id as i64,
                ],
            )?;
        } else {
            let content = compress(record.content.as_bytes())?;
            let gpx = compress(record.gpx.as_bytes())?;
            self.conn.execute(
                &sql,
                params![
                    record.article_id,
                    record.title,
                    content,
                    record.is_part_of,
                    record.lat,
                    record.lon,
                    record.image_title,
                    gpx,
                    record.id as i64,
                ],
            )?;
        }
        self.pending += 1;
        if self.pending >= BATCH_SIZE {
            self.conn.execute_batch("COMMIT; BEGIN;")?;
            self.pending = 0;
        }
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::Default);
    encoder.write_all(data).map_err(Error::Compression)?;
    encoder.finish().map_err(Error::Compression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::read::BzDecoder;
    use std::io::Read;

    fn record() -> ArticleRecord<'static> {
        ArticleRecord {
            id: 7,
            article_id: "Rome".to_string(),
            title: "Rome",
            content: "div class=\"content\"\nEternal city.",
            is_part_of: "Lazio".to_string(),
            lat: 41.9,
            lon: 12.5,
            image_title: "Rome banner.jpg".to_string(),
            gpx: String::new(),
        }
    }

    #[test]
    fn writes_uncompressed_rows() {
        let mut writer = ArticleWriter::create(":memory:", "en", true).unwrap();
        writer.insert(&record()).unwrap();
        let content: String = writer
            .conn
            .query_row(
                "SELECT content_gz FROM en_wikivoyage WHERE article_id = 'Rome'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(content, record().content);
        writer.finish().unwrap();
    }

    #[test]
    fn compressed_rows_round_trip() {
        let mut writer = ArticleWriter::create(":memory:", "en", false).unwrap();
        writer.insert(&record()).unwrap();
        let blob: Vec<u8> = writer
            .conn
            .query_row(
                "SELECT content_gz FROM en_wikivoyage WHERE article_id = 'Rome'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        let mut decoded = String::new();
        BzDecoder::new(&blob[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, record().content);
        writer.finish().unwrap();
    }

    #[test]
    fn batches_survive_many_inserts() {
        let mut writer = ArticleWriter::create(":memory:", "en", true).unwrap();
        for _ in 0..BATCH_SIZE + 3 {
            writer.insert(&record()).unwrap();
        }
        let rows: i64 = writer
            .conn
            .query_row("SELECT COUNT(*) FROM en_wikivoyage", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows as usize, BATCH_SIZE + 3);
        writer.finish().unwrap();
    }
}
