//! Wikidata entity metadata lookup.
//!
//! Listings may carry a Wikidata identifier instead of a direct article
//! link. Resolving it to a per-language sitelink title requires the entity
//! JSON, which is served from a local cache database and downloaded on a
//! miss. Every failure path yields an absent result; a missing link never
//! aborts the enclosing parse.

use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Supplier of raw entity JSON for a Wikidata identifier.
///
/// Implementations may block on the network. `None` covers every failure:
/// unknown id, transport error, malformed payload.
pub trait MetadataSource {
    fn metadata(&mut self, id: &str) -> Option<Value>;
}

/// Reads the sitelink title for a language out of entity metadata,
/// following `entities.<first>.sitelinks.<lang>wiki.title`.
pub fn sitelink_title(metadata: &Value, lang: &str) -> Option<String> {
    let entities = metadata.get("entities")?.as_object()?;
    let (_, entity) = entities.iter().next()?;
    let title = entity
        .get("sitelinks")?
        .get(format!("{}wiki", lang))?
        .get("title")?
        .as_str()?;
    Some(title.to_string())
}

#[derive(Debug)]
pub enum Error {
    Database(rusqlite::Error),
    Http(reqwest::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(e) => write!(f, "wikidata cache error: {}", e),
            Error::Http(e) => write!(f, "wikidata client error: {}", e),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Error {
        Error::Database(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Http(e)
    }
}

/// Blocking Wikidata client backed by a SQLite metadata cache.
pub struct WikidataClient {
    conn: rusqlite::Connection,
    http: reqwest::blocking::Client,
}

impl WikidataClient {
    /// Opens the cache database, creating the metadata table if needed.
    pub fn open<P: AsRef<Path>>(cache: P) -> Result<WikidataClient, Error> {
        let conn = rusqlite::Connection::open(cache)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS wikidata_metadata(id TEXT PRIMARY KEY, metadata TEXT)",
            [],
        )?;
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("wikivoyage-data/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(WikidataClient { conn, http })
    }

    fn cached(&self, id: &str) -> Option<Value> {
        let json: String = self
            .conn
            .query_row(
                "SELECT metadata FROM wikidata_metadata WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .ok()?;
        serde_json::from_str(&json).ok()
    }

    fn download(&mut self, id: &str) -> Option<Value> {
        let url = format!("https://www.wikidata.org/wiki/Special:EntityData/{}.json", id);
        let value: Value = self
            .http
            .get(&url)
            .send()
            .ok()?
            .error_for_status()
            .ok()?
            .json()
            .ok()?;
        // A failed cache write is not worth failing the lookup over.
        let _ = self.conn.execute(
            "INSERT OR REPLACE INTO wikidata_metadata VALUES (?1, ?2)",
            rusqlite::params![id, value.to_string()],
        );
        Some(value)
    }
}

impl MetadataSource for WikidataClient {
    fn metadata(&mut self, id: &str) -> Option<Value> {
        self.cached(id).or_else(|| self.download(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity() -> Value {
        json!({
            "entities": {
                "Q220": {
                    "sitelinks": {
                        "enwiki": { "site": "enwiki", "title": "Rome" },
                        "itwiki": { "site": "itwiki", "title": "Roma" }
                    }
                }
            }
        })
    }

    #[test]
    fn reads_sitelink_for_language() {
        assert_eq!(sitelink_title(&entity(), "en"), Some("Rome".to_string()));
        assert_eq!(sitelink_title(&entity(), "it"), Some("Roma".to_string()));
    }

    #[test]
    fn missing_language_is_absent() {
        assert_eq!(sitelink_title(&entity(), "de"), None);
    }

    #[test]
    fn malformed_metadata_is_absent() {
        assert_eq!(sitelink_title(&json!({ "error": "no such entity" }), "en"), None);
        assert_eq!(sitelink_title(&json!({ "entities": {} }), "en"), None);
    }

    #[test]
    fn cache_round_trip() {
        let mut client = WikidataClient::open(":memory:").unwrap();
        assert_eq!(client.cached("Q220"), None);
        client
            .conn
            .execute(
                "INSERT INTO wikidata_metadata VALUES (?1, ?2)",
                rusqlite::params!["Q220", entity().to_string()],
            )
            .unwrap();
        let cached = client.metadata("Q220").unwrap();
        assert_eq!(sitelink_title(&cached, "en"), Some("Rome".to_string()));
    }
}
