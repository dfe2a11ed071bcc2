use std::fmt::Display;
use std::io::Error as IoError;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io {
        action: &'static str,
        path: PathBuf,
        cause: IoError,
    },
    DumpParsing(dump_reader::Error),
    Database(rusqlite::Error),
    Wikidata(wikidata_lookup::Error),
    Compression(IoError),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io {
                action,
                path,
                cause,
            } => {
                write!(f, "failed to {} {}: {}", action, path.display(), cause)
            }
            Error::DumpParsing(e) => write!(f, "error while parsing dump: {}", e),
            Error::Database(e) => write!(f, "database error: {}", e),
            Error::Wikidata(e) => write!(f, "{}", e),
            Error::Compression(e) => write!(f, "failed to compress article data: {}", e),
        }
    }
}

impl From<dump_reader::Error> for Error {
    fn from(e: dump_reader::Error) -> Error {
        Error::DumpParsing(e)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Error {
        Error::Database(e)
    }
}

impl From<wikidata_lookup::Error> for Error {
    fn from(e: wikidata_lookup::Error) -> Error {
        Error::Wikidata(e)
    }
}
