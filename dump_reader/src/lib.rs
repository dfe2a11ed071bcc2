//! Streaming reader for MediaWiki `pages-articles` XML exports.
//!
//! Iterates over the pages of an export stream, yielding the page id,
//! namespace, title and revision text. Only those elements are tracked;
//! everything else in the dump is skipped. One revision per page is
//! assumed, which is what the `-pages-articles` dumps contain. The caller
//! supplies decompression and buffering.

use std::fmt;
use std::io::Read;
use xml::common::{Position, TextPosition};
use xml::reader::{EventReader, XmlEvent};

/// One page of the dump.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: u64,
    pub namespace: u32,
    pub title: String,
    pub text: String,
}

#[derive(Debug)]
pub enum Error {
    /// Structure not matching a pages dump, with the stream position.
    Format(TextPosition),
    XmlReader(xml::reader::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Format(position) => {
                write!(f, "invalid dump structure at {}", position)
            }
            Error::XmlReader(e) => e.fmt(f),
        }
    }
}

impl From<xml::reader::Error> for Error {
    fn from(e: xml::reader::Error) -> Error {
        Error::XmlReader(e)
    }
}

/// Iterator over the pages of a dump stream. Ends after the first error;
/// the underlying reader cannot recover from one.
pub struct Pages<R: Read> {
    reader: EventReader<R>,
    failed: bool,
}

/// Creates a page iterator for a raw (already decompressed) dump stream.
pub fn parse<R: Read>(source: R) -> Pages<R> {
    Pages {
        reader: EventReader::new(source),
        failed: false,
    }
}

impl<R: Read> Iterator for Pages<R> {
    type Item = Result<Page, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> Pages<R> {
    fn next_page(&mut self) -> Result<Option<Page>, Error> {
        loop {
            match self.reader.next()? {
                XmlEvent::StartElement { name, .. } if name.local_name == "page" => {
                    return self.read_page().map(Some);
                }
                XmlEvent::EndDocument => return Ok(None),
                _ => {}
            }
        }
    }

    fn read_page(&mut self) -> Result<Page, Error> {
        let mut id = None;
        let mut namespace = None;
        let mut title = None;
        let mut text = None;
        let mut in_revision = false;
        loop {
            match self.reader.next()? {
                XmlEvent::StartElement { name, .. } => match name.local_name.as_str() {
                    "revision" => in_revision = true,
                    "title" if !in_revision => title = Some(self.read_text()?),
                    "ns" if !in_revision => namespace = Some(self.read_number()?),
                    // The page id precedes the revision; ids inside the
                    // revision belong to the revision or its contributor.
                    "id" if !in_revision && id.is_none() => id = Some(self.read_number()?),
                    "text" if in_revision => text = Some(self.read_text()?),
                    _ => self.skip_element()?,
                },
                XmlEvent::EndElement { name } => {
                    if name.local_name == "revision" {
                        in_revision = false;
                    } else if name.local_name == "page" {
                        return match (id, namespace, title, text) {
                            (Some(id), Some(namespace), Some(title), Some(text)) => Ok(Page {
                                id,
                                namespace,
                                title,
                                text,
                            }),
                            _ => Err(Error::Format(self.reader.position())),
                        };
                    }
                }
                XmlEvent::EndDocument => return Err(Error::Format(self.reader.position())),
                _ => {}
            }
        }
    }

    fn read_text(&mut self) -> Result<String, Error> {
        let mut value = String::new();
        loop {
            match self.reader.next()? {
                XmlEvent::Characters(chunk) => value.push_str(&chunk),
                XmlEvent::CData(chunk) => value.push_str(&chunk),
                XmlEvent::Whitespace(chunk) => value.push_str(&chunk),
                XmlEvent::EndElement { .. } => return Ok(value),
                _ => return Err(Error::Format(self.reader.position())),
            }
        }
    }

    fn read_number<T: std::str::FromStr>(&mut self) -> Result<T, Error> {
        let text = self.read_text()?;
        text.trim()
            .parse()
            .map_err(|_| Error::Format(self.reader.position()))
    }

    fn skip_element(&mut self) -> Result<(), Error> {
        let mut depth = 0usize;
        loop {
            match self.reader.next()? {
                XmlEvent::StartElement { .. } => depth += 1,
                XmlEvent::EndElement { .. } => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                XmlEvent::EndDocument => return Err(Error::Format(self.reader.position())),
                _ => {}
            }
        }
    }
}
