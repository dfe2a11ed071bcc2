//! The macro-block scanner.
//!
//! One forward pass over an article's wikitext strips template blocks out
//! of the prose, classifies each block and records its body in a
//! [`BlockIndex`], renders the prose-bearing kinds (listings, region
//! lists, warnings, galleries) inline where they occurred, and
//! restructures level-2 headings into section containers.
//!
//! The scan works on code points, not bytes, because the delimiters
//! include non-Latin markers. Blocks nest: only the delimiter that brings
//! the depth back to zero ends a block, and nested blocks are never
//! classified on their own.

use field_grammars::{parse_gallery, parse_listing, parse_region_list, parse_warning};
use std::collections::HashMap;
use template_classifier::{classify, TemplateKind};
use wikidata_lookup::MetadataSource;

/// Bodies of every classified block found in one article, grouped by kind.
/// Bodies of the same kind keep their encounter order.
#[derive(Debug, Default)]
pub struct BlockIndex {
    by_kind: HashMap<TemplateKind, Vec<String>>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Default::default()
    }

    fn add(&mut self, kind: TemplateKind, body: String) {
        self.by_kind.entry(kind).or_insert_with(Vec::new).push(body);
    }

    /// All bodies recorded for a kind, oldest first.
    pub fn get(&self, kind: TemplateKind) -> &[String] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

/// Cleaned text and the block index produced by one scan.
#[derive(Debug)]
pub struct ScanOutput {
    pub text: String,
    pub blocks: BlockIndex,
}

enum State {
    Outside,
    InBlock {
        depth: i32,
        body_start: usize,
        hebrew_link: bool,
    },
}

const HEBREW_LINK_MARKER: char = 'ק';
const MAPLINK_OPEN: &[char] = &['m', 'a', 'p', 'l', 'i'];
const GALLERY_OPEN: &[char] = &['g', 'a', 'l'];
const MAPLINK_CLOSE_SUFFIX: &[char] = &['p', 'l', 'i', 'n', 'k'];
const GALLERY_CLOSE_SUFFIX: &[char] = &['e', 'r', 'y'];

/// Scans an article without Wikidata resolution.
pub fn scan(text: &str, lang: &str) -> ScanOutput {
    scan_with(text, lang, None)
}

/// Scans an article. `lang` selects the Wikipedia edition for listing
/// reference links; `metadata` resolves Wikidata identifiers in listings
/// and may be `None`.
pub fn scan_with(
    text: &str,
    lang: &str,
    mut metadata: Option<&mut dyn MetadataSource>,
) -> ScanOutput {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut blocks = BlockIndex::new();
    let mut state = State::Outside;
    let mut headings_seen = 0usize;
    let mut i = 0usize;
    while i < chars.len() {
        // Delimiters are at least two characters, so none is recognized at
        // the very last position.
        let can_delimit = i + 1 < chars.len();
        match &mut state {
            State::Outside => {
                if can_delimit && is_opener(&chars, i) {
                    state = State::InBlock {
                        depth: 1,
                        body_start: i + 2,
                        hebrew_link: hebrew_marker_at(&chars, i),
                    };
                    i += 2;
                } else {
                    i = copy_or_restructure(&chars, i, &mut out, &mut headings_seen);
                }
            }
            State::InBlock {
                depth,
                body_start,
                hebrew_link,
            } => {
                let start = *body_start;
                let hebrew = *hebrew_link;
                if can_delimit && is_opener(&chars, i) {
                    *depth += 1;
                    *hebrew_link = hebrew_marker_at(&chars, i);
                    i += 2;
                } else if can_delimit && is_closer(&chars, i, hebrew) {
                    *depth -= 1;
                    let closed = *depth == 0;
                    i += 2;
                    if closed {
                        let body: String = chars[start..i - 2].iter().collect();
                        finish_block(&body, lang, metadata.as_mut().map(|m| &mut **m as &mut dyn MetadataSource), &mut out, &mut blocks);
                        state = State::Outside;
                    }
                } else {
                    // Block content is dropped from the cleaned text.
                    i += 1;
                }
            }
        }
    }
    // A block still open at end of input is implicitly closed there.
    if let State::InBlock { body_start, .. } = state {
        if body_start <= chars.len() {
            let body: String = chars[body_start..].iter().collect();
            finish_block(&body, lang, metadata.as_mut().map(|m| &mut **m as &mut dyn MetadataSource), &mut out, &mut blocks);
        }
    }
    ScanOutput { text: out, blocks }
}

fn is_opener(chars: &[char], i: usize) -> bool {
    match chars[i] {
        '{' => chars.get(i + 1) == Some(&'{'),
        '[' => {
            chars.get(i + 1) == Some(&'[') && chars.get(i + 2) == Some(&HEBREW_LINK_MARKER)
        }
        '<' => follows(chars, i + 1, MAPLINK_OPEN) || follows(chars, i + 1, GALLERY_OPEN),
        _ => false,
    }
}

/// The ק marker two positions past an opener switches the scanner into the
/// mode where `]]` is a valid closer. The check runs on every opener, so a
/// nested opener can switch the mode for the rest of the block.
fn hebrew_marker_at(chars: &[char], i: usize) -> bool {
    chars.get(i + 2) == Some(&HEBREW_LINK_MARKER)
}

fn is_closer(chars: &[char], i: usize, hebrew_link: bool) -> bool {
    match chars[i] {
        '}' => chars.get(i + 1) == Some(&'}'),
        ']' => hebrew_link && chars.get(i + 1) == Some(&']'),
        '>' => {
            ends_with(&chars[..i], MAPLINK_CLOSE_SUFFIX)
                || ends_with(&chars[..i], GALLERY_CLOSE_SUFFIX)
        }
        _ => false,
    }
}

fn follows(chars: &[char], start: usize, expected: &[char]) -> bool {
    chars.len() >= start + expected.len() && &chars[start..start + expected.len()] == expected
}

fn ends_with(scanned: &[char], suffix: &[char]) -> bool {
    scanned.len() >= suffix.len() && &scanned[scanned.len() - suffix.len()..] == suffix
}

fn finish_block(
    body: &str,
    lang: &str,
    mut metadata: Option<&mut dyn MetadataSource>,
    out: &mut String,
    blocks: &mut BlockIndex,
) {
    let lowercased = body.to_lowercase();
    // Tag-delimited galleries lose their leading `<g` to the opener, so
    // the body starts with `allery`. Galleries render inline.
    if lowercased.starts_with("allery") {
        out.push_str(&parse_gallery(body));
    }
    let key = classify(&lowercased);
    match key {
        "poi" => {
            let parsed = parse_listing(
                body,
                lang,
                metadata.as_mut().map(|m| &mut **m as &mut dyn MetadataSource),
            );
            out.push_str(&parsed.text);
        }
        "region_list" => out.push_str(&parse_region_list(body)),
        "warning" => out.push_str(&parse_warning(body)),
        _ => {}
    }
    for part in key.split('|') {
        if let Some(kind) = TemplateKind::from_key(part) {
            blocks.add(kind, body.to_string());
        }
    }
}

/// Handles one position at depth zero: either copies the character through
/// or recognizes a heading and restructures it. Returns the next scan
/// position.
fn copy_or_restructure(
    chars: &[char],
    i: usize,
    out: &mut String,
    headings_seen: &mut usize,
) -> usize {
    // Only the start of an `=` run can open a heading.
    let level = if i > 0 && chars[i - 1] != '=' {
        heading_level(chars, i)
    } else {
        0
    };
    let after_run = i + level;
    if level > 1 && chars.get(after_run).map_or(false, |&c| c != '\n') {
        let close_start = match (after_run..chars.len()).find(|&j| chars[j] == '=') {
            Some(j) => j,
            // The heading never closes; the marker is dropped.
            None => return i + 1,
        };
        let close_end = close_start + heading_level(chars, close_start);
        let probe = if close_end + 2 < chars.len() {
            chars.get(close_end + 1)
        } else {
            chars.get(close_end)
        };
        let next_start = if probe == Some(&'\n') {
            close_end + 2
        } else {
            close_end + 1
        };
        let next_level = heading_level(chars, next_start);
        if next_level > 1 && level >= next_level {
            // The section holds nothing but another heading of the same
            // or shallower depth: drop it entirely.
            return close_end + 1;
        }
        if level == 2 {
            if *headings_seen != 0 {
                out.push_str("\n/div\n");
            }
            out.extend(chars[i..close_end].iter());
            out.push_str("\ndiv class=\"content\"\n");
            *headings_seen += 1;
            return close_end + 1;
        }
        out.push(chars[i]);
        return i + 1;
    }
    out.push(chars[i]);
    i + 1
}

fn heading_level(chars: &[char], mut index: usize) -> usize {
    let mut level = 0;
    while index + 1 < chars.len() && chars[index] == '=' {
        index += 1;
        level += 1;
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let text = "Rome is the capital of Italy.\nIt sits on the Tiber.\n";
        let output = scan(text, "en");
        assert_eq!(output.text, text);
        assert!(output.blocks.is_empty());
    }

    #[test]
    fn scan_is_idempotent_on_cleaned_prose() {
        let text = "Rome {{randomtemplate|x}} is old.\n";
        let once = scan(text, "en");
        let twice = scan(&once.text, "en");
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn unclassified_block_vanishes() {
        let output = scan("a{{randomtemplate|foo=bar}}b", "en");
        assert_eq!(output.text, "ab");
        assert!(output.blocks.is_empty());
    }

    #[test]
    fn location_block_is_indexed_but_not_rendered() {
        let output = scan("before {{geo|41.9|12.5}}after", "en");
        assert_eq!(output.text, "before after");
        assert_eq!(
            output.blocks.get(TemplateKind::Location),
            ["geo|41.9|12.5".to_string()]
        );
    }

    #[test]
    fn listing_renders_inline_and_is_indexed() {
        let output = scan("{{see|name=Colosseum}}\n", "en");
        assert_eq!(output.text, "'''Colosseum''', \n\n");
        assert_eq!(
            output.blocks.get(TemplateKind::PointOfInterest),
            ["see|name=Colosseum".to_string()]
        );
    }

    #[test]
    fn multiple_listings_keep_encounter_order() {
        let output = scan("{{see|name=A}} and {{do|name=B}}", "en");
        let pois = output.blocks.get(TemplateKind::PointOfInterest);
        assert_eq!(pois, ["see|name=A".to_string(), "do|name=B".to_string()]);
    }

    #[test]
    fn nested_blocks_form_one_body() {
        let output = scan("{{geo|{{inner|x}}|12.5}}", "en");
        assert_eq!(
            output.blocks.get(TemplateKind::Location),
            ["geo|{{inner|x}}|12.5".to_string()]
        );
        assert_eq!(output.text, "");
    }

    #[test]
    fn combined_alias_is_indexed_under_both_kinds() {
        let output = scan("{{quickbar|image=x.jpg|lat=1}}", "en");
        let body = "quickbar|image=x.jpg|lat=1".to_string();
        assert_eq!(output.blocks.get(TemplateKind::Location), [body.clone()]);
        assert_eq!(output.blocks.get(TemplateKind::Banner), [body]);
    }

    #[test]
    fn warning_renders_inline() {
        let output = scan("{{warningbox|Flooding in winter}}", "en");
        assert_eq!(
            output.text,
            "<p class=\"warning\"><b>Warning: </b>Flooding in winter</p>"
        );
        assert_eq!(
            output.blocks.get(TemplateKind::Warning),
            ["warningbox|Flooding in winter".to_string()]
        );
    }

    #[test]
    fn hebrew_link_block_closes_on_double_bracket() {
        let output = scan("שלום [[קטגוריה:לציו]] עולם", "he");
        assert_eq!(output.text, "שלום  עולם");
        assert_eq!(
            output.blocks.get(TemplateKind::PartOf),
            ["קטגוריה:לציו".to_string()]
        );
    }

    #[test]
    fn plain_double_bracket_is_ordinary_text() {
        let text = "a [[Roma]] link";
        let output = scan(text, "en");
        assert_eq!(output.text, text);
        assert!(output.blocks.is_empty());
    }

    #[test]
    fn gallery_tag_renders_image_lines() {
        let output = scan(
            "<gallery caption=\"x\">\nFile:Foo.jpg|Foo\nnot an image\n</gallery>Z",
            "en",
        );
        // The character after a tag closer is consumed with it.
        assert_eq!(output.text, "[[File:Foo.jpg|Foo]]\n");
    }

    #[test]
    fn maplink_tag_is_removed() {
        let output = scan("a<maplink lat=1>data</maplink>b", "en");
        assert_eq!(output.text, "a");
    }

    #[test]
    fn unterminated_block_is_closed_at_end_of_input() {
        let output = scan("text {{see|name=X", "en");
        assert_eq!(output.text, "text '''X''', \n");
        assert_eq!(
            output.blocks.get(TemplateKind::PointOfInterest),
            ["see|name=X".to_string()]
        );
    }

    #[test]
    fn balanced_depth_always_terminates() {
        let output = scan("{{a|{{b|{{c}}}}}} tail", "en");
        assert_eq!(output.text, " tail");
    }

    #[test]
    fn level_two_headings_open_and_close_sections() {
        let text = "intro\n== See ==\nsights\n== Do ==\nactivities\n";
        let output = scan(text, "en");
        assert_eq!(
            output.text,
            "intro\n== See ==\ndiv class=\"content\"\nsights\n\n/div\n== Do ==\ndiv class=\"content\"\nactivities\n"
        );
    }

    #[test]
    fn empty_subsection_is_skipped() {
        let text = "x\n== A ==\n== B ==\ntext";
        let output = scan(text, "en");
        assert_eq!(output.text, "x\n== B ==\ndiv class=\"content\"\ntext");
    }

    #[test]
    fn deeper_heading_after_level_two_is_kept() {
        let text = "x\n== A ==\n=== B ===\ntext";
        let output = scan(text, "en");
        assert!(output.text.contains("== A =="), "{:?}", output.text);
        assert!(output.text.contains("=== B ==="), "{:?}", output.text);
    }

    #[test]
    fn heading_inside_block_is_not_restructured() {
        let output = scan("{{geo|a\n== X ==\nb|1}}", "en");
        assert_eq!(output.text, "");
        assert_eq!(output.blocks.get(TemplateKind::Location).len(), 1);
    }
}
