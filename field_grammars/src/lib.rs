//! Pipe-delimited field grammars for the template blocks that contribute
//! visible prose: point-of-interest listings, region lists, warning boxes
//! and image galleries.

use regex::Regex;
use std::sync::OnceLock;

mod listing;

pub use listing::{parse_listing, parse_listing_fields, ListingFields, ListingParse};

/// File extensions that mark a line or segment as naming an image.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];

/// Extends a field value with further `|`-delimited segments while it
/// contains more `[[` than `]]`. An embedded wiki link may carry a literal
/// pipe; the segment split must not truncate the value inside the link.
/// `index` is the position of the segment the value came from.
pub fn balance_brackets(mut value: String, parts: &[&str], mut index: usize) -> String {
    while occurrences(&value, "[[") > occurrences(&value, "]]") && index + 1 < parts.len() {
        index += 1;
        value.push('|');
        value.push_str(parts[index]);
    }
    value
}

fn occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Renders a warning box: the second `|`-segment wrapped in fixed warning
/// markup. Anything beyond the message segment is ignored.
pub fn parse_warning(body: &str) -> String {
    let parts: Vec<&str> = body.split('|').collect();
    let mut out = String::from("<p class=\"warning\"><b>Warning: </b>");
    let message = parts.get(1).copied().unwrap_or("");
    if !message.is_empty() {
        out.push_str(&balance_brackets(message.to_string(), &parts, 1));
    }
    out.push_str("</p>");
    out
}

/// Renders a gallery body. Galleries are line oriented, not pipe
/// delimited: every line naming an image file is re-wrapped as a wiki
/// link, all other lines are dropped.
pub fn parse_gallery(body: &str) -> String {
    let mut out = String::new();
    for line in body.split('\n') {
        let lower = line.to_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
            out.push_str("[[");
            out.push_str(line);
            out.push_str("]]");
        }
    }
    out
}

fn region_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^region\d+name$").unwrap())
}

fn region_description_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^region\d+description$").unwrap())
}

/// Renders a region list: `region<N>name` fields become bullet lines,
/// `region<N>description` fields become plain lines.
pub fn parse_region_list(body: &str) -> String {
    let parts: Vec<&str> = body.split('|').collect();
    let mut out = String::new();
    let mut i = 0;
    while i < parts.len() {
        let part = parts[i].trim();
        if let Some(eq) = part.find('=') {
            let field = part[..eq].trim();
            if region_name_pattern().is_match(field) {
                let value = balance_brackets(part[eq + 1..].to_string(), &parts, i);
                out.push('*');
                out.push_str(&value);
                out.push('\n');
            } else if region_description_pattern().is_match(field) {
                // A description may span further segments; the next
                // segment containing `=` ends it. A description with a
                // literal `=` in its text mis-splits here.
                let mut description = part[eq + 1..].to_string();
                while i + 1 < parts.len() && !parts[i + 1].contains('=') {
                    i += 1;
                    description.push('|');
                    description.push_str(parts[i]);
                }
                out.push_str(&description);
                out.push('\n');
            }
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_takes_second_segment() {
        assert_eq!(
            parse_warning("warningbox|Do not travel after dark"),
            "<p class=\"warning\"><b>Warning: </b>Do not travel after dark</p>"
        );
    }

    #[test]
    fn warning_balances_embedded_link() {
        assert_eq!(
            parse_warning("warningbox|Avoid the [[north|dangerous]] area"),
            "<p class=\"warning\"><b>Warning: </b>Avoid the [[north|dangerous]] area</p>"
        );
    }

    #[test]
    fn warning_without_message() {
        assert_eq!(
            parse_warning("warningbox"),
            "<p class=\"warning\"><b>Warning: </b></p>"
        );
    }

    #[test]
    fn gallery_keeps_only_image_lines() {
        let body = "allery caption=\"Views\"\nFile:Forum.JPG|The forum\nsome caption text\nFile:Tiber.png\n";
        assert_eq!(
            parse_gallery(body),
            "[[File:Forum.JPG|The forum]][[File:Tiber.png]]"
        );
    }

    #[test]
    fn region_list_bullets_and_descriptions() {
        let body = "regionlist\
            |region1name=[[Lazio|Latium]]\
            |region1description=Central region|with the capital\
            |region2name=Tuscany\
            |region2description=Hill country";
        assert_eq!(
            parse_region_list(body),
            "*[[Lazio|Latium]]\nCentral region|with the capital\n*Tuscany\nHill country\n"
        );
    }

    #[test]
    fn region_list_ignores_other_fields() {
        let body = "regionlist|regionmap=Italy.png|region1name=Lazio";
        assert_eq!(parse_region_list(body), "*Lazio\n");
    }

    #[test]
    fn bracket_balance_stops_at_last_segment() {
        let parts = vec!["x", "a [[b", "c"];
        assert_eq!(balance_brackets("a [[b".to_string(), &parts, 1), "a [[b|c");
    }

    #[test]
    fn bracket_balance_leaves_closed_values_alone() {
        let parts = vec!["x", "a [[b]]", "c"];
        assert_eq!(balance_brackets("a [[b]]".to_string(), &parts, 1), "a [[b]]");
    }
}
