//! The point-of-interest listing grammar.
//!
//! A listing block is a pipe-delimited sequence of `field=value` segments
//! after the template name. Field names vary per language edition; each
//! known field has a synonym set matched case-insensitively. Rendering
//! appends normalized fragments in the order fields are encountered, not
//! in a canonical field order.

use crate::balance_brackets;
use geo_coords::LatLon;
use unicase::UniCase;
use wikidata_lookup::{sitelink_title, MetadataSource};

/// Structured fields extracted from one listing block.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListingFields {
    pub name: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub fax: Option<String>,
    pub price: Option<String>,
    pub hours: Option<String>,
    pub directions: Option<String>,
    pub description: Option<String>,
    pub wikidata_id: Option<String>,
    pub wikipedia_title: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Rendered prose plus the structured fields of one listing block.
#[derive(Debug)]
pub struct ListingParse {
    pub text: String,
    pub fields: ListingFields,
}

impl ListingParse {
    /// The parsed coordinate pair, present only when both axes parsed.
    pub fn lat_lon(&self) -> Option<LatLon> {
        match (self.fields.lat, self.fields.lon) {
            (Some(lat), Some(lon)) => Some(LatLon::new(lat, lon)),
            _ => None,
        }
    }
}

const NAME: &[&str] = &["name", "nome", "nom", "שם", "نام"];
const WEBSITE: &[&str] = &["url", "sito", "האתר הרשמי", "نشانی اینترنتی"];
const AREA_CODE: &[&str] = &["intl-area-code"];
const ADDRESS: &[&str] = &["address", "addresse", "כתובת", "نشانی"];
const LATITUDE: &[&str] = &["lat", "latitude", "عرض جغرافیایی"];
const LONGITUDE: &[&str] = &["long", "longitude", "طول جغرافیایی"];
const DESCRIPTION: &[&str] = &["content", "descrizione", "description", "sobre", "תיאור", "متن"];
const EMAIL: &[&str] = &["email", "מייל", "پست الکترونیکی"];
const FAX: &[&str] = &["fax", "פקס", "دورنگار"];
const WIKIDATA: &[&str] = &["wdid", "wikidata"];
const PHONE: &[&str] = &["phone", "tel", "téléphone", "טלפון", "تلفن"];
const PRICE: &[&str] = &["price", "prezzo", "מחיר", "prix", "بها"];
const HOURS: &[&str] = &["hours", "שעות", "ساعت‌ها"];
const DIRECTIONS: &[&str] = &["directions", "direction", "הוראות", "مسیرها"];
const WIKIPEDIA: &[&str] = &["wikipedia"];

fn matches_any(field: &str, synonyms: &[&str]) -> bool {
    synonyms
        .iter()
        .any(|synonym| UniCase::new(field) == UniCase::new(*synonym))
}

/// Renders a listing body to prose and collects its structured fields.
/// `metadata` resolves Wikidata identifiers to sitelink titles when no
/// direct article link was given; pass `None` to skip resolution.
pub fn parse_listing(
    body: &str,
    lang: &str,
    mut metadata: Option<&mut dyn MetadataSource>,
) -> ListingParse {
    let parts: Vec<&str> = body.split('|').collect();
    let mut text = String::new();
    let mut fields = ListingFields::default();
    let mut area_code = String::new();
    let mut lat_text = None;
    let mut lon_text = None;
    // The first segment is the template name.
    for i in 1..parts.len() {
        let segment = parts[i].trim();
        let (field, value) = match segment.find('=') {
            Some(eq) => (
                segment[..eq].trim(),
                balance_brackets(segment[eq + 1..].trim().to_string(), &parts, i),
            ),
            None => (segment, String::new()),
        };
        // Values holding an unexpanded nested template are useless as text.
        if value.is_empty() || value.contains("{{") {
            continue;
        }
        if matches_any(field, NAME) {
            text.push_str("'''");
            text.push_str(&value);
            text.push_str("''', ");
            fields.name = Some(value);
        } else if matches_any(field, WEBSITE) {
            text.push_str("Website: ");
            text.push_str(&value);
            text.push_str(". ");
            fields.website = Some(value);
        } else if matches_any(field, AREA_CODE) {
            area_code = value;
        } else if matches_any(field, ADDRESS) {
            text.push_str(&value);
            text.push_str(", ");
            fields.address = Some(value);
        } else if matches_any(field, LATITUDE) {
            lat_text = Some(value);
        } else if matches_any(field, LONGITUDE) {
            lon_text = Some(value);
        } else if matches_any(field, DESCRIPTION) {
            text.push_str(&value);
            text.push(' ');
            fields.description = Some(value);
        } else if matches_any(field, EMAIL) {
            text.push_str("e-mail: mailto:");
            text.push_str(&value);
            text.push_str(", ");
            fields.email = Some(value);
        } else if matches_any(field, FAX) {
            text.push_str("fax: ");
            text.push_str(&value);
            text.push_str(", ");
            fields.fax = Some(value);
        } else if matches_any(field, WIKIDATA) {
            fields.wikidata_id = Some(value);
        } else if matches_any(field, PHONE) {
            let reference = phone_reference(&area_code, &value);
            text.push_str("☎ tel:");
            text.push_str(&reference);
            text.push_str(". ");
            fields.phone = Some(value);
        } else if matches_any(field, PRICE) {
            text.push_str(&value);
            text.push_str(". ");
            fields.price = Some(value);
        } else if matches_any(field, HOURS) {
            text.push_str("Working hours: ");
            text.push_str(&value);
            text.push_str(". ");
            fields.hours = Some(value);
        } else if matches_any(field, DIRECTIONS) {
            text.push_str(&value);
            text.push_str(". ");
            fields.directions = Some(value);
        } else if matches_any(field, &["indicazioni"]) {
            text.push_str("Indicazioni: ");
            text.push_str(&value);
            text.push_str(". ");
            fields.directions = Some(value);
        } else if matches_any(field, &["orari"]) {
            text.push_str("Orari: ");
            text.push_str(&value);
            text.push_str(". ");
            fields.hours = Some(value);
        } else if matches_any(field, &["horaire"]) {
            text.push_str("Horaire: ");
            text.push_str(&value);
            text.push_str(". ");
            fields.hours = Some(value);
        } else if matches_any(field, &["funcionamento"]) {
            text.push_str("Funcionamento: ");
            text.push_str(&value);
            text.push_str(". ");
            fields.hours = Some(value);
        } else if matches_any(field, WIKIPEDIA) && value != "undefined" {
            fields.wikipedia_title = Some(value);
        }
    }
    fields.lat = lat_text.and_then(|v: String| v.trim().parse().ok());
    fields.lon = lon_text.and_then(|v: String| v.trim().parse().ok());
    if fields.wikipedia_title.is_none() {
        if let (Some(id), Some(source)) = (fields.wikidata_id.clone(), metadata.as_mut()) {
            fields.wikipedia_title = source
                .metadata(&id)
                .and_then(|value| sitelink_title(&value, lang));
        }
    }
    if let Some(title) = &fields.wikipedia_title {
        text.push_str(&wikipedia_reference(lang, title));
        text.push(' ');
    }
    if let (Some(lat), Some(lon)) = (fields.lat, fields.lon) {
        text.push_str(&format!(" geo:{},{}", lat, lon));
    }
    text.push('\n');
    ListingParse { text, fields }
}

/// Collects the structured fields of a listing without rendering concerns
/// and without Wikidata resolution.
pub fn parse_listing_fields(body: &str) -> ListingFields {
    parse_listing(body, "", None).fields
}

/// Builds the `tel:` reference. Spaces and dashes in the area code become
/// slashes; the number is stripped to digits, `+`, parentheses and commas,
/// with parentheses transliterated to `o` and `c`.
fn phone_reference(area_code: &str, number: &str) -> String {
    let area = area_code.replace(|c| c == ' ' || c == '-', "/");
    let number: String = number
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | ','))
        .collect();
    format!("{}/{}", area, number)
        .replace('(', "o")
        .replace(')', "c")
}

fn wikipedia_reference(lang: &str, title: &str) -> String {
    format!(
        "[https://{}.wikipedia.org/wiki/{} Wikipedia]",
        lang,
        urlencoding::encode(&title.trim().replace(' ', "_"))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct FixedMetadata(Value);

    impl MetadataSource for FixedMetadata {
        fn metadata(&mut self, _id: &str) -> Option<Value> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn renders_name_and_phone() {
        let parsed = parse_listing(
            "vcard|name=Cafe Roma|phone=06-1234567|intl-area-code=+39",
            "en",
            None,
        );
        assert!(parsed.text.contains("'''Cafe Roma'''"), "{:?}", parsed.text);
        // The area code segment comes after the phone segment, so it is
        // not yet known when the phone renders.
        assert!(parsed.text.contains("☎ tel:/061234567. "), "{:?}", parsed.text);
        assert_eq!(parsed.fields.name.as_deref(), Some("Cafe Roma"));
        assert_eq!(parsed.fields.phone.as_deref(), Some("06-1234567"));
    }

    #[test]
    fn area_code_applies_to_later_phone() {
        let parsed = parse_listing(
            "vcard|name=Cafe Roma|intl-area-code=+39|phone=06-1234567",
            "en",
            None,
        );
        assert!(parsed.text.contains("☎ tel:+39/061234567. "), "{:?}", parsed.text);
    }

    #[test]
    fn phone_parentheses_become_letters() {
        let parsed = parse_listing(
            "listing|intl-area-code=+39|phone=(06) 1234567",
            "en",
            None,
        );
        assert!(parsed.text.contains("tel:+39/o06c1234567"), "{:?}", parsed.text);
    }

    #[test]
    fn embedded_link_pipe_does_not_truncate_value() {
        let parsed = parse_listing("poi|content=See the [[Roma|capital]] museum", "en", None);
        assert!(
            parsed.text.contains("See the [[Roma|capital]] museum"),
            "{:?}",
            parsed.text
        );
        assert_eq!(
            parsed.fields.description.as_deref(),
            Some("See the [[Roma|capital]] museum")
        );
    }

    #[test]
    fn coordinates_append_geo_suffix() {
        let parsed = parse_listing("see|name=X|lat=41.9|long=12.5", "en", None);
        assert!(parsed.text.ends_with(" geo:41.9,12.5\n"), "{:?}", parsed.text);
        let ll = parsed.lat_lon().unwrap();
        assert_eq!(ll.latitude(), 41.9);
        assert_eq!(ll.longitude(), 12.5);
    }

    #[test]
    fn half_parsed_coordinates_yield_no_geo() {
        let parsed = parse_listing("see|name=X|lat=41.9|long=east", "en", None);
        assert!(!parsed.text.contains("geo:"), "{:?}", parsed.text);
        assert!(parsed.lat_lon().is_none());
    }

    #[test]
    fn fragments_follow_encounter_order() {
        let parsed = parse_listing("see|phone=123|name=X", "en", None);
        let phone = parsed.text.find("tel:").unwrap();
        let name = parsed.text.find("'''X'''").unwrap();
        assert!(phone < name, "{:?}", parsed.text);
    }

    #[test]
    fn field_names_match_case_insensitively() {
        let parsed = parse_listing("see|NAME=X|Content=Nice.", "en", None);
        assert_eq!(parsed.fields.name.as_deref(), Some("X"));
        assert_eq!(parsed.fields.description.as_deref(), Some("Nice."));
    }

    #[test]
    fn hebrew_field_names() {
        let parsed = parse_listing("שתייה|שם=קפה|מחיר=10", "he", None);
        assert!(parsed.text.contains("'''קפה'''"), "{:?}", parsed.text);
        assert_eq!(parsed.fields.price.as_deref(), Some("10"));
    }

    #[test]
    fn nested_template_values_are_ignored() {
        let parsed = parse_listing("see|name={{flag|it}} Cafe", "en", None);
        assert_eq!(parsed.fields.name, None);
        assert_eq!(parsed.text, "\n");
    }

    #[test]
    fn wikidata_id_resolves_through_metadata_source() {
        let mut source = FixedMetadata(json!({
            "entities": {
                "Q220": { "sitelinks": { "enwiki": { "title": "Rome" } } }
            }
        }));
        let parsed = parse_listing("see|name=X|wikidata=Q220", "en", Some(&mut source));
        assert!(
            parsed.text.contains("[https://en.wikipedia.org/wiki/Rome Wikipedia]"),
            "{:?}",
            parsed.text
        );
    }

    #[test]
    fn direct_wikipedia_field_wins_over_wikidata() {
        let mut source = FixedMetadata(json!({
            "entities": {
                "Q220": { "sitelinks": { "enwiki": { "title": "Rome" } } }
            }
        }));
        let parsed = parse_listing(
            "see|name=X|wikipedia=Rome City|wikidata=Q220",
            "en",
            Some(&mut source),
        );
        assert!(
            parsed.text.contains("wiki/Rome_City Wikipedia]"),
            "{:?}",
            parsed.text
        );
    }

    #[test]
    fn undefined_wikipedia_is_ignored() {
        let parsed = parse_listing("see|name=X|wikipedia=undefined", "en", None);
        assert_eq!(parsed.fields.wikipedia_title, None);
        assert!(!parsed.text.contains("Wikipedia"), "{:?}", parsed.text);
    }

    #[test]
    fn missing_lookup_degrades_to_no_link() {
        let parsed = parse_listing("see|name=X|wikidata=Q220", "en", None);
        assert!(!parsed.text.contains("Wikipedia"), "{:?}", parsed.text);
    }

    #[test]
    fn fields_record_collects_everything() {
        let fields = parse_listing_fields(
            "see|name=Colosseum|url=https://example.org|address=Piazza 1|email=a@b.c\
             |fax=321|hours=9-17|directions=by metro|price=16|content=Ancient arena\
             |lat=41.8902|long=12.4922",
        );
        assert_eq!(fields.name.as_deref(), Some("Colosseum"));
        assert_eq!(fields.website.as_deref(), Some("https://example.org"));
        assert_eq!(fields.address.as_deref(), Some("Piazza 1"));
        assert_eq!(fields.email.as_deref(), Some("a@b.c"));
        assert_eq!(fields.fax.as_deref(), Some("321"));
        assert_eq!(fields.hours.as_deref(), Some("9-17"));
        assert_eq!(fields.directions.as_deref(), Some("by metro"));
        assert_eq!(fields.price.as_deref(), Some("16"));
        assert_eq!(fields.description.as_deref(), Some("Ancient arena"));
        assert_eq!(fields.lat, Some(41.8902));
        assert_eq!(fields.lon, Some(12.4922));
    }
}
