//! Derivation of the structured article record from a block index:
//! banner image filename, place-hierarchy string and GPX waypoints.

use field_grammars::{parse_listing_fields, IMAGE_EXTENSIONS};
use std::io::Write;
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

/// Picks the banner image filename out of the first banner block: the
/// first `|`-segment naming an image file, with any `https:` scheme and
/// any `key=` or namespace prefix removed.
pub fn banner_filename(blocks: &[String]) -> String {
    let first = match blocks.first() {
        Some(block) => block,
        None => return String::new(),
    };
    for segment in first.split('|') {
        let lower = segment.to_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
            let segment = segment.replace("https:", "");
            // Both `banner=File:X.jpg` forms occur; the later separator
            // wins.
            return match std::cmp::max(segment.find('='), segment.find(':')) {
                Some(index) => segment[index + 1..].trim().to_string(),
                None => segment.trim().to_string(),
            };
        }
    }
    String::new()
}

/// Extracts the place-hierarchy string from the first part-of block.
/// Quickfooter and footer templates keep the hierarchy in named fields;
/// everything else carries it as the second `|`-segment.
pub fn part_of(blocks: &[String]) -> String {
    let first = match blocks.first() {
        Some(block) => block,
        None => return String::new(),
    };
    let lower = first.to_lowercase();
    if lower.contains("quickfooter") {
        return part_of_from_quickfooter(first);
    }
    if lower.starts_with("footer|") {
        return part_of_from_footer(first);
    }
    match first.find('|') {
        Some(index) => first[index + 1..].to_string(),
        None => first.clone(),
    }
}

fn part_of_from_quickfooter(block: &str) -> String {
    let mut region = String::new();
    for segment in block.split('|') {
        if let Some(eq) = segment.find('=') {
            if !segment.contains("livello") {
                region = segment[eq + 1..].trim().to_string();
            }
        }
    }
    region
}

fn part_of_from_footer(block: &str) -> String {
    let second_pipe = block
        .find('|')
        .and_then(|f| block[f + 1..].find('|').map(|s| f + 1 + s));
    let end = second_pipe.unwrap_or_else(|| block.len());
    let begin = block.find('=').map(|eq| eq + 1).unwrap_or(0);
    if begin > end {
        eprintln!("Error parsing the partof: {}", block);
        return String::new();
    }
    block[begin..end].to_string()
}

/// A GPX-ready point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub link: Option<String>,
}

/// Builds one waypoint candidate per point-of-interest block. A block
/// without coordinates or without a name yields nothing. The category is
/// the template name, except for `vcard` listings which carry it in a
/// `type=` field.
pub fn waypoints(blocks: &[String]) -> Vec<Waypoint> {
    let mut points = Vec::new();
    for block in blocks {
        let head = block.split('|').next().unwrap_or("").replace('\n', "");
        let category = if head.to_lowercase() == "vcard" {
            vcard_type(block)
        } else {
            head
        };
        let fields = parse_listing_fields(block);
        let (lat, lon) = match (fields.lat, fields.lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => continue,
        };
        let name = match &fields.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => continue,
        };
        let mut description = Vec::new();
        if let Some(value) = &fields.description {
            description.push(value.clone());
        }
        if let Some(value) = &fields.email {
            description.push(format!("Email: {}", value));
        }
        if let Some(value) = &fields.phone {
            description.push(format!("Phone: {}", value));
        }
        if let Some(value) = &fields.price {
            description.push(format!("Price: {}", value));
        }
        if let Some(value) = &fields.hours {
            description.push(format!("Working hours: {}", value));
        }
        if let Some(value) = &fields.directions {
            description.push(format!("Directions: {}", value));
        }
        points.push(Waypoint {
            lat,
            lon,
            name,
            category,
            description: if description.is_empty() {
                None
            } else {
                Some(description.join("\n"))
            },
            link: fields.website.clone(),
        });
    }
    points
}

fn vcard_type(block: &str) -> String {
    for segment in block.split('|').skip(1) {
        if let Some(value) = segment.strip_prefix("type=") {
            return value.to_string();
        }
    }
    String::new()
}

/// Serializes waypoints as a GPX 1.1 document. An empty list yields an
/// empty string rather than an empty document.
pub fn gpx(points: &[Waypoint]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut buffer = Vec::new();
    let result = {
        let mut writer = EmitterConfig::new()
            .perform_indent(true)
            .create_writer(&mut buffer);
        write_gpx(&mut writer, points)
    };
    if result.is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

fn write_gpx<W: Write>(
    writer: &mut EventWriter<W>,
    points: &[Waypoint],
) -> xml::writer::Result<()> {
    writer.write(
        XmlEvent::start_element("gpx")
            .default_ns("http://www.topografix.com/GPX/1/1")
            .attr("version", "1.1")
            .attr("creator", "wikivoyage-data"),
    )?;
    for point in points {
        let lat = point.lat.to_string();
        let lon = point.lon.to_string();
        writer.write(
            XmlEvent::start_element("wpt")
                .attr("lat", &lat)
                .attr("lon", &lon),
        )?;
        writer.write(XmlEvent::start_element("name"))?;
        writer.write(XmlEvent::characters(&point.name))?;
        writer.write(XmlEvent::end_element())?;
        if let Some(description) = &point.description {
            writer.write(XmlEvent::start_element("desc"))?;
            writer.write(XmlEvent::characters(description))?;
            writer.write(XmlEvent::end_element())?;
        }
        if let Some(link) = &point.link {
            writer.write(XmlEvent::start_element("link").attr("href", link))?;
            writer.write(XmlEvent::end_element())?;
        }
        if !point.category.is_empty() {
            writer.write(XmlEvent::start_element("type"))?;
            writer.write(XmlEvent::characters(&point.category))?;
            writer.write(XmlEvent::end_element())?;
        }
        writer.write(XmlEvent::end_element())?;
    }
    writer.write(XmlEvent::end_element())?;
    Ok(())
}
