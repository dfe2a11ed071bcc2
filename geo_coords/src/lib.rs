//! Coordinate extraction from location blocks.
//!
//! Two grammars are supported: the positional `geo|<lat>|<lon>` form and
//! named `lat=`/`lon=` parameters carrying either decimal degrees or
//! degrees/minutes/seconds notation. Parsing is best effort: any failure
//! yields the 0.0 sentinel for that axis, never an error.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A latitude/longitude pair.
///
/// `(0, 0)` is the "no coordinate found" sentinel, not a valid coordinate
/// in this domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    latitude: f64,
    longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        LatLon {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn is_zero(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat: {} lon:{}", self.latitude, self.longitude)
    }
}

// degrees, junk, minutes, junk, optional seconds, junk, hemisphere letter
const DMS: &str = r#"(\d+).+?(\d+).+?(\d*).*?([NEWSnews]+)"#;

fn dms_exact() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{}$", DMS)).unwrap())
}

fn dms_search() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DMS).unwrap())
}

/// Converts degrees/minutes/seconds text to decimal degrees, negated for
/// the W and S hemispheres. Minutes are floored during recombination,
/// degrees and seconds are not. Unparseable input yields 0.0.
pub fn to_decimal_degrees(text: &str) -> f64 {
    let captures = match dms_search().captures(text) {
        Some(captures) => captures,
        None => return 0.0,
    };
    let group = |index: usize| captures.get(index).map_or("", |m| m.as_str());
    let degrees: f64 = group(1).parse().unwrap_or(0.0);
    let minutes: f64 = group(2).parse().unwrap_or(0.0);
    let seconds: f64 = if group(3).is_empty() {
        0.0
    } else {
        group(3).parse().unwrap_or(0.0)
    };
    let hemisphere = group(4);
    let sign = if hemisphere.eq_ignore_ascii_case("w") || hemisphere.eq_ignore_ascii_case("s") {
        -1.0
    } else {
        1.0
    };
    sign * (degrees + minutes.floor() / 60.0 + seconds / 3600.0)
}

/// Extracts coordinates from the first location block of an article.
/// Returns the zero sentinel when the list is empty or nothing parses.
pub fn lat_lon_from_geo_block(blocks: &[String]) -> LatLon {
    let mut lat = 0.0;
    let mut lon = 0.0;
    if let Some(location) = blocks.first() {
        let parts: Vec<&str> = location.split('|').collect();
        if location.contains("geo|") {
            // Assignment is sequential: a malformed longitude keeps a
            // latitude that already parsed.
            let _ = (|| -> Option<()> {
                lat = parts.get(1)?.trim().parse().ok()?;
                lon = parts.get(2)?.trim().parse().ok()?;
                Some(())
            })();
        } else {
            let mut lat_text = String::new();
            let mut lon_text = String::new();
            for part in &parts {
                let part = part.replace(' ', "");
                if part.starts_with("lat=") || part.starts_with("latitude=") {
                    lat_text = named_value(&part);
                } else if part.starts_with("lon=")
                    || part.starts_with("long=")
                    || part.starts_with("longitude=")
                {
                    lon_text = named_value(&part);
                }
            }
            if dms_exact().is_match(&lat_text) && dms_exact().is_match(&lon_text) {
                lat = to_decimal_degrees(&lat_text);
                lon = to_decimal_degrees(&lon_text);
            } else {
                let _ = (|| -> Option<()> {
                    lat = lat_text.replace('°', "").parse().ok()?;
                    lon = lon_text.replace('°', "").parse().ok()?;
                    Some(())
                })();
            }
        }
    }
    LatLon::new(lat, lon)
}

fn named_value(part: &str) -> String {
    match part.find('=') {
        Some(index) => part[index + 1..].replace('\n', ""),
        None => String::new(),
    }
}
