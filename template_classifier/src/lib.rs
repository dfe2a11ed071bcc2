//! Classification of template-block bodies by their leading text.
//!
//! Wikivoyage editions in different languages open the same structural
//! templates with different names. The classifier maps the lowercased body
//! of a block to a semantic kind by prefix matching against a single
//! curated table covering all supported editions.

/// Semantic kind of a classified template block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateKind {
    Location,
    PointOfInterest,
    PartOf,
    Banner,
    RegionList,
    Warning,
}

impl TemplateKind {
    /// The string key used in classifier output and block maps.
    pub fn key(self) -> &'static str {
        match self {
            TemplateKind::Location => "geo",
            TemplateKind::PointOfInterest => "poi",
            TemplateKind::PartOf => "part_of",
            TemplateKind::Banner => "pagebanner",
            TemplateKind::RegionList => "region_list",
            TemplateKind::Warning => "warning",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "geo" => Some(TemplateKind::Location),
            "poi" => Some(TemplateKind::PointOfInterest),
            "part_of" => Some(TemplateKind::PartOf),
            "pagebanner" => Some(TemplateKind::Banner),
            "region_list" => Some(TemplateKind::RegionList),
            "warning" => Some(TemplateKind::Warning),
            _ => None,
        }
    }
}

/// Key emitted for blocks that carry both location and banner data
/// (`quickbar`, `info `). Callers split the key on `|` and record the body
/// under every listed kind.
pub const COMBINED_BANNER_LOCATION: &str = "geo|pagebanner";

/// Ordered prefix table. The first matching prefix wins, so order is
/// significant where prefixes overlap: `quickbar ` (with a trailing space,
/// the banner form) must precede the bare `quickbar` alias, and the
/// hierarchy prefixes precede the short point-of-interest verbs.
static PREFIX_TABLE: &[(&str, &str)] = &[
    // location
    ("geo|", "geo"),
    ("geodata", "geo"),
    // place hierarchy
    ("ispartof|", "part_of"),
    ("istinkat", "part_of"),
    ("isin", "part_of"),
    ("quickfooter", "part_of"),
    ("dans", "part_of"),
    ("footer|", "part_of"),
    ("fica em", "part_of"),
    ("estáen", "part_of"),
    ("קטגוריה", "part_of"),
    ("είναιΤμήμαΤου", "part_of"),
    ("commonscat", "part_of"),
    ("jest w", "part_of"),
    ("partoftopic", "part_of"),
    ("theme", "part_of"),
    ("categoría", "part_of"),
    ("بخشی", "part_of"),
    // point-of-interest listings
    ("do", "poi"),
    ("see", "poi"),
    ("eat", "poi"),
    ("drink", "poi"),
    ("sleep", "poi"),
    ("buy", "poi"),
    ("listing", "poi"),
    ("vcard", "poi"),
    ("se loger", "poi"),
    ("destination", "poi"),
    ("voir", "poi"),
    ("aller", "poi"),
    ("manger", "poi"),
    ("durma", "poi"),
    ("veja", "poi"),
    ("coma", "poi"),
    ("אוכל", "poi"),
    ("שתייה", "poi"),
    ("לינה", "poi"),
    ("מוקדי", "poi"),
    ("רשימה", "poi"),
    ("marker", "poi"),
    ("خوابیدن", "poi"),
    ("دیدن", "poi"),
    ("انجام‌دادن", "poi"),
    ("نوشیدن", "poi"),
    // page banner
    ("pagebanner", "pagebanner"),
    ("citybar", "pagebanner"),
    ("quickbar ", "pagebanner"),
    ("banner", "pagebanner"),
    ("באנר", "pagebanner"),
    ("سرصفحه", "pagebanner"),
    // combined banner and location infoboxes
    ("quickbar", COMBINED_BANNER_LOCATION),
    ("info ", COMBINED_BANNER_LOCATION),
    // region list and warning boxes
    ("regionlist", "region_list"),
    ("warningbox", "warning"),
];

/// Classifies a lowercased block body. Returns the kind key, possibly a
/// `|`-separated list of keys, or `""` when no prefix matches.
pub fn classify(lowercased_body: &str) -> &'static str {
    for (prefix, key) in PREFIX_TABLE {
        if lowercased_body.starts_with(prefix) {
            return key;
        }
    }
    ""
}
