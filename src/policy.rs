// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use titlecase::titlecase;

/// Deployment specific formatting of stop names and reference codes.
pub trait NamingPolicy {
    fn fix_stop_name(&self, raw: &str) -> String;
    fn fix_reference_code(&self, raw: &str) -> String;
}

/// Leaves values alone apart from surrounding whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughNaming;

impl NamingPolicy for PassthroughNaming {
    fn fix_stop_name(&self, raw: &str) -> String {
        raw.trim().to_string()
    }

    fn fix_reference_code(&self, raw: &str) -> String {
        raw.trim().to_string()
    }
}

/// Title-cases shouted feed names ("PIAZZA CASTELLO" -> "Piazza Castello")
/// and strips configured prefixes such as "Fermata ".
#[derive(Debug, Clone, Default)]
pub struct TitleCaseNaming {
    pub strip_prefixes: Vec<String>,
}

impl TitleCaseNaming {
    pub fn new(strip_prefixes: Vec<String>) -> Self {
        Self { strip_prefixes }
    }
}

impl NamingPolicy for TitleCaseNaming {
    fn fix_stop_name(&self, raw: &str) -> String {
        let mut name = raw.trim().to_string();

        //leave non latin writing systems alone
        if name.len() >= 7 && name.chars().all(|c| c.is_ascii()) {
            name = titlecase(&name.to_lowercase());
        }

        for prefix in &self.strip_prefixes {
            if let Some(rest) = name.strip_prefix(prefix.as_str()) {
                name = rest.trim_start().to_string();
            }
        }

        name
    }

    fn fix_reference_code(&self, raw: &str) -> String {
        raw.trim().to_uppercase()
    }
}
