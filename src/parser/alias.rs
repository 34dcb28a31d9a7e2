use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Canonicalises show names parsed out of release titles.
#[derive(Debug, Clone, Default)]
pub struct ShowNormalizer {
    aliases: Vec<(String, String)>,
}

impl ShowNormalizer {
    /// Builds a normaliser from a `bad name -> alias` table.
    #[must_use]
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        Self {
            aliases: aliases
                .iter()
                .map(|(bad, alias)| (bad.clone(), alias.clone()))
                .collect(),
        }
    }

    /// Applies alias substitution, then brackets a trailing year or
    /// two-letter country code: `Doctor Who 2005` -> `Doctor Who (2005)`.
    #[must_use]
    pub fn normalize(&self, show_name: &str) -> String {
        let mut name = show_name.to_string();

        if let Some((bad, alias)) = self
            .aliases
            .iter()
            .find(|(bad, _)| bad.eq_ignore_ascii_case(&name))
        {
            debug!(from = %bad, to = %alias, "Applied show alias");
            name.clone_from(alias);
        }

        bracket_suffixes(&name)
    }
}

fn bracket_suffixes(name: &str) -> String {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    static COUNTRY: OnceLock<Regex> = OnceLock::new();

    let year = YEAR.get_or_init(|| {
        Regex::new(r"\s(?P<year>\d{4})$").expect("Invalid regex pattern defined in code")
    });
    let country = COUNTRY.get_or_init(|| {
        Regex::new(r"\s(?P<country>[A-Z]{2})$").expect("Invalid regex pattern defined in code")
    });

    let name = year.replace(name, " ($year)");
    country.replace(&name, " ($country)").into_owned()
}
