//! Legacy code mapping tables
//!
//! The legacy `mwnf3` schema identifies languages and countries with
//! 2-character codes, several of which are not ISO codes at all (`se` for
//! Swedish, `ab` for Albania). The new schema uses ISO 639-3 and
//! ISO 3166-1 alpha-3 identifiers.
//!
//! A code missing from these tables is always an error. Defaulting it would
//! silently point translations at the wrong parent row.

use thiserror::Error;

/// Legacy 2-character language codes (as used in `mwnf3` `lang` columns)
/// to ISO 639-3 codes.
pub const LANGUAGE_CODE_MAP: &[(&str, &str)] = &[
    ("ar", "ara"),
    ("cs", "ces"),
    ("de", "deu"),
    ("en", "eng"),
    ("es", "spa"),
    ("fa", "fas"),
    ("fr", "fra"),
    ("he", "heb"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("pt", "por"),
    ("ru", "rus"),
    ("tr", "tur"),
    ("zh", "zho"),
    ("el", "ell"),
    // Legacy-only codes
    ("ch", "zho"),
    ("se", "swe"),
    ("si", "slv"),
];

/// Legacy 2-character country codes (as used in `mwnf3.countrynames`) to
/// ISO 3166-1 alpha-3 codes.
pub const COUNTRY_CODE_MAP: &[(&str, &str)] = &[
    ("at", "aut"),
    ("az", "aze"),
    ("be", "bel"),
    ("br", "bra"),
    ("ca", "can"),
    ("cz", "cze"),
    ("de", "deu"),
    ("dz", "dza"),
    ("eg", "egy"),
    ("es", "esp"),
    ("fr", "fra"),
    ("gr", "grc"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("iq", "irq"),
    ("jo", "jor"),
    ("jp", "jpn"),
    ("lb", "lbn"),
    ("ly", "lby"),
    ("ma", "mar"),
    ("pl", "pol"),
    ("pt", "prt"),
    ("ro", "rou"),
    ("ru", "rus"),
    ("sa", "sau"),
    ("sy", "syr"),
    ("tn", "tun"),
    ("tr", "tur"),
    // Legacy-only codes
    ("ab", "alb"),
    ("ag", "arg"),
    ("al", "aus"),
    ("bg", "bgd"),
    ("bh", "bhr"),
    ("bl", "blr"),
    ("bs", "bih"),
    ("bu", "bgr"),
    ("ch", "chn"),
    ("co", "com"),
    ("cy", "cyp"),
    ("dj", "dji"),
    ("dn", "dnk"),
    ("et", "est"),
    ("fn", "fin"),
    ("ge", "geo"),
    ("ia", "irn"),
    ("is", "isr"),
    ("ix", "ita"),
    ("ln", "ltu"),
    ("lt", "lva"),
    ("lx", "lux"),
    ("mc", "mkd"),
    ("md", "mda"),
    ("ml", "mlt"),
    ("mn", "mne"),
    ("mt", "mrt"),
    ("nt", "nld"),
    ("on", "omn"),
    ("pa", "pse"),
    ("pd", "zzzpd"),
    ("px", "pse"),
    ("qt", "qat"),
    ("rm", "rou"),
    ("sb", "srb"),
    ("sd", "sdn"),
    ("sf", "zaf"),
    ("sl", "svk"),
    ("so", "som"),
    ("sw", "che"),
    ("uc", "ukr"),
    ("uk", "gbr"),
    ("va", "vat"),
    ("ww", "zzzww"),
    ("ym", "yem"),
];

/// Mapping errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Unknown language code '{0}'. Add it to LANGUAGE_CODE_MAP")]
    UnknownLanguageCode(String),

    #[error("Unknown country code '{0}'. Add it to COUNTRY_CODE_MAP")]
    UnknownCountryCode(String),
}

fn lookup(table: &'static [(&'static str, &'static str)], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(legacy, _)| *legacy == code)
        .map(|(_, iso)| *iso)
}

/// Map a legacy language code to its ISO 639-3 code
pub fn map_language_code(legacy_code: &str) -> Result<&'static str, MappingError> {
    lookup(LANGUAGE_CODE_MAP, legacy_code)
        .ok_or_else(|| MappingError::UnknownLanguageCode(legacy_code.to_string()))
}

/// Map a legacy country code to its ISO 3166-1 alpha-3 code
pub fn map_country_code(legacy_code: &str) -> Result<&'static str, MappingError> {
    lookup(COUNTRY_CODE_MAP, legacy_code)
        .ok_or_else(|| MappingError::UnknownCountryCode(legacy_code.to_string()))
}
