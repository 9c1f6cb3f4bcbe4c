use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The languages the advisor can converse in.
///
/// The active locale selects the greeting, every canned reply, and the
/// language directive embedded in the system instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Es];

    /// Short code used on the wire and in configuration (`en`, `es`).
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    /// The English name of the language, as the model expects it in the
    /// "respond only in ..." directive.
    pub fn language_name(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Es => "Spanish",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported locale: '{0}'")]
pub struct ParseLocaleError(pub String);

impl FromStr for Locale {
    type Err = ParseLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            _ => Err(ParseLocaleError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse_is_case_insensitive() {
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!(" es ".parse::<Locale>().unwrap(), Locale::Es);
    }

    #[test]
    fn test_locale_parse_rejects_unknown() {
        let err = "fr".parse::<Locale>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported locale: 'fr'");
    }

    #[test]
    fn test_locale_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Locale::Es).unwrap(), "\"es\"");
        let parsed: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(parsed, Locale::En);
        assert_eq!(Locale::default(), Locale::En);
    }
}
