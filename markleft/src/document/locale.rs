use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A locale the compiler knows how to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ru,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ru];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }

    pub fn from_name(name: &str) -> Option<Locale> {
        Locale::ALL.into_iter().find(|l| l.as_str() == name)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_name(s).ok_or_else(|| format!("unknown locale `{}` (expected en or ru)", s))
    }
}

/// The tag of a LocaleBlock as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocaleTag {
    Known(Locale),
    /// Unrecognized tag; retained so formatting round-trips.
    Unknown(String),
}

impl LocaleTag {
    pub fn from_name(name: &str) -> LocaleTag {
        match Locale::from_name(name) {
            Some(locale) => LocaleTag::Known(locale),
            None => LocaleTag::Unknown(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LocaleTag::Known(locale) => locale.as_str(),
            LocaleTag::Unknown(name) => name,
        }
    }

    pub fn locale(&self) -> Option<Locale> {
        match self {
            LocaleTag::Known(locale) => Some(*locale),
            LocaleTag::Unknown(_) => None,
        }
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
