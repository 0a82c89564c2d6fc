//! Composite relay location identifiers.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RelayListError;

/// Identifies a country, a city within a country, or a single relay.
///
/// A child location always carries its parent's codes as a prefix, so
/// `City("se", "got")` is contained in `Country("se")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayLocation {
    Country(String),
    City(String, String),
    Hostname(String, String, String),
}

impl RelayLocation {
    pub fn country(code: impl Into<String>) -> Self {
        Self::Country(code.into())
    }

    pub fn city(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self::City(country.into(), city.into())
    }

    pub fn hostname(
        country: impl Into<String>,
        city: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Self {
        Self::Hostname(country.into(), city.into(), hostname.into())
    }

    pub fn country_code(&self) -> &str {
        match self {
            Self::Country(country) | Self::City(country, _) | Self::Hostname(country, _, _) => {
                country
            }
        }
    }

    pub fn city_code(&self) -> Option<&str> {
        match self {
            Self::Country(_) => None,
            Self::City(_, city) | Self::Hostname(_, city, _) => Some(city),
        }
    }

    pub fn hostname_code(&self) -> Option<&str> {
        match self {
            Self::Hostname(_, _, hostname) => Some(hostname),
            _ => None,
        }
    }

    /// Nesting depth: 0 for countries, 1 for cities, 2 for relays.
    pub fn depth(&self) -> u16 {
        match self {
            Self::Country(_) => 0,
            Self::City(..) => 1,
            Self::Hostname(..) => 2,
        }
    }

    /// The location one level up, or `None` for countries.
    pub fn parent(&self) -> Option<RelayLocation> {
        match self {
            Self::Country(_) => None,
            Self::City(country, _) => Some(Self::Country(country.clone())),
            Self::Hostname(country, city, _) => Some(Self::City(country.clone(), city.clone())),
        }
    }

    /// All strict ancestors, outermost first.
    pub fn ancestors(&self) -> Vec<RelayLocation> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(location) = current {
            current = location.parent();
            ancestors.push(location);
        }
        ancestors.reverse();
        ancestors
    }

    /// Returns true if `other` is this location or lies somewhere below it.
    pub fn contains(&self, other: &RelayLocation) -> bool {
        if self.country_code() != other.country_code() {
            return false;
        }
        match self {
            Self::Country(_) => true,
            Self::City(_, city) => other.city_code() == Some(city.as_str()),
            Self::Hostname(..) => self == other,
        }
    }

    fn sort_key(&self) -> (&str, Option<&str>, Option<&str>) {
        (self.country_code(), self.city_code(), self.hostname_code())
    }
}

impl Ord for RelayLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for RelayLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RelayLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Country(country) => write!(f, "{}", country),
            Self::City(country, city) => write!(f, "{}/{}", country, city),
            Self::Hostname(country, city, hostname) => {
                write!(f, "{}/{}/{}", country, city, hostname)
            }
        }
    }
}

impl FromStr for RelayLocation {
    type Err = RelayListError;

    /// Parses the `Display` form: `se`, `se/got` or `se/got/se-got-wg-001`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(3, '/').collect();
        if parts.iter().any(|part| part.trim().is_empty()) {
            return Err(RelayListError::InvalidLocation(s.to_string()));
        }
        match parts.as_slice() {
            [country] => Ok(Self::country(*country)),
            [country, city] => Ok(Self::city(*country, *city)),
            [country, city, hostname] => Ok(Self::hostname(*country, *city, *hostname)),
            _ => Err(RelayListError::InvalidLocation(s.to_string())),
        }
    }
}

/// A setting that is either unconstrained or pinned to one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint<T> {
    #[default]
    Any,
    Only(T),
}

impl<T> Constraint<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, Constraint::Any)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Constraint::Any => None,
            Constraint::Only(value) => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_codes() {
        let mut locations = vec![
            RelayLocation::city("se", "sto"),
            RelayLocation::hostname("se", "got", "se-got-wg-001"),
            RelayLocation::country("se"),
            RelayLocation::country("de"),
            RelayLocation::city("se", "got"),
        ];
        locations.sort();
        assert_eq!(
            locations,
            vec![
                RelayLocation::country("de"),
                RelayLocation::country("se"),
                RelayLocation::city("se", "got"),
                RelayLocation::hostname("se", "got", "se-got-wg-001"),
                RelayLocation::city("se", "sto"),
            ]
        );
    }

    #[test]
    fn test_ancestors_outermost_first() {
        let relay = RelayLocation::hostname("se", "got", "se-got-wg-001");
        assert_eq!(
            relay.ancestors(),
            vec![RelayLocation::country("se"), RelayLocation::city("se", "got")]
        );
        assert!(RelayLocation::country("se").ancestors().is_empty());
    }

    #[test]
    fn test_contains() {
        let sweden = RelayLocation::country("se");
        let gothenburg = RelayLocation::city("se", "got");
        let relay = RelayLocation::hostname("se", "got", "se-got-wg-001");

        assert!(sweden.contains(&gothenburg));
        assert!(sweden.contains(&relay));
        assert!(gothenburg.contains(&relay));
        assert!(!gothenburg.contains(&sweden));
        assert!(!RelayLocation::city("se", "sto").contains(&relay));
        assert!(!RelayLocation::country("de").contains(&relay));
    }

    #[test]
    fn test_display_and_parse() {
        let relay = RelayLocation::hostname("se", "got", "se-got-wg-001");
        assert_eq!(relay.to_string(), "se/got/se-got-wg-001");
        assert_eq!("se/got/se-got-wg-001".parse::<RelayLocation>().unwrap(), relay);
        assert_eq!("se".parse::<RelayLocation>().unwrap(), RelayLocation::country("se"));
        assert!("se//x".parse::<RelayLocation>().is_err());
        assert!("".parse::<RelayLocation>().is_err());
    }
}
