//! Relay list wire format and its projection into location trees.

use std::io::{Read, Write};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::RelayListError;
use crate::location::RelayLocation;
use crate::node::LocationNode;

/// The relay list as published by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayList {
    pub countries: Vec<RelayListCountry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayListCountry {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub cities: Vec<RelayListCity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayListCity {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub relays: Vec<Relay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relay {
    pub hostname: String,
    #[serde(default)]
    pub ipv4_addr_in: Option<String>,
    pub active: bool,
    /// Relays excluded from their country only count toward their city.
    #[serde(default = "default_true")]
    pub include_in_country: bool,
    #[serde(default)]
    pub endpoint: RelayEndpoint,
}

fn default_true() -> bool {
    true
}

/// The tunnel role a relay serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayEndpoint {
    #[default]
    Wireguard,
    Openvpn,
    Bridge,
}

impl RelayList {
    pub fn from_json(json: &str) -> Result<Self, RelayListError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, RelayListError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_writer(&self, writer: impl Write) -> Result<(), RelayListError> {
        Ok(serde_json::to_writer_pretty(writer, self)?)
    }

    /// Locations that can serve as the exit hop.
    pub fn exit_locations(&self) -> Vec<LocationNode> {
        self.project(|relay| relay.endpoint != RelayEndpoint::Bridge)
    }

    /// Locations that can serve as the entry (bridge) hop.
    pub fn bridge_locations(&self) -> Vec<LocationNode> {
        self.project(|relay| relay.endpoint == RelayEndpoint::Bridge)
    }

    /// Build the sorted country → city → relay hierarchy for the relays
    /// accepted by `filter`. Cities and countries left without relays are
    /// dropped.
    fn project(&self, filter: impl Fn(&Relay) -> bool) -> Vec<LocationNode> {
        let mut countries: Vec<LocationNode> = self
            .countries
            .iter()
            .filter_map(|country| {
                let mut has_active_relays = false;
                let mut cities: Vec<LocationNode> = country
                    .cities
                    .iter()
                    .filter_map(|city| {
                        let mut relays: Vec<LocationNode> = city
                            .relays
                            .iter()
                            .filter(|relay| filter(relay))
                            .map(|relay| {
                                has_active_relays |= relay.active && relay.include_in_country;
                                LocationNode::new(
                                    RelayLocation::hostname(
                                        &country.code,
                                        &city.code,
                                        &relay.hostname,
                                    ),
                                    &relay.hostname,
                                    relay.active,
                                )
                            })
                            .collect();
                        if relays.is_empty() {
                            return None;
                        }
                        relays.sort_by(|a, b| a.name.cmp(&b.name));
                        let city_active = relays.iter().any(|relay| relay.has_active_relays);
                        Some(
                            LocationNode::new(
                                RelayLocation::city(&country.code, &city.code),
                                &city.name,
                                city_active,
                            )
                            .with_children(relays),
                        )
                    })
                    .collect();
                if cities.is_empty() {
                    return None;
                }
                cities.sort_by(|a, b| a.name.cmp(&b.name));
                Some(
                    LocationNode::new(
                        RelayLocation::country(&country.code),
                        &country.name,
                        has_active_relays,
                    )
                    .with_children(cities),
                )
            })
            .collect();
        countries.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Projected {} countries from relay list", countries.len());
        countries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay(hostname: &str, active: bool, endpoint: RelayEndpoint) -> Relay {
        Relay {
            hostname: hostname.to_string(),
            ipv4_addr_in: None,
            active,
            include_in_country: true,
            endpoint,
        }
    }

    #[test]
    fn test_inactive_relays_mark_city_inactive() {
        let list = RelayList {
            countries: vec![RelayListCountry {
                name: "Sweden".into(),
                code: "se".into(),
                cities: vec![RelayListCity {
                    name: "Malmö".into(),
                    code: "mma".into(),
                    latitude: 0.0,
                    longitude: 0.0,
                    relays: vec![relay("se-mma-wg-001", false, RelayEndpoint::Wireguard)],
                }],
            }],
        };

        let exit = list.exit_locations();
        assert_eq!(exit.len(), 1);
        assert!(!exit[0].has_active_relays);
        assert!(!exit[0].children[0].has_active_relays);
        assert!(list.bridge_locations().is_empty());
    }

    #[test]
    fn test_excluded_relay_only_counts_for_city() {
        let mut excluded = relay("se-sto-wg-001", true, RelayEndpoint::Wireguard);
        excluded.include_in_country = false;
        let list = RelayList {
            countries: vec![RelayListCountry {
                name: "Sweden".into(),
                code: "se".into(),
                cities: vec![RelayListCity {
                    name: "Stockholm".into(),
                    code: "sto".into(),
                    latitude: 0.0,
                    longitude: 0.0,
                    relays: vec![excluded],
                }],
            }],
        };

        let exit = list.exit_locations();
        assert!(!exit[0].has_active_relays);
        assert!(exit[0].children[0].has_active_relays);
    }
}
