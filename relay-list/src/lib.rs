//! Relay location data for the location selector.
//!
//! Parses the daemon's relay list, projects it into the country → city →
//! relay hierarchy the selector renders, and propagates settings changes.

pub mod error;
pub mod location;
pub mod node;
pub mod notifier;
pub mod relay_list;
pub mod settings;

pub use error::{HierarchyError, RelayListError};
pub use location::{Constraint, RelayLocation};
pub use node::{LocationNode, check_hierarchy, find_node};
pub use notifier::{EventNotifier, SubscriptionId};
pub use relay_list::{Relay, RelayEndpoint, RelayList, RelayListCity, RelayListCountry};
pub use settings::{BridgeSettings, BridgeState, RelaySettings, Settings, SettingsListener};
