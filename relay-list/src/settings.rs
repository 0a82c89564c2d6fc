//! Settings pushed from the daemon and the listener that propagates them.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::location::{Constraint, RelayLocation};
use crate::notifier::{EventNotifier, SubscriptionId};

/// Exit relay constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySettings {
    pub location: Option<RelayLocation>,
}

/// Bridge (entry) constraints. `Any` means "closest to exit".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSettings {
    pub location: Constraint<RelayLocation>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub account_token: Option<String>,
    pub relay_settings: RelaySettings,
    pub bridge_settings: BridgeSettings,
    pub bridge_state: BridgeState,
}

impl Settings {
    /// Entry selection is only offered while bridges are forced on.
    pub fn allows_bridge_selection(&self) -> bool {
        self.bridge_state == BridgeState::On
    }
}

type RelaySettingsCallback = Box<dyn FnMut(&RelaySettings)>;

/// Tracks the latest daemon settings and notifies interested parties about
/// the parts that changed.
pub struct SettingsListener {
    settings: EventNotifier<Settings>,
    account_number: EventNotifier<Option<String>>,
    relay_settings_changed: Option<RelaySettingsCallback>,
}

impl SettingsListener {
    pub fn new(initial: Settings) -> Self {
        let account = initial.account_token.clone();
        Self {
            settings: EventNotifier::new(initial),
            account_number: EventNotifier::new(account),
            relay_settings_changed: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings.latest()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Settings) + 'static) -> SubscriptionId {
        self.settings.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.settings.unsubscribe(id)
    }

    pub fn account_number_notifier(&mut self) -> &mut EventNotifier<Option<String>> {
        &mut self.account_number
    }

    /// Install the relay settings callback. It is called right away with
    /// the current relay settings.
    pub fn set_relay_settings_callback(&mut self, mut callback: impl FnMut(&RelaySettings) + 'static) {
        callback(&self.settings().relay_settings);
        self.relay_settings_changed = Some(Box::new(callback));
    }

    pub fn clear_relay_settings_callback(&mut self) {
        self.relay_settings_changed = None;
    }

    /// Entry point for daemon pushes. `None` means the daemon sent an event
    /// without settings and is ignored.
    pub fn handle_daemon_event(&mut self, settings: Option<Settings>) {
        if let Some(settings) = settings {
            self.handle_new_settings(settings);
        }
    }

    pub fn handle_new_settings(&mut self, new_settings: Settings) {
        let current = self.settings.latest();
        if current.account_token != new_settings.account_token {
            debug!("Account number changed");
            self.account_number
                .notify(new_settings.account_token.clone());
        }

        if current.relay_settings != new_settings.relay_settings {
            debug!("Relay settings changed: {:?}", new_settings.relay_settings);
            if let Some(callback) = self.relay_settings_changed.as_mut() {
                callback(&new_settings.relay_settings);
            }
        }

        self.settings.notify(new_settings);
    }

    /// Drop every subscriber.
    pub fn on_destroy(&mut self) {
        self.account_number.unsubscribe_all();
        self.settings.unsubscribe_all();
        self.relay_settings_changed = None;
    }
}
