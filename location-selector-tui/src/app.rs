//! The interactive location picker.
//!
//! Settings live in a [`SettingsListener`] standing in for the daemon:
//! selections are written back as new settings, and the listener's
//! notifications drive the next render.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use location_selector::{
    LayoutLine, LocationScope, LocationSelector, RowTarget, SelectorConfig, SelectorEvent,
    SelectorProps,
};
use log::{debug, info};
use relay_list::{
    BridgeState, Constraint, LocationNode, RelayList, RelayLocation, Settings, SettingsListener,
    SubscriptionId,
};

use crate::error::AppError;
use crate::terminal::{Line, LineStyle, Terminal};

/// Poll timeout while something is animating.
const FRAME: Duration = Duration::from_millis(16);
/// Poll timeout when idle.
const IDLE: Duration = Duration::from_millis(500);
/// Title and scope bar above the list, status line below it.
const HEADER_ROWS: u16 = 2;
const FOOTER_ROWS: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    PageUp,
    PageDown,
    Toggle,
    Select,
    SwitchScope,
    CycleBridgeState,
    Quit,
}

/// Map a key press to an action.
pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => Some(Action::Toggle),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Tab => Some(Action::SwitchScope),
        KeyCode::Char('b') => Some(Action::CycleBridgeState),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

pub struct App {
    selector: LocationSelector,
    listener: SettingsListener,
    subscription: SubscriptionId,
    settings_changed: Rc<Cell<bool>>,
    relay_locations: Arc<[LocationNode]>,
    bridge_locations: Arc<[LocationNode]>,
    scope: LocationScope,
    cursor: Option<RowTarget>,
    viewport_override: Option<u16>,
    quit: bool,
}

impl App {
    pub fn new(
        relays: &RelayList,
        settings: Settings,
        config: SelectorConfig,
        viewport_override: Option<u16>,
    ) -> Result<Self, AppError> {
        let relay_locations: Arc<[LocationNode]> = relays.exit_locations().into();
        let bridge_locations: Arc<[LocationNode]> = relays.bridge_locations().into();
        info!(
            "Loaded {} exit countries, {} bridge countries",
            relay_locations.len(),
            bridge_locations.len()
        );

        let mut listener = SettingsListener::new(settings);
        let settings_changed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&settings_changed);
        let subscription = listener.subscribe(move |_| flag.set(true));
        listener.set_relay_settings_callback(|relay_settings| {
            debug!("Exit constraint is now {:?}", relay_settings.location);
        });

        Ok(Self {
            selector: LocationSelector::new(config)?,
            listener,
            subscription,
            settings_changed,
            relay_locations,
            bridge_locations,
            scope: LocationScope::Exit,
            cursor: None,
            viewport_override,
            quit: false,
        })
    }

    pub fn run(&mut self, terminal: &mut Terminal) -> Result<(), AppError> {
        let (_, height) = terminal.size()?;
        self.resize(height);
        let now = Instant::now();
        self.selector.mount(self.props(), now);
        self.settings_changed.set(false);
        self.reset_cursor();

        while !self.quit {
            let busy = self.tick(Instant::now());
            terminal.draw(&self.frame())?;

            let timeout = if busy { FRAME } else { IDLE };
            for event in terminal.poll(Some(timeout))? {
                self.handle_event(event, Instant::now());
            }
        }

        self.selector.unmount();
        self.listener.unsubscribe(self.subscription);
        self.listener.on_destroy();
        info!("Location selector closed");
        Ok(())
    }

    fn props(&self) -> SelectorProps {
        let settings = self.listener.settings();
        SelectorProps {
            scope: self.scope,
            relay_locations: Arc::clone(&self.relay_locations),
            bridge_locations: Arc::clone(&self.bridge_locations),
            selected_exit: settings.relay_settings.location.clone(),
            selected_bridge: Some(settings.bridge_settings.location.clone()),
            allow_bridge_selection: settings.allows_bridge_selection(),
        }
    }

    /// One frame: pick up settings changes, then move animations forward.
    fn tick(&mut self, now: Instant) -> bool {
        if self.settings_changed.replace(false) {
            self.render(now);
        }
        let busy = self.selector.advance(now);
        self.keep_cursor_visible();
        busy
    }

    fn render(&mut self, now: Instant) {
        let previous = self.selector.scope();
        self.selector.render(self.props(), now);
        if self.selector.scope() != previous {
            self.cursor_into_view();
        }
    }

    fn resize(&mut self, terminal_height: u16) {
        let available = terminal_height.saturating_sub(HEADER_ROWS + FOOTER_ROWS);
        let height = self.viewport_override.unwrap_or(available).max(1);
        self.selector.set_viewport_height(height);
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) => {
                if let Some(action) = action_for(&key) {
                    self.handle_action(action, now);
                }
            }
            Event::Resize(_, height) => self.resize(height),
            _ => {}
        }
    }

    fn handle_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::Up => self.move_cursor(-1),
            Action::Down => self.move_cursor(1),
            Action::PageUp => {
                let page = self.selector.scroll_view().viewport_height() as i32;
                self.move_cursor(-page);
            }
            Action::PageDown => {
                let page = self.selector.scroll_view().viewport_height() as i32;
                self.move_cursor(page);
            }
            Action::Toggle => {
                let target = self
                    .cursor_line()
                    .filter(|line| line.expander.is_some())
                    .map(|line| line.target.clone());
                if let Some(RowTarget::Location(location)) = target {
                    self.selector.toggle(&location, now);
                }
            }
            Action::Select => {
                if let Some(target) = self.cursor.clone() {
                    let mut events: Vec<SelectorEvent> = Vec::new();
                    self.selector.press(&target, &mut events);
                    self.apply(events);
                }
            }
            Action::SwitchScope => {
                let next = match self.selector.scope() {
                    LocationScope::Exit => LocationScope::Entry,
                    LocationScope::Entry => LocationScope::Exit,
                };
                let mut events: Vec<SelectorEvent> = Vec::new();
                if self.selector.request_scope(next, &mut events) {
                    self.apply(events);
                }
            }
            Action::CycleBridgeState => {
                let mut settings = self.listener.settings().clone();
                settings.bridge_state = match settings.bridge_state {
                    BridgeState::Auto => BridgeState::On,
                    BridgeState::On => BridgeState::Off,
                    BridgeState::Off => BridgeState::Auto,
                };
                info!("Bridge state set to {:?}", settings.bridge_state);
                self.listener.handle_daemon_event(Some(settings));
            }
            Action::Quit => self.quit = true,
        }
    }

    /// Apply selector requests the way the daemon would: by pushing new
    /// settings, or for scope changes by re-rendering with the new scope.
    fn apply(&mut self, events: Vec<SelectorEvent>) {
        for event in events {
            let mut settings = self.listener.settings().clone();
            match event {
                SelectorEvent::SelectExit(location) => {
                    info!("Exit location set to {}", location);
                    settings.relay_settings.location = Some(location);
                }
                SelectorEvent::SelectBridge(location) => {
                    info!("Bridge location set to {}", location);
                    settings.bridge_settings.location = Constraint::Only(location);
                }
                SelectorEvent::SelectClosestToExit => {
                    info!("Bridge location set to closest to exit");
                    settings.bridge_settings.location = Constraint::Any;
                }
                SelectorEvent::ChangeScope(scope) => {
                    self.scope = scope;
                    self.settings_changed.set(true);
                    continue;
                }
            }
            self.listener.handle_new_settings(settings);
        }
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    fn cursor_index(&self) -> Option<usize> {
        let layout = self.selector.active_layout();
        let target = self.cursor.as_ref()?;
        if let Some(index) = layout.position(target) {
            return Some(index);
        }
        // The row was hidden by a collapse; fall back to its closest
        // visible ancestor.
        let RowTarget::Location(location) = target else {
            return None;
        };
        location
            .ancestors()
            .into_iter()
            .rev()
            .find_map(|ancestor| layout.position(&RowTarget::Location(ancestor)))
    }

    fn cursor_line(&self) -> Option<&LayoutLine> {
        let index = self.cursor_index()?;
        self.selector.active_layout().lines().get(index)
    }

    fn move_cursor(&mut self, delta: i32) {
        let lines = self.selector.active_layout().lines();
        if lines.is_empty() {
            self.cursor = None;
            return;
        }
        let current = self.cursor_index().unwrap_or(0) as i32;
        let index = (current + delta).clamp(0, lines.len() as i32 - 1) as usize;
        self.cursor = Some(lines[index].target.clone());
    }

    /// Put the cursor on the selected line, or the first line.
    fn reset_cursor(&mut self) {
        let lines = self.selector.active_layout().lines();
        self.cursor = lines
            .iter()
            .find(|line| line.selected)
            .or_else(|| lines.first())
            .map(|line| line.target.clone());
    }

    /// Put the cursor on a line inside the current viewport, preferring the
    /// selected line, so a restored scroll offset is not undone.
    fn cursor_into_view(&mut self) {
        let visible = self.selector.visible_lines();
        let row_height = self.selector.config().row_height;
        let top = self.selector.scroll_position().y;
        let bottom = top.saturating_add(self.selector.scroll_view().viewport_height());
        let fully_visible: Vec<&LayoutLine> = visible
            .into_iter()
            .filter(|line| line.top >= top && line.top.saturating_add(row_height) <= bottom)
            .collect();
        let target = fully_visible
            .iter()
            .find(|line| line.selected)
            .or_else(|| fully_visible.first())
            .map(|line| line.target.clone());
        match target {
            Some(target) => self.cursor = Some(target),
            None => self.reset_cursor(),
        }
    }

    fn keep_cursor_visible(&mut self) {
        if let Some(index) = self.cursor_index() {
            let resolved = self.selector.active_layout().lines()[index].target.clone();
            self.cursor = Some(resolved);
        }
        let Some(line) = self.cursor_line() else {
            return;
        };
        let top = line.top;
        let row_height = self.selector.config().row_height;
        let view = self.selector.scroll_view();
        if view.is_scrolling() {
            return;
        }
        let position = view.position();
        let bottom = position.y.saturating_add(view.viewport_height());
        if top < position.y {
            self.selector.scroll_to(position.x, top);
        } else if top.saturating_add(row_height) > bottom {
            let y = top
                .saturating_add(row_height)
                .saturating_sub(view.viewport_height());
            self.selector.scroll_to(position.x, y);
        }
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    fn frame(&self) -> Vec<Line> {
        let settings = self.listener.settings();
        let mut lines = vec![Line::styled(
            "Select location",
            LineStyle {
                bold: true,
                ..Default::default()
            },
        )];

        lines.push(if settings.allows_bridge_selection() {
            let (entry, exit) = match self.selector.scope() {
                LocationScope::Entry => ("[Entry]", " Exit "),
                LocationScope::Exit => (" Entry ", "[Exit]"),
            };
            Line::new(format!("{} {}   (Tab to switch)", entry, exit))
        } else {
            Line::new("")
        });

        let cursor = self.cursor_index();
        let scroll_top = self.selector.scroll_position().y;
        let layout_lines = self.selector.active_layout().lines();
        let mut rows: Vec<Line> = (0..self.selector.scroll_view().viewport_height())
            .map(|_| Line::new(""))
            .collect();
        for line in self.selector.visible_lines() {
            let Some(row) = line.top.checked_sub(scroll_top) else {
                continue;
            };
            let Some(slot) = rows.get_mut(row as usize) else {
                continue;
            };
            let is_cursor = cursor
                .and_then(|index| layout_lines.get(index))
                .is_some_and(|current| current.target == line.target);
            *slot = Line::styled(
                format_line(line),
                LineStyle {
                    bold: line.selected,
                    dim: !line.active,
                    reverse: is_cursor,
                },
            );
        }
        lines.extend(rows);

        lines.push(Line::styled(
            status_text(settings),
            LineStyle {
                dim: true,
                ..Default::default()
            },
        ));
        lines
    }
}

/// Render one tree line as text.
pub fn format_line(line: &LayoutLine) -> String {
    let indent = "  ".repeat(line.depth as usize);
    let expander = match line.expander {
        Some(true) => "▾ ",
        Some(false) => "▸ ",
        None => "  ",
    };
    let marker = if line.selected { " ✓" } else { "" };
    format!("{}{}{}{}", indent, expander, line.label, marker)
}

fn status_text(settings: &Settings) -> String {
    let exit = settings
        .relay_settings
        .location
        .as_ref()
        .map_or_else(|| "any".to_string(), RelayLocation::to_string);
    let entry = match &settings.bridge_settings.location {
        Constraint::Any => "closest to exit".to_string(),
        Constraint::Only(location) => location.to_string(),
    };
    format!(
        "exit: {}  entry: {}  bridges: {:?}  [b] bridges [enter] select [q] quit",
        exit, entry, settings.bridge_state
    )
}
