use std::io;

use location_selector::SelectorError;
use relay_list::RelayListError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Relay list error: {0}")]
    RelayList(#[from] RelayListError),

    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Relay list {0} has no exit locations")]
    NoLocations(String),
}
