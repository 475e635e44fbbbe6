use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

pub const DEFAULT_DATASET: &str = "ALL_BYCLIENT_DATA_20202024.csv";
pub const NULL_VALUE: &str = "∅";
pub const PROFILE_PLACEHOLDER: &str = "SELECT A ROW TO VIEW LOBBYIST PROFILE";

pub const HELP_TEXT: &str = "\
Navigation
  j / Down        next row
  k / Up          previous row
  n / PageDown    next page
  p / PageUp      previous page
  g / G           first / last row

Filters
  /               search lobbyist (Enter keep, Esc clear)
  c               pick clients (Enter toggle, Esc close)
  x               clear all filters

Profile
  Enter           show profile of the row under the cursor
  Esc             clear the selected row

Other
  y               copy row as csv
  Y               copy profile
  ?               this help
  q               quit";

// Everything that can go wrong while starting up.
#[derive(Debug)]
pub enum LVError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    MissingColumn(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for LVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LVError::IoError(e) => write!(f, "io error: {e}"),
            LVError::PolarsError(e) => write!(f, "could not read dataset: {e}"),
            LVError::LoadingFailed(reason) => write!(f, "loading failed: {reason}"),
            LVError::MissingColumn(name) => write!(f, "dataset has no column \"{name}\""),
            LVError::FileNotFound => write!(f, "dataset file not found"),
            LVError::PermissionDenied => write!(f, "permission denied reading dataset"),
            LVError::UnknownFileType => write!(f, "unknown dataset file type"),
        }
    }
}

impl std::error::Error for LVError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LVError::IoError(e) => Some(e),
            LVError::PolarsError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for LVError {
    fn from(err: Error) -> Self {
        LVError::IoError(err)
    }
}

impl From<PolarsError> for LVError {
    fn from(err: PolarsError) -> Self {
        LVError::PolarsError(err)
    }
}

#[derive(Debug, Clone, Setters)]
pub struct LVConfig {
    /// Milliseconds to wait for a terminal event before redrawing.
    pub event_poll_time: u64,
    pub page_size: usize,
    pub max_column_width: usize,
}

impl Default for LVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            page_size: 20,
            max_column_width: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    NextPage,
    PreviousPage,
    MoveBeginning,
    MoveEnd,
    Activate,
    Exit,
    EditSearch,
    PickClients,
    ClearFilters,
    CopyRow,
    CopyProfile,
    Help,
    RawKey(KeyEvent),
}
