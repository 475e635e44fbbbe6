use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::{LVError, NULL_VALUE};

pub const REQUIRED_COLUMNS: [&str; 11] = [
    "client",
    "lobbyist",
    "start",
    "stop",
    "amount",
    "phone_number",
    "lobby_street_address",
    "city",
    "state",
    "zip",
    "filer_id",
];

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

/// One lobbying relationship between a lobbyist and a client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub client: String,
    pub lobbyist: String,
    pub start: String,
    pub stop: String,
    pub amount: Option<f64>,
    pub phone_number: String,
    pub lobby_street_address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub filer_id: String,
}

impl Record {
    pub fn amount_label(&self) -> String {
        match self.amount {
            Some(a) => format!("{a:.2}"),
            None => NULL_VALUE.to_string(),
        }
    }
}

/// The dataset, loaded once and never modified afterwards.
///
/// Row order is the order of the source file and no rows are merged, so the
/// same lobbyist shows up once per client relationship.
#[derive(Debug, Default)]
pub struct Table {
    name: String,
    records: Vec<Record>,
    clients: Vec<String>,
    lobbyists: Vec<String>,
}

impl Table {
    pub fn from_records(name: impl Into<String>, records: Vec<Record>) -> Self {
        let clients = Self::distinct(records.iter().map(|r| r.client.as_str()));
        let lobbyists = Self::distinct(records.iter().map(|r| r.lobbyist.as_str()));
        Self {
            name: name.into(),
            records,
            clients,
            lobbyists,
        }
    }

    pub fn load(path: PathBuf) -> Result<Self, LVError> {
        let file_type = Self::check_file(&path)?;
        let frame = match file_type {
            FileType::CSV => Self::load_csv(&path)?,
            FileType::PARQUET => Self::load_parquet(&path)?,
            FileType::ARROW => Self::load_arrow(&path)?,
        };

        let start_time = Instant::now();
        let df = frame.collect()?;

        let names: HashSet<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !names.contains(*c)) {
            return Err(LVError::MissingColumn(missing.to_string()));
        }

        // Each column is converted in its own thread, the result keeps the
        // order of REQUIRED_COLUMNS.
        let columns: Result<Vec<Vec<String>>, PolarsError> = REQUIRED_COLUMNS
            .par_iter()
            .map(|name| Self::load_column(&df, name))
            .collect();
        let records = Self::assemble(columns?, df.height());

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        info!(
            "Loaded {} records from {} in {}ms",
            records.len(),
            name,
            start_time.elapsed().as_millis()
        );
        Ok(Self::from_records(name, records))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, idx: usize) -> Option<&Record> {
        self.records.get(idx)
    }

    /// Distinct client names in the order they first appear.
    pub fn clients(&self) -> &[String] {
        &self.clients
    }

    /// Distinct lobbyist names in the order they first appear.
    pub fn lobbyists(&self) -> &[String] {
        &self.lobbyists
    }

    /// All records of the lobbyist with exactly this name, in table order.
    pub fn records_for<'a>(&'a self, lobbyist: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.lobbyist == lobbyist)
    }

    fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        values
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }

    fn assemble(columns: Vec<Vec<String>>, nrows: usize) -> Vec<Record> {
        let mut columns: Vec<_> = columns.into_iter().map(Vec::into_iter).collect();
        let mut next = |c: usize| columns[c].next().unwrap_or_default();

        let mut records = Vec::with_capacity(nrows);
        for _ in 0..nrows {
            records.push(Record {
                client: next(0),
                lobbyist: next(1),
                start: next(2),
                stop: next(3),
                amount: parse_amount(&next(4)),
                phone_number: next(5),
                lobby_street_address: next(6),
                city: next(7),
                state: next(8),
                zip: next(9),
                filer_id: next(10),
            });
        }
        records
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<String>, PolarsError> {
        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let data: Vec<String> = series
            .into_iter()
            .map(|value| match value {
                Some(s) => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
                None => NULL_VALUE.to_string(),
            })
            .collect();
        debug!("Column \"{}\": {} rows", col_name, data.len());
        Ok(data)
    }

    fn check_file(path: &Path) -> Result<FileType, LVError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LVError::FileNotFound,
            ErrorKind::PermissionDenied => LVError::PermissionDenied,
            _ => LVError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(LVError::LoadingFailed("Not a file!".into()));
        }
        Self::detect_file_type(path)
    }

    fn detect_file_type(path: &Path) -> Result<FileType, LVError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(LVError::UnknownFileType),
        }
    }

    // Schema inference is disabled so zip codes and filer ids stay text.
    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_start_matches('$')
        .replace(',', "")
        .parse()
        .ok()
}
