use derive_setters::Setters;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

use crate::table::{Record, Table};

/// Current filter inputs. `None` means the predicate is not applied at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Setters)]
#[setters(strip_option)]
pub struct FilterQuery {
    pub lobbyist: Option<String>,
    pub clients: Option<BTreeSet<String>>,
}

impl FilterQuery {
    /// Build a query from raw widget values. An empty search text and an
    /// empty client selection both count as "no constraint".
    pub fn new(search: &str, clients: &[String]) -> Self {
        Self {
            lobbyist: (!search.is_empty()).then(|| search.to_string()),
            clients: (!clients.is_empty()).then(|| clients.iter().cloned().collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lobbyist.as_deref().is_none_or(str::is_empty)
            && self.clients.as_ref().is_none_or(BTreeSet::is_empty)
    }
}

/// Uppercase the first cased letter of every word and lowercase the rest.
/// Any uncased character (space, apostrophe, digit, CJK) ends a word, so
/// "o'brien" becomes "O'Brien" and "中a" becomes "中A".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if !cased {
            out.push(c);
        } else if in_word {
            out.extend(c.to_lowercase());
        } else {
            // Only the first char of a multi char uppercase is kept upper: "ß" -> "Ss"
            let mut upper = c.to_uppercase();
            out.extend(upper.next());
            out.extend(upper.flat_map(char::to_lowercase));
        }
        in_word = cased;
    }
    out
}

/// Ordered subset of a table. Rebuilt on every filter change, never edited.
#[derive(Debug, Clone)]
pub struct FilteredView {
    table: Arc<Table>,
    rows: Arc<Vec<usize>>, // Mapping of view row index to table index
}

impl FilteredView {
    pub fn all(table: &Arc<Table>) -> Self {
        Self {
            table: Arc::clone(table),
            rows: Arc::new((0..table.len()).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn table_index(&self, idx: usize) -> Option<usize> {
        self.rows.get(idx).copied()
    }

    pub fn record(&self, idx: usize) -> Option<&Record> {
        self.table_index(idx).and_then(|r| self.table.record(r))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().filter_map(|&r| self.table.record(r))
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        self.rows.len().div_ceil(page_size.max(1))
    }

    /// Records shown on the given zero based page.
    pub fn page(&self, page: usize, page_size: usize) -> impl Iterator<Item = &Record> {
        self.iter().skip(page * page_size).take(page_size)
    }
}

fn matches(record: &Record, needle: Option<&str>, clients: Option<&BTreeSet<String>>) -> bool {
    needle.is_none_or(|n| record.lobbyist.contains(n))
        && clients.is_none_or(|c| c.contains(&record.client))
}

/// Rows of `table` whose lobbyist contains the title cased search text and
/// whose client is one of the selected clients, in table order.
pub fn filter(table: &Arc<Table>, query: &FilterQuery) -> FilteredView {
    if query.is_empty() {
        return FilteredView::all(table);
    }

    let start_time = Instant::now();
    let needle = query
        .lobbyist
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(title_case);
    let clients = query.clients.as_ref().filter(|c| !c.is_empty());

    let rows: Vec<usize> = table
        .records()
        .par_iter()
        .enumerate()
        .filter(|(_, r)| matches(r, needle.as_deref(), clients))
        .map(|(idx, _)| idx)
        .collect();

    trace!(
        "Filter {:?} / {:?} matched {} of {} rows in {}ms",
        needle,
        clients,
        rows.len(),
        table.len(),
        start_time.elapsed().as_millis()
    );

    FilteredView {
        table: Arc::clone(table),
        rows: Arc::new(rows),
    }
}
