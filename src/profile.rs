use std::fmt;

use crate::filter::FilteredView;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// The stored row position is not part of the current view.
    IndexOutOfRange { index: usize, len: usize },
    /// No record in the table carries the lobbyist name.
    NotFound(String),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::IndexOutOfRange { index, len } => write!(
                f,
                "selected row {} is outside the current view of {} rows",
                index + 1,
                len
            ),
            SelectionError::NotFound(name) => write!(f, "no records for lobbyist \"{name}\""),
        }
    }
}

impl std::error::Error for SelectionError {}

#[derive(Debug, Clone, PartialEq)]
pub struct Engagement {
    pub client: String,
    pub start: String,
    pub stop: String,
}

impl Engagement {
    pub fn duration(&self) -> String {
        format!("{}—{}", self.start, self.stop)
    }
}

/// Everything known about one lobbyist, gathered from the whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDetail {
    pub name: String,
    pub phone_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub filer_id: String,
    pub engagements: Vec<Engagement>,
}

impl ProfileDetail {
    /// Contact fields come from the first matching record in table order,
    /// engagements list every matching record.
    pub fn for_lobbyist(table: &Table, name: &str) -> Result<Self, SelectionError> {
        let mut records = table.records_for(name).peekable();
        let first = records
            .peek()
            .copied()
            .ok_or_else(|| SelectionError::NotFound(name.to_string()))?;

        let mut profile = ProfileDetail {
            name: first.lobbyist.clone(),
            phone_number: first.phone_number.clone(),
            street: first.lobby_street_address.clone(),
            city: first.city.clone(),
            state: first.state.clone(),
            zip: first.zip.clone(),
            filer_id: first.filer_id.clone(),
            engagements: Vec::new(),
        };
        profile.engagements = records
            .map(|r| Engagement {
                client: r.client.clone(),
                start: r.start.clone(),
                stop: r.stop.clone(),
            })
            .collect();
        Ok(profile)
    }

    pub fn address(&self) -> String {
        format!("{} {}, {} {}", self.street, self.city, self.state, self.zip)
    }

    pub fn as_text(&self) -> String {
        let mut lines = vec![
            self.name.clone(),
            format!("Phone #: {}", self.phone_number),
            format!("Address: {}", self.address()),
            format!("Filer ID: {}", self.filer_id),
            String::new(),
        ];
        for e in &self.engagements {
            lines.push(format!("Client: {}", e.client));
            lines.push(format!("Duration: {}", e.duration()));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    NotSelected,
    Detail(ProfileDetail),
}

/// Resolve the profile for a row position in `view`.
///
/// The selection is positional: it is checked against the view it is
/// resolved with, whichever record that position holds now. The profile
/// itself is looked up in the full `table`, so relationships hidden by the
/// active filters are still listed.
pub fn resolve_profile(
    table: &Table,
    view: &FilteredView,
    selection: Option<usize>,
) -> Result<Profile, SelectionError> {
    let Some(index) = selection else {
        return Ok(Profile::NotSelected);
    };
    let record = view
        .record(index)
        .ok_or(SelectionError::IndexOutOfRange {
            index,
            len: view.len(),
        })?;
    ProfileDetail::for_lobbyist(table, &record.lobbyist).map(Profile::Detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterQuery, filter};
    use crate::table::Record;
    use crate::table::tests::{record, records_strategy};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn scenario() -> Arc<Table> {
        Arc::new(Table::from_records(
            "scenario",
            vec![
                Record {
                    phone_number: "555-0100".into(),
                    lobby_street_address: "1 Beacon St".into(),
                    city: "Boston".into(),
                    state: "MA".into(),
                    zip: "02108".into(),
                    filer_id: "42".into(),
                    ..record("John Smith", "Acme")
                },
                record("Jane Doe", "Acme"),
                Record {
                    start: "2021-01-01".into(),
                    stop: "2021-06-30".into(),
                    phone_number: "555-9999".into(),
                    ..record("John Smith", "Globex")
                },
            ],
        ))
    }

    fn detail(profile: Profile) -> ProfileDetail {
        match profile {
            Profile::Detail(d) => d,
            Profile::NotSelected => panic!("expected a profile"),
        }
    }

    #[test]
    fn nothing_selected() {
        let table = scenario();
        let view = filter(&table, &FilterQuery::default());
        assert_eq!(resolve_profile(&table, &view, None), Ok(Profile::NotSelected));
    }

    #[test]
    fn profile_lists_all_clients_of_lobbyist() {
        let table = scenario();
        let view = filter(&table, &FilterQuery::new("smith", &[]));
        assert_eq!(view.len(), 2);

        let profile = detail(resolve_profile(&table, &view, Some(0)).unwrap());
        assert_eq!(profile.name, "John Smith");
        let clients: Vec<&str> = profile.engagements.iter().map(|e| e.client.as_str()).collect();
        assert_eq!(clients, ["Acme", "Globex"]);
    }

    #[test]
    fn profile_ignores_active_filter() {
        let table = scenario();
        let view = filter(&table, &FilterQuery::new("", &["Globex".to_string()]));
        assert_eq!(view.len(), 1);

        let profile = detail(resolve_profile(&table, &view, Some(0)).unwrap());
        assert_eq!(profile.engagements.len(), 2);
        assert_eq!(profile.engagements[0].client, "Acme");
    }

    #[test]
    fn header_from_first_record() {
        let table = scenario();
        let view = filter(&table, &FilterQuery::new("", &["Globex".to_string()]));
        let profile = detail(resolve_profile(&table, &view, Some(0)).unwrap());

        assert_eq!(profile.phone_number, "555-0100");
        assert_eq!(profile.address(), "1 Beacon St Boston, MA 02108");
        assert_eq!(profile.filer_id, "42");
        assert_eq!(profile.engagements[1].duration(), "2021-01-01—2021-06-30");
    }

    #[test]
    fn selection_out_of_range() {
        let table = scenario();
        let view = filter(&table, &FilterQuery::default());
        assert!(resolve_profile(&table, &view, Some(2)).is_ok());
        assert_eq!(
            resolve_profile(&table, &view, Some(3)),
            Err(SelectionError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn selection_in_empty_view() {
        let table = scenario();
        let view = filter(&table, &FilterQuery::new("nobody", &[]));
        assert_eq!(
            resolve_profile(&table, &view, Some(0)),
            Err(SelectionError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn selection_is_positional() {
        let table = scenario();
        let all = filter(&table, &FilterQuery::default());
        let before = detail(resolve_profile(&table, &all, Some(1)).unwrap());
        assert_eq!(before.name, "Jane Doe");

        // Same position, new view: row 1 is now John Smith's Globex record.
        let smiths = filter(&table, &FilterQuery::new("smith", &[]));
        let after = detail(resolve_profile(&table, &smiths, Some(1)).unwrap());
        assert_eq!(after.name, "John Smith");

        // And a view with a single row has no position 1 at all.
        let globex = filter(&table, &FilterQuery::new("", &["Globex".to_string()]));
        assert_eq!(
            resolve_profile(&table, &globex, Some(1)),
            Err(SelectionError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn unknown_lobbyist() {
        let table = scenario();
        assert_eq!(
            ProfileDetail::for_lobbyist(&table, "Nobody"),
            Err(SelectionError::NotFound("Nobody".to_string()))
        );
    }

    #[test]
    fn lobbyist_missing_from_table() {
        // A view over one table resolved against another one.
        let table = scenario();
        let other = Arc::new(Table::from_records("other", vec![record("Ann Lee", "Acme")]));
        let view = filter(&other, &FilterQuery::default());
        assert_eq!(
            resolve_profile(&table, &view, Some(0)),
            Err(SelectionError::NotFound("Ann Lee".to_string()))
        );
    }

    #[test]
    fn text_export() {
        let table = scenario();
        let profile = ProfileDetail::for_lobbyist(&table, "John Smith").unwrap();
        let text = profile.as_text();
        assert!(text.starts_with("John Smith\nPhone #: 555-0100\n"));
        assert!(text.contains("Client: Globex\nDuration: 2021-01-01—2021-06-30"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn every_position_in_view_resolves(
            records in records_strategy(),
            q in "(smith|doe|jo|[a-z]{0,2})",
        ) {
            let table = Arc::new(Table::from_records("random", records));
            let view = filter(&table, &FilterQuery::new(&q, &[]));
            for i in 0..view.len() {
                let expected = view.record(i).map(|r| r.lobbyist.clone());
                match resolve_profile(&table, &view, Some(i)) {
                    Ok(Profile::Detail(d)) => {
                        prop_assert_eq!(Some(d.name.clone()), expected);
                        prop_assert_eq!(d.engagements.len(), table.records_for(&d.name).count());
                    }
                    other => prop_assert!(false, "row {} resolved to {:?}", i, other),
                }
            }
            prop_assert_eq!(
                resolve_profile(&table, &view, Some(view.len())),
                Err(SelectionError::IndexOutOfRange { index: view.len(), len: view.len() })
            );
        }
    }
}
