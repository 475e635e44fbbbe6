use arboard::Clipboard;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::domain::{HELP_TEXT, LVConfig, LVError, Message};
use crate::filter::{FilterQuery, FilteredView, filter};
use crate::inputter::{InputResult, Inputter};
use crate::profile::{Profile, SelectionError, resolve_profile};
use crate::table::{Record, Table};

pub const TABLE_COLUMNS: [&str; 5] = ["client", "lobbyist", "start", "stop", "amount"];

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    SEARCH,
    CLIENTS,
    POPUP,
}

#[derive(Default)]
struct ClientPicker {
    input: Inputter,
    query: InputResult,
    matches: Vec<usize>, // Idx into Table::clients() matching the query
    curser_row: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickerData {
    pub query: InputResult,
    pub options: Vec<(String, bool)>,
    pub curser_row: usize,
}

/// Snapshot of everything the ui renders.
pub struct UIData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>, // Rows of the current page
    pub nrows: usize,           // Rows in the filtered view
    pub total_rows: usize,
    pub page: usize,
    pub npages: usize,
    pub selected_row: usize, // Curser position inside the page
    pub abs_selected_row: usize,
    pub active_row: Option<usize>, // Selected row, if it is on the current page
    pub selection: Option<usize>,
    pub search: InputResult,
    pub active_search: bool,
    pub clients: Vec<String>,
    pub picker: Option<PickerData>,
    pub profile: Result<Profile, SelectionError>,
    pub show_popup: bool,
    pub popup_message: String,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            nrows: 0,
            total_rows: 0,
            page: 0,
            npages: 0,
            selected_row: 0,
            abs_selected_row: 0,
            active_row: None,
            selection: None,
            search: InputResult::default(),
            active_search: false,
            clients: Vec::new(),
            picker: None,
            profile: Ok(Profile::NotSelected),
            show_popup: false,
            popup_message: String::new(),
            status_message: String::new(),
        }
    }
}

pub struct Model {
    config: LVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    table: Arc<Table>,
    view: FilteredView,
    search: Inputter,
    search_input: InputResult,
    selected_clients: Vec<String>,
    picker: ClientPicker,
    curser: usize, // Curser position in the view, the page follows from it
    selection: Option<usize>,
    profile: Result<Profile, SelectionError>,
    clipboard: Option<Clipboard>,
    uidata: UIData,
    status_message: String,
}

impl Model {
    pub fn new(table: Arc<Table>, config: &LVConfig) -> Self {
        let view = FilteredView::all(&table);
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            table,
            view,
            search: Inputter::default(),
            search_input: InputResult::default(),
            selected_clients: Vec::new(),
            picker: ClientPicker::default(),
            curser: 0,
            selection: None,
            profile: Ok(Profile::NotSelected),
            clipboard: None,
            uidata: UIData::empty(),
            status_message: String::new(),
        };
        model.update_picker_matches();
        model.set_status_message(format!(
            "Loaded {} records, {} clients, {} lobbyists. Press ? for help.",
            model.table.len(),
            model.table.clients().len(),
            model.table.lobbyists().len()
        ));
        model.update_uidata();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    /// Text inputs want every key, not the mapped messages.
    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::SEARCH | Modus::CLIENTS)
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), LVError> {
        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveDown => self.move_selection_down(1),
                    Message::MoveUp => self.move_selection_up(1),
                    Message::NextPage => self.next_page(),
                    Message::PreviousPage => self.previous_page(),
                    Message::MoveBeginning => self.curser = 0,
                    Message::MoveEnd => self.curser = self.view.len().saturating_sub(1),
                    Message::Activate => self.activate(),
                    Message::Exit => self.clear_selection(),
                    Message::EditSearch => self.enter_search(),
                    Message::PickClients => self.enter_client_picker(),
                    Message::ClearFilters => self.clear_filters(),
                    Message::CopyRow => self.copy_row(),
                    Message::CopyProfile => self.copy_profile(),
                    Message::Help => self.show_help(),
                    Message::RawKey(_) => (),
                },
                Modus::SEARCH => {
                    if let Message::RawKey(key) = msg {
                        self.search_key(key)
                    }
                }
                Modus::CLIENTS => {
                    if let Message::RawKey(key) = msg {
                        self.client_picker_key(key)
                    }
                }
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help | Message::Activate => self.close_popup(),
                    _ => (),
                },
            }
            self.update_uidata();
        }

        Ok(())
    }

    // -------------------- Filtering and selection ---------------------- //

    fn query(&self) -> FilterQuery {
        FilterQuery::new(&self.search_input.input, &self.selected_clients)
    }

    // Every filter edit lands here. The view is rebuilt from the table and
    // the stored selection is resolved again against it, by position.
    fn recompute(&mut self) {
        let query = self.query();
        self.view = filter(&self.table, &query);
        self.curser = 0;
        info!(
            "Filter {:?} matched {} of {} rows",
            query,
            self.view.len(),
            self.table.len()
        );
        self.refresh_profile();
        if self.view.is_empty() {
            self.set_status_message("No matching records.");
        } else {
            self.set_status_message(format!(
                "{} of {} records match.",
                self.view.len(),
                self.table.len()
            ));
        }
    }

    fn refresh_profile(&mut self) {
        self.profile = resolve_profile(&self.table, &self.view, self.selection);
        if let Err(e) = &self.profile {
            warn!("Resolving selection {:?} failed: {e}", self.selection);
        }
    }

    fn activate(&mut self) {
        if self.view.is_empty() {
            self.set_status_message("No row to select.");
            return;
        }
        self.selection = Some(self.curser);
        debug!("Selected view row {}", self.curser);
        self.refresh_profile();
        self.set_status_message(format!("Selected row {}.", self.curser + 1));
    }

    fn clear_selection(&mut self) {
        self.selection = None;
        self.refresh_profile();
    }

    fn clear_filters(&mut self) {
        self.search.clear();
        self.search_input = InputResult::default();
        self.selected_clients.clear();
        self.recompute();
    }

    // -------------------- Search input ---------------------- //

    fn enter_search(&mut self) {
        trace!("Entering search mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::SEARCH;
        self.search.set(&self.search_input.input);
        self.search_input = self.search.get();
    }

    fn search_key(&mut self, key: KeyEvent) {
        let previous = std::mem::take(&mut self.search_input.input);
        self.search_input = self.search.read(key);
        if self.search_input.input != previous {
            self.recompute();
        }
        if self.search_input.finished {
            self.modus = self.previous_modus;
            self.previous_modus = Modus::SEARCH;
        }
    }

    // -------------------- Client picker ---------------------- //

    fn enter_client_picker(&mut self) {
        trace!("Entering client picker ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CLIENTS;
        self.picker.input.clear();
        self.picker.query = self.picker.input.get();
        self.picker.curser_row = 0;
        self.update_picker_matches();
    }

    fn client_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.modus = self.previous_modus;
                self.previous_modus = Modus::CLIENTS;
            }
            KeyCode::Up => {
                self.picker.curser_row = self.picker.curser_row.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.picker.curser_row + 1 < self.picker.matches.len() {
                    self.picker.curser_row += 1;
                }
            }
            KeyCode::Enter => self.toggle_client(),
            _ => {
                self.picker.query = self.picker.input.read(key);
                self.picker.curser_row = 0;
                self.update_picker_matches();
            }
        }
    }

    fn update_picker_matches(&mut self) {
        let term = self.picker.query.input.to_lowercase();
        self.picker.matches = self
            .table
            .clients()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.to_lowercase().contains(&term))
            .map(|(idx, _)| idx)
            .collect();
        self.picker.curser_row = std::cmp::min(
            self.picker.curser_row,
            self.picker.matches.len().saturating_sub(1),
        );
    }

    fn toggle_client(&mut self) {
        let Some(client) = self
            .picker
            .matches
            .get(self.picker.curser_row)
            .and_then(|&idx| self.table.clients().get(idx))
            .cloned()
        else {
            return;
        };
        match self.selected_clients.iter().position(|c| *c == client) {
            Some(pos) => {
                self.selected_clients.remove(pos);
            }
            None => self.selected_clients.push(client),
        }
        self.recompute();
    }

    // -------------------- Curser movement ---------------------- //

    fn page(&self) -> usize {
        self.curser / self.config.page_size.max(1)
    }

    fn move_selection_down(&mut self, size: usize) {
        if !self.view.is_empty() {
            self.curser = std::cmp::min(self.curser + size, self.view.len() - 1);
        }
    }

    fn move_selection_up(&mut self, size: usize) {
        self.curser = self.curser.saturating_sub(size);
    }

    fn next_page(&mut self) {
        let page = self.page();
        if page + 1 < self.view.page_count(self.config.page_size) {
            self.curser = (page + 1) * self.config.page_size;
        }
    }

    fn previous_page(&mut self) {
        let page = self.page();
        self.curser = page.saturating_sub(1) * self.config.page_size;
    }

    // -------------------- Popup and clipboard ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn copy_row(&mut self) {
        match self.view.record(self.curser) {
            Some(record) => {
                let line = record_as_csv(record);
                self.copy_to_clipboard(line, "row");
            }
            None => self.set_status_message("No row to copy."),
        }
    }

    fn copy_profile(&mut self) {
        match &self.profile {
            Ok(Profile::Detail(detail)) => {
                let text = detail.as_text();
                self.copy_to_clipboard(text, "profile");
            }
            _ => self.set_status_message("No profile to copy."),
        }
    }

    fn copy_to_clipboard(&mut self, content: String, what: &str) {
        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new()
                .map_err(|e| warn!("Clipboard unavailable: {e:?}"))
                .ok();
        }
        match self.clipboard.as_mut().map(|c| c.set_text(content)) {
            Some(Ok(_)) => {
                trace!("Copied {what} to clipboard.");
                self.set_status_message(format!("Copied {what} to clipboard."));
            }
            Some(Err(e)) => {
                warn!("Error copying to clipboard: {e:?}");
                self.set_status_message(format!("Could not copy {what}."));
            }
            None => self.set_status_message("Clipboard unavailable."),
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // -------------------- UI data ---------------------- //

    fn update_uidata(&mut self) {
        let page_size = self.config.page_size.max(1);
        let page = self.page();
        let max_width = self.config.max_column_width;
        let rows: Vec<Vec<String>> = self
            .view
            .page(page, page_size)
            .map(|r| {
                let amount = r.amount_label();
                [
                    r.client.as_str(),
                    r.lobbyist.as_str(),
                    r.start.as_str(),
                    r.stop.as_str(),
                    amount.as_str(),
                ]
                .iter()
                .map(|v| visible_value(v, max_width))
                .collect::<Vec<String>>()
            })
            .collect();

        let picker = (self.modus == Modus::CLIENTS).then(|| PickerData {
            query: self.picker.query.clone(),
            options: self
                .picker
                .matches
                .iter()
                .filter_map(|&idx| self.table.clients().get(idx))
                .map(|c| (c.clone(), self.selected_clients.contains(c)))
                .collect(),
            curser_row: self.picker.curser_row,
        });

        let page_start = page * page_size;
        self.uidata = UIData {
            name: self.table.name().to_string(),
            headers: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
            nrows: self.view.len(),
            total_rows: self.table.len(),
            page,
            npages: self.view.page_count(page_size),
            selected_row: self.curser - page_start,
            abs_selected_row: self.curser,
            active_row: self
                .selection
                .filter(|s| (page_start..page_start + page_size).contains(s))
                .map(|s| s - page_start),
            selection: self.selection,
            search: self.search_input.clone(),
            active_search: self.modus == Modus::SEARCH,
            clients: self.selected_clients.clone(),
            picker,
            profile: self.profile.clone(),
            show_popup: self.modus == Modus::POPUP,
            popup_message: if self.modus == Modus::POPUP {
                HELP_TEXT.to_string()
            } else {
                String::new()
            },
            status_message: self.status_message.clone(),
        };
    }
}

fn visible_value(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width < 3 {
        return String::new();
    }
    let mut reduced: String = value.chars().take(width - 3).collect();
    reduced.push_str("...");
    reduced
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',' || c == '"');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

fn record_as_csv(r: &Record) -> String {
    let amount = r.amount_label();
    [
        r.client.as_str(),
        r.lobbyist.as_str(),
        r.start.as_str(),
        r.stop.as_str(),
        amount.as_str(),
        r.phone_number.as_str(),
        r.lobby_street_address.as_str(),
        r.city.as_str(),
        r.state.as_str(),
        r.zip.as_str(),
        r.filer_id.as_str(),
    ]
    .iter()
    .map(|v| wrap_cell_content(v))
    .collect::<Vec<String>>()
    .join(",")
}
