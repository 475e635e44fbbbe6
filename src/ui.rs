use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{
        Block, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
    },
};

use crate::domain::{LVConfig, PROFILE_PLACEHOLDER};
use crate::inputter::InputResult;
use crate::model::{Model, PickerData, UIData};
use crate::profile::Profile;

pub const INPUT_HEIGHT: u16 = 3;
pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const STATUSLINE_HEIGHT: u16 = 1;
pub const PROFILE_MIN_HEIGHT: u16 = 8;

pub struct LobbyUI {
    table_height: u16,
}

impl LobbyUI {
    pub fn new(cfg: &LVConfig) -> Self {
        // Borders plus header plus one page
        let table_height = cfg.page_size as u16 + TABLE_HEADER_HEIGHT + 2;
        Self { table_height }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [inputs, table, profile, status] = Layout::vertical([
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Max(self.table_height),
            Constraint::Min(PROFILE_MIN_HEIGHT),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(frame.area());
        let [search, clients] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(inputs);

        self.render_search(uidata, frame, search);
        self.render_clients(uidata, frame, clients);
        self.render_table(uidata, frame, table);
        self.render_profile(uidata, frame, profile);
        self.render_statusline(uidata, frame, status);

        if let Some(picker) = &uidata.picker {
            self.render_picker(picker, frame);
        }
        if uidata.show_popup {
            self.render_popup(&uidata.popup_message, frame);
        }
    }

    fn render_search(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut block = Block::bordered().title(" Search lobbyist (/) ");
        if uidata.active_search {
            block = block.border_style(Style::new().fg(Color::Yellow));
        }
        let text = if uidata.search.input.is_empty() && !uidata.active_search {
            Line::from("Search lobbyist...".dark_gray())
        } else {
            Line::from(uidata.search.input.as_str())
        };
        frame.render_widget(Paragraph::new(text).block(block), area);

        if uidata.active_search {
            frame.set_cursor_position((cursor_x(area, &uidata.search), area.y + 1));
        }
    }

    fn render_clients(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(" Select clients (c) ");
        let text = if uidata.clients.is_empty() {
            Line::from("Filter by clients...".dark_gray())
        } else {
            Line::from(uidata.clients.join(", "))
        };
        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn render_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let header = Row::new(uidata.headers.iter().map(|h| Cell::from(h.as_str())))
            .style(Style::new().bold().underlined())
            .height(TABLE_HEADER_HEIGHT);

        let rows = uidata.rows.iter().enumerate().map(|(idx, row)| {
            let r = Row::new(row.iter().map(|v| Cell::from(v.as_str())));
            if uidata.active_row == Some(idx) {
                r.style(Style::new().fg(Color::Yellow))
            } else {
                r
            }
        });

        let widths = [
            Constraint::Fill(3),
            Constraint::Fill(2),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(14),
        ];

        let title = Line::from(format!(" {} ", uidata.name).bold());
        let page = if uidata.npages == 0 {
            " No matching records ".to_string()
        } else {
            format!(
                " Page {}/{} · row {} of {} ({} total) ",
                uidata.page + 1,
                uidata.npages,
                uidata.abs_selected_row + 1,
                uidata.nrows,
                uidata.total_rows
            )
        };
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(Line::from(page).centered())
            .border_set(border::THICK);

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = TableState::default();
        if uidata.nrows > 0 {
            state.select(Some(uidata.selected_row));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_profile(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(" Lobbyist profile ");
        let text = match &uidata.profile {
            Ok(Profile::NotSelected) => Text::from(PROFILE_PLACEHOLDER.dark_gray()).centered(),
            Ok(Profile::Detail(detail)) => {
                let mut lines = vec![
                    Line::from(detail.name.as_str().bold()),
                    Line::from(vec!["Phone #: ".bold(), detail.phone_number.as_str().into()]),
                    Line::from(vec!["Address: ".bold(), detail.address().into()]),
                    Line::from(vec!["Filer ID: ".bold(), detail.filer_id.as_str().into()]),
                    Line::default(),
                ];
                lines.extend(detail.engagements.iter().map(|e| {
                    Line::from(vec![
                        "Client: ".bold(),
                        Span::from(e.client.as_str()),
                        "  Duration: ".bold(),
                        Span::from(e.duration()),
                    ])
                }));
                Text::from(lines)
            }
            Err(e) => Text::from(format!("Selection error: {e}").red()),
        };
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let selection = match uidata.selection {
            Some(row) => format!("selected row {} ", row + 1),
            None => String::new(),
        };
        let line = Line::from(vec![
            Span::from(uidata.status_message.as_str()),
            Span::from("  "),
            selection.yellow(),
            " ? help  q quit ".blue().bold(),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_picker(&self, picker: &PickerData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 60, 70);
        let [query, list] =
            Layout::vertical([Constraint::Length(INPUT_HEIGHT), Constraint::Min(0)]).areas(area);

        frame.render_widget(Clear, area);
        let query_block = Block::bordered()
            .title(" Select clients: type to narrow, Enter toggles, Esc closes ")
            .border_style(Style::new().fg(Color::Yellow));
        frame.render_widget(
            Paragraph::new(picker.query.input.as_str()).block(query_block),
            query,
        );
        frame.set_cursor_position((cursor_x(query, &picker.query), query.y + 1));

        let items: Vec<ListItem> = picker
            .options
            .iter()
            .map(|(name, selected)| {
                let mark = if *selected { "[x] " } else { "[ ] " };
                ListItem::new(format!("{mark}{name}"))
            })
            .collect();
        let title = format!(" {} clients ", items.len());
        let list_widget = List::new(items)
            .block(Block::bordered().title(title))
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        if !picker.options.is_empty() {
            state.select(Some(picker.curser_row));
        }
        frame.render_stateful_widget(list_widget, list, &mut state);
    }

    fn render_popup(&self, message: &str, frame: &mut Frame) {
        let area = popup_area(frame.area(), 50, 80);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .title_bottom(Line::from(" Esc to close ").centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(message).block(block), area);
    }
}

/// Screen column of the text cursor inside a bordered input box.
/// Wide characters take two columns, and a long input pins the cursor to the
/// last column inside the border.
fn cursor_x(area: Rect, input: &InputResult) -> u16 {
    let before: String = input.input.chars().take(input.curser_pos).collect();
    let inner = area.width.saturating_sub(3) as usize;
    area.x + 1 + Span::raw(before).width().min(inner) as u16
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;
    use crate::table::Table;
    use crate::table::tests::record;
    use ratatui::crossterm::event::{KeyCode, KeyEvent};
    use ratatui::{Terminal, backend::TestBackend, layout::Position};
    use std::sync::Arc;

    fn screen(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        let mut ui = LobbyUI::new(&LVConfig::default());
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .chunks(100)
            .map(|line| line.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn model() -> Model {
        let table = Table::from_records(
            "scenario.csv",
            vec![record("John Smith", "Acme"), record("Jane Doe", "Globex")],
        );
        Model::new(Arc::new(table), &LVConfig::default())
    }

    #[test]
    fn renders_table_and_placeholder() {
        let model = model();
        let s = screen(&model);
        assert!(s.contains("scenario.csv"));
        assert!(s.contains("John Smith"));
        assert!(s.contains("Page 1/1"));
        assert!(s.contains(PROFILE_PLACEHOLDER));
    }

    #[test]
    fn renders_profile() {
        let mut model = model();
        model.update(Some(Message::MoveDown)).unwrap();
        model.update(Some(Message::Activate)).unwrap();
        let s = screen(&model);
        assert!(s.contains("Filer ID:"));
        assert!(s.contains("Client: Globex"));
        assert!(!s.contains(PROFILE_PLACEHOLDER));
    }

    #[test]
    fn renders_client_picker() {
        let mut model = model();
        model.update(Some(Message::PickClients)).unwrap();
        let s = screen(&model);
        assert!(s.contains("[ ] Acme"));
        assert!(s.contains("[ ] Globex"));
    }

    #[test]
    fn renders_help() {
        let mut model = model();
        model.update(Some(Message::Help)).unwrap();
        assert!(screen(&model).contains("search lobbyist"));
    }

    fn cursor_after_typing(text: &str) -> Position {
        let mut model = model();
        model.update(Some(Message::EditSearch)).unwrap();
        for c in text.chars() {
            let key = KeyEvent::from(KeyCode::Char(c));
            model.update(Some(Message::RawKey(key))).unwrap();
        }
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        let mut ui = LobbyUI::new(&LVConfig::default());
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        terminal.get_cursor_position().unwrap()
    }

    #[test]
    fn search_cursor_counts_display_width() {
        assert_eq!(cursor_after_typing("smith"), Position::new(6, 1));
        assert_eq!(cursor_after_typing("中中"), Position::new(5, 1));
    }

    #[test]
    fn search_cursor_stays_inside_box() {
        // The search box is the left half of a 100 column screen.
        let cursor = cursor_after_typing(&"x".repeat(80));
        assert_eq!(cursor, Position::new(48, 1));
    }

    #[test]
    fn cursor_in_narrow_box() {
        let input = InputResult {
            input: "abc".to_string(),
            curser_pos: 3,
            ..Default::default()
        };
        assert_eq!(cursor_x(Rect::new(10, 0, 2, 3), &input), 11);
        assert_eq!(cursor_x(Rect::new(10, 0, 20, 3), &input), 14);
    }
}
