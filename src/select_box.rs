use std::io::{self, Write};

use crate::flags;
use crate::flags::FlagSet;
use crate::input::InputBuffer;
use crate::inventory::HostEntry;
use crate::selector::{SelectionRequest, Selector};
use crate::terminal::Terminal;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use unicode_width::UnicodeWidthStr;

use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};

const INFO_TEXT_TYPING: &str =
    "(Esc) quit | (↑/↓) move | (PgUp/PgDn) scroll | (Enter) connect | /l /v /o /d + space locks a flag";
const INFO_TEXT_MODE_ACTIVE: &str =
    "flag locked | keep typing to filter | (Enter) connect | (Esc) quit";
const INFO_TEXT_SCROLLING: &str =
    "(↑/↓) scroll | type to filter | (Enter) connect | (Esc) back to typing";
const SEARCH_SYMBOL: &str = "🔍 ";

// rows around the table: column header, input box, key help line
const FIXED_CHROME_HEIGHT: u16 = 5;
const MIN_WINDOW: usize = 3;

enum Mode {
    Typing,
    ModeActive,
    Scrolling,
}

enum Outcome {
    Selected(SelectionRequest),
    Cancelled,
}

pub struct SelectBox {
    data: Vec<HostEntry>,
    state: TableState,
    // indices into data plus fuzzy highlight positions, in display order
    filtered: Vec<(usize, Vec<usize>)>,
    selected: usize,
    offset: usize,
    window: usize,
    longest_item_lens: (u16, u16, u16),
    input_buffer: InputBuffer,
    active_flags: FlagSet,
    mode: Mode,
}

impl SelectBox {
    pub fn new(data: Vec<HostEntry>) -> Self {
        let mut select_box = Self {
            longest_item_lens: (
                data.iter()
                    .map(|d| UnicodeWidthStr::width(d.hostname.as_str()))
                    .max()
                    .unwrap_or(0) as u16,
                data.iter()
                    .map(|d| UnicodeWidthStr::width(d.host.as_str()))
                    .max()
                    .unwrap_or(0) as u16,
                data.iter()
                    .map(|d| UnicodeWidthStr::width(d.user.as_deref().unwrap_or("")))
                    .max()
                    .unwrap_or(0) as u16,
            ),
            state: TableState::default().with_selected(0),
            filtered: Vec::new(),
            selected: 0,
            offset: 0,
            window: data.len().max(MIN_WINDOW),
            input_buffer: InputBuffer::new(SEARCH_SYMBOL.to_string()),
            active_flags: FlagSet::default(),
            mode: Mode::Typing,
            data,
        };
        select_box.refilter();
        select_box
    }

    /// All key handling funnels through here so every mode transition lives
    /// in one place.
    fn on_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        use KeyCode::*;
        match key.code {
            Esc => match self.mode {
                Mode::Scrolling => {
                    self.mode = Mode::Typing;
                    None
                }
                _ => Some(Outcome::Cancelled),
            },
            Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Outcome::Cancelled)
            }
            Enter => self.confirm(),
            Up => {
                self.direction(-1);
                None
            }
            Down => {
                self.direction(1);
                None
            }
            PageUp => {
                self.page(-1);
                None
            }
            PageDown => {
                self.page(1);
                None
            }
            Char(' ') => {
                if !self.try_lock_flags() {
                    self.feed(key);
                }
                None
            }
            _ => {
                self.feed(key);
                None
            }
        }
    }

    fn direction(&mut self, delta: isize) {
        if matches!(self.mode, Mode::Scrolling) {
            self.scroll(delta);
        } else {
            self.step_selection(delta);
        }
    }

    // viewport movement only exists when the list overflows the window
    fn page(&mut self, delta: isize) {
        if self.filtered.len() > self.window {
            self.mode = Mode::Scrolling;
            self.scroll(delta * self.window as isize);
        }
    }

    fn scroll(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let max_offset = self.filtered.len().saturating_sub(self.window);
        self.offset = self.offset.saturating_add_signed(delta).min(max_offset);
        let last_visible = (self.offset + self.window).min(self.filtered.len()) - 1;
        self.selected = self.selected.clamp(self.offset, last_visible);
    }

    fn step_selection(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() - 1;
        self.selected = if delta < 0 {
            if self.selected == 0 {
                last
            } else {
                self.selected - 1
            }
        } else if self.selected >= last {
            0
        } else {
            self.selected + 1
        };
        self.follow_selection();
    }

    fn follow_selection(&mut self) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + self.window {
            self.offset = self.selected + 1 - self.window;
        }
    }

    /// Space locks the typed text in when it is nothing but recognized flag
    /// tokens. Same token table as the command-line flag parser.
    fn try_lock_flags(&mut self) -> bool {
        let (typed, rest) = flags::parse(self.input_buffer.input.value());
        if typed.is_empty() || !rest.is_empty() {
            return false;
        }
        self.active_flags = self.active_flags.union(typed);
        self.input_buffer.reset();
        self.input_buffer
            .set_prompt(prompt_for(&self.active_flags));
        self.mode = Mode::ModeActive;
        self.refilter();
        true
    }

    fn feed(&mut self, key: KeyEvent) {
        self.mode = Mode::Typing;
        self.input_buffer.handle_event(Event::Key(key));
        self.refilter();
    }

    fn confirm(&mut self) -> Option<Outcome> {
        let (typed, rest) = flags::parse(self.input_buffer.input.value());
        let flags = self.active_flags.union(typed);
        let query = match self.filtered.get(self.selected) {
            Some(&(index, _)) => self.data[index].hostname.clone(),
            // nothing matched: hand the typed text on as a literal query
            None => rest.to_string(),
        };
        if query.is_empty() {
            return None;
        }
        Some(Outcome::Selected(SelectionRequest { flags, query }))
    }

    fn refilter(&mut self) {
        let matcher = SkimMatcherV2::default();
        let (_, pattern) = flags::parse(self.input_buffer.input.value());
        let pattern = pattern.to_string();
        self.filtered = if pattern.is_empty() {
            self.data
                .iter()
                .enumerate()
                .map(|(i, _)| (i, Vec::new()))
                .collect()
        } else {
            self.data
                .iter()
                .enumerate()
                .filter_map(|(i, entry)| {
                    matcher
                        .fuzzy_indices(&entry.hostname, &pattern)
                        .map(|(_, indices)| (i, indices))
                })
                .collect()
        };
        self.offset = 0;
        self.selected = 0;
    }

    fn clamp_viewport(&mut self) {
        if self.filtered.is_empty() {
            self.offset = 0;
            self.selected = 0;
            return;
        }
        if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len() - 1;
        }
        let max_offset = self.filtered.len().saturating_sub(self.window);
        if self.offset > max_offset {
            self.offset = max_offset;
        }
        if matches!(self.mode, Mode::Scrolling) {
            let last_visible = (self.offset + self.window).min(self.filtered.len()) - 1;
            self.selected = self.selected.clamp(self.offset, last_visible);
        } else {
            self.follow_selection();
        }
    }

    pub fn draw(&mut self, terminal: &mut Terminal<impl Write>) -> io::Result<()> {
        terminal.draw(|frame| {
            self.ui(frame);
        })?;
        Result::Ok(())
    }

    fn ui(&mut self, f: &mut Frame) {
        let area = f.size();
        self.window = (area.height.saturating_sub(FIXED_CHROME_HEIGHT) as usize).max(MIN_WINDOW);
        self.clamp_viewport();

        let header = Row::new(vec![
            Cell::from("Hostname").style(Style::default().add_modifier(Modifier::UNDERLINED)),
            Cell::from("Host").style(Style::default().add_modifier(Modifier::UNDERLINED)),
            Cell::from("User").style(Style::default().add_modifier(Modifier::UNDERLINED)),
            Cell::from("Notes").style(Style::default().add_modifier(Modifier::UNDERLINED)),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        // only the visible slice ever becomes table rows
        let end = (self.offset + self.window).min(self.filtered.len());
        let rows: Vec<Row> = self.filtered[self.offset..end]
            .iter()
            .map(|(index, indices)| {
                let entry = &self.data[*index];
                let hostname = if indices.is_empty() {
                    Text::from(entry.hostname.as_str())
                } else {
                    Text::from(Line::from(Self::get_highlight_spans(
                        &entry.hostname,
                        indices,
                    )))
                };
                Row::new([
                    hostname,
                    Text::from(entry.host.as_str()),
                    Text::from(entry.user.as_deref().unwrap_or("")),
                    Text::from(entry.notes.as_str()),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(self.longest_item_lens.0 + 1),
                Constraint::Length(self.longest_item_lens.1 + 1),
                Constraint::Length(self.longest_item_lens.2 + 1),
                Constraint::Min(5),
            ],
        )
        .header(header)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_spacing(HighlightSpacing::Always);

        let info = Paragraph::new(Line::from(match self.mode {
            Mode::Typing => INFO_TEXT_TYPING,
            Mode::ModeActive => INFO_TEXT_MODE_ACTIVE,
            Mode::Scrolling => INFO_TEXT_SCROLLING,
        }))
        .centered();

        let input = Paragraph::new(
            Text::from(self.input_buffer.value()).style(Style::default().fg(Color::Cyan)),
        )
        .block(Block::default().borders(Borders::ALL));

        let recs = Layout::vertical([
            Constraint::Length(self.window as u16 + 1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

        self.state.select(if self.filtered.is_empty() {
            None
        } else {
            Some(self.selected - self.offset)
        });

        StatefulWidget::render(table, recs[0], f.buffer_mut(), &mut self.state);
        input.render(recs[1], f.buffer_mut());
        info.render(recs[2], f.buffer_mut());

        f.set_cursor(
            recs[1].x + 1 + self.input_buffer.visual_cursor() as u16,
            recs[1].y + 1,
        );
    }

    fn get_highlight_spans<'b>(input: &str, indices: &[usize]) -> Vec<Span<'b>> {
        let mut spans = Vec::new();
        let mut current_segment = String::new();
        let mut index_set: Vec<usize> = indices.to_vec();
        index_set.sort_unstable();
        index_set.dedup();

        let highlight_style = Style::default()
            .fg(Color::Rgb(250, 0, 0))
            .bg(Color::Rgb(0xFF, 0xFC, 0x67))
            .add_modifier(Modifier::BOLD);
        for (i, c) in input.chars().enumerate() {
            if index_set.contains(&i) {
                if !current_segment.is_empty() {
                    spans.push(Span::raw(current_segment.clone()));
                    current_segment.clear();
                }
                spans.push(Span::styled(c.to_string(), highlight_style));
            } else {
                current_segment.push(c);
            }
        }

        if !current_segment.is_empty() {
            spans.push(Span::raw(current_segment));
        }

        spans
    }
}

impl Selector for SelectBox {
    fn select(&mut self) -> anyhow::Result<Option<SelectionRequest>> {
        let mut terminal = Terminal::new()?;
        loop {
            self.draw(&mut terminal)?;
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match self.on_key(key) {
                    Some(Outcome::Selected(request)) => {
                        terminal.clear()?;
                        return Ok(Some(request));
                    }
                    Some(Outcome::Cancelled) => {
                        terminal.clear()?;
                        return Ok(None);
                    }
                    None => {}
                }
            }
        }
    }
}

fn prompt_for(flags: &FlagSet) -> String {
    if flags.is_empty() {
        SEARCH_SYMBOL.to_string()
    } else {
        format!("{}[{}] ", SEARCH_SYMBOL, flags.labels().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::parse;

    fn select_box(n: usize) -> SelectBox {
        let text: String = (0..n).map(|i| format!("host{i:02}\n")).collect();
        SelectBox::new(parse(&text))
    }

    fn press(sb: &mut SelectBox, code: KeyCode) -> Option<Outcome> {
        sb.on_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(sb: &mut SelectBox, text: &str) {
        for c in text.chars() {
            press(sb, KeyCode::Char(c));
        }
    }

    #[test]
    fn offset_stays_clamped_while_scrolling() {
        let mut sb = select_box(10);
        sb.window = 3;
        press(&mut sb, KeyCode::PageDown);
        assert!(matches!(sb.mode, Mode::Scrolling));
        for _ in 0..50 {
            press(&mut sb, KeyCode::Down);
        }
        assert_eq!(sb.offset, 7); // N - W

        // down at the bottom is a no-op
        press(&mut sb, KeyCode::Down);
        assert_eq!(sb.offset, 7);

        for _ in 0..50 {
            press(&mut sb, KeyCode::Up);
        }
        assert_eq!(sb.offset, 0);
        press(&mut sb, KeyCode::Up);
        assert_eq!(sb.offset, 0);
    }

    #[test]
    fn paging_needs_an_overflowing_list() {
        let mut sb = select_box(3);
        sb.window = 5;
        press(&mut sb, KeyCode::PageDown);
        assert!(matches!(sb.mode, Mode::Typing));
        assert_eq!(sb.offset, 0);
    }

    #[test]
    fn selection_wraps_and_viewport_follows() {
        let mut sb = select_box(10);
        sb.window = 3;
        press(&mut sb, KeyCode::Up); // wrap to the last entry
        assert_eq!(sb.selected, 9);
        assert_eq!(sb.offset, 7);
        press(&mut sb, KeyCode::Down); // wrap back to the top
        assert_eq!(sb.selected, 0);
        assert_eq!(sb.offset, 0);
    }

    #[test]
    fn space_locks_a_recognized_flag_prefix() {
        let mut sb = select_box(4);
        type_text(&mut sb, "/l/v");
        press(&mut sb, KeyCode::Char(' '));
        assert!(matches!(sb.mode, Mode::ModeActive));
        assert!(sb.active_flags.legacy && sb.active_flags.verbose);
        assert_eq!(sb.input_buffer.input.value(), "");
        assert!(sb.input_buffer.prompt.contains("legacy"));
        assert!(sb.input_buffer.prompt.contains("verbose"));
    }

    #[test]
    fn space_with_plain_text_stays_in_the_query() {
        let mut sb = select_box(4);
        type_text(&mut sb, "host");
        press(&mut sb, KeyCode::Char(' '));
        assert!(matches!(sb.mode, Mode::Typing));
        assert!(sb.active_flags.is_empty());
        assert_eq!(sb.input_buffer.input.value(), "host ");
    }

    #[test]
    fn typing_after_lock_returns_to_typing_with_flags_kept() {
        let mut sb = select_box(4);
        type_text(&mut sb, "/d");
        press(&mut sb, KeyCode::Char(' '));
        assert!(matches!(sb.mode, Mode::ModeActive));
        type_text(&mut sb, "ho");
        assert!(matches!(sb.mode, Mode::Typing));
        assert!(sb.active_flags.dry_run);
    }

    #[test]
    fn enter_returns_the_highlighted_hostname() {
        let mut sb = select_box(4);
        press(&mut sb, KeyCode::Down);
        let outcome = press(&mut sb, KeyCode::Enter);
        let Some(Outcome::Selected(request)) = outcome else {
            panic!("expected a selection");
        };
        assert_eq!(request.query, "host01");
        assert!(request.flags.is_empty());
    }

    #[test]
    fn enter_with_no_matches_passes_typed_text_through() {
        let mut sb = select_box(4);
        type_text(&mut sb, "10.9.9.9");
        assert!(sb.filtered.is_empty());
        let Some(Outcome::Selected(request)) = press(&mut sb, KeyCode::Enter) else {
            panic!("expected a selection");
        };
        assert_eq!(request.query, "10.9.9.9");
    }

    #[test]
    fn locked_and_typed_flags_are_merged_on_enter() {
        let mut sb = select_box(4);
        type_text(&mut sb, "/l");
        press(&mut sb, KeyCode::Char(' '));
        type_text(&mut sb, "/v zz.example");
        let Some(Outcome::Selected(request)) = press(&mut sb, KeyCode::Enter) else {
            panic!("expected a selection");
        };
        assert!(request.flags.legacy && request.flags.verbose);
        assert_eq!(request.query, "zz.example");
    }

    #[test]
    fn enter_on_empty_input_is_ignored_when_nothing_matches() {
        let mut sb = select_box(0);
        assert!(press(&mut sb, KeyCode::Enter).is_none());
    }

    #[test]
    fn filter_narrows_to_matching_hostnames() {
        let sb = {
            let mut sb = SelectBox::new(parse("web1\ndb1\nweb2\n"));
            type_text(&mut sb, "web");
            sb
        };
        let shown: Vec<&str> = sb
            .filtered
            .iter()
            .map(|(i, _)| sb.data[*i].hostname.as_str())
            .collect();
        assert_eq!(shown, ["web1", "web2"]);
    }

    #[test]
    fn escape_cancels_from_typing() {
        let mut sb = select_box(2);
        assert!(matches!(press(&mut sb, KeyCode::Esc), Some(Outcome::Cancelled)));
    }

    #[test]
    fn escape_leaves_scrolling_first() {
        let mut sb = select_box(10);
        sb.window = 3;
        press(&mut sb, KeyCode::PageDown);
        assert!(matches!(sb.mode, Mode::Scrolling));
        assert!(press(&mut sb, KeyCode::Esc).is_none());
        assert!(matches!(sb.mode, Mode::Typing));
        assert!(matches!(press(&mut sb, KeyCode::Esc), Some(Outcome::Cancelled)));
    }
}
