use alloy::primitives::TxHash;
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::{
    collections::BTreeMap,
    io::stdout,
    path::PathBuf,
};
use wrestling_client::{
    Action,
    ClientError,
    DepositInputs,
    PresentationUpdate,
    Presenter,
    Slot,
    config::ClientConfig,
    presentation::{
        Control,
        TextSlot,
    },
};

pub type InputEventReceiver = EventStream;

pub enum UserEvent {
    Quit,
    Redraw,
    Dispatch(Action),
}

/// Everything the page shows. Fed by presentation updates and local input.
#[derive(Debug)]
pub struct PageState {
    header: String,
    texts: BTreeMap<TextSlot, String>,
    visible: BTreeMap<Control, bool>,
    pub inputs: DepositInputs,
    pending_writes: usize,
    last_tx: Option<String>,
}

impl PageState {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            header: format!(
                "{} | {} ({}) | chain {}",
                config.network, config.contract, config.variant, config.endpoint.chain_id
            ),
            texts: BTreeMap::new(),
            // every control starts out shown until a read says otherwise
            visible: Control::ALL.iter().map(|control| (*control, true)).collect(),
            inputs: DepositInputs::default(),
            pending_writes: 0,
            last_tx: None,
        }
    }

    pub fn text(&self, slot: TextSlot) -> &str {
        self.texts.get(&slot).map(String::as_str).unwrap_or("-")
    }

    pub fn is_visible(&self, control: Control) -> bool {
        self.visible.get(&control).copied().unwrap_or(true)
    }

    pub fn write_started(&mut self) {
        self.pending_writes += 1;
    }

    pub fn write_finished(&mut self, action: Action, result: &Result<TxHash, ClientError>) {
        self.pending_writes = self.pending_writes.saturating_sub(1);
        if let Ok(hash) = result {
            self.last_tx = Some(format!("{action}: {hash}"));
        }
    }
}

impl Presenter for PageState {
    fn render(&mut self, update: &PresentationUpdate) {
        for (slot, text) in &update.texts {
            self.texts.insert(*slot, text.clone());
        }
        for (control, shown) in &update.visibility {
            self.visible.insert(*control, *shown);
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Normal,
    EditingDeposit(Slot),
}

#[derive(Debug)]
pub struct UiState {
    mode: Mode,
    selected: Slot,
    log_path: PathBuf,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl UiState {
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            mode: Mode::Normal,
            selected: Slot::One,
            log_path,
            terminal: None,
        }
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

pub fn draw(state: &mut UiState, page: &PageState) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, page))?;
        state.terminal = Some(term);
    }
    Ok(())
}

/// Maps a terminal event to a page action. Keys for hidden controls do nothing.
pub fn interpret_event(
    state: &mut UiState,
    page: &mut PageState,
    event: Event,
) -> Option<UserEvent> {
    let key = match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => key,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };

    if let Mode::EditingDeposit(slot) = state.mode {
        return edit_deposit(state, page, slot, key);
    }

    let selected = state.selected;
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(UserEvent::Quit)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(UserEvent::Quit),
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
            state.selected = selected.other();
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('1') => {
            state.selected = Slot::One;
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('2') => {
            state.selected = Slot::Two;
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('e') => {
            state.mode = Mode::EditingDeposit(selected);
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('r') => page
            .is_visible(Control::register(selected))
            .then_some(UserEvent::Dispatch(Action::Register(selected))),
        KeyCode::Char('w') => page
            .is_visible(Control::wrestle(selected))
            .then_some(UserEvent::Dispatch(Action::Wrestle)),
        KeyCode::Char('d') => page
            .is_visible(Control::withdraw(selected))
            .then_some(UserEvent::Dispatch(Action::Withdraw)),
        _ => None,
    }
}

fn edit_deposit(
    state: &mut UiState,
    page: &mut PageState,
    slot: Slot,
    key: KeyEvent,
) -> Option<UserEvent> {
    let input = page.inputs.get_mut(slot);
    match key.code {
        KeyCode::Enter | KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => input.push(c),
        _ => return None,
    }
    Some(UserEvent::Redraw)
}

fn ui(f: &mut Frame, state: &UiState, page: &PageState) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // connection
            Constraint::Length(10), // wrestlers
            Constraint::Length(4),  // result
            Constraint::Min(3),     // status
            Constraint::Length(3),  // help
        ])
        .split(f.area());

    draw_connection(f, chunks[0], page);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    draw_wrestler(f, columns[0], state, page, Slot::One);
    draw_wrestler(f, columns[1], state, page, Slot::Two);
    draw_result(f, chunks[2], page);
    draw_status(f, chunks[3], page);
    draw_help(f, chunks[4], state);
}

fn draw_connection(f: &mut Frame, area: Rect, page: &PageState) {
    let lines = vec![
        Line::from(page.header.clone()),
        Line::from(format!(
            "Mode: {} | Account: {}",
            page.text(TextSlot::Mode),
            page.text(TextSlot::Account)
        )),
    ];
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Connection"));
    f.render_widget(widget, area);
}

fn draw_wrestler(f: &mut Frame, area: Rect, state: &UiState, page: &PageState, slot: Slot) {
    let editing = state.mode == Mode::EditingDeposit(slot);
    let stake = page.inputs.get(slot);
    let stake_style = if editing {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut lines = vec![
        Line::from(page.text(TextSlot::player(slot)).to_string()),
        Line::from(format!("Deposit: {}", page.text(TextSlot::deposit(slot)))),
        Line::from(Span::styled(
            format!("Stake (ETH): {}{}", stake, if editing { "_" } else { "" }),
            stake_style,
        )),
        Line::from(""),
    ];
    let controls = [
        (Control::register(slot), "[r] Register"),
        (Control::wrestle(slot), "[w] Wrestle"),
        (Control::withdraw(slot), "[d] Withdraw"),
    ];
    for (control, label) in controls {
        if page.is_visible(control) {
            lines.push(Line::from(Span::styled(label, Style::default().fg(Color::Cyan))));
        }
    }

    let border = if state.selected == slot {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!("Wrestler {}", slot.number())),
    );
    f.render_widget(widget, area);
}

fn draw_result(f: &mut Frame, area: Rect, page: &PageState) {
    let lines = vec![
        Line::from(format!("Winner: {}", page.text(TextSlot::Winner))),
        Line::from(format!("Gains: {}", page.text(TextSlot::Gains))),
    ];
    let widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Result"));
    f.render_widget(widget, area);
}

fn draw_status(f: &mut Frame, area: Rect, page: &PageState) {
    let mut lines = Vec::new();
    if page.pending_writes > 0 {
        lines.push(Line::from(format!(
            "{} transaction(s) pending",
            page.pending_writes
        )));
    }
    match &page.last_tx {
        Some(tx) => lines.push(Line::from(format!("Last transaction: {tx}"))),
        None if lines.is_empty() => lines.push(Line::from("Ready")),
        None => {}
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(Style::default().fg(Color::Green));
    f.render_widget(widget, area);
}

fn draw_help(f: &mut Frame, area: Rect, state: &UiState) {
    let keys = match state.mode {
        Mode::EditingDeposit(_) => "type amount | Backspace delete | Enter/Esc done".to_string(),
        Mode::Normal => "Tab/←/→ select | r register | w wrestle | d withdraw | e stake | q/Esc quit"
            .to_string(),
    };
    let help = Paragraph::new(format!("{keys} | log: {}", state.log_path.display()))
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}
