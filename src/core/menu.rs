use ratatui::{
    widgets::{Block, Borders, List, ListItem, Paragraph},
    layout::{Layout, Constraint, Direction},
    style::{Style, Color, Modifier},
    Frame,
};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyResult {
    Host,
    Join(String), // Host endpoint id
    Quit,
}

const OPTIONS: [(&str, &str); 2] = [
    ("Host", "Throw stones as David; share your endpoint id with the guest"),
    ("Join", "Wield the spear as Goliath; paste the host's endpoint id"),
];

pub struct LobbyManager {
    pub selected: usize,
    pub input_mode: bool,
    pub peer_id_input: String,
}

impl Default for LobbyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LobbyManager {
    pub fn new() -> Self {
        Self {
            selected: 0,
            input_mode: false,
            peer_id_input: String::new(),
        }
    }

    pub fn run(&mut self, terminal: &mut ratatui::DefaultTerminal) -> Result<LobbyResult> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    if let Some(result) = self.handle_key(key.code) {
                        return Ok(result);
                    }
                }
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Option<LobbyResult> {
        if self.input_mode {
            match code {
                KeyCode::Enter => {
                    let id = self.peer_id_input.trim();
                    if !id.is_empty() {
                        return Some(LobbyResult::Join(id.to_string()));
                    }
                }
                KeyCode::Esc => self.input_mode = false,
                KeyCode::Char(c) => self.peer_id_input.push(c),
                KeyCode::Backspace => { self.peer_id_input.pop(); }
                _ => {}
            }
            return None;
        }
        match code {
            KeyCode::Char('h') => return Some(LobbyResult::Host),
            KeyCode::Char('j') => self.input_mode = true,
            KeyCode::Enter if self.selected == 0 => return Some(LobbyResult::Host),
            KeyCode::Enter => self.input_mode = true,
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(OPTIONS.len() - 1),
            KeyCode::Char('q') | KeyCode::Esc => return Some(LobbyResult::Quit),
            _ => {}
        }
        None
    }

    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(f.area());

        f.render_widget(
            Paragraph::new(" DAVID vs GOLIATH ")
                .block(Block::default().borders(Borders::ALL))
                .alignment(ratatui::layout::Alignment::Center),
            chunks[0]
        );

        if self.input_mode {
            f.render_widget(
                Paragraph::new(format!("Enter Host Endpoint ID:\n\n > {}", self.peer_id_input))
                    .block(Block::default().title(" JOIN SESSION ").borders(Borders::ALL)),
                chunks[1]
            );
        } else {
            let items: Vec<ListItem> = OPTIONS.iter().enumerate().map(|(i, (name, desc))| {
                let style = if i == self.selected {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!(" » {} : {}", name, desc)).style(style)
            }).collect();

            f.render_widget(
                List::new(items).block(Block::default().title(" ROLE ").borders(Borders::ALL)),
                chunks[1]
            );
        }

        f.render_widget(
            Paragraph::new("[↑/↓] Navigate  [H] Host  [J] Join by ID  [Enter] Confirm  [Q] Quit")
                .alignment(ratatui::layout::Alignment::Center),
            chunks[2]
        );
    }
}
