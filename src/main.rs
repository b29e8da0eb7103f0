mod clicker;
mod input;
mod log;
mod net;
mod storage;
mod time;
mod widgets;

use std::{cell::RefCell, io, rc::Rc};

use clicker::tuning::{self, Tuning};
use clicker::ClickerGame;
use input::{ClickState, InputEvent};
use net::Reporter;
use ratzilla::event::{KeyCode, MouseButton, MouseEventKind};
use ratzilla::ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Paragraph};
use ratzilla::ratatui::{Frame, Terminal};
use ratzilla::{DomBackend, WebRenderer};
use time::{Clock, TICKS_PER_SEC};

/// `location.search` of the page, e.g. `?variant=ads`.
fn query_string() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn make_reporter(tuning: &Tuning) -> Box<dyn Reporter> {
    #[cfg(target_arch = "wasm32")]
    {
        if tuning.remote.is_some() {
            return Box::new(net::FetchReporter);
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = tuning;
    Box::new(net::NullReporter)
}

fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();

    let store = storage::open_default();
    let tuning = tuning::load(store.as_ref(), &query_string());
    log::info(&format!(
        "session start: balance key {}, remote {}",
        tuning.balance_key,
        if tuning.remote.is_some() { "on" } else { "off" }
    ));
    let reporter = make_reporter(&tuning);

    let game = Rc::new(RefCell::new(ClickerGame::new(tuning, store, reporter)));
    let clock = Rc::new(RefCell::new(Clock::new(TICKS_PER_SEC)));
    let click_state = Rc::new(RefCell::new(ClickState::new()));

    #[cfg(target_arch = "wasm32")]
    {
        let remote = game.borrow().tuning.remote.clone();
        if let Some(remote) = remote {
            let game = game.clone();
            net::fetch_user_info(&remote.user_info_url, move |info| {
                game.borrow_mut()
                    .dispatch(clicker::logic::Action::UserInfoLoaded(info));
            });
        }
    }

    let backend = DomBackend::new()?;
    let mut terminal = Terminal::new(backend)?;

    // Mouse/touch click handler
    terminal.on_mouse_event({
        let game = game.clone();
        let clock = clock.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.kind != MouseEventKind::ButtonDown(MouseButton::Left) {
                return;
            }

            let matched = click_state
                .borrow()
                .hit_test(mouse_event.col, mouse_event.row);

            if let Some(action_id) = matched {
                game.borrow_mut().handle_input(&InputEvent::Click(action_id));
                if action_id == clicker::actions::RESTART {
                    clock.borrow_mut().reset();
                }
            }
        }
    })?;

    // Keyboard handler
    terminal.on_key_event({
        let game = game.clone();
        let clock = clock.clone();
        move |key_event| {
            if let KeyCode::Char(c) = key_event.code {
                let c = c.to_ascii_lowercase();
                game.borrow_mut().handle_input(&InputEvent::Key(c));
                if c == 'r' {
                    clock.borrow_mut().reset();
                }
            }
        }
    })?;

    terminal.draw_web({
        let click_state = click_state.clone();
        move |f| {
            let ticks = clock.borrow_mut().advance(now_ms());
            let mut gs = game.borrow_mut();
            gs.tick(ticks);

            let size = f.area();
            click_state.borrow_mut().clear_targets();

            let main_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(10),
                    Constraint::Length(3),
                ])
                .split(size);

            render_title(f, &gs, main_chunks[0]);
            gs.render(f, main_chunks[1], &click_state);
            render_help(f, main_chunks[2]);
        }
    });

    Ok(())
}

fn render_title(f: &mut Frame, gs: &ClickerGame, area: Rect) {
    let title = if gs.tuning.remote.is_some() {
        "Ad Counter"
    } else {
        "Ad Clicker"
    };
    let title_block = Paragraph::new(Line::from(Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .alignment(Alignment::Center);
    f.render_widget(title_block, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(Span::styled(
        "C watch · 1-3 upgrade · T task · G claim · R restart",
        Style::default().fg(Color::DarkGray),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .alignment(Alignment::Center);
    f.render_widget(help, area);
}
