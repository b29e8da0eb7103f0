//! View for the clicker: balance, quota, the watch button, upgrades, the
//! bonus task and the event log.

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratzilla::ratatui::Frame;

use crate::input::ClickState;
use crate::time::ticks_label;
use crate::widgets::ClickableList;

use super::actions::{BUY_UPGRADE_BASE, CHECK_TASK, CLICK, RESTART, START_TASK};
use super::logic::format_count;
use super::state::{ClickPhase, ProgressionState, TaskPhase, UpgradeKind};
use super::tuning::Tuning;

/// Width of the quota / progress bars in cells.
const BAR_WIDTH: usize = 20;

pub fn render(
    state: &ProgressionState,
    tuning: &Tuning,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let (main_area, log_area) = if area.width >= 80 {
        let h = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        (h[0], h[1])
    } else {
        let v = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(18), Constraint::Length(6)])
            .split(area);
        (v[0], v[1])
    };

    let notice_height = if state.notice.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(notice_height),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(main_area);

    render_wallet(state, f, chunks[0], click_state);
    if notice_height > 0 {
        render_notice(state, f, chunks[1]);
    }
    render_shop(state, tuning, f, chunks[2], click_state);
    render_task(state, tuning, f, chunks[3], click_state);
    render_log(state, f, log_area);
}

fn bar(filled: u64, total: u64) -> String {
    let n = if total == 0 {
        0
    } else {
        ((filled.min(total) * BAR_WIDTH as u64) / total) as usize
    };
    format!("{}{}", "█".repeat(n), "░".repeat(BAR_WIDTH - n))
}

fn render_wallet(
    state: &ProgressionState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let title = match state.user.as_ref().and_then(|u| u.display_name()) {
        Some(name) => format!(" {name} "),
        None => " Wallet ".to_string(),
    };
    let balance_style = if state.click_flash > 0 {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    };

    let mut cl = ClickableList::new();
    cl.push(Line::from(vec![
        Span::styled(" Coins  ", Style::default().fg(Color::Gray)),
        Span::styled(format_count(state.balance), balance_style),
    ]));
    cl.push(Line::from(vec![
        Span::styled(" Clicks ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} / {}", format_count(state.quota as u64), format_count(state.quota_cap as u64)),
            Style::default().fg(Color::Cyan),
        ),
    ]));
    cl.push(Line::from(Span::styled(
        format!("        {}", bar(state.quota as u64, state.quota_cap as u64)),
        Style::default().fg(Color::Cyan),
    )));
    cl.push(Line::from(Span::styled(
        format!(
            " x{} per click, {} per ad",
            state.multiplier(),
            ticks_label(state.click_delay_ticks)
        ),
        Style::default().fg(Color::DarkGray),
    )));
    cl.push(Line::from(vec![
        Span::styled(" Ads    ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} watched", format_count(state.ads_watched)),
            Style::default().fg(Color::Magenta),
        ),
    ]));

    let button = match state.click {
        ClickPhase::Pending { ticks_left } => {
            let done = state.click_delay_ticks.saturating_sub(ticks_left);
            Line::from(vec![
                Span::styled(" Watching… ", Style::default().fg(Color::Magenta)),
                Span::styled(
                    bar(done as u64, state.click_delay_ticks as u64),
                    Style::default().fg(Color::Magenta),
                ),
            ])
        }
        ClickPhase::Idle if state.quota == 0 => Line::from(Span::styled(
            " [C] Out of clicks, refilling…",
            Style::default().fg(Color::DarkGray),
        )),
        ClickPhase::Idle => Line::from(Span::styled(
            " [C] Watch Ad ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    };
    cl.push_clickable(button, CLICK);
    cl.push_clickable(
        Line::from(Span::styled(" [R] Restart session", Style::default().fg(Color::DarkGray))),
        RESTART,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(title);
    cl.register_targets(area, &mut click_state.borrow_mut(), 1, 1);
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

fn render_notice(state: &ProgressionState, f: &mut Frame, area: Rect) {
    let Some(notice) = &state.notice else {
        return;
    };
    let widget = Paragraph::new(Line::from(Span::styled(
        notice.text.as_str(),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .alignment(ratzilla::ratatui::layout::Alignment::Center);
    f.render_widget(widget, area);
}

fn render_shop(
    state: &ProgressionState,
    tuning: &Tuning,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let mut cl = ClickableList::new();
    for kind in UpgradeKind::all() {
        let cost = state.cost_of(tuning, *kind);
        let can_afford = state.balance >= cost;
        let key_style = if can_afford {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let text_style = if can_afford {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        cl.push_clickable(
            Line::from(vec![
                Span::styled(format!(" [{}] ", kind.key()), key_style),
                Span::styled(
                    format!(
                        "{} Lv{} ({})",
                        kind.name(),
                        state.levels.get(*kind),
                        format_count(cost)
                    ),
                    text_style,
                ),
            ]),
            BUY_UPGRADE_BASE + kind.index() as u16,
        );
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Upgrades ");
    cl.register_targets(area, &mut click_state.borrow_mut(), 1, 1);
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

fn render_task(
    state: &ProgressionState,
    tuning: &Tuning,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let mut cl = ClickableList::new();
    match state.task {
        TaskPhase::Idle | TaskPhase::Ready { claimed: true } => {
            cl.push_clickable(
                Line::from(vec![
                    Span::styled(" [T] ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!(
                            "Start task ({} → +{})",
                            ticks_label(tuning.task_duration_ticks),
                            format_count(tuning.task_reward)
                        ),
                        Style::default().fg(Color::White),
                    ),
                ]),
                START_TASK,
            );
        }
        TaskPhase::Running { ticks_left } => {
            let done = tuning.task_duration_ticks.saturating_sub(ticks_left);
            cl.push_clickable(
                Line::from(vec![
                    Span::styled(" [G] ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!(
                            "{} {} left",
                            bar(done as u64, tuning.task_duration_ticks as u64),
                            ticks_label(ticks_left)
                        ),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]),
                CHECK_TASK,
            );
        }
        TaskPhase::Ready { claimed: false } => {
            cl.push_clickable(
                Line::from(vec![
                    Span::styled(" [G] ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!("Claim +{}", format_count(tuning.task_reward)),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                ]),
                CHECK_TASK,
            );
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Bonus task ");
    cl.register_targets(area, &mut click_state.borrow_mut(), 1, 1);
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

fn render_log(state: &ProgressionState, f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = state
        .log
        .iter()
        .map(|entry| {
            if entry.is_important {
                Line::from(Span::styled(
                    entry.text.as_str(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(entry.text.as_str(), Style::default().fg(Color::Gray)))
            }
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" Log ");
    let inner = block.inner(area);
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Keep the newest entry on the bottom row once the log overflows.
    let total = paragraph.line_count(inner.width) as u16;
    let scroll = total.saturating_sub(inner.height);
    f.render_widget(paragraph.scroll((scroll, 0)).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0, 10).chars().filter(|c| *c == '█').count(), 0);
        assert_eq!(bar(5, 10).chars().filter(|c| *c == '█').count(), BAR_WIDTH / 2);
        assert_eq!(bar(10, 10).chars().filter(|c| *c == '█').count(), BAR_WIDTH);
        assert_eq!(bar(99, 10).chars().count(), BAR_WIDTH);
        assert_eq!(bar(3, 0).chars().filter(|c| *c == '░').count(), BAR_WIDTH);
    }
}
