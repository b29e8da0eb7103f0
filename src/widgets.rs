//! Clickable list builder.
//!
//! Pairs rendered [`Line`]s with action IDs so the click target for a line
//! always lands on the row the line is drawn on, however many lines are
//! inserted above it.
//!
//! ```ignore
//! let mut cl = ClickableList::new();
//! cl.push(Line::from("Balance: 120"));
//! cl.push_clickable(Line::from("[1] Multiplier"), BUY_UPGRADE_BASE);
//! cl.register_targets(area, &mut cs, 1, 1);
//! f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
//! ```

use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::text::Line;

use crate::input::ClickState;

pub struct ClickableList<'a> {
    lines: Vec<Line<'a>>,
    /// `(line_index, action_id)`
    actions: Vec<(u16, u16)>,
}

impl<'a> ClickableList<'a> {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn push(&mut self, line: Line<'a>) {
        self.lines.push(line);
    }

    pub fn push_clickable(&mut self, line: Line<'a>, action_id: u16) {
        self.actions.push((self.lines.len() as u16, action_id));
        self.lines.push(line);
    }

    pub fn into_lines(self) -> Vec<Line<'a>> {
        self.lines
    }

    /// Register one row target per clickable line. `top_offset` and
    /// `bottom_offset` are the rows taken by borders; lines that fall below
    /// the visible content are skipped. Lines are assumed not to wrap.
    pub fn register_targets(
        &self,
        area: Rect,
        cs: &mut ClickState,
        top_offset: u16,
        bottom_offset: u16,
    ) {
        let content_y = area.y + top_offset;
        let content_end = area.y + area.height.saturating_sub(bottom_offset);
        for &(line_idx, action_id) in &self.actions {
            let row = content_y + line_idx;
            if row >= content_end {
                continue;
            }
            cs.add_row_target(area, row, action_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_follow_line_positions() {
        let mut cl = ClickableList::new();
        cl.push(Line::from("balance"));
        cl.push(Line::from("quota"));
        cl.push_clickable(Line::from("[C] watch"), 0);
        cl.push_clickable(Line::from("[T] task"), 10);

        let area = Rect::new(0, 3, 40, 10);
        let mut cs = ClickState::new();
        cl.register_targets(area, &mut cs, 1, 1);

        assert_eq!(cs.targets.len(), 2);
        assert_eq!(cs.hit_test(5, 6), Some(0));
        assert_eq!(cs.hit_test(5, 7), Some(10));
        assert_eq!(cs.hit_test(5, 5), None);
    }

    #[test]
    fn rows_past_the_border_are_clipped() {
        let mut cl = ClickableList::new();
        for i in 0..10 {
            cl.push_clickable(Line::from(format!("row {i}")), 100 + i);
        }
        let area = Rect::new(0, 0, 40, 4); // two content rows
        let mut cs = ClickState::new();
        cl.register_targets(area, &mut cs, 1, 1);

        assert_eq!(cs.targets.len(), 2);
        assert_eq!(cs.hit_test(0, 1), Some(100));
        assert_eq!(cs.hit_test(0, 2), Some(101));
        assert_eq!(cs.hit_test(0, 3), None);
    }

    #[test]
    fn into_lines_keeps_everything() {
        let mut cl = ClickableList::new();
        cl.push(Line::from("a"));
        cl.push_clickable(Line::from("b"), 1);
        assert_eq!(cl.into_lines().len(), 2);
    }
}
