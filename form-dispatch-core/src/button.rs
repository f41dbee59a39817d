//! Status labels and a ratatui button widget for deferred actions

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::status::ActionStatus;

/// Label shown for a failed action, whatever the preset.
pub const FAILED_LABEL: &str = "Error";

/// Per-status button text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabels {
    idle: String,
    pending: String,
    success: String,
}

impl StatusLabels {
    pub fn new(
        idle: impl Into<String>,
        pending: impl Into<String>,
        success: impl Into<String>,
    ) -> Self {
        Self {
            idle: idle.into(),
            pending: pending.into(),
            success: success.into(),
        }
    }

    /// Labels for a form's save button.
    pub fn save() -> Self {
        Self::new("Save changes", "Saving…", "Saved")
    }

    /// Labels for an "invalidate now" button.
    pub fn invalidate() -> Self {
        Self::new("Invalidate now", "Invalidating…", "Done")
    }

    pub fn label(&self, status: ActionStatus) -> &str {
        match status {
            ActionStatus::Idle => &self.idle,
            ActionStatus::Pending => &self.pending,
            ActionStatus::Success => &self.success,
            ActionStatus::Failed => FAILED_LABEL,
        }
    }
}

/// Styles for each status.
#[derive(Debug, Clone, Copy)]
pub struct StatusStyles {
    pub idle: Style,
    pub pending: Style,
    pub success: Style,
    pub failed: Style,
    pub disabled: Style,
    pub focused: Modifier,
}

impl Default for StatusStyles {
    fn default() -> Self {
        Self {
            idle: Style::default().fg(Color::Cyan),
            pending: Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            success: Style::default().fg(Color::Green),
            failed: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            disabled: Style::default().fg(Color::DarkGray),
            focused: Modifier::REVERSED,
        }
    }
}

impl StatusStyles {
    pub fn for_status(&self, status: ActionStatus) -> Style {
        match status {
            ActionStatus::Idle => self.idle,
            ActionStatus::Pending => self.pending,
            ActionStatus::Success => self.success,
            ActionStatus::Failed => self.failed,
        }
    }
}

/// A one-line button: `[ Saving… ]`.
///
/// A pending button keeps its pending style when disabled.
pub struct StatusButton<'a> {
    labels: &'a StatusLabels,
    status: ActionStatus,
    enabled: bool,
    focused: bool,
    styles: StatusStyles,
}

impl<'a> StatusButton<'a> {
    pub fn new(labels: &'a StatusLabels, status: ActionStatus) -> Self {
        Self {
            labels,
            status,
            enabled: true,
            focused: false,
            styles: StatusStyles::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn styles(mut self, styles: StatusStyles) -> Self {
        self.styles = styles;
        self
    }

    pub fn label(&self) -> &str {
        self.labels.label(self.status)
    }

    fn style(&self) -> Style {
        let mut style = self.styles.for_status(self.status);
        if !self.enabled && !self.status.is_pending() {
            style = self.styles.disabled;
        }
        if self.focused {
            style = style.add_modifier(self.styles.focused);
        }
        style
    }

    /// Rendered width in cells.
    pub fn width(&self) -> u16 {
        (self.label().chars().count() + 4) as u16
    }
}

impl Widget for StatusButton<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let style = self.style();
        let line = Line::from(vec![
            Span::raw("[ "),
            Span::styled(self.label().to_owned(), style),
            Span::raw(" ]"),
        ]);
        line.render(Rect { height: 1, ..area }, buf);
    }
}
