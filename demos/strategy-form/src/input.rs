//! Terminal input: key mapping and the crossterm reader

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;

/// Terminal events the app cares about
#[derive(Debug, Clone)]
pub enum TermEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Map a key press to an action.
pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Action::TargetPrev,
        KeyCode::Down | KeyCode::Char('j') => Action::TargetNext,
        KeyCode::Right | KeyCode::Char('l') => Action::StrategyNext,
        KeyCode::Left | KeyCode::Char('h') => Action::StrategyPrev,
        KeyCode::Tab => Action::FieldNext,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::FieldAdjust(1),
        KeyCode::Char('-') => Action::FieldAdjust(-1),
        KeyCode::Enter => Action::Save,
        KeyCode::Esc => Action::Discard,
        KeyCode::Char('i') => Action::Invalidate,
        KeyCode::Char('x') => Action::DismissToast,
        KeyCode::Char('q') => Action::Quit,
        _ => return None,
    };
    Some(action)
}

/// How long one blocking poll waits before rechecking cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Keep the events the app reacts to. Key releases and repeats are dropped
/// here so a held key does not queue up saves.
pub fn term_event(event: Event) -> Option<TermEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(TermEvent::Key(key)),
        Event::Resize(w, h) => Some(TermEvent::Resize(w, h)),
        _ => None,
    }
}

/// Read terminal input on a blocking thread until `cancel` fires or the
/// receiver goes away.
pub fn spawn_input_reader(
    tx: mpsc::UnboundedSender<TermEvent>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !cancel.is_cancelled() {
            match event::poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(error) => {
                    tracing::warn!(%error, "Terminal poll failed, input stopped");
                    return;
                }
            }
            let Some(forwarded) = event::read().ok().and_then(term_event) else {
                continue;
            };
            if tx.send(forwarded).is_err() {
                tracing::debug!("Input channel closed");
                return;
            }
        }
        tracing::debug!("Input reader cancelled");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_map() {
        assert_eq!(action_for_key(press(KeyCode::Down)), Some(Action::TargetNext));
        assert_eq!(action_for_key(press(KeyCode::Left)), Some(Action::StrategyPrev));
        assert_eq!(action_for_key(press(KeyCode::Char('+'))), Some(Action::FieldAdjust(1)));
        assert_eq!(action_for_key(press(KeyCode::Char('-'))), Some(Action::FieldAdjust(-1)));
        assert_eq!(action_for_key(press(KeyCode::Enter)), Some(Action::Save));
        assert_eq!(action_for_key(press(KeyCode::Esc)), Some(Action::Discard));
        assert_eq!(action_for_key(press(KeyCode::Char('i'))), Some(Action::Invalidate));
        assert_eq!(action_for_key(press(KeyCode::Char('z'))), None);
    }

    #[test]
    fn test_ctrl_c_quits_and_release_is_ignored() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for_key(ctrl_c), Some(Action::Quit));

        let mut release = press(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(action_for_key(release), None);
    }

    #[test]
    fn test_term_event_filter() {
        let key = press(KeyCode::Enter);
        assert!(matches!(term_event(Event::Key(key)), Some(TermEvent::Key(k)) if k == key));
        assert!(matches!(term_event(Event::Resize(80, 24)), Some(TermEvent::Resize(80, 24))));

        let mut repeat = press(KeyCode::Enter);
        repeat.kind = KeyEventKind::Repeat;
        assert!(term_event(Event::Key(repeat)).is_none());
        assert!(term_event(Event::FocusGained).is_none());
    }
}
