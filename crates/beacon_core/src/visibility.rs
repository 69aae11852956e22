use crate::{navigation, Effect, PageSnapshot, SessionState, Visibility};

/// Tracks whether the host has been asked to deliver visibility changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct VisibilityObserver {
    bound: bool,
}

impl VisibilityObserver {
    /// Requests the binding the first time only.
    pub(crate) fn bind(&mut self, effects: &mut Vec<Effect>) {
        if !self.bound {
            self.bound = true;
            effects.push(Effect::BindVisibilityObserver);
        }
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.bound
    }
}

pub(crate) fn visibility_changed(
    state: &mut SessionState,
    page: &PageSnapshot,
    effects: &mut Vec<Effect>,
) {
    if state.visibility.is_bound() {
        match page.visibility {
            Visibility::Hidden => state.note_hidden(page.now, effects),
            Visibility::Visible => state.note_visible(page.now),
            Visibility::Prerender => {}
        }
    }
    navigation::check_activation(state, page, effects);
}
