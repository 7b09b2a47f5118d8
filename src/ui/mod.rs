//! UI rendering module

mod dashboard;
mod overlays;
mod widgets;

use crate::app::{App, ACTION_MENU_ITEMS};
use crate::constants;
use ratatui::Frame;

/// Main render function - dispatches to appropriate view
pub fn render(frame: &mut Frame, app: &mut App) {
    // Base view
    dashboard::render(frame, app);

    if app.show_config {
        overlays::config_viewer::render(frame, app);
    }

    if app.show_action_menu {
        overlays::action_menu::render(
            frame,
            &ACTION_MENU_ITEMS,
            &mut app.action_menu_state,
            constants::TITLE_ACTIONS,
        );
    }

    // Render toast notification if present
    if app.toast.is_some() {
        overlays::toast::render(frame, app);
    }
}
