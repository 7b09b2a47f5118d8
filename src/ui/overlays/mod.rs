//! Popups drawn over the dashboard.

pub mod action_menu;
pub mod config_viewer;
pub mod toast;
