//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens:
//! - Dashboard with model and storage status
//! - Clinical intake form
//! - Prediction result

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
