pub mod ascii_preview;
pub mod kiosk;
pub mod presenter;

pub use ascii_preview::{AsciiRenderer, clear_screen};
pub use presenter::Presenter;
