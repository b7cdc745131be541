pub mod image_blob;
pub mod object_key;
pub mod session;
pub mod state;
pub mod submission;

pub use image_blob::ImageBlob;
pub use object_key::ObjectKey;
pub use session::{Kiosk, KioskEvents};
pub use state::{reduce, DisplayImage, Event, UiState};
