//! Background jobs and their UI-thread dispatcher

pub mod convert;
pub mod dispatcher;
pub mod media_check;

pub use convert::ConvertTask;
pub use dispatcher::{BackgroundTask, UiDispatcher};
pub use media_check::{ScanTask, TrashTask, check_media};
