pub mod coordinator;
pub mod downloader;
pub mod launcher;
pub mod process_watcher;
pub mod ui_port;

pub use coordinator::Coordinator;
pub use ui_port::{ChannelUi, LauncherUi, UiEvent};
