use tokio::sync::mpsc;

use crate::domain::{ProcessHandle, Progress, ValidationError};

/// What the run needs from whoever presents it.
pub trait LauncherUi: Send + Sync {
    fn report_progress(&self, progress: Progress);
    fn report_validation_error(&self, error: &ValidationError);
    fn notify_process_found(&self, handle: &ProcessHandle);
    fn notify_fatal_error(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Progress(Progress),
    ValidationFailed(ValidationError),
    ProcessFound(ProcessHandle),
    Fatal(String),
}

/// Forwards every call into a channel the GUI drains on its own tick.
#[derive(Clone)]
pub struct ChannelUi {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelUi {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: UiEvent) {
        // Receiver is gone once the window closed; nothing left to show.
        let _ = self.tx.send(event);
    }
}

impl LauncherUi for ChannelUi {
    fn report_progress(&self, progress: Progress) {
        self.send(UiEvent::Progress(progress));
    }

    fn report_validation_error(&self, error: &ValidationError) {
        self.send(UiEvent::ValidationFailed(error.clone()));
    }

    fn notify_process_found(&self, handle: &ProcessHandle) {
        self.send(UiEvent::ProcessFound(handle.clone()));
    }

    fn notify_fatal_error(&self, message: &str) {
        self.send(UiEvent::Fatal(message.to_string()));
    }
}

/// Take everything queued right now without waiting for more.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every call in order.
    #[derive(Default)]
    pub struct RecordingUi {
        events: Mutex<Vec<UiEvent>>,
    }

    impl RecordingUi {
        pub fn events(&self) -> Vec<UiEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn progress(&self) -> Vec<Progress> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    UiEvent::Progress(progress) => Some(progress),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, event: UiEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl LauncherUi for RecordingUi {
        fn report_progress(&self, progress: Progress) {
            self.push(UiEvent::Progress(progress));
        }

        fn report_validation_error(&self, error: &ValidationError) {
            self.push(UiEvent::ValidationFailed(error.clone()));
        }

        fn notify_process_found(&self, handle: &ProcessHandle) {
            self.push(UiEvent::ProcessFound(handle.clone()));
        }

        fn notify_fatal_error(&self, message: &str) {
            self.push(UiEvent::Fatal(message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_takes_what_is_queued() {
        let (ui, mut rx) = ChannelUi::new();
        assert!(drain(&mut rx).is_empty());

        ui.report_progress(Progress::Percent(10));
        ui.report_progress(Progress::Percent(20));
        ui.notify_fatal_error("boom");

        assert_eq!(
            drain(&mut rx),
            vec![
                UiEvent::Progress(Progress::Percent(10)),
                UiEvent::Progress(Progress::Percent(20)),
                UiEvent::Fatal("boom".to_string()),
            ]
        );
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (ui, rx) = ChannelUi::new();
        drop(rx);
        ui.report_progress(Progress::Indeterminate);
    }
}
