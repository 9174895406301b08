pub mod console;

use iced::{
    widget::{button, column, progress_bar, text, text_input, Space},
    Color, Element, Length,
};

use crate::application::UiEvent;
use crate::domain::{Field, ProcessHandle, Progress};
use crate::utils::{validate_process_name, validate_url};

/// Bar advance per tick while the size is unknown.
const BUSY_STEP: f32 = 4.0;

const ERROR_COLOR: Color = Color {
    r: 0.8,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// Main view state
pub struct LauncherView {
    pub url: String,
    pub process_name: String,
    pub url_error: String,
    pub process_error: String,
    /// `None` while the size is unknown.
    pub download_progress: Option<f32>,
    /// Sweeping bar position shown instead of a percentage.
    pub busy_phase: f32,
    pub status_message: String,
    pub is_running: bool,
    pub watching: Option<ProcessHandle>,
}

impl Default for LauncherView {
    fn default() -> Self {
        Self {
            url: String::new(),
            process_name: String::new(),
            url_error: String::new(),
            process_error: String::new(),
            download_progress: Some(0.0),
            busy_phase: 0.0,
            status_message: "Enter a download URL and a process name".to_string(),
            is_running: false,
            watching: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum LauncherMessage {
    UrlChanged(String),
    ProcessNameChanged(String),
    StartPressed,
}

impl LauncherView {
    /// Form pre-filled from the command line.
    pub fn with_input(url: String, process_name: String) -> Self {
        let mut view = Self {
            url,
            process_name,
            ..Self::default()
        };
        view.validate();
        view
    }

    pub fn update(&mut self, message: LauncherMessage) {
        match message {
            LauncherMessage::UrlChanged(url) => {
                self.url = url;
                self.validate();
            }
            LauncherMessage::ProcessNameChanged(name) => {
                self.process_name = name;
                self.validate();
            }
            LauncherMessage::StartPressed => {
                // Will be handled by the app
            }
        }
    }

    /// Refresh inline messages. Empty fields stay quiet until typed into.
    pub fn validate(&mut self) {
        self.url_error = if self.url.is_empty() {
            String::new()
        } else {
            validate_url(&self.url).err().map(|e| e.message).unwrap_or_default()
        };
        self.process_error = if self.process_name.is_empty() {
            String::new()
        } else {
            validate_process_name(&self.process_name)
                .err()
                .map(|e| e.message)
                .unwrap_or_default()
        };
    }

    pub fn can_start(&self) -> bool {
        !self.is_running
            && !self.url.is_empty()
            && !self.process_name.is_empty()
            && self.url_error.is_empty()
            && self.process_error.is_empty()
    }

    /// Move the busy indicator one step. No-op while a percentage is known.
    pub fn advance_busy(&mut self) {
        if self.download_progress.is_none() {
            self.busy_phase = (self.busy_phase + BUSY_STEP) % 100.0;
        }
    }

    /// Apply one event from the running coordinator.
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Progress(Progress::Percent(percent)) => {
                self.download_progress = Some(f32::from(percent));
                self.status_message = if percent >= 100 {
                    "Download complete, starting...".to_string()
                } else {
                    format!("Downloading: {}%", percent)
                };
            }
            UiEvent::Progress(Progress::Indeterminate) => {
                self.download_progress = None;
                self.status_message = "Downloading (size unknown)...".to_string();
            }
            UiEvent::ValidationFailed(error) => {
                self.is_running = false;
                match error.field {
                    Field::Url => self.url_error = error.message,
                    Field::ProcessName => self.process_error = error.message,
                }
            }
            UiEvent::ProcessFound(handle) => {
                self.status_message = format!(
                    "Watching {} (PID {}). The download is removed when it exits.",
                    handle.matched_name, handle.pid
                );
                self.watching = Some(handle);
            }
            UiEvent::Fatal(message) => {
                self.is_running = false;
                self.download_progress = Some(0.0);
                self.status_message = format!("Download failed: {}", message);
            }
        }
    }

    pub fn view(&self) -> Element<'_, LauncherMessage> {
        if let Some(handle) = &self.watching {
            return column![
                text("App Launcher").size(20),
                text(format!("Watching {}", handle.matched_name)).size(14),
                text(format!("PID {}", handle.pid)).size(12),
            ]
            .padding(20)
            .spacing(6)
            .into();
        }

        let mut url_input = text_input("https://example.com/setup.exe", &self.url).padding(10);
        let mut process_input = text_input("Process name or part of it", &self.process_name).padding(10);
        if !self.is_running {
            url_input = url_input.on_input(LauncherMessage::UrlChanged);
            process_input = process_input.on_input(LauncherMessage::ProcessNameChanged);
        }

        let mut start = button("Start download").padding([10, 20]);
        if self.can_start() {
            start = start.on_press(LauncherMessage::StartPressed);
        }

        column![
            text("Download from URL:").size(16),
            url_input,
            text(&self.url_error).size(12).color(ERROR_COLOR),
            text("The process name is or contains:").size(16),
            process_input,
            text(&self.process_error).size(12).color(ERROR_COLOR),
            Space::new().height(Length::Fixed(10.0)),
            progress_bar(0.0..=100.0, self.download_progress.unwrap_or(self.busy_phase)),
            text(&self.status_message).size(14),
            start,
        ]
        .padding(20)
        .spacing(8)
        .into()
    }
}
