use iced::{window, Subscription, Task};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::application::{ui_port, ChannelUi, Coordinator, UiEvent};
use crate::config::LauncherConfig;
use crate::domain::{RunOutcome, RunRequest};
use crate::ui::{LauncherMessage, LauncherView};

pub struct LauncherApp {
    view: LauncherView,
    config: LauncherConfig,
    // Present while a run is in flight
    events: Option<mpsc::UnboundedReceiver<UiEvent>>,
    cancel: Option<CancellationToken>,
}

impl LauncherApp {
    pub fn new(config: LauncherConfig, url: String, process_name: String) -> Self {
        Self {
            view: LauncherView::with_input(url, process_name),
            config,
            events: None,
            cancel: None,
        }
    }

    fn start_run(&mut self) -> Task<Message> {
        let request = RunRequest {
            url: self.view.url.clone(),
            process_filter: self.view.process_name.clone(),
        };

        let coordinator = match Coordinator::from_config(self.config.clone()) {
            Ok(coordinator) => coordinator,
            Err(e) => {
                error!(error = %e, "Failed to set up HTTP client");
                self.view.status_message = format!("Download failed: {}", e);
                return Task::none();
            }
        };

        let (ui, rx) = ChannelUi::new();
        let cancel = CancellationToken::new();
        self.events = Some(rx);
        self.cancel = Some(cancel.clone());
        self.view.is_running = true;
        self.view.status_message = "Connecting...".to_string();

        // iced Task::perform runs in the background tokio executor
        Task::perform(
            async move { coordinator.run(request, &ui, cancel).await },
            Message::RunFinished,
        )
    }

    fn drain_events(&mut self) {
        if let Some(rx) = self.events.as_mut() {
            for event in ui_port::drain(rx) {
                self.view.apply(event);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(LauncherMessage),
    /// Periodic refresh while a run is in flight
    Tick,
    RunFinished(RunOutcome),
    CloseRequested,
}

pub fn update(app: &mut LauncherApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(LauncherMessage::StartPressed) => {
            if app.view.can_start() {
                return app.start_run();
            }
        }
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg);
        }
        Message::Tick => {
            app.drain_events();
            app.view.advance_busy();
        }
        Message::RunFinished(outcome) => {
            app.drain_events();
            app.events = None;
            app.cancel = None;

            match outcome {
                RunOutcome::Completed => {
                    info!("Shutting down");
                    return iced::exit();
                }
                RunOutcome::Cancelled => {
                    app.view.is_running = false;
                    app.view.status_message = "Cancelled".to_string();
                }
                RunOutcome::Rejected | RunOutcome::Failed(_) => {
                    // Details already arrived as events
                    app.view.is_running = false;
                }
            }
        }
        Message::CloseRequested => {
            if let Some(cancel) = app.cancel.take() {
                info!("Window closed, cancelling run");
                cancel.cancel();
            }
            return iced::exit();
        }
    }
    Task::none()
}

pub fn view(app: &LauncherApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

pub fn subscription(app: &LauncherApp) -> Subscription<Message> {
    let close = window::close_requests().map(|_| Message::CloseRequested);

    if app.events.is_some() {
        Subscription::batch([
            close,
            iced::time::every(app.config.ui_tick).map(|_| Message::Tick),
        ])
    } else {
        close
    }
}
