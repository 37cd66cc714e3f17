use iced::widget::{column, container, image, row, scrollable, text};
use iced::{Element, Length, Subscription, Task, Theme};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

mod ai;
mod config;
mod error;
mod state;
mod ui;

use ai::GeminiClient;
use config::{Config, ConfigError};
use error::SoulError;
use state::controller::{Collaborators, Controller, Snapshot, SubmitOutcome};
use state::data::{ProfileData, ProfileField};
use state::gallery::{Gallery, StoreError};

/// How often the UI refreshes while something is in flight
const TICK: Duration = Duration::from_millis(250);

/// Startup failures that keep the window from opening
#[derive(Debug, thiserror::Error)]
enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open the gallery: {0}")]
    Store(#[from] StoreError),
}

/// Main application state
struct DigitalSoul {
    controller: Controller,
    /// Form contents
    profile: ProfileData,
    /// Controller state as of the last message
    snapshot: Snapshot,
    /// Decoded gallery images, keyed by image id
    thumbnails: HashMap<i64, image::Handle>,
    /// Decoded result image and the payload it came from
    result_image: Option<(String, image::Handle)>,
    /// Animation frame for the loading text
    frame: usize,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    UsernameChanged(String),
    FieldChanged(ProfileField, String),
    /// User clicked a suggestion button
    Suggest(ProfileField),
    SuggestionReady(ProfileField, Option<String>),
    /// User clicked "Analyze & Create Ghost"
    Submit,
    SubmissionFinished(SubmitOutcome),
    GalleryLoaded(Result<usize, SoulError>),
    Tick,
}

impl DigitalSoul {
    /// Create a new instance of the application and start loading the gallery
    fn new(controller: Controller) -> (Self, Task<Message>) {
        let snapshot = controller.snapshot();
        let loader = controller.clone();

        (
            DigitalSoul {
                controller,
                profile: ProfileData::default(),
                snapshot,
                thumbnails: HashMap::new(),
                result_image: None,
                frame: 0,
            },
            Task::perform(
                async move { loader.load_gallery().await },
                Message::GalleryLoaded,
            ),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::UsernameChanged(value) => {
                self.profile.username = value;
                Task::none()
            }
            Message::FieldChanged(field, value) => {
                self.profile.set_field(field, value);
                Task::none()
            }
            Message::Suggest(field) => {
                let controller = self.controller.clone();
                Task::perform(
                    async move { (field, controller.suggest(field).await) },
                    |(field, suggestion)| Message::SuggestionReady(field, suggestion),
                )
            }
            Message::SuggestionReady(field, suggestion) => {
                if let Some(value) = suggestion {
                    self.profile.set_field(field, value);
                }
                Task::none()
            }
            Message::Submit => {
                if !self.profile.is_submittable() {
                    return Task::none();
                }
                let controller = self.controller.clone();
                let profile = self.profile.clone();
                Task::perform(
                    async move { controller.submit(profile).await },
                    Message::SubmissionFinished,
                )
            }
            Message::SubmissionFinished(outcome) => {
                // The controller logs every outcome; errors reach the view through the snapshot
                if let SubmitOutcome::Completed(image) = outcome {
                    if let Some(handle) = ui::gallery::handle_for(&image.url) {
                        self.thumbnails.insert(image.id, handle);
                    }
                }
                Task::none()
            }
            Message::GalleryLoaded(result) => {
                if let Ok(count) = result {
                    log::debug!("Gallery ready with {} images", count);
                }
                Task::none()
            }
            Message::Tick => {
                self.frame = self.frame.wrapping_add(1);
                Task::none()
            }
        };

        self.refresh();
        task
    }

    /// Copy the controller state and decode any new images
    fn refresh(&mut self) {
        self.snapshot = self.controller.snapshot();

        let gallery = &self.snapshot.gallery;
        self.thumbnails
            .retain(|id, _| gallery.iter().any(|image| image.id == *id));
        for stored in gallery {
            if !self.thumbnails.contains_key(&stored.id) {
                if let Some(handle) = ui::gallery::handle_for(&stored.url) {
                    self.thumbnails.insert(stored.id, handle);
                }
            }
        }

        self.result_image = match (&self.snapshot.image_url, self.result_image.take()) {
            (Some(url), Some((previous, handle))) if *url == previous => Some((previous, handle)),
            (Some(url), _) => ui::gallery::handle_for(url).map(|handle| (url.clone(), handle)),
            (None, _) => None,
        };
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let busy = self.snapshot.phase.is_busy();

        let header = column![
            text("Digital Soul Portrait").size(40),
            text("Unveil your online essence as a spectral illustration.").size(16),
        ]
        .spacing(6);

        let main = row![
            ui::form::view(&self.profile, busy, self.snapshot.suggesting),
            ui::result::view(
                &self.snapshot,
                self.result_image.as_ref().map(|(_, handle)| handle),
                self.frame,
            ),
        ]
        .spacing(32);

        let gallery = ui::gallery::view(
            &self.snapshot.gallery,
            &self.thumbnails,
            self.snapshot.gallery_loading,
        );

        let content = column![header, main, gallery].spacing(40).padding(40);

        container(scrollable(content))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Tick while a submission, suggestion or gallery load is running
    fn subscription(&self) -> Subscription<Message> {
        let snapshot = &self.snapshot;
        if snapshot.phase.is_busy() || snapshot.suggesting.is_some() || snapshot.gallery_loading {
            iced::time::every(TICK).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Resolve the configuration, open the gallery and wire up the controller
fn bootstrap() -> Result<(Controller, Arc<Gallery>), BootError> {
    let config = Config::from_env()?;
    log::info!("⚙️  {:?}", config);

    let gallery = Arc::new(Gallery::open(&config.db_path)?);
    log::info!(
        "🎨 Digital Soul initialized with {}/{} images",
        gallery.count().unwrap_or(0),
        gallery.capacity()
    );

    let client = Arc::new(GeminiClient::new(&config));
    let controller = Controller::new(Arc::clone(&gallery), Collaborators::from_single(client));
    Ok((controller, gallery))
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("digital_soul=info"),
    )
    .init();

    let (controller, gallery) = match bootstrap() {
        Ok(parts) => parts,
        Err(err) => {
            log::error!("❌ {}", err);
            std::process::exit(1);
        }
    };

    let result = iced::application("Digital Soul Portrait", DigitalSoul::update, DigitalSoul::view)
        .theme(DigitalSoul::theme)
        .subscription(DigitalSoul::subscription)
        .centered()
        .run_with(move || DigitalSoul::new(controller));

    // The app (and its controller) are gone once run_with returns
    match Arc::try_unwrap(gallery) {
        Ok(gallery) => {
            if let Err(err) = gallery.close() {
                log::warn!("Failed to close the gallery cleanly: {}", err);
            }
        }
        Err(_) => log::debug!("Gallery still shared at shutdown, leaving it to drop"),
    }

    result
}
