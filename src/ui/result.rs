use iced::widget::{column, image, text};
use iced::{Color, Element, Length};

use crate::state::controller::{Phase, Snapshot};
use crate::Message;

const ERROR_COLOR: Color = Color::from_rgb(0.97, 0.44, 0.44);

/// Loading text for the current phase, with animated dots
fn loading_text(phase: Phase, frame: usize) -> Option<String> {
    let label = match phase {
        Phase::Idle => return None,
        Phase::Analyzing => "Analyzing digital soul",
        Phase::Creating => "Creating ghost image",
    };
    Some(format!("{}{}", label, ".".repeat(frame % 4)))
}

/// Build the result panel: loader, error, analysis and generated image
pub fn view<'a>(
    snapshot: &'a Snapshot,
    picture: Option<&'a image::Handle>,
    frame: usize,
) -> Element<'a, Message> {
    let mut panel = column![].spacing(12).width(Length::Fill);

    if let Some(loading) = loading_text(snapshot.phase, frame) {
        panel = panel.push(text(loading).size(16));
    }

    if let Some(error) = &snapshot.error {
        panel = panel.push(text(error).size(14).color(ERROR_COLOR));
    }

    if let Some(analysis) = &snapshot.analysis {
        panel = panel
            .push(text(&analysis.username).size(22))
            .push(text(&analysis.soul_description).size(16));
    }

    if let Some(handle) = picture {
        panel = panel.push(image(handle.clone()).width(Length::Fixed(384.0)));
    }

    if snapshot.phase == Phase::Idle && snapshot.analysis.is_none() && snapshot.error.is_none() {
        panel = panel.push(text("Your ghost will appear here.").size(14));
    }

    panel.into()
}
