use base64::Engine;
use chrono::{Local, TimeZone};
use iced::widget::{column, container, image, text};
use iced::{Element, Length};
use iced_aw::Wrap;
use std::collections::HashMap;

use crate::state::data::StoredImage;
use crate::Message;

/// Size of a gallery tile (square)
const TILE_SIZE: f32 = 192.0;

/// Decode a `data:<mime>;base64,<payload>` URL into raw image bytes
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let (meta, payload) = url.strip_prefix("data:")?.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()
}

/// Build an image handle for a stored payload, if it decodes
pub fn handle_for(url: &str) -> Option<image::Handle> {
    decode_data_url(url).map(image::Handle::from_bytes)
}

/// Format a gallery timestamp, e.g. "Oct 18, 2026 9:05 PM"
fn format_timestamp_in<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_millis_opt(millis)
        .single()
        .map(|time| time.format("%b %-d, %Y %-I:%M %p").to_string())
}

fn format_timestamp(millis: i64) -> String {
    format_timestamp_in(millis, &Local).unwrap_or_default()
}

/// Build the gallery grid, newest first
pub fn view<'a>(
    images: &'a [StoredImage],
    thumbnails: &'a HashMap<i64, image::Handle>,
    loading: bool,
) -> Element<'a, Message> {
    let title = text("Ghost Gallery").size(28);

    if loading {
        return column![title, text("Summoning the gallery...").size(14)]
            .spacing(12)
            .into();
    }

    if images.is_empty() {
        return column![].into();
    }

    let tiles: Vec<Element<'a, Message>> = images
        .iter()
        .map(|stored| {
            let picture: Element<'a, Message> = match thumbnails.get(&stored.id) {
                Some(handle) => image(handle.clone())
                    .width(Length::Fixed(TILE_SIZE))
                    .height(Length::Fixed(TILE_SIZE))
                    .into(),
                None => container(text("Unreadable image").size(12))
                    .width(Length::Fixed(TILE_SIZE))
                    .height(Length::Fixed(TILE_SIZE))
                    .center_x(Length::Fixed(TILE_SIZE))
                    .center_y(Length::Fixed(TILE_SIZE))
                    .into(),
            };

            container(column![picture, text(format_timestamp(stored.timestamp)).size(12)].spacing(4))
                .padding(6)
                .into()
        })
        .collect();

    column![title, Wrap::with_elements(tiles)]
        .spacing(12)
        .into()
}
