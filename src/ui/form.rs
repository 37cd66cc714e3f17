use iced::widget::{button, column, row, text, text_input};
use iced::{Element, Length};

use crate::state::data::{ProfileData, ProfileField};
use crate::Message;

/// Build the profile form
///
/// Suggestion buttons are disabled while any suggestion is running, and
/// the submit button while a submission is in flight or the required
/// fields are empty.
pub fn view<'a>(
    profile: &'a ProfileData,
    busy: bool,
    suggesting: Option<ProfileField>,
) -> Element<'a, Message> {
    let mut form = column![
        text("Summon Your Digital Ghost").size(24),
        text("Fill in the details below to analyze your digital soul.").size(14),
        text("Username").size(14),
        text_input("e.g., @spectral_user", &profile.username)
            .on_input(Message::UsernameChanged)
            .padding(8),
    ]
    .spacing(8)
    .width(Length::Fill);

    for field in ProfileField::ALL {
        let icon = if suggesting == Some(field) { "…" } else { "✨" };
        let suggest = button(text(icon))
            .on_press_maybe(suggesting.is_none().then_some(Message::Suggest(field)))
            .padding(8);

        form = form.push(text(field.label()).size(14)).push(
            row![
                text_input(field.placeholder(), profile.field(field))
                    .on_input(move |value| Message::FieldChanged(field, value))
                    .padding(8),
                suggest,
            ]
            .spacing(6),
        );
    }

    let label = if busy { "Conjuring..." } else { "Analyze & Create Ghost" };
    let submit = button(text(label))
        .on_press_maybe((!busy && profile.is_submittable()).then_some(Message::Submit))
        .padding(10)
        .width(Length::Fill);

    form.push(submit).into()
}
