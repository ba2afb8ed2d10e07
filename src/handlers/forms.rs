//! Shared event-form plumbing: reading the multipart body (text fields plus
//! the optional image) and validating the result. Create, edit and submit
//! all speak this form.

use std::path::Path;

use axum::extract::multipart::Multipart;
use chrono::NaiveDateTime;

use crate::upload::{self, StagedImage, UploadError, IMAGE_FIELD};
use crate::utils::datetime::parse_datetime_local;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields \
     (Event Name, Start Time, End Time, Location, Event Type).";
pub const END_BEFORE_START_MESSAGE: &str = "End time must be after start time.";

/// Raw form values, trimmed but otherwise as the user typed them, so a
/// failed validation can echo every field back into the form.
#[derive(Debug, Clone, Default)]
pub struct EventFormData {
    pub name: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub host: String,
    pub event_type_id: String,
    pub url: String,
    pub link_text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FormReadError {
    #[error("{0}")]
    Upload(#[from] UploadError),

    #[error("Unable to read the submitted form.")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

/// Walk the multipart body, collecting text fields and staging the image
/// if one was attached. A staged file is discarded before any error is
/// returned, so callers never inherit an orphan.
pub async fn read_event_form(
    mut multipart: Multipart,
    uploads_dir: &Path,
) -> Result<(EventFormData, Option<StagedImage>), FormReadError> {
    let mut form = EventFormData::default();
    let mut staged: Option<StagedImage> = None;

    let outcome: Result<(), FormReadError> = async {
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD {
                // Browsers send an empty file part when nothing was chosen.
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    continue;
                }
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                let image =
                    upload::stage_image(uploads_dir, &file_name, content_type.as_deref(), bytes)
                        .await?;
                if let Some(previous) = staged.replace(image) {
                    // Only one image per event; a repeated field keeps the
                    // last file, like the reference form.
                    previous.discard().await;
                }
                continue;
            }

            let value = field.text().await?.trim().to_string();
            match name.as_str() {
                "eventName" => form.name = value,
                "eventDescription" => form.description = value,
                "startTime" => form.start_time = value,
                "endTime" => form.end_time = value,
                "eventLocation" => form.location = value,
                "eventHost" => form.host = value,
                "eventTypeID" => form.event_type_id = value,
                "eventURL" => form.url = value,
                "eventLinkText" => form.link_text = value,
                _ => {}
            }
        }
        Ok(())
    }
    .await;

    match outcome {
        Ok(()) => Ok((form, staged)),
        Err(e) => {
            if let Some(image) = staged {
                image.discard().await;
            }
            Err(e)
        }
    }
}

/// A form that passed validation: required fields present, timestamps
/// parsed, end strictly after start.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    pub name: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub host: Option<String>,
    pub url: Option<String>,
    pub link_text: Option<String>,
    pub event_type_id: i32,
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Validate an event form. Submissions additionally require a description;
/// admin create/edit leave it optional.
pub fn validate_event_form(
    form: &EventFormData,
    require_description: bool,
) -> Result<ValidatedEvent, &'static str> {
    let start_time = parse_datetime_local(&form.start_time);
    let end_time = parse_datetime_local(&form.end_time);
    let event_type_id: Option<i32> = form.event_type_id.trim().parse().ok();

    let required_ok = !form.name.is_empty()
        && !form.location.is_empty()
        && start_time.is_some()
        && end_time.is_some()
        && event_type_id.is_some()
        && (!require_description || !form.description.is_empty());
    if !required_ok {
        return Err(REQUIRED_FIELDS_MESSAGE);
    }

    let (start_time, end_time) = (start_time.unwrap(), end_time.unwrap());
    if end_time <= start_time {
        return Err(END_BEFORE_START_MESSAGE);
    }

    Ok(ValidatedEvent {
        name: form.name.clone(),
        description: optional(&form.description),
        start_time,
        end_time,
        location: form.location.clone(),
        host: optional(&form.host),
        url: optional(&form.url),
        link_text: optional(&form.link_text),
        event_type_id: event_type_id.unwrap(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> EventFormData {
        EventFormData {
            name: "Spring Concert".to_string(),
            description: "Outdoor concert on the quad.".to_string(),
            start_time: "2026-05-01T18:00".to_string(),
            end_time: "2026-05-01T21:00".to_string(),
            location: "Main Quad".to_string(),
            host: "Music Club".to_string(),
            event_type_id: "2".to_string(),
            url: String::new(),
            link_text: String::new(),
        }
    }

    #[test]
    fn valid_form_passes() {
        let validated = validate_event_form(&filled_form(), true).unwrap();
        assert_eq!(validated.name, "Spring Concert");
        assert_eq!(validated.event_type_id, 2);
        assert_eq!(validated.host.as_deref(), Some("Music Club"));
        assert!(validated.url.is_none());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let strips: [fn(&mut EventFormData); 5] = [
            |f| f.name.clear(),
            |f| f.location.clear(),
            |f| f.start_time.clear(),
            |f| f.end_time.clear(),
            |f| f.event_type_id.clear(),
        ];
        for strip in strips {
            let mut form = filled_form();
            strip(&mut form);
            assert_eq!(
                validate_event_form(&form, false),
                Err(REQUIRED_FIELDS_MESSAGE),
                "expected rejection for {:?}",
                form
            );
        }
    }

    #[test]
    fn description_requirement_only_applies_to_submissions() {
        let mut form = filled_form();
        form.description.clear();
        assert!(validate_event_form(&form, false).is_ok());
        assert_eq!(validate_event_form(&form, true), Err(REQUIRED_FIELDS_MESSAGE));
    }

    #[test]
    fn end_at_or_before_start_is_rejected() {
        let mut form = filled_form();
        form.end_time = form.start_time.clone();
        assert_eq!(
            validate_event_form(&form, true),
            Err(END_BEFORE_START_MESSAGE)
        );

        form.end_time = "2026-05-01T17:00".to_string();
        assert_eq!(
            validate_event_form(&form, true),
            Err(END_BEFORE_START_MESSAGE)
        );
    }

    #[test]
    fn non_numeric_event_type_counts_as_missing() {
        let mut form = filled_form();
        form.event_type_id = "workshop".to_string();
        assert_eq!(
            validate_event_form(&form, true),
            Err(REQUIRED_FIELDS_MESSAGE)
        );
    }

    #[test]
    fn blank_optionals_become_none() {
        let mut form = filled_form();
        form.host = String::new();
        let validated = validate_event_form(&form, true).unwrap();
        assert!(validated.host.is_none());
        assert!(validated.link_text.is_none());
    }
}
