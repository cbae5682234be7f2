use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

use super::Migrator;
use crate::model::trello::Attachment;

pub const MAX_DISPLAY_NAME_LEN: usize = 200;
pub const MAX_PATH_LEN: usize = 255;
const FALLBACK_NAME: &str = "attachment";

#[derive(Debug, Clone)]
pub struct AttachmentOptions {
    pub add_date_to_filename: bool,
    pub timezone: Tz,
    pub scratch_dir: PathBuf,
}

/// Prefer the attachment's title, then its URL-encoded file name.
pub fn display_name(attachment: &Attachment) -> String {
    if let Some(name) = attachment.name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    match attachment.file_name.as_deref().filter(|n| !n.is_empty()) {
        Some(raw) => urlencoding::decode(raw)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw.to_string()),
        None => FALLBACK_NAME.to_string(),
    }
}

pub fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_DISPLAY_NAME_LEN {
        return name.to_string();
    }
    let mut truncated: String = name.chars().take(MAX_DISPLAY_NAME_LEN).collect();
    truncated.push_str("...");
    truncated
}

/// Split at the last dot of the final component. Leading dots belong to the
/// stem, so `.env` has no extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    let stem_start = file_name.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    let last = &file_name[stem_start..];
    let leading_dots = last.len() - last.trim_start_matches('.').len();
    match last[leading_dots..].rfind('.') {
        Some(i) => file_name.split_at(stem_start + leading_dots + i),
        None => (file_name, ""),
    }
}

/// Collapse a name into a single path component: separators and NUL become
/// underscores, and a name that could walk up (`..`, `...`) loses its
/// leading dots.
fn flatten_component(name: &str) -> String {
    let flat: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    if flat.trim_matches('.').is_empty() {
        return FALLBACK_NAME.to_string();
    }
    if flat.starts_with("..") {
        let dots = flat.len() - flat.trim_start_matches('.').len();
        return format!("{}{}", "_".repeat(dots), &flat[dots..]);
    }
    flat
}

/// ASCII-only base name with underscores for spaces; the extension is kept.
/// The result is always a single file name component.
pub fn transliterate_filename(file_name: &str) -> String {
    let flat = flatten_component(file_name);
    let (base, ext) = split_extension(&flat);
    let ascii = deunicode::deunicode(base).replace(' ', "_");
    flatten_component(&format!("{ascii}{ext}"))
}

fn parse_utc(timestamp: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(timestamp.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
}

/// `DD-MM-YYYY HH-MM` in the operator's timezone; safe inside file names.
pub fn format_created_at(timestamp: &str, tz: Tz) -> Result<String, chrono::ParseError> {
    let utc = parse_utc(timestamp)?;
    Ok(utc.with_timezone(&tz).format("%d-%m-%Y %H-%M").to_string())
}

pub fn with_created_at(file_name: &str, formatted: &str) -> String {
    let (base, ext) = split_extension(file_name);
    format!("{base}_(created_at_{formatted}){ext}")
}

#[derive(Debug, PartialEq, Eq)]
pub enum ScratchPathError {
    /// Longer than what common filesystems accept.
    TooLong,
    /// The name did not resolve to a direct child of the scratch directory.
    OutsideScratchDir,
}

pub fn scratch_path(dir: &Path, file_name: &str) -> Result<PathBuf, ScratchPathError> {
    let path = dir.join(file_name);
    if path.parent() != Some(dir) || path.file_name().is_none() {
        return Err(ScratchPathError::OutsideScratchDir);
    }
    if path.to_string_lossy().chars().count() > MAX_PATH_LEN {
        return Err(ScratchPathError::TooLong);
    }
    Ok(path)
}

/// Local cleanup failures never abort an upload.
async fn remove_scratch(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "failed to remove scratch file: {e}");
        }
    }
}

impl Migrator {
    /// Final local file name for an attachment, logging a date that cannot
    /// be parsed.
    pub(crate) fn attachment_file_name(&self, attachment: &Attachment, raw_name: &str) -> String {
        let file_name = transliterate_filename(raw_name);
        let options = &self.options.attachments;
        let Some(created_at) = attachment.date.as_deref().filter(|_| options.add_date_to_filename)
        else {
            return file_name;
        };
        match format_created_at(created_at, options.timezone) {
            Ok(formatted) => with_created_at(&file_name, &formatted),
            Err(e) => {
                self.log(&format!(
                    "Date processing error {created_at} for file {file_name}, leave original name: {e}"
                ));
                file_name
            }
        }
    }

    /// Copy every attachment of a Trello card onto the Planka card, then
    /// point the Planka cover at the copy of the Trello cover. Returns the
    /// number of attachments uploaded.
    pub async fn migrate_attachments(
        &self,
        planka_card_id: &str,
        trello_card_id: &str,
    ) -> Result<usize> {
        let attachments = self
            .source
            .attachments(trello_card_id)
            .await
            .with_context(|| format!("Failed to list attachments of card {trello_card_id}"))?;
        let cover_id = self
            .source
            .cover_attachment_id(trello_card_id)
            .await
            .with_context(|| format!("Failed to read cover of card {trello_card_id}"))?;

        if attachments.is_empty() {
            self.log("There are no attachments for the card, nothing has been uploaded");
            return Ok(0);
        }

        let mut uploaded: HashMap<String, String> = HashMap::new();

        for attachment in &attachments {
            let mut raw_name = display_name(attachment);
            raw_name = truncate_name(&raw_name);
            let file_name = self.attachment_file_name(attachment, &raw_name);

            let path = match scratch_path(&self.options.attachments.scratch_dir, &file_name) {
                Ok(path) => path,
                Err(ScratchPathError::TooLong) => {
                    self.log(&format!(
                        "Error: File '{raw_name}' has exceeded the path length limit after processing and will be skipped"
                    ));
                    continue;
                }
                Err(ScratchPathError::OutsideScratchDir) => {
                    self.log(&format!(
                        "Error: File '{raw_name}' does not resolve inside the scratch directory and will be skipped"
                    ));
                    continue;
                }
            };

            if let Some(date) = &attachment.date {
                self.log(&format!(
                    "The original date the file was uploaded to Trello: {date}"
                ));
            }

            if let Err(e) = self
                .source
                .download_attachment(trello_card_id, &attachment.id, &raw_name, &path)
                .await
            {
                self.log(&format!("Download error from Trello {raw_name}: {e}"));
                remove_scratch(&path).await;
                continue;
            }

            let result = self.dest.create_attachment(planka_card_id, &path).await;
            remove_scratch(&path).await;
            match result {
                Ok(created) => {
                    self.pacer.pause().await;
                    uploaded.insert(attachment.id.clone(), created.id);
                    self.log(&format!(
                        "The attachment {file_name} has been uploaded to the card"
                    ));
                }
                Err(e) => {
                    self.log(&format!("Upload error to Planka {file_name}: {e}"));
                }
            }
        }

        let planka_cover = cover_id
            .as_ref()
            .and_then(|id| uploaded.get(id))
            .map(String::as_str);
        self.dest
            .update_card_cover(planka_card_id, planka_cover)
            .await
            .with_context(|| format!("Failed to set cover of Planka card {planka_card_id}"))?;
        self.pacer.pause().await;
        match planka_cover {
            Some(_) => self.log("Transferred and installed the card cover"),
            None => self.log("The card has no migrated cover, cover cleared"),
        }

        Ok(uploaded.len())
    }
}
