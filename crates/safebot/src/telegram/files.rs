//! File uploads and retrieval.
//!
//! Any document/photo/video/audio/voice message from an authenticated user
//! stores its metadata in the vault. When the upload-file wizard is waiting
//! on its file step the upload feeds the wizard (description and tags are
//! asked next); otherwise the caption becomes the description directly and
//! the entry is saved in one shot.

use safecore::error::AppResult;
use safecore::storage::vault::NewFile;
use safecore::validation;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};

use super::handlers::HandlerDeps;
use super::wizard::file::{FileWizard, MediaMeta};
use super::{formatters, keyboard, markdown};

/// Extracts file metadata from a media message.
pub fn extract_media_meta(msg: &Message) -> Option<MediaMeta> {
    if let Some(document) = msg.document() {
        let file_id = document.file.id.0.clone();
        return Some(MediaMeta {
            file_name: document
                .file_name
                .clone()
                .unwrap_or_else(|| format!("document_{:.8}", file_id)),
            mime_type: document
                .mime_type
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            file_size: i64::from(document.file.size),
            telegram_file_id: file_id,
        });
    }
    if let Some(photos) = msg.photo() {
        // Telegram sends several resolutions; keep the largest
        let photo = photos.last()?;
        return Some(MediaMeta {
            file_name: format!("photo_{:.8}.jpg", photo.file.id.0),
            mime_type: "image/jpeg".to_string(),
            file_size: i64::from(photo.file.size),
            telegram_file_id: photo.file.id.0.clone(),
        });
    }
    if let Some(video) = msg.video() {
        let file_id = video.file.id.0.clone();
        return Some(MediaMeta {
            file_name: video
                .file_name
                .clone()
                .unwrap_or_else(|| format!("video_{:.8}.mp4", file_id)),
            mime_type: video
                .mime_type
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "video/mp4".to_string()),
            file_size: i64::from(video.file.size),
            telegram_file_id: file_id,
        });
    }
    if let Some(audio) = msg.audio() {
        let file_id = audio.file.id.0.clone();
        return Some(MediaMeta {
            file_name: audio
                .file_name
                .clone()
                .unwrap_or_else(|| format!("audio_{:.8}.mp3", file_id)),
            mime_type: audio
                .mime_type
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "audio/mpeg".to_string()),
            file_size: i64::from(audio.file.size),
            telegram_file_id: file_id,
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(MediaMeta {
            file_name: format!("voice_{:.8}.ogg", voice.file.id.0),
            mime_type: voice
                .mime_type
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "audio/ogg".to_string()),
            file_size: i64::from(voice.file.size),
            telegram_file_id: voice.file.id.0.clone(),
        });
    }
    None
}

/// Endpoint for media messages.
pub async fn handle_media_upload(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let chat_id = msg.chat.id;
    let telegram_id = chat_id.0;

    let Some(user_id) = deps.auth_user(telegram_id) else {
        bot.send_message(chat_id, "❌ Please /start and authenticate first.").await?;
        return Ok(());
    };
    let Some(meta) = extract_media_meta(msg) else {
        bot.send_message(chat_id, "❌ Unsupported file type.").await?;
        return Ok(());
    };

    // An active upload wizard waiting for its file takes precedence
    if FileWizard::handle_upload(bot, chat_id, deps, telegram_id, &meta).await? {
        return Ok(());
    }

    if let Err(reason) = validation::validate_file_name(&meta.file_name) {
        bot.send_message(chat_id, format!("❌ {}", reason)).await?;
        return Ok(());
    }

    // Direct upload: caption doubles as description + tag source
    let description = msg.caption().unwrap_or_default().to_string();
    let tags = validation::parse_tags(&description);
    let file = NewFile {
        telegram_file_id: meta.telegram_file_id.clone(),
        file_name: meta.file_name.clone(),
        mime_type: meta.mime_type.clone(),
        file_size: meta.file_size,
        encrypted_description: deps.crypto.encrypt(&description)?,
        tags: tags.clone(),
    };

    match deps.vault.save_file(user_id, file).await {
        Ok(saved) => {
            let tags_line = if tags.is_empty() { "None".to_string() } else { tags.join(", ") };
            let text = format!(
                "✅ *File Saved\\!*\n\n📎 {}\nSize: {}\nTags: {}",
                markdown::escape(&saved.file_name),
                markdown::escape(&formatters::format_file_size(saved.file_size)),
                markdown::escape(&tags_line)
            );
            let kb = keyboard::markup(vec![vec![
                keyboard::cb("👁️ View List", &safecore::callback::Callback::FileList { page: 0, filter: None }),
                keyboard::cb("⬆️ Upload Another", &safecore::callback::Callback::FileUploadStart),
            ]]);
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(kb)
                .await?;

            // Keep the chat clean (and private) once the metadata is stored
            if let Err(e) = bot.delete_message(chat_id, msg.id).await {
                log::warn!("Could not delete uploaded file message: {}", e);
            }
        }
        Err(e) => {
            log::error!("Failed to save file for user {}: {}", telegram_id, e);
            bot.send_message(chat_id, "❌ Failed to save file. Please try again.").await?;
        }
    }
    Ok(())
}

/// Re-sends a stored file to the chat, picking the send method by type.
pub async fn send_stored_file(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user_id: uuid::Uuid,
    file_id: &str,
) -> AppResult<()> {
    use safecore::storage::FileCategory;

    let entry = super::menu::views::find_file(deps, user_id, file_id).await?;
    let input = InputFile::file_id(teloxide::types::FileId(entry.telegram_file_id.clone()));
    let caption = format!("📎 {}", entry.file_name);

    match entry.category() {
        FileCategory::Image => {
            bot.send_photo(chat_id, input).caption(caption).await?;
        }
        FileCategory::Video => {
            bot.send_video(chat_id, input).caption(caption).await?;
        }
        FileCategory::Audio => {
            bot.send_audio(chat_id, input).caption(caption).await?;
        }
        FileCategory::Document => {
            bot.send_document(chat_id, input).caption(caption).await?;
        }
    }
    Ok(())
}
