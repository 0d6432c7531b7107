use serenity::{
    all::{Colour, Timestamp},
    builder::{CreateEmbed, CreateEmbedFooter},
};
use std::time::Duration;

use crate::{
    audio::{track::AudioTrack, QueueState},
    cmd::{registry::CommandDescriptor, CommandRegistry, ParamKind},
    error::UserError,
};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const WARNING_ORANGE: Colour = Colour::from_rgb(255, 193, 7);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🦄 Pony Bot";

/// Respuesta a enviar al chat.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Embed(EmbedReply),
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<EmbedReply> for Reply {
    fn from(embed: EmbedReply) -> Self {
        Reply::Embed(embed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Transport-independent embed. Converted to a serenity embed only when sent,
/// so replies can be inspected in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedReply {
    pub title: String,
    pub description: String,
    pub colour: Colour,
    pub fields: Vec<EmbedField>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub footer: Option<String>,
}

impl EmbedReply {
    pub fn new(title: impl Into<String>, description: impl Into<String>, colour: Colour) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            colour,
            fields: Vec::new(),
            url: None,
            thumbnail: None,
            footer: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn to_create_embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::default()
            .title(&self.title)
            .description(&self.description)
            .color(self.colour);

        for field in &self.fields {
            embed = embed.field(&field.name, &field.value, field.inline);
        }
        if let Some(url) = &self.url {
            embed = embed.url(url);
        }
        if let Some(thumbnail) = &self.thumbnail {
            embed = embed.thumbnail(thumbnail);
        }

        embed
            .footer(CreateEmbedFooter::new(
                self.footer.as_deref().unwrap_or(STANDARD_FOOTER),
            ))
            .timestamp(Timestamp::now())
    }
}

/// Embed de error para el usuario
pub fn user_error(err: &UserError) -> EmbedReply {
    EmbedReply::new(err.title(), err.description(), colors::ERROR_RED)
}

pub fn success(title: &str, description: impl Into<String>) -> EmbedReply {
    EmbedReply::new(title, description, colors::SUCCESS_GREEN)
}

pub fn info(title: &str, description: impl Into<String>) -> EmbedReply {
    EmbedReply::new(title, description, colors::INFO_BLUE)
}

fn requested_by(track: &AudioTrack) -> String {
    match track.duration() {
        Some(duration) => format!(
            "ordered by {}, duration: {}",
            track.order().requester_name,
            format_duration(duration)
        ),
        None => format!("ordered by {}, live", track.order().requester_name),
    }
}

pub fn track_scheduled(track: &AudioTrack, index: usize) -> EmbedReply {
    EmbedReply::new(
        "✅ Track scheduled",
        format!("Track {} was scheduled to be `#{}` in the queue.", track.to_md(), index),
        colors::SUCCESS_GREEN,
    )
    .thumbnail(track.metadata().thumbnail.clone())
    .footer(requested_by(track))
}

pub fn now_playing(track: &AudioTrack, current_bitrate_kbps: u32) -> EmbedReply {
    let original = track
        .metadata()
        .bitrate_kbps
        .map(|kbps| format!("{} kbps", kbps))
        .unwrap_or_else(|| "unknown".to_string());

    EmbedReply::new(
        "🎵 Now playing",
        format!("Now playing {}", track.to_md()),
        colors::MUSIC_PURPLE,
    )
    .field("Original bitrate", format!("`{}`", original), true)
    .field("Current bitrate", format!("`{} kbps`", current_bitrate_kbps), true)
    .url(&track.metadata().url)
    .thumbnail(track.metadata().thumbnail.clone())
    .footer(requested_by(track))
}

pub fn track_finished(track: &AudioTrack) -> EmbedReply {
    EmbedReply::new(
        "🏁 Track finished",
        format!("Track {} has finished.", track.to_md()),
        colors::NEUTRAL_GRAY,
    )
    .footer(requested_by(track))
}

pub fn track_skipped(track: &AudioTrack) -> EmbedReply {
    EmbedReply::new(
        "⏭️ Track skipped",
        format!("Track {} was skipped.", track.to_md()),
        colors::WARNING_ORANGE,
    )
    .footer(requested_by(track))
}

pub fn track_paused(track: &AudioTrack) -> EmbedReply {
    info("⏸️ Paused", format!("Track {} was set on pause.", track.to_md()))
}

pub fn track_resumed(track: &AudioTrack) -> EmbedReply {
    info("▶️ Resumed", format!("Track {} was resumed.", track.to_md()))
}

pub fn track_failed(track: &AudioTrack, err: &UserError) -> EmbedReply {
    EmbedReply::new(
        err.title(),
        format!("Track {} could not be played.\n{}", track.to_md(), err.description()),
        colors::ERROR_RED,
    )
    .footer(requested_by(track))
}

pub fn connected_to_voice(track: &AudioTrack) -> EmbedReply {
    info(
        "🔊 Connected",
        format!(
            "Connected to voice channel <#{}>.",
            track.voice_target().channel_id
        ),
    )
}

/// Listado de la cola: el track activo y los programados.
pub fn queue_listing(
    tracks: &[std::sync::Arc<AudioTrack>],
    state: QueueState,
    played: Option<Duration>,
) -> EmbedReply {
    let Some((active, scheduled)) = tracks.split_first() else {
        return info("📭 Queue", "Audio queue is empty.");
    };

    let marker = if state == QueueState::Paused {
        "Active (paused)"
    } else {
        "Active"
    };
    let progress = match (played, active.duration()) {
        (Some(played), Some(total)) => {
            format!("{} / {}", format_duration(played), format_duration(total))
        }
        (Some(played), None) => format!("{} / live", format_duration(played)),
        (None, Some(total)) => format!("0:00 / {}", format_duration(total)),
        (None, None) => "live".to_string(),
    };

    let mut embed = EmbedReply::new(
        "🎶 Audio queue",
        format!("{} {}", marker, active.to_md()),
        colors::MUSIC_PURPLE,
    )
    .footer(format!(
        "ordered by {} ({})",
        active.order().requester_name,
        progress
    ));

    for (i, track) in scheduled.iter().enumerate() {
        embed = embed.field(
            format!("#{}", i + 1),
            format!("{}\n{}", track.to_md(), requested_by(track)),
            false,
        );
    }
    embed
}

/// Lista de comandos con su plantilla de uso.
pub fn help_list(registry: &CommandRegistry, prefix: &str) -> EmbedReply {
    let usages: Vec<String> = registry
        .descriptors()
        .map(|descriptor| descriptor.usage_template(prefix))
        .collect();

    info("📖 Commands", usages.join("\n")).footer(format!(
        "Use {}help <command> for details",
        prefix
    ))
}

pub fn help_detail(descriptor: &CommandDescriptor, prefix: &str) -> EmbedReply {
    let mut embed = info(
        &format!("📖 {}", descriptor.name()),
        descriptor.description().to_string(),
    )
    .field("Usage", descriptor.usage_template(prefix), false);

    if descriptor.aliases().len() > 1 {
        let aliases: Vec<String> = descriptor
            .aliases()
            .iter()
            .map(|alias| format!("`{}`", alias))
            .collect();
        embed = embed.field("Aliases", aliases.join(", "), true);
    }

    if let Some(tracker) = descriptor.cooldown() {
        embed = embed.field(
            "Cooldown",
            humantime::format_duration(tracker.cooldown()).to_string(),
            true,
        );
    }

    if let Some(schema) = descriptor.schema() {
        let params: Vec<String> = schema
            .definition()
            .iter()
            .enumerate()
            .map(|(i, def)| {
                format!(
                    "`{}`{} {}",
                    schema.param_usage(i),
                    describe_kind(&def.kind),
                    def.description
                )
            })
            .collect();
        if !params.is_empty() {
            embed = embed.field("Parameters", params.join("\n"), false);
        }
    }
    embed
}

fn describe_kind(kind: &ParamKind) -> String {
    match kind {
        ParamKind::Text => String::new(),
        ParamKind::Integer { min, max } => describe_range(*min, *max),
        ParamKind::Number { min, max } => describe_range(*min, *max),
        ParamKind::Boolean => " (yes/no)".to_string(),
        ParamKind::OneOf(values) => format!(" ({})", values.join("|")),
    }
}

fn describe_range<T: std::fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!(" ({}..{})", min, max),
        (Some(min), None) => format!(" (>= {})", min),
        (None, Some(max)) => format!(" (<= {})", max),
        (None, None) => String::new(),
    }
}

/// Formatea una duración en formato legible
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::fixtures;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn track(title: &str) -> Arc<AudioTrack> {
        let resolved = fixtures::resolved(title);
        Arc::new(AudioTrack::from_parts(
            fixtures::order(title),
            resolved.metadata,
            resolved.source,
        ))
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(59)), "0:59");
        assert_eq!(format_duration(Duration::from_secs(754)), "12:34");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1:02:03");
    }

    #[test]
    fn test_user_error_embed() {
        let embed = user_error(&UserError::NotPaused("Track x was not paused.".into()));
        assert_eq!(embed.title, "Audio is not paused error.");
        assert_eq!(embed.description, "Track x was not paused.");
        assert_eq!(embed.colour, colors::ERROR_RED);
    }

    #[test]
    fn test_scheduled_embed_mentions_index() {
        let track = track("Cupcakes");
        let embed = track_scheduled(&track, 3);
        assert!(embed.description.ends_with("was scheduled to be `#3` in the queue."));
        assert!(embed.description.contains(&track.to_md()));
    }

    #[test]
    fn test_empty_queue_listing() {
        let embed = queue_listing(&[], QueueState::Idle, None);
        assert_eq!(embed.description, "Audio queue is empty.");
    }

    #[test]
    fn test_queue_listing_marks_pause_and_indexes() {
        let tracks = vec![track("a"), track("b"), track("c")];
        let embed = queue_listing(&tracks, QueueState::Paused, Some(Duration::from_secs(65)));

        assert!(embed.description.starts_with("Active (paused) "));
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["#1", "#2"]);
        assert!(embed.footer.as_deref().is_some_and(|f| f.contains("1:05")));
    }

    #[test]
    fn test_reply_conversions() {
        assert_eq!(Reply::from("hi"), Reply::Text("hi".into()));
        let embed = info("t", "d");
        assert_eq!(Reply::from(embed.clone()), Reply::Embed(embed));
    }
}
