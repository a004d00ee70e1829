//! Card image generation for imported talks.

use std::path::PathBuf;

use sqlx::PgPool;
use talksync_cards::{AvatarCache, CardFormat, CardGenerator, CardSpeaker};
use talksync_core::AppConfig;
use talksync_db::TalkRow;

use super::context::{ImportContext, LogStyle, VerbosityLevel};

/// Everything card generation needs, bundled once per run. Absent entirely
/// when `--skip-images` is set.
pub(super) struct CardPipeline {
    generator: CardGenerator,
    cache: AvatarCache,
    http: reqwest::Client,
    assets_dir: PathBuf,
    media_root: PathBuf,
    format: CardFormat,
}

impl CardPipeline {
    /// Builds the pipeline. Fails when the card font is unconfigured,
    /// missing, or invalid — with images enabled that is a fatal
    /// misconfiguration, not something to skip past.
    pub(super) fn new(config: &AppConfig, format: CardFormat) -> anyhow::Result<Self> {
        let generator = CardGenerator::new(config.card_font.as_deref())?;
        Ok(Self {
            generator,
            cache: AvatarCache::new(config.media_root.join("avatars")),
            http: reqwest::Client::new(),
            assets_dir: config.assets_dir.clone(),
            media_root: config.media_root.clone(),
            format,
        })
    }

    pub(super) fn cache(&self) -> &AvatarCache {
        &self.cache
    }

    pub(super) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Renders the card for `talk`, writes it under
    /// `<media-root>/talk_images/`, and records the relative path on the row.
    pub(super) async fn generate_for(
        &self,
        pool: &PgPool,
        talk: &TalkRow,
        ctx: &ImportContext,
    ) -> anyhow::Result<()> {
        let speakers: Vec<CardSpeaker> = talksync_db::list_talk_speakers(pool, talk.id)
            .await?
            .into_iter()
            .map(|row| CardSpeaker {
                name: row.name,
                avatar_url: (!row.avatar_url.is_empty()).then_some(row.avatar_url),
            })
            .collect();

        let template = CardGenerator::template_path(&self.assets_dir, &ctx.event_slug);
        let bytes = self
            .generator
            .generate(
                &template,
                &talk.title,
                &speakers,
                &self.cache,
                &self.http,
                self.format,
            )
            .await?;

        let relative = format!("talk_images/talk_{}.{}", talk.id, self.format.extension());
        let path = self.media_root.join(&relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &bytes)?;

        talksync_db::set_talk_image(pool, talk.id, &relative).await?;
        ctx.log(
            &format!("Generated talk image for: {}", talk.title),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
        Ok(())
    }
}
