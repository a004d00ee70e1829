//! The import run itself: resolve the event, fetch submissions, and drive
//! every submission through validation and the create/update/delete handlers.
//!
//! Per-submission failures are counted and logged, never propagated — one
//! broken submission must not abort the run.

use std::collections::HashSet;

use anyhow::Context;
use sqlx::PgPool;
use talksync_core::AppConfig;
use talksync_pretalx::{
    validate, PretalxClient, Submission, SubmissionData, ValidationIssue, ValidationReport,
};

use super::context::{ImportContext, LogStyle, VerbosityLevel};
use super::images::CardPipeline;
use super::{events, rooms, speakers, talks, ImportArgs};

/// Counters reported at the end of every run.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct ImportStats {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ImportStats {
    fn summary(&self) -> String {
        format!(
            "Import complete: {} created, {} updated, {} deleted, {} skipped, \
             {} failed, {} total",
            self.created, self.updated, self.deleted, self.skipped, self.failed, self.total
        )
    }
}

/// Attempts per API request: the CLI flag wins, then the configured
/// `TALKSYNC_MAX_ATTEMPTS`, floored at one.
fn resolve_max_attempts(cli: Option<u32>, config_default: u32) -> u32 {
    cli.unwrap_or(config_default).max(1)
}

/// What happened to one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Outcome {
    Created,
    Updated,
    Deleted,
    Skipped,
}

/// Entry point for `talksync import`.
pub(super) async fn run_import(
    pool: &PgPool,
    config: &AppConfig,
    args: &ImportArgs,
) -> anyhow::Result<()> {
    let bootstrap = ImportContext {
        verbosity: args.verbosity.into(),
        dry_run: args.dry_run,
        no_update: args.no_update,
        skip_images: args.skip_images,
        image_format: args.image_format.into(),
        base_url: config.pretalx_base_url.clone(),
        event_slug: args.event_slug.clone().unwrap_or_default(),
        event_name: args.event_name.clone().unwrap_or_default(),
        pretalx_event_url: args.pretalx_event_url.clone().unwrap_or_default(),
        event_id: None,
    };

    let Some(slug) = events::resolve_event_slug(&bootstrap) else {
        anyhow::bail!("an event slug or a Pretalx event URL is required");
    };

    let (event, created) = events::ensure_event(pool, &slug, &bootstrap).await?;
    let pretalx_event_url = events::resolve_pretalx_url(
        args.pretalx_event_url.as_deref().unwrap_or_default(),
        event.as_ref(),
        &slug,
        &config.pretalx_base_url,
    );
    let (api_base_url, api_event_slug) = events::split_pretalx_url(&pretalx_event_url)
        .with_context(|| format!("invalid Pretalx event URL: {pretalx_event_url}"))?;

    let ctx = ImportContext {
        base_url: api_base_url,
        event_slug: api_event_slug,
        pretalx_event_url,
        event_id: event.as_ref().map(|e| e.id),
        ..bootstrap
    };

    let api_token = args
        .api_token
        .clone()
        .or_else(|| config.pretalx_api_token.clone());
    let client = PretalxClient::new(
        &ctx.base_url,
        api_token.as_deref(),
        config.request_timeout_secs,
        resolve_max_attempts(args.max_retries, config.max_attempts),
        1,
        config.calls_per_second,
    )?;
    tracing::debug!(
        base_url = %ctx.base_url,
        event_slug = %ctx.event_slug,
        dry_run = ctx.dry_run,
        no_update = ctx.no_update,
        "import run configured"
    );

    ctx.log(
        &format!("Fetching talks from Pretalx event '{}'...", ctx.event_slug),
        VerbosityLevel::Normal,
        LogStyle::Plain,
    );
    let fetched = if config.snapshot_submissions {
        client
            .fetch_submissions_cached(&ctx.event_slug, &config.snapshot_path)
            .await
    } else {
        client.fetch_submissions(&ctx.event_slug).await
    };
    let (count, submissions) = match fetched {
        Ok(result) => result,
        Err(err) => {
            ctx.log(
                &format!("Failed to fetch talks: {err}"),
                VerbosityLevel::Normal,
                LogStyle::Error,
            );
            return Err(err.into());
        }
    };
    ctx.log(
        &format!(
            "Fetched {count} talks from Pretalx event '{}'",
            ctx.event_slug
        ),
        VerbosityLevel::Normal,
        LogStyle::Success,
    );

    if let Some(event) = &event {
        events::maybe_update_event_name(pool, &client, event, &ctx, created).await;
    }

    process_submissions(pool, config, &ctx, &submissions).await?;
    Ok(())
}

/// Validates and imports every submission, returning the run counters.
pub(super) async fn process_submissions(
    pool: &PgPool,
    config: &AppConfig,
    ctx: &ImportContext,
    submissions: &[Submission],
) -> anyhow::Result<ImportStats> {
    let mut stats = ImportStats {
        total: submissions.len(),
        ..ImportStats::default()
    };

    if ctx.dry_run {
        ctx.log(
            "DRY RUN: No changes will be saved to the database",
            VerbosityLevel::Normal,
            LogStyle::Warning,
        );
    }
    if ctx.no_update {
        ctx.log(
            "NO UPDATE: Existing talks and speakers will not be updated",
            VerbosityLevel::Normal,
            LogStyle::Warning,
        );
    }

    let pipeline = if ctx.skip_images {
        None
    } else {
        Some(CardPipeline::new(config, ctx.image_format)?)
    };

    // Warm the avatar cache up front so card generation does not serialize
    // downloads. Best-effort by construction.
    if let Some(pipeline) = &pipeline {
        let urls: HashSet<String> = submissions
            .iter()
            .filter(|sub| sub.state.is_importable())
            .flat_map(|sub| &sub.speakers)
            .filter_map(|sp| sp.avatar_url.clone())
            .filter(|url| !url.is_empty())
            .collect();
        pipeline
            .cache()
            .prefetch(pipeline.http(), &urls, config.prefetch_concurrency)
            .await;
    }

    if !ctx.dry_run {
        rooms::batch_create_rooms(pool, submissions, ctx).await?;
        speakers::batch_upsert_speakers(pool, submissions, ctx).await?;
    }

    for (idx, submission) in submissions.iter().enumerate() {
        ctx.log(
            &format!(
                "Processing {}/{}: {}",
                idx + 1,
                stats.total,
                submission.title.as_deref().unwrap_or("(untitled)")
            ),
            VerbosityLevel::Detailed,
            LogStyle::Plain,
        );

        let report = validate(submission, config.import_talks_without_speakers);
        log_validation_issues(ctx, submission, &report);
        if !report.importable {
            stats.skipped += 1;
            continue;
        }

        match process_single(pool, ctx, pipeline.as_ref(), submission).await {
            Ok(Outcome::Created) => stats.created += 1,
            Ok(Outcome::Updated) => stats.updated += 1,
            Ok(Outcome::Deleted) => stats.deleted += 1,
            Ok(Outcome::Skipped) => stats.skipped += 1,
            Err(err) => {
                stats.failed += 1;
                ctx.log(
                    &format!("Error processing submission {}: {err:#}", submission.code),
                    VerbosityLevel::Normal,
                    LogStyle::Error,
                );
            }
        }
    }

    ctx.log(&stats.summary(), VerbosityLevel::Normal, LogStyle::Success);
    Ok(stats)
}

/// Routes one importable-or-not submission to delete, update, or create.
pub(super) async fn process_single(
    pool: &PgPool,
    ctx: &ImportContext,
    pipeline: Option<&CardPipeline>,
    submission: &Submission,
) -> anyhow::Result<Outcome> {
    let data = SubmissionData::from_submission(submission, &ctx.base_url, &ctx.event_slug);
    let existing = talksync_db::get_talk_by_pretalx_link(pool, &data.pretalx_link).await?;

    if !submission.state.is_importable() {
        let Some(existing) = existing else {
            return Ok(Outcome::Skipped);
        };
        ctx.log(
            &format!(
                "Talk {} is no longer confirmed/accepted. Deleting",
                data.title
            ),
            VerbosityLevel::Normal,
            LogStyle::Warning,
        );
        if !ctx.dry_run {
            talksync_db::delete_talk(pool, existing.id).await?;
        }
        return Ok(Outcome::Deleted);
    }

    if let Some(existing) = existing {
        if ctx.no_update {
            ctx.log(
                &format!("Skipping update for existing talk: {}", data.title),
                VerbosityLevel::Detailed,
                LogStyle::Warning,
            );
            return Ok(Outcome::Skipped);
        }
        ctx.log(
            &format!("Updating existing talk: {}", data.title),
            VerbosityLevel::Detailed,
            LogStyle::Warning,
        );
        if !ctx.dry_run {
            let talk =
                talks::update_talk(pool, &existing, &data, &submission.speakers, ctx).await?;
            if let Some(pipeline) = pipeline {
                pipeline.generate_for(pool, &talk, ctx).await?;
            }
        }
        return Ok(Outcome::Updated);
    }

    ctx.log(
        &format!("Creating new talk: {}", data.title),
        VerbosityLevel::Detailed,
        LogStyle::Plain,
    );
    if !ctx.dry_run {
        let talk = talks::create_talk(pool, &data, ctx).await?;
        talks::add_speakers_to_talk(pool, &talk, &submission.speakers, ctx).await?;
        if let Some(pipeline) = pipeline {
            pipeline.generate_for(pool, &talk, ctx).await?;
        }
    }
    Ok(Outcome::Created)
}

/// Message, verbosity gate, and style for one validation issue. Missing
/// speakers stay a warning whether or not the submission is exempt; only a
/// missing title is an error, since that alone blocks the import.
fn validation_log_parts(
    issue: &ValidationIssue,
    code: &str,
) -> (String, VerbosityLevel, LogStyle) {
    match issue {
        ValidationIssue::MissingTitle => (
            format!("Submission {code} has no title"),
            VerbosityLevel::Normal,
            LogStyle::Error,
        ),
        ValidationIssue::TitleTooLong { chars } => (
            format!("Submission {code} title too long ({chars} chars), will be truncated"),
            VerbosityLevel::Normal,
            LogStyle::Warning,
        ),
        ValidationIssue::NoSpeakers { exempt } => (
            if *exempt {
                format!("Submission {code} has no speakers (exempt)")
            } else {
                format!("Submission {code} has no speakers")
            },
            VerbosityLevel::Normal,
            LogStyle::Warning,
        ),
        ValidationIssue::NoRoom => (
            format!("Submission {code} has no room assigned"),
            VerbosityLevel::Trace,
            LogStyle::Warning,
        ),
    }
}

fn log_validation_issues(ctx: &ImportContext, submission: &Submission, report: &ValidationReport) {
    for issue in &report.issues {
        let (message, level, style) = validation_log_parts(issue, &submission.code);
        ctx.log(&message, level, style);
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
