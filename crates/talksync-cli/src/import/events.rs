//! Resolution of the event being imported: slug derivation, row creation,
//! and a best-effort display-name refresh from the API.

use chrono::{Datelike, Utc};
use sqlx::PgPool;
use talksync_db::EventRow;
use talksync_pretalx::{LocalizedString, PretalxClient};

use super::context::{ImportContext, LogStyle, VerbosityLevel};

/// Derives the event slug from `--event-slug` or, failing that, the last
/// path segment of `--pretalx-event-url`. `None` means the import cannot
/// proceed.
pub(super) fn resolve_event_slug(ctx: &ImportContext) -> Option<String> {
    if !ctx.event_slug.is_empty() {
        return Some(ctx.event_slug.clone());
    }

    if !ctx.pretalx_event_url.is_empty() {
        let slug = ctx
            .pretalx_event_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        ctx.log(
            &format!("No event slug provided, derived from Pretalx URL: '{slug}'"),
            VerbosityLevel::Normal,
            LogStyle::Warning,
        );
        return Some(slug);
    }

    ctx.log(
        "No event slug provided and no Pretalx event URL provided. Cannot proceed.",
        VerbosityLevel::Normal,
        LogStyle::Error,
    );
    None
}

/// The event URL to import from: CLI flag, then the stored event row,
/// then `{default_base_url}/{slug}`.
pub(super) fn resolve_pretalx_url(
    cli_url: &str,
    event: Option<&EventRow>,
    event_slug: &str,
    default_base_url: &str,
) -> String {
    if !cli_url.is_empty() {
        return cli_url.trim_end_matches('/').to_owned();
    }
    if let Some(event) = event {
        if !event.pretalx_url.is_empty() {
            return event.pretalx_url.trim_end_matches('/').to_owned();
        }
    }
    format!(
        "{}/{event_slug}",
        default_base_url.trim_end_matches('/')
    )
}

/// Splits an event URL into `(api_base_url, event_slug)`.
pub(super) fn split_pretalx_url(pretalx_event_url: &str) -> Option<(String, String)> {
    let trimmed = pretalx_event_url.trim_end_matches('/');
    let (base, slug) = trimmed.rsplit_once('/')?;
    if base.is_empty() || slug.is_empty() {
        return None;
    }
    Some((base.to_owned(), slug.to_owned()))
}

/// Gets or creates the `events` row for `slug`.
///
/// In dry-run mode nothing is written: an existing row is returned as-is and
/// a missing one yields `(None, false)`.
pub(super) async fn ensure_event(
    pool: &PgPool,
    slug: &str,
    ctx: &ImportContext,
) -> anyhow::Result<(Option<EventRow>, bool)> {
    if ctx.dry_run {
        let existing = talksync_db::get_event_by_slug(pool, slug).await?;
        if existing.is_none() {
            ctx.log(
                &format!("Would create Event '{slug}' (dry run)"),
                VerbosityLevel::Normal,
                LogStyle::Plain,
            );
        }
        return Ok((existing, false));
    }

    let name = if ctx.event_name.is_empty() {
        slug
    } else {
        ctx.event_name.as_str()
    };
    let (event, created) = talksync_db::get_or_create_event(
        pool,
        slug,
        name,
        Utc::now().year(),
        &ctx.pretalx_event_url,
    )
    .await?;
    if created {
        ctx.log(
            &format!("Created new Event '{slug}'"),
            VerbosityLevel::Normal,
            LogStyle::Success,
        );
    }
    Ok((Some(event), created))
}

/// Fetches the event's display name from the API and, for a freshly created
/// row, replaces the slug placeholder with it. Best-effort: API failures are
/// logged and swallowed.
pub(super) async fn maybe_update_event_name(
    pool: &PgPool,
    client: &PretalxClient,
    event: &EventRow,
    ctx: &ImportContext,
    created: bool,
) {
    let details = match client.fetch_event(&ctx.event_slug).await {
        Ok(details) => details,
        Err(err) => {
            ctx.log(
                &format!("Could not fetch event name from Pretalx API: {err}"),
                VerbosityLevel::Detailed,
                LogStyle::Warning,
            );
            return;
        }
    };
    let Some(name) = details
        .name
        .as_ref()
        .and_then(LocalizedString::en)
        .filter(|n| !n.is_empty())
    else {
        return;
    };

    ctx.log(
        &format!("Fetched event name from Pretalx API: '{name}'"),
        VerbosityLevel::Normal,
        LogStyle::Plain,
    );

    if created && name != event.slug && name != event.name {
        if let Err(err) = talksync_db::update_event_name(pool, event.id, name).await {
            ctx.log(
                &format!("Failed to update Event name: {err}"),
                VerbosityLevel::Normal,
                LogStyle::Warning,
            );
            return;
        }
        ctx.log(
            &format!("Updated Event name to '{name}'"),
            VerbosityLevel::Normal,
            LogStyle::Success,
        );
    }
}
