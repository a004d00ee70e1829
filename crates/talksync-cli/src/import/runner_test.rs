use super::*;
use sqlx::PgPool;
use talksync_cards::CardFormat;
use talksync_core::far_future;
use talksync_pretalx::types::{LocalizedString, Slot, State, SubmissionSpeaker};

fn ctx() -> ImportContext {
    ImportContext {
        verbosity: VerbosityLevel::Minimal,
        dry_run: false,
        no_update: false,
        skip_images: true,
        image_format: CardFormat::Webp,
        base_url: "https://pretalx.test".to_owned(),
        event_slug: "ev-2026".to_owned(),
        event_name: String::new(),
        pretalx_event_url: "https://pretalx.test/ev-2026".to_owned(),
        event_id: None,
    }
}

fn speaker(code: &str, name: &str) -> SubmissionSpeaker {
    SubmissionSpeaker {
        code: code.to_owned(),
        name: name.to_owned(),
        biography: Some(format!("{name} bio")),
        avatar_url: None,
    }
}

fn confirmed(code: &str, title: &str, speakers: Vec<SubmissionSpeaker>) -> Submission {
    Submission {
        code: code.to_owned(),
        title: Some(title.to_owned()),
        abstract_text: Some("An abstract".to_owned()),
        description: None,
        state: State::Confirmed,
        speakers,
        slots: vec![Slot {
            room: Some(LocalizedString::Plain("Main Hall".to_owned())),
            start: None,
            end: None,
        }],
        track: None,
        submission_type: Some(LocalizedString::Plain("Talk".to_owned())),
        duration: Some(60),
        image: None,
    }
}

async fn talk_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM talks")
        .fetch_one(pool)
        .await
        .expect("count query")
}

#[sqlx::test(migrations = "../../migrations")]
async fn reprocessing_updates_in_place(pool: PgPool) {
    let ctx = ctx();
    let sub = confirmed("AAA111", "Original title", vec![speaker("SPKA", "Ada")]);

    let outcome = process_single(&pool, &ctx, None, &sub).await.expect("create");
    assert_eq!(outcome, Outcome::Created);
    assert_eq!(talk_count(&pool).await, 1);

    let first = talksync_db::get_talk_by_pretalx_link(
        &pool,
        "https://pretalx.test/ev-2026/talk/AAA111",
    )
    .await
    .expect("query")
    .expect("talk exists");
    assert_eq!(first.title, "Original title");
    assert_eq!(first.duration_minutes, 60);

    let renamed = confirmed("AAA111", "Renamed title", vec![speaker("SPKA", "Ada")]);
    let outcome = process_single(&pool, &ctx, None, &renamed)
        .await
        .expect("update");
    assert_eq!(outcome, Outcome::Updated);
    assert_eq!(talk_count(&pool).await, 1);

    let second = talksync_db::get_talk_by_pretalx_link(
        &pool,
        "https://pretalx.test/ev-2026/talk/AAA111",
    )
    .await
    .expect("query")
    .expect("talk still exists");
    assert_eq!(second.id, first.id);
    assert_eq!(second.title, "Renamed title");
}

#[sqlx::test(migrations = "../../migrations")]
async fn state_change_deletes_talk_but_keeps_speaker(pool: PgPool) {
    let ctx = ctx();
    let sub = confirmed("AAA111", "A talk", vec![speaker("SPKA", "Ada")]);
    process_single(&pool, &ctx, None, &sub).await.expect("create");

    let mut withdrawn = sub.clone();
    withdrawn.state = State::Withdrawn;
    let outcome = process_single(&pool, &ctx, None, &withdrawn)
        .await
        .expect("delete");
    assert_eq!(outcome, Outcome::Deleted);
    assert_eq!(talk_count(&pool).await, 0);

    // The speaker row survives the talk.
    let kept = talksync_db::get_speaker_by_code(&pool, "SPKA")
        .await
        .expect("query");
    assert!(kept.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn non_importable_without_existing_talk_is_skipped(pool: PgPool) {
    let ctx = ctx();
    let mut sub = confirmed("AAA111", "A talk", vec![speaker("SPKA", "Ada")]);
    sub.state = State::Rejected;

    let outcome = process_single(&pool, &ctx, None, &sub).await.expect("skip");
    assert_eq!(outcome, Outcome::Skipped);
    assert_eq!(talk_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn speaker_set_converges_on_the_submission(pool: PgPool) {
    let ctx = ctx();
    let sub = confirmed(
        "AAA111",
        "A talk",
        vec![speaker("SPKA", "Ada"), speaker("SPKB", "Grace")],
    );
    process_single(&pool, &ctx, None, &sub).await.expect("create");

    let reshuffled = confirmed(
        "AAA111",
        "A talk",
        vec![speaker("SPKB", "Grace"), speaker("SPKC", "Edsger")],
    );
    process_single(&pool, &ctx, None, &reshuffled)
        .await
        .expect("update");

    let talk = talksync_db::get_talk_by_pretalx_link(
        &pool,
        "https://pretalx.test/ev-2026/talk/AAA111",
    )
    .await
    .expect("query")
    .expect("talk exists");
    let codes = talksync_db::list_talk_speaker_codes(&pool, talk.id)
        .await
        .expect("codes");
    assert_eq!(codes, vec!["SPKB", "SPKC"]);

    // Detached, not deleted.
    assert!(talksync_db::get_speaker_by_code(&pool, "SPKA")
        .await
        .expect("query")
        .is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn dry_run_writes_nothing(pool: PgPool) {
    let mut dry = ctx();
    dry.dry_run = true;
    let sub = confirmed("AAA111", "A talk", vec![speaker("SPKA", "Ada")]);

    let outcome = process_single(&pool, &dry, None, &sub).await.expect("dry run");
    assert_eq!(outcome, Outcome::Created);

    assert_eq!(talk_count(&pool).await, 0);
    assert!(talksync_db::get_speaker_by_code(&pool, "SPKA")
        .await
        .expect("query")
        .is_none());
    assert!(talksync_db::get_room_by_name(&pool, "Main Hall")
        .await
        .expect("query")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn no_update_leaves_existing_talks_untouched(pool: PgPool) {
    let ctx_rw = ctx();
    let sub = confirmed("AAA111", "Original title", vec![speaker("SPKA", "Ada")]);
    process_single(&pool, &ctx_rw, None, &sub).await.expect("create");

    let mut frozen = ctx();
    frozen.no_update = true;
    let renamed = confirmed("AAA111", "Renamed title", vec![speaker("SPKA", "Ada")]);
    let outcome = process_single(&pool, &frozen, None, &renamed)
        .await
        .expect("skip");
    assert_eq!(outcome, Outcome::Skipped);

    let talk = talksync_db::get_talk_by_pretalx_link(
        &pool,
        "https://pretalx.test/ev-2026/talk/AAA111",
    )
    .await
    .expect("query")
    .expect("talk exists");
    assert_eq!(talk.title, "Original title");
}

#[sqlx::test(migrations = "../../migrations")]
async fn defaults_apply_to_sparse_submissions(pool: PgPool) {
    let ctx = ctx();
    let sub = Submission {
        code: "KEY001".to_owned(),
        title: Some("Opening keynote".to_owned()),
        abstract_text: None,
        description: None,
        state: State::Confirmed,
        speakers: vec![speaker("SPKA", "Ada")],
        slots: vec![],
        track: None,
        submission_type: Some(LocalizedString::Plain("Keynote".to_owned())),
        duration: None,
        image: None,
    };

    process_single(&pool, &ctx, None, &sub).await.expect("create");
    let talk = talksync_db::get_talk_by_pretalx_link(
        &pool,
        "https://pretalx.test/ev-2026/talk/KEY001",
    )
    .await
    .expect("query")
    .expect("talk exists");

    assert_eq!(talk.presentation_type, "Keynote");
    assert_eq!(talk.duration_minutes, 45);
    assert_eq!(talk.track, "No track");
    assert!(talk.room_id.is_none());
    assert_eq!(talk.start_time, far_future());
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_preserves_duration_room_and_image_when_absent(pool: PgPool) {
    let ctx = ctx();
    let mut sub = confirmed("AAA111", "A talk", vec![speaker("SPKA", "Ada")]);
    sub.image = Some("https://img.test/talk.png".to_owned());
    process_single(&pool, &ctx, None, &sub).await.expect("create");

    let before = talksync_db::get_talk_by_pretalx_link(
        &pool,
        "https://pretalx.test/ev-2026/talk/AAA111",
    )
    .await
    .expect("query")
    .expect("talk exists");
    assert!(before.room_id.is_some());

    // Same submission with the slot, duration, and image gone upstream.
    let mut sparse = confirmed("AAA111", "A talk", vec![speaker("SPKA", "Ada")]);
    sparse.slots = vec![];
    sparse.duration = None;
    sparse.image = None;
    let outcome = process_single(&pool, &ctx, None, &sparse)
        .await
        .expect("update");
    assert_eq!(outcome, Outcome::Updated);

    let after = talksync_db::get_talk_by_pretalx_link(
        &pool,
        "https://pretalx.test/ev-2026/talk/AAA111",
    )
    .await
    .expect("query")
    .expect("talk still exists");
    assert_eq!(after.room_id, before.room_id);
    assert_eq!(after.duration_minutes, 60);
    assert_eq!(after.external_image_url, "https://img.test/talk.png");
}

#[test]
fn max_attempts_prefers_cli_over_config_and_floors_at_one() {
    assert_eq!(resolve_max_attempts(Some(5), 3), 5);
    assert_eq!(resolve_max_attempts(None, 3), 3);
    assert_eq!(resolve_max_attempts(Some(0), 3), 1);
    assert_eq!(resolve_max_attempts(None, 0), 1);
}

#[test]
fn speakerless_submissions_log_as_warnings() {
    let (_, _, style) = validation_log_parts(&ValidationIssue::NoSpeakers { exempt: true }, "ABC");
    assert_eq!(style, LogStyle::Warning);
    let (_, _, style) = validation_log_parts(&ValidationIssue::NoSpeakers { exempt: false }, "ABC");
    assert_eq!(style, LogStyle::Warning);

    let (_, _, style) = validation_log_parts(&ValidationIssue::MissingTitle, "ABC");
    assert_eq!(style, LogStyle::Error);
}

#[sqlx::test(migrations = "../../migrations")]
async fn full_run_counts_every_outcome(pool: PgPool) {
    let ctx = ctx();
    let config = AppConfig::default();

    // Pre-create a talk that the second run will delete.
    let doomed = confirmed("DOOMED", "Doomed talk", vec![speaker("SPKD", "Dee")]);
    process_single(&pool, &ctx, None, &doomed).await.expect("seed");

    let mut cancelled = doomed.clone();
    cancelled.state = State::Canceled;
    let untitled = Submission {
        title: None,
        ..confirmed("NOTITLE", "ignored", vec![speaker("SPKA", "Ada")])
    };
    let submissions = vec![
        confirmed("NEW001", "Fresh talk", vec![speaker("SPKA", "Ada")]),
        cancelled,
        untitled,
    ];

    let stats = process_submissions(&pool, &config, &ctx, &submissions)
        .await
        .expect("run");
    assert_eq!(
        stats,
        ImportStats {
            total: 3,
            created: 1,
            updated: 0,
            deleted: 1,
            skipped: 1,
            failed: 0,
        }
    );
}
