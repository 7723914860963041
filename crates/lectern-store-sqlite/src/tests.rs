//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, TimeZone, Utc};
use lectern_core::{
  catalog::{CourseId, LectureId},
  import::{CatalogImport, ImportSummary},
  progress::{ProgressFact, UserId},
  store::{CatalogStore, LectureFilter, ProgressStore},
};

use crate::SqliteStore;

const CATALOG: &str = r#"{
  "courses": [
    {
      "course": "Statistics I",
      "course_url": "https://example.com/stat1",
      "phase": 1,
      "instructor": "Yamada",
      "chapters": [
        { "chapter": 2, "title": "Probability", "lectures": [
          { "id": "l03", "title": "Axioms", "url": "https://v/3" }
        ] },
        { "chapter": 1, "title": "Descriptive", "lectures": [
          { "id": "l01", "title": "Mean", "url": "https://v/1" },
          { "id": "l02", "title": "Variance", "url": "https://v/2" }
        ] }
      ]
    },
    {
      "course": "Statistics II",
      "course_url": "https://example.com/stat2",
      "phase": 2,
      "instructor": "",
      "chapters": [
        { "chapter": 1, "title": "Regression", "lectures": [
          { "id": "l01", "title": "OLS", "url": "https://v/4" }
        ] }
      ]
    }
  ]
}"#;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn seeded() -> SqliteStore {
  let s = store().await;
  let import = CatalogImport::from_json(CATALOG).unwrap();
  s.import_catalog(&import).await.unwrap();
  s
}

fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

fn lecture(id: &str) -> LectureId { LectureId::from(id) }

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_reports_counts() {
  let s = store().await;
  let import = CatalogImport::from_json(CATALOG).unwrap();
  let summary = s.import_catalog(&import).await.unwrap();
  assert_eq!(summary, ImportSummary { courses: 2, chapters: 3, lectures: 4 });
}

#[tokio::test]
async fn import_is_idempotent() {
  let s = seeded().await;
  let import = CatalogImport::from_json(CATALOG).unwrap();
  s.import_catalog(&import).await.unwrap();

  assert_eq!(s.list_courses().await.unwrap().len(), 2);
  assert_eq!(s.list_chapters(None).await.unwrap().len(), 3);
  assert_eq!(s.list_lectures(&LectureFilter::All).await.unwrap().len(), 4);
}

#[tokio::test]
async fn courses_come_back_in_display_order() {
  let s = seeded().await;
  let courses = s.list_courses().await.unwrap();
  let titles: Vec<&str> = courses.iter().map(|c| c.title.as_str()).collect();
  assert_eq!(titles, ["Statistics I", "Statistics II"]);
  assert_eq!(courses[0].instructor.as_deref(), Some("Yamada"));
  assert_eq!(courses[1].instructor, None);
}

#[tokio::test]
async fn get_course_missing_returns_none() {
  let s = seeded().await;
  assert!(s.get_course(&CourseId::from("course-9")).await.unwrap().is_none());
  assert!(s.get_course(&CourseId::from("course-2")).await.unwrap().is_some());
}

#[tokio::test]
async fn chapters_filter_by_course_and_sort_by_number() {
  let s = seeded().await;
  let course = CourseId::from("course-1");
  let chapters = s.list_chapters(Some(&course)).await.unwrap();
  let numbers: Vec<i64> = chapters.iter().map(|c| c.number).collect();
  assert_eq!(numbers, [1, 2]);
  assert!(chapters.iter().all(|c| c.course_id == course));

  let ch = s.get_chapter(&"course-1_ch-2".into()).await.unwrap().unwrap();
  assert_eq!(ch.title, "Probability");
}

#[tokio::test]
async fn lectures_filter_by_chapter_or_course() {
  let s = seeded().await;

  let by_chapter = s
    .list_lectures(&LectureFilter::Chapter("course-1_ch-1".into()))
    .await
    .unwrap();
  let ids: Vec<&str> = by_chapter.iter().map(|l| l.lecture_id.as_str()).collect();
  assert_eq!(ids, ["course-1_l01", "course-1_l02"]);

  let by_course = s
    .list_lectures(&LectureFilter::Course("course-2".into()))
    .await
    .unwrap();
  assert_eq!(by_course.len(), 1);
  assert_eq!(by_course[0].title, "OLS");

  let one = s.get_lecture(&lecture("course-1_l03")).await.unwrap().unwrap();
  assert_eq!(one.chapter_id.as_str(), "course-1_ch-2");
  assert_eq!(one.order, 1);
}

#[tokio::test]
async fn every_import_bumps_catalog_version() {
  let s = store().await;
  assert_eq!(s.catalog_version().await.unwrap(), 0);

  let import = CatalogImport::from_json(CATALOG).unwrap();
  s.import_catalog(&import).await.unwrap();
  let first = s.catalog_version().await.unwrap();
  s.import_catalog(&import).await.unwrap();
  assert!(s.catalog_version().await.unwrap() > first);
}

#[tokio::test]
async fn duplicate_lecture_ids_abort_import() {
  let s = store().await;
  let dup = CATALOG.replace(r#""id": "l02""#, r#""id": "l01""#);
  let import = CatalogImport::from_json(&dup).unwrap();

  let err = s.import_catalog(&import).await.unwrap_err();
  assert!(matches!(err, crate::Error::Import(_)));
  assert!(s.list_courses().await.unwrap().is_empty());
  assert_eq!(s.catalog_version().await.unwrap(), 0);
}

// ─── Toggle ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_toggle_creates_completed_fact() {
  let s = seeded().await;
  let alice = UserId::from("alice");

  assert!(s.get_fact(&alice, &lecture("course-1_l01")).await.unwrap().is_none());

  let fact = s
    .toggle_fact(&alice, &lecture("course-1_l01"), at(1_000))
    .await
    .unwrap()
    .unwrap();
  assert!(fact.completed);
  assert_eq!(fact.completed_at, Some(at(1_000)));

  let stored = s.get_fact(&alice, &lecture("course-1_l01")).await.unwrap();
  assert_eq!(stored, Some(fact));
}

#[tokio::test]
async fn second_toggle_clears_completion_and_keeps_id() {
  let s = seeded().await;
  let alice = UserId::from("alice");

  let first = s
    .toggle_fact(&alice, &lecture("course-1_l01"), at(1))
    .await
    .unwrap()
    .unwrap();
  let second = s
    .toggle_fact(&alice, &lecture("course-1_l01"), at(2))
    .await
    .unwrap()
    .unwrap();

  assert!(!second.completed);
  assert_eq!(second.completed_at, None);
  assert_eq!(second.fact_id, first.fact_id);

  let third = s
    .toggle_fact(&alice, &lecture("course-1_l01"), at(3))
    .await
    .unwrap()
    .unwrap();
  assert!(third.completed);
  assert_eq!(third.completed_at, Some(at(3)));
}

#[tokio::test]
async fn toggles_never_duplicate_facts() {
  let s = seeded().await;
  let alice = UserId::from("alice");

  for i in 0..6 {
    s.toggle_fact(&alice, &lecture("course-1_l02"), at(i))
      .await
      .unwrap();
  }
  let facts = s.list_facts(&alice, false).await.unwrap();
  assert_eq!(facts.len(), 1);
  assert!(!facts[0].completed);
  assert!(facts[0].is_consistent());
}

#[tokio::test]
async fn concurrent_toggles_keep_one_row() {
  let s = seeded().await;
  let alice = UserId::from("alice");

  let mut handles = Vec::new();
  for i in 0..8 {
    let s = s.clone();
    let alice = alice.clone();
    handles.push(tokio::spawn(async move {
      s.toggle_fact(&alice, &lecture("course-1_l03"), at(i)).await
    }));
  }
  for h in handles {
    h.await.unwrap().unwrap();
  }

  let facts = s.list_facts(&alice, false).await.unwrap();
  assert_eq!(facts.len(), 1);
  // An even number of flips from "absent" lands on not-completed.
  assert!(!facts[0].completed);
}

#[tokio::test]
async fn toggle_unknown_lecture_writes_nothing() {
  let s = seeded().await;
  let alice = UserId::from("alice");

  let result = s
    .toggle_fact(&alice, &lecture("course-1_l99"), at(1))
    .await
    .unwrap();
  assert!(result.is_none());
  assert!(s.list_facts(&alice, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn facts_are_scoped_to_their_user() {
  let s = seeded().await;
  let alice = UserId::from("alice");
  let bob = UserId::from("bob");

  s.toggle_fact(&alice, &lecture("course-1_l01"), at(1)).await.unwrap();
  s.toggle_fact(&bob, &lecture("course-1_l01"), at(2)).await.unwrap();
  s.toggle_fact(&bob, &lecture("course-1_l01"), at(3)).await.unwrap();

  let alice_fact = s.get_fact(&alice, &lecture("course-1_l01")).await.unwrap().unwrap();
  assert!(alice_fact.completed);
  assert_eq!(alice_fact.completed_at, Some(at(1)));

  let bob_facts = s.list_facts(&bob, false).await.unwrap();
  assert_eq!(bob_facts.len(), 1);
  assert!(!bob_facts[0].completed);
  assert_eq!(bob_facts[0].user_id, bob);
}

#[tokio::test]
async fn list_facts_completed_only() {
  let s = seeded().await;
  let alice = UserId::from("alice");

  s.toggle_fact(&alice, &lecture("course-1_l01"), at(1)).await.unwrap();
  s.toggle_fact(&alice, &lecture("course-1_l02"), at(2)).await.unwrap();
  s.toggle_fact(&alice, &lecture("course-1_l02"), at(3)).await.unwrap();

  let all = s.list_facts(&alice, false).await.unwrap();
  let done = s.list_facts(&alice, true).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(done.len(), 1);
  assert_eq!(done[0].lecture_id.as_str(), "course-1_l01");
}

#[tokio::test]
async fn import_after_progress_keeps_facts() {
  let s = seeded().await;
  let alice = UserId::from("alice");
  s.toggle_fact(&alice, &lecture("course-1_l01"), at(1)).await.unwrap();

  let import = CatalogImport::from_json(CATALOG).unwrap();
  s.import_catalog(&import).await.unwrap();

  assert_eq!(s.list_facts(&alice, true).await.unwrap().len(), 1);
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_overwrites_existing_pair() {
  let s = seeded().await;
  let alice = UserId::from("alice");

  let first = ProgressFact::first_completion(alice.clone(), lecture("course-2_l01"), at(5));
  let stored = s.upsert_fact(&first).await.unwrap();
  assert_eq!(stored, first);

  let mut replacement = ProgressFact::first_completion(alice.clone(), lecture("course-2_l01"), at(9));
  replacement.notes = Some("review residuals".into());
  let stored = s.upsert_fact(&replacement).await.unwrap();

  assert_eq!(stored.fact_id, first.fact_id);
  assert_eq!(stored.completed_at, Some(at(9)));
  assert_eq!(stored.notes.as_deref(), Some("review residuals"));
  assert_eq!(s.list_facts(&alice, false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn inconsistent_fact_is_rejected() {
  let s = seeded().await;
  let mut fact = ProgressFact::first_completion("alice".into(), lecture("course-2_l01"), at(5));
  fact.completed_at = None;

  let err = s.upsert_fact(&fact).await.unwrap_err();
  assert!(matches!(err, crate::Error::Database(_)));
  assert!(s.list_facts(&"alice".into(), false).await.unwrap().is_empty());
}

#[tokio::test]
async fn fact_for_unknown_lecture_is_rejected() {
  let s = seeded().await;
  let fact = ProgressFact::first_completion("alice".into(), lecture("course-9_zz"), at(5));

  let err = s.upsert_fact(&fact).await.unwrap_err();
  assert!(matches!(err, crate::Error::Database(_)));
  assert!(s.list_facts(&"alice".into(), false).await.unwrap().is_empty());
}
