//! [`Tracker`], the service the presentation layer talks to.
//!
//! It owns an injected store handle, loads one user's snapshot per request,
//! runs the aggregator over it, and performs toggles. Dashboards are cached
//! per user and invalidated by that user's toggles or a catalog re-import.

use std::{
  collections::{HashMap, HashSet},
  sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  catalog::{CatalogSnapshot, ChapterId, CourseId, LectureId},
  progress::{ProgressFact, UserId},
  store::{CatalogStore, LectureFilter, ProgressStore},
  view::{
    ChapterDetail, CourseProgress, CourseSummary, Dashboard, chapter_progress,
    course_progress,
  },
};

// ─── Cache ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Slot {
  generation: u64,
  /// The cached view and the catalog version it was built from.
  dashboard:  Option<(u64, Arc<Dashboard>)>,
}

/// Per-user dashboard cache.
///
/// Each user has a generation counter bumped on invalidation. A dashboard is
/// only stored if the generation it was computed under is still current, so
/// a read racing a toggle can never re-install a stale view. Entries built
/// from an older catalog version are treated as missing.
#[derive(Default)]
struct DashboardCache {
  slots: Mutex<HashMap<UserId, Slot>>,
}

impl DashboardCache {
  fn lookup(
    &self,
    user: &UserId,
    catalog_version: u64,
  ) -> (u64, Option<Arc<Dashboard>>) {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(slot) = slots.get(user) else {
      return (0, None);
    };
    let cached = slot
      .dashboard
      .as_ref()
      .filter(|(version, _)| *version == catalog_version)
      .map(|(_, d)| d.clone());
    (slot.generation, cached)
  }

  fn store(
    &self,
    user: &UserId,
    generation: u64,
    catalog_version: u64,
    dashboard: Arc<Dashboard>,
  ) {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    let slot = slots.entry(user.clone()).or_default();
    if slot.generation == generation {
      slot.dashboard = Some((catalog_version, dashboard));
    }
  }

  fn invalidate(&self, user: &UserId) {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    let slot = slots.entry(user.clone()).or_default();
    slot.generation += 1;
    slot.dashboard = None;
  }
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

/// Progress-tracking service over a combined catalog + progress store.
pub struct Tracker<S> {
  store: S,
  cache: DashboardCache,
}

impl<S> Tracker<S>
where
  S: CatalogStore + ProgressStore,
{
  pub fn new(store: S) -> Self {
    Self { store, cache: DashboardCache::default() }
  }

  /// The underlying store handle.
  pub fn store(&self) -> &S { &self.store }

  /// Load the full catalog, sorted for presentation.
  pub async fn catalog(&self) -> Result<CatalogSnapshot> {
    let courses = self.store.list_courses().await.map_err(Error::storage)?;
    let chapters = self.store.list_chapters(None).await.map_err(Error::storage)?;
    let lectures = self
      .store
      .list_lectures(&LectureFilter::All)
      .await
      .map_err(Error::storage)?;
    Ok(CatalogSnapshot::new(courses, chapters, lectures))
  }

  async fn completed_ids(&self, user: &UserId) -> Result<HashSet<LectureId>> {
    let facts = self
      .store
      .list_facts(user, true)
      .await
      .map_err(Error::storage)?;
    Ok(facts.into_iter().map(|f| f.lecture_id).collect())
  }

  /// The user's dashboard, served from cache while neither the user's
  /// progress nor the catalog has changed.
  pub async fn dashboard(&self, user: &UserId) -> Result<Arc<Dashboard>> {
    // Read the version before the catalog, so a cached view is never tagged
    // newer than the data it was built from.
    let version = self
      .store
      .catalog_version()
      .await
      .map_err(Error::storage)?;
    let (generation, cached) = self.cache.lookup(user, version);
    if let Some(dashboard) = cached {
      return Ok(dashboard);
    }

    let catalog = self.catalog().await?;
    let completed = self.completed_ids(user).await?;
    let dashboard = Arc::new(Dashboard::build(&catalog, &completed));
    self.cache.store(user, generation, version, dashboard.clone());
    Ok(dashboard)
  }

  /// Every course with the user's stats, in display order.
  pub async fn courses(&self, user: &UserId) -> Result<Vec<CourseSummary>> {
    Ok(self.dashboard(user).await?.summaries())
  }

  pub async fn course_detail(
    &self,
    user: &UserId,
    course_id: &CourseId,
  ) -> Result<CourseProgress> {
    let catalog = self.catalog().await?;
    let course = catalog
      .course(course_id)
      .ok_or_else(|| Error::CourseNotFound(course_id.clone()))?;
    let completed = self.completed_ids(user).await?;
    Ok(course_progress(&catalog, course, &completed))
  }

  pub async fn chapter_detail(
    &self,
    user: &UserId,
    chapter_id: &ChapterId,
  ) -> Result<ChapterDetail> {
    let catalog = self.catalog().await?;
    let chapter = catalog
      .chapter(chapter_id)
      .ok_or_else(|| Error::ChapterNotFound(chapter_id.clone()))?;
    let completed = self.completed_ids(user).await?;
    Ok(ChapterDetail {
      course:   catalog.course(&chapter.course_id).cloned(),
      progress: chapter_progress(&catalog, chapter, &completed),
    })
  }

  /// The user's raw progress facts.
  pub async fn facts(
    &self,
    user: &UserId,
    completed_only: bool,
  ) -> Result<Vec<ProgressFact>> {
    self
      .store
      .list_facts(user, completed_only)
      .await
      .map_err(Error::storage)
  }

  /// Flip `lecture`'s completion for `user`, stamped with the current time.
  pub async fn toggle(
    &self,
    user: &UserId,
    lecture: &LectureId,
  ) -> Result<ProgressFact> {
    self.toggle_at(user, lecture, Utc::now()).await
  }

  /// Flip `lecture`'s completion for `user`, stamped with `now`.
  ///
  /// Fails with [`Error::LectureNotFound`] without writing if the lecture is
  /// not in the catalog. The user's cached dashboard is dropped on success.
  pub async fn toggle_at(
    &self,
    user: &UserId,
    lecture: &LectureId,
    now: DateTime<Utc>,
  ) -> Result<ProgressFact> {
    let fact = self
      .store
      .toggle_fact(user, lecture, now)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::LectureNotFound(lecture.clone()))?;

    self.cache.invalidate(user);
    tracing::debug!(
      user = %user,
      lecture = %lecture,
      completed = fact.completed,
      "toggled lecture"
    );
    Ok(fact)
  }
}
