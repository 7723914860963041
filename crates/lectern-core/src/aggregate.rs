//! Pure progress aggregation over materialised catalog + progress snapshots.
//!
//! Nothing in this module performs I/O. Callers fetch the rows (scoped to one
//! user) and pass the set of completed lecture ids in.
//!
//! Percentages use round-half-up on exact integer arithmetic everywhere, so
//! `percent(k, n) == round(100 * k / n)` for `n > 0` and `0` for `n == 0`.
//! Course and overall percentages are computed from summed counts, never by
//! averaging chapter percentages.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Chapter, ChapterId, Course, CourseId, Lecture, LectureId};

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Completion counts for any set of lectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionStats {
  pub total:       usize,
  pub completed:   usize,
  /// `0..=100`, rounded half-up.
  pub percent:     u8,
  /// `true` only for a non-empty set with every lecture completed.
  pub is_complete: bool,
}

impl CompletionStats {
  pub fn new(total: usize, completed: usize) -> Self {
    let completed = completed.min(total);
    Self {
      total,
      completed,
      percent: percent(completed, total),
      is_complete: total > 0 && completed == total,
    }
  }

  /// Count how many of `lectures` appear in `completed`.
  pub fn over<'a>(
    lectures: impl IntoIterator<Item = &'a Lecture>,
    completed: &HashSet<LectureId>,
  ) -> Self {
    let (total, done) = lectures.into_iter().fold((0, 0), |(t, d), l| {
      (t + 1, d + usize::from(completed.contains(&l.lecture_id)))
    });
    Self::new(total, done)
  }

  fn merge(self, other: Self) -> Self {
    Self::new(self.total + other.total, self.completed + other.completed)
  }
}

/// `round(100 * completed / total)`, half-up; `0` when `total == 0`.
pub fn percent(completed: usize, total: usize) -> u8 {
  if total == 0 {
    return 0;
  }
  let completed = completed.min(total) as u128;
  let total = total as u128;
  // floor((200k + n) / 2n) == floor(100k/n + 1/2)
  ((200 * completed + total) / (2 * total)) as u8
}

/// Stats for one chapter, carrying the keys needed to order chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterStats {
  pub chapter_id: ChapterId,
  pub course_id:  CourseId,
  pub number:     i64,
  #[serde(flatten)]
  pub stats:      CompletionStats,
}

/// Stats for one course, summed over its chapters' lectures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStats {
  pub course_id:     CourseId,
  pub display_order: i64,
  #[serde(flatten)]
  pub stats:         CompletionStats,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Stats for `chapter`. Lectures belonging to other chapters are ignored, so a
/// caller may pass an unfiltered lecture list.
pub fn chapter_stats<'a>(
  chapter: &Chapter,
  lectures: impl IntoIterator<Item = &'a Lecture>,
  completed: &HashSet<LectureId>,
) -> ChapterStats {
  let own = lectures
    .into_iter()
    .filter(|l| l.chapter_id == chapter.chapter_id);
  ChapterStats {
    chapter_id: chapter.chapter_id.clone(),
    course_id:  chapter.course_id.clone(),
    number:     chapter.number,
    stats:      CompletionStats::over(own, completed),
  }
}

/// Stats for `course`, aggregated from the stats of its chapters. Chapters of
/// other courses are ignored.
pub fn course_stats<'a>(
  course: &Course,
  chapters: impl IntoIterator<Item = &'a ChapterStats>,
) -> CourseStats {
  let stats = chapters
    .into_iter()
    .filter(|ch| ch.course_id == course.course_id)
    .fold(CompletionStats::default(), |acc, ch| acc.merge(ch.stats));
  CourseStats {
    course_id: course.course_id.clone(),
    display_order: course.display_order,
    stats,
  }
}

/// Stats over the full lecture universe.
pub fn overall_stats<'a>(
  lectures: impl IntoIterator<Item = &'a Lecture>,
  completed: &HashSet<LectureId>,
) -> CompletionStats {
  CompletionStats::over(lectures, completed)
}

/// The first incomplete chapter, ordered by (course display order, chapter
/// number) regardless of input order.
///
/// Chapters without lectures are skipped so that empty placeholder chapters
/// never stall progress; they still report `is_complete == false`. Chapters
/// whose course is not in `courses` sort after every known course.
pub fn current_chapter<'a>(
  courses: &[Course],
  chapters: &'a [ChapterStats],
) -> Option<&'a ChapterStats> {
  let rank: HashMap<&CourseId, i64> = courses
    .iter()
    .map(|c| (&c.course_id, c.display_order))
    .collect();

  chapters
    .iter()
    .filter(|ch| ch.stats.total > 0 && !ch.stats.is_complete)
    .min_by_key(|ch| {
      (rank.get(&ch.course_id).copied().unwrap_or(i64::MAX), ch.number)
    })
}
