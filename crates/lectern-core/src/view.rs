//! Computed read models: never stored, always derived from a catalog
//! snapshot and one user's completed lecture ids.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
  aggregate::{
    ChapterStats, CompletionStats, CourseStats, chapter_stats, course_stats,
    current_chapter, overall_stats,
  },
  catalog::{CatalogSnapshot, Chapter, Course, Lecture, LectureId},
};

/// Chart labels longer than this are cut and suffixed with `...`.
pub const CHART_LABEL_MAX_CHARS: usize = 25;

// ─── Building blocks ─────────────────────────────────────────────────────────

/// A lecture together with the viewing user's completion flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureStatus {
  #[serde(flatten)]
  pub lecture:   Lecture,
  pub completed: bool,
}

/// A chapter with its stats and lectures in presentation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterProgress {
  pub chapter:  Chapter,
  pub stats:    CompletionStats,
  pub lectures: Vec<LectureStatus>,
}

/// A course with its summed stats and chapters in number order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseProgress {
  pub course:   Course,
  pub stats:    CompletionStats,
  pub chapters: Vec<ChapterProgress>,
}

/// One bar of the per-course completion chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRow {
  pub name:            String,
  pub completion_rate: u8,
  pub completed:       usize,
  pub total:           usize,
}

/// The chapter the user should work on next, with its owning course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentChapter {
  pub course:  Course,
  pub chapter: Chapter,
  pub stats:   CompletionStats,
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// Everything the dashboard and progress pages show for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
  pub overall:            CompletionStats,
  /// Chapters with at least one lecture, all completed.
  pub completed_chapters: usize,
  pub total_chapters:     usize,
  pub current_chapter:    Option<CurrentChapter>,
  pub courses:            Vec<CourseProgress>,
  pub chart:              Vec<ChartRow>,
}

/// A single chapter page, with its owning course for navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterDetail {
  pub course:   Option<Course>,
  #[serde(flatten)]
  pub progress: ChapterProgress,
}

/// A row of the course list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSummary {
  pub course: Course,
  pub stats:  CompletionStats,
}

// ─── Builders ────────────────────────────────────────────────────────────────

fn lecture_statuses<'a>(
  lectures: impl Iterator<Item = &'a Lecture>,
  completed: &HashSet<LectureId>,
) -> Vec<LectureStatus> {
  lectures
    .map(|l| LectureStatus {
      lecture:   l.clone(),
      completed: completed.contains(&l.lecture_id),
    })
    .collect()
}

pub fn chapter_progress(
  catalog: &CatalogSnapshot,
  chapter: &Chapter,
  completed: &HashSet<LectureId>,
) -> ChapterProgress {
  let stats = chapter_stats(chapter, catalog.lectures_of_chapter(&chapter.chapter_id), completed);
  ChapterProgress {
    chapter:  chapter.clone(),
    stats:    stats.stats,
    lectures: lecture_statuses(catalog.lectures_of_chapter(&chapter.chapter_id), completed),
  }
}

pub fn course_progress(
  catalog: &CatalogSnapshot,
  course: &Course,
  completed: &HashSet<LectureId>,
) -> CourseProgress {
  let chapters: Vec<ChapterProgress> = catalog
    .chapters_of(&course.course_id)
    .map(|ch| chapter_progress(catalog, ch, completed))
    .collect();
  let rows: Vec<ChapterStats> = chapters.iter().map(as_stats).collect();
  let CourseStats { stats, .. } = course_stats(course, &rows);
  CourseProgress { course: course.clone(), stats, chapters }
}

fn as_stats(ch: &ChapterProgress) -> ChapterStats {
  ChapterStats {
    chapter_id: ch.chapter.chapter_id.clone(),
    course_id:  ch.chapter.course_id.clone(),
    number:     ch.chapter.number,
    stats:      ch.stats,
  }
}

/// Shorten `title` to [`CHART_LABEL_MAX_CHARS`] characters plus `...`.
pub fn chart_label(title: &str) -> String {
  if title.chars().count() > CHART_LABEL_MAX_CHARS {
    let mut short: String = title.chars().take(CHART_LABEL_MAX_CHARS).collect();
    short.push_str("...");
    short
  } else {
    title.to_owned()
  }
}

impl Dashboard {
  pub fn build(catalog: &CatalogSnapshot, completed: &HashSet<LectureId>) -> Self {
    let courses: Vec<CourseProgress> = catalog
      .courses
      .iter()
      .map(|c| course_progress(catalog, c, completed))
      .collect();

    // Every chapter, including ones whose course is missing from the catalog.
    let all_chapters: Vec<ChapterStats> = catalog
      .chapters
      .iter()
      .map(|ch| chapter_stats(ch, catalog.lectures_of_chapter(&ch.chapter_id), completed))
      .collect();

    let current_chapter = current_chapter(&catalog.courses, &all_chapters)
      .and_then(|cs| {
        let chapter = catalog.chapter(&cs.chapter_id)?;
        let course = catalog.course(&cs.course_id)?;
        Some(CurrentChapter {
          course:  course.clone(),
          chapter: chapter.clone(),
          stats:   cs.stats,
        })
      });

    let chart = courses
      .iter()
      .map(|cp| ChartRow {
        name:            chart_label(&cp.course.title),
        completion_rate: cp.stats.percent,
        completed:       cp.stats.completed,
        total:           cp.stats.total,
      })
      .collect();

    Self {
      overall: overall_stats(&catalog.lectures, completed),
      completed_chapters: all_chapters.iter().filter(|c| c.stats.is_complete).count(),
      total_chapters: all_chapters.len(),
      current_chapter,
      courses,
      chart,
    }
  }

  /// The course list, with stats, in display order.
  pub fn summaries(&self) -> Vec<CourseSummary> {
    self
      .courses
      .iter()
      .map(|cp| CourseSummary { course: cp.course.clone(), stats: cp.stats })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{Chapter, Course, Lecture};

  fn snapshot() -> CatalogSnapshot {
    let courses = vec![
      Course {
        course_id:     "course-2".into(),
        title:         "An exceptionally long course title for charts".into(),
        course_url:    "https://example.com/2".into(),
        phase:         2,
        instructor:    Some("Sato".into()),
        display_order: 2,
      },
      Course {
        course_id:     "course-1".into(),
        title:         "Statistics I".into(),
        course_url:    "https://example.com/1".into(),
        phase:         1,
        instructor:    None,
        display_order: 1,
      },
    ];
    let chapters = vec![
      Chapter { chapter_id: "course-2_ch-1".into(), course_id: "course-2".into(), number: 1, title: "Intro".into() },
      Chapter { chapter_id: "course-1_ch-2".into(), course_id: "course-1".into(), number: 2, title: "Estimation".into() },
      Chapter { chapter_id: "course-1_ch-1".into(), course_id: "course-1".into(), number: 1, title: "Probability".into() },
      Chapter { chapter_id: "course-1_ch-3".into(), course_id: "course-1".into(), number: 3, title: "Placeholder".into() },
    ];
    let lecture = |id: &str, ch: &str, course: &str, order: i64| Lecture {
      lecture_id: id.into(),
      chapter_id: ch.into(),
      course_id:  course.into(),
      title:      id.to_uppercase(),
      url:        format!("https://example.com/{id}"),
      order,
    };
    let lectures = vec![
      lecture("b", "course-1_ch-1", "course-1", 2),
      lecture("a", "course-1_ch-1", "course-1", 1),
      lecture("c", "course-1_ch-2", "course-1", 1),
      lecture("d", "course-1_ch-2", "course-1", 2),
      lecture("e", "course-1_ch-2", "course-1", 3),
      lecture("f", "course-2_ch-1", "course-2", 1),
    ];
    CatalogSnapshot::new(courses, chapters, lectures)
  }

  fn completed(ids: &[&str]) -> HashSet<LectureId> {
    ids.iter().map(|s| LectureId::from(*s)).collect()
  }

  #[test]
  fn dashboard_for_fresh_user() {
    let d = Dashboard::build(&snapshot(), &HashSet::new());
    assert_eq!(d.overall, CompletionStats::new(6, 0));
    assert_eq!(d.completed_chapters, 0);
    assert_eq!(d.total_chapters, 4);
    let current = d.current_chapter.unwrap();
    assert_eq!(current.chapter.chapter_id.as_str(), "course-1_ch-1");
  }

  #[test]
  fn dashboard_orders_and_aggregates() {
    let d = Dashboard::build(&snapshot(), &completed(&["a", "b", "d"]));

    let ids: Vec<&str> = d.courses.iter().map(|c| c.course.course_id.as_str()).collect();
    assert_eq!(ids, ["course-1", "course-2"]);

    let c1 = &d.courses[0];
    assert_eq!(c1.stats, CompletionStats::new(5, 3));
    assert_eq!(c1.stats.percent, 60);
    let numbers: Vec<i64> = c1.chapters.iter().map(|c| c.chapter.number).collect();
    assert_eq!(numbers, [1, 2, 3]);
    let lecture_ids: Vec<&str> = c1.chapters[0]
      .lectures
      .iter()
      .map(|l| l.lecture.lecture_id.as_str())
      .collect();
    assert_eq!(lecture_ids, ["a", "b"]);
    assert!(c1.chapters[0].stats.is_complete);

    assert_eq!(d.completed_chapters, 1);
    assert_eq!(
      d.current_chapter.unwrap().chapter.chapter_id.as_str(),
      "course-1_ch-2"
    );
  }

  #[test]
  fn current_chapter_moves_to_next_course_past_empty_chapter() {
    let d = Dashboard::build(&snapshot(), &completed(&["a", "b", "c", "d", "e"]));
    let current = d.current_chapter.unwrap();
    assert_eq!(current.course.course_id.as_str(), "course-2");
    assert_eq!(d.completed_chapters, 2);
  }

  #[test]
  fn chart_truncates_long_titles() {
    let d = Dashboard::build(&snapshot(), &completed(&["f"]));
    assert_eq!(d.chart[0].name, "Statistics I");
    assert_eq!(d.chart[1].name, "An exceptionally long cou...");
    assert_eq!(d.chart[1].completion_rate, 100);
    assert_eq!((d.chart[1].completed, d.chart[1].total), (1, 1));
  }

  #[test]
  fn chart_label_counts_characters_not_bytes() {
    let title = "統計データ解析".repeat(5);
    let label = chart_label(&title);
    assert_eq!(label.chars().count(), CHART_LABEL_MAX_CHARS + 3);
  }
}
