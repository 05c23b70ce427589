use std::fmt;

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::Serialize;

use crate::model::task::Task;

/// Due-date category a task is displayed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Bucket {
    #[serde(rename = "Today")]
    Today,
    #[serde(rename = "This week")]
    ThisWeek,
    #[serde(rename = "Later")]
    Later,
    #[serde(rename = "No date")]
    NoDate,
    #[serde(rename = "Done")]
    Done,
}

impl Bucket {
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Today => "Today",
            Bucket::ThisWeek => "This week",
            Bucket::Later => "Later",
            Bucket::NoDate => "No date",
            Bucket::Done => "Done",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Urgent x important matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quadrant {
    /// Urgent and important
    Do,
    /// Important, not urgent
    Schedule,
    /// Urgent, not important
    Delegate,
    /// Neither
    Drop,
}

/// `2*importance + urgency - effort`, with importance/urgency defaulting
/// to 0 and effort to 1.
pub fn score(task: &Task) -> i64 {
    let importance = task.importance.unwrap_or(0);
    let urgency = task.urgency.unwrap_or(0);
    let effort = task.effort.unwrap_or(1);
    2 * importance + urgency - effort
}

/// Bucket a task relative to the calendar day of `now`, in `now`'s own
/// time zone.
pub fn bucket<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Bucket {
    bucket_on(task, now.date_naive())
}

/// Bucket a task relative to a calendar day.
pub fn bucket_on(task: &Task, today: NaiveDate) -> Bucket {
    if task.done {
        return Bucket::Done;
    }
    let due = match task.due.as_deref().map(str::trim) {
        Some(due) if !due.is_empty() => due,
        _ => return Bucket::NoDate,
    };
    // An unreadable date never falls inside a window.
    let Some(due) = parse_due(due) else {
        return Bucket::Later;
    };
    let tomorrow = today + Days::new(1);
    let week_end = today + Days::new(7);
    if due >= today && due < tomorrow {
        Bucket::Today
    } else if due < week_end {
        Bucket::ThisWeek
    } else {
        Bucket::Later
    }
}

/// Urgent if urgency is explicitly >= 3; with no urgency set, urgent when
/// due today.
pub fn is_urgent<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    match task.urgency {
        Some(urgency) => urgency >= 3,
        None => bucket(task, now) == Bucket::Today,
    }
}

pub fn is_important(task: &Task) -> bool {
    task.importance.is_some_and(|importance| importance >= 3)
}

pub fn quadrant<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Quadrant {
    match (is_urgent(task, now), is_important(task)) {
        (true, true) => Quadrant::Do,
        (false, true) => Quadrant::Schedule,
        (true, false) => Quadrant::Delegate,
        (false, false) => Quadrant::Drop,
    }
}

/// Order tasks for display: by bucket, then highest score, then title.
pub fn rank<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<(Bucket, &'a Task)> {
    let today = now.date_naive();
    let mut ranked: Vec<(Bucket, &Task)> = tasks.iter().map(|t| (bucket_on(t, today), t)).collect();
    ranked.sort_by(|(ba, a), (bb, b)| {
        ba.cmp(bb)
            .then_with(|| score(b).cmp(&score(a)))
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });
    ranked
}

fn parse_due(due: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(due, "%Y-%m-%d")
        .ok()
        .or_else(|| due.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 17, 10, 0, 0).unwrap()
    }

    fn due(date: &str) -> Task {
        Task {
            due: Some(date.to_string()),
            ..Task::new(None, "t".into())
        }
    }

    #[test]
    fn test_score_defaults() {
        assert_eq!(score(&Task::default()), -1);
    }

    #[test]
    fn test_score_formula() {
        let task = Task {
            importance: Some(3),
            urgency: Some(2),
            effort: Some(1),
            ..Task::default()
        };
        assert_eq!(score(&task), 7);
    }

    #[test]
    fn test_done_always_buckets_done() {
        for date in ["2025-09-17", "2020-01-01", "2030-01-01"] {
            let mut task = due(date);
            task.done = true;
            assert_eq!(bucket(&task, &now()), Bucket::Done);
        }
        let task = Task {
            done: true,
            ..Task::default()
        };
        assert_eq!(bucket(&task, &now()), Bucket::Done);
    }

    #[test]
    fn test_buckets() {
        assert_eq!(bucket(&due("2025-09-17"), &now()), Bucket::Today);
        assert_eq!(bucket(&due("2025-09-20"), &now()), Bucket::ThisWeek);
        assert_eq!(bucket(&due("2025-09-23"), &now()), Bucket::ThisWeek);
        assert_eq!(bucket(&due("2025-09-24"), &now()), Bucket::Later);
        assert_eq!(bucket(&due("2025-10-01"), &now()), Bucket::Later);
        assert_eq!(bucket(&Task::default(), &now()), Bucket::NoDate);
    }

    #[test]
    fn test_overdue_is_this_week() {
        assert_eq!(bucket(&due("2025-09-10"), &now()), Bucket::ThisWeek);
    }

    #[test]
    fn test_blank_and_garbage_due() {
        assert_eq!(bucket(&due("  "), &now()), Bucket::NoDate);
        assert_eq!(bucket(&due("someday"), &now()), Bucket::Later);
    }

    #[test]
    fn test_bucket_uses_calendar_day_of_now() {
        // 23:30 UTC is already the next day at +02:00
        let late = Utc.with_ymd_and_hms(2025, 9, 16, 23, 30, 0).unwrap();
        let plus_two = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(bucket(&due("2025-09-17"), &late), Bucket::ThisWeek);
        assert_eq!(bucket(&due("2025-09-17"), &late.with_timezone(&plus_two)), Bucket::Today);
    }

    #[test]
    fn test_explicit_urgency_wins_over_due_date() {
        let mut task = due("2025-09-17");
        assert!(is_urgent(&task, &now()));
        task.urgency = Some(1);
        assert!(!is_urgent(&task, &now()));
        let task = Task {
            urgency: Some(3),
            ..Task::default()
        };
        assert!(is_urgent(&task, &now()));
    }

    #[test]
    fn test_important() {
        assert!(!is_important(&Task::default()));
        let task = Task {
            importance: Some(3),
            ..Task::default()
        };
        assert!(is_important(&task));
    }

    #[test]
    fn test_quadrants() {
        let task = Task {
            importance: Some(5),
            urgency: Some(5),
            ..Task::default()
        };
        assert_eq!(quadrant(&task, &now()), Quadrant::Do);
        let task = Task {
            importance: Some(5),
            ..Task::default()
        };
        assert_eq!(quadrant(&task, &now()), Quadrant::Schedule);
        assert_eq!(quadrant(&due("2025-09-17"), &now()), Quadrant::Delegate);
        assert_eq!(quadrant(&Task::default(), &now()), Quadrant::Drop);
    }

    #[test]
    fn test_rank_orders_by_bucket_then_score() {
        let tasks = vec![
            Task::new(Some("a".into()), "no date".into()),
            Task {
                importance: Some(1),
                ..due("2025-09-17")
            },
            Task {
                importance: Some(5),
                ..due("2025-09-17")
            },
            Task {
                done: true,
                ..Task::new(Some("d".into()), "done".into())
            },
        ];
        let ranked = rank(&tasks, &now());
        let order: Vec<(Bucket, Option<i64>)> =
            ranked.iter().map(|(b, t)| (*b, t.importance)).collect();
        assert_eq!(
            order,
            vec![
                (Bucket::Today, Some(5)),
                (Bucket::Today, Some(1)),
                (Bucket::NoDate, None),
                (Bucket::Done, None),
            ]
        );
    }

    #[test]
    fn test_bucket_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Bucket::ThisWeek).unwrap(), "\"This week\"");
        assert_eq!(Bucket::NoDate.to_string(), "No date");
    }
}
