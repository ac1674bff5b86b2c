use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Trailing windows used for per-period completion counts.
pub const PERIODS: [(&str, i64); 3] = [("week", 7), ("month", 30), ("year", 365)];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub completions: u32,
    pub days: i64,
}

/// Streak statistics derived from one habit's completion history.
///
/// Recomputed on demand from the completion date list; nothing here is
/// persisted. `compute` is a total function: any well-formed input yields a
/// result, including an empty history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitStats {
    pub is_bad: bool,
    pub win_streaks: Vec<u32>,
    pub loss_streaks: Vec<u32>,
    pub current_streak: u32,
    pub completed_today: bool,
    pub completed_yesterday: bool,
    pub periods: BTreeMap<String, PeriodStats>,
}

impl HabitStats {
    /// Single descending pass over `completions` (most recent first).
    ///
    /// A gap of exactly one day between runs is no loss; a wider gap records
    /// the days strictly between the two completions, except when yesterday
    /// itself was missed, where the miss already started at yesterday and the
    /// raw gap is recorded. Future-dated and duplicate entries are skipped.
    pub fn compute(
        is_bad: bool,
        date_created: NaiveDate,
        completions: &[NaiveDate],
        today: NaiveDate,
    ) -> Self {
        let yesterday = today - Duration::days(1);

        let mut win_streaks: Vec<u32> = Vec::new();
        let mut loss_streaks: Vec<u32> = Vec::new();
        let mut period_counts = [0u32; PERIODS.len()];
        let mut win_streak: u32 = 0;
        let mut completed_today = false;
        let mut completed_yesterday = false;
        let mut last_date = yesterday;
        let mut previous: Option<NaiveDate> = None;

        for &date in completions {
            if date > today {
                continue;
            }
            if previous == Some(date) {
                continue;
            }
            previous = Some(date);

            if date == today {
                completed_today = true;
                continue;
            }

            let delta = (last_date - date).num_days();
            let behind = (yesterday - date).num_days();
            for (index, (_, days)) in PERIODS.iter().enumerate() {
                if (0..*days).contains(&behind) {
                    period_counts[index] += 1;
                }
            }

            if date == yesterday {
                completed_yesterday = true;
                win_streak = 1;
                continue;
            } else if delta == 1 && (completed_yesterday || last_date != yesterday) {
                win_streak += 1;
            } else {
                if last_date == yesterday && !completed_yesterday {
                    loss_streaks.push(delta as u32);
                } else {
                    loss_streaks.push((delta - 1) as u32);
                }
                if win_streak > 0 {
                    win_streaks.push(win_streak);
                }
                win_streak = 1;
            }
            last_date = date;
        }

        if previous.is_none() {
            // Empty history: all-zero streaks, no trailing creation gap.
            return Self {
                is_bad,
                win_streaks,
                loss_streaks,
                current_streak: 0,
                completed_today: false,
                completed_yesterday: false,
                periods: build_periods(period_counts, date_created.min(yesterday), yesterday),
            };
        }

        if win_streak > 0 {
            win_streaks.push(win_streak);
        }

        let start_date = date_created.min(last_date);
        let trailing_gap = (last_date - start_date).num_days();
        if trailing_gap > 1 {
            loss_streaks.push(trailing_gap as u32);
        }

        let mut current_streak = 0;
        if is_bad {
            // The active clean run exists only while the front of the
            // timeline is a gap.
            if !completed_today && !completed_yesterday {
                current_streak = loss_streaks.first().copied().unwrap_or(0);
            }
        } else if completed_today {
            if completed_yesterday {
                if let Some(first) = win_streaks.first_mut() {
                    *first += 1;
                    current_streak = *first;
                }
            } else {
                win_streaks.insert(0, 1);
                current_streak = 1;
            }
        } else if completed_yesterday {
            current_streak = win_streaks.first().copied().unwrap_or(0);
        }

        Self {
            is_bad,
            win_streaks,
            loss_streaks,
            current_streak,
            completed_today,
            completed_yesterday,
            periods: build_periods(period_counts, start_date, yesterday),
        }
    }

    /// The streak list relevant to this habit's classification: clean-day
    /// runs for a bad habit, completion runs for a good one.
    pub fn streaks(&self) -> &[u32] {
        if self.is_bad {
            &self.loss_streaks
        } else {
            &self.win_streaks
        }
    }

    pub fn longest_streak(&self) -> u32 {
        self.streaks().iter().copied().max().unwrap_or(0)
    }

    pub fn streak_text(&self) -> String {
        if self.current_streak == 0 {
            if self.is_bad && self.completed_today {
                "🌅 Tomorrow is a new day".to_string()
            } else {
                "🌱 Start a new streak!".to_string()
            }
        } else if self.completed_today {
            let plural = if self.current_streak > 1 { "s" } else { "" };
            format!("🎉 {} day{plural} and counting!", self.current_streak)
        } else {
            format!("⏳ {} day streak on the line!", self.current_streak)
        }
    }
}

fn build_periods(
    counts: [u32; PERIODS.len()],
    start_date: NaiveDate,
    yesterday: NaiveDate,
) -> BTreeMap<String, PeriodStats> {
    let total_days = (yesterday - start_date).num_days() + 1;

    PERIODS
        .iter()
        .zip(counts)
        .map(|((name, days), completions)| {
            (
                (*name).to_string(),
                PeriodStats {
                    completions,
                    days: (*days).min(total_days),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{HabitStats, PERIODS};
    use chrono::{Duration, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date")
    }

    fn days_ago(offsets: &[i64]) -> Vec<NaiveDate> {
        let mut dates = offsets
            .iter()
            .map(|offset| today() - Duration::days(*offset))
            .collect::<Vec<_>>();
        dates.sort();
        dates.reverse();
        dates
    }

    fn scenario_offsets() -> Vec<i64> {
        vec![1, 2, 3, 6, 7, 8, 9, 10, 12, 13, 18]
    }

    fn compute(is_bad: bool, created_days_ago: i64, offsets: &[i64]) -> HabitStats {
        HabitStats::compute(
            is_bad,
            today() - Duration::days(created_days_ago),
            &days_ago(offsets),
            today(),
        )
    }

    #[test]
    fn good_habit_win_streaks() {
        let stats = compute(false, 20, &scenario_offsets());
        assert_eq!(stats.win_streaks, vec![3, 5, 2, 1]);
        assert_eq!(stats.longest_streak(), 5);
        assert_eq!(stats.current_streak, 3);
        assert!(!stats.completed_today);
        assert!(stats.completed_yesterday);
    }

    #[test]
    fn bad_habit_loss_streaks() {
        let stats = compute(true, 20, &scenario_offsets());
        assert_eq!(stats.loss_streaks, vec![2, 1, 4, 2]);
        assert_eq!(stats.longest_streak(), 4);
    }

    #[test]
    fn good_habit_completed_today_extends_front_run() {
        let mut offsets = scenario_offsets();
        offsets.insert(0, 0);
        let stats = compute(false, 20, &offsets);
        assert_eq!(stats.current_streak, 4);
        assert_eq!(stats.win_streaks, vec![4, 5, 2, 1]);
        assert!(stats.completed_today);
    }

    #[test]
    fn good_habit_completed_today_after_gap_starts_run_of_one() {
        let stats = compute(false, 20, &[0, 4]);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.win_streaks, vec![1, 1]);
    }

    #[test]
    fn bad_habit_single_completion_counts_clean_days() {
        let stats = compute(true, 20, &[4]);
        assert_eq!(stats.current_streak, 3);
        assert!(!stats.completed_today);
    }

    #[test]
    fn bad_habit_completed_yesterday_has_no_clean_run() {
        let stats = compute(true, 20, &[4, 1]);
        assert_eq!(stats.current_streak, 0);
        assert!(!stats.completed_today);
    }

    #[test]
    fn bad_habit_completed_today_resets_clean_run() {
        let stats = compute(true, 20, &[4, 0]);
        assert_eq!(stats.current_streak, 0);
        assert!(stats.completed_today);
        assert_eq!(stats.streak_text(), "🌅 Tomorrow is a new day");
    }

    #[test]
    fn empty_history_is_all_zero() {
        let stats = compute(false, 20, &[]);
        assert_eq!(stats.current_streak, 0);
        assert!(stats.win_streaks.is_empty());
        assert!(stats.loss_streaks.is_empty());
        assert_eq!(stats.streak_text(), "🌱 Start a new streak!");
        for (_, period) in &stats.periods {
            assert_eq!(period.completions, 0);
        }
    }

    #[test]
    fn win_days_never_exceed_completion_count() {
        let offsets = scenario_offsets();
        let stats = compute(false, 20, &offsets);
        let total: u32 = stats.win_streaks.iter().sum();
        assert!(total as usize <= offsets.len());
    }

    #[test]
    fn future_dated_completions_are_ignored() {
        let with_future = compute(false, 20, &[-3, -1, 1, 2, 3]);
        let without = compute(false, 20, &[1, 2, 3]);
        assert_eq!(with_future, without);
    }

    #[test]
    fn duplicate_dates_are_idempotent() {
        let duplicated = days_ago(&[2, 2, 1, 1, 5]);
        let unique = days_ago(&[2, 1, 5]);
        let created = today() - Duration::days(20);
        assert_eq!(
            HabitStats::compute(false, created, &duplicated, today()),
            HabitStats::compute(false, created, &unique, today()),
        );
    }

    #[test]
    fn period_counts_respect_windows() {
        // Offsets 1..=8 from today put 7 completions inside the trailing
        // week window (yesterday back 7 days) and all 8 inside the month.
        let stats = compute(false, 400, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(stats.periods["week"].completions, 7);
        assert_eq!(stats.periods["month"].completions, 8);
        assert_eq!(stats.periods["year"].completions, 8);
        assert_eq!(stats.periods["week"].days, 7);
        assert_eq!(stats.periods["month"].days, 30);
        assert_eq!(stats.periods["year"].days, 365);
    }

    #[test]
    fn period_days_cap_at_habit_age() {
        let stats = compute(false, 10, &[1, 2]);
        assert_eq!(stats.periods["week"].days, 7);
        assert_eq!(stats.periods["month"].days, 10);
        assert_eq!(stats.periods["year"].days, 10);
    }

    #[test]
    fn completion_today_is_excluded_from_period_counts() {
        let stats = compute(false, 20, &[0, 1]);
        assert_eq!(stats.periods["week"].completions, 1);
    }

    #[test]
    fn gap_to_creation_records_trailing_loss() {
        // Created 20 days ago, earliest completion 18 days ago: two clean
        // days before the first run.
        let stats = compute(true, 20, &scenario_offsets());
        assert_eq!(stats.loss_streaks.last().copied(), Some(2));
    }

    #[test]
    fn streak_text_pluralizes() {
        let one_day = compute(false, 20, &[0]);
        assert_eq!(one_day.streak_text(), "🎉 1 day and counting!");

        let on_the_line = compute(false, 20, &scenario_offsets());
        assert_eq!(on_the_line.streak_text(), "⏳ 3 day streak on the line!");
    }

    #[test]
    fn period_table_matches_declared_windows() {
        let stats = compute(false, 400, &[]);
        assert_eq!(stats.periods.len(), PERIODS.len());
        for (name, _) in PERIODS {
            assert!(stats.periods.contains_key(name));
        }
    }
}
