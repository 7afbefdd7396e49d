//! Derives productive and low-energy hours of the day from a user's
//! activity log.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};

use std::cmp::Ordering;

use super::data::*;

pub const ANALYSIS_WINDOW_DAYS: i64 = 30;
pub const MIN_ACTIVITIES_FOR_ANALYSIS: usize = 10;

const DEFAULT_HIGH_PRODUCTIVITY: &[HourRange] = &[
    HourRange { start: 9, end: 12 },
    HourRange { start: 14, end: 17 },
];
const DEFAULT_LOW_ENERGY: &[HourRange] = &[
    HourRange { start: 0, end: 7 },
    HourRange { start: 22, end: 23 },
];
const FALLBACK_REMINDER_HOUR: u32 = 9;

#[derive(Debug, Clone, Copy, Default)]
struct HourStats {
    activities: usize,
    completions: usize,
}

impl HourStats {
    /// Compares completion rates without going through floats.
    fn rate_cmp(&self, other: &HourStats) -> Ordering {
        (self.completions * other.activities).cmp(&(other.completions * self.activities))
    }
}

/// Collapses hours into inclusive runs of consecutive hours.
pub fn group_into_ranges(hours: &[u32]) -> Vec<HourRange> {
    let mut hours = hours.to_vec();
    hours.sort_unstable();
    hours.dedup();

    let mut ranges: Vec<HourRange> = vec![];
    for hour in hours {
        match ranges.last_mut() {
            Some(range) if range.end + 1 == hour => range.end = hour,
            _ => ranges.push(HourRange { start: hour, end: hour }),
        }
    }

    ranges
}

pub fn analyze(activities: &[ActivityLog]) -> ProductivityAnalysis {
    let count = |activity_type: ActivityType| {
        activities
            .iter()
            .filter(|activity| activity.activity_type == activity_type)
            .count()
    };
    let completed_tasks = count(ActivityType::TaskCompleted);
    let missed_tasks = count(ActivityType::TaskMissed);

    let mut hourly = [HourStats::default(); 24];
    for activity in activities {
        let stats = &mut hourly[activity.timestamp.hour() as usize];
        stats.activities += 1;
        if activity.activity_type == ActivityType::TaskCompleted {
            stats.completions += 1;
        }
    }

    let mut most_active: Vec<HourCount> = (0..24u32)
        .filter(|hour| hourly[*hour as usize].activities > 0)
        .map(|hour| HourCount {
            hour,
            count: hourly[hour as usize].activities,
        })
        .collect();
    most_active.sort_by(|a, b| b.count.cmp(&a.count).then(a.hour.cmp(&b.hour)));
    most_active.truncate(5);

    if activities.len() < MIN_ACTIVITIES_FOR_ANALYSIS {
        return ProductivityAnalysis {
            high_productivity_hours: DEFAULT_HIGH_PRODUCTIVITY.to_vec(),
            low_energy_hours: DEFAULT_LOW_ENERGY.to_vec(),
            total_activities: activities.len(),
            completed_tasks,
            missed_tasks,
            most_active_hours: most_active,
            personalized: false,
        };
    }

    let mut active_hours: Vec<u32> = (0..24u32)
        .filter(|hour| hourly[*hour as usize].activities >= 2)
        .collect();
    active_hours.sort_by(|a, b| {
        hourly[*b as usize]
            .rate_cmp(&hourly[*a as usize])
            .then(a.cmp(b))
    });

    let high_productivity: Vec<u32> = if active_hours.is_empty() {
        vec![9, 10, 14, 15]
    } else {
        let top = (active_hours.len() / 4).max(1);
        active_hours.into_iter().take(top).collect()
    };

    let low_energy: Vec<u32> = (0..24u32)
        .filter(|hour| hourly[*hour as usize].activities == 0 && !high_productivity.contains(hour))
        .collect();

    ProductivityAnalysis {
        high_productivity_hours: group_into_ranges(&high_productivity),
        low_energy_hours: group_into_ranges(&low_energy),
        total_activities: activities.len(),
        completed_tasks,
        missed_tasks,
        most_active_hours: most_active,
        personalized: true,
    }
}

fn at_hour(day: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);

    Utc.from_utc_datetime(&day.date_naive().and_time(time))
}

/// Start of the next high-productivity window after the current hour.
pub fn optimal_reminder_time(analysis: &ProductivityAnalysis, now: DateTime<Utc>) -> DateTime<Utc> {
    let current_hour = now.hour();

    if let Some(range) = analysis
        .high_productivity_hours
        .iter()
        .find(|range| range.start > current_hour)
    {
        return at_hour(now, range.start);
    }

    let tomorrow = now + Duration::days(1);
    match analysis.high_productivity_hours.first() {
        Some(range) => at_hour(tomorrow, range.start),
        None => at_hour(tomorrow, FALLBACK_REMINDER_HOUR),
    }
}

/// Reminders are held back during low-energy hours.
pub fn should_send_reminder_now(analysis: &ProductivityAnalysis, now: DateTime<Utc>) -> bool {
    let current_hour = now.hour();

    !analysis
        .low_energy_hours
        .iter()
        .any(|range| range.contains(current_hour))
}

pub fn engagement(total_reminders: i64, acted_on: i64) -> Engagement {
    let engagement_rate = if total_reminders > 0 {
        (acted_on as f64 / total_reminders as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };

    Engagement {
        total_reminders,
        acted_on,
        engagement_rate,
    }
}

pub fn recommendations(analysis: &ProductivityAnalysis, now: DateTime<Utc>) -> Recommendations {
    Recommendations {
        next_optimal_reminder_time: optimal_reminder_time(analysis, now),
        should_send_reminder_now: should_send_reminder_now(analysis, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, hour, 30, 0).unwrap()
    }

    fn activity(activity_type: ActivityType, hour: u32) -> ActivityLog {
        ActivityLog {
            id: 0,
            user_id: String::from("ana"),
            activity_type,
            related_entity_type: None,
            related_entity_id: None,
            activity_data: None,
            timestamp: at(1, hour),
        }
    }

    fn ranges(pairs: &[(u32, u32)]) -> Vec<HourRange> {
        pairs
            .iter()
            .map(|(start, end)| HourRange { start: *start, end: *end })
            .collect()
    }

    #[test]
    fn consecutive_hours_collapse_into_ranges() {
        assert!(group_into_ranges(&[]).is_empty());
        assert_eq!(
            group_into_ranges(&[23, 0, 1, 2, 9, 10, 14]),
            ranges(&[(0, 2), (9, 10), (14, 14), (23, 23)])
        );
    }

    #[test]
    fn sparse_history_gets_the_default_profile() {
        let activities = vec![activity(ActivityType::TaskCompleted, 20); 9];

        let analysis = analyze(&activities);

        assert!(!analysis.personalized);
        assert_eq!(analysis.high_productivity_hours, ranges(&[(9, 12), (14, 17)]));
        assert_eq!(analysis.low_energy_hours, ranges(&[(0, 7), (22, 23)]));
        assert_eq!(analysis.completed_tasks, 9);
    }

    #[test]
    fn best_completion_rates_become_high_productivity_hours() {
        let mut activities = vec![];
        // Hour 6 always completes, hour 8 half the time, hours 10 and 20 never.
        activities.extend(vec![activity(ActivityType::TaskCompleted, 6); 2]);
        activities.push(activity(ActivityType::TaskCompleted, 8));
        activities.push(activity(ActivityType::TaskUpdated, 8));
        activities.extend(vec![activity(ActivityType::TaskCreated, 10); 3]);
        activities.extend(vec![activity(ActivityType::TaskMissed, 20); 2]);
        activities.push(activity(ActivityType::GoalCreated, 21));

        let analysis = analyze(&activities);

        assert!(analysis.personalized);
        assert_eq!(analysis.high_productivity_hours, ranges(&[(6, 6)]));
        assert_eq!(
            analysis.low_energy_hours,
            ranges(&[(0, 5), (7, 7), (9, 9), (11, 19), (22, 23)])
        );
        assert_eq!(analysis.missed_tasks, 2);
        assert_eq!(analysis.most_active_hours[0], HourCount { hour: 10, count: 3 });
    }

    #[test]
    fn reminders_aim_for_the_next_productive_window() {
        let analysis = analyze(&[]);

        assert_eq!(optimal_reminder_time(&analysis, at(2, 8)), Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap());
        assert_eq!(optimal_reminder_time(&analysis, at(2, 11)), Utc.with_ymd_and_hms(2026, 4, 2, 14, 0, 0).unwrap());
        assert_eq!(optimal_reminder_time(&analysis, at(2, 15)), Utc.with_ymd_and_hms(2026, 4, 3, 9, 0, 0).unwrap());

        let empty = ProductivityAnalysis {
            high_productivity_hours: vec![],
            ..analysis
        };
        assert_eq!(optimal_reminder_time(&empty, at(2, 3)), Utc.with_ymd_and_hms(2026, 4, 3, 9, 0, 0).unwrap());
    }

    #[test]
    fn low_energy_hours_hold_reminders_back() {
        let analysis = analyze(&[]);

        assert!(!should_send_reminder_now(&analysis, at(2, 3)));
        assert!(!should_send_reminder_now(&analysis, at(2, 22)));
        assert!(should_send_reminder_now(&analysis, at(2, 10)));
        assert!(should_send_reminder_now(&analysis, at(2, 19)));
    }

    #[test]
    fn engagement_rate_is_a_rounded_percentage() {
        assert_eq!(engagement(0, 0).engagement_rate, 0.0);
        assert_eq!(engagement(3, 1).engagement_rate, 33.33);
        assert_eq!(engagement(4, 4).engagement_rate, 100.0);
    }
}
