//! Builds reminder rows from a snapshot of a user's goals and tasks.
//!
//! Wording rotates with the day of the year instead of being random, so the
//! same snapshot at the same moment always yields the same reminders.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc, Weekday};

use crate::goals::data::GoalID;
use crate::tasks::data::{Task, TaskID};

use super::data::*;

const MORNING: &[&str] = &[
    "Good morning! Ready to make today count?",
    "A fresh start awaits. Let's tackle those goals together.",
    "New day, new opportunities. You've got this!",
    "Morning! Time to turn plans into progress.",
];

const PROGRESS: &[&str] = &[
    "You're making great progress! Keep up the momentum!",
    "Look how far you've come. Every step counts.",
    "Proud of your dedication. You're on the right track.",
    "Your consistency is paying off. Keep going!",
];

const MISSED_TASK: &[&str] = &[
    "No worries, life happens. Ready to get back on track?",
    "It's okay to miss a step. What matters is getting back up.",
    "Let's reset and refocus. You've got this!",
    "Every moment is a chance for a fresh start.",
];

const COMPLETION: &[&str] = &[
    "Awesome work! You completed another task!",
    "You're crushing it! Another win in the books!",
    "Look at you go! Keep that energy up!",
    "Success! You're building great habits!",
];

const WEEKLY: &[&str] = &[
    "Week check-in! You've accomplished a lot. What's next?",
    "Time to reflect on your progress this week.",
    "Another week of growth. Ready for the next challenge?",
    "Your weekly journey continues. Stay focused!",
];

const ENCOURAGEMENT: &[&str] = &[
    "Remember: progress, not perfection. You're doing great.",
    "Small steps lead to big results. Keep moving forward.",
    "Believe in yourself. You can do this.",
    "You're capable of amazing things, one task at a time.",
];

fn pick(pool: &'static [&'static str], now: DateTime<Utc>) -> &'static str {
    pool[now.ordinal0() as usize % pool.len()]
}

fn greeting(now: DateTime<Utc>) -> &'static str {
    match now.hour() {
        5..=11 => pick(MORNING, now),
        12..=16 => "Good afternoon! Ready to power through?",
        17..=20 => "Good evening! Let's make the most of your time.",
        _ => "Hey there! Late night productivity session?",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub goal_id: GoalID,
    pub title: String,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

impl GoalProgress {
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.completed * 100 / self.total
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverdueTask {
    pub goal_id: GoalID,
    pub task_id: TaskID,
    pub title: String,
}

/// What contextual generation looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderContext {
    pub goals: Vec<GoalProgress>,
    pub not_started_tasks: usize,
    pub overdue_task: Option<OverdueTask>,
    pub completed_this_week: usize,
    pub has_recent_weekly_review: bool,
}

fn reminder(
    user_id: &str,
    reminder_type: ReminderType,
    title: &str,
    message: String,
    motivation_level: MotivationLevel,
    scheduled_time: DateTime<Utc>,
) -> NewReminder {
    NewReminder {
        user_id: user_id.to_string(),
        reminder_type,
        goal_id: None,
        task_id: None,
        title: title.to_string(),
        message,
        motivation_level,
        scheduled_time,
        status: ReminderStatus::Pending,
        delivered_at: None,
    }
}

/// Check-ins are delivered as soon as they are created.
pub fn daily_checkin(
    user_id: &str,
    goal_count: usize,
    not_started_tasks: usize,
    now: DateTime<Utc>,
) -> NewReminder {
    let message = format!(
        "{}\n\nYou have {} active goal(s) and {} task(s) waiting for you.\n\nWhat would you like to focus on right now?",
        greeting(now),
        goal_count,
        not_started_tasks
    );

    NewReminder {
        status: ReminderStatus::Delivered,
        delivered_at: Some(now),
        ..reminder(
            user_id,
            ReminderType::DailyCheckin,
            "Daily Check-In",
            message,
            MotivationLevel::Encouraging,
            now,
        )
    }
}

pub fn missed_task(user_id: &str, task: &OverdueTask, now: DateTime<Utc>) -> NewReminder {
    let message = format!(
        "{}\n\nTask: {}\n\nTake your time, and when you're ready, let's get it done together!",
        pick(MISSED_TASK, now),
        task.title
    );

    NewReminder {
        goal_id: Some(task.goal_id),
        task_id: Some(task.task_id),
        ..reminder(
            user_id,
            ReminderType::MissedTask,
            "Gentle Nudge",
            message,
            MotivationLevel::Gentle,
            now,
        )
    }
}

pub fn progress_update(user_id: &str, goal: &GoalProgress, now: DateTime<Utc>) -> NewReminder {
    let message = format!(
        "{}\n\nGoal: {}\nProgress: {}/{} tasks ({}%)\n\nKeep that momentum going!",
        pick(PROGRESS, now),
        goal.title,
        goal.completed,
        goal.total,
        goal.percent()
    );

    NewReminder {
        goal_id: Some(goal.goal_id),
        ..reminder(
            user_id,
            ReminderType::ProgressUpdate,
            "Progress Update",
            message,
            MotivationLevel::Positive,
            now,
        )
    }
}

pub fn keep_going(user_id: &str, goal: &GoalProgress, now: DateTime<Utc>) -> NewReminder {
    let message = format!(
        "You're making progress on '{}'!\n\nYou have {} task(s) in progress. Let's keep the momentum going!",
        goal.title, goal.in_progress
    );

    NewReminder {
        goal_id: Some(goal.goal_id),
        ..reminder(
            user_id,
            ReminderType::ProgressUpdate,
            "Keep Going!",
            message,
            MotivationLevel::Encouraging,
            now,
        )
    }
}

/// Celebrations are delivered immediately.
pub fn completion_celebration(user_id: &str, task: &Task, now: DateTime<Utc>) -> NewReminder {
    let message = format!(
        "{}\n\nYou completed: {}\n\nEvery accomplishment, big or small, is worth celebrating!",
        pick(COMPLETION, now),
        task.title
    );

    NewReminder {
        goal_id: Some(task.goal_id),
        task_id: Some(task.id),
        status: ReminderStatus::Delivered,
        delivered_at: Some(now),
        ..reminder(
            user_id,
            ReminderType::Celebration,
            "Achievement Unlocked!",
            message,
            MotivationLevel::Positive,
            now,
        )
    }
}

/// The coming Sunday at 18:00 UTC, strictly after `now`.
pub fn next_weekly_review_time(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_until_sunday = (7 + Weekday::Sun.num_days_from_monday()
        - now.weekday().num_days_from_monday())
        % 7;
    let evening = NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN);
    let sunday = Utc.from_utc_datetime(
        &(now.date_naive() + Duration::days(days_until_sunday as i64)).and_time(evening),
    );

    if sunday <= now {
        sunday + Duration::weeks(1)
    } else {
        sunday
    }
}

pub fn weekly_review(user_id: &str, completed_this_week: usize, now: DateTime<Utc>) -> NewReminder {
    let message = format!(
        "{}\n\nThis week, you completed {} task(s)!\n\nTake a moment to reflect on your progress and plan for the week ahead.",
        pick(WEEKLY, now),
        completed_this_week
    );

    reminder(
        user_id,
        ReminderType::WeeklyReview,
        "Weekly Review",
        message,
        MotivationLevel::Encouraging,
        next_weekly_review_time(now),
    )
}

pub fn custom_motivation(
    user_id: &str,
    goal_count: usize,
    not_started_tasks: usize,
    now: DateTime<Utc>,
) -> NewReminder {
    let mut message = format!(
        "{}\n\nYou have {} active goal(s).",
        pick(ENCOURAGEMENT, now),
        goal_count
    );

    if not_started_tasks > 0 {
        message.push_str(&format!(
            "\nReady to tackle one of your {} pending task(s)? Every small step counts!",
            not_started_tasks
        ));
    } else {
        message.push_str("\nYou're all caught up! Great work staying on top of your goals!");
    }

    reminder(
        user_id,
        ReminderType::Motivation,
        "You've Got This!",
        message,
        MotivationLevel::Encouraging,
        now,
    )
}

/// The reminders a user should get right now. Never empty.
pub fn detect_needed_reminders(
    user_id: &str,
    context: &ReminderContext,
    now: DateTime<Utc>,
) -> Vec<NewReminder> {
    let mut reminders = vec![];

    if context.not_started_tasks >= 3 {
        reminders.push(reminder(
            user_id,
            ReminderType::Motivation,
            "Time to Make Progress!",
            format!(
                "{}\n\nYou have {} tasks waiting. Pick one and let's get started!",
                pick(ENCOURAGEMENT, now),
                context.not_started_tasks
            ),
            MotivationLevel::Encouraging,
            now,
        ));
    }

    if let Some(task) = &context.overdue_task {
        reminders.push(missed_task(user_id, task, now));
    }

    // At most one progress reminder, for the first goal that qualifies.
    for goal in context.goals.iter().filter(|goal| goal.total > 0) {
        let percent = goal.percent();

        if (25..100).contains(&percent) {
            reminders.push(progress_update(user_id, goal, now));
            break;
        } else if goal.in_progress > 0 {
            reminders.push(keep_going(user_id, goal, now));
            break;
        }
    }

    if reminders.is_empty() {
        reminders.push(custom_motivation(
            user_id,
            context.goals.len(),
            context.not_started_tasks,
            now,
        ));
    }

    if !context.has_recent_weekly_review {
        reminders.push(weekly_review(user_id, context.completed_this_week, now));
    }

    reminders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn goal(goal_id: GoalID, total: usize, completed: usize, in_progress: usize) -> GoalProgress {
        GoalProgress {
            goal_id,
            title: format!("goal {}", goal_id),
            total,
            completed,
            in_progress,
        }
    }

    fn types(reminders: &[NewReminder]) -> Vec<ReminderType> {
        reminders.iter().map(|r| r.reminder_type).collect()
    }

    #[test]
    fn empty_context_still_yields_motivation() {
        let context = ReminderContext {
            has_recent_weekly_review: true,
            ..Default::default()
        };

        let reminders = detect_needed_reminders("ana", &context, at(2026, 4, 2, 10));

        assert_eq!(types(&reminders), vec![ReminderType::Motivation]);
        assert!(reminders[0].message.contains("all caught up"));
    }

    #[test]
    fn picks_the_first_goal_with_real_progress() {
        let context = ReminderContext {
            goals: vec![goal(1, 10, 0, 0), goal(2, 4, 1, 0), goal(3, 4, 2, 1)],
            not_started_tasks: 2,
            has_recent_weekly_review: true,
            ..Default::default()
        };

        let reminders = detect_needed_reminders("ana", &context, at(2026, 4, 2, 10));

        assert_eq!(types(&reminders), vec![ReminderType::ProgressUpdate]);
        assert_eq!(reminders[0].goal_id, Some(2));
        assert!(reminders[0].message.contains("1/4 tasks (25%)"));
    }

    #[test]
    fn finished_goals_fall_through_to_in_progress_ones() {
        let context = ReminderContext {
            goals: vec![goal(1, 2, 2, 0), goal(2, 9, 1, 1)],
            has_recent_weekly_review: true,
            ..Default::default()
        };

        let reminders = detect_needed_reminders("ana", &context, at(2026, 4, 2, 10));

        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].title, "Keep Going!");
        assert_eq!(reminders[0].goal_id, Some(2));
    }

    #[test]
    fn backlog_overdue_and_weekly_review_stack_up() {
        let context = ReminderContext {
            goals: vec![goal(1, 6, 0, 0)],
            not_started_tasks: 6,
            overdue_task: Some(OverdueTask {
                goal_id: 1,
                task_id: 7,
                title: String::from("Read chapter 1"),
            }),
            completed_this_week: 0,
            has_recent_weekly_review: false,
        };

        let reminders = detect_needed_reminders("ana", &context, at(2026, 4, 2, 10));

        assert_eq!(
            types(&reminders),
            vec![
                ReminderType::Motivation,
                ReminderType::MissedTask,
                ReminderType::WeeklyReview
            ]
        );
        assert_eq!(reminders[1].task_id, Some(7));
        assert_eq!(reminders[2].status, ReminderStatus::Pending);
        assert!(reminders[2].scheduled_time > at(2026, 4, 2, 10));
    }

    #[test]
    fn weekly_review_lands_on_sunday_evening() {
        // 2026-04-02 is a Thursday.
        assert_eq!(next_weekly_review_time(at(2026, 4, 2, 10)), at(2026, 4, 5, 18));
        // Sunday before and after the review hour.
        assert_eq!(next_weekly_review_time(at(2026, 4, 5, 9)), at(2026, 4, 5, 18));
        assert_eq!(next_weekly_review_time(at(2026, 4, 5, 19)), at(2026, 4, 12, 18));
    }

    #[test]
    fn checkins_and_celebrations_are_delivered_at_once() {
        let now = at(2026, 4, 2, 7);
        let checkin = daily_checkin("ana", 2, 5, now);

        assert_eq!(checkin.status, ReminderStatus::Delivered);
        assert_eq!(checkin.delivered_at, Some(now));
        assert!(checkin.message.contains("2 active goal(s) and 5 task(s)"));
        assert!(MORNING.iter().any(|line| checkin.message.starts_with(line)));
    }

    #[test]
    fn wording_is_deterministic() {
        let now = at(2026, 4, 2, 22);

        assert_eq!(daily_checkin("ana", 1, 1, now), daily_checkin("ana", 1, 1, now));
        assert!(daily_checkin("ana", 1, 1, now).message.starts_with("Hey there!"));
    }
}
