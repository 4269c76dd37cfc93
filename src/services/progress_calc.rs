use rust_decimal::Decimal;
use time::Date;

const COURSE_COMPLETE_AT: i64 = 90;

pub(crate) fn ratio_percentage(completed: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    let completed = completed.clamp(0, total);
    (Decimal::from(completed) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
}

/// Lessons weigh 70% and quizzes 30%. A course without quizzes is measured on
/// lessons alone.
pub(crate) fn course_completion(
    completed_lessons: i64,
    total_lessons: i64,
    completed_quizzes: i64,
    total_quizzes: i64,
) -> Decimal {
    let lessons = ratio_percentage(completed_lessons, total_lessons);
    if total_quizzes <= 0 {
        return lessons;
    }
    let quizzes = ratio_percentage(completed_quizzes, total_quizzes);
    (lessons * Decimal::new(7, 1) + quizzes * Decimal::new(3, 1)).round_dp(2)
}

pub(crate) fn course_is_complete(completion: Decimal) -> bool {
    completion >= Decimal::from(COURSE_COMPLETE_AT)
}

pub(crate) fn bundle_is_complete(completion: Decimal) -> bool {
    completion >= Decimal::ONE_HUNDRED
}

pub(crate) fn average(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().copied().sum();
    (sum / Decimal::from(values.len())).round_dp(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Streak {
    pub(crate) current: i32,
    pub(crate) longest: i32,
    pub(crate) total_days: i32,
    pub(crate) last_activity: Option<Date>,
}

/// Applies one day of activity. Same-day activity leaves the streak as is.
pub(crate) fn record_activity(streak: Streak, today: Date) -> Streak {
    let (current, total_days) = match streak.last_activity {
        None => (1, 1),
        Some(last) => match (today - last).whole_days() {
            days if days <= 0 => return streak,
            1 => (streak.current + 1, streak.total_days + 1),
            _ => (1, streak.total_days + 1),
        },
    };

    Streak {
        current,
        longest: streak.longest.max(current),
        total_days,
        last_activity: Some(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn completion_weights_lessons_and_quizzes() {
        assert_eq!(course_completion(10, 10, 0, 2), Decimal::from(70));
        assert_eq!(course_completion(5, 10, 1, 2), Decimal::from(50));
        assert_eq!(course_completion(10, 10, 2, 2), Decimal::from(100));
        assert_eq!(course_completion(1, 3, 0, 1), Decimal::new(2333, 2));
    }

    #[test]
    fn course_without_quizzes_uses_lessons_only() {
        assert_eq!(course_completion(9, 10, 0, 0), Decimal::from(90));
        assert!(course_is_complete(course_completion(9, 10, 0, 0)));
        assert_eq!(course_completion(0, 0, 0, 0), Decimal::ZERO);
    }

    #[test]
    fn completion_threshold_is_ninety() {
        assert!(!course_is_complete(Decimal::new(8999, 2)));
        assert!(course_is_complete(Decimal::from(90)));
        assert!(!bundle_is_complete(Decimal::new(9999, 2)));
        assert!(bundle_is_complete(Decimal::ONE_HUNDRED));
    }

    #[test]
    fn average_of_best_scores() {
        assert_eq!(average(&[]), Decimal::ZERO);
        assert_eq!(average(&[Decimal::from(80), Decimal::from(90)]), Decimal::from(85));
    }

    #[test]
    fn streak_transitions() {
        let empty = Streak { current: 0, longest: 0, total_days: 0, last_activity: None };

        let first = record_activity(empty, date!(2025 - 03 - 01));
        assert_eq!((first.current, first.longest, first.total_days), (1, 1, 1));

        let same_day = record_activity(first, date!(2025 - 03 - 01));
        assert_eq!(same_day, first);

        let next = record_activity(first, date!(2025 - 03 - 02));
        assert_eq!((next.current, next.longest, next.total_days), (2, 2, 2));

        let gap = record_activity(next, date!(2025 - 03 - 05));
        assert_eq!((gap.current, gap.longest, gap.total_days), (1, 2, 3));
        assert_eq!(gap.last_activity, Some(date!(2025 - 03 - 05)));
    }
}
