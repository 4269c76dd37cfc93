use rust_decimal::Decimal;

use crate::db::types::{AssessmentType, AttemptStatus, QuestionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GradedAnswer {
    pub(crate) marks_awarded: Decimal,
    pub(crate) is_correct: bool,
}

/// Scores one answer. Only mcq and true_false are auto-graded; everything else
/// stays at zero until a human grades it.
pub(crate) fn grade_answer(
    question_type: QuestionType,
    question_marks: i32,
    selected_option_correct: Option<bool>,
) -> GradedAnswer {
    if !question_type.is_auto_graded() {
        return GradedAnswer { marks_awarded: Decimal::ZERO, is_correct: false };
    }

    match selected_option_correct {
        Some(true) => GradedAnswer { marks_awarded: Decimal::from(question_marks), is_correct: true },
        _ => GradedAnswer { marks_awarded: Decimal::ZERO, is_correct: false },
    }
}

pub(crate) fn status_after_submit(assessment_type: AssessmentType) -> AttemptStatus {
    if assessment_type.needs_manual_grading() {
        AttemptStatus::Submitted
    } else {
        AttemptStatus::Graded
    }
}

pub(crate) fn percentage(obtained: Decimal, total_marks: i32) -> Decimal {
    if total_marks <= 0 {
        return Decimal::ZERO;
    }
    (obtained * Decimal::ONE_HUNDRED / Decimal::from(total_marks)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_mcq_earns_full_marks() {
        let graded = grade_answer(QuestionType::Mcq, 5, Some(true));
        assert_eq!(graded, GradedAnswer { marks_awarded: Decimal::from(5), is_correct: true });
    }

    #[test]
    fn wrong_or_missing_option_earns_nothing() {
        assert_eq!(grade_answer(QuestionType::TrueFalse, 2, Some(false)).marks_awarded, Decimal::ZERO);
        assert_eq!(grade_answer(QuestionType::Mcq, 2, None).marks_awarded, Decimal::ZERO);
    }

    #[test]
    fn free_text_types_are_never_auto_graded() {
        for question_type in [QuestionType::ShortAnswer, QuestionType::Essay, QuestionType::Code] {
            let graded = grade_answer(question_type, 10, Some(true));
            assert_eq!(graded.marks_awarded, Decimal::ZERO);
            assert!(!graded.is_correct);
        }
    }

    #[test]
    fn assignments_wait_for_manual_grading() {
        assert_eq!(status_after_submit(AssessmentType::Quiz), AttemptStatus::Graded);
        assert_eq!(status_after_submit(AssessmentType::Exam), AttemptStatus::Graded);
        assert_eq!(status_after_submit(AssessmentType::Assignment), AttemptStatus::Submitted);
        assert_eq!(status_after_submit(AssessmentType::Project), AttemptStatus::Submitted);
    }

    #[test]
    fn percentage_handles_zero_total() {
        assert_eq!(percentage(Decimal::from(7), 10), Decimal::from(70));
        assert_eq!(percentage(Decimal::from(7), 0), Decimal::ZERO);
    }
}
