use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::round_score;

/// Points available on one question of an exam
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionPoints {
    pub question_id: Uuid,
    pub points: f64,
}

/// A stored, already-scored answer
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnswer {
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub is_correct: bool,
    pub score: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamSummary {
    pub exam_id: Uuid,
    pub user_id: Uuid,
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub correct_count: usize,
    pub answered_count: usize,
    pub question_count: usize,
    /// None when the exam has no passing score
    pub passed: Option<bool>,
    pub last_submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    pub question_id: Uuid,
    pub attempts: usize,
    pub correct: usize,
    pub correct_rate: f64,
    pub average_score: f64,
    pub max_score: f64,
}

/// Group answers by user and total them against the exam's questions.
///
/// Answers for questions no longer on the exam are ignored. Results are
/// ordered by total score, highest first, ties broken by user id.
pub fn summarize(
    exam_id: Uuid,
    questions: &[QuestionPoints],
    answers: &[ScoredAnswer],
    passing_score: Option<f64>,
) -> Vec<ExamSummary> {
    let points: HashMap<Uuid, f64> = questions.iter().map(|q| (q.question_id, q.points)).collect();

    let mut by_user: BTreeMap<Uuid, Vec<&ScoredAnswer>> = BTreeMap::new();
    for answer in answers.iter().filter(|a| points.contains_key(&a.question_id)) {
        by_user.entry(answer.user_id).or_default().push(answer);
    }

    let mut summaries: Vec<ExamSummary> = by_user
        .into_iter()
        .map(|(user_id, answers)| build_summary(exam_id, user_id, questions, &answers, passing_score))
        .collect();

    summaries.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    summaries
}

/// Summary for a single user. A user with no answers still gets a summary
/// with zero score.
pub fn summarize_user(
    exam_id: Uuid,
    user_id: Uuid,
    questions: &[QuestionPoints],
    answers: &[ScoredAnswer],
    passing_score: Option<f64>,
) -> ExamSummary {
    let question_ids: Vec<Uuid> = questions.iter().map(|q| q.question_id).collect();
    let mine: Vec<&ScoredAnswer> = answers
        .iter()
        .filter(|a| a.user_id == user_id && question_ids.contains(&a.question_id))
        .collect();
    build_summary(exam_id, user_id, questions, &mine, passing_score)
}

fn build_summary(
    exam_id: Uuid,
    user_id: Uuid,
    questions: &[QuestionPoints],
    answers: &[&ScoredAnswer],
    passing_score: Option<f64>,
) -> ExamSummary {
    let max_score: f64 = questions.iter().map(|q| q.points).sum();

    // One answer per question counts, the latest one
    let mut latest: HashMap<Uuid, &ScoredAnswer> = HashMap::new();
    for &answer in answers {
        latest
            .entry(answer.question_id)
            .and_modify(|current| {
                if answer.submitted_at > current.submitted_at {
                    *current = answer;
                }
            })
            .or_insert(answer);
    }

    let total_score: f64 = latest.values().map(|a| a.score).sum();
    let percentage = if max_score > 0.0 {
        round_score(total_score / max_score * 100.0)
    } else {
        0.0
    };

    ExamSummary {
        exam_id,
        user_id,
        total_score: round_score(total_score),
        max_score: round_score(max_score),
        percentage,
        correct_count: latest.values().filter(|a| a.is_correct).count(),
        answered_count: latest.len(),
        question_count: questions.len(),
        passed: passing_score.map(|p| percentage >= p),
        last_submitted_at: latest.values().map(|a| a.submitted_at).max(),
    }
}

/// Per-question attempt and correctness statistics, in question order
pub fn question_stats(questions: &[QuestionPoints], answers: &[ScoredAnswer]) -> Vec<QuestionStats> {
    let mut grouped: HashMap<Uuid, Vec<&ScoredAnswer>> = HashMap::new();
    for answer in answers {
        grouped.entry(answer.question_id).or_default().push(answer);
    }

    questions
        .iter()
        .map(|q| {
            let answers = grouped.get(&q.question_id).map(Vec::as_slice).unwrap_or(&[]);
            let attempts = answers.len();
            let correct = answers.iter().filter(|a| a.is_correct).count();
            let (correct_rate, average_score) = if attempts == 0 {
                (0.0, 0.0)
            } else {
                let total: f64 = answers.iter().map(|a| a.score).sum();
                (
                    round_score(correct as f64 / attempts as f64),
                    round_score(total / attempts as f64),
                )
            };
            QuestionStats {
                question_id: q.question_id,
                attempts,
                correct,
                correct_rate,
                average_score,
                max_score: q.points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn answer(user: Uuid, question: Uuid, score: f64, is_correct: bool, minutes: i64) -> ScoredAnswer {
        ScoredAnswer {
            user_id: user,
            question_id: question,
            is_correct,
            score,
            submitted_at: at(minutes),
        }
    }

    fn exam() -> (Uuid, Vec<QuestionPoints>) {
        let questions = vec![
            QuestionPoints { question_id: Uuid::new_v4(), points: 5.0 },
            QuestionPoints { question_id: Uuid::new_v4(), points: 5.0 },
            QuestionPoints { question_id: Uuid::new_v4(), points: 10.0 },
        ];
        (Uuid::new_v4(), questions)
    }

    #[test]
    fn sums_per_user_and_ranks() {
        let (exam_id, qs) = exam();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let answers = vec![
            answer(alice, qs[0].question_id, 5.0, true, 1),
            answer(alice, qs[2].question_id, 10.0, true, 2),
            answer(bob, qs[0].question_id, 0.0, false, 1),
            answer(bob, qs[1].question_id, 5.0, true, 3),
            answer(bob, qs[2].question_id, 5.0, false, 4),
        ];

        let summaries = summarize(exam_id, &qs, &answers, Some(60.0));
        assert_eq!(summaries.len(), 2);

        let first = &summaries[0];
        assert_eq!(first.user_id, alice);
        assert_eq!(first.total_score, 15.0);
        assert_eq!(first.max_score, 20.0);
        assert_eq!(first.percentage, 75.0);
        assert_eq!(first.correct_count, 2);
        assert_eq!(first.answered_count, 2);
        assert_eq!(first.question_count, 3);
        assert_eq!(first.passed, Some(true));
        assert_eq!(first.last_submitted_at, Some(at(2)));

        let second = &summaries[1];
        assert_eq!(second.user_id, bob);
        assert_eq!(second.total_score, 10.0);
        assert_eq!(second.percentage, 50.0);
        assert_eq!(second.passed, Some(false));
    }

    #[test]
    fn ignores_answers_for_removed_questions() {
        let (exam_id, qs) = exam();
        let user = Uuid::new_v4();
        let answers = vec![
            answer(user, qs[0].question_id, 5.0, true, 1),
            answer(user, Uuid::new_v4(), 100.0, true, 1),
        ];
        let summary = summarize_user(exam_id, user, &qs, &answers, None);
        assert_eq!(summary.total_score, 5.0);
        assert_eq!(summary.answered_count, 1);
        assert_eq!(summary.passed, None);
    }

    #[test]
    fn latest_answer_per_question_wins() {
        let (exam_id, qs) = exam();
        let user = Uuid::new_v4();
        let answers = vec![
            answer(user, qs[0].question_id, 5.0, true, 1),
            answer(user, qs[0].question_id, 0.0, false, 5),
        ];
        let summary = summarize_user(exam_id, user, &qs, &answers, None);
        assert_eq!(summary.total_score, 0.0);
        assert_eq!(summary.answered_count, 1);
        assert_eq!(summary.correct_count, 0);
    }

    #[test]
    fn user_without_answers_gets_empty_summary() {
        let (exam_id, qs) = exam();
        let summary = summarize_user(exam_id, Uuid::new_v4(), &qs, &[], Some(50.0));
        assert_eq!(summary.total_score, 0.0);
        assert_eq!(summary.max_score, 20.0);
        assert_eq!(summary.passed, Some(false));
        assert_eq!(summary.last_submitted_at, None);
    }

    #[test]
    fn empty_exam_has_zero_percentage() {
        let summary = summarize_user(Uuid::new_v4(), Uuid::new_v4(), &[], &[], Some(0.0));
        assert_eq!(summary.percentage, 0.0);
        assert_eq!(summary.passed, Some(true));
    }

    #[test]
    fn computes_question_stats() {
        let (_, qs) = exam();
        let answers = vec![
            answer(Uuid::new_v4(), qs[0].question_id, 5.0, true, 1),
            answer(Uuid::new_v4(), qs[0].question_id, 0.0, false, 1),
            answer(Uuid::new_v4(), qs[0].question_id, 5.0, true, 1),
        ];
        let stats = question_stats(&qs, &answers);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].attempts, 3);
        assert_eq!(stats[0].correct, 2);
        assert_eq!(stats[0].correct_rate, 0.67);
        assert_eq!(stats[0].average_score, 3.33);
        assert_eq!(stats[1].attempts, 0);
        assert_eq!(stats[1].correct_rate, 0.0);
    }
}
