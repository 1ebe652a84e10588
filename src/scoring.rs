use crate::difficulty::Difficulty;

/// Points for `correct_answers`, plus the tier's streak bonus for every full run of three.
pub fn calculate_score(correct_answers: u32, current_streak: u32, difficulty: Difficulty) -> u32 {
    let settings = difficulty.settings();
    let base_score = correct_answers * settings.points_per_correct;
    let streak_bonus = (current_streak / 3) * settings.streak_bonus;
    base_score + streak_bonus
}

/// Whole-number percentage, 0 when nothing was answered.
pub fn calculate_accuracy(correct_answers: u32, total_questions: u32) -> u32 {
    if total_questions == 0 {
        return 0;
    }
    (correct_answers as f64 / total_questions as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score() {
        assert_eq!(calculate_score(10, 9, Difficulty::Medium), 180);
        assert_eq!(calculate_score(0, 2, Difficulty::Hard), 0);
        assert_eq!(calculate_score(3, 3, Difficulty::Easy), 35);
        assert_eq!(calculate_score(4, 8, Difficulty::Hard), 110);
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(calculate_accuracy(0, 0), 0);
        assert_eq!(calculate_accuracy(2, 3), 67);
        assert_eq!(calculate_accuracy(1, 8), 13);
        assert_eq!(calculate_accuracy(5, 5), 100);
    }
}
