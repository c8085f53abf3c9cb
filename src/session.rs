use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::bank::McqItem;

/// Draw a random subset of `min(limit, bank.len())` questions for one test
/// session. Unseeded and unweighted; the caller refuses an empty bank before
/// getting here.
pub fn draw(bank: &[McqItem], limit: usize) -> Vec<McqItem> {
    let mut pool: Vec<McqItem> = bank.to_vec();
    pool.shuffle(&mut thread_rng());
    pool.truncate(limit);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> McqItem {
        McqItem {
            question: format!("Q{}?", n),
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: n % 4,
            explanation: String::new(),
        }
    }

    #[test]
    fn draw_is_capped_by_bank_size() {
        let bank: Vec<McqItem> = (0..5).map(item).collect();
        assert_eq!(draw(&bank, 50).len(), 5);
        assert_eq!(draw(&bank, 3).len(), 3);
        assert_eq!(draw(&bank, 0).len(), 0);
    }

    #[test]
    fn drawn_questions_come_from_the_bank_without_repeats() {
        let bank: Vec<McqItem> = (0..20).map(item).collect();
        let drawn = draw(&bank, 10);
        let mut seen = std::collections::HashSet::new();
        for q in &drawn {
            assert!(bank.contains(q));
            assert!(seen.insert(q.question.clone()), "duplicate {}", q.question);
        }
    }

    #[test]
    fn full_draw_is_a_permutation() {
        let bank: Vec<McqItem> = (0..8).map(item).collect();
        let mut drawn = draw(&bank, 8);
        drawn.sort_by(|a, b| a.question.cmp(&b.question));
        let mut expected = bank.clone();
        expected.sort_by(|a, b| a.question.cmp(&b.question));
        assert_eq!(drawn, expected);
    }
}
