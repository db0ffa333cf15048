//! Static qualification question banks, one ordered list per framework.
//!
//! List order is a priority ranking: when the inference service cannot pick a
//! candidate, the first unasked entry wins.

use crate::domain::framework::SalesFramework;

pub const QUESTIONS_PER_FRAMEWORK: usize = 5;

const BANT_QUESTIONS: [&str; QUESTIONS_PER_FRAMEWORK] = [
    "What budget range are you working with for this type of solution?",
    "Who else would be involved in making this decision?",
    "What specific challenges are you looking to solve?",
    "When are you hoping to have a solution in place?",
    "What's driving the urgency for this project?",
];

const SPIN_QUESTIONS: [&str; QUESTIONS_PER_FRAMEWORK] = [
    "Can you tell me about your current process for [relevant area]?",
    "What challenges are you experiencing with your current approach?",
    "How is this challenge affecting your team's productivity?",
    "What would solving this problem mean for your business?",
    "How are you currently handling this situation?",
];

const MEDDIC_QUESTIONS: [&str; QUESTIONS_PER_FRAMEWORK] = [
    "What metrics are you using to measure success in this area?",
    "Who has the final decision-making authority for this purchase?",
    "What criteria will you use to evaluate potential solutions?",
    "Can you walk me through your decision-making process?",
    "What's the biggest pain point you're trying to address?",
];

pub fn questions_for(framework: SalesFramework) -> &'static [&'static str] {
    match framework {
        SalesFramework::Spin => &SPIN_QUESTIONS,
        SalesFramework::Meddic => &MEDDIC_QUESTIONS,
        SalesFramework::Bant | SalesFramework::Chant => &BANT_QUESTIONS,
    }
}

/// Bank entries not yet in `asked`, in bank order.
pub fn available_questions(framework: SalesFramework, asked: &[String]) -> Vec<&'static str> {
    questions_for(framework)
        .iter()
        .copied()
        .filter(|question| !asked.iter().any(|asked| asked == question))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{available_questions, questions_for, QUESTIONS_PER_FRAMEWORK};
    use crate::domain::framework::SalesFramework;

    #[test]
    fn every_framework_has_five_questions() {
        for framework in [
            SalesFramework::Bant,
            SalesFramework::Spin,
            SalesFramework::Meddic,
            SalesFramework::Chant,
        ] {
            assert_eq!(questions_for(framework).len(), QUESTIONS_PER_FRAMEWORK);
        }
    }

    #[test]
    fn reserved_framework_falls_back_to_bant_bank() {
        assert_eq!(questions_for(SalesFramework::Chant), questions_for(SalesFramework::Bant));
    }

    #[test]
    fn available_questions_preserve_bank_order() {
        let bank = questions_for(SalesFramework::Meddic);
        let asked = vec![bank[0].to_string(), bank[2].to_string()];

        assert_eq!(available_questions(SalesFramework::Meddic, &asked), vec![bank[1], bank[3], bank[4]]);
    }

    #[test]
    fn exhausted_bank_yields_nothing() {
        let asked: Vec<String> =
            questions_for(SalesFramework::Spin).iter().map(|q| q.to_string()).collect();
        assert!(available_questions(SalesFramework::Spin, &asked).is_empty());
    }
}
