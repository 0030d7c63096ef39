use rand::Rng;

use crate::{Persona, ResponseRule, RuleKind};

impl Persona {
    /// Decides whether this persona replies to `text` spoken by `speaker`.
    ///
    /// Own messages are never answered (exact name comparison, checked before
    /// everything else). A case-insensitive mention of the persona name
    /// anywhere in the text bypasses the rule list. Otherwise rules run in
    /// order and the first satisfied one wins; a rule with a `chance` gate is
    /// skipped when an independent uniform draw in [0,1) exceeds the chance.
    pub fn should_respond<R: Rng>(&self, text: &str, speaker: &str, rng: &mut R) -> bool {
        if speaker == self.name {
            return false;
        }

        let text = text.to_lowercase();
        if text.contains(&self.name.to_lowercase()) {
            return true;
        }

        let speaker = speaker.to_lowercase();
        self.rules
            .iter()
            .any(|rule| rule.is_satisfied(&text, &speaker, rng))
    }
}

impl ResponseRule {
    /// `text` and `speaker` arrive lowercased; the rule value is lowercased
    /// here so every comparison is case-insensitive.
    fn is_satisfied<R: Rng>(&self, text: &str, speaker: &str, rng: &mut R) -> bool {
        if let Some(chance) = self.chance {
            if rng.gen::<f64>() > chance {
                return false;
            }
        }

        match self.kind {
            RuleKind::Default => true,
            RuleKind::TextEndsWith => self
                .lowered_value()
                .is_some_and(|value| text.ends_with(&value)),
            RuleKind::TextStartsWith => self
                .lowered_value()
                .is_some_and(|value| text.starts_with(&value)),
            RuleKind::SpeakerIs => self.lowered_value().is_some_and(|value| speaker == value),
            RuleKind::Unknown => false,
        }
    }

    fn lowered_value(&self) -> Option<String> {
        self.value.as_deref().map(str::to_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Persona, ResponseRule, RuleKind};
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    fn persona(name: &str, rules: Vec<ResponseRule>) -> Persona {
        Persona {
            app_id: "A1".to_string(),
            name: name.to_string(),
            delivery_token: "xoxb-test".to_string(),
            system_prompt: String::new(),
            rules,
        }
    }

    fn rule(kind: RuleKind, value: Option<&str>, chance: Option<f64>) -> ResponseRule {
        ResponseRule {
            kind,
            value: value.map(str::to_string),
            chance,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    /// Counts draws so short-circuiting is observable.
    struct CountingRng {
        inner: StdRng,
        draws: usize,
    }

    impl CountingRng {
        fn new() -> Self {
            Self {
                inner: rng(),
                draws: 0,
            }
        }
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.draws += 1;
            self.inner.fill_bytes(dest);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.draws += 1;
            self.inner.try_fill_bytes(dest)
        }
    }

    #[test]
    fn unit_never_replies_to_own_messages() {
        let persona = persona("Aria", vec![rule(RuleKind::Default, None, None)]);
        assert!(!persona.should_respond("Aria, are you there?", "Aria", &mut rng()));
    }

    #[test]
    fn unit_self_check_compares_name_exactly() {
        let persona = persona("Aria", vec![rule(RuleKind::Default, None, None)]);
        assert!(persona.should_respond("hello", "aria", &mut rng()));
    }

    #[test]
    fn unit_mention_override_is_case_insensitive_and_bypasses_rules() {
        let persona = persona("Aria", Vec::new());
        assert!(persona.should_respond("hey ARIA, got a minute?", "U123", &mut rng()));
        assert!(!persona.should_respond("hey there", "U123", &mut rng()));
    }

    #[test]
    fn functional_first_satisfied_rule_short_circuits() {
        let persona = persona(
            "Aria",
            vec![
                rule(RuleKind::SpeakerIs, Some("alice"), None),
                rule(RuleKind::Default, None, Some(0.5)),
            ],
        );
        let mut counting = CountingRng::new();
        assert!(persona.should_respond("hello", "alice", &mut counting));
        assert_eq!(counting.draws, 0);
    }

    #[test]
    fn unit_chance_zero_never_fires() {
        let persona = persona("Aria", vec![rule(RuleKind::Default, None, Some(0.0))]);
        let mut rng = rng();
        for _ in 0..200 {
            assert!(!persona.should_respond("hello", "U123", &mut rng));
        }
    }

    #[test]
    fn unit_chance_one_gate_always_passes() {
        let asks = persona(
            "Aria",
            vec![rule(RuleKind::TextEndsWith, Some("?"), Some(1.0))],
        );
        let mut rng = rng();
        for _ in 0..100 {
            assert!(asks.should_respond("Are you there?", "U123", &mut rng));
            assert!(!asks.should_respond("hello", "U123", &mut rng));
        }
    }

    #[test]
    fn unit_suffix_prefix_and_speaker_comparisons_are_case_insensitive() {
        let suffix = persona("Aria", vec![rule(RuleKind::TextEndsWith, Some("?"), None)]);
        assert!(suffix.should_respond("Are you there?", "U123", &mut rng()));

        let prefix = persona(
            "Aria",
            vec![rule(RuleKind::TextStartsWith, Some("HELLO"), None)],
        );
        assert!(prefix.should_respond("hello world", "U123", &mut rng()));

        let speaker = persona("Aria", vec![rule(RuleKind::SpeakerIs, Some("Alice"), None)]);
        assert!(speaker.should_respond("hello", "ALICE", &mut rng()));
        assert!(!speaker.should_respond("hello", "alicia", &mut rng()));
    }

    #[test]
    fn unit_unknown_kind_falls_through_to_later_rules() {
        let only_unknown = persona("Aria", vec![rule(RuleKind::Unknown, Some("wave"), None)]);
        assert!(!only_unknown.should_respond("wave", "U123", &mut rng()));

        let with_fallback = persona(
            "Aria",
            vec![
                rule(RuleKind::Unknown, Some("wave"), None),
                rule(RuleKind::Default, None, None),
            ],
        );
        assert!(with_fallback.should_respond("wave", "U123", &mut rng()));
    }

    #[test]
    fn unit_rule_without_operand_is_never_satisfied() {
        let persona = persona("Aria", vec![rule(RuleKind::TextEndsWith, None, None)]);
        assert!(!persona.should_respond("hello", "U123", &mut rng()));
    }

    #[test]
    fn unit_no_rules_means_no_response() {
        let persona = persona("Aria", Vec::new());
        assert!(!persona.should_respond("hello", "U123", &mut rng()));
    }
}
