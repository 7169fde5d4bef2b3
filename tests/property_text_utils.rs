use agentcore::infrastructure::templates::PromptTemplate;
use agentcore::services::{estimate_tokens, extract_list, truncate_to_token_limit};
use proptest::prelude::*;
use std::collections::HashMap;

proptest! {
    /// The estimate stays within one token of chars / 4.
    #[test]
    fn prop_estimate_tracks_char_count(text in "\\PC{0,400}") {
        let chars = text.chars().count();
        let estimate = estimate_tokens(&text);
        prop_assert!(estimate * 4 >= chars);
        prop_assert!(estimate * 4 < chars + 4);
    }

    /// Truncation returns a prefix whose estimate fits the budget.
    #[test]
    fn prop_truncation_fits_budget(text in "[a-zé ]{0,300}", max_tokens in 0usize..60) {
        let truncated = truncate_to_token_limit(&text, max_tokens);
        prop_assert!(text.starts_with(truncated));
        prop_assert!(estimate_tokens(truncated) <= max_tokens);
        if estimate_tokens(&text) <= max_tokens {
            prop_assert_eq!(truncated, text.as_str());
        }
    }

    /// Every supplied placeholder is replaced by its value.
    #[test]
    fn prop_template_substitutes_known_names(
        name in "[a-z_][a-z0-9_]{0,8}",
        value in "[A-Za-z0-9 .,]{0,40}",
    ) {
        let template = PromptTemplate::new(format!("Before {{{{{name}}}}} and {{{{ {name} }}}} after {{{{other_unknown}}}}"));
        let vars = HashMap::from([(name.clone(), value.clone())]);

        let rendered = template.format(&vars);

        prop_assert_eq!(rendered, format!("Before {value} and {value} after {{{{other_unknown}}}}"));
    }

    /// Bulleted items come back in order, without their markers.
    #[test]
    fn prop_bullet_list_round_trips(items in proptest::collection::vec("[A-Za-z][A-Za-z ]{0,20}[A-Za-z]", 1..8)) {
        let text: String = items.iter().map(|item| format!("- {item}\n")).collect();
        prop_assert_eq!(extract_list(&text), items);
    }
}
