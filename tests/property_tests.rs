//! Property-based tests for the query parser, tokenizer and slugs.

use gasto_publico::search::{tokenize, SearchLanguage, TsQuery, TsVector};
use gasto_publico::slug::slugify;
use proptest::prelude::*;

fn lexeme_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[a-záéíóúñ]{1,10}", "[a-z0-9]{1,6}"]
}

/// Well-formed queries built from the grammar.
fn query_strategy() -> impl Strategy<Value = String> {
    let leaf = (lexeme_strategy(), any::<bool>()).prop_map(|(l, prefix)| {
        if prefix {
            format!("{l}:*")
        } else {
            l
        }
    });
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} & {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} | {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} <-> {b}")),
            (inner.clone(), inner.clone(), 1u16..5).prop_map(|(a, b, n)| format!("{a} <{n}> {b}")),
            inner.clone().prop_map(|a| format!("!{a}")),
            inner.prop_map(|a| format!("({a})")),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn parser_never_panics(input in "\\PC{0,40}") {
        let _ = TsQuery::parse(&input);
    }

    #[test]
    fn parser_never_panics_on_operator_soup(input in "[a-c&|!()<>:*'\\- 0-9]{0,30}") {
        let _ = TsQuery::parse(&input);
    }

    #[test]
    fn grammar_queries_parse(query in query_strategy()) {
        prop_assert!(TsQuery::parse(&query).is_ok(), "rejected {}", query);
    }

    #[test]
    fn display_reparses_to_the_same_query(query in query_strategy()) {
        let parsed = TsQuery::parse(&query).unwrap();
        let printed = parsed.to_string();
        let reparsed = TsQuery::parse(&printed).unwrap();
        prop_assert_eq!(parsed, reparsed);
    }

    #[test]
    fn dangling_operators_are_rejected(
        lexeme in lexeme_strategy(),
        op in prop::sample::select(vec!["&", "|", "<->"]),
    ) {
        let trailing = format!("{} {}", lexeme, op);
        let leading = format!("{} {}", op, lexeme);
        prop_assert!(TsQuery::parse(&trailing).is_err(), "accepted {:?}", trailing);
        prop_assert!(TsQuery::parse(&leading).is_err(), "accepted {:?}", leading);
    }

    #[test]
    fn adjacent_operands_are_rejected(a in lexeme_strategy(), b in lexeme_strategy()) {
        let adjacent = format!("{} {}", a, b);
        prop_assert!(TsQuery::parse(&adjacent).is_err(), "accepted {:?}", adjacent);
    }

    #[test]
    fn token_positions_increase(text in "[a-zA-Záéíóú ,.]{0,80}") {
        let tokens = tokenize(&text, SearchLanguage::Spanish);
        prop_assert!(tokens.windows(2).all(|w| w[0].position < w[1].position));
        prop_assert!(tokens.iter().all(|t| !t.lexeme.is_empty()));
    }

    #[test]
    fn documents_match_their_own_words(text in "[a-z]{3,10}( [a-z]{3,10}){0,5}") {
        let doc = TsVector::from_text(&text, SearchLanguage::Simple);
        for word in text.split(' ') {
            let query = TsQuery::parse(word).unwrap().normalize(SearchLanguage::Simple).unwrap();
            prop_assert!(query.matches(&doc));
            let rank = query.rank(&doc);
            prop_assert!(rank > 0.0 && rank < 1.0);
        }
    }

    #[test]
    fn vectors_survive_their_text_form(text in "[a-zñ ]{0,60}") {
        let doc = TsVector::from_text(&text, SearchLanguage::Spanish);
        let reparsed: TsVector = doc.to_string().parse().unwrap();
        prop_assert_eq!(doc, reparsed);
    }

    #[test]
    fn slugs_are_url_safe(name in "\\PC{0,100}") {
        let slug = slugify(&name);
        prop_assert!(!slug.is_empty());
        prop_assert!(slug.len() <= 56);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
    }
}
