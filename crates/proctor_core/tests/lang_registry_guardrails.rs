use std::collections::HashMap;

use proctor_core::lang::keywords;
use proctor_core::lang::operators::{self, Fixity};
use proctor_core::lang::punctuation;

#[test]
fn keywords_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, keywords::KeywordId> = HashMap::new();

    for info in keywords::KEYWORDS {
        assert_eq!(
            keywords::from_str(info.canonical),
            Some(info.id),
            "keyword canonical spelling not resolvable: {}",
            info.canonical
        );
        assert_eq!(keywords::as_str(info.id), info.canonical);

        if let Some(prev) = seen.insert(info.canonical, info.id) {
            panic!(
                "duplicate keyword spelling {:?}: {:?} and {:?}",
                info.canonical, prev, info.id
            );
        }
    }
}

#[test]
fn operators_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, operators::OperatorId> = HashMap::new();

    for info in operators::OPERATORS {
        for &spelling in info.spellings {
            assert_eq!(
                operators::from_str(spelling),
                Some(info.id),
                "operator spelling not resolvable: {}",
                spelling
            );
            if let Some(prev) = seen.insert(spelling, info.id) {
                panic!("duplicate operator spelling {:?}: {:?} and {:?}", spelling, prev, info.id);
            }
        }
    }
}

#[test]
fn keyword_spelled_operators_are_keywords() {
    for info in operators::OPERATORS.iter().filter(|o| o.is_keyword_spelling) {
        for &spelling in info.spellings {
            assert!(
                keywords::from_str(spelling).is_some(),
                "word operator {:?} must also be a reserved keyword",
                spelling
            );
        }
    }
}

#[test]
fn binary_precedence_excludes_prefix_and_assignment() {
    for info in operators::OPERATORS {
        let binary = operators::binary_precedence(info.id);
        match info.fixity {
            Fixity::Prefix | Fixity::PrefixOrPostfix => assert!(binary.is_none(), "{:?}", info.id),
            Fixity::Infix if operators::is_assignment(info.id) => assert!(binary.is_none(), "{:?}", info.id),
            Fixity::Infix => assert!(binary.is_some(), "{:?}", info.id),
        }
    }
}

#[test]
fn punctuation_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, punctuation::PunctuationId> = HashMap::new();

    for info in punctuation::PUNCTUATION {
        assert_eq!(punctuation::from_str(info.canonical), Some(info.id));
        if let Some(prev) = seen.insert(info.canonical, info.id) {
            panic!(
                "duplicate punctuation spelling {:?}: {:?} and {:?}",
                info.canonical, prev, info.id
            );
        }
        assert!(
            operators::from_str(info.canonical).is_none(),
            "punctuation {:?} collides with an operator spelling",
            info.canonical
        );
    }
}
