//! CSS selectors for `querySelector`, `matches` and `closest`.
//!
//! Supported: type (`div`), universal (`*`), id (`#a`), class (`.a`), attribute presence and equality
//! (`[href]`, `[type="text"]`), descendant and child combinators, and comma-separated lists.

use super::{element, parent};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::ObjectId;

/// Compounds per complex selector. Keeps right-to-left matching shallow.
const MAX_COMPOUNDS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(Vec<Vec<(Combinator, Compound)>>);

/// Parse a selector list; `None` for anything outside the supported grammar.
pub fn parse(input: &str) -> Option<SelectorList> {
    let mut list = Vec::new();
    for part in input.split(',') {
        list.push(parse_complex(part.trim())?);
    }
    Some(SelectorList(list))
}

fn parse_complex(input: &str) -> Option<Vec<(Combinator, Compound)>> {
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    loop {
        let (compound, next) = parse_compound(&chars, pos)?;
        parts.push((combinator, compound));
        if parts.len() > MAX_COMPOUNDS {
            return None;
        }
        pos = next;
        let mut saw_space = false;
        while chars.get(pos).is_some_and(|c| c.is_whitespace()) {
            pos += 1;
            saw_space = true;
        }
        match chars.get(pos) {
            None => return Some(parts),
            Some('>') => {
                pos += 1;
                while chars.get(pos).is_some_and(|c| c.is_whitespace()) {
                    pos += 1;
                }
                combinator = Combinator::Child;
            }
            Some(_) if saw_space => combinator = Combinator::Descendant,
            Some(_) => return None,
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_name(chars: &[char], mut pos: usize) -> Option<(String, usize)> {
    let start = pos;
    while chars.get(pos).is_some_and(|c| is_name_char(*c)) {
        pos += 1;
    }
    (pos > start).then(|| (chars[start..pos].iter().collect(), pos))
}

fn parse_compound(chars: &[char], mut pos: usize) -> Option<(Compound, usize)> {
    let mut compound = Compound::default();
    let start = pos;
    if chars.get(pos) == Some(&'*') {
        pos += 1;
    } else if let Some((tag, next)) = read_name(chars, pos) {
        compound.tag = Some(tag.to_ascii_lowercase());
        pos = next;
    }
    loop {
        match chars.get(pos) {
            Some('#') => {
                let (id, next) = read_name(chars, pos + 1)?;
                compound.ids.push(id);
                pos = next;
            }
            Some('.') => {
                let (class, next) = read_name(chars, pos + 1)?;
                compound.classes.push(class);
                pos = next;
            }
            Some('[') => {
                let (test, next) = parse_attribute(chars, pos + 1)?;
                compound.attrs.push(test);
                pos = next;
            }
            _ => break,
        }
    }
    (pos > start).then_some((compound, pos))
}

fn parse_attribute(chars: &[char], pos: usize) -> Option<(AttrTest, usize)> {
    let (name, mut pos) = read_name(chars, pos)?;
    let name = name.to_ascii_lowercase();
    match chars.get(pos)? {
        ']' => Some((AttrTest::Exists(name), pos + 1)),
        '=' => {
            pos += 1;
            let value = match chars.get(pos)? {
                quote @ ('"' | '\'') => {
                    let end = chars[pos + 1..].iter().position(|c| c == quote)? + pos + 1;
                    let value: String = chars[pos + 1..end].iter().collect();
                    pos = end + 1;
                    value
                }
                _ => {
                    let (value, next) = read_name(chars, pos)?;
                    pos = next;
                    value
                }
            };
            (chars.get(pos) == Some(&']')).then_some((AttrTest::Equals(name, value), pos + 1))
        }
        _ => None,
    }
}

impl SelectorList {
    pub fn matches(&self, it: &Interpreter, id: ObjectId) -> bool {
        self.0.iter().any(|parts| matches_from(it, parts, parts.len() - 1, id))
    }
}

impl Compound {
    fn matches(&self, it: &Interpreter, id: ObjectId) -> bool {
        let Some(e) = element(it, id) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| *e.tag != *t) {
            return false;
        }
        if !self.ids.iter().all(|want| e.attr("id").is_some_and(|v| **v == **want)) {
            return false;
        }
        let classes = e.classes();
        if !self.classes.iter().all(|want| classes.contains(want)) {
            return false;
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Exists(name) => e.attr(name).is_some(),
            AttrTest::Equals(name, value) => e.attr(name).is_some_and(|v| **v == **value),
        })
    }
}

/// Does `parts[..=index]` match with `parts[index]` anchored at `id`? Walks ancestors right to left.
fn matches_from(it: &Interpreter, parts: &[(Combinator, Compound)], index: usize, id: ObjectId) -> bool {
    let (combinator, compound) = &parts[index];
    if !compound.matches(it, id) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match combinator {
        Combinator::Child => parent(it, id).is_some_and(|p| matches_from(it, parts, index - 1, p)),
        Combinator::Descendant => {
            let mut current = parent(it, id);
            while let Some(p) = current {
                if matches_from(it, parts, index - 1, p) {
                    return true;
                }
                current = parent(it, p);
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_supported_forms() {
        assert!(parse("div").is_some());
        assert!(parse("#root > .item, a[href]").is_some());
        assert!(parse("input[type=\"text\"]").is_some());
        assert!(parse("ul li.active").is_some());
        assert!(parse("*").is_some());
    }

    #[test]
    fn test_rejects_unsupported_forms() {
        assert!(parse("").is_none());
        assert!(parse("div:hover").is_none());
        assert!(parse("a ~ b").is_none());
        assert!(parse("[href").is_none());
        assert!(parse("div,").is_none());
    }

    #[test]
    fn test_compound_structure() {
        let Some(SelectorList(list)) = parse("p.note#intro") else {
            panic!("selector should parse");
        };
        let (_, compound) = &list[0][0];
        assert_eq!(compound.tag.as_deref(), Some("p"));
        assert_eq!(compound.classes, ["note"]);
        assert_eq!(compound.ids, ["intro"]);
    }
}
