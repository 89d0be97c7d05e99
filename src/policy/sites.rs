//! Site extraction: the token-level facts the policy rules are matched against.
//!
//! A *site* is a free identifier reference (`eval`), a member access (`document.cookie`,
//! `document['cookie']`), or either of those in call position together with a literal first argument
//! (`document.getElementById('root')`). Comments never reach the token stream and string contents only ever
//! appear as computed property names or call arguments, so neither can trigger a rule by accident.
//!
//! A member site records every identifier its receiver may evaluate to: `document.cookie` has `document`,
//! `(0, document).cookie` has `document`, and `w.top` has `w`. Simple bindings (`const w = window`,
//! `w = cond ? window : self`) are recorded as aliases, and [`SiteIndex::names_for`] closes over them.
//! Only declarations at the top level of the unit shadow a global; anything inside a block, a function, or
//! a parenthesized head is ignored, so a scanner that cannot resolve scopes errs on the side of rejecting.
//!
//! Template literal substitutions are lexed and visited like top-level code, using a worklist so deeply
//! nested templates cannot recurse the host stack.

use std::collections::{HashMap, HashSet};

use proctor_core::lang::keywords::KeywordId;
use proctor_core::lang::operators::is_assignment;
use proctor_core::lang::punctuation::PunctuationId;
use proctor_syntax::ast::Span;
use proctor_syntax::lexer::{Lexer, TemplateChunk, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// A bare identifier used as a value.
    Reference,
    /// `object.name`, `object?.name`, `object['name']`, or a key of a destructuring pattern.
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub kind: SiteKind,
    /// Identifiers (or `this`) the receiver of a member may evaluate to. Empty for references and for
    /// receivers that are call results or literals.
    pub receivers: Vec<String>,
    /// Identifier or property name.
    pub name: String,
    /// Present when the site is immediately called.
    pub call: Option<CallSite>,
    pub span: Span,
}



#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// First argument when it is a plain string literal.
    pub literal_argument: Option<String>,
}

/// Every site of one source text, plus the names it declares itself.
#[derive(Debug, Default)]
pub struct SiteIndex {
    pub sites: Vec<Site>,
    /// Names declared at the top level of the unit.
    pub declared: HashSet<String>,
    /// Binding target to the names bound to it (`const w = window` maps `window` to `w`).
    pub aliases: HashMap<String, HashSet<String>>,
    /// Set once receiver and alias analysis has used up [`ANALYSIS_BUDGET`]; every receiver is then
    /// treated as unknown and matches any object.
    pub saturated: bool,
    work: usize,
}

/// Token steps receiver and alias analysis may take for one unit.
pub const ANALYSIS_BUDGET: usize = 2_000_000;

impl SiteIndex {
    pub fn references(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter().filter(|s| s.kind == SiteKind::Reference)
    }

    pub fn members(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter().filter(|s| s.kind == SiteKind::Member)
    }

    pub fn calls(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter().filter(|s| s.call.is_some())
    }

    /// `object` and every name bound to it, directly or through other aliases.
    pub fn names_for<'a>(&'a self, object: &'a str) -> HashSet<&'a str> {
        let mut names = HashSet::from([object]);
        let mut queue = vec![object];
        while let Some(name) = queue.pop() {
            for alias in self.aliases.get(name).into_iter().flatten() {
                if names.insert(alias.as_str()) {
                    queue.push(alias.as_str());
                }
            }
        }
        names
    }

    /// Whether the receiver of `site` may be one of `names`.
    pub fn receiver_in(&self, site: &Site, names: &HashSet<&str>) -> bool {
        self.saturated || site.receivers.iter().any(|r| names.contains(r.as_str()))
    }

    /// Account for `steps` of analysis; `false` once the budget is gone.
    fn spend(&mut self, steps: usize) -> bool {
        self.work = self.work.saturating_add(steps);
        if self.work > ANALYSIS_BUDGET && !self.saturated {
            tracing::debug!(work = self.work, "receiver analysis budget exhausted; matching any receiver");
            self.saturated = true;
        }
        !self.saturated
    }

    fn alias(&mut self, name: &str, targets: &[String]) {
        for target in targets.iter().filter(|t| *t != name) {
            self.aliases.entry(target.clone()).or_default().insert(name.to_string());
        }
    }
}

/// A token list still to visit. Template substitutions are `nested`: nothing they declare is top level.
struct Pending {
    tokens: Vec<Token>,
    nested: bool,
}

/// Collect the sites of `source`. `None` when the source does not lex.
pub fn extract(source: &str) -> Option<SiteIndex> {
    let mut index = SiteIndex::default();
    let mut pending = vec![Pending {
        tokens: Lexer::new(source).tokenize().ok()?,
        nested: false,
    }];
    while let Some(Pending { tokens, nested }) = pending.pop() {
        visit(&tokens, nested, &mut index, &mut pending)?;
    }
    Some(index)
}

fn punct(token: Option<&Token>, id: PunctuationId) -> bool {
    token.is_some_and(|t| t.kind.is_punctuation(id))
}

fn keyword(token: Option<&Token>, id: KeywordId) -> bool {
    token.is_some_and(|t| t.kind.is_keyword(id))
}

fn before(tokens: &[Token], i: usize) -> Option<&Token> {
    i.checked_sub(1).and_then(|p| tokens.get(p))
}

/// Tokens after which `[` indexes a value instead of opening an array literal.
fn ends_value(token: Option<&Token>) -> bool {
    token.is_some_and(|t| match &t.kind {
        TokenKind::Ident(_) | TokenKind::String(_) | TokenKind::Template(_) => true,
        TokenKind::Keyword(k) => matches!(k, KeywordId::This | KeywordId::Super),
        TokenKind::Punctuation(p) => matches!(p, PunctuationId::RParen | PunctuationId::RBracket),
        _ => false,
    })
}

fn receiver(token: Option<&Token>) -> Option<String> {
    match token.map(|t| &t.kind) {
        Some(TokenKind::Ident(name)) => Some(name.clone()),
        Some(TokenKind::Keyword(KeywordId::This)) => Some("this".to_string()),
        _ => None,
    }
}

fn opens(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Punctuation(PunctuationId::LParen | PunctuationId::LBracket | PunctuationId::LBrace)
    )
}

fn closes(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Punctuation(PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::RBrace)
    )
}

/// Index of the bracket that `tokens[close]` closes.
fn matching_open(tokens: &[Token], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for j in (0..=close).rev() {
        let token = tokens.get(j)?;
        if closes(token) {
            depth += 1;
        } else if opens(token) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(j);
            }
        }
    }
    None
}

/// The identifier at `tokens[j]` when it stands alone as a value: not a property name, not an object key,
/// and not itself the start of a member access or call.
fn bare_value(tokens: &[Token], j: usize) -> Option<String> {
    let name = receiver(tokens.get(j))?;
    let prev = before(tokens, j);
    let next = tokens.get(j + 1);
    if punct(prev, PunctuationId::Dot) || punct(prev, PunctuationId::QuestionDot) {
        return None;
    }
    let continues = [PunctuationId::Dot, PunctuationId::QuestionDot, PunctuationId::LBracket, PunctuationId::LParen]
        .into_iter()
        .any(|p| punct(next, p));
    let is_key = punct(next, PunctuationId::Colon) && (punct(prev, PunctuationId::LBrace) || punct(prev, PunctuationId::Comma));
    (!continues && !is_key).then_some(name)
}

fn bare_values(tokens: &[Token], range: std::ops::Range<usize>) -> Vec<String> {
    range.filter_map(|j| bare_value(tokens, j)).collect()
}

/// Identifiers the expression ending at `tokens[end]` may evaluate to, when used as a receiver.
fn receivers_of(tokens: &[Token], end: Option<usize>, index: &mut SiteIndex) -> Vec<String> {
    let Some(end) = end else {
        return Vec::new();
    };
    let last = tokens.get(end);
    if let Some(name) = receiver(last) {
        return vec![name];
    }
    if !punct(last, PunctuationId::RParen) || index.saturated {
        return Vec::new();
    }
    let open = matching_open(tokens, end);
    if !index.spend(end - open.unwrap_or(0)) {
        return Vec::new();
    }
    let Some(open) = open else {
        return Vec::new();
    };
    // `f(x).y` receives a call result; `(x).y` receives whatever the group yields.
    if ends_value(before(tokens, open)) {
        return Vec::new();
    }
    bare_values(tokens, open + 1..end)
}

/// One past the last token of the expression starting at `tokens[start]`.
fn expression_end(tokens: &[Token], start: usize) -> usize {
    let mut depth = 0usize;
    for (j, token) in tokens.iter().enumerate().skip(start) {
        if depth == 0 {
            let separator = punct(Some(token), PunctuationId::Semicolon) || punct(Some(token), PunctuationId::Comma);
            let statement_break = token.newline_before
                && j > start
                && ends_value(before(tokens, j))
                && matches!(token.kind, TokenKind::Ident(_) | TokenKind::Keyword(_));
            if separator || statement_break || closes(token) {
                return j;
            }
        }
        if opens(token) {
            depth += 1;
        } else if closes(token) {
            depth = depth.saturating_sub(1);
        }
    }
    tokens.len()
}

/// Call information when `tokens[at]` opens an argument list.
fn call_at(tokens: &[Token], at: usize) -> Option<CallSite> {
    let open = tokens.get(at)?;
    let opens_call = open.kind.is_punctuation(PunctuationId::LParen)
        || (open.kind.is_punctuation(PunctuationId::QuestionDot) && punct(tokens.get(at + 1), PunctuationId::LParen));
    if !opens_call {
        return None;
    }
    let first = if open.kind.is_punctuation(PunctuationId::QuestionDot) { at + 2 } else { at + 1 };
    let literal_argument = match tokens.get(first).map(|t| &t.kind) {
        Some(TokenKind::String(s)) => Some(s.clone()),
        Some(TokenKind::Template(chunks)) => match chunks.as_slice() {
            [TemplateChunk::Literal(s)] => Some(s.clone()),
            [] => Some(String::new()),
            _ => None,
        },
        _ => None,
    }
    .filter(|_| punct(tokens.get(first + 1), PunctuationId::RParen) || punct(tokens.get(first + 1), PunctuationId::Comma));
    Some(CallSite { literal_argument })
}

/// Record the binding made by the assignment operator at `tokens[at]`.
fn assignment(tokens: &[Token], at: usize, index: &mut SiteIndex) {
    if index.saturated {
        return;
    }
    let end = expression_end(tokens, at + 1);
    if !index.spend(end - at) {
        return;
    }
    let values = bare_values(tokens, at + 1..end);
    let target = before(tokens, at);
    if let Some(TokenKind::Ident(name)) = target.map(|t| &t.kind) {
        if !punct(before(tokens, at - 1), PunctuationId::Dot) && !punct(before(tokens, at - 1), PunctuationId::QuestionDot) {
            index.alias(name, &values);
        }
        return;
    }
    // `{ cookie, top: t } = document` reads `document.cookie` and `document.top`.
    if !punct(target, PunctuationId::RBrace) {
        return;
    }
    let Some(open) = matching_open(tokens, at - 1) else {
        return;
    };
    if !index.spend(at - open) {
        return;
    }
    let mut depth = 0usize;
    for j in open + 1..at - 1 {
        let Some(token) = tokens.get(j) else {
            break;
        };
        if depth == 0 && (punct(before(tokens, j), PunctuationId::LBrace) || punct(before(tokens, j), PunctuationId::Comma)) {
            let key = match &token.kind {
                TokenKind::Ident(name) | TokenKind::String(name) => Some(name),
                _ => None,
            };
            if let Some(key) = key {
                index.sites.push(Site {
                    kind: SiteKind::Member,
                    receivers: values.clone(),
                    name: key.clone(),
                    call: None,
                    span: token.span,
                });
            }
        }
        if opens(token) {
            depth += 1;
        } else if closes(token) {
            depth = depth.saturating_sub(1);
        }
    }
}

fn visit(tokens: &[Token], nested: bool, index: &mut SiteIndex, pending: &mut Vec<Pending>) -> Option<()> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        let prev = before(tokens, i);
        match &token.kind {
            TokenKind::Template(chunks) => {
                for chunk in chunks {
                    if let TemplateChunk::Expr { source, offset } = chunk {
                        pending.push(Pending {
                            tokens: Lexer::with_offset(source, *offset).tokenize().ok()?,
                            nested: true,
                        });
                    }
                }
            }
            TokenKind::Operator(op) if is_assignment(*op) && i > 0 => assignment(tokens, i, index),
            TokenKind::Ident(name) => {
                let declares = [KeywordId::Var, KeywordId::Let, KeywordId::Const, KeywordId::Function, KeywordId::Class]
                    .into_iter()
                    .any(|k| keyword(prev, k));
                if declares {
                    if depth == 0 && !nested {
                        index.declared.insert(name.clone());
                    }
                    continue;
                }
                if punct(prev, PunctuationId::Dot) || punct(prev, PunctuationId::QuestionDot) {
                    continue;
                }
                let is_key = punct(tokens.get(i + 1), PunctuationId::Colon)
                    && (punct(prev, PunctuationId::LBrace) || punct(prev, PunctuationId::Comma));
                if is_key {
                    continue;
                }
                index.sites.push(Site {
                    kind: SiteKind::Reference,
                    receivers: Vec::new(),
                    name: name.clone(),
                    call: call_at(tokens, i + 1),
                    span: token.span,
                });
            }
            TokenKind::Punctuation(PunctuationId::Dot | PunctuationId::QuestionDot) => {
                let Some(property) = tokens.get(i + 1) else {
                    continue;
                };
                let Some(name) = property.kind.property_name() else {
                    continue;
                };
                let receivers = receivers_of(tokens, i.checked_sub(1), index);
                index.sites.push(Site {
                    kind: SiteKind::Member,
                    receivers,
                    name: name.to_string(),
                    call: call_at(tokens, i + 2),
                    span: prev.map_or(property.span, |p| p.span.merge(property.span)),
                });
            }
            TokenKind::Punctuation(PunctuationId::LBracket) => {
                let optional = punct(prev, PunctuationId::QuestionDot);
                let object_at = if optional { i.checked_sub(2) } else { i.checked_sub(1) };
                let object_token = object_at.and_then(|p| tokens.get(p));
                let indexes = optional || ends_value(prev);
                let computed = match (tokens.get(i + 1).map(|t| &t.kind), punct(tokens.get(i + 2), PunctuationId::RBracket)) {
                    (Some(TokenKind::String(name)), true) => Some(name),
                    _ => None,
                };
                if let (true, Some(name)) = (indexes, computed) {
                    let end = tokens.get(i + 2).map_or(token.span, |t| t.span);
                    let receivers = receivers_of(tokens, object_at, index);
                    index.sites.push(Site {
                        kind: SiteKind::Member,
                        receivers,
                        name: name.clone(),
                        call: call_at(tokens, i + 3),
                        span: object_token.map_or(token.span, |t| t.span).merge(end),
                    });
                }
            }
            _ => {}
        }
        if opens(token) {
            depth += 1;
        } else if closes(token) {
            depth = depth.saturating_sub(1);
        }
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites(source: &str) -> Vec<(SiteKind, Vec<String>, String, bool)> {
        extract(source)
            .expect("source should lex")
            .sites
            .into_iter()
            .map(|s| (s.kind, s.receivers, s.name, s.call.is_some()))
            .collect()
    }

    fn receivers_of_member(source: &str, property: &str) -> Vec<String> {
        let index = extract(source).expect("source should lex");
        let site = index.members().find(|s| s.name == property).expect("member site");
        let mut names = site.receivers.clone();
        names.sort();
        names
    }

    fn reaches(source: &str, property: &str, object: &str) -> bool {
        let index = extract(source).expect("source should lex");
        let names = index.names_for(object);
        index.members().any(|s| s.name == property && index.receiver_in(s, &names))
    }

    #[test]
    fn test_references_and_members() {
        assert_eq!(
            sites("const x = document.cookie"),
            vec![
                (SiteKind::Reference, vec![], "document".to_string(), false),
                (SiteKind::Member, vec!["document".to_string()], "cookie".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_computed_string_member() {
        let index = extract("document['cookie']").expect("lex");
        let member = index.members().next().expect("member site");
        assert_eq!(member.receivers, ["document"]);
        assert_eq!(member.name, "cookie");
    }

    #[test]
    fn test_array_literal_is_not_member_access() {
        let index = extract("const a = ['cookie']").expect("lex");
        assert_eq!(index.members().count(), 0);
    }

    #[test]
    fn test_call_literal_argument() {
        let index = extract("document.getElementById('root')").expect("lex");
        let call = index.calls().next().and_then(|s| s.call.clone()).expect("call site");
        assert_eq!(call.literal_argument.as_deref(), Some("root"));

        let index = extract("document.getElementById(id)").expect("lex");
        let call = index.calls().next().and_then(|s| s.call.clone()).expect("call site");
        assert_eq!(call.literal_argument, None);
    }

    #[test]
    fn test_comments_and_strings_are_ignored() {
        let index = extract("// eval(x)\nconst s = 'eval(x)' /* fetch() */").expect("lex");
        assert!(index.references().all(|s| s.name != "eval" && s.name != "fetch"));
    }

    #[test]
    fn test_object_keys_and_declarations() {
        let index = extract("const parent = 1; const o = { eval: 2, top }").expect("lex");
        assert!(index.declared.contains("parent"));
        let names: Vec<&str> = index.references().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["top"]);
    }

    #[test]
    fn test_only_top_level_declarations_count() {
        let index = extract("function f() { var fetch = 0; let top = 1 } { const eval = 2 } for (let frames of x) {}")
            .expect("lex");
        assert_eq!(index.declared, HashSet::from(["f".to_string()]));

        let index = extract("if (ready) var parent = 1").expect("lex");
        assert!(index.declared.contains("parent"));
    }

    #[test]
    fn test_template_substitutions_declare_nothing() {
        let index = extract("const s = `${(() => { var fetch })()}`").expect("lex");
        assert!(!index.declared.contains("fetch"));
    }

    #[test]
    fn test_parenthesized_receivers() {
        assert_eq!(receivers_of_member("(window).top.location = 'x'", "top"), ["window"]);
        assert_eq!(receivers_of_member("((document)).cookie", "cookie"), ["document"]);
        assert_eq!(receivers_of_member("(0, document).cookie", "cookie"), ["document"]);
        assert_eq!(receivers_of_member("(ok ? window : self).parent", "parent"), ["ok", "self", "window"]);
        assert!(receivers_of_member("f(document).cookie", "cookie").is_empty());
    }

    #[test]
    fn test_aliases_are_followed() {
        assert!(reaches("const w = window; w.frameElement", "frameElement", "window"));
        assert!(reaches("let a = window\nconst b = a\nb.top", "top", "window"));
        assert!(reaches("var d; d = (document); d['cookie']", "cookie", "document"));
        assert!(!reaches("const el = document.body; el.top", "top", "document"));
        assert!(!reaches("const w = window\nw2.top", "top", "window"));
    }

    #[test]
    fn test_alias_cycles_terminate() {
        let index = extract("a = b; b = a; a.top").expect("lex");
        let names = index.names_for("a");
        assert_eq!(names, HashSet::from(["a", "b"]));
    }

    #[test]
    fn test_destructuring_reads_members() {
        let index = extract("const { cookie, body: b } = document").expect("lex");
        let members: Vec<(&str, &[String])> = index.members().map(|s| (s.name.as_str(), s.receivers.as_slice())).collect();
        assert_eq!(
            members,
            [("cookie", &["document".to_string()][..]), ("body", &["document".to_string()][..])]
        );
    }

    #[test]
    fn test_exhausted_analysis_matches_any_receiver() {
        let source = format!("{}window; y.top", "a = ".repeat(2_000));
        let index = extract(&source).expect("lex");
        assert!(index.saturated);
        assert!(reaches(&source, "top", "window"));
        assert!(!extract("a = window; y.top").expect("lex").saturated);
    }

    #[test]
    fn test_template_substitutions_are_visited() {
        let index = extract("const s = `a ${eval('1')} b`").expect("lex");
        let eval = index.references().find(|s| s.name == "eval").expect("nested reference");
        assert!(eval.call.is_some());
    }

    #[test]
    fn test_unlexable_source() {
        assert!(extract("const s = 'unterminated").is_none());
    }
}
