#![forbid(unsafe_code)]

//! Minimal CSS selector engine.
//!
//! Supports type and universal selectors, `.class`, `#id`, compound
//! selectors, descendant and child (`>`) combinators, and `,` groups. That
//! covers every selector the shims are called with in practice; anything
//! else is rejected rather than guessed at.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported or invalid selector {0:?}")]
pub struct SelectorError(pub String);

/// Read access to an element tree for matching.
pub(crate) trait ElementTree {
    type Id: Copy;

    fn parent_element(&self, id: Self::Id) -> Option<Self::Id>;
    fn tag_name(&self, id: Self::Id) -> Option<&str>;
    fn attribute(&self, id: Self::Id, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.ids.is_empty() && self.classes.is_empty()
    }

    fn matches<T: ElementTree>(&self, tree: &T, id: T::Id) -> bool {
        let Some(tag) = tree.tag_name(id) else {
            return false;
        };
        let tag_ok = self
            .tag
            .as_deref()
            .is_none_or(|want| want == "*" || want.eq_ignore_ascii_case(tag));
        if !tag_ok {
            return false;
        }
        if !self
            .ids
            .iter()
            .all(|want| tree.attribute(id, "id") == Some(want.as_str()))
        {
            return false;
        }
        let classes = tree.attribute(id, "class").unwrap_or("");
        self.classes
            .iter()
            .all(|want| classes.split_ascii_whitespace().any(|have| have == want))
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Each alternative is a chain of compounds; the combinator on an entry
    /// relates it to the entry before it.
    alternatives: Vec<Vec<(Combinator, Compound)>>,
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let invalid = || SelectorError(raw.to_owned());
        let mut alternatives = Vec::new();
        for group in raw.split(',') {
            let chain = parse_chain(group).ok_or_else(invalid)?;
            alternatives.push(chain);
        }
        Ok(Self { alternatives })
    }

    pub(crate) fn matches<T: ElementTree>(&self, tree: &T, id: T::Id) -> bool {
        self.alternatives
            .iter()
            .any(|chain| matches_chain(tree, id, chain))
    }
}

fn matches_chain<T: ElementTree>(tree: &T, id: T::Id, chain: &[(Combinator, Compound)]) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_last() else {
        return false;
    };
    if !compound.matches(tree, id) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => tree
            .parent_element(id)
            .is_some_and(|parent| matches_chain(tree, parent, rest)),
        Combinator::Descendant => {
            let mut ancestor = tree.parent_element(id);
            while let Some(current) = ancestor {
                if matches_chain(tree, current, rest) {
                    return true;
                }
                ancestor = tree.parent_element(current);
            }
            false
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn take_ident(input: &str) -> Option<(&str, &str)> {
    if !input.starts_with(is_ident_start) {
        return None;
    }
    let end = input.find(|c: char| !is_ident_char(c)).unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

fn parse_chain(group: &str) -> Option<Vec<(Combinator, Compound)>> {
    let mut chain = Vec::new();
    let mut rest = group.trim();
    let mut combinator = Combinator::Descendant;
    if rest.is_empty() {
        return None;
    }
    while !rest.is_empty() {
        let (compound, after) = parse_compound(rest)?;
        chain.push((combinator, compound));
        let trimmed = after.trim_start();
        if let Some(after_child) = trimmed.strip_prefix('>') {
            combinator = Combinator::Child;
            rest = after_child.trim_start();
            if rest.is_empty() {
                return None;
            }
        } else if trimmed.len() < after.len() || trimmed.is_empty() {
            combinator = Combinator::Descendant;
            rest = trimmed;
        } else {
            return None;
        }
    }
    Some(chain)
}

fn parse_compound(input: &str) -> Option<(Compound, &str)> {
    let mut compound = Compound::default();
    let mut rest = input;
    if let Some(after) = rest.strip_prefix('*') {
        compound.tag = Some("*".to_owned());
        rest = after;
    } else if let Some((tag, after)) = take_ident(rest) {
        compound.tag = Some(tag.to_ascii_lowercase());
        rest = after;
    }
    loop {
        if let Some(after) = rest.strip_prefix('.') {
            let (class, after) = take_ident(after)?;
            compound.classes.push(class.to_owned());
            rest = after;
        } else if let Some(after) = rest.strip_prefix('#') {
            let (id, after) = take_ident(after)?;
            compound.ids.push(id.to_owned());
            rest = after;
        } else {
            break;
        }
    }
    if compound.is_empty() {
        return None;
    }
    Some((compound, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tiny fixed tree: 0 = html, 1 = body, 2 = div#grid.board, 3 = div.row0,
    /// 4 = span.col0.hot, 5 = p.row0 (outside the grid).
    struct Fixture;

    impl ElementTree for Fixture {
        type Id = usize;

        fn parent_element(&self, id: usize) -> Option<usize> {
            match id {
                1 => Some(0),
                2 | 5 => Some(1),
                3 => Some(2),
                4 => Some(3),
                _ => None,
            }
        }

        fn tag_name(&self, id: usize) -> Option<&str> {
            ["html", "body", "div", "div", "span", "p"].get(id).copied()
        }

        fn attribute(&self, id: usize, name: &str) -> Option<&str> {
            match (id, name) {
                (2, "id") => Some("grid"),
                (2, "class") => Some("board"),
                (3 | 5, "class") => Some("row0"),
                (4, "class") => Some("col0  hot"),
                _ => None,
            }
        }
    }

    fn matching(selector: &str) -> Vec<usize> {
        let selector = Selector::parse(selector).expect("valid selector");
        (0..6).filter(|id| selector.matches(&Fixture, *id)).collect()
    }

    #[test]
    fn simple_selectors() {
        assert_eq!(matching("#grid"), vec![2]);
        assert_eq!(matching(".row0"), vec![3, 5]);
        assert_eq!(matching("span"), vec![4]);
        assert_eq!(matching("*"), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn compound_selectors_require_every_part() {
        assert_eq!(matching("div.row0"), vec![3]);
        assert_eq!(matching("span.col0.hot"), vec![4]);
        assert_eq!(matching("div#grid.board"), vec![2]);
        assert_eq!(matching(".col0.cold"), Vec::<usize>::new());
    }

    #[test]
    fn descendant_and_child_combinators() {
        assert_eq!(matching("#grid .col0"), vec![4]);
        assert_eq!(matching(".row0 .col0"), vec![4]);
        assert_eq!(matching("#grid > .row0"), vec![3]);
        assert_eq!(matching("#grid > .col0"), Vec::<usize>::new());
        assert_eq!(matching("body   .row0"), vec![3, 5]);
    }

    #[test]
    fn groups_match_any_alternative() {
        assert_eq!(matching("p, #grid"), vec![2, 5]);
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        for bad in ["", " ", ".", "#", ".1abc", "div >", "a,", "[data-x]", "div:hover", "a+b"] {
            assert!(Selector::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
