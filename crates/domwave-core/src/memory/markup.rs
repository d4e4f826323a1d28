#![forbid(unsafe_code)]

//! Fragment parsing and serialization rules.
//!
//! Parsing runs the HTML5 fragment algorithm from `html5ever` in the context
//! of the element the markup lands in, so auto-closed paragraphs, table
//! context, and character references come out the way a browser's
//! `innerHTML` setter builds them. Serialization follows the HTML fragment
//! serialization rules for text and attribute escaping.

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that never have children or a close tag.
const VOID_ELEMENTS: [&str; 18] = [
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children serialize without escaping.
const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

#[must_use]
pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[must_use]
pub(crate) fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parsed fragment node, detached from any document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Fragment>,
    },
    Text(String),
    Comment(String),
}

/// Parse `input` as the children of a `context` element.
#[must_use]
pub(crate) fn parse_fragment(context: &str, input: &str) -> Vec<Fragment> {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from(context),
    );
    let dom = html5ever::parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(input);
    let mut out = Vec::new();
    // The fragment algorithm parents everything under a synthetic <html>.
    for root in dom.document.children.borrow().iter() {
        for child in root.children.borrow().iter() {
            convert(child, &mut out);
        }
    }
    out
}

fn convert(handle: &Handle, out: &mut Vec<Fragment>) {
    match &handle.data {
        NodeData::Text { contents } => {
            let text = contents.borrow();
            if let Some(Fragment::Text(prev)) = out.last_mut() {
                prev.push_str(&text);
            } else {
                out.push(Fragment::Text(text.to_string()));
            }
        }
        NodeData::Comment { contents } => out.push(Fragment::Comment(contents.to_string())),
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            let mut children = Vec::new();
            let template = template_contents.borrow();
            let source = template.as_ref().unwrap_or(handle);
            for child in source.children.borrow().iter() {
                convert(child, &mut children);
            }
            out.push(Fragment::Element {
                tag: name.local.to_string(),
                attrs,
                children,
            });
        }
        _ => {}
    }
}

/// Escape a text node for serialization.
#[must_use]
pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value for double-quoted serialization.
#[must_use]
pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn el(tag: &str, attrs: &[(&str, &str)], children: Vec<Fragment>) -> Fragment {
        Fragment::Element {
            tag: tag.to_owned(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            children,
        }
    }

    fn text(s: &str) -> Fragment {
        Fragment::Text(s.to_owned())
    }

    #[test]
    fn parses_nested_elements_and_text() {
        assert_eq!(
            parse_fragment("div", r#"<span class="col0">a<b>!</b></span>tail"#),
            vec![
                el(
                    "span",
                    &[("class", "col0")],
                    vec![text("a"), el("b", &[], vec![text("!")])]
                ),
                text("tail"),
            ]
        );
    }

    #[test]
    fn attribute_names_are_lowercased_and_first_duplicate_wins() {
        assert_eq!(
            parse_fragment("div", r#"<p id=main data-x='1 2' hidden CLASS="a" id="b">x</p>"#),
            vec![el(
                "p",
                &[("id", "main"), ("data-x", "1 2"), ("hidden", ""), ("class", "a")],
                vec![text("x")]
            )]
        );
    }

    #[test]
    fn paragraphs_auto_close() {
        assert_eq!(
            parse_fragment("div", "<p>one<p>two"),
            vec![
                el("p", &[], vec![text("one")]),
                el("p", &[], vec![text("two")]),
            ]
        );
    }

    #[test]
    fn character_references_are_decoded() {
        assert_eq!(
            parse_fragment("div", "a &amp; b &lt;c&gt;"),
            vec![text("a & b <c>")]
        );
    }

    #[test]
    fn void_elements_have_no_children() {
        assert_eq!(
            parse_fragment("div", "a<br>b"),
            vec![text("a"), el("br", &[], vec![]), text("b")]
        );
    }

    #[test]
    fn context_element_decides_table_parsing() {
        assert_eq!(
            parse_fragment("tr", "<td>x</td>"),
            vec![el("td", &[], vec![text("x")])]
        );
        assert_eq!(parse_fragment("div", "<td>x</td>"), vec![text("x")]);
    }

    #[test]
    fn comments_are_kept() {
        assert_eq!(
            parse_fragment("div", "x<!-- note -->"),
            vec![text("x"), Fragment::Comment(" note ".to_owned())]
        );
    }

    #[test]
    fn escaping_follows_fragment_serialization() {
        assert_eq!(escape_text("1 < 2 & 3 > 0\u{a0}"), "1 &lt; 2 &amp; 3 &gt; 0&nbsp;");
        assert_eq!(escape_attr(r#"say "hi" & <go>"#), "say &quot;hi&quot; &amp; <go>");
    }
}
