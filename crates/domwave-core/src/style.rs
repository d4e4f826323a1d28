#![forbid(unsafe_code)]

//! Inline style declarations (`style` attribute / `cssText`).

/// Ordered list of `property: value` pairs.
///
/// Property names are stored lowercase; setting an existing property keeps
/// its original position, matching how `CSSStyleDeclaration` serializes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    entries: Vec<(String, String)>,
}

impl StyleDeclaration {
    /// Parse `cssText`. Malformed declarations (no `:`, empty name or value)
    /// are dropped.
    #[must_use]
    pub fn parse(css_text: &str) -> Self {
        let mut decl = Self::default();
        for part in css_text.split(';') {
            let Some((name, value)) = part.split_once(':') else {
                continue;
            };
            decl.set(name, value);
        }
        decl
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Set `property`. An empty value removes it, like assigning `""` to a
    /// style property does.
    pub fn set(&mut self, property: &str, value: &str) {
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim();
        if property.is_empty() {
            return;
        }
        if value.is_empty() {
            self.entries.retain(|(name, _)| *name != property);
            return;
        }
        match self.entries.iter_mut().find(|(name, _)| *name == property) {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.entries.push((property, value.to_owned())),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as `cssText`: `"left: 4px; top: 2px;"`.
    #[must_use]
    pub fn to_css_text(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_serializes_declarations() {
        let decl = StyleDeclaration::parse("LEFT:4px ; top: 2px;;bogus; :x");
        assert_eq!(decl.get("left"), Some("4px"));
        assert_eq!(decl.get("Top"), Some("2px"));
        assert_eq!(decl.to_css_text(), "left: 4px; top: 2px;");
    }

    #[test]
    fn set_keeps_position_of_existing_property() {
        let mut decl = StyleDeclaration::parse("width: 1px; height: 2px");
        decl.set("width", "10px");
        assert_eq!(decl.to_css_text(), "width: 10px; height: 2px;");
    }

    #[test]
    fn empty_value_removes_property() {
        let mut decl = StyleDeclaration::parse("display: none");
        decl.set("display", "");
        assert!(decl.is_empty());
        assert_eq!(decl.to_css_text(), "");
    }
}
