//! Localisation support data shipped alongside the marker set.

/// A language the support tables are translated into.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Language {
    /// Language code such as `en` or `fr`.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A text template in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Template {
    /// Server identifier.
    pub id: u64,
    /// Language code of the body.
    pub language: String,
    /// Template name.
    pub name: String,
    /// Template text.
    pub body: String,
}

/// A translated string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Translation {
    /// Lookup key.
    pub key: String,
    /// Language code.
    pub language: String,
    /// Translated text.
    pub text: String,
}

/// The three support tables read or written together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SupportTables {
    /// Known languages.
    pub languages: Vec<Language>,
    /// Text templates.
    pub templates: Vec<Template>,
    /// Translated strings.
    pub translations: Vec<Translation>,
}

impl SupportTables {
    /// Whether every table holds at least one row.
    ///
    /// An empty table means the support data was never delivered or was
    /// truncated, so callers treat it as unusable.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.languages.is_empty() && !self.templates.is_empty() && !self.translations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn full() -> SupportTables {
        SupportTables {
            languages: vec![Language {
                code: "en".into(),
                name: "English".into(),
            }],
            templates: vec![Template {
                id: 1,
                language: "en".into(),
                name: "greeting".into(),
                body: "Welcome aboard".into(),
            }],
            translations: vec![Translation {
                key: "fuel".into(),
                language: "en".into(),
                text: "Fuel".into(),
            }],
        }
    }

    #[rstest]
    fn full_tables_are_complete() {
        assert!(full().is_complete());
    }

    #[rstest]
    #[case::languages(|t: &mut SupportTables| t.languages.clear())]
    #[case::templates(|t: &mut SupportTables| t.templates.clear())]
    #[case::translations(|t: &mut SupportTables| t.translations.clear())]
    fn any_empty_table_is_incomplete(#[case] clear: fn(&mut SupportTables)) {
        let mut tables = full();
        clear(&mut tables);
        assert!(!tables.is_complete());
    }
}
