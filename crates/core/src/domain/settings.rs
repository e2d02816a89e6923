// Index Settings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings bundle.
///
/// Every field is optional; unset fields are left out of the request body so
/// the engine keeps their current value (partial update).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filterable_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayed_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking_rules: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_words: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_attribute: Option<String>,
}

fn to_strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filterable_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable_attributes = Some(to_strings(attributes));
        self
    }

    pub fn with_sortable_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable_attributes = Some(to_strings(attributes));
        self
    }

    pub fn with_searchable_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable_attributes = Some(to_strings(attributes));
        self
    }

    pub fn with_displayed_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.displayed_attributes = Some(to_strings(attributes));
        self
    }

    pub fn with_ranking_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ranking_rules = Some(to_strings(rules));
        self
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = Some(to_strings(words));
        self
    }

    pub fn with_synonyms(mut self, synonyms: BTreeMap<String, Vec<String>>) -> Self {
        self.synonyms = Some(synonyms);
        self
    }

    pub fn with_distinct_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.distinct_attribute = Some(attribute.into());
        self
    }

    /// Overlay every field set in `patch` onto `self`
    pub fn merge(&mut self, patch: Settings) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if patch.$field.is_some() { self.$field = patch.$field; })*
            };
        }
        overlay!(
            filterable_attributes,
            sortable_attributes,
            searchable_attributes,
            displayed_attributes,
            ranking_rules,
            stop_words,
            synonyms,
            distinct_attribute
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_body_only_contains_set_fields() {
        let settings = Settings::new().with_filterable_attributes(["genre"]);
        let body = serde_json::to_value(&settings).unwrap();
        assert_eq!(body, json!({ "filterableAttributes": ["genre"] }));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut current = Settings::new()
            .with_filterable_attributes(["genre"])
            .with_stop_words(["the"]);
        current.merge(Settings::new().with_filterable_attributes(["genre", "year"]));

        assert_eq!(
            current.filterable_attributes,
            Some(vec!["genre".to_string(), "year".to_string()])
        );
        assert_eq!(current.stop_words, Some(vec!["the".to_string()]));
    }
}
