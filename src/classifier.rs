use crate::error::{InsightsError, Result};
use crate::schema::{default_rules, Category, ClassificationRule};

/// Ordered keyword rules evaluated against the location and every label.
///
/// Keywords are matched case-insensitively as substrings of each text separately,
/// so "Loss - Water Damage" matches `Loss`. The first rule with any hit decides the
/// category; when nothing matches the item is `Inventory`.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(Category, Vec<String>)>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::compile(&default_rules())
    }
}

impl KeywordClassifier {
    pub fn new(rules: &[ClassificationRule]) -> Result<Self> {
        validate_rules(rules)?;
        Ok(Self::compile(rules))
    }

    fn compile(rules: &[ClassificationRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let keywords = rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .collect();
                (rule.category, keywords)
            })
            .collect();
        Self { rules }
    }

    pub fn classify<'a, I>(&self, location: &str, labels: I) -> Category
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut texts = vec![location.to_lowercase()];
        texts.extend(labels.into_iter().map(|label| label.to_lowercase()));

        self.rules
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| texts.iter().any(|text| text.contains(keyword.as_str())))
            })
            .map(|(category, _)| *category)
            .unwrap_or(Category::Inventory)
    }
}

/// Classifies with the default tracker vocabulary.
pub fn classify<'a, I>(location: &str, labels: I) -> Category
where
    I: IntoIterator<Item = &'a String>,
{
    KeywordClassifier::default().classify(location, labels)
}

pub fn validate_rules(rules: &[ClassificationRule]) -> Result<()> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.category == Category::Inventory {
            return Err(InsightsError::InvalidRule {
                index,
                details: "Inventory is the fallback category and cannot be targeted by a rule"
                    .to_string(),
            });
        }

        if rule.keywords.is_empty() {
            return Err(InsightsError::InvalidRule {
                index,
                details: format!("Rule for {} has no keywords", rule.category),
            });
        }

        // An empty keyword is a substring of every text and would swallow all items.
        if let Some(pos) = rule.keywords.iter().position(|k| k.trim().is_empty()) {
            return Err(InsightsError::InvalidRule {
                index,
                details: format!("Keyword #{} for {} is blank", pos, rule.category),
            });
        }
    }

    Ok(())
}
