//! Which sentiment categories a run keeps.

use std::collections::BTreeSet;
use std::fmt;

use tracing::warn;

use crate::sentiment::SentimentCategory;

/// The categories selected for retention. Fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSet {
    /// Every category passes.
    #[default]
    All,
    /// Only these categories pass. Never empty.
    Only(BTreeSet<SentimentCategory>),
}

impl TargetSet {
    /// Builds a set from the given categories; no categories means `All`.
    pub fn from_categories<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = SentimentCategory>,
    {
        let set: BTreeSet<_> = categories.into_iter().collect();
        if set.is_empty() {
            TargetSet::All
        } else {
            TargetSet::Only(set)
        }
    }

    /// Parses an operator selection such as `ALL`, `1,4`, `very good, bad`
    /// or `VeryGood`.
    ///
    /// Menu numbers follow the operator menu:
    /// 1 Very Good, 2 Good, 3 Bad, 4 Worst, 5 ALL. Unknown tokens are
    /// ignored; if nothing valid remains the selection is `All`.
    pub fn parse(input: &str) -> Self {
        let mut categories = BTreeSet::new();

        for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let normalized: String = token
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
                .collect::<String>()
                .to_lowercase();

            let category = match normalized.as_str() {
                "all" | "5" => return TargetSet::All,
                "verygood" | "1" => SentimentCategory::VeryGood,
                "good" | "2" => SentimentCategory::Good,
                "bad" | "3" => SentimentCategory::Bad,
                "worst" | "4" => SentimentCategory::Worst,
                "neutral" => SentimentCategory::Neutral,
                _ => {
                    warn!(token, "Ignoring unknown sentiment category");
                    continue;
                }
            };
            categories.insert(category);
        }

        Self::from_categories(categories)
    }

    pub fn contains(&self, category: SentimentCategory) -> bool {
        match self {
            TargetSet::All => true,
            TargetSet::Only(set) => set.contains(&category),
        }
    }

    /// Filename-safe label: `ALL`, `Very_Good`, `Good+Worst`.
    /// Categories are listed most favorable first.
    pub fn label(&self) -> String {
        match self {
            TargetSet::All => "ALL".to_string(),
            TargetSet::Only(set) => set
                .iter()
                .rev()
                .map(|c| c.label().replace(' ', "_"))
                .collect::<Vec<_>>()
                .join("+"),
        }
    }
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSet::All => f.write_str("ALL"),
            TargetSet::Only(set) => {
                let labels: Vec<&str> = set.iter().rev().map(|c| c.label()).collect();
                f.write_str(&labels.join(", "))
            }
        }
    }
}

/// True iff `targets` is `All` or contains `category`.
pub fn should_retain(category: SentimentCategory, targets: &TargetSet) -> bool {
    targets.contains(category)
}
