//! Gardening advice grouped by calendar month
//!
//! An `AdviceCatalog` holds advice entries, each tied to one or more months,
//! and answers "what should I do in the garden this month?".

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Advice shipped with the catalog: description and month numbers
static DEFAULT_ADVICE: [(&str, &[i64]); 8] = [
    (
        "Plantez des herbes aromatiques comme le basilic et la menthe au printemps.",
        &[4, 5],
    ),
    (
        "En mai, n’oubliez pas d’arroser régulièrement vos jeunes plants.",
        &[6],
    ),
    (
        "En été, protégez vos légumes du soleil direct avec des filets d’ombre.",
        &[7, 8],
    ),
    (
        "À l’automne, récoltez vos légumes avant les premières gelées.",
        &[10, 11],
    ),
    (
        "Préparez votre jardin pour l’hiver en protégeant vos plantes sensibles.",
        &[12],
    ),
    (
        "En mars, commencez vos semis en intérieur pour les plantes sensibles au froid.",
        &[4],
    ),
    (
        "Ne négligez pas le compostage ! Ajoutez des déchets organiques toute l’année.",
        &[1, 12],
    ),
    (
        "En octobre, plantez des bulbes de fleurs pour avoir un joli jardin au printemps.",
        &[11],
    ),
];

/// Errors raised by advice operations
#[derive(Debug, Error)]
pub enum AdviceError {
    /// Month number outside 1..=12
    #[error("Invalid month: {0}")]
    InvalidMonth(i64),

    /// No advice is attached to the requested month
    #[error("Advices not found.")]
    NotFound,

    #[error("Advice {0} not found")]
    AdviceNotFound(u32),

    #[error("{0}")]
    Validation(String),
}

/// A calendar month, 1 (January) to 12 (December)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Month {
    #[serde(rename = "monthNumber")]
    month_number: u8,
}

impl Month {
    pub fn new(number: i64) -> Result<Self, AdviceError> {
        match u8::try_from(number) {
            Ok(n @ 1..=12) => Ok(Self { month_number: n }),
            _ => Err(AdviceError::InvalidMonth(number)),
        }
    }

    /// The current month in local time
    pub fn current() -> Self {
        Self {
            // chrono months are always 1..=12
            month_number: Local::now().month() as u8,
        }
    }

    pub fn number(&self) -> u8 {
        self.month_number
    }
}

/// A piece of gardening advice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advice {
    pub id: u32,
    pub description: String,
    pub months: Vec<Month>,
}

impl Advice {
    pub fn applies_to(&self, month: Month) -> bool {
        self.months.contains(&month)
    }
}

/// Request body for creating advice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAdvice {
    pub description: String,
    /// Month numbers the advice applies to
    #[serde(default, rename = "month")]
    pub months: Vec<i64>,
}

/// Request body for updating advice; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdviceUpdate {
    #[serde(default)]
    pub description: Option<String>,
    /// Months to add to the advice
    #[serde(default, rename = "month")]
    pub months: Option<Vec<i64>>,
}

/// In-memory store of advice, keyed by id
#[derive(Debug, Clone)]
pub struct AdviceCatalog {
    advices: BTreeMap<u32, Advice>,
    next_id: u32,
}

impl Default for AdviceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl AdviceCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self {
            advices: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Creates a catalog holding the built-in advice
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for (description, months) in DEFAULT_ADVICE.iter() {
            let months = months.iter().filter_map(|&n| Month::new(n).ok()).collect();
            catalog.insert(description.to_string(), months);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.advices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advices.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Advice> {
        self.advices.get(&id)
    }

    /// All advice for `month`, in creation order
    ///
    /// Fails with `AdviceError::NotFound` when the month has no advice.
    pub fn by_month(&self, month: Month) -> Result<Vec<&Advice>, AdviceError> {
        let advices: Vec<&Advice> = self
            .advices
            .values()
            .filter(|advice| advice.applies_to(month))
            .collect();

        if advices.is_empty() {
            return Err(AdviceError::NotFound);
        }
        Ok(advices)
    }

    /// All advice for the current month
    pub fn for_current_month(&self) -> Result<Vec<&Advice>, AdviceError> {
        self.by_month(Month::current())
    }

    /// Adds new advice and returns it with its assigned id
    pub fn create(&mut self, new_advice: NewAdvice) -> Result<&Advice, AdviceError> {
        let description = validate_description(&new_advice.description)?;
        let months = parse_months(&new_advice.months)?;
        if months.is_empty() {
            return Err(AdviceError::Validation(
                "Au moins un mois doit être associé au conseil.".to_string(),
            ));
        }

        let id = self.insert(description, months.into_iter().collect());
        tracing::info!("Created advice {}", id);
        self.get(id).ok_or(AdviceError::AdviceNotFound(id))
    }

    /// Updates advice in place
    ///
    /// A provided description replaces the current one. Provided months are
    /// added to those already attached; none are removed.
    pub fn update(&mut self, id: u32, update: AdviceUpdate) -> Result<&Advice, AdviceError> {
        // Validate everything before touching the stored advice
        let description = update
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?;
        let months = parse_months(update.months.as_deref().unwrap_or_default())?;

        let advice = self
            .advices
            .get_mut(&id)
            .ok_or(AdviceError::AdviceNotFound(id))?;

        if let Some(description) = description {
            advice.description = description;
        }
        let mut merged: BTreeSet<Month> = advice.months.iter().copied().collect();
        merged.extend(months);
        advice.months = merged.into_iter().collect();

        tracing::info!("Updated advice {}", id);
        Ok(&*advice)
    }

    fn insert(&mut self, description: String, months: Vec<Month>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.advices.insert(
            id,
            Advice {
                id,
                description,
                months,
            },
        );
        id
    }
}

fn validate_description(description: &str) -> Result<String, AdviceError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AdviceError::Validation(
            "La description du conseil est obligatoire.".to_string(),
        ));
    }
    Ok(description.to_string())
}

/// Converts month numbers into a sorted, de-duplicated set
fn parse_months(numbers: &[i64]) -> Result<BTreeSet<Month>, AdviceError> {
    numbers.iter().map(|&n| Month::new(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(n: i64) -> Month {
        Month::new(n).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert!(Month::new(1).is_ok());
        assert!(Month::new(12).is_ok());
        assert!(matches!(Month::new(0), Err(AdviceError::InvalidMonth(0))));
        assert!(matches!(Month::new(13), Err(AdviceError::InvalidMonth(13))));
        assert!(matches!(Month::new(-4), Err(AdviceError::InvalidMonth(-4))));
    }

    #[test]
    fn test_current_month_is_valid() {
        let current = Month::current();
        assert!((1..=12).contains(&current.number()));
    }

    #[test]
    fn test_defaults_for_april() {
        let catalog = AdviceCatalog::with_defaults();
        assert_eq!(catalog.len(), 8);

        let april = catalog.by_month(month(4)).unwrap();
        assert_eq!(april.len(), 2);
        assert!(april[0].description.contains("basilic"));
        assert!(april[1].description.contains("semis"));
    }

    #[test]
    fn test_month_without_advice_is_not_found() {
        let catalog = AdviceCatalog::with_defaults();
        assert!(matches!(catalog.by_month(month(2)), Err(AdviceError::NotFound)));
        assert_eq!(AdviceError::NotFound.to_string(), "Advices not found.");
    }

    #[test]
    fn test_for_current_month_matches_by_month() {
        let catalog = AdviceCatalog::with_defaults();
        let current = catalog.for_current_month().ok().map(|a| a.len());
        let expected = catalog.by_month(Month::current()).ok().map(|a| a.len());
        assert_eq!(current, expected);
    }

    #[test]
    fn test_create_assigns_ids_and_dedups_months() {
        let mut catalog = AdviceCatalog::with_defaults();
        let advice = catalog
            .create(NewAdvice {
                description: "  Taillez les rosiers.  ".to_string(),
                months: vec![3, 2, 3],
            })
            .unwrap();

        assert_eq!(advice.id, 9);
        assert_eq!(advice.description, "Taillez les rosiers.");
        assert_eq!(advice.months, vec![month(2), month(3)]);
        assert_eq!(catalog.by_month(month(2)).unwrap().len(), 1);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let mut catalog = AdviceCatalog::new();

        let blank = catalog.create(NewAdvice {
            description: " ".to_string(),
            months: vec![1],
        });
        assert!(matches!(blank, Err(AdviceError::Validation(_))));

        let no_month = catalog.create(NewAdvice {
            description: "Paillez.".to_string(),
            months: vec![],
        });
        assert!(matches!(no_month, Err(AdviceError::Validation(_))));

        let bad_month = catalog.create(NewAdvice {
            description: "Paillez.".to_string(),
            months: vec![5, 14],
        });
        assert!(matches!(bad_month, Err(AdviceError::InvalidMonth(14))));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_new_advice_deserializes_month_field() {
        let new_advice: NewAdvice =
            serde_json::from_str(r#"{"description": "Arrosez.", "month": [6, 7]}"#).unwrap();
        assert_eq!(new_advice.months, vec![6, 7]);
    }

    #[test]
    fn test_update_adds_months_and_replaces_description() {
        let mut catalog = AdviceCatalog::with_defaults();
        let updated = catalog
            .update(
                2,
                AdviceUpdate {
                    description: Some("Arrosez le soir.".to_string()),
                    months: Some(vec![5]),
                },
            )
            .unwrap();

        assert_eq!(updated.description, "Arrosez le soir.");
        assert_eq!(updated.months, vec![month(5), month(6)]);
    }

    #[test]
    fn test_update_without_fields_keeps_advice() {
        let mut catalog = AdviceCatalog::with_defaults();
        let before = catalog.get(1).cloned().unwrap();
        let after = catalog.update(1, AdviceUpdate::default()).unwrap();
        assert_eq!(&before, after);
    }

    #[test]
    fn test_update_errors_leave_advice_untouched() {
        let mut catalog = AdviceCatalog::with_defaults();

        let missing = catalog.update(99, AdviceUpdate::default());
        assert!(matches!(missing, Err(AdviceError::AdviceNotFound(99))));

        let bad_month = catalog.update(
            1,
            AdviceUpdate {
                description: Some("Changed".to_string()),
                months: Some(vec![0]),
            },
        );
        assert!(matches!(bad_month, Err(AdviceError::InvalidMonth(0))));
        assert!(catalog.get(1).unwrap().description.contains("basilic"));
    }

    #[test]
    fn test_advice_payload_shape() {
        let catalog = AdviceCatalog::with_defaults();
        let json = serde_json::to_value(catalog.get(5).unwrap()).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["months"], serde_json::json!([{"monthNumber": 12}]));
    }
}
