use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub type QuestionId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    FreeText,
}

impl QuestionKind {
    pub fn is_choice(self) -> bool {
        !matches!(self, QuestionKind::FreeText)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuestionKind::SingleChoice => "single-choice",
            QuestionKind::MultiChoice => "multi-choice",
            QuestionKind::FreeText => "free-text",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Question {
    pub fn accepts(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Named, ordered group of question ids. Only used for progress display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub questions: Vec<QuestionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    DuplicateQuestion(QuestionId),
    Uncategorized(QuestionId),
    UnknownInCategory { category: String, question: QuestionId },
    NoOptions(QuestionId),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateQuestion(id) => write!(f, "question {id} defined twice"),
            CatalogError::Uncategorized(id) => {
                write!(f, "question {id} does not belong to exactly one category")
            }
            CatalogError::UnknownInCategory { category, question } => {
                write!(f, "category '{category}' lists unknown question {question}")
            }
            CatalogError::NoOptions(id) => write!(f, "choice question {id} has no options"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// The fixed set of questions the form renders, grouped into categories.
///
/// Every question belongs to exactly one category. Question order follows
/// category order.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    categories: Vec<Category>,
    questions: BTreeMap<QuestionId, Question>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>, questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut by_id = BTreeMap::new();
        for question in questions {
            if question.kind.is_choice() && question.options.is_empty() {
                return Err(CatalogError::NoOptions(question.id));
            }
            let id = question.id;
            if by_id.insert(id, question).is_some() {
                return Err(CatalogError::DuplicateQuestion(id));
            }
        }

        let mut seen = BTreeSet::new();
        for category in &categories {
            for &id in &category.questions {
                if !by_id.contains_key(&id) {
                    return Err(CatalogError::UnknownInCategory {
                        category: category.name.clone(),
                        question: id,
                    });
                }
                if !seen.insert(id) {
                    return Err(CatalogError::Uncategorized(id));
                }
            }
        }
        if let Some(&id) = by_id.keys().find(|id| !seen.contains(*id)) {
            return Err(CatalogError::Uncategorized(id));
        }

        Ok(Self {
            categories,
            questions: by_id,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    /// Questions in display order (category by category).
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.categories
            .iter()
            .flat_map(|c| c.questions.iter())
            .filter_map(|id| self.questions.get(id))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The 24-question Aro booking system discovery questionnaire.
    pub fn aro_discovery() -> Self {
        use QuestionKind::{FreeText, MultiChoice, SingleChoice};

        let q = |id: QuestionId, kind: QuestionKind, prompt: &str, options: &[&str]| Question {
            id,
            kind,
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        };

        let questions = vec![
            q(1, SingleChoice, "What kind of clients do you mostly serve?", &[
                "residential-heavy",
                "balanced",
                "business-heavy",
                "unknown",
            ]),
            q(2, SingleChoice, "How large is your service area?", &[
                "single-city",
                "regional",
                "national",
            ]),
            q(3, SingleChoice, "How many people work in the field?", &[
                "solo", "small", "medium", "large",
            ]),
            q(4, MultiChoice, "How do clients book today?", &[
                "phone", "whatsapp", "email", "website", "walk-in",
            ]),
            q(5, FreeText, "Anything else about your business we should know?", &[]),
            q(6, SingleChoice, "How many services do you offer?", &["few", "moderate", "many"]),
            q(7, SingleChoice, "How do you price your services?", &[
                "fixed", "hourly", "quote", "mixed",
            ]),
            q(8, SingleChoice, "Are your services one-off or recurring?", &[
                "one-time",
                "recurring",
                "both",
            ]),
            q(9, MultiChoice, "Do you sell add-ons?", &["extras", "packages", "none"]),
            q(10, FreeText, "Describe your most requested service.", &[]),
            q(11, SingleChoice, "How do you schedule jobs today?", &[
                "paper",
                "spreadsheet",
                "software",
                "none",
            ]),
            q(12, SingleChoice, "How are staff assigned to jobs?", &[
                "manual",
                "by-zone",
                "by-skill",
                "automatic",
            ]),
            q(13, SingleChoice, "How far ahead do clients usually book?", &[
                "same-day", "days", "weeks",
            ]),
            q(14, SingleChoice, "What is your cancellation policy?", &[
                "none", "flexible", "strict",
            ]),
            q(15, FreeText, "What slows your day-to-day operations down?", &[]),
            q(16, MultiChoice, "Which payment methods do you accept?", &[
                "cash", "card", "transfer", "bizum",
            ]),
            q(17, SingleChoice, "Do you ask for a deposit?", &["yes", "no", "depends"]),
            q(18, MultiChoice, "How should reminders be sent?", &[
                "sms", "whatsapp", "email", "none",
            ]),
            q(19, SingleChoice, "How do you invoice?", &["manual", "software", "accountant"]),
            q(20, SingleChoice, "When do you want to launch?", &[
                "asap",
                "1-3-months",
                "flexible",
            ]),
            q(21, SingleChoice, "What budget range fits you?", &[
                "basic",
                "standard",
                "premium",
                "undecided",
            ]),
            q(22, SingleChoice, "What matters most for the first release?", &[
                "speed",
                "features",
                "design",
                "scalability",
            ]),
            q(23, MultiChoice, "Which tools should it integrate with?", &[
                "google-calendar",
                "accounting",
                "crm",
                "none",
            ]),
            q(24, FreeText, "Final comments or questions?", &[]),
        ];

        let category = |name: &str, ids: std::ops::RangeInclusive<QuestionId>| Category {
            name: name.to_string(),
            questions: ids.collect(),
        };

        let categories = vec![
            category("Business & Clients", 1..=5),
            category("Services", 6..=10),
            category("Scheduling & Operations", 11..=15),
            category("Payments & Communication", 16..=19),
            category("Launch & Priorities", 20..=24),
        ];

        Self {
            categories,
            questions: questions.into_iter().map(|q| (q.id, q)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(id: QuestionId) -> Question {
        Question {
            id,
            kind: QuestionKind::SingleChoice,
            prompt: format!("question {id}"),
            options: vec!["a".into(), "b".into()],
        }
    }

    fn category(name: &str, ids: &[QuestionId]) -> Category {
        Category {
            name: name.into(),
            questions: ids.to_vec(),
        }
    }

    #[test]
    fn test_aro_catalog_shape() {
        let catalog = Catalog::aro_discovery();
        assert_eq!(catalog.len(), 24);
        let sizes: Vec<usize> = catalog
            .categories()
            .iter()
            .map(|c| c.questions.len())
            .collect();
        assert_eq!(sizes, vec![5, 5, 5, 4, 5]);

        let order: Vec<QuestionId> = catalog.questions().map(|q| q.id).collect();
        assert_eq!(order, (1..=24).collect::<Vec<_>>());
    }

    #[test]
    fn test_aro_catalog_passes_validation() {
        let catalog = Catalog::aro_discovery();
        let rebuilt = Catalog::new(
            catalog.categories().to_vec(),
            catalog.questions().cloned().collect(),
        )
        .unwrap();
        assert_eq!(rebuilt, catalog);
    }

    #[test]
    fn test_aro_key_questions_have_expected_options() {
        let catalog = Catalog::aro_discovery();
        assert!(catalog.question(1).unwrap().accepts("residential-heavy"));
        assert!(catalog.question(8).unwrap().accepts("recurring"));
        assert!(catalog.question(22).unwrap().accepts("scalability"));
        assert_eq!(catalog.question(24).unwrap().kind, QuestionKind::FreeText);
    }

    #[test]
    fn test_rejects_duplicate_question() {
        let err = Catalog::new(vec![category("a", &[1])], vec![choice(1), choice(1)]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateQuestion(1));
    }

    #[test]
    fn test_rejects_question_in_two_categories() {
        let err = Catalog::new(
            vec![category("a", &[1]), category("b", &[1])],
            vec![choice(1)],
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::Uncategorized(1));
    }

    #[test]
    fn test_rejects_uncategorized_question() {
        let err = Catalog::new(vec![category("a", &[1])], vec![choice(1), choice(2)]).unwrap_err();
        assert_eq!(err, CatalogError::Uncategorized(2));
    }

    #[test]
    fn test_rejects_unknown_id_in_category() {
        let err = Catalog::new(vec![category("a", &[1, 9])], vec![choice(1)]).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownInCategory { question: 9, .. }));
    }

    #[test]
    fn test_rejects_choice_without_options() {
        let mut q = choice(1);
        q.options.clear();
        let err = Catalog::new(vec![category("a", &[1])], vec![q]).unwrap_err();
        assert_eq!(err, CatalogError::NoOptions(1));
    }

    #[test]
    fn test_kind_serde_is_kebab_case() {
        let json = serde_json::to_string(&QuestionKind::MultiChoice).unwrap();
        assert_eq!(json, "\"multi-choice\"");
    }
}
