//! Live form state: what the user currently has checked and typed.
//!
//! The form is the source of truth for progress. Persistence only ever sees
//! it through [`FormState::snapshot`], and a stored snapshot only flows back
//! in through [`FormState::rehydrate`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::answer::{Answer, AnswerValue, Snapshot};
use crate::catalog::{Catalog, QuestionId, QuestionKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    UnknownQuestion(QuestionId),
    UnknownOption { question: QuestionId, option: String },
    KindMismatch { question: QuestionId, kind: QuestionKind },
    TooManyChoices { question: QuestionId, given: usize },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::UnknownQuestion(id) => write!(f, "unknown question {id}"),
            FormError::UnknownOption { question, option } => {
                write!(f, "question {question} has no option '{option}'")
            }
            FormError::KindMismatch { question, kind } => {
                write!(f, "question {question} is {kind}")
            }
            FormError::TooManyChoices { question, given } => {
                write!(f, "question {question} takes a single choice, got {given}")
            }
        }
    }
}

impl std::error::Error for FormError {}

/// A single user change to the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    /// Replace the checked options of a choice question.
    Select {
        question: QuestionId,
        values: Vec<String>,
    },
    /// Replace the text of a free-text question.
    Text { question: QuestionId, text: String },
    Clear { question: QuestionId },
}

impl Edit {
    pub fn question(&self) -> QuestionId {
        match self {
            Edit::Select { question, .. } | Edit::Text { question, .. } | Edit::Clear { question } => {
                *question
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Field {
    checked: BTreeSet<String>,
    text: String,
}

impl Field {
    fn is_answered(&self) -> bool {
        !self.checked.is_empty() || !self.text.trim().is_empty()
    }

    fn clear(&mut self) {
        self.checked.clear();
        self.text.clear();
    }
}

#[derive(Clone, Debug)]
pub struct FormState {
    catalog: Arc<Catalog>,
    fields: BTreeMap<QuestionId, Field>,
}

impl FormState {
    /// A blank form with one empty field per catalog question.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let fields = catalog
            .questions()
            .map(|q| (q.id, Field::default()))
            .collect();
        Self { catalog, fields }
    }

    /// Build a form from a stored snapshot.
    ///
    /// Entries the catalog no longer knows (question ids, option values, or
    /// a value of the wrong kind) are skipped.
    pub fn rehydrate(catalog: Arc<Catalog>, snapshot: &Snapshot) -> Self {
        let mut form = Self::new(catalog);

        for (id, value) in snapshot.iter() {
            let Some(question) = form.catalog.question(id) else {
                tracing::debug!("skipping stored answer for unknown question {id}");
                continue;
            };
            let kind = question.kind;

            let checked: BTreeSet<String> = match value {
                AnswerValue::Choices(values) if kind.is_choice() => {
                    let mut accepted = values
                        .iter()
                        .filter(|v| {
                            let ok = question.accepts(v);
                            if !ok {
                                tracing::debug!("skipping unknown option '{v}' for question {id}");
                            }
                            ok
                        })
                        .cloned()
                        .collect::<Vec<_>>();
                    if kind == QuestionKind::SingleChoice {
                        accepted.truncate(1);
                    }
                    accepted.into_iter().collect()
                }
                AnswerValue::Text(text) if !kind.is_choice() => {
                    if let Some(field) = form.fields.get_mut(&id) {
                        field.text = text.clone();
                    }
                    continue;
                }
                _ => {
                    tracing::debug!("skipping stored answer of wrong kind for question {id}");
                    continue;
                }
            };

            if let Some(field) = form.fields.get_mut(&id) {
                field.checked = checked;
            }
        }

        form
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn apply(&mut self, edit: Edit) -> Result<(), FormError> {
        match edit {
            Edit::Select { question, values } => self.select(question, values),
            Edit::Text { question, text } => self.set_text(question, &text),
            Edit::Clear { question } => self.clear(question),
        }
    }

    /// Replace the checked options of a choice question. An empty list
    /// clears it.
    pub fn select(&mut self, question: QuestionId, values: Vec<String>) -> Result<(), FormError> {
        let q = self
            .catalog
            .question(question)
            .ok_or(FormError::UnknownQuestion(question))?;
        if !q.kind.is_choice() {
            return Err(FormError::KindMismatch {
                question,
                kind: q.kind,
            });
        }

        let checked: BTreeSet<String> = values.into_iter().collect();
        if q.kind == QuestionKind::SingleChoice && checked.len() > 1 {
            return Err(FormError::TooManyChoices {
                question,
                given: checked.len(),
            });
        }
        if let Some(bad) = checked.iter().find(|v| !q.accepts(v)) {
            return Err(FormError::UnknownOption {
                question,
                option: bad.clone(),
            });
        }

        self.field_mut(question)?.checked = checked;
        Ok(())
    }

    /// Click an option: radios switch to it, checkboxes flip.
    pub fn toggle(&mut self, question: QuestionId, option: &str) -> Result<(), FormError> {
        let q = self
            .catalog
            .question(question)
            .ok_or(FormError::UnknownQuestion(question))?;
        if !q.accepts(option) {
            return Err(FormError::UnknownOption {
                question,
                option: option.to_string(),
            });
        }
        let kind = q.kind;

        let field = self.field_mut(question)?;
        match kind {
            QuestionKind::SingleChoice => {
                field.checked.clear();
                field.checked.insert(option.to_string());
            }
            QuestionKind::MultiChoice => {
                if !field.checked.remove(option) {
                    field.checked.insert(option.to_string());
                }
            }
            QuestionKind::FreeText => {
                return Err(FormError::KindMismatch { question, kind });
            }
        }
        Ok(())
    }

    pub fn set_text(&mut self, question: QuestionId, text: &str) -> Result<(), FormError> {
        let q = self
            .catalog
            .question(question)
            .ok_or(FormError::UnknownQuestion(question))?;
        if q.kind.is_choice() {
            return Err(FormError::KindMismatch {
                question,
                kind: q.kind,
            });
        }
        self.field_mut(question)?.text = text.to_string();
        Ok(())
    }

    pub fn clear(&mut self, question: QuestionId) -> Result<(), FormError> {
        self.field_mut(question)?.clear();
        Ok(())
    }

    /// At least one checked option or non-blank text.
    pub fn is_answered(&self, question: QuestionId) -> bool {
        self.fields
            .get(&question)
            .is_some_and(Field::is_answered)
    }

    pub fn checked(&self, question: QuestionId) -> Option<&BTreeSet<String>> {
        self.fields.get(&question).map(|f| &f.checked)
    }

    pub fn text(&self, question: QuestionId) -> Option<&str> {
        self.fields.get(&question).map(|f| f.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Non-empty answers in catalog order.
    pub fn answers(&self) -> Vec<Answer> {
        self.catalog
            .questions()
            .filter_map(|q| {
                let value = self.value_of(q.id, q.kind)?;
                Some(Answer {
                    question_id: q.id,
                    kind: q.kind,
                    value,
                })
            })
            .collect()
    }

    /// Every non-empty answer, texts trimmed.
    pub fn snapshot(&self) -> Snapshot {
        self.answers()
            .into_iter()
            .map(|a| (a.question_id, a.value))
            .collect()
    }

    fn value_of(&self, question: QuestionId, kind: QuestionKind) -> Option<AnswerValue> {
        let field = self.fields.get(&question)?;
        if kind.is_choice() {
            AnswerValue::choices(field.checked.iter().cloned())
        } else {
            AnswerValue::text(&field.text)
        }
    }

    fn field_mut(&mut self, question: QuestionId) -> Result<&mut Field, FormError> {
        self.fields
            .get_mut(&question)
            .ok_or(FormError::UnknownQuestion(question))
    }
}
