use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{QuestionId, QuestionKind};

/// The value of one non-empty answer.
///
/// Choice questions hold the set of checked option values; free-text
/// questions hold the trimmed text. Empty values are never constructed:
/// use [`AnswerValue::choices`] / [`AnswerValue::text`], which return `None`
/// for empty input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerValue {
    Choices(BTreeSet<String>),
    Text(String),
}

impl AnswerValue {
    pub fn choices<I, S>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|v| !v.is_empty())
            .collect();
        (!set.is_empty()).then_some(AnswerValue::Choices(set))
    }

    pub fn text(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| AnswerValue::Text(trimmed.to_string()))
    }
}

/// One answered question as seen by the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    pub question_id: QuestionId,
    pub kind: QuestionKind,
    pub value: AnswerValue,
}

/// All non-empty answers at one point in time.
///
/// Absent keys and empty values are the same thing: inserting `None` removes
/// the entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    answers: BTreeMap<QuestionId, AnswerValue>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, question: QuestionId, value: Option<AnswerValue>) {
        match value {
            Some(value) => {
                self.answers.insert(question, value);
            }
            None => {
                self.answers.remove(&question);
            }
        }
    }

    pub fn get(&self, question: QuestionId) -> Option<&AnswerValue> {
        self.answers.get(&question)
    }

    pub fn contains(&self, question: QuestionId) -> bool {
        self.answers.contains_key(&question)
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &AnswerValue)> {
        self.answers.iter().map(|(id, v)| (*id, v))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<(QuestionId, AnswerValue)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (QuestionId, AnswerValue)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}
