use std::fmt;

use crate::catalog::Category;
use crate::form::FormState;

/// Answered/total counts for one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryProgress {
    pub name: String,
    pub answered: usize,
    pub total: usize,
}

impl CategoryProgress {
    pub fn is_complete(&self) -> bool {
        self.answered == self.total
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressResult {
    pub total_questions: usize,
    pub answered_count: usize,
    /// 0–100, rounded to the nearest integer.
    pub percentage: u8,
    /// In catalog order.
    pub per_category: Vec<CategoryProgress>,
}

impl ProgressResult {
    pub fn category(&self, name: &str) -> Option<&CategoryProgress> {
        self.per_category.iter().find(|c| c.name == name)
    }
}

/// Rounded share of `answered` in `total`, as a percentage.
pub fn percentage(answered: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (answered as f64 * 100.0 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Minimum share of questions that must be answered before submission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubmissionGate {
    min_ratio: f64,
}

impl SubmissionGate {
    pub const DEFAULT_RATIO: f64 = 0.5;

    /// Ratios outside `0.0..=1.0` are clamped.
    pub fn new(min_ratio: f64) -> Self {
        let min_ratio = if min_ratio.is_nan() {
            Self::DEFAULT_RATIO
        } else {
            min_ratio.clamp(0.0, 1.0)
        };
        Self { min_ratio }
    }

    pub fn min_ratio(&self) -> f64 {
        self.min_ratio
    }

    pub fn required(&self, total: usize) -> usize {
        (total as f64 * self.min_ratio).ceil() as usize
    }

    pub fn check(&self, progress: &ProgressResult) -> Result<(), GateRejection> {
        let required = self.required(progress.total_questions);
        if progress.answered_count < required {
            Err(GateRejection {
                answered: progress.answered_count,
                required,
            })
        } else {
            Ok(())
        }
    }
}

impl Default for SubmissionGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATIO)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateRejection {
    pub answered: usize,
    pub required: usize,
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Please answer at least {} questions before submitting",
            self.required
        )
    }
}

impl std::error::Error for GateRejection {}

/// Derives completion counts from the live form.
#[derive(Clone, Debug, Default)]
pub struct ProgressTracker {
    gate: SubmissionGate,
}

impl ProgressTracker {
    pub fn new(gate: SubmissionGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> SubmissionGate {
        self.gate
    }

    pub fn recompute(&self, form: &FormState) -> ProgressResult {
        let per_category: Vec<CategoryProgress> = form
            .catalog()
            .categories()
            .iter()
            .map(|c| category_progress(c, form))
            .collect();

        let total_questions = form.len();
        let answered_count = per_category.iter().map(|c| c.answered).sum();

        ProgressResult {
            total_questions,
            answered_count,
            percentage: percentage(answered_count, total_questions),
            per_category,
        }
    }

    /// Recompute and run the submission gate in one go.
    pub fn check_submission(&self, form: &FormState) -> Result<ProgressResult, GateRejection> {
        let progress = self.recompute(form);
        self.gate.check(&progress)?;
        Ok(progress)
    }
}

fn category_progress(category: &Category, form: &FormState) -> CategoryProgress {
    CategoryProgress {
        name: category.name.clone(),
        answered: category
            .questions
            .iter()
            .filter(|id| form.is_answered(**id))
            .count(),
        total: category.questions.len(),
    }
}
