//! Short text report of the key answers, and the WhatsApp deep link that
//! carries it.

use crate::answer::{AnswerValue, Snapshot};
use crate::catalog::QuestionId;

/// Label used when a stored option has no entry in its table.
pub const UNSPECIFIED: &str = "unspecified";

pub const MESSAGE_HEADER: &str = "*Discovery Completed - Aro Booking System*";
pub const MESSAGE_FOOTER: &str = "_See the full answers on the platform_";

/// A question whose answer is spelled out in the summary.
#[derive(Clone, Copy, Debug)]
pub struct KeyQuestion {
    pub id: QuestionId,
    pub title: &'static str,
    pub labels: &'static [(&'static str, &'static str)],
}

impl KeyQuestion {
    /// Label of the first checked option in table order, which follows the
    /// catalog's option order. Text answers and options missing from the
    /// table are unspecified.
    pub fn describe(&self, value: &AnswerValue) -> &'static str {
        let AnswerValue::Choices(checked) = value else {
            return UNSPECIFIED;
        };
        self.labels
            .iter()
            .find(|(option, _)| checked.contains(*option))
            .map(|(_, label)| *label)
            .unwrap_or(UNSPECIFIED)
    }
}

pub const ARO_KEY_QUESTIONS: &[KeyQuestion] = &[
    KeyQuestion {
        id: 1,
        title: "Client type",
        labels: &[
            ("residential-heavy", "Mostly residential clients"),
            ("balanced", "Balance of residential and business"),
            ("business-heavy", "Mostly business clients"),
            ("unknown", "Mixed clients"),
        ],
    },
    KeyQuestion {
        id: 8,
        title: "Model",
        labels: &[
            ("one-time", "One-off services only"),
            ("recurring", "Recurring services"),
            ("both", "One-off and recurring"),
        ],
    },
    KeyQuestion {
        id: 22,
        title: "Priority",
        labels: &[
            ("speed", "Launch speed"),
            ("features", "Complete feature set"),
            ("design", "Design and UX"),
            ("scalability", "Scalability"),
        ],
    },
];

#[derive(Clone, Debug)]
pub struct SummaryGenerator {
    key_questions: &'static [KeyQuestion],
}

impl Default for SummaryGenerator {
    fn default() -> Self {
        Self::new(ARO_KEY_QUESTIONS)
    }
}

impl SummaryGenerator {
    pub fn new(key_questions: &'static [KeyQuestion]) -> Self {
        Self { key_questions }
    }

    /// One bullet per answered key question, then the answered/total line.
    ///
    /// Only choice answers are labelled; a key question answered with text
    /// renders as unspecified.
    pub fn build(&self, snapshot: &Snapshot, total_questions: usize) -> String {
        let mut summary = String::new();

        for key in self.key_questions {
            let Some(value) = snapshot.get(key.id) else {
                continue;
            };
            let label = key.describe(value);
            summary.push_str(&format!("• {}: {label}\n", key.title));
        }

        summary.push_str(&format!(
            "\n📊 {}/{total_questions} questions answered",
            snapshot.len()
        ));
        summary
    }
}

/// Deep-link target for the outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundLink {
    pub domain: String,
    pub recipient: String,
}

impl Default for OutboundLink {
    fn default() -> Self {
        Self {
            domain: "wa.me".to_string(),
            recipient: "34614362100".to_string(),
        }
    }
}

impl OutboundLink {
    /// The full message: header, summary, footer.
    pub fn message(summary: &str) -> String {
        format!("{MESSAGE_HEADER}\n\n{summary}\n\n{MESSAGE_FOOTER}")
    }

    /// `https://<domain>/<recipient>?text=<percent-encoded message>`. Pure;
    /// opening the link is up to the caller.
    pub fn build(&self, summary: &str) -> String {
        let message = Self::message(summary);
        format!(
            "https://{}/{}?text={}",
            self.domain,
            self.recipient,
            urlencoding::encode(&message)
        )
    }
}
