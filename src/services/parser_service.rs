use crate::error::{FailureKind, GenerationFailure};
use crate::models::question::{QuestionRecord, QuestionSet};
use crate::services::generation_service::{GenerationResult, GenerationStage};
use indexmap::IndexMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fmt;
use std::marker::PhantomData;

/// Minimum number of options a question needs to be kept.
pub const MIN_OPTIONS: usize = 2;

/// Why a single record was dropped from an otherwise decodable response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordRejection {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record could not be decoded: {0}")]
    Undecodable(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' is blank")]
    BlankField(&'static str),

    #[error("expected at least 2 options, found {0}")]
    TooFewOptions(usize),

    #[error("option key '{0}' is not a single letter")]
    InvalidOptionKey(String),

    #[error("duplicate option key '{0}'")]
    DuplicateOptionKey(String),

    #[error("option '{0}' has no text")]
    BlankOption(String),

    #[error("answer '{0}' does not name one of the options")]
    AnswerNotInOptions(String),

    #[error("duplicate question id '{0}'")]
    DuplicateId(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub id: String,
    pub reason: RecordRejection,
}

/// Outcome of decoding a completion: the records that passed and the ones that did not.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub questions: QuestionSet,
    pub rejected: Vec<RejectedRecord>,
}

impl ParseReport {
    pub fn total(&self) -> usize {
        self.questions.len() + self.rejected.len()
    }
}

/// JSON object read as an ordered list of entries; keeps duplicate keys and source order.
struct OrderedEntries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(alias = "question")]
    mcq: Option<String>,
    #[serde(rename = "Topic", alias = "topic")]
    topic: Option<String>,
    #[serde(rename = "Difficulty", alias = "difficulty")]
    difficulty: Option<String>,
    options: Option<OrderedEntries<String>>,
    #[serde(rename = "Answer", alias = "answer")]
    answer: Option<String>,
    #[serde(rename = "Explanation", alias = "explanation")]
    explanation: Option<String>,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Decodes `raw` and keeps every record that validates. Undecodable text
    /// is `MalformedResponse`; a decodable payload with no valid record is `EmptyResult`.
    pub fn parse(raw: &str) -> GenerationResult {
        let report = Self::parse_report(raw)?;

        for rejected in &report.rejected {
            tracing::warn!(
                id = %rejected.id,
                reason = %rejected.reason,
                "Dropping invalid question record"
            );
        }

        if report.questions.is_empty() {
            return Err(GenerationFailure::new(
                FailureKind::EmptyResult,
                GenerationStage::Parsing,
                format!(
                    "None of the {} records in the completion passed validation",
                    report.total()
                ),
            )
            .with_raw(raw));
        }

        tracing::info!(
            kept = report.questions.len(),
            dropped = report.rejected.len(),
            "Completion parsed"
        );
        Ok(report.questions)
    }

    pub fn parse_report(raw: &str) -> Result<ParseReport, GenerationFailure> {
        let malformed = |message: String| {
            GenerationFailure::new(
                FailureKind::MalformedResponse,
                GenerationStage::Parsing,
                message,
            )
            .with_raw(raw)
        };

        let text = raw.trim();
        let entries: Vec<(String, &RawValue)> = if text.starts_with('{') {
            serde_json::from_str::<OrderedEntries<&RawValue>>(text)
                .map_err(|e| malformed(format!("Completion is not valid JSON: {}", e)))?
                .0
        } else if text.starts_with('[') {
            serde_json::from_str::<Vec<&RawValue>>(text)
                .map_err(|e| malformed(format!("Completion is not valid JSON: {}", e)))?
                .into_iter()
                .enumerate()
                .map(|(idx, value)| ((idx + 1).to_string(), value))
                .collect()
        } else {
            return Err(malformed(
                "Completion is not a JSON object or array of questions".to_string(),
            ));
        };

        let mut report = ParseReport::default();
        for (id, value) in entries {
            let id = id.trim().to_string();
            let outcome = if id.is_empty() {
                Err(RecordRejection::BlankField("id"))
            } else if report.questions.contains_id(&id) {
                Err(RecordRejection::DuplicateId(id.clone()))
            } else {
                Self::validate_record(&id, value)
            };

            match outcome {
                Ok(record) => {
                    report.questions.insert(record);
                }
                Err(reason) => report.rejected.push(RejectedRecord { id, reason }),
            }
        }
        Ok(report)
    }

    fn validate_record(id: &str, value: &RawValue) -> Result<QuestionRecord, RecordRejection> {
        if !value.get().trim_start().starts_with('{') {
            return Err(RecordRejection::NotAnObject);
        }
        let raw: RawRecord = serde_json::from_str(value.get())
            .map_err(|e| RecordRejection::Undecodable(e.to_string()))?;

        let mcq = required(raw.mcq, "mcq")?;
        if mcq.trim().is_empty() {
            return Err(RecordRejection::BlankField("mcq"));
        }
        let topic = required(raw.topic, "Topic")?;
        let difficulty = required(raw.difficulty, "Difficulty")?;
        let explanation = required(raw.explanation, "Explanation")?;
        let options = validate_options(required(raw.options, "options")?)?;

        let answer = required(raw.answer, "Answer")?;
        let wanted = answer.trim();
        if wanted.is_empty() {
            return Err(RecordRejection::BlankField("Answer"));
        }
        let answer_key = options
            .keys()
            .find(|k| k.eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| RecordRejection::AnswerNotInOptions(wanted.to_string()))?;

        Ok(QuestionRecord {
            id: id.to_string(),
            mcq: mcq.trim().to_string(),
            topic: topic.trim().to_string(),
            difficulty: difficulty.trim().to_string(),
            options,
            answer: answer_key,
            explanation: explanation.trim().to_string(),
        })
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, RecordRejection> {
    value.ok_or(RecordRejection::MissingField(field))
}

fn validate_options(
    entries: OrderedEntries<String>,
) -> Result<IndexMap<String, String>, RecordRejection> {
    if entries.0.len() < MIN_OPTIONS {
        return Err(RecordRejection::TooFewOptions(entries.0.len()));
    }

    let mut options: IndexMap<String, String> = IndexMap::with_capacity(entries.0.len());
    for (key, text) in entries.0 {
        let key = key.trim().to_string();
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {}
            _ => return Err(RecordRejection::InvalidOptionKey(key)),
        }
        if options.keys().any(|k| k.eq_ignore_ascii_case(&key)) {
            return Err(RecordRejection::DuplicateOptionKey(key));
        }
        if text.trim().is_empty() {
            return Err(RecordRejection::BlankOption(key));
        }
        options.insert(key, text.trim().to_string());
    }
    Ok(options)
}
