use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// A validated multiple-choice question. Field names on the wire follow the
/// schema embedded in the generation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub id: String,
    pub mcq: String,
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Difficulty")]
    pub difficulty: String,
    pub options: IndexMap<String, String>,
    #[serde(rename = "Answer")]
    pub answer: String,
    #[serde(rename = "Explanation")]
    pub explanation: String,
}

impl QuestionRecord {
    /// Text of the option named by `answer`, if the key is present.
    pub fn answer_text(&self) -> Option<&str> {
        self.options.get(&self.answer).map(String::as_str)
    }
}

/// Generated questions keyed by id, in the order the model produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuestionSet(IndexMap<String, QuestionRecord>);

impl QuestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts under `record.id`. An id already present keeps its first record.
    pub fn insert(&mut self, record: QuestionRecord) -> bool {
        if self.0.contains_key(&record.id) {
            return false;
        }
        self.0.insert(record.id.clone(), record);
        true
    }

    pub fn get(&self, id: &str) -> Option<&QuestionRecord> {
        self.0.get(id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QuestionRecord)> {
        self.0.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.0.values()
    }
}

impl FromIterator<QuestionRecord> for QuestionSet {
    fn from_iter<I: IntoIterator<Item = QuestionRecord>>(iter: I) -> Self {
        let mut set = QuestionSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

// Records sent back by the UI may omit `id`; the map key is authoritative.
impl<'de> Deserialize<'de> for QuestionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, QuestionRecord>::deserialize(deserializer)?;
        let map = raw
            .into_iter()
            .map(|(id, mut record)| {
                record.id = id.clone();
                (id, record)
            })
            .collect();
        Ok(QuestionSet(map))
    }
}
