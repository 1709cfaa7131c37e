use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

// The form sends lowercase pills ("easy"), stored results use labels ("Easy").
impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Accepts `["easy", "Medium"]` as well as the form's joined label `"Easy, Medium"`.
fn deserialize_difficulties<'de, D>(deserializer: D) -> Result<BTreeSet<Difficulty>, D::Error>
where
    D: Deserializer<'de>,
{
    struct DifficultiesVisitor;

    impl<'de> Visitor<'de> for DifficultiesVisitor {
        type Value = BTreeSet<Difficulty>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of difficulties or a comma-separated difficulty label")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| part.parse::<Difficulty>().map_err(E::custom))
                .collect()
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut set = BTreeSet::new();
            while let Some(level) = seq.next_element::<Difficulty>()? {
                set.insert(level);
            }
            Ok(set)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(BTreeSet::new())
        }
    }

    deserializer.deserialize_any(DifficultiesVisitor)
}

/// One row of the generation form: what to ask about, how hard, how many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TopicSpec {
    #[validate(length(min = 1, message = "Topic must not be empty"))]
    pub topic: String,
    #[serde(default, deserialize_with = "deserialize_difficulties")]
    pub difficulty: BTreeSet<Difficulty>,
    #[validate(range(min = 1, message = "Count must be at least 1"))]
    pub count: u32,
    #[serde(default)]
    pub recent: bool,
}

impl TopicSpec {
    pub fn new(
        topic: impl Into<String>,
        difficulty: impl IntoIterator<Item = Difficulty>,
        count: u32,
        recent: bool,
    ) -> Self {
        Self {
            topic: topic.into(),
            difficulty: difficulty.into_iter().collect(),
            count,
            recent,
        }
    }

    /// Comma-joined labels in Easy, Medium, Hard order. Empty when none selected.
    pub fn difficulty_label(&self) -> String {
        self.difficulty
            .iter()
            .map(Difficulty::label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Checks the row against the derive rules plus the per-topic question cap.
    pub fn check(&self, max_count: u32) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        if self.topic.trim().is_empty() {
            return Err("Topic must not be blank".to_string());
        }
        if self.count > max_count {
            return Err(format!(
                "Count {} for topic '{}' exceeds the maximum of {}",
                self.count,
                self.topic.trim(),
                max_count
            ));
        }
        Ok(())
    }
}
