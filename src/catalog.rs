use crate::allocator::{allocate, Allocation};
use crate::error::QuizError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicSpec {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub weight: f64,
    pub keywords: Vec<String>,
}

impl TopicSpec {
    pub fn new(id: &str, label: &str, weight: f64, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            weight,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Case-insensitive substring match against any keyword.
    pub fn matches(&self, lowered_text: &str) -> bool {
        self.keywords.iter().any(|k| lowered_text.contains(k.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCatalog {
    topics: Vec<TopicSpec>,
    priority: Vec<String>,
}

/// Ordered topic weights plus the explicit priority list used for remainders.
#[derive(Debug, Clone, Serialize)]
pub struct TopicCatalog {
    topics: Vec<TopicSpec>,
    priority: Vec<String>,
}

impl TopicCatalog {
    pub fn new(topics: Vec<TopicSpec>, priority: Vec<String>) -> Result<Self, QuizError> {
        if topics.is_empty() {
            return Err(QuizError::invalid("topic catalog must not be empty"));
        }

        let mut ids = HashSet::new();
        let mut normalized = Vec::with_capacity(topics.len());
        for mut topic in topics {
            topic.id = topic.id.trim().to_string();
            if topic.id.is_empty() {
                return Err(QuizError::invalid("topic id must not be empty"));
            }
            if !ids.insert(topic.id.clone()) {
                return Err(QuizError::invalid(format!("duplicate topic id `{}`", topic.id)));
            }
            if !(topic.weight > 0.0 && topic.weight <= 1.0) {
                return Err(QuizError::invalid(format!(
                    "topic `{}` weight must be in (0, 1], got {}",
                    topic.id, topic.weight
                )));
            }
            topic.keywords = topic
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if topic.keywords.is_empty() {
                return Err(QuizError::invalid(format!("topic `{}` has no keywords", topic.id)));
            }
            if topic.label.trim().is_empty() {
                topic.label = topic.id.clone();
            }
            normalized.push(topic);
        }

        let weight_sum: f64 = normalized.iter().map(|t| t.weight).sum();
        if weight_sum > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(QuizError::invalid(format!(
                "topic weights sum to {weight_sum}, must not exceed 1.0"
            )));
        }

        if priority.is_empty() {
            return Err(QuizError::invalid("priority list must not be empty"));
        }
        if let Some(unknown) = priority.iter().find(|p| !ids.contains(p.as_str())) {
            return Err(QuizError::invalid(format!("priority list names unknown topic `{unknown}`")));
        }

        Ok(Self { topics: normalized, priority })
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let parsed: RawCatalog = serde_json::from_str(raw)?;
        Ok(Self::new(parsed.topics, parsed.priority)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read topic catalog {}: {}", path.display(), e))?;
        Self::from_json_str(&raw)
    }

    pub fn topics(&self) -> &[TopicSpec] {
        &self.topics
    }

    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    pub fn get(&self, id: &str) -> Option<&TopicSpec> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn allocate(&self, total: i64) -> Result<Allocation, QuizError> {
        allocate(total, &self.topics, &self.priority)
    }

    /// Tax administration curriculum for the bundled DJP study material.
    pub fn tax_curriculum() -> Self {
        let topics = vec![
            TopicSpec::new(
                "kup",
                "Ketentuan Umum dan Tata Cara Perpajakan",
                0.25,
                &[
                    "ketentuan umum",
                    "tata cara perpajakan",
                    "npwp",
                    "surat pemberitahuan",
                    "spt",
                    "pemeriksaan",
                    "keberatan",
                    "banding",
                    "sanksi administrasi",
                ],
            ),
            TopicSpec::new(
                "pph",
                "Pajak Penghasilan",
                0.30,
                &[
                    "pajak penghasilan",
                    "pph",
                    "penghasilan kena pajak",
                    "ptkp",
                    "pemotongan",
                    "pemungutan",
                    "objek pajak",
                ],
            ),
            TopicSpec::new(
                "ppn",
                "Pajak Pertambahan Nilai",
                0.25,
                &[
                    "pajak pertambahan nilai",
                    "ppn",
                    "ppnbm",
                    "faktur pajak",
                    "pengusaha kena pajak",
                    "pajak masukan",
                    "pajak keluaran",
                ],
            ),
            TopicSpec::new(
                "pbb_bphtb",
                "PBB dan BPHTB",
                0.10,
                &["pajak bumi dan bangunan", "pbb", "bphtb", "njop"],
            ),
            TopicSpec::new("bea_meterai", "Bea Meterai", 0.05, &["bea meterai", "meterai"]),
            TopicSpec::new(
                "penagihan",
                "Penagihan Pajak",
                0.05,
                &["penagihan", "surat paksa", "juru sita", "penyitaan", "lelang"],
            ),
        ];
        let priority = vec!["pph".to_string(), "ppn".to_string(), "kup".to_string()];
        Self { topics, priority }
    }
}
