use crate::selector::{DEFAULT_CONTEXT_PAGES, DEFAULT_SCAN_CAP};

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub document_path: String,
    pub topic_catalog_path: Option<String>,
    pub context_pages: usize,
    pub scan_cap: usize,
    pub max_context_chars: usize,
    pub max_question_count: i64,
    pub rng_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            document_path: format!("{}/materi.txt", env!("CARGO_MANIFEST_DIR")),
            topic_catalog_path: None,
            context_pages: DEFAULT_CONTEXT_PAGES,
            scan_cap: DEFAULT_SCAN_CAP,
            max_context_chars: 8000,
            max_question_count: 100,
            rng_seed: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    non_empty_var(key).and_then(|v| v.trim().parse::<T>().ok())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: non_empty_var("BACKEND_HOST").unwrap_or(defaults.host),
            port: parsed_var("BACKEND_PORT").unwrap_or(defaults.port),
            document_path: non_empty_var("DOCUMENT_PATH").unwrap_or(defaults.document_path),
            topic_catalog_path: non_empty_var("TOPIC_CATALOG_PATH"),
            context_pages: parsed_var::<usize>("CONTEXT_PAGES")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.context_pages),
            scan_cap: parsed_var::<usize>("SCAN_CAP")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.scan_cap),
            max_context_chars: parsed_var("MAX_CONTEXT_CHARS").unwrap_or(defaults.max_context_chars),
            max_question_count: parsed_var::<i64>("MAX_QUESTION_COUNT")
                .filter(|v| *v >= 0)
                .unwrap_or(defaults.max_question_count),
            rng_seed: parsed_var("QUIZ_RNG_SEED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl ChatClientConfig {
    /// `None` when no API key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_var("GROQ_API_KEY")?;
        Some(Self {
            api_key,
            base_url: non_empty_var("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            model: non_empty_var("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            temperature: parsed_var("GROQ_TEMPERATURE").unwrap_or(0.5),
            timeout_secs: parsed_var("GROQ_TIMEOUT_SECS").unwrap_or(60),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentSource;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.context_pages, 2);
        assert_eq!(config.scan_cap, 50);
        assert_eq!(config.max_context_chars, 8000);
        assert!(config.document_path.ends_with("materi.txt"));
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn bundled_document_covers_the_default_curriculum() {
        let document = crate::document::load_document(&AppConfig::default().document_path).unwrap();
        assert_eq!(document.page_count(), 9);
        let pages: Vec<String> = (0..document.page_count())
            .map(|i| document.page_text(i).unwrap().to_lowercase())
            .collect();
        for topic in crate::catalog::TopicCatalog::tax_curriculum().topics() {
            assert!(pages.iter().any(|p| topic.matches(p)), "no page for {}", topic.id);
        }
    }
}
