use crate::ai_client::{AiQuizClient, GenerationRequest};
use crate::catalog::TopicCatalog;
use crate::document::DocumentSource;
use crate::error::{AssemblyError, ErrorDetail, QuizError};
use crate::models::{parse_quiz_items, QuizItem};
use crate::selector::ContextSelector;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

const GENERATION_ATTEMPTS: usize = 2;

/// Why one topic produced nothing, kept for the error envelope.
#[derive(Debug)]
struct TopicFailure {
    message: String,
    details: Vec<ErrorDetail>,
}

impl TopicFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }
}

/// Everything one quiz request reads. All of it is shared and read-only.
pub struct QuizAssembler<'a> {
    pub catalog: &'a TopicCatalog,
    pub document: &'a dyn DocumentSource,
    pub ai_client: &'a dyn AiQuizClient,
    pub schema: &'a serde_json::Value,
    pub selector: ContextSelector,
    pub context_pages: usize,
    pub max_question_count: i64,
}

impl QuizAssembler<'_> {
    pub async fn assemble(&self, total: i64, rng: &mut StdRng) -> Result<Vec<QuizItem>, AssemblyError> {
        if total > self.max_question_count {
            return Err(QuizError::invalid(format!(
                "question count must not exceed {}, got {}",
                self.max_question_count, total
            ))
            .into());
        }
        let allocation = self.catalog.allocate(total)?;
        if allocation.total() == 0 {
            return Ok(Vec::new());
        }

        let mut requests = Vec::new();
        for entry in allocation.non_zero() {
            let mut topic_rng = StdRng::seed_from_u64(rng.gen());
            let selected =
                self.selector
                    .select_context(self.document, self.catalog, &entry.topic, self.context_pages, &mut topic_rng)?;
            let label = self
                .catalog
                .get(&entry.topic)
                .map(|t| t.label.clone())
                .unwrap_or_else(|| entry.topic.clone());
            info!(
                topic = %entry.topic,
                questions = entry.count,
                pages = ?selected.pages,
                fallback = selected.fallback,
                "context selected"
            );
            requests.push(GenerationRequest {
                topic_id: entry.topic.clone(),
                topic_label: label,
                question_count: entry.count,
                context: selected.text,
            });
        }

        let outcomes = join_all(requests.iter().map(|request| self.generate_topic(request))).await;

        let mut items = Vec::new();
        let mut last_failure = TopicFailure::new("");
        for (request, outcome) in requests.iter().zip(outcomes) {
            match outcome {
                Ok(mut generated) => items.append(&mut generated),
                Err(failure) => {
                    warn!(topic = %request.topic_id, "topic generation failed: {}", failure.message);
                    last_failure = failure;
                }
            }
        }
        if items.is_empty() {
            return Err(AssemblyError::NoQuestions {
                message: last_failure.message,
                details: last_failure.details,
            });
        }

        items.shuffle(rng);
        items.truncate(total as usize);
        Ok(items)
    }

    async fn generate_topic(&self, request: &GenerationRequest) -> Result<Vec<QuizItem>, TopicFailure> {
        let mut last_failure = TopicFailure::new("model output is not usable");
        for attempt in 0..GENERATION_ATTEMPTS {
            let raw = self
                .ai_client
                .generate_quiz_json(request)
                .await
                .map_err(|e| TopicFailure::new(format!("model request failed: {e:#}")))?;
            match parse_quiz_items(&raw, self.schema) {
                Ok(items) if !items.is_empty() => return Ok(items),
                Ok(_) => last_failure = TopicFailure::new("model returned an empty list"),
                Err(err) => {
                    warn!(topic = %request.topic_id, attempt, details = ?err.details(), "{}", err);
                    last_failure = TopicFailure {
                        message: err.to_string(),
                        details: err.details().to_vec(),
                    };
                }
            }
        }
        Err(last_failure)
    }
}
