use crate::ai_client::AiQuizClient;
use crate::assembler::QuizAssembler;
use crate::catalog::TopicCatalog;
use crate::config::AppConfig;
use crate::document::DocumentSource;
use crate::error::AssemblyError;
use crate::models::QuizItem;
use crate::selector::ContextSelector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<TopicCatalog>,
    pub document: Arc<dyn DocumentSource>,
    pub ai_client: Arc<dyn AiQuizClient>,
    pub quiz_schema: Arc<serde_json::Value>,
    request_counter: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        catalog: TopicCatalog,
        document: Arc<dyn DocumentSource>,
        ai_client: Arc<dyn AiQuizClient>,
        quiz_schema: serde_json::Value,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            document,
            ai_client,
            quiz_schema: Arc::new(quiz_schema),
            request_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Seeded per request when `QUIZ_RNG_SEED` is set, entropy otherwise.
    pub fn request_rng(&self) -> StdRng {
        match self.config.rng_seed {
            Some(seed) => {
                let n = self.request_counter.fetch_add(1, Ordering::SeqCst);
                StdRng::seed_from_u64(seed.wrapping_add(n))
            }
            None => StdRng::from_entropy(),
        }
    }

    pub fn assembler(&self) -> QuizAssembler<'_> {
        QuizAssembler {
            catalog: &self.catalog,
            document: self.document.as_ref(),
            ai_client: self.ai_client.as_ref(),
            schema: &self.quiz_schema,
            selector: ContextSelector::new(self.config.scan_cap),
            context_pages: self.config.context_pages,
            max_question_count: self.config.max_question_count,
        }
    }

    pub async fn generate_quiz(&self, total: i64) -> Result<Vec<QuizItem>, AssemblyError> {
        let mut rng = self.request_rng();
        self.assembler().assemble(total, &mut rng).await
    }
}
