use crate::catalog::{TopicCatalog, TopicSpec};
use crate::document::DocumentSource;
use crate::error::QuizError;
use rand::seq::index;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_SCAN_CAP: usize = 50;
pub const DEFAULT_CONTEXT_PAGES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedContext {
    pub text: String,
    pub pages: Vec<usize>,
    pub fallback: bool,
}

/// Picks a few topic-relevant pages out of a bounded random sample.
#[derive(Debug, Clone, Copy)]
pub struct ContextSelector {
    pub scan_cap: usize,
}

impl Default for ContextSelector {
    fn default() -> Self {
        Self { scan_cap: DEFAULT_SCAN_CAP }
    }
}

impl ContextSelector {
    pub fn new(scan_cap: usize) -> Self {
        Self { scan_cap: scan_cap.max(1) }
    }

    pub fn select_context<R: Rng + ?Sized>(
        &self,
        doc: &dyn DocumentSource,
        catalog: &TopicCatalog,
        topic_id: &str,
        k: usize,
        rng: &mut R,
    ) -> Result<SelectedContext, QuizError> {
        let topic = catalog
            .get(topic_id)
            .ok_or_else(|| QuizError::invalid(format!("unknown topic `{topic_id}`")))?;
        self.select_for_topic(doc, topic, k, rng)
    }

    pub fn select_for_topic<R: Rng + ?Sized>(
        &self,
        doc: &dyn DocumentSource,
        topic: &TopicSpec,
        k: usize,
        rng: &mut R,
    ) -> Result<SelectedContext, QuizError> {
        if k == 0 {
            return Err(QuizError::invalid("context page count must be positive"));
        }
        let total_pages = doc.page_count();
        if total_pages == 0 {
            return Err(QuizError::EmptyDocument);
        }

        let scan = self.scan_cap.min(total_pages);
        let mut matches: Vec<(usize, String)> = Vec::new();
        for page in index::sample(rng, total_pages, scan).iter() {
            match doc.page_text(page) {
                Ok(text) if topic.matches(&text.to_lowercase()) => matches.push((page, text)),
                Ok(_) => {}
                Err(err) => debug!(topic = %topic.id, "skipping page: {}", err),
            }
        }

        if !matches.is_empty() {
            let take = k.min(matches.len());
            let chosen: Vec<&(usize, String)> = index::sample(rng, matches.len(), take)
                .iter()
                .map(|i| &matches[i])
                .collect();
            debug!(
                topic = %topic.id,
                scanned = scan,
                matched = matches.len(),
                selected = take,
                "keyword context selected"
            );
            return Ok(SelectedContext {
                text: join_pages(chosen.iter().map(|(_, text)| text.as_str())),
                pages: chosen.iter().map(|(page, _)| *page).collect(),
                fallback: false,
            });
        }

        // Nothing matched in the sample: take readable pages from the whole document.
        let wanted = k.min(total_pages);
        let mut pages = Vec::with_capacity(wanted);
        let mut texts = Vec::with_capacity(wanted);
        for page in index::sample(rng, total_pages, total_pages).iter() {
            if let Ok(text) = doc.page_text(page) {
                pages.push(page);
                texts.push(text);
                if pages.len() == wanted {
                    break;
                }
            }
        }
        if pages.is_empty() {
            return Err(QuizError::EmptyDocument);
        }
        debug!(topic = %topic.id, scanned = scan, selected = pages.len(), "no keyword match, using random pages");
        Ok(SelectedContext {
            text: join_pages(texts.iter().map(String::as_str)),
            pages,
            fallback: true,
        })
    }
}

fn join_pages<'a>(pages: impl Iterator<Item = &'a str>) -> String {
    pages.collect::<Vec<_>>().join(" ")
}
