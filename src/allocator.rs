use crate::catalog::TopicSpec;
use crate::error::QuizError;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

/// Per-topic question counts, in catalog order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Allocation {
    pub counts: Vec<TopicCount>,
}

impl Allocation {
    pub fn get(&self, topic: &str) -> Option<usize> {
        self.counts.iter().find(|c| c.topic == topic).map(|c| c.count)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }

    pub fn non_zero(&self) -> impl Iterator<Item = &TopicCount> {
        self.counts.iter().filter(|c| c.count > 0)
    }

    fn bump(&mut self, topic: &str, by: usize) {
        if let Some(entry) = self.counts.iter_mut().find(|c| c.topic == topic) {
            entry.count += by;
        }
    }
}

/// Splits `total` across `topics` by weight.
///
/// Every topic first gets `floor(total * weight)`. Whatever is left goes
/// round-robin to `priority`, wrapping around as often as needed, so the
/// counts always sum to `total`.
pub fn allocate(total: i64, topics: &[TopicSpec], priority: &[String]) -> Result<Allocation, QuizError> {
    if total < 0 {
        return Err(QuizError::invalid(format!("question count must not be negative, got {total}")));
    }
    if topics.is_empty() {
        return Err(QuizError::invalid("topic catalog must not be empty"));
    }
    let known: Vec<&String> = priority
        .iter()
        .filter(|p| topics.iter().any(|t| &t.id == *p))
        .collect();
    if known.is_empty() {
        return Err(QuizError::invalid("priority list names no catalog topic"));
    }

    let total = total as usize;
    let mut allocation = Allocation {
        counts: topics
            .iter()
            .map(|t| TopicCount {
                topic: t.id.clone(),
                count: (total as f64 * t.weight).floor() as usize,
            })
            .collect(),
    };

    let mut provisional = allocation.total();
    // Weights that sum slightly above 1.0 can overshoot; give the excess back.
    while provisional > total {
        match allocation.counts.iter_mut().rev().find(|c| c.count > 0) {
            Some(entry) => {
                entry.count -= 1;
                provisional -= 1;
            }
            None => break,
        }
    }

    // Full passes over the priority list, then one more unit for the head.
    let remainder = total - provisional;
    let (passes, extra) = (remainder / known.len(), remainder % known.len());
    for (i, topic) in known.iter().enumerate() {
        allocation.bump(topic, passes + usize::from(i < extra));
    }

    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TopicCatalog;

    fn two_topics() -> TopicCatalog {
        TopicCatalog::new(
            vec![
                TopicSpec::new("A", "A", 0.6, &["alpha"]),
                TopicSpec::new("B", "B", 0.4, &["beta"]),
            ],
            vec!["A".into(), "B".into()],
        )
        .unwrap()
    }

    #[test]
    fn remainder_goes_to_priority_topics() {
        let allocation = two_topics().allocate(3).unwrap();
        assert_eq!(allocation.get("A"), Some(2));
        assert_eq!(allocation.get("B"), Some(1));
        assert_eq!(allocation.total(), 3);
    }

    #[test]
    fn zero_total_maps_every_topic_to_zero() {
        let allocation = two_topics().allocate(0).unwrap();
        assert!(allocation.counts.iter().all(|c| c.count == 0));
        assert_eq!(allocation.non_zero().count(), 0);
    }

    #[test]
    fn negative_total_is_rejected() {
        let err = two_topics().allocate(-1).unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));
    }

    #[test]
    fn sum_always_matches_total() {
        let catalogs = [two_topics(), TopicCatalog::tax_curriculum()];
        for catalog in &catalogs {
            for total in 0..=1000 {
                let allocation = catalog.allocate(total).unwrap();
                assert_eq!(allocation.total() as i64, total, "total {total}");
            }
        }
    }

    #[test]
    fn allocation_is_stable() {
        let catalog = TopicCatalog::tax_curriculum();
        assert_eq!(catalog.allocate(37).unwrap(), catalog.allocate(37).unwrap());
    }

    #[test]
    fn default_curriculum_split() {
        let allocation = TopicCatalog::tax_curriculum().allocate(20).unwrap();
        assert_eq!(allocation.get("kup"), Some(5));
        assert_eq!(allocation.get("pph"), Some(6));
        assert_eq!(allocation.get("ppn"), Some(5));
        assert_eq!(allocation.get("pbb_bphtb"), Some(2));
        assert_eq!(allocation.get("bea_meterai"), Some(1));
        assert_eq!(allocation.get("penagihan"), Some(1));
    }

    #[test]
    fn small_totals_add_at_most_ceil_share_of_remainder() {
        let catalog = TopicCatalog::tax_curriculum();
        let priority_len = catalog.priority().len();
        for total in 0..catalog.topics().len() as i64 {
            let allocation = catalog.allocate(total).unwrap();
            let max_extra = (total as usize).div_ceil(priority_len);
            for (topic, count) in catalog.topics().iter().zip(&allocation.counts) {
                let floor = (total as f64 * topic.weight).floor() as usize;
                assert!(count.count >= floor);
                assert!(count.count - floor <= max_extra);
            }
        }
    }

    #[test]
    fn remainder_wraps_around_priority_list() {
        let topics = vec![
            TopicSpec::new("A", "A", 0.1, &["a"]),
            TopicSpec::new("B", "B", 0.1, &["b"]),
            TopicSpec::new("C", "C", 0.1, &["c"]),
        ];
        let priority = vec!["B".to_string(), "C".to_string()];
        // floor(10 * 0.1) = 1 each, remainder 7 over [B, C] => B +4, C +3.
        let allocation = allocate(10, &topics, &priority).unwrap();
        assert_eq!(allocation.get("A"), Some(1));
        assert_eq!(allocation.get("B"), Some(5));
        assert_eq!(allocation.get("C"), Some(4));
    }

    #[test]
    fn overshooting_weights_are_trimmed() {
        let topics = vec![
            TopicSpec::new("A", "A", 0.75, &["a"]),
            TopicSpec::new("B", "B", 0.75, &["b"]),
        ];
        let priority = vec!["A".to_string()];
        let allocation = allocate(10, &topics, &priority).unwrap();
        assert_eq!(allocation.total(), 10);
        assert_eq!(allocation.get("A"), Some(7));
        assert_eq!(allocation.get("B"), Some(3));
    }

    #[test]
    fn sparse_weights_with_huge_total_finish_immediately() {
        let topics = vec![TopicSpec::new("a", "a", 0.5, &["a"])];
        let priority = vec!["a".to_string()];
        let total: i64 = 1 << 40;
        let allocation = allocate(total, &topics, &priority).unwrap();
        assert_eq!(allocation.get("a"), Some(1usize << 40));

        let topics = vec![
            TopicSpec::new("A", "A", 0.01, &["a"]),
            TopicSpec::new("B", "B", 0.01, &["b"]),
            TopicSpec::new("C", "C", 0.01, &["c"]),
        ];
        let priority = vec!["C".to_string(), "A".to_string()];
        // floor = 10_000_000 each, remainder 970_000_001 over [C, A].
        let allocation = allocate(1_000_000_001, &topics, &priority).unwrap();
        assert_eq!(allocation.total(), 1_000_000_001);
        assert_eq!(allocation.get("B"), Some(10_000_000));
        assert_eq!(allocation.get("C"), Some(10_000_000 + 485_000_001));
        assert_eq!(allocation.get("A"), Some(10_000_000 + 485_000_000));
    }

    #[test]
    fn priority_without_known_topics_is_rejected() {
        let topics = vec![TopicSpec::new("A", "A", 1.0, &["a"])];
        assert!(allocate(3, &topics, &["Z".to_string()]).is_err());
        assert!(allocate(3, &[], &["A".to_string()]).is_err());
    }
}
