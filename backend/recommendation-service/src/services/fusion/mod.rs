use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::config::RecallConfig;
use crate::models::{Candidate, Food, RecallSource, RecallStats, User};
use crate::services::recall::{RecallContext, RecallStrategy};

/// One fusion pass: the merged candidate list plus the per-source counts
/// that produced it.
#[derive(Debug, Clone)]
pub struct FusionOutcome {
    pub items: Vec<Candidate>,
    pub stats: RecallStats,
}

/// Merges the generator signals into a single deduplicated, capped list.
///
/// The vector generator runs first with a generous candidate pool and is the
/// only one subject to attribute filtering; the auxiliary strategies run
/// independently and concatenate in construction order, which encodes dedup
/// precedence (first occurrence wins).
pub struct FusionRanker {
    vector: Box<dyn RecallStrategy>,
    auxiliary: Vec<Box<dyn RecallStrategy>>,
    config: RecallConfig,
}

impl FusionRanker {
    pub fn new(
        vector: Box<dyn RecallStrategy>,
        auxiliary: Vec<Box<dyn RecallStrategy>>,
        config: RecallConfig,
    ) -> Self {
        Self {
            vector,
            auxiliary,
            config,
        }
    }

    pub fn default_k(&self) -> usize {
        self.config.default_k
    }

    /// `recommend` never fails: a failed generator degrades to an empty
    /// contribution and the worst case is an empty outcome.
    pub async fn recommend(
        &self,
        user: &User,
        query: &str,
        filters: &HashMap<String, String>,
        k: usize,
    ) -> FusionOutcome {
        let filters = Self::effective_filters(user, filters);
        let area = filters.get("popular_in").cloned();
        let ctx = RecallContext {
            user: user.clone(),
            query: query.to_string(),
            area,
        };

        let raw_vector = match self
            .vector
            .recall(&ctx, self.config.vector_candidate_limit)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    source = self.vector.source().as_str(),
                    error = %e,
                    "recall strategy failed"
                );
                Vec::new()
            }
        };

        let filtered: Vec<Candidate> = raw_vector
            .iter()
            .filter(|c| Self::passes_filters(&c.food, &filters))
            .cloned()
            .collect();

        let mut stats = RecallStats {
            vector_count: filtered.len(),
            ..RecallStats::default()
        };

        let aux_results = join_all(
            self.auxiliary
                .iter()
                .map(|s| s.recall(&ctx, self.limit_for(s.source()))),
        )
        .await;

        let mut combined = filtered;
        let mut trending_fallback: Vec<Candidate> = Vec::new();
        for (strategy, result) in self.auxiliary.iter().zip(aux_results) {
            let candidates = match result {
                Ok(c) => c,
                Err(e) => {
                    warn!(
                        source = strategy.source().as_str(),
                        error = %e,
                        "recall strategy failed"
                    );
                    Vec::new()
                }
            };
            match strategy.source() {
                RecallSource::Vector => stats.vector_count = candidates.len(),
                RecallSource::Collaborative => stats.collaborative_count = candidates.len(),
                RecallSource::Trending => {
                    stats.trending_count = candidates.len();
                    trending_fallback = candidates.clone();
                }
                RecallSource::Community => stats.community_count = candidates.len(),
                RecallSource::Liked => stats.liked_count = candidates.len(),
            }
            combined.extend(candidates);
        }
        stats.total_candidates = combined.len();

        let mut items = Self::dedupe_capped(combined, k);
        if items.is_empty() {
            items = Self::dedupe_capped(trending_fallback, k);
        }
        if items.is_empty() {
            items = Self::dedupe_capped(raw_vector, k);
        }
        stats.final_count = items.len();

        info!(
            user_id = %user.user_id,
            vector = stats.vector_count,
            collaborative = stats.collaborative_count,
            trending = stats.trending_count,
            community = stats.community_count,
            liked = stats.liked_count,
            total = stats.total_candidates,
            served = stats.final_count,
            "fusion completed"
        );

        FusionOutcome { items, stats }
    }

    fn limit_for(&self, source: RecallSource) -> usize {
        match source {
            RecallSource::Vector => self.config.vector_candidate_limit,
            RecallSource::Collaborative => self.config.collaborative_limit,
            RecallSource::Trending => self.config.trending_limit,
            RecallSource::Community => self.config.community_limit,
            RecallSource::Liked => self.config.liked_limit,
        }
    }

    /// Merge the caller's filter map with the user's standing preferences
    /// (preferences win on key collisions), dropping empty values and
    /// rewriting the `area` key to the food-side `popular_in` attribute.
    fn effective_filters(
        user: &User,
        filters: &HashMap<String, String>,
    ) -> HashMap<String, String> {
        let mut merged: HashMap<String, String> = HashMap::new();
        for (key, value) in filters.iter().chain(user.preferences.iter()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let key = if key == "area" { "popular_in" } else { key.as_str() };
            merged.insert(key.to_string(), value.to_string());
        }
        merged
    }

    /// Case-insensitive substring match per filter. A filter whose key the
    /// food does not carry a value for leaves the candidate in place; the
    /// permissiveness is deliberate to avoid zero-result filtering.
    fn passes_filters(food: &Food, filters: &HashMap<String, String>) -> bool {
        for (key, value) in filters {
            if let Some(attr) = food.attribute(key) {
                if !attr.to_lowercase().contains(&value.to_lowercase()) {
                    return false;
                }
            }
        }
        true
    }

    fn dedupe_capped(candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut unique: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            if unique.len() >= k {
                break;
            }
            if seen.insert(candidate.food.food_id.clone()) {
                unique.push(candidate);
            }
        }
        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    fn food(id: &str) -> Food {
        Food {
            food_id: id.to_string(),
            food_name: format!("food {}", id),
            restaurant_id: "r1".to_string(),
            description: None,
            category: None,
            spice_level: None,
            veg_nonveg: None,
            ingredients: None,
            dish_type: None,
            popular_in: None,
            price_level: None,
            food_rating: None,
        }
    }

    fn candidate(id: &str, source: RecallSource) -> Candidate {
        Candidate {
            food: food(id),
            source,
        }
    }

    fn test_config() -> RecallConfig {
        RecallConfig {
            vector_candidate_limit: 50,
            collaborative_limit: 8,
            trending_limit: 8,
            community_limit: 5,
            liked_limit: 8,
            similar_user_count: 4,
            default_k: 10,
            community_shuffle_seed: None,
        }
    }

    struct FixedStrategy {
        source: RecallSource,
        items: Vec<Candidate>,
    }

    #[async_trait]
    impl RecallStrategy for FixedStrategy {
        async fn recall(&self, _ctx: &RecallContext, _limit: usize) -> Result<Vec<Candidate>> {
            Ok(self.items.clone())
        }

        fn source(&self) -> RecallSource {
            self.source
        }
    }

    struct FailingStrategy {
        source: RecallSource,
    }

    #[async_trait]
    impl RecallStrategy for FailingStrategy {
        async fn recall(&self, _ctx: &RecallContext, _limit: usize) -> Result<Vec<Candidate>> {
            anyhow::bail!("backend unavailable")
        }

        fn source(&self) -> RecallSource {
            self.source
        }
    }

    fn fixed(source: RecallSource, ids: &[&str]) -> Box<dyn RecallStrategy> {
        Box::new(FixedStrategy {
            source,
            items: ids.iter().map(|id| candidate(id, source)).collect(),
        })
    }

    #[test]
    fn test_filter_substring_case_insensitive() {
        let mut thali = food("f1");
        thali.category = Some("South Indian Thali".to_string());
        let mut noodles = food("f2");
        noodles.category = Some("Chinese".to_string());

        let filters: HashMap<String, String> =
            [("cuisine".to_string(), "south indian".to_string())].into();

        assert!(FusionRanker::passes_filters(&thali, &filters));
        assert!(!FusionRanker::passes_filters(&noodles, &filters));
    }

    #[test]
    fn test_filter_ignores_missing_attribute() {
        let plain = food("f1");
        let filters: HashMap<String, String> =
            [("cuisine".to_string(), "chinese".to_string())].into();
        assert!(FusionRanker::passes_filters(&plain, &filters));
    }

    #[test]
    fn test_effective_filters_alias_and_preference_override() {
        let mut user = User::anonymous("u1");
        user.preferences
            .insert("veg_nonveg".to_string(), "veg".to_string());

        let provided: HashMap<String, String> = [
            ("area".to_string(), "Gandhipuram".to_string()),
            ("veg_nonveg".to_string(), "non-veg".to_string()),
            ("category".to_string(), "  ".to_string()),
        ]
        .into();

        let merged = FusionRanker::effective_filters(&user, &provided);
        assert_eq!(merged.get("popular_in").map(String::as_str), Some("Gandhipuram"));
        assert!(!merged.contains_key("area"));
        assert_eq!(merged.get("veg_nonveg").map(String::as_str), Some("veg"));
        assert!(!merged.contains_key("category"));
    }

    #[test]
    fn test_dedupe_preserves_first_occurrence_and_cap() {
        let candidates = vec![
            candidate("a", RecallSource::Vector),
            candidate("b", RecallSource::Vector),
            candidate("a", RecallSource::Trending),
            candidate("c", RecallSource::Community),
            candidate("d", RecallSource::Liked),
        ];
        let unique = FusionRanker::dedupe_capped(candidates, 3);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].food.food_id, "a");
        assert_eq!(unique[0].source, RecallSource::Vector);
        assert_eq!(unique[1].food.food_id, "b");
        assert_eq!(unique[2].food.food_id, "c");
    }

    #[tokio::test]
    async fn test_trending_fallback_when_all_else_empty() {
        let ranker = FusionRanker::new(
            fixed(RecallSource::Vector, &[]),
            vec![
                fixed(RecallSource::Collaborative, &[]),
                fixed(RecallSource::Trending, &["t1", "t2", "t3"]),
                fixed(RecallSource::Community, &[]),
                fixed(RecallSource::Liked, &[]),
            ],
            test_config(),
        );

        let outcome = ranker
            .recommend(&User::anonymous("u1"), "", &HashMap::new(), 10)
            .await;

        // trending feeds the primary merge here, not just the fallback;
        // either way the output is exactly the trending list in order
        assert_eq!(outcome.items.len(), 3);
        let ids: Vec<&str> = outcome.items.iter().map(|c| c.food.food_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn test_failed_generators_degrade_to_empty() {
        let ranker = FusionRanker::new(
            Box::new(FailingStrategy {
                source: RecallSource::Vector,
            }),
            vec![
                Box::new(FailingStrategy {
                    source: RecallSource::Collaborative,
                }),
                fixed(RecallSource::Trending, &["t1"]),
                Box::new(FailingStrategy {
                    source: RecallSource::Community,
                }),
                fixed(RecallSource::Liked, &["l1"]),
            ],
            test_config(),
        );

        let outcome = ranker
            .recommend(&User::anonymous("u1"), "noodles", &HashMap::new(), 5)
            .await;

        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.stats.collaborative_count, 0);
        assert_eq!(outcome.stats.trending_count, 1);
    }

    #[tokio::test]
    async fn test_output_never_exceeds_k_and_never_repeats() {
        let ranker = FusionRanker::new(
            fixed(RecallSource::Vector, &["a", "b", "c"]),
            vec![
                fixed(RecallSource::Collaborative, &["b", "d"]),
                fixed(RecallSource::Trending, &["a", "e", "f"]),
                fixed(RecallSource::Community, &["g"]),
                fixed(RecallSource::Liked, &["c", "h"]),
            ],
            test_config(),
        );

        let outcome = ranker
            .recommend(&User::anonymous("u1"), "anything", &HashMap::new(), 4)
            .await;

        assert_eq!(outcome.items.len(), 4);
        let mut ids: Vec<&str> = outcome.items.iter().map(|c| c.food.food_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[tokio::test]
    async fn test_all_empty_yields_empty() {
        let ranker = FusionRanker::new(
            fixed(RecallSource::Vector, &[]),
            vec![
                fixed(RecallSource::Collaborative, &[]),
                fixed(RecallSource::Trending, &[]),
                fixed(RecallSource::Community, &[]),
                fixed(RecallSource::Liked, &[]),
            ],
            test_config(),
        );

        let outcome = ranker
            .recommend(&User::anonymous("u1"), "", &HashMap::new(), 10)
            .await;
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.stats.final_count, 0);
    }
}
