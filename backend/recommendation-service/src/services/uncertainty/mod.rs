use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::db::{FoodStore, UserStore};
use crate::models::Food;

/// Scores how little is known about each tracked preference attribute for a
/// user, from the value distribution across their liked foods.
///
/// Score = Shannon entropy of the observed distribution in bits, normalized
/// by the maximum possible entropy for the observed distinct-value count,
/// clamped to [0, 1]. No observations at all means maximal uncertainty.
pub struct UncertaintyEstimator {
    users: Arc<dyn UserStore>,
    foods: Arc<dyn FoodStore>,
    attributes: Vec<String>,
}

impl UncertaintyEstimator {
    pub fn new(users: Arc<dyn UserStore>, foods: Arc<dyn FoodStore>, attributes: Vec<String>) -> Self {
        Self {
            users,
            foods,
            attributes,
        }
    }

    /// The tracked-attribute catalog, in catalog order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Uncertainty in [0, 1] for one attribute. Store failures degrade to
    /// "nothing known" rather than erroring.
    pub async fn uncertainty(&self, user_id: &str, attribute: &str) -> f64 {
        let liked = self.liked_foods(user_id).await;
        Self::attribute_uncertainty(&liked, attribute)
    }

    /// All tracked attributes ranked by descending uncertainty. The sort is
    /// stable, so ties keep catalog order.
    pub async fn ranked_attributes(&self, user_id: &str) -> Vec<(String, f64)> {
        let liked = self.liked_foods(user_id).await;
        let mut ranked: Vec<(String, f64)> = self
            .attributes
            .iter()
            .map(|attr| (attr.clone(), Self::attribute_uncertainty(&liked, attr)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// The most uncertain attribute not yet asked about, if any remain.
    pub async fn next_uncertain_attribute(
        &self,
        user_id: &str,
        already_asked: &[String],
    ) -> Option<String> {
        self.ranked_attributes(user_id)
            .await
            .into_iter()
            .map(|(attr, _)| attr)
            .find(|attr| !already_asked.contains(attr))
    }

    async fn liked_foods(&self, user_id: &str) -> Vec<Food> {
        let user = match self.users.get(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(user_id, error = %e, "user lookup failed, treating as unknown");
                return Vec::new();
            }
        };
        if user.liked_foods.is_empty() {
            return Vec::new();
        }
        match self.foods.get_many(&user.liked_foods).await {
            Ok(foods) => foods,
            Err(e) => {
                warn!(user_id, error = %e, "liked food lookup failed");
                Vec::new()
            }
        }
    }

    fn attribute_uncertainty(liked: &[Food], attribute: &str) -> f64 {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for food in liked {
            if let Some(value) = food.attribute(attribute) {
                *counts.entry(value.trim().to_lowercase()).or_insert(0) += 1;
            }
        }
        Self::normalized_entropy(&counts)
    }

    /// Entropy of the empirical distribution in bits, divided by
    /// log2(distinct) when more than one value was observed. One distinct
    /// value is the 0/0 case and defined as 0.0; an empty distribution is
    /// defined as 1.0.
    pub fn normalized_entropy(counts: &HashMap<String, usize>) -> f64 {
        let total: usize = counts.values().sum();
        if total == 0 {
            return 1.0;
        }

        let mut entropy = 0.0;
        for &count in counts.values() {
            let p = count as f64 / total as f64;
            entropy -= p * p.log2();
        }
        if counts.len() > 1 {
            entropy /= (counts.len() as f64).log2();
        }
        entropy.clamp(0.0, 1.0)
    }
}
