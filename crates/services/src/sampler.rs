use rand::Rng;
use rand::seq::{SliceRandom, index};
use std::collections::HashSet;
use std::sync::Arc;

use exam_core::model::{Category, ExamVariant, Question, QuestionId};
use exam_core::ordering::natural_cmp;
use storage::repository::QuestionBank;

use crate::error::SamplerError;
use crate::usage_history::UsageHistoryStore;

/// Parameters of one assembly call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSpec {
    pub variant: ExamVariant,
    pub categories: Vec<Category>,
    pub per_category: usize,
    pub randomize: bool,
}

impl SampleSpec {
    /// The variant's default paper: its category set and sample size,
    /// randomized.
    #[must_use]
    pub fn for_variant(variant: ExamVariant) -> Self {
        Self {
            variant,
            categories: variant.categories(),
            per_category: variant.per_category_count(),
            randomize: true,
        }
    }

    #[must_use]
    pub fn with_per_category(mut self, per_category: usize) -> Self {
        self.per_category = per_category;
        self
    }

    /// Deterministic debug mode: natural id order, no exclusion history,
    /// category-grouped output.
    #[must_use]
    pub fn deterministic(mut self) -> Self {
        self.randomize = false;
        self
    }
}

/// Assembles the finalized question set for one session from raw bank
/// collections, biased away from recently served questions.
#[derive(Clone)]
pub struct Sampler {
    bank: Arc<dyn QuestionBank>,
    history: UsageHistoryStore,
}

impl Sampler {
    #[must_use]
    pub fn new(bank: Arc<dyn QuestionBank>, history: UsageHistoryStore) -> Self {
        Self { bank, history }
    }

    /// Assemble one session's ordered question set.
    ///
    /// Fetches every category concurrently and joins; any failed fetch
    /// fails the whole assembly. Under `randomize` the per-category pools
    /// are filtered against usage history (falling back to the unfiltered
    /// pool when over-excluded), sampled without replacement, and the
    /// concatenation is shuffled. Without `randomize` each pool is sorted
    /// by natural id order and the head is taken. The selected ids are
    /// pushed onto usage history either way, and every returned question
    /// starts with an empty answer.
    ///
    /// # Errors
    ///
    /// Returns `SamplerError` for invalid parameters, fetch or data
    /// failures, or duplicate ids across the assembled set.
    pub async fn assemble<R: Rng + ?Sized>(
        &self,
        spec: &SampleSpec,
        rng: &mut R,
    ) -> Result<Vec<Question>, SamplerError> {
        if spec.per_category == 0 {
            return Err(SamplerError::ZeroSampleSize);
        }
        if spec.categories.is_empty() {
            return Err(SamplerError::NoCategories);
        }

        let fetches = spec
            .categories
            .iter()
            .map(|category| self.bank.fetch(spec.variant, *category));
        let pools = futures::future::try_join_all(fetches).await?;

        for question in pools.iter().flatten() {
            question.validate()?;
        }

        let excluded: HashSet<QuestionId> = if spec.randomize {
            self.history
                .load()
                .await?
                .excluded_ids()
                .into_iter()
                .cloned()
                .collect()
        } else {
            HashSet::new()
        };

        let mut selected = Vec::with_capacity(spec.categories.len() * spec.per_category);
        for pool in pools {
            if spec.randomize {
                selected.extend(pick_random(pool, spec.per_category, &excluded, rng));
            } else {
                selected.extend(pick_deterministic(pool, spec.per_category));
            }
        }

        let mut seen = HashSet::new();
        for question in &selected {
            if !seen.insert(question.id.clone()) {
                return Err(SamplerError::DuplicateId(question.id.to_string()));
            }
        }

        if spec.randomize {
            selected.shuffle(rng);
        }

        for question in &mut selected {
            question.user_answer.clear();
        }

        let ids: Vec<QuestionId> = selected.iter().map(|q| q.id.clone()).collect();
        self.history.record(ids).await?;

        tracing::debug!(
            variant = %spec.variant,
            categories = spec.categories.len(),
            total = selected.len(),
            randomize = spec.randomize,
            "assembled question set"
        );

        Ok(selected)
    }
}

/// Uniform selection without replacement, excluding recently served ids.
/// If exclusion leaves fewer than `count` candidates, fall back to the
/// unfiltered pool so over-exclusion never starves an assembly.
fn pick_random<R: Rng + ?Sized>(
    pool: Vec<Question>,
    count: usize,
    excluded: &HashSet<QuestionId>,
    rng: &mut R,
) -> Vec<Question> {
    let fresh: Vec<Question> = pool
        .iter()
        .filter(|q| !excluded.contains(&q.id))
        .cloned()
        .collect();
    let source = if fresh.len() < count { pool } else { fresh };

    let take = count.min(source.len());
    index::sample(rng, source.len(), take)
        .into_iter()
        .map(|i| source[i].clone())
        .collect()
}

/// Natural id order, head of the pool; exclusion history does not apply.
fn pick_deterministic(mut pool: Vec<Question>, count: usize) -> Vec<Question> {
    pool.sort_by(|a, b| natural_cmp(a.id.as_str(), b.id.as_str()));
    pool.truncate(count);
    pool
}
