use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use restyle_contracts::context::EnrichedContext;
use restyle_contracts::scene::SceneAnalysis;

use crate::analyzer::SceneAnalyzer;
use crate::enhance;
use crate::singleflight::SingleFlight;
use crate::vision::ImageRef;

pub const FALLBACK_CONFIDENCE: f64 = 0.3;

// Unit separator: cannot appear in a URI or hex digest, so composite keys
// never collide with each other.
const KEY_SEPARATOR: char = '\u{1f}';
const NO_PROMPT_SENTINEL: &str = "<no-prompt>";

/// Enrichment entry point: a 5-minute TTL cache over (image, prompt) pairs
/// with single-flight coalescing of concurrent identical requests. Never
/// returns an error; every failure path degrades to a low-confidence
/// fallback context.
pub struct ContextPipeline {
    analyzer: Arc<SceneAnalyzer>,
    cache: Mutex<HashMap<String, EnrichedContext>>,
    inflight: SingleFlight<EnrichedContext>,
    ttl: Duration,
    flight_wait: StdDuration,
}

impl ContextPipeline {
    pub fn new(analyzer: Arc<SceneAnalyzer>) -> Self {
        Self::with_limits(analyzer, Duration::minutes(5), StdDuration::from_secs(30))
    }

    pub fn with_limits(analyzer: Arc<SceneAnalyzer>, ttl: Duration, flight_wait: StdDuration) -> Self {
        Self {
            analyzer,
            cache: Mutex::new(HashMap::new()),
            inflight: SingleFlight::new(),
            ttl,
            flight_wait,
        }
    }

    pub fn process(&self, image: &ImageRef, user_prompt: Option<&str>) -> EnrichedContext {
        let key = cache_key(image.identity(), user_prompt);
        if let Some(hit) = self.fresh(&key) {
            return hit;
        }

        let computed = self
            .inflight
            .run(&key, self.flight_wait, || self.compute(&key, image, user_prompt));
        match computed {
            Some(context) => context,
            None => {
                log::warn!(
                    "enrichment for {} still in flight after {:?}, returning fallback",
                    image.identity(),
                    self.flight_wait,
                );
                fallback_context(user_prompt)
            }
        }
    }

    fn fresh(&self, key: &str) -> Option<EnrichedContext> {
        let cache = self.lock_cache();
        let hit = cache.get(key)?;
        if Utc::now() - hit.timestamp < self.ttl {
            return Some(hit.clone());
        }
        None
    }

    fn compute(&self, key: &str, image: &ImageRef, user_prompt: Option<&str>) -> EnrichedContext {
        let analysis = match self.analyzer.analyze(image) {
            Ok(analysis) => analysis,
            Err(err) => {
                log::warn!("scene analysis failed for {}: {err}", image.identity());
                // Not cached: the next request may find the capability back.
                return fallback_context(user_prompt);
            }
        };

        let context = enhance::enrich(analysis, user_prompt, Utc::now());
        self.lock_cache().insert(key.to_string(), context.clone());
        context
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, EnrichedContext>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Neutral context handed out when enrichment cannot complete.
pub fn fallback_context(user_prompt: Option<&str>) -> EnrichedContext {
    let mut context =
        EnrichedContext::minimal(SceneAnalysis::default(), FALLBACK_CONFIDENCE, Utc::now());
    context.user_prompt = user_prompt.map(str::to_string);
    context
}

fn cache_key(identity: &str, user_prompt: Option<&str>) -> String {
    format!(
        "{identity}{KEY_SEPARATOR}{}",
        user_prompt.unwrap_or(NO_PROMPT_SENTINEL)
    )
}
