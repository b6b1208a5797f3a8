//! Prediction aggregation across a whole video.
//!
//! The accumulator maps breed names to every confidence observed for them,
//! preserving first-encounter order so that equal means rank stably. Sentinel
//! guesses are never accumulated.

use serde::{Deserialize, Serialize};

use crate::classify::{BreedGuess, UNDETERMINED};

/// One entry of the final ranked list handed to callers and the history sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedBreed {
    pub breed: String,
    /// Mean confidence percent across the frames the breed was seen in.
    pub confidence: f32,
    pub is_top: bool,
}

#[derive(Default)]
pub struct PredictionAggregator {
    // Vec keyed by breed name: linear scan is fine for top-k sized inputs,
    // and insertion order doubles as the stable tie-break.
    entries: Vec<(String, Vec<f32>)>,
}

impl PredictionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one guess. Sentinel guesses are ignored.
    pub fn observe(&mut self, guess: &BreedGuess) {
        if guess.is_undetermined() {
            return;
        }
        match self.entries.iter_mut().find(|(name, _)| name == &guess.breed) {
            Some((_, confidences)) => confidences.push(guess.confidence),
            None => self
                .entries
                .push((guess.breed.clone(), vec![guess.confidence])),
        }
    }

    pub fn observe_all(&mut self, guesses: &[BreedGuess]) {
        for guess in guesses {
            self.observe(guess);
        }
    }

    /// True when no non-sentinel guess was ever recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reduce the accumulator to a ranked top-N list.
    ///
    /// Per breed: arithmetic mean of its confidences. Sorted descending by
    /// mean; the sort is stable, so ties keep first-encounter order. The
    /// first entry (and only the first) is flagged `is_top`. An empty
    /// accumulator yields the single sentinel pair.
    pub fn finalize(&self, top_n: usize) -> Vec<RankedBreed> {
        if self.entries.is_empty() {
            return vec![RankedBreed {
                breed: UNDETERMINED.to_string(),
                confidence: 0.0,
                is_top: true,
            }];
        }

        let mut ranked: Vec<RankedBreed> = self
            .entries
            .iter()
            .map(|(breed, confidences)| RankedBreed {
                breed: breed.clone(),
                confidence: confidences.iter().sum::<f32>() / confidences.len() as f32,
                is_top: false,
            })
            .collect();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        ranked.truncate(top_n);
        if let Some(first) = ranked.first_mut() {
            first.is_top = true;
        }
        ranked
    }
}
