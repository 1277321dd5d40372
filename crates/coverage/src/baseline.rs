use serde::Serialize;

use crate::classify::assign_segment;
use crate::model::FunnelSegment;

/// Whitespace-token count of a target text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Mean and sample standard deviation of word counts over a whole dataset.
///
/// `mean` is `None` for an empty dataset and `stddev` is `None` below two
/// samples. Without both, every text falls in [`FunnelSegment::Mid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WordCountBaseline {
    pub samples: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

impl WordCountBaseline {
    pub fn from_texts<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let counts: Vec<f64> = texts.into_iter().map(|t| word_count(t) as f64).collect();
        let samples = counts.len();
        if samples == 0 {
            return Self { samples, mean: None, stddev: None };
        }

        let mean = counts.iter().sum::<f64>() / samples as f64;
        let stddev = if samples < 2 {
            None
        } else {
            let var = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (samples - 1) as f64;
            Some(var.sqrt())
        };

        Self { samples, mean: Some(mean), stddev }
    }

    pub fn segment(&self, word_count: usize) -> FunnelSegment {
        match (self.mean, self.stddev) {
            (Some(mean), Some(stddev)) => assign_segment(word_count, mean, stddev),
            _ => FunnelSegment::Mid,
        }
    }

    pub fn segment_for(&self, text: &str) -> FunnelSegment {
        self.segment(word_count(text))
    }
}
