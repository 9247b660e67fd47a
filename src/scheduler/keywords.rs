use std::collections::{HashSet, VecDeque};

use crate::config::SchedulerConfig;
use crate::script::ScriptText;

/// Characters stripped from both ends of a script token
const TOKEN_PUNCTUATION: [char; 4] = ['.', ',', '?', '!'];

/// Pulls salient keywords out of a script's title and body
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stop_words: HashSet<String>,
    min_chars: usize,
}

impl KeywordExtractor {
    pub fn new(stop_words: impl IntoIterator<Item = String>, min_chars: usize) -> Self {
        Self {
            stop_words: stop_words.into_iter().map(|w| w.to_lowercase()).collect(),
            min_chars,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.stop_words.iter().cloned(), config.min_keyword_chars)
    }

    /// Ordered, duplicate-free keywords; first occurrence wins
    pub fn extract(&self, script: &ScriptText) -> VecDeque<String> {
        let text = format!("{} {}", script.title, script.body);
        let mut seen = HashSet::new();

        text.split_whitespace()
            .map(normalize_token)
            .filter(|token| token.chars().count() > self.min_chars)
            .filter(|token| !self.stop_words.contains(token))
            .filter(|token| seen.insert(token.clone()))
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

fn normalize_token(token: &str) -> String {
    token.to_lowercase().trim_matches(&TOKEN_PUNCTUATION[..]).to_string()
}
