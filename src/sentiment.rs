//! Sentiment scoring for outbound messages.
//!
//! Scoring sits behind `SentimentScorer` so a different text model can be
//! plugged in; the metrics layer only aggregates the scores it is given.
//! `LexiconSentiment` is the default: a word list with negation flipping.

/// Label thresholds on the [-1, 1] score.
pub const POSITIVE_THRESHOLD: f64 = 0.1;
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

/// Tokens before a sentiment word that can flip it.
const NEGATION_WINDOW: usize = 3;

pub const POSITIVE_WORDS: &[&str] = &[
    "great", "good", "love", "excited", "happy", "glad", "thanks", "thank", "appreciate",
    "awesome", "excellent", "amazing", "impressive", "congrats", "congratulations", "pleasure",
    "wonderful", "fantastic", "helpful", "interested", "perfect", "nice", "best", "enjoy",
];

pub const NEGATIVE_WORDS: &[&str] = &[
    "bad", "sorry", "unfortunately", "problem", "issue", "hate", "disappointed", "annoying",
    "difficult", "frustrated", "frustrating", "worst", "poor", "terrible", "busy", "spam",
    "unsubscribe", "stop", "waste", "wrong", "concern", "confused",
];

pub const NEGATIONS: &[&str] = &[
    "not", "no", "never", "don't", "dont", "isn't", "wasn't", "aren't", "won't", "can't",
    "cannot", "didn't", "doesn't", "hardly",
];

/// Text-sentiment collaborator. Scores are in [-1, 1].
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

/// Scores every message 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSentiment;

impl SentimentScorer for NeutralSentiment {
    fn score(&self, _text: &str) -> f64 {
        0.0
    }
}

/// Word-list scorer: mean polarity of matched words, a preceding negation
/// flips a word's polarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentiment;

impl SentimentScorer for LexiconSentiment {
    fn score(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        let mut total = 0.0;
        let mut hits = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let polarity = if POSITIVE_WORDS.contains(&token.as_str()) {
                1.0
            } else if NEGATIVE_WORDS.contains(&token.as_str()) {
                -1.0
            } else {
                continue;
            };
            let start = i.saturating_sub(NEGATION_WINDOW);
            let negated = tokens[start..i].iter().any(|t| NEGATIONS.contains(&t.as_str()));
            total += if negated { -polarity } else { polarity };
            hits += 1;
        }

        if hits == 0 {
            0.0
        } else {
            (total / hits as f64).clamp(-1.0, 1.0)
        }
    }
}

pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// "positive", "negative" or "neutral" for a score.
pub fn sentiment_label(score: f64) -> &'static str {
    if score > POSITIVE_THRESHOLD {
        "positive"
    } else if score < NEGATIVE_THRESHOLD {
        "negative"
    } else {
        "neutral"
    }
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
