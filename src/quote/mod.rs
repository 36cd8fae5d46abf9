//! Quote deck for recording practice.
//!
//! Holds a fixed list of passages that take roughly ten seconds to read aloud.
//! The deck tracks the current passage and can draw a new one at random without
//! repeating the one currently shown.

use rand::Rng;

/// Built-in practice passages, each roughly ten seconds of speech.
pub const QUOTES: [&str; 10] = [
    "The future belongs to those who believe in the beauty of their dreams. What we achieve inwardly will change outer reality. It is during our darkest moments that we must focus to see the light.",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. The greatest glory in living lies not in never falling, but in rising every time we fall.",
    "The way to get started is to quit talking and begin doing. Your time is limited, so don't waste it living someone else's life. Don't be trapped by dogma – which is living with the results of other people's thinking.",
    "In the end, we will remember not the words of our enemies, but the silence of our friends. The ultimate measure of a person is not where they stand in moments of comfort and convenience, but where they stand at times of challenge and controversy.",
    "It is not the critic who counts; not the one who points out how the strong person stumbles, or where the doer of deeds could have done them better. The credit belongs to the one who is actually in the arena.",
    "The difference between a successful person and others is not a lack of strength, not a lack of knowledge, but rather a lack of will. If you cannot fly then run, if you cannot run then walk, if you cannot walk then crawl, but whatever you do you have to keep moving forward.",
    "Life is what happens when you're busy making other plans. Twenty years from now you will be more disappointed by the things you didn't do than by the ones you did do. So throw off the bowlines, sail away from safe harbor, and catch the trade winds in your sails.",
    "Education is the most powerful weapon which you can use to change the world. The function of education is to teach one to think intensively and to think critically. Intelligence plus character - that is the goal of true education.",
    "The only thing we have to fear is fear itself. Ask not what your country can do for you – ask what you can do for your country. We choose to go to the moon in this decade and do the other things, not because they are easy, but because they are hard.",
    "Darkness cannot drive out darkness; only light can do that. Hate cannot drive out hate; only love can do that. Our lives begin to end the day we become silent about things that matter.",
];

/// A fixed, ordered list of quotes with a pointer to the current one.
///
/// Starts on a random entry. Drawing a new quote uses rejection sampling:
/// a draw that lands on the current entry is redrawn, as long as the list
/// holds more than one distinct string.
pub struct QuoteDeck {
    quotes: Vec<String>,
    current: usize,
    distinct: usize,
}

impl QuoteDeck {
    /// Creates a deck over the built-in passages.
    pub fn new() -> Self {
        Self::with_quotes(QUOTES.iter().map(|q| q.to_string()).collect())
    }

    /// Creates a deck over an arbitrary non-empty list of quotes.
    ///
    /// An empty list yields a deck whose current quote is the empty string.
    pub fn with_quotes(quotes: Vec<String>) -> Self {
        let mut distinct_quotes: Vec<&String> = quotes.iter().collect();
        distinct_quotes.sort();
        distinct_quotes.dedup();
        let distinct = distinct_quotes.len();

        let current = if quotes.is_empty() {
            0
        } else {
            rand::thread_rng().gen_range(0..quotes.len())
        };

        Self {
            quotes,
            current,
            distinct,
        }
    }

    /// Returns the quote currently shown.
    pub fn current(&self) -> &str {
        self.quotes
            .get(self.current)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Draws a new random quote and makes it current.
    ///
    /// Redraws while the draw matches the current quote, provided more than one
    /// distinct quote exists. With a single (or single distinct) entry the same
    /// quote is returned again.
    pub fn draw_new(&mut self) -> &str {
        if self.quotes.is_empty() {
            return "";
        }

        let mut rng = rand::thread_rng();
        loop {
            let candidate = rng.gen_range(0..self.quotes.len());
            if self.quotes[candidate] == self.quotes[self.current] && self.distinct > 1 {
                continue;
            }
            self.current = candidate;
            break;
        }

        tracing::debug!("New quote drawn: index {}", self.current);
        self.current()
    }
}

impl Default for QuoteDeck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_repeats_with_multiple_quotes() {
        let mut deck = QuoteDeck::new();
        let mut previous = deck.current().to_string();

        for _ in 0..200 {
            let next = deck.draw_new().to_string();
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn test_single_quote_always_returned() {
        let mut deck = QuoteDeck::with_quotes(vec!["only one".to_string()]);
        assert_eq!(deck.current(), "only one");
        for _ in 0..10 {
            assert_eq!(deck.draw_new(), "only one");
        }
    }

    #[test]
    fn test_duplicate_entries_terminate() {
        // Two entries with the same text: rejection sampling must not spin.
        let mut deck =
            QuoteDeck::with_quotes(vec!["same".to_string(), "same".to_string()]);
        for _ in 0..10 {
            assert_eq!(deck.draw_new(), "same");
        }
    }

    #[test]
    fn test_empty_list() {
        let mut deck = QuoteDeck::with_quotes(Vec::new());
        assert_eq!(deck.current(), "");
        assert_eq!(deck.draw_new(), "");
    }

    #[test]
    fn test_starts_on_builtin_quote() {
        let deck = QuoteDeck::new();
        assert!(QUOTES.contains(&deck.current()));
    }
}
