/// Query-intent detection behind a named interface so the keyword heuristic
/// can later be swapped for a real classifier without touching the state
/// machine.
pub trait IntentClassifier: Send + Sync {
    /// Does this message open a new free-form request (as opposed to
    /// answering the question currently on the table)?
    fn is_new_request(&self, message: &str) -> bool;
}

pub struct KeywordIntentClassifier {
    keywords: Vec<String>,
}

impl KeywordIntentClassifier {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::new(
            ["recommend", "find", "suggest", "what about", "i want"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn is_new_request(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.keywords.iter().any(|kw| message.contains(kw.as_str()))
    }
}
