/// Lower-cases `text`, splits on whitespace and trims punctuation from both
/// ends of each token. No stemming, no stop-word removal.
///
/// ```
/// use ragfuse_lexical::tokenize;
/// assert_eq!(tokenize("Breaks cannot be Combined."), vec!["breaks", "cannot", "be", "combined"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
