use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Weight of text that sits under no recognized tag, including plain `<p>`.
pub const DEFAULT_WEIGHT: u32 = 1;

// Subtrees that carry no indexable prose.
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Static map of recognized semantic tags to their importance weights
static TAG_WEIGHTS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("title", 10),
        ("h1", 7),
        ("h2", 6),
        ("h3", 5),
        ("h4", 4),
        ("h5", 3),
        ("h6", 2),
        ("b", 2),
        ("strong", 2),
    ])
});

/// Returns a reference to the global stemmer instance
pub fn get_stemmer() -> &'static Stemmer {
    static STEMMER: OnceLock<Stemmer> = OnceLock::new();
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

/// Importance weight of a recognized semantic tag, `None` for everything else.
fn tag_weight(tag: &str) -> Option<u32> {
    TAG_WEIGHTS.get(tag).copied()
}

/// Tokenizes one HTML document into `(stem, weight)` pairs in document order.
///
/// The DOM is walked once with an inherited weight: each text run is split on
/// non-alphanumeric boundaries, ASCII-lowercased, and stemmed, and every token
/// carries the weight of the innermost recognized tag enclosing it.
pub fn tokenize_html(html: &str) -> Vec<(String, u32)> {
    let document = Html::parse_document(html);
    let mut tokens = Vec::new();
    collect_tokens(document.tree.root(), DEFAULT_WEIGHT, &mut tokens);
    tokens
}

/// Tokenizes a plain-text query the same way body text is tokenized, without
/// tag weighting. Index-side and query-side stems match by construction.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    tokenize_text(query, DEFAULT_WEIGHT, &mut tokens);
    tokens.into_iter().map(|(stem, _)| stem).collect()
}

fn collect_tokens(node: NodeRef<'_, Node>, weight: u32, out: &mut Vec<(String, u32)>) {
    for child in node.children() {
        match child.value() {
            Node::Element(element) => {
                let name = element.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let child_weight = tag_weight(name).unwrap_or(weight);
                collect_tokens(child, child_weight, out);
            }
            Node::Text(text) => {
                let run: &str = &text.text;
                tokenize_text(run, weight, out);
            }
            _ => {}
        }
    }
}

fn tokenize_text(text: &str, weight: u32, out: &mut Vec<(String, u32)>) {
    let stemmer = get_stemmer();
    for word in text.split(|c: char| !c.is_ascii_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let lowered = word.to_ascii_lowercase();
        let stem = stemmer.stem(&lowered).to_string();
        if !stem.is_empty() {
            out.push((stem, weight));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_and_body_weights() {
        let tokens = tokenize_html("<title>Cats</title><p>cat cat dog</p>");
        assert_eq!(
            tokens,
            vec![
                ("cat".to_string(), 10),
                ("cat".to_string(), 1),
                ("cat".to_string(), 1),
                ("dog".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_innermost_recognized_tag_wins() {
        // The bold run inside the heading takes the weight of <b>, not <h1>.
        let tokens = tokenize_html("<h1>alpha <b>beta</b> gamma</h1>");
        assert_eq!(
            tokens,
            vec![
                ("alpha".to_string(), 7),
                ("beta".to_string(), 2),
                ("gamma".to_string(), 7),
            ]
        );
    }

    #[test]
    fn test_unrecognized_tag_inherits_weight() {
        let tokens = tokenize_html("<h2><span>nested</span></h2>");
        assert_eq!(tokens, vec![("nest".to_string(), 6)]);
    }

    #[test]
    fn test_script_and_style_are_skipped() {
        let tokens =
            tokenize_html("<p>keep</p><script>var dropped = 1;</script><style>.x{}</style>");
        assert_eq!(tokens, vec![("keep".to_string(), 1)]);
    }

    #[test]
    fn test_non_alphanumeric_splits_tokens() {
        let tokens = tokenize_html("<p>state-of-the-art, v2.0!</p>");
        let stems: Vec<&str> = tokens.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(stems, vec!["state", "of", "the", "art", "v2", "0"]);
    }

    #[test]
    fn test_non_ascii_is_a_separator() {
        let tokens = tokenize_html("<p>caf\u{e9}</p>");
        assert_eq!(tokens, vec![("caf".to_string(), 1)]);
    }

    #[test]
    fn test_stemming_reduces_inflections() {
        let stems = tokenize_query("running dogs cats");
        assert_eq!(stems, vec!["run", "dog", "cat"]);
    }

    #[test]
    fn test_query_parity_with_html_tokens() {
        // "Cats!" as a query must stem identically to "Cats" in a title.
        assert_eq!(tokenize_query("Cats!"), tokenize_query("cat"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(tokenize_query("").is_empty());
        assert!(tokenize_query("...!?").is_empty());
        assert!(tokenize_html("").is_empty());
    }
}
