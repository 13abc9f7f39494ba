//! Tagging instructions sent to the model.
//!
//! The instruction text is fixed: the 17-tag description with examples and
//! the segmentation rules. Only the input text varies between calls.

use crate::schema::PosTag;

const SEGMENTATION_RULES: &str = "\
Follow these UD segmentation guidelines:
- Split contracted forms (e.g., \"don't\" → \"do\" [AUX] + \"n't\" [PART])
- Split hyphenated compounds into separate tokens (e.g., \"search-engine\" → \"search\" [NOUN] + \"-\" [PUNCT] + \"engine\" [NOUN])
- Treat multiword tokens as separate tokens (e.g., \"because of\" → \"because\" [SCONJ] + \"of\" [ADP])
- Separate punctuation from words (e.g., \"(hello)\" → \"(\" [PUNCT] + \"hello\" [NOUN] + \")\" [PUNCT])";

/// The tagset description and segmentation rules, without any input text.
///
/// Chat-style providers send this as the system message and the input text
/// as the user message.
pub fn instructions() -> String {
    let mut out = String::from(
        "You are a part-of-speech tagger using the Universal Dependencies (UD) tagset. \
         Your task is to analyze the given text, split it into tokens according to UD \
         guidelines, and assign the correct POS tag to each token.\n\n\
         The UD POS tagset consists of 17 universal tags:\n",
    );
    for (i, tag) in PosTag::ALL.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}: {} (e.g., {})\n",
            i + 1,
            tag.as_str(),
            tag.description(),
            tag.examples()
        ));
    }
    out.push('\n');
    out.push_str(SEGMENTATION_RULES);
    out.push_str(
        "\n\nInput sentences are separated by blank lines; return one sentence entry per \
         sentence, in input order. Return your analysis as JSON where each sentence is split \
         into tokens, and each token has its corresponding POS tag.",
    );
    out
}

/// A single self-contained prompt embedding `text` verbatim.
pub fn tagging_prompt(text: &str) -> String {
    format!(
        "{}\n\nPlease analyze the following text and tag each token:\n{}",
        instructions(),
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_list_every_tag() {
        let text = instructions();
        for tag in PosTag::ALL {
            assert!(text.contains(&format!("{}: {}", tag.as_str(), tag.description())));
        }
        assert!(text.contains("17. X: other"));
    }

    #[test]
    fn test_instructions_include_segmentation_rules() {
        let text = instructions();
        assert!(text.contains("\"n't\" [PART]"));
        assert!(text.contains("\"-\" [PUNCT]"));
        assert!(text.contains("because of"));
        assert!(text.contains("(hello)"));
    }

    #[test]
    fn test_tagging_prompt_embeds_text_verbatim() {
        let input = "What if Google expanded on its search-engine (and now e-mail) wares?";
        let prompt = tagging_prompt(input);
        assert!(prompt.ends_with(input));
        assert!(prompt.starts_with(&instructions()));
    }
}
