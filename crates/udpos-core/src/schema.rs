//! Schema definitions for tagged output.
//!
//! These types are both the shape the remote model is asked to produce and
//! the shape responses are validated against. Decoding is all-or-nothing:
//! a single unknown tag or empty token rejects the whole document.

use crate::error::{TagError, TagResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The 17 Universal Dependencies part-of-speech tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
}

impl PosTag {
    /// Every tag, in tagset order.
    pub const ALL: [PosTag; 17] = [
        PosTag::Adj,
        PosTag::Adp,
        PosTag::Adv,
        PosTag::Aux,
        PosTag::Cconj,
        PosTag::Det,
        PosTag::Intj,
        PosTag::Noun,
        PosTag::Num,
        PosTag::Part,
        PosTag::Pron,
        PosTag::Propn,
        PosTag::Punct,
        PosTag::Sconj,
        PosTag::Sym,
        PosTag::Verb,
        PosTag::X,
    ];

    /// The tag code as it appears on the wire (e.g. "PROPN").
    pub fn as_str(self) -> &'static str {
        match self {
            PosTag::Adj => "ADJ",
            PosTag::Adp => "ADP",
            PosTag::Adv => "ADV",
            PosTag::Aux => "AUX",
            PosTag::Cconj => "CCONJ",
            PosTag::Det => "DET",
            PosTag::Intj => "INTJ",
            PosTag::Noun => "NOUN",
            PosTag::Num => "NUM",
            PosTag::Part => "PART",
            PosTag::Pron => "PRON",
            PosTag::Propn => "PROPN",
            PosTag::Punct => "PUNCT",
            PosTag::Sconj => "SCONJ",
            PosTag::Sym => "SYM",
            PosTag::Verb => "VERB",
            PosTag::X => "X",
        }
    }

    /// Short human-readable category name.
    pub fn description(self) -> &'static str {
        match self {
            PosTag::Adj => "adjective",
            PosTag::Adp => "adposition",
            PosTag::Adv => "adverb",
            PosTag::Aux => "auxiliary verb",
            PosTag::Cconj => "coordinating conjunction",
            PosTag::Det => "determiner",
            PosTag::Intj => "interjection",
            PosTag::Noun => "noun",
            PosTag::Num => "numeral",
            PosTag::Part => "particle",
            PosTag::Pron => "pronoun",
            PosTag::Propn => "proper noun",
            PosTag::Punct => "punctuation",
            PosTag::Sconj => "subordinating conjunction",
            PosTag::Sym => "symbol",
            PosTag::Verb => "verb",
            PosTag::X => "other",
        }
    }

    /// Example words used when describing the tagset to a model.
    pub fn examples(self) -> &'static str {
        match self {
            PosTag::Adj => "big, old, green",
            PosTag::Adp => "in, to, during",
            PosTag::Adv => "very, well, exactly",
            PosTag::Aux => "is, has, must",
            PosTag::Cconj => "and, or, but",
            PosTag::Det => "a, an, the",
            PosTag::Intj => "oh, wow, ah",
            PosTag::Noun => "car, girl, tree",
            PosTag::Num => "2, two, second",
            PosTag::Part => "'s in \"John's\", to in \"going to\"",
            PosTag::Pron => "I, you, she",
            PosTag::Propn => "John, London, IBM",
            PosTag::Punct => "., !, ?",
            PosTag::Sconj => "if, while, that",
            PosTag::Sym => "$, %, §",
            PosTag::Verb => "run, eat, play",
            PosTag::X => "words that cannot be assigned a category",
        }
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PosTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PosTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| TagError::schema(format!("unknown POS tag '{s}'")))
    }
}

/// A single segmented token and its tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text as segmented by the model
    pub text: String,

    /// Universal Dependencies POS tag
    #[serde(rename = "pos_tag", alias = "tag")]
    pub tag: PosTag,
}

impl Token {
    pub fn new(text: impl Into<String>, tag: PosTag) -> Self {
        Self {
            text: text.into(),
            tag,
        }
    }
}

/// An ordered sequence of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

/// One tagging call's worth of output: an ordered list of sentences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaggedSentences {
    pub sentences: Vec<Sentence>,
}

impl TaggedSentences {
    /// Decode and validate a model response.
    ///
    /// Accepts the JSON document on its own or wrapped in a Markdown code
    /// fence. Any deviation from the schema is a `SchemaViolation`.
    pub fn from_json(raw: &str) -> TagResult<Self> {
        let body = strip_code_fence(raw);
        let doc: TaggedSentences = serde_json::from_str(body)
            .map_err(|e| TagError::schema(format!("response does not match schema: {e}")))?;
        doc.validate()?;
        Ok(doc)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> TagResult<()> {
        for (s, sentence) in self.sentences.iter().enumerate() {
            for (t, token) in sentence.tokens.iter().enumerate() {
                if token.text.trim().is_empty() {
                    return Err(TagError::schema(format!(
                        "sentence {s} token {t} has empty text"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of tokens across all sentences.
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.tokens.len()).sum()
    }

    /// Iterate every token in document order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }

    /// Space-joined token text, one line per sentence.
    pub fn surface_text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| {
                s.tokens
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Count tokens per tag.
    pub fn tag_counts(&self) -> BTreeMap<PosTag, usize> {
        let mut counts = BTreeMap::new();
        for token in self.tokens() {
            *counts.entry(token.tag).or_insert(0) += 1;
        }
        counts
    }
}

/// JSON schema for [`TaggedSentences`], sent to providers that support
/// schema-constrained output.
pub fn response_schema() -> serde_json::Value {
    let tags: Vec<&str> = PosTag::ALL.iter().map(|t| t.as_str()).collect();
    serde_json::json!({
        "type": "object",
        "properties": {
            "sentences": {
                "type": "array",
                "description": "A list of sentences, each containing tagged tokens.",
                "items": {
                    "type": "object",
                    "properties": {
                        "tokens": {
                            "type": "array",
                            "description": "List of tokens with their POS tags",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "text": {
                                        "type": "string",
                                        "description": "The token text"
                                    },
                                    "pos_tag": {
                                        "type": "string",
                                        "enum": tags,
                                        "description": "The Universal Dependencies POS tag"
                                    }
                                },
                                "required": ["text", "pos_tag"],
                                "additionalProperties": false
                            }
                        }
                    },
                    "required": ["tokens"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["sentences"],
        "additionalProperties": false
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
