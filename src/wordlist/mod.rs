use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use serde_json::from_str;

static WORDLIST_DIR: Dir = include_dir!("src/wordlist");

/// The two bundled word lists.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WordList {
    Simple,
    Advanced,
}

impl WordList {
    /// Load the embedded word set for this list.
    pub fn word_set(&self) -> WordSet {
        let file_name = match self {
            WordList::Simple => "simple.json",
            WordList::Advanced => "advanced.json",
        };
        read_word_set(file_name)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct WordSet {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

fn read_word_set(file_name: &str) -> WordSet {
    let file = WORDLIST_DIR
        .get_file(file_name)
        .expect("Word list file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret word list as a string");

    from_str(file_as_str).expect("Unable to deserialize word list json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_word_set() {
        let set = WordList::Simple.word_set();

        assert_eq!(set.name, "simple");
        assert!(!set.words.is_empty());
        assert_eq!(set.size as usize, set.words.len());
    }

    #[test]
    fn test_advanced_word_set() {
        let set = WordList::Advanced.word_set();

        assert_eq!(set.name, "advanced");
        assert!(!set.words.is_empty());
        assert_eq!(set.size as usize, set.words.len());
    }

    #[test]
    fn test_lists_are_distinct() {
        let simple = WordList::Simple.word_set();
        let advanced = WordList::Advanced.word_set();
        assert_ne!(simple.words, advanced.words);
    }

    #[test]
    fn test_display_matches_serde() {
        assert_eq!(WordList::Simple.to_string(), "simple");
        assert_eq!(WordList::Advanced.to_string(), "advanced");
        assert_eq!(
            serde_json::to_string(&WordList::Advanced).unwrap(),
            "\"advanced\""
        );
    }

    #[test]
    fn test_word_set_deserialization() {
        let json_data = r#"
        {
            "name": "test",
            "size": 3,
            "words": ["hello", "world", "test"]
        }
        "#;

        let set: WordSet = from_str(json_data).expect("Failed to deserialize test word set");

        assert_eq!(set.name, "test");
        assert_eq!(set.size, 3);
        assert_eq!(set.words.len(), 3);
    }
}
