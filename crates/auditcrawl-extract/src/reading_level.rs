//! Flesch-Kincaid reading level estimation (spec.md §4.5 "Reading level").

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ReadingBucket {
    Basic,
    Intermediate,
    Advanced,
    Complex,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingLevel {
    pub grade: f64,
    pub bucket: ReadingBucket,
    pub word_count: u32,
    pub sentence_count: u32,
}

/// Crude vowel-group syllable approximation: counts transitions into a vowel
/// run, with a floor of one syllable per word and a silent trailing `e`
/// adjustment.
fn count_syllables(word: &str) -> u32 {
    let word = word.to_lowercase();
    let mut count = 0u32;
    let mut prev_vowel = false;
    for c in word.chars() {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = is_vowel;
    }
    if word.ends_with('e') && count > 1 {
        count -= 1;
    }
    count.max(1)
}

fn sentence_count(text: &str) -> u32 {
    let count = text
        .matches(|c| c == '.' || c == '!' || c == '?')
        .count() as u32;
    count.max(1)
}

pub fn analyze(text: &str) -> ReadingLevel {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len() as u32;
    if word_count == 0 {
        return ReadingLevel {
            grade: 0.0,
            bucket: ReadingBucket::Basic,
            word_count: 0,
            sentence_count: 0,
        };
    }

    let sentences = sentence_count(text);
    let syllables: u32 = words.iter().map(|w| count_syllables(w)).sum();

    let words_per_sentence = word_count as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / word_count as f64;

    let grade = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;
    let grade = grade.max(0.0);

    let bucket = match grade {
        g if g < 6.0 => ReadingBucket::Basic,
        g if g < 9.0 => ReadingBucket::Intermediate,
        g if g < 13.0 => ReadingBucket::Advanced,
        _ => ReadingBucket::Complex,
    };

    ReadingLevel {
        grade: (grade * 10.0).round() / 10.0,
        bucket,
        word_count,
        sentence_count: sentences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_basic_with_zero_grade() {
        let level = analyze("");
        assert_eq!(level.grade, 0.0);
        assert_eq!(level.bucket, ReadingBucket::Basic);
    }

    #[test]
    fn simple_short_sentences_are_basic() {
        let level = analyze("The cat sat. The dog ran. It was fun.");
        assert_eq!(level.bucket, ReadingBucket::Basic);
    }

    #[test]
    fn long_complex_sentences_grade_higher() {
        let text = "The multifaceted ramifications of interdisciplinary epistemological frameworks necessitate comprehensive reconsideration of conventional pedagogical methodologies employed throughout institutional academia.";
        let level = analyze(text);
        assert!(level.grade > 10.0);
    }
}
