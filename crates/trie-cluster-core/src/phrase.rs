//! Phrase utilities.
//!
//! A phrase is an ordered sequence of word tokens. Everything in the trie
//! and clustering stages works on phrases rather than raw strings.

/// Split text into a phrase on whitespace.
///
/// Empty or whitespace-only input yields an empty phrase.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Find the longest shared prefix of two phrases.
///
/// Returns `(common, rest_a, rest_b)` where `common + rest_a == a` and
/// `common + rest_b == b`. Comparison stops at the first mismatch or when
/// either phrase runs out.
pub fn common_start_segment<'a, 'b, T: PartialEq>(
    a: &'a [T],
    b: &'b [T],
) -> (&'a [T], &'a [T], &'b [T]) {
    let shared = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    (&a[..shared], &a[shared..], &b[shared..])
}

/// Join a phrase back into a single space-separated string.
pub fn phrase_to_string(phrase: &[String]) -> String {
    phrase.join(" ")
}
