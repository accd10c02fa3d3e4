/// Lowercased text that remembers, for every folded byte, the byte range of
/// the source character it came from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Folded {
    text: String,
    origin: Vec<(usize, usize)>,
}

impl Folded {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Occurrences of an already folded `needle`, as byte ranges into the
    /// source text.
    pub fn spans(&self, needle: &str) -> Vec<(usize, usize)> {
        occurrences(&self.text, needle)
            .into_iter()
            .map(|(start, end)| (self.origin[start].0, self.origin[end - 1].1))
            .collect()
    }
}

pub fn fold_case(text: &str) -> Folded {
    let mut folded = Folded {
        text: String::with_capacity(text.len()),
        origin: Vec::with_capacity(text.len()),
    };
    for (offset, ch) in text.char_indices() {
        let source = (offset, offset + ch.len_utf8());
        for lower in ch.to_lowercase() {
            folded.text.push(lower);
            folded
                .origin
                .extend(std::iter::repeat_n(source, lower.len_utf8()));
        }
    }
    folded
}

/// Non-overlapping occurrences of `needle` in `haystack` as byte ranges.
pub fn occurrences(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack
        .match_indices(needle)
        .map(|(start, matched)| (start, start + matched.len()))
        .collect()
}

pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}
