use regex::{Regex, RegexBuilder};

pub const HIGHLIGHT_TAG: &str = "mark";
pub const HIGHLIGHT_CLASS: &str = "search-highlight";

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_string()
}

/// Case-insensitive containment against a card's visible title and
/// description text.
pub fn card_matches(title: &str, description: &str, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    title.to_lowercase().contains(&needle) || description.to_lowercase().contains(&needle)
}

/// A group stays shown while the query is empty or any of its cards is.
pub fn group_visible(query: &str, cards_visible: &[bool]) -> bool {
    query.trim().is_empty() || cards_visible.iter().any(|&visible| visible)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

impl Segment<'_> {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Match(text) => text,
        }
    }
}

/// Literal, case-insensitive matcher for one query.
#[derive(Clone, Debug)]
pub struct QueryMatcher {
    re: Regex,
}

impl QueryMatcher {
    /// Fails only for pathological queries (e.g. over the regex size limit);
    /// callers skip highlighting in that case.
    pub fn new(query: &str) -> Result<Self, regex::Error> {
        let re = RegexBuilder::new(&regex::escape(query.trim()))
            .case_insensitive(true)
            .build()?;
        Ok(Self { re })
    }

    /// Splits `text` into plain and matched runs covering it exactly. Returns
    /// `None` when nothing matches so the text node can be left untouched.
    pub fn segments<'t>(&self, text: &'t str) -> Option<Vec<Segment<'t>>> {
        let mut segments = Vec::new();
        let mut last = 0;
        for found in self.re.find_iter(text) {
            if found.start() == found.end() {
                continue;
            }
            if found.start() > last {
                segments.push(Segment::Plain(&text[last..found.start()]));
            }
            segments.push(Segment::Match(found.as_str()));
            last = found.end();
        }
        if segments.is_empty() {
            return None;
        }
        if last < text.len() {
            segments.push(Segment::Plain(&text[last..]));
        }
        Some(segments)
    }
}

/// Latest-wins debounce bookkeeping. Each keystroke files a value and gets a
/// ticket; when a timer fires, only the newest ticket yields its value.
#[derive(Clone, Debug)]
pub struct Debounce<T> {
    generation: u64,
    pending: Option<T>,
}

impl<T> Default for Debounce<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            pending: None,
        }
    }
}

impl<T> Debounce<T> {
    pub fn push(&mut self, value: T) -> u64 {
        self.generation += 1;
        self.pending = Some(value);
        self.generation
    }

    pub fn fire(&mut self, ticket: u64) -> Option<T> {
        if ticket != self.generation {
            return None;
        }
        self.pending.take()
    }

    /// Drops whatever is pending, e.g. when Enter applies the query right away.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }
}
