/// Playlist names parsed from the select entity's option string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlists {
    names: Vec<String>,
}

const OUTER_TRIM: &[char] = &[' ', '\t', '\n', '\r', '['];
const OUTER_TRIM_END: &[char] = &[' ', '\t', '\n', '\r', ']'];
const ITEM_TRIM: &[char] = &[' ', '\t', '\n', '\r', '\'', '"'];

impl Playlists {
    /// Accepts a Python-style list (`['a', 'b']`) or a plain comma list
    /// (`a, b`). Empty items are dropped.
    pub fn parse(options: &str) -> Self {
        let inner = options
            .trim_start_matches(OUTER_TRIM)
            .trim_end_matches(OUTER_TRIM_END);

        let names = inner
            .split(',')
            .map(|item| item.trim_matches(ITEM_TRIM))
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect();

        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve a selection by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
