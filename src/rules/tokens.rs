use crate::edit::Edit;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    text: String,
    /// Index into the original token spans, `None` for inserted tokens
    source: Option<usize>,
}

/// The whitespace-separated tokens of one attribute value.
///
/// Rules mutate the *current* list; [`TokenList::edits`] then diffs it
/// against the original value so untouched tokens and whitespace stay
/// byte-identical. Edit offsets are local to the value.
#[derive(Debug, Clone)]
pub struct TokenList<'a> {
    value: &'a str,
    original: Vec<Range<usize>>,
    slots: Vec<Slot>,
}

impl<'a> TokenList<'a> {
    pub fn parse(value: &'a str) -> Self {
        let mut original = Vec::new();
        let mut start = None;
        for (i, c) in value.char_indices() {
            if c.is_whitespace() {
                if let Some(s) = start.take() {
                    original.push(s..i);
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            original.push(s..value.len());
        }

        let slots = original
            .iter()
            .enumerate()
            .map(|(i, span)| Slot {
                text: value[span.clone()].to_string(),
                source: Some(i),
            })
            .collect();

        Self {
            value,
            original,
            slots,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.text.as_str())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.iter().any(|t| t == token)
    }

    /// Local span of the token at `index` if it came from the original value.
    pub fn original_span(&self, index: usize) -> Option<Range<usize>> {
        let source = self.slots.get(index)?.source?;
        self.original.get(source).cloned()
    }

    pub fn replace(&mut self, index: usize, token: impl Into<String>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.text = token.into();
        }
    }

    pub fn remove(&mut self, index: usize) {
        if index < self.slots.len() {
            self.slots.remove(index);
        }
    }

    pub fn insert_after(&mut self, index: usize, token: impl Into<String>) {
        let at = (index + 1).min(self.slots.len());
        self.slots.insert(
            at,
            Slot {
                text: token.into(),
                source: None,
            },
        );
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.slots.push(Slot {
            text: token.into(),
            source: None,
        });
    }

    /// Current tokens joined by single spaces.
    pub fn render(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }

    /// Spans of each current token within [`TokenList::render`].
    pub fn rendered_spans(&self) -> Vec<Range<usize>> {
        let mut spans = Vec::with_capacity(self.slots.len());
        let mut pos = 0;
        for slot in &self.slots {
            spans.push(pos..pos + slot.text.len());
            pos += slot.text.len() + 1;
        }
        spans
    }

    pub fn is_modified(&self) -> bool {
        if self.slots.len() != self.original.len() {
            return true;
        }
        self.slots
            .iter()
            .zip(&self.original)
            .enumerate()
            .any(|(i, (slot, span))| slot.source != Some(i) || slot.text != self.value[span.clone()])
    }

    /// Minimal edits turning the original value into the current list.
    ///
    /// One replacement per changed token, one deletion per removed token,
    /// one insertion per run of new tokens. A deletion takes its leading
    /// separator when an original token before it survives, otherwise its
    /// trailing one.
    pub fn edits(&self) -> Vec<Edit> {
        let mut edits = Vec::new();

        let mut survivor = vec![None; self.original.len()];
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(source) = slot.source {
                survivor[source] = Some(index);
            }
        }

        for (source, span) in self.original.iter().enumerate() {
            let before = &self.value[span.clone()];
            match survivor[source] {
                Some(index) if self.slots[index].text != before => {
                    edits.push(Edit::new(
                        span.start,
                        span.end,
                        self.slots[index].text.clone(),
                        before,
                    ));
                }
                Some(_) => {}
                None => {
                    let removal = if survivor[..source].iter().any(Option::is_some) {
                        self.original[source - 1].end..span.end
                    } else if let Some(next) = self.original.get(source + 1) {
                        span.start..next.start
                    } else {
                        span.clone()
                    };
                    edits.push(Edit::new(
                        removal.start,
                        removal.end,
                        "",
                        &self.value[removal.clone()],
                    ));
                }
            }
        }

        let mut i = 0;
        while i < self.slots.len() {
            if self.slots[i].source.is_some() {
                i += 1;
                continue;
            }
            let run_start = i;
            while i < self.slots.len() && self.slots[i].source.is_none() {
                i += 1;
            }
            let run = self.slots[run_start..i]
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let previous = self.slots[..run_start].iter().rev().find_map(|s| s.source);
            let next = self.slots[i..].iter().find_map(|s| s.source);
            let edit = match (previous, next) {
                (Some(p), _) => Edit::insertion(self.original[p].end, format!(" {run}")),
                (None, Some(n)) => Edit::insertion(self.original[n].start, format!("{run} ")),
                // Empty value
                (None, None) => Edit::insertion(0, run),
            };
            edits.push(edit);
        }

        edits
    }
}
