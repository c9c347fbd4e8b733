//! Removal of private reasoning spans from streamed model output.
//!
//! Some models wrap their reasoning in a marker pair such as
//! `<thinking>...</thinking>`. Token chunks can split a marker anywhere, so
//! the filter holds back at most `marker_len - 1` trailing characters whose
//! fate is not yet known. Visible output is the same for every chunking of
//! the same raw text.

use crate::tool::TokenStream;
use futures::StreamExt;

/// Opening and closing markers of a thinking span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingMarkers {
    pub open: String,
    pub close: String,
}

impl ThinkingMarkers {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

impl Default for ThinkingMarkers {
    fn default() -> Self {
        Self::new("<thinking>", "</thinking>")
    }
}

/// Incremental filter state for one generation call.
///
/// With an empty marker there is nothing to match and text passes through
/// unchanged.
#[derive(Debug)]
pub struct ThinkingFilter {
    markers: ThinkingMarkers,
    in_span: bool,
    pending: String,
}

impl ThinkingFilter {
    pub fn new(markers: ThinkingMarkers) -> Self {
        Self {
            markers,
            in_span: false,
            pending: String::new(),
        }
    }

    /// Whether the last processed character was inside a span.
    pub fn in_span(&self) -> bool {
        self.in_span
    }

    /// Text held back because it may belong to a marker.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Feed one raw chunk and return the text that is now known to be visible.
    pub fn filter(&mut self, raw: &str) -> String {
        if self.markers.open.is_empty() || self.markers.close.is_empty() {
            return raw.to_string();
        }
        self.pending.push_str(raw);
        let mut visible = String::new();

        loop {
            if self.in_span {
                match self.pending.find(self.markers.close.as_str()) {
                    Some(pos) => {
                        self.pending.drain(..pos + self.markers.close.len());
                        self.in_span = false;
                    }
                    None => {
                        let keep = self.markers.close.chars().count().saturating_sub(1);
                        let cut = tail_start(&self.pending, keep);
                        self.pending.drain(..cut);
                        return visible;
                    }
                }
            } else {
                match self.pending.find(self.markers.open.as_str()) {
                    Some(pos) => {
                        visible.push_str(&self.pending[..pos]);
                        self.pending.drain(..pos + self.markers.open.len());
                        self.in_span = true;
                    }
                    None => {
                        let keep = self.markers.open.chars().count().saturating_sub(1);
                        let cut = tail_start(&self.pending, keep);
                        visible.push_str(&self.pending[..cut]);
                        self.pending.drain(..cut);
                        return visible;
                    }
                }
            }
        }
    }

    /// Flush at end of stream.
    ///
    /// An unterminated span swallows whatever is left. Outside a span the
    /// held-back text is released, minus a trailing partial opening marker.
    pub fn finalize(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        if self.in_span {
            return String::new();
        }

        let cut = partial_marker_start(&rest, &self.markers.open);
        rest[..cut].to_string()
    }
}

/// Byte index where the last `chars` characters of `s` begin.
fn tail_start(s: &str, chars: usize) -> usize {
    if chars == 0 {
        return s.len();
    }
    s.char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte index of the longest suffix of `s` that is a proper prefix of `marker`,
/// or `s.len()` if there is none.
fn partial_marker_start(s: &str, marker: &str) -> usize {
    s.char_indices()
        .map(|(i, _)| i)
        .find(|&i| {
            let suffix = &s[i..];
            suffix.len() < marker.len() && marker.starts_with(suffix)
        })
        .unwrap_or(s.len())
}

struct FilterState {
    inner: TokenStream,
    filter: ThinkingFilter,
    finished: bool,
}

/// Wrap a token stream so that thinking spans never reach the consumer.
///
/// Empty fragments are dropped. A stream error is forwarded and ends the
/// stream without a final flush.
pub fn strip_thinking(tokens: TokenStream, markers: ThinkingMarkers) -> TokenStream {
    let state = FilterState {
        inner: tokens,
        filter: ThinkingFilter::new(markers),
        finished: false,
    };

    let stream = futures::stream::unfold(state, |mut st| async move {
        if st.finished {
            return None;
        }
        loop {
            match st.inner.next().await {
                Some(Ok(raw)) => {
                    let visible = st.filter.filter(&raw);
                    if !visible.is_empty() {
                        return Some((Ok(visible), st));
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.finished = true;
                    let tail = st.filter.finalize();
                    if tail.is_empty() {
                        return None;
                    }
                    return Some((Ok(tail), st));
                }
            }
        }
    });

    Box::pin(stream)
}
