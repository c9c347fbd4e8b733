//! HTTP generation providers.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use docqa_core::{AppError, AppResult};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;

struct LineState<S> {
    inner: S,
    pending: Vec<u8>,
    ready: VecDeque<AppResult<String>>,
    finished: bool,
}

/// Re-slice a byte stream into trimmed, non-empty text lines.
///
/// Network chunks may end mid-line or mid-character, so bytes are held
/// until a newline arrives. A trailing line without newline is flushed at
/// end of stream. A transport error is yielded once and ends the stream.
pub(crate) fn split_lines<S, B, E>(bytes: S) -> impl Stream<Item = AppResult<String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    let state = LineState {
        inner: Box::pin(bytes),
        pending: Vec::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    st.pending.extend_from_slice(chunk.as_ref());
                    while let Some(pos) = st.pending.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = st.pending.drain(..=pos).collect();
                        push_line(&mut st.ready, &line);
                    }
                }
                Some(Err(e)) => {
                    st.ready
                        .push_back(Err(AppError::Llm(format!("Stream error: {}", e))));
                    st.finished = true;
                }
                None => {
                    let rest = std::mem::take(&mut st.pending);
                    push_line(&mut st.ready, &rest);
                    st.finished = true;
                }
            }
        }
    })
}

fn push_line(ready: &mut VecDeque<AppResult<String>>, raw: &[u8]) {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim();
    if !line.is_empty() {
        ready.push_back(Ok(line.to_string()));
    }
}
