//! Paced output of answer text.
//!
//! Text is emitted word by word (or letter by letter) at a configured
//! words-per-minute rate, pausing longer after punctuation and line breaks.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;
use std::time::Duration;

use edgar_core::config::StreamingConfig;
use regex::Regex;

use crate::error::ChatError;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+\s*").expect("Invalid token regex"));

/// Letter mode runs this many times faster than word mode.
const LETTERS_PER_WORD: f64 = 5.0;

/// One emitted piece of text and the pause that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub delay: Duration,
}

/// Paces text toward a sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStreamer {
    pub wpm: u32,
    pub letter_mode: bool,
    pub speed_limit: bool,
}

impl Default for TextStreamer {
    fn default() -> Self {
        Self::from_config(&StreamingConfig::default())
    }
}

impl TextStreamer {
    pub fn from_config(config: &StreamingConfig) -> Self {
        Self {
            wpm: config.wpm,
            letter_mode: config.letter_mode,
            speed_limit: config.speed_limit,
        }
    }

    /// Same settings at a different rate, e.g. for supplementary output.
    pub fn with_wpm(self, wpm: u32) -> Self {
        Self { wpm, ..self }
    }

    /// Whether output is emitted in one piece without pauses.
    pub fn is_instant(&self) -> bool {
        self.wpm == 0 || !self.speed_limit
    }

    /// Chunk and delay schedule for `text`, without the prefix or the
    /// trailing newline.
    pub fn plan(&self, text: &str) -> Vec<Chunk> {
        if self.is_instant() {
            return vec![Chunk {
                text: text.to_string(),
                delay: Duration::ZERO,
            }];
        }

        let per_word = 60.0 / f64::from(self.wpm);
        if self.letter_mode {
            let per_letter = per_word / LETTERS_PER_WORD;
            text.chars()
                .map(|c| {
                    let piece = c.to_string();
                    let delay = per_letter * pause_multiplier(&piece);
                    Chunk {
                        text: piece,
                        delay: Duration::from_secs_f64(delay),
                    }
                })
                .collect()
        } else {
            TOKEN_RE
                .find_iter(text)
                .map(|m| Chunk {
                    text: m.as_str().to_string(),
                    delay: Duration::from_secs_f64(per_word * pause_multiplier(m.as_str())),
                })
                .collect()
        }
    }

    /// Emit `prefix` then `text` into `sink`, sleeping between chunks.
    ///
    /// `cancel` is checked before each chunk; a cancelled stream returns
    /// what was emitted so far without the trailing newline.
    pub async fn stream(
        &self,
        text: &str,
        prefix: &str,
        sink: &mut dyn FnMut(&str),
        cancel: &AtomicBool,
    ) -> String {
        let mut output = String::with_capacity(prefix.len() + text.len() + 1);

        if self.is_instant() {
            output.push_str(prefix);
            output.push_str(text);
            sink(&output);
            return output;
        }

        if !prefix.is_empty() {
            sink(prefix);
            output.push_str(prefix);
        }

        for chunk in self.plan(text) {
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!(emitted = output.len(), "Stream cancelled");
                return output;
            }
            sink(&chunk.text);
            output.push_str(&chunk.text);
            if !chunk.delay.is_zero() {
                tokio::time::sleep(chunk.delay).await;
            }
        }

        if !output.ends_with('\n') {
            sink("\n");
            output.push('\n');
        }
        output
    }

    /// Stream into a writer, flushing after every chunk.
    pub async fn stream_to<W: Write>(
        &self,
        text: &str,
        prefix: &str,
        writer: &mut W,
        cancel: &AtomicBool,
    ) -> Result<String, ChatError> {
        let mut failure: Option<std::io::Error> = None;
        let output = {
            let mut sink = |piece: &str| {
                if failure.is_some() {
                    return;
                }
                if let Err(e) = writer.write_all(piece.as_bytes()).and_then(|_| writer.flush()) {
                    failure = Some(e);
                }
            };
            self.stream(text, prefix, &mut sink, cancel).await
        };
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(output),
        }
    }
}

/// Pause multiplier for a chunk: sentence and clause punctuation lengthen
/// the pause, and newlines stack on top.
fn pause_multiplier(piece: &str) -> f64 {
    let trimmed = piece.trim_end();
    let mut multiplier = if trimmed.ends_with(['.', '!', '?']) {
        1.8
    } else if trimmed.ends_with([',', ';', ':']) {
        1.3
    } else {
        1.0
    };

    let newlines = piece.matches('\n').count();
    if newlines > 0 {
        multiplier *= 1.5 + newlines as f64 * 0.5;
    }
    multiplier
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn streamer(wpm: u32) -> TextStreamer {
        TextStreamer {
            wpm,
            letter_mode: false,
            speed_limit: true,
        }
    }

    fn approx(d: Duration, secs: f64) -> bool {
        (d.as_secs_f64() - secs).abs() < 1e-6
    }

    // ---- plan ----

    #[test]
    fn test_plan_word_delays() {
        // 60 wpm -> 1s per word
        let plan = streamer(60).plan("Hi there, friend. Done!\nNext");
        let texts: Vec<&str> = plan.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi ", "there, ", "friend. ", "Done!\n", "Next"]);
        assert!(approx(plan[0].delay, 1.0));
        assert!(approx(plan[1].delay, 1.3));
        assert!(approx(plan[2].delay, 1.8));
        // punctuation and newline multipliers stack
        assert!(approx(plan[3].delay, 1.8 * 2.0));
        assert!(approx(plan[4].delay, 1.0));
    }

    #[test]
    fn test_plan_double_newline() {
        let plan = streamer(60).plan("end\n\nstart");
        assert!(approx(plan[0].delay, 2.5));
    }

    #[test]
    fn test_plan_letter_mode() {
        let s = TextStreamer {
            letter_mode: true,
            ..streamer(60)
        };
        let plan = s.plan("ab.");
        assert_eq!(plan.len(), 3);
        assert!(approx(plan[0].delay, 0.2));
        assert!(approx(plan[2].delay, 0.2 * 1.8));
    }

    #[test]
    fn test_plan_instant() {
        let plan = streamer(0).plan("all at once.");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].delay, Duration::ZERO);

        let unlimited = TextStreamer {
            speed_limit: false,
            ..streamer(300)
        };
        assert!(unlimited.is_instant());
        assert_eq!(unlimited.plan("a b c").len(), 1);
    }

    // ---- stream ----

    #[tokio::test]
    async fn test_stream_instant_emits_once() {
        let mut pieces = Vec::new();
        let out = streamer(0)
            .stream("Hello.", "Edgar: ", &mut |p: &str| pieces.push(p.to_string()), &AtomicBool::new(false))
            .await;
        assert_eq!(out, "Edgar: Hello.");
        assert_eq!(pieces, vec!["Edgar: Hello."]);
    }

    #[tokio::test]
    async fn test_stream_paced_appends_newline() {
        let mut pieces = Vec::new();
        let out = streamer(6000)
            .stream("one two", "> ", &mut |p: &str| pieces.push(p.to_string()), &AtomicBool::new(false))
            .await;
        assert_eq!(out, "> one two\n");
        assert_eq!(pieces, vec!["> ", "one ", "two", "\n"]);
    }

    #[tokio::test]
    async fn test_stream_cancelled_before_start() {
        let mut pieces = Vec::new();
        let out = streamer(6000)
            .stream("one two", "", &mut |p: &str| pieces.push(p.to_string()), &AtomicBool::new(true))
            .await;
        assert_eq!(out, "");
        assert!(pieces.is_empty());
    }

    #[tokio::test]
    async fn test_stream_to_writer() {
        let mut buf: Vec<u8> = Vec::new();
        let out = streamer(6000)
            .stream_to("hi there", "", &mut buf, &AtomicBool::new(false))
            .await
            .unwrap();
        assert_eq!(out, "hi there\n");
        assert_eq!(String::from_utf8(buf).unwrap(), "hi there\n");
    }
}
