use std::{path::Path, time::Duration};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{QuizreelError, Result};

/// Longest text the translate endpoint accepts in one request.
pub const MAX_CHUNK_CHARS: usize = 100;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` in `language` and write compressed audio to `out_path`.
    async fn synthesize(&self, text: &str, language: &str, out_path: &Path) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    GoogleTranslate { tld: String },
    /// Any endpoint speaking the same query protocol (self-hosted proxies, tests).
    Custom { url: String },
}

impl Default for TtsProvider {
    fn default() -> Self {
        TtsProvider::GoogleTranslate {
            tld: "com".to_string(),
        }
    }
}

pub struct ProviderConfig {
    pub api_url: String,
    pub client: &'static str,
}

impl TtsProvider {
    pub const ENV_URL: &'static str = "QUIZREEL_TTS_URL";

    pub fn config(&self) -> ProviderConfig {
        match self {
            TtsProvider::GoogleTranslate { tld } => ProviderConfig {
                api_url: format!("https://translate.google.{tld}/translate_tts"),
                client: "tw-ob",
            },
            TtsProvider::Custom { url } => ProviderConfig {
                api_url: url.clone(),
                client: "tw-ob",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TtsProvider::GoogleTranslate { .. } => "Google Translate",
            TtsProvider::Custom { .. } => "custom endpoint",
        }
    }

    /// Custom endpoint from `QUIZREEL_TTS_URL` when set, Google Translate otherwise.
    pub fn from_env(tld: &str) -> Self {
        match std::env::var(Self::ENV_URL) {
            Ok(url) if !url.trim().is_empty() => TtsProvider::Custom {
                url: url.trim().to_string(),
            },
            _ => TtsProvider::GoogleTranslate {
                tld: tld.to_string(),
            },
        }
    }
}

/// Accepts `en`, `gu`, `zh-CN`, `pt-BR` and similar tags.
pub fn is_valid_language(code: &str) -> bool {
    let mut parts = code.split('-');
    let primary = parts.next().unwrap_or_default();
    let primary_ok =
        (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    let rest_ok =
        parts.all(|p| (2..=4).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()));
    primary_ok && rest_ok
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ';' | ':' | '\n' | '।' | '。')
}

/// Split `text` into request-sized pieces: sentence boundaries first, then
/// whole words, then hard splits for words longer than `max_chars`.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if is_sentence_end(c) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    sentences.push(current);

    let mut chunks = Vec::new();
    for sentence in sentences {
        let mut chunk = String::new();
        for word in sentence.split_whitespace() {
            let word_len = word.chars().count();
            let chunk_len = chunk.chars().count();

            if word_len > max_chars {
                if !chunk.is_empty() {
                    chunks.push(std::mem::take(&mut chunk));
                }
                let letters: Vec<char> = word.chars().collect();
                for piece in letters.chunks(max_chars) {
                    chunks.push(piece.iter().collect());
                }
                continue;
            }

            if chunk.is_empty() {
                chunk.push_str(word);
            } else if chunk_len + 1 + word_len <= max_chars {
                chunk.push(' ');
                chunk.push_str(word);
            } else {
                chunks.push(std::mem::replace(&mut chunk, word.to_string()));
            }
        }
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
    }

    chunks
}

/// Speech through the Google Translate TTS endpoint (the protocol gTTS uses).
pub struct GoogleTts {
    client: reqwest::Client,
    provider: TtsProvider,
}

impl GoogleTts {
    pub fn new(provider: TtsProvider, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("Mozilla/5.0 (quizreel)");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            provider,
        })
    }

    pub fn provider(&self) -> &TtsProvider {
        &self.provider
    }

    async fn fetch_chunk(
        &self,
        text: &str,
        chunk: &str,
        language: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>> {
        let config = self.provider.config();
        let failed = |reason: String| QuizreelError::SynthesisFailed {
            text: text.to_string(),
            reason,
        };

        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&config.api_url)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", language),
                ("client", config.client),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    failed(format!("{} timed out: {e}", self.provider.name()))
                } else {
                    failed(format!("{} request failed: {e}", self.provider.name()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!(
                "{} returned HTTP {}",
                self.provider.name(),
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| failed(format!("reading audio body: {e}")))?;
        if body.is_empty() {
            return Err(failed(format!("{} returned no audio", self.provider.name())));
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language: &str, out_path: &Path) -> Result<()> {
        if !is_valid_language(language) {
            return Err(QuizreelError::UnsupportedLanguage {
                language: language.to_string(),
            });
        }

        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(QuizreelError::SynthesisFailed {
                text: text.to_string(),
                reason: "nothing to speak".to_string(),
            });
        }

        // MP3 frames concatenate into a playable stream.
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self
                .fetch_chunk(text, chunk, language, idx, chunks.len())
                .await?;
            audio.extend_from_slice(&bytes);
        }

        fs::write(out_path, &audio).await?;
        Ok(())
    }
}
