//! LanguageTool client for the grammar check
//!
//! The engine calls [`GrammarChecker::check`] from inside the blocking audit
//! task, so this uses reqwest's blocking client. The client is built on
//! first use, on that blocking thread.

use std::sync::OnceLock;
use std::time::Duration;

use accessibility_engine::{GrammarChecker, GrammarError, GrammarMatch};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_LANGUAGETOOL_URL: &str = "https://api.languagetool.org/v2/check";

pub struct LanguageToolClient {
    url: String,
    timeout_ms: u64,
    client: OnceLock<Client>,
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<ToolMatch>,
}

#[derive(Deserialize)]
struct ToolMatch {
    message: String,
    #[serde(default)]
    replacements: Vec<Replacement>,
}

#[derive(Deserialize)]
struct Replacement {
    value: String,
}

impl LanguageToolClient {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<&Client, GrammarError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| GrammarError::Request(e.to_string()))?;
        Ok(self.client.get_or_init(|| client))
    }

    fn request_error(&self, err: reqwest::Error) -> GrammarError {
        if err.is_timeout() {
            GrammarError::Timeout(self.timeout_ms)
        } else {
            GrammarError::Request(err.to_string())
        }
    }
}

impl GrammarChecker for LanguageToolClient {
    fn check(&self, text: &str, language: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
        debug!("Grammar check: {} chars, language={}", text.len(), language);

        let response = self
            .client()?
            .post(&self.url)
            .form(&[("text", text), ("language", language)])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.request_error(e))?;

        let body: CheckResponse = response
            .json()
            .map_err(|e| GrammarError::InvalidResponse(e.to_string()))?;

        Ok(body
            .matches
            .into_iter()
            .map(|m| {
                GrammarMatch::new(m.message)
                    .with_replacements(m.replacements.into_iter().map(|r| r.value).collect())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_languagetool_response() {
        let body = r#"{
            "software": {"name": "LanguageTool"},
            "matches": [
                {
                    "message": "Possible spelling mistake found.",
                    "replacements": [{"value": "their"}, {"value": "there"}],
                    "offset": 0,
                    "length": 5
                },
                {"message": "Missing comma."}
            ]
        }"#;
        let parsed: CheckResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.matches.len(), 2);
        assert_eq!(parsed.matches[0].replacements[1].value, "there");
        assert!(parsed.matches[1].replacements.is_empty());
    }

    #[test]
    fn test_unreachable_service_is_an_error() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let client = LanguageToolClient::new("http://127.0.0.1:9/v2/check", 500);
        let issues = accessibility_engine::grammar::check_grammar(&client, "Some text.", "en-US");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Grammar/Spelling check failed:"));
    }
}
