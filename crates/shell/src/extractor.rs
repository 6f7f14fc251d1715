//! Text-to-transaction extractor.
//!
//! An opaque classifier service: free text in, structured transactions
//! out. The request pins a JSON response schema so the reply is directly
//! parseable; everything that can go wrong is surfaced as a descriptive
//! [`ExtractError`] and the caller keeps its input text for retry.

use ledger::{CurrencyCode, NewTransaction, TransactionKind};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

const GENERATE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const INSTRUCTION: &str = "You are an expert accountant. Extract the financial \
transactions from unstructured chat text.\n\
- Identify the currency as a short code (for example USD, TRY, SYP, EUR).\n\
- Identify the amount as a number.\n\
- Classify the type: INCOMING for money received by or owed to the user, \
OUTGOING for money sent, spent or owed by the user.\n\
- Add a short description per transaction.\n\
- Return strictly a JSON array.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extractor API key is missing; set it in the configuration")]
    MissingCredential,
    #[error("extractor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("extractor rejected the request ({status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("extractor returned a malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireTransaction {
    currency: String,
    amount: f64,
    #[serde(rename = "type")]
    kind: String,
    description: String,
}

#[derive(Debug, Clone)]
pub struct Extractor {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl Extractor {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
        }
    }

    /// Classifies `text` into draft transactions (no ids assigned yet).
    pub async fn extract(&self, text: &str) -> Result<Vec<NewTransaction>, ExtractError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ExtractError::MissingCredential)?;

        let body = json!({
            "systemInstruction": { "parts": [{ "text": INSTRUCTION }] },
            "contents": [{
                "parts": [{
                    "text": format!("Extract the transactions from this chat text:\n\n\"{text}\"")
                }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "currency": {
                                "type": "STRING",
                                "description": "Short currency code (USD, TRY, SYP, ...)"
                            },
                            "amount": { "type": "NUMBER" },
                            "type": { "type": "STRING", "enum": ["INCOMING", "OUTGOING"] },
                            "description": { "type": "STRING" }
                        },
                        "required": ["currency", "amount", "type", "description"]
                    }
                }
            }
        });

        let response = self
            .http
            .post(format!("{GENERATE_BASE_URL}/{}:generateContent", self.model))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ExtractError::Api { status, message });
        }

        let response = response
            .json::<GenerateResponse>()
            .await
            .map_err(|err| ExtractError::Malformed(err.to_string()))?;

        let payload = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.trim().to_string())
            .ok_or_else(|| ExtractError::Malformed("response carries no content".to_string()))?;

        parse_payload(&payload)
    }
}

fn parse_payload(payload: &str) -> Result<Vec<NewTransaction>, ExtractError> {
    let wire: Vec<WireTransaction> = serde_json::from_str(payload)
        .map_err(|err| ExtractError::Malformed(format!("invalid JSON payload: {err}")))?;

    wire.into_iter()
        .map(|item| {
            let kind = TransactionKind::try_from(item.kind.as_str())
                .map_err(|err| ExtractError::Malformed(err.to_string()))?;
            let currency = CurrencyCode::try_from(item.currency.as_str())
                .map_err(|err| ExtractError::Malformed(err.to_string()))?;
            NewTransaction::new(kind, item.amount, currency, item.description)
                .map_err(|err| ExtractError::Malformed(err.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let extractor = Extractor::new(None, DEFAULT_MODEL);
        let err = extractor.extract("ahmad sent me 500 TRY").await;
        assert!(matches!(err, Err(ExtractError::MissingCredential)));

        let extractor = Extractor::new(Some("   ".to_string()), DEFAULT_MODEL);
        let err = extractor.extract("ahmad sent me 500 TRY").await;
        assert!(matches!(err, Err(ExtractError::MissingCredential)));
    }

    #[test]
    fn parses_a_schema_conforming_payload() {
        let payload = r#"[
            {"currency": "TRY", "amount": 500, "type": "INCOMING", "description": "from Ahmad"},
            {"currency": "usd", "amount": 20.5, "type": "OUTGOING", "description": "taxi"}
        ]"#;

        let drafts = parse_payload(payload).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].kind, TransactionKind::Incoming);
        assert_eq!(drafts[0].amount, 500.0);
        assert_eq!(drafts[1].currency.as_str(), "USD");
    }

    #[test]
    fn malformed_payloads_are_descriptive_errors() {
        assert!(matches!(
            parse_payload("not json"),
            Err(ExtractError::Malformed(_))
        ));
        assert!(matches!(
            parse_payload(r#"[{"currency": "USD", "amount": -5, "type": "INCOMING", "description": ""}]"#),
            Err(ExtractError::Malformed(_))
        ));
        assert!(matches!(
            parse_payload(r#"[{"currency": "USD", "amount": 5, "type": "SIDEWAYS", "description": ""}]"#),
            Err(ExtractError::Malformed(_))
        ));
    }
}
