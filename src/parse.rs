//! Natural-language expense parsing backed by a language model.
//!
//! The endpoint turns free text like "45 bucks of fuel at Shell yesterday"
//! into a structured expense draft. Nothing is saved, the client shows the
//! draft for review and submits it through the normal create endpoint.

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    db::with_lock_retry,
    tag::get_all_tags,
    user::User,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;

/// The JSON body for the parse endpoint.
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    /// Free-text description of an expense.
    pub text: String,
}

/// A structured expense draft extracted from free text.
///
/// Mirrors the create-expense body so the client can submit it unchanged.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedExpense {
    /// The date of the expense in YYYY-MM-DD, today when the text does not
    /// say.
    pub date: String,
    /// What the expense was for.
    pub description: String,
    /// Who was paid.
    pub recipient: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The portion of the amount spent on materials, when mentioned.
    pub materials: Option<f64>,
    /// Hours of labour, when mentioned.
    pub hours: Option<f64>,
    /// Suggested tags, drawn from the user's existing tags where possible.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// A route handler for parsing free text into an expense draft.
///
/// # Errors
/// Responds 502 if no API key is configured or the model cannot be reached,
/// and 422 if the model's reply is not a usable expense.
pub async fn parse_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ParseRequest>,
) -> Result<impl IntoResponse, Error> {
    let api_key = state
        .anthropic_api_key
        .clone()
        .ok_or_else(|| Error::LlmUnavailable("no API key configured".to_owned()))?;

    let user_id = user.id;
    let tags = with_lock_retry(&state.db_connection, move |connection| {
        get_all_tags(user_id, connection)
    })
    .await?;
    let tag_names: Vec<&str> = tags.iter().map(|tag| tag.name.as_ref()).collect();

    let prompt = build_prompt(&body.text, &user, &tag_names);

    let response = state
        .http_client
        .post(ANTHROPIC_API_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&json!({
            "model": MODEL,
            "max_tokens": MAX_TOKENS,
            "messages": [{"role": "user", "content": prompt}],
        }))
        .send()
        .await
        .map_err(|error| Error::LlmUnavailable(error.to_string()))?
        .error_for_status()
        .map_err(|error| Error::LlmUnavailable(error.to_string()))?
        .json::<MessagesResponse>()
        .await
        .map_err(|error| Error::LlmUnavailable(error.to_string()))?;

    let reply = response
        .content
        .first()
        .map(|block| block.text.as_str())
        .unwrap_or_default();

    let parsed = parse_reply(reply)?;

    Ok(Json(parsed))
}

fn build_prompt(text: &str, user: &User, tag_names: &[&str]) -> String {
    let today = OffsetDateTime::now_utc().date();
    let mut prompt = format!(
        "Extract a single expense from the text below. Reply with only a JSON \
        object with the keys date (YYYY-MM-DD, today is {today}), description, \
        recipient, amount (number), materials (number or null), hours (number \
        or null) and tags (array of strings).\n"
    );

    if !tag_names.is_empty() {
        prompt.push_str(&format!(
            "Prefer these existing tags where they fit: {}.\n",
            tag_names.join(", ")
        ));
    }

    if let Some(context) = &user.expense_context {
        prompt.push_str(&format!("About the user: {context}\n"));
    }

    prompt.push_str(&format!("\nText: {text}"));

    prompt
}

/// Parse the model's reply, tolerating a Markdown code fence around the JSON.
fn parse_reply(reply: &str) -> Result<ParsedExpense, Error> {
    let stripped = strip_code_fence(reply);

    let parsed: ParsedExpense = serde_json::from_str(stripped)
        .map_err(|error| Error::InvalidLlmReply(error.to_string()))?;

    if parsed.amount <= 0.0 {
        return Err(Error::InvalidLlmReply(format!(
            "amount must be positive, got {}",
            parsed.amount
        )));
    }

    Ok(parsed)
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();

    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // The opening fence may carry a language tag, e.g. ```json.
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim().strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{parse_reply, strip_code_fence};

    const REPLY: &str = r#"{"date": "2026-01-15", "description": "Fuel", "recipient": "Shell", "amount": 45.0, "materials": null, "hours": null, "tags": ["Fuel"]}"#;

    #[test]
    fn parses_a_bare_json_reply() {
        let parsed = parse_reply(REPLY).expect("Could not parse reply");

        assert_eq!(parsed.description, "Fuel");
        assert_eq!(parsed.amount, 45.0);
        assert_eq!(parsed.tags, vec!["Fuel".to_owned()]);
    }

    #[test]
    fn parses_a_fenced_reply() {
        let fenced = format!("```json\n{REPLY}\n```");

        let parsed = parse_reply(&fenced).expect("Could not parse fenced reply");

        assert_eq!(parsed.recipient, "Shell");
    }

    #[test]
    fn strip_code_fence_handles_fences_without_language_tags() {
        let fenced = format!("```\n{REPLY}\n```");

        assert_eq!(strip_code_fence(&fenced), REPLY);
    }

    #[test]
    fn prose_replies_are_rejected() {
        let result = parse_reply("Sorry, I could not find an expense in that text.");

        assert!(matches!(result, Err(Error::InvalidLlmReply(_))));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let reply = r#"{"date": "2026-01-15", "description": "Fuel", "recipient": "Shell", "amount": 0.0, "materials": null, "hours": null, "tags": []}"#;

        let result = parse_reply(reply);

        assert!(matches!(result, Err(Error::InvalidLlmReply(_))));
    }

    #[tokio::test]
    async fn endpoint_reports_unavailable_without_an_api_key() {
        let (server, token, _) = crate::test_utils::test_server_with_user().await;

        let response = server
            .post("/api/parse")
            .authorization_bearer(&token)
            .json(&serde_json::json!({"text": "45 bucks of fuel at Shell"}))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    }
}
