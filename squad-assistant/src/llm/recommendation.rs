// Recommendation response model, parsing and validation.
//
// The model is asked for bare JSON, but responses sometimes arrive wrapped in
// markdown fences or with a sentence before the object. Parsing strips that,
// deserializes, then checks the shape before anything is shown.

use serde::{Deserialize, Serialize};

/// Players in a starting lineup.
pub const LINEUP_SIZE: usize = 11;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// No credential configured. Raised before any request is attempted.
    #[error("This feature is currently unavailable. The API key is not configured.")]
    Unavailable,

    /// The request was attempted and failed: transport, API status,
    /// malformed response, or schema violation.
    #[error("Failed to get squad recommendations: {reason}")]
    RequestFailed { reason: String },
}

impl GatewayError {
    pub fn failed(reason: impl Into<String>) -> Self {
        GatewayError::RequestFailed {
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub suggested_lineup: SuggestedLineup,
    #[serde(default)]
    pub upgrades: Vec<Upgrade>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedLineup {
    pub formation: String,
    pub players: Vec<LineupPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupPlayer {
    pub name: String,
    pub position: String,
    /// Models return ratings as either numbers or strings.
    #[serde(default, deserialize_with = "text_or_number")]
    pub rating: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub nation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub replace: String,
    pub with: UpgradeTarget,
    pub approximate_price: f64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTarget {
    pub name: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub nation: String,
    #[serde(default)]
    pub club: String,
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse and validate the model's full response text.
pub fn parse_recommendation(text: &str) -> Result<Recommendation, GatewayError> {
    let json = extract_json_object(text)
        .ok_or_else(|| GatewayError::failed("response contained no JSON object"))?;
    let recommendation: Recommendation = serde_json::from_str(json)
        .map_err(|e| GatewayError::failed(format!("malformed recommendation JSON: {e}")))?;
    validate(&recommendation)?;
    Ok(recommendation)
}

/// Drop a surrounding markdown code fence, if any.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") up to the end of the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// The outermost `{ ... }` span, found by brace matching that ignores braces
/// inside JSON strings.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let text = strip_code_fences(text);
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn validate(rec: &Recommendation) -> Result<(), GatewayError> {
    let lineup = &rec.suggested_lineup;
    if lineup.formation.trim().is_empty() {
        return Err(GatewayError::failed("lineup has no formation"));
    }
    if lineup.players.len() != LINEUP_SIZE {
        return Err(GatewayError::failed(format!(
            "lineup has {} players, expected {LINEUP_SIZE}",
            lineup.players.len()
        )));
    }
    if let Some(i) = lineup
        .players
        .iter()
        .position(|p| p.name.trim().is_empty() || p.position.trim().is_empty())
    {
        return Err(GatewayError::failed(format!(
            "lineup player {} is missing a name or position",
            i + 1
        )));
    }
    for (i, upgrade) in rec.upgrades.iter().enumerate() {
        if upgrade.replace.trim().is_empty() || upgrade.with.name.trim().is_empty() {
            return Err(GatewayError::failed(format!(
                "upgrade {} does not name both players",
                i + 1
            )));
        }
        if !upgrade.approximate_price.is_finite() || upgrade.approximate_price < 0.0 {
            return Err(GatewayError::failed(format!(
                "upgrade {} has an invalid price",
                i + 1
            )));
        }
    }
    Ok(())
}
