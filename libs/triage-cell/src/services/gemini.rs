use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::error::TriageError;
use crate::services::classifier::{ClassificationRequest, ClassifierOutput, TriageClassifier};
use crate::severity::SeverityRank;

const MALARIA_PROMPT: &str = r#"You are a medical AI assistant specializing in Malaria symptom evaluation.

SEVERITY CLASSIFICATION CRITERIA (Follow these rules strictly):

**Low Severity** - Use when:
- No fever OR very mild fever (< 38°C)
- Minimal or no other symptoms
- No travel to malaria-endemic areas
- Symptoms could be from other minor illnesses
- Patient is generally well

**Mild Severity** - Use when:
- Fever present (38-39°C) for 1-3 days
- Some additional symptoms (headache, body weakness, chills)
- Travel to malaria-endemic area OR exposure risk
- Symptoms suggest possible malaria but not life-threatening
- Patient can function but needs medical evaluation

**Severe Severity** - Use when:
- High fever (>39°C) for 3+ days
- Multiple severe symptoms (severe weakness, persistent vomiting, confusion)
- Signs of complications (difficulty breathing, jaundice, severe anemia)
- Patient unable to eat/drink or perform daily activities
- Immediate medical intervention required

STRICT OUTPUT REQUIREMENTS:
Respond with ONLY a valid JSON object:

{
  "suggestedDiagnosis": "string",
  "severityRank": "Low | Mild | Severe",
  "managementTips": ["string"],
  "reasoning": "string"
}

RULES:
- Same symptoms must always give the same severity rank
- Fever with no duration or severity given defaults to "Mild"
- Fever with travel history is at least "Mild"
- Never provide a definitive diagnosis; always recommend professional evaluation"#;

/// Diseases with a screening prompt, by display name.
const DISEASE_PROMPTS: &[(&str, &str)] = &[("Malaria", MALARIA_PROMPT)];

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedAssessment {
    suggested_diagnosis: Option<String>,
    severity_rank: Option<String>,
    management_tips: Option<Vec<String>>,
    reasoning: Option<String>,
}

/// Gemini `generateContent` client.
pub struct GeminiClassifier {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClassifier {
    pub fn new(config: &AppConfig) -> Self {
        if !config.is_triage_configured() {
            warn!("GEMINI_API_KEY not set; triage requests will be rejected");
        }
        info!("Using Gemini model: {}", config.gemini_model);

        Self {
            client: Client::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, prompt: String) -> Result<String, TriageError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.0,
                "topK": 1,
                "topP": 0.1,
                "maxOutputTokens": 1024,
                "responseMimeType": "application/json"
            }
        });

        let url = self.endpoint();
        debug!("Sending classification request to: {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Gemini API error: {} - {}", status, response_text);
            let message = serde_json::from_str::<GeminiErrorBody>(&response_text)
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(TriageError::ClassifierUnavailable(message));
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            TriageError::ClassifierUnavailable(format!("Failed to parse AI response: {}", e))
        })?;

        let text = parsed
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts)
            .and_then(|parts| parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                error!("Empty AI response: {}", response_text);
                TriageError::ClassifierUnavailable("AI service returned empty response".to_string())
            })?;

        debug!("Raw AI response: {}", text);
        Ok(text)
    }
}

#[async_trait]
impl TriageClassifier for GeminiClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<ClassifierOutput, TriageError> {
        info!("Generating assessment for disease: {}", request.disease);

        if self.api_key.is_empty() {
            return Err(TriageError::ClassifierNotConfigured);
        }

        let system_prompt = system_prompt(&request.disease)?;
        let prompt = format!(
            "{}\n\n---\n\n{}\n\nIMPORTANT: Return ONLY valid JSON. No markdown, no code blocks, no explanations. Just the raw JSON object.",
            system_prompt,
            user_prompt(request)
        );

        let text = self.generate(prompt).await?;
        Ok(parse_assessment(&text))
    }

    fn model_version(&self) -> String {
        self.model.clone()
    }
}

pub fn system_prompt(disease: &str) -> Result<&'static str, TriageError> {
    DISEASE_PROMPTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(disease.trim()))
        .map(|(_, prompt)| *prompt)
        .ok_or_else(|| TriageError::UnsupportedDisease {
            disease: disease.to_string(),
            supported: DISEASE_PROMPTS
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

fn user_prompt(request: &ClassificationRequest) -> String {
    let answers = serde_json::to_string_pretty(&request.symptoms).unwrap_or_default();
    let mut prompt = format!(
        "The following are patient's answers to your {} screening questions.\nAnalyze and complete the required JSON response:\n\n{}",
        request.disease, answers
    );
    if let Some(notes) = request.additional_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        prompt.push_str("\n\nAdditional Context:\n");
        prompt.push_str(notes);
    }
    prompt
}

/// Strips markdown fences and anything outside the outermost JSON object.
pub fn clean_response(raw: &str) -> String {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let mut cleaned = raw.trim().to_string();

    if let Some(fence) = FENCE.get_or_init(|| Regex::new(r"(?i)```(?:json)?\s*").ok()).as_ref() {
        cleaned = fence.replace_all(&cleaned, "").trim().to_string();
    }

    if let Some(start) = cleaned.find('{') {
        cleaned = cleaned[start..].to_string();
    }
    if let Some(end) = cleaned.rfind('}') {
        cleaned.truncate(end + 1);
    }
    cleaned
}

/// Parses the model's text into an assessment, filling missing fields and
/// falling back to a fixed assessment when the text is not JSON.
pub fn parse_assessment(raw: &str) -> ClassifierOutput {
    let cleaned = clean_response(raw);
    debug!("Cleaned response: {}", cleaned);

    let parsed: ParsedAssessment = match serde_json::from_str(&cleaned) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("JSON parse error: {}", e);
            return fallback_assessment();
        }
    };

    ClassifierOutput {
        suggested_diagnosis: parsed
            .suggested_diagnosis
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unable to determine diagnosis from symptoms provided".to_string()),
        severity_rank: SeverityRank::from_label(parsed.severity_rank.as_deref()),
        management_tips: parsed
            .management_tips
            .unwrap_or_else(|| vec!["Consult a healthcare professional for proper evaluation".to_string()]),
        reasoning: parsed
            .reasoning
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                "AI analysis was inconclusive. Medical consultation recommended.".to_string()
            }),
    }
}

pub fn fallback_assessment() -> ClassifierOutput {
    warn!("Returning fallback assessment due to parsing failure");
    ClassifierOutput {
        suggested_diagnosis:
            "Unable to generate AI diagnosis. Please consult a healthcare professional.".to_string(),
        severity_rank: SeverityRank::Mild,
        management_tips: vec![
            "Seek immediate medical attention for proper evaluation".to_string(),
            "Do not self-diagnose or self-medicate".to_string(),
            "Provide complete symptom information to your doctor".to_string(),
        ],
        reasoning: "AI analysis could not be completed. Professional medical evaluation is strongly recommended."
            .to_string(),
    }
}
