use crate::config::Settings;
use crate::llm::error::ExplainerDiagnosticsError;
use crate::llm::json;
use crate::llm::{ExplainInput, Explainer, ExplainerOutput, Explanations};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://gms.ssafy.io/gmsapi/api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Reported to callers as the model identifier of explained responses.
pub const PROMPT_VERSION: &str = "reco-rank-explain-v3-dozip";

const PROVIDER: &str = "gms";

/// Explainer backed by an OpenAI Responses-compatible gateway.
#[derive(Debug, Clone)]
pub struct GmsExplainer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GmsExplainer {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gms_key()?.to_string();
        let base_url =
            std::env::var("GMS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GMS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.explainer_timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    async fn create_response(&self, req: CreateResponseRequest) -> anyhow::Result<ResponsesResponse> {
        let url = format!("{}/responses", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("explainer request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read explainer response body")?;
        if !status.is_success() {
            tracing::debug!(%status, body = %text, "explainer gateway rejected request");
            return Err(http_status_error(status).into());
        }

        serde_json::from_str::<ResponsesResponse>(&text)
            .with_context(|| format!("failed to parse explainer response JSON: {text}"))
    }

    fn response_text(res: &ResponsesResponse) -> String {
        if let Some(text) = res.output_text.as_deref().map(str::trim) {
            if !text.is_empty() {
                return text.to_string();
            }
        }

        let mut parts = Vec::new();
        for item in &res.output {
            for content in &item.content {
                if content.kind == "output_text" {
                    parts.push(content.text.as_str());
                }
            }
        }
        parts.join("\n").trim().to_string()
    }

    fn prompt(input: &ExplainInput<'_>) -> anyhow::Result<String> {
        let schema = serde_json::json!({
            "model_name": "string",
            "results": [{
                "propertyId": "int",
                "aiScore": "number (0~100)",
                "aiJudgeCode": "string (STRONG_RECO|RECO|CAUTION|WEAK_RECO)",
                "aiSummary": "string (2~3문장)",
                "aiReasons": ["string (4~6개)"],
                "aiWarnings": ["string (0~2개)"],
                "aiBreakdown": {
                    "dist": "number(0~1)",
                    "price": "number(0~1)",
                    "area": "number(0~1)",
                    "rating": "number(0~1)",
                    "trend": "number(0~1)"
                }
            }],
            "meta": {"tone": "dozip-friendly", "notes": "string"}
        });

        let rules = [
            "너는 ToTheZip 서비스의 안내자 '두집이'야. 존댓말로 친절하고 자연스럽게 설명해.",
            "데이터에 없는 사실은 만들지 말고, 과장하거나 단정하지 마.",
            "JSON만 출력해. 코드블록이나 설명문은 붙이지 마.",
            "aiSummary는 2~3문장으로, 이 매물이 괜찮은 이유와 주의할 점을 함께 담아.",
            "aiReasons는 4~6개. 점수 이름을 나열하지 말고 기준 매물과 비교해서 사용자 입장에서 풀어 써.",
            "trend(UP/DOWN/FLAT/UNKNOWN)는 의미를 풀어서 설명해.",
            "rating이 없으면 후기 데이터가 부족하다고 말해.",
            "candidates에 있는 propertyId만 사용하고, 숫자를 바꾸지 마.",
        ];

        let payload =
            serde_json::to_string(input).context("failed to serialize explainer payload")?;

        Ok(format!(
            "출력 JSON 스키마(반드시 준수):\n{schema}\n\n작성 규칙:\n- {}\n\n입력 데이터(JSON):\n{payload}",
            rules.join("\n- ")
        ))
    }
}

#[async_trait::async_trait]
impl Explainer for GmsExplainer {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn explain(&self, input: &ExplainInput<'_>) -> anyhow::Result<ExplainerOutput> {
        let req = CreateResponseRequest {
            model: self.model.clone(),
            input: Self::prompt(input)?,
        };

        let res = self.create_response(req).await?;
        let text = Self::response_text(&res);

        let parsed = json::parse_explanations(&text).map_err(|err| ExplainerDiagnosticsError {
            provider: PROVIDER,
            stage: "parse",
            detail: format!("{err:#}"),
            raw_output: Some(text.clone()),
        })?;

        tracing::debug!(
            model = %self.model,
            model_name = parsed.model_name.as_deref().unwrap_or("-"),
            results_len = parsed.results.len(),
            "explainer responded"
        );

        Ok(ExplainerOutput::Enabled(Explanations {
            model: PROMPT_VERSION.to_string(),
            results: parsed.results,
        }))
    }
}

/// A gateway error body is not model output, so it never becomes the response's `raw`.
pub(crate) fn http_status_error(status: reqwest::StatusCode) -> ExplainerDiagnosticsError {
    ExplainerDiagnosticsError {
        provider: PROVIDER,
        stage: "http",
        detail: format!("status={status}"),
        raw_output: None,
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateResponseRequest {
    model: String,
    input: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}
