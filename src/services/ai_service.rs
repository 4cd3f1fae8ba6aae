use crate::models::{
    AtsReport, EXTRACTION_VERSION, ExtractedResumeData, FilledTemplate, SuggestionsReport,
};
use anyhow::{Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::ImageFormat;
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::info;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Render resolution for PDF pages, in DPI. High enough to keep body text
/// legible for the vision model.
const PDF_RENDER_DPI: u32 = 150;

const ATS_SYSTEM_PROMPT: &str = r#"You are an expert ATS (Applicant Tracking System) analyzer. Evaluate the resume shown in the attached images for ATS compatibility.

Score these criteria:
1. Contact Information (10 points): name, email, phone, LinkedIn/portfolio
2. Professional Summary (10 points): clear, concise summary or objective
3. Work Experience (25 points): relevant experience, quantified achievements, action verbs
4. Skills Section (15 points): relevant technical and soft skills, keywords
5. Education (10 points): degrees, certifications, relevant coursework
6. Formatting (15 points): clean layout, consistent fonts, no tables/graphics an ATS cannot read
7. Keywords (15 points): industry-relevant keywords and terminology

Respond with ONLY a valid JSON object in this exact format, no other text:
{
  "score": <number 0-100>,
  "breakdown": {
    "contact_info": <number 0-10>,
    "summary": <number 0-10>,
    "experience": <number 0-25>,
    "skills": <number 0-15>,
    "education": <number 0-10>,
    "formatting": <number 0-15>,
    "keywords": <number 0-15>
  },
  "strengths": ["..."],
  "improvements": ["..."],
  "missing_sections": ["..."]
}"#;

const SUGGESTIONS_SYSTEM_PROMPT: &str = r#"You are an expert resume coach. Analyze the resume shown in the attached images and give specific, actionable improvement suggestions: stronger action verbs, quantifiable achievements, missing information, sections to expand or trim, ATS keyword optimization, professional tone.

Respond with ONLY a valid JSON object:
{
  "suggestions": [
    {
      "category": "experience|skills|summary|formatting|other",
      "priority": "high|medium|low",
      "current": "what is currently there or missing",
      "suggested": "specific improvement",
      "example": "example of improved text if applicable"
    }
  ],
  "overall_impression": "brief overall assessment",
  "top_priority": "single most important thing to fix"
}"#;

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an expert resume parser. Extract ALL information from the resume shown in the attached images into structured JSON. If a field is not present, use an empty string or empty array.

Respond with ONLY a valid JSON object in this exact format:
{
  "contact": {"full_name": "", "email": "", "phone": "", "location": "", "linkedin": "", "github": "", "portfolio": "", "other_links": []},
  "summary": "",
  "work_experience": [{"job_title": "", "company": "", "location": "", "start_date": "", "end_date": "", "is_current": false, "description": "", "bullet_points": [], "technologies": []}],
  "education": [{"degree": "", "institution": "", "location": "", "start_date": "", "end_date": "", "gpa": "", "honors": [], "relevant_coursework": []}],
  "technical_skills": [],
  "soft_skills": [],
  "skills_by_category": {"Category Name": []},
  "projects": [{"name": "", "description": "", "technologies": [], "url": "", "bullet_points": [], "start_date": "", "end_date": ""}],
  "certifications": [{"name": "", "issuer": "", "date_obtained": "", "expiry_date": "", "credential_id": "", "url": ""}],
  "languages": [{"language": "", "proficiency": ""}],
  "publications": [],
  "awards": [],
  "volunteer": [{"organization": "", "role": "", "description": ""}],
  "interests": [],
  "raw_text": ""
}

Be precise with dates, names, and details."#;

const TEMPLATE_FILL_SYSTEM_PROMPT: &str = r#"You are an expert resume data mapper. You receive EXTRACTED DATA (structured data from a resume) and a TEMPLATE SCHEMA (the fields a target template requires). Map the extracted data onto the template fields: use the best alternative when there is no direct match, leave fields empty when no data is available, preserve original content, format dates consistently.

Respond with ONLY a valid JSON object containing the filled template data."#;

/// Capability interface over the external vision/language model.
///
/// Every operation is infallible at the type level: provider faults
/// (unconfigured client, transport errors, unparseable replies) are folded
/// into the returned document's `error` field so callers render a degraded
/// payload instead of failing the request.
#[async_trait::async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Score the document for ATS compatibility.
    async fn score_ats(&self, file: &Path) -> AtsReport;

    /// Produce improvement suggestions for the document.
    async fn suggest(&self, file: &Path) -> SuggestionsReport;

    /// Extract structured data from the document.
    async fn extract(&self, file: &Path) -> ExtractedResumeData;

    /// Map extracted data onto a template's field schema. Text-only; no
    /// images are involved.
    async fn fill_template(&self, data: &ExtractedResumeData, schema: &Value) -> FilledTemplate;
}

/// Live provider talking to an OpenAI-compatible chat-completions endpoint.
pub struct NebiusProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    vlm_model: String,
    llm_model: String,
}

impl NebiusProvider {
    pub fn new(api_key: String, base_url: String, vlm_model: String, llm_model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            vlm_model,
            llm_model,
        }
    }

    async fn chat(
        &self,
        model: &str,
        system_prompt: &str,
        user_content: Value,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content},
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("Model reply carried no content"))
    }

    /// Issue one vision request carrying the rendered document pages.
    async fn vision_request(
        &self,
        file: &Path,
        system_prompt: &str,
        intro: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let images = render_document(file).await?;
        info!(
            "Rendered {} to {} page image(s)",
            file.display(),
            images.len()
        );

        let mut content = vec![json!({"type": "text", "text": intro})];
        for b64 in &images {
            content.push(json!({
                "type": "image_url",
                "image_url": {"url": format!("data:image/png;base64,{}", b64)},
            }));
        }

        self.chat(
            &self.vlm_model,
            system_prompt,
            Value::Array(content),
            max_tokens,
            temperature,
        )
        .await
    }
}

#[async_trait::async_trait]
impl AnalysisProvider for NebiusProvider {
    async fn score_ats(&self, file: &Path) -> AtsReport {
        match self
            .vision_request(
                file,
                ATS_SYSTEM_PROMPT,
                "Analyze this resume for ATS compatibility:",
                1000,
                0.3,
            )
            .await
        {
            Ok(reply) => ats_from_reply(&reply),
            Err(e) => AtsReport {
                improvements: vec!["Error analyzing resume".to_string()],
                error: Some(e.to_string()),
                ..AtsReport::default()
            },
        }
    }

    async fn suggest(&self, file: &Path) -> SuggestionsReport {
        match self
            .vision_request(
                file,
                SUGGESTIONS_SYSTEM_PROMPT,
                "Analyze this resume and provide improvement suggestions:",
                1500,
                0.5,
            )
            .await
        {
            Ok(reply) => suggestions_from_reply(&reply),
            Err(e) => SuggestionsReport {
                overall_impression: format!("Error: {}", e),
                top_priority: "Fix the error and try again".to_string(),
                ..SuggestionsReport::default()
            },
        }
    }

    async fn extract(&self, file: &Path) -> ExtractedResumeData {
        match self
            .vision_request(
                file,
                EXTRACTION_SYSTEM_PROMPT,
                "Extract all information from this resume:",
                4000,
                0.2,
            )
            .await
        {
            Ok(reply) => extraction_from_reply(&reply),
            Err(e) => ExtractedResumeData::with_error(e.to_string()),
        }
    }

    async fn fill_template(&self, data: &ExtractedResumeData, schema: &Value) -> FilledTemplate {
        let template_id = schema["template_id"].as_str().unwrap_or_default();

        let user_message = format!(
            "EXTRACTED RESUME DATA:\n{}\n\nTEMPLATE SCHEMA:\n{}\n\nMap the extracted data to fill the template fields. Return only the filled data JSON.",
            serde_json::to_string_pretty(data).unwrap_or_default(),
            serde_json::to_string_pretty(schema).unwrap_or_default(),
        );

        info!("Filling template '{}' with {}", template_id, self.llm_model);
        match self
            .chat(
                &self.llm_model,
                TEMPLATE_FILL_SYSTEM_PROMPT,
                Value::String(user_message),
                4000,
                0.3,
            )
            .await
        {
            Ok(reply) => filled_from_reply(&reply, template_id),
            Err(e) => FilledTemplate::with_error(e.to_string()),
        }
    }
}

/// Provider used when no API credential is configured. Returns
/// deterministic sentinels without any I/O.
pub struct NullProvider;

const NOT_CONFIGURED: &str = "AI service not configured. Set NEBIUS_API_KEY in .env";

#[async_trait::async_trait]
impl AnalysisProvider for NullProvider {
    async fn score_ats(&self, _file: &Path) -> AtsReport {
        AtsReport {
            improvements: vec!["Configure NEBIUS_API_KEY to enable ATS analysis".to_string()],
            error: Some(NOT_CONFIGURED.to_string()),
            ..AtsReport::default()
        }
    }

    async fn suggest(&self, _file: &Path) -> SuggestionsReport {
        SuggestionsReport {
            overall_impression: "AI service not configured".to_string(),
            top_priority: "Set NEBIUS_API_KEY in .env to enable AI suggestions".to_string(),
            ..SuggestionsReport::default()
        }
    }

    async fn extract(&self, _file: &Path) -> ExtractedResumeData {
        ExtractedResumeData::with_error(NOT_CONFIGURED)
    }

    async fn fill_template(&self, _data: &ExtractedResumeData, _schema: &Value) -> FilledTemplate {
        FilledTemplate::with_error(NOT_CONFIGURED)
    }
}

/// Render a stored document to an ordered sequence of base64 PNG pages.
/// PDFs yield one image per page in page order; single-image formats yield
/// a one-element sequence.
async fn render_document(file: &Path) -> Result<Vec<String>> {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let pages = match ext.as_str() {
        "pdf" => render_pdf_pages(file)?,
        "png" | "jpg" | "jpeg" => {
            let bytes = tokio::fs::read(file).await?;
            let img = image::load_from_memory(&bytes)
                .map_err(|e| anyhow!("Failed to load image: {}", e))?;
            vec![encode_png(&img)?]
        }
        other => bail!("Unsupported document type: {}", other),
    };

    Ok(pages.iter().map(|p| BASE64.encode(p)).collect())
}

/// Rasterize every PDF page to PNG with pdftocairo, in page order.
fn render_pdf_pages(file: &Path) -> Result<Vec<Vec<u8>>> {
    let out_dir = tempfile::tempdir()?;
    let prefix = out_dir.path().join("page");

    let output = Command::new("pdftocairo")
        .arg("-png")
        .arg("-r")
        .arg(PDF_RENDER_DPI.to_string())
        .arg(file.as_os_str())
        .arg(prefix.as_os_str())
        .output()?;

    if !output.status.success() {
        let err_msg = String::from_utf8_lossy(&output.stderr);
        bail!("pdftocairo failed: {}", err_msg);
    }

    // pdftocairo names pages page-1.png, page-2.png, ...; sort numerically
    // so page-10 does not land between page-1 and page-2.
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(out_dir.path())? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(num) = name
            .strip_prefix("page-")
            .and_then(|s| s.strip_suffix(".png"))
            .and_then(|s| s.parse::<u32>().ok())
        {
            pages.push((num, entry.path()));
        }
    }

    if pages.is_empty() {
        bail!("pdftocairo produced no pages");
    }
    pages.sort_by_key(|(num, _)| *num);

    pages
        .into_iter()
        .map(|(_, path)| std::fs::read(&path).map_err(Into::into))
        .collect()
}

fn encode_png(img: &image::DynamicImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| anyhow!("Failed to encode PNG: {}", e))?;
    Ok(out)
}

/// Strip a markdown code fence (``` or ```json) wrapping the reply, if any.
fn strip_code_fences(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let inner = &text[start + 3..];
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    match inner.find("```") {
        Some(end) => inner[..end].trim(),
        None => text,
    }
}

/// Locate the first balanced JSON object span, string- and escape-aware.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a model reply into JSON, tolerating markdown fences and prose
/// around the object. `None` means no parseable object was found.
pub fn parse_model_json(reply: &str) -> Option<Value> {
    let text = strip_code_fences(reply);
    let span = first_json_object(text)?;
    serde_json::from_str(span).ok()
}

fn ats_from_reply(reply: &str) -> AtsReport {
    let parsed = parse_model_json(reply)
        .and_then(|value| serde_json::from_value::<AtsReport>(value).ok());

    match parsed {
        Some(mut report) => {
            report.score = report.score.clamp(0, 100);
            report
        }
        None => AtsReport {
            error: Some("Failed to parse AI response".to_string()),
            raw: Some(reply.to_string()),
            ..AtsReport::default()
        },
    }
}

fn suggestions_from_reply(reply: &str) -> SuggestionsReport {
    parse_model_json(reply)
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_else(|| SuggestionsReport {
            error: Some("Failed to parse AI response".to_string()),
            raw: Some(reply.to_string()),
            ..SuggestionsReport::default()
        })
}

/// Parse an extraction reply and stamp it with the format version and
/// extraction time. The stamp comes from this gateway, never the model.
fn extraction_from_reply(reply: &str) -> ExtractedResumeData {
    let mut data = parse_model_json(reply)
        .and_then(|value| serde_json::from_value::<ExtractedResumeData>(value).ok())
        .unwrap_or_else(|| ExtractedResumeData {
            error: Some("Failed to parse AI response".to_string()),
            raw: Some(reply.to_string()),
            ..ExtractedResumeData::default()
        });

    data.extraction_version = EXTRACTION_VERSION.to_string();
    data.extracted_at = chrono::Utc::now().to_rfc3339();
    data
}

fn filled_from_reply(reply: &str, template_id: &str) -> FilledTemplate {
    let data = parse_model_json(reply).unwrap_or_else(|| {
        json!({"error": "Failed to parse AI response", "raw": reply})
    });

    FilledTemplate {
        template_id: template_id.to_string(),
        filled_at: chrono::Utc::now().to_rfc3339(),
        data,
        error: None,
    }
}
