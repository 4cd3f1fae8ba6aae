use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Version stamped into every persisted extracted-data document.
pub const EXTRACTION_VERSION: &str = "1.0";

/// Per-criterion point breakdown of an ATS score.
///
/// Point allocation: contact_info 10, summary 10, experience 25, skills 15,
/// education 10, formatting 15, keywords 15.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsBreakdown {
    pub contact_info: i32,
    pub summary: i32,
    pub experience: i32,
    pub skills: i32,
    pub education: i32,
    pub formatting: i32,
    pub keywords: i32,
}

/// Result of an ATS compatibility analysis.
///
/// `error`/`raw` are only present on degraded results (unconfigured
/// provider, transport failure, unparseable model reply); cached reports
/// never carry them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsReport {
    pub score: i32,
    pub breakdown: AtsBreakdown,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub missing_sections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl AtsReport {
    /// Zero-score report for a resume with no uploaded file.
    pub fn no_file() -> Self {
        Self {
            error: Some("No file uploaded for this resume".to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionItem {
    pub category: String,
    pub priority: String,
    pub current: String,
    pub suggested: String,
    pub example: String,
}

/// Improvement suggestions produced by the coaching analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionsReport {
    pub suggestions: Vec<SuggestionItem>,
    pub overall_impression: String,
    pub top_priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl SuggestionsReport {
    pub fn no_file() -> Self {
        Self {
            overall_impression: "No file uploaded".to_string(),
            top_priority: "Upload a resume file first".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
    pub portfolio: String,
    pub other_links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
    pub description: String,
    pub bullet_points: Vec<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub gpa: String,
    pub honors: Vec<String>,
    pub relevant_coursework: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: String,
    pub bullet_points: Vec<String>,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub date_obtained: String,
    pub expiry_date: String,
    pub credential_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSkill {
    pub language: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolunteerWork {
    pub organization: String,
    pub role: String,
    pub description: String,
}

/// Complete structured data extracted from one resume document.
///
/// This is the source of truth templates pull from. Every field defaults so
/// partial or sloppy model output still deserializes; list entries are
/// independent records with no cross-references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedResumeData {
    pub extraction_version: String,
    pub extracted_at: String,

    pub contact: ContactInfo,
    pub summary: String,

    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,

    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub skills_by_category: BTreeMap<String, Vec<String>>,

    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub languages: Vec<LanguageSkill>,
    pub publications: Vec<String>,
    pub awards: Vec<String>,
    pub volunteer: Vec<VolunteerWork>,
    pub interests: Vec<String>,

    /// Free-text fallback for content that fits no structured section.
    pub raw_text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ExtractedResumeData {
    /// Empty-shaped sentinel carrying an error marker.
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn no_file() -> Self {
        Self::with_error("No file uploaded for this resume")
    }
}

/// Extracted data mapped onto a template's field schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilledTemplate {
    pub template_id: String,
    pub filled_at: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FilledTemplate {
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            data: Value::Object(serde_json::Map::new()),
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Per-user aggregates shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_resumes: i64,
    pub average_ats_score: i32,
    pub highest_ats_score: i32,
    pub resumes_this_week: i64,
}
