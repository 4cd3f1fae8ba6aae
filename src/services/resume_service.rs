use crate::api::error::AppError;
use crate::entities::{prelude::*, resumes};
use crate::models::{AtsReport, DashboardStats, ExtractedResumeData, FilledTemplate, SuggestionsReport};
use crate::services::ai_service::AnalysisProvider;
use crate::services::artifact_store::ArtifactStore;
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Cosmetic accent palette; one entry is assigned at random when a resume
/// is created.
const ACCENT_COLORS: [&str; 5] = [
    "bg-blue-900/20",
    "bg-purple-900/20",
    "bg-green-900/20",
    "bg-orange-900/20",
    "bg-pink-900/20",
];

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct ResumeUpdate {
    pub title: Option<String>,
    pub ats_score: Option<i32>,
    pub thumbnail_color: Option<String>,
}

/// Owns the resume lifecycle: creation, file attachment with best-effort
/// analysis, cached-vs-fresh reads, forced recomputation, deletion and
/// per-owner statistics. Every lookup is scoped by (resume id, owner id);
/// a mismatched owner is indistinguishable from a missing id.
pub struct ResumeService {
    db: DatabaseConnection,
    store: Arc<ArtifactStore>,
    ai: Arc<dyn AnalysisProvider>,
}

impl ResumeService {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<ArtifactStore>,
        ai: Arc<dyn AnalysisProvider>,
    ) -> Self {
        Self { db, store, ai }
    }

    /// All resumes for an owner, most recently updated first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<resumes::Model>, AppError> {
        let rows = Resumes::find()
            .filter(resumes::Column::UserId.eq(user_id))
            .order_by_desc(resumes::Column::UpdatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// The single ownership-scoped lookup every operation goes through.
    pub async fn find(
        &self,
        resume_id: &str,
        user_id: &str,
    ) -> Result<Option<resumes::Model>, AppError> {
        let row = Resumes::find()
            .filter(resumes::Column::Id.eq(resume_id))
            .filter(resumes::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, user_id: &str, title: &str) -> Result<resumes::Model, AppError> {
        let color = ACCENT_COLORS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(ACCENT_COLORS[0]);

        let now = Utc::now();
        let resume = resumes::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            title: Set(title.to_string()),
            file_path: Set(None),
            file_type: Set(None),
            file_size: Set(None),
            extracted_data_path: Set(None),
            ats_score: Set(0),
            thumbnail_color: Set(color.to_string()),
            ats_report: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(resume.insert(&self.db).await?)
    }

    /// Attach an uploaded file and run the analysis pipeline.
    ///
    /// Phase 1 (must succeed): validate the content type, store the raw
    /// file, persist the file metadata triple in one update. Phase 2
    /// (best-effort): extraction then ATS scoring; each sub-step's failure
    /// is logged and swallowed, so upload success never depends on the
    /// provider. A successful extraction overwrites the title with the
    /// extracted contact name.
    pub async fn attach_file(
        &self,
        resume: resumes::Model,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<resumes::Model, AppError> {
        let Some(kind) = ArtifactStore::kind_for_content_type(content_type) else {
            return Err(AppError::BadRequest(format!(
                "Invalid file type. Allowed: {:?}",
                ArtifactStore::allowed_kinds()
            )));
        };

        let file_path = self
            .store
            .save_raw_file(&resume.user_id, &resume.id, &content, kind)
            .await?;

        let mut active: resumes::ActiveModel = resume.into();
        active.file_path = Set(Some(file_path.display().to_string()));
        active.file_type = Set(Some(kind.to_string()));
        active.file_size = Set(Some(content.len() as i64));
        active.updated_at = Set(Utc::now());
        let mut resume = active.update(&self.db).await?;

        let extracted = self.ai.extract(&file_path).await;
        match extracted.error.as_deref() {
            None => match self.persist_extraction(resume.clone(), &extracted, true).await {
                Ok(updated) => {
                    info!("Data extraction complete for resume {}", updated.id);
                    resume = updated;
                }
                Err(e) => warn!("Failed to persist extraction for resume {}: {}", resume.id, e),
            },
            Some(err) => warn!("Data extraction failed for resume {}: {}", resume.id, err),
        }

        let report = self.ai.score_ats(&file_path).await;
        match report.error.as_deref() {
            None => match self.persist_ats_report(resume.clone(), &report).await {
                Ok(updated) => {
                    info!(
                        "ATS analysis complete for resume {}: score={}",
                        updated.id, updated.ats_score
                    );
                    resume = updated;
                }
                Err(e) => warn!("Failed to persist ATS report for resume {}: {}", resume.id, e),
            },
            Some(err) => warn!("ATS analysis failed for resume {}: {}", resume.id, err),
        }

        Ok(resume)
    }

    /// Cached ATS analysis when present; otherwise a fresh compute when a
    /// file exists. A fresh result is NOT persisted here; only
    /// `reanalyze_ats` writes. This asymmetry with `extracted_data` is
    /// deliberate.
    pub async fn ats_analysis(&self, resume: &resumes::Model) -> AtsReport {
        if let Some(blob) = &resume.ats_report {
            if let Ok(report) = serde_json::from_str::<AtsReport>(blob) {
                return report;
            }
        }

        match &resume.file_path {
            Some(path) => self.ai.score_ats(Path::new(path)).await,
            None => AtsReport::no_file(),
        }
    }

    /// Force a fresh ATS computation, persisting score and report when the
    /// provider returns a valid, error-free result.
    pub async fn reanalyze_ats(
        &self,
        resume: resumes::Model,
    ) -> Result<resumes::Model, AppError> {
        let Some(file_path) = resume.file_path.clone() else {
            return Ok(resume);
        };

        let report = self.ai.score_ats(Path::new(&file_path)).await;
        if let Some(err) = &report.error {
            warn!("ATS reanalysis failed for resume {}: {}", resume.id, err);
            return Ok(resume);
        }

        self.persist_ats_report(resume, &report).await
    }

    pub async fn suggestions(&self, resume: &resumes::Model) -> SuggestionsReport {
        match &resume.file_path {
            Some(path) => self.ai.suggest(Path::new(path)).await,
            None => SuggestionsReport::no_file(),
        }
    }

    /// Cached extracted data when the reference resolves to a readable
    /// document; otherwise a fresh extraction. Unlike `ats_analysis`, a
    /// successful fresh extraction IS persisted as a side effect of this
    /// read (self-healing cache population).
    pub async fn extracted_data(
        &self,
        resume: &resumes::Model,
    ) -> Result<ExtractedResumeData, AppError> {
        if let Some(doc_path) = &resume.extracted_data_path {
            if let Some(data) = self.store.read_extracted(doc_path).await {
                return Ok(data);
            }
        }

        let Some(file_path) = &resume.file_path else {
            return Ok(ExtractedResumeData::no_file());
        };

        let data = self.ai.extract(Path::new(file_path)).await;
        if data.error.is_none() {
            self.persist_extraction(resume.clone(), &data, false).await?;
        }
        Ok(data)
    }

    /// Force a fresh extraction, persist it, and re-derive the title from
    /// the extracted contact name.
    pub async fn reextract_data(
        &self,
        resume: resumes::Model,
    ) -> Result<ExtractedResumeData, AppError> {
        let Some(file_path) = resume.file_path.clone() else {
            return Ok(ExtractedResumeData::no_file());
        };

        let data = self.ai.extract(Path::new(&file_path)).await;
        if data.error.is_none() {
            self.persist_extraction(resume, &data, true).await?;
        }
        Ok(data)
    }

    /// Map the resume's extracted data onto a template schema, reusing the
    /// self-healing read. An error in the extracted data short-circuits
    /// with the same error.
    pub async fn fill_template(
        &self,
        resume: &resumes::Model,
        template_schema: &Value,
    ) -> Result<FilledTemplate, AppError> {
        let data = self.extracted_data(resume).await?;
        if let Some(err) = data.error.clone() {
            return Ok(FilledTemplate::with_error(err));
        }

        Ok(self.ai.fill_template(&data, template_schema).await)
    }

    pub async fn update(
        &self,
        resume_id: &str,
        user_id: &str,
        update: ResumeUpdate,
    ) -> Result<Option<resumes::Model>, AppError> {
        let Some(resume) = self.find(resume_id, user_id).await? else {
            return Ok(None);
        };

        let mut active: resumes::ActiveModel = resume.into();
        if let Some(title) = update.title {
            active.title = Set(title);
        }
        if let Some(score) = update.ats_score {
            active.ats_score = Set(score);
        }
        if let Some(color) = update.thumbnail_color {
            active.thumbnail_color = Set(color);
        }
        active.updated_at = Set(Utc::now());

        Ok(Some(active.update(&self.db).await?))
    }

    /// Delete a resume and its artifacts. Artifact removal is best-effort;
    /// the row is deleted regardless. Returns whether a row existed.
    pub async fn delete(&self, resume_id: &str, user_id: &str) -> Result<bool, AppError> {
        let Some(resume) = self.find(resume_id, user_id).await? else {
            return Ok(false);
        };

        if let Some(path) = &resume.file_path {
            self.store.remove(path).await;
        }
        if let Some(path) = &resume.extracted_data_path {
            self.store.remove(path).await;
        }

        resume.delete(&self.db).await?;
        Ok(true)
    }

    /// Aggregate the owner's resumes: total count, integer-truncated mean
    /// score, maximum score, and resumes created in the trailing 7 days.
    pub async fn dashboard_stats(&self, user_id: &str) -> Result<DashboardStats, AppError> {
        let resumes = self.list(user_id).await?;
        if resumes.is_empty() {
            return Ok(DashboardStats::default());
        }

        let total = resumes.len() as i64;
        let score_sum: i64 = resumes.iter().map(|r| r.ats_score as i64).sum();
        let one_week_ago = Utc::now() - Duration::days(7);

        Ok(DashboardStats {
            total_resumes: total,
            average_ats_score: (score_sum / total) as i32,
            highest_ats_score: resumes.iter().map(|r| r.ats_score).max().unwrap_or(0),
            resumes_this_week: resumes
                .iter()
                .filter(|r| r.created_at >= one_week_ago)
                .count() as i64,
        })
    }

    async fn persist_extraction(
        &self,
        resume: resumes::Model,
        data: &ExtractedResumeData,
        derive_title: bool,
    ) -> Result<resumes::Model, AppError> {
        let doc_path = self
            .store
            .save_extracted(&resume.user_id, &resume.id, data)
            .await?;

        let mut active: resumes::ActiveModel = resume.into();
        active.extracted_data_path = Set(Some(doc_path.display().to_string()));
        if derive_title && !data.contact.full_name.is_empty() {
            active.title = Set(data.contact.full_name.clone());
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    async fn persist_ats_report(
        &self,
        resume: resumes::Model,
        report: &AtsReport,
    ) -> Result<resumes::Model, AppError> {
        let blob =
            serde_json::to_string(report).map_err(|e| AppError::Internal(e.to_string()))?;

        let mut active: resumes::ActiveModel = resume.into();
        active.ats_score = Set(report.score);
        active.ats_report = Set(Some(blob));
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }
}
