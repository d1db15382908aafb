use crate::adapters::table::{
    decode_allocated_classrooms, decode_exam_slots, decode_faculty_timetable,
    encode_duty_assignments,
};
use crate::app::pipelines::{default_allocation_path, save_table, DUTY_ARTIFACT};
use crate::core::duty::DutyScheduler;
use crate::core::{ConfigProvider, Pipeline, Storage, Table, TransformResult};
use crate::domain::model::{DutyRequest, ExamSlot, FacultyTimetable};
use crate::utils::error::{AllocError, Result};

/// Phase 2: seat allocation + exam timetable + faculty timetable in,
/// `faculty_allocation` table out.
pub struct DutyPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

#[derive(Debug, Clone)]
pub struct DutyInput {
    pub classrooms: Vec<String>,
    pub slots: Vec<ExamSlot>,
    pub timetable: FacultyTimetable,
}

impl<S: Storage, C: ConfigProvider> DutyPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn request(&self) -> Result<DutyRequest> {
        self.config
            .duty_request()
            .ok_or_else(|| AllocError::MissingConfigError {
                field: "duty".to_string(),
            })
    }

    async fn read_table(&self, path: &str) -> Result<Table> {
        let bytes = self.storage.read_file(path).await?;
        Table::from_path_bytes(path, &bytes)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DutyPipeline<S, C> {
    type Input = DutyInput;

    async fn extract(&self) -> Result<DutyInput> {
        let request = self.request()?;

        let allocation_path = request
            .allocation
            .clone()
            .unwrap_or_else(|| default_allocation_path(self.config.output_path()));
        if !self.storage.exists(&allocation_path).await {
            return Err(AllocError::MissingInput {
                path: allocation_path,
            });
        }

        tracing::info!("📥 Loading classroom allocation from: {}", allocation_path);
        let classrooms = decode_allocated_classrooms(&self.read_table(&allocation_path).await?)?;

        tracing::info!("📥 Loading exam timetable from: {}", request.exam_timetable);
        let slots = decode_exam_slots(&self.read_table(&request.exam_timetable).await?)?;

        tracing::info!("📥 Loading faculty timetable from: {}", request.faculty_timetable);
        let timetable =
            decode_faculty_timetable(&self.read_table(&request.faculty_timetable).await?)?;

        tracing::info!(
            "Loaded {} classrooms, {} exam slots, {} faculty members",
            classrooms.len(),
            slots.len(),
            timetable.roster().len()
        );

        Ok(DutyInput {
            classrooms,
            slots,
            timetable,
        })
    }

    async fn transform(&self, input: DutyInput) -> Result<TransformResult> {
        let policy = self.config.duty_policy();
        tracing::info!(
            "🧑‍🏫 Scheduling duties (max {} per faculty, {})",
            policy.max_duties,
            policy.selection
        );

        let schedule =
            DutyScheduler::new(policy).schedule(&input.classrooms, &input.slots, &input.timetable);

        for (faculty, count) in &schedule.duty_counts {
            tracing::debug!("{}: {} duties", faculty, count);
        }

        let unassigned = schedule.unassigned();
        tracing::info!(
            "Filled {} of {} duty rows",
            schedule.assignments.len() - unassigned,
            schedule.assignments.len()
        );
        if unassigned > 0 {
            tracing::warn!("⚠️ {} rooms have no invigilator", unassigned);
        }

        Ok(TransformResult {
            table: encode_duty_assignments(&schedule.assignments),
            artifact: DUTY_ARTIFACT.to_string(),
            shortfall: unassigned as u64,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let written = save_table(
            &self.storage,
            self.config.output_path(),
            &result.artifact,
            &result.table,
            self.config.output_formats(),
        )
        .await?;

        written
            .into_iter()
            .next()
            .ok_or_else(|| AllocError::ProcessingError {
                message: "no output written".to_string(),
            })
    }
}
