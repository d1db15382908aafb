use crate::adapters::table::{decode_classrooms, encode_seat_ranges};
use crate::app::pipelines::{save_table, seat_output_formats, SEAT_ARTIFACT};
use crate::core::seating::allocate_seats;
use crate::core::{ConfigProvider, Pipeline, Storage, Table, TransformResult};
use crate::domain::model::{Classroom, SeatRequest};
use crate::utils::error::{AllocError, Result};

/// Phase 1: classroom table in, `classroom_allocation` table out.
pub struct SeatPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

#[derive(Debug, Clone)]
pub struct SeatInput {
    pub request: SeatRequest,
    pub classrooms: Vec<Classroom>,
}

impl<S: Storage, C: ConfigProvider> SeatPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn request(&self) -> Result<SeatRequest> {
        self.config
            .seat_request()
            .ok_or_else(|| AllocError::MissingConfigError {
                field: "seating".to_string(),
            })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SeatPipeline<S, C> {
    type Input = SeatInput;

    async fn extract(&self) -> Result<SeatInput> {
        let request = self.request()?;
        tracing::info!("📥 Loading classrooms from: {}", request.classrooms);

        let bytes = self.storage.read_file(&request.classrooms).await?;
        let table = Table::from_path_bytes(&request.classrooms, &bytes)?;
        let classrooms = decode_classrooms(&table)?;

        let capacity: u64 = classrooms.iter().map(|c| u64::from(c.capacity)).sum();
        tracing::info!(
            "Loaded {} classrooms with {} seats for {} students",
            classrooms.len(),
            capacity,
            request.students
        );

        Ok(SeatInput {
            request,
            classrooms,
        })
    }

    async fn transform(&self, input: SeatInput) -> Result<TransformResult> {
        let ranges = allocate_seats(
            input.request.students,
            &input.request.start_usn,
            &input.classrooms,
        )?;

        let shortfall: u64 = ranges
            .iter()
            .filter(|r| r.is_unallocated())
            .map(|r| r.count)
            .sum();
        let rooms_used = ranges.iter().filter(|r| !r.is_unallocated()).count();

        tracing::info!(
            "🪑 Seated {} students in {} of {} classrooms",
            input.request.students - shortfall,
            rooms_used,
            input.classrooms.len()
        );
        if shortfall > 0 {
            tracing::warn!("⚠️ {} students could not be seated", shortfall);
        }

        Ok(TransformResult {
            table: encode_seat_ranges(&ranges),
            artifact: SEAT_ARTIFACT.to_string(),
            shortfall,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        // 第二階段固定讀 CSV，所以一定要有 CSV 版本
        let formats = seat_output_formats(self.config.output_formats());

        let written = save_table(
            &self.storage,
            self.config.output_path(),
            &result.artifact,
            &result.table,
            &formats,
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
