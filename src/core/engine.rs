use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct AllocationEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> AllocationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting allocation run...");

        // Extract
        tracing::info!("Reading input tables...");
        let input = self.pipeline.extract().await?;

        // Transform
        tracing::info!("Allocating...");
        let result = self.pipeline.transform(input).await?;
        tracing::info!(
            "Produced {} {} rows (shortfall: {})",
            result.table.len(),
            result.artifact,
            result.shortfall
        );

        // Load
        tracing::info!("Saving results...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
