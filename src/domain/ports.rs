use crate::core::duty::DutyPolicy;
use crate::domain::model::{DutyRequest, SeatRequest, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn duty_policy(&self) -> DutyPolicy;
    fn seat_request(&self) -> Option<SeatRequest>;
    fn duty_request(&self) -> Option<DutyRequest>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Input: Send;

    async fn extract(&self) -> Result<Self::Input>;
    async fn transform(&self, input: Self::Input) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
