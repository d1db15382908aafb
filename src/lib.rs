pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::pipelines::{duty_pipeline::DutyPipeline, seat_pipeline::SeatPipeline};
pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::duty::{DutyPolicy, DutyScheduler, SelectionPolicy};
pub use core::engine::AllocationEngine;
pub use core::identifier::{next_identifier, Identifier};
pub use core::interval::{overlaps, parse_range, TimeRange};
pub use core::seating::allocate_seats;
pub use utils::error::{AllocError, Result};
