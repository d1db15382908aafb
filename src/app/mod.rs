// Application layer: pipelines wiring storage + config to the allocation core.

pub mod pipelines;
