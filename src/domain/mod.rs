// Domain layer: records exchanged between the allocation core and the adapters,
// plus the ports (Storage / ConfigProvider / Pipeline) the adapters implement.

pub mod model;
pub mod ports;
