// Adapters layer: conversions between the allocation core and the outside world.
// Storage backends live under src/config next to the configuration they are built from.

pub mod table;
