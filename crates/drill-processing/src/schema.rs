//! Column names of the drilling measurement schema.

pub const DEPTH: &str = "depth";
pub const PRESSURE: &str = "pressure";
pub const TEMPERATURE: &str = "temperature";
pub const FLOW_RATE: &str = "flow_rate";
pub const ROP: &str = "rop";
pub const WOB: &str = "wob";
pub const RPM: &str = "rpm";
pub const TORQUE: &str = "torque";
pub const FORMATION: &str = "formation";

/// Derived: `pressure / temperature`.
pub const PT_RATIO: &str = "pt_ratio";
/// Derived: `flow_rate / pressure`.
pub const FLOW_EFFICIENCY: &str = "flow_efficiency";
/// Derived: `pressure / depth`.
pub const PRESSURE_GRADIENT: &str = "pressure_gradient";
/// Derived: `temperature / depth`.
pub const TEMPERATURE_GRADIENT: &str = "temperature_gradient";
/// Derived: `wob * rpm / rop`.
pub const DRILLING_STRENGTH: &str = "drilling_strength";
/// Derived: `torque * rpm / rop`.
pub const SPECIFIC_ENERGY: &str = "specific_energy";

/// Columns the default validator requires.
pub const REQUIRED_COLUMNS: [&str; 4] = [DEPTH, PRESSURE, TEMPERATURE, FLOW_RATE];

/// Measurements that cannot be negative.
pub const NON_NEGATIVE_COLUMNS: [&str; 7] = [DEPTH, PRESSURE, FLOW_RATE, ROP, WOB, RPM, TORQUE];

pub fn default_required_columns() -> Vec<String> {
    REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
}
