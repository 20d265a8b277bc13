/// ハードウェア制御モジュール
pub mod voltage_sensor;

pub use voltage_sensor::{VoltageSensor, VoltageSensorChannel};
