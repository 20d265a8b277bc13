/// 電源管理モジュール
pub mod management;
#[cfg(target_os = "espidf")]
pub mod sleep;

pub use management::*;
#[cfg(target_os = "espidf")]
pub use sleep::*;
