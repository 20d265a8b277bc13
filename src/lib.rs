/*!
 * # Battery Report Node
 *
 * 電池駆動の ESP32-C3 センサーノード。WiFi に接続し、一定周期で自身の電池電圧を
 * 測定して HTTP GET で収集サーバーへ送信します。測定の合間は自動ライトスリープで待機します。
 *
 * ## モジュール構成
 * - `config`: ビルド時設定（cfg.toml）
 * - `core`: ハードウェア非依存のロジック（接続状態機械、測定、送信、周期スケジュール）
 * - `hardware`: ADC 電圧センサー（ESP-IDF のみ）
 * - `communication`: WiFi 接続と HTTP クライアント（ESP-IDF のみ）
 * - `power`: 電源管理プロファイルと待機用クロック
 */

// 公開モジュール
#[cfg(target_os = "espidf")]
pub mod communication;
pub mod config;
pub mod core;
#[cfg(target_os = "espidf")]
pub mod hardware;
pub mod power;

// 内部で使用する型をまとめてエクスポート
#[cfg(target_os = "espidf")]
pub use communication::{EspHttpTransport, NetworkManager, WifiSession};
pub use config::{AppConfig, ConfigError};
pub use crate::core::{
    AppController, ConnectionManager, ConnectionOutcome, Delivery, ReportEvent, Reporter,
    ResetReason, SampleReading,
};
#[cfg(target_os = "espidf")]
pub use hardware::VoltageSensor;
pub use power::{PowerManagement, PowerProfile};

/// ライブラリのバージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
