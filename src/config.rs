use crate::core::config_validation::{
    validate_device_name, validate_frequency_range, validate_report_interval, validate_server,
    validate_wifi_ssid, ValidationError,
};

/// アプリケーション設定
///
/// この構造体はビルド時に`cfg.toml`ファイルから読み込まれた設定を保持します。
/// 値が無い項目はここに書かれたデフォルト値になります。
#[toml_cfg::toml_config]
pub struct Config {
    #[default("")]
    wifi_ssid: &'static str,

    #[default("")]
    wifi_password: &'static str,

    #[default("Test1")]
    device_name: &'static str,

    #[default("")]
    server: &'static str,

    #[default(60)]
    report_interval_seconds: u64,

    // 電源管理プロファイル
    #[default(80)]
    cpu_max_freq_mhz: u32,

    #[default(40)]
    cpu_min_freq_mhz: u32,

    #[default(true)]
    light_sleep_enabled: bool,

    // MAX_MODEM 省電力モードで使うビーコン受信間隔
    #[default(10)]
    wifi_listen_interval: u16,
}

/// 設定エラー
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("WiFi SSIDが設定されていません")]
    MissingWifiSsid,
    #[error("送信先サーバーが設定されていません")]
    MissingServer,
    #[error("無効なサーバーアドレス: {0}")]
    InvalidServer(String),
    #[error("無効なデバイス名: {0}")]
    InvalidDeviceName(String),
    #[error("report_interval_seconds は 1 以上である必要があります")]
    InvalidReportInterval,
    #[error("CPU周波数の範囲が無効です (min {min} MHz, max {max} MHz)")]
    InvalidFrequencyRange { min: u32, max: u32 },
}

/// アプリケーション設定を表す構造体
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// WiFi SSID
    pub wifi_ssid: String,

    /// WiFi パスワード（空ならオープンネットワーク）
    pub wifi_password: String,

    /// センサー名（DHCPホスト名としても使用）
    pub device_name: String,

    /// レポート送信先 (`host` または `host:port`)
    pub server: String,

    /// 測定・送信周期（秒）
    pub report_interval_seconds: u64,

    pub cpu_max_freq_mhz: u32,
    pub cpu_min_freq_mhz: u32,
    pub light_sleep_enabled: bool,
    pub wifi_listen_interval: u16,
}

impl AppConfig {
    /// 設定ファイルから設定をロードします
    pub fn load() -> Result<Self, ConfigError> {
        // toml_cfg によって生成された定数
        let config = CONFIG;

        Self::from_values(
            config.wifi_ssid,
            config.wifi_password,
            config.device_name,
            config.server,
            config.report_interval_seconds,
            (config.cpu_min_freq_mhz, config.cpu_max_freq_mhz),
            config.light_sleep_enabled,
            config.wifi_listen_interval,
        )
    }

    /// 生の設定値を検証して `AppConfig` を組み立てます
    #[allow(clippy::too_many_arguments)]
    pub fn from_values(
        wifi_ssid: &str,
        wifi_password: &str,
        device_name: &str,
        server: &str,
        report_interval_seconds: u64,
        (cpu_min_freq_mhz, cpu_max_freq_mhz): (u32, u32),
        light_sleep_enabled: bool,
        wifi_listen_interval: u16,
    ) -> Result<Self, ConfigError> {
        // Password can be empty for open networks, so no check for emptiness here.
        validate_wifi_ssid(wifi_ssid).map_err(map_validation_error)?;
        validate_device_name(device_name).map_err(map_validation_error)?;
        validate_server(server).map_err(map_validation_error)?;
        validate_report_interval(report_interval_seconds).map_err(map_validation_error)?;
        validate_frequency_range(cpu_min_freq_mhz, cpu_max_freq_mhz)
            .map_err(map_validation_error)?;

        Ok(AppConfig {
            wifi_ssid: wifi_ssid.to_string(),
            wifi_password: wifi_password.to_string(),
            device_name: device_name.to_string(),
            server: server.to_string(),
            report_interval_seconds,
            cpu_max_freq_mhz,
            cpu_min_freq_mhz,
            light_sleep_enabled,
            wifi_listen_interval,
        })
    }

    /// 測定周期（ミリ秒）
    pub fn report_interval_ms(&self) -> u64 {
        self.report_interval_seconds.saturating_mul(1000)
    }
}

fn map_validation_error(err: ValidationError) -> ConfigError {
    match err {
        ValidationError::MissingWifiSsid => ConfigError::MissingWifiSsid,
        ValidationError::MissingServer => ConfigError::MissingServer,
        ValidationError::InvalidServer(v) => ConfigError::InvalidServer(v),
        ValidationError::InvalidDeviceName(v) => ConfigError::InvalidDeviceName(v),
        ValidationError::InvalidReportInterval => ConfigError::InvalidReportInterval,
        ValidationError::InvalidFrequencyRange { min, max } => {
            ConfigError::InvalidFrequencyRange { min, max }
        }
    }
}
