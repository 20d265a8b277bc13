/// アプリケーションのメインエントリーポイント
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use battery_report_node::{
        power::{EspIdfClock, EspIdfPowerManagement},
        AppConfig, AppController, EspHttpTransport, NetworkManager, PowerProfile, ResetReason,
        VoltageSensor,
    };
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
    use log::{error, info};

    // ESP-IDFの基本初期化
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    // 設定ファイル読み込み
    let app_config = AppConfig::load().map_err(|e| {
        error!("設定ファイルの読み込みに失敗しました: {}", e);
        anyhow::anyhow!("設定ファイルの読み込みエラー: {}", e)
    })?;
    info!(
        "センサー名: {}, 送信先: {}, 周期: {}秒",
        app_config.device_name, app_config.server, app_config.report_interval_seconds
    );

    // ペリフェラルとシステムリソースの初期化（NVS の初期化を含む）
    info!("ペリフェラルを初期化しています");
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ネットワーク（WiFi）接続。Joined / Exhausted のどちらでも続行する
    let (wifi_session, outcome) =
        NetworkManager::connect(peripherals.modem, &sysloop, &nvs_partition, &app_config)?;
    info!(
        "接続状態: {:?}, 残り再接続回数: {}",
        wifi_session.manager().state(),
        wifi_session.manager().retry_budget().remaining()
    );

    let mut controller = AppController::new(
        &app_config,
        VoltageSensor::new(peripherals.adc1, peripherals.pins.gpio0),
        EspHttpTransport,
        EspIdfClock,
    );

    controller.start(
        outcome,
        &EspIdfPowerManagement,
        &PowerProfile::from_config(&app_config),
        ResetReason::read(),
    )?;

    controller.run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "battery_report_node {} は ESP-IDF 向けのファームウェアです。\
         `cargo build --target riscv32imc-esp-espidf` でビルドしてください。",
        battery_report_node::VERSION
    );
}
