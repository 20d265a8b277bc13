use std::sync::Arc;

use anyhow::anyhow;
use esp_idf_svc::{
    eventloop::{EspSubscription, EspSystemEventLoop, System},
    hal::modem::Modem,
    ipv4::{
        ClientConfiguration as IpClientConfiguration, Configuration as IpConfiguration,
        DHCPClientSettings,
    },
    netif::{EspNetif, IpEvent, NetifConfiguration},
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent},
};
use esp_idf_sys::{
    esp, esp_wifi_connect, esp_wifi_get_config, esp_wifi_set_config, esp_wifi_set_ps,
    wifi_config_t, wifi_interface_t_WIFI_IF_STA, wifi_ps_type_t_WIFI_PS_MAX_MODEM,
};
use log::{info, warn};

use crate::config::AppConfig;
use crate::core::connection::{ConnectionManager, ConnectionOutcome, LinkControl, LinkEvent};

/// `esp_wifi_connect()` を発行するリンク制御
pub struct EspWifiLink;

impl LinkControl for EspWifiLink {
    fn request_connect(&self) -> anyhow::Result<()> {
        esp!(unsafe { esp_wifi_connect() })?;
        Ok(())
    }
}

/// 接続後もプロセス終了まで保持する WiFi 関連リソース
///
/// ドライバとイベント購読を破棄しないことで、運用中の切断も
/// 接続マネージャーの再接続処理に流れ続けます。
pub struct WifiSession {
    _wifi: EspWifi<'static>,
    manager: Arc<ConnectionManager<EspWifiLink>>,
    _wifi_subscription: EspSubscription<'static, System>,
    _ip_subscription: EspSubscription<'static, System>,
}

impl WifiSession {
    pub fn manager(&self) -> &ConnectionManager<EspWifiLink> {
        &self.manager
    }
}

/// WiFi の初期化と接続を管理するモジュール
pub struct NetworkManager;

impl NetworkManager {
    /// STA モードで AP に接続し、Joined / Exhausted のどちらかが届くまで待機する
    ///
    /// ドライバ初期化・設定・起動の失敗は致命的エラーとして返す。
    /// 待機にタイムアウトは無い。
    pub fn connect(
        modem: Modem,
        sysloop: &EspSystemEventLoop,
        nvs_partition: &EspDefaultNvsPartition,
        config: &AppConfig,
    ) -> anyhow::Result<(WifiSession, ConnectionOutcome)> {
        info!("WiFiをSTAモードで準備します。SSID: {}", config.wifi_ssid);

        let mut wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs_partition.clone()))?;

        // DHCP ホスト名にデバイス名を使う
        let mut netif_conf = NetifConfiguration::wifi_default_client();
        netif_conf.ip_configuration = Some(IpConfiguration::Client(IpClientConfiguration::DHCP(
            DHCPClientSettings {
                hostname: Some(
                    config
                        .device_name
                        .as_str()
                        .try_into()
                        .map_err(|_| anyhow!("デバイス名が長すぎます: {}", config.device_name))?,
                ),
            },
        )));
        wifi.swap_netif_sta(EspNetif::new_with_conf(&netif_conf)?)?;

        let auth_method = if config.wifi_password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("WiFi SSIDが長すぎます"))?,
            password: config
                .wifi_password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("WiFi パスワードが長すぎます"))?,
            auth_method,
            ..Default::default()
        }))?;
        Self::apply_listen_interval(config.wifi_listen_interval)?;

        let manager = Arc::new(ConnectionManager::new(EspWifiLink));

        let wifi_manager = Arc::clone(&manager);
        let wifi_subscription = sysloop.subscribe::<WifiEvent, _>(move |event| match event {
            WifiEvent::StaStarted => {
                wifi_manager.dispatch(LinkEvent::Started);
            }
            WifiEvent::StaDisconnected(_) => {
                wifi_manager.dispatch(LinkEvent::Disconnected);
            }
            _ => {}
        })?;

        let ip_manager = Arc::clone(&manager);
        let ip_subscription = sysloop.subscribe::<IpEvent, _>(move |event| {
            if let IpEvent::DhcpIpAssigned(_) = event {
                ip_manager.dispatch(LinkEvent::AddressAcquired);
            }
        })?;

        wifi.start()?;
        info!("WiFiを起動しました");

        // MAX は listen interval を使い、MIN は毎ビーコン受信
        esp!(unsafe { esp_wifi_set_ps(wifi_ps_type_t_WIFI_PS_MAX_MODEM) })?;
        info!("Wi-Fi Power Save を MAX_MODEM に設定しました");

        let outcome = manager.wait_for_outcome();
        match outcome {
            ConnectionOutcome::Joined => match wifi.sta_netif().get_ip_info() {
                Ok(ip_info) => info!("WiFi接続完了。IPアドレス: {}", ip_info.ip),
                Err(e) => warn!("IP情報の取得に失敗しました: {:?}", e),
            },
            ConnectionOutcome::Exhausted => warn!("WiFi接続に失敗しました"),
        }

        Ok((
            WifiSession {
                _wifi: wifi,
                manager,
                _wifi_subscription: wifi_subscription,
                _ip_subscription: ip_subscription,
            },
            outcome,
        ))
    }

    /// `ClientConfiguration` に無い listen interval を直接設定する
    fn apply_listen_interval(listen_interval: u16) -> anyhow::Result<()> {
        unsafe {
            let mut wifi_config: wifi_config_t = std::mem::zeroed();
            esp!(esp_wifi_get_config(
                wifi_interface_t_WIFI_IF_STA,
                &mut wifi_config
            ))?;
            wifi_config.sta.listen_interval = listen_interval;
            esp!(esp_wifi_set_config(
                wifi_interface_t_WIFI_IF_STA,
                &mut wifi_config
            ))?;
        }
        info!("listen interval を {} に設定しました", listen_interval);
        Ok(())
    }
}
