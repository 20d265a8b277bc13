/// 通信モジュール
pub mod http_client;
pub mod network_manager;

pub use http_client::EspHttpTransport;
pub use network_manager::{EspWifiLink, NetworkManager, WifiSession};
