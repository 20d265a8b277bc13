//! 収集サーバーへのレポート送信
//!
//! `http://<server>/report?sensor=<name>&...` へ GET を1回だけ送ります。
//! 再送・バックオフ・バッファリングは行わず、結果は [`Delivery`] として
//! 返すだけで呼び出し側に伝播させません。

use log::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::sampling::SampleReading;

/// URL バッファサイズ（終端文字を含む）
pub const URL_BUFFER_SIZE: usize = 256;

/// 整形後 URL の最大長。超えた分は黙って切り捨てる
pub const MAX_URL_LEN: usize = URL_BUFFER_SIZE - 1;

/// 送信するイベント
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportEvent {
    /// 起動通知（ESP-IDF のリセット要因コード）
    Boot { reset_code: i32 },
    /// 周期測定
    Battery(SampleReading),
}

impl ReportEvent {
    fn query(&self) -> String {
        match self {
            ReportEvent::Boot { reset_code } => format!("reset={}", reset_code),
            ReportEvent::Battery(reading) => format!("bat_v={:.2}", reading.volts),
        }
    }
}

/// レポート URL を組み立てる
pub fn format_report_url(server: &str, sensor_name: &str, event: &ReportEvent) -> String {
    let mut url = format!(
        "http://{}/report?sensor={}&{}",
        server,
        sensor_name,
        event.query()
    );
    truncate_to_boundary(&mut url, MAX_URL_LEN);
    url
}

fn truncate_to_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTPクライアントの初期化に失敗しました: {0}")]
    Init(String),
    #[error("HTTPリクエストに失敗しました: {0}")]
    Request(String),
}

/// 同期 HTTP GET
///
/// 完了（成功・失敗）まで戻らず、レスポンスボディは読み捨てる。
/// 接続ハンドルは戻る前に必ず解放すること。
pub trait HttpTransport {
    /// 成功時は HTTP ステータスコードを返す
    fn get(&mut self, url: &str) -> Result<u16, TransportError>;
}

/// 1回の送信結果（破棄してよい）
#[derive(Debug)]
pub struct Delivery {
    pub url: String,
    pub result: Result<u16, TransportError>,
}

impl Delivery {
    /// リクエストが完了した（ステータスの内容は問わない）
    pub fn is_completed(&self) -> bool {
        self.result.is_ok()
    }

    pub fn status(&self) -> Option<u16> {
        self.result.as_ref().ok().copied()
    }
}

/// レポート送信
pub struct Reporter<T: HttpTransport> {
    server: String,
    sensor_name: String,
    transport: T,
}

impl<T: HttpTransport> Reporter<T> {
    pub fn new(server: impl Into<String>, sensor_name: impl Into<String>, transport: T) -> Self {
        Self {
            server: server.into(),
            sensor_name: sensor_name.into(),
            transport,
        }
    }

    pub fn from_config(config: &AppConfig, transport: T) -> Self {
        Self::new(config.server.as_str(), config.device_name.as_str(), transport)
    }

    pub fn url_for(&self, event: &ReportEvent) -> String {
        format_report_url(&self.server, &self.sensor_name, event)
    }

    /// 1回だけ送信する。失敗しても再送しない
    pub fn report(&mut self, event: ReportEvent) -> Delivery {
        let url = self.url_for(&event);
        info!("GETリクエストを送信します: {}", url);

        let result = self.transport.get(&url);
        match &result {
            Ok(status) => debug!("レスポンス受信: HTTP {}", status),
            Err(e) => warn!("レポート送信に失敗しました（再送しません）: {}", e),
        }

        Delivery { url, result }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingTransport {
        urls: Vec<String>,
        fail: bool,
    }

    impl HttpTransport for RecordingTransport {
        fn get(&mut self, url: &str) -> Result<u16, TransportError> {
            self.urls.push(url.to_string());
            if self.fail {
                Err(TransportError::Request("ESP_ERR_HTTP_CONNECT".to_string()))
            } else {
                Ok(200)
            }
        }
    }

    fn reporter(fail: bool) -> Reporter<RecordingTransport> {
        Reporter::new(
            "host",
            "Test1",
            RecordingTransport {
                urls: Vec::new(),
                fail,
            },
        )
    }

    #[test]
    fn test_boot_report_url() {
        let url = format_report_url("host", "Test1", &ReportEvent::Boot { reset_code: 4 });
        assert_eq!(url, "http://host/report?sensor=Test1&reset=4");
    }

    #[test]
    fn test_battery_report_url_uses_two_decimals() {
        let reading = SampleReading {
            volts: 3.7,
            calibrated_mv: Some(1850),
        };
        let url = format_report_url("host", "Test1", &ReportEvent::Battery(reading));
        assert_eq!(url, "http://host/report?sensor=Test1&bat_v=3.70");
    }

    #[test]
    fn test_read_error_is_reported_as_sentinel() {
        let url = format_report_url(
            "host",
            "Test1",
            &ReportEvent::Battery(SampleReading::read_error()),
        );
        assert_eq!(url, "http://host/report?sensor=Test1&bat_v=-1.00");
    }

    #[test]
    fn test_long_url_is_truncated_silently() {
        let server = "a".repeat(300);
        let url = format_report_url(&server, "Test1", &ReportEvent::Boot { reset_code: 1 });

        assert_eq!(url.len(), MAX_URL_LEN);
        assert!(url.starts_with("http://aaa"));
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        let mut text = "ab".to_string() + &"é".repeat(10);
        truncate_to_boundary(&mut text, 5);
        assert_eq!(text, "abé");
    }

    #[test]
    fn test_report_sends_exactly_once_on_failure() {
        let mut reporter = reporter(true);
        let delivery = reporter.report(ReportEvent::Boot { reset_code: 1 });

        assert!(!delivery.is_completed());
        assert_eq!(delivery.status(), None);
        assert_eq!(reporter.transport().urls.len(), 1);
    }

    #[test]
    fn test_report_returns_status_on_success() {
        let mut reporter = reporter(false);
        let delivery = reporter.report(ReportEvent::Boot { reset_code: 3 });

        assert!(delivery.is_completed());
        assert_eq!(delivery.status(), Some(200));
        assert_eq!(delivery.url, "http://host/report?sensor=Test1&reset=3");
    }
}
