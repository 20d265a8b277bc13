use embedded_svc::http::{client::Client as HttpClient, Method, Status};
use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

use crate::core::report::{HttpTransport, TransportError};

/// esp_http_client による同期 GET
///
/// リクエストごとに接続を作成し、関数を抜けるときに必ず破棄します
/// （`esp_http_client_cleanup`）。レスポンスボディは読みません。
#[derive(Default)]
pub struct EspHttpTransport;

impl HttpTransport for EspHttpTransport {
    fn get(&mut self, url: &str) -> Result<u16, TransportError> {
        let http_conf = HttpClientConfiguration::default();
        let connection = EspHttpConnection::new(&http_conf)
            .map_err(|e| TransportError::Init(format!("{:?}", e)))?;
        let mut client = HttpClient::wrap(connection);

        let request = client
            .request(Method::Get, url, &[])
            .map_err(|e| TransportError::Request(format!("{:?}", e)))?;
        let response = request
            .submit()
            .map_err(|e| TransportError::Request(format!("{:?}", e)))?;

        Ok(response.status())
    }
}
