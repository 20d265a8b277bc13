/// DHCP ホスト名として使える最大長（esp-netif の制限）
pub const MAX_DEVICE_NAME_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingWifiSsid,
    MissingServer,
    InvalidServer(String),
    InvalidDeviceName(String),
    InvalidReportInterval,
    InvalidFrequencyRange { min: u32, max: u32 },
}

pub fn validate_wifi_ssid(ssid: &str) -> Result<(), ValidationError> {
    if ssid.is_empty() {
        Err(ValidationError::MissingWifiSsid)
    } else {
        Ok(())
    }
}

/// デバイス名はホスト名とURLクエリの両方に使うため、英数字と `-` のみ許可
pub fn validate_device_name(name: &str) -> Result<(), ValidationError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_DEVICE_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidDeviceName(name.to_string()))
    }
}

/// `host` または `host:port` 形式のみ受け付ける（スキームやパスは URL テンプレート側で付与）
pub fn validate_server(server: &str) -> Result<(), ValidationError> {
    if server.is_empty() {
        return Err(ValidationError::MissingServer);
    }

    let has_forbidden = server
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'));
    if has_forbidden {
        return Err(ValidationError::InvalidServer(server.to_string()));
    }

    if let Some((host, port)) = server.rsplit_once(':') {
        if host.is_empty() || port.parse::<u16>().is_err() {
            return Err(ValidationError::InvalidServer(server.to_string()));
        }
    }

    Ok(())
}

pub fn validate_report_interval(seconds: u64) -> Result<(), ValidationError> {
    if seconds == 0 {
        Err(ValidationError::InvalidReportInterval)
    } else {
        Ok(())
    }
}

pub fn validate_frequency_range(min_mhz: u32, max_mhz: u32) -> Result<(), ValidationError> {
    if min_mhz == 0 || min_mhz > max_mhz {
        Err(ValidationError::InvalidFrequencyRange {
            min: min_mhz,
            max: max_mhz,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_accepts_host_and_host_port() {
        assert_eq!(validate_server("host"), Ok(()));
        assert_eq!(validate_server("192.168.1.10"), Ok(()));
        assert_eq!(validate_server("collector.local:8080"), Ok(()));
    }

    #[test]
    fn test_server_rejects_scheme_and_path() {
        assert!(validate_server("http://host").is_err());
        assert!(validate_server("host/report").is_err());
        assert!(validate_server("host:").is_err());
        assert!(validate_server("host:99999").is_err());
        assert!(validate_server(":8080").is_err());
    }

    #[test]
    fn test_device_name_length_limit() {
        let name = "a".repeat(MAX_DEVICE_NAME_LEN);
        assert_eq!(validate_device_name(&name), Ok(()));

        let too_long = "a".repeat(MAX_DEVICE_NAME_LEN + 1);
        assert!(validate_device_name(&too_long).is_err());
    }

    #[test]
    fn test_device_name_rejects_query_characters() {
        assert!(validate_device_name("a&b").is_err());
        assert!(validate_device_name("a=b").is_err());
        assert!(validate_device_name("").is_err());
        assert_eq!(validate_device_name("node-01"), Ok(()));
    }

    #[test]
    fn test_frequency_range_equal_bounds_allowed() {
        assert_eq!(validate_frequency_range(80, 80), Ok(()));
        assert!(validate_frequency_range(0, 80).is_err());
    }
}
