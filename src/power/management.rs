use crate::config::AppConfig;

/// 動的周波数制御と自動ライトスリープの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerProfile {
    pub max_freq_mhz: u32,
    pub min_freq_mhz: u32,
    pub light_sleep_enable: bool,
}

impl Default for PowerProfile {
    fn default() -> Self {
        Self {
            max_freq_mhz: 80,
            min_freq_mhz: 40,
            light_sleep_enable: true,
        }
    }
}

impl PowerProfile {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_freq_mhz: config.cpu_max_freq_mhz,
            min_freq_mhz: config.cpu_min_freq_mhz,
            light_sleep_enable: config.light_sleep_enabled,
        }
    }
}

/// Platform-agnostic power-management abstraction.
pub trait PowerManagement {
    /// Apply the profile. Failure is a fatal startup error.
    fn configure(&self, profile: &PowerProfile) -> anyhow::Result<()>;
}

/// ESP-IDF specific power-management implementation (`esp_pm_configure`).
#[cfg(target_os = "espidf")]
pub struct EspIdfPowerManagement;

#[cfg(target_os = "espidf")]
impl PowerManagement for EspIdfPowerManagement {
    fn configure(&self, profile: &PowerProfile) -> anyhow::Result<()> {
        use esp_idf_sys::{esp, esp_pm_config_t, esp_pm_configure};
        use log::info;

        let pm_config = esp_pm_config_t {
            max_freq_mhz: profile.max_freq_mhz as i32,
            min_freq_mhz: profile.min_freq_mhz as i32,
            light_sleep_enable: profile.light_sleep_enable,
        };

        esp!(unsafe { esp_pm_configure(&pm_config as *const esp_pm_config_t as *const _) })?;

        info!(
            "電源管理を設定しました: {}-{} MHz, 自動ライトスリープ: {}",
            profile.min_freq_mhz, profile.max_freq_mhz, profile.light_sleep_enable
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_matches_low_power_range() {
        let profile = PowerProfile::default();
        assert_eq!(profile.min_freq_mhz, 40);
        assert_eq!(profile.max_freq_mhz, 80);
        assert!(profile.light_sleep_enable);
    }

    #[test]
    fn test_profile_from_config() {
        let config =
            AppConfig::from_values("farm-ap", "", "Test1", "host", 60, (10, 160), false, 10)
                .unwrap();
        let profile = PowerProfile::from_config(&config);

        assert_eq!(
            profile,
            PowerProfile {
                max_freq_mhz: 160,
                min_freq_mhz: 10,
                light_sleep_enable: false,
            }
        );
    }
}
