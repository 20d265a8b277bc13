use esp_idf_hal::delay::FreeRtos;

use crate::core::schedule::Clock;

/// ESP-IDF 用のクロック
///
/// 時刻は `esp_timer`、待機は FreeRTOS のディレイで行います。電源管理で
/// 自動ライトスリープが有効なら、待機中は CPU がライトスリープに入ります。
pub struct EspIdfClock;

impl Clock for EspIdfClock {
    fn now_ms(&self) -> u64 {
        let micros = unsafe { esp_idf_sys::esp_timer_get_time() };
        micros.max(0) as u64 / 1000
    }

    fn sleep_ms(&self, duration_ms: u64) {
        let mut remaining = duration_ms;
        while remaining > 0 {
            let chunk = remaining.min(u64::from(u32::MAX));
            FreeRtos::delay_ms(chunk as u32);
            remaining -= chunk;
        }
    }
}
