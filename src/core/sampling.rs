//! 電池電圧のサンプリング
//!
//! ADCユニットとキャリブレーションは1回の測定ごとに確保し、測定が終わったら
//! （読み取りに失敗した場合も）必ず解放します。確保したハンドルは
//! [`VoltageSampler::Channel`] の寿命に閉じ込められ、`Drop` で解放されるため、
//! 周期をまたいで保持されることはありません。

use log::{error, info};

/// 1M/1M 分圧抵抗による補正倍率
pub const VOLTAGE_DIVIDER_RATIO: f32 = 2.0;

/// 測定に失敗した周期で報告する値（実際の電圧ではあり得ない値）
pub const READ_ERROR_VOLTS: f32 = -1.0;

#[derive(Debug, thiserror::Error)]
pub enum SamplingError {
    #[error("ADCの初期化に失敗しました: {0}")]
    Setup(String),
    #[error("ADCの読み取りに失敗しました: {0}")]
    Read(String),
}

/// 1回分の電池電圧測定値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleReading {
    /// 電池電圧（V）
    pub volts: f32,
    /// キャリブレーション後のADC入力電圧（mV）。測定失敗時は None
    pub calibrated_mv: Option<u16>,
}

impl SampleReading {
    /// キャリブレーション済みのADC入力電圧から電池電圧を求める
    pub fn from_calibrated_mv(calibrated_mv: u16) -> Self {
        Self {
            volts: battery_volts(calibrated_mv),
            calibrated_mv: Some(calibrated_mv),
        }
    }

    pub fn read_error() -> Self {
        Self {
            volts: READ_ERROR_VOLTS,
            calibrated_mv: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.calibrated_mv.is_some()
    }
}

/// `calibrate(raw) × 2 / 1000`
pub fn battery_volts(calibrated_mv: u16) -> f32 {
    f32::from(calibrated_mv) * VOLTAGE_DIVIDER_RATIO / 1000.0
}

/// 確保済みのADCチャンネル
///
/// 値が破棄されたときにADCユニットとキャリブレーションを解放すること。
pub trait SampleChannel {
    /// 1回変換し、キャリブレーション曲線を通した入力電圧（mV）を返す
    fn read_millivolts(&mut self) -> Result<u16, SamplingError>;
}

/// ADCチャンネルを確保するハードウェア境界
pub trait VoltageSampler {
    type Channel<'a>: SampleChannel
    where
        Self: 'a;

    /// ADCユニット・チャンネル設定・キャリブレーションを確保する
    fn begin(&mut self) -> Result<Self::Channel<'_>, SamplingError>;
}

/// 確保 → 読み取り → 解放 を1回実行する
///
/// 失敗はログに残して [`SampleReading::read_error`] を返し、周期の報告自体は続行させます。
pub fn sample_battery<S: VoltageSampler>(sampler: &mut S) -> SampleReading {
    let mut channel = match sampler.begin() {
        Ok(channel) => channel,
        Err(e) => {
            error!("{}. 電圧は{:.2}Vとして扱います。", e, READ_ERROR_VOLTS);
            return SampleReading::read_error();
        }
    };

    let reading = match channel.read_millivolts() {
        Ok(calibrated_mv) => {
            let reading = SampleReading::from_calibrated_mv(calibrated_mv);
            info!(
                "ADC電圧測定成功: {} mV -> 電池電圧 {:.2} V",
                calibrated_mv, reading.volts
            );
            reading
        }
        Err(e) => {
            error!("{}. 電圧は{:.2}Vとして扱います。", e, READ_ERROR_VOLTS);
            SampleReading::read_error()
        }
    };

    // リソースを明示的に解放
    drop(channel);

    reading
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counters {
        begun: Cell<u32>,
        ended: Cell<u32>,
    }

    struct MockSampler {
        counters: Counters,
        fail_begin: bool,
        result: Result<u16, &'static str>,
    }

    struct MockChannel<'a> {
        counters: &'a Counters,
        result: Result<u16, &'static str>,
    }

    impl SampleChannel for MockChannel<'_> {
        fn read_millivolts(&mut self) -> Result<u16, SamplingError> {
            self.result.map_err(|e| SamplingError::Read(e.to_string()))
        }
    }

    impl Drop for MockChannel<'_> {
        fn drop(&mut self) {
            self.counters.ended.set(self.counters.ended.get() + 1);
        }
    }

    impl VoltageSampler for MockSampler {
        type Channel<'a> = MockChannel<'a>;

        fn begin(&mut self) -> Result<MockChannel<'_>, SamplingError> {
            if self.fail_begin {
                return Err(SamplingError::Setup("unit busy".to_string()));
            }
            self.counters.begun.set(self.counters.begun.get() + 1);
            Ok(MockChannel {
                counters: &self.counters,
                result: self.result,
            })
        }
    }

    fn sampler(result: Result<u16, &'static str>) -> MockSampler {
        MockSampler {
            counters: Counters::default(),
            fail_begin: false,
            result,
        }
    }

    #[test]
    fn test_1500mv_reports_3_volts() {
        let mut sampler = sampler(Ok(1500));
        let reading = sample_battery(&mut sampler);

        assert_eq!(reading.volts, 3.0);
        assert_eq!(reading.calibrated_mv, Some(1500));
        assert!(reading.is_valid());
    }

    #[test]
    fn test_battery_volts_applies_divider_and_unit_conversion() {
        assert_eq!(battery_volts(0), 0.0);
        assert_eq!(battery_volts(1850), 3.7);
        assert!((battery_volts(2100) - 4.2).abs() < 1e-6);
    }

    #[test]
    fn test_channel_released_after_successful_read() {
        let mut sampler = sampler(Ok(1800));
        sample_battery(&mut sampler);

        assert_eq!(sampler.counters.begun.get(), 1);
        assert_eq!(sampler.counters.ended.get(), 1);
    }

    #[test]
    fn test_channel_released_after_failed_read() {
        let mut sampler = sampler(Err("timeout"));
        let reading = sample_battery(&mut sampler);

        assert_eq!(reading, SampleReading::read_error());
        assert_eq!(sampler.counters.begun.get(), 1);
        assert_eq!(sampler.counters.ended.get(), 1);
    }

    #[test]
    fn test_setup_failure_reports_sentinel_without_allocation() {
        let mut sampler = sampler(Ok(1500));
        sampler.fail_begin = true;
        let reading = sample_battery(&mut sampler);

        assert_eq!(reading.volts, READ_ERROR_VOLTS);
        assert!(!reading.is_valid());
        assert_eq!(sampler.counters.begun.get(), 0);
        assert_eq!(sampler.counters.ended.get(), 0);
    }

    #[test]
    fn test_repeated_cycles_never_hold_channel() {
        let mut sampler = sampler(Ok(1600));
        for cycle in 1..=10 {
            sample_battery(&mut sampler);
            assert_eq!(sampler.counters.begun.get(), cycle);
            assert_eq!(sampler.counters.ended.get(), cycle);
        }
    }
}
