use esp_idf_svc::hal::{
    adc::{
        attenuation::DB_6,
        oneshot::{
            config::{AdcChannelConfig, Calibration},
            AdcChannelDriver, AdcDriver,
        },
        ADC1,
    },
    gpio::Gpio0,
};
use log::info;

use crate::core::sampling::{SampleChannel, SamplingError, VoltageSampler};

/// ADC電圧センサー管理モジュール
///
/// ADC1 / GPIO0（ADC1 チャンネル0）に 1M/1M の分圧抵抗経由で電池を接続。
/// ペリフェラルの所有権だけを保持し、ドライバは測定ごとに作り直します。
pub struct VoltageSensor {
    adc: ADC1,
    pin: Gpio0,
}

/// 測定1回分のADCチャンネル（破棄時にADCユニットとキャリブレーションを解放）
pub struct VoltageSensorChannel<'a> {
    channel: AdcChannelDriver<'a, Gpio0, AdcDriver<'a, ADC1>>,
}

impl VoltageSensor {
    pub fn new(adc: ADC1, pin: Gpio0) -> Self {
        Self { adc, pin }
    }
}

impl VoltageSampler for VoltageSensor {
    type Channel<'a> = VoltageSensorChannel<'a>;

    fn begin(&mut self) -> Result<VoltageSensorChannel<'_>, SamplingError> {
        info!("ADC1を初期化しています (GPIO0, 6dB, カーブフィッティング補正)");
        let adc_driver = AdcDriver::new(&mut self.adc)
            .map_err(|e| SamplingError::Setup(format!("{:?}", e)))?;
        let adc_config = AdcChannelConfig {
            attenuation: DB_6,
            calibration: Calibration::Curve,
            ..Default::default()
        };
        let channel = AdcChannelDriver::new(adc_driver, &mut self.pin, &adc_config)
            .map_err(|e| SamplingError::Setup(format!("{:?}", e)))?;

        Ok(VoltageSensorChannel { channel })
    }
}

impl SampleChannel for VoltageSensorChannel<'_> {
    fn read_millivolts(&mut self) -> Result<u16, SamplingError> {
        self.channel
            .read()
            .map_err(|e| SamplingError::Read(format!("{:?}", e)))
    }
}
