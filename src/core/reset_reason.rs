/// 直前のリセット要因（`esp_reset_reason_t`）
///
/// 起動レポートには数値コードをそのまま載せます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    Unknown,
    PowerOn,
    External,
    Software,
    Panic,
    InterruptWatchdog,
    TaskWatchdog,
    OtherWatchdog,
    DeepSleep,
    Brownout,
    Sdio,
    Usb,
    Jtag,
    Efuse,
    PowerGlitch,
    CpuLockup,
    /// 未知のコード（値はそのまま保持）
    Other(i32),
}

impl ResetReason {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ResetReason::Unknown,
            1 => ResetReason::PowerOn,
            2 => ResetReason::External,
            3 => ResetReason::Software,
            4 => ResetReason::Panic,
            5 => ResetReason::InterruptWatchdog,
            6 => ResetReason::TaskWatchdog,
            7 => ResetReason::OtherWatchdog,
            8 => ResetReason::DeepSleep,
            9 => ResetReason::Brownout,
            10 => ResetReason::Sdio,
            11 => ResetReason::Usb,
            12 => ResetReason::Jtag,
            13 => ResetReason::Efuse,
            14 => ResetReason::PowerGlitch,
            15 => ResetReason::CpuLockup,
            other => ResetReason::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ResetReason::Unknown => 0,
            ResetReason::PowerOn => 1,
            ResetReason::External => 2,
            ResetReason::Software => 3,
            ResetReason::Panic => 4,
            ResetReason::InterruptWatchdog => 5,
            ResetReason::TaskWatchdog => 6,
            ResetReason::OtherWatchdog => 7,
            ResetReason::DeepSleep => 8,
            ResetReason::Brownout => 9,
            ResetReason::Sdio => 10,
            ResetReason::Usb => 11,
            ResetReason::Jtag => 12,
            ResetReason::Efuse => 13,
            ResetReason::PowerGlitch => 14,
            ResetReason::CpuLockup => 15,
            ResetReason::Other(code) => *code,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ResetReason::Unknown => "UNKNOWN (不明)",
            ResetReason::PowerOn => "POWERON (電源投入)",
            ResetReason::External => "EXT (外部ピンリセット)",
            ResetReason::Software => "SW (ソフトウェアリセット)",
            ResetReason::Panic => "PANIC (例外/パニック)",
            ResetReason::InterruptWatchdog => "INT_WDT (割り込みWDT)",
            ResetReason::TaskWatchdog => "TASK_WDT (タスクWDT)",
            ResetReason::OtherWatchdog => "WDT (その他WDT)",
            ResetReason::DeepSleep => "DEEPSLEEP (ディープスリープ復帰)",
            ResetReason::Brownout => "BROWNOUT (電圧低下検出)",
            ResetReason::Sdio => "SDIO (SDIOホストリセット)",
            ResetReason::Usb => "USB (USBリセット)",
            ResetReason::Jtag => "JTAG (JTAGリセット)",
            ResetReason::Efuse => "EFUSE (eFuseエラー)",
            ResetReason::PowerGlitch => "PWR_GLITCH (電源グリッチ)",
            ResetReason::CpuLockup => "CPU_LOCKUP (CPUロックアップ)",
            ResetReason::Other(_) => "OTHER (未定義のコード)",
        }
    }

    /// 現在のリセット要因を読み出す
    #[cfg(target_os = "espidf")]
    pub fn read() -> Self {
        let code = unsafe { esp_idf_sys::esp_reset_reason() };
        Self::from_code(code as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip_for_known_and_unknown_codes() {
        for code in [0, 1, 4, 8, 9, 15, 42, -1] {
            assert_eq!(ResetReason::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_panic_code() {
        assert_eq!(ResetReason::from_code(4), ResetReason::Panic);
        assert_eq!(ResetReason::Panic.description(), "PANIC (例外/パニック)");
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        assert_eq!(ResetReason::from_code(99), ResetReason::Other(99));
    }
}
