//! ドリフトしない周期スケジュール
//!
//! 次の起床時刻は「前回の起床予定時刻 + 周期」で求め、処理にかかった時間は
//! スリープ時間から差し引かれます（FreeRTOS の `vTaskDelayUntil` と同じ規則）。

use log::warn;

/// 単調増加する時刻とスリープ
///
/// 実機ではスリープ中に自動ライトスリープへ入ります。
pub trait Clock {
    /// 起動からの経過時間（ミリ秒）
    fn now_ms(&self) -> u64;

    fn sleep_ms(&self, duration_ms: u64);
}

/// 前回の起床予定時刻を保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleClock {
    last_wake_ms: u64,
    period_ms: u64,
}

impl ScheduleClock {
    pub fn new(last_wake_ms: u64, period_ms: u64) -> Self {
        Self {
            last_wake_ms,
            period_ms,
        }
    }

    /// 現在時刻を起点にする
    pub fn starting_now<C: Clock>(clock: &C, period_ms: u64) -> Self {
        Self::new(clock.now_ms(), period_ms)
    }

    pub fn last_wake_ms(&self) -> u64 {
        self.last_wake_ms
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn next_deadline_ms(&self) -> u64 {
        self.last_wake_ms.saturating_add(self.period_ms)
    }

    /// 次の起床予定時刻まで待機し、起床時刻を1周期進める
    ///
    /// 予定時刻を既に過ぎていれば待たずに戻る。起床時刻はその場合も
    /// 1周期だけ進むため、遅れた分は以降の周期で取り戻される。
    /// 戻り値は実際に待機した時間（ミリ秒）。
    pub fn delay_until<C: Clock>(&mut self, clock: &C) -> u64 {
        let deadline = self.next_deadline_ms();
        let now = clock.now_ms();

        let slept = if now < deadline {
            let remaining = deadline - now;
            clock.sleep_ms(remaining);
            remaining
        } else {
            warn!(
                "処理が周期を超過しました ({}ms 遅れ)。待機せずに次の周期へ進みます",
                now - deadline
            );
            0
        };

        self.last_wake_ms = deadline;
        slept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct FakeClock {
        now: Cell<u64>,
    }

    impl FakeClock {
        fn advance(&self, ms: u64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }

        fn sleep_ms(&self, duration_ms: u64) {
            self.advance(duration_ms);
        }
    }

    #[test]
    fn test_deadlines_do_not_drift_with_variable_work() {
        let clock = FakeClock::default();
        clock.advance(1234);
        let mut schedule = ScheduleClock::starting_now(&clock, 60_000);
        let origin = schedule.last_wake_ms();

        let work_durations = [0, 150, 59_999, 3, 42_000, 1, 30_000];
        for (n, work_ms) in work_durations.iter().enumerate() {
            clock.advance(*work_ms);
            schedule.delay_until(&clock);

            let expected = origin + (n as u64 + 1) * 60_000;
            assert_eq!(schedule.last_wake_ms(), expected);
            assert_eq!(clock.now_ms(), expected);
        }
    }

    #[test]
    fn test_sleep_duration_accounts_for_work_time() {
        let clock = FakeClock::default();
        let mut schedule = ScheduleClock::starting_now(&clock, 60_000);

        clock.advance(2_500);
        assert_eq!(schedule.delay_until(&clock), 57_500);
    }

    #[test]
    fn test_overrun_returns_immediately_and_catches_up() {
        let clock = FakeClock::default();
        let mut schedule = ScheduleClock::starting_now(&clock, 60_000);

        // 1周期半の処理
        clock.advance(90_000);
        assert_eq!(schedule.delay_until(&clock), 0);
        assert_eq!(schedule.last_wake_ms(), 60_000);

        // 次の予定は 120_000 のまま（起点からの位相を保つ）
        assert_eq!(schedule.delay_until(&clock), 30_000);
        assert_eq!(clock.now_ms(), 120_000);
    }

    #[test]
    fn test_next_deadline() {
        let schedule = ScheduleClock::new(5_000, 60_000);
        assert_eq!(schedule.next_deadline_ms(), 65_000);
        assert_eq!(schedule.period_ms(), 60_000);
    }
}
