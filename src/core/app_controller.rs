use log::{info, warn};

use crate::config::AppConfig;
use crate::core::connection::ConnectionOutcome;
use crate::core::report::{Delivery, HttpTransport, ReportEvent, Reporter};
use crate::core::reset_reason::ResetReason;
use crate::core::sampling::{sample_battery, VoltageSampler};
use crate::core::schedule::{Clock, ScheduleClock};
use crate::power::{PowerManagement, PowerProfile};

/// アプリケーションの主要な制御フローを管理するモジュール
///
/// 接続完了後の起動シーケンス（電源管理設定 → 起動レポート）と、
/// 「測定 → 送信 → 次の起床予定まで待機」の周期ループを担当します。
pub struct AppController<S: VoltageSampler, T: HttpTransport, C: Clock> {
    sampler: S,
    reporter: Reporter<T>,
    clock: C,
    period_ms: u64,
}

impl<S: VoltageSampler, T: HttpTransport, C: Clock> AppController<S, T, C> {
    pub fn new(config: &AppConfig, sampler: S, transport: T, clock: C) -> Self {
        Self {
            sampler,
            reporter: Reporter::from_config(config, transport),
            clock,
            period_ms: config.report_interval_ms(),
        }
    }

    /// 接続待機が終わった後の起動処理
    ///
    /// 接続に失敗していても同じ手順で続行する（送信は失敗して捨てられる）。
    /// 電源管理の設定失敗は致命的エラーとして返す。
    pub fn start<P: PowerManagement>(
        &mut self,
        outcome: ConnectionOutcome,
        power: &P,
        profile: &PowerProfile,
        reset_reason: ResetReason,
    ) -> anyhow::Result<Delivery> {
        if outcome == ConnectionOutcome::Exhausted {
            warn!("WiFi接続に失敗しましたが、起動シーケンスを続行します");
        }

        power.configure(profile)?;

        info!(
            "リセット要因: {} (code {})",
            reset_reason.description(),
            reset_reason.code()
        );
        Ok(self.reporter.report(ReportEvent::Boot {
            reset_code: reset_reason.code(),
        }))
    }

    /// 測定して1回送信する
    pub fn run_cycle(&mut self) -> Delivery {
        let reading = sample_battery(&mut self.sampler);
        self.reporter.report(ReportEvent::Battery(reading))
    }

    /// 周期ループの起点（現在時刻）
    pub fn start_schedule(&self) -> ScheduleClock {
        ScheduleClock::starting_now(&self.clock, self.period_ms)
    }

    /// 1周期分: 測定・送信してから次の起床予定時刻まで待機する
    pub fn tick(&mut self, schedule: &mut ScheduleClock) -> Delivery {
        let delivery = self.run_cycle();
        schedule.delay_until(&self.clock);
        delivery
    }

    /// 電源が切れるまで周期ループを続ける
    pub fn run(&mut self) -> ! {
        let mut schedule = self.start_schedule();
        info!("=== 測定ループを開始します (周期 {}ms) ===", self.period_ms);
        loop {
            self.tick(&mut schedule);
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
