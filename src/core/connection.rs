//! Wi-Fi 接続の状態機械
//!
//! リンク層イベントとIP取得イベントを `LinkEvent` として受け取り、
//! 単一の遷移関数 [`ConnectionMachine::handle`] で状態を進めます。
//! イベントはイベントループタスクから届き、起動シーケンス側は
//! [`ConnectionManager::wait_for_outcome`] で終端シグナルだけを待ちます。

use log::{error, info, warn};
use std::sync::{Condvar, Mutex, PoisonError};

/// IP取得成功後に補充される再接続回数
pub const FULL_RETRY_BUDGET: u8 = 5;

/// 接続状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Failed,
}

/// 起動時の待機が返す終端結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    Joined,
    Exhausted,
}

/// イベントループから届く型付きメッセージ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// STA が起動した
    Started,
    /// AP から切断された（接続失敗を含む）
    Disconnected,
    /// DHCP でアドレスを取得した
    AddressAcquired,
}

/// 遷移の結果として実行すべき副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    RequestConnect,
    Signal(ConnectionOutcome),
}

/// 残りの自動再接続回数
///
/// 初期値は 0 で、IP取得に成功したときだけ [`FULL_RETRY_BUDGET`] に戻ります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryBudget(u8);

impl RetryBudget {
    pub const fn empty() -> Self {
        RetryBudget(0)
    }

    pub const fn full() -> Self {
        RetryBudget(FULL_RETRY_BUDGET)
    }

    pub fn remaining(&self) -> u8 {
        self.0
    }

    pub fn is_exhausted(&self) -> bool {
        self.0 == 0
    }

    /// 1回分を消費する。残りが無ければ false
    fn try_consume(&mut self) -> bool {
        if self.0 > 0 {
            self.0 -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        self.0 = FULL_RETRY_BUDGET;
    }
}

/// 純粋な状態遷移（ハードウェア非依存）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMachine {
    state: ConnectionState,
    budget: RetryBudget,
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            budget: RetryBudget::empty(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retry_budget(&self) -> RetryBudget {
        self.budget
    }

    /// イベントを1つ適用し、呼び出し側が実行すべき副作用を返す
    pub fn handle(&mut self, event: LinkEvent) -> LinkAction {
        match event {
            LinkEvent::Started => {
                self.state = ConnectionState::Connecting;
                LinkAction::RequestConnect
            }
            LinkEvent::Disconnected => {
                if self.budget.try_consume() {
                    self.state = ConnectionState::Connecting;
                    LinkAction::RequestConnect
                } else {
                    self.state = ConnectionState::Failed;
                    LinkAction::Signal(ConnectionOutcome::Exhausted)
                }
            }
            LinkEvent::AddressAcquired => {
                self.budget.refill();
                self.state = ConnectionState::Connected;
                LinkAction::Signal(ConnectionOutcome::Joined)
            }
        }
    }
}

/// 終端シグナル（イベントグループ相当）
///
/// 最初に届いた結果を保持し、`wait` が取り出した時点でクリアされます。
#[derive(Debug, Default)]
pub struct ConnectionSignal {
    outcome: Mutex<Option<ConnectionOutcome>>,
    ready: Condvar,
}

impl ConnectionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self, outcome: ConnectionOutcome) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(outcome);
        }
        self.ready.notify_all();
    }

    /// どちらかの終端結果が届くまでタイムアウト無しで待機する
    pub fn wait(&self) -> ConnectionOutcome {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = slot.take() {
                return outcome;
            }
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// 待機せずに結果を取り出す
    #[cfg(test)]
    fn try_take(&self) -> Option<ConnectionOutcome> {
        self.outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// 無線ドライバへの接続要求
///
/// 実機では `esp_wifi_connect()`、テストでは呼び出し回数を記録するモックを使います。
pub trait LinkControl: Send + Sync {
    fn request_connect(&self) -> anyhow::Result<()>;
}

/// 接続マネージャー
///
/// 状態と再接続回数はイベントコールバックからのみ書き換えられ、
/// メインタスクは終端シグナルを待つだけです。
pub struct ConnectionManager<L: LinkControl> {
    machine: Mutex<ConnectionMachine>,
    signal: ConnectionSignal,
    link: L,
}

impl<L: LinkControl> ConnectionManager<L> {
    pub fn new(link: L) -> Self {
        Self {
            machine: Mutex::new(ConnectionMachine::new()),
            signal: ConnectionSignal::new(),
            link,
        }
    }

    /// イベントを状態機械に流し、接続要求またはシグナル送出を実行する
    pub fn dispatch(&self, event: LinkEvent) -> LinkAction {
        let (action, budget) = {
            let mut machine = self.machine.lock().unwrap_or_else(PoisonError::into_inner);
            let action = machine.handle(event);
            (action, machine.retry_budget())
        };

        match (event, action) {
            (LinkEvent::Started, LinkAction::RequestConnect) => {
                info!("WiFi STA が起動しました。APへ接続します");
                self.request_connect();
            }
            (_, LinkAction::RequestConnect) => {
                info!("APへの再接続を試みます (残り{}回)", budget.remaining());
                self.request_connect();
            }
            (_, LinkAction::Signal(ConnectionOutcome::Joined)) => {
                info!("IPアドレスを取得しました。再接続回数を{}回にリセット", budget.remaining());
                self.signal.notify(ConnectionOutcome::Joined);
            }
            (_, LinkAction::Signal(ConnectionOutcome::Exhausted)) => {
                warn!("APへの接続に失敗しました（再接続回数を使い切りました）");
                self.signal.notify(ConnectionOutcome::Exhausted);
            }
        }

        action
    }

    fn request_connect(&self) {
        // 失敗はログのみ。次の切断イベントで再試行される
        if let Err(e) = self.link.request_connect() {
            error!("接続要求に失敗しました: {:?}", e);
        }
    }

    /// Joined / Exhausted のどちらかが届くまで待機する
    pub fn wait_for_outcome(&self) -> ConnectionOutcome {
        self.signal.wait()
    }

    pub fn state(&self) -> ConnectionState {
        self.machine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
    }

    pub fn retry_budget(&self) -> RetryBudget {
        self.machine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retry_budget()
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}
