//! End-to-end tests through the async engine.
//!
//! Each test builds a fresh engine over an in-memory wallet and a manual
//! clock, then drives it only through public operations.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use smartbet_engine::SmartBet;
use smartbet_ledger::{Clock, FundsTransfer, InMemoryWallet, ManualClock};
use smartbet_types::{
    EngineConfig, Event, MatchId, MatchStatus, PayoutPolicy, Principal, SmartbetError,
};

type Engine = SmartBet<InMemoryWallet, Arc<ManualClock>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    engine: Engine,
    clock: Arc<ManualClock>,
    owner: Principal,
}

impl Harness {
    fn new() -> Self {
        Self::with(|c| c, InMemoryWallet::new())
    }

    fn with(configure: impl FnOnce(EngineConfig) -> EngineConfig, wallet: InMemoryWallet) -> Self {
        init_tracing();
        let owner = Principal::from_label("owner");
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let config = configure(EngineConfig::new(owner));
        let engine = SmartBet::new(config, wallet, Arc::clone(&clock)).unwrap();
        Self {
            engine,
            clock,
            owner,
        }
    }

    /// Registered principal whose wallet holds one unit.
    async fn player(&self, label: &str) -> Principal {
        let p = Principal::from_label(label);
        self.engine.transfer().fund(p, Decimal::ONE).await;
        self.engine.register_user(p).await.unwrap();
        p
    }

    /// A match kicking off one day from now.
    async fn fixture(&self) -> MatchId {
        let kickoff = self.at(Duration::seconds(86_400));
        self.engine
            .add_match(self.owner, "Team1", "Team2", kickoff)
            .await
            .unwrap()
    }

    /// Engine time shifted by `offset`.
    fn at(&self, offset: Duration) -> DateTime<Utc> {
        self.clock.now() + offset
    }

    fn fee(&self) -> Decimal {
        self.engine.entry_fee()
    }

    async fn assert_solvent(&self) {
        self.engine.verify_custody().await.unwrap();
    }
}

#[tokio::test]
async fn bet_settle_withdraw_net_of_transfer_cost() {
    let cost = Decimal::new(1, 3);
    let h = Harness::with(|c| c, InMemoryWallet::with_transfer_cost(cost));
    let alice = h.player("addr1").await;

    let m = h.fixture().await;
    assert_eq!(m, MatchId(0));
    h.engine.place_bet(alice, m, 2, 1, h.fee()).await.unwrap();
    h.assert_solvent().await;

    h.engine.finish_match(h.owner, m, 2, 1).await.unwrap();
    assert!(h.engine.winnings(alice).await > Decimal::ZERO);
    h.assert_solvent().await;

    let before = h.engine.transfer().balance(alice).await;
    let paid = h.engine.withdraw_winnings(alice).await.unwrap();
    let after = h.engine.transfer().balance(alice).await;

    assert_eq!(paid, h.fee());
    assert_eq!(h.engine.winnings(alice).await, Decimal::ZERO);
    assert_eq!(after, before + paid - cost);
    assert!(after > before);
    h.assert_solvent().await;
}

#[tokio::test]
async fn match_in_the_past_never_takes_bets() {
    let h = Harness::new();
    let alice = h.player("addr1").await;
    let kickoff = h.at(Duration::seconds(-10));
    let m = h
        .engine
        .add_match(h.owner, "Team1", "Team2", kickoff)
        .await
        .unwrap();

    let err = h.engine.place_bet(alice, m, 1, 1, h.fee()).await.unwrap_err();
    assert!(matches!(err, SmartbetError::BettingClosed { .. }));
    assert_eq!(h.engine.bet_count().await, 0);
}

#[tokio::test]
async fn betting_closes_at_kickoff() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;

    h.clock.advance(Duration::seconds(86_399));
    h.engine.place_bet(alice, m, 0, 0, h.fee()).await.unwrap();

    h.clock.advance(Duration::seconds(1));
    let err = h.engine.place_bet(alice, m, 0, 0, h.fee()).await.unwrap_err();
    assert!(matches!(err, SmartbetError::BettingClosed { .. }));
    assert_eq!(h.engine.bet_count().await, 1);
}

#[tokio::test]
async fn second_registration_rejected() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let err = h.engine.register_user(alice).await.unwrap_err();
    assert!(matches!(err, SmartbetError::AlreadyRegistered(_)));
    assert_eq!(err.code(), 200);
}

#[tokio::test]
async fn stake_must_be_exactly_the_fee() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;

    for wrong in [Decimal::new(2, 2), Decimal::new(5, 3), Decimal::ZERO] {
        let err = h.engine.place_bet(alice, m, 1, 0, wrong).await.unwrap_err();
        assert!(matches!(err, SmartbetError::IncorrectAmount { .. }));
    }
    assert_eq!(h.engine.bet_count().await, 0);
    assert_eq!(h.engine.transfer().balance(alice).await, Decimal::ONE);
}

#[tokio::test]
async fn exact_score_only() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let bob = h.player("bob").await;
    let carol = h.player("carol").await;
    let m = h.fixture().await;

    h.engine.place_bet(alice, m, 2, 1, h.fee()).await.unwrap();
    h.engine.place_bet(bob, m, 1, 2, h.fee()).await.unwrap();
    h.engine.place_bet(carol, m, 3, 1, h.fee()).await.unwrap();

    let report = h.engine.finish_match(h.owner, m, 2, 1).await.unwrap();
    assert_eq!(report.bets_considered, 3);
    assert_eq!(report.winners, 1);
    assert!(h.engine.winnings(alice).await > Decimal::ZERO);
    assert_eq!(h.engine.winnings(bob).await, Decimal::ZERO);
    assert_eq!(h.engine.winnings(carol).await, Decimal::ZERO);
    assert_eq!(report.house_retained, Decimal::new(2, 2));
    assert_eq!(h.engine.unclaimed_custody().await, Decimal::new(2, 2));
    h.assert_solvent().await;
}

#[tokio::test]
async fn finish_twice_rejected() {
    let h = Harness::new();
    let m = h.fixture().await;
    h.engine.finish_match(h.owner, m, 1, 1).await.unwrap();
    let err = h.engine.finish_match(h.owner, m, 0, 0).await.unwrap_err();
    assert!(matches!(err, SmartbetError::AlreadyFinished(_)));

    let record = h.engine.match_record(m).await.unwrap();
    assert_eq!(record.status(), MatchStatus::Finished);
    assert_eq!((record.score_team1, record.score_team2), (1, 1));
}

#[tokio::test]
async fn second_withdrawal_finds_nothing() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    h.engine.place_bet(alice, m, 1, 0, h.fee()).await.unwrap();
    h.engine.finish_match(h.owner, m, 1, 0).await.unwrap();

    h.engine.withdraw_winnings(alice).await.unwrap();
    let err = h.engine.withdraw_winnings(alice).await.unwrap_err();
    assert!(matches!(err, SmartbetError::NoWinnings(_)));
}

#[tokio::test]
async fn banned_user_cannot_bet_or_withdraw() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    h.engine.place_bet(alice, m, 1, 0, h.fee()).await.unwrap();
    h.engine.finish_match(h.owner, m, 1, 0).await.unwrap();
    let next = h.fixture().await;

    h.engine.ban_user(h.owner, alice).await.unwrap();

    let err = h.engine.place_bet(alice, next, 1, 0, h.fee()).await.unwrap_err();
    assert!(matches!(err, SmartbetError::UserBanned(_)));
    let err = h.engine.withdraw_winnings(alice).await.unwrap_err();
    assert!(matches!(err, SmartbetError::UserBanned(_)));
    assert_eq!(h.engine.winnings(alice).await, h.fee());
}

#[tokio::test]
async fn owner_only_operations() {
    let h = Harness::new();
    let mallory = h.player("mallory").await;
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    let kickoff = h.at(Duration::days(1));
    let events_before = h.engine.events().await.len();
    assert_eq!(h.engine.owner(), h.owner);

    let results = [
        h.engine.add_match(mallory, "A", "B", kickoff).await.map(|_| ()),
        h.engine.finish_match(mallory, m, 0, 0).await.map(|_| ()),
        h.engine.update_user_balance(mallory, alice, Decimal::TEN).await,
        h.engine.ban_user(mallory, alice).await,
        h.engine.remove_user(mallory, alice).await,
    ];
    for result in results {
        assert!(matches!(result, Err(SmartbetError::Unauthorized { .. })));
    }
    assert_eq!(h.engine.events().await.len(), events_before);
    assert_eq!(h.engine.match_count().await, 1);
    assert!(!h.engine.match_record(m).await.unwrap().finished);
    assert!(!h.engine.user(alice).await.banned);
}

#[tokio::test]
async fn rejected_bet_changes_nothing() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    let snapshot = h.engine.snapshot_json().await.unwrap();
    let events = h.engine.events().await;
    let custody = h.engine.custody().await;

    let _ = h.engine.place_bet(alice, m, 1, 0, Decimal::ONE).await.unwrap_err();
    let _ = h.engine.place_bet(alice, MatchId(7), 1, 0, h.fee()).await.unwrap_err();
    let _ = h
        .engine
        .place_bet(Principal::from_label("stranger"), m, 1, 0, h.fee())
        .await
        .unwrap_err();

    assert_eq!(h.engine.snapshot_json().await.unwrap(), snapshot);
    assert_eq!(h.engine.events().await, events);
    assert_eq!(h.engine.custody().await, custody);
}

#[tokio::test]
async fn failed_deposit_records_no_bet() {
    let h = Harness::new();
    let broke = Principal::from_label("broke");
    h.engine.register_user(broke).await.unwrap();
    let m = h.fixture().await;

    let err = h.engine.place_bet(broke, m, 1, 0, h.fee()).await.unwrap_err();
    assert!(matches!(err, SmartbetError::TransferFailed { .. }));
    assert_eq!(h.engine.bet_count().await, 0);
    assert!(h.engine.bets_for_match(m).await.is_empty());
    assert_eq!(h.engine.custody().await.stakes_received(), Decimal::ZERO);
    h.assert_solvent().await;
}

#[tokio::test]
async fn failed_payout_rolls_back() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    h.engine.place_bet(alice, m, 1, 0, h.fee()).await.unwrap();
    h.engine.finish_match(h.owner, m, 1, 0).await.unwrap();
    let wallet_before = h.engine.transfer().balance(alice).await;

    h.engine.transfer().fail_next_withdrawals(1).await;
    let err = h.engine.withdraw_winnings(alice).await.unwrap_err();
    assert!(matches!(err, SmartbetError::TransferFailed { .. }));

    assert_eq!(h.engine.winnings(alice).await, h.fee());
    assert_eq!(h.engine.transfer().balance(alice).await, wallet_before);
    let custody = h.engine.custody().await;
    assert_eq!(custody.paid_out(), Decimal::ZERO);
    assert!(custody.is_quiescent());
    assert!(
        !h.engine
            .events()
            .await
            .iter()
            .any(|r| matches!(r.event, Event::WinningsWithdrawn { .. }))
    );
    h.assert_solvent().await;

    // A retry succeeds once the substrate recovers.
    assert_eq!(h.engine.withdraw_winnings(alice).await.unwrap(), h.fee());
    let tickets = h.engine.tickets_for(alice).await;
    assert_eq!(tickets.len(), 2);
    h.assert_solvent().await;
}

#[tokio::test]
async fn split_pot_pays_out_losing_stakes() {
    let h = Harness::with(
        |c| c.with_payout_policy(PayoutPolicy::SplitPot),
        InMemoryWallet::new(),
    );
    let alice = h.player("alice").await;
    let bob = h.player("bob").await;
    let carol = h.player("carol").await;
    let dave = h.player("dave").await;
    let m = h.fixture().await;

    h.engine.place_bet(alice, m, 2, 0, h.fee()).await.unwrap();
    h.engine.place_bet(bob, m, 2, 0, h.fee()).await.unwrap();
    h.engine.place_bet(carol, m, 0, 2, h.fee()).await.unwrap();
    h.engine.place_bet(dave, m, 1, 1, h.fee()).await.unwrap();

    let report = h.engine.finish_match(h.owner, m, 2, 0).await.unwrap();
    assert_eq!(report.credited, Decimal::new(4, 2));
    assert_eq!(report.house_retained, Decimal::ZERO);
    assert_eq!(h.engine.winnings(alice).await, Decimal::new(2, 2));
    assert_eq!(h.engine.winnings(bob).await, Decimal::new(2, 2));

    h.engine.withdraw_winnings(alice).await.unwrap();
    h.engine.withdraw_winnings(bob).await.unwrap();
    assert_eq!(h.engine.transfer().custody_balance().await, Decimal::ZERO);
    h.assert_solvent().await;
}

#[tokio::test]
async fn removed_user_loses_open_bets_but_keeps_winnings() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let settled = h.fixture().await;
    let open = h.fixture().await;

    h.engine.place_bet(alice, settled, 1, 0, h.fee()).await.unwrap();
    h.engine.place_bet(alice, open, 3, 3, h.fee()).await.unwrap();
    h.engine.finish_match(h.owner, settled, 1, 0).await.unwrap();

    h.engine.remove_user(h.owner, alice).await.unwrap();
    h.engine.register_user(alice).await.unwrap();
    assert_eq!(h.engine.user(alice).await.generation, 1);

    let report = h.engine.finish_match(h.owner, open, 3, 3).await.unwrap();
    assert_eq!(report.winners, 0);
    assert_eq!(report.house_retained, h.fee());

    // Credited before the removal: still withdrawable.
    assert_eq!(h.engine.withdraw_winnings(alice).await.unwrap(), h.fee());
    h.assert_solvent().await;
}

#[tokio::test]
async fn removed_user_cannot_bet_until_reregistered() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    h.engine.remove_user(h.owner, alice).await.unwrap();

    let err = h.engine.place_bet(alice, m, 0, 0, h.fee()).await.unwrap_err();
    assert!(matches!(err, SmartbetError::NotRegistered(_)));

    h.engine.register_user(alice).await.unwrap();
    h.engine.place_bet(alice, m, 0, 0, h.fee()).await.unwrap();
}

#[tokio::test]
async fn multiple_bets_per_match_are_kept() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    let first = h.engine.place_bet(alice, m, 1, 0, h.fee()).await.unwrap();
    let second = h.engine.place_bet(alice, m, 1, 0, h.fee()).await.unwrap();
    assert_ne!(first, second);

    let bets = h.engine.bets_for_match(m).await;
    assert_eq!(bets.len(), 2);
    assert_eq!(h.engine.bet(second).await.unwrap().match_id, m);

    h.engine.finish_match(h.owner, m, 1, 0).await.unwrap();
    assert_eq!(h.engine.winnings(alice).await, Decimal::new(2, 2));
}

#[tokio::test]
async fn event_log_tells_the_story() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    h.engine.place_bet(alice, m, 2, 1, h.fee()).await.unwrap();
    h.engine.finish_match(h.owner, m, 2, 1).await.unwrap();
    h.engine.withdraw_winnings(alice).await.unwrap();
    h.engine
        .update_user_balance(h.owner, alice, Decimal::new(42, 0))
        .await
        .unwrap();

    let events = h.engine.events().await;
    let names: Vec<&str> = events.iter().map(|r| r.event.name()).collect();
    assert_eq!(
        names,
        vec![
            "UserRegistered",
            "MatchAdded",
            "BetPlaced",
            "MatchFinished",
            "WinningsCredited",
            "WinningsWithdrawn",
            "UserBalanceUpdated",
        ]
    );
    for (i, record) in events.iter().enumerate() {
        assert_eq!(record.seq, i as u64);
    }
    assert!(matches!(
        events[2].event,
        Event::BetPlaced { predicted_score_team1: 2, predicted_score_team2: 1, .. }
    ));
    assert_eq!(h.engine.events_since(5).await.len(), 2);
    assert_eq!(h.engine.user(alice).await.balance, Decimal::new(42, 0));

    let json = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(json["event"]["kind"], "user_registered");
}

#[tokio::test]
async fn snapshot_exports_tables() {
    let h = Harness::new();
    let alice = h.player("alice").await;
    let m = h.fixture().await;
    h.engine.place_bet(alice, m, 0, 1, h.fee()).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&h.engine.snapshot_json().await.unwrap()).unwrap();
    for table in ["users", "matches", "bets", "bets_by_match", "winnings"] {
        assert!(json.get(table).is_some(), "missing table {table}");
    }
    assert_eq!(json["bets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_config_refused() {
    init_tracing();
    let config = EngineConfig::new(Principal::from_label("owner")).with_entry_fee(Decimal::ZERO);
    let err = SmartBet::in_memory(config).unwrap_err();
    assert!(matches!(err, SmartbetError::Configuration(_)));
}
