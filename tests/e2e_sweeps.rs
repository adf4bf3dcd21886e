// ========================================
// E2E SWEEP SCENARIOS FOR UPLINE
// ========================================
//
// Multi-day operation: daily pairing + rank sweeps, weekly payout
// settlement, idempotent re-runs, per-member failure isolation.
//
// Usage:
//   cargo test --test e2e_sweeps -- --nocapture
//
// ========================================

use upline_core::placement::PlacementMode;
use upline_core::{CENTI_PER_BV, PAISE_PER_RUPEE, SECS_PER_DAY};
use upline_engine::{CommissionStatus, CompensationEngine};
use upline_ledger::WalletBucket;

const DAY0: u64 = 1_700_006_400;

fn rupees(n: u128) -> u128 {
    n * PAISE_PER_RUPEE
}

fn bv(points: u128) -> u128 {
    points * CENTI_PER_BV
}

fn join(engine: &mut CompensationEngine, id: &str, sponsor: &str, now: u64, fund_rs: u128) {
    engine
        .enroll_member(id, sponsor, PlacementMode::Auto, now)
        .unwrap();
    engine.activate_member(id, now).unwrap();
    if fund_rs > 0 {
        engine
            .ledger
            .credit(id, rupees(fund_rs), WalletBucket::Investment, "deposit", now)
            .unwrap();
    }
}

// ========================================
// SCENARIO 1: A WEEK OF OPERATION
// ========================================
#[test]
fn test_week_of_sweeps_and_settlement() {
    println!("\n🧪 SCENARIO 1: One week — invest, pair, rank, settle\n");

    let mut engine = CompensationEngine::default();
    engine.enroll_root("ROOT", DAY0).unwrap();
    join(&mut engine, "S", "ROOT", DAY0, 200_000);
    join(&mut engine, "L", "S", DAY0, 200_000);
    join(&mut engine, "R", "S", DAY0, 200_000);

    // Day 0: both legs of S invest ₹60,000 at 1:1
    engine.record_investment("L", rupees(60_000), 10_000, DAY0).unwrap();
    engine.record_investment("R", rupees(60_000), 10_000, DAY0).unwrap();
    // S itself invests ₹60,000 (personal BV, flows to ROOT's leg)
    engine.record_investment("S", rupees(60_000), 10_000, DAY0).unwrap();

    // Day 1: pairing — S matches 60,000 × 60,000 → 6 pairs = ₹600
    let pairing = engine.run_daily_pairing_sweep(DAY0 + SECS_PER_DAY);
    assert_eq!(pairing.failed, 0);
    assert_eq!(pairing.actions, 1); // only S has both legs
    assert_eq!(pairing.amount_paise, rupees(600));
    let s = engine.tree.get("S").unwrap();
    assert_eq!(s.carry_forward_left, 0);
    assert_eq!(s.carry_forward_right, 0);

    // Day 1: rank — S has 2 directs (L, R), ₹60,000 personal investment,
    // 120,000 team BV. Silver needs 200,000 team BV → not yet.
    let rank = engine.run_daily_rank_sweep(DAY0 + SECS_PER_DAY);
    assert_eq!(rank.actions, 0);

    // Day 2: more volume arrives; team BV crosses the Silver bar
    engine
        .record_investment("L", rupees(50_000), 10_000, DAY0 + 2 * SECS_PER_DAY)
        .unwrap();
    engine
        .record_investment("R", rupees(50_000), 10_000, DAY0 + 2 * SECS_PER_DAY)
        .unwrap();
    let rank = engine.run_daily_rank_sweep(DAY0 + 2 * SECS_PER_DAY);
    assert_eq!(rank.actions, 1);
    assert_eq!(engine.tree.get("S").unwrap().rank, "Silver");

    // Day 7: weekly settlement pays out everything credited
    let credited_before: u128 = engine
        .commissions
        .records()
        .iter()
        .filter(|c| c.status == CommissionStatus::Credited)
        .map(|c| c.amount_paise)
        .sum();
    assert!(credited_before > 0);

    let settlement = engine.run_weekly_payout_settlement(DAY0 + 7 * SECS_PER_DAY);
    assert_eq!(settlement.failed, 0);
    assert_eq!(settlement.amount_paise, credited_before);
    assert!(engine
        .commissions
        .records()
        .iter()
        .all(|c| c.status == CommissionStatus::Paid));

    // Commission wallets drained to the payout processor
    for id in ["ROOT", "S", "L", "R"] {
        assert_eq!(engine.ledger.balances(id).unwrap().commission_paise, 0);
    }
    println!("✅ Week of operation verified");
}

// ========================================
// SCENARIO 2: SWEEP RE-RUNS ARE SAFE
// ========================================
#[test]
fn test_sweep_reruns_never_double_credit() {
    println!("\n🧪 SCENARIO 2: Idempotent re-runs\n");

    let mut engine = CompensationEngine::default();
    engine.enroll_root("ROOT", DAY0).unwrap();
    join(&mut engine, "A", "ROOT", DAY0, 100_000);
    join(&mut engine, "B", "A", DAY0, 100_000);
    join(&mut engine, "C", "A", DAY0, 100_000);
    engine.record_investment("B", rupees(70_000), 10_000, DAY0).unwrap();
    engine.record_investment("C", rupees(30_000), 10_000, DAY0).unwrap();

    let now = DAY0 + SECS_PER_DAY;
    let first = engine.run_daily_pairing_sweep(now);
    let paid_first = first.amount_paise;
    assert!(paid_first > 0);

    // Re-run all three sweeps the same day
    let pairing_again = engine.run_daily_pairing_sweep(now);
    assert_eq!(pairing_again.actions, 0);

    let rank1 = engine.run_daily_rank_sweep(now);
    let rank2 = engine.run_daily_rank_sweep(now);
    // A second rank pass the same day promotes nobody further
    assert!(rank2.actions <= rank1.actions);
    assert_eq!(rank2.actions, 0);

    let settle1 = engine.run_weekly_payout_settlement(now);
    let settle2 = engine.run_weekly_payout_settlement(now);
    assert!(settle1.amount_paise > 0);
    assert_eq!(settle2.amount_paise, 0);
    assert_eq!(settle2.actions, 0);
    println!("✅ Re-runs verified no-op");
}

// ========================================
// SCENARIO 3: FAILURE ISOLATION AT THE MEMBER BOUNDARY
// ========================================
#[test]
fn test_member_failure_is_isolated() {
    println!("\n🧪 SCENARIO 3: One corrupt member, sweep continues\n");

    let mut engine = CompensationEngine::default();
    engine.enroll_root("ROOT", DAY0).unwrap();
    join(&mut engine, "GOOD1", "ROOT", DAY0, 0);
    join(&mut engine, "BAD", "ROOT", DAY0, 0);
    join(&mut engine, "GOOD2", "ROOT", DAY0, 0);

    for id in ["GOOD1", "BAD", "GOOD2"] {
        let m = engine.tree.get_mut(id).unwrap();
        m.left_bv = bv(10_000);
        m.right_bv = bv(10_000);
    }

    // Corrupt BAD: rebuild the ledger without its wallet
    let ledger = upline_ledger::Ledger::new();
    for id in ["ROOT", "GOOD1", "GOOD2"] {
        ledger.create_wallet(id);
    }
    engine.ledger = ledger;

    let summary = engine.run_daily_pairing_sweep(DAY0 + SECS_PER_DAY);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.actions, 2);
    assert_eq!(summary.amount_paise, rupees(200));

    // Both healthy members were paid despite the failure in between
    for id in ["GOOD1", "GOOD2"] {
        assert_eq!(
            engine.ledger.balances(id).unwrap().commission_paise,
            rupees(100)
        );
    }
    // BAD's volume is intact for the next run after repair
    let bad = engine.tree.get("BAD").unwrap();
    assert_eq!(bad.left_bv, bv(10_000));
    assert_eq!(bad.right_bv, bv(10_000));
    println!("✅ Isolation verified");
}

// ========================================
// SCENARIO 4: DEEP LEG PLACEMENT STILL PAYS THE WHOLE CHAIN
// ========================================
#[test]
fn test_deep_left_leg_chain() {
    println!("\n🧪 SCENARIO 4: Named-leg chains and level depth\n");

    let mut engine = CompensationEngine::default();
    engine.enroll_root("M00", DAY0).unwrap();
    // Build a 12-deep chain, each member sponsored AND placed by the
    // one above, always on the LEFT leg
    for i in 1..=12 {
        let id = format!("M{:02}", i);
        let sponsor = format!("M{:02}", i - 1);
        engine
            .enroll_member(&id, &sponsor, PlacementMode::Left, DAY0)
            .unwrap();
        engine.activate_member(&id, DAY0).unwrap();
        engine
            .ledger
            .credit(&id, rupees(100_000), WalletBucket::Investment, "deposit", DAY0)
            .unwrap();
    }

    let outcome = engine
        .record_investment("M12", rupees(100_000), 10_000, DAY0)
        .unwrap();

    // BV climbed all 12 placement levels
    assert_eq!(outcome.levels_touched, 12);
    assert_eq!(engine.tree.get("M00").unwrap().left_bv, bv(100_000));

    // Level commission stops at the 10-level table depth
    assert_eq!(outcome.level_commissions.len(), 10);
    assert_eq!(outcome.level_commissions[0].member_id, "M11");
    assert_eq!(outcome.level_commissions[0].amount_paise, rupees(3_000)); // 3%
    assert_eq!(outcome.level_commissions[9].member_id, "M02");
    assert_eq!(outcome.level_commissions[9].amount_paise, rupees(500)); // 0.5%
    // M01 and M00 sit beyond level 10 — no level commission
    assert_eq!(engine.commissions.summary_for("M01", DAY0).record_count, 0);
    println!("✅ Deep chain verified");
}
