//! Rule interpreter scenarios end to end: strategy document + snapshot in,
//! instructions and settled outcomes out.

use laybench_core::domain::{
    BetResult, BetSide, MarketId, MarketSnapshot, MarketStatus, RunnerSnapshot, RunnerStatus,
    SelectionId,
};
use laybench_core::engine::{evaluate_strategy, NO_RULES_MATCHED};
use laybench_core::pnl::{resolve_pnl, settle, PnlSummary};
use laybench_core::settlement::RunnerResults;
use laybench_core::strategy::{default_strategy, Strategy};

// ── Helpers ──────────────────────────────────────────────────────────

fn runner(id: u64, lay: f64) -> RunnerSnapshot {
    RunnerSnapshot {
        selection_id: SelectionId(id),
        runner_name: format!("Horse {id}"),
        handicap: 0.0,
        status: RunnerStatus::Active,
        best_available_to_lay: Some(lay),
        best_available_to_back: Some(lay - 0.02),
        lay_depth: vec![],
        back_depth: vec![],
        last_price_traded: Some(lay),
        total_matched: 500.0,
    }
}

fn market(runners: Vec<RunnerSnapshot>) -> MarketSnapshot {
    MarketSnapshot {
        market_id: MarketId::new("1.240000001"),
        market_name: "R5 1m2f Hcap".into(),
        venue: "Sandown".into(),
        market_start_time: "2026-04-25T15:35:00.000Z".into(),
        event_name: "Sandown 25th Apr".into(),
        event_country: "GB".into(),
        status: MarketStatus::Open,
        inplay: false,
        recorded_at: "2026-04-25T15:30:00Z".into(),
        number_of_winners: 1,
        total_matched: 42_000.0,
        runners,
    }
}

fn settled_with(market: &MarketSnapshot, winner: SelectionId) -> MarketSnapshot {
    let mut settled = market.clone();
    settled.status = MarketStatus::Closed;
    for r in &mut settled.runners {
        r.status = if r.selection_id == winner {
            RunnerStatus::Winner
        } else {
            RunnerStatus::Loser
        };
    }
    settled
}

fn strategy(rules_json: &str) -> Strategy {
    Strategy::from_json(&format!(
        r#"{{"id":"test","name":"Test strategy","rules":{rules_json}}}"#
    ))
    .unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn empty_rule_list_always_skips() {
    let s = strategy("[]");
    for n in 0..4 {
        let m = market((0..n).map(|i| runner(i + 1, 2.0 + i as f64)).collect());
        let result = evaluate_strategy(&s, &m);
        assert!(result.skipped);
        assert_eq!(result.skip_reason, NO_RULES_MATCHED);
        assert!(result.instructions.is_empty());
    }
}

#[test]
fn strong_favourite_lay_settles_both_ways() {
    let m = market(vec![runner(1, 1.8), runner(2, 3.5), runner(3, 8.0)]);
    let result = evaluate_strategy(&default_strategy(), &m);
    assert_eq!(result.instructions.len(), 1);
    let instruction = result.instructions[0].clone();
    assert_eq!(instruction.bet_type, BetSide::Lay);
    assert_eq!(instruction.stake, 3.0);
    assert!((instruction.liability() - 2.4).abs() < 1e-9);

    let loses = RunnerResults::from_settlement(Some(&settled_with(&m, SelectionId(2))));
    assert_eq!(resolve_pnl(&instruction, loses.result_for(SelectionId(1))), 3.0);

    let wins = RunnerResults::from_settlement(Some(&settled_with(&m, SelectionId(1))));
    let profit = resolve_pnl(&instruction, wins.result_for(SelectionId(1)));
    assert!((profit + 2.4).abs() < 1e-9);
}

#[test]
fn high_odds_wide_gap_lays_favourite_only() {
    let m = market(vec![runner(1, 9.5), runner(2, 6.0), runner(3, 14.0)]);
    let result = evaluate_strategy(&default_strategy(), &m);
    assert_eq!(result.matched_rule_id.as_deref(), Some("RULE_3B"));
    assert_eq!(result.matched_rule_name.as_deref(), Some("High odds, wide gap to 2nd"));
    assert_eq!(result.instructions.len(), 1);
    assert_eq!(result.instructions[0].selection_id, SelectionId(2));
    assert_eq!(result.instructions[0].stake, 1.0);
    assert_eq!(result.instructions[0].price, 6.0);
}

#[test]
fn single_runner_market_filtered_with_count() {
    let m = market(vec![runner(1, 1.5)]);
    let result = evaluate_strategy(&default_strategy(), &m);
    assert!(result.skipped);
    assert_eq!(result.skip_reason, "Only 1 active runners (min: 2)");
    assert!(result.matched_rule_id.is_none());
}

#[test]
fn unsatisfiable_rule_falls_through_to_next() {
    let s = strategy(
        r#"[
        {"id":"IMPOSSIBLE","name":"never","priority":1,
         "conditions":[{"field":"fav_lay_odds","operator":"lt","value":2.0},
                       {"field":"fav_lay_odds","operator":"gt","value":3.0}],
         "actions":[{"target":"favourite","stake":5.0}]},
        {"id":"FALLBACK","name":"always","priority":2,"conditions":[],
         "actions":[{"target":"second_favourite","stake":1.0}]}
    ]"#,
    );
    let m = market(vec![runner(1, 2.5), runner(2, 4.0)]);
    let result = evaluate_strategy(&s, &m);
    assert_eq!(result.matched_rule_id.as_deref(), Some("FALLBACK"));
    assert_eq!(result.instructions.len(), 1);
    assert_eq!(result.instructions[0].selection_id, SelectionId(2));
}

#[test]
fn stop_on_match_blocks_lower_priority_rules() {
    let rules = |stop: bool| {
        strategy(&format!(
            r#"[
            {{"id":"LOW","name":"low","priority":5,"conditions":[],
              "actions":[{{"target":"second_favourite","stake":1.0}}]}},
            {{"id":"HIGH","name":"high","priority":1,"conditions":[],
              "actions":[{{"target":"favourite","stake":2.0}}],"stop_on_match":{stop}}}
        ]"#
        ))
    };
    let m = market(vec![runner(1, 2.5), runner(2, 4.0)]);

    let stopped = evaluate_strategy(&rules(true), &m);
    assert_eq!(stopped.instructions.len(), 1);
    assert_eq!(stopped.instructions[0].rule_id, "HIGH");
    assert_eq!(stopped.matched_rule_id.as_deref(), Some("HIGH"));

    let continued = evaluate_strategy(&rules(false), &m);
    let rule_ids: Vec<&str> = continued.instructions.iter().map(|i| i.rule_id.as_str()).collect();
    assert_eq!(rule_ids, vec!["HIGH", "LOW"]);
    assert_eq!(continued.matched_rule_id.as_deref(), Some("LOW"));
}

#[test]
fn third_favourite_missing_is_silent() {
    let s = strategy(
        r#"[{"id":"T","name":"third","priority":1,"conditions":[],
            "actions":[{"target":"third_favourite","stake":1.0},
                       {"target":"favourite","stake":1.0}]}]"#,
    );
    let m = market(vec![runner(1, 2.5), runner(2, 4.0)]);
    let result = evaluate_strategy(&s, &m);
    assert_eq!(result.instructions.len(), 1);
    assert_eq!(result.instructions[0].selection_id, SelectionId(1));
    assert_eq!(result.unpriced_targets, 0);
}

#[test]
fn between_bounds_are_inclusive() {
    let s = strategy(
        r#"[{"id":"B","name":"between","priority":1,
            "conditions":[{"field":"fav_lay_odds","operator":"between","value":2.0,"value_high":5.0}],
            "actions":[{"target":"favourite","stake":1.0}]}]"#,
    );
    for (price, expect) in [(1.99, false), (2.0, true), (3.5, true), (5.0, true), (5.01, false)] {
        let m = market(vec![runner(1, price), runner(2, 20.0)]);
        let result = evaluate_strategy(&s, &m);
        assert_eq!(!result.skipped, expect, "price {price}");
    }
}

#[test]
fn back_bets_use_back_price() {
    let s = strategy(
        r#"[{"id":"BK","name":"back fav","priority":1,"conditions":[],
            "actions":[{"target":"favourite","bet_type":"BACK","stake":2.0}]}]"#,
    );
    let m = market(vec![runner(1, 3.0), runner(2, 6.0)]);
    let result = evaluate_strategy(&s, &m);
    let instruction = result.instructions[0].clone();
    assert_eq!(instruction.bet_type, BetSide::Back);
    assert!((instruction.price - 2.98).abs() < 1e-9);
    assert_eq!(instruction.liability(), 2.0);

    let won = settle(instruction.clone(), BetResult::Winner);
    assert_eq!(won.profit, 3.96);
    let lost = settle(instruction, BetResult::Loser);
    assert_eq!(lost.profit, -2.0);
}

#[test]
fn unsettled_market_resolves_to_unknown_and_zero() {
    let m = market(vec![runner(1, 1.5), runner(2, 3.0)]);
    let result = evaluate_strategy(&default_strategy(), &m);
    let results = RunnerResults::from_settlement(None);
    let outcomes: Vec<_> = result
        .instructions
        .into_iter()
        .map(|i| {
            let r = results.result_for(i.selection_id);
            settle(i, r)
        })
        .collect();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].runner_result, BetResult::Unknown);

    let summary = PnlSummary::aggregate(&outcomes);
    assert_eq!(summary.void_count, 1);
    assert_eq!(summary.total_pnl, 0.0);
    assert_eq!(summary.roi_percent, 0.0);
}
