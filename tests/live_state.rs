use serde_json::{Value, json};

use ipl_live_states::live_state::{DeliveryRow, track_match};
use ipl_live_states::match_info::parse_match_info;

fn ball(key: &str, bat: u32, extras: u32, breakdown: Option<Value>) -> Value {
    let mut delivery = json!({
        "batsman": "SC Ganguly",
        "non_striker": "BB McCullum",
        "bowler": "P Kumar",
        "runs": {"batsman": bat, "extras": extras, "total": bat + extras}
    });
    if let Some(breakdown) = breakdown {
        delivery["extras"] = breakdown;
    }
    json!({ key: delivery })
}

fn wicket_ball(key: &str) -> Value {
    json!({ key: {
        "batsman": "R Dravid",
        "bowler": "AB Dinda",
        "runs": {"batsman": 0, "extras": 0, "total": 0},
        "wicket": {"kind": "bowled", "player_out": "R Dravid"}
    }})
}

fn legal_run_balls(runs: &[u32]) -> Vec<Value> {
    runs.iter()
        .enumerate()
        .map(|(idx, r)| ball(&format!("{}.{}", idx / 6, idx % 6 + 1), *r, 0, None))
        .collect()
}

fn match_doc(first: Vec<Value>, second: Vec<Value>) -> Value {
    json!({
        "info": {
            "dates": ["2008-04-18"],
            "teams": ["Kolkata Knight Riders", "Royal Challengers Bangalore"],
            "city": "Bangalore",
            "venue": "M Chinnaswamy Stadium",
            "outcome": {"winner": "Kolkata Knight Riders", "by": {"runs": 140}}
        },
        "innings": [
            {"1st innings": {"team": "Kolkata Knight Riders", "deliveries": first}},
            {"2nd innings": {"team": "Royal Challengers Bangalore", "deliveries": second}}
        ]
    })
}

fn rows_for(doc: &Value) -> Vec<DeliveryRow> {
    let record = parse_match_info(doc);
    track_match(doc, &record).rows
}

#[test]
fn minimal_two_innings_chase() {
    let doc = match_doc(legal_run_balls(&[4, 6]), legal_run_balls(&[2]));
    let rows = rows_for(&doc);
    assert_eq!(rows.len(), 3);

    let chase = &rows[2];
    assert_eq!(chase.inning, 2);
    assert_eq!(chase.target, Some(11));
    assert_eq!(chase.runs_required, Some(9));
    assert_eq!(chase.runs_left, Some(9));
    assert_eq!(chase.balls_remaining, 119);
    assert_eq!(chase.rrr, Some(0.454));
    assert_eq!(chase.bowling_team, "Kolkata Knight Riders");

    for row in &rows[..2] {
        assert_eq!(row.target, None);
        assert_eq!(row.runs_required, None);
        assert_eq!(row.runs_left, None);
        assert_eq!(row.rrr, None);
        assert_eq!(row.bowling_team, "Royal Challengers Bangalore");
    }
}

#[test]
fn target_is_first_innings_total_plus_one() {
    let mut chase = vec![6; 30];
    chase.push(1);
    let doc = match_doc(legal_run_balls(&[6; 30]), legal_run_balls(&chase));
    let rows = rows_for(&doc);

    let second: Vec<_> = rows.iter().filter(|r| r.inning == 2).collect();
    assert_eq!(second.len(), 31);
    assert!(second.iter().all(|r| r.target == Some(181)));

    let reached = second
        .iter()
        .find(|r| r.inning_runs_to_date == 181)
        .expect("chase reaches 181");
    assert_eq!(reached.runs_required, Some(0));
    assert_eq!(reached.rrr, Some(0.0));
}

#[test]
fn chase_fields_stay_unresolved_without_first_innings() {
    let doc = json!({
        "info": {"teams": ["A", "B"]},
        "innings": [{"2nd innings": {"team": "B", "deliveries": legal_run_balls(&[1, 2])}}]
    });
    let rows = rows_for(&doc);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.target.is_none() && r.rrr.is_none()));
}

#[test]
fn wides_do_not_consume_a_ball() {
    let deliveries = vec![
        ball("0.1", 1, 0, None),
        ball("0.2", 0, 1, Some(json!({"wides": 1}))),
        ball("0.2", 0, 0, None),
        ball("0.3", 0, 1, Some(json!({"legbyes": 1}))),
    ];
    let rows = rows_for(&match_doc(deliveries, Vec::new()));
    let balls: Vec<_> = rows.iter().map(|r| r.balls_bowled_in_innings).collect();
    assert_eq!(balls, vec![1, 1, 2, 3]);
    assert_eq!(rows[1].inning_runs_to_date, 2);
}

#[test]
fn extras_without_breakdown_use_the_heuristic() {
    let deliveries = vec![ball("0.1", 0, 1, None), ball("0.1", 1, 1, None)];
    let rows = rows_for(&match_doc(deliveries, Vec::new()));
    assert_eq!(rows[0].balls_bowled_in_innings, 0);
    assert_eq!(rows[1].balls_bowled_in_innings, 1);
}

#[test]
fn wickets_left_complements_wickets_down() {
    let deliveries: Vec<_> = (0..12)
        .map(|idx| wicket_ball(&format!("{}.{}", idx / 6, idx % 6 + 1)))
        .collect();
    let rows = rows_for(&match_doc(deliveries, Vec::new()));
    for row in &rows {
        let down = row.inning_wickets_down.min(10);
        assert_eq!(row.wickets_left + down, 10);
    }
    assert_eq!(rows.last().map(|r| r.wickets_left), Some(0));
    assert_eq!(rows.last().map(|r| r.inning_wickets_down), Some(12));
}

#[test]
fn balls_remaining_follows_declared_overs() {
    let doc = json!({
        "info": {"teams": ["A", "B"]},
        "innings": [
            {"1st innings": {"team": "A", "overs": 5, "deliveries": legal_run_balls(&[1; 32])}},
            {"2nd innings": {"team": "B", "deliveries": legal_run_balls(&[1; 3])}}
        ]
    });
    let rows = rows_for(&doc);
    for row in &rows {
        let budget: u32 = if row.inning == 1 { 30 } else { 120 };
        assert_eq!(
            row.balls_remaining,
            budget.saturating_sub(row.balls_bowled_in_innings)
        );
    }
    assert_eq!(rows[31].balls_remaining, 0);
}

#[test]
fn running_counters_are_monotonic() {
    let mut first = legal_run_balls(&[1, 0, 4, 6, 0, 2, 1]);
    first.insert(3, ball("0.4", 0, 1, Some(json!({"noballs": 1}))));
    first.push(wicket_ball("1.2"));
    let rows = rows_for(&match_doc(first, legal_run_balls(&[0, 3, 1])));

    for pair in rows.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.inning != next.inning {
            continue;
        }
        assert!(next.inning_runs_to_date >= prev.inning_runs_to_date);
        assert!(next.inning_wickets_down >= prev.inning_wickets_down);
        assert!(next.balls_bowled_in_innings >= prev.balls_bowled_in_innings);
        assert!(next.balls_remaining <= prev.balls_remaining);
        assert!(next.wickets_left <= prev.wickets_left);
    }
}

#[test]
fn current_run_rate_after_first_over() {
    let rows = rows_for(&match_doc(legal_run_balls(&[1, 1, 1, 1, 1, 3]), Vec::new()));
    assert_eq!(rows[5].balls_bowled_in_innings, 6);
    assert_eq!(rows[5].inning_runs_to_date, 8);
    assert_eq!(rows[5].crr, 8.0);

    let wide_first = rows_for(&match_doc(
        vec![ball("0.1", 0, 1, Some(json!({"wides": 1})))],
        Vec::new(),
    ));
    assert_eq!(wide_first[0].balls_bowled_in_innings, 0);
    assert_eq!(wide_first[0].crr, 0.0);
}

#[test]
fn string_encoded_delivery_matches_native() {
    let native = ball("0.1", 4, 0, None);
    let encoded_value = serde_json::to_string(&native["0.1"]).unwrap();
    let encoded = json!({ "0.1": encoded_value });

    let native_rows = rows_for(&match_doc(vec![native], Vec::new()));
    let encoded_rows = rows_for(&match_doc(vec![encoded], Vec::new()));
    assert_eq!(native_rows, encoded_rows);
    assert_eq!(encoded_rows[0].runs_off_bat, 4);
    assert_eq!(encoded_rows[0].striker, "SC Ganguly");
}

#[test]
fn missing_teams_do_not_break_tracking() {
    let doc = json!({
        "info": {"teams": ["Deccan Chargers"]},
        "innings": [{"1st innings": {"team": "Deccan Chargers", "deliveries": legal_run_balls(&[2])}}]
    });
    let record = parse_match_info(&doc);
    assert_eq!(record.team1, "Deccan Chargers");
    assert_eq!(record.team2, "");

    let rows = track_match(&doc, &record).rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].bowling_team, "");

    let no_info = json!({"innings": [{"1st innings": {"deliveries": legal_run_balls(&[1])}}]});
    let record = parse_match_info(&no_info);
    assert_eq!((record.team1.as_str(), record.team2.as_str()), ("", ""));
    assert_eq!(track_match(&no_info, &record).rows.len(), 1);
}

#[test]
fn super_over_rows_are_flagged_and_unnumbered() {
    let doc = json!({
        "info": {"teams": ["A", "B"]},
        "innings": [
            {"1st innings": {"team": "A", "deliveries": legal_run_balls(&[1, 1])}},
            {"2nd innings": {"team": "B", "deliveries": legal_run_balls(&[1, 1])}},
            {"1st Super Over": {"team": "B", "deliveries": legal_run_balls(&[6])}}
        ]
    });
    let rows = rows_for(&doc);
    let super_row = rows.last().expect("super over row");
    assert!(super_row.is_super_over);
    assert_eq!(super_row.inning, 0);
    assert_eq!(super_row.target, None);
    assert!(rows.iter().filter(|r| r.inning == 2).all(|r| r.target == Some(3)));
}

#[test]
fn required_rate_ties_round_to_even() {
    let mut chase = vec![1; 10];
    chase.extend(vec![0; 78]);
    let rows = rows_for(&match_doc(legal_run_balls(&[1; 48]), legal_run_balls(&chase)));

    let last = rows.last().expect("chase rows");
    assert_eq!(last.inning, 2);
    assert_eq!(last.balls_remaining, 32);
    assert_eq!(last.target, Some(49));
    assert_eq!(last.runs_left, Some(39));
    assert_eq!(last.rrr, Some(7.312));
}

#[test]
fn required_rate_unresolved_once_chase_budget_is_spent() {
    let doc = json!({
        "info": {"teams": ["A", "B"]},
        "innings": [
            {"1st innings": {"team": "A", "overs": 1, "deliveries": legal_run_balls(&[4; 6])}},
            {"2nd innings": {"team": "B", "overs": 1, "deliveries": legal_run_balls(&[1; 6])}}
        ]
    });
    let rows = rows_for(&doc);
    let second: Vec<_> = rows.iter().filter(|r| r.inning == 2).collect();
    assert_eq!(second.len(), 6);

    for row in &second[..5] {
        assert!(row.balls_remaining > 0);
        assert!(row.rrr.is_some());
    }

    let last = second[5];
    assert_eq!(last.balls_remaining, 0);
    assert_eq!(last.target, Some(25));
    assert_eq!(last.runs_required, Some(19));
    assert_eq!(last.runs_left, Some(19));
    assert_eq!(last.rrr, None);
}
