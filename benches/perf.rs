use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

use ipl_live_states::corpus::process_document;
use ipl_live_states::live_state::track_match;
use ipl_live_states::match_info::parse_match_info;
use ipl_live_states::table::Table;

fn innings(team: &str, seed: u32) -> Value {
    let deliveries: Vec<Value> = (0..126u32)
        .map(|idx| {
            let over = idx / 6;
            let ball = idx % 6 + 1;
            let bat = (idx * 7 + seed) % 7;
            let mut delivery = json!({
                "batsman": format!("Batter {}", idx % 11),
                "non_striker": format!("Batter {}", (idx + 1) % 11),
                "bowler": format!("Bowler {}", over % 5),
                "runs": {"batsman": bat, "extras": 0, "total": bat}
            });
            if idx % 23 == 0 {
                delivery["extras"] = json!({"wides": 1});
                delivery["runs"] = json!({"batsman": 0, "extras": 1, "total": 1});
            }
            if idx % 19 == 0 {
                delivery["wicket"] = json!({"kind": "caught", "player_out": "Batter"});
            }
            json!({ format!("{over}.{ball}"): delivery })
        })
        .collect();
    json!({ "team": team, "deliveries": deliveries })
}

fn sample_match() -> Value {
    json!({
        "info": {
            "season": 2019,
            "dates": ["2019-05-12"],
            "teams": ["Mumbai Indians", "Chennai Super Kings"],
            "outcome": {"winner": "Mumbai Indians", "by": {"runs": 1}}
        },
        "innings": [
            {"1st innings": innings("Mumbai Indians", 1)},
            {"2nd innings": innings("Chennai Super Kings", 3)}
        ]
    })
}

fn bench_track_match(c: &mut Criterion) {
    let doc = sample_match();
    let record = parse_match_info(&doc);
    c.bench_function("track_match", |b| {
        b.iter(|| {
            let tracked = track_match(black_box(&doc), black_box(&record));
            black_box(tracked.rows.len());
        })
    });
}

fn bench_document_to_table(c: &mut Criterion) {
    let raw = serde_json::to_vec(&sample_match()).unwrap();
    c.bench_function("document_to_table", |b| {
        b.iter(|| {
            let parsed = process_document("bench.json", black_box(&raw)).unwrap();
            let mut table = Table::deliveries();
            for row in &parsed.rows {
                table.push_delivery(row, &parsed.record);
            }
            table.finalize();
            black_box(table.len());
        })
    });
}

criterion_group!(benches, bench_track_match, bench_document_to_table);
criterion_main!(benches);
