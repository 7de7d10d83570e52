use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use team_weekly::config::GameIdOrder;
use team_weekly::normalize::{CANONICAL_COLUMNS, assign_game_ids, normalize};
use team_weekly::stats::clean_stats;
use team_weekly::table::Table;

const STATS_HEADER: &str = ",,,,,,,,,,Score,Score,Offense,Offense,Offense,Offense,Offense,Defense,Defense,Defense,Defense,Defense,Expected Points,Expected Points,Expected Points\nWeek,Day,Date,,,,OT,Rec,,Opp,Tm,Opp,1stD,TotYd,PassY,RushY,TO,1stD,TotYd,PassY,RushY,TO,Offense,Defense,Sp. Tms\n";

fn stats_season() -> String {
    let mut out = STATS_HEADER.to_string();
    for week in 1..=18 {
        if week == 9 {
            out.push_str("9,,,,,,,,,Bye Week,,,,,,,,,,,,,,,\n");
            continue;
        }
        out.push_str(&format!(
            "{week},Sun,November 1,1:00PM ET,boxscore,W,,1-0,@,Opponent {week},27,20,22,380,260,120,1,18,310,210,100,2,5.5,-1.2,0.4\n"
        ));
    }
    out
}

fn canonical_index(name: &str) -> usize {
    CANONICAL_COLUMNS
        .iter()
        .position(|c| *c == name)
        .expect("canonical column")
}

fn merged_league(teams: usize, weeks: usize) -> Table {
    let columns = CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut table = Table::new(columns);
    for t in 0..teams {
        for w in 1..=weeks {
            let opponent = (t + w) % teams;
            let mut row: Vec<Option<String>> = vec![Some("3".to_string()); CANONICAL_COLUMNS.len()];
            row[canonical_index("Team")] = Some(format!("team{t}"));
            row[canonical_index("Opponent")] = Some(format!("team{opponent}"));
            row[canonical_index("Week")] = Some(w.to_string());
            row[canonical_index("Year")] = Some("2023".to_string());
            row[canonical_index("Date")] = Some("2023-09-10".to_string());
            row[canonical_index("Result")] = Some("W".to_string());
            table.push_row(row).expect("row width");
        }
    }
    table
}

fn bench_clean_stats(c: &mut Criterion) {
    let raw = stats_season();
    c.bench_function("clean_stats_season", |b| {
        b.iter(|| {
            let table = Table::from_csv_reader(black_box(raw.as_bytes()), 2).unwrap();
            let cleaned = clean_stats(table).unwrap();
            black_box(cleaned.len());
        })
    });
}

fn bench_normalize_and_ids(c: &mut Criterion) {
    let merged = merged_league(32, 17);
    c.bench_function("normalize_assign_ids_league", |b| {
        b.iter(|| {
            let mut games = normalize(black_box(&merged)).unwrap();
            let n = assign_game_ids(&mut games, GameIdOrder::FirstSeen);
            black_box(n);
        })
    });
}

criterion_group!(benches, bench_clean_stats, bench_normalize_and_ids);
criterion_main!(benches);
