use std::fs;
use std::path::{Path, PathBuf};

use team_weekly::config::{GameIdOrder, MismatchPolicy, PipelineConfig};
use team_weekly::mapping::TeamMapping;
use team_weekly::merge::{MergeError, MergeOptions, merge_data, merge_pair, paired_stats_path};
use team_weekly::pipeline::clean_merged;

const PENALTY_HEADER: &str = "Week,Date,Opponent,Outcome,Ref Crew,Total Count,Total Yards,Off Count,Off Yards,Def Count,Def Yards,ST Count,ST Yards";
const STATS_LEVEL0: &str = ",,,,,,,,,,Score,Score,Offense,Offense,Offense,Offense,Offense,Defense,Defense,Defense,Defense,Defense,Expected Points,Expected Points,Expected Points";
const STATS_LEVEL1: &str = "Week,Day,Date,,,,OT,Rec,,Opp,Tm,Opp,1stD,TotYd,PassY,RushY,TO,1stD,TotYd,PassY,RushY,TO,Offense,Defense,Sp. Tms";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "team_weekly_{name}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("team_weekly_penalty")).expect("create penalty dir");
    fs::create_dir_all(dir.join("team_weekly_stats")).expect("create stats dir");
    dir
}

fn penalty_csv(opponents: &[&str]) -> String {
    let mut out = format!("{PENALTY_HEADER}\n");
    for (i, opp) in opponents.iter().enumerate() {
        out.push_str(&format!(
            "{},10/{:02}/2020,{opp},W 24-17,Hochuli,{},{},3,25,2,20,1,5\n",
            i + 1,
            i + 1,
            6,
            50
        ));
    }
    out.push_str(&format!(
        ",,,,,{},{},,,,,,\n",
        6 * opponents.len(),
        50 * opponents.len()
    ));
    out
}

fn stats_row(week: &str, result: &str, location: &str, scored: u32, allowed: u32) -> String {
    let cells = [
        week.to_string(),
        "Sun".to_string(),
        "October 11".to_string(),
        "1:00PM ET".to_string(),
        "boxscore".to_string(),
        result.to_string(),
        String::new(),
        "1-0".to_string(),
        location.to_string(),
        "Somebody".to_string(),
        scored.to_string(),
        allowed.to_string(),
        "20".to_string(),
        "350".to_string(),
        "250".to_string(),
        "100".to_string(),
        String::new(),
        "18".to_string(),
        "300".to_string(),
        "200".to_string(),
        "100".to_string(),
        "2".to_string(),
        "1.5".to_string(),
        "-2.25".to_string(),
        "0.5".to_string(),
    ];
    cells.join(",")
}

fn bye_row(week: &str) -> String {
    let mut cells = vec![String::new(); 25];
    cells[0] = week.to_string();
    cells[9] = "Bye Week".to_string();
    cells.join(",")
}

/// Stats file for `games` weeks plus a bye row after week 7.
fn stats_csv(games: u32) -> String {
    let mut out = format!("{STATS_LEVEL0}\n{STATS_LEVEL1}\n");
    for week in 1..=games {
        let result = if week % 2 == 0 { "W" } else { "L" };
        let location = if week % 3 == 0 { "@" } else { "" };
        out.push_str(&stats_row(&week.to_string(), result, location, 20 + week, 17));
        out.push('\n');
        if week == 7 {
            out.push_str(&bye_row("8"));
            out.push('\n');
        }
    }
    out
}

fn write(path: &Path, body: &str) {
    fs::write(path, body).expect("write fixture");
}

fn mapping_text() -> String {
    let mut out = String::from("NYG:nyg\nWAS:was\n");
    for i in 1..=16 {
        out.push_str(&format!("A{i:02}:alpha{i}\nB{i:02}:bravo{i}\n"));
    }
    out
}

/// nyg and was each play 16 games; they meet only in week 5.
fn seed_two_teams(dir: &Path) {
    let nyg: Vec<String> = (1..=16)
        .map(|w| if w == 5 { "WAS".to_string() } else { format!("A{w:02}") })
        .collect();
    let was: Vec<String> = (1..=16)
        .map(|w| if w == 5 { "NYG".to_string() } else { format!("B{w:02}") })
        .collect();
    let nyg: Vec<&str> = nyg.iter().map(String::as_str).collect();
    let was: Vec<&str> = was.iter().map(String::as_str).collect();

    write(&dir.join("teams_mapping.txt"), &mapping_text());
    write(&dir.join("team_weekly_penalty/nyg_2020.csv"), &penalty_csv(&nyg));
    write(&dir.join("team_weekly_stats/nyg_2020.csv"), &stats_csv(16));
    write(&dir.join("team_weekly_penalty/was_2020.csv"), &penalty_csv(&was));
    write(&dir.join("team_weekly_stats/was_2020.csv"), &stats_csv(16));
}

fn config_for(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        data_dir: dir.to_path_buf(),
        ..PipelineConfig::default()
    }
}

#[test]
fn shared_game_gets_one_id_and_others_are_distinct() {
    let dir = scratch_dir("e2e");
    seed_two_teams(&dir);

    let summary = clean_merged(&config_for(&dir), None).expect("pipeline should succeed");
    assert_eq!(summary.files, 2);
    assert_eq!(summary.rows, 32);
    assert_eq!(summary.games, 31);
    assert!(summary.mismatches.is_empty());

    let mut rdr = csv::Reader::from_path(dir.join("merged_data.txt")).expect("open output");
    let headers = rdr.headers().expect("headers").clone();
    assert_eq!(headers.len(), 37);
    assert_eq!(&headers[0], "Team");
    assert_eq!(&headers[6], "Date");
    assert_eq!(&headers[21], "Points Allowed");
    assert_eq!(&headers[22], "Point Differential");
    assert_eq!(&headers[36], "Game ID");

    let col = |name: &str| headers.iter().position(|h| h == name).expect("column");
    let (team, week, id, diff) = (col("Team"), col("Week"), col("Game ID"), col("Point Differential"));
    let date = col("Date");

    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.expect("record")).collect();
    assert_eq!(rows.len(), 32);

    let week5: Vec<&csv::StringRecord> = rows.iter().filter(|r| &r[week] == "5").collect();
    assert_eq!(week5.len(), 2);
    assert_eq!(&week5[0][team], "nyg");
    assert_eq!(&week5[1][team], "was");
    assert_eq!(&week5[0][id], &week5[1][id]);
    assert_eq!(&week5[0][date], "10/05/2020");

    let mut ids: Vec<&str> = rows.iter().map(|r| &r[id]).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 31);

    // Week 1: 21 scored, 17 allowed.
    assert_eq!(&rows[0][diff], "4");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn first_seen_ids_follow_file_order() {
    let dir = scratch_dir("first_seen");
    seed_two_teams(&dir);

    clean_merged(&config_for(&dir), None).expect("pipeline should succeed");
    let mut rdr = csv::Reader::from_path(dir.join("merged_data.txt")).expect("open output");
    let ids: Vec<String> = rdr
        .records()
        .map(|r| r.expect("record")[36].to_string())
        .collect();
    let nyg_ids: Vec<String> = (0..16).map(|i| i.to_string()).collect();
    assert_eq!(&ids[..16], &nyg_ids[..]);
    assert_eq!(ids[16 + 4], "4");
    assert_eq!(ids[16], "16");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn key_sorted_ids_still_share_the_meeting() {
    let dir = scratch_dir("sorted");
    seed_two_teams(&dir);

    let cfg = PipelineConfig {
        game_id_order: GameIdOrder::KeySorted,
        ..config_for(&dir)
    };
    let summary = clean_merged(&cfg, None).expect("pipeline should succeed");
    assert_eq!(summary.games, 31);

    let mut rdr = csv::Reader::from_path(dir.join("merged_data.txt")).expect("open output");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.expect("record")).collect();
    assert_eq!(rows[4][36], rows[16 + 4][36]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_stats_pair_is_fatal() {
    let dir = scratch_dir("missing_pair");
    write(&dir.join("teams_mapping.txt"), &mapping_text());
    write(
        &dir.join("team_weekly_penalty/nyg_2020.csv"),
        &penalty_csv(&["A01"]),
    );

    let err = paired_stats_path(
        &dir.join("team_weekly_penalty/nyg_2020.csv"),
        &dir.join("team_weekly_stats"),
    )
    .unwrap_err();
    assert!(matches!(err, MergeError::MissingPair { .. }));

    let mapping = TeamMapping::load(&dir.join("teams_mapping.txt")).expect("mapping");
    let err = merge_data(&config_for(&dir), &mapping).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MergeError>(),
        Some(MergeError::MissingPair { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn row_count_mismatch_warns_or_fails_by_policy() {
    let dir = scratch_dir("mismatch");
    write(&dir.join("teams_mapping.txt"), &mapping_text());
    write(
        &dir.join("team_weekly_penalty/nyg_2020.csv"),
        &penalty_csv(&["A01", "A02", "A03"]),
    );
    write(&dir.join("team_weekly_stats/nyg_2020.csv"), &stats_csv(2));

    let mapping = TeamMapping::load(&dir.join("teams_mapping.txt")).expect("mapping");
    let penalty = dir.join("team_weekly_penalty/nyg_2020.csv");
    let stats_dir = dir.join("team_weekly_stats");

    let (table, mismatch) =
        merge_pair(&penalty, &stats_dir, &mapping, MergeOptions::default()).expect("warn mode");
    let mismatch = mismatch.expect("mismatch recorded");
    assert_eq!(mismatch.file, "nyg_2020.csv");
    assert_eq!(mismatch.penalty_rows, 3);
    assert_eq!(mismatch.stats_rows, 2);
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(2, "Points Scored"), None);
    assert_eq!(table.get(2, "Opponent"), Some("alpha3"));

    let opts = MergeOptions {
        mismatch: MismatchPolicy::Fail,
        ..MergeOptions::default()
    };
    let err = merge_pair(&penalty, &stats_dir, &mapping, opts).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MergeError>(),
        Some(MergeError::RowCountMismatch(m)) if m.penalty_rows == 3
    ));

    // The padded row cannot pass the integer cast.
    assert!(clean_merged(&config_for(&dir), None).is_err());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn equal_length_tables_join_row_for_row() {
    let dir = scratch_dir("positional");
    write(&dir.join("teams_mapping.txt"), &mapping_text());
    write(
        &dir.join("team_weekly_penalty/nyg_2020.csv"),
        &penalty_csv(&["A01", "A02", "A03", "A04", "A05", "A06", "A07", "A08"]),
    );
    write(&dir.join("team_weekly_stats/nyg_2020.csv"), &stats_csv(8));

    let mapping = TeamMapping::load(&dir.join("teams_mapping.txt")).expect("mapping");
    let (table, mismatch) = merge_pair(
        &dir.join("team_weekly_penalty/nyg_2020.csv"),
        &dir.join("team_weekly_stats"),
        &mapping,
        MergeOptions::default(),
    )
    .expect("merge");
    assert!(mismatch.is_none());
    assert_eq!(table.len(), 8);
    for row in 0..8 {
        let week = (row + 1).to_string();
        assert_eq!(table.get(row, "Week"), Some(week.as_str()));
        let opp = format!("alpha{}", row + 1);
        assert_eq!(table.get(row, "Opponent"), Some(opp.as_str()));
    }

    let _ = fs::remove_dir_all(&dir);
}
