use std::{fs, path::Path, process::Command};

fn write_template(dir: &Path) {
    let mut rows = vec![vec!["0"; 16]; 12];
    rows[8] = vec!["2"; 16];
    rows[9] = vec!["3"; 16];
    rows[10] = vec!["3"; 16];
    rows[11] = vec!["1"; 16];
    rows[7][1] = "400";
    rows[7][0] = "201";
    let csv: String = rows.iter().map(|row| row.join(",") + "\n").collect();
    fs::write(dir.join("DEFAULT.csv"), csv).expect("write template");
}

fn sprout(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_sprout"))
        .arg("--maps")
        .arg(dir)
        .args(args)
        .output()
        .expect("failed to launch the sprout binary")
}

#[test]
fn show_prints_one_line_per_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_template(dir.path());

    let output = sprout(dir.path(), &["show", "DEFAULT"]);

    assert!(output.status.success(), "{output:?}");
    let text = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 12);
    assert_eq!(lines[7], "DP..............");
    assert_eq!(lines[11], "################");
}

#[test]
fn run_creates_the_start_world_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_template(dir.path());

    let output = sprout(dir.path(), &["run", "--frames", "30"]);

    assert!(output.status.success(), "{output:?}");
    assert!(dir.path().join("START.csv").exists());
    let names = fs::read_to_string(dir.path().join("WorldsList.txt")).expect("list");
    assert_eq!(names.trim(), "START");

    let text = String::from_utf8(output.stdout).expect("utf8");
    assert!(
        text.lines()
            .any(|line| line.split_whitespace().eq(["DirtBlock", "10/64"])),
        "{text}"
    );
}

#[test]
fn path_reports_unreachable_goals() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_template(dir.path());

    let found = sprout(dir.path(), &["path", "DEFAULT", "2,4", "5,4"]);
    assert!(found.status.success(), "{found:?}");
    let text = String::from_utf8(found.stdout).expect("utf8");
    assert_eq!(text.trim(), "(3, 4) (4, 4) (5, 4)");

    let outside = sprout(dir.path(), &["path", "DEFAULT", "2,4", "40,4"]);
    assert!(!outside.status.success());
}
