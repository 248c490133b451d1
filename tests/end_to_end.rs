//! Load → run → report scenarios driven through a scripted executor.

mod support;

use regress::config::RunConfig;
use regress::discovery::OsDirSource;
use regress::harness::{exit_code, load_tests, run_and_report};
use regress::runner::RunSummary;
use regress::{Expectation, HarnessError, Outcome, TestDescription};
use support::{make_dirs, write_file, ScriptedExecutor};
use tempfile::tempdir;
use termcolor::NoColor;

struct Run {
    summary: Result<RunSummary, HarnessError>,
    report: String,
    log: String,
}

fn run(tests: Vec<TestDescription>, executor: &mut ScriptedExecutor) -> Run {
    let config = RunConfig::default();
    let mut report = NoColor::new(Vec::new());
    let mut log = Vec::new();
    let summary = run_and_report(tests, &config, executor, &mut report, &mut log);
    Run {
        summary,
        report: String::from_utf8(report.into_inner()).unwrap(),
        log: String::from_utf8(log).unwrap(),
    }
}

#[test]
fn passing_test_is_listed_under_successes() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "basic.txt", "foo|--opt=1|PASS|basic test\n");
    let tests = load_tests(&[file], &OsDirSource).unwrap();
    let mut executor = ScriptedExecutor::always(0);

    let run = run(tests, &mut executor);
    let summary = run.summary.unwrap();

    assert_eq!(summary.stats.get(Outcome::Pass), 1);
    assert_eq!(summary.stats.get(Outcome::Fail), 0);
    assert_eq!(summary.stats.get(Outcome::XPass), 0);
    assert_eq!(summary.stats.get(Outcome::XFail), 0);
    assert_eq!(exit_code(&summary), 0);
    assert!(run.report.contains("PASS: 1"));
    assert!(run.report.contains("---- SUCCESSES ----\n1|foo|--opt=1|basic test --- PASS"));
    assert_eq!(
        executor.commands(),
        vec!["rt --chow-args=\"--opt=1\" --test=\"foo\" --exit-on-failure"]
    );
}

#[test]
fn expected_failure_is_listed_under_failures() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "broken.txt", "bar||XFAIL|known broken\n");
    let tests = load_tests(&[file], &OsDirSource).unwrap();
    let mut executor = ScriptedExecutor::always(99);

    let run = run(tests, &mut executor);
    let summary = run.summary.unwrap();

    assert_eq!(summary.stats.get(Outcome::XFail), 1);
    assert_eq!(summary.stats.count(), 1);
    assert_eq!(exit_code(&summary), 0);
    assert!(run.report.contains("XFAIL: 1"));
    assert!(run.report.contains("---- FAILURES ----\n1|bar||known broken --- XFAIL"));
    assert!(!run.report.contains("---- SUCCESSES ----"));
}

#[test]
fn macro_line_expands_to_one_test_per_leaf() {
    let dir = tempdir().unwrap();
    let fixtures = dir.path().join("fixtures");
    make_dirs(&fixtures, &["one", "two", ".git/objects"]);
    let file = write_file(
        dir.path(),
        "macro.txt",
        &format!("$(expand {})|--x|PASS|\n", fixtures.display()),
    );

    let tests = load_tests(&[file], &OsDirSource).unwrap();

    assert_eq!(tests.len(), 2);
    assert_eq!(tests[0].path(), fixtures.join("one").display().to_string());
    assert_eq!(tests[1].path(), fixtures.join("two").display().to_string());
    for (index, test) in tests.iter().enumerate() {
        assert_eq!(test.id(), index + 1);
        assert_eq!(test.args(), "--x");
        assert_eq!(test.expected(), Expectation::Pass);
        assert_eq!(test.comment(), "");
    }
}

#[test]
fn test_count_is_literals_plus_leaves_and_ids_span_files() {
    let dir = tempdir().unwrap();
    let suite = dir.path().join("suite");
    make_dirs(&suite, &["a/x", "a/y", "b"]);
    let first = write_file(
        dir.path(),
        "first.txt",
        &format!(
            "# suite\n!ROOT={root}\nlead||PASS|\n$(expand {root})|-O|XFAIL|wip\ntrail||PASS|\n",
            root = suite.display()
        ),
    );
    let second = write_file(dir.path(), "second.txt", "more||PASS|\n");

    let tests = load_tests(&[first, second], &OsDirSource).unwrap();

    assert_eq!(tests.len(), 2 + 3 + 1);
    let ids: Vec<_> = tests.iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(tests[0].path(), "lead");
    assert_eq!(tests[4].path(), "trail");
    assert_eq!(tests[5].path(), "more");
    assert!(tests[1..4].iter().all(|t| t.expected() == Expectation::XFail));
}

#[test]
fn yaml_scripts_and_line_files_share_one_id_sequence() {
    let dir = tempdir().unwrap();
    let cases = dir.path().join("cases");
    make_dirs(&cases, &["fast", "slow"]);
    let lines = write_file(dir.path(), "a.txt", "first||PASS|\n");
    let script = write_file(
        dir.path(),
        "b.yaml",
        &format!(
            "- expand: {}\n  each:\n    skip: [slow]\n- test: last\n  expected: XFAIL\n",
            cases.display()
        ),
    );

    let tests = load_tests(&[lines, script], &OsDirSource).unwrap();

    let summary: Vec<_> = tests.iter().map(|t| (t.id(), t.path().to_string())).collect();
    assert_eq!(
        summary,
        vec![
            (1, "first".to_string()),
            (2, cases.join("fast").display().to_string()),
            (3, "last".to_string()),
        ]
    );
}

#[test]
fn classification_follows_exit_status_per_test() {
    let tests = vec![
        TestDescription::new(1, "p0", "", Expectation::Pass, ""),
        TestDescription::new(2, "x0", "", Expectation::XFail, ""),
        TestDescription::new(3, "p99", "", Expectation::Pass, ""),
        TestDescription::new(4, "x99", "", Expectation::XFail, ""),
    ];
    let mut executor = ScriptedExecutor::always(0)
        .with("p99", Some(99))
        .with("x99", Some(99));

    let run = run(tests, &mut executor);
    let summary = run.summary.unwrap();
    let outcomes: Vec<_> = summary
        .stats
        .results()
        .iter()
        .map(|t| t.result().unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![Outcome::Pass, Outcome::XPass, Outcome::Fail, Outcome::XFail]
    );
    assert_eq!(summary.stats.count(), 4);
    assert_eq!(summary.stats.failures().len(), 2);
    assert_eq!(summary.stats.successes().len(), 2);
    assert_eq!(exit_code(&summary), 1);
}

#[test]
fn unresolved_status_aborts_the_run() {
    let tests = vec![
        TestDescription::new(1, "ok", "", Expectation::Pass, ""),
        TestDescription::new(2, "crash", "", Expectation::XFail, ""),
        TestDescription::new(3, "never", "", Expectation::Pass, ""),
    ];
    let mut executor = ScriptedExecutor::always(0).with("crash", Some(139));

    let run = run(tests, &mut executor);

    assert!(matches!(
        run.summary,
        Err(HarnessError::UnresolvedStatus { id: 2, status: Some(139), .. })
    ));
    assert_eq!(executor.invocations.len(), 2);
    assert!(run.report.is_empty());
}

#[test]
fn signal_termination_is_unresolved() {
    let tests = vec![TestDescription::new(1, "killed", "", Expectation::Pass, "")];
    let mut executor = ScriptedExecutor::always(0).with("killed", None);

    let run = run(tests, &mut executor);

    assert!(matches!(
        run.summary,
        Err(HarnessError::UnresolvedStatus { status: None, .. })
    ));
}

#[test]
fn diagnostic_log_records_each_execution() {
    let tests = vec![TestDescription::new(1, "foo", "-r 4", Expectation::Pass, "")];
    let mut executor = ScriptedExecutor::always(99);

    let run = run(tests, &mut executor);
    run.summary.unwrap();

    assert!(run.log.starts_with("STARTING TEST RUN\n"));
    assert!(run.log.contains("**** Running Test 1 ****"));
    assert!(run.log.contains("rt --chow-args=\"-r 4\" --test=\"foo\" --exit-on-failure"));
    assert!(run.log.contains("test script exited with status: 99"));
    assert!(run.log.contains("ran foo"));
    assert!(run.log.contains("**** TEST FINISHED WITH STATUS: FAIL ****"));
    assert!(run.log.contains("tests completed in 0 minutes"));
}

#[test]
fn extra_tool_arguments_are_appended_to_every_invocation() {
    let tests = vec![
        TestDescription::new(1, "a", "", Expectation::Pass, ""),
        TestDescription::new(2, "b", "", Expectation::Pass, ""),
    ];
    let config = RunConfig {
        tool: "./rt-local".to_string(),
        tool_args: vec!["--keep-temps".to_string()],
        ..RunConfig::default()
    };
    let mut executor = ScriptedExecutor::always(0);
    let mut report = NoColor::new(Vec::new());
    let mut log = Vec::new();

    run_and_report(tests, &config, &mut executor, &mut report, &mut log).unwrap();

    for invocation in &executor.invocations {
        assert_eq!(invocation.program, "./rt-local");
        assert_eq!(invocation.args.last().map(String::as_str), Some("--keep-temps"));
    }
}

#[test]
fn malformed_line_aborts_loading() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "bad.txt", "good||PASS|\nthis is not a test\n");

    let err = load_tests(&[file], &OsDirSource).unwrap_err();

    assert!(matches!(err, HarnessError::MalformedLine { line: 2, .. }));
}

#[test]
fn macro_over_a_file_is_fatal() {
    let dir = tempdir().unwrap();
    let input = write_file(dir.path(), "input.i", "i2i r1 => r2\n");
    let file = write_file(
        dir.path(),
        "macro.txt",
        &format!("$(expand {})||PASS|\n", input.display()),
    );

    let err = load_tests(&[file], &OsDirSource).unwrap_err();

    assert!(matches!(err, HarnessError::Io { .. }));
}
