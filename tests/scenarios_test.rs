//! End-to-end check scenarios against real files.

use std::fs;
use std::path::{Path, PathBuf};

use configmate::cancel::CancellationToken;
use configmate::check::{CheckOptions, Checker, OutcomeKind, Report};
use configmate::rulebook::parse_rulebook;
use configmate::token::Token;
use tempfile::TempDir;

const PORT_RULEBOOK: &str = "name: web
files:
  server: server.yaml
rules:
  - id: R1
    field: port
    type: int
    check: range(1, 65535)
";

fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (name, content) in files {
        let path = temp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    temp
}

fn check(dir: &Path, parallel: bool) -> Report {
    let options = CheckOptions {
        parallel,
        ..CheckOptions::default()
    };
    Checker::new(options).check_path(&dir.join("rules.yml"), &CancellationToken::new())
}

#[test]
fn wrong_type_points_at_value() {
    let temp = project(&[
        ("rules.yml", PORT_RULEBOOK),
        (
            "server.yaml",
            "# server\nname: api\nhost: localhost\nport:  \"abc\"\n",
        ),
    ]);

    let report = check(temp.path(), true);

    assert_eq!(report.len(), 1);
    let outcome = &report.outcomes()[0];
    assert!(!outcome.passed);
    assert!(outcome.comment.contains("R1"));
    assert_eq!(
        outcome.tokens,
        vec![Token::new(temp.path().join("server.yaml"), 4, 8, 5)]
    );
}

#[test]
fn valid_value_passes_without_tokens() {
    let temp = project(&[
        ("rules.yml", PORT_RULEBOOK),
        (
            "server.yaml",
            "# server\nname: api\nhost: localhost\nport:  8080\n",
        ),
    ]);

    let report = check(temp.path(), true);

    assert!(report.passed());
    assert!(report.outcomes()[0].tokens.is_empty());
}

#[test]
fn missing_config_is_single_synthetic_outcome() {
    let temp = project(&[("rules.yml", PORT_RULEBOOK)]);

    let report = check(temp.path(), true);

    assert_eq!(report.len(), 1);
    let outcome = &report.outcomes()[0];
    assert!(!outcome.passed);
    assert_eq!(outcome.kind, OutcomeKind::LoadError);
    assert!(outcome.comment.contains("server.yaml"));
    assert_eq!(outcome.tokens.len(), 1);
    assert_eq!((outcome.tokens[0].row, outcome.tokens[0].col), (1, 1));
}

#[test]
fn missing_rulebook_is_single_synthetic_outcome() {
    let temp = TempDir::new().unwrap();

    let report = check(temp.path(), true);

    assert_eq!(report.len(), 1);
    assert!(report.outcomes()[0].comment.contains("rules.yml"));
}

#[test]
fn zero_rules_pass_vacuously() {
    let temp = project(&[("rules.yml", "name: empty\nfiles: {}\nrules: []\n")]);

    let report = check(temp.path(), true);

    assert!(report.is_empty());
    assert!(report.passed());
}

#[test]
fn optional_absent_field_passes_without_tokens() {
    let temp = project(&[
        (
            "rules.yml",
            "name: web\nfiles:\n  server: server.yaml\nrules:\n  - id: TLS\n    field: tls.cert\n    type: string\n    optional: true\n",
        ),
        ("server.yaml", "port: 80\n"),
    ]);

    let report = check(temp.path(), true);

    assert!(report.passed());
    assert!(report.outcomes()[0].tokens.is_empty());
}

#[test]
fn parsing_is_deterministic() {
    let text = "name: web
files:
  server: server.yaml
  env: { path: .env, format: env }
rules:
  - id: R1
    file: server
    field: servers[*].port
    check: int && range(1, 65535)
  - id: R2
    file: env
    field: LOG_LEVEL
    check: oneof(\"debug\", \"info\")
";
    let path = PathBuf::from("rules.yml");
    assert_eq!(
        parse_rulebook(text, &path).unwrap(),
        parse_rulebook(text, &path).unwrap()
    );
}

#[test]
fn order_follows_declaration_under_parallelism() {
    let mut rulebook = String::from("name: many\nfiles:\n  server: server.yaml\nrules:\n");
    let mut server = String::new();
    for i in 0..64 {
        rulebook.push_str(&format!(
            "  - id: R{i}\n    field: key{i}\n    check: eq({i})\n"
        ));
        // Every third value is wrong.
        let value = if i % 3 == 0 { i + 1 } else { i };
        server.push_str(&format!("key{i}: {value}\n"));
    }
    let temp = project(&[("rules.yml", &rulebook), ("server.yaml", &server)]);

    let parallel = check(temp.path(), true);
    let sequential = check(temp.path(), false);

    let ids: Vec<String> = parallel
        .outcomes()
        .iter()
        .map(|o| o.rule_id.clone())
        .collect();
    let expected: Vec<String> = (0..64).map(|i| format!("R{i}")).collect();
    assert_eq!(ids, expected);
    assert_eq!(parallel, sequential);
    assert_eq!(parallel.count(OutcomeKind::Failed), 22);
}

#[test]
fn rules_without_file_target_every_file() {
    let temp = project(&[
        (
            "rules.yml",
            "name: shared\nfiles:\n  a: a.yaml\n  b: b.json\nrules:\n  - id: NAME\n    field: name\n    type: string\n",
        ),
        ("a.yaml", "name: alpha\n"),
        ("b.json", "{\"name\": 7}\n"),
    ]);

    let report = check(temp.path(), true);

    assert_eq!(report.len(), 2);
    assert!(report.outcomes()[0].passed);
    let failed = &report.outcomes()[1];
    assert!(!failed.passed);
    assert_eq!(
        failed.tokens,
        vec![Token::new(temp.path().join("b.json"), 1, 10, 1)]
    );
}

#[test]
fn cross_file_comparison_implicates_both_files() {
    let temp = project(&[
        (
            "rules.yml",
            "name: ports\nfiles:\n  server: server.yaml\n  env: { path: app.env, format: env }\nrules:\n  - id: SAME_PORT\n    file: env\n    field: PORT\n    check: eq(@server:port)\n",
        ),
        ("server.yaml", "port: 8080\n"),
        ("app.env", "# deployment\nPORT=9090\n"),
    ]);

    let report = check(temp.path(), true);

    let outcome = &report.outcomes()[0];
    assert!(!outcome.passed);
    assert_eq!(
        outcome.tokens,
        vec![
            Token::new(temp.path().join("app.env"), 2, 6, 4),
            Token::new(temp.path().join("server.yaml"), 1, 7, 4),
        ]
    );
}

#[test]
fn unknown_rule_type_is_reported_at_its_token() {
    let temp = project(&[(
        "rules.yml",
        "name: web\nfiles:\n  server: server.yaml\nrules:\n  - id: R1\n    field: port\n    type: colour\n",
    )]);

    let report = check(temp.path(), true);

    assert_eq!(report.len(), 1);
    let outcome = &report.outcomes()[0];
    assert_eq!(outcome.kind, OutcomeKind::LoadError);
    assert!(outcome.comment.contains("colour"));
    assert_eq!(
        outcome.tokens,
        vec![Token::new(temp.path().join("rules.yml"), 7, 11, 6)]
    );
}

#[test]
fn cancellation_during_loading_yields_one_cancelled_outcome() {
    let temp = project(&[
        ("rules.yml", PORT_RULEBOOK),
        ("server.yaml", "port: 80\n"),
    ]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Checker::new(CheckOptions::default())
        .check_path(&temp.path().join("rules.yml"), &cancel);

    assert_eq!(report.len(), 1);
    assert!(report.was_cancelled());
    assert!(!report.passed());
}
