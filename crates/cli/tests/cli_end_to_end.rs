use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"[
  {
    "url": "/",
    "template": "index.html",
    "context": {"logname": "awdeorio", "comment": "<script>alert('hi')</script>"}
  },
  {
    "url": "/u/awdeorio/",
    "template": "user.html",
    "context": {"username": "awdeorio"}
  }
]
"#;

fn generate() -> Command {
    Command::new(env!("CARGO_BIN_EXE_generate"))
}

/// Build an input directory with config.json, two templates and a static file
fn create_site(root: &Path) {
    fs::create_dir_all(root.join("templates")).unwrap();
    fs::create_dir_all(root.join("static/css")).unwrap();
    fs::write(root.join("config.json"), CONFIG).unwrap();
    fs::write(
        root.join("templates/base.html"),
        "<html><body>{% block content %}{% endblock %}</body></html>",
    )
    .unwrap();
    fs::write(
        root.join("templates/index.html"),
        "{% extends \"base.html\" %}{% block content %}<p>{{ logname }}</p><p>{{ comment }}</p>{% endblock %}",
    )
    .unwrap();
    fs::write(
        root.join("templates/user.html"),
        "{% extends \"base.html\" %}{% block content %}<h1>{{ username }}</h1>{% endblock %}",
    )
    .unwrap();
    fs::write(root.join("static/css/style.css"), "body { margin: 0; }").unwrap();
}

#[test]
fn generates_site_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("insta485");
    let output = dir.path().join("html");
    create_site(&input);

    generate().arg(&input).arg("-o").arg(&output).assert().success();

    let index = fs::read_to_string(output.join("index.html")).unwrap();
    assert!(index.contains("<p>awdeorio</p>"));
    assert!(index.contains("&lt;script&gt;"));
    assert!(!index.contains("<script>"));

    let user = fs::read_to_string(output.join("u/awdeorio/index.html")).unwrap();
    assert_eq!(user, "<html><body><h1>awdeorio</h1></body></html>");

    assert_eq!(
        fs::read_to_string(output.join("css/style.css")).unwrap(),
        "body { margin: 0; }"
    );
}

#[test]
fn defaults_output_to_generated_html() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    create_site(&input);

    generate()
        .current_dir(dir.path())
        .arg("site")
        .assert()
        .success();

    assert!(dir.path().join("generated_html/index.html").is_file());
}

#[test]
fn second_run_fails_when_output_exists() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    let output = dir.path().join("out");
    create_site(&input);

    generate().arg(&input).arg("--output").arg(&output).assert().success();

    generate()
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .code(1)
        .stderr(contains("generate: error:"))
        .stderr(contains("already exists"));
}

#[test]
fn missing_config_names_expected_path() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    fs::create_dir_all(input.join("templates")).unwrap();

    generate()
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(contains("configuration file not found"))
        .stderr(contains(input.join("config.json").display().to_string()));
}

#[test]
fn trailing_comma_reports_line_and_column() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    fs::create_dir_all(input.join("templates")).unwrap();
    fs::write(
        input.join("config.json"),
        "[\n  {\"url\": \"/\", \"template\": \"index.html\", \"context\": {}},\n]\n",
    )
    .unwrap();

    generate()
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(contains("line 3"))
        .stderr(contains("column 1"));
}

#[test]
fn missing_input_dir_fails() {
    let dir = TempDir::new().unwrap();

    generate()
        .arg(dir.path().join("does-not-exist"))
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(contains("failed to generate site from"))
        .stderr(contains("input directory not found"));
}

#[test]
fn missing_templates_dir_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("config.json"), "[]").unwrap();

    generate()
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(contains("templates directory not found"));
}

#[test]
fn render_error_names_template() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    fs::create_dir_all(input.join("templates")).unwrap();
    fs::write(
        input.join("config.json"),
        r#"[{"url": "/", "template": "index.html", "context": {}}]"#,
    )
    .unwrap();
    fs::write(input.join("templates/index.html"), "{{ missing_var }}").unwrap();

    generate()
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(contains("index.html"))
        .stderr(contains("missing_var"));
}

#[test]
fn verbose_logs_each_page_and_static_copy() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    let output = dir.path().join("out");
    create_site(&input);

    let assert = generate()
        .env_remove("RUST_LOG")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--verbose")
        .assert()
        .success()
        .stderr(contains("index.html ->"))
        .stderr(contains("user.html ->"))
        .stderr(contains("(1 files)"));

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert_eq!(stderr.lines().count(), 3, "{stderr}");
    assert!(stderr.lines().all(|line| line.starts_with("generate: ")));
}

#[test]
fn template_syntax_error_is_one_diagnostic_line() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    fs::create_dir_all(input.join("templates")).unwrap();
    fs::write(
        input.join("config.json"),
        r#"[{"url": "/", "template": "index.html", "context": {}}]"#,
    )
    .unwrap();
    fs::write(input.join("templates/index.html"), "<p>{% if %}</p>\n{{ x }}\n").unwrap();

    let assert = generate()
        .env_remove("RUST_LOG")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(contains("generate: error:"))
        .stderr(contains("index.html"));

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert_eq!(stderr.lines().count(), 1, "{stderr}");
}

#[test]
fn unused_broken_template_and_binary_file_are_ignored() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    let output = dir.path().join("out");
    create_site(&input);
    fs::write(input.join("templates/draft.html"), "{% for %}").unwrap();
    fs::write(input.join("templates/logo.png"), [0x89u8, 0x50, 0x4e, 0x47, 0xff, 0xfe]).unwrap();

    generate().arg(&input).arg("-o").arg(&output).assert().success();

    assert!(output.join("index.html").is_file());
    assert!(output.join("u/awdeorio/index.html").is_file());
}

#[test]
fn uppercase_html_template_is_escaped() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    let output = dir.path().join("out");
    fs::create_dir_all(input.join("templates")).unwrap();
    fs::write(
        input.join("config.json"),
        r#"[{"url": "/", "template": "Page.HTML", "context": {"x": "<script>"}}]"#,
    )
    .unwrap();
    fs::write(input.join("templates/Page.HTML"), "<p>{{ x }}</p>").unwrap();

    generate().arg(&input).arg("-o").arg(&output).assert().success();

    assert_eq!(
        fs::read_to_string(output.join("index.html")).unwrap(),
        "<p>&lt;script&gt;</p>"
    );
}

#[test]
fn quiet_by_default() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("site");
    create_site(&input);

    generate()
        .env_remove("RUST_LOG")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .success()
        .stderr(predicates::str::is_empty());
}
