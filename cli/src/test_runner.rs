use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use blocks::BlockTypeRegistry;
use store::{Action, Dispatched, Store};

use crate::script::Step;

const FIXTURE_SUFFIX: &str = ".test.html";

/// Either the position of the focused block, or `false` for "nothing focused".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExpectedFocus {
    Index(usize),
    Flag(bool),
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Actions applied after the markup is parsed.
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Expected serialized document after all steps (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected top-level block names, in order.
    #[serde(default)]
    pub expect_order: Option<Vec<String>>,

    #[serde(default)]
    pub expect_focused: Option<ExpectedFocus>,

    /// If true, the markup itself must be rejected.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// If true, the last step must leave the state unchanged.
    #[serde(default)]
    pub expect_unchanged: bool,
}

/// Split a `.test.html` file into its TOML config and markup.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let markup = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, markup))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(FIXTURE_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };
    let (config, markup) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let outcome = match check_fixture(&config, markup) {
        Ok(()) => TestOutcome::Pass,
        Err(reason) => TestOutcome::Fail(reason),
    };
    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Parse `markup`, apply the steps and compare against every expectation set
/// in `config`. Returns the first mismatch.
fn check_fixture(config: &TestConfig, markup: &str) -> Result<(), String> {
    let registry = Arc::new(BlockTypeRegistry::with_core_types());
    let mut store = Store::new(Arc::clone(&registry));

    let parsed = store.dispatch(Action::Parse {
        html: markup.to_string(),
    });
    match (config.expect_parse_error, parsed) {
        (true, Err(_)) => return Ok(()),
        (true, Ok(_)) => return Err("expected parse error, but parsing succeeded".into()),
        (false, Err(e)) => return Err(format!("unexpected parse error: {}", e)),
        (false, Ok(_)) => {}
    }

    let mut last = None;
    for (i, step) in config.steps.iter().enumerate() {
        let action = step
            .to_action(store.state(), &registry)
            .map_err(|e| format!("step {}: {}", i + 1, e))?;
        let outcome = store
            .dispatch(action)
            .map_err(|e| format!("step {}: {}", i + 1, e))?;
        last = Some(outcome);
    }

    if config.expect_unchanged && last != Some(Dispatched::Unchanged) {
        return Err("expected the last step to leave the state unchanged".into());
    }

    if let Some(expected) = &config.expect_order {
        let actual: Vec<&str> = store
            .state()
            .blocks
            .iter()
            .map(|block| block.name.as_str())
            .collect();
        if actual != *expected {
            return Err(format!(
                "block order mismatch\n  expected: {}\n  actual:   {}",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    if let Some(expected) = &config.expect_focused {
        let expected = match expected {
            ExpectedFocus::Index(index) => Some(*index),
            ExpectedFocus::Flag(false) => None,
            ExpectedFocus::Flag(true) => {
                return Err("expect_focused must be a position or false".into());
            }
        };
        let actual = store.state().focused_index;
        if actual != expected {
            return Err(format!(
                "focus mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    if let Some(expected) = &config.expect_output {
        let actual = store.serialize();
        if actual.trim() != expected.trim() {
            return Err(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                actual.trim()
            ));
        }
    }

    Ok(())
}

/// Discover fixtures grouped by category (subfolder relative to root).
/// Files directly in `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(FIXTURE_SUFFIX))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Select the categories named in `requested` (a name also selects its
/// subfolders). An empty request selects everything.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for name in requested {
        let name = name.trim_matches('/');
        let prefix = format!("{}/", name);
        let before = selected.len();
        for (category, files) in all {
            if category == name || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                name,
                available.join(", ")
            );
        }
    }
    selected
}

/// Run every fixture under `path` (or the single file `path`).
/// Returns the exit code: 0 when all pass, 1 otherwise.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let all_categories = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };

    if all_categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }

    let selected = select_categories(&all_categories, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", paint(category_label(category), "1", no_color));
        }
        for file in files.iter() {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
