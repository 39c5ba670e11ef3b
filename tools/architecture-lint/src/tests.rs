//! Unit tests for the architecture lint.

use std::path::PathBuf;

use rstest::fixture;
use rstest::rstest;

use super::*;

#[derive(Clone, Copy)]
struct LintSingle;

impl LintSingle {
    fn lint(self, file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
        lint_sources(&[LintSource {
            file: PathBuf::from(file),
            contents: contents.to_owned(),
        }])
    }
}

#[fixture]
fn lint_single() -> LintSingle {
    LintSingle
}

#[rstest]
#[case(
    "inbound/http/activation.rs",
    "use crate::domain::TriggerId; fn handler() { let _ = TriggerId::new(\"x\"); }",
    true
)]
#[case(
    "inbound/http/activation.rs",
    "use crate::outbound::persistence::DieselTokenLedger; fn handler() { let _ = DieselTokenLedger; }",
    false
)]
#[case(
    "inbound/http/activation.rs",
    "use outbound::persistence::DieselTokenLedger; fn handler() { let _ = DieselTokenLedger; }",
    false
)]
#[case(
    "inbound/http/activation.rs",
    "use maze_dashboard::outbound::persistence::DieselTokenLedger; fn handler() { let _ = DieselTokenLedger; }",
    false
)]
#[case(
    "inbound/http/stats.rs",
    "use diesel::prelude::*; fn handler() {}",
    false
)]
#[case(
    "inbound/http/triggers.rs",
    "fn handler() { let _ = notify::recommended_watcher; }",
    false
)]
#[case(
    "domain/activation.rs",
    "use crate::inbound::http; fn thing() { let _ = 1; }",
    false
)]
#[case(
    "domain/dispatch.rs",
    "async fn fire() { let _ = reqwest::get(\"http://10.0.0.2/trigger\").await; }",
    false
)]
#[case(
    "domain/activation.rs",
    "use tokio::task::JoinHandle; struct Handle(JoinHandle<()>);",
    true
)]
#[case(
    "outbound/persistence/diesel_token_ledger.rs",
    "use crate::inbound::http; fn thing() { let _ = 1; }",
    false
)]
#[case(
    "outbound/devices/http_device.rs",
    "use actix_web::HttpResponse; fn thing() { let _ = HttpResponse::Ok(); }",
    false
)]
#[case(
    "outbound/devices/http_device.rs",
    "use reqwest::Client; use crate::domain::ports::TriggerExecutor; fn thing() { let _ = Client::new(); }",
    true
)]
fn detects_boundary_violations(
    lint_single: LintSingle,
    #[case] file: &str,
    #[case] contents: &str,
    #[case] ok: bool,
) {
    let result = lint_single.lint(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
fn reports_every_violation_in_a_file(lint_single: LintSingle) {
    let result = lint_single.lint(
        "domain/stats.rs",
        "use diesel::prelude::*; use crate::outbound::persistence::DbPool; fn f() {}",
    );
    let Err(ArchitectureLintError::Violations(violations)) = result else {
        panic!("expected violations, got {result:?}");
    };
    assert_eq!(violations.len(), 2, "violations: {violations:?}");
}

#[rstest]
fn files_outside_layers_are_rejected(lint_single: LintSingle) {
    let result = lint_single.lint("settings.rs", "fn f() {}");
    assert!(matches!(result, Err(ArchitectureLintError::Parse { .. })));
}

#[rstest]
fn rule_table_covers_each_layer_once() {
    for layer in Layer::ALL {
        assert_eq!(layer.rule().layer, layer);
    }
}

#[rstest]
#[case(Breach::Layer(Layer::Outbound), "inbound/http/mod.rs: inbound module must not depend on crate::outbound")]
#[case(Breach::Crate("reqwest"), "inbound/http/mod.rs: inbound module must not depend on external crate `reqwest`")]
fn violations_render_file_and_rule(#[case] breach: Breach, #[case] expected: &str) {
    let violation = Violation {
        file: PathBuf::from("inbound/http/mod.rs"),
        layer: Layer::Inbound,
        breach,
    };
    assert_eq!(violation.to_string(), expected);
}
