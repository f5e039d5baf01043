//! End-to-end reconciliation passes with a scripted process runner

use devscaffold_core::{
    ActionOutcome, ArtifactDescriptor, BundledReferences, Catalog, ComparisonStrategy,
    ExecutionMode, ManagerKind, PlanAction, Planner, ProjectDir, ReconcileEvent, ReconcileOptions,
    ReconcileReport, Reconciler, nightwatch_toolchain,
};
use devscaffold_fs::NormalizedPath;
use devscaffold_presets::{DdevProber, OutputStream};
use devscaffold_test_utils::{ScriptedRunner, TestProject};
use pretty_assertions::assert_eq;

const WEB_ENV: &str = "NIGHTWATCH_DRUPAL_URL=http://web";

const ALL_DEPS: [&str; 3] = [
    "@lullabot/nightwatch-drupal-commands",
    "nightwatch",
    "nightwatch-accessibility",
];

async fn reconcile(
    project: &TestProject,
    runner: &ScriptedRunner,
    mode: ExecutionMode,
    dry_run: bool,
) -> ReconcileReport {
    reconcile_as(project, runner, mode, dry_run, None).await
}

async fn reconcile_as(
    project: &TestProject,
    runner: &ScriptedRunner,
    mode: ExecutionMode,
    dry_run: bool,
    ddev_project: Option<&str>,
) -> ReconcileReport {
    let references = BundledReferences::new();
    let prober = DdevProber::new(
        NormalizedPath::new(project.root()),
        ddev_project.map(String::from),
    );
    Reconciler::new(ProjectDir::new(project.root()), &references, &prober, runner)
        .with_planner(Planner::default().with_mode(mode))
        .with_options(ReconcileOptions { dry_run })
        .reconcile(&mut |_| {})
        .await
        .unwrap()
}

fn kinds(report: &ReconcileReport) -> Vec<&'static str> {
    report.plan.iter().map(PlanAction::kind).collect()
}

#[tokio::test]
async fn fresh_project_is_scaffolded_and_dependencies_installed() {
    let project = TestProject::new();
    let runner = ScriptedRunner::node_toolchain(project.root());

    let report = reconcile(&project, &runner, ExecutionMode::Auto, false).await;

    assert_eq!(
        kinds(&report),
        vec![
            "install-file",
            "install-file",
            "install-file",
            "bootstrap-manifest",
            "run-manager-command",
        ]
    );
    assert!(report.is_success(), "{report:#?}");
    assert_eq!(report.manager, Some(ManagerKind::Yarn));

    let commands = runner.commands();
    assert_eq!(commands[0], "yarn set version berry");
    assert_eq!(commands[1], "yarn init -p");
    assert!(commands[2].starts_with("yarn add --dev @lullabot/nightwatch-drupal-commands@"));
    assert_eq!(commands.len(), 3);

    project.assert_file_exists("Taskfile.dev.yml");
    project.assert_file_exists("nightwatch.conf.js");
    project.assert_file_exists("test/nightwatch/example.nightwatch.js");
    project.assert_file_not_exists(".ddev/docker-compose.selenium.yaml");
    assert_eq!(project.manifest()["devDependencies"]["nightwatch"], "^1.0.0");
}

#[tokio::test]
async fn second_pass_is_a_no_op() {
    let project = TestProject::new();
    let runner = ScriptedRunner::node_toolchain(project.root());

    reconcile(&project, &runner, ExecutionMode::Auto, false).await;
    let second = reconcile(&project, &runner, ExecutionMode::Auto, false).await;

    assert!(second.plan.is_empty(), "{:#?}", second.plan);
    assert_eq!(runner.commands().len(), 3);
}

#[tokio::test]
async fn advisory_pass_queues_install_and_runs_nothing_for_it() {
    let project = TestProject::new().with_manifest(&["nightwatch"]).with_npm_lock();
    let runner = ScriptedRunner::node_toolchain(project.root());

    let report = reconcile(&project, &runner, ExecutionMode::Advisory, false).await;

    let last = report.plan.actions().last().unwrap();
    assert_eq!(last.kind(), "queue-user-command");
    assert_eq!(report.outcomes.last(), Some(&ActionOutcome::Displayed));
    assert!(runner.commands().is_empty());
    assert_eq!(
        report.plan.user_commands()[0].to_string(),
        "npm install --save-dev \
         @lullabot/nightwatch-drupal-commands@https://github.com/Lullabot/nightwatch-drupal-commands.git#main \
         nightwatch-accessibility"
    );
}

#[tokio::test]
async fn dry_run_changes_nothing() {
    let project = TestProject::new();
    let runner = ScriptedRunner::node_toolchain(project.root());

    let report = reconcile(&project, &runner, ExecutionMode::Auto, true).await;

    assert!(runner.commands().is_empty());
    project.assert_file_not_exists("Taskfile.dev.yml");
    project.assert_file_not_exists("package.json");
    assert_eq!(report.manager, Some(ManagerKind::Unmanaged));
    assert_eq!(
        report.outcomes[0],
        ActionOutcome::Skipped {
            reason: "dry run".into()
        }
    );
    assert_eq!(report.plan.actions().last().unwrap().kind(), "warn-missing-capability");
}

#[tokio::test]
async fn failed_install_is_reported_on_its_action_only() {
    let project = TestProject::new().with_manifest(&[]).with_yarn_lock();
    let runner = ScriptedRunner::new(project.root())
        .on("yarn add", 1)
        .printing(&[(OutputStream::Stderr, "network unreachable")]);

    let report = reconcile(&project, &runner, ExecutionMode::Auto, false).await;

    project.assert_file_exists("Taskfile.dev.yml");
    assert!(!report.is_success());
    assert!(report.errors.is_empty());
    let (action, outcome) = report.entries().last().unwrap();
    assert_eq!(action.kind(), "run-manager-command");
    assert!(matches!(outcome, ActionOutcome::Failed { exit_code: 1, .. }));
}

#[tokio::test]
async fn failed_bootstrap_skips_dependency_stages() {
    let project = TestProject::new();
    let runner = ScriptedRunner::new(project.root()).on("yarn init", 1);

    let report = reconcile(&project, &runner, ExecutionMode::Auto, false).await;

    assert_eq!(report.manager, None);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("package.json does not exist"));
    assert_eq!(report.outcomes[0], ActionOutcome::Applied);
    project.assert_file_exists("nightwatch.conf.js");
}

#[tokio::test]
async fn missing_yarn_binary_is_an_action_error() {
    let project = TestProject::new();
    let runner = ScriptedRunner::new(project.root()).without_program("yarn");

    let report = reconcile(&project, &runner, ExecutionMode::Auto, false).await;

    let bootstrap = report
        .entries()
        .find(|(action, _)| action.kind() == "bootstrap-manifest")
        .map(|(_, outcome)| outcome.clone())
        .unwrap();
    assert!(matches!(bootstrap, ActionOutcome::Error { .. }));
    assert!(!report.errors.is_empty());
}

#[tokio::test]
async fn ddev_pass_renames_manifest_and_follows_up_in_container() {
    let project = TestProject::new().with_ddev(&[WEB_ENV]);
    let runner = ScriptedRunner::node_toolchain(project.root());

    let report = reconcile_as(&project, &runner, ExecutionMode::Auto, false, Some("my-site")).await;

    assert!(report.is_success(), "{report:#?}");
    project.assert_file_exists(".ddev/docker-compose.selenium.yaml");
    assert_eq!(project.manifest()["name"], "my-site");
    assert_eq!(project.manifest()["packageManager"], "yarn@4.5.0");
    assert_eq!(runner.commands().last().unwrap(), "ddev exec yarn");
}

#[tokio::test]
async fn ddev_capability_gap_never_edits_config() {
    let project = TestProject::new()
        .with_ddev(&[])
        .with_manifest(&[
            "@lullabot/nightwatch-drupal-commands",
            "nightwatch",
            "nightwatch-accessibility",
        ])
        .with_yarn_lock();
    let before = project.read(".ddev/config.yaml");
    let runner = ScriptedRunner::node_toolchain(project.root());

    let report = reconcile(&project, &runner, ExecutionMode::Auto, false).await;

    assert!(kinds(&report).contains(&"warn-missing-capability"));
    project.assert_file_bytes(".ddev/config.yaml", &before);
    assert!(runner.commands().iter().all(|c| !c.starts_with("ddev")));
}

#[tokio::test]
async fn output_lines_reach_the_sink() {
    let project = TestProject::new().with_manifest(&[]).with_yarn_lock();
    let runner = ScriptedRunner::new(project.root())
        .on("yarn add", 0)
        .printing(&[
            (OutputStream::Stdout, "➤ YN0000: Done"),
            (OutputStream::Stderr, "warning"),
        ]);
    let references = BundledReferences::new();
    let prober = DdevProber::new(NormalizedPath::new(project.root()), None);

    let mut lines = Vec::new();
    let mut started = 0;
    Reconciler::new(ProjectDir::new(project.root()), &references, &prober, &runner)
        .with_planner(Planner::default().with_mode(ExecutionMode::Auto))
        .reconcile(&mut |event| match event {
            ReconcileEvent::Output(line) => lines.push(line.text),
            ReconcileEvent::Started(_) => started += 1,
            ReconcileEvent::Finished(..) => {}
        })
        .await
        .unwrap();

    assert_eq!(started, 4);
    assert_eq!(lines, vec!["➤ YN0000: Done", "warning"]);
}

#[tokio::test]
async fn unreadable_target_is_warned_and_pass_continues() {
    let project = TestProject::new().with_dir("nightwatch.conf.js");
    let runner = ScriptedRunner::node_toolchain(project.root());

    let report = reconcile(&project, &runner, ExecutionMode::Auto, false).await;

    assert_eq!(
        kinds(&report),
        vec![
            "install-file",
            "warn-drift",
            "install-file",
            "bootstrap-manifest",
            "run-manager-command",
        ]
    );
    let PlanAction::WarnDrift { target_path, reason, .. } = &report.plan.actions()[1] else {
        panic!("expected a drift warning, got {:#?}", report.plan);
    };
    assert_eq!(target_path.as_str(), "nightwatch.conf.js");
    assert!(reason.is_some());
    assert!(report.plan.has_drift());
    assert!(report.is_success(), "{report:#?}");
    project.assert_file_exists("Taskfile.dev.yml");
    project.assert_file_exists("test/nightwatch/example.nightwatch.js");
    assert!(project.path("nightwatch.conf.js").is_dir());
}

#[tokio::test]
async fn unreadable_target_does_not_abort_dry_run() {
    let project = TestProject::new()
        .with_dir("nightwatch.conf.js")
        .with_manifest(&ALL_DEPS)
        .with_yarn_lock();
    let runner = ScriptedRunner::node_toolchain(project.root());

    let report = reconcile(&project, &runner, ExecutionMode::Auto, true).await;

    assert_eq!(kinds(&report), vec!["install-file", "warn-drift", "install-file"]);
    assert_eq!(report.outcomes[1], ActionOutcome::Displayed);
    project.assert_file_not_exists("Taskfile.dev.yml");
}

#[tokio::test]
async fn seeding_creates_the_guard_directory() {
    let catalog = Catalog::new(vec![
        ArtifactDescriptor::new(
            "nightwatch-example",
            "example.nightwatch.js",
            "example.nightwatch.js",
            ComparisonStrategy::ExactContentHash,
        )
        .seed_once("test/nightwatch"),
    ])
    .unwrap();
    let project = TestProject::new().with_manifest(&ALL_DEPS).with_yarn_lock();
    let runner = ScriptedRunner::node_toolchain(project.root());
    let references = BundledReferences::new();
    let prober = DdevProber::new(NormalizedPath::new(project.root()), None);
    let reconciler = Reconciler::new(ProjectDir::new(project.root()), &references, &prober, &runner)
        .with_planner(Planner::new(catalog, nightwatch_toolchain()).with_mode(ExecutionMode::Auto));

    let first = reconciler.reconcile(&mut |_| {}).await.unwrap();
    assert_eq!(kinds(&first), vec!["install-file"]);
    assert!(first.is_success(), "{first:#?}");
    project.assert_file_exists("example.nightwatch.js");
    assert!(project.path("test/nightwatch").is_dir());

    std::fs::remove_file(project.path("example.nightwatch.js")).unwrap();
    let second = reconciler.reconcile(&mut |_| {}).await.unwrap();
    assert!(second.plan.is_empty(), "{:#?}", second.plan);
    project.assert_file_not_exists("example.nightwatch.js");
}
