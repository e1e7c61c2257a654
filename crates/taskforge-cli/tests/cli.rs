use assert_cmd::Command;
use predicates::prelude::*;
use taskforge_testing::TestWorld;

#[test]
fn test_init_creates_workspace() {
    let world = TestWorld::new();
    let result = world.run(&["init"]).unwrap();
    assert!(result.success(), "stderr: {}", result.stderr());
    assert!(result.stdout().contains("Initialized taskforge workspace"));
    assert!(world.assert_database_exists());
    assert!(world.assert_config_exists());

    // Re-running init is harmless.
    let again = world.run(&["init"]).unwrap();
    assert!(again.success());
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("taskforge").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_tasks_list_empty() {
    let world = TestWorld::new();
    world.run(&["init"]).unwrap();
    let result = world.run(&["tasks", "list"]).unwrap();
    assert!(result.success());
    assert!(result.stdout().contains("No tasks found"));
}

#[test]
fn test_tasks_list_rejects_bad_status() {
    let world = TestWorld::new();
    world.run(&["init"]).unwrap();
    let result = world.run(&["tasks", "list", "--status", "bogus"]).unwrap();
    assert!(!result.success());
    assert!(result.stderr().contains("Unknown status"));
}

#[test]
fn test_events_stats_and_purge() {
    let world = TestWorld::new();
    world.run(&["init"]).unwrap();

    let stats = world.run(&["events", "stats"]).unwrap();
    assert!(stats.success());
    assert!(stats.stdout().contains("Event queue:"));

    let purge = world.run(&["events", "purge", "--hours", "0"]).unwrap();
    assert!(purge.success());
    assert!(purge.stdout().contains("Purged"));
}
