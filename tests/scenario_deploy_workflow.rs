//! End-to-end runs of the gated deployment flow against an in-process server.

mod common;

use httpmock::prelude::*;
use serde_json::json;

use common::{
    feature_list, project_list, settings_for, vcs_root_list, InstantClock, VCS_ROOT_ID,
    VCS_ROOT_NAME,
};
use teamcity_settings_sync::config::Config;
use teamcity_settings_sync::deployment::{
    Deployer, FatalStage, Outcome, PollState, SettingsOutcome, VcsRootOutcome,
};
use teamcity_settings_sync::teamcity_client::TeamCityClient;
use teamcity_settings_sync::DeployError;

fn deployer(server: &MockServer, config: Config) -> Deployer {
    let settings = settings_for(server, config);
    let client = TeamCityClient::new(&settings).unwrap();
    Deployer::with_parts(client, settings, Box::new(InstantClock::new()))
}

fn short_poll() -> Config {
    Config {
        poll_timeout_secs: 30,
        poll_interval_secs: 10,
        ..Config::default()
    }
}

#[tokio::test]
async fn unreachable_server_aborts_before_reconciliation() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/server");
            then.status(500).body("Internal error");
        })
        .await;
    let vcs_roots = server
        .mock_async(|when, then| {
            when.path_contains("/app/rest/vcs-roots");
            then.status(200).json_body(vcs_root_list(&[]));
        })
        .await;
    let features = server
        .mock_async(|when, then| {
            when.path_contains("projectFeatures");
            then.status(200);
        })
        .await;

    let report = deployer(&server, short_poll()).run().await;

    let fatal = report.fatal.as_ref().expect("fatal");
    assert_eq!(fatal.stage, FatalStage::Connectivity);
    assert_eq!(fatal.error.status(), Some(500));
    assert_eq!(report.outcome(), Outcome::Failure);
    assert_ne!(report.exit_code(), 0);
    assert!(report.vcs_root.is_none());
    vcs_roots.assert_hits_async(0).await;
    features.assert_hits_async(0).await;
}

#[tokio::test]
async fn fresh_server_is_configured_and_converges() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/server");
            then.status(200)
                .json_body(json!({"version": "2024.07 (build 160000)", "buildNumber": "160000"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects");
            then.status(200).json_body(project_list(&[
                ("_Root", "<Root project>"),
                ("TestBusinessProject", "Test Business Project"),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/vcs-roots");
            then.status(200).json_body(vcs_root_list(&[]));
        })
        .await;
    let create_root = server
        .mock_async(|when, then| {
            when.method(POST).path("/app/rest/vcs-roots");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects/id:_Root/projectFeatures");
            then.status(200).json_body(json!({"projectFeature": []}));
        })
        .await;
    let create_feature = server
        .mock_async(|when, then| {
            when.method(POST).path("/app/rest/projects/id:_Root/projectFeatures");
            then.status(200)
                .json_body(json!({"id": "PROJECT_EXT_3", "type": "versionedSettings"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/app/rest/projects/id:_Root/versionedSettings/commitCurrentSettings");
            then.status(200);
        })
        .await;

    let report = deployer(&server, short_poll()).run().await;

    assert!(report.fatal.is_none());
    assert_eq!(
        report.server.as_ref().and_then(|s| s.version.as_deref()),
        Some("2024.07 (build 160000)")
    );
    assert_eq!(
        report.server.as_ref().and_then(|s| s.build_number.as_deref()),
        Some("160000")
    );
    assert_eq!(
        report.vcs_root,
        Some(VcsRootOutcome::Created {
            id: VCS_ROOT_ID.to_string()
        })
    );
    assert!(matches!(
        report.versioned_settings,
        Some(Ok(SettingsOutcome::Created { .. }))
    ));
    let convergence = report.convergence.as_ref().unwrap();
    assert_eq!(convergence.state, PollState::Converged);
    assert_eq!(convergence.polls, 1);
    assert!(report.validation.as_ref().unwrap().passed());
    assert_eq!(report.outcome(), Outcome::Success);
    assert_eq!(report.exit_code(), 0);
    create_root.assert_hits_async(1).await;
    create_feature.assert_hits_async(1).await;
}

#[tokio::test]
async fn timeout_after_reconciliation_is_partial() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/server");
            then.status(200).json_body(json!({"version": "2024.07"}));
        })
        .await;
    let projects = server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects");
            then.status(200).json_body(project_list(&[("_Root", "<Root project>")]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/vcs-roots");
            then.status(200)
                .json_body(vcs_root_list(&[(VCS_ROOT_ID, VCS_ROOT_NAME)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects/id:_Root/projectFeatures");
            then.status(200).json_body(feature_list(VCS_ROOT_ID));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/versionedSettings/");
            then.status(404);
        })
        .await;

    let report = deployer(&server, short_poll()).run().await;

    assert!(report.fatal.is_none());
    assert!(!report.trigger.as_ref().unwrap().succeeded());
    let convergence = report.convergence.as_ref().unwrap();
    assert_eq!(convergence.state, PollState::TimedOut);
    assert_eq!(convergence.polls, 3);
    assert!(report.validation.is_none());
    assert_eq!(report.outcome(), Outcome::Partial);
    assert_eq!(report.exit_code(), 2);
    // One listing before reconciliation plus three polls.
    projects.assert_hits_async(4).await;
}

#[tokio::test]
async fn rejected_settings_feature_still_triggers_and_polls() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/server");
            then.status(200).json_body(json!({"version": "2024.07"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects");
            then.status(200).json_body(project_list(&[
                ("_Root", "<Root project>"),
                ("TestBusinessProject", "Test Business Project"),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/vcs-roots");
            then.status(200)
                .json_body(vcs_root_list(&[(VCS_ROOT_ID, VCS_ROOT_NAME)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects/id:_Root/projectFeatures");
            then.status(200).json_body(json!({"projectFeature": []}));
        })
        .await;
    let create_feature = server
        .mock_async(|when, then| {
            when.method(POST).path("/app/rest/projects/id:_Root/projectFeatures");
            then.status(403).body("Access denied");
        })
        .await;
    let commit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/app/rest/projects/id:_Root/versionedSettings/commitCurrentSettings");
            then.status(200);
        })
        .await;

    let report = deployer(&server, short_poll()).run().await;

    assert!(report.fatal.is_none());
    assert!(matches!(
        report.versioned_settings,
        Some(Err(DeployError::Api { status: 403, .. }))
    ));
    assert!(report.trigger.as_ref().unwrap().succeeded());
    let convergence = report.convergence.as_ref().unwrap();
    assert_eq!(convergence.state, PollState::Converged);
    assert!(report.validation.as_ref().unwrap().passed());
    assert_eq!(report.outcome(), Outcome::Partial);
    assert_eq!(report.exit_code(), 2);
    create_feature.assert_hits_async(1).await;
    commit.assert_hits_async(1).await;
}

#[tokio::test]
async fn vcs_root_creation_failure_is_fatal() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/server");
            then.status(200).json_body(json!({}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects");
            then.status(200).json_body(project_list(&[]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/vcs-roots");
            then.status(200).json_body(vcs_root_list(&[]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/app/rest/vcs-roots");
            then.status(403).body("Not enough permissions");
        })
        .await;
    let features = server
        .mock_async(|when, then| {
            when.path_contains("projectFeatures");
            then.status(200);
        })
        .await;

    let report = deployer(&server, short_poll()).run().await;

    let fatal = report.fatal.as_ref().expect("fatal");
    assert_eq!(fatal.stage, FatalStage::VcsRoot);
    assert!(fatal.error.to_string().contains("Not enough permissions"));
    assert_eq!(report.exit_code(), 1);
    features.assert_hits_async(0).await;
}

#[tokio::test]
async fn repoint_flag_rewrites_divergent_feature() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/server");
            then.status(200).json_body(json!({"version": "2024.07"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects");
            then.status(200).json_body(project_list(&[
                ("TestBusinessProject", "Test Business Project"),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/vcs-roots");
            then.status(200)
                .json_body(vcs_root_list(&[(VCS_ROOT_ID, VCS_ROOT_NAME)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/app/rest/projects/id:_Root/projectFeatures");
            then.status(200).json_body(feature_list("Legacy_Repo"));
        })
        .await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/app/rest/projects/id:_Root/projectFeatures/id:PROJECT_EXT_2");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/versionedSettings/");
            then.status(200);
        })
        .await;

    let config = Config {
        repoint_existing: true,
        ..short_poll()
    };
    let report = deployer(&server, config).run().await;

    assert!(matches!(
        report.versioned_settings,
        Some(Ok(SettingsOutcome::Repointed { ref previous_root_id, .. }))
            if previous_root_id.as_deref() == Some("Legacy_Repo")
    ));
    assert_eq!(report.outcome(), Outcome::Success);
    put.assert_hits_async(1).await;
}
