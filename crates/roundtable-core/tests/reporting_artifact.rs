//! Transcript artifacts written from a real session.

use std::sync::Arc;

use roundtable_core::{
    read_transcript_artifact, write_transcript_json, write_transcript_md, Orchestrator,
    OrchestratorSettings, Participant, ParticipantConfig, Role, RoundRobin, RoundtableError,
    ScriptStep, ScriptedParticipant, SessionStatus, TranscriptArtifact,
};

async fn finished_session() -> roundtable_core::SessionOutcome {
    let roster: Vec<Arc<dyn Participant>> = vec![
        Arc::new(ScriptedParticipant::new(
            ParticipantConfig::new("Designer", Role::Designer),
            vec![ScriptStep::Say("Design saved to app_design.txt".into())],
        )),
        Arc::new(ScriptedParticipant::new(
            ParticipantConfig::new("Programmer", Role::Programmer),
            vec![ScriptStep::Say("Implemented. TERMINATE".into())],
        )),
    ];
    let mut orch = Orchestrator::new(OrchestratorSettings::default(), roster, Box::new(RoundRobin))
        .unwrap();
    orch.start("start", "Designer").await.unwrap()
}

#[tokio::test]
async fn json_artifact_roundtrips_with_verified_digest() {
    let tmp = tempfile::tempdir().unwrap();
    let outcome = finished_session().await;
    let artifact = TranscriptArtifact::from_outcome(&outcome).unwrap();

    let path = tmp.path().join("transcript.json");
    write_transcript_json(&path, &artifact).unwrap();
    let loaded = read_transcript_artifact(&path).unwrap();

    assert_eq!(loaded, artifact);
    assert_eq!(loaded.digest, outcome.transcript.digest().unwrap());
    assert_eq!(
        loaded.status,
        SessionStatus::Terminated {
            by: "Programmer".into()
        }
    );
    assert_eq!(loaded.messages.len(), 3);
}

#[tokio::test]
async fn edited_artifact_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let artifact = TranscriptArtifact::from_outcome(&finished_session().await).unwrap();
    let path = tmp.path().join("transcript.json");
    write_transcript_json(&path, &artifact).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, raw.replace("app_design.txt", "design.md")).unwrap();

    let err = read_transcript_artifact(&path).unwrap_err();
    assert!(matches!(err, RoundtableError::DigestMismatch { .. }));
}

#[tokio::test]
async fn markdown_artifact_is_written() {
    let tmp = tempfile::tempdir().unwrap();
    let artifact = TranscriptArtifact::from_outcome(&finished_session().await).unwrap();
    let path = tmp.path().join("transcript.md");
    write_transcript_md(&path, &artifact).unwrap();

    let md = std::fs::read_to_string(&path).unwrap();
    assert!(md.contains("terminated by Programmer"));
    assert!(md.contains("## 2. Programmer"));
    assert!(md.contains("Implemented. TERMINATE"));
}
