//! Built-in session presets.

use std::path::PathBuf;

use crate::config::{
    FailurePolicy, ModelProfile, ParticipantConfig, SelectionConfig, SessionConfig,
    TerminationConfig,
};
use crate::roles::Role;

/// Shared scratch directory for the code-translation preset.
pub const DEFAULT_WORK_DIR: &str = "job_files";

const EXEC_TIMEOUT_SECS: u64 = 120;

const SEED: &str = "Let's design, implement and save a python program that converts .java \
Hibernate native codeblocks to JPA compatible. I aim for it to be challenging.";

/// The five-agent Hibernate-to-JPA translation session, working in
/// [`DEFAULT_WORK_DIR`].
pub fn code_translation_session() -> SessionConfig {
    code_translation_session_in(DEFAULT_WORK_DIR)
}

/// Same as [`code_translation_session`] with a caller-chosen working directory.
pub fn code_translation_session_in(work_dir: impl Into<PathBuf>) -> SessionConfig {
    let work_dir = work_dir.into();

    let runner = ParticipantConfig::new("Runner", Role::Runner)
        .with_description(
            "Runner: provide feedback on running the application. Work with the \
             Application Designer so the application meets expectations.",
        )
        .with_execution(&work_dir, EXEC_TIMEOUT_SECS)
        .with_window(1)
        .with_human_confirmation();

    let tester = ParticipantConfig::new("Application_Tester", Role::Tester)
        .with_description(
            "Application Tester: test the application and give feedback on its mechanics \
             and user experience. Report bugs and glitches, and work with the Programmer \
             on any adjustments.",
        )
        .with_execution(&work_dir, EXEC_TIMEOUT_SECS)
        .with_window(3)
        .with_human_confirmation();

    let designer = ParticipantConfig::new("Application_Designer", Role::Designer).with_description(
        "Application Designer: write and save a python program that recursively searches \
         .java files for session.createCriteria() calls, copies each code block up to the \
         session.list() call, asks the gpt-4 REST API to convert the Hibernate native block \
         to JPA and saves the converted block. Document the design in 'app_design.txt' and \
         align it with the Runner's feedback.",
    );

    let programmer = ParticipantConfig::new("Programmer", Role::Programmer).with_description(
        "Programmer: code the application and save it in the working directory. Hand code \
         to the Code Executor for running and consult the Application Tester for feedback.",
    );

    let executor = ParticipantConfig::new("Code_Executor", Role::Executor)
        .with_description(
            "Code Executor: run the Programmer's code in the working directory, report \
             outcomes and issues, and recommend improvements to the Programmer.",
        )
        .with_execution(&work_dir, EXEC_TIMEOUT_SECS)
        .with_window(3);

    SessionConfig {
        round_ceiling: 150,
        seed_message: SEED.to_string(),
        seed_author: "Runner".to_string(),
        production_timeout_secs: 1200,
        wall_clock_limit_secs: None,
        selection: SelectionConfig::Mention,
        termination: TerminationConfig::default(),
        failure: FailurePolicy::default(),
        model: Some(ModelProfile {
            models: ["gpt-4-0613", "gpt-4-32k", "gpt-4", "gpt-4-0314"]
                .into_iter()
                .map(String::from)
                .collect(),
            seed: Some(42),
            temperature: 0.0,
            request_timeout_secs: 1200,
        }),
        participants: vec![runner, tester, designer, programmer, executor],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_is_valid() {
        let cfg = code_translation_session();
        cfg.validate().unwrap();
        assert_eq!(cfg.round_ceiling, 150);
        assert_eq!(cfg.seed_author, "Runner");
        assert!(cfg.seed_message.contains("Hibernate"));
    }

    #[test]
    fn test_preset_roster_shape() {
        let cfg = code_translation_session_in("/tmp/work");
        let names: Vec<_> = cfg.participants.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Runner",
                "Application_Tester",
                "Application_Designer",
                "Programmer",
                "Code_Executor"
            ]
        );

        let runner = cfg.participant("Runner").unwrap();
        assert!(runner.human_confirmation && runner.execution_enabled);
        assert_eq!(runner.message_window, Some(1));

        let executor = cfg.participant("Code_Executor").unwrap();
        assert!(!executor.human_confirmation);
        assert_eq!(executor.message_window, Some(3));
        assert_eq!(executor.timeout_secs, 120);
        assert_eq!(executor.working_directory, Some(PathBuf::from("/tmp/work")));

        let programmer = cfg.participant("Programmer").unwrap();
        assert!(!programmer.execution_enabled);
    }

    #[test]
    fn test_preset_model_profile() {
        let model = code_translation_session().model.unwrap();
        assert_eq!(model.seed, Some(42));
        assert_eq!(model.temperature, 0.0);
        assert_eq!(model.request_timeout_secs, 1200);
        assert_eq!(model.models.len(), 4);
    }

    #[test]
    fn test_preset_roundtrips_through_toml() {
        let cfg = code_translation_session();
        let raw = cfg.to_toml_string().unwrap();
        let back = SessionConfig::from_toml_str(&raw).unwrap();
        assert_eq!(back, cfg);
    }
}
