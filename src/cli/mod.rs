pub mod orchestration;

pub use orchestration::{
    run_setenv_workflow, run_transition_workflow, run_version_workflow, SetenvWorkflowArgs,
    SetenvWorkflowResult, TransitionWorkflowResult, VersionWorkflowArgs, VersionWorkflowResult,
};
