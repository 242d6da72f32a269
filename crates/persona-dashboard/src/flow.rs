use persona_common::types::JobId;

use crate::presenter::Artifact;

/// Where the current submission stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Idle,
    Validating,
    Uploading {
        percent: u8,
    },
    Processing {
        job_id: JobId,
        processed: u64,
        total: u64,
    },
    Succeeded(Artifact),
    Failed(String),
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// True while a submission is in flight and the submit action is unavailable.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Validating | Self::Uploading { .. } | Self::Processing { .. }
        )
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Succeeded(artifact) => Some(artifact),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Uploading { .. } => "uploading",
            Self::Processing { .. } => "processing",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use persona_common::types::JobId;

    use super::FlowState;
    use crate::presenter::ResultPresenter;

    #[test]
    fn only_finished_states_are_terminal() {
        let processing = FlowState::Processing {
            job_id: JobId::new("job-1"),
            processed: 0,
            total: 3,
        };
        assert!(processing.is_busy());
        assert!(!processing.is_terminal());
        assert!(!FlowState::Idle.is_busy());

        let succeeded = FlowState::Succeeded(ResultPresenter::default().present(Bytes::new()));
        assert!(succeeded.is_terminal());
        assert!(succeeded.artifact().is_some());
        assert!(FlowState::Failed("Error occurred".to_string()).is_terminal());
    }
}
