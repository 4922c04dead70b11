//! Multi-stage sync pipeline report.

use serde::{Deserialize, Serialize};

use super::model::SyncResult;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Tokens,
    Themes,
    Components,
    Layouts,
    Content,
}

impl StageName {
    pub const ALL: [StageName; 5] = [
        StageName::Tokens,
        StageName::Themes,
        StageName::Components,
        StageName::Layouts,
        StageName::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::Themes => "themes",
            Self::Components => "components",
            Self::Layouts => "layouts",
            Self::Content => "content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub name: StageName,
    pub status: StageStatus,
    /// 0 to 100.
    pub progress: u8,
    pub errors: Vec<String>,
}

impl PipelineStage {
    fn pending(name: StageName) -> Self {
        Self {
            name,
            status: StageStatus::Pending,
            progress: 0,
            errors: Vec::new(),
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = StageStatus::Running;
        self.progress = 0;
    }

    pub(crate) fn complete(&mut self) {
        self.status = StageStatus::Completed;
        self.progress = 100;
    }

    pub(crate) fn fail(&mut self, errors: Vec<String>) {
        self.status = StageStatus::Failed;
        self.errors = errors;
    }
}

/// Stage states after a pipeline run, plus the stage 1 sync result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub source: String,
    pub stages: Vec<PipelineStage>,
    pub sync: Option<SyncResult>,
}

impl PipelineReport {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            stages: StageName::ALL.into_iter().map(PipelineStage::pending).collect(),
            sync: None,
        }
    }

    pub fn stage(&self, name: StageName) -> &PipelineStage {
        &self.stages[name as usize]
    }

    pub(crate) fn stage_mut(&mut self, name: StageName) -> &mut PipelineStage {
        &mut self.stages[name as usize]
    }

    pub fn succeeded(&self) -> bool {
        self.stages.iter().all(|s| s.status == StageStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_all_pending() {
        let report = PipelineReport::new("a");
        let names: Vec<&str> = report.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["tokens", "themes", "components", "layouts", "content"]);
        assert!(report.stages.iter().all(|s| s.status == StageStatus::Pending));
        assert_eq!(report.stage(StageName::Layouts).name, StageName::Layouts);
        assert!(!report.succeeded());
    }
}
