//! Immutable description of the invoice workflow: stages and transitions.
//!
//! Built and checked once at startup, then shared read-only by every run.
//! The only branch is the routing decision after language detection; it is
//! a closed enum consumed by a `match`, not a string-keyed table.

use serde::Serialize;

use super::PipelineError;

/// States a run moves through. Entering a stage runs that stage's work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loaded,
    Extracted,
    LanguageChecked,
    Translated,
    Validated,
    Summarized,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Extracted => "extracted",
            Self::LanguageChecked => "language_checked",
            Self::Translated => "translated",
            Self::Validated => "validated",
            Self::Summarized => "summarized",
            Self::Done => "done",
        }
    }
}

/// Outcome of the single conditional branch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingDecision {
    Translate,
    SkipTranslation,
}

impl RoutingDecision {
    pub fn from_needs_translation(needs_translation: bool) -> Self {
        if needs_translation {
            Self::Translate
        } else {
            Self::SkipTranslation
        }
    }
}

/// Outgoing edge of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(Stage),
    Route { translate: Stage, skip: Stage },
    Terminal,
}

#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    name: String,
    entry: Stage,
    transitions: Vec<(Stage, Transition)>,
}

impl WorkflowDefinition {
    /// The invoice processing workflow.
    pub fn invoice() -> Result<Self, PipelineError> {
        WorkflowBuilder::new("invoice_processing")
            .entry(Stage::Loaded)
            .next(Stage::Loaded, Stage::Extracted)
            .next(Stage::Extracted, Stage::LanguageChecked)
            .route(Stage::LanguageChecked, Stage::Translated, Stage::Validated)
            .next(Stage::Translated, Stage::Validated)
            .next(Stage::Validated, Stage::Summarized)
            .next(Stage::Summarized, Stage::Done)
            .terminal(Stage::Done)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> Stage {
        self.entry
    }

    pub fn transition(&self, from: Stage) -> Option<Transition> {
        self.transitions
            .iter()
            .find(|(stage, _)| *stage == from)
            .map(|(_, transition)| *transition)
    }

    /// Upper bound on stages a single run may enter.
    pub fn max_steps(&self) -> usize {
        self.transitions.len() + 1
    }

    /// Stage that follows `from`, or `None` once a terminal stage is reached.
    ///
    /// `route` is required only when `from` is the branch point.
    pub fn next_stage(
        &self,
        from: Stage,
        route: Option<RoutingDecision>,
    ) -> Result<Option<Stage>, PipelineError> {
        let transition = self.transition(from).ok_or_else(|| {
            PipelineError::Workflow(format!("no transition declared for stage {}", from.as_str()))
        })?;

        match transition {
            Transition::Next(to) => Ok(Some(to)),
            Transition::Terminal => Ok(None),
            Transition::Route { translate, skip } => match route {
                Some(RoutingDecision::Translate) => Ok(Some(translate)),
                Some(RoutingDecision::SkipTranslation) => Ok(Some(skip)),
                None => Err(PipelineError::Workflow(format!(
                    "stage {} requires a routing decision",
                    from.as_str()
                ))),
            },
        }
    }

    /// Every stage a run enters for a given routing decision, entry first.
    pub fn path(&self, route: RoutingDecision) -> Result<Vec<Stage>, PipelineError> {
        let mut stage = self.entry;
        let mut path = vec![stage];
        while let Some(next) = self.next_stage(stage, Some(route))? {
            if path.len() >= self.max_steps() {
                return Err(PipelineError::Workflow(format!(
                    "workflow {} does not terminate",
                    self.name
                )));
            }
            path.push(next);
            stage = next;
        }
        Ok(path)
    }
}

/// Incremental construction of a [`WorkflowDefinition`].
pub struct WorkflowBuilder {
    name: String,
    entry: Option<Stage>,
    transitions: Vec<(Stage, Transition)>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry: None,
            transitions: Vec::new(),
        }
    }

    pub fn entry(mut self, stage: Stage) -> Self {
        self.entry = Some(stage);
        self
    }

    pub fn next(mut self, from: Stage, to: Stage) -> Self {
        self.transitions.push((from, Transition::Next(to)));
        self
    }

    pub fn route(mut self, from: Stage, translate: Stage, skip: Stage) -> Self {
        self.transitions
            .push((from, Transition::Route { translate, skip }));
        self
    }

    pub fn terminal(mut self, stage: Stage) -> Self {
        self.transitions.push((stage, Transition::Terminal));
        self
    }

    /// Check the table and freeze it.
    ///
    /// Rejects a missing entry, duplicate outgoing edges, edges into stages
    /// with no transition of their own, and paths that never terminate.
    pub fn build(self) -> Result<WorkflowDefinition, PipelineError> {
        let entry = self
            .entry
            .ok_or_else(|| PipelineError::Workflow(format!("workflow {} has no entry stage", self.name)))?;

        for (i, (from, _)) in self.transitions.iter().enumerate() {
            if self.transitions[..i].iter().any(|(seen, _)| seen == from) {
                return Err(PipelineError::Workflow(format!(
                    "stage {} has more than one outgoing transition",
                    from.as_str()
                )));
            }
        }

        let declared = |stage: Stage| self.transitions.iter().any(|(from, _)| *from == stage);
        for (from, transition) in &self.transitions {
            let targets = match transition {
                Transition::Next(to) => vec![*to],
                Transition::Route { translate, skip } => vec![*translate, *skip],
                Transition::Terminal => Vec::new(),
            };
            if let Some(missing) = targets.iter().find(|to| !declared(**to)) {
                return Err(PipelineError::Workflow(format!(
                    "stage {} leads to {} which has no transition",
                    from.as_str(),
                    missing.as_str()
                )));
            }
        }

        let definition = WorkflowDefinition {
            name: self.name,
            entry,
            transitions: self.transitions,
        };
        definition.path(RoutingDecision::Translate)?;
        definition.path(RoutingDecision::SkipTranslation)?;

        tracing::debug!(
            workflow = %definition.name,
            stages = definition.transitions.len(),
            "Workflow definition built"
        );
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_workflow_without_translation() {
        let workflow = WorkflowDefinition::invoice().unwrap();
        assert_eq!(
            workflow.path(RoutingDecision::SkipTranslation).unwrap(),
            vec![
                Stage::Loaded,
                Stage::Extracted,
                Stage::LanguageChecked,
                Stage::Validated,
                Stage::Summarized,
                Stage::Done,
            ]
        );
    }

    #[test]
    fn invoice_workflow_with_translation() {
        let workflow = WorkflowDefinition::invoice().unwrap();
        assert_eq!(
            workflow.path(RoutingDecision::Translate).unwrap(),
            vec![
                Stage::Loaded,
                Stage::Extracted,
                Stage::LanguageChecked,
                Stage::Translated,
                Stage::Validated,
                Stage::Summarized,
                Stage::Done,
            ]
        );
    }

    #[test]
    fn branch_point_requires_routing_decision() {
        let workflow = WorkflowDefinition::invoice().unwrap();
        let err = workflow.next_stage(Stage::LanguageChecked, None).unwrap_err();
        assert!(matches!(err, PipelineError::Workflow(_)));
    }

    #[test]
    fn linear_stages_ignore_routing_decision() {
        let workflow = WorkflowDefinition::invoice().unwrap();
        assert_eq!(
            workflow.next_stage(Stage::Extracted, None).unwrap(),
            Some(Stage::LanguageChecked)
        );
        assert_eq!(workflow.next_stage(Stage::Done, None).unwrap(), None);
    }

    #[test]
    fn missing_entry_is_rejected() {
        let err = WorkflowBuilder::new("broken")
            .terminal(Stage::Done)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no entry stage"));
    }

    #[test]
    fn dangling_target_is_rejected() {
        let err = WorkflowBuilder::new("broken")
            .entry(Stage::Loaded)
            .next(Stage::Loaded, Stage::Extracted)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("has no transition"));
    }

    #[test]
    fn duplicate_transition_is_rejected() {
        let err = WorkflowBuilder::new("broken")
            .entry(Stage::Loaded)
            .next(Stage::Loaded, Stage::Done)
            .next(Stage::Loaded, Stage::Done)
            .terminal(Stage::Done)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn cycle_is_rejected() {
        let err = WorkflowBuilder::new("loop")
            .entry(Stage::Loaded)
            .next(Stage::Loaded, Stage::Extracted)
            .next(Stage::Extracted, Stage::Loaded)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("does not terminate"));
    }

    #[test]
    fn routing_decision_follows_flag() {
        assert_eq!(
            RoutingDecision::from_needs_translation(true),
            RoutingDecision::Translate
        );
        assert_eq!(
            RoutingDecision::from_needs_translation(false),
            RoutingDecision::SkipTranslation
        );
    }
}
