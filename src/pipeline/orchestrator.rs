//! Invoice processing orchestrator.
//!
//! Single entry point that drives one document through the shared workflow:
//! extract → detect language → (translate | pass through) → validate → summarize.
//!
//! Skill failures never abort a run. They are written into the run state as
//! failure markers and later stages consume them. Only invalid input and
//! internal faults (broken workflow table, double writes) are returned as
//! errors.

use std::sync::Arc;
use std::time::Instant;

use super::credential::Credential;
use super::language_detect::{detect_language, CANONICAL_LANGUAGE};
use super::reference_store::ReferenceStore;
use super::skills::SkillFactory;
use super::state::{ExtractionResult, RunState, SummaryOutcome, TranslationOutcome};
use super::validation::validate_invoice;
use super::workflow::{RoutingDecision, Stage, Transition, WorkflowDefinition};
use super::PipelineError;

/// Runs invoices through a shared, immutable workflow.
///
/// Holds no per-run state: one instance serves every request, each run owns
/// its own `RunState`.
pub struct InvoiceOrchestrator {
    workflow: Arc<WorkflowDefinition>,
    reference_store: Arc<ReferenceStore>,
    skills: Arc<dyn SkillFactory>,
    target_language: String,
}

impl InvoiceOrchestrator {
    pub fn new(
        workflow: Arc<WorkflowDefinition>,
        reference_store: Arc<ReferenceStore>,
        skills: Arc<dyn SkillFactory>,
    ) -> Self {
        Self {
            workflow,
            reference_store,
            skills,
            target_language: CANONICAL_LANGUAGE.to_string(),
        }
    }

    /// Language the translation branch translates into.
    pub fn with_target_language(mut self, target_language: &str) -> Self {
        self.target_language = target_language.to_string();
        self
    }

    pub fn reference_store(&self) -> &ReferenceStore {
        &self.reference_store
    }

    pub fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    /// Process one document end to end.
    ///
    /// Blocks on skill calls; callers on an async runtime should use a
    /// blocking task.
    pub fn run(&self, document_text: String, credential: Credential) -> Result<RunState, PipelineError> {
        if document_text.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "No 'invoice_content' provided in the request body.".into(),
            ));
        }
        if credential.is_blank() {
            return Err(PipelineError::InvalidInput(
                "No 'credential' provided in the request body.".into(),
            ));
        }

        let mut state = RunState::new(document_text, credential);
        let _span = tracing::info_span!(
            "invoice_run",
            run_id = %state.run_id(),
            workflow = self.workflow.name()
        )
        .entered();
        let started = Instant::now();

        tracing::info!(
            text_len = state.document_text().len(),
            "Invoice run started"
        );

        let mut stage = self.workflow.entry();
        loop {
            if state.trail().len() >= self.workflow.max_steps() {
                return Err(PipelineError::Workflow(format!(
                    "step limit of {} reached",
                    self.workflow.max_steps()
                )));
            }

            state.enter(stage);
            tracing::debug!(stage = stage.as_str(), "Entering stage");
            self.execute_stage(stage, &mut state)?;

            let route = match self.workflow.transition(stage) {
                Some(Transition::Route { .. }) => Some(self.route(&mut state)?),
                _ => None,
            };

            match self.workflow.next_stage(stage, route)? {
                Some(next) => stage = next,
                None => break,
            }
        }

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            stages = state.trail().len(),
            validation_passed = state.validation_outcome().is_some_and(|v| v.is_success()),
            "Invoice run complete"
        );

        Ok(state)
    }

    fn execute_stage(&self, stage: Stage, state: &mut RunState) -> Result<(), PipelineError> {
        match stage {
            Stage::Loaded => Ok(()),
            Stage::Extracted => {
                let extracted = self.extract(state);
                state.set_extracted(extracted)
            }
            Stage::LanguageChecked => {
                let detection = detect_language(state.document_text());
                tracing::info!(
                    language = %detection.language,
                    needs_translation = detection.needs_translation,
                    "Language detected"
                );
                state.set_language(detection)
            }
            Stage::Translated => {
                let translation = self.translate(state);
                state.set_translation(translation)
            }
            Stage::Validated => {
                let extracted = state
                    .extracted()
                    .ok_or(PipelineError::FieldUnset("extracted"))?;
                let outcome = validate_invoice(extracted, &self.reference_store);
                state.set_validation(outcome)
            }
            Stage::Summarized => {
                let context = state.summarization_context()?;
                let summary = self.summarize(state.credential(), &context);
                state.set_summary(summary)
            }
            Stage::Done => match state.unset_fields().first() {
                Some(&field) => Err(PipelineError::FieldUnset(field)),
                None => Ok(()),
            },
        }
    }

    /// Evaluate the routing decision once. Skipping translation writes the
    /// original text through unchanged.
    fn route(&self, state: &mut RunState) -> Result<RoutingDecision, PipelineError> {
        let decision = RoutingDecision::from_needs_translation(state.needs_translation());
        tracing::debug!(?decision, "Routing decision");

        if decision == RoutingDecision::SkipTranslation {
            let original = state.document_text().to_string();
            state.set_translation(TranslationOutcome::PassThrough(original))?;
        }
        Ok(decision)
    }

    fn extract(&self, state: &RunState) -> ExtractionResult {
        let result = self
            .skills
            .extractor(state.credential())
            .and_then(|extractor| extractor.extract(state.document_text()));

        match result {
            Ok(record) => {
                tracing::info!(
                    invoice_number = %record.invoice_number,
                    line_items = record.line_items.len(),
                    "Invoice data extracted"
                );
                ExtractionResult::Structured(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Extraction failed");
                ExtractionResult::Failed(e.to_string())
            }
        }
    }

    fn translate(&self, state: &RunState) -> TranslationOutcome {
        let result = self
            .skills
            .translator(state.credential(), &self.target_language)
            .and_then(|translator| translator.translate(state.document_text()));

        match result {
            Ok(text) => TranslationOutcome::Translated(text),
            Err(e) => {
                tracing::warn!(error = %e, target = %self.target_language, "Translation failed");
                TranslationOutcome::Failed(e.to_string())
            }
        }
    }

    fn summarize(&self, credential: &Credential, context: &str) -> SummaryOutcome {
        let result = self
            .skills
            .summarizer(credential)
            .and_then(|summarizer| summarizer.summarize(context));

        match result {
            Ok(summary) => SummaryOutcome::Completed(summary),
            Err(e) => {
                tracing::warn!(error = %e, "Summarization failed");
                SummaryOutcome::Failed(e.to_string())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{invoice, ScriptedSkills};
    use super::*;
    use crate::pipeline::state::NO_EXTRACTED_DATA;
    use crate::pipeline::validation::ValidationStatus;

    const ENGLISH_INVOICE: &str = "Invoice #INV-2024-001\nDate: 2024-05-29\nTOTAL: $250.00 USD";
    const GERMAN_INVOICE: &str =
        "Rechnung Nr. RECH-2024-03-20\nDatum: 20.03.2024\nBeratung 2 x 250,00 €\nBetrag: 500,00 €";

    fn orchestrator(skills: ScriptedSkills) -> InvoiceOrchestrator {
        InvoiceOrchestrator::new(
            Arc::new(WorkflowDefinition::invoice().unwrap()),
            Arc::new(ReferenceStore::builtin()),
            Arc::new(skills),
        )
    }

    fn run(orch: &InvoiceOrchestrator, text: &str) -> RunState {
        orch.run(text.to_string(), Credential::new("sk-test")).unwrap()
    }

    #[test]
    fn english_invoice_skips_translation() {
        let skills = ScriptedSkills::new(Ok(invoice("INV-2024-001", 250.00, "USD")));
        let log = skills.log.clone();
        let state = run(&orchestrator(skills), ENGLISH_INVOICE);

        assert_eq!(
            state.trail(),
            &[
                Stage::Loaded,
                Stage::Extracted,
                Stage::LanguageChecked,
                Stage::Validated,
                Stage::Summarized,
                Stage::Done,
            ]
        );
        assert_eq!(state.detected_language(), Some("English"));
        assert!(!state.needs_translation());
        assert_eq!(
            state.translated_text(),
            Some(&TranslationOutcome::PassThrough(ENGLISH_INVOICE.to_string()))
        );
        assert_eq!(log.lock().unwrap().calls, vec!["extract", "summarize"]);
    }

    #[test]
    fn german_invoice_is_translated_to_canonical_language() {
        let skills = ScriptedSkills::new(Ok(invoice("RECH-2024-03-20", 500.00, "EUR")));
        let log = skills.log.clone();
        let state = run(&orchestrator(skills), GERMAN_INVOICE);

        assert_eq!(state.detected_language(), Some("German"));
        assert!(state.needs_translation());
        assert!(state.trail().contains(&Stage::Translated));
        assert_eq!(
            state.translated_text(),
            Some(&TranslationOutcome::Translated("Invoice No. RECH-2024-03-20".into()))
        );
        let log = log.lock().unwrap();
        assert_eq!(log.calls, vec!["extract", "translate:English", "summarize"]);
        assert!(log.summary_inputs[0].contains("Translated Content:\nInvoice No. RECH-2024-03-20"));
    }

    #[test]
    fn german_invoice_with_total_lines_takes_translation_branch() {
        let text = "Rechnung Nr. RECH-2024-03-20\n\
                    Datum: 20.03.2024\n\
                    Beratung 2 x 250,00 €\n\
                    Gesamt netto: 500,00 €\n\
                    Total: 500,00 €";
        let skills = ScriptedSkills::new(Ok(invoice("RECH-2024-03-20", 500.00, "EUR")));
        let log = skills.log.clone();
        let state = run(&orchestrator(skills), text);

        assert_eq!(state.detected_language(), Some("German"));
        assert!(state.needs_translation());
        assert!(state.trail().contains(&Stage::Translated));
        assert!(log.lock().unwrap().calls.contains(&"translate:English".to_string()));
        assert!(state.validation_outcome().unwrap().is_success());
    }

    #[test]
    fn english_euro_invoice_skips_translation() {
        let text = "Invoice #INV-7\nDate: 2024-01-01\nTotal: €250.00 EUR";
        let skills = ScriptedSkills::new(Ok(invoice("INV-7", 250.00, "EUR")));
        let state = run(&orchestrator(skills), text);
        assert_eq!(state.detected_language(), Some("English"));
        assert!(!state.trail().contains(&Stage::Translated));
    }

    #[test]
    fn target_language_is_configurable() {
        let skills = ScriptedSkills::new(Ok(invoice("RECH-2024-03-20", 500.00, "EUR")));
        let log = skills.log.clone();
        let orch = orchestrator(skills).with_target_language("French");
        run(&orch, GERMAN_INVOICE);
        assert!(log.lock().unwrap().calls.contains(&"translate:French".to_string()));
    }

    #[test]
    fn every_field_is_set_when_run_completes() {
        for text in [ENGLISH_INVOICE, GERMAN_INVOICE] {
            let skills = ScriptedSkills::new(Ok(invoice("INV-2024-001", 250.00, "USD")));
            let state = run(&orchestrator(skills), text);
            assert!(state.unset_fields().is_empty(), "unset fields for {text:?}");
            assert_eq!(state.trail().last(), Some(&Stage::Done));
        }
    }

    #[test]
    fn matching_invoice_validates() {
        let skills = ScriptedSkills::new(Ok(invoice("INV-2024-001", 250.00, "USD")));
        let state = run(&orchestrator(skills), ENGLISH_INVOICE);
        let outcome = state.validation_outcome().unwrap();
        assert_eq!(outcome.status, ValidationStatus::Success);
        assert!(outcome.messages.is_empty());
        assert_eq!(
            state.summary(),
            Some(&SummaryOutcome::Completed("Invoice processed.".into()))
        );
    }

    #[test]
    fn extraction_failure_flows_into_validation_and_summary() {
        let skills = ScriptedSkills::new(Err("no JSON object".into()));
        let log = skills.log.clone();
        let state = run(&orchestrator(skills), ENGLISH_INVOICE);

        assert!(matches!(state.extracted(), Some(ExtractionResult::Failed(_))));
        let outcome = state.validation_outcome().unwrap();
        assert_eq!(outcome.status, ValidationStatus::Failed);
        assert_eq!(outcome.messages.len(), 1);
        assert!(outcome.messages[0].starts_with("EXTRACTION FAILED: "));

        assert!(matches!(state.summary(), Some(SummaryOutcome::Completed(_))));
        let log = log.lock().unwrap();
        assert!(log.summary_inputs[0].contains(NO_EXTRACTED_DATA));
    }

    #[test]
    fn translation_failure_is_recorded_not_raised() {
        let mut skills = ScriptedSkills::new(Ok(invoice("RECH-2024-03-20", 500.00, "EUR")));
        skills.translation = Err("connection reset".into());
        let log = skills.log.clone();
        let state = run(&orchestrator(skills), GERMAN_INVOICE);

        assert!(matches!(state.translated_text(), Some(TranslationOutcome::Failed(_))));
        assert!(state.validation_outcome().unwrap().is_success());
        assert!(log.lock().unwrap().summary_inputs[0].contains("Translation unavailable"));
    }

    #[test]
    fn summary_failure_is_recorded_not_raised() {
        let mut skills = ScriptedSkills::new(Ok(invoice("INV-2024-001", 250.00, "USD")));
        skills.summary = Err("HTTP 500".into());
        let state = run(&orchestrator(skills), ENGLISH_INVOICE);
        assert!(matches!(state.summary(), Some(SummaryOutcome::Failed(_))));
        assert!(state.unset_fields().is_empty());
    }

    #[test]
    fn credential_reaches_every_skill() {
        let skills = ScriptedSkills::new(Ok(invoice("RECH-2024-03-20", 500.00, "EUR")));
        let log = skills.log.clone();
        run(&orchestrator(skills), GERMAN_INVOICE);
        assert!(log.lock().unwrap().credentials.iter().all(|c| c == "sk-test"));
    }

    #[test]
    fn blank_document_is_invalid_input() {
        let orch = orchestrator(ScriptedSkills::new(Err("unused".into())));
        let err = orch.run("   ".into(), Credential::new("sk-test")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn blank_credential_is_invalid_input() {
        let skills = ScriptedSkills::new(Err("unused".into()));
        let log = skills.log.clone();
        let orch = orchestrator(skills);
        let err = orch.run(ENGLISH_INVOICE.into(), Credential::new("")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(log.lock().unwrap().calls.is_empty());
    }

    #[test]
    fn routing_is_deterministic_across_runs() {
        let orch = orchestrator(ScriptedSkills::new(Ok(invoice("RECH-2024-03-20", 500.00, "EUR"))));
        let first = run(&orch, GERMAN_INVOICE);
        let second = run(&orch, GERMAN_INVOICE);
        assert_eq!(first.trail(), second.trail());
        assert_eq!(first.needs_translation(), second.needs_translation());
        assert_ne!(first.run_id(), second.run_id());
    }
}
