//! Policy evaluator: per-process opt-out
//!
//! A process definition is exempt from reconciliation when it carries a
//! parameter named after the exemption marker whose value is `true`, or
//! a category with that name. Names compare case-insensitively.
//!
//! Read failures never block reconciliation: they are logged and the
//! check in question counts as "not exempt".

use crate::traits::{CategoryStore, ParameterStore};
use grant_types::{CategoryOrder, ParameterOrder, ProcessDefinitionId, QueryWindow};
use std::sync::Arc;

/// Where an exemption came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExemptionSource {
    Parameter,
    Category,
}

/// Evaluates the exemption marker for process definitions
#[derive(Clone)]
pub struct PolicyEvaluator {
    parameters: Arc<dyn ParameterStore>,
    categories: Arc<dyn CategoryStore>,
    marker: String,
    page_size: usize,
}

impl PolicyEvaluator {
    pub fn new(
        parameters: Arc<dyn ParameterStore>,
        categories: Arc<dyn CategoryStore>,
        marker: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            parameters,
            categories,
            marker: marker.into(),
            page_size,
        }
    }

    pub fn is_exempt(&self, process_definition_id: ProcessDefinitionId) -> bool {
        self.exemption(process_definition_id).is_some()
    }

    /// The first check that exempts the process, parameter before category.
    pub fn exemption(&self, process_definition_id: ProcessDefinitionId) -> Option<ExemptionSource> {
        if self.parameter_exempts(process_definition_id) {
            return Some(ExemptionSource::Parameter);
        }
        if self.category_exempts(process_definition_id) {
            return Some(ExemptionSource::Category);
        }
        None
    }

    fn parameter_exempts(&self, process_definition_id: ProcessDefinitionId) -> bool {
        let parameters = match self.parameters.list_parameters(
            process_definition_id,
            QueryWindow::first(self.page_size),
            ParameterOrder::NameDesc,
        ) {
            Ok(parameters) => parameters,
            Err(err) => {
                tracing::warn!(
                    process_definition_id = %process_definition_id,
                    error = %err,
                    "Could not read process parameters, treating as not exempt"
                );
                return false;
            }
        };

        // A marker set to false does not settle it; the category may still exempt.
        parameters
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(&self.marker))
            .any(|p| parse_flag(&p.value))
    }

    fn category_exempts(&self, process_definition_id: ProcessDefinitionId) -> bool {
        match self.categories.list_categories(
            process_definition_id,
            QueryWindow::first(self.page_size),
            CategoryOrder::AscNullsLast,
        ) {
            Ok(categories) => categories
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&self.marker)),
            Err(err) => {
                tracing::warn!(
                    process_definition_id = %process_definition_id,
                    error = %err,
                    "Could not read process categories, treating as not exempt"
                );
                false
            }
        }
    }
}

/// `true` only for the literal "true", ignoring case.
fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEngine;
    use grant_types::{Category, Parameter};

    const PD: ProcessDefinitionId = ProcessDefinitionId(9);

    fn evaluator(engine: &Arc<InMemoryEngine>) -> PolicyEvaluator {
        PolicyEvaluator::new(
            engine.clone(),
            engine.clone(),
            "skipAutoPermissionGranting",
            500,
        )
    }

    #[test]
    fn test_no_marker_is_not_exempt() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_parameter(PD, Parameter::new("approvalLimit", "true"));
        engine.add_category(PD, Category::new("Finance"));
        assert!(!evaluator(&engine).is_exempt(PD));
    }

    #[test]
    fn test_true_parameter_exempts() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_parameter(PD, Parameter::new("SKIPAUTOPERMISSIONGRANTING", "TRUE"));
        assert_eq!(
            evaluator(&engine).exemption(PD),
            Some(ExemptionSource::Parameter)
        );
    }

    #[test]
    fn test_false_parameter_falls_through_to_category() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_parameter(PD, Parameter::new("skipAutoPermissionGranting", "false"));
        assert!(!evaluator(&engine).is_exempt(PD));

        engine.add_category(PD, Category::new("skipautopermissiongranting"));
        assert_eq!(
            evaluator(&engine).exemption(PD),
            Some(ExemptionSource::Category)
        );
    }

    #[test]
    fn test_non_boolean_value_is_false() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_parameter(PD, Parameter::new("skipAutoPermissionGranting", "yes"));
        engine.add_parameter(PD, Parameter::new("skipAutoPermissionGranting", " true"));
        assert!(!evaluator(&engine).is_exempt(PD));
    }

    #[test]
    fn test_parameter_read_failure_still_checks_category() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.fail_parameter_reads(true);
        assert!(!evaluator(&engine).is_exempt(PD));

        engine.add_category(PD, Category::new("skipAutoPermissionGranting"));
        assert_eq!(
            evaluator(&engine).exemption(PD),
            Some(ExemptionSource::Category)
        );
    }

    #[test]
    fn test_category_read_failure_is_not_exempt() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_category(PD, Category::new("skipAutoPermissionGranting"));
        engine.fail_category_reads(true);
        assert!(!evaluator(&engine).is_exempt(PD));
    }

    #[test]
    fn test_markers_on_other_definitions_are_ignored() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_parameter(
            ProcessDefinitionId::new(10),
            Parameter::new("skipAutoPermissionGranting", "true"),
        );
        assert!(!evaluator(&engine).is_exempt(PD));
    }

    #[test]
    fn test_marker_found_among_many_parameters() {
        let engine = Arc::new(InMemoryEngine::new());
        for name in ["approvalLimit", "region", "zoneOverride", "escalationDays"] {
            engine.add_parameter(PD, Parameter::new(name, "true"));
        }
        engine.add_parameter(PD, Parameter::new("skipAutoPermissionGranting", "true"));

        assert_eq!(
            evaluator(&engine).exemption(PD),
            Some(ExemptionSource::Parameter)
        );
        assert_eq!(
            engine.last_parameter_read(),
            Some((QueryWindow::first(500), ParameterOrder::NameDesc))
        );
        assert_eq!(engine.last_category_read(), None);
    }

    #[test]
    fn test_category_read_window_and_order() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_category(PD, Category::new("Finance"));
        engine.add_category(PD, Category::new("skipAutoPermissionGranting"));
        engine.add_category(PD, Category::new("Travel"));

        assert_eq!(
            evaluator(&engine).exemption(PD),
            Some(ExemptionSource::Category)
        );
        assert_eq!(
            engine.last_category_read(),
            Some((QueryWindow::first(500), CategoryOrder::AscNullsLast))
        );
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("True"));
        assert!(!parse_flag("1"));
        assert!(!parse_flag(""));
    }
}
