//! Validation of builder component trees.
//!
//! [`ValidationEngine`] is read-only over the active version, the bindings
//! and the tree. The only mutating entry point is [`ValidationEngine::auto_fix`].

pub mod model;

use serde_json::Value;
use tracing::debug;

use crate::binding::{apply_tokens_to_node, Binding};
use crate::config::IntegrationConfig;
use crate::design::model::{DsComponent, Version};
use crate::node::ComponentNode;
use crate::tokens::contrast::check_contrast;
use crate::tokens::TokenReference;

pub use model::{IssueCode, Severity, ValidationError, ValidationResult, ValidationWarning};

const BACKGROUND_PROPERTY: &str = "backgroundColor";
const FOREGROUND_PROPERTY: &str = "color";

pub struct ValidationEngine<'a> {
    version: Option<&'a Version>,
    bindings: &'a [Binding],
    config: &'a IntegrationConfig,
}

impl<'a> ValidationEngine<'a> {
    pub fn new(version: Option<&'a Version>, bindings: &'a [Binding], config: &'a IntegrationConfig) -> Self {
        Self {
            version,
            bindings,
            config,
        }
    }

    /// Enabled binding for a builder component type.
    fn binding_for(&self, component_type: &str) -> Option<&'a Binding> {
        self.bindings
            .iter()
            .find(|b| b.enabled && b.cms_component_type == component_type)
    }

    fn ds_component(&self, id: &str) -> Option<&'a DsComponent> {
        self.version?.component(id)
    }

    /// Validate a single node, ignoring its descendants.
    pub fn validate_node(&self, node: &ComponentNode) -> ValidationResult {
        let mut result = ValidationResult::default();
        let id = node.id.as_str();

        let Some(binding) = self.binding_for(&node.component_type) else {
            if self.config.block_non_ds_styles {
                result
                    .warning(
                        id,
                        IssueCode::UnboundComponent,
                        format!("Component '{}' is not bound to the design system", node.component_type),
                        false,
                    )
                    .suggestion = Some("Create a binding for this component type".to_string());
            }
            return result;
        };

        let component = self.ds_component(&binding.ds_component_id);
        match component {
            None => result.error(
                id,
                IssueCode::MissingComponent,
                format!("Design system component '{}' not found", binding.ds_component_id),
            ),
            Some(component) => self.check_component(node, binding, component, &mut result),
        }

        for token_binding in &binding.token_bindings {
            let reference = token_binding.reference();
            let resolved = self.version.and_then(|v| v.tokens.resolve(&reference));
            if resolved.is_none() {
                result.error(
                    id,
                    IssueCode::UnresolvedToken,
                    format!("Token '{}' for prop '{}' does not resolve", reference, token_binding.cms_prop),
                );
            }
        }

        self.check_staleness(node, &mut result);
        self.check_contrast(node, &mut result);

        if let Some(component) = component {
            if component.variants.len() > 1 {
                result.suggestions.push(format!(
                    "{} ({}) supports variants: {}",
                    component.name,
                    id,
                    component.variant_names().join(", ")
                ));
            }
        }

        result
    }

    fn check_component(&self, node: &ComponentNode, binding: &Binding, component: &DsComponent, result: &mut ValidationResult) {
        let id = node.id.as_str();
        for prop in component.required_props() {
            let cms_prop = binding.cms_prop_for(&prop.name);
            let present = node.props.get(cms_prop).is_some_and(|v| !v.is_null());
            if !present {
                result.error(
                    id,
                    IssueCode::MissingRequiredProp,
                    format!("Missing required prop '{}' for {}", cms_prop, component.name),
                );
            }
        }

        if component.deprecated {
            let message = format!("Component {} is deprecated", component.name);
            let warning = result.warning(id, IssueCode::DeprecatedComponent, message, false);
            warning.suggestion = component
                .replaced_by
                .as_ref()
                .map(|successor| format!("Use '{}' instead", successor));
        }
    }

    fn check_staleness(&self, node: &ComponentNode, result: &mut ValidationResult) {
        let Some(version) = self.version else {
            return;
        };
        let id = node.id.as_str();
        if !node.tokens_applied() {
            result
                .warning(id, IssueCode::TokensNotApplied, "Design tokens not applied", true)
                .suggestion = Some("Apply design system tokens".to_string());
        } else if node.applied_version() != Some(version.version.as_str()) {
            let applied = node.applied_version().unwrap_or("unknown");
            result
                .warning(
                    id,
                    IssueCode::OutdatedVersion,
                    format!("DS out of date: applied {}, current {}", applied, version.version),
                    true,
                )
                .suggestion = Some(format!("Re-apply tokens from {}", version.version));
        }
    }

    fn check_contrast(&self, node: &ComponentNode, result: &mut ValidationResult) {
        let (Some(bg), Some(fg)) = (self.style_color(node, BACKGROUND_PROPERTY), self.style_color(node, FOREGROUND_PROPERTY)) else {
            return;
        };
        // Colors that are not hex (gradients, var(), named) are not checked.
        let Ok(check) = check_contrast(&fg, &bg, self.config.contrast_threshold) else {
            return;
        };
        if !check.valid {
            result
                .warning(
                    &node.id,
                    IssueCode::LowContrast,
                    format!(
                        "Insufficient contrast ratio {:.2}:1 (minimum {}:1)",
                        check.ratio, self.config.contrast_threshold
                    ),
                    false,
                )
                .suggestion = Some("Pick a text or background color with more contrast".to_string());
        }
    }

    /// Style color, following a `{token.path}` reference when there is one.
    fn style_color(&self, node: &ComponentNode, property: &str) -> Option<String> {
        let raw = node.style_str(property)?;
        match (TokenReference::parse(raw), self.version) {
            (Some(reference), Some(version)) => version
                .tokens
                .resolve(&reference)
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => Some(raw.to_string()),
        }
    }

    /// Validate `root` and every descendant in `children` and `slots`.
    pub fn validate_tree(&self, root: &ComponentNode) -> ValidationResult {
        let mut result = ValidationResult::default();
        root.walk(&mut |node| result.merge(self.validate_node(node)));
        debug!(
            nodes = root.count(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated component tree"
        );
        result
    }

    /// Re-apply tokens on every node with an auto-fixable staleness warning.
    /// Returns the number of nodes fixed.
    pub fn auto_fix(&self, root: &mut ComponentNode) -> usize {
        let Some(version) = self.version else {
            return 0;
        };
        let mut fixed = 0;
        root.walk_mut(&mut |node| {
            let stale = !node.tokens_applied() || node.applied_version() != Some(version.version.as_str());
            if !stale {
                return;
            }
            if apply_tokens_to_node(node, self.binding_for(&node.component_type), Some(version)) {
                fixed += 1;
            }
        });
        debug!(fixed, "Auto-fixed component tree");
        fixed
    }
}
