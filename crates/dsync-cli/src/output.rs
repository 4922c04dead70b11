//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use dsync_core::binding::Binding;
use dsync_core::design::model::{DsComponent, Version};
use dsync_core::diff::{display_value, Impact, TokenDiff};
use dsync_core::sync::{SyncResult, SyncSource};
use dsync_core::tokens::{css_variable_name, FlatTokenMap};
use dsync_core::validation::ValidationResult;
use dsync_core::versioning::ChangeKind;
use unicode_width::UnicodeWidthStr;

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
pub fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

pub fn impact_colored(impact: Impact) -> ColoredString {
    match impact {
        Impact::Low => "low".green(),
        Impact::Medium => "medium".yellow(),
        Impact::High => "high".magenta(),
        Impact::Breaking => "breaking".red().bold(),
    }
}

fn kind_marker(kind: ChangeKind) -> ColoredString {
    match kind {
        ChangeKind::Add => "+".green().bold(),
        ChangeKind::Update => "~".yellow().bold(),
        ChangeKind::Remove => "-".red().bold(),
    }
}

/// Print flattened tokens as `path  --css-var  value`.
pub fn print_tokens_table(tokens: &FlatTokenMap) {
    if tokens.is_empty() {
        println!("{}", "No tokens. Add a source and run 'dsync sync run <id>'.".dimmed());
        return;
    }

    let path_width = tokens.keys().map(|k| UnicodeWidthStr::width(k.as_str())).max().unwrap_or(0).min(40);
    let value_width = term_width().saturating_sub(path_width * 2 + 6).max(12);

    for (path, value) in tokens {
        println!(
            "{}  {}  {}",
            pad_right(&truncate_visual(path, path_width), path_width).cyan(),
            pad_right(&truncate_visual(&css_variable_name(path), path_width + 2), path_width + 2).dimmed(),
            truncate_visual(&display_value(Some(value)), value_width)
        );
    }
    println!();
    println!("{} token(s)", tokens.len());
}

pub fn print_versions_table(versions: &[Version], current: Option<&str>) {
    if versions.is_empty() {
        println!("{}", "No versions yet.".dimmed());
        return;
    }

    println!("  {:<12} {:<20} {:<8} {:<10} {}", "VERSION", "CREATED", "CHANGES", "BREAKING", "ORIGIN");
    println!("{}", "─".repeat(70).dimmed());
    for version in versions.iter().rev() {
        let marker = if current == Some(version.version.as_str()) { "●".green().bold() } else { " ".normal() };
        let breaking = if version.breaking { "yes".red() } else { "no".dimmed() };
        println!(
            "{} {:<12} {:<20} {:<8} {:<10} {}",
            marker,
            version.version,
            version.timestamp.format("%Y-%m-%d %H:%M"),
            version.changelog.len(),
            breaking,
            truncate_visual(version.origin.as_deref().unwrap_or("-"), 24).dimmed()
        );
    }
}

pub fn print_changelog(version: &Version) {
    println!(
        "{} {} {}",
        "Version".bold(),
        version.version.cyan().bold(),
        if version.breaking { "(breaking)".red().to_string() } else { String::new() }
    );
    for entry in &version.changelog {
        println!("  {} {}", kind_marker(entry.kind), entry.description);
    }
}

pub fn print_diff(diff: &TokenDiff) {
    if diff.is_empty() {
        println!("{}", "No token changes.".dimmed());
        return;
    }
    for change in &diff.added {
        println!("  {} {} = {}", "+".green().bold(), change.path, display_value(change.new_value.as_ref()));
    }
    for change in &diff.modified {
        println!(
            "  {} {}: {} {} {}",
            "~".yellow().bold(),
            change.path,
            display_value(change.old_value.as_ref()).dimmed(),
            "→".dimmed(),
            display_value(change.new_value.as_ref())
        );
    }
    for change in &diff.removed {
        println!("  {} {}", "-".red().bold(), change.path);
    }
    println!();
    println!("{}: {} ({} change(s))", "Impact".bold(), impact_colored(diff.impact), diff.total_changes());
}

pub fn print_sources_table(sources: &[SyncSource]) {
    if sources.is_empty() {
        println!("{}", "No sources. Add one with 'dsync source add-url <name> <url>'.".dimmed());
        return;
    }

    println!("{:<38} {:<20} {:<8} {:<10} {}", "ID", "NAME", "TYPE", "STATUS", "LAST SYNC");
    println!("{}", "─".repeat(96).dimmed());
    for source in sources {
        let status = if !source.enabled {
            "disabled".dimmed()
        } else if source.auto_sync_interval().is_some() {
            "auto".cyan()
        } else {
            "enabled".green()
        };
        let last_sync = source
            .last_sync
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<38} {:<20} {:<8} {:<10} {}",
            source.id,
            pad_right(&truncate_visual(&source.name, 20), 20),
            source.config.type_name(),
            status,
            last_sync.dimmed()
        );
    }
}

pub fn print_sync_result(result: &SyncResult) {
    if result.success {
        let version = match &result.new_version {
            Some(v) => format!("new version {}", v.cyan().bold()),
            None => "no new version".dimmed().to_string(),
        };
        println!(
            "{} Synced {}: {} change(s), {}",
            "✓".green().bold(),
            result.source,
            result.changes,
            version
        );
        if let Some(impact) = result.impact.filter(|_| result.changes > 0) {
            println!("  Impact: {}", impact_colored(impact));
        }
    } else {
        println!("{} Sync of {} failed", "✗".red().bold(), result.source);
        for error in &result.errors {
            println!("  {}", error.red());
        }
    }
    for warning in &result.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
}

pub fn print_history(history: &[SyncResult]) {
    if history.is_empty() {
        println!("{}", "No syncs recorded.".dimmed());
        return;
    }
    for result in history.iter().rev() {
        let status = if result.success { "✓".green().bold() } else { "✗".red().bold() };
        let detail = if result.success {
            match &result.new_version {
                Some(v) => format!("{} change(s) → {}", result.changes, v),
                None => "unchanged".to_string(),
            }
        } else {
            result.errors.first().cloned().unwrap_or_default()
        };
        println!(
            "{} {} {:<20} {}",
            status,
            result.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            truncate_visual(&result.source, 20),
            truncate_visual(&detail, term_width().saturating_sub(45).max(20))
        );
    }
}

pub fn print_bindings_table(bindings: &[Binding]) {
    if bindings.is_empty() {
        println!("{}", "No bindings defined.".dimmed());
        return;
    }
    println!("{:<24} {:<24} {:<10} {:<8} {}", "BUILDER TYPE", "DS COMPONENT", "VERSION", "TOKENS", "STATUS");
    println!("{}", "─".repeat(80).dimmed());
    for binding in bindings {
        println!(
            "{:<24} {:<24} {:<10} {:<8} {}",
            truncate_visual(&binding.cms_component_type, 24),
            truncate_visual(&binding.ds_component_id, 24),
            binding.version,
            binding.token_bindings.len(),
            if binding.enabled { "enabled".green() } else { "disabled".dimmed() }
        );
    }
}

pub fn print_binding(binding: &Binding) {
    println!(
        "{} {} {}",
        binding.cms_component_type.cyan().bold(),
        "→".dimmed(),
        binding.ds_component_id.bold()
    );
    println!("{}: {}", "Version".bold(), binding.version);
    println!("{}: {}", "Enabled".bold(), binding.enabled);

    if !binding.prop_mapping.is_empty() {
        println!();
        println!("{}", "Props".bold());
        for (ds_prop, cms_prop) in &binding.prop_mapping {
            println!("  {} {} {}", ds_prop, "←".dimmed(), cms_prop);
        }
    }
    if !binding.variant_mapping.is_empty() {
        println!();
        println!("{}", "Variants".bold());
        for (cms_variant, ds_variant) in &binding.variant_mapping {
            println!("  {} {} {}", cms_variant, "→".dimmed(), ds_variant);
        }
    }
    if !binding.token_bindings.is_empty() {
        println!();
        println!("{}", "Tokens".bold());
        for token in &binding.token_bindings {
            let target = token.css_property.as_deref().unwrap_or("-");
            println!(
                "  {:<16} {:<28} {}",
                token.cms_prop,
                token.reference().to_string().cyan(),
                target.dimmed()
            );
        }
    }
}

pub fn print_components_table(components: &[DsComponent]) {
    if components.is_empty() {
        println!("{}", "No design system components.".dimmed());
        return;
    }
    println!("{:<20} {:<24} {:<14} {:<10} {}", "ID", "NAME", "CATEGORY", "VERSION", "VARIANTS");
    println!("{}", "─".repeat(80).dimmed());
    for component in components {
        let name = if component.deprecated {
            format!("{} (deprecated)", component.name).dimmed().to_string()
        } else {
            component.name.clone()
        };
        println!(
            "{:<20} {:<24} {:<14} {:<10} {}",
            truncate_visual(&component.id, 20),
            name,
            truncate_visual(&component.category, 14),
            component.version,
            component.variant_names().join(", ")
        );
    }
}

pub fn print_component(component: &DsComponent) {
    println!("{} {}", component.name.cyan().bold(), format!("({})", component.id).dimmed());
    if component.deprecated {
        let successor = component
            .replaced_by
            .as_deref()
            .map(|s| format!(", use {}", s))
            .unwrap_or_default();
        println!("{}", format!("Deprecated{}", successor).yellow());
    }
    println!("{}: {}", "Version".bold(), component.version);
    if !component.category.is_empty() {
        println!("{}: {}", "Category".bold(), component.category);
    }
    if !component.props.is_empty() {
        println!();
        println!("{}", "Props".bold());
        for prop in &component.props {
            let required = if prop.required { "required".yellow() } else { "optional".dimmed() };
            println!("  {:<16} {:<10} {}", prop.name, prop.prop_type, required);
        }
    }
    for variant in &component.variants {
        println!();
        println!("{} {}", "Variant".bold(), variant.name.cyan());
        for (property, token) in &variant.tokens {
            println!("  {:<20} {}", property, String::from(token.clone()));
        }
    }
}

pub fn print_validation(result: &ValidationResult) {
    for error in &result.errors {
        println!(
            "{} {} {} {}",
            "error".red().bold(),
            format!("[{}]", error.node_id).dimmed(),
            error.message,
            format!("({})", error.code.as_str()).dimmed()
        );
    }
    for warning in &result.warnings {
        let fix = if warning.auto_fixable { " (auto-fixable)".cyan().to_string() } else { String::new() };
        println!(
            "{} {} {}{}",
            "warn".yellow().bold(),
            format!("[{}]", warning.node_id).dimmed(),
            warning.message,
            fix
        );
        if let Some(suggestion) = &warning.suggestion {
            println!("     {} {}", "→".dimmed(), suggestion.dimmed());
        }
    }
    for suggestion in &result.suggestions {
        println!("{} {}", "hint".blue().bold(), suggestion);
    }

    println!();
    let fixable = result.auto_fixable().count();
    if result.valid {
        println!(
            "{} Valid ({} warning(s), {} auto-fixable)",
            "✓".green().bold(),
            result.warnings.len(),
            fixable
        );
    } else {
        println!(
            "{} Invalid: {} error(s), {} warning(s), {} auto-fixable",
            "✗".red().bold(),
            result.errors.len(),
            result.warnings.len(),
            fixable
        );
    }
}
