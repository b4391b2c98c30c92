//! Sort setup: input checks, config overrides, and relocation options.

use fieldsort_core::{Config, RelocationMode, SortOptions, SummaryFormat, Template, TimestampPolicy};

use super::SortArgs;

/// Check inputs, fold CLI flags into `config`, and build the sort options.
pub fn prepare(args: &SortArgs, config: &mut Config) -> anyhow::Result<SortOptions> {
    if let Some(missing) = args.inputs.iter().find(|p| !p.exists()) {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            missing
        );
    }

    apply_overrides(args, config);
    config.validate()?;

    let template_text = args.template.as_deref().unwrap_or(&config.output.template);
    let Some(template) = Template::new(template_text) else {
        anyhow::bail!(
            "The naming template is empty.\n\n  Hint: Try --template \"{{ID}}_{{FN}}.{{EXT}}\"."
        );
    };

    let summary_format = match args.format {
        Some(format) => format.into(),
        None => SummaryFormat::parse(&config.output.format).unwrap_or_default(),
    };

    Ok(SortOptions {
        mode: RelocationMode::from_flags(args.copy, args.move_files),
        template,
        summary_path: args.metadata.clone(),
        summary_format,
    })
}

/// Flags win over config values.
fn apply_overrides(args: &SortArgs, config: &mut Config) {
    if let Some(workers) = args.workers {
        config.processing.parallel_workers = workers;
    }
    if args.skip_undated {
        config.processing.missing_timestamp = TimestampPolicy::Skip;
    }
    if let Some(template) = &args.template {
        config.output.template = template.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format.to_string();
    }
}
