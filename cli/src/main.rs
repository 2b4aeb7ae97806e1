use std::{collections::BTreeSet, fmt, path::PathBuf};

use bragi_builder::FinalizeError;
use bragi_catalog::Catalog;
use bragi_estimator::{WorkloadSize, presets};
use bragi_template::{ParameterSpec, ParameterType, TemplateDocument};
use clap::{ArgAction, Args, Parser, Subcommand};
use miette::{Diagnostic, GraphicalReportHandler, IntoDiagnostic as _, Result, Severity};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, prelude::*};

mod blueprint;

use blueprint::{Blueprint, BlueprintResource};

#[derive(Parser)]
#[command(name = "bragi")]
#[command(version)]
#[command(about = "Bragi template builder CLI")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv, -vvvv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported resource kinds with their fields and SKUs.
    Catalog,
    /// Build a blueprint into an ARM template and print it.
    Build(BuildArgs),
    /// Validate a blueprint without emitting the template.
    Check(CheckArgs),
    /// Print the monthly cost estimate for a blueprint.
    Estimate(EstimateArgs),
    /// Print a starter blueprint for a workload size.
    Scaffold(ScaffoldArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Treat the given lints as errors (e.g. `warnings`, `builder::unused_parameter`).
    #[arg(short = 'D', long = "deny", value_name = "LINT")]
    deny: Vec<String>,

    /// Blueprint file to build.
    #[arg(value_name = "BLUEPRINT")]
    blueprint: PathBuf,
}

#[derive(Args)]
struct CheckArgs {
    /// Treat the given lints as errors (e.g. `warnings`, `builder::unused_parameter`).
    #[arg(short = 'D', long = "deny", value_name = "LINT")]
    deny: Vec<String>,

    /// Blueprint file to check.
    #[arg(value_name = "BLUEPRINT")]
    blueprint: PathBuf,
}

#[derive(Args)]
struct EstimateArgs {
    /// Blueprint file to estimate.
    #[arg(value_name = "BLUEPRINT")]
    blueprint: PathBuf,
}

#[derive(Args)]
struct ScaffoldArgs {
    /// Workload size: small, medium, large, or enterprise.
    #[arg(long = "size", value_name = "SIZE", default_value = "small")]
    size: String,

    /// Logical-name prefix for the scaffolded resources.
    #[arg(long = "prefix", value_name = "PREFIX", default_value = "app")]
    prefix: String,
}

fn main() -> Result<()> {
    miette::set_panic_hook();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Catalog => catalog(),
        Command::Build(args) => build(args),
        Command::Check(args) => check(args),
        Command::Estimate(args) => estimate(args),
        Command::Scaffold(args) => scaffold(args),
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().into_diagnostic()?
    } else {
        let bragi_level = match verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("error,bragi={bragi_level},bragi_={bragi_level}"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_fmt::layer())
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

fn catalog() -> Result<()> {
    for spec in Catalog::builtin().specs() {
        println!(
            "{}: {} ({} @ {})",
            spec.kind, spec.display_name, spec.azure_type, spec.api_version
        );
        println!("  {}", spec.description);
        for field in &spec.fields {
            let required = if field.required { " (required)" } else { "" };
            println!("  {}: {}{required}", field.name, field.ty.describe());
        }
        println!();
    }
    Ok(())
}

fn finalize_blueprint(path: &PathBuf, deny: &[String]) -> Result<TemplateDocument> {
    let builder = Blueprint::load(path)?.into_builder(Catalog::builtin())?;

    let deny = DenySet::new(deny);
    let lints: Vec<miette::Report> = builder
        .lint()
        .into_iter()
        .map(miette::Report::new)
        .collect();
    let denied_lint = print_diagnostics(&lints, &deny)?;

    let document = match builder.finalize() {
        Ok(document) => document,
        Err(FinalizeError::Validation { problems }) => {
            let reports: Vec<miette::Report> =
                problems.into_iter().map(miette::Report::new).collect();
            print_diagnostics(&reports, &deny)?;
            return Err(miette::miette!("blueprint validation failed"));
        }
        Err(err) => return Err(miette::Report::new(err)),
    };

    if denied_lint {
        return Err(miette::miette!("denied lints reported"));
    }
    Ok(document)
}

fn build(args: BuildArgs) -> Result<()> {
    let document = finalize_blueprint(&args.blueprint, &args.deny)?;
    println!("{}", document.to_json_string_pretty());
    Ok(())
}

fn check(args: CheckArgs) -> Result<()> {
    let document = finalize_blueprint(&args.blueprint, &args.deny)?;

    // structural pass over the emitted JSON, same as for a foreign template
    let structural: Vec<miette::Report> = bragi_template::validate::check_document(&document.to_json())
        .into_iter()
        .map(miette::Report::new)
        .collect();
    if print_diagnostics(&structural, &DenySet::new(&args.deny))? {
        return Err(miette::miette!("emitted template failed structural checks"));
    }

    eprintln!(
        "ok: {} resource(s), digest {}",
        document.resources.len(),
        document.digest()
    );
    Ok(())
}

fn estimate(args: EstimateArgs) -> Result<()> {
    let document = finalize_blueprint(&args.blueprint, &[])?;
    let estimate = bragi_estimator::estimate(&document);

    for (label, cost) in &estimate.breakdown {
        println!("{label}: ${cost:.2}/month");
    }
    println!("total: ${:.2}/month", estimate.monthly_estimate);

    let guidance = bragi_estimator::recommendations(&document, &estimate);
    if !guidance.is_empty() {
        println!();
        for line in &guidance {
            println!("note: {line}");
        }
    }
    Ok(())
}

fn scaffold(args: ScaffoldArgs) -> Result<()> {
    let size: WorkloadSize = args.size.parse().map_err(miette::Report::new)?;
    let declarations = presets::scaffold(size, &args.prefix).map_err(miette::Report::new)?;

    let mut blueprint = Blueprint::default();
    for declaration in declarations {
        blueprint.resources.push(BlueprintResource {
            kind: declaration.kind,
            name: declaration.logical_name,
            config: declaration.configuration,
        });
    }
    blueprint.parameters.insert(
        "sqlAdminLogin".parse().expect("valid parameter name"),
        ParameterSpec::builder().ty(ParameterType::String).build(),
    );
    blueprint.parameters.insert(
        "sqlAdminPassword".parse().expect("valid parameter name"),
        ParameterSpec::builder()
            .ty(ParameterType::SecureString)
            .build(),
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&blueprint).into_diagnostic()?
    );
    Ok(())
}

#[derive(Default)]
struct DenySet {
    deny_warnings: bool,
    deny_codes: BTreeSet<String>,
}

impl DenySet {
    fn new(deny: &[String]) -> Self {
        let mut set = Self::default();
        for d in deny {
            if d == "warnings" {
                set.deny_warnings = true;
            } else {
                set.deny_codes.insert(d.clone());
            }
        }
        set
    }

    fn is_denied(&self, code: &str) -> bool {
        self.deny_warnings || self.deny_codes.contains(code)
    }
}

/// Renders every report to stderr; returns whether any counts as an error
/// (its own severity, or a warning denied via `-D`).
fn print_diagnostics(diagnostics: &[miette::Report], deny: &DenySet) -> Result<bool> {
    let mut has_error = false;
    let handler = GraphicalReportHandler::new();

    for report in diagnostics {
        let diagnostic: &dyn Diagnostic = &**report;
        let code = diagnostic.code().map(|c| c.to_string()).unwrap_or_default();
        let severity = diagnostic.severity().unwrap_or(Severity::Error);
        let denied = matches!(severity, Severity::Warning) && deny.is_denied(&code);
        if denied || matches!(severity, Severity::Error) {
            has_error = true;
        }

        if denied {
            let denied_by = if deny.deny_warnings {
                "-D warnings".to_string()
            } else {
                format!("-D {code}")
            };
            render_report(
                &handler,
                &DeniedDiagnostic {
                    inner: diagnostic,
                    denied_by,
                },
            )?;
        } else {
            render_report(&handler, diagnostic)?;
        }
    }

    Ok(has_error)
}

fn render_report(handler: &GraphicalReportHandler, diagnostic: &dyn Diagnostic) -> Result<()> {
    let mut out = String::new();
    handler
        .render_report(&mut out, diagnostic)
        .map_err(|_| miette::miette!("failed to render diagnostics"))?;
    eprint!("{out}");
    Ok(())
}

/// Wraps a warning whose code was denied, re-reporting it as an error.
#[derive(Debug)]
struct DeniedDiagnostic<'a> {
    inner: &'a dyn Diagnostic,
    denied_by: String,
}

impl fmt::Display for DeniedDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner, f)
    }
}

impl std::error::Error for DeniedDiagnostic<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl Diagnostic for DeniedDiagnostic<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.inner.code()
    }

    fn severity(&self) -> Option<Severity> {
        Some(Severity::Error)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let hint = format!(
            "warning treated as error because it was denied via `{}`",
            self.denied_by
        );
        match self.inner.help() {
            Some(inner) => Some(Box::new(format!("{hint}\n{inner}"))),
            None => Some(Box::new(hint)),
        }
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        self.inner.related()
    }
}
