//! confscope: inspect and edit layered configuration artifacts from the
//! command line.
//!
//! The binary owns everything the library refuses to: it reads the current
//! directory and the home directory, installs the tracing subscriber, and
//! turns operation outcomes into exit codes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use confscope_core::hooks::{self, HookDefinition, HookEvent};
use confscope_core::{
    ArtifactKind, ArtifactProfile, CrudEngine, OperationOptions, OperationOutcome, ParsedContent,
    PathResolver, RealFs, ScopeKind, UpdateRequest, ValidationReport, command_profile, discover,
    memory_profile, settings_profile,
};

#[derive(Debug, Parser)]
#[command(name = "confscope", version, about = "Discover and manage scoped configuration artifacts")]
struct Cli {
    /// Project root; defaults to the current directory
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Emit machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every discovered artifact across all scopes
    List(ListArgs),
    /// Show identities that exist in more than one scope
    Conflicts(KindArgs),
    /// List command namespaces found across scopes
    Namespaces,
    /// Create a new artifact in one scope
    Create(CreateArgs),
    /// Update an artifact, creating it if missing
    Update(UpdateArgs),
    /// Move or rename a command within one scope
    Move(MoveArgs),
    /// Delete an artifact from one scope
    Delete(DeleteArgs),
    /// Edit the hooks section of a settings file
    Hooks(HooksArgs),
    /// Validate a file on disk without changing it
    Check(CheckArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Command,
    Settings,
    Memory,
}

impl From<KindArg> for ArtifactKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Command => ArtifactKind::Command,
            KindArg::Settings => ArtifactKind::Settings,
            KindArg::Memory => ArtifactKind::Memory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    Project,
    User,
}

impl ScopeArg {
    fn kind(self) -> ScopeKind {
        match self {
            ScopeArg::Project => ScopeKind::Project,
            ScopeArg::User => ScopeKind::User,
        }
    }
}

#[derive(Debug, Args)]
struct KindArgs {
    /// Artifact kind to operate on
    #[arg(value_enum)]
    kind: KindArg,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(value_enum)]
    kind: KindArg,

    /// Show only the active candidate per identity
    #[arg(long)]
    active: bool,
}

#[derive(Debug, Clone, Copy, Default, Args)]
struct MutationFlags {
    /// Overwrite an existing target
    #[arg(long)]
    force: bool,

    /// Write a timestamped backup of the target before changing it
    #[arg(long)]
    backup: bool,

    /// Report the would-be effect without touching the filesystem
    #[arg(long)]
    dry_run: bool,
}

impl From<MutationFlags> for OperationOptions {
    fn from(flags: MutationFlags) -> Self {
        OperationOptions {
            dry_run: flags.dry_run,
            backup: flags.backup,
            force: flags.force,
        }
    }
}

#[derive(Debug, Args)]
struct TargetArgs {
    #[arg(value_enum)]
    kind: KindArg,

    /// Command name, optionally namespaced: 'deploy' or 'git/flow/sync'.
    /// Ignored for settings and memory, which have fixed file names.
    name: Option<String>,

    /// Scope to write in
    #[arg(long, value_enum, default_value = "project")]
    scope: ScopeArg,

    /// Target the settings.local.json overlay instead of settings.json
    #[arg(long)]
    local: bool,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Body text for the new artifact
    #[arg(long, conflicts_with = "file")]
    body: Option<String>,

    /// Read the body from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Frontmatter or settings document as a JSON object
    #[arg(long, value_name = "JSON")]
    metadata: Option<String>,

    #[command(flatten)]
    flags: MutationFlags,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Replacement body; the existing body is kept when omitted
    #[arg(long, conflicts_with = "file")]
    body: Option<String>,

    /// Read the replacement body from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Metadata keys to merge over the existing ones, as a JSON object
    #[arg(long, value_name = "JSON")]
    metadata: Option<String>,

    #[command(flatten)]
    flags: MutationFlags,
}

#[derive(Debug, Args)]
struct MoveArgs {
    /// Current command name, optionally namespaced
    from: String,

    /// New command name, optionally namespaced
    to: String,

    #[arg(long, value_enum, default_value = "project")]
    scope: ScopeArg,

    #[command(flatten)]
    flags: MutationFlags,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    flags: MutationFlags,
}

#[derive(Debug, Args)]
struct HooksArgs {
    #[command(subcommand)]
    action: HooksAction,
}

#[derive(Debug, Subcommand)]
enum HooksAction {
    /// Append a command hook under an event and matcher
    Add {
        /// Hook event name, e.g. PreToolUse
        event: String,

        /// Tool-name pattern the hook applies to
        #[arg(long)]
        matcher: String,

        /// Shell command to run
        #[arg(long)]
        command: String,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,

        #[command(flatten)]
        settings: SettingsTargetFlags,

        #[command(flatten)]
        flags: MutationFlags,
    },
    /// Remove one matcher entry, or every matcher for an event
    Remove {
        /// Hook event name, e.g. PreToolUse
        event: String,

        /// Matcher to remove; omitting it removes the whole event
        #[arg(long)]
        matcher: Option<String>,

        #[command(flatten)]
        settings: SettingsTargetFlags,

        #[command(flatten)]
        flags: MutationFlags,
    },
}

#[derive(Debug, Clone, Copy, Args)]
struct SettingsTargetFlags {
    /// Scope whose settings file to edit
    #[arg(long, value_enum, default_value = "project")]
    scope: ScopeArg,

    /// Edit the settings.local.json overlay instead of settings.json
    #[arg(long)]
    local: bool,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(value_enum)]
    kind: KindArg,

    /// File to validate
    path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project = match &cli.project {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let home = dirs::home_dir().context("cannot determine the home directory")?;
    let resolver = PathResolver::new(project, home);
    tracing::debug!("project root {}", resolver.project_root().display());

    match cli.cmd {
        Command::List(args) => run_list(&resolver, &args, cli.json),
        Command::Conflicts(args) => run_conflicts(&resolver, args.kind.into(), cli.json),
        Command::Namespaces => run_namespaces(&resolver, cli.json),
        Command::Create(args) => run_create(&resolver, args, cli.json).await,
        Command::Update(args) => run_update(&resolver, args, cli.json).await,
        Command::Move(args) => run_move(&resolver, args, cli.json).await,
        Command::Delete(args) => run_delete(&resolver, args, cli.json).await,
        Command::Hooks(args) => run_hooks(&resolver, args, cli.json).await,
        Command::Check(args) => run_check(&args),
    }
}

fn run_list(resolver: &PathResolver, args: &ListArgs, json: bool) -> Result<()> {
    let snapshot = discover(resolver, args.kind.into(), &RealFs);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let candidates: Vec<_> = snapshot
        .candidates
        .iter()
        .filter(|c| !args.active || c.is_active)
        .collect();
    if candidates.is_empty() {
        println!("no artifacts found");
        return Ok(());
    }

    for candidate in candidates {
        let marker = if candidate.is_active { "*" } else { " " };
        let note = if candidate.is_active { "" } else { "  (overridden)" };
        println!(
            "{marker} {:<30} {:<8} {}{note}",
            candidate.full_identity(),
            candidate.scope.to_string(),
            candidate.path.display()
        );
    }
    Ok(())
}

fn run_conflicts(resolver: &PathResolver, kind: ArtifactKind, json: bool) -> Result<()> {
    let snapshot = discover(resolver, kind, &RealFs);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.conflicts)?);
        return Ok(());
    }

    if snapshot.conflicts.is_empty() {
        println!("no conflicts");
        return Ok(());
    }

    for conflict in &snapshot.conflicts {
        println!(
            "{}: {} candidates, active is {}",
            conflict.identity,
            conflict.conflicting_candidates.len(),
            conflict.resolved.path.display()
        );
        for candidate in &conflict.conflicting_candidates {
            let marker = if candidate.is_active { "*" } else { " " };
            println!("  {marker} {} ({})", candidate.path.display(), candidate.scope);
        }
    }
    Ok(())
}

fn run_namespaces(resolver: &PathResolver, json: bool) -> Result<()> {
    let snapshot = discover(resolver, ArtifactKind::Command, &RealFs);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.namespaces)?);
        return Ok(());
    }

    if snapshot.namespaces.is_empty() {
        println!("no namespaces");
    }
    for namespace in &snapshot.namespaces {
        println!("{namespace}");
    }
    Ok(())
}

async fn run_create(resolver: &PathResolver, args: CreateArgs, json: bool) -> Result<()> {
    let kind: ArtifactKind = args.target.kind.into();
    let base = scope_base(resolver, kind, args.target.scope)?;
    let path = target_path(&base, kind, &args.target)?;

    let body = read_body(args.body, args.file.as_deref())?;
    let metadata = parse_metadata(args.metadata.as_deref())?;
    if kind != ArtifactKind::Settings && body.is_none() {
        bail!("provide the content with --body or --file");
    }

    let content = ParsedContent {
        metadata,
        body: body.unwrap_or_default(),
    };
    let profile = profile_for(kind, &base);
    let outcome = CrudEngine::new(&RealFs)
        .create(&profile, &path, content, args.flags.into())
        .await;
    report(outcome, json)
}

async fn run_update(resolver: &PathResolver, args: UpdateArgs, json: bool) -> Result<()> {
    let kind: ArtifactKind = args.target.kind.into();
    let base = scope_base(resolver, kind, args.target.scope)?;
    let path = target_path(&base, kind, &args.target)?;

    let request = UpdateRequest {
        metadata: parse_metadata(args.metadata.as_deref())?,
        body: read_body(args.body, args.file.as_deref())?,
    };
    if request.metadata.is_none() && request.body.is_none() {
        bail!("nothing to update: provide --body, --file, or --metadata");
    }

    let profile = profile_for(kind, &base);
    let outcome = CrudEngine::new(&RealFs)
        .update(&profile, &path, request, args.flags.into())
        .await;
    report(outcome, json)
}

async fn run_move(resolver: &PathResolver, args: MoveArgs, json: bool) -> Result<()> {
    let base = scope_base(resolver, ArtifactKind::Command, args.scope)?;
    let from = command_path(&base, &args.from);
    let to = command_path(&base, &args.to);

    let profile = command_profile(&base);
    let outcome = CrudEngine::new(&RealFs)
        .move_artifact(&profile, &from, &to, args.flags.into())
        .await;
    report(outcome, json)
}

async fn run_delete(resolver: &PathResolver, args: DeleteArgs, json: bool) -> Result<()> {
    let kind: ArtifactKind = args.target.kind.into();
    let base = scope_base(resolver, kind, args.target.scope)?;
    let path = target_path(&base, kind, &args.target)?;

    let profile = profile_for(kind, &base);
    let outcome = CrudEngine::new(&RealFs)
        .delete(&profile, &path, args.flags.into())
        .await;
    report(outcome, json)
}

async fn run_hooks(resolver: &PathResolver, args: HooksArgs, json: bool) -> Result<()> {
    let (settings_target, flags) = match &args.action {
        HooksAction::Add { settings, flags, .. } => (*settings, *flags),
        HooksAction::Remove { settings, flags, .. } => (*settings, *flags),
    };
    let base = scope_base(resolver, ArtifactKind::Settings, settings_target.scope)?;
    let target = TargetArgs {
        kind: KindArg::Settings,
        name: None,
        scope: settings_target.scope,
        local: settings_target.local,
    };
    let path = target_path(&base, ArtifactKind::Settings, &target)?;

    let current = if path.exists() {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        confscope_core::codec::parse_settings(&raw)?
    } else {
        serde_json::Value::Object(serde_json::Map::new())
    };

    let edited = match args.action {
        HooksAction::Add {
            event,
            matcher,
            command,
            timeout,
            ..
        } => {
            let event = parse_event(&event)?;
            hooks::add_hook(&current, event, &matcher, HookDefinition::command(command, timeout))
        }
        HooksAction::Remove { event, matcher, .. } => {
            let event = parse_event(&event)?;
            match matcher {
                Some(matcher) => hooks::remove_matcher(&current, event, &matcher),
                None => hooks::remove_event(&current, event),
            }
        }
    };

    // Removal can drop top-level keys, so the edited document replaces the
    // file wholesale instead of going through the shallow merge.
    let options = OperationOptions {
        dry_run: flags.dry_run,
        backup: flags.backup,
        force: true,
    };
    let profile = settings_profile(&base);
    let outcome = CrudEngine::new(&RealFs)
        .create(
            &profile,
            &path,
            ParsedContent {
                metadata: Some(edited),
                body: String::new(),
            },
            options,
        )
        .await;
    report(outcome, json)
}

fn parse_event(name: &str) -> Result<HookEvent> {
    HookEvent::parse(name).ok_or_else(|| {
        anyhow!(
            "'{name}' is not a valid hook event; valid events are: {}",
            HookEvent::valid_names()
        )
    })
}

fn run_check(args: &CheckArgs) -> Result<()> {
    let kind: ArtifactKind = args.kind.into();
    let raw = std::fs::read_to_string(&args.path)
        .with_context(|| format!("cannot read {}", args.path.display()))?;

    let report = match kind {
        ArtifactKind::Command => confscope_core::validate::validate_command_markdown(&raw),
        ArtifactKind::Memory => {
            if let Err(err) = confscope_core::codec::parse_frontmatter(&raw) {
                bail!("{}: {err}", args.path.display());
            }
            let mut report = ValidationReport::ok();
            if raw.trim().is_empty() {
                report.push_error("memory content must not be empty", None);
            }
            report
        }
        ArtifactKind::Settings => match confscope_core::codec::parse_settings(&raw) {
            Ok(parsed) => confscope_core::validate::validate_settings_schema(&parsed),
            Err(err) => bail!("{}: {err}", args.path.display()),
        },
    };

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    if report.valid {
        println!("{}: ok", args.path.display());
        Ok(())
    } else {
        for issue in &report.errors {
            eprintln!("error: {}", issue.message);
            if let Some(suggestion) = &issue.suggestion {
                eprintln!("  hint: {suggestion}");
            }
        }
        bail!("{} failed validation", args.path.display())
    }
}

/// Base directory of the requested scope for a kind. Project and user scopes
/// always resolve; only ancestor scopes are conditional.
fn scope_base(resolver: &PathResolver, kind: ArtifactKind, scope: ScopeArg) -> Result<PathBuf> {
    resolver
        .scopes(kind, &RealFs)
        .into_iter()
        .find(|s| s.kind == scope.kind())
        .map(|s| s.dir)
        .ok_or_else(|| anyhow!("no {} scope available", scope.kind()))
}

fn command_path(base: &Path, name: &str) -> PathBuf {
    base.join(format!("{name}.md"))
}

fn target_path(base: &Path, kind: ArtifactKind, target: &TargetArgs) -> Result<PathBuf> {
    match kind {
        ArtifactKind::Command => {
            let name = target
                .name
                .as_deref()
                .ok_or_else(|| anyhow!("a command name is required"))?;
            Ok(command_path(base, name))
        }
        ArtifactKind::Settings => {
            if target.local && target.scope != ScopeArg::Project {
                bail!("settings.local.json exists only at project scope");
            }
            let file = if target.local {
                confscope_core::paths::SETTINGS_LOCAL_FILE
            } else {
                confscope_core::paths::SETTINGS_FILE
            };
            Ok(base.join(file))
        }
        ArtifactKind::Memory => Ok(base.join(confscope_core::paths::MEMORY_FILE)),
    }
}

fn profile_for(kind: ArtifactKind, base: &Path) -> ArtifactProfile<'static> {
    match kind {
        ArtifactKind::Command => command_profile(base),
        ArtifactKind::Settings => settings_profile(base),
        ArtifactKind::Memory => memory_profile(base),
    }
}

fn read_body(inline: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(body), _) => Ok(Some(body)),
        (None, Some(path)) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            Ok(Some(body))
        }
        (None, None) => Ok(None),
    }
}

fn parse_metadata(raw: Option<&str>) -> Result<Option<serde_json::Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--metadata must be a JSON object")?;
    if !value.is_object() {
        bail!("--metadata must be a JSON object");
    }
    Ok(Some(value))
}

/// Print an operation outcome and turn failure into a nonzero exit.
fn report(outcome: OperationOutcome, json: bool) -> Result<()> {
    if json {
        let payload = serde_json::json!({
            "success": outcome.success,
            "message": outcome.message,
            "file_path": outcome.file_path,
            "warnings": outcome.warnings,
            "error_code": outcome.error.as_ref().map(|e| e.code()),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        if outcome.success {
            return Ok(());
        }
        std::process::exit(1);
    }

    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }
    if outcome.success {
        println!("{}", outcome.message);
        Ok(())
    } else {
        bail!("{}", outcome.message)
    }
}
