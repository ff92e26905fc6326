//! Command handlers

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use steelscan_app::app::{
    dispatch_offline, Action, AppState, CommitStamp, CommitTrigger, Orchestrator,
    OrchestratorSettings, Phase, SessionHandle,
};
use steelscan_app::config::Config;
use steelscan_app::repository::{load_collections, open_session_store};
use steelscan_app::scanner::{load_payload, scan_paths};
use steelscan_app::scheduler::TokioScheduler;
use steelscan_domain::repository::KeyValueStore;
use steelscan_domain::service::palette::name_taken;
use steelscan_types::region::is_region_code;
use steelscan_types::{
    AnalysisResult, ColorPaletteEntry, DestinationProfile, Error, ImagePayload, OutputFormat,
    PalettePatch, Result, VariableValue,
};
use steelscan_vision::{AnalysisGateway, GeminiGateway};
use tracing::debug;

use crate::cli::{Cli, Commands, InventoryCommand, PaletteCommand, ProfileCommand, RecordEdits};
use crate::output::{
    output_inventory, output_palette, output_profiles, output_record, output_result,
};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    if let Some(ref store_dir) = cli.store_dir {
        config.store_dir = Some(store_dir.clone());
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Process {
            paths,
            review,
            profile,
            region,
        } => cmd_process(
            &cli,
            &config,
            paths,
            *review,
            profile.as_deref(),
            region.as_deref(),
            output_format,
        ),

        Commands::Inventory { action } => cmd_inventory(&cli, &config, action, output_format),

        Commands::Profiles { action } => cmd_profiles(&cli, &config, action, output_format),

        Commands::Palette { action } => cmd_palette(&cli, &config, action, output_format),

        Commands::Config {
            show,
            set_model,
            set_api_key,
            set_endpoint,
            set_auto_pilot,
            set_timeout,
            set_auto_save_delay,
            set_output,
            reset,
        } => cmd_config(
            *show,
            set_model.clone(),
            set_api_key.clone(),
            set_endpoint.clone(),
            *set_auto_pilot,
            *set_timeout,
            *set_auto_save_delay,
            *set_output,
            *reset,
        ),
    }
}

/// Saved collections plus the store they came from, for commands that
/// never call the gateway
struct Workspace {
    state: AppState,
    store: Box<dyn KeyValueStore>,
}

impl Workspace {
    fn open(cli: &Cli, config: &Config) -> Result<Self> {
        let store = open_session_store(config, cli.ephemeral)?;
        let collections = load_collections(&*store);
        let mut workspace = Self {
            state: AppState::new(collections),
            store,
        };

        workspace.apply(Action::SetAutoPilot(config.auto_pilot));
        if let Some(ref id) = config.default_profile_id {
            workspace.apply(Action::SelectProfile(id.clone()));
        }
        Ok(workspace)
    }

    fn apply(&mut self, action: Action) -> &AppState {
        let state = std::mem::take(&mut self.state);
        self.state = dispatch_offline(state, action, &mut *self.store);
        &self.state
    }

    fn require_profile(&self, id: &str) -> Result<()> {
        if self.state.profiles.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("profile '{}'", id)))
        }
    }

    /// Hand the loaded state and store to a live session
    fn into_session(self, config: &Config) -> SessionHandle<Box<dyn KeyValueStore>> {
        let gateway: Arc<dyn AnalysisGateway> =
            Arc::new(GeminiGateway::new(config.analyzer_config()));
        let settings = OrchestratorSettings {
            delays: config.delays(),
            analysis_timeout: config.analysis_timeout(),
        };
        Orchestrator::spawn(
            self.state,
            self.store,
            gateway,
            Arc::new(TokioScheduler),
            settings,
        )
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

fn image_label(names: &HashMap<ImagePayload, String>, image: Option<&ImagePayload>) -> String {
    image
        .and_then(|i| names.get(i))
        .cloned()
        .unwrap_or_else(|| "image".to_string())
}

/// Ask a question on stdin; an empty answer (or EOF) comes back as ""
async fn prompt(question: &'static str) -> Result<String> {
    tokio::task::spawn_blocking(move || -> Result<String> {
        println!("{}", question);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_lowercase())
    })
    .await
    .map_err(|e| Error::Session(e.to_string()))?
}

fn cmd_process(
    cli: &Cli,
    config: &Config,
    paths: &[PathBuf],
    review: bool,
    profile: Option<&str>,
    region: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let files = scan_paths(paths)?;
    if files.is_empty() {
        return Err(Error::FileNotFound(
            "No images found in the given paths".to_string(),
        ));
    }

    let mut names = HashMap::new();
    let mut images = Vec::with_capacity(files.len());
    for file in &files {
        let payload = load_payload(file)?;
        names.insert(payload.clone(), file_label(file));
        images.push(payload);
    }

    let mut workspace = Workspace::open(cli, config)?;
    if let Some(id) = profile {
        workspace.require_profile(id)?;
        workspace.apply(Action::SelectProfile(id.to_string()));
    }
    if let Some(code) = region {
        let code = code.trim().to_uppercase();
        if !is_region_code(&code) {
            return Err(Error::InvalidInput(format!("unknown region code '{}'", code)));
        }
        workspace.apply(Action::SetRegion(code));
    }

    let review = review || !config.auto_pilot;
    workspace.apply(Action::SetAutoPilot(!review));
    let saved_before = workspace.state.inventory.len();

    if cli.verbose {
        let profile = workspace
            .state
            .active_profile()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        eprintln!(
            "Found {} images for '{}' ({})",
            images.len(),
            profile,
            if review { "review" } else { "auto-pilot" }
        );
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let (state, failed) = runtime.block_on(async {
        let session = workspace.into_session(config);
        let outcome = if review {
            run_review(&session, images, &names, output_format).await
        } else {
            run_auto(&session, images, &names).await
        };
        let (state, _store) = session.shutdown().await?;
        outcome.map(|failed| (state, failed))
    })?;

    let saved = state.inventory.len().saturating_sub(saved_before);
    println!();
    println!("Saved:    {}", saved);
    println!("Failed:   {}", failed);
    println!("Total:    {} records in inventory", state.inventory.len());

    Ok(())
}

/// Let auto-pilot save every result; failures are skipped
async fn run_auto<S>(
    session: &SessionHandle<S>,
    images: Vec<ImagePayload>,
    names: &HashMap<ImagePayload, String>,
) -> Result<usize> {
    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let saved_before = session.snapshot().inventory.len();
    let mut rx = session.subscribe();
    session.apply(Action::Enqueue(images)).await?;
    let mut failed = 0;

    loop {
        let state = rx.borrow_and_update().clone();
        let done = state.inventory.len().saturating_sub(saved_before) + failed;
        pb.set_position(done as u64);
        pb.set_message(image_label(names, state.current_image()));

        if state.phase() == Phase::Failed {
            failed += 1;
            pb.println(format!(
                "Failed: {}: {}",
                image_label(names, state.current_image()),
                state.error.as_deref().unwrap_or_default()
            ));
            session.apply(Action::Discard).await?;
            session.apply(Action::ResumeQueue).await?;
            continue;
        }
        if state.is_drained() {
            break;
        }
        if rx.changed().await.is_err() {
            return Err(Error::Session("session closed".to_string()));
        }
    }

    pb.finish_with_message("Complete");
    Ok(failed)
}

/// Ask the operator about every result
async fn run_review<S>(
    session: &SessionHandle<S>,
    images: Vec<ImagePayload>,
    names: &HashMap<ImagePayload, String>,
    output_format: OutputFormat,
) -> Result<usize> {
    session.apply(Action::Enqueue(images)).await?;
    let mut failed = 0;

    loop {
        let state = session
            .wait_until(|s| {
                matches!(s.phase(), Phase::AwaitingDecision | Phase::Failed) || s.is_drained()
            })
            .await?;
        let name = image_label(names, state.current_image());

        match state.phase() {
            Phase::AwaitingDecision => {
                if let Some(ref result) = state.result {
                    output_result(output_format, result, &state.palette, &name)?;
                }
                match prompt("\n[s]ave, [d]iscard, [r]etry, [q]uit?").await?.as_str() {
                    "s" | "save" => {
                        session.commit().await?;
                    }
                    "d" | "discard" => {
                        session.apply(Action::Discard).await?;
                        session.apply(Action::ResumeQueue).await?;
                    }
                    "r" | "retry" => {
                        session.apply(Action::Retry).await?;
                    }
                    "q" | "quit" | "" => {
                        session.apply(Action::Reset).await?;
                        break;
                    }
                    other => println!("Unknown choice '{}'", other),
                }
            }
            Phase::Failed => {
                eprintln!(
                    "Analysis of {} failed: {}",
                    name,
                    state.error.as_deref().unwrap_or_default()
                );
                match prompt("[r]etry, [d]iscard, [q]uit?").await?.as_str() {
                    "r" | "retry" => {
                        session.apply(Action::Retry).await?;
                    }
                    "d" | "discard" => {
                        failed += 1;
                        session.apply(Action::Discard).await?;
                        session.apply(Action::ResumeQueue).await?;
                    }
                    "q" | "quit" | "" => {
                        failed += 1;
                        session.apply(Action::Reset).await?;
                        break;
                    }
                    other => println!("Unknown choice '{}'", other),
                }
            }
            _ => break,
        }
    }

    Ok(failed)
}

fn cmd_inventory(
    cli: &Cli,
    config: &Config,
    action: &InventoryCommand,
    output_format: OutputFormat,
) -> Result<()> {
    let mut workspace = Workspace::open(cli, config)?;

    match action {
        InventoryCommand::List { limit } => {
            output_inventory(output_format, &workspace.state.inventory, *limit)
        }

        InventoryCommand::Show { id } => {
            let state = &workspace.state;
            let record = state
                .inventory
                .iter()
                .find(|r| &r.id == id)
                .ok_or_else(|| Error::NotFound(format!("inventory record '{}'", id)))?;
            output_record(output_format, record, &state.palette)
        }

        InventoryCommand::Delete { id, yes } => {
            let state = workspace.apply(Action::RequestDelete(id.clone()));
            if state.pending_delete_id.is_none() {
                return Err(Error::NotFound(format!("inventory record '{}'", id)));
            }

            if !yes {
                println!("Delete record {}? [y/N]", id);
                let mut input = String::new();
                std::io::stdin().read_line(&mut input).ok();
                if !input.trim().eq_ignore_ascii_case("y") {
                    workspace.apply(Action::CancelDelete);
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            workspace.apply(Action::ConfirmDelete);
            println!("Deleted record {}", id);
            Ok(())
        }

        InventoryCommand::Edit {
            id,
            fields,
            reanalyze,
        } => {
            if !reanalyze && fields.is_empty() {
                return Err(Error::InvalidInput(
                    "nothing to change; pass a field flag or --reanalyze".to_string(),
                ));
            }

            let state = if *reanalyze {
                let runtime = tokio::runtime::Runtime::new()?;
                runtime.block_on(async {
                    let session = workspace.into_session(config);
                    let outcome = reanalyze_record(&session, id, fields).await;
                    let (state, _store) = session.shutdown().await?;
                    outcome.map(|_| state)
                })?
            } else {
                let state = workspace.apply(Action::EditRecord(id.clone()));
                let mut result = editable_result(state, id)?;
                apply_edits(&mut result, fields);
                workspace.apply(Action::ReviseResult(result));
                workspace
                    .apply(Action::Commit {
                        stamp: CommitStamp::now(),
                        trigger: CommitTrigger::Manual,
                    })
                    .clone()
            };

            let record = state
                .inventory
                .iter()
                .find(|r| &r.id == id)
                .ok_or_else(|| Error::NotFound(format!("inventory record '{}'", id)))?;
            println!("Updated record {}", id);
            output_record(output_format, record, &state.palette)
        }
    }
}

/// The result loaded for editing `id`, if the edit was accepted
fn editable_result(state: &AppState, id: &str) -> Result<AnalysisResult> {
    match (&state.editing_record_id, &state.result) {
        (Some(editing), Some(result)) if editing == id => Ok(result.clone()),
        _ => Err(Error::NotFound(format!("inventory record '{}'", id))),
    }
}

async fn reanalyze_record<S>(
    session: &SessionHandle<S>,
    id: &str,
    fields: &RecordEdits,
) -> Result<()> {
    let state = session.apply(Action::EditRecord(id.to_string())).await?;
    editable_result(&state, id)?;

    debug!(record = %id, "analyzing stored photo again");
    session.apply(Action::Retry).await?;
    let state = session
        .wait_until(|s| matches!(s.phase(), Phase::AwaitingDecision | Phase::Failed))
        .await?;

    if let Some(error) = state.error {
        session.apply(Action::Discard).await?;
        return Err(Error::Analysis(error));
    }

    let mut result = editable_result(&state, id)?;
    apply_edits(&mut result, fields);
    session.apply(Action::ReviseResult(result)).await?;
    session.commit().await?;
    Ok(())
}

fn apply_edits(result: &mut AnalysisResult, edits: &RecordEdits) {
    let variables = &mut result.variables;
    if let Some(width) = edits.width {
        variables.width.value = VariableValue::Number(width);
    }
    if let Some(length) = edits.length {
        variables.length.value = VariableValue::Number(length);
    }
    if let Some(height) = edits.height {
        variables.wall_height.value = VariableValue::Number(height);
    }
    if let Some(ref pitch) = edits.pitch {
        variables.pitch.value = VariableValue::Text(pitch.clone());
    }

    if let Some(ref sku) = edits.sku {
        result.sku = sku.clone();
    }
    if let Some(ref title) = edits.title {
        result.product_title_short = title.clone();
    }
    if let Some(ref title) = edits.long_title {
        result.product_title_long = title.clone();
    }
    if let Some(ref description) = edits.description {
        result.descriptions.actual_sales_copy = description.clone();
    }

    let colors = &mut result.colors;
    for (edit, color) in [
        (&edits.roof, &mut colors.roof),
        (&edits.wall, &mut colors.wall),
        (&edits.trim, &mut colors.trim),
        (&edits.wainscot, &mut colors.wainscot),
    ] {
        if let Some(name) = edit {
            *color = name.clone();
        }
    }
}

fn cmd_profiles(
    cli: &Cli,
    config: &Config,
    action: &ProfileCommand,
    output_format: OutputFormat,
) -> Result<()> {
    let mut workspace = Workspace::open(cli, config)?;

    match action {
        ProfileCommand::List => {
            let state = &workspace.state;
            output_profiles(output_format, &state.profiles, &state.selected_profile_id)
        }

        ProfileCommand::Add { fields } => {
            let id = DestinationProfile::generate_id();
            workspace.apply(Action::AddProfile { id: id.clone() });

            let patch = fields.to_patch();
            if !patch.is_empty() {
                workspace.apply(Action::UpdateProfile {
                    id: id.clone(),
                    patch,
                });
            }
            println!("Added profile {}", id);
            Ok(())
        }

        ProfileCommand::Update { id, fields } => {
            workspace.require_profile(id)?;
            let patch = fields.to_patch();
            if patch.is_empty() {
                return Err(Error::InvalidInput("nothing to update".to_string()));
            }
            workspace.apply(Action::UpdateProfile {
                id: id.clone(),
                patch,
            });
            println!("Updated profile {}", id);
            Ok(())
        }

        ProfileCommand::Delete { id } => {
            workspace.require_profile(id)?;
            if workspace.state.profiles.len() <= 1 {
                return Err(Error::InvalidInput(
                    "cannot delete the last profile".to_string(),
                ));
            }
            workspace.apply(Action::DeleteProfile(id.clone()));

            let mut saved = Config::load()?;
            if saved.default_profile_id.as_deref() == Some(id.as_str()) {
                saved.default_profile_id = None;
                saved.save()?;
            }
            println!("Deleted profile {}", id);
            Ok(())
        }

        ProfileCommand::Select { id } => {
            workspace.require_profile(id)?;
            let state = workspace.apply(Action::SelectProfile(id.clone()));
            let name = state
                .active_profile()
                .map(|p| p.name.clone())
                .unwrap_or_default();

            let mut saved = Config::load()?;
            saved.default_profile_id = Some(id.clone());
            saved.save()?;
            println!("Selected profile {} ({})", id, name);
            Ok(())
        }
    }
}

/// `#rrggbb` or `#rgb`
fn is_hex_color(hex: &str) -> bool {
    match hex.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn check_hex(hex: &str) -> Result<()> {
    if is_hex_color(hex) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "'{}' is not a hex color like #36454f",
            hex
        )))
    }
}

fn cmd_palette(
    cli: &Cli,
    config: &Config,
    action: &PaletteCommand,
    output_format: OutputFormat,
) -> Result<()> {
    let mut workspace = Workspace::open(cli, config)?;
    let palette_len = workspace.state.palette.len();
    let check_index = |index: usize| {
        if index < palette_len {
            Ok(())
        } else {
            Err(Error::NotFound(format!("palette entry {}", index)))
        }
    };

    match action {
        PaletteCommand::List => output_palette(output_format, &workspace.state.palette),

        PaletteCommand::Add { name, hex } => {
            check_hex(hex)?;
            if name_taken(&workspace.state.palette, name, None) {
                return Err(Error::InvalidInput(format!("color '{}' already exists", name)));
            }
            workspace.apply(Action::AddColor(ColorPaletteEntry::new(name.clone(), hex.clone())));
            println!("Added color {} ({})", name, hex);
            Ok(())
        }

        PaletteCommand::Update { index, name, hex } => {
            check_index(*index)?;
            if let Some(hex) = hex {
                check_hex(hex)?;
            }
            if let Some(name) = name {
                if name_taken(&workspace.state.palette, name, Some(*index)) {
                    return Err(Error::InvalidInput(format!("color '{}' already exists", name)));
                }
            }

            let patch = PalettePatch {
                name: name.clone(),
                hex: hex.clone(),
            };
            if patch == PalettePatch::default() {
                return Err(Error::InvalidInput("nothing to update".to_string()));
            }
            let state = workspace.apply(Action::UpdateColor {
                index: *index,
                patch,
            });
            let entry = &state.palette[*index];
            println!("Updated color {}: {} ({})", index, entry.name, entry.hex);
            Ok(())
        }

        PaletteCommand::Remove { index } => {
            check_index(*index)?;
            let name = workspace.state.palette[*index].name.clone();
            workspace.apply(Action::RemoveColor(*index));
            println!("Removed color {}", name);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    show: bool,
    set_model: Option<String>,
    set_api_key: Option<String>,
    set_endpoint: Option<String>,
    set_auto_pilot: Option<bool>,
    set_timeout: Option<u64>,
    set_auto_save_delay: Option<u64>,
    set_output: Option<OutputFormat>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(model) = set_model {
        config.model = model;
        modified = true;
    }

    if let Some(api_key) = set_api_key {
        config.api_key = if api_key.is_empty() { None } else { Some(api_key) };
        modified = true;
    }

    if let Some(endpoint) = set_endpoint {
        config.endpoint = endpoint;
        modified = true;
    }

    if let Some(auto_pilot) = set_auto_pilot {
        config.auto_pilot = auto_pilot;
        modified = true;
    }

    if let Some(timeout) = set_timeout {
        config.analysis_timeout_secs = timeout;
        modified = true;
    }

    if let Some(delay) = set_auto_save_delay {
        config.auto_save_delay_ms = delay;
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use steelscan_types::VariableInsight;

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#36454f"));
        assert!(is_hex_color("#FFF"));
        assert!(!is_hex_color("36454f"));
        assert!(!is_hex_color("#3645"));
        assert!(!is_hex_color("#zzzzzz"));
    }

    #[test]
    fn test_apply_edits_touches_only_given_fields() {
        let mut result = AnalysisResult {
            sku: "SB-1".to_string(),
            ..Default::default()
        };
        result.variables.width = VariableInsight::number(40.0);
        result.variables.length = VariableInsight::number(60.0);
        result.colors.roof = "Charcoal".to_string();

        let edits = RecordEdits {
            width: Some(42.0),
            pitch: Some("4/12".to_string()),
            wall: Some("Polar White".to_string()),
            ..Default::default()
        };
        apply_edits(&mut result, &edits);

        assert_eq!(result.variables.width.value, VariableValue::Number(42.0));
        assert_eq!(result.variables.length.value, VariableValue::Number(60.0));
        assert_eq!(result.variables.pitch.value.to_string(), "4/12");
        assert_eq!(result.colors.roof, "Charcoal");
        assert_eq!(result.colors.wall, "Polar White");
        assert_eq!(result.sku, "SB-1");
    }

    #[test]
    fn test_editable_result_requires_matching_edit() {
        let state = AppState::default();
        assert!(matches!(
            editable_result(&state, "r1"),
            Err(Error::NotFound(_))
        ));
    }
}
