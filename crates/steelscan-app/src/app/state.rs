//! Application state and its reducer
//!
//! `reduce` is the only way state changes. It is pure: anything that needs a
//! clock, randomness or IO is either carried in by the action (commit ids and
//! timestamps) or handed back as an [`Effect`] for the orchestrator to run.
//!
//! Every scheduled continuation carries the `generation` it was scheduled
//! for. The counter moves whenever the analysis cycle changes identity, so a
//! late auto-save or a late gateway reply for an image that is no longer
//! current is dropped instead of clobbering newer state.

use steelscan_domain::repository::StoreKey;
use steelscan_domain::service::palette::{add_color, remove_color, update_color};
use steelscan_domain::service::profiles::{active_profile, apply_patch};
use steelscan_domain::service::rule_engine::apply;
use steelscan_types::region::is_region_code;
use steelscan_types::{
    AnalysisResult, ColorPaletteEntry, DestinationProfile, GatewayError, ImagePayload,
    InventoryRecord, PalettePatch, ProfilePatch, RawAnalysis,
};
use tracing::{debug, info, warn};

use super::queue::QueueManager;
use super::reconciler::{commit, CommitInput, CommitStamp};
use crate::repository::Collections;

/// Shown when a rejection carries no message of its own
pub const GENERIC_ANALYSIS_ERROR: &str = "An unexpected error occurred during analysis.";

/// Screen the operator is looking at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Analysis,
    Settings,
    Inventory,
}

/// Where the current analysis cycle stands, derived from state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Failed,
    /// Result pending, waiting for save or discard
    AwaitingDecision,
    /// Result pending, auto-pilot will commit it
    AutoSaving,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitTrigger {
    Manual,
    AutoPilot { generation: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Enqueue(Vec<ImagePayload>),
    SetAutoPilot(bool),
    /// Drop a pending image by its queue index
    RemoveQueued(usize),
    BeginAnalysis {
        generation: u64,
    },
    AnalysisCompleted {
        generation: u64,
        outcome: Result<RawAnalysis, GatewayError>,
    },
    Commit {
        stamp: CommitStamp,
        trigger: CommitTrigger,
    },
    /// Operator edit of the pending result
    ReviseResult(AnalysisResult),
    Discard,
    Retry,
    Reset,
    ResumeQueue,
    EditRecord(String),
    RequestDelete(String),
    ConfirmDelete,
    CancelDelete,
    AddProfile {
        id: String,
    },
    UpdateProfile {
        id: String,
        patch: ProfilePatch,
    },
    DeleteProfile(String),
    SelectProfile(String),
    AddColor(ColorPaletteEntry),
    UpdateColor {
        index: usize,
        patch: PalettePatch,
    },
    RemoveColor(usize),
    SetRegion(String),
    SetView(View),
    SetVariantImage(Option<ImagePayload>),
    SetGeneratedVariant(Option<String>),
}

/// Work the orchestrator performs after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call the gateway for the current image
    StartAnalysis { generation: u64 },
    /// Commit after the auto-save delay
    ScheduleAutoSave { generation: u64 },
    /// Start the freshly promoted image after the yield delay
    ScheduleNext { generation: u64 },
    /// Write the collection through to the store
    Persist(StoreKey),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

/// Single snapshot of the whole session
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub queue: QueueManager,
    pub variant_image: Option<ImagePayload>,
    pub loading: bool,
    pub generated_variant: Option<String>,
    pub error: Option<String>,
    pub result: Option<AnalysisResult>,
    pub view: View,
    pub profiles: Vec<DestinationProfile>,
    pub selected_profile_id: String,
    pub inventory: Vec<InventoryRecord>,
    /// Set iff a commit should update this record instead of adding one
    pub editing_record_id: Option<String>,
    pub pending_delete_id: Option<String>,
    /// Region setting; overwritten by each analysis's detected region
    pub region: String,
    pub palette: Vec<ColorPaletteEntry>,
    pub auto_pilot: bool,
    pub generation: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Collections::default())
    }
}

impl AppState {
    pub fn new(collections: Collections) -> Self {
        let selected_profile_id = collections
            .profiles
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_default();

        Self {
            queue: QueueManager::new(),
            variant_image: None,
            loading: false,
            generated_variant: None,
            error: None,
            result: None,
            view: View::Analysis,
            profiles: collections.profiles,
            selected_profile_id,
            inventory: collections.inventory,
            editing_record_id: None,
            pending_delete_id: None,
            region: String::new(),
            palette: collections.palette,
            auto_pilot: true,
            generation: 0,
        }
    }

    pub fn current_image(&self) -> Option<&ImagePayload> {
        self.queue.current()
    }

    pub fn active_profile(&self) -> Option<&DestinationProfile> {
        active_profile(&self.profiles, &self.selected_profile_id)
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.result.is_some() {
            if self.auto_save_armed() {
                Phase::AutoSaving
            } else {
                Phase::AwaitingDecision
            }
        } else {
            Phase::Idle
        }
    }

    /// No image current, none waiting, nothing in flight
    pub fn is_drained(&self) -> bool {
        self.queue.is_drained() && !self.loading
    }

    fn auto_save_armed(&self) -> bool {
        self.auto_pilot && self.editing_record_id.is_none()
    }

    fn profile_for_commit(&self) -> DestinationProfile {
        self.active_profile()
            .cloned()
            .unwrap_or_else(DestinationProfile::builtin)
    }

    /// Idle -> Loading for the current image
    fn begin_analysis(&mut self) -> Effect {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.result = None;
        info!(generation = self.generation, "analysis started");
        Effect::StartAnalysis {
            generation: self.generation,
        }
    }

    /// End the current analysis cycle
    fn close_cycle(&mut self) {
        self.generation += 1;
        self.loading = false;
        self.error = None;
        self.result = None;
        self.editing_record_id = None;
        self.generated_variant = None;
        self.variant_image = None;
    }
}

/// Apply `action` to `state`
pub fn reduce(mut state: AppState, action: Action) -> Transition {
    let effects = step(&mut state, action);
    Transition { state, effects }
}

fn step(state: &mut AppState, action: Action) -> Vec<Effect> {
    let mut effects = Vec::new();

    match action {
        Action::Enqueue(images) => {
            if images.is_empty() {
                return effects;
            }
            info!(count = images.len(), "images admitted");
            let idle = !state.loading;
            if state.queue.enqueue(images, idle) {
                state.view = View::Analysis;
                effects.push(state.begin_analysis());
            }
        }

        Action::SetAutoPilot(on) => {
            let was_armed = state.phase() == Phase::AutoSaving;
            state.auto_pilot = on;
            let armed = state.phase() == Phase::AutoSaving;

            if was_armed && !armed {
                // the pending timer must not fire after a later re-arm
                state.generation += 1;
                debug!(generation = state.generation, "pending auto-save dropped");
            } else if armed && !was_armed {
                effects.push(Effect::ScheduleAutoSave {
                    generation: state.generation,
                });
            }
        }

        Action::RemoveQueued(index) => {
            if state.queue.remove(index).is_none() {
                debug!(index, "no queued image at index");
            }
        }

        Action::BeginAnalysis { generation } => {
            let ready = state.current_image().is_some()
                && !state.loading
                && state.result.is_none()
                && state.error.is_none();
            if generation != state.generation || !ready {
                debug!(generation, current = state.generation, "stale start dropped");
                return effects;
            }
            effects.push(state.begin_analysis());
        }

        Action::AnalysisCompleted {
            generation,
            outcome,
        } => {
            if generation != state.generation || !state.loading {
                debug!(generation, current = state.generation, "stale analysis result dropped");
                return effects;
            }
            state.loading = false;

            match outcome {
                Ok(raw) => {
                    let result = apply(&raw, &state.profile_for_commit());
                    let detected = result.metadata.detected_state.trim().to_uppercase();
                    if !detected.is_empty() {
                        state.region = detected;
                    }
                    state.result = Some(result);
                    info!(generation, "analysis finished");

                    if state.auto_save_armed() {
                        effects.push(Effect::ScheduleAutoSave { generation });
                    }
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!(generation, error = %message, "analysis failed");
                    state.error = Some(if message.trim().is_empty() {
                        GENERIC_ANALYSIS_ERROR.to_string()
                    } else {
                        message
                    });
                }
            }
        }

        Action::Commit { stamp, trigger } => {
            if let CommitTrigger::AutoPilot { generation } = trigger {
                if generation != state.generation || !state.auto_save_armed() {
                    debug!(generation, current = state.generation, "stale auto-save dropped");
                    return effects;
                }
            }

            let (Some(result), Some(image)) = (state.result.clone(), state.current_image().cloned())
            else {
                debug!("nothing to commit");
                return effects;
            };

            let profile = state.profile_for_commit();
            let inventory = std::mem::take(&mut state.inventory);
            let reconciled = commit(
                inventory,
                &mut state.queue,
                CommitInput {
                    result: &result,
                    image: &image,
                    editing_id: state.editing_record_id.as_deref(),
                    profile: &profile,
                    region: &state.region,
                    stamp: &stamp,
                },
            );

            state.inventory = reconciled.inventory;
            if reconciled.record_id.is_none() {
                return effects;
            }
            state.close_cycle();
            effects.push(Effect::Persist(StoreKey::Inventory));

            if reconciled.next_image.is_some() {
                effects.push(Effect::ScheduleNext {
                    generation: state.generation,
                });
            } else {
                state.view = View::Inventory;
            }
        }

        Action::ReviseResult(result) => {
            if state.result.is_some() && !state.loading {
                state.result = Some(result);
            }
        }

        Action::Discard => {
            state.queue.clear_current();
            state.close_cycle();
            if state.queue.pending_len() > 0 {
                state.view = View::Inventory;
            }
            info!(pending = state.queue.pending_len(), "current image discarded");
        }

        Action::Retry => {
            if state.current_image().is_some() && !state.loading {
                effects.push(state.begin_analysis());
            }
        }

        Action::Reset => {
            state.queue.clear();
            state.close_cycle();
            state.view = View::Analysis;
            info!("session reset");
        }

        Action::ResumeQueue => {
            if state.current_image().is_none()
                && !state.loading
                && state.queue.advance().is_some()
            {
                state.view = View::Analysis;
                effects.push(state.begin_analysis());
            }
        }

        Action::EditRecord(id) => {
            if state.current_image().is_some() || state.loading {
                warn!(record = %id, "cannot edit while an image is in progress");
                return effects;
            }
            let Some(record) = state.inventory.iter().find(|r| r.id == id).cloned() else {
                warn!(record = %id, "no such inventory record");
                return effects;
            };

            state.generation += 1;
            state.auto_pilot = false;
            state.queue.set_current(record.image);
            state.result = Some(record.full_analysis);
            state.error = None;
            state.region = record.state;
            if state.profiles.iter().any(|p| p.id == record.profile_id) {
                state.selected_profile_id = record.profile_id;
            }
            state.editing_record_id = Some(record.id);
            state.view = View::Analysis;
        }

        Action::RequestDelete(id) => {
            if state.inventory.iter().any(|r| r.id == id) {
                state.pending_delete_id = Some(id);
            }
        }

        Action::ConfirmDelete => {
            if let Some(id) = state.pending_delete_id.take() {
                let before = state.inventory.len();
                state.inventory.retain(|r| r.id != id);
                if state.inventory.len() != before {
                    info!(record = %id, "inventory record deleted");
                    effects.push(Effect::Persist(StoreKey::Inventory));
                }
            }
        }

        Action::CancelDelete => {
            state.pending_delete_id = None;
        }

        Action::AddProfile { id } => {
            if state.profiles.iter().any(|p| p.id == id) {
                warn!(profile = %id, "profile id already exists");
                return effects;
            }
            state.profiles.push(DestinationProfile::new_template(id));
            effects.push(Effect::Persist(StoreKey::Profiles));
        }

        Action::UpdateProfile { id, patch } => {
            if let Some(profile) = state.profiles.iter_mut().find(|p| p.id == id) {
                apply_patch(profile, &patch);
                effects.push(Effect::Persist(StoreKey::Profiles));
            }
        }

        Action::DeleteProfile(id) => {
            if state.profiles.len() <= 1 {
                warn!(profile = %id, "refusing to delete the last profile");
                return effects;
            }
            let Some(index) = state.profiles.iter().position(|p| p.id == id) else {
                return effects;
            };
            state.profiles.remove(index);
            if state.selected_profile_id == id {
                state.selected_profile_id = state.profiles[0].id.clone();
            }
            info!(profile = %id, "profile deleted");
            effects.push(Effect::Persist(StoreKey::Profiles));
        }

        Action::SelectProfile(id) => {
            if state.profiles.iter().any(|p| p.id == id) {
                state.selected_profile_id = id;
            } else {
                warn!(profile = %id, "no such profile");
            }
        }

        Action::AddColor(entry) => {
            if add_color(&mut state.palette, entry) {
                effects.push(Effect::Persist(StoreKey::Palette));
            } else {
                warn!("palette already has a color with that name");
            }
        }

        Action::UpdateColor { index, patch } => {
            if update_color(&mut state.palette, index, &patch) {
                effects.push(Effect::Persist(StoreKey::Palette));
            } else {
                warn!(index, "palette update refused");
            }
        }

        Action::RemoveColor(index) => {
            if remove_color(&mut state.palette, index) {
                effects.push(Effect::Persist(StoreKey::Palette));
            }
        }

        Action::SetRegion(code) => {
            let code = code.trim().to_uppercase();
            if is_region_code(&code) {
                state.region = code;
            } else {
                warn!(region = %code, "unknown region code");
            }
        }

        Action::SetView(view) => state.view = view,
        Action::SetVariantImage(image) => state.variant_image = image,
        Action::SetGeneratedVariant(variant) => state.generated_variant = variant,
    }

    effects
}
