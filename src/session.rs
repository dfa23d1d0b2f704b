//! Experiment session driver.
//!
//! Narrates each milestone, lets the participant edit the subgoal tree
//! through chooser sessions, applies the edits via the mutation primitives,
//! and records everything into a JSON results database. All interactive I/O
//! goes through the `Interaction` trait so the whole session is scriptable
//! in tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::builder::{Subgoal, TreeBuilder};
use crate::chooser::{Chooser, Verdict};
use crate::cli::output;
use crate::config::Settings;
use crate::errors::{MutationError, SessionError, SessionResult};
use crate::ops::{self, Slot};

/// Edit actions offered each manipulation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Move,
    Remove,
    Add,
}

/// Interactive I/O seam. The terminal implementation lives in `ui`;
/// tests substitute a scripted one.
pub trait Interaction {
    /// Free-text prompt (participant name).
    fn prompt_line(&mut self, prompt: &str) -> SessionResult<String>;

    /// "Would you like to make a change?" y/n.
    fn confirm_change(&mut self) -> SessionResult<bool>;

    /// Action menu; None means the participant backed out of the round.
    fn pick_action(&mut self) -> SessionResult<Option<EditAction>>;

    /// Runs one chooser session to a verdict.
    fn run_chooser(&mut self, chooser: Chooser) -> SessionResult<Verdict>;
}

// ---------------------------------------------------------------------------
// Result records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MoveNode,
    RemoveNode,
    AddNode,
}

/// One committed mutation, as recorded for the experimenters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Display names of the nodes involved
    pub nodes: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Top-level child ids before any edits
    pub base_subtree: Vec<String>,
    /// Top-level child ids when the milestone ended
    pub final_subtree: Vec<String>,
    pub action_history: Vec<ActionRecord>,
    /// Diagnostic trace of an abandoned round, if one faulted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_log: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub participant_name: String,
    pub experiment_start_date: String,
    pub resource_file: String,
    /// Milestone records in the order they were run
    pub experiment_progression: IndexMap<String, MilestoneRecord>,
}

pub type ResultsDb = BTreeMap<String, ExperimentRecord>;

/// Loads the results database, empty if the file does not exist yet.
pub fn load_db(path: &Path) -> SessionResult<ResultsDb> {
    if !path.exists() {
        return Ok(ResultsDb::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Rewrites the results database.
pub fn save_db(db: &ResultsDb, path: &Path) -> SessionResult<()> {
    let json = serde_json::to_string_pretty(db)?;
    fs::write(path, json).map_err(|_| SessionError::ResultsFile(path.to_path_buf()))?;
    Ok(())
}

fn now_iso() -> String {
    Local::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct ExperimentSession<I: Interaction> {
    settings: Settings,
    ui: I,
}

impl<I: Interaction> ExperimentSession<I> {
    pub fn new(settings: Settings, ui: I) -> Self {
        Self { settings, ui }
    }

    /// Full experiment for one robot profile: load resources, log the
    /// participant in, run every milestone, persist results.
    #[instrument(level = "info", skip(self))]
    pub fn run(&mut self, robot: &str, db_file: &Path) -> SessionResult<()> {
        let resource_file = format!("{robot}-resource-file.json");
        let resource_path = resource_path(&self.settings, robot);
        output::info(&format!(
            "\nLoading behavior tree and behavior library from {}...\n",
            resource_path.display()
        ));

        let mut subgoals = TreeBuilder::new().build_from_file(&resource_path)?;

        let mut db = load_db(db_file)?;

        let name = self.ui.prompt_line("Please enter your name")?;
        let experiment_id = Uuid::new_v4().to_string();
        let mut record = ExperimentRecord {
            participant_name: name.clone(),
            experiment_start_date: now_iso(),
            resource_file,
            experiment_progression: IndexMap::new(),
        };
        output::info("\nSetup complete.\n");

        self.narrate(&format!(
            "Bot: Hello {name}, welcome to the agent interactive training \
             experiment! My name is {robot}. I will first show you the actions \
             I plan to take; you can adjust them before I begin."
        ));

        for subgoal in &mut subgoals {
            info!(milestone = %subgoal.title, "starting milestone");
            let milestone = self.run_milestone(subgoal);
            record
                .experiment_progression
                .insert(subgoal.title.clone(), milestone);
        }

        db.insert(experiment_id, record);
        output::info(&format!(
            "Writing results of the session to {}...",
            db_file.display()
        ));
        save_db(&db, db_file)?;
        output::info("Done.");

        self.narrate(&format!(
            "\nThank you, {name}, for participating. The results have been \
             recorded in {}.",
            db_file.display()
        ));
        Ok(())
    }

    /// One milestone: narrate the context, run the manipulation loop, then
    /// walk the final plan.
    #[instrument(level = "debug", skip(self, subgoal), fields(milestone = %subgoal.title))]
    pub fn run_milestone(&mut self, subgoal: &mut Subgoal) -> MilestoneRecord {
        let mut milestone = MilestoneRecord {
            start_time: Some(now_iso()),
            base_subtree: subgoal.child_ids(),
            ..Default::default()
        };

        output::header("\n=========================================================");
        if !subgoal.context.is_empty() {
            self.narrate(&format!("\n{}", subgoal.context));
        }
        self.narrate(&format!(
            "\nBot: I am starting the following milestone: {}\n",
            subgoal.title
        ));
        output::info("Bot: Here are the actions, in order, that I will take to achieve this goal.");

        self.manipulation_loop(subgoal, &mut milestone);

        self.narrate("\nBot: Okay, I will begin.");
        self.walk_plan(subgoal);

        milestone.final_subtree = subgoal.child_ids();
        milestone.end_time = Some(now_iso());
        self.narrate(&format!(
            "\nBot: The following milestone has been reached: {}\n",
            subgoal.title
        ));
        milestone
    }

    /// Repeated rounds of "want to change something?" until the participant
    /// declines. A faulted round is logged and abandoned; the loop goes on.
    fn manipulation_loop(&mut self, subgoal: &mut Subgoal, milestone: &mut MilestoneRecord) {
        loop {
            output::info("");
            self.display_one_level(subgoal);

            match self.ui.confirm_change() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    error!(error = %e, "confirm prompt failed, ending manipulation");
                    milestone.error_log = Some(e.to_string());
                    break;
                }
            }

            match self.run_round(subgoal) {
                Ok(Some(action)) => {
                    debug!(?action.kind, "action committed");
                    milestone.action_history.push(action);
                }
                Ok(None) => output::detail("No action taken."),
                Err(e) => {
                    // DriverFault boundary: keep the session alive, keep the trace
                    error!(error = %e, "manipulation round failed");
                    output::warning(&format!("The last change could not be applied: {e}"));
                    milestone.error_log = Some(e.to_string());
                }
            }
        }
    }

    /// One manipulation round: pick an action, run the chooser session(s),
    /// apply the mutation, build the action record. `Ok(None)` is a
    /// cancellation, a normal outcome.
    fn run_round(&mut self, subgoal: &mut Subgoal) -> SessionResult<Option<ActionRecord>> {
        let action = match self.ui.pick_action()? {
            Some(action) => action,
            None => return Ok(None),
        };

        let root = subgoal.root;
        let child_names: Vec<String> = subgoal
            .tree
            .get(root)
            .map(|n| {
                n.children
                    .iter()
                    .filter_map(|&c| subgoal.tree.name_of(c).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        match action {
            EditAction::Move => {
                if child_names.is_empty() {
                    output::detail("There are no actions to move.");
                    return Ok(None);
                }
                let picked = match self.ui.run_chooser(Chooser::select(child_names.clone()))? {
                    Verdict::Node(i) => i,
                    _ => return Ok(None),
                };
                let node = subgoal
                    .tree
                    .get(root)
                    .and_then(|n| n.children.get(picked).copied())
                    .ok_or(MutationError::StaleIndex)?;
                let node_name = child_names[picked].clone();

                let mut remaining = child_names;
                remaining.remove(picked);
                let slot = match self
                    .ui
                    .run_chooser(Chooser::moving(remaining, node_name.clone(), picked))?
                {
                    Verdict::Slot(i) => i,
                    _ => return Ok(None),
                };

                ops::move_to(&mut subgoal.tree, node, Slot::new(root, slot))?;
                Ok(Some(ActionRecord {
                    kind: ActionKind::MoveNode,
                    nodes: vec![node_name],
                    timestamp: now_iso(),
                }))
            }
            EditAction::Remove => {
                if child_names.is_empty() {
                    output::detail("There are no actions to remove.");
                    return Ok(None);
                }
                let picked = match self.ui.run_chooser(Chooser::select(child_names.clone()))? {
                    Verdict::Node(i) => i,
                    _ => return Ok(None),
                };
                let node = subgoal
                    .tree
                    .get(root)
                    .and_then(|n| n.children.get(picked).copied())
                    .ok_or(MutationError::StaleIndex)?;

                ops::remove(&mut subgoal.tree, node, root)?;
                Ok(Some(ActionRecord {
                    kind: ActionKind::RemoveNode,
                    nodes: vec![child_names[picked].clone()],
                    timestamp: now_iso(),
                }))
            }
            EditAction::Add => {
                // Only candidates that are still detached are offered; a
                // previously inserted one is part of the tree now.
                let available: Vec<_> = subgoal
                    .bank
                    .iter()
                    .copied()
                    .filter(|&c| {
                        subgoal.tree.get(c).map(|n| n.parent.is_none()).unwrap_or(false)
                    })
                    .collect();
                if available.is_empty() {
                    output::detail("The behavior bank is empty.");
                    return Ok(None);
                }
                let bank_names: Vec<String> = available
                    .iter()
                    .filter_map(|&c| subgoal.tree.name_of(c).map(str::to_string))
                    .collect();

                let picked = match self.ui.run_chooser(Chooser::select(bank_names.clone()))? {
                    Verdict::Node(i) => i,
                    _ => return Ok(None),
                };
                let candidate = available[picked];
                let candidate_name = bank_names[picked].clone();

                let slot = match self
                    .ui
                    .run_chooser(Chooser::insert(child_names, candidate_name.clone()))?
                {
                    Verdict::Slot(i) => i,
                    _ => return Ok(None),
                };

                ops::insert(&mut subgoal.tree, candidate, Slot::new(root, slot))?;
                Ok(Some(ActionRecord {
                    kind: ActionKind::AddNode,
                    nodes: vec![candidate_name],
                    timestamp: now_iso(),
                }))
            }
        }
    }

    /// Shows the subgoal name and its direct children, the view the
    /// participant edits against.
    fn display_one_level(&self, subgoal: &Subgoal) {
        output::header(&subgoal.title);
        if let Some(root) = subgoal.tree.get(subgoal.root) {
            for &child in &root.children {
                if let Some(name) = subgoal.tree.name_of(child) {
                    output::detail(&format!("-> {name}"));
                }
            }
        }
    }

    /// Narrates the final plan, one child at a time. No execution semantics:
    /// this only walks the ordered children and prints.
    fn walk_plan(&mut self, subgoal: &Subgoal) {
        let children: Vec<String> = subgoal
            .tree
            .get(subgoal.root)
            .map(|n| {
                n.children
                    .iter()
                    .filter_map(|&c| subgoal.tree.name_of(c).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        for name in children {
            self.narrate(&format!("\nBot: I am about to {name}"));
            self.narrate("Action in progress..");
        }
    }

    fn narrate(&self, message: &str) {
        output::info(message);
        let delay = self.settings.narration_delay_ms;
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
    }
}

/// Resolves the resource path for a robot profile under `resource_dir`.
pub fn resource_path(settings: &Settings, robot: &str) -> PathBuf {
    settings
        .resource_dir
        .join(format!("{robot}-resource-file.json"))
}
