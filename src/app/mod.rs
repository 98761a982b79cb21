use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use eframe::egui::{Context, Pos2, Vec2};
use log::{info, warn};

use crate::conversation::{ChatMessage, Role};
use crate::graph::LayoutMode;
use crate::mindmap::MindMapNode;
use crate::physics::{PhysicsConfig, QuadtreeCell, TickReport};
use crate::session::{GraphUpdate, Session, UpdateOutcome};
use crate::structure::{
    AnalysisBundle, Collaborator, generate_chat_reply, generate_mind_map, run_full_analysis,
};

mod canvas;
mod render_utils;
mod supervisor;
mod ui;

use supervisor::RenderSupervisor;

/// Runtime options resolved from the command line.
#[derive(Clone, Debug)]
pub struct Config {
    pub layout: LayoutMode,
    pub background_mind_map: bool,
    pub chat_max_tokens: u32,
}

/// Results reported by worker threads. The frame loop drains them in
/// arrival order.
enum WorkerEvent {
    ChatReply(Result<String, String>),
    MindMap {
        fingerprint: String,
        result: Result<MindMapNode, String>,
    },
    Analysis(Result<AnalysisBundle, String>),
}

pub struct DecisionApp {
    collaborator: Option<Arc<dyn Collaborator>>,
    config: Config,
    events_tx: Sender<WorkerEvent>,
    events_rx: Receiver<WorkerEvent>,
    model: ViewModel,
}

struct ViewModel {
    session: Session,
    offline_reason: Option<String>,
    draft: String,
    paste_as_assistant: bool,
    chat_pending: bool,
    chat_error: Option<String>,
    analysis: Option<AnalysisBundle>,
    analysis_pending: bool,
    analysis_error: Option<String>,
    background_pending: usize,
    selected: Option<String>,
    rename_draft: Option<RenameDraft>,
    search: String,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    show_quadtree_overlay: bool,
    charge_scale: f32,
    link_scale: f32,
    last_tick: Option<TickReport>,
    supervisor: RenderSupervisor,
    view_scratch: ViewScratch,
    pending_requests: Vec<Request>,
}

/// Editable copy of the selected node's fields.
struct RenameDraft {
    node_id: String,
    name: String,
    weight: f32,
    is_recommendation: bool,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    quadtree_cells: Vec<QuadtreeCell>,
}

/// Work the panels asked for; the app turns these into worker threads once
/// the frame's UI borrows are released.
enum Request {
    ChatReply,
    BackgroundMindMap { fingerprint: String },
    FullAnalysis,
}

impl DecisionApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: Config,
        collaborator: Result<Arc<dyn Collaborator>, String>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let (collaborator, offline_reason) = match collaborator {
            Ok(collaborator) => (Some(collaborator), None),
            Err(reason) => {
                warn!("running without a structuring collaborator: {reason}");
                (None, Some(reason))
            }
        };

        Self {
            model: ViewModel::new(&config, offline_reason),
            collaborator,
            config,
            events_tx,
            events_rx,
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => self.model.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("worker channel disconnected");
                    break;
                }
            }
        }
    }

    fn dispatch_requests(&mut self) {
        let requests = std::mem::take(&mut self.model.pending_requests);
        let Some(collaborator) = self.collaborator.clone() else {
            return;
        };

        for request in requests {
            let tx = self.events_tx.clone();
            let collaborator = Arc::clone(&collaborator);
            let messages = self.model.session.messages().to_vec();
            match request {
                Request::ChatReply => {
                    let max_tokens = self.config.chat_max_tokens;
                    self.model.chat_pending = true;
                    thread::spawn(move || {
                        let result = generate_chat_reply(collaborator.as_ref(), &messages, max_tokens)
                            .map_err(|error| error.to_string());
                        let _ = tx.send(WorkerEvent::ChatReply(result));
                    });
                }
                Request::BackgroundMindMap { fingerprint } => {
                    if !self.config.background_mind_map {
                        continue;
                    }
                    self.model.background_pending += 1;
                    thread::spawn(move || {
                        let result = generate_mind_map(collaborator.as_ref(), &messages)
                            .map_err(|error| error.to_string());
                        let _ = tx.send(WorkerEvent::MindMap {
                            fingerprint,
                            result,
                        });
                    });
                }
                Request::FullAnalysis => {
                    self.model.analysis_pending = true;
                    self.model.analysis_error = None;
                    thread::spawn(move || {
                        let result = run_full_analysis(collaborator.as_ref(), &messages)
                            .map_err(|error| error.to_string());
                        let _ = tx.send(WorkerEvent::Analysis(result));
                    });
                }
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.model.chat_pending || self.model.analysis_pending || self.model.background_pending > 0
    }
}

impl ViewModel {
    fn new(config: &Config, offline_reason: Option<String>) -> Self {
        Self {
            session: Session::new(config.layout, PhysicsConfig::default()),
            offline_reason,
            draft: String::new(),
            paste_as_assistant: false,
            chat_pending: false,
            chat_error: None,
            analysis: None,
            analysis_pending: false,
            analysis_error: None,
            background_pending: 0,
            selected: None,
            rename_draft: None,
            search: String::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: true,
            show_quadtree_overlay: false,
            charge_scale: 1.0,
            link_scale: 1.0,
            last_tick: None,
            supervisor: RenderSupervisor::default(),
            view_scratch: ViewScratch::default(),
            pending_requests: Vec::new(),
        }
    }

    fn is_online(&self) -> bool {
        self.offline_reason.is_none()
    }

    /// Records a message, applies the instant tree and queues the remote
    /// follow-ups for the new conversation.
    fn submit_message(&mut self, message: ChatMessage) {
        let from_user = message.role == Role::User;
        let fingerprint = self.session.push_message(message);
        if !self.is_online() {
            return;
        }
        if from_user {
            self.pending_requests.push(Request::ChatReply);
        }
        self.pending_requests
            .push(Request::BackgroundMindMap { fingerprint });
    }

    fn handle_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::ChatReply(result) => {
                self.chat_pending = false;
                match result {
                    Ok(text) => {
                        self.chat_error = None;
                        self.submit_message(ChatMessage::model(text));
                    }
                    Err(error) => {
                        warn!("chat reply failed: {error}");
                        self.chat_error = Some(error);
                    }
                }
            }
            WorkerEvent::MindMap {
                fingerprint,
                result,
            } => {
                self.background_pending = self.background_pending.saturating_sub(1);
                match result {
                    Ok(tree) => {
                        let outcome = self
                            .session
                            .apply_update(GraphUpdate::Background { tree, fingerprint });
                        if outcome == UpdateOutcome::Applied {
                            self.sync_selection();
                        }
                    }
                    Err(error) => warn!("background mind map failed: {error}"),
                }
            }
            WorkerEvent::Analysis(result) => {
                self.analysis_pending = false;
                match result {
                    Ok(bundle) => {
                        info!("analysis ready ({} sections)", bundle.populated_count());
                        self.analysis = Some(bundle);
                        self.analysis_error = None;
                    }
                    Err(error) => {
                        warn!("full analysis failed: {error}");
                        self.analysis_error = Some(error);
                    }
                }
            }
        }
    }

    /// Applies an edited node coming from the canvas panels.
    fn on_node_update(&mut self, updated: MindMapNode) {
        let outcome = self.session.apply_update(GraphUpdate::Edit(updated));
        if outcome != UpdateOutcome::Applied {
            warn!("edit ignored: {outcome:?}");
        }
        self.rename_draft = None;
    }

    fn set_selected(&mut self, selected: Option<String>) {
        if self.selected != selected {
            self.rename_draft = None;
        }
        self.selected = selected;
    }

    fn sync_selection(&mut self) {
        if let Some(id) = &self.selected
            && self.session.tree().find(id).is_none()
        {
            self.set_selected(None);
        }
    }

    fn set_mode(&mut self, mode: LayoutMode) {
        self.session.set_mode(mode);
    }

    fn apply_physics_scales(&mut self) {
        let base = PhysicsConfig::default();
        let config = PhysicsConfig {
            charge_strength: base.charge_strength * self.charge_scale,
            link_strength: base.link_strength * self.link_scale,
            ..self.session.layout().config()
        };
        self.session.layout_mut().set_config(config);
    }

    fn reset_view(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
        self.view_scratch = ViewScratch::default();
        self.set_selected(None);
    }
}

impl eframe::App for DecisionApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.dispatch_requests();

        self.model.show(ctx, self.is_busy());

        self.dispatch_requests();
        if self.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
