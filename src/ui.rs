use aiwriter::command::Command;
use aiwriter::host::{Dialogs, Document, FieldKind, FormSpec, FormValues, MessageKind};
use aiwriter::{Completer, Dispatcher, SettingsStore, Strings};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use eframe::egui;
use std::ops::Range;
use std::thread;

/// A command to run, with the selection as it was when the user clicked.
struct Job {
    command: Command,
    selection: String,
}

/// Worker -> UI traffic. Modal requests carry the channel the worker is
/// blocked on.
enum HostEvent {
    Message {
        title: String,
        message: String,
        kind: MessageKind,
        done: Sender<()>,
    },
    Form {
        spec: FormSpec,
        reply: Sender<Option<FormValues>>,
    },
    Replace(String),
    Finished,
}

/// The editor's selection, seen from the worker thread.
struct ChannelDocument {
    selection: String,
    events: Sender<HostEvent>,
    ctx: egui::Context,
}

impl Document for ChannelDocument {
    fn selection(&self) -> String {
        self.selection.clone()
    }

    fn replace_selection(&mut self, text: &str) {
        self.selection = text.to_string();
        let _ = self.events.send(HostEvent::Replace(text.to_string()));
        self.ctx.request_repaint();
    }
}

/// Dialogs rendered by the UI thread; each call blocks until answered.
struct ChannelDialogs {
    events: Sender<HostEvent>,
    ctx: egui::Context,
}

impl Dialogs for ChannelDialogs {
    fn show_message(&mut self, title: &str, message: &str, kind: MessageKind) {
        let (done, wait) = bounded(1);
        let event = HostEvent::Message {
            title: title.to_string(),
            message: message.to_string(),
            kind,
            done,
        };
        if self.events.send(event).is_ok() {
            self.ctx.request_repaint();
            let _ = wait.recv();
        }
    }

    fn show_form(&mut self, form: &FormSpec) -> Option<FormValues> {
        let (reply, wait) = bounded(1);
        let event = HostEvent::Form {
            spec: form.clone(),
            reply,
        };
        self.events.send(event).ok()?;
        self.ctx.request_repaint();
        wait.recv().ok().flatten()
    }
}

fn spawn_worker<S, C>(
    dispatcher: Dispatcher<S, C>,
    jobs: Receiver<Job>,
    events: Sender<HostEvent>,
    ctx: egui::Context,
) where
    S: SettingsStore + Send + 'static,
    C: Completer + Send + 'static,
{
    thread::spawn(move || {
        tracing::info!("worker: started");
        while let Ok(job) = jobs.recv() {
            let mut doc = ChannelDocument {
                selection: job.selection,
                events: events.clone(),
                ctx: ctx.clone(),
            };
            let mut dialogs = ChannelDialogs {
                events: events.clone(),
                ctx: ctx.clone(),
            };
            dispatcher.dispatch(job.command, &mut doc, &mut dialogs);
            let _ = events.send(HostEvent::Finished);
            ctx.request_repaint();
        }
        tracing::info!("worker: stopped");
    });
}

enum Modal {
    Message {
        title: String,
        message: String,
        kind: MessageKind,
        done: Sender<()>,
    },
    Form {
        spec: FormSpec,
        values: Vec<String>,
        reply: Sender<Option<FormValues>>,
    },
}

struct WriterApp {
    strings: Strings,
    text: String,
    /// Selected char range in `text`.
    selection: Range<usize>,
    busy: bool,
    modal: Option<Modal>,
    jobs: Sender<Job>,
    events: Receiver<HostEvent>,
}

fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

impl WriterApp {
    fn selected_bytes(&self) -> Range<usize> {
        let start = byte_offset(&self.text, self.selection.start);
        let end = byte_offset(&self.text, self.selection.end);
        start..end
    }

    fn trigger(&mut self, command: Command) {
        let range = self.selected_bytes();
        let selection = self.text[range].to_string();
        if self.jobs.send(Job { command, selection }).is_ok() {
            self.busy = true;
            tracing::info!(%command, "ui: command triggered");
        }
    }

    fn replace_selection(&mut self, with: &str) {
        let range = self.selected_bytes();
        let start = self.selection.start;
        self.text.replace_range(range, with);
        let end = start + with.chars().count();
        self.selection = end..end;
    }

    fn drain_events(&mut self) {
        while self.modal.is_none() {
            let Ok(event) = self.events.try_recv() else { break };
            match event {
                HostEvent::Message { title, message, kind, done } => {
                    self.modal = Some(Modal::Message { title, message, kind, done });
                }
                HostEvent::Form { spec, reply } => {
                    let values = spec.fields.iter().map(|f| f.value.clone()).collect();
                    self.modal = Some(Modal::Form { spec, values, reply });
                }
                HostEvent::Replace(text) => self.replace_selection(&text),
                HostEvent::Finished => self.busy = false,
            }
        }
    }

    fn command_label(&self, command: Command) -> String {
        match command {
            Command::Settings => self.strings.settings.clone(),
            Command::Translate => self.strings.translate.clone(),
            other => other.label(&self.strings).unwrap_or(other.id()).to_string(),
        }
    }

    fn show_modal(&mut self, ctx: &egui::Context) {
        let Some(modal) = self.modal.as_mut() else { return };
        let mut close = false;
        match modal {
            Modal::Message { title, message, kind, done } => {
                let icon = match kind {
                    MessageKind::Info => "ℹ",
                    MessageKind::Warning => "⚠",
                    MessageKind::Error => "⛔",
                };
                egui::Window::new(title.as_str())
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(icon);
                            ui.label(message.as_str());
                        });
                        if ui.button("OK").clicked() {
                            let _ = done.send(());
                            close = true;
                        }
                    });
            }
            Modal::Form { spec, values, reply } => {
                egui::Window::new(spec.title.as_str())
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        egui::Grid::new("form").num_columns(2).spacing([12.0, 8.0]).show(ui, |ui| {
                            for (field, value) in spec.fields.iter().zip(values.iter_mut()) {
                                ui.label(format!("{}:", field.label));
                                ui.add(
                                    egui::TextEdit::singleline(value)
                                        .password(field.kind == FieldKind::Secret)
                                        .desired_width(360.0),
                                );
                                ui.end_row();
                            }
                        });
                        ui.separator();
                        ui.horizontal(|ui| {
                            if ui.button("OK").clicked() {
                                let answer = spec
                                    .fields
                                    .iter()
                                    .zip(values.iter())
                                    .map(|(f, v)| (f.key.to_string(), v.clone()))
                                    .collect();
                                let _ = reply.send(Some(answer));
                                close = true;
                            }
                            if ui.button("Cancel").clicked() {
                                let _ = reply.send(None);
                                close = true;
                            }
                        });
                    });
            }
        }
        if close {
            self.modal = None;
        }
    }
}

impl eframe::App for WriterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        let idle = !self.busy && self.modal.is_none();

        egui::TopBottomPanel::top("commands").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for command in Command::ALL {
                    let label = self.command_label(command);
                    if ui.add_enabled(idle, egui::Button::new(label)).clicked() {
                        self.trigger(command);
                    }
                }
                if self.busy && self.modal.is_none() {
                    ui.spinner();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(idle, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        let output = egui::TextEdit::multiline(&mut self.text)
                            .desired_rows(24)
                            .desired_width(f32::INFINITY)
                            .show(ui);
                        if let Some(range) = output.cursor_range {
                            let a = range.primary.ccursor.index;
                            let b = range.secondary.ccursor.index;
                            self.selection = a.min(b)..a.max(b);
                        }
                    });
            });
        });

        self.show_modal(ctx);
    }
}

/// Run the editor window on the main thread (blocks until it closes).
pub fn run<S, C>(dispatcher: Dispatcher<S, C>) -> anyhow::Result<()>
where
    S: SettingsStore + Send + 'static,
    C: Completer + Send + 'static,
{
    let strings = dispatcher.strings().clone();
    let (job_tx, job_rx) = unbounded::<Job>();
    let (event_tx, event_rx) = unbounded::<HostEvent>();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("AIWriter")
            .with_inner_size([900.0, 640.0]),
        ..Default::default()
    };

    tracing::info!("ui: starting event loop");
    eframe::run_native(
        "AIWriter",
        native_options,
        Box::new(move |cc| {
            spawn_worker(dispatcher, job_rx, event_tx, cc.egui_ctx.clone());
            Box::new(WriterApp {
                strings,
                text: String::new(),
                selection: 0..0,
                busy: false,
                modal: None,
                jobs: job_tx,
                events: event_rx,
            })
        }),
    )
    .map_err(|e| anyhow::anyhow!("ui error: {e}"))?;
    tracing::info!("ui: event loop exited");
    Ok(())
}
