// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The single screen: preview area, Choose and Upload buttons, the source
// choice modal, the permission rationale dialog, the upload progress overlay,
// and a transient toast.

use std::time::Duration;

use dioxus::prelude::*;

use snaplift_core::notices::Notice;
use snaplift_core::types::{AcquisitionSource, PreviewSize};

use crate::controller::{GateOutcome, Preview, ScreenUpdate, UploadFeedback, drive_upload};
use crate::services::app_services::AppServices;

const TOAST_DURATION: Duration = Duration::from_secs(3);

const BUTTON_STYLE: &str = "flex: 1; padding: 14px; border-radius: 10px; border: none; background: #007aff; color: white; font-size: 16px;";
const DIALOG_BACKDROP: &str = "position: fixed; inset: 0; background: rgba(0,0,0,0.4); display: flex; align-items: center; justify-content: center;";
const DIALOG_STYLE: &str = "background: white; border-radius: 12px; padding: 20px; min-width: 260px; max-width: 80%;";

/// Show `notice` briefly. A newer notice is not cleared by an older timer.
fn show_toast(mut toast: Signal<Option<Notice>>, notice: Notice) {
    toast.set(Some(notice));
    spawn(async move {
        tokio::time::sleep(TOAST_DURATION).await;
        if *toast.peek() == Some(notice) {
            toast.set(None);
        }
    });
}

/// Upload feedback rendered through the screen's signals.
#[derive(Clone, Copy)]
struct ScreenFeedback {
    progress: Signal<Option<String>>,
    toast: Signal<Option<Notice>>,
}

impl UploadFeedback for ScreenFeedback {
    fn show_progress(&mut self, message: &str) {
        self.progress.set(Some(message.to_string()));
    }

    fn update_progress(&mut self, message: &str) {
        self.progress.set(Some(message.to_string()));
    }

    fn dismiss_progress(&mut self) {
        self.progress.set(None);
    }

    fn toast(&mut self, notice: Notice) {
        show_toast(self.toast, notice);
    }
}

#[component]
pub fn Screen() -> Element {
    let svc = use_context::<AppServices>();
    let mut controller = use_signal(|| svc.controller());

    let mut preview_size = use_signal(|| PreviewSize::new(0, 0));
    let mut preview = use_signal(|| Option::<Preview>::None);
    let toast = use_signal(|| Option::<Notice>::None);
    let progress = use_signal(|| Option::<String>::None);
    let mut show_choice = use_signal(|| false);
    let mut show_rationale = use_signal(|| false);

    let mut apply = move |update: ScreenUpdate| {
        if let Some(image) = update.preview {
            preview.set(Some(image));
        }
        if let Some(notice) = update.notice {
            show_toast(toast, notice);
        }
        if update.show_rationale {
            show_rationale.set(true);
        }
    };

    // Permission gate, once per screen.
    use_effect(move || match controller.write().run_permission_gate() {
        Ok(GateOutcome::ShowRationale) => show_rationale.set(true),
        Ok(outcome) => tracing::debug!(?outcome, "permission gate"),
        Err(e) => tracing::warn!(error = %e, "permission gate failed"),
    });

    // Results of activities that finish after their launch call returned.
    use_future(move || {
        let results = controller.read().activity_results();
        async move {
            let Some(mut results) = results else {
                return;
            };
            while let Some(result) = results.recv().await {
                let size = *preview_size.peek();
                let update = controller.write().on_activity_result(result, size);
                apply(update);
            }
        }
    });

    let mut choose = move |source: AcquisitionSource| {
        show_choice.set(false);
        let size = *preview_size.peek();
        let update = controller.write().choose(source, size);
        apply(update);
    };

    rsx! {
        div {
            style: "display: flex; flex-direction: column; height: 100vh; font-family: system-ui, -apple-system, sans-serif;",

            // Preview surface
            div {
                style: "flex: 1; margin: 16px; border: 1px solid #e0e0e0; border-radius: 12px; background: #fafafa; display: flex; align-items: center; justify-content: center; overflow: hidden;",
                onmounted: move |evt: MountedEvent| async move {
                    if let Ok(rect) = evt.get_client_rect().await {
                        let size = PreviewSize::new(rect.size.width as u32, rect.size.height as u32);
                        tracing::debug!(width = size.width, height = size.height, "preview surface laid out");
                        preview_size.set(size);
                    }
                },
                if let Some(ref image) = *preview.read() {
                    img {
                        src: image.src().to_string(),
                        style: "max-width: 100%; max-height: 100%; object-fit: contain;",
                    }
                } else {
                    p { style: "color: #aaa;", "No image selected." }
                }
            }

            // Actions
            div { style: "display: flex; gap: 12px; padding: 0 16px 16px;",
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| show_choice.set(true),
                    "Choose"
                }
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        let mut feedback = ScreenFeedback { progress, toast };
                        let task = controller.read().begin_upload(&mut feedback);
                        if let Some(task) = task {
                            spawn(async move {
                                drive_upload(task, &mut feedback).await;
                            });
                        }
                    },
                    "Upload"
                }
            }

            // Source choice
            if *show_choice.read() {
                div { style: DIALOG_BACKDROP,
                    onclick: move |_| show_choice.set(false),
                    div { style: DIALOG_STYLE,
                        onclick: move |evt| evt.stop_propagation(),
                        p { style: "font-weight: 600; margin-top: 0;", "Take Photo or Choose from Gallery" }
                        div { style: "display: flex; flex-direction: column; gap: 8px;",
                            button {
                                style: BUTTON_STYLE,
                                onclick: move |_| choose(AcquisitionSource::Gallery),
                                "Choose from Gallery"
                            }
                            button {
                                style: BUTTON_STYLE,
                                onclick: move |_| choose(AcquisitionSource::Camera),
                                "Take from Camera"
                            }
                        }
                    }
                }
            }

            // Permission rationale
            if *show_rationale.read() {
                div { style: DIALOG_BACKDROP,
                    div { style: DIALOG_STYLE,
                        h3 { style: "margin-top: 0;", "Permissions Required" }
                        p { "Permissions for this Application" }
                        div { style: "display: flex; justify-content: flex-end; gap: 8px;",
                            button {
                                style: "padding: 8px 16px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                                onclick: move |_| {
                                    show_rationale.set(false);
                                    controller.read().cancel_rationale();
                                },
                                "Cancel"
                            }
                            button {
                                style: "padding: 8px 16px; border-radius: 8px; border: none; background: #007aff; color: white;",
                                onclick: move |_| {
                                    show_rationale.set(false);
                                    if let Err(e) = controller.read().accept_rationale() {
                                        tracing::warn!(error = %e, "permission request failed");
                                    }
                                },
                                "Ok"
                            }
                        }
                    }
                }
            }

            // Upload progress
            if let Some(ref message) = *progress.read() {
                div { style: DIALOG_BACKDROP,
                    div { style: DIALOG_STYLE,
                        p { style: "margin: 0; text-align: center;", "{message}" }
                    }
                }
            }

            // Toast
            if let Some(notice) = *toast.read() {
                div { style: "position: fixed; bottom: 32px; left: 50%; transform: translateX(-50%); background: #333; color: white; padding: 10px 18px; border-radius: 20px; font-size: 14px;",
                    "{notice}"
                }
            }
        }
    }
}
