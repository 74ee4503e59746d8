// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Snaplift: capture or pick a photo and upload it to object storage.
//
// Entry point. Initialises logging and backend services, then launches the
// Dioxus UI on its single screen.

mod controller;
mod pages;
mod services;
mod state;

use dioxus::prelude::*;

use pages::screen::Screen;
use services::app_services::AppServices;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Snaplift starting");

    dioxus::launch(app);
}

/// Root component.
fn app() -> Element {
    let svc = use_hook(|| match AppServices::init() {
        Ok(s) => {
            tracing::info!("backend services initialised");
            s
        }
        Err(e) => {
            tracing::error!(error = %e, "service init failed, using in-memory bucket");
            AppServices::fallback()
        }
    });

    use_context_provider(|| svc.clone());

    rsx! {
        Screen {}
    }
}
