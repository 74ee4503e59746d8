// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Activity-result routing.
//
// Request codes never leave this crate: the launch sites tag each request, and
// incoming `onActivityResult` callbacks are turned back into an
// `ActivityResult` here before anything else sees them.

use std::sync::Mutex;

use snaplift_core::types::{ActivityResult, ImageReference};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Request code for the camera capture intent.
pub(crate) const REQUEST_IMAGE_CAPTURE: i32 = 0x534C_0001; // "SL" + 1
/// Request code for the gallery picker intent.
pub(crate) const REQUEST_PICK_IMAGE: i32 = 0x534C_0002;

/// `android.app.Activity.RESULT_OK`
pub(crate) const RESULT_OK: i32 = -1;

/// Turn a raw activity callback into the tagged result its launch site expects.
pub(crate) fn classify(request_code: i32, result_code: i32, data_uri: Option<String>) -> ActivityResult {
    match request_code {
        REQUEST_PICK_IMAGE => ActivityResult::Gallery(data_uri.map(ImageReference::Content)),
        REQUEST_IMAGE_CAPTURE => ActivityResult::Camera {
            success: result_code == RESULT_OK,
        },
        other => ActivityResult::Unrecognized(other),
    }
}

static SINK: Mutex<Option<mpsc::UnboundedSender<ActivityResult>>> = Mutex::new(None);

/// Register the receiving end for activity results. A later subscription
/// replaces the earlier one.
#[cfg_attr(not(target_os = "android"), allow(dead_code))]
pub(crate) fn subscribe() -> mpsc::UnboundedReceiver<ActivityResult> {
    let (tx, rx) = mpsc::unbounded_channel();
    match SINK.lock() {
        Ok(mut sink) => *sink = Some(tx),
        Err(poisoned) => *poisoned.into_inner() = Some(tx),
    }
    rx
}

/// Classify and forward one activity callback. Returns whether anybody was
/// listening.
#[cfg_attr(not(target_os = "android"), allow(dead_code))]
pub(crate) fn deliver(request_code: i32, result_code: i32, data_uri: Option<String>) -> bool {
    let result = classify(request_code, result_code, data_uri);
    debug!(request_code, result_code, ?result, "activity result received");
    let sink = match SINK.lock() {
        Ok(sink) => sink,
        Err(poisoned) => poisoned.into_inner(),
    };
    let delivered = sink.as_ref().is_some_and(|tx| tx.send(result).is_ok());
    if !delivered {
        warn!(request_code, "activity result dropped: no subscriber");
    }
    delivered
}
