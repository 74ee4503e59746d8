// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each trait method invokes the corresponding
// Android API through JNI calls into the ART runtime.
//
// Gallery and camera are started with `startActivityForResult`. The host
// Activity forwards its `onActivityResult` callback to
// `nativeOnActivityResult` below, which classifies it and pushes it onto the
// channel handed out by `take_activity_results`.

#![cfg(target_os = "android")]

use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use jni::objects::{JObject, JString, JValue};
use jni::sys::{jint, jsize};
use jni::{JNIEnv, JavaVM};

use snaplift_core::error::{Result, SnapliftError};
use snaplift_core::types::{ActivityResult, CapturedFilePath, Permission, PermissionStatus};
use tokio::sync::mpsc;

use crate::results::{self, REQUEST_IMAGE_CAPTURE, REQUEST_PICK_IMAGE};
use crate::traits::*;

/// `PackageManager.PERMISSION_GRANTED`
const PERMISSION_GRANTED: i32 = 0;

/// Request code for the runtime permission prompt.
const REQUEST_PERMISSIONS: i32 = 0x534C_0010;

/// `FLAG_GRANT_READ_URI_PERMISSION | FLAG_GRANT_WRITE_URI_PERMISSION`
const GRANT_READ_WRITE: i32 = 0x0000_0003;

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

static VM: OnceLock<JavaVM> = OnceLock::new();

fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| SnapliftError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
    let _ = VM.set(vm);
    VM.get()
        .ok_or_else(|| SnapliftError::Bridge("JavaVM not initialised".into()))
}

/// Obtain a [`JNIEnv`] for the current thread, attaching it if needed.
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| SnapliftError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// The hosting `Activity` as a [`JObject`].
fn activity() -> Result<JObject<'static>> {
    let ptr = ndk_context::android_context().context();
    if ptr.is_null() {
        return Err(SnapliftError::Bridge(
            "Android context is null, native activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

fn jni_err(context: &str, e: jni::errors::Error) -> SnapliftError {
    SnapliftError::Bridge(format!("{context}: {e}"))
}

fn jstring<'a>(env: &mut JNIEnv<'a>, value: &str) -> Result<JString<'a>> {
    env.new_string(value)
        .map_err(|e| jni_err("new_string", e))
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the platform bridge.
pub struct AndroidBridge {
    /// Argument to `Context.getExternalFilesDir` for captures.
    pictures_dir_name: String,
    results_taken: AtomicBool,
}

impl AndroidBridge {
    /// Does not touch JNI; the first JNI call happens when a trait method is
    /// invoked.
    pub fn new(pictures_dir_name: impl Into<String>) -> Self {
        Self {
            pictures_dir_name: pictures_dir_name.into(),
            results_taken: AtomicBool::new(false),
        }
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }

    fn take_activity_results(&self) -> Option<mpsc::UnboundedReceiver<ActivityResult>> {
        if self.results_taken.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(results::subscribe())
    }
}

// ---------------------------------------------------------------------------
// NativePermissions: Activity.checkSelfPermission / requestPermissions
// ---------------------------------------------------------------------------

impl NativePermissions for AndroidBridge {
    fn check_permissions(
        &self,
        permissions: &[Permission],
    ) -> Result<Vec<(Permission, PermissionStatus)>> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let mut report = Vec::with_capacity(permissions.len());
        for permission in permissions {
            let j_name = jstring(&mut env, permission.android_name())?;
            let state = env
                .call_method(
                    &activity,
                    "checkSelfPermission",
                    "(Ljava/lang/String;)I",
                    &[JValue::Object(&j_name)],
                )
                .map_err(|e| jni_err("checkSelfPermission", e))?
                .i()
                .map_err(|e| jni_err("checkSelfPermission->i", e))?;

            let status = if state == PERMISSION_GRANTED {
                PermissionStatus::Granted
            } else {
                let rationale = env
                    .call_method(
                        &activity,
                        "shouldShowRequestPermissionRationale",
                        "(Ljava/lang/String;)Z",
                        &[JValue::Object(&j_name)],
                    )
                    .map_err(|e| jni_err("shouldShowRequestPermissionRationale", e))?
                    .z()
                    .map_err(|e| jni_err("shouldShowRequestPermissionRationale->z", e))?;
                if rationale {
                    PermissionStatus::RationaleRequired
                } else {
                    PermissionStatus::Denied
                }
            };
            report.push((*permission, status));
        }

        tracing::debug!(?report, "Android: permission check");
        Ok(report)
    }

    fn request_permissions(&self, permissions: &[Permission]) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let string_class = env
            .find_class("java/lang/String")
            .map_err(|e| jni_err("find_class(String)", e))?;
        let names = env
            .new_object_array(permissions.len() as jsize, &string_class, &JObject::null())
            .map_err(|e| jni_err("new_object_array(permissions)", e))?;
        for (i, permission) in permissions.iter().enumerate() {
            let j_name = jstring(&mut env, permission.android_name())?;
            env.set_object_array_element(&names, i as jsize, j_name)
                .map_err(|e| jni_err("set_object_array_element", e))?;
        }

        env.call_method(
            &activity,
            "requestPermissions",
            "([Ljava/lang/String;I)V",
            &[JValue::Object(&names), JValue::Int(REQUEST_PERMISSIONS)],
        )
        .map_err(|e| jni_err("requestPermissions", e))?;

        tracing::info!(count = permissions.len(), "Android: permission prompt dispatched");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NativeGallery: Intent ACTION_PICK on MediaStore images
// ---------------------------------------------------------------------------

impl NativeGallery for AndroidBridge {
    fn launch_gallery(&self, mime_type: &str) -> Result<Launch> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!(mime = mime_type, "Android: launching ACTION_PICK intent");

        let images_uri: JObject = env
            .get_static_field(
                "android/provider/MediaStore$Images$Media",
                "EXTERNAL_CONTENT_URI",
                "Landroid/net/Uri;",
            )
            .map_err(|e| jni_err("MediaStore.Images.Media.EXTERNAL_CONTENT_URI", e))?
            .l()
            .map_err(|e| jni_err("EXTERNAL_CONTENT_URI->l", e))?;

        let j_action = jstring(&mut env, "android.intent.action.PICK")?;
        let intent: JObject = env
            .new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&j_action)],
            )
            .map_err(|e| jni_err("new Intent(PICK)", e))?;

        let j_mime = jstring(&mut env, mime_type)?;
        env.call_method(
            &intent,
            "setDataAndType",
            "(Landroid/net/Uri;Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&images_uri), JValue::Object(&j_mime)],
        )
        .map_err(|e| jni_err("setDataAndType", e))?;

        start_for_result(&mut env, &activity, &intent, REQUEST_PICK_IMAGE)
    }
}

// ---------------------------------------------------------------------------
// NativeCamera: Intent ACTION_IMAGE_CAPTURE into a FileProvider URI
// ---------------------------------------------------------------------------

impl NativeCamera for AndroidBridge {
    fn launch_camera(&self, output: &CapturedFilePath, authority: &str) -> Result<Launch> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!(
            path = %output.as_path().display(),
            "Android: launching ACTION_IMAGE_CAPTURE intent"
        );

        let j_path = jstring(&mut env, &output.as_path().to_string_lossy())?;
        let photo_file: JObject = env
            .new_object(
                "java/io/File",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&j_path)],
            )
            .map_err(|e| jni_err("new File(capture)", e))?;

        let j_authority = jstring(&mut env, authority)?;
        let photo_uri: JObject = env
            .call_static_method(
                "androidx/core/content/FileProvider",
                "getUriForFile",
                "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
                &[
                    JValue::Object(&activity),
                    JValue::Object(&j_authority),
                    JValue::Object(&photo_file),
                ],
            )
            .map_err(|e| jni_err("FileProvider.getUriForFile", e))?
            .l()
            .map_err(|e| jni_err("getUriForFile->l", e))?;

        let j_action = jstring(&mut env, "android.media.action.IMAGE_CAPTURE")?;
        let intent: JObject = env
            .new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&j_action)],
            )
            .map_err(|e| jni_err("new Intent(IMAGE_CAPTURE)", e))?;

        // MediaStore.EXTRA_OUTPUT
        let j_extra_output = jstring(&mut env, "output")?;
        env.call_method(
            &intent,
            "putExtra",
            "(Ljava/lang/String;Landroid/os/Parcelable;)Landroid/content/Intent;",
            &[JValue::Object(&j_extra_output), JValue::Object(&photo_uri)],
        )
        .map_err(|e| jni_err("putExtra(EXTRA_OUTPUT)", e))?;

        env.call_method(
            &intent,
            "addFlags",
            "(I)Landroid/content/Intent;",
            &[JValue::Int(GRANT_READ_WRITE)],
        )
        .map_err(|e| jni_err("addFlags(camera)", e))?;

        start_for_result(&mut env, &activity, &intent, REQUEST_IMAGE_CAPTURE)
    }
}

/// Dispatch `intent` if some activity can handle it.
fn start_for_result(
    env: &mut JNIEnv<'_>,
    activity: &JObject<'_>,
    intent: &JObject<'_>,
    request_code: i32,
) -> Result<Launch> {
    let package_manager: JObject = env
        .call_method(
            activity,
            "getPackageManager",
            "()Landroid/content/pm/PackageManager;",
            &[],
        )
        .map_err(|e| jni_err("getPackageManager", e))?
        .l()
        .map_err(|e| jni_err("getPackageManager->l", e))?;

    let component: JObject = env
        .call_method(
            intent,
            "resolveActivity",
            "(Landroid/content/pm/PackageManager;)Landroid/content/ComponentName;",
            &[JValue::Object(&package_manager)],
        )
        .map_err(|e| jni_err("resolveActivity", e))?
        .l()
        .map_err(|e| jni_err("resolveActivity->l", e))?;

    if component.is_null() {
        tracing::warn!(request_code, "Android: no activity can handle intent");
        return Ok(Launch::NoHandler);
    }

    env.call_method(
        activity,
        "startActivityForResult",
        "(Landroid/content/Intent;I)V",
        &[JValue::Object(intent), JValue::Int(request_code)],
    )
    .map_err(|e| jni_err("startActivityForResult", e))?;

    tracing::info!(request_code, "Android: intent dispatched, awaiting onActivityResult");
    Ok(Launch::Started)
}

// ---------------------------------------------------------------------------
// NativeContent: ContentResolver.openInputStream
// ---------------------------------------------------------------------------

impl NativeContent for AndroidBridge {
    fn read_content(&self, uri_string: &str) -> Result<Vec<u8>> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!(uri = uri_string, "Android: reading content URI");

        let j_uri_str = jstring(&mut env, uri_string)?;
        let uri_obj: JObject = env
            .call_static_method(
                "android/net/Uri",
                "parse",
                "(Ljava/lang/String;)Landroid/net/Uri;",
                &[JValue::Object(&j_uri_str)],
            )
            .map_err(|e| jni_err("Uri.parse", e))?
            .l()
            .map_err(|e| jni_err("Uri.parse->l", e))?;

        let resolver: JObject = env
            .call_method(
                &activity,
                "getContentResolver",
                "()Landroid/content/ContentResolver;",
                &[],
            )
            .map_err(|e| jni_err("getContentResolver", e))?
            .l()
            .map_err(|e| jni_err("getContentResolver->l", e))?;

        let input_stream: JObject = env
            .call_method(
                &resolver,
                "openInputStream",
                "(Landroid/net/Uri;)Ljava/io/InputStream;",
                &[JValue::Object(&uri_obj)],
            )
            .map_err(|e| jni_err("openInputStream", e))?
            .l()
            .map_err(|e| jni_err("openInputStream->l", e))?;

        if input_stream.is_null() {
            return Err(SnapliftError::Bridge(format!(
                "ContentResolver returned null InputStream for URI: {uri_string}"
            )));
        }

        let baos: JObject = env
            .new_object("java/io/ByteArrayOutputStream", "()V", &[])
            .map_err(|e| jni_err("new ByteArrayOutputStream", e))?;
        let buffer = env
            .new_byte_array(8192)
            .map_err(|e| jni_err("new_byte_array(8192)", e))?;

        loop {
            let bytes_read = env
                .call_method(&input_stream, "read", "([B)I", &[JValue::Object(&buffer)])
                .map_err(|e| jni_err("InputStream.read", e))?
                .i()
                .map_err(|e| jni_err("InputStream.read->i", e))?;
            if bytes_read < 0 {
                break;
            }
            env.call_method(
                &baos,
                "write",
                "([BII)V",
                &[
                    JValue::Object(&buffer),
                    JValue::Int(0),
                    JValue::Int(bytes_read),
                ],
            )
            .map_err(|e| jni_err("ByteArrayOutputStream.write", e))?;
        }

        env.call_method(&input_stream, "close", "()V", &[])
            .map_err(|e| jni_err("InputStream.close", e))?;

        let java_bytes: JObject = env
            .call_method(&baos, "toByteArray", "()[B", &[])
            .map_err(|e| jni_err("toByteArray", e))?
            .l()
            .map_err(|e| jni_err("toByteArray->l", e))?;
        let bytes = env
            .convert_byte_array(jni::objects::JByteArray::from(java_bytes))
            .map_err(|e| jni_err("convert_byte_array", e))?;

        tracing::info!(uri = uri_string, bytes = bytes.len(), "Android: content read");
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// NativeStorageDirs: Context.getExternalFilesDir
// ---------------------------------------------------------------------------

impl NativeStorageDirs for AndroidBridge {
    fn pictures_dir(&self) -> Result<PathBuf> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let j_type = jstring(&mut env, &self.pictures_dir_name)?;
        let dir: JObject = env
            .call_method(
                &activity,
                "getExternalFilesDir",
                "(Ljava/lang/String;)Ljava/io/File;",
                &[JValue::Object(&j_type)],
            )
            .map_err(|e| jni_err("getExternalFilesDir", e))?
            .l()
            .map_err(|e| jni_err("getExternalFilesDir->l", e))?;
        if dir.is_null() {
            return Err(SnapliftError::Bridge(
                "external storage is not mounted".into(),
            ));
        }

        let j_path: JObject = env
            .call_method(&dir, "getAbsolutePath", "()Ljava/lang/String;", &[])
            .map_err(|e| jni_err("getAbsolutePath", e))?
            .l()
            .map_err(|e| jni_err("getAbsolutePath->l", e))?;
        let path: String = env
            .get_string(&JString::from(j_path))
            .map_err(|e| jni_err("get_string(path)", e))?
            .into();

        Ok(PathBuf::from(path))
    }
}

// ---------------------------------------------------------------------------
// Activity callback entry point
// ---------------------------------------------------------------------------

/// Called from `SnapliftActivity.onActivityResult`:
///
/// ```java
/// private static native void nativeOnActivityResult(int requestCode, int resultCode, String data);
/// ```
///
/// `data` is `intent.getData().toString()`, or `null` when the intent carried
/// no URI.
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_hyperpolymath_snaplift_SnapliftActivity_nativeOnActivityResult(
    mut env: JNIEnv<'_>,
    _class: JObject<'_>,
    request_code: jint,
    result_code: jint,
    data: JString<'_>,
) {
    let data_uri = if data.is_null() {
        None
    } else {
        match env.get_string(&data) {
            Ok(value) => Some(String::from(value)),
            Err(e) => {
                tracing::error!(error = %e, "Android: unreadable activity result data");
                None
            }
        }
    };
    results::deliver(request_code, result_code, data_uri);
}
