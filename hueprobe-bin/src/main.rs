//! Show the dominant color in the center of a webcam feed as a live swatch.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod camera;
mod cli;
mod convert;
mod error;
mod logging;
mod window;

use std::process::ExitCode;

use camera::Camera;
use clap::Parser;
use cli::Options;
use error::Error;
use hueprobe::{Session, StopReason};
use window::Window;

fn main() -> ExitCode {
    let options = Options::parse();
    logging::init(options.verbose);

    // Returning Result<_> uses Debug printing instead of Display
    if let Err(e) = run(&options) {
        tracing::error!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Open the camera and window, then process frames until quit or failure
fn run(options: &Options) -> Result<(), Error> {
    let camera = Camera::open(options.device, options.width, options.height)?;
    let window = Window::new(&options.window)?;

    let summary = Session::new(camera, window)
        .with_kmeans(options.kmeans())
        .with_overlay(options.overlay())
        .with_quit_key(options.quit_key)
        .with_delay(options.delay())
        .run();

    let result = match summary.reason {
        StopReason::Quit | StopReason::AlreadyStopped => Ok(()),
        // the session is over, but the camera and window were still released cleanly
        StopReason::ReadFailed(e) => {
            tracing::error!("Failed to grab frame: {e}");
            Ok(())
        }
        StopReason::DisplayFailed(e) => Err(e),
    };

    tracing::info!(frames = summary.frames, "Video stream stopped.");

    result
}
