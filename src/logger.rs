/*
 * This file is part of monid.
 *
 * Copyright (C) 2025 monid contributors
 *
 * monid is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * monid is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with monid. If not, see <https://www.gnu.org/licenses/>.
 */

//! Logging setup on top of `tracing-subscriber`

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, checked before `RUST_LOG`
pub const LOG_ENV: &str = "MONID_LOG";

/// Pick the filter directive: `MONID_LOG`, then `RUST_LOG`, then `default_level`
pub fn log_directive(default_level: &str) -> String {
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_level.to_string())
}

/// Build the filter, falling back to `default_level` when the directive does not parse
pub fn build_filter(default_level: &str) -> EnvFilter {
    let directive = log_directive(default_level);
    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter {:?}: {}, using {}", directive, e, default_level);
        EnvFilter::new(default_level)
    })
}

/// Install a stderr subscriber. Returns false if one was already installed.
pub fn init_logging(default_level: &str) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(default_level))
        .try_init()
        .is_ok();

    if installed {
        debug!(filter = %log_directive(default_level), "Logging initialized");
    }
    installed
}
