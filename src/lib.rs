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

//! monid - Monitor identity and capability resolution
//!
//! Re-exports the engine from `mn-core` and adds process-level logging setup.

pub mod logger;

pub use mn_core::*;
