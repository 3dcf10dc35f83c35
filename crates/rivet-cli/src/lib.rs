// Copyright 2025 Rivet Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Rivet CLI
//!
//! Command-line front end for the Rivet RPC compiler.
//!
//! ## Architecture
//!
//! The `rivet` binary parses arguments with `argh` and dispatches to the
//! functions in [`commands`], which drive `rivet-codegen` and
//! `rivet-client`.
//!
//! ## Key Commands
//!
//! - `rivet generate`: Compile a service descriptor into Rust sources
//! - `rivet routes`: List the routes a descriptor defines
//! - `rivet call`: Make a JSON RPC call (outputs raw JSON for scripting)

pub mod commands;
