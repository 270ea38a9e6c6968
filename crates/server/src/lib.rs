/* 
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. 
If a copy of the MPL was not distributed with this file, 
You can obtain one at https://mozilla.org/MPL/2.0/. 
*/
//! This crate provides tooling to run Pluggable AI agents as an "AI Server" for non-Bevy applications 
//! (or Bevy applications who want to keep their Worlds separate from the AI World).
//! 
//! `AiServer` owns a set of agents and drives them tick-by-tick from an external loop; 
//! `create_app()` builds a headless Bevy App running the same agents as ECS Components instead.

mod api;
mod server;

pub use api::*;
pub use server::*;
