/* 
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. 
If a copy of the MPL was not distributed with this file, 
You can obtain one at https://mozilla.org/MPL/2.0/. 
*/

//! This crate extends the Pluggable AI library with a plugin that streamlines running agents 
//! inside an existing Bevy application (the "native AI" integration style).
//! 
//! The plugin handles the basic gruntwork - setting up the shared Resources and the Systems 
//! that set up freshly spawned agents and tick them every frame.
//! 
//! What's left for you to do after adding it in is spawning entities with an `AiAgent` 
//! Component, wired up to your engine's navigation, perception and animation services.

mod agent;
mod plugin;

pub use agent::*;
pub use plugin::*;
