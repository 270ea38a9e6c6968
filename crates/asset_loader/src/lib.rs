/* 
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. 
If a copy of the MPL was not distributed with this file, 
You can obtain one at https://mozilla.org/MPL/2.0/. 
*/

//! This crate extends the Pluggable AI library with a solution for loading state graphs 
//! (and agent profiles) from any available Bevy [`AssetSource`](https://docs.rs/bevy/latest/bevy/asset/io/struct.AssetSource.html), 
//! in any of several file formats selected by cargo features.
//! 
//! Definitions can also be read straight from bytes with `load_from_slice()`, 
//! for hosts that do not run Bevy's asset system.

mod definitions;
mod loader;

pub use definitions::*;
pub use loader::*;
