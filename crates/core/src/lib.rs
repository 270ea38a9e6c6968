/* 
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. 
If a copy of the MPL was not distributed with this file, 
You can obtain one at https://mozilla.org/MPL/2.0/. 
*/
pub mod actions;
pub mod blackboard;
pub mod controller;
pub mod decisions;
pub mod errors;
pub mod events;
pub mod game_services;
pub mod identifiers;
pub mod services;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod thread_safe_wrapper;
pub mod types;
