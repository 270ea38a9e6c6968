use core::marker::PhantomData;
use core::time::Duration;
use std::collections::HashMap;

use bevy::asset::{AssetLoader, LoadContext, io::Reader};
use bevy::prelude::*;
use serde::de::DeserializeOwned;

use pluggable_ai_core::errors::ConfigError;
use pluggable_ai_core::state::StateGraph;
use pluggable_ai_core::types::{StateGraphRef, ThreadSafeRef};

use crate::definitions::{AgentProfile, StateGraphDefinition};

/// How long a requested state graph may take to load before we give up on it.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(2);


pub trait StateGraphLoaderBackend: Send + Sync + 'static {
    /// What type does the loader return as a loader on error.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Must be able to load from a byte array.
    fn from_slice<T: DeserializeOwned>(v: &[u8]) -> core::result::Result<T, Self::Error>;

    /// What extensions should be read for this (by default)?
    fn extensions() -> &'static [&'static str] {
        &[]
    }
}

#[cfg(any(feature = "json_support", test))]
pub mod json_support {
    use super::{DeserializeOwned, StateGraphLoaderBackend};

    #[derive(Default)]
    pub struct JsonStateGraphLoader;

    impl StateGraphLoaderBackend for JsonStateGraphLoader {
        type Error = serde_json::Error;

        fn from_slice<T: DeserializeOwned>(v: &[u8]) -> core::result::Result<T, Self::Error> {
            serde_json::from_slice(v)
        }

        fn extensions() -> &'static [&'static str] {
            &["json"]
        }
    }
}


#[cfg(any(feature = "toml_support"))]
pub mod toml_support {
    use super::{DeserializeOwned, StateGraphLoaderBackend};

    #[derive(Default)]
    pub struct TomlStateGraphLoader;

    impl StateGraphLoaderBackend for TomlStateGraphLoader {
        type Error = toml::de::Error;

        fn from_slice<T: DeserializeOwned>(v: &[u8]) -> core::result::Result<T, Self::Error> {
            toml::from_slice(v)
        }

        fn extensions() -> &'static [&'static str] {
            &["toml"]
        }
    }
}


#[cfg(any(feature = "msgpack_support"))]
pub mod msgpack_support {
    use super::{DeserializeOwned, StateGraphLoaderBackend};

    #[derive(Default)]
    pub struct MsgpackStateGraphLoader;

    impl StateGraphLoaderBackend for MsgpackStateGraphLoader {
        type Error = rmp_serde::decode::Error;

        fn from_slice<T: DeserializeOwned>(v: &[u8]) -> core::result::Result<T, Self::Error> {
            rmp_serde::decode::from_slice(v)
        }

        fn extensions() -> &'static [&'static str] {
            &["msgpack"]
        }
    }
}


#[cfg(any(feature = "cbor_support"))]
pub mod cbor_support {
    use super::{DeserializeOwned, StateGraphLoaderBackend};

    #[derive(Default)]
    pub struct CborStateGraphLoader;

    impl StateGraphLoaderBackend for CborStateGraphLoader {
        type Error = ciborium::de::Error<std::io::Error>;

        fn from_slice<T: DeserializeOwned>(v: &[u8]) -> core::result::Result<T, Self::Error> {
            ciborium::de::from_reader(v)
        }

        fn extensions() -> &'static [&'static str] {
            &["cbor"]
        }
    }
}


#[cfg(any(feature = "ron_support", test))]
pub mod ron_support {
    use super::{DeserializeOwned, StateGraphLoaderBackend};

    #[derive(Default)]
    pub struct RonStateGraphLoader;

    impl StateGraphLoaderBackend for RonStateGraphLoader {
        type Error = ron::de::SpannedError;

        fn from_slice<T: DeserializeOwned>(v: &[u8]) -> core::result::Result<T, Self::Error> {
            ron::de::from_bytes(v)
        }

        fn extensions() -> &'static [&'static str] {
            &["ron"]
        }
    }
}


#[cfg(any(feature = "yaml_support", test))]
pub mod yaml_support {
    use super::{DeserializeOwned, StateGraphLoaderBackend};

    #[derive(Default)]
    pub struct YamlStateGraphLoader;

    impl StateGraphLoaderBackend for YamlStateGraphLoader {
        type Error = serde_saphyr::Error;

        fn from_slice<T: DeserializeOwned>(v: &[u8]) -> core::result::Result<T, Self::Error> {
            serde_saphyr::from_slice(v)
        }

        fn extensions() -> &'static [&'static str] {
            &["yaml", "yml"]
        }
    }
}


#[cfg(any(feature = "postcard_support"))]
pub mod postcard_support {
    use super::{DeserializeOwned, StateGraphLoaderBackend};

    #[derive(Default)]
    pub struct PostcardStateGraphLoader;

    impl StateGraphLoaderBackend for PostcardStateGraphLoader {
        type Error = postcard::Error;

        fn from_slice<T: DeserializeOwned>(v: &[u8]) -> core::result::Result<T, Self::Error> {
            postcard::from_bytes(v)
        }

        fn extensions() -> &'static [&'static str] {
            &["postcard"]
        }
    }
}


/// Why a state graph could not be loaded.
#[derive(Debug)]
pub enum LoadError {
    /// The bytes could not be read as a definition at all.
    Format(Box<dyn core::error::Error + Send + Sync + 'static>),
    /// The definition was read, but does not describe a valid graph.
    Config(ConfigError),
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Format(err) => write!(f, "could not parse state graph definition: {}", err),
            Self::Config(err) => write!(f, "invalid state graph definition: {}", err),
        }
    }
}

impl core::error::Error for LoadError {}

impl From<ConfigError> for LoadError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Reads a definition with the given backend, without going through Bevy's asset system.
pub fn load_definition_from_slice<B: StateGraphLoaderBackend>(v: &[u8]) -> Result<StateGraphDefinition, LoadError> {
    B::from_slice(v).map_err(|err| LoadError::Format(Box::new(err)))
}

/// Reads and resolves a state graph with the given backend, without going through Bevy's asset system.
pub fn load_from_slice<B: StateGraphLoaderBackend>(v: &[u8]) -> Result<StateGraph, LoadError> {
    let definition = load_definition_from_slice::<B>(v)?;
    Ok(definition.resolve()?)
}

/// Reads an AgentProfile with the given backend.
pub fn load_profile_from_slice<B: StateGraphLoaderBackend>(v: &[u8]) -> Result<AgentProfile, LoadError> {
    B::from_slice(v).map_err(|err| LoadError::Format(Box::new(err)))
}


// Asset loader
#[derive(Default)]
pub struct StateGraphLoader<B: StateGraphLoaderBackend>(PhantomData<B>);

impl<B: StateGraphLoaderBackend> AssetLoader for StateGraphLoader<B> {
    type Asset = StateGraphDefinition;
    type Settings = ();
    type Error = Box<dyn core::error::Error + Send + Sync + 'static>;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _ctx: &mut LoadContext<'_>
    ) -> Result<Self::Asset, Self::Error> {
        #[cfg(feature = "logging")]
        bevy::log::debug!("StateGraphLoader running...");

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;

        let res: Result<StateGraphDefinition, Self::Error> = B::from_slice(&bytes).map_err(|err| {
            #[cfg(feature = "logging")]
            bevy::log::error!("StateGraphLoader error: {:?}", err);
            err.into()
        });

        #[cfg(feature = "logging")]
        bevy::log::debug!("StateGraphLoader finished...");
        res
    }

    fn extensions(&self) -> &[&str] {
        B::extensions()
    }
}


/// Resolved state graphs, keyed by the path they were requested from.
#[derive(Resource, Default, Debug)]
pub struct StateGraphStore(HashMap<String, StateGraphRef>);

impl StateGraphStore {
    pub fn get(&self, path: &str) -> Option<StateGraphRef> {
        self.0.get(path).cloned()
    }

    pub fn insert(&mut self, path: impl Into<String>, graph: StateGraph) -> StateGraphRef {
        let graph = ThreadSafeRef::new(graph);
        self.0.insert(path.into(), graph.clone());
        graph
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Resource, Default)]
struct StateGraphHandles(HashMap<String, Handle<StateGraphDefinition>>);

#[derive(Resource, Default)]
struct AssetLoadTimeouts(HashMap<String, Timer>);


#[derive(Event, Debug)]
pub struct LoadStateGraphRequest {
    filename: String
}

impl LoadStateGraphRequest {
    pub fn new<IS: Into<String>>(filename: IS) -> Self {
        Self {
            filename: filename.into()
        }
    }
}

/// The definition at `filename` finished loading.
#[derive(Event, Debug)]
pub struct StateGraphLoaded {
    pub filename: String,
    pub asset_handle: Handle<StateGraphDefinition>,
}

/// The graph at `filename` was resolved and can be fetched from the StateGraphStore.
#[derive(Event, Debug)]
pub struct StateGraphReady {
    pub filename: String,
    pub graph: StateGraphRef,
}

/// The definition at `filename` loaded, but does not describe a valid graph.
#[derive(Event, Debug)]
pub struct StateGraphRejected {
    pub filename: String,
    pub error: ConfigError,
}

#[derive(Event, Debug)]
pub struct StateGraphLoadingTimeout {
    pub filename: String,
    pub timeout_time: f32,
}

fn load_asset(
    event: On<LoadStateGraphRequest>,
    asset_server: Res<AssetServer>,
    mut handles: ResMut<StateGraphHandles>,
    mut timer: ResMut<AssetLoadTimeouts>,
) {
    let asset_path = event.event().filename.to_owned();
    #[cfg(feature = "logging")]
    bevy::log::info!("Reading StateGraph from {}...", &asset_path);
    let handle: Handle<StateGraphDefinition> = asset_server.load(asset_path.to_owned());
    handles.0.entry(asset_path.to_owned()).or_insert(handle);
    timer.0.insert(asset_path, Timer::new(DEFAULT_LOAD_TIMEOUT, TimerMode::Once));
}

fn countdown(
    time: Res<Time>,
    handles: Res<StateGraphHandles>,
    assets: Res<Assets<StateGraphDefinition>>,
    mut timers: ResMut<AssetLoadTimeouts>,
    mut commands: Commands,
) {
    timers.0.retain(|key, timer| {
        let handle = handles.0.get(key);
        let loaded = handle.filter(|handle| assets.contains(*handle));

        if let Some(handle) = loaded {
            #[cfg(feature = "logging")]
            bevy::log::info!("Successfully loaded StateGraph from file {:?}...", key);
            commands.trigger(StateGraphLoaded {
                filename: key.to_owned(),
                asset_handle: handle.to_owned(),
            });
            return false
        }

        timer.tick(time.delta());
        if !timer.is_finished() {
            return true
        }

        let elapsed_time = timer.elapsed_secs();
        #[cfg(feature = "logging")]
        bevy::log::warn!(
            "Loading StateGraph data from file {:?} timed out after {:?}s!",
            key, elapsed_time
        );
        commands.trigger(StateGraphLoadingTimeout {
            filename: key.to_owned(),
            timeout_time: elapsed_time,
        });
        false
    });
}

fn resolve_loaded_graphs(
    event: On<StateGraphLoaded>,
    assets: Res<Assets<StateGraphDefinition>>,
    mut store: ResMut<StateGraphStore>,
    mut commands: Commands,
) {
    let evt = event.event();
    let Some(definition) = assets.get(&evt.asset_handle) else {
        return
    };

    match definition.resolve() {
        Ok(graph) => {
            let graph = store.insert(evt.filename.to_owned(), graph);
            commands.trigger(StateGraphReady { filename: evt.filename.to_owned(), graph });
        },
        Err(error) => {
            #[cfg(feature = "logging")]
            bevy::log::error!("StateGraph {:?} from {:?} is invalid: {}", definition.name, evt.filename, error);
            commands.trigger(StateGraphRejected { filename: evt.filename.to_owned(), error });
        },
    }
}


#[derive(Default)]
pub struct StateGraphAssetPlugin<B: StateGraphLoaderBackend>(PhantomData<B>);


impl<B: StateGraphLoaderBackend + Default> bevy::app::Plugin for StateGraphAssetPlugin<B> {
    fn build(&self, app: &mut bevy::app::App) {
        if !app.is_plugin_added::<AssetPlugin>() {
            app.add_plugins(AssetPlugin::default());
        }

        app
        .init_resource::<StateGraphHandles>()
        .init_resource::<StateGraphStore>()
        .init_asset::<StateGraphDefinition>()
        .init_asset_loader::<StateGraphLoader<B>>()
        .init_resource::<AssetLoadTimeouts>()
        .add_observer(load_asset)
        .add_observer(resolve_loaded_graphs)
        .add_systems(First, countdown)
        ;
    }
}
