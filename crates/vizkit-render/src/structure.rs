//! Registry of scene structures.
//!
//! Structures are owned here by `(type name, name)` and everything else refers
//! to them through weak handles. Once per frame [`StructureRegistry::prepare_frame`]
//! lets each structure request the shader programs it will draw with.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Context;
use tracing::{debug, error};
use vizkit_core::{Referrable, WeakHandle};

use crate::engine::Engine;
use crate::error::RenderError;

/// A registered scene object: a mesh, a point cloud, an image.
pub trait SceneArtist {
    /// Kind of structure, e.g. `"Surface Mesh"`.
    fn type_name(&self) -> &str;

    fn name(&self) -> &str;

    /// Characteristic size of the structure in world units.
    fn length_scale(&self) -> f32;

    /// Acquire or refresh whatever the structure needs to draw this frame.
    fn prepare(&mut self, engine: &mut Engine) -> anyhow::Result<()>;
}

type StructureKey = (String, String);

#[derive(Default)]
pub struct StructureRegistry {
    structures: BTreeMap<StructureKey, Referrable<dyn SceneArtist>>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `artist`. The `(type name, name)` pair must be free.
    pub fn register<S: SceneArtist + 'static>(
        &mut self,
        artist: S,
    ) -> Result<WeakHandle<dyn SceneArtist>, RenderError> {
        let key = (artist.type_name().to_string(), artist.name().to_string());
        if self.structures.contains_key(&key) {
            return Err(RenderError::DuplicateStructure {
                type_name: key.0,
                name: key.1,
            });
        }

        let owned = Referrable::new(artist).into_dyn(|rc| rc as Rc<RefCell<dyn SceneArtist>>);
        let handle = owned.weak_handle();
        debug!(type_name = %key.0, name = %key.1, id = owned.unique_id(), "registered structure");
        self.structures.insert(key, owned);
        Ok(handle)
    }

    /// Destroy a structure. Outstanding handles to it become invalid.
    pub fn remove(&mut self, type_name: &str, name: &str) -> Result<(), RenderError> {
        let key = (type_name.to_string(), name.to_string());
        match self.structures.remove(&key) {
            Some(_) => {
                debug!(type_name, name, "removed structure");
                Ok(())
            }
            None => Err(RenderError::UnknownStructure {
                type_name: key.0,
                name: key.1,
            }),
        }
    }

    pub fn contains(&self, type_name: &str, name: &str) -> bool {
        self.structures
            .contains_key(&(type_name.to_string(), name.to_string()))
    }

    pub fn get(
        &self,
        type_name: &str,
        name: &str,
    ) -> Result<WeakHandle<dyn SceneArtist>, RenderError> {
        self.entry(type_name, name).map(Referrable::weak_handle)
    }

    /// Typed handle to a structure registered as concrete type `S`.
    pub fn handle_as<S: SceneArtist + 'static>(
        &self,
        type_name: &str,
        name: &str,
    ) -> Result<WeakHandle<S>, RenderError> {
        let handle = self
            .entry(type_name, name)?
            .generic_weak_handle()
            .typed::<S>()?;
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Scene length scale: the largest structure's, or 1 for an empty scene.
    pub fn length_scale(&self) -> f32 {
        self.structures
            .values()
            .map(|s| s.borrow().length_scale())
            .reduce(f32::max)
            .unwrap_or(1.0)
    }

    /// Prepare every structure in key order. The first failure aborts the
    /// frame.
    pub fn prepare_frame(&self, engine: &mut Engine) -> anyhow::Result<()> {
        for ((type_name, name), structure) in &self.structures {
            structure
                .borrow_mut()
                .prepare(engine)
                .with_context(|| format!("preparing structure `{name}` ({type_name})"))
                .inspect_err(|err| error!(type_name, name, "frame aborted: {err:#}"))?;
        }
        Ok(())
    }

    fn entry(
        &self,
        type_name: &str,
        name: &str,
    ) -> Result<&Referrable<dyn SceneArtist>, RenderError> {
        self.structures
            .get(&(type_name.to_string(), name.to_string()))
            .ok_or_else(|| RenderError::UnknownStructure {
                type_name: type_name.to_string(),
                name: name.to_string(),
            })
    }
}
