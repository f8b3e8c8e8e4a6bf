//=========================================================================
// Shader Manager
//=========================================================================
//
// Compiled shader units, reference counted so several programs can share
// one stage. Programs take a reference per constituent shader on link and
// give it back when they are destroyed.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

//=== External Crates =====================================================

use log::debug;

//=== Internal Dependencies ===============================================

use crate::backend::{GraphicsBackend, Handle, ShaderKind};
use crate::core::{Component, Registry, Release, ResourceKind};
use crate::error::{Result, RuntimeError};

//=== ShaderSource ========================================================

/// Where shader text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// Inline GLSL.
    Text(String),

    /// File read in full before compilation.
    File(PathBuf),
}

impl ShaderSource {
    pub fn text(source: impl Into<String>) -> Self {
        Self::Text(source.into())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Resolves to the source text.
    pub fn load(&self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::File(path) => std::fs::read_to_string(path).map_err(|source| {
                RuntimeError::SourceFile {
                    path: path.clone(),
                    source,
                }
            }),
        }
    }
}

//=== ShaderObject ========================================================

pub(crate) struct ShaderObject;

impl ResourceKind for ShaderObject {
    type Meta = ShaderKind;

    const LABEL: &'static str = "shader";
    const ENTRY: &'static str = "Shader";

    fn destroy(gpu: &dyn GraphicsBackend, handle: Handle, _meta: &ShaderKind) {
        gpu.destroy_shader(handle);
    }
}

//=== ShaderManager =======================================================

pub struct ShaderManager {
    registry: Registry<ShaderObject>,
}

impl ShaderManager {
    pub fn new(gpu: Rc<dyn GraphicsBackend>) -> Self {
        Self {
            registry: Registry::new(gpu),
        }
    }

    //--- Mutation ---------------------------------------------------------

    /// Compiles `source` as a `kind` stage and registers it.
    ///
    /// A compile failure carries the compiler log and registers nothing.
    pub fn add(&mut self, source: &ShaderSource, kind: ShaderKind) -> Result<Handle> {
        self.registry.require_initialized()?;

        let text = source.load()?;
        let handle = self
            .registry
            .gpu()
            .compile_shader(kind, &text)
            .map_err(|diagnostic| RuntimeError::external("shader", "compile_shader", diagnostic))?;

        if let ShaderSource::File(path) = source {
            debug!(target: "resource", "{:?} shader compiled from {}", kind, path.display());
        }
        self.registry.insert(handle, kind)
    }

    pub fn increment_reference(&mut self, shader: Handle) -> Result<usize> {
        self.registry.increment_reference(shader)
    }

    /// Releases one reference; returns the remaining count (0 once destroyed).
    pub fn decrement_reference(&mut self, shader: Handle) -> Result<usize> {
        self.registry.decrement_reference(shader).map(|release| release.count())
    }

    pub fn remove(&mut self, shader: Handle) -> Result<()> {
        self.registry.remove(shader).map(drop)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.registry.clear().map(drop)
    }

    //--- Queries ----------------------------------------------------------

    pub fn contains(&self, shader: Handle) -> Result<bool> {
        self.registry.contains(shader)
    }

    pub fn size(&self) -> Result<usize> {
        self.registry.size()
    }

    pub fn kind(&self, shader: Handle) -> Result<ShaderKind> {
        self.registry.metadata(shader).copied()
    }

    pub fn reference_count(&self, shader: Handle) -> Result<usize> {
        self.registry.reference_count(shader)
    }

    //--- Internal Helpers -------------------------------------------------

    /// Releases one reference held by a program being destroyed.
    pub(crate) fn release_for_program(&mut self, shader: Handle) -> Result<Release<ShaderKind>> {
        self.registry.decrement_reference(shader)
    }
}

//--- Trait Implementations -----------------------------------------------

impl Component for ShaderManager {
    fn label(&self) -> &'static str {
        ShaderObject::LABEL
    }

    fn initialize(&mut self) -> Result<()> {
        self.registry.initialize()
    }

    fn uninitialize(&mut self) -> Result<()> {
        self.registry.uninitialize().map(drop)
    }

    fn is_initialized(&self) -> bool {
        self.registry.is_initialized()
    }
}

impl fmt::Display for ShaderManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.registry, f)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GpuObjectKind, HeadlessGraphics};
    use std::io::Write as _;

    const VERTEX: &str = "void main() { gl_Position = vec4(0.0); }";

    fn setup() -> (Rc<HeadlessGraphics>, ShaderManager) {
        let gpu = Rc::new(HeadlessGraphics::new());
        let mut shaders = ShaderManager::new(gpu.clone());
        shaders.initialize().unwrap();
        (gpu, shaders)
    }

    #[test]
    fn add_registers_with_kind() {
        let (_gpu, mut shaders) = setup();

        let handle = shaders.add(&ShaderSource::text(VERTEX), ShaderKind::Vertex).unwrap();

        assert!(shaders.contains(handle).unwrap());
        assert_eq!(shaders.kind(handle).unwrap(), ShaderKind::Vertex);
        assert_eq!(shaders.reference_count(handle).unwrap(), 1);
    }

    #[test]
    fn compile_failure_registers_nothing() {
        let (gpu, mut shaders) = setup();
        gpu.fail_next_compile("0:1: syntax error");

        let err = shaders.add(&ShaderSource::text(VERTEX), ShaderKind::Vertex).unwrap_err();

        match err {
            RuntimeError::External { diagnostic, .. } => assert_eq!(diagnostic, "0:1: syntax error"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(shaders.size().unwrap(), 0);
        assert_eq!(gpu.live_count(GpuObjectKind::Shader), 0);
    }

    #[test]
    fn file_source_is_read() {
        let (_gpu, mut shaders) = setup();
        let path = std::env::temp_dir().join(format!("luna_shader_{}.vert", std::process::id()));
        std::fs::File::create(&path).unwrap().write_all(VERTEX.as_bytes()).unwrap();

        let handle = shaders.add(&ShaderSource::file(&path), ShaderKind::Vertex).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(shaders.contains(handle).unwrap());
    }

    #[test]
    fn missing_file_is_source_error() {
        let (_gpu, mut shaders) = setup();

        let err = shaders
            .add(&ShaderSource::file("/nonexistent/luna/shader.frag"), ShaderKind::Fragment)
            .unwrap_err();

        assert!(matches!(err, RuntimeError::SourceFile { .. }));
        assert_eq!(shaders.size().unwrap(), 0);
    }

    #[test]
    fn decrement_reports_remaining_count() {
        let (gpu, mut shaders) = setup();
        let handle = shaders.add(&ShaderSource::text(VERTEX), ShaderKind::Vertex).unwrap();
        shaders.increment_reference(handle).unwrap();

        assert_eq!(shaders.decrement_reference(handle).unwrap(), 1);
        assert_eq!(shaders.decrement_reference(handle).unwrap(), 0);
        assert_eq!(gpu.destroy_count(handle), 1);
    }

    #[test]
    fn uninitialized_add_fails() {
        let gpu = Rc::new(HeadlessGraphics::new());
        let mut shaders = ShaderManager::new(gpu);

        assert!(matches!(
            shaders.add(&ShaderSource::text(VERTEX), ShaderKind::Vertex),
            Err(RuntimeError::Uninitialized { component: "shader" })
        ));
    }
}
